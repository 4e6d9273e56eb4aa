//! Renderer lifecycle and end-to-end behaviour on the CPU backend.

use std::borrow::Cow;

use filmstock::gpu::{RenderBackend, ResourceCounts, ShaderSet};
use filmstock::io::{self, ExportFormat, SourceFormat};
use filmstock::{
    CpuBackend, FilmParameter, FilmPresetName, FilmRenderer, PartialFilmParameters, PresetLabel, RenderError,
    RenderOutcome, RendererState, ShaderStage,
};
use image::{Rgba, RgbaImage};

fn renderer() -> FilmRenderer<CpuBackend> {
    FilmRenderer::new(CpuBackend::new()).expect("cpu renderer")
}

/// Gradient with a different hue in every pixel.
fn colorful(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / (width - 1).max(1)) as u8;
        let g = (y * 255 / (height - 1).max(1)) as u8;
        let b = ((x + y) * 37 % 256) as u8;
        Rgba([r, g, b, 255])
    })
}

#[test]
fn render_before_load_is_a_no_op() {
    let mut r = renderer();
    assert_eq!(r.render().unwrap(), RenderOutcome::NotReady);
    assert_eq!(r.state(), RendererState::Initialized);
    assert_eq!(r.backend().draw_calls(), 0);
    assert_eq!(r.backend().surface_size(), None);
}

#[test]
fn neutral_parameters_reproduce_the_input() {
    let src = RgbaImage::from_vec(2, 2, vec![
        255, 0, 0, 255, 0, 255, 0, 255, //
        0, 0, 255, 255, 128, 64, 32, 200,
    ])
    .unwrap();
    let mut r = renderer();
    r.load_image(&src).unwrap();
    assert_eq!(r.render().unwrap(), RenderOutcome::Rendered { width: 2, height: 2 });
    assert_eq!(r.read_pixels().unwrap(), src);
}

#[test]
fn monochrome_preset_outputs_equal_channels() {
    let mut r = renderer();
    r.load_image(&colorful(16, 12)).unwrap();
    r.apply_preset(FilmPresetName::IlfordHp5).unwrap();
    let out = r.read_pixels().unwrap();
    for p in out.pixels() {
        assert!(p[0] == p[1] && p[1] == p[2], "pixel {:?} is not grey", p);
    }
}

#[test]
fn every_monochrome_stock_outputs_equal_channels() {
    let mut r = renderer();
    r.load_image(&colorful(9, 7)).unwrap();
    for name in FilmPresetName::all().iter().filter(|n| n.parameters().is_monochrome()) {
        r.apply_preset(*name).unwrap();
        let out = r.read_pixels().unwrap();
        assert!(out.pixels().all(|p| p[0] == p[1] && p[1] == p[2]), "{} is not grey", name.id());
    }
}

#[test]
fn exported_png_matches_rendered_frame() {
    let mut r = renderer();
    r.load_image(&colorful(8, 5)).unwrap();
    r.apply_preset(FilmPresetName::Portra).unwrap();
    let frame = r.read_pixels().unwrap();
    let bytes = r.export_image(ExportFormat::Png, io::DEFAULT_EXPORT_QUALITY).unwrap();
    assert_eq!(io::decode_source(&bytes, SourceFormat::Png).unwrap(), frame);
    // Export never redraws.
    assert_eq!(r.backend().draw_calls(), 1);
}

#[test]
fn export_before_render_fails() {
    let mut r = renderer();
    assert!(matches!(r.export_image(ExportFormat::Png, 0.95), Err(RenderError::ExportFailed(_))));
    r.load_image(&colorful(4, 4)).unwrap();
    assert!(matches!(r.export_image(ExportFormat::Jpeg, 0.95), Err(RenderError::ExportFailed(_))));
}

#[test]
fn repeated_loads_keep_one_texture() {
    let mut r = renderer();
    r.load_image(&colorful(4, 4)).unwrap();
    r.render().unwrap();
    r.load_image(&colorful(6, 3)).unwrap();
    r.load_image(&colorful(5, 5)).unwrap();
    assert_eq!(
        r.resources(),
        ResourceCounts { programs: 1, geometries: 1, textures: 1, surfaces: 1 }
    );
    assert_eq!(r.dimensions(), Some((5, 5)));
    assert_eq!(r.state(), RendererState::ImageLoaded);
    assert_eq!(r.backend().surface_size(), Some((5, 5)));
}

#[test]
fn dispose_is_idempotent_and_terminal() {
    let mut r = renderer();
    r.load_image(&colorful(3, 3)).unwrap();
    r.render().unwrap();
    r.dispose();
    r.dispose();
    assert_eq!(r.state(), RendererState::Disposed);
    assert_eq!(r.resources().total(), 0);

    assert!(matches!(r.render(), Err(RenderError::Disposed)));
    assert!(matches!(r.load_image(&colorful(2, 2)), Err(RenderError::Disposed)));
    assert!(matches!(r.apply_preset(FilmPresetName::Gold), Err(RenderError::Disposed)));
    assert!(matches!(r.export_image(ExportFormat::Png, 0.9), Err(RenderError::Disposed)));
}

#[test]
fn broken_shaders_surface_typed_errors_without_leaks() {
    let mut backend = CpuBackend::new();
    let no_vertex_entry = ShaderSet { vertex: Cow::Borrowed("struct VertexOutput {}"), ..ShaderSet::film() };
    match backend.compile_program(&no_vertex_entry) {
        Err(RenderError::ShaderCompileFailed { stage, log }) => {
            assert_eq!(stage, ShaderStage::Vertex);
            assert!(log.contains("vs_main"));
        }
        other => panic!("expected a vertex compile error, got {:?}", other.map(|_| ())),
    }

    let mismatched = ShaderSet {
        vertex: Cow::Borrowed("@vertex fn vs_main() {}"),
        fragment: Cow::Borrowed("@fragment fn fs_main() {}"),
    };
    assert!(matches!(backend.compile_program(&mismatched), Err(RenderError::ProgramLinkFailed(_))));
    assert_eq!(backend.resources().total(), 0);

    let err = FilmRenderer::with_shaders(CpuBackend::new(), no_vertex_entry).err();
    assert!(matches!(err, Some(RenderError::ShaderCompileFailed { stage: ShaderStage::Vertex, .. })));
}

#[test]
fn context_loss_is_reported_not_panicked() {
    let mut r = renderer();
    r.load_image(&colorful(4, 4)).unwrap();
    r.render().unwrap();
    r.backend_mut().lose_context();

    assert!(matches!(r.export_image(ExportFormat::Png, 0.95), Err(RenderError::ContextLost(_))));
    assert!(matches!(r.update_parameter(FilmParameter::Fade, 0.3), Err(RenderError::ContextLost(_))));
    assert!(matches!(r.load_image(&colorful(2, 2)), Err(RenderError::ContextLost(_))));

    r.dispose();
    assert_eq!(r.resources().total(), 0);
}

#[test]
fn preset_round_trip_then_edit_goes_custom() {
    let mut r = renderer();
    for name in FilmPresetName::all() {
        r.apply_preset(*name).unwrap();
        assert_eq!(*r.parameters(), name.parameters());
        assert_eq!(r.active_preset(), PresetLabel::Preset(*name));
    }
    r.apply_preset(FilmPresetName::Cinestill).unwrap();
    r.update_parameter(FilmParameter::Bloom, 0.9).unwrap();
    assert_eq!(r.active_preset(), PresetLabel::Custom);
    assert_eq!(r.parameters().bloom, 0.9);
    assert_eq!(r.parameters().halation, FilmPresetName::Cinestill.parameters().halation);
}

#[test]
fn partial_edits_merge_onto_current_values() {
    let mut r = renderer();
    r.apply_preset(FilmPresetName::Ektar).unwrap();
    let edit = PartialFilmParameters { vignette: Some(0.6), ..Default::default() };
    r.apply_parameters(&edit).unwrap();
    let expected = { let mut p = FilmPresetName::Ektar.parameters(); p.vignette = 0.6; p };
    assert_eq!(*r.parameters(), expected);
    assert!(r.active_preset().is_custom());

    r.reset_parameters().unwrap();
    assert_eq!(*r.parameters(), filmstock::FilmParameters::neutral());
}

#[test]
fn setters_redraw_with_latest_parameters() {
    let src = colorful(6, 6);
    let mut r = renderer();
    r.load_image(&src).unwrap();
    r.render().unwrap();
    let neutral = r.read_pixels().unwrap();

    r.update_parameter(FilmParameter::Saturation, 0.0).unwrap();
    let grey = r.read_pixels().unwrap();
    assert_ne!(grey, neutral);
    assert!(grey.pixels().all(|p| p[0] == p[1] && p[1] == p[2]));
    assert_eq!(r.backend().draw_calls(), 2);
}
