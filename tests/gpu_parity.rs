//! GPU backend checks.  Each test skips when no wgpu adapter is available.

use filmstock::ops::film::{self, FrameInputs};
use filmstock::{FilmParameters, FilmPresetName, FilmRenderer, FilmTuning, RenderOutcome, WgpuBackend};
use image::{Rgba, RgbaImage};

fn gpu_renderer() -> Option<FilmRenderer<WgpuBackend>> {
    match WgpuBackend::new("high performance").and_then(FilmRenderer::new) {
        Ok(r) => Some(r),
        Err(e) => {
            eprintln!("GPU not available ({}), skipping GPU test", e);
            None
        }
    }
}

fn gradient(width: u32, height: u32) -> RgbaImage {
    RgbaImage::from_fn(width, height, |x, y| {
        Rgba([
            (x * 255 / (width - 1)) as u8,
            (y * 255 / (height - 1)) as u8,
            ((x * 7 + y * 13) % 256) as u8,
            255,
        ])
    })
}

fn max_channel_diff(a: &RgbaImage, b: &RgbaImage) -> u8 {
    a.as_raw().iter().zip(b.as_raw()).map(|(x, y)| x.abs_diff(*y)).max().unwrap_or(0)
}

#[test]
fn neutral_render_matches_source() {
    let Some(mut r) = gpu_renderer() else { return };
    let src = gradient(37, 19);
    r.load_image(&src).unwrap();
    assert_eq!(r.render().unwrap(), RenderOutcome::Rendered { width: 37, height: 19 });
    let out = r.read_pixels().unwrap();
    assert!(max_channel_diff(&out, &src) <= 1);
}

#[test]
fn monochrome_preset_is_grey_on_gpu() {
    let Some(mut r) = gpu_renderer() else { return };
    r.load_image(&gradient(24, 16)).unwrap();
    r.apply_preset(FilmPresetName::IlfordHp5).unwrap();
    let out = r.read_pixels().unwrap();
    for p in out.pixels() {
        assert!(p[0].abs_diff(p[1]) <= 1 && p[1].abs_diff(p[2]) <= 1, "pixel {:?} is not grey", p);
    }
}

#[test]
fn gpu_and_cpu_agree_without_grain() {
    let Some(mut r) = gpu_renderer() else { return };
    let src = gradient(32, 20);
    let mut params = FilmPresetName::Portra.parameters();
    params.grain_intensity = 0.0;
    r.load_image(&src).unwrap();
    r.set_parameters(params).unwrap();
    let gpu = r.read_pixels().unwrap();

    let frame = FrameInputs::new(&params, &FilmTuning::default(), 32, 20, 0.0);
    let cpu = film::render_frame(&src, &frame);
    assert!(max_channel_diff(&gpu, &cpu) <= 4, "diff {}", max_channel_diff(&gpu, &cpu));
}

#[test]
fn dispose_releases_gpu_handles() {
    let Some(mut r) = gpu_renderer() else { return };
    r.load_image(&gradient(8, 8)).unwrap();
    r.set_parameters(FilmParameters::neutral()).unwrap();
    r.dispose();
    assert_eq!(r.resources().total(), 0);
}
