// ============================================================================
// FILM RENDERER — resource lifecycle, parameter edits and re-render triggers
// ============================================================================
//
// One renderer drives one backend surface.  The program and quad geometry are
// created up front; the source texture is replaced on every `load_image`.
// Parameter edits store the new values and redraw straight away when an image
// is present, so the surface always reflects the latest parameters.
// ============================================================================

use std::time::Instant;

use image::RgbaImage;

use super::backend::{RenderBackend, RenderOutcome, RendererState, ResourceCounts, ShaderSet};
use crate::error::RenderError;
use crate::io::{self, ExportFormat};
use crate::ops::film::{FilmTuning, FrameInputs};
use crate::params::{FilmParameter, FilmParameters, ParameterState, PartialFilmParameters, PresetLabel};
use crate::presets::{FilmCharacteristics, FilmPresetName};

pub struct FilmRenderer<B: RenderBackend> {
    backend: B,
    program: Option<B::Program>,
    geometry: Option<B::Geometry>,
    texture: Option<B::Texture>,
    dimensions: Option<(u32, u32)>,
    params: ParameterState,
    tuning: FilmTuning,
    state: RendererState,
    /// Grain drift clock.
    started: Instant,
}

impl<B: RenderBackend> FilmRenderer<B> {
    /// Build the film program on `backend`.
    pub fn new(backend: B) -> Result<Self, RenderError> {
        Self::with_shaders(backend, ShaderSet::film())
    }

    /// Build with custom shader sources.  Nothing stays allocated on failure.
    pub fn with_shaders(mut backend: B, shaders: ShaderSet) -> Result<Self, RenderError> {
        let program = backend.compile_program(&shaders)?;
        let geometry = match backend.create_geometry() {
            Ok(g) => g,
            Err(e) => {
                log::error!("[{}] quad geometry creation failed: {}", backend.name(), e);
                backend.release_program(program);
                return Err(e);
            }
        };
        log::info!("[{}] film renderer initialized", backend.name());
        Ok(Self {
            backend,
            program: Some(program),
            geometry: Some(geometry),
            texture: None,
            dimensions: None,
            params: ParameterState::default(),
            tuning: FilmTuning::default(),
            state: RendererState::Initialized,
            started: Instant::now(),
        })
    }

    // ------------------------------------------------------------------
    // Introspection
    // ------------------------------------------------------------------

    pub fn state(&self) -> RendererState {
        self.state
    }

    pub fn parameters(&self) -> &FilmParameters {
        self.params.parameters()
    }

    pub fn active_preset(&self) -> PresetLabel {
        self.params.label()
    }

    /// Size of the loaded image (and the surface).
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.dimensions
    }

    pub fn resources(&self) -> ResourceCounts {
        self.backend.resources()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn tuning(&self) -> &FilmTuning {
        &self.tuning
    }

    /// Replace the model constants, then redraw when an image is loaded.
    pub fn set_tuning(&mut self, tuning: FilmTuning) -> Result<RenderOutcome, RenderError> {
        self.ensure_live()?;
        self.tuning = tuning.sanitized();
        self.rerender()
    }

    fn ensure_live(&self) -> Result<(), RenderError> {
        if self.state == RendererState::Disposed {
            Err(RenderError::Disposed)
        } else {
            Ok(())
        }
    }

    fn ensure_context(&self) -> Result<(), RenderError> {
        if self.backend.is_lost() {
            let msg = format!("{} is no longer usable", self.backend.name());
            log::error!("[renderer] {}", msg);
            Err(RenderError::ContextLost(msg))
        } else {
            Ok(())
        }
    }

    // ------------------------------------------------------------------
    // Image
    // ------------------------------------------------------------------

    /// Upload `image` as the new source and size the surface to it.  The
    /// previous texture is released once the new one exists.  Does not draw.
    pub fn load_image(&mut self, image: &RgbaImage) -> Result<(), RenderError> {
        self.ensure_live()?;
        let (w, h) = image.dimensions();
        if w == 0 || h == 0 {
            log::warn!("[renderer] rejected empty image {}x{}", w, h);
            return Err(RenderError::InvalidImage(format!("{}x{} image has no pixels", w, h)));
        }
        self.ensure_context()?;

        let texture = self.backend.upload_texture(image)?;
        if let Err(e) = self.backend.resize_surface(w, h) {
            self.backend.release_texture(texture);
            return Err(e);
        }
        if let Some(old) = self.texture.replace(texture) {
            self.backend.release_texture(old);
        }
        self.dimensions = Some((w, h));
        self.state = RendererState::ImageLoaded;
        log::debug!("[renderer] loaded {}x{} image", w, h);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Rendering
    // ------------------------------------------------------------------

    /// Draw the loaded image with the current parameters.  A no-op
    /// (`NotReady`) before any image is loaded.
    pub fn render(&mut self) -> Result<RenderOutcome, RenderError> {
        self.ensure_live()?;
        let (Some(program), Some(geometry), Some(texture), Some((w, h))) =
            (&self.program, &self.geometry, &self.texture, self.dimensions)
        else {
            log::debug!("[renderer] render skipped, no image loaded");
            return Ok(RenderOutcome::NotReady);
        };
        self.ensure_context()?;

        let frame = FrameInputs::new(
            self.params.parameters(),
            &self.tuning,
            w,
            h,
            self.started.elapsed().as_secs_f32(),
        );
        if let Err(e) = self.backend.draw(program, geometry, texture, &frame) {
            log::error!("[renderer] draw failed: {}", e);
            // Whatever is on the surface no longer matches the parameters.
            self.state = RendererState::ImageLoaded;
            return Err(e);
        }
        self.state = RendererState::Rendered;
        Ok(RenderOutcome::Rendered { width: w, height: h })
    }

    fn rerender(&mut self) -> Result<RenderOutcome, RenderError> {
        if self.state.has_image() {
            self.render()
        } else {
            Ok(RenderOutcome::NotReady)
        }
    }

    fn current_outcome(&self) -> RenderOutcome {
        match (self.state, self.dimensions) {
            (RendererState::Rendered, Some((width, height))) => RenderOutcome::Rendered { width, height },
            _ => RenderOutcome::NotReady,
        }
    }

    // ------------------------------------------------------------------
    // Parameter edits (store, then redraw when an image is loaded)
    // ------------------------------------------------------------------

    pub fn set_parameters(&mut self, parameters: FilmParameters) -> Result<RenderOutcome, RenderError> {
        self.ensure_live()?;
        self.params.set_parameters(parameters);
        self.rerender()
    }

    /// Merge a sparse edit onto the current values.  An empty edit changes
    /// nothing and does not redraw.
    pub fn apply_parameters(&mut self, partial: &PartialFilmParameters) -> Result<RenderOutcome, RenderError> {
        self.ensure_live()?;
        if !self.params.apply_parameters(partial) {
            return Ok(self.current_outcome());
        }
        self.rerender()
    }

    pub fn apply_preset(&mut self, name: FilmPresetName) -> Result<RenderOutcome, RenderError> {
        self.ensure_live()?;
        self.params.apply_preset(name);
        log::debug!("[renderer] preset '{}'", name.id());
        self.rerender()
    }

    /// Apply a per-channel film stock description.  The label becomes custom.
    pub fn apply_film_stock(&mut self, stock: &FilmCharacteristics) -> Result<RenderOutcome, RenderError> {
        self.ensure_live()?;
        self.params.set_parameters(stock.to_parameters());
        log::debug!("[renderer] film stock '{}'", stock.name);
        self.rerender()
    }

    pub fn update_parameter(&mut self, field: FilmParameter, value: f32) -> Result<RenderOutcome, RenderError> {
        self.ensure_live()?;
        self.params.update_parameter(field, value);
        self.rerender()
    }

    /// Back to neutral values with the custom label.
    pub fn reset_parameters(&mut self) -> Result<RenderOutcome, RenderError> {
        self.ensure_live()?;
        self.params.reset();
        self.rerender()
    }

    // ------------------------------------------------------------------
    // Export
    // ------------------------------------------------------------------

    /// Pixels of the last rendered frame.
    pub fn read_pixels(&mut self) -> Result<RgbaImage, RenderError> {
        self.ensure_live()?;
        if self.state != RendererState::Rendered {
            return Err(RenderError::ExportFailed("nothing has been rendered yet".into()));
        }
        self.ensure_context()?;
        self.backend.read_surface().map_err(|e| match e {
            RenderError::ContextLost(_) => e,
            other => RenderError::ExportFailed(other.to_string()),
        })
    }

    /// Encode the last rendered frame.  Never redraws.
    pub fn export_image(&mut self, format: ExportFormat, quality: f32) -> Result<Vec<u8>, RenderError> {
        let pixels = self.read_pixels()?;
        io::encode_image(&pixels, format, quality).map_err(|e| {
            log::error!("[renderer] {} encode failed: {}", format.extension(), e);
            RenderError::ExportFailed(e.to_string())
        })
    }

    // ------------------------------------------------------------------
    // Teardown
    // ------------------------------------------------------------------

    /// Release every backend handle.  Safe to call more than once.
    pub fn dispose(&mut self) {
        if self.state == RendererState::Disposed {
            return;
        }
        if let Some(texture) = self.texture.take() {
            self.backend.release_texture(texture);
        }
        if let Some(geometry) = self.geometry.take() {
            self.backend.release_geometry(geometry);
        }
        if let Some(program) = self.program.take() {
            self.backend.release_program(program);
        }
        self.backend.release_surface();
        self.dimensions = None;
        self.state = RendererState::Disposed;
        log::debug!("[renderer] disposed");
    }
}

impl<B: RenderBackend> Drop for FilmRenderer<B> {
    fn drop(&mut self) {
        self.dispose();
    }
}
