// ============================================================================
// CPU BACKEND — software evaluation of the film program
// ============================================================================
//
// Implements the same contract as the wgpu backend on plain memory: the
// "program" is the color model in `ops::film`, evaluated over rayon row
// chunks.  Every handle is counted, which is what the lifecycle tests inspect,
// and `lose_context` simulates a device that disappears mid-session.
// ============================================================================

use image::RgbaImage;

use super::backend::{RenderBackend, ResourceCounts, ShaderSet};
use super::pipeline::{QUAD_VERTICES, QuadVertex};
use crate::error::{RenderError, ShaderStage};
use crate::ops::film::{self, FrameInputs};

/// Handle returned by [`CpuBackend::compile_program`].
#[derive(Debug)]
pub struct CpuProgram {
    id: u64,
}

#[derive(Debug)]
pub struct CpuGeometry {
    id: u64,
    vertices: [QuadVertex; 6],
}

#[derive(Debug)]
pub struct CpuTexture {
    id: u64,
    image: RgbaImage,
}

impl CpuTexture {
    pub fn id(&self) -> u64 {
        self.id
    }
}

#[derive(Debug, Default)]
pub struct CpuBackend {
    next_id: u64,
    live: ResourceCounts,
    surface: Option<RgbaImage>,
    draw_calls: u64,
    lost: bool,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `draw` calls that reached the surface.
    pub fn draw_calls(&self) -> u64 {
        self.draw_calls
    }

    /// Current surface size, if one exists.
    pub fn surface_size(&self) -> Option<(u32, u32)> {
        self.surface.as_ref().map(|s| s.dimensions())
    }

    /// Simulate losing the device.  Every later device operation fails with
    /// `ContextLost`; releases still succeed.
    pub fn lose_context(&mut self) {
        log::error!("[CPU] context lost (simulated)");
        self.lost = true;
    }

    fn alloc_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn ensure_alive(&self) -> Result<(), RenderError> {
        if self.lost {
            Err(RenderError::ContextLost("software device was lost".into()))
        } else {
            Ok(())
        }
    }
}

/// Entry-point check standing in for compilation: the stage must declare its
/// attribute and its entry function.
fn check_stage(source: &str, stage: ShaderStage) -> Result<(), RenderError> {
    let (attr, entry) = match stage {
        ShaderStage::Vertex => ("@vertex", "fn vs_main"),
        ShaderStage::Fragment => ("@fragment", "fn fs_main"),
    };
    let missing: Vec<&str> = [attr, entry].into_iter().filter(|s| !source.contains(s)).collect();
    if missing.is_empty() {
        return Ok(());
    }
    let log = format!("missing {}", missing.join(", "));
    log::error!("[CPU] {} shader compile failed: {}", stage, log);
    Err(RenderError::ShaderCompileFailed { stage, log })
}

impl RenderBackend for CpuBackend {
    type Program = CpuProgram;
    type Geometry = CpuGeometry;
    type Texture = CpuTexture;

    fn name(&self) -> String {
        "cpu".to_string()
    }

    fn compile_program(&mut self, shaders: &ShaderSet) -> Result<CpuProgram, RenderError> {
        self.ensure_alive()?;
        check_stage(&shaders.vertex, ShaderStage::Vertex)?;
        check_stage(&shaders.fragment, ShaderStage::Fragment)?;

        // Both stages must agree on the interpolated interface.
        if !shaders.vertex.contains("VertexOutput") || !shaders.fragment.contains("VertexOutput") {
            let log = "vertex outputs do not match fragment inputs (VertexOutput)".to_string();
            log::error!("[CPU] program link failed: {}", log);
            return Err(RenderError::ProgramLinkFailed(log));
        }

        self.live.programs += 1;
        Ok(CpuProgram { id: self.alloc_id() })
    }

    fn create_geometry(&mut self) -> Result<CpuGeometry, RenderError> {
        self.ensure_alive()?;
        self.live.geometries += 1;
        Ok(CpuGeometry { id: self.alloc_id(), vertices: QUAD_VERTICES })
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<CpuTexture, RenderError> {
        self.ensure_alive()?;
        self.live.textures += 1;
        Ok(CpuTexture { id: self.alloc_id(), image: image.clone() })
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.ensure_alive()?;
        if self.surface.is_none() {
            self.live.surfaces += 1;
        }
        self.surface = Some(RgbaImage::new(width, height));
        Ok(())
    }

    fn draw(
        &mut self,
        program: &CpuProgram,
        geometry: &CpuGeometry,
        texture: &CpuTexture,
        frame: &FrameInputs,
    ) -> Result<(), RenderError> {
        self.ensure_alive()?;
        debug_assert!(program.id != 0 && geometry.id != 0);
        debug_assert_eq!(geometry.vertices.len(), 6);
        let Some(surface) = self.surface.as_mut() else {
            return Err(RenderError::InvalidImage("no surface to draw into".into()));
        };
        film::render_into(&texture.image, surface, frame);
        self.draw_calls += 1;
        Ok(())
    }

    fn read_surface(&mut self) -> Result<RgbaImage, RenderError> {
        self.ensure_alive()?;
        self.surface
            .clone()
            .ok_or_else(|| RenderError::ExportFailed("no surface to read".into()))
    }

    fn release_program(&mut self, _program: CpuProgram) {
        self.live.programs = self.live.programs.saturating_sub(1);
    }

    fn release_geometry(&mut self, _geometry: CpuGeometry) {
        self.live.geometries = self.live.geometries.saturating_sub(1);
    }

    fn release_texture(&mut self, _texture: CpuTexture) {
        self.live.textures = self.live.textures.saturating_sub(1);
    }

    fn release_surface(&mut self) {
        if self.surface.take().is_some() {
            self.live.surfaces = self.live.surfaces.saturating_sub(1);
        }
    }

    fn resources(&self) -> ResourceCounts {
        self.live
    }

    fn is_lost(&self) -> bool {
        self.lost
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::film::FilmTuning;
    use crate::params::FilmParameters;

    #[test]
    fn handles_are_counted_and_released() {
        let mut b = CpuBackend::new();
        let p = b.compile_program(&ShaderSet::film()).unwrap();
        let g = b.create_geometry().unwrap();
        let t = b.upload_texture(&RgbaImage::new(2, 2)).unwrap();
        b.resize_surface(2, 2).unwrap();
        assert_eq!(b.resources(), ResourceCounts { programs: 1, geometries: 1, textures: 1, surfaces: 1 });

        b.release_texture(t);
        b.release_geometry(g);
        b.release_program(p);
        b.release_surface();
        assert_eq!(b.resources().total(), 0);
    }

    #[test]
    fn built_in_shaders_pass_the_entry_point_check() {
        let set = ShaderSet::film();
        assert!(check_stage(&set.vertex, ShaderStage::Vertex).is_ok());
        assert!(check_stage(&set.fragment, ShaderStage::Fragment).is_ok());
    }

    #[test]
    fn lost_context_fails_draws() {
        let mut b = CpuBackend::new();
        let p = b.compile_program(&ShaderSet::film()).unwrap();
        let g = b.create_geometry().unwrap();
        let t = b.upload_texture(&RgbaImage::new(1, 1)).unwrap();
        b.resize_surface(1, 1).unwrap();
        b.lose_context();
        let frame = FrameInputs::new(&FilmParameters::neutral(), &FilmTuning::default(), 1, 1, 0.0);
        assert!(matches!(b.draw(&p, &g, &t, &frame), Err(RenderError::ContextLost(_))));
        assert_eq!(b.draw_calls(), 0);
    }
}
