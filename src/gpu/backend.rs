// ============================================================================
// RENDER BACKEND — the seam between the renderer state machine and a device
// ============================================================================
//
// A backend owns one output surface and hands out opaque handles for the
// program, the quad geometry and the source texture.  The renderer owns those
// handles and gives each one back through the matching `release_*` call; the
// backend keeps live counts so leaks show up in `resources()`.
// ============================================================================

use std::borrow::Cow;

use image::RgbaImage;

use super::shaders;
use crate::error::RenderError;
use crate::ops::film::FrameInputs;

/// Vertex + fragment source for the film program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSet {
    pub vertex: Cow<'static, str>,
    pub fragment: Cow<'static, str>,
}

impl ShaderSet {
    /// The built-in film emulation program.
    pub fn film() -> Self {
        Self {
            vertex: Cow::Borrowed(shaders::FILM_VERTEX_SHADER),
            fragment: Cow::Borrowed(shaders::FILM_FRAGMENT_SHADER),
        }
    }
}

impl Default for ShaderSet {
    fn default() -> Self {
        Self::film()
    }
}

/// Live handle counts.  A disposed renderer leaves every field at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResourceCounts {
    pub programs: usize,
    pub geometries: usize,
    pub textures: usize,
    pub surfaces: usize,
}

impl ResourceCounts {
    pub fn total(&self) -> usize {
        self.programs + self.geometries + self.textures + self.surfaces
    }
}

pub trait RenderBackend {
    type Program;
    type Geometry;
    type Texture;

    /// Short human-readable name for logs ("wgpu: <adapter>", "cpu").
    fn name(&self) -> String;

    /// Compile both stages and link them.  Nothing stays allocated on failure.
    fn compile_program(&mut self, shaders: &ShaderSet) -> Result<Self::Program, RenderError>;

    /// Full-surface quad.
    fn create_geometry(&mut self) -> Result<Self::Geometry, RenderError>;

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<Self::Texture, RenderError>;

    /// (Re)create the output surface at `width` × `height`.
    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), RenderError>;

    fn draw(
        &mut self,
        program: &Self::Program,
        geometry: &Self::Geometry,
        texture: &Self::Texture,
        frame: &FrameInputs,
    ) -> Result<(), RenderError>;

    /// Current surface contents.
    fn read_surface(&mut self) -> Result<RgbaImage, RenderError>;

    fn release_program(&mut self, program: Self::Program);
    fn release_geometry(&mut self, geometry: Self::Geometry);
    fn release_texture(&mut self, texture: Self::Texture);
    fn release_surface(&mut self);

    fn resources(&self) -> ResourceCounts;

    /// Whether the device has gone away mid-session.
    fn is_lost(&self) -> bool;
}

/// Renderer lifecycle.  A renderer value is never observable before
/// construction has compiled its program, so there is no `Uninitialized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RendererState {
    /// Program and geometry ready, no image yet.
    Initialized,
    /// A texture is uploaded; the surface holds no frame for it yet.
    ImageLoaded,
    /// The surface holds a frame for the current texture.
    Rendered,
    Disposed,
}

impl RendererState {
    pub fn has_image(&self) -> bool {
        matches!(self, RendererState::ImageLoaded | RendererState::Rendered)
    }
}

/// Result of a render request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderOutcome {
    /// No image loaded yet; nothing was drawn.
    NotReady,
    Rendered { width: u32, height: u32 },
}
