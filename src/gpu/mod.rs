// ============================================================================
// GPU MODULE — film program, render backends and the renderer state machine
// ============================================================================
//
// Architecture:
//   backend.rs      — RenderBackend trait, handle counts, lifecycle enums
//   shaders.rs      — WGSL source for the film program (inline strings)
//   pipeline.rs     — uniform layout, quad geometry, pipeline creation
//   context.rs      — wgpu Device, Queue, adapter init
//   texture.rs      — source texture + offscreen surface with readback
//   wgpu_backend.rs — RenderBackend on wgpu
//   software.rs     — RenderBackend on the CPU (rayon)
//   renderer.rs     — FilmRenderer, the top-level coordinator
// ============================================================================

pub mod backend;
pub mod context;
pub mod pipeline;
pub mod renderer;
pub mod shaders;
pub mod software;
pub mod texture;
pub mod wgpu_backend;

pub use backend::{RenderBackend, RenderOutcome, RendererState, ResourceCounts, ShaderSet};
pub use renderer::FilmRenderer;
pub use software::CpuBackend;
pub use wgpu_backend::WgpuBackend;
