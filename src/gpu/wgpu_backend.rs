// ============================================================================
// WGPU BACKEND — the film program on a real (or fallback) GPU
// ============================================================================

use image::RgbaImage;
use wgpu::util::DeviceExt;

use super::backend::{RenderBackend, ResourceCounts, ShaderSet};
use super::context::GpuContext;
use super::pipeline::{self, FilmUniforms, QUAD_VERTICES};
use super::texture::{OffscreenSurface, SourceTexture};
use crate::error::{RenderError, ShaderStage};
use crate::ops::film::FrameInputs;

pub struct WgpuProgram {
    pipeline: wgpu::RenderPipeline,
}

pub struct WgpuGeometry {
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,
}

pub struct WgpuBackend {
    ctx: GpuContext,
    bind_group_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
    uniform_buffer: wgpu::Buffer,
    surface: Option<OffscreenSurface>,
    live: ResourceCounts,
}

impl WgpuBackend {
    /// `preference` is a power preference string ("high performance",
    /// "low power", "integrated", ...).
    pub fn new(preference: &str) -> Result<Self, RenderError> {
        Ok(Self::from_context(GpuContext::new(preference)?))
    }

    pub fn from_context(ctx: GpuContext) -> Self {
        let bind_group_layout = pipeline::create_bind_group_layout(&ctx.device);
        let sampler = pipeline::create_sampler(&ctx.device);
        let uniform_buffer = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("film_uniforms"),
            size: std::mem::size_of::<FilmUniforms>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        Self {
            ctx,
            bind_group_layout,
            sampler,
            uniform_buffer,
            surface: None,
            live: ResourceCounts::default(),
        }
    }

    pub fn context(&self) -> &GpuContext {
        &self.ctx
    }

    fn ensure_alive(&self) -> Result<(), RenderError> {
        if self.ctx.is_lost() {
            Err(RenderError::ContextLost(format!("device '{}' was lost", self.ctx.adapter_name)))
        } else {
            Ok(())
        }
    }
}

impl RenderBackend for WgpuBackend {
    type Program = WgpuProgram;
    type Geometry = WgpuGeometry;
    type Texture = SourceTexture;

    fn name(&self) -> String {
        format!("wgpu: {}", self.ctx.adapter_name)
    }

    fn compile_program(&mut self, shaders: &ShaderSet) -> Result<WgpuProgram, RenderError> {
        self.ensure_alive()?;
        let device = &self.ctx.device;
        let vertex = pipeline::compile_stage(device, &shaders.vertex, ShaderStage::Vertex)?;
        let fragment = pipeline::compile_stage(device, &shaders.fragment, ShaderStage::Fragment)?;
        let pipeline = pipeline::link_program(device, &self.bind_group_layout, &vertex, &fragment)?;
        self.live.programs += 1;
        Ok(WgpuProgram { pipeline })
    }

    fn create_geometry(&mut self) -> Result<WgpuGeometry, RenderError> {
        self.ensure_alive()?;
        let vertex_buffer = self.ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("film_quad"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });
        self.live.geometries += 1;
        Ok(WgpuGeometry { vertex_buffer, vertex_count: QUAD_VERTICES.len() as u32 })
    }

    fn upload_texture(&mut self, image: &RgbaImage) -> Result<SourceTexture, RenderError> {
        self.ensure_alive()?;
        let tex = SourceTexture::new(
            &self.ctx,
            &self.bind_group_layout,
            &self.uniform_buffer,
            &self.sampler,
            image,
        )?;
        self.live.textures += 1;
        Ok(tex)
    }

    fn resize_surface(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        self.ensure_alive()?;
        if let Some(s) = &self.surface {
            if s.width == width && s.height == height {
                return Ok(());
            }
        }
        let surface = OffscreenSurface::new(&self.ctx, width, height)?;
        if let Some(old) = self.surface.replace(surface) {
            old.texture.destroy();
        } else {
            self.live.surfaces += 1;
        }
        Ok(())
    }

    fn draw(
        &mut self,
        program: &WgpuProgram,
        geometry: &WgpuGeometry,
        texture: &SourceTexture,
        frame: &FrameInputs,
    ) -> Result<(), RenderError> {
        self.ensure_alive()?;
        let Some(surface) = self.surface.as_ref() else {
            return Err(RenderError::InvalidImage("no surface to draw into".into()));
        };

        let uniforms = FilmUniforms::from_frame(frame);
        self.ctx.queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&uniforms));

        let mut encoder = self.ctx.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("film_encoder"),
        });
        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("film_pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &surface.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::TRANSPARENT),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            pass.set_pipeline(&program.pipeline);
            pass.set_bind_group(0, &texture.bind_group, &[]);
            pass.set_vertex_buffer(0, geometry.vertex_buffer.slice(..));
            pass.draw(0..geometry.vertex_count, 0..1);
        }
        self.ctx.submit_one(encoder);
        self.ctx.device.poll(wgpu::Maintain::Wait);

        // Errors raised by the submission arrive through the uncaptured handler.
        self.ensure_alive()
    }

    fn read_surface(&mut self) -> Result<RgbaImage, RenderError> {
        self.ensure_alive()?;
        let ctx = &self.ctx;
        match self.surface.as_mut() {
            Some(surface) => surface.read_back(ctx),
            None => Err(RenderError::ExportFailed("no surface to read".into())),
        }
    }

    fn release_program(&mut self, program: WgpuProgram) {
        drop(program.pipeline);
        self.live.programs = self.live.programs.saturating_sub(1);
    }

    fn release_geometry(&mut self, geometry: WgpuGeometry) {
        geometry.vertex_buffer.destroy();
        self.live.geometries = self.live.geometries.saturating_sub(1);
    }

    fn release_texture(&mut self, texture: SourceTexture) {
        texture.texture.destroy();
        self.live.textures = self.live.textures.saturating_sub(1);
    }

    fn release_surface(&mut self) {
        if let Some(surface) = self.surface.take() {
            surface.texture.destroy();
            self.live.surfaces = self.live.surfaces.saturating_sub(1);
        }
    }

    fn resources(&self) -> ResourceCounts {
        self.live
    }

    fn is_lost(&self) -> bool {
        self.ctx.is_lost()
    }
}
