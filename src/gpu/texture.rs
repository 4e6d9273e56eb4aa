// ============================================================================
// SOURCE TEXTURE + OFFSCREEN SURFACE — GPU-side image storage and readback
// ============================================================================

use image::RgbaImage;

use super::context::GpuContext;
use super::pipeline::SURFACE_FORMAT;
use crate::error::RenderError;

/// The uploaded source photo.  Owns the bind group that pairs it with the
/// uniform buffer and sampler, so a draw only needs this handle.
pub struct SourceTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub bind_group: wgpu::BindGroup,
    pub width: u32,
    pub height: u32,
}

impl SourceTexture {
    pub fn new(
        ctx: &GpuContext,
        bind_group_layout: &wgpu::BindGroupLayout,
        uniforms: &wgpu::Buffer,
        sampler: &wgpu::Sampler,
        image: &RgbaImage,
    ) -> Result<Self, RenderError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(RenderError::InvalidImage("image has zero size".into()));
        }
        if !ctx.supports_size(width, height) {
            return Err(RenderError::InvalidImage(format!(
                "{}x{} exceeds the device limit of {}",
                width, height, ctx.max_texture_dim
            )));
        }

        let size = wgpu::Extent3d { width, height, depth_or_array_layers: 1 };
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("SourceTexture"),
            size,
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SURFACE_FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });

        ctx.queue.write_texture(
            wgpu::ImageCopyTexture {
                texture: &texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            image.as_raw(),
            wgpu::ImageDataLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            size,
        );

        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("SourceTexture bind group"),
            layout: bind_group_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniforms.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(sampler),
                },
            ],
        });

        Ok(Self { texture, view, bind_group, width, height })
    }
}

/// Render target the film program draws into.  Sized to the source image.
pub struct OffscreenSurface {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub width: u32,
    pub height: u32,
    /// Reused MAP_READ buffer and its size in bytes.
    staging: Option<(wgpu::Buffer, u64)>,
}

impl OffscreenSurface {
    pub fn new(ctx: &GpuContext, width: u32, height: u32) -> Result<Self, RenderError> {
        if width == 0 || height == 0 || !ctx.supports_size(width, height) {
            return Err(RenderError::InvalidImage(format!(
                "cannot create a {}x{} surface",
                width, height
            )));
        }
        let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
            label: Some("OffscreenSurface"),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: SURFACE_FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Ok(Self { texture, view, width, height, staging: None })
    }

    /// Copy the surface to host memory as tightly packed RGBA rows.
    pub fn read_back(&mut self, ctx: &GpuContext) -> Result<RgbaImage, RenderError> {
        let device = &ctx.device;
        let (width, height) = (self.width, self.height);

        let bytes_per_row = aligned_bytes_per_row(width);
        let buffer_size = (bytes_per_row * height) as u64;

        let reuse = matches!(&self.staging, Some((_, sz)) if *sz >= buffer_size);
        if !reuse {
            let buf = device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("readback_staging"),
                size: buffer_size,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            });
            self.staging = Some((buf, buffer_size));
        }
        let Some((staging, _)) = self.staging.as_ref() else {
            return Err(RenderError::ExportFailed("no staging buffer".into()));
        };

        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("readback_encoder"),
        });
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture: &self.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: staging,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(bytes_per_row),
                    rows_per_image: Some(height),
                },
            },
            wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
        );
        ctx.submit_one(encoder);

        let slice = staging.slice(..buffer_size);
        let (tx, rx) = std::sync::mpsc::channel();
        slice.map_async(wgpu::MapMode::Read, move |result| {
            let _ = tx.send(result);
        });
        device.poll(wgpu::Maintain::Wait);
        match rx.recv() {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                log::error!("[GPU] readback map error: {:?}", e);
                ctx.mark_lost();
                return Err(RenderError::ContextLost(format!("buffer map failed: {e}")));
            }
            Err(e) => {
                log::error!("[GPU] readback channel error: {:?}", e);
                return Err(RenderError::ExportFailed(format!("readback channel closed: {e}")));
            }
        }

        let pixels = {
            let mapped = slice.get_mapped_range();
            strip_row_padding(&mapped, width, height, bytes_per_row)
        };
        staging.unmap();

        RgbaImage::from_raw(width, height, pixels)
            .ok_or_else(|| RenderError::ExportFailed("readback size mismatch".into()))
    }
}

/// Round `width * 4` up to `COPY_BYTES_PER_ROW_ALIGNMENT`.
pub fn aligned_bytes_per_row(width: u32) -> u32 {
    let unaligned = width * 4;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    unaligned.div_ceil(align) * align
}

fn strip_row_padding(padded: &[u8], width: u32, height: u32, bytes_per_row: u32) -> Vec<u8> {
    let actual_row = (width * 4) as usize;
    let mut result = Vec::with_capacity(actual_row * height as usize);
    for y in 0..height as usize {
        let start = y * bytes_per_row as usize;
        result.extend_from_slice(&padded[start..start + actual_row]);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_align_to_copy_granularity() {
        assert_eq!(aligned_bytes_per_row(1), 256);
        assert_eq!(aligned_bytes_per_row(64), 256);
        assert_eq!(aligned_bytes_per_row(65), 512);
    }

    #[test]
    fn padding_is_stripped_per_row() {
        let mut padded = vec![0u8; 512];
        padded[..8].copy_from_slice(&[1, 2, 3, 4, 5, 6, 7, 8]);
        padded[256..264].copy_from_slice(&[9, 10, 11, 12, 13, 14, 15, 16]);
        let packed = strip_row_padding(&padded, 2, 2, 256);
        assert_eq!(packed, (1..=16).collect::<Vec<u8>>());
    }
}
