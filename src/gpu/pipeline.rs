// ============================================================================
// FILM PIPELINE — uniform layout, quad vertices and render pipeline creation
// ============================================================================

use bytemuck::{Pod, Zeroable};

use crate::error::{RenderError, ShaderStage};
use crate::ops::film::FrameInputs;

/// Offscreen target and source texture format.  Plain UNORM: the film model
/// works on stored sRGB values unless `linear_light` is set.
pub const SURFACE_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

// ============================================================================
// UNIFORMS
// ============================================================================

/// Per-frame uniforms.  Field order mirrors `FilmUniforms` in the WGSL source;
/// every vec4 lands on a 16-byte boundary.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FilmUniforms {
    pub resolution: [f32; 2],
    pub time: f32,
    pub linear_light: f32,
    pub grain: f32,
    pub grain_size: f32,
    pub warmth: f32,
    pub contrast: f32,
    pub saturation: f32,
    pub highlights: f32,
    pub shadows: f32,
    pub halation: f32,
    pub bloom: f32,
    pub vignette: f32,
    pub fade: f32,
    pub black_and_white: f32,
    pub red_curve: [f32; 4],
    pub green_curve: [f32; 4],
    pub blue_curve: [f32; 4],
    pub halation_tint: [f32; 4],
    pub halation_threshold: f32,
    pub halation_radius: f32,
    pub halation_samples: u32,
    pub bloom_threshold: f32,
    pub bloom_radius: f32,
    pub bloom_gain: f32,
    pub bloom_samples: u32,
    pub grain_octaves: u32,
    pub grain_amplitude: f32,
    pub grain_mask_exponent: f32,
    pub grain_mask_gain: f32,
    pub grain_chroma: f32,
    pub grain_drift: f32,
    pub warmth_red: f32,
    pub warmth_blue: f32,
    pub fade_lift: f32,
    pub vignette_strength: f32,
    pub vignette_inner: f32,
    pub monochrome: f32,
    pub _pad: f32,
}

fn flag(b: bool) -> f32 {
    if b { 1.0 } else { 0.0 }
}

fn curve4(c: crate::params::CurveTriple) -> [f32; 4] {
    [c.toe, c.mid, c.shoulder, 0.0]
}

impl FilmUniforms {
    pub fn from_frame(frame: &FrameInputs) -> Self {
        let p = &frame.params;
        let t = &frame.tuning;
        Self {
            resolution: frame.resolution,
            time: frame.time,
            linear_light: flag(t.linear_light),
            grain: p.grain_intensity,
            grain_size: p.grain_size,
            warmth: p.signed_warmth(),
            contrast: p.contrast_strength(),
            saturation: p.saturation,
            highlights: p.highlights,
            shadows: p.shadows,
            halation: p.halation,
            bloom: p.bloom,
            vignette: p.vignette,
            fade: p.fade,
            black_and_white: flag(p.black_and_white),
            red_curve: curve4(p.red_curve),
            green_curve: curve4(p.green_curve),
            blue_curve: curve4(p.blue_curve),
            halation_tint: [t.halation_tint[0], t.halation_tint[1], t.halation_tint[2], t.halation_gain],
            halation_threshold: t.halation_threshold,
            halation_radius: t.halation_radius,
            halation_samples: t.halation_samples,
            bloom_threshold: t.bloom_threshold,
            bloom_radius: t.bloom_radius,
            bloom_gain: t.bloom_gain,
            bloom_samples: t.bloom_samples,
            grain_octaves: t.grain_octaves,
            grain_amplitude: t.grain_amplitude,
            grain_mask_exponent: t.grain_mask_exponent,
            grain_mask_gain: t.grain_mask_gain,
            grain_chroma: t.grain_chroma,
            grain_drift: t.grain_drift,
            warmth_red: t.warmth_red,
            warmth_blue: t.warmth_blue,
            fade_lift: t.fade_lift,
            vignette_strength: t.vignette_strength,
            vignette_inner: t.vignette_inner,
            monochrome: flag(p.is_monochrome()),
            _pad: 0.0,
        }
    }
}

// ============================================================================
// GEOMETRY
// ============================================================================

#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct QuadVertex {
    pub position: [f32; 2],
    pub uv: [f32; 2],
}

/// Two triangles covering clip space; uv (0,0) is the top-left texel.
pub const QUAD_VERTICES: [QuadVertex; 6] = [
    QuadVertex { position: [-1.0, -1.0], uv: [0.0, 1.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
    QuadVertex { position: [-1.0, 1.0], uv: [0.0, 0.0] },
    QuadVertex { position: [1.0, -1.0], uv: [1.0, 1.0] },
    QuadVertex { position: [1.0, 1.0], uv: [1.0, 0.0] },
];

const QUAD_ATTRIBUTES: [wgpu::VertexAttribute; 2] =
    wgpu::vertex_attr_array![0 => Float32x2, 1 => Float32x2];

pub fn quad_layout() -> wgpu::VertexBufferLayout<'static> {
    wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<QuadVertex>() as wgpu::BufferAddress,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &QUAD_ATTRIBUTES,
    }
}

// ============================================================================
// BIND GROUP LAYOUT + PIPELINE
// ============================================================================

/// Group 0: uniforms (0), source texture (1), sampler (2).
pub fn create_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("film_bgl"),
        entries: &[
            wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Texture {
                    sample_type: wgpu::TextureSampleType::Float { filterable: true },
                    view_dimension: wgpu::TextureViewDimension::D2,
                    multisampled: false,
                },
                count: None,
            },
            wgpu::BindGroupLayoutEntry {
                binding: 2,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                count: None,
            },
        ],
    })
}

/// Linear, clamp-to-edge: neighbourhood taps past the border repeat the edge.
pub fn create_sampler(device: &wgpu::Device) -> wgpu::Sampler {
    device.create_sampler(&wgpu::SamplerDescriptor {
        label: Some("film_sampler"),
        address_mode_u: wgpu::AddressMode::ClampToEdge,
        address_mode_v: wgpu::AddressMode::ClampToEdge,
        address_mode_w: wgpu::AddressMode::ClampToEdge,
        mag_filter: wgpu::FilterMode::Linear,
        min_filter: wgpu::FilterMode::Linear,
        mipmap_filter: wgpu::FilterMode::Nearest,
        ..Default::default()
    })
}

/// Compile one stage inside a validation scope.
pub fn compile_stage(
    device: &wgpu::Device,
    source: &str,
    stage: ShaderStage,
) -> Result<wgpu::ShaderModule, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(match stage {
            ShaderStage::Vertex => "film_vertex",
            ShaderStage::Fragment => "film_fragment",
        }),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });
    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        let log = err.to_string();
        log::error!("[GPU] {} shader compile failed: {}", stage, log);
        return Err(RenderError::ShaderCompileFailed { stage, log });
    }
    Ok(module)
}

/// Link both stages into a render pipeline targeting [`SURFACE_FORMAT`].
pub fn link_program(
    device: &wgpu::Device,
    bind_group_layout: &wgpu::BindGroupLayout,
    vertex: &wgpu::ShaderModule,
    fragment: &wgpu::ShaderModule,
) -> Result<wgpu::RenderPipeline, RenderError> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);

    let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some("film_pipeline_layout"),
        bind_group_layouts: &[bind_group_layout],
        push_constant_ranges: &[],
    });

    let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some("film_pipeline"),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: vertex,
            entry_point: "vs_main",
            buffers: &[quad_layout()],
            compilation_options: Default::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            ..Default::default()
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: fragment,
            entry_point: "fs_main",
            targets: &[Some(wgpu::ColorTargetState {
                format: SURFACE_FORMAT,
                blend: None,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: Default::default(),
        }),
        multiview: None,
    });

    if let Some(err) = pollster::block_on(device.pop_error_scope()) {
        let log = err.to_string();
        log::error!("[GPU] program link failed: {}", log);
        return Err(RenderError::ProgramLinkFailed(log));
    }
    Ok(pipeline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::film::FilmTuning;
    use crate::params::FilmParameters;

    #[test]
    fn uniform_block_matches_wgsl_layout() {
        assert_eq!(std::mem::size_of::<FilmUniforms>(), 208);
        assert_eq!(std::mem::offset_of!(FilmUniforms, red_curve), 64);
        assert_eq!(std::mem::offset_of!(FilmUniforms, halation_tint), 112);
        assert_eq!(std::mem::offset_of!(FilmUniforms, monochrome), 200);
    }

    #[test]
    fn neutral_uniforms_encode_neutral_strengths() {
        let frame = FrameInputs::new(&FilmParameters::neutral(), &FilmTuning::default(), 4, 2, 0.5);
        let u = FilmUniforms::from_frame(&frame);
        assert_eq!(u.warmth, 0.0);
        assert_eq!(u.contrast, 1.0);
        assert_eq!(u.resolution, [4.0, 2.0]);
        assert_eq!(u.monochrome, 0.0);
        assert_eq!(u.red_curve, [1.0, 1.0, 1.0, 0.0]);
    }
}
