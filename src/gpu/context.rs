// ============================================================================
// GPU CONTEXT — wgpu Device, Queue, and adapter initialization
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::RenderError;

/// Core wgpu resources for one renderer.  Headless: the film program draws
/// into an offscreen texture and the host reads it back.
pub struct GpuContext {
    pub device: Arc<wgpu::Device>,
    pub queue: Arc<wgpu::Queue>,
    pub adapter_name: String,
    /// Maximum texture dimension supported by this device.
    pub max_texture_dim: u32,
    lost: Arc<AtomicBool>,
}

impl GpuContext {
    /// Tries a hardware adapter first, then the software rasterizer
    /// (`force_fallback_adapter`).
    pub fn new(preferred_gpu: &str) -> Result<Self, RenderError> {
        if let Some(ctx) = pollster::block_on(Self::new_async(preferred_gpu, false)) {
            return Ok(ctx);
        }
        log::warn!("[GPU] hardware adapter unavailable, trying software fallback");
        pollster::block_on(Self::new_async(preferred_gpu, true)).ok_or_else(|| {
            RenderError::ContextUnavailable("no wgpu adapter could be created".into())
        })
    }

    async fn new_async(preferred_gpu: &str, force_fallback: bool) -> Option<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let power = match preferred_gpu.to_lowercase().as_str() {
            "low power" | "low-power" | "integrated" => wgpu::PowerPreference::LowPower,
            _ => wgpu::PowerPreference::HighPerformance,
        };

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: power,
                compatible_surface: None,
                force_fallback_adapter: force_fallback,
            })
            .await?;

        let adapter_name = adapter.get_info().name.clone();
        let limits = adapter.limits();

        let (device, queue) = match adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("filmstock"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits {
                        max_texture_dimension_2d: limits.max_texture_dimension_2d,
                        ..wgpu::Limits::downlevel_defaults()
                    },
                },
                None,
            )
            .await
        {
            Ok(pair) => pair,
            Err(e) => {
                log::warn!("[GPU] request_device failed on '{}': {}", adapter_name, e);
                return None;
            }
        };

        // Anything not caught by an error scope marks the device unusable.
        let lost = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&lost);
        device.on_uncaptured_error(Box::new(move |err| {
            log::error!("[GPU] uncaptured device error: {}", err);
            flag.store(true, Ordering::SeqCst);
        }));

        log::info!("[GPU] using adapter '{}' (fallback: {})", adapter_name, force_fallback);

        Some(Self {
            device: Arc::new(device),
            queue: Arc::new(queue),
            adapter_name,
            max_texture_dim: limits.max_texture_dimension_2d,
            lost,
        })
    }

    /// Check if a texture of the given dimensions can be created.
    pub fn supports_size(&self, width: u32, height: u32) -> bool {
        width <= self.max_texture_dim && height <= self.max_texture_dim
    }

    pub fn is_lost(&self) -> bool {
        self.lost.load(Ordering::SeqCst)
    }

    pub fn mark_lost(&self) {
        self.lost.store(true, Ordering::SeqCst);
    }

    /// Submit a single encoder's commands.
    pub fn submit_one(&self, encoder: wgpu::CommandEncoder) {
        self.queue.submit(std::iter::once(encoder.finish()));
    }
}
