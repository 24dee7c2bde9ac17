//! Device acquisition.

use crate::error::{RenderError, RenderResult};

/// Adapter, device and queue.
pub struct GpuContext {
    /// Selected adapter.
    pub adapter: wgpu::Adapter,
    /// Logical device.
    pub device: wgpu::Device,
    /// Submission queue.
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Requests a device compatible with `surface` (if any).
    ///
    /// # Errors
    ///
    /// [`RenderError::NoAdapter`] if nothing matches, or
    /// [`RenderError::DeviceRequest`] if the adapter refuses.
    pub async fn request(
        instance: &wgpu::Instance,
        surface: Option<&wgpu::Surface<'_>>,
    ) -> RenderResult<Self> {
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: surface,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderError::NoAdapter)?;

        let info = adapter.get_info();
        tracing::info!("GPU: {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Throng Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default().using_resolution(adapter.limits()),
                },
                None,
            )
            .await?;

        Ok(Self { adapter, device, queue })
    }

    /// Blocking headless device, for tools and tests.
    ///
    /// # Errors
    ///
    /// See [`GpuContext::request`].
    pub fn headless() -> RenderResult<Self> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        pollster::block_on(Self::request(&instance, None))
    }
}
