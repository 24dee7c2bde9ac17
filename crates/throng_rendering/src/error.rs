//! # Rendering Error Types
//!
//! All errors that can surface from the GPU side of the pipeline.

use thiserror::Error;

/// Errors that can occur while setting up or driving the GPU pipeline.
#[derive(Error, Debug)]
pub enum RenderError {
    /// No adapter matched the request (headless machine, no driver).
    #[error("no compatible GPU adapter found")]
    NoAdapter,

    /// The adapter refused to create a device.
    #[error("device request failed: {0}")]
    DeviceRequest(#[from] wgpu::RequestDeviceError),

    /// The culling kernel failed validation (compile or pipeline creation).
    #[error("culling kernel unavailable: {0}")]
    KernelBuild(String),

    /// A read-back buffer could not be mapped.
    #[error("buffer map failed: {0}")]
    BufferMap(#[from] wgpu::BufferAsyncError),

    /// More instances than a single storage binding can hold.
    #[error("instance overflow: requested {requested}, maximum {max}")]
    InstanceOverflow {
        /// Number of instances requested.
        requested: usize,
        /// Hard capacity.
        max: usize,
    },
}

/// Result type for rendering operations.
pub type RenderResult<T> = Result<T, RenderError>;
