//! Host read-back of small GPU buffers.
//!
//! Never on the draw path: the orchestrator only uses this for periodic
//! statistics, and the tests use the blocking variant to inspect kernel
//! output.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{RenderError, RenderResult};

type MapSlot = Arc<Mutex<Option<Result<(), wgpu::BufferAsyncError>>>>;

/// Copies `size` bytes of `source` into a fresh staging buffer and blocks
/// until they are mapped.
///
/// # Errors
///
/// Returns [`RenderError::BufferMap`] if mapping fails.
pub fn read_buffer_blocking(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    size: wgpu::BufferAddress,
) -> RenderResult<Vec<u8>> {
    if size == 0 {
        return Ok(Vec::new());
    }

    let staging = device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Readback Staging"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    });

    let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
        label: Some("Readback Encoder"),
    });
    encoder.copy_buffer_to_buffer(source, 0, &staging, 0, size);
    queue.submit(Some(encoder.finish()));

    let slot: MapSlot = Arc::new(Mutex::new(None));
    let callback_slot = Arc::clone(&slot);
    let slice = staging.slice(..);
    slice.map_async(wgpu::MapMode::Read, move |result| {
        *callback_slot.lock() = Some(result);
    });
    let _ = device.poll(wgpu::Maintain::Wait);

    match slot.lock().take() {
        Some(Ok(())) => {}
        Some(Err(err)) => return Err(RenderError::BufferMap(err)),
        None => return Err(RenderError::BufferMap(wgpu::BufferAsyncError)),
    }

    let bytes = slice.get_mapped_range().to_vec();
    staging.unmap();
    Ok(bytes)
}

/// Reads a `u32` array back from the GPU.
///
/// # Errors
///
/// Returns [`RenderError::BufferMap`] if mapping fails.
pub fn read_u32s_blocking(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    source: &wgpu::Buffer,
    count: usize,
) -> RenderResult<Vec<u32>> {
    let size = (count * std::mem::size_of::<u32>()) as wgpu::BufferAddress;
    let bytes = read_buffer_blocking(device, queue, source, size)?;
    Ok(bytes
        .chunks_exact(4)
        .map(|w| u32::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect())
}

/// Non-blocking read-back of a single `u32` counter.
///
/// `encode_copy` snapshots the counter into a private staging buffer as part
/// of a frame's command stream; `begin` maps it after submission; `poll`
/// returns the value once the map completes. At most one read is in flight.
pub struct CounterReadback {
    staging: wgpu::Buffer,
    slot: MapSlot,
    copied: bool,
    in_flight: bool,
}

impl CounterReadback {
    /// Creates the 4-byte staging buffer.
    #[must_use]
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            staging: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Visible Count Readback"),
                size: 4,
                usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            slot: Arc::new(Mutex::new(None)),
            copied: false,
            in_flight: false,
        }
    }

    /// True while a map request is outstanding.
    #[must_use]
    pub const fn is_busy(&self) -> bool {
        self.copied || self.in_flight
    }

    /// Encodes a copy of `counter` into the staging buffer.
    ///
    /// Returns `false` (and encodes nothing) while a previous read is busy.
    pub fn encode_copy(&mut self, encoder: &mut wgpu::CommandEncoder, counter: &wgpu::Buffer) -> bool {
        if self.is_busy() {
            return false;
        }
        encoder.copy_buffer_to_buffer(counter, 0, &self.staging, 0, 4);
        self.copied = true;
        true
    }

    /// Requests the map. Call after the frame containing the copy is submitted.
    pub fn begin(&mut self) {
        if !self.copied || self.in_flight {
            return;
        }
        self.copied = false;
        self.in_flight = true;
        let slot = Arc::clone(&self.slot);
        self.staging
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| {
                *slot.lock() = Some(result);
            });
    }

    /// Returns the counter value if the outstanding map has completed.
    pub fn poll(&mut self, device: &wgpu::Device) -> Option<u32> {
        if !self.in_flight {
            return None;
        }
        let _ = device.poll(wgpu::Maintain::Poll);

        let result = self.slot.lock().take()?;
        self.in_flight = false;
        match result {
            Ok(()) => {
                let value = {
                    let data = self.staging.slice(..).get_mapped_range();
                    u32::from_le_bytes([data[0], data[1], data[2], data[3]])
                };
                self.staging.unmap();
                Some(value)
            }
            Err(err) => {
                tracing::warn!("visible count read-back failed: {}", err);
                None
            }
        }
    }
}
