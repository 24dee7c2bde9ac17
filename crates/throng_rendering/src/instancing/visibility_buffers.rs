//! Compactor output: the visibility list and the atomic visible count.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::RenderResult;
use crate::readback;

static NEXT_GENERATION: AtomicU64 = AtomicU64::new(1);

fn next_generation() -> u64 {
    NEXT_GENERATION.fetch_add(1, Ordering::Relaxed)
}

/// Device buffers written by the culling kernel every frame.
///
/// Both are fully overwritten each frame. The counter is cleared on the GPU
/// timeline right before the dispatch, never from the host.
pub struct VisibilityBuffers {
    visible: wgpu::Buffer,
    counter: wgpu::Buffer,
    capacity: usize,
    generation: u64,
}

impl VisibilityBuffers {
    /// Allocates room for `capacity` indices (at least one).
    #[must_use]
    pub fn new(device: &wgpu::Device, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            visible: Self::create_list(device, capacity),
            counter: device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Visible Count"),
                size: 4,
                usage: wgpu::BufferUsages::STORAGE
                    | wgpu::BufferUsages::COPY_SRC
                    | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }),
            capacity,
            generation: next_generation(),
        }
    }

    fn create_list(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Visibility List"),
            size: (capacity * std::mem::size_of::<u32>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_SRC,
            mapped_at_creation: false,
        })
    }

    /// Grows the list to hold `count` indices. Returns `true` on reallocation.
    pub fn ensure_capacity(&mut self, device: &wgpu::Device, count: usize) -> bool {
        if count <= self.capacity {
            return false;
        }
        self.visible = Self::create_list(device, count);
        self.capacity = count;
        self.generation = next_generation();
        tracing::debug!("visibility list grown to {} slots", count);
        true
    }

    /// Encodes `VisibleCount = 0` on the GPU timeline.
    pub fn encode_reset(&self, encoder: &mut wgpu::CommandEncoder) {
        encoder.clear_buffer(&self.counter, 0, None);
    }

    /// Compacted index list.
    #[must_use]
    pub const fn visible(&self) -> &wgpu::Buffer {
        &self.visible
    }

    /// Atomic visible counter.
    #[must_use]
    pub const fn counter(&self) -> &wgpu::Buffer {
        &self.counter
    }

    /// Index slots allocated.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Identifies the current list allocation.
    ///
    /// Unique across every `VisibilityBuffers` in the process, so two
    /// pipelines sharing a mesh never see the same key.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Blocking read of the visible count.
    ///
    /// # Errors
    ///
    /// Propagates map failures.
    pub fn read_count(&self, device: &wgpu::Device, queue: &wgpu::Queue) -> RenderResult<u32> {
        let words = readback::read_u32s_blocking(device, queue, &self.counter, 1)?;
        Ok(words.first().copied().unwrap_or(0))
    }

    /// Blocking read of the first `count` list entries.
    ///
    /// # Errors
    ///
    /// Propagates map failures.
    pub fn read_indices(
        &self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        count: u32,
    ) -> RenderResult<Vec<u32>> {
        let count = (count as usize).min(self.capacity);
        readback::read_u32s_blocking(device, queue, &self.visible, count)
    }
}
