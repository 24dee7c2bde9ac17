//! Instance transform storage.
//!
//! The host keeps two staging vectors: the one mirrored on the GPU and the
//! one new transforms are staged into. `commit` swaps them at the start of a
//! frame, before any dispatch is encoded, so the kernel never sees a
//! half-written array. The device buffer is only reallocated when the count
//! outgrows its capacity; every reallocation bumps `generation`, which
//! invalidates bind groups cached against the old buffer.

use throng_shared::constants::MAX_INSTANCES;
use throng_shared::math::Mat4;

use super::instance_data::InstanceTransform;
use crate::error::{RenderError, RenderResult};

/// Size in bytes of `count` transforms.
#[must_use]
pub fn transform_bytes(count: usize) -> wgpu::BufferAddress {
    (count * std::mem::size_of::<InstanceTransform>()) as wgpu::BufferAddress
}

/// GPU-resident array of per-instance world transforms.
pub struct InstanceStore {
    /// Host staging (double buffered). `staging[committed]` mirrors the device.
    staging: [Vec<InstanceTransform>; 2],
    committed: usize,
    pending: bool,
    buffer: Option<wgpu::Buffer>,
    capacity: usize,
    generation: u64,
}

impl Default for InstanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InstanceStore {
    /// Creates an empty store with no device allocation.
    #[must_use]
    pub fn new() -> Self {
        Self {
            staging: [Vec::new(), Vec::new()],
            committed: 0,
            pending: false,
            buffer: None,
            capacity: 0,
            generation: 0,
        }
    }

    /// Stages a replacement instance array for the next `commit`.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InstanceOverflow`] above [`MAX_INSTANCES`].
    pub fn stage(&mut self, transforms: &[Mat4]) -> RenderResult<()> {
        if transforms.len() > MAX_INSTANCES {
            return Err(RenderError::InstanceOverflow {
                requested: transforms.len(),
                max: MAX_INSTANCES,
            });
        }
        let back = &mut self.staging[1 - self.committed];
        back.clear();
        back.extend(transforms.iter().copied().map(InstanceTransform::from));
        self.pending = true;
        Ok(())
    }

    /// True if staged data is waiting for `commit`.
    #[must_use]
    pub const fn has_pending(&self) -> bool {
        self.pending
    }

    /// Instance count after the next `commit`.
    #[must_use]
    pub fn staged_len(&self) -> usize {
        if self.pending {
            self.staging[1 - self.committed].len()
        } else {
            self.len()
        }
    }

    /// Uploads staged transforms, growing the device buffer if needed.
    ///
    /// Returns `true` when the buffer was reallocated.
    pub fn commit(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) -> bool {
        if !self.pending {
            return false;
        }
        self.committed = 1 - self.committed;
        self.pending = false;

        let len = self.staging[self.committed].len();
        let reallocated = self.buffer.is_none() || len > self.capacity;
        if reallocated {
            let capacity = len.max(1);
            self.buffer = Some(device.create_buffer(&wgpu::BufferDescriptor {
                label: Some("Instance Transforms"),
                size: transform_bytes(capacity),
                usage: wgpu::BufferUsages::STORAGE | wgpu::BufferUsages::COPY_DST,
                mapped_at_creation: false,
            }));
            self.capacity = capacity;
            self.generation += 1;
            tracing::info!(
                "instance buffer allocated: {} slots, generation {}",
                capacity,
                self.generation
            );
        }

        if let Some(buffer) = &self.buffer {
            if len > 0 {
                queue.write_buffer(buffer, 0, bytemuck::cast_slice(&self.staging[self.committed]));
            }
        }
        reallocated
    }

    /// True once an instance array has been committed to the device.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.buffer.is_some()
    }

    /// Number of committed instances (N).
    #[must_use]
    pub fn len(&self) -> usize {
        self.staging[self.committed].len()
    }

    /// True if no instances are committed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Committed instance count as the GPU sees it.
    #[must_use]
    pub fn count_u32(&self) -> u32 {
        u32::try_from(self.len()).unwrap_or(u32::MAX)
    }

    /// Device slots currently allocated.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bumped on every device reallocation.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Committed transforms (host mirror of the device buffer).
    #[must_use]
    pub fn transforms(&self) -> &[InstanceTransform] {
        &self.staging[self.committed]
    }

    /// Device buffer, once committed.
    #[must_use]
    pub fn buffer(&self) -> Option<&wgpu::Buffer> {
        self.buffer.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use throng_shared::math::{translation, IDENTITY};

    #[test]
    fn test_stage_does_not_touch_committed() {
        let mut store = InstanceStore::new();
        assert!(!store.is_ready());
        assert!(!store.has_pending());

        store.stage(&[IDENTITY, translation([1.0, 0.0, 0.0])]).unwrap();
        assert!(store.has_pending());
        assert!(store.is_empty());
        assert_eq!(store.staged_len(), 2);
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_restage_replaces_pending() {
        let mut store = InstanceStore::new();
        store.stage(&[IDENTITY; 5]).unwrap();
        store.stage(&[IDENTITY; 2]).unwrap();
        assert!(store.has_pending());
        assert_eq!(store.staging[1].len(), 2);
    }

    #[test]
    fn test_transform_bytes() {
        assert_eq!(transform_bytes(0), 0);
        assert_eq!(transform_bytes(1000), 64_000);
    }
}
