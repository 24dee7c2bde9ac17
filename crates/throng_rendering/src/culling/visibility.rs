//! Per-instance visibility test and the host reference compactor.
//!
//! The GPU kernel in `visibility_cull.wgsl` evaluates exactly the same
//! predicate as [`instance_visible`]. [`HostCompactor`] replays the
//! kernel's dispatch on CPU threads (one logical invocation per instance,
//! grouped into work-groups of [`WORKGROUP_SIZE`], slots claimed with a
//! single atomic fetch-add) so the compaction protocol can be verified on
//! machines without an adapter.

use std::sync::atomic::{AtomicU32, Ordering};

use throng_shared::bounds::ObjectBounds;
use throng_shared::constants::WORKGROUP_SIZE;
use throng_shared::math::{transform_point, Mat4};

use super::frustum::FrustumPlanes;

/// World-space box enclosing a transformed object-space box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldBox {
    /// World-space center.
    pub center: [f32; 3],
    /// Conservative world-space half-extents.
    pub half_extents: [f32; 3],
}

/// Transforms `bounds` by `model`.
///
/// The center goes through the full affine transform. The half-extents go
/// through the linear 3x3 part with every entry replaced by its absolute
/// value, which yields an axis-aligned box enclosing the rotated and scaled
/// object box.
#[must_use]
pub fn transform_bounds(model: &Mat4, bounds: &ObjectBounds) -> WorldBox {
    let center = transform_point(model, bounds.center());
    let h = bounds.half_extents();

    let mut half_extents = [0.0; 3];
    for (row, out) in half_extents.iter_mut().enumerate() {
        *out = model[0][row].abs() * h[0] + model[1][row].abs() * h[1] + model[2][row].abs() * h[2];
    }

    WorldBox { center, half_extents }
}

/// True unless the box lies entirely behind at least one plane.
#[must_use]
pub fn box_visible(frustum: &FrustumPlanes, world: &WorldBox) -> bool {
    frustum.planes.iter().all(|plane| {
        let distance = plane.distance_to_point(world.center);
        let radius = plane.a.abs() * world.half_extents[0]
            + plane.b.abs() * world.half_extents[1]
            + plane.c.abs() * world.half_extents[2];
        distance >= -radius
    })
}

/// Culling predicate for one instance.
#[inline]
#[must_use]
pub fn instance_visible(frustum: &FrustumPlanes, bounds: &ObjectBounds, model: &Mat4) -> bool {
    box_visible(frustum, &transform_bounds(model, bounds))
}

/// Number of work-groups needed for `instance_count` invocations.
#[must_use]
pub const fn workgroup_count(instance_count: u32) -> u32 {
    instance_count.div_ceil(WORKGROUP_SIZE)
}

/// Output of one compaction pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityResult {
    /// Compacted instance indices, in slot order. Length equals `visible_count`.
    pub indices: Vec<u32>,
    /// Final value of the atomic counter.
    pub visible_count: u32,
    /// Work-groups dispatched.
    pub workgroups: u32,
}

impl VisibilityResult {
    /// Indices sorted ascending, for order-independent comparison.
    #[must_use]
    pub fn sorted_indices(&self) -> Vec<u32> {
        let mut sorted = self.indices.clone();
        sorted.sort_unstable();
        sorted
    }
}

/// CPU replay of the culling kernel's dispatch and compaction protocol.
#[derive(Debug, Clone, Copy)]
pub struct HostCompactor {
    workers: usize,
}

impl Default for HostCompactor {
    fn default() -> Self {
        Self::new(std::thread::available_parallelism().map_or(4, usize::from))
    }
}

impl HostCompactor {
    /// Creates a compactor spreading work-groups across `workers` threads.
    #[must_use]
    pub fn new(workers: usize) -> Self {
        Self { workers: workers.max(1) }
    }

    /// Runs one pass over `transforms`.
    ///
    /// The counter starts at zero every call and the output is fully
    /// overwritten. A zero-length instance array dispatches nothing.
    #[must_use]
    pub fn dispatch(
        &self,
        frustum: &FrustumPlanes,
        bounds: &ObjectBounds,
        transforms: &[Mat4],
    ) -> VisibilityResult {
        let count = u32::try_from(transforms.len()).unwrap_or(u32::MAX);
        let workgroups = workgroup_count(count);
        if workgroups == 0 {
            return VisibilityResult::default();
        }

        let counter = AtomicU32::new(0);
        let slots: Vec<AtomicU32> = (0..count).map(|_| AtomicU32::new(u32::MAX)).collect();
        let next_group = AtomicU32::new(0);

        std::thread::scope(|scope| {
            for _ in 0..self.workers.min(workgroups as usize) {
                scope.spawn(|| loop {
                    let group = next_group.fetch_add(1, Ordering::Relaxed);
                    if group >= workgroups {
                        break;
                    }
                    for local in 0..WORKGROUP_SIZE {
                        let id = group * WORKGROUP_SIZE + local;
                        // rounding tail
                        if id >= count {
                            continue;
                        }
                        if instance_visible(frustum, bounds, &transforms[id as usize]) {
                            let slot = counter.fetch_add(1, Ordering::Relaxed);
                            slots[slot as usize].store(id, Ordering::Relaxed);
                        }
                    }
                });
            }
        });

        let visible_count = counter.into_inner();
        let indices = slots
            .into_iter()
            .take(visible_count as usize)
            .map(AtomicU32::into_inner)
            .collect();

        VisibilityResult {
            indices,
            visible_count,
            workgroups,
        }
    }
}
