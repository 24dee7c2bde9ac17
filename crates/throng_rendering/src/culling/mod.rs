//! Frustum culling for instanced draws.
//!
//! Plane math and the per-instance predicate live on the host; the
//! compaction itself runs in the GPU kernel driven by
//! [`VisibilityCompactor`].

mod compactor;
mod frustum;
mod visibility;

pub use compactor::{VisibilityCompactor, CULLING_SHADER};
pub use frustum::{ClipDepth, FrustumPlanes, FrustumTracker, FrustumUpdate, Plane};
pub use visibility::{
    box_visible, instance_visible, transform_bounds, workgroup_count, HostCompactor,
    VisibilityResult, WorldBox,
};
