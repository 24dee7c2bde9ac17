//! # Pipeline Constants
//!
//! Values shared between the host code and the WGSL kernels.
//! **CRITICAL:** `WORKGROUP_SIZE` must match `@workgroup_size` in
//! `visibility_cull.wgsl`.

/// Threads per culling work-group.
pub const WORKGROUP_SIZE: u32 = 128;

/// Number of frustum planes (left, right, bottom, top, near, far).
pub const PLANE_COUNT: usize = 6;

/// Hard upper bound on instances of one mesh.
///
/// 2M transforms = 128MB, the default `max_storage_buffer_binding_size`.
pub const MAX_INSTANCES: usize = 2_097_152;

/// Seed used by the placement generator when none is configured.
pub const DEFAULT_SEED: u64 = 12_345;

/// Plane normals shorter than this mean the camera is not set up yet.
pub const DEGENERATE_PLANE_EPSILON: f32 = 1.0e-6;
