//! # Throng Rendering
//!
//! GPU-resident visibility pipeline for drawing one mesh many times:
//! - Per-instance frustum test in a compute kernel, one invocation per instance
//! - Lock-free compaction of visible indices with a single atomic counter
//! - Indirect draw whose instance count is patched on the device every frame
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                        FRAME PIPELINE                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │  View×Proj → FrustumPlanes ─┐                                 │
//! │  InstanceStore ─────────────┼→ VisibilityCompactor (compute)  │
//! │  ObjectBounds ──────────────┘        ↓                        │
//! │                     visible[] + VisibleCount                  │
//! │                                      ↓                        │
//! │              IndirectDrawCommand.instance_count ← copy        │
//! │                                      ↓                        │
//! │                       draw_indexed_indirect                   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The host never iterates or reads back the instance list on the draw path.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod context;
pub mod culling;
pub mod error;
pub mod instancing;
pub mod mesh;
pub mod pipeline;
pub mod readback;

pub use context::GpuContext;
pub use culling::{
    ClipDepth, FrustumPlanes, FrustumTracker, FrustumUpdate, HostCompactor, Plane,
    VisibilityCompactor, VisibilityResult,
};
pub use error::{RenderError, RenderResult};
pub use instancing::{
    CameraUniform, CommandState, DrawIndexedIndirectArgs, IndirectDrawCommand, InstanceStore,
    InstanceTransform, Vertex, VisibilityBuffers,
};
pub use mesh::{DrawCall, Drawable, InstancedMesh, MeshData};
pub use pipeline::{
    CullStats, CullingConfig, CullingPipeline, FallbackReason, FrameMode, FrameOutcome,
    FramePlan,
};
