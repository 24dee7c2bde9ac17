//! GPU storage for instanced drawing.
//!
//! ## Key Concepts
//!
//! - **Instance Store**: per-instance world transforms, the input of both
//!   culling and drawing
//! - **Visibility Buffers**: compacted visible indices plus the atomic count
//! - **Indirect Command**: `DrawIndexedIndirect` record whose instance count
//!   is patched from the atomic count every frame

mod indirect;
mod instance_data;
mod store;
mod visibility_buffers;

pub use indirect::{CommandState, IndirectDrawCommand};
pub use instance_data::{
    CameraUniform, CullUniforms, DrawIndexedIndirectArgs, InstanceTransform, Vertex,
};
pub use store::{transform_bytes, InstanceStore};
pub use visibility_buffers::VisibilityBuffers;
