//! # THRONG Shared
//!
//! Device-independent building blocks of the instancing pipeline.
//!
//! ## CRITICAL RULE
//!
//! This crate must NEVER depend on:
//! - `wgpu`
//! - `winit`
//! - Any GPU or window-related crate
//!
//! If you need graphics types, put them in `throng_rendering`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bounds;
pub mod constants;
pub mod math;
pub mod placement;

pub use bounds::ObjectBounds;
pub use constants::{MAX_INSTANCES, PLANE_COUNT, WORKGROUP_SIZE};
pub use math::Mat4;
pub use placement::{Layout, PlacementParams};
