//! # THRONG
//!
//! Instanced mesh viewer around the GPU culling pipeline of
//! `throng_rendering`.
//!
//! ```text
//! throng_viewer <mesh-path> <instance-count> [grid|plane|scatter]
//! ```
//!
//! Controls: `C` toggles culling, `Space` pauses the orbit, `Escape` exits.
//!
//! Everything except the window loop lives here so it can be tested
//! without a display.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]
#![allow(clippy::module_name_repetitions)]

pub mod camera;
pub mod cli;
pub mod config;
pub mod error;
pub mod input;
pub mod mesh_loader;

pub use camera::OrbitCamera;
pub use cli::{parse_args, CliArgs};
pub use config::ViewerConfig;
pub use error::{AppError, AppResult};
pub use input::{EdgeToggle, InputAction, ViewerInput};
pub use mesh_loader::{load_mesh, MeshFormat};
