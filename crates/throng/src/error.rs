//! # Application Error Types

use std::path::PathBuf;

use thiserror::Error;
use throng_rendering::RenderError;

/// Errors surfaced by the viewer outside the render loop.
#[derive(Error, Debug)]
pub enum AppError {
    /// The mesh file could not be read or parsed.
    #[error("failed to load mesh '{}': {reason}", path.display())]
    MeshLoad {
        /// Path given on the command line.
        path: PathBuf,
        /// Loader message.
        reason: String,
    },

    /// The mesh parsed but contains no triangles.
    #[error("mesh '{}' contains no triangles", path.display())]
    EmptyMesh {
        /// Path given on the command line.
        path: PathBuf,
    },

    /// The config file exists but could not be read or parsed.
    #[error("config '{}': {reason}", path.display())]
    Config {
        /// Config file path.
        path: PathBuf,
        /// Read or parse message.
        reason: String,
    },

    /// Command line could not be used.
    #[error("usage: {0}")]
    Usage(String),

    /// GPU setup failed.
    #[error(transparent)]
    Render(#[from] RenderError),

    /// Window or event loop failure.
    #[error("window: {0}")]
    Window(String),
}

/// Result type for application operations.
pub type AppResult<T> = Result<T, AppError>;
