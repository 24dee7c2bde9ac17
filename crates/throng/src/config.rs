//! # Viewer Configuration
//!
//! Loaded once at startup from `$THRONG_CONFIG` or `assets/throng.toml`.
//! Every field has a default, so a partial file only overrides what it
//! names. A missing file means defaults; a malformed one is reported and
//! then replaced by defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use throng_rendering::{ClipDepth, CullingConfig};
use throng_shared::constants::DEFAULT_SEED;
use throng_shared::placement::{Layout, PlacementParams};

use crate::error::{AppError, AppResult};

/// Environment variable naming the config file.
pub const CONFIG_ENV: &str = "THRONG_CONFIG";

/// Config file used when the variable is unset.
pub const DEFAULT_CONFIG_PATH: &str = "assets/throng.toml";

/// Root of the config file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// `[window]`
    pub window: WindowSection,
    /// `[camera]`
    pub camera: CameraSection,
    /// `[placement]`
    pub placement: PlacementSection,
    /// `[culling]`
    pub culling: CullingSection,
}

/// `[window]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSection {
    /// Initial width in physical pixels.
    pub width: u32,
    /// Initial height in physical pixels.
    pub height: u32,
    /// Title bar text.
    pub title: String,
    /// Wait for vertical blank.
    pub vsync: bool,
}

impl Default for WindowSection {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
            title: "THRONG Viewer".to_owned(),
            vsync: true,
        }
    }
}

/// `[camera]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraSection {
    /// Vertical field of view.
    pub fov_y_degrees: f32,
    /// Near plane distance.
    pub near: f32,
    /// Far plane distance.
    pub far: f32,
    /// Orbit radius; derived from the scene extent when absent.
    pub orbit_radius: Option<f32>,
    /// Eye height above the orbit plane.
    pub orbit_height: f32,
    /// Radians per second.
    pub orbit_speed: f32,
}

impl Default for CameraSection {
    fn default() -> Self {
        Self {
            fov_y_degrees: 60.0,
            near: 0.1,
            far: 1000.0,
            orbit_radius: None,
            orbit_height: 10.0,
            orbit_speed: 0.2,
        }
    }
}

/// `[placement]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementSection {
    /// Grid cell spacing.
    pub spacing: f32,
    /// Positional jitter per axis.
    pub jitter: f32,
    /// RNG seed.
    pub seed: u64,
    /// Scale deviation per axis.
    pub scale_jitter: f32,
    /// Maximum yaw in degrees for grid layouts.
    pub yaw_jitter_degrees: f32,
    /// Scatter box minimum corner.
    pub scatter_min: [f32; 3],
    /// Scatter box maximum corner.
    pub scatter_max: [f32; 3],
}

impl Default for PlacementSection {
    fn default() -> Self {
        Self {
            spacing: 2.5,
            jitter: 0.25,
            seed: DEFAULT_SEED,
            scale_jitter: 0.1,
            yaw_jitter_degrees: 18.0,
            scatter_min: [-50.0, -10.0, -50.0],
            scatter_max: [50.0, 10.0, 50.0],
        }
    }
}

impl PlacementSection {
    /// Generator parameters for `count` instances in `layout`.
    #[must_use]
    pub fn params(&self, count: usize, layout: Layout) -> PlacementParams {
        PlacementParams {
            count,
            layout,
            spacing: self.spacing,
            jitter: self.jitter,
            scale_jitter: self.scale_jitter,
            yaw_jitter: self.yaw_jitter_degrees.to_radians(),
            seed: self.seed,
            scatter_min: self.scatter_min,
            scatter_max: self.scatter_max,
        }
    }
}

/// `[culling]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CullingSection {
    /// Culling on at startup (`C` toggles at runtime).
    pub enabled: bool,
    /// Frames between visible-count read-backs (0 = never).
    pub readback_interval: u32,
    /// Seconds of per-frame debug diagnostics after startup.
    pub diagnostic_seconds: f32,
}

impl Default for CullingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            readback_interval: 60,
            diagnostic_seconds: 3.0,
        }
    }
}

impl CullingSection {
    /// Runtime knobs for the culling stage. The viewer projects to 0..1 depth.
    #[must_use]
    pub const fn culling_config(&self) -> CullingConfig {
        CullingConfig {
            enabled: self.enabled,
            readback_interval: self.readback_interval,
            clip_depth: ClipDepth::ZeroToOne,
        }
    }
}

impl ViewerConfig {
    /// Parses a config document.
    ///
    /// # Errors
    ///
    /// [`AppError::Config`] with `path` as context if the TOML is malformed.
    pub fn from_toml_str(text: &str, path: &Path) -> AppResult<Self> {
        toml::from_str(text).map_err(|e| AppError::Config {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Loads `path`. A missing file yields defaults.
    ///
    /// # Errors
    ///
    /// [`AppError::Config`] if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> AppResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => Self::from_toml_str(&text, path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("no config at {}, using defaults", path.display());
                Ok(Self::default())
            }
            Err(e) => Err(AppError::Config {
                path: path.to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Loads the configured file, reporting and replacing a bad one with defaults.
    #[must_use]
    pub fn load_or_default() -> Self {
        let path = config_path();
        Self::load_from(&path).unwrap_or_else(|err| {
            tracing::error!("{}; continuing with defaults", err);
            Self::default()
        })
    }
}

/// `$THRONG_CONFIG` if set, otherwise [`DEFAULT_CONFIG_PATH`].
#[must_use]
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_ENV).map_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config = ViewerConfig::from_toml_str("", Path::new("x.toml")).unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn test_culling_section_maps_to_runtime_config() {
        let section = CullingSection {
            enabled: false,
            readback_interval: 10,
            diagnostic_seconds: 1.0,
        };
        let runtime = section.culling_config();
        assert!(!runtime.enabled);
        assert_eq!(runtime.readback_interval, 10);
        assert_eq!(runtime.clip_depth, ClipDepth::ZeroToOne);
    }

    #[test]
    fn test_placement_params_carry_section() {
        let params = PlacementSection::default().params(64, Layout::Plane);
        assert_eq!(params.count, 64);
        assert_eq!(params.layout, Layout::Plane);
        assert!((params.yaw_jitter - 18f32.to_radians()).abs() < 1e-6);
    }
}
