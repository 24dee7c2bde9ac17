//! # Instance Placement
//!
//! Produces the initial array of world transforms for every instance.
//!
//! ## Rules
//!
//! - Deterministic: same seed = same transforms, ALWAYS
//! - Exactly `count` transforms are emitted; order defines the instance index
//! - Transforms are Translate * `RotateY` * Scale, non-uniform scale allowed

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

use crate::constants::DEFAULT_SEED;
use crate::math::{trs, Mat4};

/// Spatial arrangement of the instances.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    /// Jittered 3-D grid centred on the origin.
    #[default]
    Grid,
    /// 2-D grid on the XZ plane at y = 0.
    Plane,
    /// Uniformly random positions inside the scatter box.
    Scatter,
}

impl Layout {
    /// Parses a layout name, falling back to [`Layout::Grid`] for unknown names.
    #[must_use]
    pub fn parse_lossy(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            tracing::warn!("unknown layout '{}', falling back to grid", name);
            Self::Grid
        })
    }
}

impl FromStr for Layout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "grid" => Ok(Self::Grid),
            "plane" => Ok(Self::Plane),
            "scatter" | "random" => Ok(Self::Scatter),
            other => Err(format!("unknown layout: {other}")),
        }
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Grid => "grid",
            Self::Plane => "plane",
            Self::Scatter => "scatter",
        };
        f.write_str(name)
    }
}

/// Parameters for [`generate`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementParams {
    /// Number of instances to emit.
    pub count: usize,
    /// Arrangement.
    pub layout: Layout,
    /// Distance between neighbouring grid cells.
    pub spacing: f32,
    /// Maximum positional jitter per axis (grid layouts).
    pub jitter: f32,
    /// Maximum deviation of each scale axis from 1.0.
    pub scale_jitter: f32,
    /// Maximum yaw in radians (grid layouts; scatter always uses a full turn).
    pub yaw_jitter: f32,
    /// RNG seed.
    pub seed: u64,
    /// Minimum corner of the scatter box.
    pub scatter_min: [f32; 3],
    /// Maximum corner of the scatter box.
    pub scatter_max: [f32; 3],
}

impl Default for PlacementParams {
    fn default() -> Self {
        Self {
            count: 1,
            layout: Layout::Grid,
            spacing: 2.5,
            jitter: 0.25,
            scale_jitter: 0.1,
            yaw_jitter: PI * 0.1,
            seed: DEFAULT_SEED,
            scatter_min: [-20.0; 3],
            scatter_max: [20.0; 3],
        }
    }
}

/// Smallest `side` with `side^dims >= count`.
#[must_use]
pub fn grid_side(count: usize, dims: u32) -> usize {
    let mut side = 1usize;
    while side.pow(dims) < count {
        side += 1;
    }
    side
}

/// Generates `params.count` transforms.
#[must_use]
pub fn generate(params: &PlacementParams) -> Vec<Mat4> {
    let mut mats = Vec::with_capacity(params.count);
    if params.count == 0 {
        return mats;
    }

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed);

    match params.layout {
        Layout::Grid => {
            let side = grid_side(params.count, 3);
            'grid: for z in 0..side {
                for y in 0..side {
                    for x in 0..side {
                        if mats.len() == params.count {
                            break 'grid;
                        }
                        let pos = [
                            cell(x, side, params.spacing) + symmetric(&mut rng, params.jitter),
                            cell(y, side, params.spacing) + symmetric(&mut rng, params.jitter),
                            cell(z, side, params.spacing) + symmetric(&mut rng, params.jitter),
                        ];
                        let s = jittered_scale(&mut rng, params.scale_jitter);
                        let yaw = symmetric(&mut rng, params.yaw_jitter);
                        mats.push(trs(pos, yaw, s));
                    }
                }
            }
        }
        Layout::Plane => {
            let side = grid_side(params.count, 2);
            'plane: for x in 0..side {
                for z in 0..side {
                    if mats.len() == params.count {
                        break 'plane;
                    }
                    let pos = [
                        cell(x, side, params.spacing) + symmetric(&mut rng, params.jitter),
                        0.0,
                        cell(z, side, params.spacing) + symmetric(&mut rng, params.jitter),
                    ];
                    let s = jittered_scale(&mut rng, params.scale_jitter);
                    let yaw = symmetric(&mut rng, params.yaw_jitter);
                    mats.push(trs(pos, yaw, s));
                }
            }
        }
        Layout::Scatter => {
            for _ in 0..params.count {
                let pos = [
                    lerp(params.scatter_min[0], params.scatter_max[0], rng.gen::<f32>()),
                    lerp(params.scatter_min[1], params.scatter_max[1], rng.gen::<f32>()),
                    lerp(params.scatter_min[2], params.scatter_max[2], rng.gen::<f32>()),
                ];
                let s = jittered_scale(&mut rng, params.scale_jitter);
                let yaw = symmetric(&mut rng, PI);
                mats.push(trs(pos, yaw, s));
            }
        }
    }

    mats
}

/// Grid coordinate of cell `i`, centred the same way for every axis.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_wrap)]
fn cell(i: usize, side: usize, spacing: f32) -> f32 {
    (i as i64 - (side / 2) as i64) as f32 * spacing
}

fn symmetric(rng: &mut ChaCha8Rng, amount: f32) -> f32 {
    if amount <= 0.0 {
        return 0.0;
    }
    (rng.gen::<f32>() * 2.0 - 1.0) * amount
}

fn jittered_scale(rng: &mut ChaCha8Rng, amount: f32) -> [f32; 3] {
    [
        1.0 + symmetric(rng, amount),
        1.0 + symmetric(rng, amount),
        1.0 + symmetric(rng, amount),
    ]
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(m: &Mat4) -> [f32; 3] {
        [m[3][0], m[3][1], m[3][2]]
    }

    #[test]
    fn test_exact_count_for_every_layout() {
        for layout in [Layout::Grid, Layout::Plane, Layout::Scatter] {
            for count in [1, 7, 28, 1000] {
                let params = PlacementParams { count, layout, ..Default::default() };
                assert_eq!(generate(&params).len(), count, "{layout} x {count}");
            }
        }
    }

    #[test]
    fn test_zero_count_is_empty() {
        let params = PlacementParams { count: 0, ..Default::default() };
        assert!(generate(&params).is_empty());
    }

    #[test]
    fn test_deterministic_for_seed() {
        let params = PlacementParams { count: 500, layout: Layout::Scatter, ..Default::default() };
        assert_eq!(generate(&params), generate(&params));

        let other = PlacementParams { seed: 99, ..params.clone() };
        assert_ne!(generate(&params), generate(&other));
    }

    #[test]
    fn test_grid_side() {
        assert_eq!(grid_side(1, 3), 1);
        assert_eq!(grid_side(8, 3), 2);
        assert_eq!(grid_side(9, 3), 3);
        assert_eq!(grid_side(1000, 3), 10);
        assert_eq!(grid_side(1001, 3), 11);
        assert_eq!(grid_side(10, 2), 4);
    }

    #[test]
    fn test_grid_stays_within_jittered_extent() {
        let params = PlacementParams { count: 1000, ..Default::default() };
        let limit = 5.0 * params.spacing + params.jitter + 1e-3;
        for m in generate(&params) {
            for c in position(&m) {
                assert!(c.abs() <= limit, "coordinate {c} outside grid");
            }
        }
    }

    #[test]
    fn test_plane_is_flat() {
        let params = PlacementParams { count: 50, layout: Layout::Plane, ..Default::default() };
        assert!(generate(&params).iter().all(|m| position(m)[1] == 0.0));
    }

    #[test]
    fn test_scatter_respects_box() {
        let params = PlacementParams {
            count: 300,
            layout: Layout::Scatter,
            scatter_min: [-1.0, 2.0, -3.0],
            scatter_max: [1.0, 2.0, 3.0],
            ..Default::default()
        };
        for m in generate(&params) {
            let p = position(&m);
            assert!((-1.0..=1.0).contains(&p[0]));
            assert!((p[1] - 2.0).abs() < 1e-6);
            assert!((-3.0..=3.0).contains(&p[2]));
        }
    }

    #[test]
    fn test_layout_parsing() {
        assert_eq!("GRID".parse::<Layout>(), Ok(Layout::Grid));
        assert_eq!("random".parse::<Layout>(), Ok(Layout::Scatter));
        assert!("spiral".parse::<Layout>().is_err());
        assert_eq!(Layout::parse_lossy("spiral"), Layout::Grid);
    }
}
