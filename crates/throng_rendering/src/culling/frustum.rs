//! Frustum plane extraction.
//!
//! Extracts the six clip planes from the combined view-projection matrix
//! once per frame. A point with non-negative signed distance to all six
//! planes is inside the view volume.

use bytemuck::{Pod, Zeroable};
use throng_shared::constants::{DEGENERATE_PLANE_EPSILON, PLANE_COUNT};
use throng_shared::math::{row, Mat4};

/// A plane in 3D space (Ax + By + Cz + D = 0).
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Plane {
    /// Normal X component.
    pub a: f32,
    /// Normal Y component.
    pub b: f32,
    /// Normal Z component.
    pub c: f32,
    /// Offset from origin.
    pub d: f32,
}

impl Plane {
    /// Creates a new plane.
    #[must_use]
    pub const fn new(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self { a, b, c, d }
    }

    fn from_row(r: [f32; 4]) -> Self {
        Self::new(r[0], r[1], r[2], r[3])
    }

    /// Length of the normal component.
    #[must_use]
    pub fn normal_length(&self) -> f32 {
        (self.a * self.a + self.b * self.b + self.c * self.c).sqrt()
    }

    /// Normalizes the plane, or `None` if its normal is (near) zero length
    /// or any coefficient is not finite.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.normal_length();
        if !len.is_finite() || !self.d.is_finite() || len <= DEGENERATE_PLANE_EPSILON {
            return None;
        }
        Some(Self {
            a: self.a / len,
            b: self.b / len,
            c: self.c / len,
            d: self.d / len,
        })
    }

    /// Returns the signed distance from a point to the plane.
    #[inline]
    #[must_use]
    pub fn distance_to_point(&self, p: [f32; 3]) -> f32 {
        self.a * p[0] + self.b * p[1] + self.c * p[2] + self.d
    }

    /// Converts to array format.
    #[must_use]
    pub const fn as_array(&self) -> [f32; 4] {
        [self.a, self.b, self.c, self.d]
    }
}

/// Depth range of the projection the planes are extracted from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClipDepth {
    /// OpenGL convention, `-w <= z <= w`. Near plane is `r3 + r2`.
    #[default]
    NegOneToOne,
    /// wgpu/D3D convention, `0 <= z <= w`. Near plane is `r2`.
    ZeroToOne,
}

/// View frustum for culling.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct FrustumPlanes {
    /// Left, right, bottom, top, near, far planes.
    pub planes: [Plane; PLANE_COUNT],
}

impl FrustumPlanes {
    /// Left plane index.
    pub const LEFT: usize = 0;
    /// Right plane index.
    pub const RIGHT: usize = 1;
    /// Bottom plane index.
    pub const BOTTOM: usize = 2;
    /// Top plane index.
    pub const TOP: usize = 3;
    /// Near plane index.
    pub const NEAR: usize = 4;
    /// Far plane index.
    pub const FAR: usize = 5;

    /// Extracts normalized planes with the `r3 ± r0, r3 ± r1, r3 ± r2` method.
    ///
    /// Returns `None` when any plane normal is degenerate, which means the
    /// camera has not been initialized yet.
    #[must_use]
    pub fn from_view_projection(m: &Mat4) -> Option<Self> {
        Self::from_view_projection_with(m, ClipDepth::NegOneToOne)
    }

    /// Extracts normalized planes for the given clip-depth convention.
    #[must_use]
    pub fn from_view_projection_with(m: &Mat4, depth: ClipDepth) -> Option<Self> {
        let r0 = row(m, 0);
        let r1 = row(m, 1);
        let r2 = row(m, 2);
        let r3 = row(m, 3);

        let add = |a: [f32; 4], b: [f32; 4]| [a[0] + b[0], a[1] + b[1], a[2] + b[2], a[3] + b[3]];
        let sub = |a: [f32; 4], b: [f32; 4]| [a[0] - b[0], a[1] - b[1], a[2] - b[2], a[3] - b[3]];

        let near = match depth {
            ClipDepth::NegOneToOne => add(r3, r2),
            ClipDepth::ZeroToOne => r2,
        };

        let raw = [
            add(r3, r0),
            sub(r3, r0),
            add(r3, r1),
            sub(r3, r1),
            near,
            sub(r3, r2),
        ];

        let mut planes = [Plane::default(); PLANE_COUNT];
        for (out, eq) in planes.iter_mut().zip(raw) {
            *out = Plane::from_row(eq).normalized()?;
        }
        Some(Self { planes })
    }

    /// Converts planes to array format for GPU upload.
    #[must_use]
    pub fn as_arrays(&self) -> [[f32; 4]; PLANE_COUNT] {
        self.planes.map(|p| p.as_array())
    }

    /// True if the point is on the inner side of every plane.
    #[must_use]
    pub fn contains_point(&self, p: [f32; 3]) -> bool {
        self.planes.iter().all(|plane| plane.distance_to_point(p) >= 0.0)
    }
}

/// Result of a per-frame frustum refresh.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrustumUpdate {
    /// New planes were extracted this frame.
    Refreshed,
    /// The matrix was degenerate; last frame's planes are reused.
    Reused,
    /// The matrix was degenerate and no previous planes exist.
    Uninitialized,
}

/// Keeps the most recent valid frustum across frames.
#[derive(Debug, Clone, Default)]
pub struct FrustumTracker {
    current: Option<FrustumPlanes>,
    depth: ClipDepth,
    skipped_updates: u64,
}

impl FrustumTracker {
    /// Creates a tracker for the given clip-depth convention.
    #[must_use]
    pub fn new(depth: ClipDepth) -> Self {
        Self {
            current: None,
            depth,
            skipped_updates: 0,
        }
    }

    /// Recomputes the planes from `view_projection`.
    ///
    /// A degenerate matrix leaves the previous planes in place.
    pub fn refresh(&mut self, view_projection: &Mat4) -> FrustumUpdate {
        match FrustumPlanes::from_view_projection_with(view_projection, self.depth) {
            Some(planes) => {
                self.current = Some(planes);
                FrustumUpdate::Refreshed
            }
            None => {
                self.skipped_updates += 1;
                tracing::debug!("degenerate view-projection, frustum update skipped");
                if self.current.is_some() {
                    FrustumUpdate::Reused
                } else {
                    FrustumUpdate::Uninitialized
                }
            }
        }
    }

    /// Current planes, if any frame has produced valid ones.
    #[must_use]
    pub fn planes(&self) -> Option<&FrustumPlanes> {
        self.current.as_ref()
    }

    /// Number of frames whose update was skipped.
    #[must_use]
    pub const fn skipped_updates(&self) -> u64 {
        self.skipped_updates
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use throng_shared::math::{look_at, multiply, perspective, perspective_gl};

    #[test]
    fn test_plane_normalization() {
        let plane = Plane::new(3.0, 4.0, 0.0, 10.0);
        let normalized = plane.normalized().unwrap();

        // 3-4-5 triangle, so length is 5
        assert!((normalized.a - 0.6).abs() < 0.001);
        assert!((normalized.b - 0.8).abs() < 0.001);
        assert!((normalized.d - 2.0).abs() < 0.001);
    }

    #[test]
    fn test_zero_normal_is_rejected() {
        assert!(Plane::new(0.0, 0.0, 0.0, 1.0).normalized().is_none());
    }

    #[test]
    fn test_planes_are_unit_length() {
        let vp = perspective_gl(1.0, 1.5, 0.1, 100.0);
        let frustum = FrustumPlanes::from_view_projection(&vp).unwrap();
        for plane in &frustum.planes {
            assert!((plane.normal_length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn test_near_plane_per_depth_convention() {
        let (n, f) = (0.5, 50.0);
        let gl = FrustumPlanes::from_view_projection(&perspective_gl(1.0, 1.0, n, f)).unwrap();
        let zo = FrustumPlanes::from_view_projection_with(
            &perspective(1.0, 1.0, n, f),
            ClipDepth::ZeroToOne,
        )
        .unwrap();

        for frustum in [gl, zo] {
            let near = frustum.planes[FrustumPlanes::NEAR];
            assert!(near.distance_to_point([0.0, 0.0, -n]).abs() < 1e-3);
            let far = frustum.planes[FrustumPlanes::FAR];
            assert!(far.distance_to_point([0.0, 0.0, -f]).abs() < 1e-2);
        }
    }

    #[test]
    fn test_camera_space_point_behind_is_outside() {
        let view = look_at([0.0, 0.0, 10.0], [0.0; 3], [0.0, 1.0, 0.0]);
        let vp = multiply(&perspective_gl(1.0, 1.0, 0.1, 100.0), &view);
        let frustum = FrustumPlanes::from_view_projection(&vp).unwrap();

        assert!(frustum.contains_point([0.0, 0.0, 0.0]));
        assert!(!frustum.contains_point([0.0, 0.0, 20.0]));
    }

    #[test]
    fn test_tracker_reuses_previous_planes() {
        let mut tracker = FrustumTracker::new(ClipDepth::NegOneToOne);
        let degenerate = [[0.0; 4]; 4];

        assert_eq!(tracker.refresh(&degenerate), FrustumUpdate::Uninitialized);
        assert!(tracker.planes().is_none());

        let vp = perspective_gl(1.0, 1.0, 0.1, 100.0);
        assert_eq!(tracker.refresh(&vp), FrustumUpdate::Refreshed);
        let before = *tracker.planes().unwrap();

        assert_eq!(tracker.refresh(&degenerate), FrustumUpdate::Reused);
        assert_eq!(*tracker.planes().unwrap(), before);
        assert_eq!(tracker.skipped_updates(), 2);
    }

    #[test]
    fn test_non_finite_plane_is_rejected() {
        assert!(Plane::new(f32::NAN, 0.0, 1.0, 0.0).normalized().is_none());
        assert!(Plane::new(f32::INFINITY, 0.0, 0.0, 1.0).normalized().is_none());
        assert!(Plane::new(0.0, 1.0, 0.0, f32::NAN).normalized().is_none());
    }

    #[test]
    fn test_tracker_keeps_planes_on_non_finite_matrix() {
        let mut tracker = FrustumTracker::new(ClipDepth::ZeroToOne);
        assert_eq!(
            tracker.refresh(&perspective(1.0, 1.0, 0.1, 100.0)),
            FrustumUpdate::Refreshed
        );
        let before = *tracker.planes().unwrap();

        // Zero field of view: tan(0) = 0 puts infinities in the projection.
        assert_eq!(
            tracker.refresh(&perspective(0.0, 1.0, 0.1, 100.0)),
            FrustumUpdate::Reused
        );
        assert_eq!(tracker.refresh(&[[f32::NAN; 4]; 4]), FrustumUpdate::Reused);
        assert_eq!(*tracker.planes().unwrap(), before);
        let finite = |p: &Plane| p.as_array().iter().all(|v| v.is_finite());
        assert!(tracker.planes().unwrap().planes.iter().all(finite));
    }
}
