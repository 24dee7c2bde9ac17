//! Orbit camera circling the scene origin.

use throng_rendering::CameraUniform;
use throng_shared::bounds::ObjectBounds;
use throng_shared::math::{look_at, multiply, perspective, Mat4};

use crate::config::CameraSection;

/// Camera on a horizontal circle around the origin, always looking at it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrbitCamera {
    /// Current angle around the Y axis in radians.
    pub angle: f32,
    /// Distance from the Y axis.
    pub radius: f32,
    /// Eye height.
    pub height: f32,
    /// Radians per second.
    pub speed: f32,
    paused: bool,
    fov_y: f32,
    near: f32,
    far: f32,
    aspect: f32,
}

impl OrbitCamera {
    /// Camera framing a scene of the given radius.
    ///
    /// An explicit orbit radius in `section` wins over the derived one.
    #[must_use]
    pub fn new(section: &CameraSection, scene_radius: f32, aspect: f32) -> Self {
        let radius = section
            .orbit_radius
            .unwrap_or_else(|| (scene_radius * 1.5).max(5.0));
        Self {
            angle: 0.0,
            radius,
            height: section.orbit_height,
            speed: section.orbit_speed,
            paused: false,
            fov_y: section.fov_y_degrees.to_radians(),
            near: section.near,
            far: section.far.max(section.near + 1.0),
            aspect: if aspect > 0.0 { aspect } else { 1.0 },
        }
    }

    /// Advances the orbit by `dt` seconds unless paused.
    pub fn update(&mut self, dt: f32) {
        if !self.paused {
            self.angle = (self.angle + self.speed * dt) % std::f32::consts::TAU;
        }
    }

    /// Freezes or resumes the orbit (`Space`).
    pub fn set_paused(&mut self, paused: bool) {
        self.paused = paused;
    }

    /// Whether the orbit is frozen.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Follows a window resize. Zero-sized windows are ignored.
    #[allow(clippy::cast_precision_loss)]
    pub fn set_viewport(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    /// Width over height.
    #[must_use]
    pub const fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Eye position `(sin t * r, h, cos t * r)`.
    #[must_use]
    pub fn eye(&self) -> [f32; 3] {
        [
            self.angle.sin() * self.radius,
            self.height,
            self.angle.cos() * self.radius,
        ]
    }

    /// World to view.
    #[must_use]
    pub fn view(&self) -> Mat4 {
        look_at(self.eye(), [0.0; 3], [0.0, 1.0, 0.0])
    }

    /// View to clip, depth 0..1.
    #[must_use]
    pub fn projection(&self) -> Mat4 {
        perspective(self.fov_y, self.aspect, self.near, self.far)
    }

    /// Projection * view.
    #[must_use]
    pub fn view_projection(&self) -> Mat4 {
        multiply(&self.projection(), &self.view())
    }

    /// Uniform block for the mesh shader.
    #[must_use]
    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_projection(),
            ..CameraUniform::default()
        }
    }
}

/// Radius of a sphere around the origin containing every instance.
#[must_use]
pub fn scene_radius(transforms: &[Mat4], bounds: &ObjectBounds) -> f32 {
    let reach = transforms
        .iter()
        .map(|m| {
            let t = [m[3][0], m[3][1], m[3][2]];
            (t[0] * t[0] + t[1] * t[1] + t[2] * t[2]).sqrt()
        })
        .fold(0.0f32, f32::max);
    reach + bounds.max_extent()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eye_on_orbit() {
        let mut cam = OrbitCamera::new(&CameraSection::default(), 20.0, 1.0);
        assert!((cam.radius - 30.0).abs() < 1e-5);

        let eye = cam.eye();
        assert!(eye[0].abs() < 1e-5);
        assert!((eye[2] - 30.0).abs() < 1e-5);

        cam.angle = std::f32::consts::FRAC_PI_2;
        assert!((cam.eye()[0] - 30.0).abs() < 1e-4);
    }

    #[test]
    fn test_pause_freezes_angle() {
        let mut cam = OrbitCamera::new(&CameraSection::default(), 10.0, 1.0);
        cam.update(1.0);
        let angle = cam.angle;
        assert!(angle > 0.0);

        cam.set_paused(true);
        assert!(cam.is_paused());
        cam.update(5.0);
        assert!((cam.angle - angle).abs() < f32::EPSILON);

        cam.set_paused(false);
        cam.update(0.5);
        assert!(cam.angle > angle);
    }

    #[test]
    fn test_resize_updates_aspect() {
        let mut cam = OrbitCamera::new(&CameraSection::default(), 10.0, 1.0);
        cam.set_viewport(1920, 1080);
        assert!((cam.aspect() - 16.0 / 9.0).abs() < 1e-5);
        cam.set_viewport(0, 0);
        assert!((cam.aspect() - 16.0 / 9.0).abs() < 1e-5);
    }

    #[test]
    fn test_explicit_radius_wins() {
        let section = CameraSection {
            orbit_radius: Some(42.0),
            ..CameraSection::default()
        };
        let cam = OrbitCamera::new(&section, 1000.0, 1.0);
        assert!((cam.radius - 42.0).abs() < f32::EPSILON);
    }
}
