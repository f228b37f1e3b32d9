//! Pick-ray geometry for the fixed demo camera.
//!
//! The render camera and [`CameraRig`] are built from the same
//! [`CameraConfig`](crate::config::CameraConfig), so a ray produced here passes
//! through the pixel the user pointed at. Unprojection uses the OpenGL depth
//! convention (NDC z in [-1, 1], +1 at the far plane), independent of the
//! depth layout the renderer uses internally.

use bevy::prelude::*;

use crate::config::CameraConfig;
use crate::pointer::PointerSample;

/// Perspective camera used to turn pointer samples into world rays.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct CameraRig {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view (radians)
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Viewport width / height
    pub aspect: f32,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default(), 1280.0 / 720.0)
    }
}

impl CameraRig {
    pub fn from_config(config: &CameraConfig, aspect: f32) -> Self {
        Self {
            eye: Vec3::from_array(config.eye),
            target: Vec3::from_array(config.look_at),
            fov_y: config.fov_degrees.to_radians(),
            near: config.near,
            far: config.far,
            aspect,
        }
    }

    /// Track the window size. Zero-sized viewports (minimized) are ignored.
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    pub fn clip_from_world(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Transform placing a Bevy camera at this rig's eye.
    pub fn transform(&self) -> Transform {
        Transform::from_translation(self.eye).looking_at(self.target, Vec3::Y)
    }

    /// Ray from the eye through the sample's screen point.
    ///
    /// Returns `None` for degenerate input (non-finite coordinates, or a point
    /// that unprojects onto the eye).
    pub fn ray(&self, sample: PointerSample) -> Option<Ray3d> {
        let ndc = sample.ndc.extend(sample.depth_or_full());
        if !ndc.is_finite() {
            return None;
        }
        let world = self.clip_from_world().inverse().project_point3(ndc);
        let direction = Dir3::new(world - self.eye).ok()?;
        Some(Ray3d::new(self.eye, direction))
    }

    /// World point to NDC (x, y) plus GL depth (z).
    pub fn project(&self, world: Vec3) -> Vec3 {
        self.clip_from_world().project_point3(world)
    }

    /// Horizontal unit vector pointing to the right of the view.
    pub fn right(&self) -> Vec3 {
        let forward = (self.target - self.eye).normalize_or_zero();
        forward.cross(Vec3::Y).normalize_or_zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: Vec3, b: Vec3, eps: f32) {
        assert!((a - b).length() < eps, "{:?} != {:?}", a, b);
    }

    #[test]
    fn test_center_ray_points_at_target() {
        let rig = CameraRig::default();
        let ray = rig.ray(PointerSample::new(Vec2::ZERO)).unwrap();

        let expected = (rig.target - rig.eye).normalize();
        assert_close(*ray.direction, expected, 1e-4);
        assert_eq!(ray.origin, rig.eye);
    }

    #[test]
    fn test_project_then_ray_passes_through_point() {
        let rig = CameraRig::default();
        let point = Vec3::new(1.0, 12.0, -3.0);
        let ndc = rig.project(point);

        let ray = rig.ray(PointerSample::new(ndc.truncate())).unwrap();
        let expected = (point - rig.eye).normalize();
        assert_close(*ray.direction, expected, 1e-4);
    }

    #[test]
    fn test_depth_does_not_change_direction() {
        let rig = CameraRig::default();
        let ndc = Vec2::new(0.3, -0.2);
        let far = rig.ray(PointerSample::new(ndc)).unwrap();
        let mid = rig.ray(PointerSample::with_depth(ndc, 0.4)).unwrap();
        assert_close(*far.direction, *mid.direction, 1e-3);
    }

    #[test]
    fn test_non_finite_sample_has_no_ray() {
        let rig = CameraRig::default();
        assert!(rig.ray(PointerSample::new(Vec2::new(f32::NAN, 0.0))).is_none());
    }

    #[test]
    fn test_right_is_horizontal() {
        let rig = CameraRig::default();
        let right = rig.right();
        assert_eq!(right.y, 0.0);
        assert!((right.length() - 1.0).abs() < 1e-6);
        // Screen-right projects to larger NDC x
        let a = rig.project(rig.target);
        let b = rig.project(rig.target + right);
        assert!(b.x > a.x);
    }

    #[test]
    fn test_set_viewport_ignores_zero() {
        let mut rig = CameraRig::default();
        rig.set_viewport(0.0, 0.0);
        assert_eq!(rig.aspect, 1280.0 / 720.0);
        rig.set_viewport(1000.0, 500.0);
        assert_eq!(rig.aspect, 2.0);
    }
}
