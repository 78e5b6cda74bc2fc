//! Damped orbit camera.
//!
//! The camera keeps two copies of its spherical parameters. Input and API
//! calls write the *target*; every frame, [`OrbitCamera::update`] moves the
//! *current* copy toward the target and derives the pose from it. Angles are
//! in degrees, the world is Y-up, and pitch is measured from the horizontal
//! plane.

mod controller;

pub use controller::{create_orbit_camera, OrbitCameraController, RenderSurface};

use glam::{Mat4, Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::bounds::Aabb;

/// Pitch never reaches the poles, where the view direction would be parallel to up
pub const PITCH_POLE_LIMIT: f32 = 89.9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraState {
    /// Degrees around +Y
    pub yaw: f32,
    /// Degrees above the horizontal plane
    pub pitch: f32,
    pub distance: f32,
    pub pivot_point: Vec3,
}

impl CameraState {
    fn lerp(&self, target: &CameraState, t: f32) -> CameraState {
        CameraState {
            yaw: self.yaw + (target.yaw - self.yaw) * t,
            pitch: self.pitch + (target.pitch - self.pitch) * t,
            distance: self.distance + (target.distance - self.distance) * t,
            pivot_point: self.pivot_point.lerp(target.pivot_point, t),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct OrbitCameraConfig {
    pub distance: f32,
    pub pitch: f32,
    pub yaw: f32,
    pub pivot_point: [f32; 3],
    pub distance_min: f32,
    pub distance_max: f32,
    pub pitch_angle_min: f32,
    pub pitch_angle_max: f32,
    /// Seconds to close the gap to the target when damping is on
    pub inertia_factor: f32,
    /// Per-update fraction used when `inertia_factor` is not positive
    pub damping_factor: f32,
    pub enable_damping: bool,
    /// Vertical field of view in degrees
    pub fov: f32,
    pub near: f32,
    pub far: f32,
    /// Degrees per pixel of drag
    pub orbit_sensitivity: f32,
    /// Distance change per wheel notch, as a fraction of the distance
    pub distance_sensitivity: f32,
    /// Pivot displacement per pixel of drag, as a fraction of the distance
    pub pan_sensitivity: f32,
    /// Degrees per arrow key press
    pub keyboard_step: f32,
    /// Distance ratio per Shift+arrow press
    pub keyboard_zoom_ratio: f32,
}

impl Default for OrbitCameraConfig {
    fn default() -> Self {
        Self {
            distance: 10.0,
            pitch: 30.0,
            yaw: 45.0,
            pivot_point: [0.0; 3],
            distance_min: 0.1,
            distance_max: 1000.0,
            pitch_angle_min: -90.0,
            pitch_angle_max: 90.0,
            inertia_factor: 0.1,
            damping_factor: 0.1,
            enable_damping: true,
            fov: 50.0,
            near: 0.01,
            far: 2000.0,
            orbit_sensitivity: 0.3,
            distance_sensitivity: 0.15,
            pan_sensitivity: 0.002,
            keyboard_step: 5.0,
            keyboard_zoom_ratio: 1.1,
        }
    }
}

/// Where the camera is and what it projects
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub look_at: Vec3,
    /// Vertical field of view (radians)
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl CameraPose {
    /// View matrix (world -> camera)
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.look_at, Vec3::Y)
    }

    /// Projection matrix (camera -> clip)
    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn forward(&self) -> Vec3 {
        (self.look_at - self.position).normalize_or_zero()
    }

    pub fn right(&self) -> Vec3 {
        self.forward().cross(Vec3::Y).normalize_or_zero()
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward()).normalize_or_zero()
    }

    /// Normalized device coordinates of a world point, or `None` behind the camera
    pub fn project(&self, point: Vec3) -> Option<Vec3> {
        let p = self.view_projection() * Vec4::new(point.x, point.y, point.z, 1.0);
        if p.w <= 0.0 {
            return None;
        }
        Some(p.truncate() / p.w)
    }
}

pub struct OrbitCamera {
    config: OrbitCameraConfig,
    target: CameraState,
    current: CameraState,
    pose: CameraPose,
}

impl OrbitCamera {
    pub fn new(config: OrbitCameraConfig, aspect: f32) -> Self {
        let initial = CameraState {
            yaw: config.yaw,
            pitch: config.pitch,
            distance: config.distance,
            pivot_point: Vec3::from_array(config.pivot_point),
        };
        let pose = CameraPose {
            position: Vec3::ZERO,
            look_at: Vec3::ZERO,
            fov: config.fov.to_radians(),
            aspect,
            near: config.near,
            far: config.far,
        };
        let mut camera = Self {
            config,
            target: initial,
            current: initial,
            pose,
        };
        camera.set_distance(initial.distance);
        camera.set_pitch(initial.pitch);
        camera.remove_inertia();
        camera
    }

    pub fn config(&self) -> &OrbitCameraConfig {
        &self.config
    }

    pub fn target(&self) -> &CameraState {
        &self.target
    }

    pub fn current(&self) -> &CameraState {
        &self.current
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn distance(&self) -> f32 {
        self.target.distance
    }

    pub fn yaw(&self) -> f32 {
        self.target.yaw
    }

    pub fn pitch(&self) -> f32 {
        self.target.pitch
    }

    pub fn pivot_point(&self) -> Vec3 {
        self.target.pivot_point
    }

    /// Clamped to the distance limits
    pub fn set_distance(&mut self, distance: f32) {
        if distance.is_nan() {
            return;
        }
        self.target.distance = distance.clamp(self.config.distance_min, self.config.distance_max);
    }

    /// Clamped to the pitch limits and away from the poles
    pub fn set_pitch(&mut self, pitch: f32) {
        if pitch.is_nan() {
            return;
        }
        let (min, max) = self.pitch_range();
        self.target.pitch = pitch.clamp(min, max);
    }

    /// Set the yaw target. If the target ends up more than half a turn from
    /// the current yaw, the current yaw is shifted by whole turns so the
    /// interpolation takes the short way around.
    pub fn set_yaw(&mut self, yaw: f32) {
        if !yaw.is_finite() {
            return;
        }
        self.target.yaw = yaw;
        let turns = ((self.target.yaw - self.current.yaw) / 360.0).round();
        self.current.yaw += turns * 360.0;
    }

    pub fn set_pivot_point(&mut self, pivot: Vec3) {
        self.target.pivot_point = pivot;
    }

    /// Reorders swapped bounds, then pulls both the target and the eased
    /// distance into the new range. NaN bounds are ignored.
    pub fn set_distance_limits(&mut self, min: f32, max: f32) {
        if min.is_nan() || max.is_nan() {
            return;
        }
        self.config.distance_min = min.min(max).max(0.0);
        self.config.distance_max = min.max(max).max(self.config.distance_min);
        self.set_distance(self.target.distance);
        self.current.distance = self
            .current
            .distance
            .clamp(self.config.distance_min, self.config.distance_max);
        self.update_pose();
    }

    /// Bounds are reordered and kept inside the pole limits, so the
    /// effective range never inverts. NaN bounds are ignored.
    pub fn set_pitch_limits(&mut self, min: f32, max: f32) {
        if min.is_nan() || max.is_nan() {
            return;
        }
        let (min, max) = (min.min(max), min.max(max));
        self.config.pitch_angle_min = min.clamp(-PITCH_POLE_LIMIT, PITCH_POLE_LIMIT);
        self.config.pitch_angle_max = max.clamp(-PITCH_POLE_LIMIT, PITCH_POLE_LIMIT);
        self.set_pitch(self.target.pitch);
        let (lo, hi) = self.pitch_range();
        self.current.pitch = self.current.pitch.clamp(lo, hi);
        self.update_pose();
    }

    /// Effective pitch range after pole avoidance. A configured window lying
    /// wholly past one pole collapses onto that pole limit.
    pub fn pitch_range(&self) -> (f32, f32) {
        let min = self.config.pitch_angle_min.clamp(-PITCH_POLE_LIMIT, PITCH_POLE_LIMIT);
        let max = self.config.pitch_angle_max.clamp(-PITCH_POLE_LIMIT, PITCH_POLE_LIMIT);
        (min.min(max), max.max(min))
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        if aspect.is_finite() && aspect > 0.0 {
            self.pose.aspect = aspect;
        }
    }

    /// Advance the current state toward the target by `dt` seconds
    pub fn update(&mut self, dt: f32) {
        let t = self.interpolation_factor(dt);
        self.current = self.current.lerp(&self.target, t);
        self.update_pose();
    }

    fn interpolation_factor(&self, dt: f32) -> f32 {
        if !self.config.enable_damping {
            return 1.0;
        }
        let t = if self.config.inertia_factor > 0.0 {
            dt / self.config.inertia_factor
        } else {
            self.config.damping_factor
        };
        t.clamp(0.0, 1.0)
    }

    /// Jump to the given angles and distance without damping
    pub fn reset(&mut self, yaw: f32, pitch: f32, distance: f32) {
        self.set_yaw(yaw);
        self.set_pitch(pitch);
        self.set_distance(distance);
        self.remove_inertia();
    }

    /// Frame a bounding box: pivot on its centre and back off far enough for
    /// its largest dimension to fit the vertical field of view, times `padding`.
    /// Returns `false` and leaves the camera alone for an empty box.
    pub fn focus(&mut self, bounds: &Aabb, padding: f32) -> bool {
        if !bounds.is_valid() {
            return false;
        }
        let max_dim = bounds.max_extent();
        let distance = max_dim / (2.0 * (self.pose.fov / 2.0).tan()) * padding;
        self.set_pivot_point(bounds.center());
        self.set_distance(distance);
        self.remove_inertia();
        true
    }

    fn remove_inertia(&mut self) {
        self.current = self.target;
        self.update_pose();
    }

    fn update_pose(&mut self) {
        let yaw = self.current.yaw.to_radians();
        let pitch = self.current.pitch.to_radians();
        let d = self.current.distance;
        let offset = Vec3::new(
            d * pitch.cos() * yaw.sin(),
            d * pitch.sin(),
            d * pitch.cos() * yaw.cos(),
        );
        self.pose.position = self.current.pivot_point + offset;
        self.pose.look_at = self.current.pivot_point;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> OrbitCamera {
        OrbitCamera::new(
            OrbitCameraConfig {
                distance: 10.0,
                pitch: 0.0,
                yaw: 0.0,
                ..OrbitCameraConfig::default()
            },
            1.0,
        )
    }

    #[test]
    fn test_initial_pose() {
        let cam = camera();
        assert_relative_eq!(cam.pose().position.z, 10.0, epsilon = 1e-5);
        assert_relative_eq!(cam.pose().position.y, 0.0, epsilon = 1e-5);
        assert_eq!(cam.current(), cam.target());
    }

    #[test]
    fn test_damped_update_moves_part_way() {
        let mut cam = camera();
        cam.set_distance(20.0);
        cam.update(0.05);
        assert_relative_eq!(cam.current().distance, 15.0, epsilon = 1e-4);
        cam.update(1.0);
        assert_relative_eq!(cam.current().distance, 20.0);
    }

    #[test]
    fn test_no_damping_jumps() {
        let mut cam = OrbitCamera::new(
            OrbitCameraConfig {
                enable_damping: false,
                ..OrbitCameraConfig::default()
            },
            1.0,
        );
        cam.set_pitch(10.0);
        cam.update(0.001);
        assert_eq!(cam.current().pitch, 10.0);
    }

    #[test]
    fn test_damping_factor_when_no_inertia() {
        let mut cam = OrbitCamera::new(
            OrbitCameraConfig {
                inertia_factor: 0.0,
                damping_factor: 0.5,
                distance: 10.0,
                ..OrbitCameraConfig::default()
            },
            1.0,
        );
        cam.set_distance(20.0);
        cam.update(0.016);
        assert_relative_eq!(cam.current().distance, 15.0);
    }

    #[test]
    fn test_distance_clamped_on_assignment() {
        let mut cam = camera();
        cam.set_distance(1e9);
        assert_eq!(cam.distance(), 1000.0);
        cam.set_distance(-5.0);
        assert_eq!(cam.distance(), 0.1);
    }

    #[test]
    fn test_pitch_avoids_poles() {
        let mut cam = camera();
        cam.set_pitch(90.0);
        assert_eq!(cam.pitch(), PITCH_POLE_LIMIT);
        cam.set_pitch(-500.0);
        assert_eq!(cam.pitch(), -PITCH_POLE_LIMIT);
    }

    #[test]
    fn test_limits_reclamp_target() {
        let mut cam = camera();
        cam.set_distance_limits(20.0, 15.0);
        assert_eq!(cam.distance(), 15.0);
        cam.set_pitch_limits(5.0, 30.0);
        assert_eq!(cam.pitch(), 5.0);
    }

    #[test]
    fn test_distance_limits_pull_in_eased_distance() {
        let mut cam = camera();
        cam.set_distance_limits(20.0, 30.0);
        assert_eq!(cam.distance(), 20.0);
        assert_eq!(cam.current().distance, 20.0);
        cam.update(0.016);
        assert!((20.0..=30.0).contains(&cam.current().distance));
        assert_relative_eq!(cam.pose().position.length(), 20.0, epsilon = 1e-4);
    }

    #[test]
    fn test_pitch_limits_pull_in_eased_pitch() {
        let mut cam = camera();
        cam.set_pitch_limits(30.0, 60.0);
        assert_eq!(cam.pitch(), 30.0);
        assert_eq!(cam.current().pitch, 30.0);
        cam.update(0.016);
        assert!((30.0..=60.0).contains(&cam.current().pitch));
    }

    #[test]
    fn test_pitch_limits_ignore_nan_and_stay_ordered() {
        let mut cam = camera();
        cam.set_pitch_limits(f32::NAN, 10.0);
        assert_eq!(cam.pitch_range(), (-PITCH_POLE_LIMIT, PITCH_POLE_LIMIT));

        cam.set_pitch_limits(120.0, 95.0);
        assert_eq!(cam.pitch_range(), (PITCH_POLE_LIMIT, PITCH_POLE_LIMIT));
        assert_eq!(cam.pitch(), PITCH_POLE_LIMIT);

        cam.set_distance_limits(f32::NAN, 5.0);
        assert_eq!(cam.config().distance_max, 1000.0);
    }

    #[test]
    fn test_yaw_takes_short_way() {
        let mut cam = camera();
        cam.set_yaw(cam.yaw() + 350.0);
        let before = cam.current().yaw;
        cam.update(0.01);
        assert!(cam.current().yaw < before);
        cam.update(10.0);
        // Same heading as -10 degrees.
        assert_relative_eq!(cam.current().yaw.to_radians().sin(), (-10.0f32).to_radians().sin(), epsilon = 1e-5);
    }

    #[test]
    fn test_reset_removes_inertia() {
        let mut cam = camera();
        cam.reset(90.0, 45.0, 5.0);
        assert_eq!(cam.current(), cam.target());
        assert_relative_eq!(cam.pose().position.x, 5.0 * 45f32.to_radians().cos(), epsilon = 1e-4);
    }

    #[test]
    fn test_focus_frames_box() {
        let mut cam = camera();
        let bounds = Aabb::new(Vec3::splat(4.0), Vec3::splat(6.0));
        assert!(cam.focus(&bounds, 1.5));
        let expected = 2.0 / (2.0 * (50f32.to_radians() / 2.0).tan()) * 1.5;
        assert_relative_eq!(cam.distance(), expected, epsilon = 1e-4);
        assert_relative_eq!(cam.current().pivot_point.x, 5.0);
        assert!(!cam.focus(&Aabb::empty(), 1.0));
    }

    #[test]
    fn test_projection_of_pivot_is_centre() {
        let cam = camera();
        let ndc = cam.pose().project(Vec3::ZERO).unwrap();
        assert_relative_eq!(ndc.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(ndc.y, 0.0, epsilon = 1e-5);
        assert!(cam.pose().project(Vec3::new(0.0, 0.0, 20.0)).is_none());
    }
}
