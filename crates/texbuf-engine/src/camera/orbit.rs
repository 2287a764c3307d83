use glam::{Mat4, Vec3};

/// Fixed parameters of the orbiting camera.
#[derive(Debug, Clone, PartialEq)]
pub struct CameraConfig {
    /// Distance from the target, in the horizontal plane.
    pub radius: f32,
    /// Orbit angle added per frame, in radians.
    pub step: f32,
    /// Orbit angle before the first frame.
    pub start_angle: f32,
    pub fov_y_degrees: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub target: Vec3,
    pub up: Vec3,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            radius: 30.5,
            step: 0.00025,
            start_angle: 0.0,
            fov_y_degrees: 45.0,
            aspect: 800.0 / 600.0,
            near: 0.1,
            far: 1000.0,
            target: Vec3::ZERO,
            up: Vec3::Y,
        }
    }
}

/// Camera circling the target at a fixed radius, one step per frame.
///
/// The angle is derived from the frame count (`start + frame * step`), so the
/// transform for a given frame does not depend on accumulated rounding.
/// Projection and model matrices are fixed at construction.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    config: CameraConfig,
    frame: u64,
    proj: Mat4,
    model: Mat4,
    view: Mat4,
    mvp: Mat4,
}

impl OrbitCamera {
    pub fn new(config: CameraConfig) -> Self {
        let proj = Mat4::perspective_rh(
            config.fov_y_degrees.to_radians(),
            config.aspect,
            config.near,
            config.far,
        );
        let model = Mat4::IDENTITY;

        let mut camera = Self {
            config,
            frame: 0,
            proj,
            model,
            view: Mat4::IDENTITY,
            mvp: Mat4::IDENTITY,
        };
        camera.recompute();
        camera
    }

    pub fn config(&self) -> &CameraConfig {
        &self.config
    }

    /// Frames advanced so far.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Orbit angle after `frame` steps.
    pub fn angle_at(&self, frame: u64) -> f32 {
        self.config.start_angle + frame as f32 * self.config.step
    }

    pub fn angle(&self) -> f32 {
        self.angle_at(self.frame)
    }

    /// Eye position on the orbit circle: `(sin(a) * r, 0, -cos(a) * r)`.
    pub fn eye_at(&self, angle: f32) -> Vec3 {
        let r = self.config.radius;
        Vec3::new(angle.sin() * r, 0.0, -angle.cos() * r)
    }

    pub fn view_at(&self, angle: f32) -> Mat4 {
        Mat4::look_at_rh(self.eye_at(angle), self.config.target, self.config.up)
    }

    /// Steps the orbit by one frame and returns the new `MVP`.
    pub fn advance(&mut self) -> Mat4 {
        self.frame += 1;
        self.recompute();
        self.mvp
    }

    fn recompute(&mut self) {
        self.view = self.view_at(self.angle());
        self.mvp = self.proj * self.view * self.model;
    }

    pub fn proj(&self) -> Mat4 {
        self.proj
    }

    pub fn model(&self) -> Mat4 {
        self.model
    }

    pub fn view(&self) -> Mat4 {
        self.view
    }

    pub fn mvp(&self) -> Mat4 {
        self.mvp
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_behind_target_on_negative_z() {
        let cam = OrbitCamera::default();
        let eye = cam.eye_at(0.0);
        assert_eq!(eye, Vec3::new(0.0, 0.0, -30.5));
    }

    #[test]
    fn eye_stays_on_circle() {
        let cam = OrbitCamera::default();
        for a in [0.3f32, 1.7, 4.0] {
            let eye = cam.eye_at(a);
            assert_eq!(eye.y, 0.0);
            assert!((eye.length() - 30.5).abs() < 1e-4);
        }
    }

    #[test]
    fn mvp_after_n_frames_matches_closed_form() {
        let mut cam = OrbitCamera::default();
        let mut last = Mat4::IDENTITY;
        for _ in 0..1000 {
            last = cam.advance();
        }
        let angle = cam.config().start_angle + 1000.0 * cam.config().step;
        assert_eq!(cam.angle(), angle);
        assert_eq!(last, cam.proj() * cam.view_at(angle) * cam.model());
    }

    #[test]
    fn view_is_deterministic() {
        let cam = OrbitCamera::default();
        let a = cam.view_at(0.123).to_cols_array();
        let b = cam.view_at(0.123).to_cols_array();
        assert_eq!(a.map(f32::to_bits), b.map(f32::to_bits));
    }

    #[test]
    fn advance_is_monotonic() {
        let mut cam = OrbitCamera::default();
        let a0 = cam.angle();
        cam.advance();
        let a1 = cam.angle();
        cam.advance();
        assert!(a0 < a1 && a1 < cam.angle());
        assert_eq!(cam.frame(), 2);
    }

    #[test]
    fn target_projects_to_screen_center() {
        let mut cam = OrbitCamera::default();
        let mvp = cam.advance();
        let clip = mvp * glam::Vec4::new(0.0, 0.0, 0.0, 1.0);
        let ndc = clip.truncate() / clip.w;
        assert!(ndc.x.abs() < 1e-5 && ndc.y.abs() < 1e-5);
        assert!((0.0..=1.0).contains(&ndc.z));
    }
}
