use glam::{Mat4, Vec3};
use winit::dpi::PhysicalSize;

const DEFAULT_UP: Vec3 = Vec3::Y;

/// Perspective projection plus a pose. Owned exclusively by the Operator;
/// the renderer reads the active rig after `Stage::update`.
#[derive(Debug, Clone)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    home_position: Vec3,
    home_target: Vec3,
}

impl CameraRig {
    pub fn new(fov_y_radians: f32, aspect: f32, position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            up: DEFAULT_UP,
            fov_y_radians,
            aspect: aspect.max(0.0001),
            near: 0.1,
            far: 1000.0,
            home_position: position,
            home_target: target,
        }
    }

    pub fn look_at(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn home_position(&self) -> Vec3 {
        self.home_position
    }

    /// Restores the scripted starting pose, e.g. after a one-shot track move.
    pub fn reset(&mut self) {
        self.position = self.home_position;
        self.target = self.home_target;
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.aspect = aspect.max(0.0001);
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y_radians, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

pub fn aspect_of(viewport: PhysicalSize<u32>) -> f32 {
    if viewport.height > 0 {
        viewport.width as f32 / viewport.height as f32
    } else {
        1.0
    }
}
