use crate::projector::Viewport;
use glam::{Mat4, Vec3};
use std::f32::consts::PI;

/// Height / width of one terminal cell.
pub(crate) const CELL_ASPECT: f32 = 2.0;
pub(crate) const DEFAULT_CAMERA_POSITION: Vec3 = Vec3::new(0.0, 100.0, 200.0);

const POLE_EPS: f32 = 1e-4;

#[derive(Debug, Clone)]
pub(crate) struct PerspectiveCamera {
    pub(crate) position: Vec3,
    pub(crate) target: Vec3,
    pub(crate) up: Vec3,
    pub(crate) fov_y: f32,
    pub(crate) aspect: f32,
    pub(crate) near: f32,
    pub(crate) far: f32,
}

impl Default for PerspectiveCamera {
    fn default() -> Self {
        Self {
            position: DEFAULT_CAMERA_POSITION,
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov_y: 60f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 2000.0,
        }
    }
}

impl PerspectiveCamera {
    pub(crate) fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub(crate) fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh_gl(self.fov_y, self.aspect, self.near, self.far)
    }

    pub(crate) fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub(crate) fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub(crate) fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize_or_zero()
    }

    pub(crate) fn screen_up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    pub(crate) fn set_aspect(&mut self, width: f32, height: f32) {
        if width > 0.0 && height > 0.0 {
            self.aspect = width / height;
        }
    }

    pub(crate) fn fit_viewport(&mut self, viewport: Viewport) {
        self.set_aspect(viewport.width, viewport.height * CELL_ASPECT);
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
struct SphericalDelta {
    theta: f32,
    phi: f32,
}

#[derive(Clone, Copy, Debug)]
struct Spherical {
    radius: f32,
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
}

impl Spherical {
    fn from_offset(v: Vec3) -> Self {
        let radius = v.length();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let (sp, cp) = self.phi.sin_cos();
        let (st, ct) = self.theta.sin_cos();
        Vec3::new(self.radius * sp * st, self.radius * cp, self.radius * sp * ct)
    }
}

/// Orbits the camera around `target`. Input accumulates into a pending delta
/// that `update` applies, fractionally when damping is on.
#[derive(Debug, Clone)]
pub(crate) struct OrbitControls {
    pub(crate) target: Vec3,
    pub(crate) enable_damping: bool,
    pub(crate) damping_factor: f32,
    pub(crate) min_distance: f32,
    pub(crate) max_distance: f32,
    pending: SphericalDelta,
    scale: f32,
    saved_target: Vec3,
    saved_position: Vec3,
}

impl OrbitControls {
    pub(crate) fn new(camera: &PerspectiveCamera) -> Self {
        Self {
            target: camera.target,
            enable_damping: true,
            damping_factor: 0.05,
            min_distance: 50.0,
            max_distance: 500.0,
            pending: SphericalDelta::default(),
            scale: 1.0,
            saved_target: camera.target,
            saved_position: camera.position,
        }
    }

    pub(crate) fn rotate_left(&mut self, angle: f32) {
        self.pending.theta -= angle;
    }

    pub(crate) fn rotate_up(&mut self, angle: f32) {
        self.pending.phi -= angle;
    }

    pub(crate) fn dolly_in(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale /= factor;
        }
    }

    pub(crate) fn dolly_out(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    pub(crate) fn is_settled(&self) -> bool {
        self.pending.theta.abs() < 1e-5 && self.pending.phi.abs() < 1e-5 && self.scale == 1.0
    }

    pub(crate) fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let before = camera.position;
        let mut s = Spherical::from_offset(camera.position - self.target);

        if self.enable_damping {
            s.theta += self.pending.theta * self.damping_factor;
            s.phi += self.pending.phi * self.damping_factor;
        } else {
            s.theta += self.pending.theta;
            s.phi += self.pending.phi;
        }
        s.phi = s.phi.clamp(POLE_EPS, PI - POLE_EPS);
        s.radius = (s.radius * self.scale).clamp(self.min_distance, self.max_distance);

        camera.position = self.target + s.to_offset();
        camera.target = self.target;

        if self.enable_damping {
            let keep = 1.0 - self.damping_factor;
            self.pending.theta *= keep;
            self.pending.phi *= keep;
        } else {
            self.pending = SphericalDelta::default();
        }
        self.scale = 1.0;

        camera.position.distance_squared(before) > 1e-6
    }

    pub(crate) fn reset(&mut self, camera: &mut PerspectiveCamera) {
        self.target = self.saved_target;
        camera.position = self.saved_position;
        camera.target = self.saved_target;
        self.pending = SphericalDelta::default();
        self.scale = 1.0;
    }

    pub(crate) fn distance(&self, camera: &PerspectiveCamera) -> f32 {
        camera.position.distance(self.target)
    }
}
