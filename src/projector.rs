use crate::camera::PerspectiveCamera;
use glam::{Mat4, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Viewport {
    pub(crate) width: f32,
    pub(crate) height: f32,
}

impl Viewport {
    pub(crate) fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ScreenPoint {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) ndc: Vec3,
    /// Clip-space w; positive in front of the camera, grows with distance.
    pub(crate) w: f32,
}

impl ScreenPoint {
    pub(crate) fn in_front(&self) -> bool {
        self.w > 0.0
    }

    pub(crate) fn in_frustum(&self) -> bool {
        self.in_front()
            && (-1.0..=1.0).contains(&self.ndc.x)
            && (-1.0..=1.0).contains(&self.ndc.y)
            && (-1.0..=1.0).contains(&self.ndc.z)
    }
}

pub(crate) fn project_point(world: Vec3, view_proj: &Mat4, viewport: Viewport) -> ScreenPoint {
    let clip = *view_proj * world.extend(1.0);
    let w = if clip.w.abs() < 1e-6 {
        1e-6_f32.copysign(clip.w)
    } else {
        clip.w
    };
    let ndc = clip.truncate() / w;
    ScreenPoint {
        x: (ndc.x * 0.5 + 0.5) * viewport.width,
        y: (-(ndc.y * 0.5) + 0.5) * viewport.height,
        ndc,
        w: clip.w,
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct ProjectedSphere {
    pub(crate) center: ScreenPoint,
    pub(crate) rx: f32,
    pub(crate) ry: f32,
}

impl ProjectedSphere {
    pub(crate) fn contains(&self, x: f32, y: f32) -> bool {
        if !self.center.in_front() || self.rx <= 0.0 || self.ry <= 0.0 {
            return false;
        }
        let u = (x - self.center.x) / self.rx;
        let v = (y - self.center.y) / self.ry;
        u * u + v * v <= 1.0
    }
}

pub(crate) trait Projector {
    fn project(&self, world: Vec3) -> ScreenPoint;
    fn basis(&self) -> (Vec3, Vec3);

    fn project_sphere(&self, center: Vec3, radius: f32) -> ProjectedSphere {
        let (right, up) = self.basis();
        let c = self.project(center);
        let r = self.project(center + right * radius);
        let u = self.project(center + up * radius);
        ProjectedSphere {
            center: c,
            rx: (r.x - c.x).abs(),
            ry: (u.y - c.y).abs(),
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct CameraProjector {
    view_proj: Mat4,
    viewport: Viewport,
    right: Vec3,
    up: Vec3,
}

impl CameraProjector {
    pub(crate) fn new(camera: &PerspectiveCamera, viewport: Viewport) -> Self {
        Self {
            view_proj: camera.view_projection_matrix(),
            viewport,
            right: camera.right(),
            up: camera.screen_up(),
        }
    }
}

impl Projector for CameraProjector {
    fn project(&self, world: Vec3) -> ScreenPoint {
        project_point(world, &self.view_proj, self.viewport)
    }

    fn basis(&self) -> (Vec3, Vec3) {
        (self.right, self.up)
    }
}
