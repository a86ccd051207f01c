//! Perspective camera looking down at the map plane.
//!
//! World space is right-handed with z up; the map lies in the XY plane.

use foundation::math::Vec3;
use scene::spatial::Ray;

pub const DEFAULT_FOV_Y_DEG: f64 = 45.0;

/// Distance at which `height_px` world units exactly fill a vertical field
/// of view of `fov_y_rad`.
pub fn fit_distance(height_px: f64, fov_y_rad: f64) -> f64 {
    let half = (0.5 * fov_y_rad).tan();
    if !(half > 0.0) || !(height_px > 0.0) {
        return 1.0;
    }
    0.5 * height_px / half
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub target: Vec3,
    pub fov_y_rad: f64,
    /// Angle between the view direction and straight down.
    pub tilt_rad: f64,
    pub near: f64,
    pub far: f64,
    width_px: f64,
    height_px: f64,
    distance: f64,
}

/// Orthonormal camera frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraBasis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl PerspectiveCamera {
    pub fn new(width_px: f64, height_px: f64, tilt_rad: f64) -> Self {
        let mut camera = Self {
            target: Vec3::ZERO,
            fov_y_rad: DEFAULT_FOV_Y_DEG.to_radians(),
            tilt_rad,
            near: 1.0,
            far: 100_000.0,
            width_px: 1.0,
            height_px: 1.0,
            distance: 1.0,
        };
        camera.resize(width_px, height_px);
        camera
    }

    /// Updates aspect and pulls the camera back so one world unit on the
    /// map plane spans one pixel at the target.
    pub fn resize(&mut self, width_px: f64, height_px: f64) {
        self.width_px = if width_px > 0.0 { width_px } else { 1.0 };
        self.height_px = if height_px > 0.0 { height_px } else { 1.0 };
        self.distance = fit_distance(self.height_px, self.fov_y_rad);
        self.far = self.far.max(self.distance * 4.0);
    }

    pub fn size_px(&self) -> [f64; 2] {
        [self.width_px, self.height_px]
    }

    pub fn aspect(&self) -> f64 {
        self.width_px / self.height_px
    }

    pub fn distance(&self) -> f64 {
        self.distance
    }

    pub fn position(&self) -> Vec3 {
        let back = Vec3::new(0.0, -self.tilt_rad.sin(), self.tilt_rad.cos());
        self.target + back.scale(self.distance)
    }

    pub fn basis(&self) -> CameraBasis {
        let (sin, cos) = self.tilt_rad.sin_cos();
        let forward = Vec3::new(0.0, sin, -cos);
        let right = Vec3::new(1.0, 0.0, 0.0);
        let up = right.cross(forward);
        CameraBasis { forward, right, up }
    }

    /// Pixel coordinates (origin top-left) to normalized device coordinates.
    pub fn ndc_from_screen(&self, x_px: f64, y_px: f64) -> [f64; 2] {
        [
            2.0 * x_px / self.width_px - 1.0,
            1.0 - 2.0 * y_px / self.height_px,
        ]
    }

    pub fn ray_from_ndc(&self, ndc_x: f64, ndc_y: f64) -> Ray {
        let b = self.basis();
        let half = (0.5 * self.fov_y_rad).tan();
        let dir = b.forward
            + b.right.scale(ndc_x * half * self.aspect())
            + b.up.scale(ndc_y * half);
        Ray::new(self.position(), dir.normalized().unwrap_or(b.forward))
    }

    pub fn ray_from_screen(&self, x_px: f64, y_px: f64) -> Ray {
        let [nx, ny] = self.ndc_from_screen(x_px, y_px);
        self.ray_from_ndc(nx, ny)
    }

    /// World point to pixel coordinates; `None` behind the near plane.
    pub fn project(&self, p: Vec3) -> Option<[f64; 2]> {
        let b = self.basis();
        let d = p - self.position();
        let z = d.dot(b.forward);
        if !(z > self.near) {
            return None;
        }
        let half = (0.5 * self.fov_y_rad).tan();
        let nx = d.dot(b.right) / (z * half * self.aspect());
        let ny = d.dot(b.up) / (z * half);
        Some([
            (nx + 1.0) * 0.5 * self.width_px,
            (1.0 - ny) * 0.5 * self.height_px,
        ])
    }

    /// Column-major view-projection matrix, depth range `[0, 1]`.
    pub fn view_proj(&self) -> [[f32; 4]; 4] {
        mat4_mul(
            perspective_rh_z0(self.fov_y_rad, self.aspect(), self.near, self.far),
            self.view(),
        )
    }

    pub fn view(&self) -> [[f32; 4]; 4] {
        let b = self.basis();
        let eye = self.position();
        let (s, u, f) = (b.right, b.up, b.forward);
        [
            [s.x as f32, u.x as f32, -f.x as f32, 0.0],
            [s.y as f32, u.y as f32, -f.y as f32, 0.0],
            [s.z as f32, u.z as f32, -f.z as f32, 0.0],
            [
                -s.dot(eye) as f32,
                -u.dot(eye) as f32,
                f.dot(eye) as f32,
                1.0,
            ],
        ]
    }

    /// The eight frustum corners, near plane first (bl, br, tr, tl).
    pub fn frustum_corners(&self) -> [Vec3; 8] {
        let b = self.basis();
        let eye = self.position();
        let half = (0.5 * self.fov_y_rad).tan();
        let corner = |depth: f64, sx: f64, sy: f64| {
            let h = depth * half;
            let w = h * self.aspect();
            eye + b.forward.scale(depth) + b.right.scale(sx * w) + b.up.scale(sy * h)
        };
        let far = self.distance * 2.0;
        [
            corner(self.near, -1.0, -1.0),
            corner(self.near, 1.0, -1.0),
            corner(self.near, 1.0, 1.0),
            corner(self.near, -1.0, 1.0),
            corner(far, -1.0, -1.0),
            corner(far, 1.0, -1.0),
            corner(far, 1.0, 1.0),
            corner(far, -1.0, 1.0),
        ]
    }
}

fn perspective_rh_z0(fov_y_rad: f64, aspect: f64, near: f64, far: f64) -> [[f32; 4]; 4] {
    let f = 1.0 / (0.5 * fov_y_rad).tan();
    let m22 = (far / (near - far)) as f32;
    let m23 = ((near * far) / (near - far)) as f32;
    [
        [(f / aspect) as f32, 0.0, 0.0, 0.0],
        [0.0, f as f32, 0.0, 0.0],
        [0.0, 0.0, m22, -1.0],
        [0.0, 0.0, m23, 0.0],
    ]
}

fn mat4_mul(a: [[f32; 4]; 4], b: [[f32; 4]; 4]) -> [[f32; 4]; 4] {
    let mut c = [[0.0f32; 4]; 4];
    for col in 0..4 {
        for row in 0..4 {
            c[col][row] = (0..4).map(|k| a[k][row] * b[col][k]).sum();
        }
    }
    c
}

#[cfg(test)]
mod tests {
    use super::{PerspectiveCamera, fit_distance};
    use foundation::math::Vec3;

    fn close(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() <= eps
    }

    #[test]
    fn fit_distance_maps_units_to_pixels() {
        let cam = PerspectiveCamera::new(800.0, 600.0, 0.0);
        assert!(close(cam.distance(), fit_distance(600.0, cam.fov_y_rad), 1e-9));
        // A point 100 units right of the target lands 100 px right of center.
        let p = cam.project(Vec3::new(100.0, 0.0, 0.0)).expect("visible");
        assert!(close(p[0], 500.0, 1e-6) && close(p[1], 300.0, 1e-6), "{p:?}");
    }

    #[test]
    fn center_ray_hits_the_target() {
        let cam = PerspectiveCamera::new(640.0, 480.0, 0.5);
        let ray = cam.ray_from_screen(320.0, 240.0);
        let t = -ray.origin.z / ray.dir.z;
        let hit = ray.at(t);
        assert!(hit.distance(cam.target) < 1e-6, "{hit:?}");
    }

    #[test]
    fn screen_ray_reprojects_to_the_same_pixel() {
        let cam = PerspectiveCamera::new(1024.0, 768.0, 0.3);
        let ray = cam.ray_from_screen(100.0, 650.0);
        let t = -ray.origin.z / ray.dir.z;
        let p = cam.project(ray.at(t)).expect("visible");
        assert!(close(p[0], 100.0, 1e-6) && close(p[1], 650.0, 1e-6), "{p:?}");
    }

    #[test]
    fn points_behind_the_camera_do_not_project() {
        let cam = PerspectiveCamera::new(100.0, 100.0, 0.0);
        assert_eq!(cam.project(cam.position() + Vec3::new(0.0, 0.0, 10.0)), None);
    }

    #[test]
    fn resize_only_moves_the_camera() {
        let mut cam = PerspectiveCamera::new(800.0, 600.0, 0.0);
        cam.resize(1600.0, 300.0);
        assert!(close(cam.aspect(), 1600.0 / 300.0, 1e-12));
        assert!(close(cam.distance(), fit_distance(300.0, cam.fov_y_rad), 1e-9));
    }

    #[test]
    fn view_proj_puts_the_target_at_the_center() {
        let cam = PerspectiveCamera::new(800.0, 600.0, 0.4);
        let m = cam.view_proj();
        let p = [0.0f32, 0.0, 0.0, 1.0];
        let clip: Vec<f32> = (0..4)
            .map(|row| (0..4).map(|col| m[col][row] * p[col]).sum::<f32>())
            .collect();
        assert!((clip[0] / clip[3]).abs() < 1e-4);
        assert!((clip[1] / clip[3]).abs() < 1e-4);
        let depth = clip[2] / clip[3];
        assert!((0.0..=1.0).contains(&depth));
    }
}
