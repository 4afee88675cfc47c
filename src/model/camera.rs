use glam::{Mat4, Vec2, Vec3};

pub struct Camera {
    pub eye: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub up: Vec3,
    pub fov_y: f32,
    pub aspect: f32,
    pub z_near: f32,
    pub z_far: f32,
}

impl Camera {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            eye: Vec3::ZERO,
            yaw: 0.0,
            pitch: 0.0,
            up: Vec3::Y,
            fov_y: 70f32.to_radians(),
            aspect: width as f32 / height.max(1) as f32,
            z_near: 0.01,
            z_far: 2000.0,
        }
    }

    pub fn forward(&self) -> Vec3 {
        let cy = self.yaw;
        let cp = self.pitch.clamp(-1.5533, 1.5533); // Slightly less than π/2 to avoid gimbal lock
        Vec3::new(cy.cos() * cp.cos(), cp.sin(), cy.sin() * cp.cos()).normalize()
    }

    /// Horizontal right vector, independent of pitch
    pub fn right(&self) -> Vec3 {
        self.forward().cross(self.up).normalize()
    }

    /// Horizontal forward vector (up x right), independent of pitch
    pub fn flat_forward(&self) -> Vec3 {
        self.up.cross(self.right()).normalize()
    }

    pub fn target(&self) -> Vec3 { self.eye + self.forward() }

    pub fn set_aspect(&mut self, width: u32, height: u32) { self.aspect = width as f32 / height.max(1) as f32; }

    pub fn view_proj(&self) -> Mat4 {
        let view = Mat4::look_at_rh(self.eye, self.target(), self.up);
        let proj = Mat4::perspective_rh(self.fov_y, self.aspect, self.z_near, self.z_far);
        proj * view
    }

    /// Project a world point to normalized device coordinates.
    /// None when the point is behind the camera or outside the view volume.
    pub fn project(&self, world: Vec3) -> Option<Vec2> {
        let clip = self.view_proj() * world.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        let visible = ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0 && (0.0..=1.0).contains(&ndc.z);
        visible.then(|| Vec2::new(ndc.x, ndc.y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_right_and_flat_forward_ignore_pitch() {
        let mut cam = Camera::new(800, 600);
        cam.yaw = 0.3;
        cam.pitch = 0.0;
        let (right, fwd) = (cam.right(), cam.flat_forward());

        cam.pitch = 1.2;
        assert!((cam.right() - right).length() < 1e-5);
        assert!((cam.flat_forward() - fwd).length() < 1e-5);
        assert!(cam.flat_forward().y.abs() < 1e-6);
    }

    #[test]
    fn test_right_is_clockwise_of_forward() {
        let cam = Camera::new(800, 600);
        // yaw 0 looks down +X, right is +Z
        assert!((cam.forward() - Vec3::X).length() < 1e-6);
        assert!((cam.right() - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_project_center_and_behind() {
        let cam = Camera::new(800, 600);
        let center = cam.project(Vec3::new(10.0, 0.0, 0.0)).expect("point ahead is visible");
        assert!(center.length() < 1e-5);
        assert!(cam.project(Vec3::new(-10.0, 0.0, 0.0)).is_none());
    }
}
