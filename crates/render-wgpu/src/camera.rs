use glam::{Mat4, Vec3};
use std::f32::consts::{PI, TAU};

const MIN_POLAR: f32 = 1e-4;

/// Spherical orbit camera around a fixed target.
///
/// Pointer drags accumulate a pending rotation; `update` applies a `damping`
/// fraction of it per call and decays the rest, so motion eases out after the
/// drag ends. Zoom is off unless `zoom_enabled` is set. There is no pan or
/// keyboard control. Camera motion lives outside the scene clock.
#[derive(Debug, Clone)]
pub struct OrbitCamera {
    pub target: Vec3,
    radius: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
    pending_theta: f32,
    pending_phi: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub damping: f32,
    pub rotate_speed: f32,
    pub zoom_enabled: bool,
    pub min_radius: f32,
    pub max_radius: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::from_position(Vec3::new(-5.0, 10.0, 20.0), Vec3::ZERO)
    }
}

impl OrbitCamera {
    pub fn from_position(position: Vec3, target: Vec3) -> Self {
        let offset = position - target;
        let radius = offset.length().max(MIN_POLAR);
        Self {
            target,
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
            pending_theta: 0.0,
            pending_phi: 0.0,
            fov: 60.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 1.0,
            far: 100.0,
            damping: 0.05,
            rotate_speed: 1.0,
            zoom_enabled: false,
            min_radius: 1.0,
            max_radius: 90.0,
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn position(&self) -> Vec3 {
        let sin_phi = self.phi.sin();
        self.target
            + self.radius
                * Vec3::new(
                    sin_phi * self.theta.sin(),
                    self.phi.cos(),
                    sin_phi * self.theta.cos(),
                )
    }

    /// Queue a rotation from a pointer drag of `(dx, dy)` pixels. A drag across
    /// the full viewport height turns the camera once around.
    pub fn rotate(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        let h = viewport_height.max(1.0);
        self.pending_theta -= TAU * dx / h * self.rotate_speed;
        self.pending_phi -= TAU * dy / h * self.rotate_speed;
    }

    /// Dolly by `steps` wheel notches. Returns `false` when zoom is disabled.
    pub fn zoom(&mut self, steps: f32) -> bool {
        if !self.zoom_enabled {
            return false;
        }
        self.radius = (self.radius * 0.95_f32.powf(steps)).clamp(self.min_radius, self.max_radius);
        true
    }

    /// Apply pending rotation. Call once per frame.
    pub fn update(&mut self) {
        if self.damping > 0.0 {
            self.theta += self.pending_theta * self.damping;
            self.phi += self.pending_phi * self.damping;
            self.pending_theta *= 1.0 - self.damping;
            self.pending_phi *= 1.0 - self.damping;
        } else {
            self.theta += self.pending_theta;
            self.phi += self.pending_phi;
            self.pending_theta = 0.0;
            self.pending_phi = 0.0;
        }
        self.phi = self.phi.clamp(MIN_POLAR, PI - MIN_POLAR);
    }

    pub fn set_aspect(&mut self, width: u32, height: u32) {
        self.aspect = width.max(1) as f32 / height.max(1) as f32;
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}
