use crate::camera::PerspectiveCamera;
use glam::Vec3;
use std::f32::consts::PI;

const EPS: f32 = 1e-6;

/// Orbit controls: the camera circles a target, optionally with damping.
///
/// Input only records pending deltas. [`update`](Self::update) applies them to
/// a camera and must run once per frame; with damping enabled it applies a
/// fraction of the pending rotation each call so motion eases out.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    theta_delta: f32,
    phi_delta: f32,
    scale: f32,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            theta_delta: 0.0,
            phi_delta: 0.0,
            scale: 1.0,
        }
    }
}

impl OrbitControls {
    pub fn damped() -> Self {
        Self {
            enable_damping: true,
            ..Self::default()
        }
    }

    /// Queue a rotation: `azimuth` around the up axis, `polar` towards it (radians).
    pub fn rotate(&mut self, azimuth: f32, polar: f32) {
        self.theta_delta -= azimuth;
        self.phi_delta -= polar;
    }

    /// Queue a zoom. Factors above 1 move away from the target.
    pub fn dolly(&mut self, factor: f32) {
        if factor > 0.0 {
            self.scale *= factor;
        }
    }

    /// Rotation still waiting to be applied.
    pub fn pending(&self) -> f32 {
        self.theta_delta.abs() + self.phi_delta.abs()
    }

    /// Apply pending input to `camera`. Returns whether the camera moved.
    pub fn update(&mut self, camera: &mut PerspectiveCamera) -> bool {
        let offset = camera.position - self.target;
        let mut radius = offset.length();
        let mut theta = offset.x.atan2(offset.z);
        let mut phi = if radius > EPS {
            (offset.y / radius).clamp(-1.0, 1.0).acos()
        } else {
            PI / 2.0
        };

        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        theta += self.theta_delta * step;
        phi = (phi + self.phi_delta * step).clamp(EPS, PI - EPS);
        radius = (radius * self.scale).clamp(self.min_distance, self.max_distance);

        let position = self.target
            + Vec3::new(
                radius * phi.sin() * theta.sin(),
                radius * phi.cos(),
                radius * phi.sin() * theta.cos(),
            );
        let moved = position.distance_squared(camera.position) > EPS
            || camera.target.distance_squared(self.target) > EPS;
        camera.position = position;
        camera.target = self.target;

        if self.enable_damping {
            self.theta_delta *= 1.0 - self.damping_factor;
            self.phi_delta *= 1.0 - self.damping_factor;
        } else {
            self.theta_delta = 0.0;
            self.phi_delta = 0.0;
        }
        self.scale = 1.0;
        moved
    }
}
