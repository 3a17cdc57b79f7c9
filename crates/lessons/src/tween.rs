use glam::Vec3;

/// Easing curves for [`Tween`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ease {
    Linear,
    /// Quadratic ease-out.
    Power1Out,
    /// Cubic ease-in-out.
    Power2InOut,
}

impl Ease {
    /// Map linear progress `t` in `[0, 1]` onto the curve.
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Self::Linear => t,
            Self::Power1Out => 1.0 - (1.0 - t) * (1.0 - t),
            Self::Power2InOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
        }
    }
}

/// Interpolates a vector from `from` to `to` over `duration` seconds, after
/// an optional `delay`. Advanced by frame deltas.
#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    from: Vec3,
    to: Vec3,
    delay: f32,
    duration: f32,
    ease: Ease,
    clock: f32,
}

impl Tween {
    pub fn new(from: Vec3, to: Vec3, duration: f32, ease: Ease) -> Self {
        Self {
            from,
            to,
            delay: 0.0,
            duration,
            ease,
            clock: 0.0,
        }
    }

    pub fn with_delay(mut self, delay: f32) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    /// Advance by `dt` seconds and return the current value.
    pub fn advance(&mut self, dt: f32) -> Vec3 {
        self.clock += dt.max(0.0);
        self.value()
    }

    /// Eased progress in `[0, 1]`.
    pub fn progress(&self) -> f32 {
        let active = (self.clock - self.delay).max(0.0);
        if self.duration <= 0.0 {
            return if self.clock >= self.delay { 1.0 } else { 0.0 };
        }
        self.ease.apply(active / self.duration)
    }

    pub fn value(&self) -> Vec3 {
        self.from.lerp(self.to, self.progress())
    }

    pub fn target(&self) -> Vec3 {
        self.to
    }

    pub fn is_finished(&self) -> bool {
        self.clock >= self.delay + self.duration.max(0.0)
    }
}
