use frameloop_assets::AnimationClip;

/// Plays one animation clip on a loop.
#[derive(Debug, Clone)]
pub struct AnimationMixer {
    clip: AnimationClip,
    time: f32,
    loops: u32,
    pub time_scale: f32,
}

impl AnimationMixer {
    pub fn new(clip: AnimationClip) -> Self {
        tracing::debug!(clip = %clip.name, duration = clip.duration, "animation started");
        Self {
            clip,
            time: 0.0,
            loops: 0,
            time_scale: 1.0,
        }
    }

    pub fn clip(&self) -> &AnimationClip {
        &self.clip
    }

    /// Playhead in seconds, within `[0, duration)`.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Completed passes through the clip.
    pub fn loops(&self) -> u32 {
        self.loops
    }

    /// Playhead as a fraction of the clip.
    pub fn phase(&self) -> f32 {
        if self.clip.duration > 0.0 {
            self.time / self.clip.duration
        } else {
            0.0
        }
    }

    /// Advance the playhead, wrapping into the clip. Constant time whatever the
    /// clip length.
    pub fn update(&mut self, dt: f32) {
        let duration = self.clip.duration;
        if !(duration.is_finite() && duration > 0.0) {
            return;
        }
        let advanced = self.time + dt * self.time_scale;
        if !advanced.is_finite() {
            return;
        }
        if advanced >= duration {
            // `as` saturates, so a huge wrap count pins at u32::MAX.
            let wraps = (advanced / duration).floor() as u32;
            self.loops = self.loops.saturating_add(wraps);
        }
        self.time = advanced.rem_euclid(duration);
        if self.time >= duration {
            self.time = 0.0;
        }
    }
}
