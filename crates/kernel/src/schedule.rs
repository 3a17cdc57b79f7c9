use std::time::{Duration, Instant};

/// The host's "run this before the next repaint" primitive.
///
/// Calling it arms exactly one future frame. Hosts decide when that frame
/// actually fires (vsync, a timer, a redraw event).
pub trait FrameScheduler {
    fn request_frame(&mut self);
}

/// Slowest rate a [`Pacer`] runs at: one frame every ten seconds.
pub const MIN_REFRESH_HZ: f64 = 0.1;

/// Blocking host that paces frames to a fixed refresh rate.
///
/// Used by headless runs in place of a display. When a frame overruns its
/// slot the pacer resynchronizes instead of bursting to catch up, the way a
/// throttled display would.
#[derive(Debug)]
pub struct Pacer {
    interval: Duration,
    next_deadline: Option<Instant>,
    pending: bool,
}

impl Pacer {
    /// Pace at `refresh_hz` frames per second.
    ///
    /// Zero, negative and NaN rates disable pacing. Positive rates below
    /// [`MIN_REFRESH_HZ`] are raised to it.
    pub fn new(refresh_hz: f64) -> Self {
        let interval = if refresh_hz > 0.0 {
            Duration::from_secs_f64(1.0 / refresh_hz.max(MIN_REFRESH_HZ))
        } else {
            Duration::ZERO
        };
        Self {
            interval,
            next_deadline: None,
            pending: false,
        }
    }

    /// Fire requested frames back to back.
    pub fn unpaced() -> Self {
        Self::new(0.0)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Block until the requested frame is due.
    ///
    /// Returns `false` without blocking when no frame was requested.
    pub fn wait(&mut self) -> bool {
        if !self.pending {
            return false;
        }
        self.pending = false;
        if self.interval.is_zero() {
            return true;
        }

        let now = Instant::now();
        let deadline = self.next_deadline.unwrap_or(now + self.interval);
        if deadline > now {
            std::thread::sleep(deadline - now);
            self.next_deadline = Some(deadline + self.interval);
        } else {
            tracing::trace!(late_by = ?(now - deadline), "frame overran its slot");
            self.next_deadline = Some(now + self.interval);
        }
        true
    }
}

impl FrameScheduler for Pacer {
    fn request_frame(&mut self) {
        self.pending = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wait_without_request_returns_immediately() {
        let mut pacer = Pacer::new(60.0);
        assert!(!pacer.wait());
    }

    #[test]
    fn request_is_consumed_by_wait() {
        let mut pacer = Pacer::unpaced();
        pacer.request_frame();
        assert!(pacer.is_pending());
        assert!(pacer.wait());
        assert!(!pacer.is_pending());
        assert!(!pacer.wait());
    }

    #[test]
    fn extreme_rates_never_overflow_the_interval() {
        assert_eq!(Pacer::new(1e-30).interval(), Duration::from_secs(10));
        assert_eq!(Pacer::new(f64::MIN_POSITIVE).interval(), Duration::from_secs(10));
        assert_eq!(Pacer::new(f64::INFINITY).interval(), Duration::ZERO);
        assert_eq!(Pacer::new(f64::NAN).interval(), Duration::ZERO);
        assert_eq!(Pacer::new(-5.0).interval(), Duration::ZERO);
    }

    #[test]
    fn paced_wait_sleeps_roughly_one_interval() {
        let mut pacer = Pacer::new(200.0);
        assert_eq!(pacer.interval(), Duration::from_millis(5));
        let start = Instant::now();
        pacer.request_frame();
        pacer.wait();
        pacer.request_frame();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(9));
    }
}
