use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// A monotonic time source. `now` is measured from an arbitrary fixed origin.
pub trait TimeSource {
    fn now(&self) -> Duration;
}

/// Wall-clock source backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Manually advanced source for headless runs and tests.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// move the driver's clock forward between frames.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.nanos
            .fetch_add(by.as_nanos() as u64, Ordering::Relaxed);
    }

    /// Jump to an absolute time. Moving backwards is allowed here; the
    /// [`Clock`] sampling it still never reports a decreasing elapsed time.
    pub fn set(&self, at: Duration) {
        self.nanos.store(at.as_nanos() as u64, Ordering::Relaxed);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }
}

/// Timing information handed to every update step for one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTime {
    /// 1-based frame counter.
    pub frame: u64,
    /// Time since the clock was created.
    pub elapsed: Duration,
    /// Time since the previous frame (since clock creation for frame 1).
    pub delta: Duration,
}

impl FrameTime {
    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }

    pub fn delta_secs(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

/// Frame clock: remembers its start and the last sampled elapsed time.
#[derive(Debug)]
pub struct Clock<S: TimeSource> {
    source: S,
    start: Duration,
    last_elapsed: Duration,
    frame: u64,
}

impl<S: TimeSource> Clock<S> {
    pub fn new(source: S) -> Self {
        let start = source.now();
        Self {
            source,
            start,
            last_elapsed: Duration::ZERO,
            frame: 0,
        }
    }

    /// Sample the source and produce this frame's timing.
    pub fn sample(&mut self) -> FrameTime {
        let elapsed = self
            .source
            .now()
            .saturating_sub(self.start)
            .max(self.last_elapsed);
        let delta = elapsed - self.last_elapsed;
        self.last_elapsed = elapsed;
        self.frame += 1;
        FrameTime {
            frame: self.frame,
            elapsed,
            delta,
        }
    }

    /// Elapsed time at the last sample.
    pub fn elapsed(&self) -> Duration {
        self.last_elapsed
    }

    pub fn frames(&self) -> u64 {
        self.frame
    }

    pub fn source(&self) -> &S {
        &self.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_frame_at_start_has_zero_delta() {
        let source = ManualClock::new();
        let mut clock = Clock::new(source.clone());
        let t = clock.sample();
        assert_eq!(t.frame, 1);
        assert_eq!(t.elapsed, Duration::ZERO);
        assert_eq!(t.delta, Duration::ZERO);
    }

    #[test]
    fn deltas_follow_elapsed_differences() {
        let source = ManualClock::new();
        let mut clock = Clock::new(source.clone());

        source.set(Duration::from_millis(16));
        let t1 = clock.sample();
        assert_eq!(t1.delta, Duration::from_millis(16));

        source.set(Duration::from_millis(33));
        let t2 = clock.sample();
        assert_eq!(t2.elapsed, Duration::from_millis(33));
        assert_eq!(t2.delta, Duration::from_millis(17));
    }

    #[test]
    fn clock_measures_from_its_creation() {
        let source = ManualClock::new();
        source.set(Duration::from_secs(10));
        let mut clock = Clock::new(source.clone());
        source.advance(Duration::from_millis(250));
        assert_eq!(clock.sample().elapsed, Duration::from_millis(250));
    }

    #[test]
    fn elapsed_never_decreases() {
        let source = ManualClock::new();
        let mut clock = Clock::new(source.clone());
        source.set(Duration::from_millis(50));
        clock.sample();
        source.set(Duration::from_millis(20));
        let t = clock.sample();
        assert_eq!(t.elapsed, Duration::from_millis(50));
        assert_eq!(t.delta, Duration::ZERO);
    }

    #[test]
    fn monotonic_clock_advances() {
        let mut clock = Clock::new(MonotonicClock::new());
        let a = clock.sample();
        let b = clock.sample();
        assert!(b.elapsed >= a.elapsed);
        assert_eq!(clock.frames(), 2);
    }
}
