use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::clock::{Clock, FrameTime, MonotonicClock, TimeSource};
use crate::schedule::{FrameScheduler, Pacer};
use crate::stats::FrameTimer;
use crate::step::{StepError, StepResult, UpdateStep, step_fn};

/// Submits the context for rasterization once per frame.
pub trait Present<C: ?Sized> {
    fn present(&mut self, ctx: &C, time: &FrameTime) -> Result<(), StepError>;
}

/// Lifecycle of a [`FrameDriver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverState {
    /// No frame has been requested yet.
    Idle,
    /// Frames are being scheduled.
    Running,
    /// Liveness was cleared or a frame failed. Terminal.
    Stopped,
}

/// Errors that end a driver's run.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    #[error("update step `{step}` failed on frame {frame}: {source}")]
    Step {
        step: String,
        frame: u64,
        #[source]
        source: StepError,
    },
    #[error("draw failed on frame {frame}: {source}")]
    Present {
        frame: u64,
        #[source]
        source: StepError,
    },
}

/// Shared flag that keeps a driver rescheduling frames.
///
/// Clones observe the same flag; clearing any clone stops the driver before
/// its next reschedule.
#[derive(Debug, Clone)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_live(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub fn stop(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of one [`FrameDriver::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// The frame ran and the next one was requested.
    Scheduled(FrameTime),
    /// The frame ran, then liveness was found cleared; nothing was requested.
    Finished(FrameTime),
    /// The driver was already stopped; no frame ran.
    Inactive,
}

/// Totals reported by [`FrameDriver::run`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub elapsed: Duration,
    pub average_delta: Duration,
    pub max_delta: Duration,
}

/// Drives an unbounded sequence of frames over an owned context.
///
/// The driver owns the context for its whole lifetime. Update steps receive
/// it mutably in registration order; the presenter then sees the
/// post-update state read-only.
pub struct FrameDriver<C, S: TimeSource = MonotonicClock> {
    context: C,
    clock: Clock<S>,
    steps: Vec<Box<dyn UpdateStep<C>>>,
    state: DriverState,
    liveness: Liveness,
    timer: FrameTimer,
}

impl<C> FrameDriver<C, MonotonicClock> {
    /// Create a driver on the wall clock. The clock starts now.
    pub fn new(context: C) -> Self {
        Self::with_clock(context, MonotonicClock::new())
    }
}

impl<C, S: TimeSource> FrameDriver<C, S> {
    pub fn with_clock(context: C, source: S) -> Self {
        Self {
            context,
            clock: Clock::new(source),
            steps: Vec::new(),
            state: DriverState::Idle,
            liveness: Liveness::new(),
            timer: FrameTimer::default(),
        }
    }

    /// Register an update step. Steps run in the order they are added.
    pub fn add_step(&mut self, step: impl UpdateStep<C> + 'static) -> &mut Self {
        self.steps.push(Box::new(step));
        self
    }

    /// Register a closure as a named update step.
    pub fn step<F>(&mut self, name: impl Into<String>, f: F) -> &mut Self
    where
        F: FnMut(&mut C, &FrameTime) -> StepResult + 'static,
        C: 'static,
    {
        self.add_step(step_fn(name, f))
    }

    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut C {
        &mut self.context
    }

    pub fn into_context(self) -> C {
        self.context
    }

    pub fn state(&self) -> DriverState {
        self.state
    }

    /// A handle that can stop this driver from elsewhere.
    pub fn liveness(&self) -> Liveness {
        self.liveness.clone()
    }

    pub fn is_live(&self) -> bool {
        self.liveness.is_live() && self.state != DriverState::Stopped
    }

    /// Clear liveness. The driver stops at its next reschedule point.
    pub fn stop(&self) {
        self.liveness.stop();
    }

    pub fn clock(&self) -> &Clock<S> {
        &self.clock
    }

    pub fn timer(&self) -> &FrameTimer {
        &self.timer
    }

    /// Run one frame: sample time, run steps in order, present.
    ///
    /// Does not schedule anything. A failure moves the driver to
    /// [`DriverState::Stopped`].
    pub fn frame(&mut self, presenter: &mut dyn Present<C>) -> Result<FrameTime, DriverError> {
        let time = self.clock.sample();
        let _span = tracing::debug_span!("frame", frame = time.frame).entered();
        self.timer.record(time.delta);

        for step in &mut self.steps {
            if let Err(source) = step.update(&mut self.context, &time) {
                let step = step.name().to_string();
                tracing::error!(%step, frame = time.frame, "update step failed: {source}");
                self.state = DriverState::Stopped;
                return Err(DriverError::Step {
                    step,
                    frame: time.frame,
                    source,
                });
            }
        }

        if let Err(source) = presenter.present(&self.context, &time) {
            tracing::error!(frame = time.frame, "draw failed: {source}");
            self.state = DriverState::Stopped;
            return Err(DriverError::Present {
                frame: time.frame,
                source,
            });
        }

        tracing::trace!(
            elapsed = ?time.elapsed,
            delta = ?time.delta,
            "frame complete"
        );
        Ok(time)
    }

    /// Host entry point: run one frame, then re-arm the scheduler if still live.
    pub fn tick(
        &mut self,
        presenter: &mut dyn Present<C>,
        scheduler: &mut dyn FrameScheduler,
    ) -> Result<Tick, DriverError> {
        match self.state {
            DriverState::Stopped => return Ok(Tick::Inactive),
            DriverState::Idle => {
                tracing::info!(steps = self.steps.len(), "frame driver running");
                self.state = DriverState::Running;
            }
            DriverState::Running => {}
        }

        if !self.liveness.is_live() {
            self.halt();
            return Ok(Tick::Inactive);
        }

        let time = self.frame(presenter)?;

        if self.liveness.is_live() {
            scheduler.request_frame();
            Ok(Tick::Scheduled(time))
        } else {
            self.halt();
            Ok(Tick::Finished(time))
        }
    }

    /// Explicit frame loop for blocking hosts.
    ///
    /// Ticks until liveness is cleared, a frame fails, or `frame_limit` frames
    /// have run (reaching the limit clears liveness).
    pub fn run(
        &mut self,
        presenter: &mut dyn Present<C>,
        pacer: &mut Pacer,
        frame_limit: Option<u64>,
    ) -> Result<RunSummary, DriverError> {
        let mut frames = 0u64;
        loop {
            if frame_limit.is_some_and(|limit| frames >= limit) {
                self.stop();
                self.halt();
                break;
            }
            match self.tick(presenter, pacer)? {
                Tick::Scheduled(_) => {
                    frames += 1;
                    if !frame_limit.is_some_and(|limit| frames >= limit) {
                        pacer.wait();
                    }
                }
                Tick::Finished(_) => {
                    frames += 1;
                    break;
                }
                Tick::Inactive => break,
            }
        }

        let summary = RunSummary {
            frames,
            elapsed: self.clock.elapsed(),
            average_delta: self.timer.average(),
            max_delta: self.timer.max(),
        };
        tracing::info!(
            frames = summary.frames,
            elapsed = ?summary.elapsed,
            average_delta = ?summary.average_delta,
            "frame loop finished"
        );
        Ok(summary)
    }

    fn halt(&mut self) {
        if self.state != DriverState::Stopped {
            tracing::info!(frames = self.clock.frames(), "frame driver stopped");
        }
        self.state = DriverState::Stopped;
    }
}
