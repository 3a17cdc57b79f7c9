//! Frame Kernel: the render-loop driver shared by every lesson.
//!
//! Each frame samples the clock, runs the registered update steps in
//! registration order, presents the context, then asks the host scheduler for
//! the next frame.
//!
//! # Invariants
//! - Update steps run in registration order, exactly once per frame, before the draw.
//! - Elapsed time never decreases; delta is `elapsed(k) - elapsed(k - 1)`.
//! - A frame is only rescheduled while the driver's liveness flag is set.
//! - A failing step or draw stops the driver; the error is returned, never swallowed.

pub mod clock;
pub mod driver;
pub mod schedule;
pub mod stats;
pub mod step;

pub use clock::{Clock, FrameTime, ManualClock, MonotonicClock, TimeSource};
pub use driver::{DriverError, DriverState, FrameDriver, Liveness, Present, RunSummary, Tick};
pub use schedule::{FrameScheduler, MIN_REFRESH_HZ, Pacer};
pub use stats::FrameTimer;
pub use step::{FnStep, StepError, StepResult, UpdateStep, step_fn};
