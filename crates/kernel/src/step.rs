use crate::clock::FrameTime;

/// Error type returned by update steps and presenters.
pub type StepError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type StepResult = Result<(), StepError>;

/// One per-frame update, run with the driver's context.
///
/// Steps own whatever private state they need; shared state lives in the
/// context `C`.
pub trait UpdateStep<C> {
    /// Name used in logs and in [`DriverError::Step`](crate::DriverError).
    fn name(&self) -> &str;

    fn update(&mut self, ctx: &mut C, time: &FrameTime) -> StepResult;
}

/// Adapter turning a closure into a named [`UpdateStep`].
pub struct FnStep<F> {
    name: String,
    f: F,
}

impl<C, F> UpdateStep<C> for FnStep<F>
where
    F: FnMut(&mut C, &FrameTime) -> StepResult,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn update(&mut self, ctx: &mut C, time: &FrameTime) -> StepResult {
        (self.f)(ctx, time)
    }
}

pub fn step_fn<C, F>(name: impl Into<String>, f: F) -> FnStep<F>
where
    F: FnMut(&mut C, &FrameTime) -> StepResult,
{
    FnStep {
        name: name.into(),
        f,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn fn_step_runs_closure() {
        let mut step = step_fn("count", |ctx: &mut u32, _t: &FrameTime| {
            *ctx += 1;
            Ok(())
        });
        let time = FrameTime {
            frame: 1,
            elapsed: Duration::ZERO,
            delta: Duration::ZERO,
        };
        let mut ctx = 0u32;
        step.update(&mut ctx, &time).unwrap();
        step.update(&mut ctx, &time).unwrap();
        assert_eq!(ctx, 2);
        assert_eq!(UpdateStep::<u32>::name(&step), "count");
    }
}
