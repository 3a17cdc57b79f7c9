//! Lesson actions: hosts translate raw input into [`Action`]s, lessons consume them.
//!
//! # Invariants
//! - Lessons never see host input events, only actions.
//! - Actions queued during a frame are handled in arrival order.

pub mod action;
pub mod bindings;

pub use action::{Action, ActionQueue, InputError};
pub use bindings::{Bindings, Key};
