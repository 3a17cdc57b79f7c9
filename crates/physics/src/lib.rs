//! Rigid-body physics for the lessons, and the glue that copies body poses
//! onto scene nodes.
//!
//! [`PhysicsWorld`] wraps a rapier3d pipeline. [`PhysicsWorld::step`]
//! advances it in fixed increments with a bounded number of catch-up
//! substeps per call, and turns newly touching pairs into [`ContactEvent`]s.
//!
//! [`SyncRegistry`] holds the node/body pairs. After a step, each node's
//! position and rotation are overwritten with its body's, verbatim.

mod body;
mod sync;
mod world;

pub use body::{BodyState, RigidBody, Shape};
pub use sync::{StepReport, StepSettings, SyncRegistry, SyncedPair};
pub use world::{ContactEvent, ContactMaterial, PhysicsWorld};

pub use frameloop_common::BodyId;

/// Errors from physics operations.
#[derive(Debug, thiserror::Error)]
pub enum PhysicsError {
    #[error("fixed time step must be positive and finite, got {0}")]
    InvalidTimeStep(f32),
    #[error("unknown body {0:?}")]
    UnknownBody(BodyId),
    #[error("unknown scene node {0:?}")]
    UnknownNode(frameloop_common::NodeId),
}
