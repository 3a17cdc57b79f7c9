//! Scene graph: the render target owned by the scene side of a lesson.
//!
//! The frame driver never looks inside a scene; update steps mutate node
//! transforms and renderers read them.
//!
//! # Invariants
//! - Iteration order is deterministic (`BTreeMap` keyed by [`NodeId`]).
//! - A node references pool records by handle only; the scene never owns them.

mod node;
mod scene;

pub use node::{Light, Node, NodeKind};
pub use scene::{Scene, SceneError};

pub use frameloop_common::NodeId;
