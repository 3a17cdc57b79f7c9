//! Shared value types used across the frameloop crates.
//!
//! # Invariants
//! - Everything here is plain data: `Copy` where possible, no interior mutability.

mod types;

pub use types::{BodyId, Color, ColorParseError, GeometryHandle, MaterialHandle, NodeId, Transform};
