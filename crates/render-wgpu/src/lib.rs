//! wgpu render backend for the lessons.
//!
//! Meshes are drawn as lit, instanced proxies scaled to their geometry's
//! extents; point clouds are uploaded once per geometry version and drawn as
//! a point list.
//!
//! # Invariants
//! - Renderer never mutates scene or pool state.
//! - A point buffer is re-uploaded only when its geometry version changes.
//! - A lost or outdated surface is reconfigured and the frame is skipped.

mod gpu;
mod mesh;
mod shaders;

pub use gpu::{GpuContext, WgpuRenderer};
