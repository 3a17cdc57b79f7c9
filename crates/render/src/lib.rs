//! Rendering adapter: renderer-agnostic interface.
//!
//! # Invariants
//! - A renderer reads the scene, camera and resource pool; it never mutates them.
//! - Every drawable node handed to a renderer references live pool records.
//!
//! [`DebugTextRenderer`] is the headless implementation; the GPU backend lives
//! in `frameloop-render-wgpu` behind the same [`Renderer`] trait.

mod camera;
mod controls;
mod debug;
mod present;

pub use camera::PerspectiveCamera;
pub use controls::OrbitControls;
pub use debug::DebugTextRenderer;
pub use present::{Presenter, View};

use frameloop_assets::ResourcePool;
use frameloop_common::{GeometryHandle, MaterialHandle, NodeId};
use frameloop_scene::Scene;

/// Errors from rendering a frame.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("node {node:?} references disposed geometry {handle:?}")]
    MissingGeometry { node: NodeId, handle: GeometryHandle },
    #[error("node {node:?} references disposed material {handle:?}")]
    MissingMaterial { node: NodeId, handle: MaterialHandle },
    #[error("surface error: {0}")]
    Surface(String),
    #[error("GPU device error: {0}")]
    Device(String),
}

/// Everything a renderer needs for one frame.
#[derive(Clone, Copy)]
pub struct RenderFrame<'a> {
    pub scene: &'a Scene,
    pub camera: &'a PerspectiveCamera,
    pub resources: &'a ResourcePool,
    pub frame: u64,
}

impl RenderFrame<'_> {
    /// Check that every drawable node resolves in the resource pool.
    pub fn validate(&self) -> Result<(), RenderError> {
        for (node, _, geometry, material) in self.scene.drawables() {
            if self.resources.geometry(geometry).is_none() {
                return Err(RenderError::MissingGeometry {
                    node,
                    handle: geometry,
                });
            }
            if self.resources.material(material).is_none() {
                return Err(RenderError::MissingMaterial {
                    node,
                    handle: material,
                });
            }
        }
        Ok(())
    }
}

/// Renderer-agnostic interface. All renderers implement this trait.
pub trait Renderer {
    /// Draw one frame.
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError>;

    /// The output surface changed size.
    fn resize(&mut self, _width: u32, _height: u32) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use frameloop_assets::{Geometry, Material};
    use frameloop_common::Color;
    use frameloop_scene::Node;

    #[test]
    fn validate_catches_disposed_records() {
        let mut pool = ResourcePool::new();
        let g = pool.create_geometry(Geometry::unit_box()).unwrap();
        let m = pool.create_material(Material::standard(Color::WHITE));
        let mut scene = Scene::new();
        scene.add(Node::mesh("cube", g, m));
        let camera = PerspectiveCamera::default();

        let frame = RenderFrame {
            scene: &scene,
            camera: &camera,
            resources: &pool,
            frame: 1,
        };
        assert!(frame.validate().is_ok());

        pool.dispose_material(m);
        let frame = RenderFrame {
            scene: &scene,
            camera: &camera,
            resources: &pool,
            frame: 2,
        };
        assert!(matches!(
            frame.validate(),
            Err(RenderError::MissingMaterial { .. })
        ));
    }
}
