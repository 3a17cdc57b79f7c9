use std::fmt::Write as _;

use crate::{RenderError, RenderFrame, Renderer};
use frameloop_assets::Geometry;
use frameloop_scene::NodeKind;

/// Headless renderer that describes each frame as text.
///
/// Useful for CLI output, logging, and testing the render interface.
#[derive(Debug, Default)]
pub struct DebugTextRenderer {
    frames: u64,
    last: String,
}

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of frames rendered so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Text produced by the most recent frame.
    pub fn last_output(&self) -> &str {
        &self.last
    }

    fn describe(frame: &RenderFrame<'_>) -> String {
        let mut out = String::new();
        let cam = frame.camera;
        let _ = writeln!(
            out,
            "=== Frame {} ({} nodes, background {}) ===",
            frame.frame,
            frame.scene.len(),
            frame.scene.background.to_hex_string()
        );
        let _ = writeln!(
            out,
            "Camera: eye=({:.1}, {:.1}, {:.1}) target=({:.1}, {:.1}, {:.1}) fov={:.0}",
            cam.position.x,
            cam.position.y,
            cam.position.z,
            cam.target.x,
            cam.target.y,
            cam.target.z,
            cam.fov_degrees
        );

        for (id, node, geometry, material) in frame.scene.drawables() {
            let p = node.transform.position;
            let kind = match &node.kind {
                NodeKind::Points { .. } => "points",
                _ => "mesh",
            };
            let _ = write!(
                out,
                "  [{}] {} {kind} pos=({:.2}, {:.2}, {:.2})",
                id.short(),
                node.name,
                p.x,
                p.y,
                p.z
            );
            if let Some(record) = frame.resources.geometry(geometry) {
                if let Geometry::Buffer { .. } = record.geometry {
                    let _ = write!(
                        out,
                        " vertices={} v{}",
                        record.geometry.vertex_count().unwrap_or(0),
                        record.version
                    );
                }
            }
            if let Some(record) = frame.resources.material(material) {
                let _ = write!(out, " color={}", record.material.color().to_hex_string());
            }
            out.push('\n');
        }
        out
    }
}

impl Renderer for DebugTextRenderer {
    fn render(&mut self, frame: &RenderFrame<'_>) -> Result<(), RenderError> {
        frame.validate()?;
        self.last = Self::describe(frame);
        self.frames += 1;
        tracing::trace!(frame = frame.frame, bytes = self.last.len(), "debug frame rendered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PerspectiveCamera;
    use frameloop_assets::{Material, ResourcePool};
    use frameloop_common::{Color, Transform};
    use frameloop_scene::{Light, Node, Scene};
    use glam::Vec3;

    #[test]
    fn empty_scene_renders_header() {
        let scene = Scene::new();
        let pool = ResourcePool::new();
        let camera = PerspectiveCamera::default();
        let mut renderer = DebugTextRenderer::new();
        renderer
            .render(&RenderFrame {
                scene: &scene,
                camera: &camera,
                resources: &pool,
                frame: 7,
            })
            .unwrap();

        assert!(renderer.last_output().contains("Frame 7 (0 nodes"));
        assert!(renderer.last_output().contains("fov=75"));
        assert_eq!(renderer.frames(), 1);
    }

    #[test]
    fn drawables_are_listed_and_lights_skipped() {
        let mut pool = ResourcePool::new();
        let g = pool
            .create_geometry(Geometry::Buffer {
                positions: vec![0.0; 9],
                colors: None,
            })
            .unwrap();
        let m = pool.create_material(Material::standard(Color::from_hex(0xff6030)));
        let mut scene = Scene::new();
        scene.add(
            Node::points("particles", g, m)
                .with_transform(Transform::from_position(Vec3::new(1.0, 2.0, 3.0))),
        );
        scene.add(Node::light(
            "sun",
            Light::Ambient {
                color: Color::WHITE,
                intensity: 0.5,
            },
        ));
        let camera = PerspectiveCamera::default();
        let mut renderer = DebugTextRenderer::new();
        renderer
            .render(&RenderFrame {
                scene: &scene,
                camera: &camera,
                resources: &pool,
                frame: 1,
            })
            .unwrap();

        let out = renderer.last_output();
        assert!(out.contains("particles points pos=(1.00, 2.00, 3.00)"));
        assert!(out.contains("vertices=3 v0"));
        assert!(out.contains("color=#ff6030"));
        assert!(!out.contains("sun"));
    }

    #[test]
    fn disposed_resource_fails_the_frame() {
        let mut pool = ResourcePool::new();
        let g = pool.create_geometry(Geometry::unit_box()).unwrap();
        let m = pool.create_material(Material::standard(Color::WHITE));
        let mut scene = Scene::new();
        scene.add(Node::mesh("cube", g, m));
        pool.dispose_geometry(g);

        let camera = PerspectiveCamera::default();
        let mut renderer = DebugTextRenderer::new();
        let result = renderer.render(&RenderFrame {
            scene: &scene,
            camera: &camera,
            resources: &pool,
            frame: 1,
        });
        assert!(matches!(result, Err(RenderError::MissingGeometry { .. })));
        assert_eq!(renderer.frames(), 0);
    }
}
