use crate::node::{Node, NodeKind};
use frameloop_common::{Color, GeometryHandle, MaterialHandle, NodeId, Transform};
use std::collections::BTreeMap;

#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("unknown node {0:?}")]
    UnknownNode(NodeId),
    #[error("node {0:?} does not draw a geometry")]
    NotDrawable(NodeId),
}

/// Flat collection of scene nodes.
///
/// Nodes are addressed by id. Parenting is not modelled: groups exist so that
/// lessons can name a set of nodes, and every transform is in world space.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: BTreeMap<NodeId, Node>,
    pub background: Color,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            nodes: BTreeMap::new(),
            background: Color::BLACK,
        }
    }
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn add(&mut self, node: Node) -> NodeId {
        let id = NodeId::new();
        tracing::trace!(node = %id.short(), name = %node.name, "node added");
        self.nodes.insert(id, node);
        id
    }

    /// Remove a node. Returns it if it existed.
    pub fn remove(&mut self, id: NodeId) -> Option<Node> {
        let node = self.nodes.remove(&id);
        if node.is_some() {
            tracing::trace!(node = %id.short(), "node removed");
        }
        node
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn transform(&self, id: NodeId) -> Option<Transform> {
        self.nodes.get(&id).map(|n| n.transform)
    }

    pub fn set_transform(&mut self, id: NodeId, transform: Transform) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        node.transform = transform;
        Ok(())
    }

    /// Point a mesh or points node at a different geometry/material pair.
    pub fn set_resources(
        &mut self,
        id: NodeId,
        geometry: GeometryHandle,
        material: MaterialHandle,
    ) -> Result<(), SceneError> {
        let node = self.nodes.get_mut(&id).ok_or(SceneError::UnknownNode(id))?;
        match &mut node.kind {
            NodeKind::Mesh {
                geometry: g,
                material: m,
            }
            | NodeKind::Points {
                geometry: g,
                material: m,
            } => {
                *g = geometry;
                *m = material;
                Ok(())
            }
            NodeKind::Group | NodeKind::Light(_) => Err(SceneError::NotDrawable(id)),
        }
    }

    /// First node with the given name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, n)| n.name == name)
            .map(|(id, _)| *id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &Node)> {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    /// Visible nodes that draw something, with their pool handles.
    pub fn drawables(
        &self,
    ) -> impl Iterator<Item = (NodeId, &Node, GeometryHandle, MaterialHandle)> {
        self.nodes.iter().filter(|(_, n)| n.visible).filter_map(|(id, n)| {
            n.kind
                .resources()
                .map(|(geometry, material)| (*id, n, geometry, material))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::Light;
    use glam::Vec3;

    fn handles(n: u64) -> (GeometryHandle, MaterialHandle) {
        (GeometryHandle(n), MaterialHandle(n + 100))
    }

    #[test]
    fn scene_starts_empty() {
        let scene = Scene::new();
        assert!(scene.is_empty());
        assert_eq!(scene.background, Color::BLACK);
    }

    #[test]
    fn add_get_remove() {
        let mut scene = Scene::new();
        let (g, m) = handles(1);
        let id = scene.add(Node::mesh("cube", g, m));
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.get(id).unwrap().name, "cube");
        assert_eq!(scene.find("cube"), Some(id));

        let node = scene.remove(id).unwrap();
        assert_eq!(node.kind.resources(), Some((g, m)));
        assert!(scene.remove(id).is_none());
        assert!(scene.is_empty());
    }

    #[test]
    fn set_transform_on_unknown_node_fails() {
        let mut scene = Scene::new();
        let err = scene.set_transform(NodeId::new(), Transform::default());
        assert!(matches!(err, Err(SceneError::UnknownNode(_))));
    }

    #[test]
    fn set_transform_updates_node() {
        let mut scene = Scene::new();
        let id = scene.add(Node::group("root"));
        let t = Transform::from_position(Vec3::new(1.0, 2.0, 3.0));
        scene.set_transform(id, t).unwrap();
        assert_eq!(scene.transform(id), Some(t));
    }

    #[test]
    fn set_resources_only_on_drawables() {
        let mut scene = Scene::new();
        let (g, m) = handles(1);
        let points = scene.add(Node::points("galaxy", g, m));
        let light = scene.add(Node::light(
            "sun",
            Light::Ambient {
                color: Color::WHITE,
                intensity: 0.5,
            },
        ));

        let (g2, m2) = handles(2);
        scene.set_resources(points, g2, m2).unwrap();
        assert_eq!(scene.get(points).unwrap().kind.resources(), Some((g2, m2)));
        assert!(matches!(
            scene.set_resources(light, g2, m2),
            Err(SceneError::NotDrawable(_))
        ));
    }

    #[test]
    fn drawables_skip_hidden_and_non_drawing_nodes() {
        let mut scene = Scene::new();
        let (g, m) = handles(1);
        scene.add(Node::mesh("a", g, m));
        let hidden = scene.add(Node::mesh("b", g, m));
        scene.add(Node::group("c"));
        scene.get_mut(hidden).unwrap().visible = false;

        let names: Vec<_> = scene.drawables().map(|(_, n, _, _)| n.name.clone()).collect();
        assert_eq!(names, vec!["a"]);
    }
}
