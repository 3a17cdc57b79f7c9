use crate::PhysicsError;
use crate::body::RigidBody;
use crate::world::PhysicsWorld;
use frameloop_common::{BodyId, NodeId};
use frameloop_scene::{Node, Scene};
use serde::{Deserialize, Serialize};

/// A scene node whose pose mirrors a physics body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncedPair {
    pub node: NodeId,
    pub body: BodyId,
}

/// How the frame delta is fed to [`PhysicsWorld::step`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StepSettings {
    pub fixed_step: f32,
    pub max_substeps: u32,
}

impl Default for StepSettings {
    fn default() -> Self {
        Self {
            fixed_step: 1.0 / 60.0,
            max_substeps: 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepReport {
    pub substeps: u32,
    pub synced: usize,
}

/// The set of node/body pairs kept in lock-step.
///
/// Both halves of a pair are created together by [`spawn`](Self::spawn) and
/// removed together by [`despawn`](Self::despawn) or [`clear`](Self::clear).
#[derive(Debug, Default)]
pub struct SyncRegistry {
    pairs: Vec<SyncedPair>,
}

impl SyncRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[SyncedPair] {
        &self.pairs
    }

    /// Add `node` to the scene and `body` to the world as one pair.
    ///
    /// The node starts at the body's pose; its scale is kept.
    pub fn spawn(
        &mut self,
        scene: &mut Scene,
        world: &mut PhysicsWorld,
        mut node: Node,
        body: RigidBody,
    ) -> SyncedPair {
        node.transform.position = body.position;
        node.transform.rotation = body.orientation;
        let pair = SyncedPair {
            node: scene.add(node),
            body: world.add_body(body),
        };
        self.pairs.push(pair);
        pair
    }

    /// Remove the pair containing `node`, both halves.
    pub fn despawn(&mut self, scene: &mut Scene, world: &mut PhysicsWorld, node: NodeId) -> bool {
        let Some(index) = self.pairs.iter().position(|p| p.node == node) else {
            return false;
        };
        let pair = self.pairs.swap_remove(index);
        scene.remove(pair.node);
        world.remove_body(pair.body);
        true
    }

    /// Remove every pair. Returns how many were removed.
    pub fn clear(&mut self, scene: &mut Scene, world: &mut PhysicsWorld) -> usize {
        let count = self.pairs.len();
        for pair in self.pairs.drain(..) {
            scene.remove(pair.node);
            world.remove_body(pair.body);
        }
        tracing::debug!(count, "synced pairs removed");
        count
    }

    /// Copy every body's position and orientation onto its node, verbatim.
    pub fn sync(&self, world: &PhysicsWorld, scene: &mut Scene) -> Result<usize, PhysicsError> {
        for pair in &self.pairs {
            let body = world
                .body(pair.body)
                .ok_or(PhysicsError::UnknownBody(pair.body))?;
            let node = scene
                .get_mut(pair.node)
                .ok_or(PhysicsError::UnknownNode(pair.node))?;
            node.transform.position = body.position;
            node.transform.rotation = body.orientation;
        }
        Ok(self.pairs.len())
    }

    /// Step the world by a frame delta, then sync every pair.
    pub fn advance(
        &self,
        world: &mut PhysicsWorld,
        scene: &mut Scene,
        settings: &StepSettings,
        delta: f32,
    ) -> Result<StepReport, PhysicsError> {
        let substeps = world.step(settings.fixed_step, delta, settings.max_substeps)?;
        let synced = self.sync(world, scene)?;
        Ok(StepReport { substeps, synced })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::Shape;
    use frameloop_common::{GeometryHandle, MaterialHandle};
    use glam::Vec3;

    fn node() -> Node {
        Node::mesh("sphere", GeometryHandle(1), MaterialHandle(2))
    }

    fn ball(position: Vec3) -> RigidBody {
        RigidBody::new(1.0, Shape::Sphere { radius: 0.5 }).with_position(position)
    }

    #[test]
    fn spawn_places_node_at_body() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let mut registry = SyncRegistry::new();
        let pair = registry.spawn(&mut scene, &mut world, node(), ball(Vec3::new(1.0, 3.0, -2.0)));
        assert_eq!(scene.transform(pair.node).unwrap().position, Vec3::new(1.0, 3.0, -2.0));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn despawn_removes_both_halves() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let mut registry = SyncRegistry::new();
        let keep = registry.spawn(&mut scene, &mut world, node(), ball(Vec3::ZERO));
        let gone = registry.spawn(&mut scene, &mut world, node(), ball(Vec3::X * 3.0));

        assert!(registry.despawn(&mut scene, &mut world, gone.node));
        assert!(!registry.despawn(&mut scene, &mut world, gone.node));
        assert!(scene.get(gone.node).is_none());
        assert!(world.body(gone.body).is_none());
        assert!(scene.get(keep.node).is_some());
        assert_eq!(registry.pairs(), &[keep]);
    }

    #[test]
    fn clear_empties_scene_and_world() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let mut registry = SyncRegistry::new();
        for i in 0..4 {
            registry.spawn(&mut scene, &mut world, node(), ball(Vec3::X * i as f32 * 2.0));
        }
        assert_eq!(registry.clear(&mut scene, &mut world), 4);
        assert!(scene.is_empty());
        assert!(world.is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn sync_with_missing_body_fails() {
        let mut scene = Scene::new();
        let mut world = PhysicsWorld::new();
        let mut registry = SyncRegistry::new();
        let pair = registry.spawn(&mut scene, &mut world, node(), ball(Vec3::ZERO));
        world.remove_body(pair.body);
        assert!(matches!(
            registry.sync(&world, &mut scene),
            Err(PhysicsError::UnknownBody(_))
        ));
    }
}
