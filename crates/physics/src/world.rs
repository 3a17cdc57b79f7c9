use crate::PhysicsError;
use crate::body::{BodyState, RigidBody, from_vector, to_vector};
use frameloop_common::BodyId;
use glam::Vec3;
use rapier3d::na::Point3;
use rapier3d::prelude::{
    CCDSolver, ColliderHandle, ColliderSet, DefaultBroadPhase, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline,
    RigidBodyHandle, RigidBodySet,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Contact points closer than this count as touching.
const TOUCH_DISTANCE: f32 = 0.005;

/// Friction and bounciness used when two bodies touch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContactMaterial {
    pub friction: f32,
    pub restitution: f32,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            friction: 0.3,
            restitution: 0.0,
        }
    }
}

/// Two bodies started touching during a step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub a: BodyId,
    pub b: BodyId,
    /// Approach speed along the contact normal when the contact began.
    pub impact_velocity: f32,
}

/// The simulation: a rapier pipeline behind a fixed-step clock, with bodies
/// addressed by [`BodyId`].
///
/// `default_contact_material` and `allow_sleep` are read when a body is
/// added; change them before adding bodies.
pub struct PhysicsWorld {
    pub gravity: Vec3,
    pub default_contact_material: ContactMaterial,
    pub allow_sleep: bool,
    handles: BTreeMap<BodyId, RigidBodyHandle>,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    pipeline: PhysicsPipeline,
    params: IntegrationParameters,
    islands: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd: CCDSolver,
    /// Bodies holding user forces, cleared after the next step.
    forced: BTreeSet<BodyId>,
    accumulator: f32,
    time: f32,
    steps: u64,
    touching: BTreeSet<(BodyId, BodyId)>,
    events: Vec<ContactEvent>,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: Vec3::new(0.0, -9.82, 0.0),
            default_contact_material: ContactMaterial::default(),
            allow_sleep: false,
            handles: BTreeMap::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            pipeline: PhysicsPipeline::new(),
            params: IntegrationParameters::default(),
            islands: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd: CCDSolver::new(),
            forced: BTreeSet::new(),
            accumulator: 0.0,
            time: 0.0,
            steps: 0,
            touching: BTreeSet::new(),
            events: Vec::new(),
        }
    }

    pub fn add_body(&mut self, body: RigidBody) -> BodyId {
        let id = BodyId::new();
        let handle = self.bodies.insert(body.to_engine(id, self.allow_sleep));
        self.colliders.insert_with_parent(
            body.collider(self.default_contact_material),
            handle,
            &mut self.bodies,
        );
        self.handles.insert(id, handle);
        tracing::debug!(?id, mass = body.mass, shape = ?body.shape, "body added");
        id
    }

    /// Remove a body and its collider. Returns its last state.
    pub fn remove_body(&mut self, id: BodyId) -> Option<BodyState> {
        let handle = self.handles.remove(&id)?;
        let removed = self.bodies.remove(
            handle,
            &mut self.islands,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            true,
        )?;
        self.touching.retain(|(a, b)| *a != id && *b != id);
        self.forced.remove(&id);
        tracing::debug!(?id, "body removed");
        Some(BodyState::of(&removed))
    }

    pub fn body(&self, id: BodyId) -> Option<BodyState> {
        let handle = self.handles.get(&id)?;
        self.bodies.get(*handle).map(BodyState::of)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, BodyState)> + '_ {
        self.handles
            .iter()
            .filter_map(|(id, handle)| Some((*id, BodyState::of(self.bodies.get(*handle)?))))
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Simulated seconds.
    pub fn time(&self) -> f32 {
        self.time
    }

    /// Internal steps taken so far.
    pub fn step_count(&self) -> u64 {
        self.steps
    }

    /// Take the contact events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<ContactEvent> {
        std::mem::take(&mut self.events)
    }

    /// Push on a body at a world-space point until the end of the next step.
    pub fn apply_force(&mut self, id: BodyId, force: Vec3, world_point: Vec3) -> Result<(), PhysicsError> {
        let body = self.engine_body_mut(id)?;
        body.add_force_at_point(to_vector(force), to_point(world_point), true);
        self.forced.insert(id);
        Ok(())
    }

    /// Change a body's velocity at once by an impulse at a world-space point.
    pub fn apply_impulse(
        &mut self,
        id: BodyId,
        impulse: Vec3,
        world_point: Vec3,
    ) -> Result<(), PhysicsError> {
        let body = self.engine_body_mut(id)?;
        body.apply_impulse_at_point(to_vector(impulse), to_point(world_point), true);
        Ok(())
    }

    /// [`apply_force`](Self::apply_force) with force and point in body coordinates.
    pub fn apply_local_force(
        &mut self,
        id: BodyId,
        local_force: Vec3,
        local_point: Vec3,
    ) -> Result<(), PhysicsError> {
        let (force, point) = self.to_world(id, local_force, local_point)?;
        self.apply_force(id, force, point)
    }

    /// [`apply_impulse`](Self::apply_impulse) with impulse and point in body coordinates.
    pub fn apply_local_impulse(
        &mut self,
        id: BodyId,
        local_impulse: Vec3,
        local_point: Vec3,
    ) -> Result<(), PhysicsError> {
        let (impulse, point) = self.to_world(id, local_impulse, local_point)?;
        self.apply_impulse(id, impulse, point)
    }

    /// Advance by `elapsed` seconds in steps of exactly `fixed_step`.
    ///
    /// Runs at most `max_substeps` steps. Whatever the budget could not cover
    /// is dropped, keeping only the remainder modulo `fixed_step`. Returns the
    /// number of steps run.
    pub fn step(
        &mut self,
        fixed_step: f32,
        elapsed: f32,
        max_substeps: u32,
    ) -> Result<u32, PhysicsError> {
        if !(fixed_step.is_finite() && fixed_step > 0.0) {
            return Err(PhysicsError::InvalidTimeStep(fixed_step));
        }
        if elapsed.is_finite() {
            self.accumulator += elapsed.max(0.0);
        }

        let mut substeps = 0;
        while self.accumulator >= fixed_step && substeps < max_substeps {
            self.step_once(fixed_step);
            self.accumulator -= fixed_step;
            substeps += 1;
        }
        if self.accumulator >= fixed_step {
            tracing::debug!(
                dropped = self.accumulator - self.accumulator % fixed_step,
                "physics fell behind, dropping time"
            );
        }
        self.accumulator %= fixed_step;
        Ok(substeps)
    }

    /// One internal step of `dt` seconds.
    pub fn step_once(&mut self, dt: f32) {
        let _span = tracing::trace_span!("physics_step", step = self.steps).entered();

        let approach: BTreeMap<BodyId, Vec3> = self
            .bodies()
            .map(|(id, state)| (id, state.velocity))
            .collect();

        self.params.dt = dt;
        self.pipeline.step(
            &to_vector(self.gravity),
            &self.params,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd,
            None,
            &(),
            &(),
        );

        for id in std::mem::take(&mut self.forced) {
            if let Some(body) = self.handles.get(&id).and_then(|h| self.bodies.get_mut(*h)) {
                body.reset_forces(false);
                body.reset_torques(false);
            }
        }

        self.record_contacts(&approach);
        self.time += dt;
        self.steps += 1;
    }

    /// Compare the touching set against the last step and emit an event for
    /// every pair that just met.
    fn record_contacts(&mut self, approach: &BTreeMap<BodyId, Vec3>) {
        let mut touching = BTreeSet::new();
        let mut began = Vec::new();
        for pair in self.narrow_phase.contact_pairs() {
            let (Some(a), Some(b)) = (self.owner(pair.collider1), self.owner(pair.collider2))
            else {
                continue;
            };
            let Some(manifold) = pair
                .manifolds
                .iter()
                .find(|m| m.points.iter().any(|p| p.dist <= TOUCH_DISTANCE))
            else {
                continue;
            };
            let key = if a <= b { (a, b) } else { (b, a) };
            touching.insert(key);
            if self.touching.contains(&key) {
                continue;
            }
            // The normal points from the first collider towards the second.
            let normal = from_vector(&manifold.data.normal);
            let va = approach.get(&a).copied().unwrap_or(Vec3::ZERO);
            let vb = approach.get(&b).copied().unwrap_or(Vec3::ZERO);
            began.push(ContactEvent {
                a,
                b,
                impact_velocity: (va - vb).dot(normal).max(0.0),
            });
        }
        self.touching = touching;
        self.events.extend(began);
    }

    fn owner(&self, collider: ColliderHandle) -> Option<BodyId> {
        let parent = self.colliders.get(collider)?.parent()?;
        Some(BodyId::from_u128(self.bodies.get(parent)?.user_data))
    }

    fn engine_body_mut(
        &mut self,
        id: BodyId,
    ) -> Result<&mut rapier3d::prelude::RigidBody, PhysicsError> {
        let handle = self.handles.get(&id).ok_or(PhysicsError::UnknownBody(id))?;
        self.bodies
            .get_mut(*handle)
            .ok_or(PhysicsError::UnknownBody(id))
    }

    fn to_world(&self, id: BodyId, local: Vec3, local_point: Vec3) -> Result<(Vec3, Vec3), PhysicsError> {
        let state = self.body(id).ok_or(PhysicsError::UnknownBody(id))?;
        Ok((
            state.orientation * local,
            state.position + state.orientation * local_point,
        ))
    }
}

fn to_point(v: Vec3) -> Point3<f32> {
    Point3::new(v.x, v.y, v.z)
}
