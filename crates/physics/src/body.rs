use frameloop_common::BodyId;
use glam::{Quat, Vec3};
use rapier3d::na::{Isometry3, Quaternion, Translation3, UnitQuaternion, Vector3};
use rapier3d::prelude::{Collider, ColliderBuilder, RigidBodyBuilder};
use serde::{Deserialize, Serialize};

use crate::world::ContactMaterial;

/// Collision shape, in body-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Sphere { radius: f32 },
    /// Half extents along the body's local axes.
    Box { half_extents: Vec3 },
    /// Solid half-space below a plane through the body position. Local +Z is
    /// the outward normal.
    Plane,
}

/// Description of a body to add to a [`PhysicsWorld`](crate::PhysicsWorld).
/// Zero mass makes it static.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    pub mass: f32,
    pub shape: Shape,
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub linear_damping: f32,
    pub angular_damping: f32,
}

impl RigidBody {
    pub fn new(mass: f32, shape: Shape) -> Self {
        Self {
            mass: mass.max(0.0),
            shape,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            linear_damping: 0.01,
            angular_damping: 0.01,
        }
    }

    /// A massless body that never moves.
    pub fn fixed(shape: Shape) -> Self {
        Self::new(0.0, shape)
    }

    pub fn with_position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_orientation(mut self, orientation: Quat) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn is_dynamic(&self) -> bool {
        self.mass > 0.0
    }

    /// The engine body, tagged with `id` so contacts can be traced back.
    pub(crate) fn to_engine(&self, id: BodyId, allow_sleep: bool) -> rapier3d::prelude::RigidBody {
        let builder = if self.is_dynamic() {
            RigidBodyBuilder::dynamic()
        } else {
            RigidBodyBuilder::fixed()
        };
        builder
            .position(Isometry3::from_parts(
                Translation3::from(to_vector(self.position)),
                to_rotation(self.orientation),
            ))
            .linvel(to_vector(self.velocity))
            .angvel(to_vector(self.angular_velocity))
            .linear_damping(self.linear_damping)
            .angular_damping(self.angular_damping)
            .can_sleep(allow_sleep)
            .user_data(id.as_u128())
            .build()
    }

    pub(crate) fn collider(&self, material: ContactMaterial) -> Collider {
        let builder = match self.shape {
            Shape::Sphere { radius } => ColliderBuilder::ball(radius),
            Shape::Box { half_extents: h } => ColliderBuilder::cuboid(h.x, h.y, h.z),
            Shape::Plane => ColliderBuilder::halfspace(Vector3::z_axis()),
        };
        let builder = if self.is_dynamic() {
            builder.mass(self.mass)
        } else {
            builder
        };
        builder
            .friction(material.friction)
            .restitution(material.restitution)
            .build()
    }
}

/// A body's pose and motion as of the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyState {
    pub position: Vec3,
    pub orientation: Quat,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub dynamic: bool,
    pub sleeping: bool,
}

impl BodyState {
    pub(crate) fn of(body: &rapier3d::prelude::RigidBody) -> Self {
        Self {
            position: from_vector(body.translation()),
            orientation: from_rotation(body.rotation()),
            velocity: from_vector(body.linvel()),
            angular_velocity: from_vector(body.angvel()),
            dynamic: body.is_dynamic(),
            sleeping: body.is_sleeping(),
        }
    }

    /// World-space normal of a plane body.
    pub fn plane_normal(&self) -> Vec3 {
        self.orientation * Vec3::Z
    }
}

pub(crate) fn to_vector(v: Vec3) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

pub(crate) fn from_vector(v: &Vector3<f32>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn to_rotation(q: Quat) -> UnitQuaternion<f32> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

fn from_rotation(r: &UnitQuaternion<f32>) -> Quat {
    Quat::from_xyzw(r.i, r.j, r.k, r.w)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn negative_mass_is_clamped_to_static() {
        let body = RigidBody::new(-2.0, Shape::Sphere { radius: 1.0 });
        assert_eq!(body.mass, 0.0);
        assert!(!body.is_dynamic());
    }

    #[test]
    fn rotation_survives_engine_conversion() {
        let q = Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.3);
        let back = from_rotation(&to_rotation(q));
        assert_relative_eq!(back.x, q.x, epsilon = 1e-6);
        assert_relative_eq!(back.y, q.y, epsilon = 1e-6);
        assert_relative_eq!(back.z, q.z, epsilon = 1e-6);
        assert_relative_eq!(back.w, q.w, epsilon = 1e-6);
    }

    #[test]
    fn engine_body_starts_at_the_described_pose() {
        let id = BodyId::new();
        let desc = RigidBody::new(1.0, Shape::Box {
            half_extents: Vec3::splat(0.5),
        })
        .with_position(Vec3::new(1.0, 2.0, 3.0))
        .with_velocity(Vec3::X);
        let engine = desc.to_engine(id, true);
        let state = BodyState::of(&engine);
        assert_eq!(state.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(state.velocity, Vec3::X);
        assert!(state.dynamic);
        assert_eq!(BodyId::from_u128(engine.user_data), id);
    }

    #[test]
    fn floor_rotation_points_plane_normal_up() {
        let floor = RigidBody::fixed(Shape::Plane).with_orientation(Quat::from_rotation_x(-FRAC_PI_2));
        let state = BodyState::of(&floor.to_engine(BodyId::new(), true));
        assert!(!state.dynamic);
        assert_relative_eq!(state.plane_normal().y, 1.0, epsilon = 1e-6);
    }
}
