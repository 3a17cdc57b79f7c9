//! Spheres and boxes dropped onto a floor. Every visible object is one half
//! of a [`SyncedPair`](frameloop_physics::SyncedPair); after each physics step
//! the node copies its body's pose.

use crate::config::PhysicsConfig;
use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::{LessonConfig, LessonError, LessonKind, lesson_rng};
use frameloop_assets::{Geometry, Material};
use frameloop_common::{BodyId, Color, GeometryHandle, MaterialHandle, Transform};
use frameloop_input::Action;
use frameloop_kernel::TimeSource;
use frameloop_physics::{PhysicsWorld, RigidBody, Shape, StepReport, SyncRegistry, SyncedPair};
use frameloop_render::{OrbitControls, PerspectiveCamera};
use frameloop_scene::{Light, Node};
use glam::{Quat, Vec3};
use rand::Rng;
use rand::rngs::SmallRng;
use std::f32::consts::FRAC_PI_2;

const DROP_HEIGHT: f32 = 3.0;

pub struct PhysicsLesson {
    stage: Stage,
    pub world: PhysicsWorld,
    pub registry: SyncRegistry,
    settings: PhysicsConfig,
    floor: BodyId,
    sphere: (GeometryHandle, MaterialHandle),
    cube: (GeometryHandle, MaterialHandle),
    rng: SmallRng,
    hits: u64,
    last_hit: Option<f32>,
    last_report: StepReport,
}

impl_view!(PhysicsLesson);

impl LessonContext for PhysicsLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn apply(&mut self, action: Action) -> Result<(), LessonError> {
        match action {
            Action::SpawnSphere => {
                let radius = self.rng.gen_range(0.05..0.5);
                let at = self.drop_point();
                self.spawn_sphere(radius, at);
            }
            Action::SpawnBox => {
                let size = Vec3::new(
                    self.rng.gen_range(0.05..1.0),
                    self.rng.gen_range(0.05..1.0),
                    self.rng.gen_range(0.05..1.0),
                );
                let at = self.drop_point();
                self.spawn_box(size, at);
            }
            Action::Reset => self.reset(),
            Action::Push => self.push()?,
            _ => {}
        }
        Ok(())
    }

    fn status(&self) -> String {
        format!(
            "{} objects, {} hits, t={:.2}s, {} substeps",
            self.registry.len(),
            self.hits,
            self.world.time(),
            self.last_report.substeps
        )
    }
}

impl PhysicsLesson {
    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn floor(&self) -> BodyId {
        self.floor
    }

    fn drop_point(&mut self) -> Vec3 {
        Vec3::new(
            (self.rng.gen_range(0.0..1.0f32) - 0.5) * 3.0,
            DROP_HEIGHT,
            (self.rng.gen_range(0.0..1.0f32) - 0.5) * 3.0,
        )
    }

    /// Drop a sphere. The mesh shares one unit sphere, scaled to `radius`.
    pub fn spawn_sphere(&mut self, radius: f32, position: Vec3) -> SyncedPair {
        let (geometry, material) = self.sphere;
        let node = Node::mesh("sphere", geometry, material)
            .with_transform(Transform::default().with_scale(Vec3::splat(radius)));
        let body = RigidBody::new(1.0, Shape::Sphere { radius }).with_position(position);
        tracing::debug!(radius, ?position, "sphere spawned");
        self.registry
            .spawn(&mut self.stage.scene, &mut self.world, node, body)
    }

    /// Drop a box with edge lengths `size`.
    pub fn spawn_box(&mut self, size: Vec3, position: Vec3) -> SyncedPair {
        let (geometry, material) = self.cube;
        let node = Node::mesh("box", geometry, material)
            .with_transform(Transform::default().with_scale(size));
        let body = RigidBody::new(
            1.0,
            Shape::Box {
                half_extents: size * 0.5,
            },
        )
        .with_position(position);
        tracing::debug!(?size, ?position, "box spawned");
        self.registry
            .spawn(&mut self.stage.scene, &mut self.world, node, body)
    }

    /// Kick every spawned body with the configured local impulse.
    pub fn push(&mut self) -> Result<(), LessonError> {
        let impulse = self.settings.push;
        for pair in self.registry.pairs() {
            self.world.apply_local_impulse(pair.body, impulse, Vec3::ZERO)?;
        }
        tracing::debug!(bodies = self.registry.len(), ?impulse, "push");
        Ok(())
    }

    /// Push every spawned body with the wind until the next step.
    fn blow(&mut self) -> Result<(), LessonError> {
        let wind = self.settings.wind;
        if wind == Vec3::ZERO {
            return Ok(());
        }
        for pair in self.registry.pairs() {
            let Some(body) = self.world.body(pair.body) else {
                continue;
            };
            self.world.apply_force(pair.body, wind, body.position)?;
        }
        Ok(())
    }

    /// Remove every spawned object, node and body together.
    pub fn reset(&mut self) {
        let removed = self.registry.clear(&mut self.stage.scene, &mut self.world);
        tracing::info!(removed, "physics scene reset");
    }

    fn advance(&mut self, delta: f32) -> Result<(), LessonError> {
        self.blow()?;
        self.last_report = self.registry.advance(
            &mut self.world,
            &mut self.stage.scene,
            &self.settings.step,
            delta,
        )?;
        Ok(())
    }

    /// Count contact events hard enough to be heard, with a short cooldown.
    fn listen(&mut self) {
        let now = self.world.time();
        for event in self.world.drain_events() {
            if event.impact_velocity <= self.settings.hit_threshold {
                continue;
            }
            if self
                .last_hit
                .is_some_and(|at| now - at < self.settings.hit_cooldown)
            {
                continue;
            }
            self.last_hit = Some(now);
            self.hits += 1;
            let volume: f32 = self.rng.gen_range(0.0..1.0);
            tracing::info!(
                impact = event.impact_velocity,
                volume,
                hits = self.hits,
                "hit"
            );
        }
    }
}

pub fn build<S: TimeSource>(
    config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<PhysicsLesson, S>, LessonError> {
    let camera = PerspectiveCamera::new(75.0, Vec3::new(-3.0, 3.0, 3.0));
    let mut stage = Stage::new(camera).with_controls(OrbitControls::damped(), Vec3::ZERO);
    let settings = config.physics.clone();

    let mut world = PhysicsWorld::new();
    world.gravity = settings.gravity;
    world.default_contact_material = settings.contact;
    world.allow_sleep = settings.allow_sleep;

    let flat = Quat::from_rotation_x(-FRAC_PI_2);
    stage.add_mesh(
        "floor",
        Geometry::Plane {
            width: 10.0,
            height: 10.0,
        },
        Material::standard(Color::from_hex(0x777777)),
        Transform::default().with_rotation(flat),
    )?;
    let floor = world.add_body(RigidBody::fixed(Shape::Plane).with_orientation(flat));

    stage.add_light(
        "ambient",
        Light::Ambient {
            color: Color::WHITE,
            intensity: 2.1,
        },
        Vec3::ZERO,
    );
    stage.add_light(
        "directional",
        Light::Directional {
            color: Color::WHITE,
            intensity: 0.6,
            cast_shadow: true,
        },
        Vec3::new(5.0, 5.0, 5.0),
    );

    let sphere = (
        stage.pool.create_geometry(Geometry::sphere(1.0))?,
        stage.pool.create_material(Material::standard(Color::WHITE)),
    );
    let cube = (
        stage.pool.create_geometry(Geometry::unit_box())?,
        stage.pool.create_material(Material::standard(Color::WHITE)),
    );

    let mut lesson = PhysicsLesson {
        stage,
        world,
        registry: SyncRegistry::new(),
        settings,
        floor,
        sphere,
        cube,
        rng: lesson_rng(config.seed),
        hits: 0,
        last_hit: None,
        last_report: StepReport::default(),
    };
    lesson.spawn_sphere(0.5, Vec3::new(0.0, DROP_HEIGHT, 0.0));

    Ok(LessonLoop::assemble(LessonKind::Physics, lesson, source, |driver| {
        driver
            .step("physics", |ctx: &mut PhysicsLesson, time| {
                ctx.advance(time.delta_secs())?;
                Ok(())
            })
            .step("hits", |ctx: &mut PhysicsLesson, _time| {
                ctx.listen();
                Ok(())
            });
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneLoop;
    use frameloop_kernel::{ManualClock, Pacer};
    use frameloop_render::DebugTextRenderer;
    use std::time::Duration;

    fn lesson() -> (LessonLoop<PhysicsLesson, ManualClock>, ManualClock) {
        let clock = ManualClock::new();
        let config = LessonConfig {
            seed: Some(5),
            ..LessonConfig::default()
        };
        (build(&config, clock.clone()).unwrap(), clock)
    }

    #[test]
    fn spawn_actions_add_pairs_and_reset_clears_them() {
        let (mut lesson, clock) = lesson();
        let nodes_before = lesson.stage().scene.len();
        lesson.push_action(Action::SpawnSphere);
        lesson.push_action(Action::SpawnBox);
        let mut renderer = DebugTextRenderer::new();
        let mut pacer = Pacer::unpaced();
        clock.advance(Duration::from_millis(16));
        lesson.tick(&mut renderer, &mut pacer).unwrap();

        let ctx = lesson.context();
        assert_eq!(ctx.registry.len(), 3);
        assert_eq!(lesson.stage().scene.len(), nodes_before + 2);
        // floor plus three dynamic bodies
        assert_eq!(ctx.world.len(), 4);

        lesson.push_action(Action::Reset);
        clock.advance(Duration::from_millis(16));
        lesson.tick(&mut renderer, &mut pacer).unwrap();
        let ctx = lesson.context();
        assert!(ctx.registry.is_empty());
        assert_eq!(ctx.world.len(), 1);
        assert!(ctx.world.body(ctx.floor()).is_some());
        assert_eq!(lesson.stage().scene.len(), nodes_before - 1);
        // shared geometries stay live for the next spawn
        assert_eq!(lesson.stage().pool.live_geometries(), 3);
    }

    #[test]
    fn spawned_sphere_is_scaled_to_its_radius() {
        let (mut lesson, _clock) = lesson();
        let pair = lesson.context_mut().spawn_sphere(0.25, Vec3::new(1.0, 2.0, 0.0));
        let t = lesson.stage().scene.transform(pair.node).unwrap();
        assert_eq!(t.scale, Vec3::splat(0.25));
        assert_eq!(t.position, Vec3::new(1.0, 2.0, 0.0));
    }

    #[test]
    fn push_sends_bodies_along_their_local_x() {
        let (mut lesson, clock) = lesson();
        let pair = lesson.context().registry.pairs()[0];
        lesson.push_action(Action::Push);
        let mut renderer = DebugTextRenderer::new();
        let mut pacer = Pacer::unpaced();
        clock.advance(Duration::from_millis(17));
        lesson.tick(&mut renderer, &mut pacer).unwrap();
        let body = lesson.context().world.body(pair.body).unwrap();
        assert!(body.velocity.x > 2.0, "{:?}", body.velocity);
        assert!(body.position.x > 0.0);
    }

    #[test]
    fn wind_drifts_bodies_every_frame() {
        let clock = ManualClock::new();
        let mut config = LessonConfig {
            seed: Some(5),
            ..LessonConfig::default()
        };
        config.physics.wind = Vec3::new(0.0, 0.0, -6.0);
        let mut lesson = build(&config, clock.clone()).unwrap();
        let pair = lesson.context().registry.pairs()[0];
        let mut renderer = DebugTextRenderer::new();
        let mut pacer = Pacer::unpaced();
        for _ in 0..30 {
            clock.advance(Duration::from_millis(17));
            lesson.tick(&mut renderer, &mut pacer).unwrap();
        }
        let body = lesson.context().world.body(pair.body).unwrap();
        assert!(body.velocity.z < -2.0, "{:?}", body.velocity);
        assert!(body.position.z < 0.0);
    }
}
