use frameloop_common::{GeometryHandle, MaterialHandle};
use frameloop_physics::{PhysicsWorld, RigidBody, Shape, StepSettings, SyncRegistry};
use frameloop_scene::{Node, Scene};
use glam::{Quat, Vec3};

fn lesson_world() -> PhysicsWorld {
    let mut world = PhysicsWorld::new();
    world.allow_sleep = true;
    world.add_body(
        RigidBody::fixed(Shape::Plane)
            .with_orientation(Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2)),
    );
    world
}

#[test]
fn falling_sphere_node_matches_body_every_frame() {
    let mut scene = Scene::new();
    let mut world = lesson_world();
    let mut registry = SyncRegistry::new();
    let pair = registry.spawn(
        &mut scene,
        &mut world,
        Node::mesh("sphere", GeometryHandle(1), MaterialHandle(2)),
        RigidBody::new(1.0, Shape::Sphere { radius: 0.5 }).with_position(Vec3::new(0.0, 3.0, 0.0)),
    );

    let settings = StepSettings::default();
    let mut elapsed = 0.0f32;
    let mut previous = 0.0f32;
    let mut last_y = 3.0f32;
    for frame in 1..=180 {
        // Uneven frame pacing around 60 Hz.
        elapsed += if frame % 2 == 0 { 0.017 } else { 0.016 };
        let report = registry
            .advance(&mut world, &mut scene, &settings, elapsed - previous)
            .unwrap();
        previous = elapsed;
        assert_eq!(report.synced, 1);
        assert!(report.substeps <= settings.max_substeps);

        let body = world.body(pair.body).unwrap();
        let node = scene.transform(pair.node).unwrap();
        assert_eq!(node.position, body.position, "frame {frame}");
        assert_eq!(node.rotation, body.orientation, "frame {frame}");
        if frame < 30 {
            assert!(node.position.y <= last_y);
        }
        last_y = node.position.y;
    }
    assert!(last_y < 0.6, "sphere should have landed, y = {last_y}");
}

#[test]
fn long_stall_runs_bounded_catch_up() {
    let mut scene = Scene::new();
    let mut world = lesson_world();
    let registry = SyncRegistry::new();
    let settings = StepSettings::default();
    let report = registry.advance(&mut world, &mut scene, &settings, 2.0).unwrap();
    assert_eq!(report.substeps, settings.max_substeps);
    assert_eq!(world.step_count(), u64::from(settings.max_substeps));
}
