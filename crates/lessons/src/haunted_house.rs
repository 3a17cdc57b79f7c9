use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::{LessonConfig, LessonError, LessonKind, lesson_rng};
use frameloop_assets::{Geometry, Material};
use frameloop_common::{Color, NodeId, Transform};
use frameloop_kernel::TimeSource;
use frameloop_render::{OrbitControls, PerspectiveCamera};
use frameloop_scene::Light;
use glam::{Quat, Vec3};
use rand::Rng;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

const GRAVES: usize = 30;

/// Angular rate and orbit radius of each ghost.
const GHOST_ORBITS: [(f32, f32); 3] = [(0.5, 4.0), (-0.38, 5.0), (0.25, 6.0)];

/// Where a ghost is at `t` seconds: on its circle, bobbing on a beat of three sines.
pub fn ghost_position(rate: f32, radius: f32, t: f32) -> Vec3 {
    let angle = t * rate;
    Vec3::new(
        angle.cos() * radius,
        angle.sin() * (angle * 2.34).sin() * (angle * 3.45).sin(),
        angle.sin() * radius,
    )
}

pub struct HauntedHouseLesson {
    stage: Stage,
    pub ghosts: [NodeId; 3],
}

impl_view!(HauntedHouseLesson);

impl LessonContext for HauntedHouseLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }
}

fn standard(hex: u32) -> Material {
    Material::Standard {
        color: Color::from_hex(hex),
        metalness: 0.0,
        roughness: 1.0,
    }
}

fn house(stage: &mut Stage) -> Result<(), LessonError> {
    stage.add_mesh(
        "walls",
        Geometry::Box {
            width: 4.0,
            height: 2.5,
            depth: 4.0,
        },
        standard(0xac8e82),
        Transform::from_position(Vec3::new(0.0, 1.25, 0.0)),
    )?;
    stage.add_mesh(
        "roof",
        Geometry::Cone {
            radius: 3.5,
            height: 1.5,
        },
        standard(0xb35f45),
        Transform::from_position(Vec3::new(0.0, 3.25, 0.0))
            .with_rotation(Quat::from_rotation_y(FRAC_PI_4)),
    )?;
    stage.add_mesh(
        "door",
        Geometry::Plane {
            width: 2.2,
            height: 2.2,
        },
        standard(0xaa7b7b),
        Transform::from_position(Vec3::new(0.0, 1.0, 2.01)),
    )?;

    let bushes = [
        (0.5, Vec3::new(0.8, 0.2, 2.2)),
        (0.25, Vec3::new(1.4, 0.1, 2.1)),
        (0.4, Vec3::new(-0.8, 0.1, 2.2)),
        (0.15, Vec3::new(-1.0, 0.05, 2.6)),
    ];
    for (i, (scale, position)) in bushes.into_iter().enumerate() {
        stage.add_mesh(
            &format!("bush-{i}"),
            Geometry::sphere(1.0),
            standard(0x89c854),
            Transform::from_position(position).with_scale(Vec3::splat(scale)),
        )?;
    }
    Ok(())
}

fn graveyard(stage: &mut Stage, rng: &mut impl Rng) -> Result<(), LessonError> {
    for i in 0..GRAVES {
        let angle = rng.gen_range(0.0..2.0 * PI);
        let radius = 3.0 + rng.gen_range(0.0..6.0);
        let rotation = Quat::from_rotation_z(rng.gen_range(-0.2..0.2))
            * Quat::from_rotation_y(rng.gen_range(-0.2..0.2));
        stage.add_mesh(
            &format!("grave-{i}"),
            Geometry::Box {
                width: 0.6,
                height: 0.8,
                depth: 0.2,
            },
            standard(0xb2b6b1),
            Transform::from_position(Vec3::new(angle.sin() * radius, 0.3, angle.cos() * radius))
                .with_rotation(rotation),
        )?;
    }
    Ok(())
}

pub fn build<S: TimeSource>(
    config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<HauntedHouseLesson, S>, LessonError> {
    let camera = PerspectiveCamera::new(75.0, Vec3::new(4.0, 2.0, 5.0));
    let mut stage = Stage::new(camera).with_controls(OrbitControls::damped(), Vec3::ZERO);
    stage.scene.background = Color::from_hex(0x0e343f);
    let mut rng = lesson_rng(config.seed);

    stage.add_mesh(
        "floor",
        Geometry::Plane {
            width: 20.0,
            height: 20.0,
        },
        standard(0xa9c388),
        Transform::default().with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
    )?;
    house(&mut stage)?;
    graveyard(&mut stage, &mut rng)?;

    let moonlight = Color::from_hex(0x86cdff);
    stage.add_light(
        "ambient",
        Light::Ambient {
            color: moonlight,
            intensity: 0.275,
        },
        Vec3::ZERO,
    );
    stage.add_light(
        "moon",
        Light::Directional {
            color: moonlight,
            intensity: 1.0,
            cast_shadow: true,
        },
        Vec3::new(3.0, 2.0, -8.0),
    );
    stage.add_light(
        "door-light",
        Light::Point {
            color: Color::from_hex(0xff7d46),
            intensity: 5.0,
            distance: 7.0,
        },
        Vec3::new(0.0, 2.2, 2.5),
    );

    let mut ghosts = [NodeId::default(); 3];
    for (i, hex) in [0x8800ffu32, 0xff0088, 0xff0000].into_iter().enumerate() {
        ghosts[i] = stage.add_light(
            &format!("ghost-{}", i + 1),
            Light::Point {
                color: Color::from_hex(hex),
                intensity: 6.0,
                distance: 0.0,
            },
            Vec3::ZERO,
        );
    }

    let lesson = HauntedHouseLesson { stage, ghosts };
    Ok(LessonLoop::assemble(
        LessonKind::HauntedHouse,
        lesson,
        source,
        |driver| {
            driver.step("ghosts", |ctx: &mut HauntedHouseLesson, time| {
                let t = time.elapsed_secs();
                for (id, (rate, radius)) in ctx.ghosts.into_iter().zip(GHOST_ORBITS) {
                    if let Some(node) = ctx.stage.scene.get_mut(id) {
                        node.transform.position = ghost_position(rate, radius, t);
                    }
                }
                Ok(())
            });
        },
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneLoop;
    use approx::assert_relative_eq;
    use frameloop_kernel::{ManualClock, Pacer};
    use frameloop_render::DebugTextRenderer;
    use std::time::Duration;

    #[test]
    fn ghosts_keep_to_their_radii() {
        for (rate, radius) in GHOST_ORBITS {
            for t in [0.0, 1.3, 7.9] {
                let p = ghost_position(rate, radius, t);
                assert_relative_eq!(Vec3::new(p.x, 0.0, p.z).length(), radius, epsilon = 1e-4);
                assert!(p.y.abs() <= 1.0);
            }
        }
    }

    #[test]
    fn scene_is_seeded_and_ghosts_move() {
        let config = LessonConfig {
            seed: Some(1),
            ..LessonConfig::default()
        };
        let clock = ManualClock::new();
        let mut lesson = build(&config, clock.clone()).unwrap();
        // floor, walls, roof, door, 4 bushes, graves, 3 lights, 3 ghosts
        assert_eq!(lesson.stage().scene.len(), 8 + GRAVES + 6);
        assert_eq!(lesson.stage().scene.background, Color::from_hex(0x0e343f));

        clock.advance(Duration::from_secs(2));
        lesson
            .run(&mut DebugTextRenderer::new(), &mut Pacer::unpaced(), Some(1))
            .unwrap();
        let ghost = lesson.context().ghosts[0];
        let p = lesson.stage().scene.transform(ghost).unwrap().position;
        assert_relative_eq!(p.x, 1.0f32.cos() * 4.0, epsilon = 1e-4);
    }
}
