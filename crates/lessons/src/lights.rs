use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::{LessonConfig, LessonError, LessonKind};
use frameloop_assets::{Geometry, Material};
use frameloop_common::{Color, NodeId, Transform};
use frameloop_kernel::TimeSource;
use frameloop_render::{OrbitControls, PerspectiveCamera};
use frameloop_scene::Light;
use glam::{EulerRot, Quat, Vec3};
use std::f32::consts::FRAC_PI_2;

pub struct LightsLesson {
    stage: Stage,
    /// Sphere, cube and torus, in that order.
    pub shapes: [NodeId; 3],
}

impl_view!(LightsLesson);

impl LessonContext for LightsLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }
}

fn rough(color: Color) -> Material {
    Material::Standard {
        color,
        metalness: 0.0,
        roughness: 0.4,
    }
}

pub fn build<S: TimeSource>(
    _config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<LightsLesson, S>, LessonError> {
    let camera = PerspectiveCamera::new(75.0, Vec3::new(1.0, 1.0, 2.0));
    let mut stage = Stage::new(camera).with_controls(OrbitControls::damped(), Vec3::ZERO);

    stage.add_light(
        "ambient",
        Light::Ambient {
            color: Color::WHITE,
            intensity: 1.0,
        },
        Vec3::ZERO,
    );
    stage.add_light(
        "directional",
        Light::Directional {
            color: Color::from_hex(0x00fffc),
            intensity: 0.9,
            cast_shadow: false,
        },
        Vec3::new(1.0, 0.25, 0.0),
    );
    stage.add_light(
        "point",
        Light::Point {
            color: Color::from_hex(0xff9000),
            intensity: 0.5,
            distance: 3.0,
        },
        Vec3::new(1.0, -0.5, 1.0),
    );

    let white = Color::WHITE;
    let sphere = stage.add_mesh(
        "sphere",
        Geometry::sphere(0.5),
        rough(white),
        Transform::from_position(Vec3::new(-1.5, 0.0, 0.0)),
    )?;
    let cube = stage.add_mesh(
        "cube",
        Geometry::Box {
            width: 0.75,
            height: 0.75,
            depth: 0.75,
        },
        rough(white),
        Transform::default(),
    )?;
    let torus = stage.add_mesh(
        "torus",
        Geometry::Torus {
            radius: 0.3,
            tube: 0.2,
        },
        rough(white),
        Transform::from_position(Vec3::new(1.5, 0.0, 0.0)),
    )?;
    stage.add_mesh(
        "plane",
        Geometry::Plane {
            width: 5.0,
            height: 5.0,
        },
        rough(white),
        Transform::from_position(Vec3::new(0.0, -0.65, 0.0))
            .with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
    )?;

    let lesson = LightsLesson {
        stage,
        shapes: [sphere, cube, torus],
    };
    Ok(LessonLoop::assemble(LessonKind::Lights, lesson, source, |driver| {
        driver.step("rotate", |ctx: &mut LightsLesson, time| {
            let t = time.elapsed_secs();
            let rotation = Quat::from_euler(EulerRot::XYZ, 0.15 * t, 0.1 * t, 0.0);
            for id in ctx.shapes {
                if let Some(node) = ctx.stage.scene.get_mut(id) {
                    node.transform.rotation = rotation;
                }
            }
            Ok(())
        });
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SceneLoop;
    use frameloop_input::Action;
    use frameloop_kernel::{ManualClock, Pacer};
    use frameloop_render::DebugTextRenderer;

    #[test]
    fn orbit_input_moves_the_camera_gradually() {
        let clock = ManualClock::new();
        let mut lesson = build(&LessonConfig::default(), clock.clone()).unwrap();
        let start = lesson.stage().camera.position;
        lesson.push_action(Action::Orbit {
            azimuth: 0.5,
            polar: 0.0,
        });
        let mut renderer = DebugTextRenderer::new();
        lesson.run(&mut renderer, &mut Pacer::unpaced(), Some(1)).unwrap();
        let after_one = lesson.stage().camera.position;
        assert_ne!(after_one, start);
        // Damping applies a fraction of the rotation per frame.
        let offset = start.distance(after_one);
        assert!(offset < 0.1, "moved {offset}");
        assert!(lesson.stage().controls.as_ref().unwrap().pending() > 0.0);
    }
}
