use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::tween::{Ease, Tween};
use crate::{LessonConfig, LessonError, LessonKind};
use frameloop_assets::{Geometry, Material};
use frameloop_common::{Color, NodeId, Transform};
use frameloop_kernel::TimeSource;
use frameloop_render::PerspectiveCamera;
use glam::{Quat, Vec3};

pub struct AnimationsLesson {
    stage: Stage,
    pub cube: NodeId,
    slide: Tween,
}

impl_view!(AnimationsLesson);

impl LessonContext for AnimationsLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn status(&self) -> String {
        let x = self
            .stage
            .scene
            .transform(self.cube)
            .map_or(0.0, |t| t.position.x);
        format!("cube x={x:.2}")
    }
}

pub fn build<S: TimeSource>(
    _config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<AnimationsLesson, S>, LessonError> {
    let mut stage = Stage::new(PerspectiveCamera::default());
    let cube = stage.add_mesh(
        "cube",
        Geometry::unit_box(),
        Material::Basic {
            color: Color::from_hex(0xff0000),
            opacity: 1.0,
        },
        Transform::from_position(Vec3::new(2.0, 0.0, 0.0)),
    )?;
    let lesson = AnimationsLesson {
        stage,
        cube,
        slide: Tween::new(Vec3::new(2.0, 0.0, 0.0), Vec3::ZERO, 1.0, Ease::Power1Out)
            .with_delay(2.0),
    };

    Ok(LessonLoop::assemble(
        LessonKind::Animations,
        lesson,
        source,
        |driver| {
            driver.step("spin", |ctx: &mut AnimationsLesson, time| {
                let position = ctx.slide.advance(time.delta_secs());
                let node = ctx
                    .stage
                    .scene
                    .get_mut(ctx.cube)
                    .ok_or(frameloop_scene::SceneError::UnknownNode(ctx.cube))?;
                node.transform.rotation = Quat::from_rotation_y(time.elapsed_secs());
                node.transform.position = position;
                Ok(())
            });
        },
    ))
}
