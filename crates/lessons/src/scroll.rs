//! Scroll-driven page: three sections stacked down the Y axis. The camera
//! follows the scroll position and eases towards the cursor; entering a new
//! section gives that section's mesh an extra spin.

use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::tween::{Ease, Tween};
use crate::{LessonConfig, LessonError, LessonKind, lesson_rng};
use frameloop_assets::{Geometry, Material};
use frameloop_common::{Color, NodeId, Transform};
use frameloop_input::Action;
use frameloop_kernel::TimeSource;
use frameloop_render::PerspectiveCamera;
use frameloop_scene::{Light, Node};
use glam::{EulerRot, Quat, Vec2, Vec3};
use rand::Rng;

/// Vertical distance between sections.
pub const OBJECT_DISTANCE: f32 = 4.0;
const SECTIONS: usize = 3;
const PARALLAX_SPEED: f32 = 5.0;
const SECTION_SPIN: Vec3 = Vec3::new(6.0, 3.0, 1.5);

pub struct ScrollLesson {
    stage: Stage,
    pub meshes: [NodeId; SECTIONS],
    /// Accumulated rotation of each mesh, as XYZ euler angles.
    spins: [Vec3; SECTIONS],
    tweens: [Option<Tween>; SECTIONS],
    /// Scroll position in viewport heights.
    scroll: f32,
    section: usize,
    cursor: Vec2,
    parallax: Vec2,
}

impl_view!(ScrollLesson);

impl LessonContext for ScrollLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn apply(&mut self, action: Action) -> Result<(), LessonError> {
        match action {
            Action::Scroll(by) => self.scroll_by(by),
            Action::CursorMove { x, y } => self.cursor = Vec2::new(x, y),
            _ => {}
        }
        Ok(())
    }

    fn status(&self) -> String {
        format!("scroll={:.2} section={}", self.scroll, self.section)
    }
}

impl ScrollLesson {
    pub fn section(&self) -> usize {
        self.section
    }

    pub fn scroll(&self) -> f32 {
        self.scroll
    }

    pub fn is_tweening(&self, section: usize) -> bool {
        self.tweens.get(section).is_some_and(Option::is_some)
    }

    /// Current rotation of a section mesh, tween included.
    pub fn rotation(&self, section: usize) -> Vec3 {
        let extra = self.tweens[section].as_ref().map_or(Vec3::ZERO, Tween::value);
        self.spins[section] + extra
    }

    fn scroll_by(&mut self, by: f32) {
        self.scroll = (self.scroll + by).clamp(0.0, (SECTIONS - 1) as f32);
        let section = self.scroll.round() as usize;
        if section != self.section {
            tracing::debug!(from = self.section, to = section, "section changed");
            self.section = section;
            if let Some(running) = self.tweens[section].take() {
                self.spins[section] += running.value();
            }
            self.tweens[section] = Some(Tween::new(Vec3::ZERO, SECTION_SPIN, 1.5, Ease::Power2InOut));
        }
    }

    fn animate(&mut self, dt: f32) {
        for i in 0..SECTIONS {
            self.spins[i] += Vec3::new(0.1, 0.12, 0.0) * dt;
            if let Some(tween) = self.tweens[i].as_mut() {
                tween.advance(dt);
                if tween.is_finished() {
                    self.spins[i] += tween.target();
                    self.tweens[i] = None;
                }
            }
            let r = self.rotation(i);
            if let Some(node) = self.stage.scene.get_mut(self.meshes[i]) {
                node.transform.rotation = Quat::from_euler(EulerRot::XYZ, r.x, r.y, r.z);
            }
        }
    }

    fn follow(&mut self, dt: f32) {
        let target = Vec2::new(self.cursor.x * 0.5, -self.cursor.y * 0.5);
        self.parallax += (target - self.parallax) * PARALLAX_SPEED * dt;
        let camera = &mut self.stage.camera;
        camera.position = Vec3::new(
            self.parallax.x,
            -self.scroll * OBJECT_DISTANCE + self.parallax.y,
            6.0,
        );
        camera.target = camera.position + Vec3::NEG_Z;
    }
}

pub fn build<S: TimeSource>(
    config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<ScrollLesson, S>, LessonError> {
    let mut camera = PerspectiveCamera::new(35.0, Vec3::new(0.0, 0.0, 6.0));
    camera.target = Vec3::new(0.0, 0.0, 5.0);
    let mut stage = Stage::new(camera);
    let color = Color::from_hex(0xffeded);
    let toon = Material::Toon { color };

    let shapes = [
        Geometry::Torus {
            radius: 1.0,
            tube: 0.4,
        },
        Geometry::Cone {
            radius: 1.0,
            height: 2.0,
        },
        Geometry::TorusKnot {
            radius: 0.8,
            tube: 0.35,
        },
    ];
    let mut meshes = [NodeId::default(); SECTIONS];
    for (i, geometry) in shapes.into_iter().enumerate() {
        let x = if i % 2 == 0 { 2.0 } else { -2.0 };
        let y = -OBJECT_DISTANCE * i as f32;
        meshes[i] = stage.add_mesh(
            &format!("section-{i}"),
            geometry,
            toon.clone(),
            Transform::from_position(Vec3::new(x, y, 0.0)),
        )?;
    }

    let mut rng = lesson_rng(config.seed);
    let positions: Vec<f32> = (0..200)
        .flat_map(|_| {
            [
                (rng.gen_range(0.0..1.0f32) - 0.5) * 10.0,
                OBJECT_DISTANCE * 0.5
                    - rng.gen_range(0.0..1.0f32) * OBJECT_DISTANCE * SECTIONS as f32,
                (rng.gen_range(0.0..1.0f32) - 0.5) * 10.0,
            ]
        })
        .collect();
    let geometry = stage.pool.create_geometry(Geometry::Buffer {
        positions,
        colors: None,
    })?;
    let material = stage.pool.create_material(Material::Points {
        color,
        size: 0.4,
        size_attenuation: true,
        depth_write: true,
        additive: false,
        vertex_colors: false,
    });
    stage.scene.add(Node::points("particles", geometry, material));
    stage.add_light(
        "directional",
        Light::Directional {
            color: Color::WHITE,
            intensity: 3.0,
            cast_shadow: false,
        },
        Vec3::new(1.0, 1.0, 0.0),
    );

    let lesson = ScrollLesson {
        stage,
        meshes,
        spins: [Vec3::ZERO; SECTIONS],
        tweens: [None, None, None],
        scroll: 0.0,
        section: 0,
        cursor: Vec2::ZERO,
        parallax: Vec2::ZERO,
    };
    Ok(LessonLoop::assemble(LessonKind::Scroll, lesson, source, |driver| {
        driver
            .step("camera", |ctx: &mut ScrollLesson, time| {
                ctx.follow(time.delta_secs());
                Ok(())
            })
            .step("sections", |ctx: &mut ScrollLesson, time| {
                ctx.animate(time.delta_secs());
                Ok(())
            });
    }))
}
