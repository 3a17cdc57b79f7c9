use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::{LessonConfig, LessonError, LessonKind, lesson_rng};
use frameloop_assets::{AssetError, Geometry, Material};
use frameloop_common::{Color, GeometryHandle, NodeId};
use frameloop_kernel::TimeSource;
use frameloop_render::{OrbitControls, PerspectiveCamera};
use frameloop_scene::Node;
use glam::Vec3;
use rand::Rng;

pub struct ParticlesLesson {
    stage: Stage,
    pub node: NodeId,
    pub geometry: GeometryHandle,
}

impl_view!(ParticlesLesson);

impl LessonContext for ParticlesLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn status(&self) -> String {
        let version = self
            .stage
            .pool
            .geometry(self.geometry)
            .map_or(0, |r| r.version);
        format!("particles geometry v{version}")
    }
}

impl ParticlesLesson {
    /// Set every particle's height to `sin(t + x)`. Bumps the geometry version.
    fn ripple(&mut self, t: f32) -> Result<(), AssetError> {
        let geometry = self
            .stage
            .pool
            .geometry_mut(self.geometry)
            .ok_or(AssetError::UnknownGeometry(self.geometry))?;
        if let Geometry::Buffer { positions, .. } = geometry {
            for vertex in positions.chunks_exact_mut(3) {
                vertex[1] = (t + vertex[0]).sin();
            }
        }
        Ok(())
    }
}

pub fn build<S: TimeSource>(
    config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<ParticlesLesson, S>, LessonError> {
    let settings = &config.particles;
    let mut rng = lesson_rng(config.seed);
    let mut stage = Stage::new(PerspectiveCamera::default())
        .with_controls(OrbitControls::damped(), Vec3::ZERO);

    let values = settings.count * 3;
    let positions: Vec<f32> = (0..values)
        .map(|_| (rng.gen_range(0.0..1.0f32) - 0.5) * settings.spread)
        .collect();
    let colors: Vec<f32> = (0..values).map(|_| rng.gen_range(0.0..1.0)).collect();

    let geometry = stage.pool.create_geometry(Geometry::Buffer {
        positions,
        colors: Some(colors),
    })?;
    let material = stage.pool.create_material(Material::Points {
        color: Color::WHITE,
        size: settings.size,
        size_attenuation: true,
        depth_write: false,
        additive: true,
        vertex_colors: true,
    });
    let node = stage.scene.add(Node::points("particles", geometry, material));
    tracing::debug!(count = settings.count, "particles created");

    let lesson = ParticlesLesson {
        stage,
        node,
        geometry,
    };
    Ok(LessonLoop::assemble(
        LessonKind::Particles,
        lesson,
        source,
        |driver| {
            driver.step("ripple", |ctx: &mut ParticlesLesson, time| {
                ctx.ripple(time.elapsed_secs())?;
                Ok(())
            });
        },
    ))
}
