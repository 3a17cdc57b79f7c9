//! A glTF model loaded off the frame thread. Until it arrives the scene is
//! just the floor; once it does, a proxy mesh appears and its animation clip
//! plays. A failed load is logged and the lesson carries on without it.

use crate::mixer::AnimationMixer;
use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::{LessonConfig, LessonError, LessonKind};
use frameloop_assets::{AssetLoader, Geometry, LoadHandle, Material, ModelAsset};
use frameloop_common::{Color, NodeId, Transform};
use frameloop_kernel::TimeSource;
use frameloop_render::{OrbitControls, PerspectiveCamera};
use frameloop_scene::Light;
use glam::{Quat, Vec3};
use std::f32::consts::{FRAC_PI_2, TAU};

/// Proxy bounds in model units, before the configured scale.
const PROXY_SIZE: Vec3 = Vec3::new(24.0, 36.0, 60.0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    Loading,
    Ready,
    Failed,
}

pub struct ImportedModelsLesson {
    stage: Stage,
    pending: Option<LoadHandle<ModelAsset>>,
    status: ModelStatus,
    mixer: Option<AnimationMixer>,
    model: Option<NodeId>,
    clip: usize,
    scale: f32,
}

impl_view!(ImportedModelsLesson);

impl LessonContext for ImportedModelsLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn status(&self) -> String {
        match (&self.status, &self.mixer) {
            (ModelStatus::Ready, Some(mixer)) => format!(
                "model ready, clip `{}` at {:.2}/{:.2}s",
                mixer.clip().name,
                mixer.time(),
                mixer.clip().duration
            ),
            (status, _) => format!("model {status:?}").to_lowercase(),
        }
    }
}

impl ImportedModelsLesson {
    pub fn model_status(&self) -> ModelStatus {
        self.status
    }

    pub fn mixer(&self) -> Option<&AnimationMixer> {
        self.mixer.as_ref()
    }

    pub fn model(&self) -> Option<NodeId> {
        self.model
    }

    fn poll_model(&mut self) -> Result<(), LessonError> {
        let Some(result) = self.pending.as_mut().and_then(|h| h.poll_ready()) else {
            return Ok(());
        };
        self.pending = None;
        match result {
            Ok(model) => self.install(model),
            Err(e) => {
                tracing::warn!("model failed to load, continuing without it: {e}");
                self.status = ModelStatus::Failed;
                Ok(())
            }
        }
    }

    fn install(&mut self, model: ModelAsset) -> Result<(), LessonError> {
        tracing::info!(
            meshes = model.meshes.len(),
            nodes = model.node_count,
            animations = model.animations.len(),
            "model ready"
        );
        let color = model
            .materials
            .first()
            .map_or(Color::from_hex(0xc46a2b), |m| {
                Color::new(m.base_color[0], m.base_color[1], m.base_color[2])
            });
        let node = self.stage.add_mesh(
            "model",
            Geometry::Box {
                width: PROXY_SIZE.x,
                height: PROXY_SIZE.y,
                depth: PROXY_SIZE.z,
            },
            Material::standard(color),
            Transform::from_position(Vec3::new(0.0, PROXY_SIZE.y * self.scale * 0.5, 0.0))
                .with_scale(Vec3::splat(self.scale)),
        )?;
        self.model = Some(node);

        let clip = model
            .animations
            .get(self.clip)
            .or_else(|| model.animations.first());
        self.mixer = clip.cloned().map(AnimationMixer::new);
        if self.mixer.is_none() {
            tracing::debug!("model has no animations");
        }
        self.status = ModelStatus::Ready;
        Ok(())
    }

    fn animate(&mut self, dt: f32) {
        let (Some(mixer), Some(node)) = (self.mixer.as_mut(), self.model) else {
            return;
        };
        mixer.update(dt);
        let bob = (mixer.phase() * TAU).sin().abs() * 0.1;
        if let Some(node) = self.stage.scene.get_mut(node) {
            node.transform.position.y = PROXY_SIZE.y * self.scale * 0.5 + bob;
        }
    }
}

pub fn build<S: TimeSource>(
    config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<ImportedModelsLesson, S>, LessonError> {
    let camera = PerspectiveCamera::new(75.0, Vec3::new(2.0, 2.0, 2.0));
    let mut stage =
        Stage::new(camera).with_controls(OrbitControls::damped(), Vec3::new(0.0, 0.75, 0.0));

    stage.add_mesh(
        "floor",
        Geometry::Plane {
            width: 10.0,
            height: 10.0,
        },
        Material::Standard {
            color: Color::from_hex(0x444444),
            metalness: 0.0,
            roughness: 0.5,
        },
        Transform::default().with_rotation(Quat::from_rotation_x(-FRAC_PI_2)),
    )?;
    stage.add_light(
        "ambient",
        Light::Ambient {
            color: Color::WHITE,
            intensity: 2.4,
        },
        Vec3::ZERO,
    );
    stage.add_light(
        "directional",
        Light::Directional {
            color: Color::WHITE,
            intensity: 1.8,
            cast_shadow: true,
        },
        Vec3::new(5.0, 5.0, 5.0),
    );

    let loader = AssetLoader::new(&config.assets.root);
    let lesson = ImportedModelsLesson {
        stage,
        pending: Some(loader.load_model(&config.assets.model)),
        status: ModelStatus::Loading,
        mixer: None,
        model: None,
        clip: config.assets.clip,
        scale: config.assets.model_scale,
    };

    Ok(LessonLoop::assemble(
        LessonKind::ImportedModels,
        lesson,
        source,
        |driver| {
            driver
                .step("model-load", |ctx: &mut ImportedModelsLesson, _time| {
                    ctx.poll_model()?;
                    Ok(())
                })
                .step("mixer", |ctx: &mut ImportedModelsLesson, time| {
                    ctx.animate(time.delta_secs());
                    Ok(())
                });
        },
    ))
}
