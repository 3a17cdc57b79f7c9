//! A sphere bouncing over a floor. Its shadow is a textured plane that
//! follows it and fades with height, shown once the texture has loaded.

use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::{LessonConfig, LessonError, LessonKind};
use frameloop_assets::{AssetLoader, Geometry, LoadHandle, Material, TextureAsset};
use frameloop_common::{Color, NodeId, Transform};
use frameloop_kernel::TimeSource;
use frameloop_render::{OrbitControls, PerspectiveCamera};
use frameloop_scene::{Light, NodeKind, SceneError};
use glam::{Quat, Vec3};
use std::f32::consts::FRAC_PI_2;

pub struct ShadowsLesson {
    stage: Stage,
    pub sphere: NodeId,
    pub shadow: NodeId,
    texture: Option<LoadHandle<TextureAsset>>,
}

impl_view!(ShadowsLesson);

impl LessonContext for ShadowsLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn status(&self) -> String {
        let y = self
            .stage
            .scene
            .transform(self.sphere)
            .map_or(0.0, |t| t.position.y);
        format!("sphere y={y:.2} shadow={}", self.shadow_visible())
    }
}

impl ShadowsLesson {
    pub fn shadow_visible(&self) -> bool {
        self.stage.scene.get(self.shadow).is_some_and(|n| n.visible)
    }

    pub fn shadow_opacity(&self) -> Option<f32> {
        let (_, material) = self.stage.scene.get(self.shadow)?.kind.resources()?;
        Some(self.stage.pool.material(material)?.material.opacity())
    }

    fn poll_texture(&mut self) {
        let Some(result) = self.texture.as_mut().and_then(|h| h.poll_ready()) else {
            return;
        };
        self.texture = None;
        match result {
            Ok(texture) => {
                tracing::info!(width = texture.width, height = texture.height, "shadow texture ready");
                if let Some(node) = self.stage.scene.get_mut(self.shadow) {
                    node.visible = true;
                }
            }
            Err(e) => tracing::warn!("shadow texture failed to load, keeping it hidden: {e}"),
        }
    }

    fn bounce(&mut self, t: f32) -> Result<(), LessonError> {
        let position = Vec3::new(t.cos() * 1.5, (t * 3.0).sin().abs(), t.sin() * 1.5);
        let scene = &mut self.stage.scene;
        let mut sphere = scene
            .transform(self.sphere)
            .ok_or(SceneError::UnknownNode(self.sphere))?;
        sphere.position = position;
        scene.set_transform(self.sphere, sphere)?;

        let node = scene
            .get_mut(self.shadow)
            .ok_or(SceneError::UnknownNode(self.shadow))?;
        node.transform.position.x = position.x;
        node.transform.position.z = position.z;
        if let NodeKind::Mesh { material, .. } = node.kind {
            if let Some(Material::Basic { opacity, .. }) = self.stage.pool.material_mut(material) {
                *opacity = (1.0 - position.y) * 0.8;
            }
        }
        Ok(())
    }
}

pub fn build<S: TimeSource>(
    config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<ShadowsLesson, S>, LessonError> {
    let camera = PerspectiveCamera::new(75.0, Vec3::new(1.0, 1.0, 3.0));
    let mut stage = Stage::new(camera).with_controls(OrbitControls::damped(), Vec3::ZERO);

    stage.add_light(
        "ambient",
        Light::Ambient {
            color: Color::WHITE,
            intensity: 0.6,
        },
        Vec3::ZERO,
    );
    stage.add_light(
        "directional",
        Light::Directional {
            color: Color::WHITE,
            intensity: 1.3,
            cast_shadow: true,
        },
        Vec3::new(2.0, 2.0, -1.0),
    );
    stage.add_light(
        "point",
        Light::Point {
            color: Color::WHITE,
            intensity: 2.7,
            distance: 0.0,
        },
        Vec3::new(-1.0, 1.0, 0.0),
    );

    let matte = Material::Standard {
        color: Color::WHITE,
        metalness: 0.0,
        roughness: 0.7,
    };
    let flat = Quat::from_rotation_x(-FRAC_PI_2);
    let sphere = stage.add_mesh("sphere", Geometry::sphere(0.5), matte.clone(), Transform::default())?;
    stage.add_mesh(
        "floor",
        Geometry::Plane {
            width: 5.0,
            height: 5.0,
        },
        matte,
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)).with_rotation(flat),
    )?;
    let shadow = stage.add_mesh(
        "sphere-shadow",
        Geometry::Plane {
            width: 1.5,
            height: 1.5,
        },
        Material::Basic {
            color: Color::BLACK,
            opacity: 0.8,
        },
        Transform::from_position(Vec3::new(0.0, -0.49, 0.0)).with_rotation(flat),
    )?;
    if let Some(node) = stage.scene.get_mut(shadow) {
        node.visible = false;
    }

    let loader = AssetLoader::new(&config.assets.root);
    let lesson = ShadowsLesson {
        stage,
        sphere,
        shadow,
        texture: Some(loader.load_texture(&config.assets.shadow_texture)),
    };

    Ok(LessonLoop::assemble(LessonKind::Shadows, lesson, source, |driver| {
        driver
            .step("shadow-texture", |ctx: &mut ShadowsLesson, _time| {
                ctx.poll_texture();
                Ok(())
            })
            .step("bounce", |ctx: &mut ShadowsLesson, time| {
                ctx.bounce(time.elapsed_secs())?;
                Ok(())
            });
    }))
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
    fn shadow_follows_and_fades() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = LessonConfig::default();
        config.assets.root = dir.path().to_path_buf();
        let clock = ManualClock::new();
        let mut lesson = build(&config, clock.clone()).unwrap();

        clock.advance(Duration::from_millis(400));
        lesson
            .run(&mut DebugTextRenderer::new(), &mut Pacer::unpaced(), Some(1))
            .unwrap();

        let ctx = lesson.context();
        let sphere = ctx.stage.scene.transform(ctx.sphere).unwrap().position;
        let shadow = ctx.stage.scene.transform(ctx.shadow).unwrap().position;
        assert_relative_eq!(sphere.y, (1.2f32).sin().abs(), epsilon = 1e-5);
        assert_eq!((shadow.x, shadow.z), (sphere.x, sphere.z));
        assert_relative_eq!(shadow.y, -0.49);
        assert_relative_eq!(ctx.shadow_opacity().unwrap(), (1.0 - sphere.y) * 0.8, epsilon = 1e-5);
    }
}
