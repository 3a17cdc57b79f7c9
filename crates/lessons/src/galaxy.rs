//! Procedural spiral galaxy. Regenerating swaps the point cloud through a
//! [`ResourceSlot`], so exactly one geometry/material pair is ever live.

use crate::config::GalaxyParams;
use crate::stage::{LessonContext, LessonLoop, Stage, impl_view};
use crate::{LessonConfig, LessonError, LessonKind, lesson_rng};
use frameloop_assets::{Geometry, Material, ResourceSlot};
use frameloop_common::{Color, NodeId};
use frameloop_input::Action;
use frameloop_kernel::TimeSource;
use frameloop_render::{OrbitControls, PerspectiveCamera};
use frameloop_scene::Node;
use glam::Vec3;
use rand::Rng;
use rand::rngs::SmallRng;
use std::f32::consts::TAU;

/// Color of a point `radius` away from the core.
fn point_color(params: &GalaxyParams, radius: f32) -> Color {
    params
        .inner_color
        .lerp(params.outer_color, radius / params.radius)
}

/// Point positions and colors for one galaxy.
pub fn generate(params: &GalaxyParams, rng: &mut impl Rng) -> (Geometry, Material) {
    let mut positions = Vec::with_capacity(params.count * 3);
    let mut colors = Vec::with_capacity(params.count * 3);
    let branches = params.branches.max(1);

    for i in 0..params.count {
        let radius = rng.gen_range(0.0..1.0f32) * params.radius;
        let spin_angle = radius * params.spin;
        let branch_angle = (i as u32 % branches) as f32 / branches as f32 * TAU;

        let mut scatter = || {
            let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            rng.gen_range(0.0..1.0f32).powf(params.randomness_power)
                * sign
                * params.randomness
                * radius
        };
        let offset = Vec3::new(scatter(), scatter(), scatter());

        let angle = branch_angle + spin_angle;
        positions.extend_from_slice(&[
            angle.cos() * radius + offset.x,
            offset.y,
            angle.sin() * radius + offset.z,
        ]);
        colors.extend_from_slice(&point_color(params, radius).to_array());
    }

    let geometry = Geometry::Buffer {
        positions,
        colors: Some(colors),
    };
    let material = Material::Points {
        color: Color::WHITE,
        size: params.size,
        size_attenuation: true,
        depth_write: false,
        additive: true,
        vertex_colors: true,
    };
    (geometry, material)
}

pub struct GalaxyLesson {
    stage: Stage,
    params: GalaxyParams,
    slot: ResourceSlot,
    node: Option<NodeId>,
    rng: SmallRng,
    generations: u64,
}

impl_view!(GalaxyLesson);

impl LessonContext for GalaxyLesson {
    fn stage(&self) -> &Stage {
        &self.stage
    }

    fn stage_mut(&mut self) -> &mut Stage {
        &mut self.stage
    }

    fn apply(&mut self, action: Action) -> Result<(), LessonError> {
        if action == Action::Regenerate {
            self.regenerate()?;
        }
        Ok(())
    }

    fn status(&self) -> String {
        format!(
            "galaxy generation {} ({} points)",
            self.generations, self.params.count
        )
    }
}

impl GalaxyLesson {
    pub fn params(&self) -> &GalaxyParams {
        &self.params
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn generations(&self) -> u64 {
        self.generations
    }

    /// Replace the parameters and rebuild.
    pub fn set_params(&mut self, params: GalaxyParams) -> Result<(), LessonError> {
        self.params = params;
        self.regenerate()
    }

    /// Build a new point cloud, point the galaxy node at it, release the old one.
    pub fn regenerate(&mut self) -> Result<(), LessonError> {
        let scene = &mut self.stage.scene;
        let node = &mut self.node;
        let params = &self.params;
        let rng = &mut self.rng;
        self.slot.rebuild(
            &mut self.stage.pool,
            || Ok::<_, LessonError>(generate(params, rng)),
            |geometry, material| -> Result<(), LessonError> {
                match *node {
                    Some(id) => scene.set_resources(id, geometry, material)?,
                    None => *node = Some(scene.add(Node::points("galaxy", geometry, material))),
                }
                Ok(())
            },
        )?;
        self.generations += 1;
        tracing::info!(
            generation = self.generations,
            count = self.params.count,
            branches = self.params.branches,
            "galaxy generated"
        );
        Ok(())
    }
}

pub fn build<S: TimeSource>(
    config: &LessonConfig,
    source: S,
) -> Result<LessonLoop<GalaxyLesson, S>, LessonError> {
    let camera = PerspectiveCamera::new(75.0, Vec3::new(3.0, 3.0, 3.0));
    let stage = Stage::new(camera).with_controls(OrbitControls::damped(), Vec3::ZERO);
    let mut lesson = GalaxyLesson {
        stage,
        params: config.galaxy.clone(),
        slot: ResourceSlot::new(),
        node: None,
        rng: lesson_rng(config.seed),
        generations: 0,
    };
    lesson.regenerate()?;
    Ok(LessonLoop::assemble(LessonKind::Galaxy, lesson, source, |_| {}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn small() -> GalaxyParams {
        GalaxyParams {
            count: 300,
            ..GalaxyParams::default()
        }
    }

    #[test]
    fn points_stay_near_their_radius() {
        let params = small();
        let mut rng = SmallRng::seed_from_u64(4);
        let (geometry, _) = generate(&params, &mut rng);
        let Geometry::Buffer { positions, colors } = geometry else {
            panic!("expected a buffer geometry");
        };
        assert_eq!(positions.len(), 900);
        assert_eq!(colors.unwrap().len(), 900);
        let bound = params.radius * (1.0 + 2.0 * params.randomness);
        for p in positions.chunks_exact(3) {
            assert!(Vec3::new(p[0], p[1], p[2]).length() <= bound);
        }
    }

    #[test]
    fn core_is_inner_color_and_rim_is_outer_color() {
        let params = GalaxyParams::default();
        assert_eq!(point_color(&params, 0.0), params.inner_color);
        let rim = point_color(&params, params.radius).to_array();
        let outer = params.outer_color.to_array();
        for c in 0..3 {
            assert_relative_eq!(rim[c], outer[c], epsilon = 1e-6);
        }
    }

    #[test]
    fn point_colors_stay_between_inner_and_outer() {
        let params = GalaxyParams {
            count: 50,
            radius: 1.0,
            ..GalaxyParams::default()
        };
        let mut rng = SmallRng::seed_from_u64(11);
        let (Geometry::Buffer { colors, .. }, _) = generate(&params, &mut rng) else {
            panic!("expected a buffer geometry");
        };
        let inner = params.inner_color.to_array();
        let outer = params.outer_color.to_array();
        for point in colors.unwrap().chunks_exact(3) {
            for c in 0..3 {
                let lo = inner[c].min(outer[c]);
                let hi = inner[c].max(outer[c]);
                assert!(point[c] >= lo - 1e-6 && point[c] <= hi + 1e-6);
            }
        }
    }
}
