//! Lessons: small 3D scenes, each a frame context plus ordered update steps.
//!
//! [`build`] turns a [`LessonKind`] and a [`LessonConfig`] into a boxed
//! [`SceneLoop`] that a host (window or terminal) drives frame by frame.
//! Every lesson runs an `input` step first and a `controls` step last; its
//! own steps sit between them.

pub mod animations;
pub mod config;
pub mod galaxy;
pub mod haunted_house;
pub mod imported_models;
pub mod lights;
pub mod mixer;
pub mod particles;
pub mod physics;
pub mod scroll;
pub mod shadows;
pub mod stage;
pub mod tween;

pub use config::{ConfigError, LessonConfig};
pub use mixer::AnimationMixer;
pub use stage::{LessonContext, LessonLoop, SceneLoop, Stage};
pub use tween::{Ease, Tween};

use frameloop_kernel::TimeSource;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, thiserror::Error)]
pub enum LessonError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("asset error: {0}")]
    Asset(#[from] frameloop_assets::AssetError),
    #[error("scene error: {0}")]
    Scene(#[from] frameloop_scene::SceneError),
    #[error("physics error: {0}")]
    Physics(#[from] frameloop_physics::PhysicsError),
    #[error("unknown lesson `{0}`")]
    UnknownLesson(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LessonKind {
    Animations,
    Lights,
    Shadows,
    HauntedHouse,
    Particles,
    Galaxy,
    Scroll,
    Physics,
    ImportedModels,
}

impl LessonKind {
    pub const ALL: [LessonKind; 9] = [
        Self::Animations,
        Self::Lights,
        Self::Shadows,
        Self::HauntedHouse,
        Self::Particles,
        Self::Galaxy,
        Self::Scroll,
        Self::Physics,
        Self::ImportedModels,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Animations => "animations",
            Self::Lights => "lights",
            Self::Shadows => "shadows",
            Self::HauntedHouse => "haunted-house",
            Self::Particles => "particles",
            Self::Galaxy => "galaxy",
            Self::Scroll => "scroll",
            Self::Physics => "physics",
            Self::ImportedModels => "imported-models",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Animations => "a cube spinning with elapsed time, slid in by a tween",
            Self::Lights => "ambient, directional and point lights on rotating primitives",
            Self::Shadows => "a bouncing sphere with a baked shadow that fades with height",
            Self::HauntedHouse => "a foggy house and graveyard with three orbiting ghost lights",
            Self::Particles => "a cloud of colored points rippling on a sine wave",
            Self::Galaxy => "a procedural spiral galaxy, regenerated on demand",
            Self::Scroll => "scroll-driven sections with parallax and section tweens",
            Self::Physics => "spheres and boxes dropped onto a floor with fixed-step physics",
            Self::ImportedModels => "a glTF model loaded in the background and animated once present",
        }
    }
}

impl fmt::Display for LessonKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LessonKind {
    type Err = LessonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| LessonError::UnknownLesson(s.to_string()))
    }
}

/// Seeded when the config carries a seed, otherwise from the OS.
pub(crate) fn lesson_rng(seed: Option<u64>) -> SmallRng {
    match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    }
}

/// Build a lesson on the given time source.
pub fn build<S>(
    kind: LessonKind,
    config: &LessonConfig,
    source: S,
) -> Result<Box<dyn SceneLoop>, LessonError>
where
    S: TimeSource + 'static,
{
    config.validate()?;
    let lesson: Box<dyn SceneLoop> = match kind {
        LessonKind::Animations => Box::new(animations::build(config, source)?),
        LessonKind::Lights => Box::new(lights::build(config, source)?),
        LessonKind::Shadows => Box::new(shadows::build(config, source)?),
        LessonKind::HauntedHouse => Box::new(haunted_house::build(config, source)?),
        LessonKind::Particles => Box::new(particles::build(config, source)?),
        LessonKind::Galaxy => Box::new(galaxy::build(config, source)?),
        LessonKind::Scroll => Box::new(scroll::build(config, source)?),
        LessonKind::Physics => Box::new(physics::build(config, source)?),
        LessonKind::ImportedModels => Box::new(imported_models::build(config, source)?),
    };
    Ok(lesson)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_parse_from_their_names() {
        for kind in LessonKind::ALL {
            assert_eq!(kind.name().parse::<LessonKind>().unwrap(), kind);
        }
        assert_eq!("Haunted_House".parse::<LessonKind>().unwrap(), LessonKind::HauntedHouse);
        assert!(matches!(
            "portal".parse::<LessonKind>(),
            Err(LessonError::UnknownLesson(_))
        ));
    }

    #[test]
    fn seeded_rng_repeats() {
        use rand::Rng;
        let draw = |seed| {
            let mut rng = lesson_rng(Some(seed));
            (0..4).map(|_| rng.gen_range(0..1000)).collect::<Vec<u32>>()
        };
        assert_eq!(draw(9), draw(9));
    }
}
