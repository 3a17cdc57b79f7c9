//! Lesson settings, loaded from YAML. Every field has a default.

use frameloop_common::Color;
use frameloop_kernel::MIN_REFRESH_HZ;
use frameloop_physics::{ContactMaterial, StepSettings};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid setting `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Target display refresh rate for paced hosts.
    pub refresh_hz: f64,
    /// Stop after this many frames. `None` runs until stopped.
    pub frame_limit: Option<u64>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            refresh_hz: 60.0,
            frame_limit: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    pub step: StepSettings,
    pub gravity: Vec3,
    pub contact: ContactMaterial,
    pub allow_sleep: bool,
    /// Minimum approach speed that counts as an audible hit.
    pub hit_threshold: f32,
    /// Seconds after a hit during which further hits are ignored.
    pub hit_cooldown: f32,
    /// Constant world-space force on every body, applied each frame.
    pub wind: Vec3,
    /// Body-local impulse of the push action, applied at the body origin.
    pub push: Vec3,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            step: StepSettings::default(),
            gravity: Vec3::new(0.0, -9.82, 0.0),
            contact: ContactMaterial {
                friction: 0.1,
                restitution: 0.7,
            },
            allow_sleep: true,
            hit_threshold: 1.5,
            hit_cooldown: 0.1,
            wind: Vec3::ZERO,
            push: Vec3::new(2.5, 0.0, 0.0),
        }
    }
}

/// Parameters of the procedural galaxy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyParams {
    pub count: usize,
    pub size: f32,
    pub radius: f32,
    pub branches: u32,
    pub spin: f32,
    pub randomness: f32,
    pub randomness_power: f32,
    pub inner_color: Color,
    pub outer_color: Color,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            count: 100_000,
            size: 0.01,
            radius: 5.0,
            branches: 3,
            spin: 1.0,
            randomness: 0.2,
            randomness_power: 3.0,
            inner_color: Color::from_hex(0xff6030),
            outer_color: Color::from_hex(0x1b3984),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParticlesConfig {
    pub count: usize,
    /// Edge length of the cube the particles start in.
    pub spread: f32,
    pub size: f32,
}

impl Default for ParticlesConfig {
    fn default() -> Self {
        Self {
            count: 2000,
            spread: 4.0,
            size: 0.1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory asset paths are resolved against.
    pub root: PathBuf,
    pub model: String,
    /// Index of the animation clip to play once the model arrives.
    pub clip: usize,
    pub model_scale: f32,
    pub shadow_texture: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("static"),
            model: "models/Fox/glTF/Fox.gltf".into(),
            clip: 1,
            model_scale: 0.025,
            shadow_texture: "textures/simpleShadow.jpg".into(),
        }
    }
}

/// Settings shared by every lesson.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LessonConfig {
    pub driver: DriverConfig,
    pub physics: PhysicsConfig,
    pub galaxy: GalaxyParams,
    pub particles: ParticlesConfig,
    pub assets: AssetsConfig,
    /// Seed for lesson randomness. `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl LessonConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&yaml)?;
        tracing::info!(path = %path.display(), "lesson config loaded");
        Ok(config)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };
        let hz = self.driver.refresh_hz;
        if !(hz.is_finite() && hz >= MIN_REFRESH_HZ) {
            return invalid("driver.refresh_hz", "must be finite and at least 0.1");
        }
        if self.driver.frame_limit == Some(0) {
            return invalid("driver.frame_limit", "must be at least 1");
        }
        let step = self.physics.step.fixed_step;
        if !(step.is_finite() && step > 0.0) {
            return invalid("physics.step.fixed_step", "must be positive and finite");
        }
        if self.physics.step.max_substeps == 0 {
            return invalid("physics.step.max_substeps", "must be at least 1");
        }
        if !(self.physics.wind.is_finite() && self.physics.push.is_finite()) {
            return invalid("physics.wind", "wind and push must be finite");
        }
        if self.galaxy.branches == 0 {
            return invalid("galaxy.branches", "must be at least 1");
        }
        if !(self.galaxy.radius > 0.0) {
            return invalid("galaxy.radius", "must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = LessonConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, LessonConfig::default());
        assert_eq!(config.physics.contact.restitution, 0.7);
        assert_eq!(config.galaxy.count, 100_000);
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let yaml = "
galaxy:
  count: 500
  inner_color: '#ffffff'
physics:
  step:
    max_substeps: 5
seed: 7
";
        let config = LessonConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.galaxy.count, 500);
        assert_eq!(config.galaxy.inner_color, Color::WHITE);
        assert_eq!(config.galaxy.branches, 3);
        assert_eq!(config.physics.step.max_substeps, 5);
        assert_eq!(config.physics.step.fixed_step, 1.0 / 60.0);
        assert_eq!(config.seed, Some(7));
    }

    #[test]
    fn yaml_round_trip() {
        let config = LessonConfig {
            seed: Some(3),
            ..LessonConfig::default()
        };
        let yaml = config.to_yaml().unwrap();
        assert_eq!(LessonConfig::from_yaml_str(&yaml).unwrap(), config);
    }

    #[test]
    fn rejects_bad_values() {
        let err = LessonConfig::from_yaml_str("physics: { step: { fixed_step: 0.0 } }").unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "physics.step.fixed_step",
                ..
            }
        ));
        assert!(matches!(
            LessonConfig::from_yaml_str("galaxy: { branches: 0 }"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            LessonConfig::from_yaml_str("driver: 5"),
            Err(ConfigError::Yaml(_))
        ));
    }

    #[test]
    fn rejects_unpaceable_refresh_rates_and_empty_runs() {
        for yaml in [
            "driver: { refresh_hz: 1.0e-30 }",
            "driver: { refresh_hz: 0.0 }",
            "driver: { refresh_hz: .inf }",
            "driver: { refresh_hz: .nan }",
        ] {
            assert!(
                matches!(
                    LessonConfig::from_yaml_str(yaml),
                    Err(ConfigError::Invalid {
                        field: "driver.refresh_hz",
                        ..
                    })
                ),
                "{yaml}"
            );
        }
        assert!(LessonConfig::from_yaml_str("driver: { refresh_hz: 0.1 }").is_ok());
        assert!(matches!(
            LessonConfig::from_yaml_str("driver: { frame_limit: 0 }"),
            Err(ConfigError::Invalid {
                field: "driver.frame_limit",
                ..
            })
        ));
    }

    #[test]
    fn wind_and_push_are_read_as_vectors() {
        let config = LessonConfig::from_yaml_str("physics: { wind: [-0.5, 0.0, 0.0] }").unwrap();
        assert_eq!(config.physics.wind, Vec3::new(-0.5, 0.0, 0.0));
        assert_eq!(config.physics.push, Vec3::new(2.5, 0.0, 0.0));
        assert!(matches!(
            LessonConfig::from_yaml_str("physics: { push: [.nan, 0.0, 0.0] }"),
            Err(ConfigError::Invalid {
                field: "physics.wind",
                ..
            })
        ));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = LessonConfig::load(dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));

        let path = dir.path().join("lesson.yaml");
        std::fs::write(&path, "particles:\n  count: 10\n").unwrap();
        assert_eq!(LessonConfig::load(&path).unwrap().particles.count, 10);
    }
}
