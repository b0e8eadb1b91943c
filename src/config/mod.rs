//! Scene configuration with YAML schema and validation.
//!
//! A [`SceneConfig`] carries everything a scene hands the core: base
//! sub-step size, default switches and the initial state of every body.
//! Loading is mistake-proofed in three passes:
//! - serde rejects unknown fields and wrong types
//! - `validator` checks schema constraints
//! - semantic validation checks physical preconditions and unique names

use std::collections::HashSet;
use std::f64::consts::TAU;
use std::path::Path;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::clock::PlaySpeed;
use crate::engine::PhysicsEngine;
use crate::error::{SimError, SimResult};
use crate::orbit::body::{BodyConfig, DEFAULT_PATH_LENGTH_LIMIT};
use crate::orbit::units::SECONDS_PER_DAY;

/// Complete description of one scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SceneConfig {
    /// Scene name.
    #[validate(length(min = 1))]
    pub name: String,

    /// Base sub-step size in simulated seconds.
    pub base_time_step: f64,

    /// Whether gravity starts on.
    #[serde(default = "default_true")]
    pub gravity_enabled: bool,

    /// Apply the moon-orbit correction to moon→planet forces.
    #[serde(default)]
    pub adjust_moon_orbit: bool,

    /// Initial play speed.
    #[serde(default)]
    pub play_speed: PlaySpeed,

    /// Most path points kept per body.
    #[validate(range(min = 2))]
    #[serde(default = "default_path_length_limit")]
    pub path_length_limit: usize,

    /// Multiple of a body's initial orbit circumference kept as path.
    #[serde(default = "default_path_length_factor")]
    pub path_length_factor: f64,

    /// Bodies in engine order; the first is the central body.
    #[validate(length(min = 1), nested)]
    pub bodies: Vec<BodyConfig>,
}

const fn default_true() -> bool {
    true
}

const fn default_path_length_limit() -> usize {
    DEFAULT_PATH_LENGTH_LIMIT
}

const fn default_path_length_factor() -> f64 {
    1.4
}

impl SceneConfig {
    /// Load a scene from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - YAML parsing fails
    /// - Validation fails
    pub fn load<P: AsRef<Path>>(path: P) -> SimResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a scene from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or validation fails.
    pub fn from_yaml(yaml: &str) -> SimResult<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.check()?;
        Ok(config)
    }

    /// Serialize to YAML.
    ///
    /// # Errors
    ///
    /// Returns error if serialization fails.
    pub fn to_yaml(&self) -> SimResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Write the scene to a YAML file.
    ///
    /// # Errors
    ///
    /// Returns error if serialization or writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> SimResult<()> {
        std::fs::write(path, self.to_yaml()?)?;
        Ok(())
    }

    /// Create a builder.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SceneConfigBuilder {
        SceneConfigBuilder::new(name)
    }

    /// Run schema and semantic validation.
    ///
    /// # Errors
    ///
    /// Returns the first failed constraint.
    pub fn check(&self) -> SimResult<()> {
        self.validate()?;
        self.validate_semantic()
    }

    /// Validate semantic constraints beyond schema.
    fn validate_semantic(&self) -> SimResult<()> {
        if !(self.base_time_step.is_finite() && self.base_time_step > 0.0) {
            return Err(SimError::config(format!(
                "base_time_step must be positive and finite, got {}",
                self.base_time_step
            )));
        }
        if !(self.path_length_factor.is_finite() && self.path_length_factor > 0.0) {
            return Err(SimError::config(format!(
                "path_length_factor must be positive and finite, got {}",
                self.path_length_factor
            )));
        }

        let mut names = HashSet::new();
        for body in &self.bodies {
            body.check()?;
            if !names.insert(body.name.as_str()) {
                return Err(SimError::config(format!(
                    "Duplicate body name '{}' in scene '{}'",
                    body.name, self.name
                )));
            }
        }

        Ok(())
    }

    /// Longest path arclength kept for each body, in body order.
    ///
    /// Each orbiting body keeps `path_length_factor` times the circumference
    /// of a circle through its start point around the central body. The
    /// central body keeps the largest of those.
    #[must_use]
    pub fn max_path_lengths(&self) -> Vec<f64> {
        let Some(central) = self.bodies.first() else {
            return Vec::new();
        };

        let mut lengths: Vec<f64> = self
            .bodies
            .iter()
            .map(|b| TAU * b.position.distance(&central.position) * self.path_length_factor)
            .collect();

        let largest = lengths.iter().skip(1).copied().fold(0.0, f64::max);
        if let Some(first) = lengths.first_mut() {
            *first = if largest > 0.0 { largest } else { f64::INFINITY };
        }
        lengths
    }

    /// Validate and build a paused engine holding every body.
    ///
    /// # Errors
    ///
    /// Returns error if validation fails.
    pub fn build_engine(&self) -> SimResult<PhysicsEngine> {
        self.check()?;

        let mut engine = PhysicsEngine::new(
            self.base_time_step,
            self.play_speed,
            self.gravity_enabled,
            self.adjust_moon_orbit,
        )?;

        for (body, max_path_length) in self.bodies.iter().zip(self.max_path_lengths()) {
            let id = engine.create_body(body)?;
            engine
                .body_mut(id)?
                .set_path_limits(max_path_length, self.path_length_limit);
        }

        Ok(engine)
    }
}

/// Builder for programmatic scene construction.
#[derive(Debug)]
pub struct SceneConfigBuilder {
    config: SceneConfig,
}

impl SceneConfigBuilder {
    /// Start an empty scene stepping one simulated day at a time.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            config: SceneConfig {
                name: name.into(),
                base_time_step: SECONDS_PER_DAY,
                gravity_enabled: true,
                adjust_moon_orbit: false,
                play_speed: PlaySpeed::default(),
                path_length_limit: default_path_length_limit(),
                path_length_factor: default_path_length_factor(),
                bodies: Vec::new(),
            },
        }
    }

    /// Set the base sub-step size in seconds.
    #[must_use]
    pub fn base_time_step(mut self, seconds: f64) -> Self {
        self.config.base_time_step = seconds;
        self
    }

    /// Set whether gravity starts on.
    #[must_use]
    pub fn gravity_enabled(mut self, enabled: bool) -> Self {
        self.config.gravity_enabled = enabled;
        self
    }

    /// Enable or disable the moon-orbit correction.
    #[must_use]
    pub fn adjust_moon_orbit(mut self, adjust: bool) -> Self {
        self.config.adjust_moon_orbit = adjust;
        self
    }

    /// Set the initial play speed.
    #[must_use]
    pub fn play_speed(mut self, speed: PlaySpeed) -> Self {
        self.config.play_speed = speed;
        self
    }

    /// Set the path point cap.
    #[must_use]
    pub fn path_length_limit(mut self, limit: usize) -> Self {
        self.config.path_length_limit = limit;
        self
    }

    /// Set the path arclength factor.
    #[must_use]
    pub fn path_length_factor(mut self, factor: f64) -> Self {
        self.config.path_length_factor = factor;
        self
    }

    /// Append a body.
    #[must_use]
    pub fn body(mut self, body: BodyConfig) -> Self {
        self.config.bodies.push(body);
        self
    }

    /// Build the configuration. Validation happens on load or
    /// [`SceneConfig::build_engine`].
    #[must_use]
    pub fn build(self) -> SceneConfig {
        self.config
    }
}
