//! Simulated bodies.
//!
//! A [`Body`] is the long-lived, mutable entity the outside world reads for
//! rendering and writes through drag and slider interactions. Its
//! simulation fields are [`RewindableValue`]s; the integrator only ever
//! sees a [`BodySnapshot`] copied out of it.

use std::collections::VecDeque;
use std::f64::consts::PI;
use std::fmt;

use log::debug;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::engine::rewind::{RewindGate, RewindableState, RewindableValue};
use crate::error::{SimError, SimResult};
use crate::orbit::physics::BodySnapshot;
use crate::orbit::units::Vector2;

/// Default cap on stored path points.
pub const DEFAULT_PATH_LENGTH_LIMIT: usize = 6000;

/// Stable handle to a body: its index in the engine's insertion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BodyId(pub usize);

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Role of a body in its scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BodyType {
    /// Central star.
    Star,
    /// Planet orbiting a star.
    Planet,
    /// Natural satellite of a planet.
    Moon,
    /// Artificial satellite.
    Satellite,
}

impl fmt::Display for BodyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Star => "star",
            Self::Planet => "planet",
            Self::Moon => "moon",
            Self::Satellite => "satellite",
        };
        f.write_str(name)
    }
}

/// Initial conditions and presentation hints for one body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct BodyConfig {
    /// Display name; unique within a scene.
    #[validate(length(min = 1))]
    pub name: String,
    /// Role in the scene.
    pub body_type: BodyType,
    /// Initial mass (kg).
    pub mass: f64,
    /// Radius (m) at the initial mass; fixes the body's density.
    pub radius: f64,
    /// Initial position (m).
    #[serde(default)]
    pub position: Vector2,
    /// Initial velocity (m/s).
    #[serde(default)]
    pub velocity: Vector2,
    /// Self-rotation period (s); absent for no self-rotation.
    #[serde(default)]
    pub rotation_period: Option<f64>,
    /// False pins the body where it starts.
    #[serde(default = "default_true")]
    pub movable: bool,
    /// Whether the user may change the mass.
    #[serde(default)]
    pub mass_settable: bool,
    /// Lower mass slider bound (kg).
    #[serde(default)]
    pub min_mass: Option<f64>,
    /// Upper mass slider bound (kg).
    #[serde(default)]
    pub max_mass: Option<f64>,
    /// Slider tick value (kg).
    #[serde(default)]
    pub tick_value: Option<f64>,
    /// Slider tick label.
    #[serde(default)]
    pub tick_label: Option<String>,
    /// Draw the mass readout below the body.
    #[serde(default)]
    pub mass_readout_below: bool,
}

const fn default_true() -> bool {
    true
}

impl BodyConfig {
    /// Minimal movable body; presentation hints left empty.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        body_type: BodyType,
        mass: f64,
        radius: f64,
        position: Vector2,
        velocity: Vector2,
    ) -> Self {
        Self {
            name: name.into(),
            body_type,
            mass,
            radius,
            position,
            velocity,
            rotation_period: None,
            movable: true,
            mass_settable: false,
            min_mass: None,
            max_mass: None,
            tick_value: None,
            tick_label: None,
            mass_readout_below: false,
        }
    }

    /// Set the self-rotation period.
    #[must_use]
    pub fn with_rotation_period(mut self, period: f64) -> Self {
        self.rotation_period = Some(period);
        self
    }

    /// Pin or unpin the body.
    #[must_use]
    pub fn with_movable(mut self, movable: bool) -> Self {
        self.movable = movable;
        self
    }

    /// Allow mass changes within slider bounds.
    #[must_use]
    pub fn with_mass_range(mut self, min_mass: f64, max_mass: f64) -> Self {
        self.mass_settable = true;
        self.min_mass = Some(min_mass);
        self.max_mass = Some(max_mass);
        self
    }

    /// Check construction preconditions.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBody`] for a non-positive or non-finite
    /// mass or radius, a zero or non-finite rotation period, non-finite
    /// initial state, or an initial mass outside the slider bounds.
    pub fn check(&self) -> SimResult<()> {
        let fail = |reason: &str| Err(SimError::invalid_body(&self.name, reason));

        if !(self.mass.is_finite() && self.mass > 0.0) {
            return fail("mass must be positive and finite");
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return fail("radius must be positive and finite");
        }
        if let Some(period) = self.rotation_period {
            if !period.is_finite() || period == 0.0 {
                return fail("rotation period must be finite and non-zero");
            }
        }
        if !self.position.is_finite() || !self.velocity.is_finite() {
            return fail("initial position and velocity must be finite");
        }
        if let (Some(min), Some(max)) = (self.min_mass, self.max_mass) {
            if min > max {
                return fail("min_mass exceeds max_mass");
            }
        }
        if self.min_mass.is_some_and(|min| self.mass < min) {
            return fail("mass is below min_mass");
        }
        if self.max_mass.is_some_and(|max| self.mass > max) {
            return fail("mass is above max_mass");
        }
        Ok(())
    }
}

impl From<&BodyConfig> for BodySnapshot {
    fn from(config: &BodyConfig) -> Self {
        Self {
            rotation_period: config.rotation_period,
            ..Self::new(config.body_type, config.mass, config.position, config.velocity)
        }
    }
}

/// Serializable body state: every rewindable field plus its rewind point,
/// and the path history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BodyCheckpoint {
    /// Position (m).
    pub position: RewindableState<Vector2>,
    /// Velocity (m/s).
    pub velocity: RewindableState<Vector2>,
    /// Force (N).
    pub force: RewindableState<Vector2>,
    /// Mass (kg).
    pub mass: RewindableState<f64>,
    /// Rotation (rad).
    pub rotation: RewindableState<f64>,
    /// Destroyed flag.
    pub collided: RewindableState<bool>,
    /// Acceleration (m/s²).
    pub acceleration: Vector2,
    /// Trajectory, oldest first.
    pub path: Vec<Vector2>,
}

/// One simulated mass.
#[derive(Debug, Clone)]
pub struct Body {
    name: String,
    body_type: BodyType,

    position: RewindableValue<Vector2>,
    velocity: RewindableValue<Vector2>,
    force: RewindableValue<Vector2>,
    mass: RewindableValue<f64>,
    rotation: RewindableValue<f64>,
    collided: RewindableValue<bool>,
    acceleration: Vector2,

    /// kg/m³, fixed at construction.
    density: f64,
    /// Derived from mass and density.
    diameter: f64,
    rotation_period: Option<f64>,
    movable: bool,

    /// Transient; set while a user drags the body.
    user_controlled: bool,
    /// Position at the start of the latest `step_model`.
    previous_position: Vector2,

    path: VecDeque<Vector2>,
    /// Arclength of `path` (m).
    path_length: f64,
    max_path_length: f64,
    path_length_limit: usize,

    mass_settable: bool,
    min_mass: Option<f64>,
    max_mass: Option<f64>,
    tick_value: Option<f64>,
    tick_label: Option<String>,
    mass_readout_below: bool,
}

impl Body {
    /// Build a body from its configuration.
    ///
    /// # Errors
    ///
    /// Fails fast on any precondition checked by [`BodyConfig::check`].
    pub fn new(config: &BodyConfig, gate: &RewindGate) -> SimResult<Self> {
        config.check()?;

        let volume = 4.0 / 3.0 * PI * config.radius.powi(3);
        let density = config.mass / volume;

        debug!("created {} '{}' (mass {:e} kg)", config.body_type, config.name, config.mass);

        Ok(Self {
            name: config.name.clone(),
            body_type: config.body_type,
            position: RewindableValue::new(config.position, gate),
            velocity: RewindableValue::new(config.velocity, gate),
            force: RewindableValue::new(Vector2::zero(), gate),
            mass: RewindableValue::new(config.mass, gate),
            rotation: RewindableValue::new(0.0, gate),
            collided: RewindableValue::new(false, gate),
            acceleration: Vector2::zero(),
            density,
            diameter: 2.0 * config.radius,
            rotation_period: config.rotation_period,
            movable: config.movable,
            user_controlled: false,
            previous_position: config.position,
            path: VecDeque::new(),
            path_length: 0.0,
            max_path_length: f64::INFINITY,
            path_length_limit: DEFAULT_PATH_LENGTH_LIMIT,
            mass_settable: config.mass_settable,
            min_mass: config.min_mass,
            max_mass: config.max_mass,
            tick_value: config.tick_value,
            tick_label: config.tick_label.clone(),
            mass_readout_below: config.mass_readout_below,
        })
    }

    fn diameter_for(mass: f64, density: f64) -> f64 {
        2.0 * (3.0 * mass / (4.0 * PI * density)).cbrt()
    }

    // ===== Read accessors =====

    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Role in the scene.
    #[must_use]
    pub const fn body_type(&self) -> BodyType {
        self.body_type
    }

    /// Position (m).
    #[must_use]
    pub fn position(&self) -> Vector2 {
        self.position.value()
    }

    /// Velocity (m/s).
    #[must_use]
    pub fn velocity(&self) -> Vector2 {
        self.velocity.value()
    }

    /// Acceleration (m/s²).
    #[must_use]
    pub const fn acceleration(&self) -> Vector2 {
        self.acceleration
    }

    /// Net gravitational force (N).
    #[must_use]
    pub fn force(&self) -> Vector2 {
        self.force.value()
    }

    /// Mass (kg).
    #[must_use]
    pub fn mass(&self) -> f64 {
        self.mass.value()
    }

    /// Diameter (m).
    #[must_use]
    pub const fn diameter(&self) -> f64 {
        self.diameter
    }

    /// Radius (m).
    #[must_use]
    pub fn radius(&self) -> f64 {
        self.diameter / 2.0
    }

    /// Density (kg/m³).
    #[must_use]
    pub const fn density(&self) -> f64 {
        self.density
    }

    /// Rotation angle (rad).
    #[must_use]
    pub fn rotation(&self) -> f64 {
        self.rotation.value()
    }

    /// Self-rotation period (s).
    #[must_use]
    pub const fn rotation_period(&self) -> Option<f64> {
        self.rotation_period
    }

    /// Whether a collision has destroyed the body.
    #[must_use]
    pub fn is_collided(&self) -> bool {
        self.collided.value()
    }

    /// Whether the integrator may move the body.
    #[must_use]
    pub const fn is_movable(&self) -> bool {
        self.movable
    }

    /// Whether a user is dragging the body.
    #[must_use]
    pub const fn is_user_controlled(&self) -> bool {
        self.user_controlled
    }

    /// Position at the start of the latest `step_model`.
    #[must_use]
    pub const fn previous_position(&self) -> Vector2 {
        self.previous_position
    }

    /// Trajectory history, oldest first.
    pub fn path(&self) -> impl ExactSizeIterator<Item = &Vector2> + '_ {
        self.path.iter()
    }

    /// Number of stored path points.
    #[must_use]
    pub fn path_point_count(&self) -> usize {
        self.path.len()
    }

    /// Arclength of the stored path (m).
    #[must_use]
    pub const fn path_length(&self) -> f64 {
        self.path_length
    }

    /// Longest arclength kept (m).
    #[must_use]
    pub const fn max_path_length(&self) -> f64 {
        self.max_path_length
    }

    /// Most path points kept.
    #[must_use]
    pub const fn path_length_limit(&self) -> usize {
        self.path_length_limit
    }

    /// Whether the user may change the mass.
    #[must_use]
    pub const fn is_mass_settable(&self) -> bool {
        self.mass_settable
    }

    /// Mass slider bounds (kg).
    #[must_use]
    pub const fn mass_range(&self) -> (Option<f64>, Option<f64>) {
        (self.min_mass, self.max_mass)
    }

    /// Slider tick value (kg).
    #[must_use]
    pub const fn tick_value(&self) -> Option<f64> {
        self.tick_value
    }

    /// Slider tick label.
    #[must_use]
    pub fn tick_label(&self) -> Option<&str> {
        self.tick_label.as_deref()
    }

    /// Draw the mass readout below the body.
    #[must_use]
    pub const fn is_mass_readout_below(&self) -> bool {
        self.mass_readout_below
    }

    /// Whether any rewindable field has moved off its rewind point.
    #[must_use]
    pub fn differs_from_rewind_point(&self) -> bool {
        self.position.differs_from_rewind_point()
            || self.velocity.differs_from_rewind_point()
            || self.mass.differs_from_rewind_point()
            || self.collided.differs_from_rewind_point()
    }

    // ===== Write entry points =====

    /// Move the body (drag).
    pub fn set_position(&mut self, position: Vector2) {
        self.position.set(position);
    }

    /// Change the velocity (velocity-vector drag).
    pub fn set_velocity(&mut self, velocity: Vector2) {
        self.velocity.set(velocity);
    }

    /// Change the mass; the diameter follows at constant density.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBody`] for a non-positive or non-finite mass.
    pub fn set_mass(&mut self, mass: f64) -> SimResult<()> {
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimError::invalid_body(&self.name, "mass must be positive and finite"));
        }
        self.mass.set(mass);
        self.diameter = Self::diameter_for(mass, self.density);
        Ok(())
    }

    /// Mark or unmark the body as user-controlled.
    pub fn set_user_controlled(&mut self, user_controlled: bool) {
        self.user_controlled = user_controlled;
    }

    /// Start a drag: the integrator stops moving the body and its path is
    /// cleared.
    pub fn begin_drag(&mut self) {
        self.user_controlled = true;
        self.clear_path();
    }

    /// End a drag.
    pub fn end_drag(&mut self) {
        self.user_controlled = false;
    }

    /// Set the path caps.
    pub fn set_path_limits(&mut self, max_path_length: f64, path_length_limit: usize) {
        self.max_path_length = max_path_length;
        self.path_length_limit = path_length_limit;
        self.evict_path_points();
    }

    /// Forget the trajectory history.
    pub fn clear_path(&mut self) {
        self.path.clear();
        self.path_length = 0.0;
    }

    // ===== Simulation hooks =====

    /// Copy the numeric state out for the integrator.
    #[must_use]
    pub fn snapshot(&self) -> BodySnapshot {
        BodySnapshot {
            position: self.position(),
            velocity: self.velocity(),
            acceleration: self.acceleration,
            mass: self.mass(),
            rotation: self.rotation(),
            rotation_period: self.rotation_period,
            collided: self.is_collided(),
            body_type: self.body_type,
        }
    }

    /// Fold an integrator result back in. Destroyed bodies are left alone;
    /// pinned or dragged bodies keep their position and velocity but still
    /// take the new acceleration, force and rotation.
    pub fn apply_integrator_result(&mut self, snapshot: &BodySnapshot) {
        if self.is_collided() {
            return;
        }
        if self.movable && !self.user_controlled {
            self.position.set(snapshot.position);
            self.velocity.set(snapshot.velocity);
        }
        self.acceleration = snapshot.acceleration;
        self.force.set(snapshot.acceleration * self.mass());
        self.rotation.set(snapshot.rotation);
    }

    /// Remember where the body was at the start of a model step.
    pub fn store_previous_position(&mut self) {
        self.previous_position = self.position();
    }

    /// Append the current position to the path, then evict from the oldest
    /// end until both caps hold. Skipped for dragged, destroyed and pinned
    /// bodies.
    pub fn record_path_sample(&mut self) {
        if self.user_controlled || self.is_collided() || !self.movable {
            return;
        }
        let point = self.position();
        if let Some(last) = self.path.back() {
            self.path_length += point.distance(last);
        }
        self.path.push_back(point);
        self.evict_path_points();
    }

    fn evict_path_points(&mut self) {
        while self.path.len() > self.path_length_limit
            || (self.path_length > self.max_path_length && !self.path.is_empty())
        {
            let Some(oldest) = self.path.pop_front() else {
                break;
            };
            match self.path.front() {
                Some(next) => self.path_length -= oldest.distance(next),
                None => self.path_length = 0.0,
            }
        }
        // Keep subtraction round-off from leaving a stale positive length.
        if self.path.len() < 2 {
            self.path_length = 0.0;
        }
    }

    /// Euclidean distance between centers below the sum of radii.
    #[must_use]
    pub fn collides_with(&self, other: &Self) -> bool {
        self.position().distance(&other.position()) < self.radius() + other.radius()
    }

    /// Mark the body destroyed. Never reverts except via rewind or reset.
    pub fn mark_collided(&mut self) {
        self.collided.set(true);
    }

    /// Restore every rewindable field to its last rewind point and clear
    /// the path.
    pub fn rewind(&mut self) {
        self.position.rewind();
        self.velocity.rewind();
        self.force.rewind();
        self.mass.rewind();
        self.rotation.rewind();
        self.collided.rewind();
        self.diameter = Self::diameter_for(self.mass(), self.density);
        self.clear_path();
    }

    /// Restore every field to its construction value and clear the path.
    pub fn reset_all(&mut self) {
        self.position.reset();
        self.velocity.reset();
        self.force.reset();
        self.mass.reset();
        self.rotation.reset();
        self.collided.reset();
        self.acceleration = Vector2::zero();
        self.diameter = Self::diameter_for(self.mass(), self.density);
        self.user_controlled = false;
        self.previous_position = self.position();
        self.clear_path();
    }

    /// Capture the current state as the rewind point without a `set`.
    pub fn store_checkpoint_silently(&mut self) {
        self.position.store_checkpoint_silently();
        self.velocity.store_checkpoint_silently();
        self.force.store_checkpoint_silently();
        self.mass.store_checkpoint_silently();
        self.rotation.store_checkpoint_silently();
        self.collided.store_checkpoint_silently();
    }

    /// Serializable state for persistence.
    #[must_use]
    pub fn checkpoint(&self) -> BodyCheckpoint {
        BodyCheckpoint {
            position: self.position.to_state(),
            velocity: self.velocity.to_state(),
            force: self.force.to_state(),
            mass: self.mass.to_state(),
            rotation: self.rotation.to_state(),
            collided: self.collided.to_state(),
            acceleration: self.acceleration,
            path: self.path.iter().copied().collect(),
        }
    }

    /// Restore state captured by [`Self::checkpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBody`] if the checkpoint's mass is not
    /// positive and finite.
    pub fn restore(&mut self, checkpoint: BodyCheckpoint) -> SimResult<()> {
        let mass = checkpoint.mass.current;
        if !(mass.is_finite() && mass > 0.0) {
            return Err(SimError::invalid_body(
                &self.name,
                "checkpoint mass must be positive and finite",
            ));
        }
        self.position.restore_state(checkpoint.position);
        self.velocity.restore_state(checkpoint.velocity);
        self.force.restore_state(checkpoint.force);
        self.mass.restore_state(checkpoint.mass);
        self.rotation.restore_state(checkpoint.rotation);
        self.collided.restore_state(checkpoint.collided);
        self.acceleration = checkpoint.acceleration;
        self.diameter = Self::diameter_for(mass, self.density);

        self.clear_path();
        for point in checkpoint.path {
            if let Some(last) = self.path.back() {
                self.path_length += point.distance(last);
            }
            self.path.push_back(point);
        }
        self.evict_path_points();
        Ok(())
    }

    /// Point every rewindable field at `gate`.
    pub(crate) fn bind_gate(&mut self, gate: &RewindGate) {
        self.position.bind_gate(gate);
        self.velocity.bind_gate(gate);
        self.force.bind_gate(gate);
        self.mass.bind_gate(gate);
        self.rotation.bind_gate(gate);
        self.collided.bind_gate(gate);
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn free_body(gate: &RewindGate) -> Result<Body, TestCaseError> {
        let config =
            BodyConfig::new("p", BodyType::Planet, 1.0, 1.0, Vector2::zero(), Vector2::zero());
        Body::new(&config, gate).map_err(|e| TestCaseError::fail(e.to_string()))
    }

    proptest! {
        /// Falsification: path caps hold after any sequence of samples.
        #[test]
        fn prop_path_caps_hold(
            max_len in 1.0f64..1e4,
            limit in 1usize..50,
            moves in proptest::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 1..200),
        ) {
            let gate = RewindGate::new();
            let mut body = free_body(&gate)?;
            body.set_path_limits(max_len, limit);

            for (x, y) in moves {
                body.set_position(Vector2::new(x, y));
                body.record_path_sample();
                prop_assert!(body.path_point_count() <= limit);
                prop_assert!(body.path_length() <= max_len * (1.0 + 1e-9));

                let actual: f64 = body
                    .path()
                    .zip(body.path().skip(1))
                    .map(|(a, b)| a.distance(b))
                    .sum();
                prop_assert!((actual - body.path_length()).abs() <= 1e-6 * actual.max(1.0));
            }
        }

        /// Falsification: the collided flag never reverts through stepping.
        #[test]
        fn prop_collided_monotonic(
            steps in proptest::collection::vec((-1e3f64..1e3, -1e3f64..1e3), 1..50),
        ) {
            let gate = RewindGate::new();
            let mut body = free_body(&gate)?;
            body.mark_collided();

            for (x, y) in steps {
                let mut snap = body.snapshot();
                snap.position = Vector2::new(x, y);
                snap.collided = false;
                body.apply_integrator_result(&snap);
                body.record_path_sample();
                prop_assert!(body.is_collided());
            }
        }
    }
}
