//! Core simulation engine.
//!
//! [`PhysicsEngine`] owns the bodies of one scene together with its clock
//! and drives the integrator at a fixed sub-step cadence:
//! - `step_model` expands one visible tick into 1, 4 or 7 sub-steps
//! - each sub-step snapshots every body, advances the snapshots, folds the
//!   results back and then resolves collisions
//! - rewind, checkpoint and reset lifecycle for the whole scene
//!
//! Running versus paused is owned by the clock; the engine itself only
//! ever goes `Idle -> Stepping -> Idle` inside a single call.

pub mod clock;
pub mod rewind;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

pub use clock::{EventTimer, OrbitClock, PlaySpeed, MAX_TICKS_PER_STEP, PAUSED_STEP_SIZE};
pub use rewind::{RewindGate, RewindableState, RewindableValue};

use crate::error::{SimError, SimResult};
use crate::orbit::body::{Body, BodyCheckpoint, BodyConfig, BodyId};
use crate::orbit::physics::{IntegrationOptions, ModelState};
use crate::orbit::units::Vector2;

/// Fraction of the scene's base step used for every sub-step. Chosen so
/// the fastest play speed still yields stable orbits.
pub const SMALLEST_TIME_STEP_FRACTION: f64 = 0.131_25;

/// Serializable engine state: clock time, switches and every body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineCheckpoint {
    /// Simulation time and its rewind point (s).
    pub time: RewindableState<f64>,
    /// Gravity switch.
    pub gravity_enabled: bool,
    /// Play speed.
    pub play_speed: PlaySpeed,
    /// Per-body state in engine order.
    pub bodies: Vec<BodyCheckpoint>,
}

/// N-body engine for one scene.
#[derive(Debug)]
pub struct PhysicsEngine {
    /// Insertion order is fixed; a body's index is its [`BodyId`].
    bodies: Vec<Body>,
    clock: OrbitClock,
    /// Phase flags shared with every rewindable field in the scene.
    gate: RewindGate,
    gravity_enabled: bool,
    default_gravity_enabled: bool,
    /// Scene switch for [`crate::orbit::physics::MOON_ORBIT_FUDGE_FACTOR`].
    adjust_moon_orbit: bool,
    /// Reused integrator buffers.
    model: ModelState,
}

impl PhysicsEngine {
    /// Create an empty, paused engine.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::Config`] if `base_time_step` is not positive and
    /// finite.
    pub fn new(
        base_time_step: f64,
        play_speed: PlaySpeed,
        gravity_enabled: bool,
        adjust_moon_orbit: bool,
    ) -> SimResult<Self> {
        if !(base_time_step.is_finite() && base_time_step > 0.0) {
            return Err(SimError::config(format!(
                "base_time_step must be positive and finite, got {base_time_step}"
            )));
        }

        let gate = RewindGate::new();
        let clock = OrbitClock::new(base_time_step, play_speed, &gate);

        debug!(
            "engine created: base step {base_time_step} s, speed {play_speed}, \
             gravity {gravity_enabled}, adjust moon orbit {adjust_moon_orbit}"
        );

        Ok(Self {
            bodies: Vec::new(),
            clock,
            gate,
            gravity_enabled,
            default_gravity_enabled: gravity_enabled,
            adjust_moon_orbit,
            model: ModelState::default(),
        })
    }

    /// Phase flags shared by the scene.
    #[must_use]
    pub const fn gate(&self) -> &RewindGate {
        &self.gate
    }

    /// Scene clock.
    #[must_use]
    pub const fn clock(&self) -> &OrbitClock {
        &self.clock
    }

    /// Mutable scene clock.
    pub fn clock_mut(&mut self) -> &mut OrbitClock {
        &mut self.clock
    }

    // ===== Bodies =====

    /// Append a body and refresh forces so it has a correct acceleration
    /// before the clock runs.
    pub fn add_body(&mut self, mut body: Body) -> BodyId {
        body.bind_gate(&self.gate);
        let id = BodyId(self.bodies.len());
        debug!("added body {id} '{}'", body.name());
        self.bodies.push(body);
        self.update_force_vectors();
        id
    }

    /// Build a body from configuration and add it.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::InvalidBody`] if the configuration violates a
    /// construction precondition.
    pub fn create_body(&mut self, config: &BodyConfig) -> SimResult<BodyId> {
        let body = Body::new(config, &self.gate)?;
        Ok(self.add_body(body))
    }

    /// Bodies in insertion order.
    #[must_use]
    pub fn bodies(&self) -> &[Body] {
        &self.bodies
    }

    /// Owned copy of the body list; mutating it never touches the engine.
    #[must_use]
    pub fn get_bodies(&self) -> Vec<Body> {
        self.bodies.clone()
    }

    /// Number of bodies.
    #[must_use]
    pub fn num_bodies(&self) -> usize {
        self.bodies.len()
    }

    /// Look up a body.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownBody`] for a handle from another engine.
    pub fn body(&self, id: BodyId) -> SimResult<&Body> {
        self.bodies.get(id.0).ok_or(SimError::UnknownBody(id.0))
    }

    /// Look up a body for mutation.
    ///
    /// Changes made through this handle do not refresh forces; call
    /// [`Self::update_force_vectors`] afterwards, or use the `set_body_*`
    /// helpers.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownBody`] for a handle from another engine.
    pub fn body_mut(&mut self, id: BodyId) -> SimResult<&mut Body> {
        self.bodies.get_mut(id.0).ok_or(SimError::UnknownBody(id.0))
    }

    /// Find a body by name.
    #[must_use]
    pub fn find_body(&self, name: &str) -> Option<BodyId> {
        self.bodies.iter().position(|b| b.name() == name).map(BodyId)
    }

    /// Move a body and refresh forces.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownBody`] for an invalid handle.
    pub fn set_body_position(&mut self, id: BodyId, position: Vector2) -> SimResult<()> {
        self.body_mut(id)?.set_position(position);
        self.update_force_vectors();
        Ok(())
    }

    /// Change a body's velocity.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownBody`] for an invalid handle.
    pub fn set_body_velocity(&mut self, id: BodyId, velocity: Vector2) -> SimResult<()> {
        self.body_mut(id)?.set_velocity(velocity);
        Ok(())
    }

    /// Change a body's mass and refresh forces.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::UnknownBody`] for an invalid handle or
    /// [`SimError::InvalidBody`] for a non-positive mass.
    pub fn set_body_mass(&mut self, id: BodyId, mass: f64) -> SimResult<()> {
        self.body_mut(id)?.set_mass(mass)?;
        self.update_force_vectors();
        Ok(())
    }

    // ===== Switches =====

    /// Whether bodies attract each other.
    #[must_use]
    pub const fn gravity_enabled(&self) -> bool {
        self.gravity_enabled
    }

    /// Toggle gravity and refresh forces.
    pub fn set_gravity_enabled(&mut self, enabled: bool) {
        self.gravity_enabled = enabled;
        debug!("gravity {}", if enabled { "on" } else { "off" });
        self.update_force_vectors();
    }

    /// Whether the moon-orbit correction is active.
    #[must_use]
    pub const fn adjust_moon_orbit(&self) -> bool {
        self.adjust_moon_orbit
    }

    fn integration_options(&self) -> IntegrationOptions {
        IntegrationOptions {
            gravity_enabled: self.gravity_enabled,
            adjust_moon_orbit: self.adjust_moon_orbit,
        }
    }

    // ===== Stepping =====

    /// Size of every integrator sub-step (s).
    #[must_use]
    pub fn smallest_time_step(&self) -> f64 {
        self.clock.base_time_step() * SMALLEST_TIME_STEP_FRACTION
    }

    /// One integration pass of `dt` seconds followed by a collision scan.
    ///
    /// All forces come from the state at the start of the pass; collisions
    /// are marked only after every result has been applied. Runs under the
    /// stepping flag, so nothing it writes becomes a rewind point.
    pub fn step(&mut self, dt: f64) {
        let _stepping = self.gate.stepping();
        let options = self.integration_options();
        self.model.load(self.bodies.iter().map(Body::snapshot));
        self.model.advance(dt, options);

        for (body, snapshot) in self.bodies.iter_mut().zip(self.model.bodies()) {
            body.apply_integrator_result(snapshot);
        }

        self.resolve_collisions();
    }

    /// Pairwise collision scan. The lighter body of each touching pair is
    /// destroyed; on equal mass the lower index goes.
    fn resolve_collisions(&mut self) {
        let n = self.bodies.len();
        for i in 0..n {
            for j in (i + 1)..n {
                if self.bodies[i].is_collided() || self.bodies[j].is_collided() {
                    continue;
                }
                if !self.bodies[i].collides_with(&self.bodies[j]) {
                    continue;
                }
                let (victim, survivor) = if self.bodies[j].mass() < self.bodies[i].mass() {
                    (j, i)
                } else {
                    (i, j)
                };
                info!(
                    "collision: '{}' destroyed by '{}'",
                    self.bodies[victim].name(),
                    self.bodies[survivor].name()
                );
                self.bodies[victim].mark_collided();
            }
        }
    }

    /// Advance one visible tick: the play speed's number of sub-steps of
    /// [`Self::smallest_time_step`], recording a path sample after each.
    /// Returns the simulated seconds elapsed.
    pub fn step_model(&mut self) -> f64 {
        let sub_steps = self.clock.play_speed().sub_steps();
        let dt = self.smallest_time_step();
        self.run_sub_steps(sub_steps, dt)
    }

    /// Advance exactly one sub-step of [`PAUSED_STEP_SIZE`], whatever the
    /// play speed or scene. Returns the simulated seconds elapsed.
    pub fn step_while_paused(&mut self) -> f64 {
        let dt = self.clock.step_while_paused();
        self.run_sub_steps(1, dt)
    }

    fn run_sub_steps(&mut self, sub_steps: u32, dt: f64) -> f64 {
        let _stepping = self.gate.stepping();

        for body in &mut self.bodies {
            body.store_previous_position();
        }

        for _ in 0..sub_steps {
            self.step(dt);
            for body in &mut self.bodies {
                body.record_path_sample();
            }
        }

        let elapsed = dt * f64::from(sub_steps);
        self.clock.advance_time(elapsed);
        trace!(
            "stepped {sub_steps} x {dt} s, t = {} s",
            self.clock.simulation_time()
        );
        elapsed
    }

    /// Feed elapsed wall time to the clock and run one `step_model` per
    /// tick it produces. A paused clock produces none. Returns the
    /// simulated seconds elapsed.
    pub fn advance(&mut self, wall_dt: f64) -> f64 {
        let ticks = self.clock.step(wall_dt);
        (0..ticks).map(|_| self.step_model()).sum()
    }

    /// Zero-length pass that refreshes every force and acceleration without
    /// moving anything. Rewind points are left alone; `rewind` refreshes
    /// forces itself.
    pub fn update_force_vectors(&mut self) {
        self.step(0.0);
    }

    // ===== Lifecycle =====

    /// Whether any body has moved off its rewind point.
    #[must_use]
    pub fn any_differs_from_rewind_point(&self) -> bool {
        self.bodies.iter().any(Body::differs_from_rewind_point)
    }

    /// Return time and every body to the last rewind point.
    pub fn rewind(&mut self) {
        let _rewinding = self.gate.rewinding();
        self.clock.rewind_time();
        for body in &mut self.bodies {
            body.rewind();
        }
        self.update_force_vectors();
        debug!("rewound to t = {} s", self.clock.simulation_time());
    }

    /// Make the current state the rewind point.
    pub fn save_checkpoint(&mut self) {
        for body in &mut self.bodies {
            body.store_checkpoint_silently();
        }
        self.clock.store_checkpoint_silently();
        debug!("rewind point saved at t = {} s", self.clock.simulation_time());
    }

    /// Return every body to its construction state.
    pub fn reset_bodies(&mut self) {
        for body in &mut self.bodies {
            body.reset_all();
        }
        self.update_force_vectors();
        debug!("bodies reset");
    }

    /// Return the whole scene to its construction state: paused, time
    /// zero, default speed and gravity.
    pub fn reset_all(&mut self) {
        self.clock.reset();
        self.gravity_enabled = self.default_gravity_enabled;
        self.reset_bodies();
        debug!("scene reset");
    }

    // ===== Persistence =====

    /// Capture the scene for later [`Self::restore`].
    #[must_use]
    pub fn checkpoint(&self) -> EngineCheckpoint {
        EngineCheckpoint {
            time: self.clock.time_state(),
            gravity_enabled: self.gravity_enabled,
            play_speed: self.clock.play_speed(),
            bodies: self.bodies.iter().map(Body::checkpoint).collect(),
        }
    }

    /// Restore a scene captured by [`Self::checkpoint`].
    ///
    /// # Errors
    ///
    /// Returns [`SimError::CheckpointMismatch`] if the checkpoint holds a
    /// different number of bodies, or [`SimError::InvalidBody`] if a body's
    /// state is invalid. On error the engine is left untouched.
    pub fn restore(&mut self, checkpoint: EngineCheckpoint) -> SimResult<()> {
        if checkpoint.bodies.len() != self.bodies.len() {
            return Err(SimError::CheckpointMismatch {
                expected: self.bodies.len(),
                found: checkpoint.bodies.len(),
            });
        }
        if let Some((body, bad)) = self
            .bodies
            .iter()
            .zip(&checkpoint.bodies)
            .find(|(_, c)| !(c.mass.current.is_finite() && c.mass.current > 0.0))
        {
            return Err(SimError::invalid_body(
                body.name(),
                format!("checkpoint mass {} must be positive and finite", bad.mass.current),
            ));
        }

        self.clock.restore_time_state(checkpoint.time);
        self.clock.set_play_speed(checkpoint.play_speed);
        self.gravity_enabled = checkpoint.gravity_enabled;
        for (body, state) in self.bodies.iter_mut().zip(checkpoint.bodies) {
            body.restore(state)?;
        }
        debug!("restored checkpoint at t = {} s", self.clock.simulation_time());
        Ok(())
    }

    /// Integrator view of the current state, for diagnostics.
    #[must_use]
    pub fn model_state(&self) -> ModelState {
        ModelState::new(self.bodies.iter().map(Body::snapshot).collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::orbit::body::BodyType;

    const DAY: f64 = 86_400.0;

    fn engine() -> PhysicsEngine {
        PhysicsEngine::new(DAY, PlaySpeed::Normal, true, false).unwrap()
    }

    fn ball(name: &str, mass: f64, x: f64) -> BodyConfig {
        BodyConfig::new(name, BodyType::Planet, mass, 1.0, Vector2::new(x, 0.0), Vector2::zero())
    }

    #[test]
    fn test_rejects_bad_base_step() {
        assert!(PhysicsEngine::new(0.0, PlaySpeed::Slow, true, false).is_err());
        assert!(PhysicsEngine::new(f64::NAN, PlaySpeed::Slow, true, false).is_err());
    }

    #[test]
    fn test_zero_bodies_is_noop() {
        let mut engine = engine();
        engine.update_force_vectors();
        engine.step(DAY);
        let elapsed = engine.step_model();
        assert!((elapsed - DAY * SMALLEST_TIME_STEP_FRACTION * 4.0).abs() < 1e-6);
        assert_eq!(engine.num_bodies(), 0);
    }

    #[test]
    fn test_add_body_populates_force() {
        let mut engine = engine();
        engine.create_body(&ball("a", 1e20, 0.0)).unwrap();
        let b = engine.create_body(&ball("b", 1e20, 1e6)).unwrap();

        let body = engine.body(b).unwrap();
        assert!(body.force().x < 0.0, "b is pulled toward a");
        assert_eq!(body.position(), Vector2::new(1e6, 0.0));
        assert!(body.acceleration().magnitude() > 0.0);
    }

    #[test]
    fn test_collision_destroys_lighter_body() {
        let mut engine = engine();
        let heavy = engine.create_body(&ball("heavy", 10.0, 0.0)).unwrap();
        let light = engine.create_body(&ball("light", 1.0, 1.5)).unwrap();

        engine.step(1.0);
        assert!(!engine.body(heavy).unwrap().is_collided());
        assert!(engine.body(light).unwrap().is_collided());
    }

    #[test]
    fn test_collision_equal_mass_destroys_lower_index() {
        let mut engine = engine();
        let first = engine.create_body(&ball("first", 5.0, 0.0)).unwrap();
        let second = engine.create_body(&ball("second", 5.0, 1.0)).unwrap();

        assert!(engine.body(first).unwrap().is_collided());
        assert!(!engine.body(second).unwrap().is_collided());
    }

    #[test]
    fn test_collided_body_is_frozen() {
        let mut engine = engine();
        engine.create_body(&ball("heavy", 10.0, 0.0)).unwrap();
        let light = engine.create_body(&ball("light", 1.0, 1.5)).unwrap();
        engine.step(1.0);
        let frozen = engine.body(light).unwrap().position();

        for _ in 0..10 {
            engine.step(1.0);
        }
        let body = engine.body(light).unwrap();
        assert_eq!(body.position(), frozen);
        assert!(body.is_collided());
    }

    #[test]
    fn test_drag_overrides_integrator() {
        let mut engine = engine();
        engine.create_body(&ball("sun", 1e30, 0.0)).unwrap();
        let planet = engine.create_body(&ball("planet", 1e24, 1e11)).unwrap();
        engine.body_mut(planet).unwrap().begin_drag();
        let before = engine.body(planet).unwrap().clone();

        engine.step(DAY);
        let after = engine.body(planet).unwrap();
        assert_eq!(after.position(), before.position());
        assert_eq!(after.velocity(), before.velocity());
        assert!(after.acceleration().magnitude() > 0.0);
        assert!(after.force().magnitude() > 0.0);
    }

    #[test]
    fn test_gravity_toggle_zeroes_acceleration() {
        let mut engine = engine();
        engine.create_body(&ball("a", 1e20, 0.0)).unwrap();
        let b = engine.create_body(&ball("b", 1e20, 1e6)).unwrap();

        engine.set_gravity_enabled(false);
        assert_eq!(engine.body(b).unwrap().acceleration(), Vector2::zero());
        assert_eq!(engine.body(b).unwrap().force(), Vector2::zero());

        engine.set_gravity_enabled(true);
        assert!(engine.body(b).unwrap().acceleration().magnitude() > 0.0);
    }

    #[test]
    fn test_step_model_elapsed_follows_play_speed() {
        let mut engine = engine();
        engine.create_body(&ball("a", 1.0, 0.0)).unwrap();
        let dt = engine.smallest_time_step();

        for speed in [PlaySpeed::Slow, PlaySpeed::Normal, PlaySpeed::Fast] {
            engine.clock_mut().set_play_speed(speed);
            let elapsed = engine.step_model();
            assert!((elapsed - dt * f64::from(speed.sub_steps())).abs() < 1e-9);
        }
    }

    #[test]
    fn test_step_while_paused_ignores_play_speed() {
        let mut engine = engine();
        engine.clock_mut().set_play_speed(PlaySpeed::Fast);
        let elapsed = engine.step_while_paused();
        assert!((elapsed - PAUSED_STEP_SIZE).abs() < f64::EPSILON);
        assert!((engine.clock().simulation_time() - elapsed).abs() < f64::EPSILON);
    }

    #[test]
    fn test_advance_only_while_running() {
        let mut engine = engine();
        engine.create_body(&ball("a", 1.0, 0.0)).unwrap();

        assert!(engine.advance(1.0).abs() < f64::EPSILON);

        engine.clock_mut().set_running(true);
        let elapsed = engine.advance(0.051);
        let expected = 3.0 * engine.smallest_time_step() * 4.0;
        assert!((elapsed - expected).abs() < 1e-6);
    }

    #[test]
    fn test_advance_caps_catch_up_after_stall() {
        let mut engine = engine();
        engine.create_body(&ball("a", 1.0, 0.0)).unwrap();
        engine.clock_mut().set_running(true);

        let elapsed = engine.advance(1.0e18);
        let expected = f64::from(MAX_TICKS_PER_STEP) * engine.smallest_time_step() * 4.0;
        assert!((elapsed - expected).abs() < 1e-6);
        assert_eq!(engine.clock().tick_count(), u64::from(MAX_TICKS_PER_STEP));
    }

    #[test]
    fn test_rewind_returns_to_paused_state() {
        let mut engine = engine();
        engine.create_body(&ball("sun", 1e30, 0.0)).unwrap();
        let planet = engine.create_body(&ball("planet", 1e24, 1e11)).unwrap();
        engine.set_body_velocity(planet, Vector2::new(0.0, 3e4)).unwrap();
        let start = engine.body(planet).unwrap().position();

        engine.clock_mut().set_running(true);
        for _ in 0..10 {
            engine.step_model();
        }
        assert!(engine.any_differs_from_rewind_point());
        assert_ne!(engine.body(planet).unwrap().position(), start);

        engine.clock_mut().set_running(false);
        engine.rewind();
        let body = engine.body(planet).unwrap();
        assert_eq!(body.position(), start);
        assert_eq!(body.velocity(), Vector2::new(0.0, 3e4));
        assert_eq!(body.path_point_count(), 0);
        assert!(engine.clock().simulation_time().abs() < f64::EPSILON);
        assert!(!engine.any_differs_from_rewind_point());
    }

    #[test]
    fn test_direct_step_while_paused_keeps_rewind_point() {
        let mut engine = engine();
        engine.create_body(&ball("sun", 1e30, 0.0)).unwrap();
        let planet = engine.create_body(&ball("planet", 1e24, 1e11)).unwrap();
        engine.set_body_velocity(planet, Vector2::new(0.0, 3e4)).unwrap();
        let start = engine.body(planet).unwrap().position();

        engine.step(DAY);
        assert!(!engine.gate().is_stepping());
        assert_ne!(engine.body(planet).unwrap().position(), start);
        assert!(engine.any_differs_from_rewind_point());

        engine.rewind();
        let body = engine.body(planet).unwrap();
        assert_eq!(body.position(), start);
        assert_eq!(body.velocity(), Vector2::new(0.0, 3e4));
        assert!(!engine.any_differs_from_rewind_point());
    }

    #[test]
    fn test_collision_during_paused_step_is_rewindable() {
        let mut engine = engine();
        engine.create_body(&ball("heavy", 10.0, 0.0)).unwrap();
        let light = engine.create_body(&ball("light", 1.0, 100.0)).unwrap();
        engine.set_gravity_enabled(false);
        engine.set_body_velocity(light, Vector2::new(-1.0, 0.0)).unwrap();

        engine.step(99.0);
        assert!(engine.body(light).unwrap().is_collided());

        engine.rewind();
        let body = engine.body(light).unwrap();
        assert!(!body.is_collided());
        assert_eq!(body.position(), Vector2::new(100.0, 0.0));
    }

    #[test]
    fn test_save_checkpoint_moves_rewind_point() {
        let mut engine = engine();
        engine.create_body(&ball("sun", 1e30, 0.0)).unwrap();
        let planet = engine.create_body(&ball("planet", 1e24, 1e11)).unwrap();

        engine.clock_mut().set_running(true);
        engine.step_model();
        engine.save_checkpoint();
        let saved = engine.body(planet).unwrap().position();
        let saved_time = engine.clock().simulation_time();
        engine.step_model();

        engine.rewind();
        assert_eq!(engine.body(planet).unwrap().position(), saved);
        assert!((engine.clock().simulation_time() - saved_time).abs() < f64::EPSILON);
    }

    #[test]
    fn test_reset_all_restores_scene() {
        let mut engine = engine();
        engine.create_body(&ball("heavy", 10.0, 0.0)).unwrap();
        let light = engine.create_body(&ball("light", 1.0, 100.0)).unwrap();

        engine.set_body_position(light, Vector2::new(1.0, 0.0)).unwrap();
        assert!(engine.body(light).unwrap().is_collided());
        engine.set_gravity_enabled(false);
        engine.clock_mut().set_running(true);
        engine.step_model();

        engine.reset_all();
        assert!(engine.gravity_enabled());
        assert!(!engine.clock().is_running());
        let body = engine.body(light).unwrap();
        assert!(!body.is_collided());
        assert_eq!(body.position(), Vector2::new(100.0, 0.0));
    }

    #[test]
    fn test_get_bodies_is_defensive_copy() {
        let mut engine = engine();
        let a = engine.create_body(&ball("a", 1.0, 0.0)).unwrap();

        let mut copy = engine.get_bodies();
        copy[0].set_position(Vector2::new(9.0, 9.0));
        copy.clear();

        assert_eq!(engine.num_bodies(), 1);
        assert_eq!(engine.body(a).unwrap().position(), Vector2::zero());
    }

    #[test]
    fn test_unknown_body() {
        let mut engine = engine();
        assert!(matches!(engine.body(BodyId(3)), Err(SimError::UnknownBody(3))));
        assert!(engine.set_body_mass(BodyId(0), 1.0).is_err());
        assert_eq!(engine.find_body("nobody"), None);
    }

    #[test]
    fn test_checkpoint_restore() {
        let mut engine = engine();
        engine.create_body(&ball("sun", 1e30, 0.0)).unwrap();
        engine.create_body(&ball("planet", 1e24, 1e11)).unwrap();
        engine.clock_mut().set_running(true);
        engine.step_model();
        let saved = engine.checkpoint();

        engine.step_model();
        engine.set_gravity_enabled(false);
        engine.restore(saved.clone()).unwrap();
        assert_eq!(engine.checkpoint(), saved);
        assert!(engine.gravity_enabled());

        let mut other = self::engine();
        other.create_body(&ball("sun", 1e30, 0.0)).unwrap();
        let err = other.restore(saved).unwrap_err();
        assert!(matches!(err, SimError::CheckpointMismatch { expected: 1, found: 2 }));
    }

    #[test]
    fn test_checkpoint_yaml_round_trip() {
        let mut engine = engine();
        engine.create_body(&ball("a", 1.0, 0.0)).unwrap();
        let saved = engine.checkpoint();

        let yaml = serde_yaml::to_string(&saved).unwrap();
        let parsed: EngineCheckpoint = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed, saved);
    }
}
