//! Simulation clock.
//!
//! Holds the rewindable simulation time, the scene's base sub-step size and
//! the current play speed, and converts arbitrary elapsed wall time into a
//! whole number of fixed-rate ticks. How many integrator sub-steps a tick
//! expands into is decided by the engine from [`PlaySpeed::sub_steps`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::engine::rewind::{RewindGate, RewindableState, RewindableValue};
use crate::error::SimError;

/// Ticks per second of wall time delivered by the event timer.
pub const FRAMES_PER_SECOND: f64 = 60.0;

/// Most ticks a single timer step delivers; wall time past it is dropped.
pub const MAX_TICKS_PER_STEP: u32 = 10;

/// Size of a single step taken while paused (s), the same for every scene
/// and play speed.
pub const PAUSED_STEP_SIZE: f64 = 1.0 / FRAMES_PER_SECOND;

/// User-selectable simulation speed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaySpeed {
    /// One sub-step per tick.
    Slow,
    /// Four sub-steps per tick.
    #[default]
    Normal,
    /// Seven sub-steps per tick.
    Fast,
}

impl PlaySpeed {
    /// Number of fixed integrator sub-steps per visible tick.
    #[must_use]
    pub const fn sub_steps(self) -> u32 {
        match self {
            Self::Slow => 1,
            Self::Normal => 4,
            Self::Fast => 7,
        }
    }
}

impl fmt::Display for PlaySpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Slow => "slow",
            Self::Normal => "normal",
            Self::Fast => "fast",
        };
        f.write_str(name)
    }
}

impl FromStr for PlaySpeed {
    type Err = SimError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(Self::Slow),
            "normal" => Ok(Self::Normal),
            "fast" => Ok(Self::Fast),
            _ => Err(SimError::UnknownPlaySpeed(s.to_string())),
        }
    }
}

/// Fixed-rate event timer.
///
/// Accumulates elapsed wall time and reports how many whole periods have
/// passed; the remainder carries over to the next call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventTimer {
    period: f64,
    accumulated: f64,
}

impl EventTimer {
    /// Create a timer firing `rate` times per second.
    #[must_use]
    pub fn new(rate: f64) -> Self {
        Self {
            period: 1.0 / rate,
            accumulated: 0.0,
        }
    }

    /// Seconds between events.
    #[must_use]
    pub const fn period(&self) -> f64 {
        self.period
    }

    /// Wall time carried over from previous calls.
    #[must_use]
    pub const fn accumulated(&self) -> f64 {
        self.accumulated
    }

    /// Feed elapsed wall time; returns the number of events that fire,
    /// at most [`MAX_TICKS_PER_STEP`]. Time beyond the cap is dropped.
    ///
    /// Negative or non-finite input is ignored.
    pub fn step(&mut self, wall_dt: f64) -> u32 {
        if !wall_dt.is_finite() || wall_dt <= 0.0 {
            return 0;
        }
        self.accumulated += wall_dt;
        if self.accumulated >= self.period * f64::from(MAX_TICKS_PER_STEP) {
            self.accumulated = 0.0;
            return MAX_TICKS_PER_STEP;
        }
        let fired = (self.accumulated / self.period).floor();
        self.accumulated = (self.accumulated - fired * self.period).max(0.0);
        fired as u32
    }

    /// Drop any carried-over time.
    pub fn clear(&mut self) {
        self.accumulated = 0.0;
    }
}

impl Default for EventTimer {
    fn default() -> Self {
        Self::new(FRAMES_PER_SECOND)
    }
}

/// Simulation clock for one scene.
#[derive(Debug, Clone)]
pub struct OrbitClock {
    /// Simulated seconds since the start of the run.
    time: RewindableValue<f64>,
    /// Scene base sub-step size in simulated seconds.
    base_time_step: f64,
    play_speed: PlaySpeed,
    default_play_speed: PlaySpeed,
    timer: EventTimer,
    /// Ticks delivered so far.
    tick_count: u64,
    gate: RewindGate,
}

impl OrbitClock {
    /// Create a paused clock at time zero.
    #[must_use]
    pub fn new(base_time_step: f64, play_speed: PlaySpeed, gate: &RewindGate) -> Self {
        Self {
            time: RewindableValue::new(0.0, gate),
            base_time_step,
            play_speed,
            default_play_speed: play_speed,
            timer: EventTimer::default(),
            tick_count: 0,
            gate: gate.clone(),
        }
    }

    /// Base sub-step size in simulated seconds.
    #[must_use]
    pub const fn base_time_step(&self) -> f64 {
        self.base_time_step
    }

    /// Current play speed.
    #[must_use]
    pub const fn play_speed(&self) -> PlaySpeed {
        self.play_speed
    }

    /// Change the play speed.
    pub fn set_play_speed(&mut self, speed: PlaySpeed) {
        self.play_speed = speed;
    }

    /// Whether the clock is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.gate.is_playing()
    }

    /// Start or pause the clock.
    pub fn set_running(&mut self, running: bool) {
        self.gate.set_playing(running);
    }

    /// Current simulation time in seconds.
    #[must_use]
    pub fn simulation_time(&self) -> f64 {
        self.time.value()
    }

    /// Overwrite the simulation time.
    pub fn set_simulation_time(&mut self, time: f64) {
        self.time.set(time);
    }

    /// Return the simulation time to its construction value.
    pub fn reset_simulation_time(&mut self) {
        self.time.reset();
    }

    /// Add elapsed simulated seconds.
    pub fn advance_time(&mut self, elapsed: f64) {
        self.time.set(self.time.value() + elapsed);
    }

    /// Ticks delivered so far.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// Feed elapsed wall time; returns the ticks to simulate. A paused clock
    /// yields none and keeps no backlog.
    pub fn step(&mut self, wall_dt: f64) -> u32 {
        if !self.is_running() {
            self.timer.clear();
            return 0;
        }
        let ticks = self.timer.step(wall_dt);
        self.tick_count += u64::from(ticks);
        ticks
    }

    /// Deliver exactly one tick of [`PAUSED_STEP_SIZE`], independent of
    /// accumulated wall time and play speed. Returns the sub-step size.
    pub fn step_while_paused(&mut self) -> f64 {
        self.tick_count += 1;
        PAUSED_STEP_SIZE
    }

    /// Rewind simulation time to its rewind point.
    pub fn rewind_time(&mut self) {
        self.time.rewind();
    }

    /// Capture the current time as the rewind point.
    pub fn store_checkpoint_silently(&mut self) {
        self.time.store_checkpoint_silently();
    }

    /// Pause, zero the time and restore the scene's default speed.
    pub fn reset(&mut self) {
        self.set_running(false);
        self.time.reset();
        self.play_speed = self.default_play_speed;
        self.timer.clear();
        self.tick_count = 0;
    }

    /// Serializable time state.
    #[must_use]
    pub fn time_state(&self) -> RewindableState<f64> {
        self.time.to_state()
    }

    /// Restore time state captured by [`Self::time_state`].
    pub fn restore_time_state(&mut self, state: RewindableState<f64>) {
        self.time.restore_state(state);
    }
}
