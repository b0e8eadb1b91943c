//! Rewind checkpoints for stateful fields.
//!
//! Every rewindable field carries a second copy of its value, the rewind
//! point. Whenever the field is set while the simulation is idle (not
//! playing, not inside a step, not mid-rewind) the rewind point follows the
//! new value, so a body dragged while paused immediately becomes the state
//! that "rewind" returns to. While the simulation plays, sets leave the
//! rewind point alone.
//!
//! The idle predicate lives in a shared [`RewindGate`] and is read at every
//! `set`, never cached.

use serde::{Deserialize, Serialize};
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Default)]
struct GateFlags {
    playing: Cell<bool>,
    stepping: Cell<bool>,
    rewinding: Cell<bool>,
}

/// Shared simulation-phase flags deciding when rewind points are captured.
///
/// Cloning yields another handle to the same flags. The core is
/// single-threaded, so the handle is deliberately `!Send`.
#[derive(Debug, Clone, Default)]
pub struct RewindGate {
    flags: Rc<GateFlags>,
}

impl RewindGate {
    /// Create a gate with every flag cleared (idle).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a `set` right now should also move the rewind point.
    #[must_use]
    pub fn should_capture(&self) -> bool {
        !self.flags.playing.get() && !self.flags.stepping.get() && !self.flags.rewinding.get()
    }

    /// Whether the simulation is playing.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.flags.playing.get()
    }

    /// Set the playing flag.
    pub fn set_playing(&self, playing: bool) {
        self.flags.playing.set(playing);
    }

    /// Whether a model step is in progress.
    #[must_use]
    pub fn is_stepping(&self) -> bool {
        self.flags.stepping.get()
    }

    /// Whether a rewind is in progress.
    #[must_use]
    pub fn is_rewinding(&self) -> bool {
        self.flags.rewinding.get()
    }

    /// Raise the stepping flag until the returned guard drops.
    #[must_use = "the flag is lowered when the guard drops"]
    pub fn stepping(&self) -> PhaseGuard {
        PhaseGuard::raise(self, Phase::Stepping)
    }

    /// Raise the rewinding flag until the returned guard drops.
    #[must_use = "the flag is lowered when the guard drops"]
    pub fn rewinding(&self) -> PhaseGuard {
        PhaseGuard::raise(self, Phase::Rewinding)
    }

    /// Whether two handles share the same flags.
    #[must_use]
    pub fn same_gate(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.flags, &other.flags)
    }

    fn cell(&self, phase: Phase) -> &Cell<bool> {
        match phase {
            Phase::Stepping => &self.flags.stepping,
            Phase::Rewinding => &self.flags.rewinding,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Phase {
    Stepping,
    Rewinding,
}

/// Scoped phase flag; restores the previous flag value on drop so nested
/// phases compose.
#[derive(Debug)]
pub struct PhaseGuard {
    gate: RewindGate,
    phase: Phase,
    previous: bool,
}

impl PhaseGuard {
    fn raise(gate: &RewindGate, phase: Phase) -> Self {
        let previous = gate.cell(phase).replace(true);
        Self {
            gate: gate.clone(),
            phase,
            previous,
        }
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        self.gate.cell(self.phase).set(self.previous);
    }
}

/// Serializable pair of current value and rewind point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewindableState<T> {
    /// Current value.
    pub current: T,
    /// Value restored by `rewind`.
    pub rewind_point: T,
}

/// A value with a rewind point and a construction-time initial value.
#[derive(Debug, Clone)]
pub struct RewindableValue<T> {
    initial: T,
    current: T,
    rewind_point: T,
    gate: RewindGate,
}

impl<T: Clone + PartialEq> RewindableValue<T> {
    /// Create a value whose current value, rewind point and reset value are
    /// all `value`.
    #[must_use]
    pub fn new(value: T, gate: &RewindGate) -> Self {
        Self {
            initial: value.clone(),
            current: value.clone(),
            rewind_point: value,
            gate: gate.clone(),
        }
    }

    /// Current value.
    #[must_use]
    pub fn get(&self) -> &T {
        &self.current
    }

    /// Last captured rewind point.
    #[must_use]
    pub fn rewind_point(&self) -> &T {
        &self.rewind_point
    }

    /// Construction-time value.
    #[must_use]
    pub fn initial(&self) -> &T {
        &self.initial
    }

    /// Update the current value, capturing a new rewind point if the gate
    /// is idle.
    pub fn set(&mut self, value: T) {
        self.current = value;
        if self.gate.should_capture() {
            self.rewind_point = self.current.clone();
        }
    }

    /// Copy the current value into the rewind point unconditionally.
    pub fn store_checkpoint_silently(&mut self) {
        self.rewind_point = self.current.clone();
    }

    /// Restore the current value from the rewind point.
    pub fn rewind(&mut self) {
        self.current = self.rewind_point.clone();
    }

    /// Restore current value and rewind point to the construction value.
    pub fn reset(&mut self) {
        self.current = self.initial.clone();
        self.rewind_point = self.initial.clone();
    }

    /// Whether the current value differs (by value) from the rewind point.
    #[must_use]
    pub fn differs_from_rewind_point(&self) -> bool {
        self.current != self.rewind_point
    }

    /// Point this value at another gate.
    pub fn bind_gate(&mut self, gate: &RewindGate) {
        self.gate = gate.clone();
    }

    /// Snapshot current value and rewind point.
    #[must_use]
    pub fn to_state(&self) -> RewindableState<T> {
        RewindableState {
            current: self.current.clone(),
            rewind_point: self.rewind_point.clone(),
        }
    }

    /// Restore current value and rewind point without consulting the gate.
    pub fn restore_state(&mut self, state: RewindableState<T>) {
        self.current = state.current;
        self.rewind_point = state.rewind_point;
    }
}

impl<T: Copy + PartialEq> RewindableValue<T> {
    /// Current value by copy.
    #[must_use]
    pub fn value(&self) -> T {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::units::Vector2;

    #[test]
    fn test_set_while_idle_captures() {
        let gate = RewindGate::new();
        let mut value = RewindableValue::new(1.0, &gate);

        value.set(2.0);
        assert_eq!(value.value(), 2.0);
        assert_eq!(*value.rewind_point(), 2.0);
        assert!(!value.differs_from_rewind_point());
    }

    #[test]
    fn test_set_while_playing_does_not_capture() {
        let gate = RewindGate::new();
        let mut value = RewindableValue::new(1.0, &gate);

        gate.set_playing(true);
        value.set(5.0);
        assert_eq!(*value.rewind_point(), 1.0);
        assert!(value.differs_from_rewind_point());

        value.rewind();
        assert_eq!(value.value(), 1.0);
    }

    #[test]
    fn test_predicate_read_fresh_each_set() {
        let gate = RewindGate::new();
        let mut value = RewindableValue::new(0.0, &gate);

        gate.set_playing(true);
        value.set(1.0);
        gate.set_playing(false);
        value.set(2.0);
        assert_eq!(*value.rewind_point(), 2.0);
    }

    #[test]
    fn test_stepping_guard_blocks_capture() {
        let gate = RewindGate::new();
        let mut value = RewindableValue::new(0.0, &gate);

        {
            let _stepping = gate.stepping();
            assert!(gate.is_stepping());
            value.set(3.0);
        }
        assert!(!gate.is_stepping());
        assert_eq!(*value.rewind_point(), 0.0);
    }

    #[test]
    fn test_nested_guards_restore_previous() {
        let gate = RewindGate::new();
        let outer = gate.rewinding();
        {
            let _inner = gate.rewinding();
            assert!(gate.is_rewinding());
        }
        assert!(gate.is_rewinding());
        drop(outer);
        assert!(!gate.is_rewinding());
        assert!(gate.should_capture());
    }

    #[test]
    fn test_store_checkpoint_silently() {
        let gate = RewindGate::new();
        let mut value = RewindableValue::new(0.0, &gate);

        gate.set_playing(true);
        value.set(7.0);
        value.store_checkpoint_silently();
        assert_eq!(*value.rewind_point(), 7.0);
    }

    #[test]
    fn test_reset_restores_initial() {
        let gate = RewindGate::new();
        let mut value = RewindableValue::new(1.0, &gate);

        value.set(4.0);
        value.reset();
        assert_eq!(value.value(), 1.0);
        assert_eq!(*value.rewind_point(), 1.0);
        assert_eq!(*value.initial(), 1.0);
    }

    #[test]
    fn test_vector_value_equality() {
        let gate = RewindGate::new();
        let mut value = RewindableValue::new(Vector2::new(1.0, 2.0), &gate);

        gate.set_playing(true);
        value.set(Vector2::new(1.0, 2.0));
        assert!(!value.differs_from_rewind_point());
    }

    #[test]
    fn test_state_round_trip_ignores_gate() {
        let gate = RewindGate::new();
        let mut value = RewindableValue::new(1.0, &gate);
        let state = RewindableState {
            current: 3.0,
            rewind_point: 2.0,
        };

        value.restore_state(state.clone());
        assert_eq!(value.to_state(), state);
    }

    #[test]
    fn test_bind_gate() {
        let first = RewindGate::new();
        let second = RewindGate::new();
        let mut value = RewindableValue::new(0.0, &first);

        value.bind_gate(&second);
        second.set_playing(true);
        value.set(1.0);
        assert_eq!(*value.rewind_point(), 0.0);
        assert!(!first.same_gate(&second));
    }
}
