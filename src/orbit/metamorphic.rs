//! Metamorphic testing for orbital physics invariants.
//!
//! Per Chen et al. [1], metamorphic testing verifies **relations** rather
//! than specific outputs. For an N-body run the exact trajectory is
//! unknown, but how it must change under a transformation of the input is.
//!
//! # Metamorphic Relations
//!
//! 1. **Rotation Invariance**: rotating the whole system preserves pairwise distances
//! 2. **Time-Reversal Symmetry**: PEFRL is a palindromic composition, so
//!    reversing velocities and stepping back returns to the start
//! 3. **Energy Conservation**: total energy oscillates without secular drift
//! 4. **Angular Momentum Conservation**: pairwise central forces conserve it
//! 5. **Deterministic Replay**: identical input gives bit-identical output
//! 6. **Coasting Linearity**: with gravity off every body moves in a straight line
//!
//! # References
//!
//! [1] Chen et al., "Metamorphic testing: a new approach," Hong Kong UST, 1998.

use crate::orbit::physics::{BodySnapshot, IntegrationOptions, ModelState};

const ROTATION_INVARIANCE: &str = "Rotation Invariance";
const TIME_REVERSAL: &str = "Time-Reversal Symmetry";
const ENERGY_CONSERVATION: &str = "Energy Conservation";
const ANGULAR_MOMENTUM: &str = "Angular Momentum Conservation";
const DETERMINISTIC_REPLAY: &str = "Deterministic Replay";
const COASTING_LINEARITY: &str = "Coasting Linearity";

/// Metamorphic check result.
#[derive(Debug, Clone)]
pub struct MetamorphicResult {
    /// Name of the relation checked.
    pub relation: String,
    /// Whether the relation holds within tolerance.
    pub passed: bool,
    /// Measured error/deviation.
    pub error: f64,
    /// Tolerance used.
    pub tolerance: f64,
    /// Additional details.
    pub details: String,
}

impl MetamorphicResult {
    /// Passing or failing result depending on `error <= tolerance`.
    #[must_use]
    pub fn judge(
        relation: &str,
        error: f64,
        tolerance: f64,
        details: impl FnOnce() -> String,
    ) -> Self {
        let passed = error <= tolerance;
        Self {
            relation: relation.to_string(),
            passed,
            error,
            tolerance,
            details: if passed { String::new() } else { details() },
        }
    }
}

/// Relative error, or absolute error against a zero reference.
fn relative_error(reference: f64, measured: f64) -> f64 {
    let diff = (measured - reference).abs();
    if reference.abs() > f64::EPSILON {
        diff / reference.abs()
    } else {
        diff
    }
}

/// `error` relative to `scale`, or absolute when the scale is zero.
fn scaled(error: f64, scale: f64) -> f64 {
    if scale > f64::EPSILON {
        error / scale
    } else {
        error
    }
}

fn run(state: &ModelState, steps: usize, dt: f64, options: IntegrationOptions) -> ModelState {
    let mut state = state.clone();
    for _ in 0..steps {
        state.advance(dt, options);
    }
    state
}

fn pairwise_distances(state: &ModelState) -> Vec<f64> {
    let bodies = state.bodies();
    let n = bodies.len();
    let mut distances = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            distances.push(bodies[i].position.distance(&bodies[j].position));
        }
    }
    distances
}

fn map_bodies(state: &ModelState, f: impl Fn(&BodySnapshot) -> BodySnapshot) -> ModelState {
    ModelState::new(state.bodies().iter().map(f).collect())
}

fn rotate_state(state: &ModelState, angle: f64) -> ModelState {
    map_bodies(state, |b| BodySnapshot {
        position: b.position.rotated(angle),
        velocity: b.velocity.rotated(angle),
        ..*b
    })
}

fn reverse_velocities(state: &ModelState) -> ModelState {
    map_bodies(state, |b| BodySnapshot {
        velocity: -b.velocity,
        ..*b
    })
}

/// MR-1: Rotation Invariance.
///
/// Rotating the entire system must not change the evolution of pairwise
/// distances.
#[must_use]
pub fn check_rotation_invariance(
    initial: &ModelState,
    steps: usize,
    dt: f64,
    tolerance: f64,
) -> MetamorphicResult {
    let angle = std::f64::consts::FRAC_PI_4;
    let options = IntegrationOptions::gravity();

    let original = run(initial, steps, dt, options);
    let rotated = run(&rotate_state(initial, angle), steps, dt, options);

    let max_error = pairwise_distances(&original)
        .iter()
        .zip(pairwise_distances(&rotated))
        .map(|(d1, d2)| relative_error(*d1, d2))
        .fold(0.0_f64, f64::max);

    MetamorphicResult::judge(ROTATION_INVARIANCE, max_error, tolerance, || {
        format!("Max distance error: {max_error:.2e}")
    })
}

/// MR-2: Time-Reversal Symmetry.
///
/// Running forward N steps, reversing every velocity and running N more
/// steps must return to the initial state with reversed velocities.
#[must_use]
pub fn check_time_reversal(
    initial: &ModelState,
    steps: usize,
    dt: f64,
    tolerance: f64,
) -> MetamorphicResult {
    let options = IntegrationOptions::gravity();
    let forward = run(initial, steps, dt, options);
    let back = reverse_velocities(&run(&reverse_velocities(&forward), steps, dt, options));

    let mut max_pos_error = 0.0_f64;
    let mut max_vel_error = 0.0_f64;
    for (start, end) in initial.bodies().iter().zip(back.bodies()) {
        let pos_error = start.position.distance(&end.position);
        max_pos_error = max_pos_error.max(scaled(pos_error, start.position.magnitude()));

        let vel_error = start.velocity.distance(&end.velocity);
        max_vel_error = max_vel_error.max(scaled(vel_error, start.velocity.magnitude()));
    }

    let max_error = max_pos_error.max(max_vel_error);
    MetamorphicResult::judge(TIME_REVERSAL, max_error, tolerance, || {
        format!("Pos error: {max_pos_error:.2e}, Vel error: {max_vel_error:.2e}")
    })
}

/// MR-3: Energy Conservation.
///
/// Relative energy error stays bounded at every step.
#[must_use]
pub fn check_energy_conservation(
    initial: &ModelState,
    steps: usize,
    dt: f64,
    tolerance: f64,
) -> MetamorphicResult {
    let options = IntegrationOptions::gravity();
    let initial_energy = initial.total_energy();
    let mut state = initial.clone();
    let mut max_error = 0.0_f64;

    for _ in 0..steps {
        state.advance(dt, options);
        max_error = max_error.max(relative_error(initial_energy, state.total_energy()));
    }

    MetamorphicResult::judge(ENERGY_CONSERVATION, max_error, tolerance, || {
        format!("Max energy drift: {max_error:.2e}")
    })
}

/// MR-4: Angular Momentum Conservation.
#[must_use]
pub fn check_angular_momentum_conservation(
    initial: &ModelState,
    steps: usize,
    dt: f64,
    tolerance: f64,
) -> MetamorphicResult {
    let options = IntegrationOptions::gravity();
    let initial_l = initial.angular_momentum();
    let mut state = initial.clone();
    let mut max_error = 0.0_f64;

    for _ in 0..steps {
        state.advance(dt, options);
        max_error = max_error.max(relative_error(initial_l, state.angular_momentum()));
    }

    MetamorphicResult::judge(ANGULAR_MOMENTUM, max_error, tolerance, || {
        format!("Max L drift: {max_error:.2e}")
    })
}

/// MR-5: Deterministic Replay.
///
/// Two runs from the same state must agree bit for bit.
#[must_use]
pub fn check_deterministic_replay(
    initial: &ModelState,
    steps: usize,
    dt: f64,
) -> MetamorphicResult {
    let options = IntegrationOptions::gravity();
    let first = run(initial, steps, dt, options);
    let second = run(initial, steps, dt, options);

    let identical = first.bodies() == second.bodies();
    let error = if identical { 0.0 } else { 1.0 };
    MetamorphicResult::judge(DETERMINISTIC_REPLAY, error, 0.0, || {
        "Results not bit-identical".to_string()
    })
}

/// MR-6: Coasting Linearity.
///
/// With gravity off, N steps of `dt` land every body at `p0 + v·N·dt`
/// with zero acceleration.
#[must_use]
pub fn check_coasting_linearity(
    initial: &ModelState,
    steps: usize,
    dt: f64,
    tolerance: f64,
) -> MetamorphicResult {
    let coasted = run(initial, steps, dt, IntegrationOptions::coasting());
    let elapsed = dt * steps as f64;

    let mut max_error = 0.0_f64;
    for (start, end) in initial.bodies().iter().zip(coasted.bodies()) {
        let expected = start.position + start.velocity * elapsed;
        let scale = expected.magnitude().max(1.0);
        max_error = max_error
            .max(expected.distance(&end.position) / scale)
            .max(end.acceleration.magnitude());
    }

    MetamorphicResult::judge(COASTING_LINEARITY, max_error, tolerance, || {
        format!("Max straight-line deviation: {max_error:.2e}")
    })
}

/// Run every relation on a state.
#[must_use]
pub fn run_all_metamorphic_checks(
    state: &ModelState,
    steps: usize,
    dt: f64,
) -> Vec<MetamorphicResult> {
    vec![
        check_rotation_invariance(state, steps, dt, 1e-10),
        check_time_reversal(state, steps, dt, 1e-6),
        check_energy_conservation(state, steps, dt, 1e-9),
        check_angular_momentum_conservation(state, steps, dt, 1e-12),
        check_deterministic_replay(state, steps, dt),
        check_coasting_linearity(state, steps, dt, 1e-12),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orbit::scenarios::SceneKind;

    const HOUR: f64 = 3600.0;

    /// Sun and Earth, both free.
    fn earth_sun_state() -> ModelState {
        let config = SceneKind::SunEarth.config();
        ModelState::new(config.bodies.iter().map(BodySnapshot::from).collect())
    }

    #[test]
    fn test_judge() {
        let result = MetamorphicResult::judge("Test", 1e-10, 1e-9, || "unused".to_string());
        assert!(result.passed);
        assert!(result.details.is_empty());

        let result = MetamorphicResult::judge("Test", 1e-5, 1e-9, || "Too large".to_string());
        assert!(!result.passed);
        assert_eq!(result.details, "Too large");
    }

    #[test]
    fn test_pairwise_distances() {
        let state = earth_sun_state();
        let distances = pairwise_distances(&state);
        assert_eq!(distances.len(), 1);
        assert!((distances[0] - 1.470_982_9e11).abs() < 1.0);
        assert!(pairwise_distances(&ModelState::default()).is_empty());
    }

    #[test]
    fn test_rotate_state() {
        let state = earth_sun_state();
        let rotated = rotate_state(&state, std::f64::consts::FRAC_PI_2);

        let earth = rotated.bodies()[1];
        let original = state.bodies()[1];
        assert!(earth.position.x.abs() < original.position.x * 1e-12);
        assert!((earth.position.y - original.position.x).abs() < 1.0);
        assert!((earth.velocity.x + original.velocity.y).abs() < 1e-9);
    }

    #[test]
    fn test_reverse_velocities() {
        let state = earth_sun_state();
        let reversed = reverse_velocities(&state);
        assert_eq!(reversed.bodies()[1].velocity, -state.bodies()[1].velocity);
        assert_eq!(reversed.bodies()[1].position, state.bodies()[1].position);
    }

    #[test]
    fn test_mr_rotation_invariance() {
        let result = check_rotation_invariance(&earth_sun_state(), 100, HOUR, 1e-8);
        assert!(result.passed, "Rotation invariance failed: {result:?}");
    }

    #[test]
    fn test_mr_time_reversal() {
        let result = check_time_reversal(&earth_sun_state(), 50, HOUR, 1e-4);
        assert!(result.passed, "Time-reversal failed: {result:?}");
    }

    #[test]
    fn test_mr_energy_conservation() {
        let result = check_energy_conservation(&earth_sun_state(), 100, HOUR, 1e-9);
        assert!(result.passed, "Energy conservation failed: {result:?}");
    }

    #[test]
    fn test_mr_angular_momentum_conservation() {
        let result = check_angular_momentum_conservation(&earth_sun_state(), 100, HOUR, 1e-12);
        assert!(result.passed, "Angular momentum conservation failed: {result:?}");
    }

    #[test]
    fn test_mr_deterministic_replay() {
        let result = check_deterministic_replay(&earth_sun_state(), 100, HOUR);
        assert!(result.passed, "Deterministic replay failed: {result:?}");
    }

    #[test]
    fn test_mr_coasting_linearity() {
        let result = check_coasting_linearity(&earth_sun_state(), 100, HOUR, 1e-12);
        assert!(result.passed, "Coasting linearity failed: {result:?}");
    }

    #[test]
    fn test_run_all_metamorphic_checks() {
        let results = run_all_metamorphic_checks(&earth_sun_state(), 50, HOUR);
        assert_eq!(results.len(), 6);
        for result in &results {
            assert!(result.passed, "{}: {result:?}", result.relation);
        }
    }

    #[test]
    fn test_mr_energy_over_scene_time_step() {
        // One year at the sun scenes' sub-step size.
        let dt = SceneKind::SunEarth.base_time_step() * crate::engine::SMALLEST_TIME_STEP_FRACTION;
        let steps = (365.25 * 86_400.0 / dt) as usize;
        let result = check_energy_conservation(&earth_sun_state(), steps, dt, 1e-8);
        assert!(result.passed, "Energy over one year: {result:?}");
    }

    #[test]
    fn test_three_body_relations() {
        let config = SceneKind::SunEarthMoon.config();
        let state = ModelState::new(config.bodies.iter().map(BodySnapshot::from).collect());
        let result = check_angular_momentum_conservation(&state, 200, HOUR, 1e-11);
        assert!(result.passed, "Three-body angular momentum: {result:?}");
        let result = check_energy_conservation(&state, 200, HOUR, 1e-8);
        assert!(result.passed, "Three-body energy: {result:?}");
    }
}
