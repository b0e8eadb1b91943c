//! # gravity-orbits
//!
//! Deterministic N-body gravitational core for interactive star, planet,
//! moon and satellite simulations.
//!
//! - 4th-order PEFRL symplectic integration with a coasting mode when
//!   gravity is switched off
//! - Rewindable body state: drag bodies while paused, run, then rewind to
//!   the last paused configuration
//! - Pairwise collision detection and resolution after each sub-step
//! - A fixed-step clock that maps play speed to a whole number of sub-steps
//!   so runs are reproducible for a given speed setting
//!
//! ## Example
//!
//! ```rust
//! use gravity_orbits::prelude::*;
//!
//! let mut engine = SceneKind::SunEarth.build_engine().expect("valid preset");
//! engine.clock_mut().set_running(true);
//! let elapsed = engine.step_model();
//! assert!(elapsed > 0.0);
//! ```

#![forbid(unsafe_code)]
#![deny(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::module_name_repetitions,
    clippy::similar_names,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::suboptimal_flops,  // Operation order is part of the reproducibility contract
    clippy::imprecise_flops,
    clippy::too_many_lines,
    clippy::missing_const_for_fn,  // Many functions can't be const in stable Rust
    clippy::needless_range_loop,   // Pairwise loops read clearer with indices
)]

pub mod config;
pub mod engine;
pub mod error;
pub mod orbit;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::{SceneConfig, SceneConfigBuilder};
    pub use crate::engine::clock::{EventTimer, OrbitClock, PlaySpeed};
    pub use crate::engine::rewind::{RewindGate, RewindableValue};
    pub use crate::engine::{EngineCheckpoint, PhysicsEngine};
    pub use crate::error::{SimError, SimResult};
    pub use crate::orbit::body::{Body, BodyCheckpoint, BodyConfig, BodyId, BodyType};
    pub use crate::orbit::physics::{BodySnapshot, IntegrationOptions, ModelState};
    pub use crate::orbit::scenarios::SceneKind;
    pub use crate::orbit::units::Vector2;
}

/// Re-export for public API
pub use error::{SimError, SimResult};
