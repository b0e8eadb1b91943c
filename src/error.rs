//! Error types for gravity-orbits.
//!
//! The numerical core has almost no failure modes: coincident bodies,
//! escaping bodies and runaway masses are valid outcomes, not errors.
//! What remains are construction preconditions, configuration loading and
//! lookups that cross the API boundary.

use thiserror::Error;

/// Result type alias for gravity-orbits operations.
pub type SimResult<T> = Result<T, SimError>;

/// Unified error type for all gravity-orbits operations.
#[derive(Debug, Error)]
pub enum SimError {
    // ===== Construction Errors =====
    /// Body configuration violates a construction precondition.
    #[error("Invalid body '{name}': {reason}")]
    InvalidBody {
        /// Name of the offending body.
        name: String,
        /// Which precondition failed.
        reason: String,
    },

    /// Text did not name a known play speed.
    #[error("Unknown play speed '{0}' (expected slow, normal or fast)")]
    UnknownPlaySpeed(String),

    /// Body handle does not index the engine's body list.
    #[error("Unknown body handle {0}")]
    UnknownBody(usize),

    // ===== Configuration Errors =====
    /// Invalid configuration parameter.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    /// Validation error.
    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Checkpoint Errors =====
    /// Checkpoint was taken from an engine with a different body list.
    #[error("Checkpoint holds {found} bodies, engine has {expected}")]
    CheckpointMismatch {
        /// Number of bodies in the engine.
        expected: usize,
        /// Number of bodies in the checkpoint.
        found: usize,
    },
}

impl SimError {
    /// Create a configuration error with a message.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an invalid-body error.
    #[must_use]
    pub fn invalid_body(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidBody {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error comes from a construction precondition.
    #[must_use]
    pub const fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Self::InvalidBody { .. } | Self::UnknownPlaySpeed(_) | Self::UnknownBody(_)
        )
    }
}
