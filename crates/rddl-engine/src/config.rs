//! Stepper configuration, validation, and construction errors.

use std::error::Error;
use std::fmt;

use rddl_core::{EvalError, ValidationErrors};
use rddl_model::InstanceConfig;

// ── StepperConfig ──────────────────────────────────────────────────

/// Engine knobs layered over the instance's own settings.
#[derive(Clone, Debug, PartialEq)]
pub struct StepperConfig {
    /// Run for this many epochs instead of the instance horizon.
    pub horizon: Option<u32>,
    /// Check state invariants on the initial state and after every
    /// transition. Default: true.
    pub enforce_invariants: bool,
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            horizon: None,
            enforce_invariants: true,
        }
    }
}

impl StepperConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.horizon == Some(0) {
            return Err(ConfigError::InvalidHorizon { value: 0 });
        }
        Ok(())
    }

    /// The horizon to run for: the override if set, else the instance's.
    pub fn resolved_horizon(&self, instance: &InstanceConfig) -> u32 {
        self.horizon.unwrap_or(instance.horizon)
    }
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected while constructing a [`Stepper`](crate::Stepper).
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// The domain, non-fluents and instance did not compile.
    Model(ValidationErrors),
    /// Horizon override is zero.
    InvalidHorizon {
        /// The rejected value.
        value: u32,
    },
    /// The initial state violates a state invariant.
    InitialInvariantViolated {
        /// Index into the model's invariants.
        index: usize,
    },
    /// A state invariant could not be evaluated on the initial state.
    InitialInvariantFailed(EvalError),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Model(e) => write!(f, "model: {e}"),
            Self::InvalidHorizon { value } => {
                write!(f, "horizon override must be at least 1, got {value}")
            }
            Self::InitialInvariantViolated { index } => {
                write!(f, "initial state violates state invariant #{index}")
            }
            Self::InitialInvariantFailed(e) => {
                write!(f, "evaluating state invariants on the initial state: {e}")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Model(e) => Some(e),
            Self::InitialInvariantFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ValidationErrors> for ConfigError {
    fn from(e: ValidationErrors) -> Self {
        Self::Model(e)
    }
}
