//! Instance-level scalar settings and their validation.

use std::error::Error;
use std::fmt;

use rddl_lang::{Instance, MaxActions};

// ── InstanceConfigError ────────────────────────────────────────────

/// Errors detected while reading an instance's scalar settings.
#[derive(Clone, Debug, PartialEq)]
pub enum InstanceConfigError {
    /// The instance has no `horizon`.
    MissingHorizon,
    /// `horizon` is below 1 or does not fit in `u32`.
    InvalidHorizon {
        /// The configured value.
        value: i64,
    },
    /// `discount` is NaN or outside `[0, 1]`.
    InvalidDiscount {
        /// The configured value.
        value: f64,
    },
    /// `max-nondef-actions` is negative or does not fit in `u32`.
    InvalidMaxActions {
        /// The configured value.
        value: i64,
    },
}

impl fmt::Display for InstanceConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHorizon => write!(f, "instance has no horizon"),
            Self::InvalidHorizon { value } => {
                write!(f, "horizon must be at least 1, got {value}")
            }
            Self::InvalidDiscount { value } => {
                write!(f, "discount must be in [0, 1], got {value}")
            }
            Self::InvalidMaxActions { value } => {
                write!(f, "max-nondef-actions must be non-negative, got {value}")
            }
        }
    }
}

impl Error for InstanceConfigError {}

// ── InstanceConfig ─────────────────────────────────────────────────

/// Validated `horizon`, `discount` and `max-nondef-actions`.
#[derive(Clone, Debug, PartialEq)]
pub struct InstanceConfig {
    /// Number of decision epochs before termination. At least 1.
    pub horizon: u32,
    /// Per-epoch reward discount in `[0, 1]`. Default: 1.0.
    pub discount: f64,
    /// Upper bound on action-fluents set to non-default values per
    /// epoch. `None` = unbounded (`pos-inf` or not given).
    pub max_nondef_actions: Option<u32>,
}

impl InstanceConfig {
    /// Read and validate the settings of an instance block.
    pub fn from_instance(instance: &Instance) -> Result<Self, InstanceConfigError> {
        let horizon = instance.horizon.ok_or(InstanceConfigError::MissingHorizon)?;
        let config = Self {
            horizon: u32::try_from(horizon)
                .map_err(|_| InstanceConfigError::InvalidHorizon { value: horizon })?,
            discount: instance.discount.unwrap_or(1.0),
            max_nondef_actions: match instance.max_nondef_actions {
                None | Some(MaxActions::Unbounded) => None,
                Some(MaxActions::Limit(n)) => Some(
                    u32::try_from(n).map_err(|_| InstanceConfigError::InvalidMaxActions { value: n })?,
                ),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Check the structural invariants.
    pub fn validate(&self) -> Result<(), InstanceConfigError> {
        if self.horizon == 0 {
            return Err(InstanceConfigError::InvalidHorizon { value: 0 });
        }
        if !(0.0..=1.0).contains(&self.discount) {
            return Err(InstanceConfigError::InvalidDiscount {
                value: self.discount,
            });
        }
        Ok(())
    }
}
