//! Epoch stepper for grounded RDDL models.
//!
//! [`Stepper`] holds the current state of one instance and advances it a
//! decision epoch at a time: validate the action set, evaluate derived
//! fluents, check constraints, evaluate the reward, evaluate every
//! next-state CPF, and commit with a buffer swap. Evaluation errors are
//! fatal; rejected actions are not.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod hash;
pub mod metrics;
pub mod state;
pub mod stepper;

pub use config::{ConfigError, StepperConfig};
pub use error::{ActionError, StepError};
pub use hash::valuation_hash;
pub use metrics::StepMetrics;
pub use state::StateView;
pub use stepper::{Phase, StepResult, Stepper};
