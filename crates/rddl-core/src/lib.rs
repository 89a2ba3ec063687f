//! Core types and traits for the RDDL simulator.
//!
//! This is the leaf crate with no internal dependencies. It defines the
//! abstractions shared by every other crate in the workspace: strongly
//! typed ids, runtime values and value types, fluent classes, the
//! evaluation and validation error types, and the [`Environment`] and
//! [`RandomSource`] traits that decouple the evaluator from storage and
//! from the random number generator.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod fluent;
pub mod id;
pub mod traits;
pub mod value;

pub use error::{EvalError, Location, ModelError, ValidationErrors};
pub use fluent::FluentClass;
pub use id::{Args, EpochId, GroundId, ObjectId, TypeId, VarId};
pub use traits::{Environment, RandomSource};
pub use value::{Value, ValueType};
