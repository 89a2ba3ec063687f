//! Expression evaluation for compiled RDDL models.
//!
//! [`Evaluator`] walks a [`TypedExpr`](rddl_model::TypedExpr) against any
//! [`Environment`](rddl_core::Environment), drawing randomness from an
//! injected [`RandomSource`](rddl_core::RandomSource). [`ChaChaSource`] is
//! the seeded source used for reproducible runs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod eval;
pub mod rng;

pub use eval::{apply_binary, Evaluator};
pub use rng::ChaChaSource;
