//! RDDL: parse, ground, evaluate and step planning-domain models.
//!
//! This is the top-level facade crate that re-exports the public API from
//! the workspace's sub-crates and adds [`load`], which picks one problem
//! (instance plus the domain and non-fluents it names) out of a source
//! text.
//!
//! # Quick start
//!
//! ```rust
//! use rddl::prelude::*;
//!
//! let src = "
//!     domain counter {
//!         pvariables {
//!             LIMIT : { non-fluent, int, default = 3 };
//!             n     : { state-fluent, int, default = 0 };
//!             bump  : { action-fluent, bool, default = false };
//!         };
//!         cpfs { n' = if (bump ^ (n < LIMIT)) then n + 1 else n; };
//!         reward = n;
//!     }
//!     instance one { domain = counter; horizon = 2; }
//! ";
//!
//! let problem = rddl::load(src).unwrap();
//! let mut stepper = problem.stepper(ChaChaSource::seed_from_u64(42)).unwrap();
//! let first = stepper.step_named(&[("bump", Value::Bool(true))]).unwrap();
//! assert_eq!(first.state.get("n", &[]), Some(Value::Int(1)));
//! let second = stepper.step(&[]).unwrap();
//! assert_eq!(second.reward, 1.0);
//! assert!(second.terminated);
//! ```
//!
//! # Modules
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `rddl-core` | Ids, values, fluent classes, errors, core traits |
//! | [`lang`] | `rddl-lang` | Lexer, parser, AST and its `Display` |
//! | [`model`] | `rddl-model` | Type registry, symbol table, type checking, grounding |
//! | [`eval`] | `rddl-eval` | Expression evaluator and seeded random sources |
//! | [`engine`] | `rddl-engine` | Epoch stepper, metrics and state hashing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod load;

pub use load::{load, load_instance, LoadError, Problem};

/// Core ids, values and traits (`rddl-core`).
pub use rddl_core as types;

/// Lexer, parser and AST (`rddl-lang`).
pub use rddl_lang as lang;

/// Compilation and grounding (`rddl-model`).
///
/// [`model::Model::compile`] is the entry point when blocks come from
/// somewhere other than [`load`].
pub use rddl_model as model;

/// Expression evaluation (`rddl-eval`).
pub use rddl_eval as eval;

/// The epoch stepper (`rddl-engine`).
pub use rddl_engine as engine;

/// Common imports for typical usage.
///
/// ```rust
/// use rddl::prelude::*;
/// ```
pub mod prelude {
    // Loading
    pub use crate::load::{load, load_instance, LoadError, Problem};

    // Core types and traits
    pub use rddl_core::{
        EvalError, FluentClass, GroundId, ObjectId, RandomSource, Value, ValueType,
    };

    // Compilation
    pub use rddl_core::ValidationErrors;
    pub use rddl_model::Model;

    // Evaluation
    pub use rddl_eval::{ChaChaSource, Evaluator};

    // Engine
    pub use rddl_engine::{
        ActionError, ConfigError, Phase, StateView, StepError, StepMetrics, StepResult, Stepper,
        StepperConfig,
    };
}
