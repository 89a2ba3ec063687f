//! Symbol table, type checking, validation and grounding for RDDL models.
//!
//! [`Model::compile`] turns a parsed domain, non-fluents block and
//! instance into an immutable [`Model`]: types and objects in a
//! [`TypeRegistry`], declarations in a [`SymbolTable`], every expression
//! resolved to a [`TypedExpr`], and every parameterized variable expanded
//! into the [`Grounding`] arena. All semantic errors are collected and
//! reported together.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod compile;
pub mod config;
pub mod expr;
pub mod ground;
pub mod model;
pub mod registry;
mod resolve;
pub mod symbols;
pub mod valuation;

pub use config::{InstanceConfig, InstanceConfigError};
pub use expr::{TypedExpr, TypedKind};
pub use ground::{cross_product, GroundVar, Grounding};
pub use model::{Constraint, ConstraintKind, GroundCpf, LiftedCpf, Model};
pub use registry::{ObjectInfo, TypeClass, TypeInfo, TypeRegistry};
pub use symbols::{SymbolTable, VarDecl};
pub use valuation::Valuation;
