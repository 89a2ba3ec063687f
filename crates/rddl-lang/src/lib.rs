//! Lexer, AST and parser for RDDL source text.
//!
//! [`parse`] turns a source text into a [`SourceFile`] holding every
//! `domain`, `non-fluents` and `instance` block it contains. The AST is
//! untyped: names stay strings and nothing is checked beyond grammar.
//! Resolution, type checking and grounding live in `rddl-model`.
//!
//! Every AST node implements `Display`, rendering source that parses back
//! to an equivalent tree.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod ast;
mod display;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;

pub use ast::{
    AggOp, Assignment, BinaryOp, Cpf, Distribution, Domain, Expr, ExprKind, Instance, Literal,
    MaxActions, NonFluents, ObjectsDecl, PvarDecl, SourceFile, TypeDecl, TypeKind, UnaryOp,
};
pub use error::ParseError;
pub use parser::{parse, parse_expr};
pub use span::Span;
