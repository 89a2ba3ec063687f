//! Recursive-descent parser producing the untyped AST.

mod blocks;
mod expr;
mod stream;

use crate::ast::{Expr, SourceFile};
use crate::error::ParseError;
use stream::TokenStream;

/// Parse a source text containing any number of `domain`, `non-fluents`
/// and `instance` blocks, in any order.
///
/// Parsing is all-or-nothing: the first error aborts and no partial AST
/// is returned.
pub fn parse(source: &str) -> Result<SourceFile, ParseError> {
    let mut stream = TokenStream::new(source)?;
    let file = blocks::parse_source(&mut stream)?;
    tracing::debug!(
        domains = file.domains.len(),
        non_fluents = file.non_fluents.len(),
        instances = file.instances.len(),
        "parsed source"
    );
    Ok(file)
}

/// Parse a standalone expression. The whole input must be consumed.
pub fn parse_expr(source: &str) -> Result<Expr, ParseError> {
    let mut stream = TokenStream::new(source)?;
    let expr = expr::parse_expr(&mut stream)?;
    if !stream.at_end() {
        return Err(stream.unexpected("end of expression"));
    }
    Ok(expr)
}
