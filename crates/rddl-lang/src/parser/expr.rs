//! Expression parser using precedence climbing.
//!
//! Precedence, loosest to tightest:
//!
//! 1. `<=>` (left)
//! 2. `=>` (right)
//! 3. `|` (left)
//! 4. `^` / `&` (left)
//! 5. prefix `~`
//! 6. `==`, `~=`, `<`, `<=`, `>`, `>=` (left)
//! 7. `+`, `-` (left)
//! 8. `*`, `/` (left)
//! 9. prefix `-`, `if`, aggregations
//!
//! So `~a == b` negates the comparison while `~a ^ b` negates only `a`.
//!
//! An `if` extends as far right as possible: `if (c) then a else b + 1`
//! adds 1 inside the else branch. Aggregation bodies bind like a prefix
//! operand, so a compound body needs brackets: `sum_{?p : t} [a + b]`.

use super::stream::TokenStream;
use crate::ast::{AggOp, BinaryOp, Distribution, Expr, ExprKind, UnaryOp};
use crate::error::ParseError;
use crate::lexer::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Assoc {
    Left,
    Right,
}

/// Binding power of the comparison operators; `~` takes its operand here.
const RELATIONAL: u8 = 50;

/// Precedence, associativity and operator for an infix token.
fn binary_op_info(token: &Token) -> Option<(u8, Assoc, BinaryOp)> {
    match token {
        Token::Equiv => Some((10, Assoc::Left, BinaryOp::Equiv)),
        Token::Implies => Some((20, Assoc::Right, BinaryOp::Implies)),
        Token::Or => Some((30, Assoc::Left, BinaryOp::Or)),
        Token::And => Some((40, Assoc::Left, BinaryOp::And)),
        Token::EqEq => Some((50, Assoc::Left, BinaryOp::Eq)),
        Token::NotEq => Some((50, Assoc::Left, BinaryOp::Ne)),
        Token::Lt => Some((50, Assoc::Left, BinaryOp::Lt)),
        Token::LtEq => Some((50, Assoc::Left, BinaryOp::Le)),
        Token::Gt => Some((50, Assoc::Left, BinaryOp::Gt)),
        Token::GtEq => Some((50, Assoc::Left, BinaryOp::Ge)),
        Token::Plus => Some((60, Assoc::Left, BinaryOp::Add)),
        Token::Minus => Some((60, Assoc::Left, BinaryOp::Sub)),
        Token::Star => Some((70, Assoc::Left, BinaryOp::Mul)),
        Token::Slash => Some((70, Assoc::Left, BinaryOp::Div)),
        _ => None,
    }
}

/// Parse a full expression.
pub(crate) fn parse_expr(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    parse_pratt(stream, 0)
}

fn parse_pratt(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let outer = stream.enter()?;
    let result = parse_binary(stream, min_prec);
    stream.restore(outer);
    result
}

fn parse_binary(stream: &mut TokenStream, min_prec: u8) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let mut left = parse_prefix(stream)?;

    while let Some((prec, assoc, op)) = stream.peek().and_then(binary_op_info) {
        if prec < min_prec {
            break;
        }
        // Each chained operator deepens the tree by one; the caller restores.
        stream.enter()?;
        stream.advance();

        let next_prec = if assoc == Assoc::Left { prec + 1 } else { prec };
        let right = parse_pratt(stream, next_prec)?;

        left = Expr::new(
            ExprKind::Binary {
                op,
                lhs: Box::new(left),
                rhs: Box::new(right),
            },
            stream.span_from(start),
        );
    }

    Ok(left)
}

fn parse_prefix(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let outer = stream.enter()?;
    let result = match stream.peek() {
        Some(Token::Minus) | Some(Token::Not) => parse_unary(stream),
        Some(Token::If) => parse_if(stream),
        _ => parse_atom(stream),
    };
    stream.restore(outer);
    result
}

fn parse_unary(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let (op, operand) = match stream.advance() {
        Some(Token::Minus) => (UnaryOp::Neg, parse_prefix(stream)?),
        _ => (UnaryOp::Not, parse_pratt(stream, RELATIONAL)?),
    };
    Ok(Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        stream.span_from(start),
    ))
}

fn parse_if(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    stream.expect(Token::If)?;
    let cond = parse_expr(stream)?;
    stream.expect(Token::Then)?;
    let then_branch = parse_expr(stream)?;
    stream.expect(Token::Else)?;
    let else_branch = parse_expr(stream)?;
    Ok(Expr::new(
        ExprKind::If {
            cond: Box::new(cond),
            then_branch: Box::new(then_branch),
            else_branch: Box::new(else_branch),
        },
        stream.span_from(start),
    ))
}

fn parse_atom(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let span = stream.current_span();
    let kind = match stream.peek() {
        Some(Token::True) => ExprKind::Bool(true),
        Some(Token::False) => ExprKind::Bool(false),
        Some(Token::Int(i)) => ExprKind::Int(*i),
        Some(Token::Real(r)) => ExprKind::Real(*r),
        Some(Token::Enum(name)) => ExprKind::Enum(name.clone()),
        Some(Token::Param(name)) => ExprKind::Param(name.clone()),
        Some(Token::LParen) => return parse_grouped(stream, Token::RParen),
        Some(Token::LBracket) => return parse_grouped(stream, Token::RBracket),
        Some(Token::Ident(_)) => return parse_name(stream),
        _ => return Err(stream.unexpected("expression")),
    };
    stream.advance();
    Ok(Expr::new(kind, span))
}

/// `( expr )` or `[ expr ]`. The inner node keeps its own span.
fn parse_grouped(stream: &mut TokenStream, close: Token) -> Result<Expr, ParseError> {
    stream.advance();
    let inner = parse_expr(stream)?;
    stream.expect(close)?;
    Ok(inner)
}

/// Anything introduced by an identifier: aggregations, distributions,
/// infinities and variable references.
fn parse_name(stream: &mut TokenStream) -> Result<Expr, ParseError> {
    let start = stream.current_pos();
    let (name, span) = stream.expect_ident("identifier")?;

    if let Some(op) = AggOp::from_prefix(&name) {
        if stream.check(&Token::LBrace) {
            return parse_aggregate(stream, op, start);
        }
    }

    match name.as_str() {
        "pos-inf" => return Ok(Expr::new(ExprKind::Real(f64::INFINITY), span)),
        "neg-inf" => return Ok(Expr::new(ExprKind::Real(f64::NEG_INFINITY), span)),
        _ => {}
    }

    if let Some(dist) = Distribution::from_name(&name) {
        if stream.check(&Token::LParen) {
            let args = parse_call_args(stream)?;
            if args.len() != dist.arity() {
                return Err(stream.invalid(
                    format!(
                        "{} takes {} argument(s), found {}",
                        dist.name(),
                        dist.arity(),
                        args.len()
                    ),
                    span,
                ));
            }
            return Ok(Expr::new(
                ExprKind::Sample { dist, args },
                stream.span_from(start),
            ));
        }
    }

    let primed = stream.eat(&Token::Prime);
    let args = if stream.check(&Token::LParen) {
        parse_call_args(stream)?
    } else {
        Vec::new()
    };
    Ok(Expr::new(
        ExprKind::Fluent { name, primed, args },
        stream.span_from(start),
    ))
}

/// `( a, b, ... )`, possibly empty.
fn parse_call_args(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LParen)?;
    let mut args = Vec::new();
    if !stream.check(&Token::RParen) {
        loop {
            args.push(parse_expr(stream)?);
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
    }
    stream.expect(Token::RParen)?;
    Ok(args)
}

/// `{?p : type, ...} body` after the `sum_`/`prod_`/`exists_`/`forall_`
/// identifier has been consumed.
fn parse_aggregate(stream: &mut TokenStream, op: AggOp, start: usize) -> Result<Expr, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut vars = Vec::new();
    loop {
        let param = match stream.peek() {
            Some(Token::Param(p)) => p.clone(),
            _ => return Err(stream.unexpected("parameter")),
        };
        stream.advance();
        stream.expect(Token::Colon)?;
        let (type_name, _) = stream.expect_ident("type name")?;
        vars.push((param, type_name));
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    stream.expect(Token::RBrace)?;

    let body = parse_prefix(stream)?;
    Ok(Expr::new(
        ExprKind::Aggregate {
            op,
            vars,
            body: Box::new(body),
        },
        stream.span_from(start),
    ))
}
