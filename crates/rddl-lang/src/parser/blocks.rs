//! Block-level parsing: `domain`, `non-fluents` and `instance`.

use rddl_core::FluentClass;

use super::expr::parse_expr;
use super::stream::TokenStream;
use crate::ast::{
    Assignment, Cpf, Domain, Expr, Instance, Literal, MaxActions, NonFluents, ObjectsDecl,
    PvarDecl, SourceFile, TypeDecl, TypeKind,
};
use crate::error::ParseError;
use crate::lexer::Token;

/// Parse every top-level block until end of input.
pub(super) fn parse_source(stream: &mut TokenStream) -> Result<SourceFile, ParseError> {
    let mut file = SourceFile::default();
    while !stream.at_end() {
        let span = stream.current_span();
        let keyword = match stream.peek() {
            Some(Token::Ident(kw)) => kw.clone(),
            _ => return Err(stream.unexpected("'domain', 'non-fluents' or 'instance'")),
        };
        match keyword.as_str() {
            "domain" => file.domains.push(parse_domain(stream)?),
            "non-fluents" => file.non_fluents.push(parse_non_fluents(stream)?),
            "instance" => file.instances.push(parse_instance(stream)?),
            _ => {
                return Err(ParseError::UnknownBlock {
                    keyword,
                    at: span.location(),
                })
            }
        }
    }
    Ok(file)
}

// ── Domain ──────────────────────────────────────────────────────

fn parse_domain(stream: &mut TokenStream) -> Result<Domain, ParseError> {
    let span = stream.expect_keyword("domain")?;
    let (name, _) = stream.expect_ident("domain name")?;
    stream.expect(Token::LBrace)?;

    let mut domain = Domain {
        name,
        requirements: Vec::new(),
        types: Vec::new(),
        pvariables: Vec::new(),
        cpfs: Vec::new(),
        reward: None,
        constraints: Vec::new(),
        action_preconditions: Vec::new(),
        state_invariants: Vec::new(),
        span,
    };

    while !stream.eat(&Token::RBrace) {
        let (section, section_span) = stream.expect_ident("domain section")?;
        match section.as_str() {
            "requirements" => {
                stream.expect(Token::Assign)?;
                stream.expect(Token::LBrace)?;
                domain.requirements = parse_name_list(stream, "requirement")?;
                stream.expect(Token::RBrace)?;
            }
            "types" => {
                stream.expect(Token::LBrace)?;
                while !stream.eat(&Token::RBrace) {
                    domain.types.push(parse_type_decl(stream)?);
                }
            }
            "pvariables" => {
                stream.expect(Token::LBrace)?;
                while !stream.eat(&Token::RBrace) {
                    domain.pvariables.push(parse_pvar_decl(stream)?);
                }
            }
            "cpfs" | "cdfs" => {
                stream.expect(Token::LBrace)?;
                while !stream.eat(&Token::RBrace) {
                    domain.cpfs.push(parse_cpf(stream)?);
                }
            }
            "reward" => {
                if domain.reward.is_some() {
                    return Err(stream.invalid("reward declared twice", section_span));
                }
                stream.expect(Token::Assign)?;
                domain.reward = Some(parse_expr(stream)?);
            }
            "state-action-constraints" => {
                domain.constraints.extend(parse_expr_section(stream)?);
            }
            "action-preconditions" => {
                domain
                    .action_preconditions
                    .extend(parse_expr_section(stream)?);
            }
            "state-invariants" => {
                domain.state_invariants.extend(parse_expr_section(stream)?);
            }
            other => {
                return Err(stream.invalid(format!("unknown domain section '{other}'"), section_span))
            }
        }
        stream.eat(&Token::Semi);
    }
    stream.eat(&Token::Semi);
    Ok(domain)
}

/// `name : object;` or `name : {@a, @b};`
fn parse_type_decl(stream: &mut TokenStream) -> Result<TypeDecl, ParseError> {
    let (name, span) = stream.expect_ident("type name")?;
    stream.expect(Token::Colon)?;
    let kind = if stream.check_ident("object") {
        stream.advance();
        TypeKind::Object
    } else if stream.eat(&Token::LBrace) {
        let mut members = Vec::new();
        loop {
            match stream.peek() {
                Some(Token::Enum(m)) => members.push(m.clone()),
                _ => return Err(stream.unexpected("enum literal")),
            }
            stream.advance();
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
        stream.expect(Token::RBrace)?;
        TypeKind::Enum(members)
    } else {
        return Err(stream.unexpected("'object' or an enumeration"));
    };
    stream.expect(Token::Semi)?;
    Ok(TypeDecl { name, kind, span })
}

/// `NAME(t1, t2) : { class, range, default = lit, level = n };`
fn parse_pvar_decl(stream: &mut TokenStream) -> Result<PvarDecl, ParseError> {
    let (name, span) = stream.expect_ident("variable name")?;
    let params = if stream.eat(&Token::LParen) {
        let params = parse_name_list(stream, "parameter type")?;
        stream.expect(Token::RParen)?;
        params
    } else {
        Vec::new()
    };
    stream.expect(Token::Colon)?;
    stream.expect(Token::LBrace)?;

    let (class_word, class_span) = stream.expect_ident("fluent class")?;
    let class = FluentClass::from_keyword(&class_word).ok_or_else(|| {
        stream.invalid(format!("unknown fluent class '{class_word}'"), class_span)
    })?;
    stream.expect(Token::Comma)?;
    let (range, _) = stream.expect_ident("range type")?;

    let mut default = None;
    let mut level = None;
    while stream.eat(&Token::Comma) {
        let (key, key_span) = stream.expect_ident("'default' or 'level'")?;
        stream.expect(Token::Assign)?;
        match key.as_str() {
            "default" => default = Some(parse_literal(stream)?),
            "level" => match stream.advance() {
                Some(Token::Int(n)) => level = Some(n),
                _ => return Err(stream.invalid("level must be an integer", key_span)),
            },
            other => {
                return Err(stream.invalid(format!("unknown declaration property '{other}'"), key_span))
            }
        }
    }
    stream.expect(Token::RBrace)?;
    stream.expect(Token::Semi)?;

    Ok(PvarDecl {
        name,
        params,
        class,
        range,
        default,
        level,
        span,
    })
}

/// `name'(?p, ...) = expr;`
fn parse_cpf(stream: &mut TokenStream) -> Result<Cpf, ParseError> {
    let (target, span) = stream.expect_ident("CPF target")?;
    let primed = stream.eat(&Token::Prime);
    let mut params = Vec::new();
    if stream.eat(&Token::LParen) {
        loop {
            match stream.peek() {
                Some(Token::Param(p)) => params.push(p.clone()),
                _ => return Err(stream.unexpected("parameter")),
            }
            stream.advance();
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
        stream.expect(Token::RParen)?;
    }
    stream.expect(Token::Assign)?;
    let expr = parse_expr(stream)?;
    stream.expect(Token::Semi)?;
    Ok(Cpf {
        target,
        primed,
        params,
        expr,
        span,
    })
}

/// `{ expr; expr; ... }`
fn parse_expr_section(stream: &mut TokenStream) -> Result<Vec<Expr>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut exprs = Vec::new();
    while !stream.eat(&Token::RBrace) {
        exprs.push(parse_expr(stream)?);
        stream.expect(Token::Semi)?;
    }
    Ok(exprs)
}

// ── Non-fluents and instance ────────────────────────────────────

fn parse_non_fluents(stream: &mut TokenStream) -> Result<NonFluents, ParseError> {
    let span = stream.expect_keyword("non-fluents")?;
    let (name, _) = stream.expect_ident("non-fluents name")?;
    stream.expect(Token::LBrace)?;

    let mut domain = None;
    let mut objects = Vec::new();
    let mut values = Vec::new();
    while !stream.eat(&Token::RBrace) {
        let (section, section_span) = stream.expect_ident("non-fluents section")?;
        match section.as_str() {
            "domain" => domain = Some(parse_reference(stream)?),
            "objects" => objects.extend(parse_objects(stream)?),
            "non-fluents" => values.extend(parse_assignments(stream)?),
            other => {
                return Err(stream.invalid(
                    format!("unknown non-fluents section '{other}'"),
                    section_span,
                ))
            }
        }
        stream.eat(&Token::Semi);
    }
    stream.eat(&Token::Semi);

    let domain = domain
        .ok_or_else(|| stream.invalid(format!("non-fluents '{name}' names no domain"), span))?;
    Ok(NonFluents {
        name,
        domain,
        objects,
        values,
        span,
    })
}

fn parse_instance(stream: &mut TokenStream) -> Result<Instance, ParseError> {
    let span = stream.expect_keyword("instance")?;
    let (name, _) = stream.expect_ident("instance name")?;
    stream.expect(Token::LBrace)?;

    let mut domain = None;
    let mut instance = Instance {
        name,
        domain: String::new(),
        non_fluents: None,
        objects: Vec::new(),
        init_state: Vec::new(),
        max_nondef_actions: None,
        horizon: None,
        discount: None,
        span,
    };

    while !stream.eat(&Token::RBrace) {
        let (section, section_span) = stream.expect_ident("instance section")?;
        match section.as_str() {
            "domain" => domain = Some(parse_reference(stream)?),
            "non-fluents" => instance.non_fluents = Some(parse_reference(stream)?),
            "objects" => instance.objects.extend(parse_objects(stream)?),
            "init-state" => instance.init_state.extend(parse_assignments(stream)?),
            "max-nondef-actions" => {
                stream.expect(Token::Assign)?;
                let value = match stream.advance() {
                    Some(Token::Int(n)) => MaxActions::Limit(n),
                    Some(Token::Ident(s)) if s == "pos-inf" => MaxActions::Unbounded,
                    _ => {
                        return Err(stream.invalid(
                            "max-nondef-actions must be an integer or pos-inf",
                            section_span,
                        ))
                    }
                };
                instance.max_nondef_actions = Some(value);
            }
            "horizon" => {
                stream.expect(Token::Assign)?;
                match stream.advance() {
                    Some(Token::Int(n)) => instance.horizon = Some(n),
                    _ => return Err(stream.invalid("horizon must be an integer", section_span)),
                }
            }
            "discount" => {
                stream.expect(Token::Assign)?;
                match stream.advance() {
                    Some(Token::Real(r)) => instance.discount = Some(r),
                    Some(Token::Int(n)) => instance.discount = Some(n as f64),
                    _ => return Err(stream.invalid("discount must be a number", section_span)),
                }
            }
            other => {
                return Err(
                    stream.invalid(format!("unknown instance section '{other}'"), section_span)
                )
            }
        }
        stream.eat(&Token::Semi);
    }
    stream.eat(&Token::Semi);

    instance.domain = domain.ok_or_else(|| {
        stream.invalid(
            format!("instance '{}' names no domain", instance.name),
            span,
        )
    })?;
    Ok(instance)
}

/// `= name`
fn parse_reference(stream: &mut TokenStream) -> Result<String, ParseError> {
    stream.expect(Token::Assign)?;
    Ok(stream.expect_ident("block name")?.0)
}

/// `{ type : {o1, o2}; ... }`
fn parse_objects(stream: &mut TokenStream) -> Result<Vec<ObjectsDecl>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut decls = Vec::new();
    while !stream.eat(&Token::RBrace) {
        let (type_name, span) = stream.expect_ident("type name")?;
        stream.expect(Token::Colon)?;
        stream.expect(Token::LBrace)?;
        let objects = parse_name_list(stream, "object name")?;
        stream.expect(Token::RBrace)?;
        stream.expect(Token::Semi)?;
        decls.push(ObjectsDecl {
            type_name,
            objects,
            span,
        });
    }
    Ok(decls)
}

/// `{ NAME(args) = lit; NAME(args); ~NAME(args); ... }`
fn parse_assignments(stream: &mut TokenStream) -> Result<Vec<Assignment>, ParseError> {
    stream.expect(Token::LBrace)?;
    let mut assignments = Vec::new();
    while !stream.eat(&Token::RBrace) {
        assignments.push(parse_assignment(stream)?);
    }
    Ok(assignments)
}

fn parse_assignment(stream: &mut TokenStream) -> Result<Assignment, ParseError> {
    let span = stream.current_span();
    let negated = stream.eat(&Token::Not);
    let (name, _) = stream.expect_ident("variable name")?;

    let mut args = Vec::new();
    if stream.eat(&Token::LParen) {
        loop {
            match stream.peek() {
                Some(Token::Ident(s)) | Some(Token::Enum(s)) => args.push(s.clone()),
                _ => return Err(stream.unexpected("object name")),
            }
            stream.advance();
            if !stream.eat(&Token::Comma) {
                break;
            }
        }
        stream.expect(Token::RParen)?;
    }

    let value = if stream.eat(&Token::Assign) {
        if negated {
            return Err(stream.invalid("'~' shorthand cannot take a value", span));
        }
        parse_literal(stream)?
    } else {
        Literal::Bool(!negated)
    };
    stream.expect(Token::Semi)?;

    Ok(Assignment {
        name,
        args,
        value,
        span,
    })
}

/// A constant: boolean, optionally signed number, enum literal, infinity,
/// or object name.
fn parse_literal(stream: &mut TokenStream) -> Result<Literal, ParseError> {
    let span = stream.current_span();
    let literal = match stream.advance() {
        Some(Token::True) => Literal::Bool(true),
        Some(Token::False) => Literal::Bool(false),
        Some(Token::Int(n)) => Literal::Int(n),
        Some(Token::Real(r)) => Literal::Real(r),
        Some(Token::Enum(e)) => Literal::Enum(e),
        Some(Token::Minus) => match stream.advance() {
            Some(Token::Int(n)) => Literal::Int(-n),
            Some(Token::Real(r)) => Literal::Real(-r),
            _ => return Err(stream.invalid("expected a number after '-'", span)),
        },
        Some(Token::Ident(s)) => match s.as_str() {
            "pos-inf" => Literal::Real(f64::INFINITY),
            "neg-inf" => Literal::Real(f64::NEG_INFINITY),
            _ => Literal::Object(s),
        },
        Some(other) => {
            return Err(ParseError::UnexpectedToken {
                expected: "literal".into(),
                found: other.to_string(),
                at: span.location(),
            })
        }
        None => {
            return Err(ParseError::UnexpectedEof {
                expected: "literal".into(),
            })
        }
    };
    Ok(literal)
}

/// Comma-separated identifiers, possibly empty.
fn parse_name_list(stream: &mut TokenStream, what: &str) -> Result<Vec<String>, ParseError> {
    let mut names = Vec::new();
    if !matches!(stream.peek(), Some(Token::Ident(_))) {
        return Ok(names);
    }
    loop {
        names.push(stream.expect_ident(what)?.0);
        if !stream.eat(&Token::Comma) {
            break;
        }
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(src: &str) -> Result<SourceFile, ParseError> {
        let mut stream = TokenStream::new(src)?;
        parse_source(&mut stream)
    }

    #[test]
    fn pvariable_properties() {
        let file = source(
            "domain d { pvariables {
                PICT_VALUE(picture-point) : { non-fluent, real, default = 1.0 };
                inBox(picture-point) : { interm-fluent, bool, level = 1 };
                snap : { action-fluent, bool, default = false };
            }; }",
        )
        .unwrap();
        let vars = &file.domains[0].pvariables;
        assert_eq!(vars.len(), 3);
        assert_eq!(vars[0].params, vec!["picture-point".to_string()]);
        assert_eq!(vars[0].default, Some(Literal::Real(1.0)));
        assert_eq!(vars[1].class, FluentClass::DerivedFluent);
        assert_eq!(vars[1].level, Some(1));
        assert_eq!(vars[2].default, Some(Literal::Bool(false)));
    }

    #[test]
    fn enum_types_and_empty_requirements() {
        let file = source(
            "domain d { requirements = {}; types { phase : {@idle, @busy}; p : object; }; }",
        )
        .unwrap();
        let d = &file.domains[0];
        assert!(d.requirements.is_empty());
        assert_eq!(
            d.types[0].kind,
            TypeKind::Enum(vec!["idle".into(), "busy".into()])
        );
        assert_eq!(d.types[1].kind, TypeKind::Object);
    }

    #[test]
    fn unknown_fluent_class_is_rejected() {
        let err = source("domain d { pvariables { x : { observ-fluent, bool }; }; }").unwrap_err();
        assert!(
            matches!(err, ParseError::InvalidSyntax { ref message, .. } if message.contains("observ-fluent"))
        );
    }

    #[test]
    fn assignment_shorthands() {
        let file = source(
            "instance i { domain = d; init-state { on(a); ~on(b); v(a, @hi) = -2; }; }",
        )
        .unwrap();
        let init = &file.instances[0].init_state;
        assert_eq!(init[0].value, Literal::Bool(true));
        assert_eq!(init[1].value, Literal::Bool(false));
        assert_eq!(init[2].args, vec!["a".to_string(), "hi".to_string()]);
        assert_eq!(init[2].value, Literal::Int(-2));
    }

    #[test]
    fn instance_settings() {
        let file = source(
            "instance i { domain = d; non-fluents = nf; max-nondef-actions = pos-inf; horizon = 40; discount = 1; }",
        )
        .unwrap();
        let inst = &file.instances[0];
        assert_eq!(inst.non_fluents.as_deref(), Some("nf"));
        assert_eq!(inst.max_nondef_actions, Some(MaxActions::Unbounded));
        assert_eq!(inst.horizon, Some(40));
        assert_eq!(inst.discount, Some(1.0));
    }

    #[test]
    fn instance_without_domain_is_rejected() {
        let err = source("instance i { horizon = 3; }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }

    #[test]
    fn unknown_top_level_keyword() {
        let err = source("domain d { }\nproblem p { }").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnknownBlock {
                keyword: "problem".into(),
                at: rddl_core::Location::new(2, 1),
            }
        );
    }

    #[test]
    fn duplicate_reward_is_rejected() {
        let err = source("domain d { reward = 1; reward = 2; }").unwrap_err();
        assert!(matches!(err, ParseError::InvalidSyntax { .. }));
    }
}
