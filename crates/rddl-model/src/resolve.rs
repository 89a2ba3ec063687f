//! Name resolution and static type checking of AST expressions.
//!
//! The resolver pushes every problem it finds onto a shared error list and
//! keeps going where it can, so one pass over a model reports all of its
//! type errors. A `None` result means at least one error was recorded.

use rddl_core::{Location, ModelError, TypeId, Value, ValueType};
use rddl_lang::{AggOp, BinaryOp, Distribution, Expr, ExprKind, UnaryOp};

use crate::expr::{TypedExpr, TypedKind};
use crate::registry::TypeRegistry;
use crate::symbols::SymbolTable;

/// Parameters in scope, innermost last. A parameter's slot is its index.
pub(crate) type Scope = Vec<(String, TypeId)>;

pub(crate) struct Resolver<'a> {
    pub(crate) registry: &'a TypeRegistry,
    pub(crate) symbols: &'a SymbolTable,
    pub(crate) errors: &'a mut Vec<ModelError>,
}

impl Resolver<'_> {
    /// Resolve `expr` and require its type to be accepted by `expected`.
    pub(crate) fn resolve_as(
        &mut self,
        expr: &Expr,
        scope: &mut Scope,
        expected: ValueType,
        context: &str,
    ) -> Option<TypedExpr> {
        let typed = self.resolve(expr, scope)?;
        if expected.accepts(typed.ty) {
            Some(typed)
        } else {
            self.mismatch(context, expected, typed.ty, expr.span.location());
            None
        }
    }

    /// Resolve `expr` and require a numeric type.
    pub(crate) fn resolve_numeric(
        &mut self,
        expr: &Expr,
        scope: &mut Scope,
        context: &str,
    ) -> Option<TypedExpr> {
        let typed = self.resolve(expr, scope)?;
        if typed.ty.is_numeric() {
            Some(typed)
        } else {
            self.push(ModelError::TypeMismatch {
                context: context.to_string(),
                expected: "int or real".into(),
                found: self.registry.describe(typed.ty),
                at: expr.span.location(),
            });
            None
        }
    }

    pub(crate) fn resolve(&mut self, expr: &Expr, scope: &mut Scope) -> Option<TypedExpr> {
        let at = expr.span.location();
        match &expr.kind {
            ExprKind::Bool(b) => Some(TypedExpr::constant(Value::Bool(*b), ValueType::Bool)),
            ExprKind::Int(i) => Some(TypedExpr::constant(Value::Int(*i), ValueType::Int)),
            ExprKind::Real(r) => Some(TypedExpr::constant(Value::Real(*r), ValueType::Real)),
            ExprKind::Enum(name) => self.enum_literal(name, at),
            ExprKind::Param(name) => match scope.iter().rposition(|(p, _)| p == name) {
                Some(slot) => Some(TypedExpr {
                    kind: TypedKind::Param(slot as u16),
                    ty: ValueType::Object(scope[slot].1),
                }),
                None => {
                    self.push(ModelError::UnboundParameter {
                        name: format!("?{name}"),
                        at,
                    });
                    None
                }
            },
            ExprKind::Fluent { name, primed, args } => {
                self.reference(name, *primed, args, scope, at)
            }
            ExprKind::Unary { op, operand } => {
                let inner = match op {
                    UnaryOp::Neg => self.resolve_numeric(operand, scope, "'-'")?,
                    UnaryOp::Not => self.resolve_as(operand, scope, ValueType::Bool, "'~'")?,
                };
                let ty = inner.ty;
                Some(TypedExpr {
                    kind: TypedKind::Unary {
                        op: *op,
                        operand: Box::new(inner),
                    },
                    ty,
                })
            }
            ExprKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs, scope, at),
            ExprKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let cond = self.resolve_as(cond, scope, ValueType::Bool, "if condition");
                let then_typed = self.resolve(then_branch, scope);
                let else_typed = self.resolve(else_branch, scope);
                let (cond, then_typed, else_typed) = (cond?, then_typed?, else_typed?);
                let Some(ty) = then_typed.ty.unify(else_typed.ty) else {
                    self.mismatch("if branches", then_typed.ty, else_typed.ty, at);
                    return None;
                };
                Some(TypedExpr {
                    kind: TypedKind::If {
                        cond: Box::new(cond),
                        then_branch: Box::new(then_typed),
                        else_branch: Box::new(else_typed),
                    },
                    ty,
                })
            }
            ExprKind::Aggregate { op, vars, body } => self.aggregate(*op, vars, body, scope, at),
            ExprKind::Sample { dist, args } => self.sample(*dist, args, scope, at),
        }
    }

    fn enum_literal(&mut self, name: &str, at: Location) -> Option<TypedExpr> {
        let key = format!("@{name}");
        match self.registry.object_by_name(&key) {
            Some(id) => {
                let ty = self.registry.object(id).map(|o| o.ty)?;
                Some(TypedExpr::constant(Value::Object(id), ValueType::Object(ty)))
            }
            None => {
                self.push(ModelError::UnknownObject {
                    name: key,
                    expected_type: "enumeration".into(),
                    at,
                });
                None
            }
        }
    }

    /// A variable reference, or a bare object name.
    fn reference(
        &mut self,
        name: &str,
        primed: bool,
        args: &[Expr],
        scope: &mut Scope,
        at: Location,
    ) -> Option<TypedExpr> {
        if primed {
            self.push(ModelError::PrimedReference {
                name: name.to_string(),
                at,
            });
            return None;
        }
        let Some(var) = self.symbols.id_of(name) else {
            if args.is_empty() {
                if let Some(id) = self.registry.object_by_name(name) {
                    let ty = self.registry.object(id).map(|o| o.ty)?;
                    return Some(TypedExpr::constant(Value::Object(id), ValueType::Object(ty)));
                }
            }
            self.push(ModelError::UnknownVariable {
                name: name.to_string(),
                at,
            });
            return None;
        };
        let symbols = self.symbols;
        let decl = symbols.get(var)?;
        if decl.params.len() != args.len() {
            self.push(ModelError::ArityMismatch {
                name: name.to_string(),
                expected: decl.params.len(),
                found: args.len(),
                at,
            });
            return None;
        }

        let mut typed_args = Vec::with_capacity(args.len());
        let mut ok = true;
        for (i, (arg, &param_ty)) in args.iter().zip(&decl.params).enumerate() {
            let context = format!("argument {} of '{name}'", i + 1);
            match self.argument(arg, param_ty, scope, &context) {
                Some(t) => typed_args.push(t),
                None => ok = false,
            }
        }
        if !ok {
            return None;
        }
        Some(TypedExpr {
            kind: TypedKind::Var {
                var,
                args: typed_args,
            },
            ty: decl.value_type,
        })
    }

    /// An argument must be an object of the parameter type. A bare name
    /// that is not a variable is looked up within that type, so objects
    /// of different types may share a name with a variable elsewhere.
    fn argument(
        &mut self,
        arg: &Expr,
        param_ty: TypeId,
        scope: &mut Scope,
        context: &str,
    ) -> Option<TypedExpr> {
        if let ExprKind::Fluent {
            name,
            primed: false,
            args,
        } = &arg.kind
        {
            if args.is_empty() && self.symbols.id_of(name).is_none() {
                return match self
                    .registry
                    .resolve_object(name, param_ty, arg.span.location())
                {
                    Ok(id) => Some(TypedExpr::constant(
                        Value::Object(id),
                        ValueType::Object(param_ty),
                    )),
                    Err(e) => {
                        self.push(e);
                        None
                    }
                };
            }
        }
        self.resolve_as(arg, scope, ValueType::Object(param_ty), context)
    }

    fn binary(
        &mut self,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
        scope: &mut Scope,
        at: Location,
    ) -> Option<TypedExpr> {
        let symbol = format!("'{}'", op.symbol());
        let (l, r, ty) = if op.is_logical() {
            let l = self.resolve_as(lhs, scope, ValueType::Bool, &symbol);
            let r = self.resolve_as(rhs, scope, ValueType::Bool, &symbol);
            (l?, r?, ValueType::Bool)
        } else if matches!(op, BinaryOp::Eq | BinaryOp::Ne) {
            let l = self.resolve(lhs, scope);
            let r = self.resolve(rhs, scope);
            let (l, r) = (l?, r?);
            if l.ty.unify(r.ty).is_none() {
                self.mismatch(&symbol, l.ty, r.ty, at);
                return None;
            }
            (l, r, ValueType::Bool)
        } else {
            let l = self.resolve_numeric(lhs, scope, &symbol);
            let r = self.resolve_numeric(rhs, scope, &symbol);
            let (l, r) = (l?, r?);
            let ty = if op.is_relational() {
                ValueType::Bool
            } else {
                l.ty.unify(r.ty)?
            };
            (l, r, ty)
        };
        Some(TypedExpr {
            kind: TypedKind::Binary {
                op,
                lhs: Box::new(l),
                rhs: Box::new(r),
            },
            ty,
        })
    }

    fn aggregate(
        &mut self,
        op: AggOp,
        vars: &[(String, String)],
        body: &Expr,
        scope: &mut Scope,
        at: Location,
    ) -> Option<TypedExpr> {
        let first_slot = scope.len() as u16;
        let mut ranges = Vec::with_capacity(vars.len());
        for (param, type_name) in vars {
            match self.registry.resolve_type(type_name, at) {
                Ok(ty) => {
                    ranges.push(ty);
                    scope.push((param.clone(), ty));
                }
                Err(e) => self.push(e),
            }
        }
        let resolved = if ranges.len() == vars.len() {
            self.resolve(body, scope)
        } else {
            None
        };
        scope.truncate(first_slot as usize);

        let body = resolved?;
        let ty = match op {
            AggOp::Sum | AggOp::Prod => match body.ty {
                ValueType::Int | ValueType::Bool => ValueType::Int,
                ValueType::Real => ValueType::Real,
                other => {
                    self.mismatch(op.prefix(), ValueType::Real, other, at);
                    return None;
                }
            },
            AggOp::Exists | AggOp::Forall => {
                if body.ty != ValueType::Bool {
                    self.mismatch(op.prefix(), ValueType::Bool, body.ty, at);
                    return None;
                }
                ValueType::Bool
            }
        };
        Some(TypedExpr {
            kind: TypedKind::Aggregate {
                op,
                first_slot,
                ranges,
                body: Box::new(body),
            },
            ty,
        })
    }

    fn sample(
        &mut self,
        dist: Distribution,
        args: &[Expr],
        scope: &mut Scope,
        at: Location,
    ) -> Option<TypedExpr> {
        if args.len() != dist.arity() {
            self.push(ModelError::ArityMismatch {
                name: dist.name().to_string(),
                expected: dist.arity(),
                found: args.len(),
                at,
            });
            return None;
        }
        let context = dist.name();
        let ty = match dist {
            Distribution::KronDelta => {
                let arg = self.resolve(&args[0], scope)?;
                if arg.ty == ValueType::Real {
                    self.push(ModelError::TypeMismatch {
                        context: context.to_string(),
                        expected: "bool, int or object".into(),
                        found: "real".into(),
                        at,
                    });
                    return None;
                }
                let ty = arg.ty;
                return Some(TypedExpr {
                    kind: TypedKind::Sample {
                        dist,
                        args: vec![arg],
                    },
                    ty,
                });
            }
            Distribution::Bernoulli => ValueType::Bool,
            Distribution::Normal | Distribution::DiracDelta | Distribution::Uniform => {
                ValueType::Real
            }
        };
        let mut typed = Vec::with_capacity(args.len());
        for arg in args {
            typed.push(self.resolve_numeric(arg, scope, context));
        }
        let typed: Option<Vec<_>> = typed.into_iter().collect();
        Some(TypedExpr {
            kind: TypedKind::Sample { dist, args: typed? },
            ty,
        })
    }

    fn mismatch(&mut self, context: &str, expected: ValueType, found: ValueType, at: Location) {
        self.push(ModelError::TypeMismatch {
            context: context.to_string(),
            expected: self.registry.describe(expected),
            found: self.registry.describe(found),
            at,
        });
    }

    fn push(&mut self, error: ModelError) {
        self.errors.push(error);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TypeClass;
    use crate::symbols::VarDecl;
    use rddl_core::FluentClass;

    struct Fixture {
        registry: TypeRegistry,
        symbols: SymbolTable,
    }

    fn fixture() -> Fixture {
        let at = Location::default();
        let mut registry = TypeRegistry::new();
        let pt = registry.declare_type("pt", TypeClass::Object, at).unwrap();
        let phase = registry.declare_type("phase", TypeClass::Enum, at).unwrap();
        registry.add_object(pt, "p1", at).unwrap();
        registry.add_object(pt, "p2", at).unwrap();
        registry.add_object(phase, "idle", at).unwrap();

        let mut symbols = SymbolTable::new();
        let mut declare = |name: &str,
                           class: FluentClass,
                           value_type: ValueType,
                           params: Vec<TypeId>| {
            symbols
                .declare(VarDecl {
                    name: name.into(),
                    class,
                    value_type,
                    params,
                    default: None,
                    level: None,
                    at,
                })
                .unwrap();
        };
        declare("x", FluentClass::StateFluent, ValueType::Real, vec![]);
        declare("n", FluentClass::StateFluent, ValueType::Int, vec![]);
        declare("flag", FluentClass::ActionFluent, ValueType::Bool, vec![]);
        declare("V", FluentClass::NonFluent, ValueType::Real, vec![pt]);
        declare("mode", FluentClass::StateFluent, ValueType::Object(phase), vec![]);
        Fixture { registry, symbols }
    }

    fn check(src: &str) -> Result<TypedExpr, Vec<ModelError>> {
        let fx = fixture();
        let expr = rddl_lang::parse_expr(src).unwrap();
        let mut errors = Vec::new();
        let typed = Resolver {
            registry: &fx.registry,
            symbols: &fx.symbols,
            errors: &mut errors,
        }
        .resolve(&expr, &mut Scope::new());
        match typed {
            Some(t) if errors.is_empty() => Ok(t),
            _ => Err(errors),
        }
    }

    #[test]
    fn int_and_real_arithmetic_promotes() {
        assert_eq!(check("n + x").unwrap().ty, ValueType::Real);
        assert_eq!(check("n * 2").unwrap().ty, ValueType::Int);
        assert_eq!(check("x > n").unwrap().ty, ValueType::Bool);
    }

    #[test]
    fn bool_in_arithmetic_is_rejected() {
        let errors = check("flag + 1").unwrap_err();
        assert!(matches!(errors[0], ModelError::TypeMismatch { .. }));
    }

    #[test]
    fn every_error_in_an_expression_is_reported() {
        let errors = check("(flag + 1) ^ undefined").unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(matches!(errors[1], ModelError::UnknownVariable { ref name, .. } if name == "undefined"));
    }

    #[test]
    fn object_arguments_resolve_within_the_parameter_type() {
        let typed = check("V(p2)").unwrap();
        match typed.kind {
            TypedKind::Var { args, .. } => {
                assert!(matches!(args[0].kind, TypedKind::Const(Value::Object(_))))
            }
            other => panic!("expected var, got {other:?}"),
        }
        assert!(matches!(
            check("V(p9)").unwrap_err()[0],
            ModelError::UnknownObject { .. }
        ));
    }

    #[test]
    fn arity_is_checked() {
        assert!(matches!(
            check("V").unwrap_err()[0],
            ModelError::ArityMismatch { expected: 1, found: 0, .. }
        ));
    }

    #[test]
    fn aggregation_binds_slots_after_the_enclosing_scope() {
        let typed = check("sum_{?p : pt} V(?p)").unwrap();
        assert_eq!(typed.ty, ValueType::Real);
        match typed.kind {
            TypedKind::Aggregate {
                first_slot, body, ..
            } => {
                assert_eq!(first_slot, 0);
                match body.kind {
                    TypedKind::Var { args, .. } => assert_eq!(args[0].kind, TypedKind::Param(0)),
                    other => panic!("expected var, got {other:?}"),
                }
            }
            other => panic!("expected aggregate, got {other:?}"),
        }
    }

    #[test]
    fn counting_booleans_yields_int() {
        assert_eq!(check("sum_{?p : pt} [V(?p) > 0]").unwrap().ty, ValueType::Int);
    }

    #[test]
    fn parameters_outside_a_binder_are_unbound() {
        assert!(matches!(
            check("V(?q)").unwrap_err()[0],
            ModelError::UnboundParameter { ref name, .. } if name == "?q"
        ));
    }

    #[test]
    fn primed_references_are_rejected() {
        assert!(matches!(
            check("x' + 1").unwrap_err()[0],
            ModelError::PrimedReference { .. }
        ));
    }

    #[test]
    fn enum_comparisons_need_matching_types() {
        assert_eq!(check("mode == @idle").unwrap().ty, ValueType::Bool);
        assert!(check("mode == 1").is_err());
        assert!(check("mode == @busy").is_err());
    }

    #[test]
    fn conditional_branches_must_unify() {
        assert_eq!(check("if (flag) then 1 else 2.5").unwrap().ty, ValueType::Real);
        assert!(check("if (flag) then 1 else flag").is_err());
        assert!(check("if (x) then 1 else 2").is_err());
    }

    #[test]
    fn distribution_result_types() {
        assert_eq!(check("Normal(x, 1)").unwrap().ty, ValueType::Real);
        assert_eq!(check("Bernoulli(0.5)").unwrap().ty, ValueType::Bool);
        assert_eq!(check("KronDelta(n)").unwrap().ty, ValueType::Int);
        assert!(check("KronDelta(x)").is_err());
        assert!(check("Normal(flag, 1)").is_err());
    }
}
