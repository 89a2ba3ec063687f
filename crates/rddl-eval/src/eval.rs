//! Evaluation of typed expressions against an environment.
//!
//! The evaluator is stateless apart from a shared reference to the
//! compiled model. Variable values come from an [`Environment`]; random
//! draws come from a caller-supplied [`RandomSource`], one draw sequence
//! per distribution node per call.

use std::cmp::Ordering;

use rddl_core::{Args, EvalError, Environment, ObjectId, RandomSource, Value, ValueType, VarId};
use rddl_lang::{AggOp, BinaryOp, Distribution, UnaryOp};
use rddl_model::{cross_product, Model, TypedExpr, TypedKind};
use smallvec::SmallVec;

/// Binding slots: CPF parameters first, then aggregation variables.
type Slots = SmallVec<[ObjectId; 8]>;

/// Evaluates [`TypedExpr`]s of one model.
#[derive(Clone, Copy, Debug)]
pub struct Evaluator<'m> {
    model: &'m Model,
}

impl<'m> Evaluator<'m> {
    /// An evaluator over `model`'s grounding.
    pub fn new(model: &'m Model) -> Self {
        Self { model }
    }

    /// The model this evaluator reads declarations from.
    pub fn model(&self) -> &'m Model {
        self.model
    }

    /// Evaluate `expr` with `bindings` in the leading parameter slots.
    ///
    /// Conditionals, `^`, `|`, `=>`, `exists` and `forall` evaluate only
    /// the operands they need, so an error or a random draw in a skipped
    /// branch never happens.
    pub fn evaluate<E, R>(
        &self,
        expr: &TypedExpr,
        bindings: &[ObjectId],
        env: &E,
        rng: &mut R,
    ) -> Result<Value, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        let mut slots: Slots = bindings.iter().copied().collect();
        self.eval(expr, &mut slots, env, rng)
    }

    /// Evaluate a boolean expression.
    pub fn evaluate_bool<E, R>(
        &self,
        expr: &TypedExpr,
        bindings: &[ObjectId],
        env: &E,
        rng: &mut R,
    ) -> Result<bool, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        let v = self.evaluate(expr, bindings, env, rng)?;
        v.as_bool()
            .ok_or_else(|| EvalError::mismatch("condition", "bool", v.kind()))
    }

    /// Evaluate a numeric expression as `f64`.
    pub fn evaluate_real<E, R>(
        &self,
        expr: &TypedExpr,
        bindings: &[ObjectId],
        env: &E,
        rng: &mut R,
    ) -> Result<f64, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        let v = self.evaluate(expr, bindings, env, rng)?;
        numeric("numeric result", v)
    }

    fn eval<E, R>(
        &self,
        expr: &TypedExpr,
        slots: &mut Slots,
        env: &E,
        rng: &mut R,
    ) -> Result<Value, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        match &expr.kind {
            TypedKind::Const(v) => Ok(*v),
            TypedKind::Param(slot) => slots
                .get(*slot as usize)
                .map(|&o| Value::Object(o))
                .ok_or(EvalError::UnboundParameter { slot: *slot }),
            TypedKind::Var { var, args } => {
                let mut objects = Args::with_capacity(args.len());
                for arg in args {
                    let v = self.eval(arg, slots, env, rng)?;
                    let object = v
                        .as_object()
                        .ok_or_else(|| EvalError::mismatch("argument", "object", v.kind()))?;
                    objects.push(object);
                }
                self.lookup(*var, &objects, env)
            }
            TypedKind::Unary { op, operand } => {
                let v = self.eval(operand, slots, env, rng)?;
                match (op, v) {
                    (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
                    (UnaryOp::Neg, Value::Int(i)) => i
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| EvalError::out_of_range("-", format!("-({i}) overflows"))),
                    (UnaryOp::Neg, Value::Real(r)) => Ok(Value::Real(-r)),
                    (UnaryOp::Not, other) => Err(EvalError::mismatch("~", "bool", other.kind())),
                    (UnaryOp::Neg, other) => {
                        Err(EvalError::mismatch("-", "int or real", other.kind()))
                    }
                }
            }
            TypedKind::Binary { op, lhs, rhs } => self.binary(*op, lhs, rhs, slots, env, rng),
            TypedKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                let branch = if self.eval_bool(cond, "if", slots, env, rng)? {
                    then_branch
                } else {
                    else_branch
                };
                let v = self.eval(branch, slots, env, rng)?;
                Ok(v.coerce(expr.ty).unwrap_or(v))
            }
            TypedKind::Aggregate {
                op,
                first_slot,
                ranges,
                body,
            } => self.aggregate(
                *op,
                *first_slot as usize,
                ranges,
                body,
                expr.ty,
                slots,
                env,
                rng,
            ),
            TypedKind::Sample { dist, args } => self.sample(*dist, args, slots, env, rng),
        }
    }

    fn lookup<E>(&self, var: VarId, args: &[ObjectId], env: &E) -> Result<Value, EvalError>
    where
        E: Environment + ?Sized,
    {
        let model = self.model;
        let Some(id) = model.grounding().ground_id(var, args, model.registry()) else {
            let names: Vec<&str> = args
                .iter()
                .map(|&o| model.registry().object_name(o))
                .collect();
            return Err(EvalError::UnboundVariable {
                name: format!("{}({})", model.symbols().name(var), names.join(", ")),
            });
        };
        let value = env.value(id).ok_or_else(|| EvalError::UnboundVariable {
            name: model.ground_name(id),
        })?;
        if let Some(decl) = model.symbols().get(var) {
            if !value.fits(decl.value_type) {
                return Err(EvalError::mismatch(
                    &decl.name,
                    &model.registry().describe(decl.value_type),
                    value.kind(),
                ));
            }
        }
        Ok(value)
    }

    fn eval_bool<E, R>(
        &self,
        expr: &TypedExpr,
        operation: &str,
        slots: &mut Slots,
        env: &E,
        rng: &mut R,
    ) -> Result<bool, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        let v = self.eval(expr, slots, env, rng)?;
        v.as_bool()
            .ok_or_else(|| EvalError::mismatch(operation, "bool", v.kind()))
    }

    fn eval_real<E, R>(
        &self,
        expr: &TypedExpr,
        operation: &str,
        slots: &mut Slots,
        env: &E,
        rng: &mut R,
    ) -> Result<f64, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        let v = self.eval(expr, slots, env, rng)?;
        numeric(operation, v)
    }

    fn binary<E, R>(
        &self,
        op: BinaryOp,
        lhs: &TypedExpr,
        rhs: &TypedExpr,
        slots: &mut Slots,
        env: &E,
        rng: &mut R,
    ) -> Result<Value, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        let sym = op.symbol();
        // Logical connectives decide from the left operand when they can.
        let decided = match op {
            BinaryOp::And => (!self.eval_bool(lhs, sym, slots, env, rng)?).then_some(false),
            BinaryOp::Or => self.eval_bool(lhs, sym, slots, env, rng)?.then_some(true),
            BinaryOp::Implies => (!self.eval_bool(lhs, sym, slots, env, rng)?).then_some(true),
            _ => {
                let l = self.eval(lhs, slots, env, rng)?;
                let r = self.eval(rhs, slots, env, rng)?;
                return apply_binary(op, l, r);
            }
        };
        match decided {
            Some(b) => Ok(Value::Bool(b)),
            None => Ok(Value::Bool(self.eval_bool(rhs, sym, slots, env, rng)?)),
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn aggregate<E, R>(
        &self,
        op: AggOp,
        first: usize,
        ranges: &[rddl_core::TypeId],
        body: &TypedExpr,
        ty: ValueType,
        slots: &mut Slots,
        env: &E,
        rng: &mut R,
    ) -> Result<Value, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        if slots.len() < first {
            return Err(EvalError::UnboundParameter {
                slot: slots.len() as u16,
            });
        }
        let name = op.prefix();
        let tuples = cross_product(self.model.registry(), ranges);
        let bind = |slots: &mut Slots, tuple: &Args| {
            slots.truncate(first);
            slots.extend(tuple.iter().copied());
        };

        let result = match op {
            AggOp::Exists | AggOp::Forall => {
                // exists stops at the first true element, forall at the first false.
                let decisive = op == AggOp::Exists;
                let mut found = false;
                for tuple in &tuples {
                    bind(slots, tuple);
                    if self.eval_bool(body, name, slots, env, rng)? == decisive {
                        found = true;
                        break;
                    }
                }
                Value::Bool(found == decisive)
            }
            AggOp::Sum | AggOp::Prod if ty == ValueType::Int => {
                let mut acc: i64 = if op == AggOp::Sum { 0 } else { 1 };
                for tuple in &tuples {
                    bind(slots, tuple);
                    let x = match self.eval(body, slots, env, rng)? {
                        Value::Int(i) => i,
                        Value::Bool(b) => i64::from(b),
                        other => return Err(EvalError::mismatch(name, "int", other.kind())),
                    };
                    let next = if op == AggOp::Sum {
                        acc.checked_add(x)
                    } else {
                        acc.checked_mul(x)
                    };
                    acc = next.ok_or_else(|| EvalError::out_of_range(name, "integer overflow"))?;
                }
                Value::Int(acc)
            }
            AggOp::Sum | AggOp::Prod => {
                let mut acc: f64 = if op == AggOp::Sum { 0.0 } else { 1.0 };
                for tuple in &tuples {
                    bind(slots, tuple);
                    let x = self.eval_real(body, name, slots, env, rng)?;
                    if op == AggOp::Sum {
                        acc += x;
                    } else {
                        acc *= x;
                    }
                }
                Value::Real(acc)
            }
        };
        slots.truncate(first);
        Ok(result)
    }

    fn sample<E, R>(
        &self,
        dist: Distribution,
        args: &[TypedExpr],
        slots: &mut Slots,
        env: &E,
        rng: &mut R,
    ) -> Result<Value, EvalError>
    where
        E: Environment + ?Sized,
        R: RandomSource + ?Sized,
    {
        let name = dist.name();
        if args.len() != dist.arity() {
            return Err(EvalError::out_of_range(
                name,
                format!("expected {} parameter(s), got {}", dist.arity(), args.len()),
            ));
        }
        match dist {
            Distribution::KronDelta => self.eval(&args[0], slots, env, rng),
            Distribution::DiracDelta => Ok(Value::Real(
                self.eval_real(&args[0], name, slots, env, rng)?,
            )),
            Distribution::Normal => {
                let mean = self.eval_real(&args[0], name, slots, env, rng)?;
                let variance = self.eval_real(&args[1], name, slots, env, rng)?;
                if variance.is_nan() || variance < 0.0 {
                    return Err(EvalError::out_of_range(
                        name,
                        format!("variance {variance} is negative"),
                    ));
                }
                let z = rng.next_standard_normal();
                Ok(Value::Real(mean + variance.sqrt() * z))
            }
            Distribution::Bernoulli => {
                let p = self.eval_real(&args[0], name, slots, env, rng)?;
                if !(0.0..=1.0).contains(&p) {
                    return Err(EvalError::out_of_range(
                        name,
                        format!("probability {p} is outside [0, 1]"),
                    ));
                }
                Ok(Value::Bool(rng.next_uniform() < p))
            }
            Distribution::Uniform => {
                let low = self.eval_real(&args[0], name, slots, env, rng)?;
                let high = self.eval_real(&args[1], name, slots, env, rng)?;
                if low.is_nan() || high.is_nan() || low > high {
                    return Err(EvalError::out_of_range(
                        name,
                        format!("low {low} exceeds high {high}"),
                    ));
                }
                Ok(Value::Real(low + (high - low) * rng.next_uniform()))
            }
        }
    }
}

// ── Operators ──────────────────────────────────────────────────────

/// Apply a binary operator to two evaluated operands.
///
/// `Int op Int` stays integral with overflow and division by zero
/// reported as [`EvalError::DomainOutOfRange`]; any real operand promotes
/// to IEEE-754 arithmetic. Logical operators are applied strictly here;
/// the evaluator short-circuits them before calling this.
pub fn apply_binary(op: BinaryOp, l: Value, r: Value) -> Result<Value, EvalError> {
    let sym = op.symbol();
    match op {
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => arithmetic(op, l, r),
        BinaryOp::Eq => equal(sym, l, r).map(Value::Bool),
        BinaryOp::Ne => equal(sym, l, r).map(|eq| Value::Bool(!eq)),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let holds = compare(sym, l, r)?.is_some_and(|o| match op {
                BinaryOp::Lt => o == Ordering::Less,
                BinaryOp::Le => o != Ordering::Greater,
                BinaryOp::Gt => o == Ordering::Greater,
                _ => o != Ordering::Less,
            });
            Ok(Value::Bool(holds))
        }
        BinaryOp::And | BinaryOp::Or | BinaryOp::Implies | BinaryOp::Equiv => {
            let a = boolean(sym, l)?;
            let b = boolean(sym, r)?;
            Ok(Value::Bool(match op {
                BinaryOp::And => a && b,
                BinaryOp::Or => a || b,
                BinaryOp::Implies => !a || b,
                _ => a == b,
            }))
        }
    }
}

fn arithmetic(op: BinaryOp, l: Value, r: Value) -> Result<Value, EvalError> {
    let sym = op.symbol();
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        let result = match op {
            BinaryOp::Add => a.checked_add(b),
            BinaryOp::Sub => a.checked_sub(b),
            BinaryOp::Mul => a.checked_mul(b),
            _ => {
                if b == 0 {
                    return Err(EvalError::out_of_range(sym, "integer division by zero"));
                }
                a.checked_div(b)
            }
        };
        return result
            .map(Value::Int)
            .ok_or_else(|| EvalError::out_of_range(sym, format!("{a} {sym} {b} overflows")));
    }
    let a = numeric(sym, l)?;
    let b = numeric(sym, r)?;
    Ok(Value::Real(match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        _ => a / b,
    }))
}

fn equal(sym: &str, l: Value, r: Value) -> Result<bool, EvalError> {
    match (l, r) {
        (Value::Int(a), Value::Int(b)) => Ok(a == b),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::Object(a), Value::Object(b)) => Ok(a == b),
        _ => match (l.as_real(), r.as_real()) {
            (Some(a), Some(b)) => Ok(a == b),
            _ => Err(EvalError::mismatch(sym, l.kind(), r.kind())),
        },
    }
}

/// `None` when either side is NaN.
fn compare(sym: &str, l: Value, r: Value) -> Result<Option<Ordering>, EvalError> {
    if let (Value::Int(a), Value::Int(b)) = (l, r) {
        return Ok(Some(a.cmp(&b)));
    }
    let a = numeric(sym, l)?;
    let b = numeric(sym, r)?;
    Ok(a.partial_cmp(&b))
}

fn numeric(operation: &str, v: Value) -> Result<f64, EvalError> {
    v.as_real()
        .ok_or_else(|| EvalError::mismatch(operation, "int or real", v.kind()))
}

fn boolean(operation: &str, v: Value) -> Result<bool, EvalError> {
    v.as_bool()
        .ok_or_else(|| EvalError::mismatch(operation, "bool", v.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rddl_model::Valuation;
    use rddl_test_utils::{NoNoise, ScriptedSource, MARS_ROVER};

    fn rover() -> Model {
        let file = rddl_lang::parse(MARS_ROVER).unwrap();
        Model::compile(&file.domains[0], &file.non_fluents[0], &file.instances[0]).unwrap()
    }

    fn typed(model: &Model, src: &str) -> TypedExpr {
        model
            .resolve_expr(&rddl_lang::parse_expr(src).unwrap())
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Initial valuation plus default actions.
    fn env(model: &Model) -> Valuation {
        let mut env = model.initial_valuation().clone();
        for name in ["xMove", "yMove", "snapPicture"] {
            let id = model.ground(name, &[]).unwrap();
            env.set(id, model.default_of(id).unwrap());
        }
        env
    }

    fn eval(src: &str) -> Result<Value, EvalError> {
        let model = rover();
        let expr = typed(&model, src);
        Evaluator::new(&model).evaluate(&expr, &[], &env(&model), &mut NoNoise::new())
    }

    #[test]
    fn result_mismatches_name_the_expected_kind() {
        let model = rover();
        let ev = Evaluator::new(&model);
        let env = env(&model);
        let flag = typed(&model, "snapPicture");
        assert_eq!(
            ev.evaluate_real(&flag, &[], &env, &mut NoNoise::new()),
            Err(EvalError::mismatch("numeric result", "int or real", "bool"))
        );
        let pos = typed(&model, "xPos");
        assert_eq!(
            ev.evaluate_bool(&pos, &[], &env, &mut NoNoise::new()),
            Err(EvalError::mismatch("condition", "bool", "real"))
        );
    }

    #[test]
    fn integer_arithmetic_stays_integral() {
        assert_eq!(eval("7 / 2"), Ok(Value::Int(3)));
        assert_eq!(eval("7 - 2 * 3"), Ok(Value::Int(1)));
        assert_eq!(eval("7 / 2.0"), Ok(Value::Real(3.5)));
    }

    #[test]
    fn integer_division_by_zero_is_out_of_range() {
        assert!(matches!(
            eval("1 / 0"),
            Err(EvalError::DomainOutOfRange { ref operation, .. }) if operation == "/"
        ));
        assert_eq!(eval("1.0 / 0"), Ok(Value::Real(f64::INFINITY)));
    }

    #[test]
    fn integer_overflow_is_out_of_range() {
        assert!(matches!(
            eval("9223372036854775807 + 1"),
            Err(EvalError::DomainOutOfRange { .. })
        ));
    }

    #[test]
    fn comparisons_promote_mixed_operands() {
        assert_eq!(eval("1 == 1.0"), Ok(Value::Bool(true)));
        assert_eq!(eval("2 > 1.5"), Ok(Value::Bool(true)));
        assert_eq!(eval("MAX_TIME ~= 12"), Ok(Value::Bool(false)));
    }

    #[test]
    fn conditionals_short_circuit() {
        assert_eq!(eval("if (true) then 1 else 1 / 0"), Ok(Value::Int(1)));
        assert_eq!(eval("if (false) then Normal(0, -1) else 2.0"), Ok(Value::Real(2.0)));
    }

    #[test]
    fn logical_connectives_short_circuit() {
        assert_eq!(eval("false ^ (1 / 0 == 0)"), Ok(Value::Bool(false)));
        assert_eq!(eval("true | (1 / 0 == 0)"), Ok(Value::Bool(true)));
        assert_eq!(eval("false => (1 / 0 == 0)"), Ok(Value::Bool(true)));
        assert!(eval("true ^ (1 / 0 == 0)").is_err());
    }

    #[test]
    fn conditional_results_take_the_static_type() {
        assert_eq!(eval("if (true) then 1 else 2.5"), Ok(Value::Real(1.0)));
    }

    #[test]
    fn quantifier_visits_every_object_once() {
        assert_eq!(eval("sum_{?p : picture-point} [1]"), Ok(Value::Int(3)));
        assert_eq!(
            eval("sum_{?p : picture-point} [PICT_VALUE(?p)]"),
            Ok(Value::Real(22.0))
        );
        assert_eq!(
            eval("prod_{?p : picture-point, ?q : picture-point} [2]"),
            Ok(Value::Int(512))
        );
    }

    #[test]
    fn existential_and_universal_quantifiers() {
        assert_eq!(
            eval("exists_{?p : picture-point} [PICT_VALUE(?p) > 9.0]"),
            Ok(Value::Bool(true))
        );
        assert_eq!(
            eval("forall_{?p : picture-point} [PICT_VALUE(?p) > 9.0]"),
            Ok(Value::Bool(false))
        );
        // The decisive element comes before the failing division.
        assert_eq!(
            eval("exists_{?p : picture-point} [(PICT_VALUE(?p) == 5.0) | (1 / 0 == 0)]"),
            Ok(Value::Bool(true))
        );
    }

    #[test]
    fn missing_values_are_unbound() {
        let model = rover();
        let expr = typed(&model, "xPos + 1");
        let empty = Valuation::new(model.grounding().len());
        let err = Evaluator::new(&model)
            .evaluate(&expr, &[], &empty, &mut NoNoise::new())
            .unwrap_err();
        assert_eq!(
            err,
            EvalError::UnboundVariable {
                name: "xPos".into()
            }
        );
    }

    #[test]
    fn mistyped_environment_values_are_rejected() {
        let model = rover();
        let mut bad = env(&model);
        bad.set(model.ground("xPos", &[]).unwrap(), Value::Bool(true));
        let expr = typed(&model, "xPos + 1");
        assert!(matches!(
            Evaluator::new(&model).evaluate(&expr, &[], &bad, &mut NoNoise::new()),
            Err(EvalError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn distribution_parameters_are_checked() {
        for src in ["Normal(0, -1)", "Bernoulli(1.5)", "Uniform(2, 1)"] {
            assert!(
                matches!(eval(src), Err(EvalError::DomainOutOfRange { .. })),
                "{src}"
            );
        }
    }

    #[test]
    fn distributions_draw_from_the_injected_source() {
        let model = rover();
        let ev = Evaluator::new(&model);
        let env = env(&model);

        let normal = typed(&model, "Normal(1.0, 4.0)");
        let mut rng = ScriptedSource::new().with_normals([0.5]);
        assert_eq!(ev.evaluate(&normal, &[], &env, &mut rng), Ok(Value::Real(2.0)));
        assert_eq!(rng.normal_draws, 1);

        let coin = typed(&model, "Bernoulli(0.3)");
        let mut rng = ScriptedSource::new().with_uniforms([0.2, 0.4]);
        assert_eq!(ev.evaluate(&coin, &[], &env, &mut rng), Ok(Value::Bool(true)));
        assert_eq!(ev.evaluate(&coin, &[], &env, &mut rng), Ok(Value::Bool(false)));

        let uniform = typed(&model, "Uniform(-1.0, 3.0)");
        let mut rng = ScriptedSource::new().with_uniforms([0.25]);
        assert_eq!(ev.evaluate(&uniform, &[], &env, &mut rng), Ok(Value::Real(0.0)));
    }

    #[test]
    fn point_masses_do_not_draw() {
        let model = rover();
        let expr = typed(&model, "DiracDelta(time + 0.25)");
        let mut rng = ScriptedSource::new();
        let v = Evaluator::new(&model).evaluate(&expr, &[], &env(&model), &mut rng);
        assert_eq!(v, Ok(Value::Real(0.25)));
        assert_eq!(rng.normal_draws + rng.uniform_draws, 0);
    }

    #[test]
    fn apply_binary_is_strict_for_logical_operators() {
        assert_eq!(
            apply_binary(BinaryOp::Equiv, Value::Bool(false), Value::Bool(false)),
            Ok(Value::Bool(true))
        );
        assert!(apply_binary(BinaryOp::And, Value::Bool(true), Value::Int(1)).is_err());
    }

    #[test]
    fn nan_comparisons_are_false() {
        let nan = Value::Real(f64::NAN);
        for op in [BinaryOp::Lt, BinaryOp::Le, BinaryOp::Gt, BinaryOp::Ge] {
            assert_eq!(apply_binary(op, nan, Value::Real(0.0)), Ok(Value::Bool(false)));
        }
    }
}
