//! Model compilation: declarations, type checking, validation, grounding.
//!
//! Errors are collected into one list across every phase. A phase whose
//! inputs failed to resolve skips the dependent work rather than
//! reporting knock-on errors for it.

use std::collections::HashSet;

use rddl_core::{
    Args, FluentClass, GroundId, Location, ModelError, TypeId, ValidationErrors, Value, ValueType,
    VarId,
};
use rddl_lang::{Assignment, Domain, Expr, Instance, Literal, NonFluents, TypeKind};

use crate::config::InstanceConfig;
use crate::ground::Grounding;
use crate::model::{Constraint, ConstraintKind, GroundCpf, LiftedCpf, Model};
use crate::registry::{TypeClass, TypeRegistry};
use crate::resolve::{Resolver, Scope};
use crate::symbols::{SymbolTable, VarDecl};
use crate::valuation::Valuation;

pub(crate) fn compile(
    domain: &Domain,
    non_fluents: &NonFluents,
    instance: &Instance,
) -> Result<Model, ValidationErrors> {
    let mut errors = Vec::new();

    check_references(domain, non_fluents, instance, &mut errors);
    let registry = build_registry(domain, non_fluents, instance, &mut errors);
    let symbols = declare_variables(domain, &registry, &mut errors);

    let (cpfs, cpf_of) = resolve_cpfs(domain, &registry, &symbols, &mut errors);
    let mut resolver = Resolver {
        registry: &registry,
        symbols: &symbols,
        errors: &mut errors,
    };
    let reward = domain
        .reward
        .as_ref()
        .and_then(|e| resolver.resolve_numeric(e, &mut Scope::new(), "reward"));
    let mut constraints = closed_checks(
        &mut resolver,
        &domain.constraints,
        ConstraintKind::StateAction,
    );
    constraints.extend(closed_checks(
        &mut resolver,
        &domain.action_preconditions,
        ConstraintKind::Precondition,
    ));
    let invariants = closed_checks(
        &mut resolver,
        &domain.state_invariants,
        ConstraintKind::Invariant,
    );
    check_state_reads(&symbols, &invariants, &mut errors);

    let derived_order = match derived_order(&symbols, &cpfs, &cpf_of) {
        Ok(order) => order,
        Err(e) => {
            errors.push(e);
            Vec::new()
        }
    };

    let config = InstanceConfig::from_instance(instance).map_err(|e| {
        ModelError::InvalidInstanceConfig {
            reason: e.to_string(),
        }
    });

    let grounding = match Grounding::build(&symbols, &registry) {
        Ok(g) => g,
        Err(e) => {
            errors.push(e);
            errors.extend(config.err());
            return Err(fail(errors));
        }
    };
    let initial = initial_valuation(
        non_fluents,
        instance,
        &registry,
        &symbols,
        &grounding,
        &mut errors,
    );

    let config = match config {
        Ok(c) => c,
        Err(e) => {
            errors.push(e);
            return Err(fail(errors));
        }
    };
    if !errors.is_empty() {
        return Err(fail(errors));
    }

    let ground = |var: VarId| -> Vec<GroundCpf> {
        let Some(cpf) = cpf_of.get(var.0 as usize).copied().flatten() else {
            return Vec::new();
        };
        grounding
            .ids_of(var)
            .filter_map(|id| {
                grounding.get(id).map(|g| GroundCpf {
                    target: id,
                    cpf,
                    bindings: g.args.clone(),
                })
            })
            .collect()
    };
    let derived: Vec<GroundCpf> = derived_order.iter().flat_map(|&v| ground(v)).collect();
    let transitions: Vec<GroundCpf> = symbols
        .iter()
        .filter(|(_, d)| d.class == FluentClass::StateFluent)
        .flat_map(|(v, _)| ground(v))
        .collect();

    tracing::info!(
        domain = %domain.name,
        instance = %instance.name,
        types = registry.type_count(),
        objects = registry.object_count(),
        variables = symbols.len(),
        grounded = grounding.len(),
        derived = derived.len(),
        transitions = transitions.len(),
        horizon = config.horizon,
        "compiled model"
    );

    Ok(Model {
        domain_name: domain.name.clone(),
        non_fluents_name: non_fluents.name.clone(),
        instance_name: instance.name.clone(),
        requirements: domain.requirements.clone(),
        registry,
        symbols,
        grounding,
        cpfs,
        derived,
        transitions,
        reward,
        constraints,
        invariants,
        initial,
        config,
    })
}

fn fail(errors: Vec<ModelError>) -> ValidationErrors {
    tracing::debug!(errors = errors.len(), "model validation failed");
    ValidationErrors(errors)
}

// ── Block references ───────────────────────────────────────────────

fn check_references(
    domain: &Domain,
    non_fluents: &NonFluents,
    instance: &Instance,
    errors: &mut Vec<ModelError>,
) {
    if non_fluents.domain != domain.name {
        errors.push(ModelError::BlockMismatch {
            block: format!("non-fluents {}", non_fluents.name),
            expected: domain.name.clone(),
            found: non_fluents.domain.clone(),
        });
    }
    if instance.domain != domain.name {
        errors.push(ModelError::BlockMismatch {
            block: format!("instance {}", instance.name),
            expected: domain.name.clone(),
            found: instance.domain.clone(),
        });
    }
    let named = instance.non_fluents.as_deref().unwrap_or("");
    if named != non_fluents.name {
        errors.push(ModelError::BlockMismatch {
            block: format!("instance {}", instance.name),
            expected: non_fluents.name.clone(),
            found: named.to_string(),
        });
    }
}

// ── Types and objects ──────────────────────────────────────────────

fn build_registry(
    domain: &Domain,
    non_fluents: &NonFluents,
    instance: &Instance,
    errors: &mut Vec<ModelError>,
) -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    for decl in &domain.types {
        let at = decl.span.location();
        let class = match decl.kind {
            TypeKind::Object => TypeClass::Object,
            TypeKind::Enum(_) => TypeClass::Enum,
        };
        let ty = match registry.declare_type(&decl.name, class, at) {
            Ok(ty) => ty,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        if let TypeKind::Enum(literals) = &decl.kind {
            for literal in literals {
                if let Err(e) = registry.add_object(ty, literal, at) {
                    errors.push(e);
                }
            }
        }
    }

    for objects in non_fluents.objects.iter().chain(&instance.objects) {
        let at = objects.span.location();
        let ty = match registry.resolve_type(&objects.type_name, at) {
            Ok(ty) => ty,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        if registry.get(ty).map(|t| t.class) == Some(TypeClass::Enum) {
            errors.push(ModelError::TypeMismatch {
                context: format!("objects of '{}'", objects.type_name),
                expected: "object type".into(),
                found: "enumeration".into(),
                at,
            });
            continue;
        }
        for name in &objects.objects {
            if let Err(e) = registry.add_object(ty, name, at) {
                errors.push(e);
            }
        }
    }
    registry
}

// ── Variables ──────────────────────────────────────────────────────

fn declare_variables(
    domain: &Domain,
    registry: &TypeRegistry,
    errors: &mut Vec<ModelError>,
) -> SymbolTable {
    let mut symbols = SymbolTable::new();
    for pvar in &domain.pvariables {
        let at = pvar.span.location();

        let mut params = Vec::with_capacity(pvar.params.len());
        for name in &pvar.params {
            match registry.resolve_type(name, at) {
                Ok(ty) => params.push(ty),
                Err(e) => errors.push(e),
            }
        }
        let value_type = match registry.resolve_value_type(&pvar.range, at) {
            Ok(ty) => Some(ty),
            Err(e) => {
                errors.push(e);
                None
            }
        };

        let default = match (&pvar.default, value_type) {
            (None, _) if pvar.class.requires_default() => {
                errors.push(ModelError::MissingDefault {
                    name: pvar.name.clone(),
                    at,
                });
                None
            }
            (Some(lit), Some(ty)) => {
                let context = format!("default of '{}'", pvar.name);
                match literal_value(lit, ty, registry, &context, at) {
                    Ok(v) => Some(v),
                    Err(e) => {
                        errors.push(e);
                        None
                    }
                }
            }
            _ => None,
        };

        // Declared even with a bad default, so uses of the name do not
        // also report it as unknown.
        let Some(value_type) = value_type else {
            continue;
        };
        if params.len() != pvar.params.len() {
            continue;
        }
        let decl = VarDecl {
            name: pvar.name.clone(),
            class: pvar.class,
            value_type,
            params,
            default,
            level: pvar.level,
            at,
        };
        if let Err(e) = symbols.declare(decl) {
            errors.push(e);
        }
    }
    symbols
}

/// Convert a literal for storage in a slot of type `ty`.
fn literal_value(
    literal: &Literal,
    ty: ValueType,
    registry: &TypeRegistry,
    context: &str,
    at: Location,
) -> Result<Value, ModelError> {
    let value = match (literal, ty) {
        (Literal::Bool(b), ValueType::Bool) => Value::Bool(*b),
        (Literal::Int(i), ValueType::Int) => Value::Int(*i),
        (Literal::Int(i), ValueType::Real) => Value::Real(*i as f64),
        (Literal::Real(r), ValueType::Real) => Value::Real(*r),
        (Literal::Enum(name) | Literal::Object(name), ValueType::Object(t)) => {
            Value::Object(registry.resolve_object(name, t, at)?)
        }
        (other, _) => {
            let found = match other {
                Literal::Bool(_) => "bool",
                Literal::Int(_) => "int",
                Literal::Real(_) => "real",
                Literal::Enum(_) => "enumeration literal",
                Literal::Object(_) => "object",
            };
            return Err(ModelError::TypeMismatch {
                context: context.to_string(),
                expected: registry.describe(ty),
                found: found.into(),
                at,
            });
        }
    };
    Ok(value)
}

// ── CPFs, reward, constraints ──────────────────────────────────────

/// Placeholder index for a CPF that was written but failed to check, so
/// its target is not also reported as missing.
const REJECTED: usize = usize::MAX;

/// Type-check every CPF. Returns the lifted CPFs and, per variable, the
/// index of its CPF.
fn resolve_cpfs(
    domain: &Domain,
    registry: &TypeRegistry,
    symbols: &SymbolTable,
    errors: &mut Vec<ModelError>,
) -> (Vec<LiftedCpf>, Vec<Option<usize>>) {
    let mut cpfs = Vec::new();
    let mut cpf_of: Vec<Option<usize>> = vec![None; symbols.len()];

    for cpf in &domain.cpfs {
        let at = cpf.span.location();
        let (var, decl) = match symbols.lookup(&cpf.target, at) {
            Ok(found) => found,
            Err(e) => {
                errors.push(e);
                continue;
            }
        };
        let prime_ok = match decl.class {
            FluentClass::StateFluent => cpf.primed,
            FluentClass::DerivedFluent => !cpf.primed,
            FluentClass::NonFluent | FluentClass::ActionFluent => false,
        };
        let slot = var.0 as usize;
        if !prime_ok {
            errors.push(ModelError::InvalidCpfTarget {
                name: cpf.target.clone(),
                class: decl.class,
                at,
            });
            if decl.class.has_cpf() {
                cpf_of[slot].get_or_insert(REJECTED);
            }
            continue;
        }
        if cpf_of[slot].is_some() {
            errors.push(ModelError::DuplicateDeclaration {
                kind: "cpf",
                name: cpf.target.clone(),
                at,
            });
            continue;
        }
        if cpf.params.len() != decl.arity() {
            errors.push(ModelError::ParameterMismatch {
                name: cpf.target.clone(),
                reason: format!(
                    "expected {} parameter(s), found {}",
                    decl.arity(),
                    cpf.params.len()
                ),
                at,
            });
            cpf_of[slot] = Some(REJECTED);
            continue;
        }
        let mut seen = HashSet::new();
        if let Some(dup) = cpf.params.iter().find(|p| !seen.insert(p.as_str())) {
            errors.push(ModelError::ParameterMismatch {
                name: cpf.target.clone(),
                reason: format!("parameter '?{dup}' appears more than once"),
                at,
            });
            cpf_of[slot] = Some(REJECTED);
            continue;
        }

        let mut scope: Scope = cpf
            .params
            .iter()
            .cloned()
            .zip(decl.params.iter().copied())
            .collect();
        let context = format!("cpf '{}'", cpf.target);
        let mut resolver = Resolver {
            registry,
            symbols,
            errors: &mut *errors,
        };
        match resolver.resolve_as(&cpf.expr, &mut scope, decl.value_type, &context) {
            Some(expr) => {
                cpf_of[slot] = Some(cpfs.len());
                cpfs.push(LiftedCpf {
                    target: var,
                    expr,
                    at,
                });
            }
            None => cpf_of[slot] = Some(REJECTED),
        }
    }

    for (var, decl) in symbols.iter() {
        if decl.class.has_cpf() && cpf_of[var.0 as usize].is_none() {
            errors.push(ModelError::MissingCpf {
                name: decl.name.clone(),
                at: decl.at,
            });
        }
    }
    for slot in &mut cpf_of {
        if *slot == Some(REJECTED) {
            *slot = None;
        }
    }
    (cpfs, cpf_of)
}

fn closed_checks(
    resolver: &mut Resolver<'_>,
    exprs: &[Expr],
    kind: ConstraintKind,
) -> Vec<Constraint> {
    exprs
        .iter()
        .filter_map(|e| {
            resolver
                .resolve_as(e, &mut Scope::new(), ValueType::Bool, kind.keyword())
                .map(|expr| Constraint {
                    kind,
                    expr,
                    at: e.span.location(),
                })
        })
        .collect()
}

/// Invariants are checked against a bare state, so they may read only
/// state-fluents and non-fluents.
fn check_state_reads(
    symbols: &SymbolTable,
    invariants: &[Constraint],
    errors: &mut Vec<ModelError>,
) {
    for inv in invariants {
        let mut seen = Vec::new();
        inv.expr.for_each_var(&mut |v| {
            let Some(decl) = symbols.get(v) else { return };
            if matches!(
                decl.class,
                FluentClass::ActionFluent | FluentClass::DerivedFluent
            ) && !seen.contains(&v)
            {
                seen.push(v);
                errors.push(ModelError::InvalidReference {
                    name: decl.name.clone(),
                    class: decl.class,
                    context: inv.kind.keyword(),
                    at: inv.at,
                });
            }
        });
    }
}

// ── Derived-fluent ordering ────────────────────────────────────────

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    Active,
    Done,
}

struct TopoSort<'a> {
    symbols: &'a SymbolTable,
    cpfs: &'a [LiftedCpf],
    cpf_of: &'a [Option<usize>],
    marks: Vec<Mark>,
    stack: Vec<VarId>,
    order: Vec<VarId>,
}

impl TopoSort<'_> {
    fn visit(&mut self, var: VarId) -> Result<(), ModelError> {
        match self.marks[var.0 as usize] {
            Mark::Done => return Ok(()),
            Mark::Active => {
                let start = self.stack.iter().position(|&v| v == var).unwrap_or(0);
                let mut cycle: Vec<String> = self.stack[start..]
                    .iter()
                    .map(|&v| self.symbols.name(v).to_string())
                    .collect();
                cycle.push(self.symbols.name(var).to_string());
                return Err(ModelError::CyclicDerived { cycle });
            }
            Mark::Unvisited => {}
        }
        self.marks[var.0 as usize] = Mark::Active;
        self.stack.push(var);

        let mut deps = Vec::new();
        if let Some(cpf) = self.cpf_of[var.0 as usize].and_then(|i| self.cpfs.get(i)) {
            let symbols = self.symbols;
            cpf.expr.for_each_var(&mut |v| {
                if symbols.get(v).map(|d| d.class) == Some(FluentClass::DerivedFluent)
                    && !deps.contains(&v)
                {
                    deps.push(v);
                }
            });
        }
        for dep in deps {
            self.visit(dep)?;
        }

        self.stack.pop();
        self.marks[var.0 as usize] = Mark::Done;
        self.order.push(var);
        Ok(())
    }
}

/// Derived fluents ordered so every one follows the derived fluents it
/// reads. Ties keep declaration order.
fn derived_order(
    symbols: &SymbolTable,
    cpfs: &[LiftedCpf],
    cpf_of: &[Option<usize>],
) -> Result<Vec<VarId>, ModelError> {
    let mut sort = TopoSort {
        symbols,
        cpfs,
        cpf_of,
        marks: vec![Mark::Unvisited; symbols.len()],
        stack: Vec::new(),
        order: Vec::new(),
    };
    for (var, decl) in symbols.iter() {
        if decl.class == FluentClass::DerivedFluent {
            sort.visit(var)?;
        }
    }
    Ok(sort.order)
}

// ── Initial valuation ──────────────────────────────────────────────

fn initial_valuation(
    non_fluents: &NonFluents,
    instance: &Instance,
    registry: &TypeRegistry,
    symbols: &SymbolTable,
    grounding: &Grounding,
    errors: &mut Vec<ModelError>,
) -> Valuation {
    let mut valuation = Valuation::new(grounding.len());
    for (id, g) in grounding.iter() {
        if let Some(decl) = symbols.get(g.var) {
            if matches!(decl.class, FluentClass::NonFluent | FluentClass::StateFluent) {
                if let Some(default) = decl.default {
                    valuation.set(id, default);
                }
            }
        }
    }

    let blocks = [
        (&non_fluents.values, FluentClass::NonFluent, "non-fluents"),
        (&instance.init_state, FluentClass::StateFluent, "init-state"),
    ];
    for (assignments, class, block) in blocks {
        let mut assigned = HashSet::new();
        for assignment in assignments {
            match assign(assignment, class, block, registry, symbols, grounding) {
                Ok((id, value)) => {
                    if !assigned.insert(id) {
                        errors.push(ModelError::DuplicateDeclaration {
                            kind: "value",
                            name: grounding.name(id, symbols, registry),
                            at: assignment.span.location(),
                        });
                    }
                    valuation.set(id, value);
                }
                Err(e) => errors.push(e),
            }
        }
    }
    valuation
}

fn assign(
    assignment: &Assignment,
    class: FluentClass,
    block: &'static str,
    registry: &TypeRegistry,
    symbols: &SymbolTable,
    grounding: &Grounding,
) -> Result<(GroundId, Value), ModelError> {
    let at = assignment.span.location();
    let (var, decl) = symbols.lookup(&assignment.name, at)?;
    if decl.class != class {
        return Err(ModelError::InvalidAssignment {
            name: assignment.name.clone(),
            class: decl.class,
            block,
            at,
        });
    }
    if decl.arity() != assignment.args.len() {
        return Err(ModelError::ArityMismatch {
            name: assignment.name.clone(),
            expected: decl.arity(),
            found: assignment.args.len(),
            at,
        });
    }
    let args = assignment
        .args
        .iter()
        .zip(&decl.params)
        .map(|(name, &ty): (&String, &TypeId)| registry.resolve_object(name, ty, at))
        .collect::<Result<Args, _>>()?;
    let context = format!("value of '{}'", assignment.name);
    let value = literal_value(&assignment.value, decl.value_type, registry, &context, at)?;
    let id = grounding
        .ground_id(var, &args, registry)
        .ok_or_else(|| ModelError::UnknownVariable {
            name: assignment.name.clone(),
            at,
        })?;
    Ok((id, value))
}
