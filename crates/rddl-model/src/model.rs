//! The compiled, grounded model.

use rddl_core::{Args, FluentClass, GroundId, Location, Value, ValidationErrors, VarId};
use rddl_lang::{Domain, Expr, Instance, NonFluents};

use crate::config::InstanceConfig;
use crate::expr::TypedExpr;
use crate::ground::Grounding;
use crate::registry::TypeRegistry;
use crate::resolve::{Resolver, Scope};
use crate::symbols::{SymbolTable, VarDecl};
use crate::valuation::Valuation;

/// A type-checked CPF. Its parameters occupy binding slots
/// `0..arity` in the target's signature order.
#[derive(Clone, Debug, PartialEq)]
pub struct LiftedCpf {
    /// Defined variable.
    pub target: VarId,
    /// Defining expression.
    pub expr: TypedExpr,
    /// Location of the CPF.
    pub at: Location,
}

/// One grounded CPF: the lifted expression with its parameters bound.
#[derive(Clone, Debug, PartialEq)]
pub struct GroundCpf {
    /// Grounded target instance.
    pub target: GroundId,
    /// Index into [`Model::cpfs`].
    pub cpf: usize,
    /// Objects bound to the CPF's parameter slots.
    pub bindings: Args,
}

/// Which section a boolean check came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ConstraintKind {
    /// `state-action-constraints`
    StateAction,
    /// `action-preconditions`
    Precondition,
    /// `state-invariants`
    Invariant,
}

impl ConstraintKind {
    /// Section keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::StateAction => "state-action-constraints",
            Self::Precondition => "action-preconditions",
            Self::Invariant => "state-invariants",
        }
    }
}

/// A closed boolean check.
#[derive(Clone, Debug, PartialEq)]
pub struct Constraint {
    /// Originating section.
    pub kind: ConstraintKind,
    /// Boolean expression with no free parameters.
    pub expr: TypedExpr,
    /// Location of the expression.
    pub at: Location,
}

/// A domain compiled against one non-fluents block and one instance.
///
/// Immutable once built. Holds the lifted declarations, the grounded
/// variable arena, grounded CPFs in evaluation order, and the initial
/// valuation (non-fluents and state-fluents).
#[derive(Clone, Debug)]
pub struct Model {
    pub(crate) domain_name: String,
    pub(crate) non_fluents_name: String,
    pub(crate) instance_name: String,
    pub(crate) requirements: Vec<String>,
    pub(crate) registry: TypeRegistry,
    pub(crate) symbols: SymbolTable,
    pub(crate) grounding: Grounding,
    pub(crate) cpfs: Vec<LiftedCpf>,
    pub(crate) derived: Vec<GroundCpf>,
    pub(crate) transitions: Vec<GroundCpf>,
    pub(crate) reward: Option<TypedExpr>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) invariants: Vec<Constraint>,
    pub(crate) initial: Valuation,
    pub(crate) config: InstanceConfig,
}

impl Model {
    /// Resolve, type-check, validate and ground a model.
    ///
    /// Every semantic problem is collected; on failure the returned
    /// [`ValidationErrors`] lists all of them in discovery order.
    pub fn compile(
        domain: &Domain,
        non_fluents: &NonFluents,
        instance: &Instance,
    ) -> Result<Self, ValidationErrors> {
        crate::compile::compile(domain, non_fluents, instance)
    }

    /// Domain name.
    pub fn domain_name(&self) -> &str {
        &self.domain_name
    }

    /// Non-fluents block name (empty if the instance names none).
    pub fn non_fluents_name(&self) -> &str {
        &self.non_fluents_name
    }

    /// Instance name.
    pub fn instance_name(&self) -> &str {
        &self.instance_name
    }

    /// Requirement flags, as written.
    pub fn requirements(&self) -> &[String] {
        &self.requirements
    }

    /// Types and objects.
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Variable declarations.
    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// Grounded variable arena.
    pub fn grounding(&self) -> &Grounding {
        &self.grounding
    }

    /// Lifted CPFs, in source order.
    pub fn cpfs(&self) -> &[LiftedCpf] {
        &self.cpfs
    }

    /// Grounded derived-fluent CPFs, in dependency order.
    pub fn derived(&self) -> &[GroundCpf] {
        &self.derived
    }

    /// Grounded next-state CPFs, in grounding order.
    pub fn transitions(&self) -> &[GroundCpf] {
        &self.transitions
    }

    /// Reward expression, if the domain declares one.
    pub fn reward(&self) -> Option<&TypedExpr> {
        self.reward.as_ref()
    }

    /// State-action constraints followed by action preconditions.
    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    /// State invariants.
    pub fn invariants(&self) -> &[Constraint] {
        &self.invariants
    }

    /// Non-fluent and state-fluent values at epoch 0. Action and derived
    /// entries are unset.
    pub fn initial_valuation(&self) -> &Valuation {
        &self.initial
    }

    /// Validated instance settings.
    pub fn config(&self) -> &InstanceConfig {
        &self.config
    }

    /// Declaration of a grounded instance.
    pub fn decl_of(&self, id: GroundId) -> Option<&VarDecl> {
        self.grounding.get(id).and_then(|g| self.symbols.get(g.var))
    }

    /// Fluent class of a grounded instance.
    pub fn class_of(&self, id: GroundId) -> Option<FluentClass> {
        self.decl_of(id).map(|d| d.class)
    }

    /// Declared default of a grounded instance.
    pub fn default_of(&self, id: GroundId) -> Option<Value> {
        self.decl_of(id).and_then(|d| d.default)
    }

    /// Display name of a grounded instance, e.g. `PICT_XPOS(p1)`.
    pub fn ground_name(&self, id: GroundId) -> String {
        self.grounding.name(id, &self.symbols, &self.registry)
    }

    /// Look up a grounded instance by variable and object names.
    ///
    /// Enumeration-typed arguments may be written with or without `@`.
    pub fn ground(&self, name: &str, args: &[&str]) -> Option<GroundId> {
        let var = self.symbols.id_of(name)?;
        let decl = self.symbols.get(var)?;
        if decl.params.len() != args.len() {
            return None;
        }
        let objects = args
            .iter()
            .zip(&decl.params)
            .map(|(arg, &ty)| {
                self.registry
                    .resolve_object(arg, ty, Location::default())
                    .ok()
            })
            .collect::<Option<Args>>()?;
        self.grounding.ground_id(var, &objects, &self.registry)
    }

    /// Resolve and type-check a standalone expression against this
    /// model's declarations. The expression must be closed: `?params`
    /// may only appear under an aggregation that binds them.
    pub fn resolve_expr(&self, expr: &Expr) -> Result<TypedExpr, ValidationErrors> {
        let mut errors = Vec::new();
        let typed = Resolver {
            registry: &self.registry,
            symbols: &self.symbols,
            errors: &mut errors,
        }
        .resolve(expr, &mut Scope::new());
        match typed {
            Some(t) if errors.is_empty() => Ok(t),
            _ => Err(ValidationErrors(errors)),
        }
    }

    /// Every grounded instance of the given class, in id order.
    pub fn ids_of_class(&self, class: FluentClass) -> impl Iterator<Item = GroundId> + '_ {
        self.symbols
            .iter()
            .filter(move |(_, d)| d.class == class)
            .flat_map(|(var, _)| self.grounding.ids_of(var))
    }
}
