//! Untyped abstract syntax tree.
//!
//! Produced by the parser, consumed by model compilation. Names are kept
//! as strings; resolution to ids and type checking happen later. Every
//! node that can be the subject of a diagnostic carries a [`Span`].

use rddl_core::FluentClass;

use crate::span::Span;

/// Everything parsed from one source text.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceFile {
    /// `domain` blocks in source order.
    pub domains: Vec<Domain>,
    /// `non-fluents` blocks in source order.
    pub non_fluents: Vec<NonFluents>,
    /// `instance` blocks in source order.
    pub instances: Vec<Instance>,
}

// ── Domain ──────────────────────────────────────────────────────

/// A `domain name { ... }` block.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    /// Domain name.
    pub name: String,
    /// Feature flags from `requirements = { ... }`.
    pub requirements: Vec<String>,
    /// Object and enumeration types.
    pub types: Vec<TypeDecl>,
    /// Variable declarations.
    pub pvariables: Vec<PvarDecl>,
    /// Next-state and derived-fluent definitions.
    pub cpfs: Vec<Cpf>,
    /// Reward expression, if declared.
    pub reward: Option<Expr>,
    /// `state-action-constraints` entries.
    pub constraints: Vec<Expr>,
    /// `action-preconditions` entries.
    pub action_preconditions: Vec<Expr>,
    /// `state-invariants` entries.
    pub state_invariants: Vec<Expr>,
    /// Span of the block header.
    pub span: Span,
}

/// A type declaration inside `types { ... }`.
#[derive(Clone, Debug, PartialEq)]
pub struct TypeDecl {
    /// Type name.
    pub name: String,
    /// Object type or enumeration.
    pub kind: TypeKind,
    /// Span of the declaration.
    pub span: Span,
}

/// Right-hand side of a type declaration.
#[derive(Clone, Debug, PartialEq)]
pub enum TypeKind {
    /// `name : object;` members come from `objects` sections.
    Object,
    /// `name : {@a, @b};` members are fixed literals (stored without `@`).
    Enum(Vec<String>),
}

/// A pvariable declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct PvarDecl {
    /// Variable name.
    pub name: String,
    /// Parameter type names, in order.
    pub params: Vec<String>,
    /// Fluent class.
    pub class: FluentClass,
    /// Range: `bool`, `int`, `real`, or a type name.
    pub range: String,
    /// `default = ...`, if given.
    pub default: Option<Literal>,
    /// `level = n`, if given (derived fluents).
    pub level: Option<i64>,
    /// Span of the declaration.
    pub span: Span,
}

/// A CPF: `name'(?p, ...) = expr;` or, for derived fluents,
/// `name(?p, ...) = expr;`.
#[derive(Clone, Debug, PartialEq)]
pub struct Cpf {
    /// Target variable name.
    pub target: String,
    /// Whether the target was written with a prime.
    pub primed: bool,
    /// Parameter names (without `?`).
    pub params: Vec<String>,
    /// Defining expression.
    pub expr: Expr,
    /// Span of the target.
    pub span: Span,
}

// ── Non-fluents and instance ────────────────────────────────────

/// A `non-fluents name { ... }` block.
#[derive(Clone, Debug, PartialEq)]
pub struct NonFluents {
    /// Block name.
    pub name: String,
    /// Referenced domain name.
    pub domain: String,
    /// Object enumerations.
    pub objects: Vec<ObjectsDecl>,
    /// Non-fluent value overrides.
    pub values: Vec<Assignment>,
    /// Span of the block header.
    pub span: Span,
}

/// An `instance name { ... }` block.
#[derive(Clone, Debug, PartialEq)]
pub struct Instance {
    /// Instance name.
    pub name: String,
    /// Referenced domain name.
    pub domain: String,
    /// Referenced non-fluents block, if any.
    pub non_fluents: Option<String>,
    /// Additional object enumerations.
    pub objects: Vec<ObjectsDecl>,
    /// Initial state-fluent values.
    pub init_state: Vec<Assignment>,
    /// `max-nondef-actions`, if given.
    pub max_nondef_actions: Option<MaxActions>,
    /// `horizon`, if given.
    pub horizon: Option<i64>,
    /// `discount`, if given.
    pub discount: Option<f64>,
    /// Span of the block header.
    pub span: Span,
}

/// `max-nondef-actions` setting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaxActions {
    /// `pos-inf`
    Unbounded,
    /// A finite limit.
    Limit(i64),
}

/// `type : {o1, o2, ...};` inside an `objects` section.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectsDecl {
    /// The type being enumerated.
    pub type_name: String,
    /// Object names in declaration order.
    pub objects: Vec<String>,
    /// Span of the entry.
    pub span: Span,
}

/// `NAME(args) = literal;` (or the boolean shorthands `NAME(args);` and
/// `~NAME(args);`).
#[derive(Clone, Debug, PartialEq)]
pub struct Assignment {
    /// Variable name.
    pub name: String,
    /// Object (or enum literal) argument names.
    pub args: Vec<String>,
    /// Assigned value.
    pub value: Literal,
    /// Span of the entry.
    pub span: Span,
}

/// A constant appearing in declarations and assignments.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    /// `true` / `false`
    Bool(bool),
    /// Integer, possibly negative.
    Int(i64),
    /// Real, possibly negative.
    Real(f64),
    /// `@name` (stored without `@`).
    Enum(String),
    /// A bare object name.
    Object(String),
}

// ── Expressions ─────────────────────────────────────────────────

/// An expression with its source span.
#[derive(Clone, Debug, PartialEq)]
pub struct Expr {
    /// Node kind.
    pub kind: ExprKind,
    /// Source span.
    pub span: Span,
}

impl Expr {
    /// Construct an expression node.
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Expression node kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum ExprKind {
    /// `true` / `false`
    Bool(bool),
    /// Integer literal.
    Int(i64),
    /// Real literal (including `pos-inf`/`neg-inf`).
    Real(f64),
    /// `@literal`
    Enum(String),
    /// `?p`
    Param(String),
    /// A variable reference (or, with no arguments, possibly an object
    /// name; resolution decides).
    Fluent {
        /// Variable name.
        name: String,
        /// Whether it was written with a prime.
        primed: bool,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<Expr>,
    },
    /// Infix operator.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<Expr>,
        /// Right operand.
        rhs: Box<Expr>,
    },
    /// `if (cond) then a else b`
    If {
        /// Condition.
        cond: Box<Expr>,
        /// Taken when the condition holds.
        then_branch: Box<Expr>,
        /// Taken otherwise.
        else_branch: Box<Expr>,
    },
    /// `sum_{?p : t, ...} body` and friends.
    Aggregate {
        /// Aggregation operator.
        op: AggOp,
        /// `(parameter, type)` pairs, parameters without `?`.
        vars: Vec<(String, String)>,
        /// Aggregated expression.
        body: Box<Expr>,
    },
    /// A distribution sample such as `Normal(m, v)`.
    Sample {
        /// Distribution.
        dist: Distribution,
        /// Distribution parameters.
        args: Vec<Expr>,
    },
}

/// Prefix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-`
    Neg,
    /// `~`
    Not,
}

/// Infix operators.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `==`
    Eq,
    /// `~=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `^`
    And,
    /// `|`
    Or,
    /// `=>`
    Implies,
    /// `<=>`
    Equiv,
}

impl BinaryOp {
    /// Source symbol of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Eq => "==",
            Self::Ne => "~=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::And => "^",
            Self::Or => "|",
            Self::Implies => "=>",
            Self::Equiv => "<=>",
        }
    }

    /// Whether both operands and the result are boolean.
    pub fn is_logical(self) -> bool {
        matches!(self, Self::And | Self::Or | Self::Implies | Self::Equiv)
    }

    /// Whether the operator compares two values.
    pub fn is_relational(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }
}

/// Aggregation operators over typed object ranges.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggOp {
    /// `sum_`
    Sum,
    /// `prod_`
    Prod,
    /// `exists_`
    Exists,
    /// `forall_`
    Forall,
}

impl AggOp {
    /// Parse the identifier that introduces an aggregation.
    pub fn from_prefix(s: &str) -> Option<Self> {
        match s {
            "sum_" => Some(Self::Sum),
            "prod_" => Some(Self::Prod),
            "exists_" => Some(Self::Exists),
            "forall_" => Some(Self::Forall),
            _ => None,
        }
    }

    /// The introducing identifier.
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Sum => "sum_",
            Self::Prod => "prod_",
            Self::Exists => "exists_",
            Self::Forall => "forall_",
        }
    }
}

/// Distributions that can be sampled in expressions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Distribution {
    /// `Normal(mean, variance)`
    Normal,
    /// `DiracDelta(value)`, a point mass on a real value.
    DiracDelta,
    /// `KronDelta(value)`, a point mass on a discrete value.
    KronDelta,
    /// `Bernoulli(p)`
    Bernoulli,
    /// `Uniform(low, high)`
    Uniform,
}

impl Distribution {
    /// Look up a distribution by its source name.
    pub fn from_name(s: &str) -> Option<Self> {
        match s {
            "Normal" => Some(Self::Normal),
            "DiracDelta" => Some(Self::DiracDelta),
            "KronDelta" => Some(Self::KronDelta),
            "Bernoulli" => Some(Self::Bernoulli),
            "Uniform" => Some(Self::Uniform),
            _ => None,
        }
    }

    /// Source name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::DiracDelta => "DiracDelta",
            Self::KronDelta => "KronDelta",
            Self::Bernoulli => "Bernoulli",
            Self::Uniform => "Uniform",
        }
    }

    /// Number of parameters the distribution takes.
    pub fn arity(self) -> usize {
        match self {
            Self::Normal | Self::Uniform => 2,
            Self::DiracDelta | Self::KronDelta | Self::Bernoulli => 1,
        }
    }
}
