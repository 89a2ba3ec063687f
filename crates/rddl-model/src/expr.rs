//! Resolved, statically typed expressions.
//!
//! Names are gone: variables are [`VarId`]s, objects and enumeration
//! literals are constants, and `?params` are binding slots. Slot `n` is
//! the n-th enclosing binder counting outward-in: CPF parameters take the
//! first slots, each aggregation appends its variables after them.

use rddl_core::{TypeId, Value, ValueType, VarId};
use rddl_lang::{AggOp, BinaryOp, Distribution, UnaryOp};

/// A typed expression node.
#[derive(Clone, Debug, PartialEq)]
pub struct TypedExpr {
    /// Node kind.
    pub kind: TypedKind,
    /// Static type of the node's value.
    pub ty: ValueType,
}

/// Typed expression kinds.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedKind {
    /// A literal, object name, or enumeration literal.
    Const(Value),
    /// A bound parameter read from a binding slot.
    Param(u16),
    /// Reference to a variable; each argument evaluates to an object.
    Var {
        /// Referenced variable.
        var: VarId,
        /// Object-valued arguments, one per parameter.
        args: Vec<TypedExpr>,
    },
    /// Prefix operator.
    Unary {
        /// Operator.
        op: UnaryOp,
        /// Operand.
        operand: Box<TypedExpr>,
    },
    /// Infix operator.
    Binary {
        /// Operator.
        op: BinaryOp,
        /// Left operand.
        lhs: Box<TypedExpr>,
        /// Right operand.
        rhs: Box<TypedExpr>,
    },
    /// Conditional.
    If {
        /// Boolean condition.
        cond: Box<TypedExpr>,
        /// Value when the condition holds.
        then_branch: Box<TypedExpr>,
        /// Value otherwise.
        else_branch: Box<TypedExpr>,
    },
    /// Aggregation over the cross product of typed object ranges.
    Aggregate {
        /// Aggregation operator.
        op: AggOp,
        /// Slot bound to the first range; later ranges take the next slots.
        first_slot: u16,
        /// Range types, in binding order.
        ranges: Vec<TypeId>,
        /// Aggregated expression.
        body: Box<TypedExpr>,
    },
    /// Distribution sample.
    Sample {
        /// Distribution.
        dist: Distribution,
        /// Parameters.
        args: Vec<TypedExpr>,
    },
}

impl TypedExpr {
    /// A constant node.
    pub fn constant(value: Value, ty: ValueType) -> Self {
        Self {
            kind: TypedKind::Const(value),
            ty,
        }
    }

    /// Call `f` for every variable referenced anywhere in the tree.
    pub fn for_each_var(&self, f: &mut impl FnMut(VarId)) {
        match &self.kind {
            TypedKind::Const(_) | TypedKind::Param(_) => {}
            TypedKind::Var { var, args } => {
                f(*var);
                for arg in args {
                    arg.for_each_var(f);
                }
            }
            TypedKind::Unary { operand, .. } => operand.for_each_var(f),
            TypedKind::Binary { lhs, rhs, .. } => {
                lhs.for_each_var(f);
                rhs.for_each_var(f);
            }
            TypedKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.for_each_var(f);
                then_branch.for_each_var(f);
                else_branch.for_each_var(f);
            }
            TypedKind::Aggregate { body, .. } => body.for_each_var(f),
            TypedKind::Sample { args, .. } => {
                for arg in args {
                    arg.for_each_var(f);
                }
            }
        }
    }

    /// Whether any distribution node occurs in the tree.
    pub fn is_stochastic(&self) -> bool {
        match &self.kind {
            TypedKind::Sample { dist, args } => {
                !matches!(dist, Distribution::DiracDelta | Distribution::KronDelta)
                    || args.iter().any(Self::is_stochastic)
            }
            TypedKind::Const(_) | TypedKind::Param(_) => false,
            TypedKind::Var { args, .. } => args.iter().any(Self::is_stochastic),
            TypedKind::Unary { operand, .. } => operand.is_stochastic(),
            TypedKind::Binary { lhs, rhs, .. } => lhs.is_stochastic() || rhs.is_stochastic(),
            TypedKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                cond.is_stochastic() || then_branch.is_stochastic() || else_branch.is_stochastic()
            }
            TypedKind::Aggregate { body, .. } => body.is_stochastic(),
        }
    }
}
