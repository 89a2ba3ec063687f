//! Runtime values and their static types.

use std::fmt;

use crate::id::{ObjectId, TypeId};

/// Static value type of a variable or expression.
///
/// `Int` is assignable to `Real` (numeric promotion); every other pair
/// of distinct types is incompatible.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `bool`.
    Bool,
    /// `int` (64-bit signed).
    Int,
    /// `real` (64-bit IEEE-754).
    Real,
    /// A member of the given object or enumeration type.
    Object(TypeId),
}

impl ValueType {
    /// Whether arithmetic is defined on this type.
    pub fn is_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Real)
    }

    /// Least common type of two operands, if one exists.
    ///
    /// `Int` and `Real` unify to `Real`; identical types unify to
    /// themselves; anything else has no common type.
    pub fn unify(self, other: Self) -> Option<Self> {
        match (self, other) {
            (a, b) if a == b => Some(a),
            (Self::Int, Self::Real) | (Self::Real, Self::Int) => Some(Self::Real),
            _ => None,
        }
    }

    /// Whether a value of type `other` may be stored in a slot of this type.
    pub fn accepts(self, other: Self) -> bool {
        self == other || (self == Self::Real && other == Self::Int)
    }

    /// Short name used in diagnostics. Object types print as `object`;
    /// callers with a registry should print the type name instead.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Real => "real",
            Self::Object(_) => "object",
        }
    }
}

/// A tagged runtime value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value {
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Real value.
    Real(f64),
    /// An object or enumeration literal.
    Object(ObjectId),
}

impl Value {
    /// Name of this value's tag, for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Real(_) => "real",
            Self::Object(_) => "object",
        }
    }

    /// The boolean payload, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Self::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// The integer payload, if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match *self {
            Self::Int(i) => Some(i),
            _ => None,
        }
    }

    /// The numeric payload as `f64`, promoting `Int`.
    pub fn as_real(&self) -> Option<f64> {
        match *self {
            Self::Int(i) => Some(i as f64),
            Self::Real(r) => Some(r),
            _ => None,
        }
    }

    /// The object payload, if this is an `Object`.
    pub fn as_object(&self) -> Option<ObjectId> {
        match *self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Whether this value can be stored in a slot of type `ty`.
    ///
    /// Object membership in a particular type is not checked here; that
    /// needs the type registry.
    pub fn fits(&self, ty: ValueType) -> bool {
        matches!(
            (self, ty),
            (Self::Bool(_), ValueType::Bool)
                | (Self::Int(_), ValueType::Int)
                | (Self::Int(_), ValueType::Real)
                | (Self::Real(_), ValueType::Real)
                | (Self::Object(_), ValueType::Object(_))
        )
    }

    /// Convert this value for storage in a slot of type `ty`.
    ///
    /// Promotes `Int` to `Real` for real slots. Returns `None` when
    /// the value does not fit.
    pub fn coerce(self, ty: ValueType) -> Option<Self> {
        match (self, ty) {
            (Self::Int(i), ValueType::Real) => Some(Self::Real(i as f64)),
            (v, t) if v.fits(t) => Some(v),
            _ => None,
        }
    }

    /// Stable 64-bit encoding used by state hashing.
    ///
    /// The tag is folded into the top bits so `Int(1)` and `Bool(true)`
    /// hash differently.
    pub fn to_bits(&self) -> u64 {
        match *self {
            Self::Bool(b) => (1u64 << 62) | b as u64,
            Self::Int(i) => (2u64 << 62) ^ i as u64,
            Self::Real(r) => (3u64 << 62) ^ r.to_bits(),
            Self::Object(o) => o.0 as u64,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Real(r) => write!(f, "{r:?}"),
            Self::Object(o) => write!(f, "#{o}"),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Real(v)
    }
}

impl From<ObjectId> for Value {
    fn from(v: ObjectId) -> Self {
        Self::Object(v)
    }
}
