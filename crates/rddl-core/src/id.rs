//! Strongly-typed identifiers and the [`Args`] type alias.

use smallvec::SmallVec;
use std::fmt;

/// Identifies a declared object type within a domain.
///
/// Types are registered in declaration order and assigned sequential ids.
/// `TypeId(n)` is the n-th type of the domain's `types` section.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for TypeId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an object (or enumeration literal) across all types.
///
/// Ids are global rather than per-type so that a [`Value::Object`]
/// is self-describing; the owning type is recorded by the registry.
///
/// [`Value::Object`]: crate::Value::Object
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ObjectId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies a lifted variable declaration (a pvariable).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub u32);

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for VarId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Index of a grounded variable instance in the grounding arena.
///
/// `GroundId(n)` is the n-th entry of the grounded enumeration; the
/// enumeration order is fixed by the grounder and reproducible across
/// runs over the same input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroundId(pub u32);

impl GroundId {
    /// The id as a `usize` index into dense valuation storage.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for GroundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for GroundId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Monotonically increasing decision-epoch counter.
///
/// Zero after construction or reset; incremented once per committed step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EpochId(pub u64);

impl fmt::Display for EpochId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EpochId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Concrete object arguments of a grounded variable.
///
/// Uses `SmallVec<[ObjectId; 4]>` to avoid heap allocation for
/// variables of arity up to 4, which covers practically every domain.
pub type Args = SmallVec<[ObjectId; 4]>;
