//! Dense value storage indexed by [`GroundId`].

use rddl_core::{Environment, GroundId, Value};

/// One optional value per grounded variable.
///
/// Entries are `None` until written. The stepper keeps two of these
/// (front and back) and swaps them at the end of an epoch.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Valuation {
    values: Vec<Option<Value>>,
}

impl Valuation {
    /// A valuation with `len` unset entries.
    pub fn new(len: usize) -> Self {
        Self {
            values: vec![None; len],
        }
    }

    /// Value of `id`, if set.
    pub fn get(&self, id: GroundId) -> Option<Value> {
        self.values.get(id.index()).copied().flatten()
    }

    /// Set the value of `id`. Out-of-range ids are ignored and reported
    /// as `false`.
    pub fn set(&mut self, id: GroundId, value: Value) -> bool {
        match self.values.get_mut(id.index()) {
            Some(slot) => {
                *slot = Some(value);
                true
            }
            None => false,
        }
    }

    /// Unset `id`.
    pub fn clear(&mut self, id: GroundId) {
        if let Some(slot) = self.values.get_mut(id.index()) {
            *slot = None;
        }
    }

    /// Number of entries (set or not).
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the valuation has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over the set entries in id order.
    pub fn iter(&self) -> impl Iterator<Item = (GroundId, Value)> + '_ {
        self.values
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (GroundId(i as u32), v)))
    }

    /// Copy the entries of `ids` from `other`, leaving the rest untouched.
    pub fn copy_from(&mut self, other: &Valuation, ids: impl IntoIterator<Item = GroundId>) {
        for id in ids {
            let i = id.index();
            if let (Some(dst), Some(&src)) = (self.values.get_mut(i), other.values.get(i)) {
                *dst = src;
            }
        }
    }
}

impl Environment for Valuation {
    fn value(&self, id: GroundId) -> Option<Value> {
        self.get(id)
    }
}
