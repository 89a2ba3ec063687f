//! Read-only views over stepper valuations.

use rddl_core::{Environment, FluentClass, GroundId, Value};
use rddl_model::{Model, Valuation};

use crate::hash::valuation_hash;

// ── StateView ──────────────────────────────────────────────────────

/// Borrowed view of a committed state.
///
/// Reads see state-fluents and non-fluents. The view lives only as long
/// as the borrow of the stepper that produced it.
#[derive(Clone, Copy, Debug)]
pub struct StateView<'a> {
    model: &'a Model,
    values: &'a Valuation,
}

impl<'a> StateView<'a> {
    pub(crate) fn new(model: &'a Model, values: &'a Valuation) -> Self {
        Self { model, values }
    }

    /// Value of a grounded instance.
    pub fn value(&self, id: GroundId) -> Option<Value> {
        self.values.get(id)
    }

    /// Value of a grounded instance by name, e.g. `get("PICT_XPOS", &["p1"])`.
    pub fn get(&self, name: &str, args: &[&str]) -> Option<Value> {
        self.model.ground(name, args).and_then(|id| self.value(id))
    }

    /// Numeric value by name, promoting ints.
    pub fn real(&self, name: &str, args: &[&str]) -> Option<f64> {
        self.get(name, args).and_then(|v| v.as_real())
    }

    /// State-fluent entries in grounding order.
    pub fn state_fluents(&self) -> impl Iterator<Item = (GroundId, Value)> + 'a {
        let values = self.values;
        self.model
            .ids_of_class(FluentClass::StateFluent)
            .filter_map(move |id| values.get(id).map(|v| (id, v)))
    }

    /// FNV-1a hash of the state-fluent entries.
    pub fn hash(&self) -> u64 {
        valuation_hash(self.state_fluents())
    }

    /// The underlying valuation, including non-fluents.
    pub fn valuation(&self) -> &'a Valuation {
        self.values
    }
}

impl Environment for StateView<'_> {
    fn value(&self, id: GroundId) -> Option<Value> {
        self.values.get(id)
    }
}

// ── Layered ────────────────────────────────────────────────────────

/// Epoch-local values (actions, derived fluents) over committed state.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Layered<'a> {
    pub(crate) overlay: &'a Valuation,
    pub(crate) base: &'a Valuation,
}

impl Environment for Layered<'_> {
    fn value(&self, id: GroundId) -> Option<Value> {
        self.overlay.get(id).or_else(|| self.base.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overlay_shadows_base() {
        let mut base = Valuation::new(2);
        base.set(GroundId(0), Value::Int(1));
        base.set(GroundId(1), Value::Int(2));
        let mut overlay = Valuation::new(2);
        overlay.set(GroundId(1), Value::Int(20));
        let env = Layered {
            overlay: &overlay,
            base: &base,
        };
        assert_eq!(env.value(GroundId(0)), Some(Value::Int(1)));
        assert_eq!(env.value(GroundId(1)), Some(Value::Int(20)));
        assert_eq!(env.value(GroundId(2)), None);
    }
}
