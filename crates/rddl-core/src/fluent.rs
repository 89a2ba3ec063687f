//! Fluent classes of variable declarations.

use std::fmt;

/// How a variable's value evolves during a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FluentClass {
    /// Constant for the whole problem instance.
    NonFluent,
    /// Part of the Markov state; has exactly one next-state CPF.
    StateFluent,
    /// Supplied by the decision maker each epoch.
    ActionFluent,
    /// Computed each epoch from state and action before reward and
    /// transition (`derived-fluent` or `interm-fluent`).
    DerivedFluent,
}

impl FluentClass {
    /// Parse a class keyword. `interm-fluent` is accepted as a synonym
    /// for `derived-fluent`.
    pub fn from_keyword(s: &str) -> Option<Self> {
        match s {
            "non-fluent" => Some(Self::NonFluent),
            "state-fluent" => Some(Self::StateFluent),
            "action-fluent" => Some(Self::ActionFluent),
            "derived-fluent" | "interm-fluent" => Some(Self::DerivedFluent),
            _ => None,
        }
    }

    /// Canonical keyword for this class.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::NonFluent => "non-fluent",
            Self::StateFluent => "state-fluent",
            Self::ActionFluent => "action-fluent",
            Self::DerivedFluent => "derived-fluent",
        }
    }

    /// Whether declarations of this class must carry a default value.
    pub fn requires_default(self) -> bool {
        !matches!(self, Self::DerivedFluent)
    }

    /// Whether variables of this class are defined by a CPF.
    pub fn has_cpf(self) -> bool {
        matches!(self, Self::StateFluent | Self::DerivedFluent)
    }
}

impl fmt::Display for FluentClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}
