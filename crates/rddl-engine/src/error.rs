//! Errors returned by [`Stepper::step`](crate::Stepper::step).

use std::error::Error;
use std::fmt;

use rddl_core::{EpochId, EvalError};
use rddl_model::ConstraintKind;

/// Why an action set was rejected. Rejection leaves the stepper's
/// state and epoch unchanged.
#[derive(Clone, Debug, PartialEq)]
pub enum ActionError {
    /// No grounded variable has this name.
    UnknownAction {
        /// The name as given.
        name: String,
    },
    /// The target exists but is not an action-fluent.
    NotAnAction {
        /// Grounded name of the target.
        name: String,
    },
    /// The same grounded action was assigned more than once.
    DuplicateAction {
        /// Grounded name of the action.
        name: String,
    },
    /// The value does not fit the action's declared type.
    WrongType {
        /// Grounded name of the action.
        name: String,
        /// Declared type.
        expected: String,
        /// Tag of the supplied value.
        found: &'static str,
    },
    /// More actions were set to non-default values than the instance allows.
    TooManyActions {
        /// Non-default actions in the set.
        count: u32,
        /// The instance's `max-nondef-actions`.
        max: u32,
    },
    /// A state-action constraint or action precondition evaluated to false.
    ConstraintViolated {
        /// Section the constraint came from.
        kind: ConstraintKind,
        /// Index into [`Model::constraints`](rddl_model::Model::constraints).
        index: usize,
    },
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownAction { name } => write!(f, "unknown action '{name}'"),
            Self::NotAnAction { name } => write!(f, "'{name}' is not an action-fluent"),
            Self::DuplicateAction { name } => {
                write!(f, "action '{name}' assigned more than once")
            }
            Self::WrongType {
                name,
                expected,
                found,
            } => write!(f, "action '{name}' expects {expected}, got {found}"),
            Self::TooManyActions { count, max } => write!(
                f,
                "{count} actions set to non-default values, max-nondef-actions is {max}"
            ),
            Self::ConstraintViolated { kind, index } => {
                write!(f, "{} #{index} violated", kind.keyword())
            }
        }
    }
}

impl Error for ActionError {}

/// Error returned from [`Stepper::step`](crate::Stepper::step).
#[derive(Clone, Debug, PartialEq)]
pub enum StepError {
    /// The action set was rejected; the step can be retried with another.
    InvalidAction(ActionError),
    /// Evaluation failed. The stepper is now terminated.
    Eval(EvalError),
    /// The next state violates a state invariant. The stepper is now
    /// terminated and the offending state was not committed.
    InvariantViolated {
        /// Index into [`Model::invariants`](rddl_model::Model::invariants).
        index: usize,
    },
    /// The stepper already reached its horizon or failed.
    Terminated {
        /// Epoch at which it stopped.
        epoch: EpochId,
    },
}

impl fmt::Display for StepError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidAction(e) => write!(f, "invalid action: {e}"),
            Self::Eval(e) => write!(f, "evaluation failed: {e}"),
            Self::InvariantViolated { index } => {
                write!(f, "next state violates state invariant #{index}")
            }
            Self::Terminated { epoch } => write!(f, "stepper terminated at epoch {epoch}"),
        }
    }
}

impl Error for StepError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidAction(e) => Some(e),
            Self::Eval(e) => Some(e),
            _ => None,
        }
    }
}

impl From<EvalError> for StepError {
    fn from(e: EvalError) -> Self {
        Self::Eval(e)
    }
}

impl From<ActionError> for StepError {
    fn from(e: ActionError) -> Self {
        Self::InvalidAction(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_constraint_section() {
        let e = StepError::from(ActionError::ConstraintViolated {
            kind: ConstraintKind::StateAction,
            index: 0,
        });
        assert_eq!(
            e.to_string(),
            "invalid action: state-action-constraints #0 violated"
        );
        assert!(e.source().is_some());
    }

    #[test]
    fn eval_errors_convert() {
        let e: StepError = EvalError::UnboundVariable { name: "x".into() }.into();
        assert!(matches!(e, StepError::Eval(_)));
    }
}
