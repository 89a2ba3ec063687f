//! Error types shared across the workspace.
//!
//! Split by phase: [`ModelError`] for load-time semantic validation
//! (collected into [`ValidationErrors`] so every problem is reported at
//! once), and [`EvalError`] for evaluation-time failures. Parse errors
//! live in the language crate; step errors live in the engine.

use std::error::Error;
use std::fmt;

use crate::fluent::FluentClass;

/// A 1-based line/column position in source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column (in characters).
    pub column: u32,
}

impl Location {
    /// Construct a location.
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

// ── EvalError ───────────────────────────────────────────────────

/// Errors raised while evaluating an expression.
///
/// A model that passed load-time validation should not produce these
/// from its own expressions; they signal bad environment contents (a
/// missing or mistyped value) or invalid distribution parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum EvalError {
    /// An operator received operands of incompatible types.
    TypeMismatch {
        /// The operator or construct that rejected its operands.
        operation: String,
        /// What the operator needed.
        expected: String,
        /// What it got.
        found: String,
    },
    /// A referenced grounded variable has no value in the environment.
    UnboundVariable {
        /// Display name of the grounded variable, e.g. `PICT_XPOS(p1)`.
        name: String,
    },
    /// A quantified or CPF parameter slot was read before being bound.
    UnboundParameter {
        /// The binding slot that was empty.
        slot: u16,
    },
    /// A distribution or arithmetic operation got an argument outside its
    /// domain (negative variance, integer division by zero, overflow).
    DomainOutOfRange {
        /// The distribution or operator name.
        operation: String,
        /// Description of the offending argument.
        detail: String,
    },
}

impl EvalError {
    /// Shorthand for a [`EvalError::TypeMismatch`].
    pub fn mismatch(operation: &str, expected: &str, found: &str) -> Self {
        Self::TypeMismatch {
            operation: operation.to_string(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }

    /// Shorthand for a [`EvalError::DomainOutOfRange`].
    pub fn out_of_range(operation: &str, detail: impl Into<String>) -> Self {
        Self::DomainOutOfRange {
            operation: operation.to_string(),
            detail: detail.into(),
        }
    }
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TypeMismatch {
                operation,
                expected,
                found,
            } => write!(f, "type mismatch in '{operation}': expected {expected}, found {found}"),
            Self::UnboundVariable { name } => write!(f, "variable '{name}' is unbound"),
            Self::UnboundParameter { slot } => write!(f, "parameter slot {slot} is unbound"),
            Self::DomainOutOfRange { operation, detail } => {
                write!(f, "argument out of range in '{operation}': {detail}")
            }
        }
    }
}

impl Error for EvalError {}

// ── ModelError ──────────────────────────────────────────────────

/// A single semantic problem found while compiling a model.
#[derive(Clone, Debug, PartialEq)]
pub enum ModelError {
    /// A name was declared twice in the same namespace.
    DuplicateDeclaration {
        /// Namespace: `type`, `object`, `variable`, `cpf`, or `value`.
        kind: &'static str,
        /// The duplicated name.
        name: String,
        /// Location of the second declaration.
        at: Location,
    },
    /// A type name was used but never declared.
    UnknownType {
        /// The unknown type name.
        name: String,
        /// Where it was used.
        at: Location,
    },
    /// A variable name was used but never declared.
    UnknownVariable {
        /// The unknown variable name.
        name: String,
        /// Where it was used.
        at: Location,
    },
    /// An object name is not a member of the expected type.
    UnknownObject {
        /// The object name as written.
        name: String,
        /// The type it was expected to belong to.
        expected_type: String,
        /// Where it was used.
        at: Location,
    },
    /// A `?param` is used outside any binding scope.
    UnboundParameter {
        /// The parameter name including the `?`.
        name: String,
        /// Where it was used.
        at: Location,
    },
    /// A variable reference has the wrong number of arguments.
    ArityMismatch {
        /// The variable name.
        name: String,
        /// Declared arity.
        expected: usize,
        /// Arity at the use site.
        found: usize,
        /// Where it was used.
        at: Location,
    },
    /// An expression or literal has the wrong static type.
    TypeMismatch {
        /// What was being checked (operator, cpf, default, argument).
        context: String,
        /// The required type.
        expected: String,
        /// The type found.
        found: String,
        /// Where the mismatch occurred.
        at: Location,
    },
    /// A state-fluent or derived fluent has no CPF.
    MissingCpf {
        /// The variable lacking a CPF.
        name: String,
        /// Location of its declaration.
        at: Location,
    },
    /// A CPF targets a variable whose class cannot have one, or a
    /// state-fluent CPF without a prime (or a derived CPF with one).
    InvalidCpfTarget {
        /// The target variable.
        name: String,
        /// Its declared class.
        class: FluentClass,
        /// Location of the CPF.
        at: Location,
    },
    /// A CPF's parameter list does not match its target's signature.
    ParameterMismatch {
        /// The target variable.
        name: String,
        /// Description of the mismatch.
        reason: String,
        /// Location of the CPF.
        at: Location,
    },
    /// A literal assignment targets a variable of the wrong class
    /// (e.g. a state-fluent inside `non-fluents { ... }`).
    InvalidAssignment {
        /// The assigned variable.
        name: String,
        /// Its declared class.
        class: FluentClass,
        /// The block containing the assignment.
        block: &'static str,
        /// Location of the assignment.
        at: Location,
    },
    /// A non-derived declaration lacks a default value.
    MissingDefault {
        /// The variable name.
        name: String,
        /// Location of the declaration.
        at: Location,
    },
    /// A primed (next-state) reference appears inside an expression.
    PrimedReference {
        /// The referenced variable.
        name: String,
        /// Where it was used.
        at: Location,
    },
    /// An expression reads a fluent class that is not available where
    /// it is evaluated (e.g. an action-fluent inside a state invariant).
    InvalidReference {
        /// The referenced variable.
        name: String,
        /// Its declared class.
        class: FluentClass,
        /// The expression kind containing the reference.
        context: &'static str,
        /// Location of the containing expression.
        at: Location,
    },
    /// Derived fluents depend on each other cyclically.
    CyclicDerived {
        /// Variables on the cycle, in dependency order.
        cycle: Vec<String>,
    },
    /// A block names a domain or non-fluents block other than the one
    /// it is being compiled against.
    BlockMismatch {
        /// The referring block, e.g. `instance inst_pics3`.
        block: String,
        /// The name it should reference.
        expected: String,
        /// The name it does reference.
        found: String,
    },
    /// An instance-level scalar setting is out of range.
    InvalidInstanceConfig {
        /// Description of the problem.
        reason: String,
    },
    /// The grounded instances of a variable do not fit the id space.
    GroundingOverflow {
        /// The variable whose cross product overflowed.
        name: String,
    },
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateDeclaration { kind, name, at } => {
                write!(f, "{at}: duplicate {kind} declaration '{name}'")
            }
            Self::UnknownType { name, at } => write!(f, "{at}: unknown type '{name}'"),
            Self::UnknownVariable { name, at } => write!(f, "{at}: unknown variable '{name}'"),
            Self::UnknownObject {
                name,
                expected_type,
                at,
            } => write!(f, "{at}: '{name}' is not an object of type '{expected_type}'"),
            Self::UnboundParameter { name, at } => {
                write!(f, "{at}: parameter '{name}' is not bound")
            }
            Self::ArityMismatch {
                name,
                expected,
                found,
                at,
            } => write!(
                f,
                "{at}: '{name}' takes {expected} argument(s), {found} given"
            ),
            Self::TypeMismatch {
                context,
                expected,
                found,
                at,
            } => write!(f, "{at}: type mismatch in {context}: expected {expected}, found {found}"),
            Self::MissingCpf { name, at } => write!(f, "{at}: no cpf defines '{name}'"),
            Self::InvalidCpfTarget { name, class, at } => {
                write!(f, "{at}: invalid cpf target '{name}' ({class})")
            }
            Self::ParameterMismatch { name, reason, at } => {
                write!(f, "{at}: cpf parameters of '{name}': {reason}")
            }
            Self::InvalidAssignment {
                name,
                class,
                block,
                at,
            } => write!(f, "{at}: '{name}' is a {class} and cannot be assigned in {block}"),
            Self::MissingDefault { name, at } => {
                write!(f, "{at}: '{name}' requires a default value")
            }
            Self::PrimedReference { name, at } => {
                write!(f, "{at}: next-state reference '{name}'' is not allowed in expressions")
            }
            Self::InvalidReference {
                name,
                class,
                context,
                at,
            } => write!(f, "{at}: {context} cannot read '{name}' ({class})"),
            Self::CyclicDerived { cycle } => {
                write!(f, "derived fluents form a cycle: {}", cycle.join(" -> "))
            }
            Self::BlockMismatch {
                block,
                expected,
                found,
            } => write!(f, "{block} references '{found}', expected '{expected}'"),
            Self::InvalidInstanceConfig { reason } => {
                write!(f, "invalid instance configuration: {reason}")
            }
            Self::GroundingOverflow { name } => {
                write!(f, "too many grounded instances of '{name}'")
            }
        }
    }
}

impl Error for ModelError {}

// ── ValidationErrors ────────────────────────────────────────────

/// Every semantic problem found while compiling a model.
///
/// Never empty when returned as an error.
#[derive(Clone, Debug, PartialEq)]
pub struct ValidationErrors(pub Vec<ModelError>);

impl ValidationErrors {
    /// The collected errors, in discovery order.
    pub fn errors(&self) -> &[ModelError] {
        &self.0
    }

    /// Number of collected errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no errors were collected.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} validation error(s)", self.0.len())?;
        for e in &self.0 {
            write!(f, "\n  {e}")?;
        }
        Ok(())
    }
}

impl Error for ValidationErrors {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_error_display_names_operation() {
        let e = EvalError::mismatch("+", "numeric", "bool");
        assert_eq!(
            e.to_string(),
            "type mismatch in '+': expected numeric, found bool"
        );
        let e = EvalError::out_of_range("Normal", "variance -1.0 < 0");
        assert!(e.to_string().contains("Normal"));
    }

    #[test]
    fn model_error_display_has_location() {
        let e = ModelError::UnknownType {
            name: "rock".into(),
            at: Location::new(4, 9),
        };
        assert_eq!(e.to_string(), "4:9: unknown type 'rock'");
    }

    #[test]
    fn validation_errors_list_every_entry() {
        let errs = ValidationErrors(vec![
            ModelError::UnknownVariable {
                name: "a".into(),
                at: Location::new(1, 1),
            },
            ModelError::UnknownVariable {
                name: "b".into(),
                at: Location::new(2, 1),
            },
        ]);
        let text = errs.to_string();
        assert!(text.starts_with("2 validation error(s)"));
        assert!(text.contains("'a'") && text.contains("'b'"));
    }
}
