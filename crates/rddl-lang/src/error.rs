//! Parse error types.

use std::error::Error;
use std::fmt;

use rddl_core::Location;

/// Error produced while lexing or parsing source text.
///
/// Parsing is all-or-nothing: on error no partial AST is returned.
#[derive(Clone, Debug, PartialEq)]
pub enum ParseError {
    /// Characters that do not form any token.
    InvalidToken {
        /// The offending text.
        text: String,
        /// Where it starts.
        at: Location,
    },
    /// A token other than the one the grammar requires.
    UnexpectedToken {
        /// What the parser was looking for.
        expected: String,
        /// The token it found.
        found: String,
        /// Where the token starts.
        at: Location,
    },
    /// Input ended inside an unfinished construct.
    UnexpectedEof {
        /// What the parser was looking for.
        expected: String,
    },
    /// Tokens are well-formed but violate a grammar rule.
    InvalidSyntax {
        /// Description of the violation.
        message: String,
        /// Where it occurred.
        at: Location,
    },
    /// A top-level keyword other than `domain`, `non-fluents`, or
    /// `instance`.
    UnknownBlock {
        /// The unrecognized keyword.
        keyword: String,
        /// Where it starts.
        at: Location,
    },
}

impl ParseError {
    /// Location of the error, if it has one (EOF errors do not).
    pub fn location(&self) -> Option<Location> {
        match self {
            Self::InvalidToken { at, .. }
            | Self::UnexpectedToken { at, .. }
            | Self::InvalidSyntax { at, .. }
            | Self::UnknownBlock { at, .. } => Some(*at),
            Self::UnexpectedEof { .. } => None,
        }
    }

    /// Whether this is a syntax error (anything but an unknown block).
    pub fn is_syntax(&self) -> bool {
        !matches!(self, Self::UnknownBlock { .. })
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken { text, at } => write!(f, "{at}: unrecognized input '{text}'"),
            Self::UnexpectedToken {
                expected,
                found,
                at,
            } => write!(f, "{at}: expected {expected}, found {found}"),
            Self::UnexpectedEof { expected } => {
                write!(f, "unexpected end of input, expected {expected}")
            }
            Self::InvalidSyntax { message, at } => write!(f, "{at}: {message}"),
            Self::UnknownBlock { keyword, at } => {
                write!(f, "{at}: unknown top-level block '{keyword}'")
            }
        }
    }
}

impl Error for ParseError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_line_and_token() {
        let e = ParseError::UnexpectedToken {
            expected: "';'".into(),
            found: "identifier 'x'".into(),
            at: Location::new(3, 7),
        };
        assert_eq!(e.to_string(), "3:7: expected ';', found identifier 'x'");
        assert!(e.is_syntax());
    }

    #[test]
    fn unknown_block_is_not_a_syntax_error() {
        let e = ParseError::UnknownBlock {
            keyword: "problem".into(),
            at: Location::new(1, 1),
        };
        assert!(!e.is_syntax());
        assert_eq!(e.location(), Some(Location::new(1, 1)));
    }
}
