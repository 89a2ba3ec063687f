//! Lexical analysis for RDDL source text.
//!
//! Tokenization is done with logos. Whitespace and `//` comments are
//! skipped. Identifiers may contain inner hyphens (`picture-point`,
//! `max-nondef-actions`), so a binary minus between two names must be
//! surrounded by whitespace, as in every RDDL toolchain.
//!
//! Block and section keywords (`domain`, `pvariables`, `init-state`, ...)
//! are lexed as plain identifiers and recognized by the parser; only the
//! expression keywords get their own tokens.

use std::fmt;
use std::ops::Range;

use logos::Logos;

/// RDDL token.
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
pub enum Token {
    // === Expression keywords ===
    /// Keyword `if`
    #[token("if")]
    If,
    /// Keyword `then`
    #[token("then")]
    Then,
    /// Keyword `else`
    #[token("else")]
    Else,
    /// Literal `true`
    #[token("true")]
    True,
    /// Literal `false`
    #[token("false")]
    False,

    // === Names ===
    /// Identifier: variable, type, object, or block keyword.
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*(-[A-Za-z0-9_]+)*", |lex| lex.slice().to_string())]
    Ident(String),
    /// Parameter variable `?p` (stored without the `?`).
    #[regex(r"\?[A-Za-z_][A-Za-z0-9_]*(-[A-Za-z0-9_]+)*", |lex| lex.slice()[1..].to_string())]
    Param(String),
    /// Enumeration literal `@low` (stored without the `@`).
    #[regex(r"@[A-Za-z_][A-Za-z0-9_]*(-[A-Za-z0-9_]+)*", |lex| lex.slice()[1..].to_string())]
    Enum(String),

    // === Numbers ===
    /// Integer literal.
    #[regex(r"[0-9]+", |lex| lex.slice().parse::<i64>().ok())]
    Int(i64),
    /// Real literal (`1.0`, `.5`, `2.`, `1e-3`).
    #[regex(r"[0-9]+\.[0-9]*([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice().parse::<f64>().ok())]
    #[regex(r"[0-9]+[eE][+-]?[0-9]+", |lex| lex.slice().parse::<f64>().ok())]
    Real(f64),

    // === Logical operators ===
    /// `<=>`
    #[token("<=>")]
    Equiv,
    /// `=>`
    #[token("=>")]
    Implies,
    /// `^` or `&`
    #[token("^")]
    #[token("&")]
    And,
    /// `|`
    #[token("|")]
    Or,
    /// `~` (also the first half of `~=`)
    #[token("~")]
    Not,

    // === Relational operators ===
    /// `==`
    #[token("==")]
    EqEq,
    /// `~=`
    #[token("~=")]
    NotEq,
    /// `<`
    #[token("<")]
    Lt,
    /// `<=`
    #[token("<=")]
    LtEq,
    /// `>`
    #[token(">")]
    Gt,
    /// `>=`
    #[token(">=")]
    GtEq,

    // === Arithmetic ===
    /// `+`
    #[token("+")]
    Plus,
    /// `-`
    #[token("-")]
    Minus,
    /// `*`
    #[token("*")]
    Star,
    /// `/`
    #[token("/")]
    Slash,

    // === Punctuation ===
    /// `=`
    #[token("=")]
    Assign,
    /// `'` (next-state marker)
    #[token("'")]
    Prime,
    /// `(`
    #[token("(")]
    LParen,
    /// `)`
    #[token(")")]
    RParen,
    /// `[`
    #[token("[")]
    LBracket,
    /// `]`
    #[token("]")]
    RBracket,
    /// `{`
    #[token("{")]
    LBrace,
    /// `}`
    #[token("}")]
    RBrace,
    /// `,`
    #[token(",")]
    Comma,
    /// `;`
    #[token(";")]
    Semi,
    /// `:`
    #[token(":")]
    Colon,
}

impl Token {
    /// Whether this is the identifier `word`.
    pub fn is_ident(&self, word: &str) -> bool {
        matches!(self, Token::Ident(s) if s == word)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Ident(s) => write!(f, "identifier '{s}'"),
            Token::Param(s) => write!(f, "parameter '?{s}'"),
            Token::Enum(s) => write!(f, "enum literal '@{s}'"),
            Token::Int(i) => write!(f, "integer {i}"),
            Token::Real(r) => write!(f, "real {r:?}"),
            other => {
                let text = match other {
                    Token::Ident(_)
                    | Token::Param(_)
                    | Token::Enum(_)
                    | Token::Int(_)
                    | Token::Real(_) => "",
                    Token::If => "if",
                    Token::Then => "then",
                    Token::Else => "else",
                    Token::True => "true",
                    Token::False => "false",
                    Token::Equiv => "<=>",
                    Token::Implies => "=>",
                    Token::And => "^",
                    Token::Or => "|",
                    Token::Not => "~",
                    Token::EqEq => "==",
                    Token::NotEq => "~=",
                    Token::Lt => "<",
                    Token::LtEq => "<=",
                    Token::Gt => ">",
                    Token::GtEq => ">=",
                    Token::Plus => "+",
                    Token::Minus => "-",
                    Token::Star => "*",
                    Token::Slash => "/",
                    Token::Assign => "=",
                    Token::Prime => "'",
                    Token::LParen => "(",
                    Token::RParen => ")",
                    Token::LBracket => "[",
                    Token::RBracket => "]",
                    Token::LBrace => "{",
                    Token::RBrace => "}",
                    Token::Comma => ",",
                    Token::Semi => ";",
                    Token::Colon => ":",
                };
                write!(f, "'{text}'")
            }
        }
    }
}

/// Tokenize `source`, pairing each token with its byte range.
///
/// On an unrecognized character sequence returns the byte range of the
/// offending text.
pub fn tokenize(source: &str) -> Result<Vec<(Token, Range<usize>)>, Range<usize>> {
    let mut tokens = Vec::new();
    let mut lexer = Token::lexer(source);
    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => return Err(lexer.span()),
        }
    }
    Ok(tokens)
}
