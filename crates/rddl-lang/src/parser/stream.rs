//! Token stream wrapper for the hand-written parser.

use std::ops::Range;

use crate::error::ParseError;
use crate::lexer::{tokenize, Token};
use crate::span::{LineIndex, Span};

/// Deepest expression recursion the parser accepts.
const MAX_NESTING: u32 = 512;

/// Token stream with lookahead and span tracking.
///
/// Each token is paired with its byte range in the source so that spans
/// and error locations point at real line/column positions.
pub(crate) struct TokenStream<'src> {
    tokens: Vec<(Token, Range<usize>)>,
    pos: usize,
    index: LineIndex<'src>,
    source_len: usize,
    depth: u32,
}

impl<'src> TokenStream<'src> {
    /// Tokenize `source` and position the stream at the first token.
    pub(crate) fn new(source: &'src str) -> Result<Self, ParseError> {
        let index = LineIndex::new(source);
        let tokens = tokenize(source).map_err(|range| ParseError::InvalidToken {
            text: source.get(range.clone()).unwrap_or_default().to_string(),
            at: index.locate(range.start),
        })?;
        tracing::trace!(tokens = tokens.len(), "tokenized source");
        Ok(Self {
            tokens,
            pos: 0,
            index,
            source_len: source.len(),
            depth: 0,
        })
    }

    /// Peek at the current token without consuming it.
    pub(crate) fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|(tok, _)| tok)
    }

    /// Consume and return the current token.
    pub(crate) fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|(tok, _)| tok.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    /// Whether the current token has the same kind as `expected`
    /// (payloads are ignored).
    pub(crate) fn check(&self, expected: &Token) -> bool {
        matches!(self.peek(), Some(t) if std::mem::discriminant(t) == std::mem::discriminant(expected))
    }

    /// Whether the current token is the identifier `word`.
    pub(crate) fn check_ident(&self, word: &str) -> bool {
        matches!(self.peek(), Some(t) if t.is_ident(word))
    }

    /// Consume the current token if it has the kind of `expected`.
    pub(crate) fn eat(&mut self, expected: &Token) -> bool {
        if self.check(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume a token of the kind of `expected` or fail.
    pub(crate) fn expect(&mut self, expected: Token) -> Result<Span, ParseError> {
        if self.check(&expected) {
            let span = self.current_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(&expected.to_string()))
        }
    }

    /// Consume an identifier and return its text.
    pub(crate) fn expect_ident(&mut self, what: &str) -> Result<(String, Span), ParseError> {
        let span = self.current_span();
        match self.peek() {
            Some(Token::Ident(name)) => {
                let name = name.clone();
                self.pos += 1;
                Ok((name, span))
            }
            _ => Err(self.unexpected(what)),
        }
    }

    /// Consume the identifier `word` or fail.
    pub(crate) fn expect_keyword(&mut self, word: &str) -> Result<Span, ParseError> {
        if self.check_ident(word) {
            let span = self.current_span();
            self.pos += 1;
            Ok(span)
        } else {
            Err(self.unexpected(&format!("'{word}'")))
        }
    }

    /// Error for the current token not matching `expected`.
    pub(crate) fn unexpected(&self, expected: &str) -> ParseError {
        match self.peek() {
            Some(found) => ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: found.to_string(),
                at: self.current_span().location(),
            },
            None => ParseError::UnexpectedEof {
                expected: expected.to_string(),
            },
        }
    }

    /// Grammar violation at the current token.
    pub(crate) fn invalid(&self, message: impl Into<String>, span: Span) -> ParseError {
        ParseError::InvalidSyntax {
            message: message.into(),
            at: span.location(),
        }
    }

    /// Go one level deeper into an expression, failing past the limit.
    /// Returns the previous depth for [`Self::restore`].
    pub(crate) fn enter(&mut self) -> Result<u32, ParseError> {
        if self.depth >= MAX_NESTING {
            return Err(self.invalid("expression nested too deeply", self.current_span()));
        }
        let outer = self.depth;
        self.depth += 1;
        Ok(outer)
    }

    /// Return to a depth previously handed out by [`Self::enter`].
    pub(crate) fn restore(&mut self, depth: u32) {
        self.depth = depth;
    }

    /// Whether every token has been consumed.
    pub(crate) fn at_end(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Current position in the token stream.
    pub(crate) fn current_pos(&self) -> usize {
        self.pos
    }

    /// Span from the token at `start` to the last consumed token.
    pub(crate) fn span_from(&self, start: usize) -> Span {
        let start_byte = self
            .tokens
            .get(start)
            .map(|(_, r)| r.start)
            .unwrap_or(self.source_len);
        let end_byte = if self.pos > start {
            self.tokens
                .get(self.pos - 1)
                .map(|(_, r)| r.end)
                .unwrap_or(start_byte)
        } else {
            start_byte
        };
        self.index.span(start_byte, end_byte)
    }

    /// Span of the current token (or an empty span at end of input).
    pub(crate) fn current_span(&self) -> Span {
        match self.tokens.get(self.pos) {
            Some((_, r)) => self.index.span(r.start, r.end),
            None => self.index.span(self.source_len, self.source_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expect_reports_found_token_and_location() {
        let mut s = TokenStream::new("a\n  b").unwrap();
        s.advance();
        let err = s.expect(Token::Semi).unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedToken {
                expected: "';'".into(),
                found: "identifier 'b'".into(),
                at: rddl_core::Location::new(2, 3),
            }
        );
    }

    #[test]
    fn expect_at_end_is_eof() {
        let mut s = TokenStream::new("").unwrap();
        assert!(matches!(
            s.expect(Token::LBrace),
            Err(ParseError::UnexpectedEof { .. })
        ));
    }

    #[test]
    fn span_from_covers_consumed_tokens() {
        let mut s = TokenStream::new("foo ( bar )").unwrap();
        let start = s.current_pos();
        for _ in 0..4 {
            s.advance();
        }
        let span = s.span_from(start);
        assert_eq!((span.start, span.end), (0, 11));
    }

    #[test]
    fn invalid_characters_fail_construction() {
        let err = TokenStream::new("x = $;").err().unwrap();
        assert!(matches!(err, ParseError::InvalidToken { ref text, .. } if text == "$"));
    }
}
