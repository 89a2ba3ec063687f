//! Source spans and byte-offset to line/column conversion.

use rddl_core::Location;

/// Byte range of a syntax node plus the line/column of its start.
///
/// The line/column is resolved once at parse time so later phases can
/// report locations without the source text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    /// Byte offset of the first character.
    pub start: u32,
    /// Byte offset one past the last character.
    pub end: u32,
    /// 1-based line of `start`.
    pub line: u32,
    /// 1-based column of `start`.
    pub column: u32,
}

impl Span {
    /// Line/column of the span start.
    pub fn location(&self) -> Location {
        Location::new(self.line, self.column)
    }
}

/// Precomputed line starts for offset lookups.
pub(crate) struct LineIndex<'src> {
    source: &'src str,
    line_starts: Vec<usize>,
}

impl<'src> LineIndex<'src> {
    pub(crate) fn new(source: &'src str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(source.match_indices('\n').map(|(i, _)| i + 1));
        Self {
            source,
            line_starts,
        }
    }

    /// 1-based line/column of a byte offset.
    pub(crate) fn locate(&self, offset: usize) -> Location {
        let offset = offset.min(self.source.len());
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let start = self.line_starts[line];
        let column = self
            .source
            .get(start..offset)
            .map(|s| s.chars().count())
            .unwrap_or(offset - start);
        Location::new(line as u32 + 1, column as u32 + 1)
    }

    pub(crate) fn span(&self, start: usize, end: usize) -> Span {
        let loc = self.locate(start);
        Span {
            start: start as u32,
            end: end as u32,
            line: loc.line,
            column: loc.column,
        }
    }
}
