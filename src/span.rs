//! Source position tracking, adapted from the [codemap](https://crates.io/crates/codemap)
//! lineage: a byte-range `Span`, a `Spanned<T>` wrapper, and a `FileMap` for
//! turning a byte offset into a line/column pair for diagnostics.

use core::fmt;
use core::ops::{Deref, Range};

/// A range of bytes within the source text.
#[derive(Copy, Clone, Debug, Eq, Hash, PartialEq)]
pub struct Span {
    /// The first byte of the span.
    pub start: usize,
    /// The byte after the last byte of the span.
    pub end: usize,
}

impl Span {
    #[inline]
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.start >= self.end
    }

    #[inline]
    pub fn len(self) -> usize {
        self.end - self.start
    }

    /// The smallest span enclosing both `self` and `other`.
    #[inline]
    pub fn merge(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub fn into_range(self) -> Range<usize> {
        self.start..self.end
    }
}

/// Associates a [`Span`] with a value of arbitrary type, e.g. an AST node.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    #[inline]
    pub fn new(node: T, start: usize, end: usize) -> Self {
        Self {
            node,
            span: Span::new(start, end),
        }
    }

    #[inline]
    pub fn at(node: T, span: Span) -> Self {
        Self { node, span }
    }

    /// Maps the node, leaving the span untouched.
    pub fn map_node<U, F: FnOnce(T) -> U>(self, op: F) -> Spanned<U> {
        Spanned {
            node: op(self.node),
            span: self.span,
        }
    }
}

impl<T> Deref for Spanned<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.node
    }
}

/// A one-based line and column, plus the byte offset it was computed from.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct LineCol {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// A record of a source text's line-start byte offsets, used to turn
/// positions into [`LineCol`]s when logging a [`crate::diagnostics::Diagnostic`];
/// never consulted by the grammars themselves.
#[derive(Clone)]
pub struct FileMap<'a> {
    source: &'a str,
    lines: Vec<u32>,
}

impl fmt::Debug for FileMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut limit = 100.min(self.source.len());
        while !self.source.is_char_boundary(limit) {
            limit += 1;
        }
        f.debug_struct("FileMap")
            .field(
                "source",
                &format!(
                    "{}{}",
                    &self.source[..limit],
                    if self.source.len() > limit { "…" } else { "" }
                ),
            )
            .finish()
    }
}

impl<'a> FileMap<'a> {
    pub fn new(source: &'a str) -> Self {
        let lines = core::iter::once(0)
            .chain(
                source
                    .match_indices('\n')
                    .map(|(p, _)| u32::try_from(p + 1).unwrap()),
            )
            .collect();
        Self { source, lines }
    }

    /// Gets the line and column of a byte position.
    ///
    /// # Panics
    ///
    /// If `pos` is outside the source, or falls in the middle of a UTF-8
    /// character.
    pub fn find_line_col(&self, pos: usize) -> LineCol {
        let line = self.find_line(pos);
        let line_span = self.line_span(line);
        let column = self.source[line_span.start..pos].chars().count();
        LineCol {
            line: line + 1,
            column: column + 1,
            offset: pos,
        }
    }

    fn find_line(&self, pos: usize) -> usize {
        assert!(pos <= self.source.len());
        let pos = u32::try_from(pos).unwrap();
        match self.lines.binary_search(&pos) {
            Ok(i) => i,
            Err(i) => i - 1,
        }
    }

    fn line_span(&self, line: usize) -> Span {
        self.lines
            .get(line)
            .map(|start| Span {
                start: usize::try_from(*start).unwrap(),
                end: self
                    .lines
                    .get(line + 1)
                    .map_or(self.source.len(), |end| usize::try_from(*end).unwrap()),
            })
            .unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_takes_the_outer_bounds() {
        let a = Span::new(3, 7);
        let b = Span::new(1, 5);
        assert_eq!(a.merge(b), Span::new(1, 7));
    }

    #[test]
    fn find_line_col_is_one_based() {
        let fm = FileMap::new("abc\ndef\nghi");
        assert_eq!(
            fm.find_line_col(0),
            LineCol {
                line: 1,
                column: 1,
                offset: 0
            }
        );
        assert_eq!(
            fm.find_line_col(4),
            LineCol {
                line: 2,
                column: 1,
                offset: 4
            }
        );
        assert_eq!(
            fm.find_line_col(9),
            LineCol {
                line: 3,
                column: 2,
                offset: 9
            }
        );
    }
}
