//! Source positions and spanned values.

use std::fmt;

/// A single point in a source document: byte offset plus 1-based line/column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SourcePosition {
    pub index: usize,
    pub line: usize,
    pub column: usize,
}

impl SourcePosition {
    pub fn new(index: usize, line: usize, column: usize) -> Self {
        SourcePosition { index, line, column }
    }

    pub fn start() -> Self {
        SourcePosition { index: 0, line: 1, column: 1 }
    }

    pub fn advance(&mut self, c: char) {
        self.index += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl fmt::Display for SourcePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// A byte range in a source document, identified by an opaque file id so that
/// errors spanning multiple documents (a request plus its schema) can still be
/// told apart.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Span {
    pub file_id: u32,
    pub start: SourcePosition,
    pub end: SourcePosition,
}

impl Span {
    pub fn new(file_id: u32, start: SourcePosition, end: SourcePosition) -> Self {
        Span { file_id, start, end }
    }

    pub fn unlocated() -> Self {
        Span::default()
    }
}

/// A value annotated with the span it was parsed from.
#[derive(Clone, Debug)]
pub struct Spanning<T> {
    pub item: T,
    pub span: Span,
}

impl<T> Spanning<T> {
    pub fn new(span: Span, item: T) -> Self {
        Spanning { item, span }
    }

    pub fn unlocated(item: T) -> Self {
        Spanning { item, span: Span::unlocated() }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Spanning<U> {
        Spanning { item: f(self.item), span: self.span }
    }

    pub fn as_ref(&self) -> Spanning<&T> {
        Spanning { item: &self.item, span: self.span }
    }
}

impl<T: PartialEq> PartialEq for Spanning<T> {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item
    }
}

impl<T: Eq> Eq for Spanning<T> {}

impl<T> std::ops::Deref for Spanning<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_tracks_lines_and_columns() {
        let mut pos = SourcePosition::start();
        pos.advance('a');
        pos.advance('\n');
        pos.advance('b');
        assert_eq!(pos, SourcePosition::new(3, 2, 2));
    }

    #[test]
    fn spanning_equality_ignores_span() {
        let a = Spanning::new(Span::new(0, SourcePosition::start(), SourcePosition::start()), 1);
        let b = Spanning::unlocated(1);
        assert_eq!(a, b);
    }
}
