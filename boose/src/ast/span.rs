//! Source location tracking

use serde::Serialize;

/// A byte range in the program text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

impl From<Span> for std::ops::Range<usize> {
    fn from(span: Span) -> Self {
        span.start..span.end
    }
}

impl From<std::ops::Range<usize>> for Span {
    fn from(range: std::ops::Range<usize>) -> Self {
        Span::new(range.start, range.end)
    }
}

/// One trimmed line of program text together with where it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceLine {
    /// 1-based line number in the original text
    pub number: usize,
    /// Line content with surrounding whitespace removed
    pub text: String,
    /// Byte range of `text` in the original program
    pub span: Span,
}

impl SourceLine {
    pub fn new(number: usize, text: impl Into<String>, span: Span) -> Self {
        Self {
            number,
            text: text.into(),
            span,
        }
    }

    /// Blank lines and `*` comments carry no statement.
    pub fn is_skippable(&self) -> bool {
        self.text.is_empty() || self.text.starts_with('*')
    }
}

/// A value with the source line it was parsed from
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
    pub line: usize,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span, line: usize) -> Self {
        Self { node, span, line }
    }

    /// Attach `node` to the location of a source line.
    pub fn at(node: T, source: &SourceLine) -> Self {
        Self::new(node, source.span, source.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_new() {
        let span = Span::new(10, 20);
        assert_eq!(span.start, 10);
        assert_eq!(span.end, 20);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_display() {
        assert_eq!(Span::new(3, 7).to_string(), "3..7");
    }

    #[test]
    fn test_span_range_conversion() {
        let range: std::ops::Range<usize> = Span::new(2, 5).into();
        assert_eq!(range, 2..5);
        let span: Span = (4..9).into();
        assert_eq!(span, Span::new(4, 9));
    }

    #[test]
    fn test_source_line_skippable() {
        assert!(SourceLine::new(1, "", Span::default()).is_skippable());
        assert!(SourceLine::new(1, "* a comment", Span::default()).is_skippable());
        assert!(!SourceLine::new(1, "circle 10", Span::default()).is_skippable());
    }

    #[test]
    fn test_spanned_at_line() {
        let line = SourceLine::new(4, "clear", Span::new(30, 35));
        let spanned = Spanned::at("clear", &line);
        assert_eq!(spanned.line, 4);
        assert_eq!(spanned.span, Span::new(30, 35));
    }
}
