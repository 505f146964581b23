//! Source positions.
//!
//! A [`Span`] names a file by [`FileId`] and a line/column inside it; the
//! [`SourceMap`](crate::SourceMap) turns it back into `path:line:col`.

use std::fmt;

/// Index of a file registered in a [`SourceMap`](crate::SourceMap).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct FileId(pub u32);

impl FileId {
    /// Placeholder id used for nodes synthesized outside any file.
    pub const SYNTHETIC: FileId = FileId(u32::MAX);

    /// Index into the owning source map.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::SYNTHETIC {
            write!(f, "file#synthetic")
        } else {
            write!(f, "file#{}", self.0)
        }
    }
}

/// Where a token or node starts, and how many bytes it covers on that line.
///
/// Nodes inserted by a rewrite carry [`Span::synthetic`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub file: FileId,
    /// 1-based; 0 only for synthetic spans.
    pub line: u32,
    /// 1-based byte column.
    pub col: u32,
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(file: FileId, line: u32, col: u32, len: u32) -> Self {
        Self { file, line, col, len }
    }

    /// Zero-width span, used for inserted semicolons and end of file.
    #[inline]
    pub fn point(file: FileId, line: u32, col: u32) -> Self {
        Self::new(file, line, col, 0)
    }

    #[inline]
    pub fn synthetic() -> Self {
        Self::point(FileId::SYNTHETIC, 0, 0)
    }

    #[inline]
    pub fn is_synthetic(&self) -> bool {
        self.file == FileId::SYNTHETIC
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.len
    }

    /// Smallest span starting at the earlier of the two positions.
    ///
    /// Spans only know their first line, so across lines the result keeps
    /// the start of `self` and sums the lengths. A synthetic side is ignored.
    pub fn merge(self, other: Span) -> Span {
        match (self.is_synthetic(), other.is_synthetic()) {
            (true, _) => return other,
            (_, true) => return self,
            _ => {}
        }
        if self.line != other.line {
            return Span::new(self.file, self.line, self.col, self.len + other.len);
        }
        let start = self.col.min(other.col);
        let end = (self.col + self.len).max(other.col + other.len);
        Span::new(self.file, self.line, start, end - start)
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}:{}", self.file, self.line, self.col)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn span_basics() {
        let span = Span::new(FileId(0), 1, 5, 10);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());

        let empty = Span::point(FileId(0), 1, 5);
        assert!(empty.is_empty());
    }

    #[test]
    fn span_display() {
        let span = Span::new(FileId(2), 3, 15, 5);
        assert_eq!(format!("{}", span), "3:15");
    }

    #[test]
    fn span_merge_same_line() {
        let span1 = Span::new(FileId(0), 1, 5, 3);
        let span2 = Span::new(FileId(0), 1, 10, 3);
        let merged = span1.merge(span2);

        assert_eq!(merged.line, 1);
        assert_eq!(merged.col, 5);
        assert_eq!(merged.len, 8);
    }

    #[test]
    fn span_merge_ignores_synthetic_side() {
        let real = Span::new(FileId(1), 4, 2, 6);
        assert_eq!(Span::synthetic().merge(real), real);
        assert_eq!(real.merge(Span::synthetic()), real);
    }
}
