//! The position/file registry shared by every tree of one run.
//!
//! Every parsed file is registered here and gets a [`FileId`]; spans carry
//! that id so diagnostics can be rendered as `path:line:col` no matter which
//! stage produced them. A `SourceMap` belongs to exactly one run and is
//! mutated as files are (re)registered, so it is never shared between runs.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::{FileId, Span};

/// One registered file.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Path (or logical name) the file was registered under.
    pub path: PathBuf,
    /// Full source text.
    pub text: String,
}

/// Registry of all files seen during a run.
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a file and return its id.
    ///
    /// Registering the same path twice yields two ids; a reparse of printed
    /// text is a new file as far as positions are concerned.
    pub fn add_file(&mut self, path: impl Into<PathBuf>, text: impl Into<String>) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(SourceFile {
            path: path.into(),
            text: text.into(),
        });
        id
    }

    /// Look up a registered file.
    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.index())
    }

    /// Path of a registered file, if any.
    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.get(id).map(|f| f.path.as_path())
    }

    /// Source text of a registered file, if any.
    pub fn text(&self, id: FileId) -> Option<&str> {
        self.get(id).map(|f| f.text.as_str())
    }

    /// Number of registered files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing has been registered yet.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Get the text of a specific line (1-indexed).
    pub fn line_text(&self, id: FileId, line: u32) -> Option<&str> {
        if line == 0 {
            return None;
        }
        self.text(id)?.lines().nth(line as usize - 1)
    }

    /// Render a span as `path:line:col`.
    pub fn location(&self, span: Span) -> Location<'_> {
        Location { map: self, span }
    }
}

/// Display adapter returned by [`SourceMap::location`].
pub struct Location<'a> {
    map: &'a SourceMap,
    span: Span,
}

impl fmt::Display for Location<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.map.path(self.span.file) {
            Some(path) => write!(f, "{}:{}", path.display(), self.span),
            None => write!(f, "<generated>:{}", self.span),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_files_in_order() {
        let mut map = SourceMap::new();
        let a = map.add_file("a.go", "package a\n");
        let b = map.add_file("b.go", "package a\n\nvar x int\n");

        assert_eq!(a, FileId(0));
        assert_eq!(b, FileId(1));
        assert_eq!(map.len(), 2);
        assert_eq!(map.line_text(b, 3), Some("var x int"));
        assert_eq!(map.line_text(b, 0), None);
    }

    #[test]
    fn location_renders_path() {
        let mut map = SourceMap::new();
        let id = map.add_file("pkg/list.go", "package list\n");
        let span = Span::new(id, 1, 9, 4);
        assert_eq!(map.location(span).to_string(), "pkg/list.go:1:9");
        assert_eq!(
            map.location(Span::synthetic()).to_string(),
            "<generated>:0:0"
        );
    }
}
