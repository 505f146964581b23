//! Common AST node types used throughout the parser.
//!
//! Provides identifiers and the stable ids that name-resolution tables key on.

use gotmpl_core::{FileId, Span};
use std::fmt;

/// Stable identity of one identifier occurrence.
///
/// Ids are assigned by the parser in source order and stay attached to the
/// node through every rewrite, so a binding table computed before a rewrite
/// can still be consulted while the tree is being mutated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct IdentId {
    /// File the identifier was parsed from (or synthesized into).
    pub file: FileId,
    /// Per-file sequence number.
    pub index: u32,
}

/// An identifier with source location.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
    /// The identifier name.
    pub name: String,
    /// Stable identity, see [`IdentId`].
    pub id: IdentId,
    /// Source location.
    pub span: Span,
}

impl Ident {
    /// Create a new identifier.
    pub fn new(name: impl Into<String>, id: IdentId, span: Span) -> Self {
        Self {
            name: name.into(),
            id,
            span,
        }
    }

    /// Whether this is the blank identifier `_`.
    pub fn is_blank(&self) -> bool {
        self.name == "_"
    }

    /// Whether the name starts with an upper-case letter.
    pub fn is_exported(&self) -> bool {
        self.name.chars().next().is_some_and(char::is_uppercase)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A comment preserved from the source, attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    /// Comment texts including their `//` or `/* */` delimiters.
    pub lines: Vec<String>,
}

impl CommentGroup {
    /// Whether the group has no comments.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
