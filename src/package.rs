//! The stages a template package goes through.
//!
//! ```text
//! LoadedPackage ──rewrite──▶ RewrittenPackage ──stabilize──▶ StablePackage
//!   (clean)                     (dirty)                        (clean)
//! ```
//!
//! A rewritten package has no resolution table: its trees were mutated
//! after the table was built, so reading bindings from it is impossible by
//! construction. Only a [`StablePackage`] can be validated or emitted.

use std::path::{Path, PathBuf};

use gotmpl_checker::ResolutionTable;
use gotmpl_parser::ast::File;

/// One source file and its syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceUnit {
    /// Path the file was read from.
    pub path: PathBuf,
    pub tree: File,
}

impl SourceUnit {
    pub fn new(path: impl Into<PathBuf>, tree: File) -> Self {
        Self {
            path: path.into(),
            tree,
        }
    }

    /// File name without directory.
    pub fn base_name(&self) -> &str {
        self.path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default()
    }
}

/// Parsed and resolved template files.
#[derive(Debug)]
pub struct LoadedPackage {
    dir: PathBuf,
    files: Vec<SourceUnit>,
    table: ResolutionTable,
}

impl LoadedPackage {
    pub(crate) fn new(dir: PathBuf, files: Vec<SourceUnit>, table: ResolutionTable) -> Self {
        Self { dir, files, table }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[SourceUnit] {
        &self.files
    }

    pub fn table(&self) -> &ResolutionTable {
        &self.table
    }

    pub(crate) fn into_parts(self) -> (PathBuf, Vec<SourceUnit>, ResolutionTable) {
        (self.dir, self.files, self.table)
    }
}

/// Files whose trees were rewritten and whose bindings are stale.
#[derive(Debug)]
pub struct RewrittenPackage {
    dir: PathBuf,
    files: Vec<SourceUnit>,
}

impl RewrittenPackage {
    pub(crate) fn new(dir: PathBuf, files: Vec<SourceUnit>) -> Self {
        Self { dir, files }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[SourceUnit] {
        &self.files
    }

    pub(crate) fn into_parts(self) -> (PathBuf, Vec<SourceUnit>) {
        (self.dir, self.files)
    }
}

/// Rewritten files with a resolution table matching their current names.
#[derive(Debug)]
pub struct StablePackage {
    dir: PathBuf,
    files: Vec<SourceUnit>,
    table: ResolutionTable,
}

impl StablePackage {
    pub(crate) fn new(dir: PathBuf, files: Vec<SourceUnit>, table: ResolutionTable) -> Self {
        Self { dir, files, table }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn files(&self) -> &[SourceUnit] {
        &self.files
    }

    pub fn table(&self) -> &ResolutionTable {
        &self.table
    }
}
