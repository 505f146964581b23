//! The resolution table: declarations and the bindings that refer to them.

use gotmpl_core::{FileId, Span};
use gotmpl_parser::ast::IdentId;
use rustc_hash::FxHashMap;

/// Stable handle of one declaration.
///
/// Ids are dense indices into [`ResolutionTable::decls`], assigned in the
/// order declarations are encountered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeclId(pub u32);

impl DeclId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What kind of entity a declaration introduces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclKind {
    /// `type T ...` (including aliases).
    Type,
    /// Function without receiver.
    Func,
    /// Method; not entered in any scope.
    Method,
    Var,
    Const,
    /// Function parameter or named result.
    Param,
    /// Imported package name.
    Import,
}

/// Where a declaration lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeclScope {
    /// Package block: visible from every file of the package.
    Package,
    /// File block (imports).
    File,
    /// Function-local.
    Local,
}

/// One declared entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeclInfo {
    pub name: String,
    pub kind: DeclKind,
    pub scope: DeclScope,
    /// The declaring identifier; `None` for an import without explicit name.
    pub ident: Option<IdentId>,
    /// File the declaration belongs to.
    pub file: FileId,
    pub span: Span,
}

impl DeclInfo {
    /// Whether this is a package-level declaration.
    pub fn is_package_level(&self) -> bool {
        self.scope == DeclScope::Package
    }
}

/// What an identifier occurrence refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    /// A declaration of the checked package (or one of its locals).
    Decl(DeclId),
    /// A predeclared or externally supplied name.
    Universe,
    /// Nothing in scope; reported as an undeclared name.
    Unresolved,
}

/// Identifier → declaration bindings for a whole package.
///
/// Built once per batch of clean trees and never mutated afterwards;
/// transforms consult it while editing the trees.
#[derive(Debug, Default, Clone)]
pub struct ResolutionTable {
    decls: Vec<DeclInfo>,
    bindings: FxHashMap<IdentId, Binding>,
    package_scope: FxHashMap<String, DeclId>,
}

impl ResolutionTable {
    pub(crate) fn add_decl(&mut self, info: DeclInfo) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        if let Some(ident) = info.ident {
            self.bindings.insert(ident, Binding::Decl(id));
        }
        if info.scope == DeclScope::Package && info.kind != DeclKind::Method {
            self.package_scope.entry(info.name.clone()).or_insert(id);
        }
        self.decls.push(info);
        id
    }

    pub(crate) fn bind(&mut self, ident: IdentId, binding: Binding) {
        self.bindings.insert(ident, binding);
    }

    /// Binding of an identifier occurrence.
    ///
    /// `None` for identifiers that are not resolved lexically: selector
    /// names, struct field names, labels, and the package clause.
    pub fn binding(&self, ident: IdentId) -> Option<Binding> {
        self.bindings.get(&ident).copied()
    }

    /// Declaration an identifier refers to, if it refers to one.
    pub fn decl_of(&self, ident: IdentId) -> Option<DeclId> {
        match self.binding(ident)? {
            Binding::Decl(id) => Some(id),
            Binding::Universe | Binding::Unresolved => None,
        }
    }

    /// Look up a declaration.
    pub fn decl(&self, id: DeclId) -> &DeclInfo {
        &self.decls[id.index()]
    }

    /// All declarations in id order.
    pub fn decls(&self) -> impl Iterator<Item = (DeclId, &DeclInfo)> {
        self.decls
            .iter()
            .enumerate()
            .map(|(i, info)| (DeclId(i as u32), info))
    }

    /// Package-level declaration by name.
    pub fn lookup_package(&self, name: &str) -> Option<DeclId> {
        self.package_scope.get(name).copied()
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.decls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.decls.is_empty()
    }
}
