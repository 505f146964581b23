//! Declaration AST nodes and the source file root.

use super::expr::{Expr, Field, FuncType};
use super::node::{CommentGroup, Ident, IdentId};
use super::stmt::Block;
use gotmpl_core::{FileId, Span};

/// A parsed Go source file.
///
/// The tree owns all of its nodes and is freely mutable; rewrites edit it in
/// place. Fresh identifiers created by a rewrite get ids from
/// [`File::fresh_ident`] so ids stay unique within the file.
#[derive(Debug, Clone, PartialEq)]
pub struct File {
    /// Id of the source text this tree was parsed from.
    pub id: FileId,
    /// Comments preceding the package clause.
    pub doc: Option<CommentGroup>,
    /// Package name from the package clause.
    pub package: Ident,
    /// Import declarations, in source order.
    pub imports: Vec<ImportDecl>,
    /// Top-level declarations, in source order.
    pub decls: Vec<Decl>,
    /// Next unused identifier index for this file.
    pub next_ident: u32,
    /// Span of the package clause.
    pub span: Span,
}

impl File {
    /// Create an identifier with a fresh id in this file.
    pub fn fresh_ident(&mut self, name: impl Into<String>, span: Span) -> Ident {
        let id = IdentId {
            file: self.id,
            index: self.next_ident,
        };
        self.next_ident += 1;
        Ident::new(name, id, span)
    }

    /// Iterate over all import specs of the file.
    pub fn import_specs(&self) -> impl Iterator<Item = &ImportSpec> {
        self.imports.iter().flat_map(|decl| decl.specs.iter())
    }

    /// Whether the file already imports `path`.
    pub fn imports_path(&self, path: &str) -> bool {
        self.import_specs().any(|spec| spec.path == path)
    }
}

/// `import "p"` or `import ( ... )`.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDecl {
    pub specs: Vec<ImportSpec>,
    /// Whether the declaration uses the parenthesized form.
    pub grouped: bool,
    pub span: Span,
}

/// One imported package.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportSpec {
    /// Explicit local name (including `.` and `_`).
    pub name: Option<Ident>,
    /// Unquoted import path.
    pub path: String,
    pub span: Span,
}

impl ImportSpec {
    /// The name the package is referred to by in the importing file.
    ///
    /// Without an explicit name this is the last path segment, which is
    /// the package name by convention.
    pub fn local_name(&self) -> &str {
        match &self.name {
            Some(name) => &name.name,
            None => self.path.rsplit('/').next().unwrap_or(&self.path),
        }
    }
}

/// A top-level (or, except for functions, local) declaration.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    /// Function or method
    Func(FuncDecl),
    /// `type` declaration
    Type(TypeDecl),
    /// `var` declaration
    Var(ValueDecl),
    /// `const` declaration
    Const(ValueDecl),
}

impl Decl {
    /// Get the span of this declaration.
    pub fn span(&self) -> Span {
        match self {
            Decl::Func(d) => d.span,
            Decl::Type(d) => d.span,
            Decl::Var(d) | Decl::Const(d) => d.span,
        }
    }

    /// Doc comment attached to the declaration.
    pub fn doc(&self) -> Option<&CommentGroup> {
        match self {
            Decl::Func(d) => d.doc.as_ref(),
            Decl::Type(d) => d.doc.as_ref(),
            Decl::Var(d) | Decl::Const(d) => d.doc.as_ref(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuncDecl {
    pub doc: Option<CommentGroup>,
    /// Receiver of a method.
    pub recv: Option<Field>,
    pub name: Ident,
    pub ty: FuncType,
    /// `None` for a function declared without body.
    pub body: Option<Block>,
    pub span: Span,
}

impl FuncDecl {
    /// Whether this is a method.
    pub fn is_method(&self) -> bool {
        self.recv.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDecl {
    pub doc: Option<CommentGroup>,
    pub specs: Vec<TypeSpec>,
    pub grouped: bool,
    pub span: Span,
}

/// `Name T` or `Name = T`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub name: Ident,
    /// Whether this is an alias declaration (`type A = B`).
    pub assign: bool,
    pub ty: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueDecl {
    pub doc: Option<CommentGroup>,
    pub specs: Vec<ValueSpec>,
    pub grouped: bool,
    pub span: Span,
}

/// `a, b T = x, y`; type and values are both optional.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueSpec {
    pub names: Vec<Ident>,
    pub ty: Option<Expr>,
    pub values: Vec<Expr>,
    pub span: Span,
}
