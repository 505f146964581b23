//! Visitor pattern for traversing the AST.
//!
//! This module provides a read-only [`Visitor`] trait and a mutating
//! [`VisitorMut`] trait, each with corresponding `walk_*` functions.
//!
//! Each `visit_*` method corresponds to an AST node type and is called
//! when that node is encountered during traversal. The default
//! implementations call the corresponding `walk_*` function to continue
//! traversal; override a method to customize behavior for that node type
//! and call the `walk_*` function yourself to keep descending.
//!
//! Every identifier in the tree, whether declaring or referring, reaches
//! `visit_ident`. Whether an identifier is a reference to something is up to
//! the caller (usually by consulting a resolution table keyed by
//! [`IdentId`](super::IdentId)).
//!
//! # Example
//!
//! ```
//! use gotmpl_parser::ast::visitor::Visitor;
//! use gotmpl_parser::ast::Ident;
//! use gotmpl_parser::parse_source;
//!
//! struct Names(Vec<String>);
//!
//! impl Visitor for Names {
//!     fn visit_ident(&mut self, ident: &Ident) {
//!         self.0.push(ident.name.clone());
//!     }
//! }
//!
//! let file = parse_source("package p\n\nvar x = y\n").unwrap();
//! let mut names = Names(Vec::new());
//! names.visit_file(&file);
//! assert_eq!(names.0, vec!["p", "x", "y"]);
//! ```

use crate::ast::decl::*;
use crate::ast::expr::*;
use crate::ast::node::Ident;
use crate::ast::stmt::*;

/// Read-only AST visitor.
pub trait Visitor: Sized {
    fn visit_file(&mut self, file: &File) {
        walk_file(self, file);
    }

    fn visit_import_spec(&mut self, spec: &ImportSpec) {
        walk_import_spec(self, spec);
    }

    fn visit_decl(&mut self, decl: &Decl) {
        walk_decl(self, decl);
    }

    fn visit_func_decl(&mut self, func: &FuncDecl) {
        walk_func_decl(self, func);
    }

    fn visit_type_spec(&mut self, spec: &TypeSpec) {
        walk_type_spec(self, spec);
    }

    fn visit_value_spec(&mut self, spec: &ValueSpec) {
        walk_value_spec(self, spec);
    }

    fn visit_field(&mut self, field: &Field) {
        walk_field(self, field);
    }

    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }

    /// Leaf: every identifier occurrence.
    fn visit_ident(&mut self, _ident: &Ident) {}
}

pub fn walk_file<V: Visitor>(visitor: &mut V, file: &File) {
    visitor.visit_ident(&file.package);
    for spec in file.import_specs() {
        visitor.visit_import_spec(spec);
    }
    for decl in &file.decls {
        visitor.visit_decl(decl);
    }
}

pub fn walk_import_spec<V: Visitor>(visitor: &mut V, spec: &ImportSpec) {
    if let Some(name) = &spec.name {
        visitor.visit_ident(name);
    }
}

pub fn walk_decl<V: Visitor>(visitor: &mut V, decl: &Decl) {
    match decl {
        Decl::Func(func) => visitor.visit_func_decl(func),
        Decl::Type(decl) => {
            for spec in &decl.specs {
                visitor.visit_type_spec(spec);
            }
        }
        Decl::Var(decl) | Decl::Const(decl) => {
            for spec in &decl.specs {
                visitor.visit_value_spec(spec);
            }
        }
    }
}

pub fn walk_func_decl<V: Visitor>(visitor: &mut V, func: &FuncDecl) {
    if let Some(recv) = &func.recv {
        visitor.visit_field(recv);
    }
    visitor.visit_ident(&func.name);
    walk_func_type(visitor, &func.ty);
    if let Some(body) = &func.body {
        visitor.visit_block(body);
    }
}

pub fn walk_func_type<V: Visitor>(visitor: &mut V, ty: &FuncType) {
    for field in ty.params.iter().chain(&ty.results) {
        visitor.visit_field(field);
    }
}

pub fn walk_type_spec<V: Visitor>(visitor: &mut V, spec: &TypeSpec) {
    visitor.visit_ident(&spec.name);
    visitor.visit_expr(&spec.ty);
}

pub fn walk_value_spec<V: Visitor>(visitor: &mut V, spec: &ValueSpec) {
    for name in &spec.names {
        visitor.visit_ident(name);
    }
    if let Some(ty) = &spec.ty {
        visitor.visit_expr(ty);
    }
    for value in &spec.values {
        visitor.visit_expr(value);
    }
}

pub fn walk_field<V: Visitor>(visitor: &mut V, field: &Field) {
    for name in &field.names {
        visitor.visit_ident(name);
    }
    visitor.visit_expr(&field.ty);
}

pub fn walk_block<V: Visitor>(visitor: &mut V, block: &Block) {
    for stmt in &block.stmts {
        visitor.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visitor>(visitor: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Decl(decl) => visitor.visit_decl(decl),
        Stmt::Labeled(s) => {
            visitor.visit_ident(&s.label);
            visitor.visit_stmt(&s.stmt);
        }
        Stmt::Expr(e) => visitor.visit_expr(e),
        Stmt::Send(s) => {
            visitor.visit_expr(&s.chan);
            visitor.visit_expr(&s.value);
        }
        Stmt::IncDec(s) => visitor.visit_expr(&s.expr),
        Stmt::Assign(s) => {
            for e in s.lhs.iter().chain(&s.rhs) {
                visitor.visit_expr(e);
            }
        }
        Stmt::Go(s) | Stmt::Defer(s) => visitor.visit_expr(&s.call),
        Stmt::Return(s) => {
            for e in &s.results {
                visitor.visit_expr(e);
            }
        }
        Stmt::Branch(s) => {
            if let Some(label) = &s.label {
                visitor.visit_ident(label);
            }
        }
        Stmt::Block(b) => visitor.visit_block(b),
        Stmt::If(s) => {
            if let Some(init) = &s.init {
                visitor.visit_stmt(init);
            }
            visitor.visit_expr(&s.cond);
            visitor.visit_block(&s.then);
            if let Some(els) = &s.els {
                visitor.visit_stmt(els);
            }
        }
        Stmt::Switch(s) => {
            if let Some(init) = &s.init {
                visitor.visit_stmt(init);
            }
            if let Some(tag) = &s.tag {
                visitor.visit_expr(tag);
            }
            walk_case_clauses(visitor, &s.clauses);
        }
        Stmt::TypeSwitch(s) => {
            if let Some(init) = &s.init {
                visitor.visit_stmt(init);
            }
            if let Some(binding) = &s.binding {
                visitor.visit_ident(binding);
            }
            visitor.visit_expr(&s.expr);
            walk_case_clauses(visitor, &s.clauses);
        }
        Stmt::Select(s) => {
            for clause in &s.clauses {
                if let Some(comm) = &clause.comm {
                    visitor.visit_stmt(comm);
                }
                for stmt in &clause.body {
                    visitor.visit_stmt(stmt);
                }
            }
        }
        Stmt::For(s) => {
            if let Some(init) = &s.init {
                visitor.visit_stmt(init);
            }
            if let Some(cond) = &s.cond {
                visitor.visit_expr(cond);
            }
            if let Some(post) = &s.post {
                visitor.visit_stmt(post);
            }
            visitor.visit_block(&s.body);
        }
        Stmt::Range(s) => {
            for e in s.key.iter().chain(&s.value) {
                visitor.visit_expr(e);
            }
            visitor.visit_expr(&s.expr);
            visitor.visit_block(&s.body);
        }
        Stmt::Empty(_) => {}
    }
}

fn walk_case_clauses<V: Visitor>(visitor: &mut V, clauses: &[CaseClause]) {
    for clause in clauses {
        for e in clause.list.iter().flatten() {
            visitor.visit_expr(e);
        }
        for stmt in &clause.body {
            visitor.visit_stmt(stmt);
        }
    }
}

pub fn walk_expr<V: Visitor>(visitor: &mut V, expr: &Expr) {
    match expr {
        Expr::Ident(ident) => visitor.visit_ident(ident),
        Expr::BasicLit(_) => {}
        Expr::CompositeLit(e) => {
            if let Some(ty) = &e.ty {
                visitor.visit_expr(ty);
            }
            for elt in &e.elts {
                visitor.visit_expr(elt);
            }
        }
        Expr::FuncLit(e) => {
            walk_func_type(visitor, &e.ty);
            visitor.visit_block(&e.body);
        }
        Expr::Paren(e) => visitor.visit_expr(&e.expr),
        Expr::Selector(e) => {
            visitor.visit_expr(&e.expr);
            visitor.visit_ident(&e.sel);
        }
        Expr::Index(e) => {
            visitor.visit_expr(&e.expr);
            visitor.visit_expr(&e.index);
        }
        Expr::Slice(e) => {
            visitor.visit_expr(&e.expr);
            for part in [&e.low, &e.high, &e.max].into_iter().flatten() {
                visitor.visit_expr(part);
            }
        }
        Expr::TypeAssert(e) => {
            visitor.visit_expr(&e.expr);
            if let Some(ty) = &e.ty {
                visitor.visit_expr(ty);
            }
        }
        Expr::Call(e) => {
            visitor.visit_expr(&e.func);
            for arg in &e.args {
                visitor.visit_expr(arg);
            }
        }
        Expr::Star(e) => visitor.visit_expr(&e.expr),
        Expr::Unary(e) => visitor.visit_expr(&e.expr),
        Expr::Binary(e) => {
            visitor.visit_expr(&e.left);
            visitor.visit_expr(&e.right);
        }
        Expr::KeyValue(e) => {
            visitor.visit_expr(&e.key);
            visitor.visit_expr(&e.value);
        }
        Expr::Ellipsis(e) => {
            if let Some(elt) = &e.elt {
                visitor.visit_expr(elt);
            }
        }
        Expr::ArrayType(e) => {
            if let Some(len) = &e.len {
                visitor.visit_expr(len);
            }
            visitor.visit_expr(&e.elt);
        }
        Expr::StructType(e) => {
            for field in &e.fields {
                visitor.visit_field(field);
            }
        }
        Expr::FuncType(e) => walk_func_type(visitor, e),
        Expr::InterfaceType(e) => {
            for field in &e.methods {
                visitor.visit_field(field);
            }
        }
        Expr::MapType(e) => {
            visitor.visit_expr(&e.key);
            visitor.visit_expr(&e.value);
        }
        Expr::ChanType(e) => visitor.visit_expr(&e.value),
    }
}

// ============================================================================
// Mutable traversal
// ============================================================================

/// Mutating AST visitor.
///
/// Overriding [`VisitorMut::visit_expr_mut`] allows replacing a whole
/// expression node, e.g. turning an identifier into a selector.
pub trait VisitorMut: Sized {
    fn visit_file_mut(&mut self, file: &mut File) {
        walk_file_mut(self, file);
    }

    fn visit_decl_mut(&mut self, decl: &mut Decl) {
        walk_decl_mut(self, decl);
    }

    fn visit_field_mut(&mut self, field: &mut Field) {
        walk_field_mut(self, field);
    }

    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }

    /// Leaf: every identifier occurrence.
    fn visit_ident_mut(&mut self, _ident: &mut Ident) {}
}

pub fn walk_file_mut<V: VisitorMut>(visitor: &mut V, file: &mut File) {
    visitor.visit_ident_mut(&mut file.package);
    for decl in &mut file.imports {
        for spec in &mut decl.specs {
            if let Some(name) = &mut spec.name {
                visitor.visit_ident_mut(name);
            }
        }
    }
    for decl in &mut file.decls {
        visitor.visit_decl_mut(decl);
    }
}

pub fn walk_decl_mut<V: VisitorMut>(visitor: &mut V, decl: &mut Decl) {
    match decl {
        Decl::Func(func) => {
            if let Some(recv) = &mut func.recv {
                visitor.visit_field_mut(recv);
            }
            visitor.visit_ident_mut(&mut func.name);
            walk_func_type_mut(visitor, &mut func.ty);
            if let Some(body) = &mut func.body {
                visitor.visit_block_mut(body);
            }
        }
        Decl::Type(decl) => {
            for spec in &mut decl.specs {
                visitor.visit_ident_mut(&mut spec.name);
                visitor.visit_expr_mut(&mut spec.ty);
            }
        }
        Decl::Var(decl) | Decl::Const(decl) => {
            for spec in &mut decl.specs {
                for name in &mut spec.names {
                    visitor.visit_ident_mut(name);
                }
                if let Some(ty) = &mut spec.ty {
                    visitor.visit_expr_mut(ty);
                }
                for value in &mut spec.values {
                    visitor.visit_expr_mut(value);
                }
            }
        }
    }
}

pub fn walk_func_type_mut<V: VisitorMut>(visitor: &mut V, ty: &mut FuncType) {
    for field in ty.params.iter_mut().chain(&mut ty.results) {
        visitor.visit_field_mut(field);
    }
}

pub fn walk_field_mut<V: VisitorMut>(visitor: &mut V, field: &mut Field) {
    for name in &mut field.names {
        visitor.visit_ident_mut(name);
    }
    visitor.visit_expr_mut(&mut field.ty);
}

pub fn walk_block_mut<V: VisitorMut>(visitor: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        visitor.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitorMut>(visitor: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Decl(decl) => visitor.visit_decl_mut(decl),
        Stmt::Labeled(s) => {
            visitor.visit_ident_mut(&mut s.label);
            visitor.visit_stmt_mut(&mut s.stmt);
        }
        Stmt::Expr(e) => visitor.visit_expr_mut(e),
        Stmt::Send(s) => {
            visitor.visit_expr_mut(&mut s.chan);
            visitor.visit_expr_mut(&mut s.value);
        }
        Stmt::IncDec(s) => visitor.visit_expr_mut(&mut s.expr),
        Stmt::Assign(s) => {
            for e in s.lhs.iter_mut().chain(&mut s.rhs) {
                visitor.visit_expr_mut(e);
            }
        }
        Stmt::Go(s) | Stmt::Defer(s) => visitor.visit_expr_mut(&mut s.call),
        Stmt::Return(s) => {
            for e in &mut s.results {
                visitor.visit_expr_mut(e);
            }
        }
        Stmt::Branch(s) => {
            if let Some(label) = &mut s.label {
                visitor.visit_ident_mut(label);
            }
        }
        Stmt::Block(b) => visitor.visit_block_mut(b),
        Stmt::If(s) => {
            if let Some(init) = &mut s.init {
                visitor.visit_stmt_mut(init);
            }
            visitor.visit_expr_mut(&mut s.cond);
            visitor.visit_block_mut(&mut s.then);
            if let Some(els) = &mut s.els {
                visitor.visit_stmt_mut(els);
            }
        }
        Stmt::Switch(s) => {
            if let Some(init) = &mut s.init {
                visitor.visit_stmt_mut(init);
            }
            if let Some(tag) = &mut s.tag {
                visitor.visit_expr_mut(tag);
            }
            walk_case_clauses_mut(visitor, &mut s.clauses);
        }
        Stmt::TypeSwitch(s) => {
            if let Some(init) = &mut s.init {
                visitor.visit_stmt_mut(init);
            }
            if let Some(binding) = &mut s.binding {
                visitor.visit_ident_mut(binding);
            }
            visitor.visit_expr_mut(&mut s.expr);
            walk_case_clauses_mut(visitor, &mut s.clauses);
        }
        Stmt::Select(s) => {
            for clause in &mut s.clauses {
                if let Some(comm) = &mut clause.comm {
                    visitor.visit_stmt_mut(comm);
                }
                for stmt in &mut clause.body {
                    visitor.visit_stmt_mut(stmt);
                }
            }
        }
        Stmt::For(s) => {
            if let Some(init) = &mut s.init {
                visitor.visit_stmt_mut(init);
            }
            if let Some(cond) = &mut s.cond {
                visitor.visit_expr_mut(cond);
            }
            if let Some(post) = &mut s.post {
                visitor.visit_stmt_mut(post);
            }
            visitor.visit_block_mut(&mut s.body);
        }
        Stmt::Range(s) => {
            for e in s.key.iter_mut().chain(&mut s.value) {
                visitor.visit_expr_mut(e);
            }
            visitor.visit_expr_mut(&mut s.expr);
            visitor.visit_block_mut(&mut s.body);
        }
        Stmt::Empty(_) => {}
    }
}

fn walk_case_clauses_mut<V: VisitorMut>(visitor: &mut V, clauses: &mut [CaseClause]) {
    for clause in clauses {
        for e in clause.list.iter_mut().flatten() {
            visitor.visit_expr_mut(e);
        }
        for stmt in &mut clause.body {
            visitor.visit_stmt_mut(stmt);
        }
    }
}

pub fn walk_expr_mut<V: VisitorMut>(visitor: &mut V, expr: &mut Expr) {
    match expr {
        Expr::Ident(ident) => visitor.visit_ident_mut(ident),
        Expr::BasicLit(_) => {}
        Expr::CompositeLit(e) => {
            if let Some(ty) = &mut e.ty {
                visitor.visit_expr_mut(ty);
            }
            for elt in &mut e.elts {
                visitor.visit_expr_mut(elt);
            }
        }
        Expr::FuncLit(e) => {
            walk_func_type_mut(visitor, &mut e.ty);
            visitor.visit_block_mut(&mut e.body);
        }
        Expr::Paren(e) => visitor.visit_expr_mut(&mut e.expr),
        Expr::Selector(e) => {
            visitor.visit_expr_mut(&mut e.expr);
            visitor.visit_ident_mut(&mut e.sel);
        }
        Expr::Index(e) => {
            visitor.visit_expr_mut(&mut e.expr);
            visitor.visit_expr_mut(&mut e.index);
        }
        Expr::Slice(e) => {
            visitor.visit_expr_mut(&mut e.expr);
            for part in [&mut e.low, &mut e.high, &mut e.max].into_iter().flatten() {
                visitor.visit_expr_mut(part);
            }
        }
        Expr::TypeAssert(e) => {
            visitor.visit_expr_mut(&mut e.expr);
            if let Some(ty) = &mut e.ty {
                visitor.visit_expr_mut(ty);
            }
        }
        Expr::Call(e) => {
            visitor.visit_expr_mut(&mut e.func);
            for arg in &mut e.args {
                visitor.visit_expr_mut(arg);
            }
        }
        Expr::Star(e) => visitor.visit_expr_mut(&mut e.expr),
        Expr::Unary(e) => visitor.visit_expr_mut(&mut e.expr),
        Expr::Binary(e) => {
            visitor.visit_expr_mut(&mut e.left);
            visitor.visit_expr_mut(&mut e.right);
        }
        Expr::KeyValue(e) => {
            visitor.visit_expr_mut(&mut e.key);
            visitor.visit_expr_mut(&mut e.value);
        }
        Expr::Ellipsis(e) => {
            if let Some(elt) = &mut e.elt {
                visitor.visit_expr_mut(elt);
            }
        }
        Expr::ArrayType(e) => {
            if let Some(len) = &mut e.len {
                visitor.visit_expr_mut(len);
            }
            visitor.visit_expr_mut(&mut e.elt);
        }
        Expr::StructType(e) => {
            for field in &mut e.fields {
                visitor.visit_field_mut(field);
            }
        }
        Expr::FuncType(e) => walk_func_type_mut(visitor, e),
        Expr::InterfaceType(e) => {
            for field in &mut e.methods {
                visitor.visit_field_mut(field);
            }
        }
        Expr::MapType(e) => {
            visitor.visit_expr_mut(&mut e.key);
            visitor.visit_expr_mut(&mut e.value);
        }
        Expr::ChanType(e) => visitor.visit_expr_mut(&mut e.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Parser;
    use gotmpl_core::FileId;

    struct Counter {
        idents: usize,
        stmts: usize,
    }

    impl Visitor for Counter {
        fn visit_stmt(&mut self, stmt: &Stmt) {
            self.stmts += 1;
            walk_stmt(self, stmt);
        }

        fn visit_ident(&mut self, _ident: &Ident) {
            self.idents += 1;
        }
    }

    struct Upper;

    impl VisitorMut for Upper {
        fn visit_ident_mut(&mut self, ident: &mut Ident) {
            ident.name = ident.name.to_uppercase();
        }
    }

    const SOURCE: &str = "package p\n\nfunc f(a int) int {\n\tif a > 0 {\n\t\treturn a\n\t}\n\treturn -a\n}\n";

    #[test]
    fn visitor_reaches_every_ident_and_stmt() {
        let file = Parser::parse_file(SOURCE, FileId(0)).unwrap();
        let mut counter = Counter { idents: 0, stmts: 0 };
        counter.visit_file(&file);
        // p, f, a, int, int, a, a, a
        assert_eq!(counter.idents, 8);
        // if, return, return
        assert_eq!(counter.stmts, 3);
    }

    #[test]
    fn mutable_visitor_renames_in_place() {
        let mut file = Parser::parse_file(SOURCE, FileId(0)).unwrap();
        Upper.visit_file_mut(&mut file);
        let Decl::Func(func) = &file.decls[0] else {
            panic!("expected func");
        };
        assert_eq!(func.name.name, "F");
        assert_eq!(func.ty.params[0].names[0].name, "A");
    }
}
