//! Name resolution over a batch of files of one package.
//!
//! Resolution runs in two passes, like a two-pass compiler:
//!
//! 1. **Collection**: every package-level declaration of every file is
//!    entered in the package scope, and every import in its file scope, so
//!    that forward references work.
//! 2. **Resolution**: declarations and function bodies are walked with a
//!    stack of block scopes; each identifier occurrence is bound to the
//!    declaration it refers to.
//!
//! The resulting [`ResolutionTable`] is immutable. Selector names, struct
//! field names, labels and keys of struct literals are not bound; the type
//! checker resolves those against types.

use gotmpl_core::{CheckError, CheckErrors, FileId, Span};
use gotmpl_parser::ast::*;
use rustc_hash::{FxHashMap, FxHashSet};

use super::scope::LocalScopes;
use super::table::{Binding, DeclId, DeclInfo, DeclKind, DeclScope, ResolutionTable};
use crate::check::universe;

/// Output of [`resolve_package`].
#[derive(Debug, Default)]
pub struct ResolveOutput {
    /// Bindings of every resolved identifier.
    pub table: ResolutionTable,
    /// Undeclared names, redeclarations and `:=` without new variables.
    pub errors: CheckErrors,
}

/// Resolve a batch of files that form one package.
///
/// `externals` are additional names visible in every file, as if declared
/// in the universe (external types introduced by substitution targets).
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn resolve_package(files: &[&File], externals: &[String]) -> ResolveOutput {
    let externals: FxHashSet<&str> = externals.iter().map(String::as_str).collect();
    let mut resolver = Resolver::new(&externals);
    for file in files {
        resolver.collect_file(file);
    }
    for file in files {
        resolver.resolve_file(file);
    }
    tracing::debug!(
        files = files.len(),
        decls = resolver.table.len(),
        errors = resolver.errors.len(),
        "resolved package"
    );
    ResolveOutput {
        table: resolver.table,
        errors: resolver.errors,
    }
}

/// Imports visible in one file.
#[derive(Debug, Default)]
struct FileScope {
    imports: FxHashMap<String, DeclId>,
    /// A dot import makes unknown names possibly valid.
    dot_import: bool,
}

/// Walks declarations and bodies, binding identifiers.
struct Resolver<'a, 'x> {
    table: ResolutionTable,
    errors: CheckErrors,
    externals: &'x FxHashSet<&'x str>,
    files: FxHashMap<FileId, FileScope>,
    current_file: FileId,
    locals: LocalScopes,
    /// Definitions of declared types, for deciding how literal keys resolve.
    type_defs: FxHashMap<DeclId, &'a Expr>,
}

impl<'a, 'x> Resolver<'a, 'x> {
    fn new(externals: &'x FxHashSet<&'x str>) -> Self {
        Self {
            table: ResolutionTable::default(),
            errors: CheckErrors::new(),
            externals,
            files: FxHashMap::default(),
            current_file: FileId::SYNTHETIC,
            locals: LocalScopes::new(),
            type_defs: FxHashMap::default(),
        }
    }

    // ========================================================================
    // Pass 1: collection
    // ========================================================================

    fn collect_file(&mut self, file: &'a File) {
        let mut scope = FileScope::default();

        for spec in file.import_specs() {
            let (name, ident) = match &spec.name {
                Some(name) if name.name == "." => {
                    scope.dot_import = true;
                    continue;
                }
                Some(name) if name.is_blank() => continue,
                Some(name) => (name.name.clone(), Some(name)),
                None => (spec.local_name().to_string(), None),
            };
            let id = self.table.add_decl(DeclInfo {
                name: name.clone(),
                kind: DeclKind::Import,
                scope: DeclScope::File,
                ident: ident.map(|i| i.id),
                file: file.id,
                span: spec.span,
            });
            if let Some(previous) = scope.imports.get(&name) {
                let previous = self.table.decl(*previous).span;
                self.redeclared(&name, spec.span, previous);
            } else {
                scope.imports.insert(name, id);
            }
        }
        self.files.insert(file.id, scope);

        for decl in &file.decls {
            match decl {
                Decl::Func(func) if func.is_method() => {
                    self.table.add_decl(DeclInfo {
                        name: func.name.name.clone(),
                        kind: DeclKind::Method,
                        scope: DeclScope::Package,
                        ident: Some(func.name.id),
                        file: file.id,
                        span: func.name.span,
                    });
                }
                Decl::Func(func) => {
                    // `init` and `_` declare nothing at package level.
                    if func.name.name != "init" {
                        self.declare_package(&func.name, DeclKind::Func, file.id);
                    }
                }
                Decl::Type(decl) => {
                    for spec in &decl.specs {
                        if let Some(id) = self.declare_package(&spec.name, DeclKind::Type, file.id) {
                            self.type_defs.insert(id, &spec.ty);
                        }
                    }
                }
                Decl::Var(decl) => {
                    for spec in &decl.specs {
                        for name in &spec.names {
                            self.declare_package(name, DeclKind::Var, file.id);
                        }
                    }
                }
                Decl::Const(decl) => {
                    for spec in &decl.specs {
                        for name in &spec.names {
                            self.declare_package(name, DeclKind::Const, file.id);
                        }
                    }
                }
            }
        }
    }

    fn declare_package(&mut self, ident: &Ident, kind: DeclKind, file: FileId) -> Option<DeclId> {
        if ident.is_blank() {
            return None;
        }
        let previous = self.table.lookup_package(&ident.name);
        let id = self.table.add_decl(DeclInfo {
            name: ident.name.clone(),
            kind,
            scope: DeclScope::Package,
            ident: Some(ident.id),
            file,
            span: ident.span,
        });
        if let Some(previous) = previous {
            let previous = self.table.decl(previous).span;
            self.redeclared(&ident.name, ident.span, previous);
        }
        Some(id)
    }

    fn declare_local(&mut self, ident: &Ident, kind: DeclKind) -> Option<DeclId> {
        if ident.is_blank() {
            return None;
        }
        let id = self.table.add_decl(DeclInfo {
            name: ident.name.clone(),
            kind,
            scope: DeclScope::Local,
            ident: Some(ident.id),
            file: self.current_file,
            span: ident.span,
        });
        if let Some(previous) = self.locals.declare(&ident.name, id) {
            let previous = self.table.decl(previous).span;
            self.redeclared(&ident.name, ident.span, previous);
        }
        Some(id)
    }

    fn redeclared(&mut self, name: &str, span: Span, previous: Span) {
        self.errors.push(CheckError::Redeclared {
            name: name.to_string(),
            span,
            previous,
        });
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    fn lookup(&self, name: &str) -> Binding {
        if let Some(id) = self.locals.lookup(name) {
            return Binding::Decl(id);
        }
        if let Some(id) = self
            .files
            .get(&self.current_file)
            .and_then(|scope| scope.imports.get(name))
        {
            return Binding::Decl(*id);
        }
        if let Some(id) = self.table.lookup_package(name) {
            return Binding::Decl(id);
        }
        if universe::is_predeclared(name) || self.externals.contains(name) {
            return Binding::Universe;
        }
        Binding::Unresolved
    }

    /// Bind a referring identifier, reporting it when nothing is in scope.
    fn use_ident(&mut self, ident: &Ident) {
        if ident.is_blank() {
            return;
        }
        let binding = self.lookup(&ident.name);
        self.table.bind(ident.id, binding);
        let dot_import = self
            .files
            .get(&self.current_file)
            .is_some_and(|scope| scope.dot_import);
        if binding == Binding::Unresolved && !dot_import {
            self.errors.push(CheckError::UndeclaredName {
                name: ident.name.clone(),
                span: ident.span,
            });
        }
    }

    /// Bind an identifier only if something is in scope; never an error.
    fn try_use_ident(&mut self, ident: &Ident) {
        let binding = self.lookup(&ident.name);
        if binding != Binding::Unresolved {
            self.table.bind(ident.id, binding);
        }
    }

    // ========================================================================
    // Pass 2: declarations
    // ========================================================================

    fn resolve_file(&mut self, file: &'a File) {
        self.current_file = file.id;
        for decl in &file.decls {
            match decl {
                Decl::Func(func) => self.resolve_func_decl(func),
                Decl::Type(decl) => {
                    for spec in &decl.specs {
                        self.resolve_expr(&spec.ty);
                    }
                }
                Decl::Var(decl) | Decl::Const(decl) => {
                    for spec in &decl.specs {
                        if let Some(ty) = &spec.ty {
                            self.resolve_expr(ty);
                        }
                        for value in &spec.values {
                            self.resolve_expr(value);
                        }
                    }
                }
            }
        }
    }

    fn resolve_func_decl(&mut self, func: &'a FuncDecl) {
        self.locals.push();
        if let Some(recv) = &func.recv {
            self.resolve_expr(&recv.ty);
            for name in &recv.names {
                self.declare_local(name, DeclKind::Param);
            }
        }
        self.resolve_signature(&func.ty, true);
        if let Some(body) = &func.body {
            // The body shares the parameter block.
            for stmt in &body.stmts {
                self.resolve_stmt(stmt);
            }
        }
        self.locals.pop();
    }

    /// Resolve parameter and result types, then declare the names when
    /// `declare` is set (function declarations and literals).
    fn resolve_signature(&mut self, ty: &'a FuncType, declare: bool) {
        for field in ty.params.iter().chain(&ty.results) {
            self.resolve_expr(&field.ty);
        }
        if declare {
            for field in ty.params.iter().chain(&ty.results) {
                for name in &field.names {
                    self.declare_local(name, DeclKind::Param);
                }
            }
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn resolve_block(&mut self, block: &'a Block) {
        self.locals.push();
        for stmt in &block.stmts {
            self.resolve_stmt(stmt);
        }
        self.locals.pop();
    }

    fn resolve_stmt(&mut self, stmt: &'a Stmt) {
        match stmt {
            Stmt::Decl(decl) => self.resolve_local_decl(decl),
            Stmt::Labeled(s) => self.resolve_stmt(&s.stmt),
            Stmt::Expr(e) => self.resolve_expr(e),
            Stmt::Send(s) => {
                self.resolve_expr(&s.chan);
                self.resolve_expr(&s.value);
            }
            Stmt::IncDec(s) => self.resolve_expr(&s.expr),
            Stmt::Assign(s) => self.resolve_assign(s),
            Stmt::Go(s) | Stmt::Defer(s) => self.resolve_expr(&s.call),
            Stmt::Return(s) => {
                for e in &s.results {
                    self.resolve_expr(e);
                }
            }
            Stmt::Branch(_) | Stmt::Empty(_) => {}
            Stmt::Block(b) => self.resolve_block(b),
            Stmt::If(s) => {
                self.locals.push();
                if let Some(init) = &s.init {
                    self.resolve_stmt(init);
                }
                self.resolve_expr(&s.cond);
                self.resolve_block(&s.then);
                if let Some(els) = &s.els {
                    self.resolve_stmt(els);
                }
                self.locals.pop();
            }
            Stmt::Switch(s) => {
                self.locals.push();
                if let Some(init) = &s.init {
                    self.resolve_stmt(init);
                }
                if let Some(tag) = &s.tag {
                    self.resolve_expr(tag);
                }
                for clause in &s.clauses {
                    self.locals.push();
                    for e in clause.list.iter().flatten() {
                        self.resolve_expr(e);
                    }
                    for stmt in &clause.body {
                        self.resolve_stmt(stmt);
                    }
                    self.locals.pop();
                }
                self.locals.pop();
            }
            Stmt::TypeSwitch(s) => self.resolve_type_switch(s),
            Stmt::Select(s) => {
                for clause in &s.clauses {
                    self.locals.push();
                    if let Some(comm) = &clause.comm {
                        self.resolve_stmt(comm);
                    }
                    for stmt in &clause.body {
                        self.resolve_stmt(stmt);
                    }
                    self.locals.pop();
                }
            }
            Stmt::For(s) => {
                self.locals.push();
                if let Some(init) = &s.init {
                    self.resolve_stmt(init);
                }
                if let Some(cond) = &s.cond {
                    self.resolve_expr(cond);
                }
                if let Some(post) = &s.post {
                    self.resolve_stmt(post);
                }
                self.resolve_block(&s.body);
                self.locals.pop();
            }
            Stmt::Range(s) => {
                self.locals.push();
                self.resolve_expr(&s.expr);
                for e in s.key.iter().chain(&s.value) {
                    match e {
                        Expr::Ident(ident) if s.define => {
                            self.declare_local(ident, DeclKind::Var);
                        }
                        _ => self.resolve_expr(e),
                    }
                }
                self.resolve_block(&s.body);
                self.locals.pop();
            }
        }
    }

    fn resolve_local_decl(&mut self, decl: &'a Decl) {
        match decl {
            Decl::Type(decl) => {
                for spec in &decl.specs {
                    // A local type is in scope inside its own definition.
                    if let Some(id) = self.declare_local(&spec.name, DeclKind::Type) {
                        self.type_defs.insert(id, &spec.ty);
                    }
                    self.resolve_expr(&spec.ty);
                }
            }
            Decl::Var(decl) => self.resolve_local_values(decl, DeclKind::Var),
            Decl::Const(decl) => self.resolve_local_values(decl, DeclKind::Const),
            // Nested function declarations do not parse; nothing to do.
            Decl::Func(_) => {}
        }
    }

    /// Values are resolved before the names come into scope.
    fn resolve_local_values(&mut self, decl: &'a ValueDecl, kind: DeclKind) {
        for spec in &decl.specs {
            if let Some(ty) = &spec.ty {
                self.resolve_expr(ty);
            }
            for value in &spec.values {
                self.resolve_expr(value);
            }
            for name in &spec.names {
                self.declare_local(name, kind);
            }
        }
    }

    fn resolve_assign(&mut self, s: &'a AssignStmt) {
        for e in &s.rhs {
            self.resolve_expr(e);
        }
        if s.op != AssignOp::Define {
            for e in &s.lhs {
                self.resolve_expr(e);
            }
            return;
        }

        let mut any_new = false;
        for e in &s.lhs {
            match e {
                Expr::Ident(ident) if ident.is_blank() => {}
                Expr::Ident(ident) => match self.locals.lookup_current(&ident.name) {
                    Some(existing) => self.table.bind(ident.id, Binding::Decl(existing)),
                    None => {
                        any_new = true;
                        self.declare_local(ident, DeclKind::Var);
                    }
                },
                other => {
                    self.resolve_expr(other);
                    self.errors.push(CheckError::Other {
                        message: "non-name on left side of :=".to_string(),
                        span: other.span(),
                    });
                }
            }
        }
        if !any_new {
            self.errors.push(CheckError::NoNewVariables { span: s.span });
        }
    }

    fn resolve_type_switch(&mut self, s: &'a TypeSwitchStmt) {
        self.locals.push();
        if let Some(init) = &s.init {
            self.resolve_stmt(init);
        }
        self.resolve_expr(&s.expr);

        // One declaration shared by every clause, entered in each clause block.
        let binding = s.binding.as_ref().filter(|b| !b.is_blank()).map(|ident| {
            let id = self.table.add_decl(DeclInfo {
                name: ident.name.clone(),
                kind: DeclKind::Var,
                scope: DeclScope::Local,
                ident: Some(ident.id),
                file: self.current_file,
                span: ident.span,
            });
            (ident.name.as_str(), id)
        });

        for clause in &s.clauses {
            for e in clause.list.iter().flatten() {
                self.resolve_expr(e);
            }
            self.locals.push();
            if let Some((name, id)) = binding {
                self.locals.declare(name, id);
            }
            for stmt in &clause.body {
                self.resolve_stmt(stmt);
            }
            self.locals.pop();
        }
        self.locals.pop();
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn resolve_expr(&mut self, expr: &'a Expr) {
        match expr {
            Expr::Ident(ident) => self.use_ident(ident),
            Expr::BasicLit(_) => {}
            Expr::CompositeLit(lit) => self.resolve_composite(lit, None),
            Expr::FuncLit(lit) => {
                self.locals.push();
                self.resolve_signature(&lit.ty, true);
                for stmt in &lit.body.stmts {
                    self.resolve_stmt(stmt);
                }
                self.locals.pop();
            }
            Expr::Paren(e) => self.resolve_expr(&e.expr),
            Expr::Selector(e) => self.resolve_expr(&e.expr),
            Expr::Index(e) => {
                self.resolve_expr(&e.expr);
                self.resolve_expr(&e.index);
            }
            Expr::Slice(e) => {
                self.resolve_expr(&e.expr);
                for part in [&e.low, &e.high, &e.max].into_iter().flatten() {
                    self.resolve_expr(part);
                }
            }
            Expr::TypeAssert(e) => {
                self.resolve_expr(&e.expr);
                if let Some(ty) = &e.ty {
                    self.resolve_expr(ty);
                }
            }
            Expr::Call(e) => {
                self.resolve_expr(&e.func);
                for arg in &e.args {
                    self.resolve_expr(arg);
                }
            }
            Expr::Star(e) => self.resolve_expr(&e.expr),
            Expr::Unary(e) => self.resolve_expr(&e.expr),
            Expr::Binary(e) => {
                self.resolve_expr(&e.left);
                self.resolve_expr(&e.right);
            }
            Expr::KeyValue(e) => {
                self.resolve_expr(&e.key);
                self.resolve_expr(&e.value);
            }
            Expr::Ellipsis(e) => {
                if let Some(elt) = &e.elt {
                    self.resolve_expr(elt);
                }
            }
            Expr::ArrayType(e) => {
                if let Some(len) = &e.len {
                    self.resolve_expr(len);
                }
                self.resolve_expr(&e.elt);
            }
            Expr::StructType(e) => {
                for field in &e.fields {
                    self.resolve_expr(&field.ty);
                }
            }
            Expr::FuncType(e) => self.resolve_signature(e, false),
            Expr::InterfaceType(e) => {
                for method in &e.methods {
                    self.resolve_expr(&method.ty);
                }
            }
            Expr::MapType(e) => {
                self.resolve_expr(&e.key);
                self.resolve_expr(&e.value);
            }
            Expr::ChanType(e) => self.resolve_expr(&e.value),
        }
    }

    /// Resolve a composite literal whose type is `lit.ty`, or `outer` for an
    /// element literal with elided type.
    fn resolve_composite(&mut self, lit: &'a CompositeLit, outer: Option<&'a Expr>) {
        if let Some(ty) = &lit.ty {
            self.resolve_expr(ty);
        }
        let ty = lit.ty.as_ref().or(outer);
        let keyed_by_field = ty.is_some_and(|t| self.is_struct_type(t, 0));
        let elem = ty.and_then(|t| self.element_type(t, 0));
        let key_ty = ty.and_then(|t| self.key_type(t, 0));

        for elt in &lit.elts {
            match elt {
                Expr::KeyValue(kv) => {
                    match &kv.key {
                        Expr::Ident(_) if keyed_by_field => {}
                        // Unknown literal type: the key may be a field name.
                        Expr::Ident(ident) if ty.is_none() => self.try_use_ident(ident),
                        Expr::CompositeLit(inner) if inner.ty.is_none() => {
                            self.resolve_composite(inner, key_ty)
                        }
                        key => self.resolve_expr(key),
                    }
                    self.resolve_element(&kv.value, elem);
                }
                other => self.resolve_element(other, elem),
            }
        }
    }

    fn resolve_element(&mut self, value: &'a Expr, elem: Option<&'a Expr>) {
        match value {
            Expr::CompositeLit(inner) if inner.ty.is_none() => self.resolve_composite(inner, elem),
            Expr::Unary(u) if u.op == UnaryOp::Addr => match &u.expr {
                Expr::CompositeLit(inner) if inner.ty.is_none() => {
                    self.resolve_composite(inner, elem)
                }
                _ => self.resolve_expr(value),
            },
            _ => self.resolve_expr(value),
        }
    }

    // Syntactic type inspection; depth-limited against recursive definitions.

    fn type_def(&self, ty: &'a Expr) -> Option<&'a Expr> {
        let Expr::Ident(ident) = ty else { return None };
        match self.lookup(&ident.name) {
            Binding::Decl(id) => self.type_defs.get(&id).copied(),
            _ => None,
        }
    }

    fn is_struct_type(&self, ty: &'a Expr, depth: u32) -> bool {
        if depth > 16 {
            return false;
        }
        match ty.unparen() {
            Expr::StructType(_) => true,
            Expr::Star(star) => self.is_struct_type(&star.expr, depth + 1),
            other => self
                .type_def(other)
                .is_some_and(|def| self.is_struct_type(def, depth + 1)),
        }
    }

    fn element_type(&self, ty: &'a Expr, depth: u32) -> Option<&'a Expr> {
        if depth > 16 {
            return None;
        }
        match ty.unparen() {
            Expr::ArrayType(array) => Some(&array.elt),
            Expr::MapType(map) => Some(&map.value),
            other => self
                .type_def(other)
                .and_then(|def| self.element_type(def, depth + 1)),
        }
    }

    fn key_type(&self, ty: &'a Expr, depth: u32) -> Option<&'a Expr> {
        if depth > 16 {
            return None;
        }
        match ty.unparen() {
            Expr::MapType(map) => Some(&map.key),
            other => self
                .type_def(other)
                .and_then(|def| self.key_type(def, depth + 1)),
        }
    }
}
