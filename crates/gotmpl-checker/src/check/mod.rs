//! Type checking of a resolved package.
//!
//! The checker runs after name resolution and works in two passes:
//!
//! 1. **Registration**: declared types get their [`NamedId`] up front, then
//!    their underlying types, method sets and function signatures are
//!    resolved. Package-level variables and constants are typed lazily, on
//!    first use, so their declaration order does not matter.
//! 2. **Checking**: initializers and function bodies are checked statement
//!    by statement.
//!
//! Expressions are checked into an [`Operand`](operand::Operand) recording
//! what the expression denotes (value, variable, type, builtin) and its
//! type. Errors are collected rather than returned early; an erroneous
//! operand has [`Type::Unknown`] so that one mistake is reported once.
//!
//! The checker is permissive where it cannot be sure: opaque imported types
//! and anything derived from them pass every check.

mod assign;
mod builtins;
mod expr;
mod importer;
mod operand;
mod operators;
mod stmt;
mod type_expr;
mod types;
pub mod universe;

#[cfg(test)]
mod tests;

pub use importer::{Importer, OpaqueImporter, PackageSource, SourceImporter};
pub use types::{
    BasicKind, DeclaredMethod, FieldInfo, InterfaceInfo, MethodInfo, NamedId, NamedType, Signature,
    Type, TypeStore,
};

use gotmpl_core::{CheckError, CheckErrors, FileId, Span};
use gotmpl_parser::ast::*;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::resolve::{DeclId, DeclKind, ResolutionTable, resolve_package};

/// Resolve and type-check a batch of files forming one package.
///
/// `externals` are names visible in every file as types; `importer` decides
/// what they and imported names denote. All diagnostics are returned
/// together, sorted by position.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn check_package(
    files: &[&File],
    externals: &[String],
    importer: &mut dyn Importer,
) -> Result<(), CheckErrors> {
    let resolved = resolve_package(files, externals);
    let mut errors = resolved.errors;

    if let Some((first, rest)) = files.split_first() {
        for file in rest {
            if file.package.name != first.package.name {
                errors.push(CheckError::PackageMismatch {
                    found: file.package.name.clone(),
                    expected: first.package.name.clone(),
                    span: file.package.span,
                });
            }
        }
    }

    let mut checker = Checker::new(&resolved.table, externals, importer);
    checker.register(files);
    checker.check_files(files);
    for error in checker.errors {
        errors.push(error);
    }

    tracing::debug!(files = files.len(), errors = errors.len(), "checked package");
    if errors.is_empty() {
        Ok(())
    } else {
        errors.sort();
        Err(errors)
    }
}

/// A package-level `var` or `const` spec, typed on first use.
#[derive(Clone, Copy)]
struct ValueSpecRef<'a> {
    names: &'a [Ident],
    ty: Option<&'a Expr>,
    values: &'a [Expr],
    constant: bool,
    iota: Option<i64>,
}

/// The function whose body is being checked.
#[derive(Debug, Clone)]
struct FuncContext {
    results: Vec<Type>,
    named_results: bool,
}

pub(crate) struct Checker<'a, 'i> {
    table: &'a ResolutionTable,
    importer: &'i mut dyn Importer,
    store: TypeStore,
    errors: Vec<CheckError>,

    error_type: Type,
    externals: FxHashMap<String, Type>,
    /// Import declaration → import path.
    imports: FxHashMap<DeclId, &'a str>,

    /// Types of declarations checked so far. For type declarations this is
    /// the denoted type.
    types: FxHashMap<DeclId, Type>,
    /// Definitions of declared types not yet resolved.
    pending_named: FxHashMap<NamedId, &'a Expr>,
    aliases: FxHashMap<DeclId, &'a Expr>,
    funcs: FxHashMap<DeclId, &'a FuncType>,
    values: FxHashMap<DeclId, ValueSpecRef<'a>>,
    in_progress: FxHashSet<DeclId>,

    funcs_stack: Vec<FuncContext>,
    iota: Option<i64>,
}

impl<'a, 'i> Checker<'a, 'i> {
    fn new(table: &'a ResolutionTable, externals: &[String], importer: &'i mut dyn Importer) -> Self {
        let mut store = TypeStore::new();

        let error = store.add_named("error");
        store.get_mut(error).underlying = Some(universe::error_type());

        let mut external_types = FxHashMap::default();
        for name in externals {
            external_types.insert(name.clone(), importer.import_external(&mut store, name));
        }

        Self {
            table,
            importer,
            store,
            errors: Vec::new(),
            error_type: Type::Named(error),
            externals: external_types,
            imports: FxHashMap::default(),
            types: FxHashMap::default(),
            pending_named: FxHashMap::default(),
            aliases: FxHashMap::default(),
            funcs: FxHashMap::default(),
            values: FxHashMap::default(),
            in_progress: FxHashSet::default(),
            funcs_stack: Vec::new(),
            iota: None,
        }
    }

    /// Record a diagnostic once.
    ///
    /// Lazily typed declarations may be checked from several places; the
    /// same error must not be reported twice.
    fn report(&mut self, error: CheckError) {
        if !self.errors.contains(&error) {
            self.errors.push(error);
        }
    }

    fn other(&mut self, message: impl Into<String>, span: Span) {
        self.report(CheckError::Other {
            message: message.into(),
            span,
        });
    }

    fn decl_of(&self, ident: &Ident) -> Option<DeclId> {
        self.table.decl_of(ident.id)
    }

    /// Record the type of the entity declared by `ident`.
    fn declare(&mut self, ident: &Ident, ty: Type) {
        if ident.is_blank() {
            return;
        }
        if let Some(id) = self.decl_of(ident) {
            self.types.insert(id, ty);
        }
    }

    // ========================================================================
    // Pass 1: registration
    // ========================================================================

    fn register(&mut self, files: &[&'a File]) {
        // Imports added by a rewrite share a synthetic span; the local name
        // tells them apart.
        let mut paths: FxHashMap<(FileId, Span, &str), &'a str> = FxHashMap::default();
        for file in files {
            for spec in file.import_specs() {
                paths.insert((file.id, spec.span, spec.local_name()), spec.path.as_str());
            }
        }
        for (id, info) in self.table.decls() {
            if info.kind == DeclKind::Import
                && let Some(path) = paths.get(&(info.file, info.span, info.name.as_str()))
            {
                self.imports.insert(id, *path);
            }
        }

        let mut named = Vec::new();
        let mut methods = Vec::new();
        for file in files {
            for decl in &file.decls {
                match decl {
                    Decl::Func(func) if func.is_method() => methods.push(func),
                    Decl::Func(func) => {
                        if let Some(id) = self.decl_of(&func.name) {
                            self.funcs.insert(id, &func.ty);
                        }
                    }
                    Decl::Type(decl) => {
                        for spec in &decl.specs {
                            let Some(id) = self.decl_of(&spec.name) else { continue };
                            if spec.assign {
                                self.aliases.insert(id, &spec.ty);
                            } else {
                                let nid = self.store.add_named(spec.name.name.clone());
                                self.types.insert(id, Type::Named(nid));
                                self.pending_named.insert(nid, &spec.ty);
                                named.push(nid);
                            }
                        }
                    }
                    Decl::Var(decl) => self.register_values(decl, false),
                    Decl::Const(decl) => self.register_values(decl, true),
                }
            }
        }

        for nid in named {
            self.ensure_named(nid);
        }
        let aliases: Vec<DeclId> = self.aliases.keys().copied().collect();
        for id in aliases {
            self.decl_type(id);
        }
        for func in methods {
            self.register_method(func);
        }
        let funcs: Vec<DeclId> = self.funcs.keys().copied().collect();
        for id in funcs {
            self.decl_type(id);
        }
    }

    fn register_values(&mut self, decl: &'a ValueDecl, constant: bool) {
        let mut previous: Option<(Option<&'a Expr>, &'a [Expr])> = None;
        for (index, spec) in decl.specs.iter().enumerate() {
            // A constant spec without values repeats the previous one.
            let (ty, values) = match previous {
                Some(inherited) if constant && spec.values.is_empty() && spec.ty.is_none() => inherited,
                _ => (spec.ty.as_ref(), spec.values.as_slice()),
            };
            if constant {
                previous = Some((ty, values));
            }
            let entry = ValueSpecRef {
                names: &spec.names,
                ty,
                values,
                constant,
                iota: constant.then_some(index as i64),
            };
            for name in &spec.names {
                if let Some(id) = self.decl_of(name) {
                    self.values.insert(id, entry);
                }
            }
        }
    }

    fn register_method(&mut self, func: &'a FuncDecl) {
        let Some(recv) = &func.recv else { return };
        let (base, pointer_recv) = match recv.ty.unparen() {
            Expr::Star(star) => (star.expr.unparen(), true),
            other => (other, false),
        };
        let sig = self.signature(&func.ty);
        let Expr::Ident(base) = base else {
            self.other("invalid receiver type", recv.ty.span());
            return;
        };
        let Some(id) = self.decl_of(base) else { return };
        match self.decl_type(id) {
            Type::Named(nid) if !self.store.get(nid).external => {
                let named = self.store.get(nid);
                if named.methods.iter().any(|m| m.name == func.name.name) {
                    let name = format!("{}.{}", named.name, func.name.name);
                    self.other(format!("method {name} already declared"), func.name.span);
                    return;
                }
                self.store.get_mut(nid).methods.push(DeclaredMethod {
                    name: func.name.name.clone(),
                    sig,
                    pointer_recv,
                });
            }
            Type::Unknown => {}
            other => {
                let what = self.store.display(&other);
                self.other(format!("invalid receiver type {what}"), recv.ty.span());
            }
        }
    }

    /// Resolve the definition of a declared type if it is still pending.
    fn ensure_named(&mut self, nid: NamedId) {
        if let Some(def) = self.pending_named.remove(&nid) {
            self.define_named(nid, def);
        }
    }

    fn define_named(&mut self, nid: NamedId, def: &Expr) {
        let ty = self.resolve_type(def);
        if let Type::Named(inner) = ty {
            self.ensure_named(inner);
        }
        let underlying = self.store.underlying(&ty).clone();
        self.store.get_mut(nid).underlying = Some(underlying);
    }

    /// Type of a declaration, computing it on first use.
    fn decl_type(&mut self, id: DeclId) -> Type {
        if let Some(ty) = self.types.get(&id) {
            return ty.clone();
        }
        if !self.in_progress.insert(id) {
            // Initialization or alias cycle.
            return Type::Unknown;
        }
        if let Some(def) = self.aliases.get(&id).copied() {
            let ty = self.resolve_type(def);
            self.types.insert(id, ty);
        } else if let Some(func) = self.funcs.get(&id).copied() {
            let sig = self.signature(func);
            self.types.insert(id, Type::Func(Box::new(sig)));
        } else if let Some(spec) = self.values.get(&id).copied() {
            self.check_value_spec(spec.names, spec.ty, spec.values, spec.constant, spec.iota);
        }
        self.in_progress.remove(&id);
        self.types.get(&id).cloned().unwrap_or(Type::Unknown)
    }

    // ========================================================================
    // Pass 2: checking
    // ========================================================================

    fn check_files(&mut self, files: &[&'a File]) {
        for file in files {
            for decl in &file.decls {
                match decl {
                    Decl::Func(func) => self.check_func_decl(func),
                    // Type definitions were checked during registration.
                    Decl::Type(_) => {}
                    Decl::Var(decl) => self.check_package_values(decl, false),
                    Decl::Const(decl) => self.check_package_values(decl, true),
                }
            }
        }
    }

    fn check_package_values(&mut self, decl: &'a ValueDecl, constant: bool) {
        let mut previous: Option<(Option<&'a Expr>, &'a [Expr])> = None;
        for (index, spec) in decl.specs.iter().enumerate() {
            let (ty, values) = match previous {
                Some(inherited) if constant && spec.values.is_empty() && spec.ty.is_none() => inherited,
                _ => (spec.ty.as_ref(), spec.values.as_slice()),
            };
            if constant {
                previous = Some((ty, values));
            }
            let checked = spec
                .names
                .iter()
                .filter_map(|name| self.decl_of(name))
                .next()
                .is_some_and(|id| self.types.contains_key(&id));
            if !checked {
                let iota = constant.then_some(index as i64);
                self.check_value_spec(&spec.names, ty, values, constant, iota);
            }
        }
    }

    fn check_func_decl(&mut self, func: &FuncDecl) {
        let Some(body) = &func.body else { return };
        if let Some(recv) = &func.recv {
            let ty = self.resolve_type(&recv.ty);
            for name in &recv.names {
                self.declare(name, ty.clone());
            }
        }
        self.check_func_body(&func.ty, body);
    }

    /// Declare parameters and check a function body.
    fn check_func_body(&mut self, ty: &FuncType, body: &Block) {
        let mut results = Vec::new();
        let mut named_results = false;
        for (is_result, field) in ty
            .params
            .iter()
            .map(|f| (false, f))
            .chain(ty.results.iter().map(|f| (true, f)))
        {
            let field_ty = match &field.ty {
                Expr::Ellipsis(e) => {
                    let elem = e.elt.as_ref().map_or(Type::Unknown, |t| self.resolve_type(t));
                    Type::slice(elem)
                }
                other => self.resolve_type(other),
            };
            for name in &field.names {
                self.declare(name, field_ty.clone());
            }
            if is_result {
                named_results |= !field.names.is_empty();
                for _ in 0..field.arity() {
                    results.push(field_ty.clone());
                }
            }
        }

        self.funcs_stack.push(FuncContext {
            results,
            named_results,
        });
        self.stmts(&body.stmts);
        self.funcs_stack.pop();
    }
}
