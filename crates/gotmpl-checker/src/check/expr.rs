//! Expression checking.
//!
//! [`Checker::expr`] infers what an expression denotes; [`Checker::value`]
//! additionally requires a single value. Composite literals take an optional
//! type hint for elided element types.

use gotmpl_core::{CheckError, Span};
use gotmpl_parser::ast::*;
use gotmpl_parser::printer::print_expr;

use super::assign::Member;
use super::operand::{Mode, Operand};
use super::types::{BasicKind, FieldInfo, Signature, Type};
use super::universe::{self, Predeclared};
use super::Checker;
use crate::resolve::{Binding, DeclKind};

impl Checker<'_, '_> {
    /// Check an expression in any context.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub(super) fn expr(&mut self, expr: &Expr) -> Operand {
        match expr {
            Expr::Ident(ident) => self.ident(ident),
            Expr::BasicLit(lit) => Operand::constant(Type::Basic(match lit.kind {
                LitKind::Int => BasicKind::UntypedInt,
                LitKind::Float => BasicKind::UntypedFloat,
                LitKind::Imag => BasicKind::UntypedComplex,
                LitKind::Char => BasicKind::UntypedRune,
                LitKind::String => BasicKind::UntypedString,
            })),
            Expr::CompositeLit(lit) => self.composite(lit, None),
            Expr::FuncLit(lit) => {
                let sig = self.signature(&lit.ty);
                self.check_func_body(&lit.ty, &lit.body);
                Operand::value(Type::Func(Box::new(sig)))
            }
            Expr::Paren(paren) => self.expr(&paren.expr),
            Expr::Selector(sel) => self.selector(sel),
            Expr::Index(index) => self.index(index),
            Expr::Slice(slice) => self.slice(slice),
            Expr::TypeAssert(assert) => self.type_assert(assert),
            Expr::Call(call) => self.call(call),
            Expr::Star(star) => self.star(star),
            Expr::Unary(unary) => self.unary(unary),
            Expr::Binary(binary) => self.binary(binary),
            Expr::KeyValue(kv) => {
                self.other("unexpected key:value expression", kv.span);
                Operand::unknown()
            }
            Expr::Ellipsis(e) => {
                self.other("invalid use of ...", e.span);
                Operand::unknown()
            }
            Expr::ArrayType(_)
            | Expr::StructType(_)
            | Expr::FuncType(_)
            | Expr::InterfaceType(_)
            | Expr::MapType(_)
            | Expr::ChanType(_) => Operand::new(Mode::TypeExpr, self.resolve_type(expr)),
        }
    }

    /// Check an expression that must produce exactly one value.
    pub(super) fn value(&mut self, expr: &Expr) -> Operand {
        let op = self.expr(expr);
        self.single_value(expr, op)
    }

    fn single_value(&mut self, expr: &Expr, op: Operand) -> Operand {
        match op.mode {
            Mode::TypeExpr | Mode::Builtin(_) => {
                let what = self.describe(expr, &op);
                self.report(CheckError::NotAnExpression {
                    what,
                    span: expr.span(),
                });
                Operand::unknown()
            }
            Mode::NoValue => {
                self.other(format!("{} (no value) used as value", print_expr(expr)), expr.span());
                Operand::unknown()
            }
            _ if matches!(op.ty, Type::Tuple(_)) => {
                self.other(
                    format!("multiple-value {} in single-value context", print_expr(expr)),
                    expr.span(),
                );
                Operand::unknown()
            }
            _ => op,
        }
    }

    /// Check an expression list, spreading a single multi-value call.
    pub(super) fn expr_list(&mut self, exprs: &[Expr]) -> Vec<Operand> {
        if let [single] = exprs {
            let op = self.expr(single);
            if let Type::Tuple(types) = &op.ty
                && op.is_value()
            {
                return types.iter().cloned().map(Operand::value).collect();
            }
            return vec![self.single_value(single, op)];
        }
        exprs.iter().map(|e| self.value(e)).collect()
    }

    /// Values of a single expression assigned to `count` targets; covers
    /// multi-value calls and the comma-ok forms.
    pub(super) fn multi_value(&mut self, expr: &Expr, count: usize) -> Option<Vec<Operand>> {
        let op = self.expr(expr);
        if !op.is_value() {
            self.single_value(expr, op);
            return Some(vec![Operand::unknown(); count]);
        }
        match &op.ty {
            Type::Tuple(types) if types.len() == count => {
                Some(types.iter().cloned().map(Operand::value).collect())
            }
            Type::Tuple(_) => None,
            Type::Unknown => Some(vec![Operand::unknown(); count]),
            _ if count == 2 && matches!(op.mode, Mode::MapIndex | Mode::CommaOk) => {
                Some(vec![Operand::value(op.ty.clone()), Operand::value(Type::untyped_bool())])
            }
            _ => None,
        }
    }

    // ========================================================================
    // Names
    // ========================================================================

    fn ident(&mut self, ident: &Ident) -> Operand {
        if ident.is_blank() {
            self.other("cannot use _ as value", ident.span);
            return Operand::unknown();
        }
        match self.table.binding(ident.id) {
            Some(Binding::Decl(id)) => match self.table.decl(id).kind {
                DeclKind::Type => Operand::new(Mode::TypeExpr, self.decl_type(id)),
                DeclKind::Import => {
                    self.report(CheckError::NotAnExpression {
                        what: format!("use of package {} without selector", ident.name),
                        span: ident.span,
                    });
                    Operand::unknown()
                }
                DeclKind::Const => Operand::constant(self.decl_type(id)),
                DeclKind::Var | DeclKind::Param => Operand::variable(self.decl_type(id)),
                DeclKind::Func => Operand::value(self.decl_type(id)),
                DeclKind::Method => Operand::unknown(),
            },
            Some(Binding::Universe) => match universe::lookup(&ident.name) {
                Some(Predeclared::Type(ty)) => {
                    Operand::new(Mode::TypeExpr, self.universe_type(&ident.name, ty))
                }
                Some(Predeclared::Const(kind)) => {
                    if ident.name == "iota" && self.iota.is_none() {
                        self.other("cannot use iota outside constant declaration", ident.span);
                    }
                    Operand::constant(Type::Basic(kind))
                }
                Some(Predeclared::Nil) => Operand::value(Type::Basic(BasicKind::UntypedNil)),
                Some(Predeclared::Builtin(builtin)) => Operand::new(Mode::Builtin(builtin), Type::Unknown),
                None => match self.externals.get(&ident.name) {
                    Some(ty) => Operand::new(Mode::TypeExpr, ty.clone()),
                    None => Operand::unknown(),
                },
            },
            Some(Binding::Unresolved) | None => Operand::unknown(),
        }
    }

    fn selector(&mut self, sel: &SelectorExpr) -> Operand {
        if let Some(path) = self.import_path_of(&sel.expr) {
            let ty = self
                .importer
                .import_value(&mut self.store, path, &sel.sel.name);
            return Operand::variable(ty);
        }

        let x = self.expr(&sel.expr);
        let name = &sel.sel.name;
        match x.mode {
            // Method expression `T.Method`.
            Mode::TypeExpr => match self.lookup_member(&x.ty, name) {
                Member::Method(sig) => {
                    let mut params = vec![x.ty.clone()];
                    params.extend(sig.params);
                    Operand::value(Type::Func(Box::new(Signature { params, ..sig })))
                }
                Member::Unknown => Operand::unknown(),
                Member::Field(_) | Member::Missing => self.unknown_member(&x.ty, sel),
            },
            _ => {
                let x = self.single_value(&sel.expr, x);
                match self.lookup_member(&x.ty, name) {
                    Member::Field(ty) => {
                        let through_pointer = matches!(self.store.underlying(&x.ty), Type::Pointer(_));
                        if x.mode == Mode::Variable || through_pointer {
                            Operand::variable(ty)
                        } else {
                            Operand::value(ty)
                        }
                    }
                    Member::Method(sig) => Operand::value(Type::Func(Box::new(sig))),
                    Member::Unknown => Operand::variable(Type::Unknown),
                    Member::Missing => self.unknown_member(&x.ty, sel),
                }
            }
        }
    }

    fn unknown_member(&mut self, ty: &Type, sel: &SelectorExpr) -> Operand {
        let ty = self.store.display(ty);
        self.report(CheckError::UnknownField {
            ty,
            name: sel.sel.name.clone(),
            span: sel.sel.span,
        });
        Operand::unknown()
    }

    // ========================================================================
    // Composite literals
    // ========================================================================

    /// Check a composite literal; `hint` is the type of an elided literal.
    pub(super) fn composite(&mut self, lit: &CompositeLit, hint: Option<&Type>) -> Operand {
        let ty = match &lit.ty {
            Some(Expr::ArrayType(array)) if matches!(array.len, Some(Expr::Ellipsis(_))) => {
                let elem = self.resolve_type(&array.elt);
                let len = self.array_literal_len(&lit.elts);
                Type::Array(len, Box::new(elem))
            }
            Some(ty) => self.resolve_type(ty),
            None => match hint {
                Some(ty) => ty.clone(),
                None => {
                    self.other("invalid composite literal type: missing type", lit.span);
                    Type::Unknown
                }
            },
        };

        match self.store.underlying(&ty).clone() {
            Type::Struct(fields) => self.struct_literal(lit, &ty, &fields),
            Type::Array(_, elem) | Type::Slice(elem) => {
                for elt in &lit.elts {
                    match elt {
                        Expr::KeyValue(kv) => {
                            self.index_value(&kv.key);
                            self.element(&kv.value, &elem, "array or slice literal");
                        }
                        other => self.element(other, &elem, "array or slice literal"),
                    }
                }
            }
            Type::Map(key, value) => {
                for elt in &lit.elts {
                    match elt {
                        Expr::KeyValue(kv) => {
                            self.element(&kv.key, &key, "map literal");
                            self.element(&kv.value, &value, "map literal");
                        }
                        other => {
                            self.other("missing key in map literal", other.span());
                            self.value(other);
                        }
                    }
                }
            }
            Type::Unknown => {
                for elt in &lit.elts {
                    match elt {
                        // The key may be a field name of the opaque type.
                        Expr::KeyValue(kv) => {
                            if kv.key.as_ident().is_none() {
                                self.loose_element(&kv.key);
                            }
                            self.loose_element(&kv.value);
                        }
                        other => self.loose_element(other),
                    }
                }
            }
            _ => {
                let what = self.store.display(&ty);
                self.other(format!("invalid composite literal type {what}"), lit.span);
            }
        }
        Operand::value(ty)
    }

    fn struct_literal(&mut self, lit: &CompositeLit, ty: &Type, fields: &[FieldInfo]) {
        let keyed = lit.elts.iter().filter(|e| matches!(e, Expr::KeyValue(_))).count();
        if keyed > 0 && keyed != lit.elts.len() {
            self.other("mixture of field:value and value elements in struct literal", lit.span);
            return;
        }

        if keyed > 0 {
            let mut seen: Vec<&str> = Vec::new();
            for elt in &lit.elts {
                let Expr::KeyValue(kv) = elt else { continue };
                let Some(key) = kv.key.as_ident() else {
                    self.other(format!("invalid field name {} in struct literal", print_expr(&kv.key)), kv.key.span());
                    continue;
                };
                if seen.contains(&key.name.as_str()) {
                    self.other(format!("duplicate field name {} in struct literal", key.name), key.span);
                }
                seen.push(&key.name);
                match fields.iter().find(|f| f.name == key.name) {
                    Some(field) => {
                        let context = "struct literal";
                        let field_ty = field.ty.clone();
                        self.element(&kv.value, &field_ty, context);
                    }
                    None => {
                        let ty = self.store.display(ty);
                        self.report(CheckError::UnknownField {
                            ty,
                            name: key.name.clone(),
                            span: key.span,
                        });
                        self.loose_element(&kv.value);
                    }
                }
            }
            return;
        }

        if !lit.elts.is_empty() && lit.elts.len() != fields.len() {
            let which = if lit.elts.len() < fields.len() { "few" } else { "many" };
            self.other(format!("too {which} values in struct literal"), lit.span);
        }
        for (elt, field) in lit.elts.iter().zip(fields) {
            let field_ty = field.ty.clone();
            self.element(elt, &field_ty, "struct literal");
        }
    }

    /// Check a literal element against the element type, resolving elided
    /// element literals (`{...}` and `&{...}`).
    fn element(&mut self, expr: &Expr, elem: &Type, context: &str) {
        let op = match expr {
            Expr::CompositeLit(inner) if inner.ty.is_none() => match elem {
                Type::Pointer(base) => {
                    let op = self.composite(inner, Some(base.as_ref()));
                    Operand::value(Type::pointer(op.ty))
                }
                _ => self.composite(inner, Some(elem)),
            },
            Expr::Unary(unary) if unary.op == UnaryOp::Addr => match (&unary.expr, elem) {
                (Expr::CompositeLit(inner), Type::Pointer(base)) if inner.ty.is_none() => {
                    let op = self.composite(inner, Some(base.as_ref()));
                    Operand::value(Type::pointer(op.ty))
                }
                _ => self.value(expr),
            },
            _ => self.value(expr),
        };
        self.check_assignable(&op, elem, context, expr.span());
    }

    /// Check an element of a literal of unknown type.
    fn loose_element(&mut self, expr: &Expr) {
        match expr {
            Expr::CompositeLit(inner) if inner.ty.is_none() => {
                self.composite(inner, Some(&Type::Unknown));
            }
            _ => {
                self.value(expr);
            }
        }
    }

    /// Length of `[...]T{...}`: one past the largest index.
    fn array_literal_len(&self, elts: &[Expr]) -> Option<u64> {
        let mut next: i64 = 0;
        let mut max: i64 = 0;
        for elt in elts {
            if let Expr::KeyValue(kv) = elt {
                next = self.const_int(&kv.key, None, 0)?;
            }
            next += 1;
            max = max.max(next);
        }
        u64::try_from(max).ok()
    }

    // ========================================================================
    // Index, slice, assertion, dereference
    // ========================================================================

    /// Check an index operand: it must be an integer.
    pub(super) fn index_value(&mut self, expr: &Expr) {
        let op = self.value(expr);
        let ok = match self.store.underlying(&op.ty) {
            Type::Unknown => true,
            Type::Basic(kind) => {
                kind.is_integer() || (op.mode == Mode::Constant && kind.is_untyped() && kind.is_numeric())
            }
            _ => false,
        };
        if !ok {
            let what = self.describe(expr, &op);
            self.report(CheckError::InvalidOperation {
                message: format!("index {what} must be integer"),
                span: expr.span(),
            });
        }
    }

    fn index(&mut self, index: &IndexExpr) -> Operand {
        let x = self.value(&index.expr);
        let under = self.store.underlying(&x.ty).clone();
        if let Type::Pointer(base) = &under
            && let Type::Array(_, elem) = self.store.underlying(base)
        {
            let elem = elem.as_ref().clone();
            self.index_value(&index.index);
            return Operand::variable(elem);
        }
        match under {
            Type::Basic(kind) if kind.is_string() => {
                self.index_value(&index.index);
                Operand::value(Type::Basic(BasicKind::Uint8))
            }
            Type::Array(_, elem) => {
                self.index_value(&index.index);
                let mode = if x.mode == Mode::Variable { Mode::Variable } else { Mode::Value };
                Operand::new(mode, *elem)
            }
            Type::Slice(elem) => {
                self.index_value(&index.index);
                Operand::variable(*elem)
            }
            Type::Map(key, value) => {
                let k = self.value(&index.index);
                self.check_assignable(&k, &key, "map index", index.index.span());
                Operand::new(Mode::MapIndex, *value)
            }
            Type::Unknown => {
                self.value(&index.index);
                Operand::variable(Type::Unknown)
            }
            _ => {
                let what = self.describe(&index.expr, &x);
                self.report(CheckError::InvalidOperation {
                    message: format!("cannot index {what}"),
                    span: index.span,
                });
                self.value(&index.index);
                Operand::unknown()
            }
        }
    }

    fn slice(&mut self, slice: &SliceExpr) -> Operand {
        let x = self.value(&slice.expr);
        for part in [&slice.low, &slice.high, &slice.max].into_iter().flatten() {
            self.index_value(part);
        }
        let under = self.store.underlying(&x.ty).clone();
        match under {
            Type::Basic(kind) if kind.is_string() => {
                if slice.slice3 {
                    self.report(CheckError::InvalidOperation {
                        message: "3-index slice of string".to_string(),
                        span: slice.span,
                    });
                }
                let ty = if kind.is_untyped() { Type::string() } else { x.ty };
                Operand::value(ty)
            }
            Type::Array(_, elem) => Operand::value(Type::Slice(elem)),
            Type::Slice(_) => Operand::value(x.ty),
            Type::Pointer(base) => match self.store.underlying(&base) {
                Type::Array(_, elem) => Operand::value(Type::Slice(elem.clone())),
                _ => self.cannot_slice(slice, &x),
            },
            Type::Unknown => Operand::unknown(),
            _ => self.cannot_slice(slice, &x),
        }
    }

    fn cannot_slice(&mut self, slice: &SliceExpr, x: &Operand) -> Operand {
        let what = self.describe(&slice.expr, x);
        self.report(CheckError::InvalidOperation {
            message: format!("cannot slice {what}"),
            span: slice.span,
        });
        Operand::unknown()
    }

    fn type_assert(&mut self, assert: &TypeAssertExpr) -> Operand {
        let x = self.value(&assert.expr);
        let Some(target) = &assert.ty else {
            self.other("use of .(type) outside type switch", assert.span);
            return Operand::unknown();
        };
        let target = self.resolve_type(target);
        match self.store.underlying(&x.ty).clone() {
            Type::Interface(iface) => {
                let concrete = !matches!(self.store.underlying(&target), Type::Interface(_));
                if concrete && !self.implements(&target, &iface) {
                    let t = self.store.display(&target);
                    let i = self.store.display(&x.ty);
                    self.other(format!("impossible type assertion: {t} does not implement {i}"), assert.span);
                }
            }
            Type::Unknown => {}
            _ => {
                let what = self.describe(&assert.expr, &x);
                self.report(CheckError::InvalidOperation {
                    message: format!("{what} is not an interface"),
                    span: assert.expr.span(),
                });
            }
        }
        Operand::new(Mode::CommaOk, target)
    }

    fn star(&mut self, star: &StarExpr) -> Operand {
        let x = self.expr(&star.expr);
        if x.mode == Mode::TypeExpr {
            return Operand::new(Mode::TypeExpr, Type::pointer(x.ty));
        }
        let x = self.single_value(&star.expr, x);
        match self.store.underlying(&x.ty) {
            Type::Pointer(base) => Operand::variable(base.as_ref().clone()),
            Type::Unknown => Operand::variable(Type::Unknown),
            _ => {
                let what = self.describe(&star.expr, &x);
                self.report(CheckError::InvalidOperation {
                    message: format!("cannot indirect {what}"),
                    span: star.span,
                });
                Operand::unknown()
            }
        }
    }

    // ========================================================================
    // Calls
    // ========================================================================

    fn call(&mut self, call: &CallExpr) -> Operand {
        let callee = self.expr(&call.func);
        match callee.mode {
            Mode::TypeExpr => self.conversion(call, callee.ty),
            Mode::Builtin(builtin) => self.builtin(builtin, call),
            _ => {
                let callee = self.single_value(&call.func, callee);
                match self.store.underlying(&callee.ty).clone() {
                    Type::Func(sig) => {
                        self.arguments(call, &sig);
                        match sig.result_type() {
                            Some(ty) => Operand::value(ty),
                            None => Operand::new(Mode::NoValue, Type::Unknown),
                        }
                    }
                    Type::Unknown => {
                        self.expr_list(&call.args);
                        Operand::unknown()
                    }
                    _ => {
                        let what = self.describe(&call.func, &callee);
                        self.report(CheckError::NotCallable {
                            what,
                            span: call.span,
                        });
                        self.expr_list(&call.args);
                        Operand::unknown()
                    }
                }
            }
        }
    }

    fn conversion(&mut self, call: &CallExpr, target: Type) -> Operand {
        let [arg] = call.args.as_slice() else {
            let which = if call.args.is_empty() { "missing argument" } else { "too many arguments" };
            let to = self.store.display(&target);
            self.other(format!("{which} in conversion to {to}"), call.span);
            self.expr_list(&call.args);
            return Operand::value(target);
        };
        if call.has_ellipsis {
            self.other("invalid use of ... in conversion", call.span);
        }
        let op = self.value(arg);
        if !self.convertible(&op.ty, &target) {
            let from = self.store.display(&op.ty);
            let to = self.store.display(&target);
            self.report(CheckError::InvalidConversion {
                from,
                to,
                span: call.span,
            });
        }
        let constant = op.mode == Mode::Constant && matches!(self.store.underlying(&target), Type::Basic(_));
        Operand::new(if constant { Mode::Constant } else { Mode::Value }, target)
    }

    /// Check call arguments against a signature.
    fn arguments(&mut self, call: &CallExpr, sig: &Signature) {
        let args = self.expr_list(&call.args);
        let callee = print_expr(&call.func);
        let context = format!("argument to {callee}");
        let params = &sig.params;

        if call.has_ellipsis {
            if !sig.variadic {
                self.other(format!("have (...) arguments but {callee} is not variadic"), call.span);
                return;
            }
            if args.len() != params.len() {
                self.arg_count(callee, params.len(), args.len(), call.span);
                return;
            }
            for (i, (arg, param)) in args.iter().zip(params).enumerate() {
                let span = call.args.get(i).map_or(call.span, Expr::span);
                self.check_assignable(arg, param, &context, span);
            }
            return;
        }

        let fixed = if sig.variadic { params.len() - 1 } else { params.len() };
        if args.len() < fixed || (!sig.variadic && args.len() > fixed) {
            self.arg_count(callee, params.len(), args.len(), call.span);
            return;
        }
        let variadic_elem = match params.last() {
            Some(Type::Slice(elem)) if sig.variadic => Some(elem.as_ref().clone()),
            _ => None,
        };
        for (i, arg) in args.iter().enumerate() {
            let span = call.args.get(i).map_or(call.span, Expr::span);
            let param = if i < fixed {
                params[i].clone()
            } else {
                variadic_elem.clone().unwrap_or(Type::Unknown)
            };
            self.check_assignable(arg, &param, &context, span);
        }
    }

    pub(super) fn arg_count(&mut self, callee: String, expected: usize, got: usize, span: Span) {
        self.report(CheckError::ArgumentCount {
            callee,
            expected,
            got,
            span,
        });
    }
}
