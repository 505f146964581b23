//! Statement checking.

use gotmpl_core::{CheckError, Span};
use gotmpl_parser::ast::*;
use gotmpl_parser::printer::print_expr;

use super::Checker;
use super::operand::{Mode, Operand};
use super::types::{BasicKind, Type};
use super::universe::{self, Builtin, Predeclared};
use crate::resolve::Binding;

impl Checker<'_, '_> {
    pub(super) fn stmts(&mut self, stmts: &[Stmt]) {
        for stmt in stmts {
            self.stmt(stmt);
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(decl) => self.local_decl(decl),
            Stmt::Labeled(labeled) => self.stmt(&labeled.stmt),
            Stmt::Expr(expr) => self.expr_stmt(expr),
            Stmt::Send(send) => self.send(send),
            Stmt::IncDec(s) => {
                let x = self.expr(&s.expr);
                self.check_target(&s.expr, &x);
                let numeric = self.store.is_opaque(&x.ty)
                    || self.store.basic_kind(&x.ty).is_some_and(BasicKind::is_numeric);
                if !numeric {
                    let op = if s.inc { "++" } else { "--" };
                    let what = self.describe(&s.expr, &x);
                    self.report(CheckError::InvalidOperation {
                        message: format!("{what}{op} (non-numeric type)"),
                        span: s.span,
                    });
                }
            }
            Stmt::Assign(assign) => self.assign(assign),
            Stmt::Go(s) | Stmt::Defer(s) => {
                let keyword = if matches!(stmt, Stmt::Go(_)) { "go" } else { "defer" };
                match s.call.unparen() {
                    Expr::Call(_) => {
                        self.expr(&s.call);
                    }
                    other => {
                        self.other(format!("expression in {keyword} must be function call"), other.span());
                        self.expr(other);
                    }
                }
            }
            Stmt::Return(ret) => self.return_stmt(ret),
            Stmt::Branch(_) | Stmt::Empty(_) => {}
            Stmt::Block(block) => self.stmts(&block.stmts),
            Stmt::If(s) => {
                if let Some(init) = &s.init {
                    self.stmt(init);
                }
                self.condition(&s.cond, "if");
                self.stmts(&s.then.stmts);
                if let Some(els) = &s.els {
                    self.stmt(els);
                }
            }
            Stmt::Switch(s) => self.switch(s),
            Stmt::TypeSwitch(s) => self.type_switch(s),
            Stmt::Select(s) => {
                for clause in &s.clauses {
                    if let Some(comm) = &clause.comm {
                        self.stmt(comm);
                    }
                    self.stmts(&clause.body);
                }
            }
            Stmt::For(s) => {
                if let Some(init) = &s.init {
                    self.stmt(init);
                }
                if let Some(cond) = &s.cond {
                    self.condition(cond, "for");
                }
                if let Some(post) = &s.post {
                    self.stmt(post);
                }
                self.stmts(&s.body.stmts);
            }
            Stmt::Range(s) => self.range(s),
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn local_decl(&mut self, decl: &Decl) {
        match decl {
            Decl::Var(decl) => {
                for spec in &decl.specs {
                    self.check_value_spec(&spec.names, spec.ty.as_ref(), &spec.values, false, None);
                }
            }
            Decl::Const(decl) => {
                let mut previous: Option<(Option<&Expr>, &[Expr])> = None;
                for (index, spec) in decl.specs.iter().enumerate() {
                    let (ty, values) = match previous {
                        Some(inherited) if spec.values.is_empty() && spec.ty.is_none() => inherited,
                        _ => (spec.ty.as_ref(), spec.values.as_slice()),
                    };
                    previous = Some((ty, values));
                    self.check_value_spec(&spec.names, ty, values, true, Some(index as i64));
                }
            }
            Decl::Type(decl) => {
                for spec in &decl.specs {
                    let Some(id) = self.decl_of(&spec.name) else {
                        self.resolve_type(&spec.ty);
                        continue;
                    };
                    if spec.assign {
                        let ty = self.resolve_type(&spec.ty);
                        self.types.insert(id, ty);
                    } else {
                        // In scope inside its own definition.
                        let nid = self.store.add_named(spec.name.name.clone());
                        self.types.insert(id, Type::Named(nid));
                        self.define_named(nid, &spec.ty);
                    }
                }
            }
            Decl::Func(func) => self.other("function declaration inside function body", func.span),
        }
    }

    /// Check one `var` or `const` spec and record the types of its names.
    pub(super) fn check_value_spec(
        &mut self,
        names: &[Ident],
        ty: Option<&Expr>,
        values: &[Expr],
        constant: bool,
        iota: Option<i64>,
    ) {
        let saved = std::mem::replace(&mut self.iota, iota);
        let declared = ty.map(|t| self.resolve_type(t));
        let span = names.first().map_or_else(Default::default, |n| n.span);

        let ops: Option<Vec<Operand>> = if values.is_empty() {
            if constant {
                self.other("missing init expr for const declaration", span);
            }
            None
        } else if values.len() == names.len() {
            Some(values.iter().map(|v| self.value(v)).collect())
        } else if let [single] = values
            && names.len() > 1
            && !constant
        {
            let ops = self.multi_value(single, names.len());
            if ops.is_none() {
                self.report(CheckError::AssignmentCount {
                    lhs: names.len(),
                    rhs: 1,
                    span,
                });
            }
            ops
        } else {
            let (lhs, rhs) = (names.len(), values.len());
            if lhs > rhs {
                self.other(format!("missing init expr for {}", names[rhs].name), span);
            } else {
                self.other(format!("extra init expr {}", print_expr(&values[lhs])), values[lhs].span());
            }
            for v in values {
                self.value(v);
            }
            None
        };

        for (i, name) in names.iter().enumerate() {
            let op = ops.as_ref().and_then(|ops| ops.get(i));
            let value_span = values.get(i).map_or(name.span, Expr::span);
            if constant
                && let Some(op) = op
                && op.mode != Mode::Constant
                && !op.ty.is_unknown()
            {
                let what = self.describe(&values[i.min(values.len() - 1)], op);
                self.other(format!("{what} is not constant"), value_span);
            }
            let ty = match (&declared, op) {
                (Some(declared), Some(op)) => {
                    let context = if constant { "constant declaration" } else { "variable declaration" };
                    self.check_assignable(op, declared, context, value_span);
                    declared.clone()
                }
                (Some(declared), None) => declared.clone(),
                // Untyped constants stay untyped.
                (None, Some(op)) if constant => op.ty.clone(),
                (None, Some(op)) => self.default_type(op, value_span),
                (None, None) => Type::Unknown,
            };
            self.declare(name, ty);
        }
        self.iota = saved;
    }

    // ========================================================================
    // Simple statements
    // ========================================================================

    fn expr_stmt(&mut self, expr: &Expr) {
        let op = self.expr(expr);
        let used = match expr.unparen() {
            Expr::Call(call) => op.mode == Mode::NoValue || !self.is_pure_callee(&call.func),
            Expr::Unary(unary) => unary.op == UnaryOp::Recv,
            _ => false,
        };
        if !used {
            let what = self.describe(expr, &op);
            self.other(format!("{what} is not used"), expr.span());
        }
    }

    /// Conversions and value-producing builtins have no effect as statements.
    fn is_pure_callee(&self, callee: &Expr) -> bool {
        let Expr::Ident(ident) = callee.unparen() else {
            return matches!(
                callee.unparen(),
                Expr::ArrayType(_) | Expr::MapType(_) | Expr::ChanType(_) | Expr::FuncType(_)
            );
        };
        match self.table.binding(ident.id) {
            Some(Binding::Universe) => match universe::lookup(&ident.name) {
                Some(Predeclared::Type(_)) => true,
                Some(Predeclared::Builtin(b)) => matches!(
                    b,
                    Builtin::Append
                        | Builtin::Cap
                        | Builtin::Complex
                        | Builtin::Imag
                        | Builtin::Len
                        | Builtin::Make
                        | Builtin::Max
                        | Builtin::Min
                        | Builtin::New
                        | Builtin::Real
                ),
                _ => false,
            },
            Some(Binding::Decl(id)) => self.table.decl(id).kind == crate::resolve::DeclKind::Type,
            _ => false,
        }
    }

    fn send(&mut self, send: &SendStmt) {
        let ch = self.value(&send.chan);
        let value = self.value(&send.value);
        match self.store.underlying(&ch.ty).clone() {
            Type::Chan(ChanDir::Recv, _) => {
                let what = self.describe(&send.chan, &ch);
                self.report(CheckError::InvalidOperation {
                    message: format!("cannot send to receive-only channel {what}"),
                    span: send.span,
                });
            }
            Type::Chan(_, elem) => self.check_assignable(&value, &elem, "send", send.value.span()),
            Type::Unknown => {}
            _ => {
                let what = self.describe(&send.chan, &ch);
                self.report(CheckError::InvalidOperation {
                    message: format!("cannot send to non-channel {what}"),
                    span: send.span,
                });
            }
        }
    }

    fn condition(&mut self, cond: &Expr, keyword: &str) {
        let op = self.value(cond);
        let ok = self.store.is_opaque(&op.ty) || self.store.basic_kind(&op.ty).is_some_and(BasicKind::is_boolean);
        if !ok {
            let what = self.describe(cond, &op);
            self.other(format!("non-boolean condition in {keyword} statement: {what}"), cond.span());
        }
    }

    /// Report when `target` cannot appear on the left of an assignment.
    fn check_target(&mut self, expr: &Expr, target: &Operand) {
        if target.is_assignable_target() || target.ty.is_unknown() && target.mode == Mode::Value {
            return;
        }
        self.report(CheckError::NotAssignable {
            what: self.describe(expr, target),
            span: expr.span(),
        });
    }

    // ========================================================================
    // Assignment
    // ========================================================================

    fn assign(&mut self, assign: &AssignStmt) {
        if let AssignOp::Compound(op) = assign.op {
            let ([lhs], [rhs]) = (assign.lhs.as_slice(), assign.rhs.as_slice()) else {
                self.other(format!("assignment operation {} requires single-valued expressions", assign.op), assign.span);
                return;
            };
            let target = self.value(lhs);
            self.check_target(lhs, &target);
            let value = self.value(rhs);
            self.binary_op(op, lhs, target, rhs, value, assign.span);
            return;
        }

        let values = self.assigned_values(&assign.lhs, &assign.rhs, assign.span);
        let define = assign.op == AssignOp::Define;
        for (i, lhs) in assign.lhs.iter().enumerate() {
            let value = values.get(i).cloned().unwrap_or_else(Operand::unknown);
            let span = assign.rhs.get(i).map_or(assign.span, Expr::span);
            if let Expr::Ident(ident) = lhs {
                if ident.is_blank() {
                    if value.ty.is_untyped_nil() {
                        self.other("use of untyped nil in assignment", span);
                    }
                    continue;
                }
                // A new variable of `:=` is declared by this very identifier.
                let new_var = define
                    && self
                        .decl_of(ident)
                        .is_some_and(|id| self.table.decl(id).ident == Some(ident.id));
                if new_var {
                    let ty = self.default_type(&value, span);
                    self.declare(ident, ty);
                    continue;
                }
            }
            let target = self.expr(lhs);
            self.check_target(lhs, &target);
            self.check_assignable(&value, &target.ty, "assignment", span);
        }
    }

    /// Values for the targets of an assignment or declaration.
    fn assigned_values(&mut self, lhs: &[Expr], rhs: &[Expr], span: Span) -> Vec<Operand> {
        if lhs.len() == rhs.len() {
            return rhs.iter().map(|e| self.value(e)).collect();
        }
        let got = match rhs {
            [single] => match self.multi_value(single, lhs.len()) {
                Some(values) => return values,
                None => 1,
            },
            _ => {
                for e in rhs {
                    self.value(e);
                }
                rhs.len()
            }
        };
        self.report(CheckError::AssignmentCount {
            lhs: lhs.len(),
            rhs: got,
            span,
        });
        Vec::new()
    }

    fn return_stmt(&mut self, ret: &ReturnStmt) {
        let Some(func) = self.funcs_stack.last().cloned() else { return };
        if ret.results.is_empty() {
            if !func.results.is_empty() && !func.named_results {
                self.report(CheckError::ReturnCount {
                    expected: func.results.len(),
                    got: 0,
                    span: ret.span,
                });
            }
            return;
        }
        let values = self.expr_list(&ret.results);
        if values.len() != func.results.len() {
            self.report(CheckError::ReturnCount {
                expected: func.results.len(),
                got: values.len(),
                span: ret.span,
            });
            return;
        }
        for (i, (value, want)) in values.iter().zip(&func.results).enumerate() {
            let span = ret.results.get(i).map_or(ret.span, Expr::span);
            self.check_assignable(value, want, "return statement", span);
        }
    }

    // ========================================================================
    // Compound statements
    // ========================================================================

    fn switch(&mut self, s: &SwitchStmt) {
        if let Some(init) = &s.init {
            self.stmt(init);
        }
        let tag = s.tag.as_ref().map(|tag| {
            let op = self.value(tag);
            let span = tag.span();
            let ty = self.default_type(&op, span);
            (tag, Operand::value(ty))
        });
        for clause in &s.clauses {
            for expr in clause.list.iter().flatten() {
                let op = self.value(expr);
                match &tag {
                    Some((tag_expr, tag_op)) => {
                        self.binary_op(BinaryOp::Equal, expr, op, tag_expr, tag_op.clone(), expr.span());
                    }
                    None => {
                        let ok = self.store.is_opaque(&op.ty)
                            || self.store.basic_kind(&op.ty).is_some_and(BasicKind::is_boolean);
                        if !ok {
                            let what = self.describe(expr, &op);
                            self.report(CheckError::TypeMismatch {
                                message: format!("invalid case {what} in switch (mismatched types {} and bool)", self.store.display(&op.ty)),
                                span: expr.span(),
                            });
                        }
                    }
                }
            }
            self.stmts(&clause.body);
        }
    }

    fn type_switch(&mut self, s: &TypeSwitchStmt) {
        if let Some(init) = &s.init {
            self.stmt(init);
        }
        let x = self.value(&s.expr);
        let iface = match self.store.underlying(&x.ty).clone() {
            Type::Interface(iface) => Some(iface),
            Type::Unknown => None,
            _ => {
                let what = self.describe(&s.expr, &x);
                self.report(CheckError::InvalidOperation {
                    message: format!("{what} is not an interface"),
                    span: s.expr.span(),
                });
                None
            }
        };

        for clause in &s.clauses {
            let mut single = None;
            for expr in clause.list.iter().flatten() {
                if is_nil(expr) {
                    continue;
                }
                let ty = self.resolve_type(expr);
                if let Some(iface) = &iface {
                    let concrete = !matches!(self.store.underlying(&ty), Type::Interface(_));
                    if concrete && !self.implements(&ty, iface) {
                        let t = self.store.display(&ty);
                        let i = self.store.display(&x.ty);
                        self.other(format!("impossible type switch case: {t} does not implement {i}"), expr.span());
                    }
                }
                single = Some(ty);
            }
            if let Some(binding) = &s.binding {
                let listed = clause.list.as_ref().map_or(0, Vec::len);
                let ty = match single {
                    Some(ty) if listed == 1 => ty,
                    _ => x.ty.clone(),
                };
                self.declare(binding, ty);
            }
            self.stmts(&clause.body);
        }
    }

    fn range(&mut self, s: &RangeStmt) {
        let x = self.value(&s.expr);
        let under = self.store.underlying(&x.ty).clone();
        let (key, value, vars) = match under {
            Type::Basic(kind) if kind.is_string() => (Type::int(), Type::Basic(BasicKind::Int32), 2),
            Type::Basic(kind) if kind.is_integer() => {
                let ty = if kind.is_untyped() { Type::int() } else { x.ty.clone() };
                (ty, Type::Unknown, 1)
            }
            Type::Array(_, elem) | Type::Slice(elem) => (Type::int(), *elem, 2),
            Type::Pointer(base) => match self.store.underlying(&base) {
                Type::Array(_, elem) => (Type::int(), elem.as_ref().clone(), 2),
                _ => self.cannot_range(s, &x),
            },
            Type::Map(k, v) => (*k, *v, 2),
            Type::Chan(ChanDir::Send, _) => {
                let what = self.describe(&s.expr, &x);
                self.other(format!("cannot range over send-only channel {what}"), s.expr.span());
                (Type::Unknown, Type::Unknown, 1)
            }
            Type::Chan(_, elem) => (*elem, Type::Unknown, 1),
            // Range-over-func iterators.
            Type::Func(_) | Type::Unknown => (Type::Unknown, Type::Unknown, 2),
            _ => self.cannot_range(s, &x),
        };

        if vars == 1
            && let Some(extra) = &s.value
        {
            let what = print_expr(&s.expr);
            self.other(format!("range over {what} permits only one iteration variable"), extra.span());
        }

        for (var, ty) in [(&s.key, key), (&s.value, value)] {
            let Some(var) = var else { continue };
            if let Expr::Ident(ident) = var {
                if ident.is_blank() {
                    continue;
                }
                if s.define {
                    self.declare(ident, ty);
                    continue;
                }
            }
            let target = self.expr(var);
            self.check_target(var, &target);
            self.check_assignable(&Operand::value(ty), &target.ty, "range", var.span());
        }
        self.stmts(&s.body.stmts);
    }

    fn cannot_range(&mut self, s: &RangeStmt, x: &Operand) -> (Type, Type, usize) {
        let what = self.describe(&s.expr, x);
        self.report(CheckError::InvalidOperation {
            message: format!("cannot range over {what}"),
            span: s.expr.span(),
        });
        (Type::Unknown, Type::Unknown, 2)
    }
}

fn is_nil(expr: &Expr) -> bool {
    matches!(expr.unparen(), Expr::Ident(ident) if ident.name == "nil")
}
