//! Unary and binary operator rules.

use gotmpl_core::{CheckError, Span};
use gotmpl_parser::ast::*;
use gotmpl_parser::printer::print_expr;

use super::Checker;
use super::operand::{Mode, Operand};
use super::types::{BasicKind, Type};

impl Checker<'_, '_> {
    pub(super) fn unary(&mut self, unary: &UnaryExpr) -> Operand {
        if unary.op == UnaryOp::Addr {
            // `&T{...}` is fine even though literals are not addressable.
            let x = match unary.expr.unparen() {
                Expr::CompositeLit(lit) => self.composite(lit, None),
                _ => self.value(&unary.expr),
            };
            return Operand::value(Type::pointer(x.ty));
        }

        let x = self.value(&unary.expr);
        if self.store.is_opaque(&x.ty) {
            return Operand::value(Type::Unknown);
        }

        if unary.op == UnaryOp::Recv {
            return match self.store.underlying(&x.ty) {
                Type::Chan(ChanDir::Send, _) => {
                    let what = self.describe(&unary.expr, &x);
                    self.invalid(format!("cannot receive from send-only channel {what}"), unary.span)
                }
                Type::Chan(_, elem) => Operand::new(Mode::CommaOk, elem.as_ref().clone()),
                _ => {
                    let what = self.describe(&unary.expr, &x);
                    self.invalid(format!("cannot receive from non-channel {what}"), unary.span)
                }
            };
        }

        let kind = self.store.basic_kind(&x.ty);
        let ok = kind.is_some_and(|k| match unary.op {
            UnaryOp::Plus | UnaryOp::Neg => k.is_numeric(),
            UnaryOp::Not => k.is_boolean(),
            UnaryOp::BitNot => k.is_integer(),
            UnaryOp::Addr | UnaryOp::Recv => true,
        });
        if !ok {
            let what = self.describe(&unary.expr, &x);
            return self.invalid(format!("operator {} not defined on {what}", unary.op), unary.span);
        }
        let mode = if x.mode == Mode::Constant { Mode::Constant } else { Mode::Value };
        Operand::new(mode, x.ty)
    }

    pub(super) fn binary(&mut self, binary: &BinaryExpr) -> Operand {
        let left = self.value(&binary.left);
        let right = self.value(&binary.right);
        self.binary_op(binary.op, &binary.left, left, &binary.right, right, binary.span)
    }

    /// Apply a binary operator to checked operands; shared with `op=`.
    pub(super) fn binary_op(
        &mut self,
        op: BinaryOp,
        left_expr: &Expr,
        left: Operand,
        right_expr: &Expr,
        right: Operand,
        span: Span,
    ) -> Operand {
        let constant = left.mode == Mode::Constant && right.mode == Mode::Constant;
        let result_mode = if constant { Mode::Constant } else { Mode::Value };

        if op.is_shift() {
            return self.shift(op, left_expr, left, right_expr, right, span);
        }

        let Some(common) = self.common_type(op, left_expr, &left, right_expr, &right, span) else {
            return Operand::unknown();
        };

        if op.is_comparison() {
            self.comparison(op, left_expr, &left, right_expr, &right, span);
            return Operand::new(result_mode, Type::untyped_bool());
        }

        if self.store.is_opaque(&common) {
            return Operand::new(result_mode, common);
        }
        let kind = self.store.basic_kind(&common);
        let ok = kind.is_some_and(|k| match op {
            BinaryOp::LogicalAnd | BinaryOp::LogicalOr => k.is_boolean(),
            BinaryOp::Add => k.is_numeric() || k.is_string(),
            BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => k.is_numeric(),
            BinaryOp::Rem | BinaryOp::BitAnd | BinaryOp::BitOr | BinaryOp::BitXor | BinaryOp::AndNot => {
                k.is_integer()
            }
            _ => true,
        });
        if !ok {
            let what = self.describe(left_expr, &left);
            return self.invalid(format!("operator {op} not defined on {what}"), span);
        }
        if matches!(op, BinaryOp::Div | BinaryOp::Rem)
            && right.mode == Mode::Constant
            && kind.is_some_and(BasicKind::is_integer)
            && self.const_int(right_expr, self.iota, 0) == Some(0)
        {
            return self.invalid("division by zero".to_string(), span);
        }
        Operand::new(result_mode, common)
    }

    /// The type both operands convert to, reporting mismatches.
    pub(super) fn common_type(
        &mut self,
        op: BinaryOp,
        left_expr: &Expr,
        left: &Operand,
        right_expr: &Expr,
        right: &Operand,
        span: Span,
    ) -> Option<Type> {
        if left.ty.is_unknown() || right.ty.is_unknown() {
            return Some(Type::Unknown);
        }
        let l_untyped = left.ty.as_basic().filter(|k| k.is_untyped());
        let r_untyped = right.ty.as_basic().filter(|k| k.is_untyped());

        let common = match (l_untyped, r_untyped) {
            (Some(l), Some(r)) => {
                if l == r {
                    Some(left.ty.clone())
                } else if l.is_numeric() && r.is_numeric() {
                    Some(Type::Basic(if l.untyped_rank() >= r.untyped_rank() { l } else { r }))
                } else {
                    None
                }
            }
            (Some(l), None) => self
                .untyped_assignable(l, &right.ty)
                .then(|| right.ty.clone()),
            (None, Some(r)) => self
                .untyped_assignable(r, &left.ty)
                .then(|| left.ty.clone()),
            (None, None) => {
                if self.store.identical(&left.ty, &right.ty) {
                    Some(left.ty.clone())
                } else if op.is_comparison()
                    && (self.assignable(&left.ty, &right.ty) || self.assignable(&right.ty, &left.ty))
                {
                    // Interface against an implementing type.
                    Some(left.ty.clone())
                } else {
                    None
                }
            }
        };

        if common.is_none() {
            let message = format!(
                "invalid operation: {} {op} {} (mismatched types {} and {})",
                print_expr(left_expr),
                print_expr(right_expr),
                self.store.display(&left.ty),
                self.store.display(&right.ty),
            );
            self.report(CheckError::TypeMismatch { message, span });
        }
        common
    }

    fn comparison(
        &mut self,
        op: BinaryOp,
        left_expr: &Expr,
        left: &Operand,
        right_expr: &Expr,
        right: &Operand,
        span: Span,
    ) {
        let (operand_expr, operand) = if left.ty.is_untyped_nil() {
            (right_expr, right)
        } else {
            (left_expr, left)
        };
        if self.store.is_opaque(&operand.ty) {
            return;
        }
        let ok = match op {
            BinaryOp::Equal | BinaryOp::NotEqual => {
                if left.ty.is_untyped_nil() || right.ty.is_untyped_nil() {
                    // `nil == nil` is not defined.
                    !(left.ty.is_untyped_nil() && right.ty.is_untyped_nil())
                        && self.store.is_nillable(&operand.ty)
                } else {
                    self.store.comparable(&operand.ty)
                }
            }
            _ => self
                .store
                .basic_kind(&operand.ty)
                .is_some_and(BasicKind::is_ordered),
        };
        if !ok {
            let what = self.describe(operand_expr, operand);
            self.invalid(format!("operator {op} not defined on {what}"), span);
        }
    }

    fn shift(
        &mut self,
        op: BinaryOp,
        left_expr: &Expr,
        left: Operand,
        right_expr: &Expr,
        right: Operand,
        span: Span,
    ) -> Operand {
        let right_ok = match self.store.underlying(&right.ty) {
            Type::Unknown => true,
            Type::Basic(k) => k.is_integer() || (right.mode == Mode::Constant && k.is_untyped() && k.is_numeric()),
            _ => false,
        };
        if !right_ok {
            let what = self.describe(right_expr, &right);
            return self.invalid(format!("shift count {what} must be integer"), span);
        }
        let left_ok = match self.store.underlying(&left.ty) {
            Type::Unknown => true,
            Type::Basic(k) => k.is_integer() || (left.mode == Mode::Constant && k.is_untyped() && k.is_numeric()),
            _ => false,
        };
        if !left_ok {
            let what = self.describe(left_expr, &left);
            return self.invalid(format!("shifted operand {what} must be integer ({op})"), span);
        }
        if left.mode == Mode::Constant && right.mode == Mode::Constant {
            let ty = match left.ty {
                Type::Basic(k) if k.is_untyped() => Type::Basic(BasicKind::UntypedInt),
                other => other,
            };
            return Operand::constant(ty);
        }
        let ty = match left.ty {
            // A non-constant shift of an untyped constant takes type int.
            Type::Basic(k) if k.is_untyped() => Type::int(),
            other => other,
        };
        Operand::value(ty)
    }

    fn invalid(&mut self, message: String, span: Span) -> Operand {
        self.report(CheckError::InvalidOperation { message, span });
        Operand::unknown()
    }
}
