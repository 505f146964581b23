//! The result of checking an expression.

use gotmpl_parser::ast::Expr;
use gotmpl_parser::printer::print_expr;

use super::Checker;
use super::types::Type;
use super::universe::Builtin;

/// What an expression denotes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Mode {
    /// Call of a function without results.
    NoValue,
    Value,
    /// Addressable value.
    Variable,
    /// `m[k]`: assignable, and usable in a comma-ok assignment.
    MapIndex,
    /// `x.(T)` or `<-ch`: usable in a comma-ok assignment.
    CommaOk,
    Constant,
    /// A type, e.g. the callee of a conversion.
    TypeExpr,
    Builtin(Builtin),
}

#[derive(Debug, Clone, PartialEq)]
pub(super) struct Operand {
    pub mode: Mode,
    pub ty: Type,
}

impl Operand {
    pub fn new(mode: Mode, ty: Type) -> Self {
        Self { mode, ty }
    }

    pub fn value(ty: Type) -> Self {
        Self::new(Mode::Value, ty)
    }

    pub fn variable(ty: Type) -> Self {
        Self::new(Mode::Variable, ty)
    }

    pub fn constant(ty: Type) -> Self {
        Self::new(Mode::Constant, ty)
    }

    /// Result of an erroneous expression; passes every later check.
    pub fn unknown() -> Self {
        Self::value(Type::Unknown)
    }

    pub fn is_value(&self) -> bool {
        matches!(
            self.mode,
            Mode::Value | Mode::Variable | Mode::MapIndex | Mode::CommaOk | Mode::Constant
        )
    }

    /// Whether the operand may appear on the left of `=`.
    pub fn is_assignable_target(&self) -> bool {
        matches!(self.mode, Mode::Variable | Mode::MapIndex)
    }
}

impl Checker<'_, '_> {
    /// Describe an operand for diagnostics, e.g. `x (variable of type int)`.
    pub(super) fn describe(&self, expr: &Expr, op: &Operand) -> String {
        let text = print_expr(expr);
        let ty = self.store.display(&op.ty);
        match op.mode {
            Mode::Constant if op.ty.is_untyped() => format!("{text} ({ty} constant)"),
            Mode::Constant => format!("{text} (constant of type {ty})"),
            Mode::Variable => format!("{text} (variable of type {ty})"),
            Mode::TypeExpr => format!("{text} (type)"),
            Mode::Builtin(_) => format!("{text} (built-in)"),
            Mode::NoValue => format!("{text} (no value)"),
            _ if op.ty.is_untyped_nil() => text,
            _ => format!("{text} (value of type {ty})"),
        }
    }
}
