//! Calls of predeclared functions.

use gotmpl_parser::ast::*;

use super::Checker;
use super::operand::{Mode, Operand};
use super::types::{BasicKind, Type};
use super::universe::Builtin;

impl Checker<'_, '_> {
    pub(super) fn builtin(&mut self, builtin: Builtin, call: &CallExpr) -> Operand {
        let name = builtin.name();
        let (min, max) = arity(builtin);
        let got = call.args.len();
        if got < min || max.is_some_and(|max| got > max) {
            let expected = if got < min { min } else { max.unwrap_or(min) };
            self.arg_count(name.to_string(), expected, got, call.span);
            for arg in &call.args {
                self.expr(arg);
            }
            return Operand::unknown();
        }
        if call.has_ellipsis && builtin != Builtin::Append {
            self.other(format!("invalid use of ... with built-in {name}"), call.span);
        }

        let args = &call.args;
        match builtin {
            Builtin::Len | Builtin::Cap => {
                let x = self.value(&args[0]);
                let ok = match self.store.underlying(&x.ty) {
                    Type::Basic(k) => builtin == Builtin::Len && k.is_string(),
                    Type::Map(..) => builtin == Builtin::Len,
                    Type::Array(..) | Type::Slice(_) | Type::Chan(..) | Type::Unknown => true,
                    Type::Pointer(base) => matches!(self.store.underlying(base), Type::Array(..)),
                    _ => false,
                };
                if !ok {
                    return self.invalid_argument(&args[0], &x, name);
                }
                let mode = if x.mode == Mode::Constant { Mode::Constant } else { Mode::Value };
                Operand::new(mode, Type::int())
            }
            Builtin::Append => {
                let slice = self.value(&args[0]);
                let elem = match self.store.underlying(&slice.ty) {
                    Type::Slice(elem) => elem.as_ref().clone(),
                    Type::Unknown => Type::Unknown,
                    _ => return self.invalid_argument(&args[0], &slice, name),
                };
                if call.has_ellipsis {
                    if args.len() != 2 {
                        self.other("can only use ... with final argument in list", call.span);
                        return Operand::value(slice.ty);
                    }
                    let rest = self.value(&args[1]);
                    let bytes_from_string = self.store.basic_kind(&elem) == Some(BasicKind::Uint8)
                        && self.store.basic_kind(&rest.ty).is_some_and(BasicKind::is_string);
                    if !bytes_from_string {
                        let target = Type::slice(elem);
                        self.check_assignable(&rest, &target, "argument to append", args[1].span());
                    }
                } else {
                    for arg in &args[1..] {
                        let op = self.value(arg);
                        self.check_assignable(&op, &elem, "argument to append", arg.span());
                    }
                }
                let ty = if slice.ty.is_untyped_nil() { Type::Unknown } else { slice.ty };
                Operand::value(ty)
            }
            Builtin::Make => {
                let ty = self.resolve_type(&args[0]);
                let min_args = match self.store.underlying(&ty) {
                    Type::Slice(_) => 2,
                    Type::Map(..) | Type::Chan(..) | Type::Unknown => 1,
                    _ => {
                        let what = self.store.display(&ty);
                        self.other(
                            format!("invalid argument: cannot make {what}; type must be slice, map, or channel"),
                            args[0].span(),
                        );
                        return Operand::value(ty);
                    }
                };
                if got < min_args {
                    let what = self.store.display(&ty);
                    self.other(format!("invalid operation: make({what}) expects 2 or 3 arguments; found 1"), call.span);
                }
                for size in &args[1..] {
                    self.index_value(size);
                }
                Operand::value(ty)
            }
            Builtin::New => {
                let ty = self.resolve_type(&args[0]);
                Operand::value(Type::pointer(ty))
            }
            Builtin::Delete => {
                let map = self.value(&args[0]);
                let key = self.value(&args[1]);
                match self.store.underlying(&map.ty).clone() {
                    Type::Map(key_ty, _) => {
                        self.check_assignable(&key, &key_ty, "argument to delete", args[1].span());
                    }
                    Type::Unknown => {}
                    _ => {
                        self.invalid_argument(&args[0], &map, name);
                    }
                }
                Operand::new(Mode::NoValue, Type::Unknown)
            }
            Builtin::Copy => {
                let dst = self.value(&args[0]);
                self.value(&args[1]);
                if !matches!(self.store.underlying(&dst.ty), Type::Slice(_) | Type::Unknown) {
                    return self.invalid_argument(&args[0], &dst, name);
                }
                Operand::value(Type::int())
            }
            Builtin::Close => {
                let ch = self.value(&args[0]);
                match self.store.underlying(&ch.ty) {
                    Type::Chan(ChanDir::Recv, _) => {
                        self.other("invalid operation: cannot close receive-only channel", call.span);
                    }
                    Type::Chan(..) | Type::Unknown => {}
                    _ => {
                        self.invalid_argument(&args[0], &ch, name);
                    }
                }
                Operand::new(Mode::NoValue, Type::Unknown)
            }
            Builtin::Clear => {
                let x = self.value(&args[0]);
                if !matches!(self.store.underlying(&x.ty), Type::Map(..) | Type::Slice(_) | Type::Unknown) {
                    self.invalid_argument(&args[0], &x, name);
                }
                Operand::new(Mode::NoValue, Type::Unknown)
            }
            Builtin::Panic | Builtin::Print | Builtin::Println => {
                for arg in args {
                    self.value(arg);
                }
                Operand::new(Mode::NoValue, Type::Unknown)
            }
            Builtin::Recover => Operand::value(Type::empty_interface()),
            Builtin::Complex => {
                let re = self.value(&args[0]);
                let im = self.value(&args[1]);
                let kind = match (self.store.basic_kind(&re.ty), self.store.basic_kind(&im.ty)) {
                    (Some(BasicKind::Float32), _) | (_, Some(BasicKind::Float32)) => BasicKind::Complex64,
                    (Some(a), Some(b)) if a.is_untyped() && b.is_untyped() => BasicKind::UntypedComplex,
                    _ => BasicKind::Complex128,
                };
                let constant = re.mode == Mode::Constant && im.mode == Mode::Constant;
                Operand::new(if constant { Mode::Constant } else { Mode::Value }, Type::Basic(kind))
            }
            Builtin::Real | Builtin::Imag => {
                let x = self.value(&args[0]);
                let kind = match self.store.basic_kind(&x.ty) {
                    Some(BasicKind::Complex64) => BasicKind::Float32,
                    Some(k) if k.is_untyped() => BasicKind::UntypedFloat,
                    Some(k) if k.is_complex() => BasicKind::Float64,
                    None if self.store.is_opaque(&x.ty) => return Operand::unknown(),
                    _ => return self.invalid_argument(&args[0], &x, name),
                };
                let mode = if x.mode == Mode::Constant { Mode::Constant } else { Mode::Value };
                Operand::new(mode, Type::Basic(kind))
            }
            Builtin::Min | Builtin::Max => {
                let mut result = self.value(&args[0]);
                for arg in &args[1..] {
                    let next = self.value(arg);
                    let constant = result.mode == Mode::Constant && next.mode == Mode::Constant;
                    let Some(ty) = self.common_type(BinaryOp::Less, &args[0], &result, arg, &next, call.span) else {
                        return Operand::unknown();
                    };
                    result = Operand::new(if constant { Mode::Constant } else { Mode::Value }, ty);
                }
                if !self.store.is_opaque(&result.ty)
                    && !self.store.basic_kind(&result.ty).is_some_and(BasicKind::is_ordered)
                {
                    return self.invalid_argument(&args[0], &result, name);
                }
                result
            }
        }
    }

    fn invalid_argument(&mut self, expr: &Expr, op: &Operand, builtin: &str) -> Operand {
        let what = self.describe(expr, op);
        self.other(format!("invalid argument: {what} for built-in {builtin}"), expr.span());
        Operand::unknown()
    }
}

/// Minimum and maximum argument counts.
fn arity(builtin: Builtin) -> (usize, Option<usize>) {
    match builtin {
        Builtin::Append => (1, None),
        Builtin::Cap | Builtin::Len | Builtin::Close | Builtin::Clear | Builtin::New | Builtin::Panic => {
            (1, Some(1))
        }
        Builtin::Real | Builtin::Imag => (1, Some(1)),
        Builtin::Complex | Builtin::Copy | Builtin::Delete => (2, Some(2)),
        Builtin::Make => (1, Some(3)),
        Builtin::Max | Builtin::Min => (1, None),
        Builtin::Print | Builtin::Println => (0, None),
        Builtin::Recover => (0, Some(0)),
    }
}
