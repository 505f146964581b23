//! Assignability, conversions and member lookup.

use gotmpl_core::{CheckError, Span};
use gotmpl_parser::ast::ChanDir;

use super::Checker;
use super::operand::{Mode, Operand};
use super::types::{BasicKind, InterfaceInfo, Signature, Type};

/// Result of looking a selector name up in a type.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Member {
    Field(Type),
    Method(Signature),
    /// The type is opaque; the member may exist.
    Unknown,
    Missing,
}

impl Checker<'_, '_> {
    // ========================================================================
    // Assignability
    // ========================================================================

    /// Whether `value` may be assigned to a variable of type `target`.
    pub(super) fn assignable(&self, value: &Type, target: &Type) -> bool {
        if value.is_unknown() || target.is_unknown() {
            return true;
        }
        if self.store.identical(value, target) {
            return true;
        }
        let target_under = self.store.underlying(target);
        if target_under.is_unknown() {
            return true;
        }

        if let Some(kind) = value.as_basic()
            && kind.is_untyped()
        {
            return self.untyped_assignable(kind, target);
        }

        let value_under = self.store.underlying(value);
        let either_unnamed = !matches!(value, Type::Named(_)) || !matches!(target, Type::Named(_));
        if either_unnamed && self.store.identical(value_under, target_under) {
            return true;
        }

        if let Type::Interface(iface) = target_under {
            return self.implements(value, iface);
        }

        // A bidirectional channel fits any direction with the same element.
        if let (Type::Chan(ChanDir::Both, v_elem), Type::Chan(_, t_elem)) = (value_under, target_under)
            && either_unnamed
        {
            return self.store.identical(v_elem, t_elem);
        }
        false
    }

    /// Whether an untyped constant of `kind` can take type `target`.
    pub(super) fn untyped_assignable(&self, kind: BasicKind, target: &Type) -> bool {
        let under = self.store.underlying(target);
        match under {
            Type::Unknown => true,
            // Untyped values become their default type in interfaces.
            Type::Interface(iface) => {
                kind == BasicKind::UntypedNil || iface.is_empty() || iface.open
            }
            Type::Basic(target_kind) => {
                let target_kind = *target_kind;
                match kind {
                    BasicKind::UntypedBool => target_kind.is_boolean(),
                    BasicKind::UntypedString => target_kind.is_string(),
                    BasicKind::UntypedNil => false,
                    // Representability of the constant value is not checked.
                    _ => target_kind.is_numeric(),
                }
            }
            _ => kind == BasicKind::UntypedNil && self.store.is_nillable(target),
        }
    }

    /// Whether `value` has every method of `iface`.
    pub(super) fn implements(&self, value: &Type, iface: &InterfaceInfo) -> bool {
        if iface.open || self.store.is_opaque(value) {
            return true;
        }
        if let Type::Interface(have) = self.store.underlying(value) {
            return have.open
                || iface.methods.iter().all(|want| {
                    have.method(&want.name)
                        .is_some_and(|m| self.store.identical_signatures(&m.sig, &want.sig))
                });
        }
        iface.methods.iter().all(|want| match self.method_in_set(value, &want.name) {
            Member::Method(sig) => self.store.identical_signatures(&sig, &want.sig),
            Member::Unknown => true,
            Member::Field(_) | Member::Missing => false,
        })
    }

    /// Method lookup honouring receiver kinds: a value of named type `T`
    /// lacks the methods declared on `*T`.
    fn method_in_set(&self, value: &Type, name: &str) -> Member {
        if let Type::Named(nid) = value
            && let Some(method) = self.store.get(*nid).methods.iter().find(|m| m.name == name)
        {
            if method.pointer_recv {
                return Member::Missing;
            }
            return Member::Method(method.sig.clone());
        }
        match self.lookup_member(value, name) {
            Member::Field(_) => Member::Missing,
            other => other,
        }
    }

    /// Report when `op` cannot be assigned to `target`.
    pub(super) fn check_assignable(&mut self, op: &Operand, target: &Type, context: &str, span: Span) {
        if !op.is_value() || self.assignable(&op.ty, target) {
            return;
        }
        let from = match op.mode {
            Mode::Constant if op.ty.is_untyped() => format!("{} constant", self.store.display(&op.ty)),
            _ => format!("value of type {}", self.store.display(&op.ty)),
        };
        let to = self.store.display(target);
        self.report(CheckError::TypeMismatch {
            message: format!("cannot use {from} as {to} value in {context}"),
            span,
        });
    }

    /// The type a value takes when declared without explicit type.
    pub(super) fn default_type(&mut self, op: &Operand, span: Span) -> Type {
        match op.ty {
            Type::Basic(BasicKind::UntypedNil) => {
                self.other("use of untyped nil in assignment", span);
                Type::Unknown
            }
            Type::Basic(kind) => Type::Basic(kind.default_type()),
            Type::Tuple(_) => Type::Unknown,
            ref other => other.clone(),
        }
    }

    // ========================================================================
    // Conversions
    // ========================================================================

    /// Whether a value of type `from` converts to `to` with `T(x)`.
    pub(super) fn convertible(&self, from: &Type, to: &Type) -> bool {
        if self.assignable(from, to) {
            return true;
        }
        let from_under = self.store.underlying(from);
        let to_under = self.store.underlying(to);
        if from_under.is_unknown() || to_under.is_unknown() {
            return true;
        }
        if self.store.identical(from_under, to_under) {
            return true;
        }
        if let (Type::Pointer(a), Type::Pointer(b)) = (from_under, to_under)
            && self
                .store
                .identical(self.store.underlying(a), self.store.underlying(b))
        {
            return true;
        }

        let from_kind = from_under.as_basic();
        let to_kind = to_under.as_basic();
        match (from_kind, to_kind) {
            (Some(f), Some(t)) if (f.is_integer() || f.is_float()) && (t.is_integer() || t.is_float()) => true,
            (Some(f), Some(t)) if f.is_complex() && t.is_complex() => true,
            (Some(f), Some(t)) if f.is_untyped() && f.is_numeric() && t.is_numeric() => true,
            // int → string, string → string
            (Some(f), Some(t)) if t.is_string() && (f.is_integer() || f.is_string()) => true,
            (Some(f), None) if f.is_string() => self.is_byte_or_rune_slice(to_under),
            (None, Some(t)) if t.is_string() => self.is_byte_or_rune_slice(from_under),
            _ => match (from_under, to_under) {
                // Slice to array or array pointer.
                (Type::Slice(elem), Type::Array(_, arr)) => self.store.identical(elem, arr),
                (Type::Slice(elem), Type::Pointer(ptr)) => match self.store.underlying(ptr) {
                    Type::Array(_, arr) => self.store.identical(elem, arr),
                    _ => false,
                },
                _ => false,
            },
        }
    }

    fn is_byte_or_rune_slice(&self, ty: &Type) -> bool {
        match ty {
            Type::Slice(elem) => matches!(
                self.store.basic_kind(elem),
                Some(BasicKind::Uint8 | BasicKind::Int32)
            ),
            _ => false,
        }
    }

    // ========================================================================
    // Members
    // ========================================================================

    /// Look up a field or method, following embedded fields breadth-first
    /// and dereferencing one level of pointer.
    pub(super) fn lookup_member(&self, ty: &Type, name: &str) -> Member {
        let mut level = vec![ty.clone()];
        for _ in 0..8 {
            let mut next = Vec::new();
            for current in &level {
                let base = match current {
                    Type::Pointer(inner) => inner.as_ref(),
                    other => other,
                };
                if let Type::Named(nid) = base {
                    let named = self.store.get(*nid);
                    if let Some(method) = named.methods.iter().find(|m| m.name == name) {
                        return Member::Method(method.sig.clone());
                    }
                }
                match self.store.underlying(base) {
                    Type::Struct(fields) => {
                        if let Some(field) = fields.iter().find(|f| f.name == name) {
                            return Member::Field(field.ty.clone());
                        }
                        next.extend(fields.iter().filter(|f| f.embedded).map(|f| f.ty.clone()));
                    }
                    Type::Interface(iface) => {
                        if let Some(method) = iface.method(name) {
                            return Member::Method(method.sig.clone());
                        }
                        if iface.open {
                            return Member::Unknown;
                        }
                    }
                    Type::Unknown => return Member::Unknown,
                    _ => {}
                }
            }
            if next.is_empty() {
                break;
            }
            level = next;
        }
        Member::Missing
    }
}
