//! Type expressions: turning `*T`, `[]T`, `struct{...}` into [`Type`]s.

use gotmpl_core::{CheckError, Span};
use gotmpl_parser::ast::*;
use gotmpl_parser::printer::print_expr;

use super::Checker;
use super::types::{FieldInfo, InterfaceInfo, MethodInfo, Signature, Type};
use super::universe::{self, Predeclared};
use crate::resolve::{Binding, DeclKind};

impl<'a> Checker<'a, '_> {
    /// Resolve an expression in a type position.
    pub(super) fn resolve_type(&mut self, expr: &Expr) -> Type {
        match expr {
            Expr::Ident(ident) => self.type_name(ident),
            Expr::Paren(paren) => self.resolve_type(&paren.expr),
            Expr::Selector(sel) => match self.import_path_of(&sel.expr) {
                Some(path) => self
                    .importer
                    .import_type(&mut self.store, path, &sel.sel.name),
                None => self.not_a_type(expr),
            },
            Expr::Star(star) => Type::pointer(self.resolve_type(&star.expr)),
            Expr::ArrayType(array) => {
                let elem = self.resolve_type(&array.elt);
                match &array.len {
                    None => Type::slice(elem),
                    Some(Expr::Ellipsis(e)) => {
                        self.other("invalid use of [...] array (outside a composite literal)", e.span);
                        Type::Array(None, Box::new(elem))
                    }
                    Some(len) => {
                        let len = self.array_len(len);
                        Type::Array(len, Box::new(elem))
                    }
                }
            }
            Expr::MapType(map) => {
                let key = self.resolve_type(&map.key);
                let value = self.resolve_type(&map.value);
                if !self.store.comparable(&key) {
                    let key_text = self.store.display(&key);
                    self.other(format!("invalid map key type {key_text}"), map.key.span());
                }
                Type::Map(Box::new(key), Box::new(value))
            }
            Expr::ChanType(chan) => Type::Chan(chan.dir, Box::new(self.resolve_type(&chan.value))),
            Expr::FuncType(func) => Type::Func(Box::new(self.signature(func))),
            Expr::StructType(st) => Type::Struct(self.struct_fields(st)),
            Expr::InterfaceType(it) => Type::Interface(Box::new(self.interface(it))),
            Expr::Ellipsis(e) => {
                self.other("invalid use of ...", e.span);
                Type::Unknown
            }
            _ => self.not_a_type(expr),
        }
    }

    fn not_a_type(&mut self, expr: &Expr) -> Type {
        self.report(CheckError::NotAType {
            what: print_expr(expr),
            span: expr.span(),
        });
        Type::Unknown
    }

    fn type_name(&mut self, ident: &Ident) -> Type {
        match self.table.binding(ident.id) {
            Some(Binding::Decl(id)) => {
                if self.table.decl(id).kind == DeclKind::Type {
                    self.decl_type(id)
                } else {
                    self.not_a_type(&Expr::Ident(ident.clone()))
                }
            }
            Some(Binding::Universe) => match universe::lookup(&ident.name) {
                Some(Predeclared::Type(ty)) => self.universe_type(&ident.name, ty),
                Some(_) => self.not_a_type(&Expr::Ident(ident.clone())),
                None => self
                    .externals
                    .get(&ident.name)
                    .cloned()
                    .unwrap_or(Type::Unknown),
            },
            // Undeclared names were reported by the resolver.
            Some(Binding::Unresolved) | None => Type::Unknown,
        }
    }

    /// The type a predeclared type name denotes.
    pub(super) fn universe_type(&self, name: &str, ty: Type) -> Type {
        if name == "error" {
            self.error_type.clone()
        } else {
            ty
        }
    }

    /// Import path when `expr` names an imported package.
    pub(super) fn import_path_of(&self, expr: &Expr) -> Option<&'a str> {
        let Expr::Ident(ident) = expr else { return None };
        let id = self.table.decl_of(ident.id)?;
        self.imports.get(&id).copied()
    }

    /// Signature of a function type; `...T` becomes a trailing `[]T`.
    pub(super) fn signature(&mut self, func: &FuncType) -> Signature {
        let mut sig = Signature::default();
        let count = func.params.len();
        for (i, field) in func.params.iter().enumerate() {
            let ty = match &field.ty {
                Expr::Ellipsis(e) => {
                    if i + 1 != count || field.names.len() > 1 {
                        self.other("can only use ... with final parameter in list", e.span);
                    }
                    sig.variadic = true;
                    let elem = e.elt.as_ref().map_or(Type::Unknown, |t| self.resolve_type(t));
                    Type::slice(elem)
                }
                other => self.resolve_type(other),
            };
            for _ in 0..field.arity() {
                sig.params.push(ty.clone());
            }
        }
        for field in &func.results {
            let ty = self.resolve_type(&field.ty);
            for _ in 0..field.arity() {
                sig.results.push(ty.clone());
            }
        }
        sig
    }

    fn struct_fields(&mut self, st: &StructType) -> Vec<FieldInfo> {
        let mut fields: Vec<FieldInfo> = Vec::new();
        for field in &st.fields {
            let ty = self.resolve_type(&field.ty);
            let declared: Vec<(String, bool, Span)> = if field.names.is_empty() {
                vec![(embedded_name(&field.ty), true, field.ty.span())]
            } else {
                field
                    .names
                    .iter()
                    .map(|n| (n.name.clone(), false, n.span))
                    .collect()
            };
            for (name, embedded, span) in declared {
                if name != "_" && fields.iter().any(|f| f.name == name) {
                    self.other(format!("{name} redeclared"), span);
                }
                fields.push(FieldInfo {
                    name,
                    ty: ty.clone(),
                    embedded,
                });
            }
        }
        fields
    }

    fn interface(&mut self, it: &InterfaceType) -> InterfaceInfo {
        let mut info = InterfaceInfo::default();
        for field in &it.methods {
            if field.names.is_empty() {
                let embedded = self.resolve_type(&field.ty);
                if let Type::Named(nid) = embedded {
                    self.ensure_named(nid);
                }
                match self.store.underlying(&embedded) {
                    Type::Interface(inner) => {
                        info.open |= inner.open;
                        info.methods.extend(inner.methods.iter().cloned());
                    }
                    // Opaque types and constraint elements.
                    _ => info.open = true,
                }
                continue;
            }
            let sig = match &field.ty {
                Expr::FuncType(func) => self.signature(func),
                _ => Signature::default(),
            };
            for name in &field.names {
                if info.methods.iter().any(|m| m.name == name.name) {
                    self.other(format!("duplicate method {}", name.name), name.span);
                    continue;
                }
                info.methods.push(MethodInfo {
                    name: name.name.clone(),
                    sig: sig.clone(),
                });
            }
        }
        info.methods.sort_by(|a, b| a.name.cmp(&b.name));
        info.methods.dedup_by(|a, b| a.name == b.name);
        info
    }

    fn array_len(&mut self, len: &Expr) -> Option<u64> {
        match self.const_int(len, self.iota, 0) {
            Some(n) if n >= 0 => Some(n as u64),
            Some(_) => {
                self.other(format!("invalid array length {}", print_expr(len)), len.span());
                None
            }
            None => None,
        }
    }

    /// Value of a constant integer expression, when it can be computed
    /// from the syntax alone.
    pub(super) fn const_int(&self, expr: &Expr, iota: Option<i64>, depth: u32) -> Option<i64> {
        if depth > 32 {
            return None;
        }
        match expr {
            Expr::BasicLit(lit) if lit.kind == LitKind::Int => parse_int(&lit.value),
            Expr::BasicLit(lit) if lit.kind == LitKind::Char => {
                let inner = lit.value.strip_prefix('\'')?.strip_suffix('\'')?;
                let mut chars = inner.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if c != '\\' => Some(c as i64),
                    _ => None,
                }
            }
            Expr::Paren(paren) => self.const_int(&paren.expr, iota, depth + 1),
            Expr::Unary(unary) => {
                let value = self.const_int(&unary.expr, iota, depth + 1)?;
                match unary.op {
                    UnaryOp::Plus => Some(value),
                    UnaryOp::Neg => value.checked_neg(),
                    UnaryOp::BitNot => Some(!value),
                    _ => None,
                }
            }
            Expr::Binary(bin) => {
                let left = self.const_int(&bin.left, iota, depth + 1)?;
                let right = self.const_int(&bin.right, iota, depth + 1)?;
                match bin.op {
                    BinaryOp::Add => left.checked_add(right),
                    BinaryOp::Sub => left.checked_sub(right),
                    BinaryOp::Mul => left.checked_mul(right),
                    BinaryOp::Div => left.checked_div(right),
                    BinaryOp::Rem => left.checked_rem(right),
                    BinaryOp::Shl => u32::try_from(right).ok().and_then(|r| left.checked_shl(r)),
                    BinaryOp::Shr => u32::try_from(right).ok().and_then(|r| left.checked_shr(r)),
                    BinaryOp::BitAnd => Some(left & right),
                    BinaryOp::BitOr => Some(left | right),
                    BinaryOp::BitXor => Some(left ^ right),
                    BinaryOp::AndNot => Some(left & !right),
                    _ => None,
                }
            }
            Expr::Ident(ident) => match self.table.binding(ident.id)? {
                Binding::Universe if ident.name == "iota" => iota,
                Binding::Decl(id) => {
                    let spec = self.values.get(&id)?;
                    if !spec.constant {
                        return None;
                    }
                    let index = spec
                        .names
                        .iter()
                        .position(|n| self.table.decl_of(n.id) == Some(id))?;
                    let value = spec.values.get(index)?;
                    self.const_int(value, spec.iota, depth + 1)
                }
                _ => None,
            },
            Expr::Call(call) if call.args.len() == 1 => {
                // Conversions like `int(N)`.
                self.const_int(&call.args[0], iota, depth + 1)
            }
            _ => None,
        }
    }
}


/// Field name of an embedded field: the type name without package or `*`.
fn embedded_name(ty: &Expr) -> String {
    match ty {
        Expr::Ident(ident) => ident.name.clone(),
        Expr::Star(star) => embedded_name(&star.expr),
        Expr::Paren(paren) => embedded_name(&paren.expr),
        Expr::Selector(sel) => sel.sel.name.clone(),
        _ => "_".to_string(),
    }
}

/// Parse a Go integer literal (`0x1F`, `0o17`, `017`, `0b101`, `1_000`).
fn parse_int(text: &str) -> Option<i64> {
    let clean: String = text.chars().filter(|c| *c != '_').collect();
    let lower = clean.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (&lower[1..], 8)
    } else {
        (lower.as_str(), 10)
    };
    i64::from_str_radix(digits, radix).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literal_forms() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0x1F"), Some(31));
        assert_eq!(parse_int("0o17"), Some(15));
        assert_eq!(parse_int("017"), Some(15));
        assert_eq!(parse_int("0b101"), Some(5));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("0"), Some(0));
    }
}
