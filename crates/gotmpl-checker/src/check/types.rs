//! Semantic types.
//!
//! Types are small owned trees. Declared types are interned in a
//! [`TypeStore`] and referred to by [`NamedId`], so recursive definitions
//! (`type List struct { next *List }`) stay finite.
//!
//! [`Type::Unknown`] is the permissive type: it is what opaque imports and
//! erroneous operands evaluate to, and every check involving it succeeds.
//! This keeps one error from cascading into many.

use std::fmt::{self, Write};

use gotmpl_parser::ast::ChanDir;

// ============================================================================
// Basic types
// ============================================================================

/// Predeclared scalar types and the kinds of untyped constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    Complex64,
    Complex128,
    String,
    UntypedBool,
    UntypedInt,
    UntypedRune,
    UntypedFloat,
    UntypedComplex,
    UntypedString,
    UntypedNil,
}

impl BasicKind {
    pub fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::Complex64 => "complex64",
            BasicKind::Complex128 => "complex128",
            BasicKind::String => "string",
            BasicKind::UntypedBool => "untyped bool",
            BasicKind::UntypedInt => "untyped int",
            BasicKind::UntypedRune => "untyped rune",
            BasicKind::UntypedFloat => "untyped float",
            BasicKind::UntypedComplex => "untyped complex",
            BasicKind::UntypedString => "untyped string",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    pub fn is_untyped(self) -> bool {
        matches!(
            self,
            BasicKind::UntypedBool
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
                | BasicKind::UntypedFloat
                | BasicKind::UntypedComplex
                | BasicKind::UntypedString
                | BasicKind::UntypedNil
        )
    }

    pub fn is_boolean(self) -> bool {
        matches!(self, BasicKind::Bool | BasicKind::UntypedBool)
    }

    pub fn is_string(self) -> bool {
        matches!(self, BasicKind::String | BasicKind::UntypedString)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
                | BasicKind::UntypedInt
                | BasicKind::UntypedRune
        )
    }

    pub fn is_unsigned(self) -> bool {
        matches!(
            self,
            BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }

    pub fn is_float(self) -> bool {
        matches!(
            self,
            BasicKind::Float32 | BasicKind::Float64 | BasicKind::UntypedFloat
        )
    }

    pub fn is_complex(self) -> bool {
        matches!(
            self,
            BasicKind::Complex64 | BasicKind::Complex128 | BasicKind::UntypedComplex
        )
    }

    pub fn is_numeric(self) -> bool {
        self.is_integer() || self.is_float() || self.is_complex()
    }

    /// Integers, floats and strings support `<`, `<=`, `>`, `>=`.
    pub fn is_ordered(self) -> bool {
        self.is_integer() || self.is_float() || self.is_string()
    }

    /// Rank among numeric untyped kinds; the larger rank wins when mixing.
    pub fn untyped_rank(self) -> u8 {
        match self {
            BasicKind::UntypedInt => 1,
            BasicKind::UntypedRune => 2,
            BasicKind::UntypedFloat => 3,
            BasicKind::UntypedComplex => 4,
            _ => 0,
        }
    }

    /// The type an untyped constant takes when nothing else decides.
    pub fn default_type(self) -> BasicKind {
        match self {
            BasicKind::UntypedBool => BasicKind::Bool,
            BasicKind::UntypedInt => BasicKind::Int,
            BasicKind::UntypedRune => BasicKind::Int32,
            BasicKind::UntypedFloat => BasicKind::Float64,
            BasicKind::UntypedComplex => BasicKind::Complex128,
            BasicKind::UntypedString => BasicKind::String,
            other => other,
        }
    }
}

// ============================================================================
// Composite types
// ============================================================================

/// Index of a declared type in the [`TypeStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Type {
    Basic(BasicKind),
    Named(NamedId),
    Pointer(Box<Type>),
    Slice(Box<Type>),
    /// `None` length when it is not a known constant.
    Array(Option<u64>, Box<Type>),
    Map(Box<Type>, Box<Type>),
    Chan(ChanDir, Box<Type>),
    Func(Box<Signature>),
    Struct(Vec<FieldInfo>),
    Interface(Box<InterfaceInfo>),
    /// Result of a multi-value call.
    Tuple(Vec<Type>),
    /// Permissive: anything goes.
    Unknown,
}

impl Type {
    pub fn basic(kind: BasicKind) -> Self {
        Type::Basic(kind)
    }

    pub fn int() -> Self {
        Type::Basic(BasicKind::Int)
    }

    pub fn bool() -> Self {
        Type::Basic(BasicKind::Bool)
    }

    pub fn string() -> Self {
        Type::Basic(BasicKind::String)
    }

    pub fn untyped_bool() -> Self {
        Type::Basic(BasicKind::UntypedBool)
    }

    pub fn empty_interface() -> Self {
        Type::Interface(Box::default())
    }

    pub fn pointer(elem: Type) -> Self {
        Type::Pointer(Box::new(elem))
    }

    pub fn slice(elem: Type) -> Self {
        Type::Slice(Box::new(elem))
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Type::Unknown)
    }

    /// The basic kind, if this is a basic type (not looking through names).
    pub fn as_basic(&self) -> Option<BasicKind> {
        match self {
            Type::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn is_untyped(&self) -> bool {
        self.as_basic().is_some_and(BasicKind::is_untyped)
    }

    pub fn is_untyped_nil(&self) -> bool {
        matches!(self, Type::Basic(BasicKind::UntypedNil))
    }
}

/// Parameters and results of a function type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Signature {
    pub params: Vec<Type>,
    pub results: Vec<Type>,
    /// Last parameter is `...T`, stored as `[]T`.
    pub variadic: bool,
}

impl Signature {
    /// The type of a call to this signature.
    pub fn result_type(&self) -> Option<Type> {
        match self.results.as_slice() {
            [] => None,
            [single] => Some(single.clone()),
            many => Some(Type::Tuple(many.to_vec())),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub name: String,
    pub ty: Type,
    pub embedded: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub name: String,
    pub sig: Signature,
}

/// Flattened method set of an interface.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InterfaceInfo {
    /// Sorted by name; embedded interfaces are merged in.
    pub methods: Vec<MethodInfo>,
    /// Some embedded element is opaque, so the full method set is unknown.
    pub open: bool,
}

impl InterfaceInfo {
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn is_empty(&self) -> bool {
        self.methods.is_empty() && !self.open
    }
}

/// A method declared on a named type.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclaredMethod {
    pub name: String,
    pub sig: Signature,
    /// Declared with a `*T` receiver.
    pub pointer_recv: bool,
}

/// A declared (defined) type.
#[derive(Debug, Clone)]
pub struct NamedType {
    pub name: String,
    /// `None` until the definition has been resolved.
    pub underlying: Option<Type>,
    pub methods: Vec<DeclaredMethod>,
    /// Opaque type from outside the checked package.
    pub external: bool,
}

// ============================================================================
// Type store
// ============================================================================

/// Interned declared types.
#[derive(Debug, Default)]
pub struct TypeStore {
    named: Vec<NamedType>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a declared type whose underlying type is resolved later.
    pub fn add_named(&mut self, name: impl Into<String>) -> NamedId {
        let id = NamedId(self.named.len() as u32);
        self.named.push(NamedType {
            name: name.into(),
            underlying: None,
            methods: Vec::new(),
            external: false,
        });
        id
    }

    /// Add an opaque external type.
    pub fn add_external(&mut self, name: impl Into<String>) -> NamedId {
        let id = self.add_named(name);
        let named = &mut self.named[id.0 as usize];
        named.underlying = Some(Type::Unknown);
        named.external = true;
        id
    }

    pub fn get(&self, id: NamedId) -> &NamedType {
        &self.named[id.0 as usize]
    }

    pub fn get_mut(&mut self, id: NamedId) -> &mut NamedType {
        &mut self.named[id.0 as usize]
    }

    /// Underlying type, looking through declared types.
    ///
    /// An unresolved or cyclic definition yields [`Type::Unknown`].
    pub fn underlying<'t>(&'t self, ty: &'t Type) -> &'t Type {
        let mut current = ty;
        for _ in 0..64 {
            match current {
                Type::Named(id) => match &self.get(*id).underlying {
                    Some(next) => current = next,
                    None => return &Type::Unknown,
                },
                other => return other,
            }
        }
        &Type::Unknown
    }

    /// Basic kind of the underlying type.
    pub fn basic_kind(&self, ty: &Type) -> Option<BasicKind> {
        self.underlying(ty).as_basic()
    }

    /// Whether the type (or its underlying type) is unknown.
    pub fn is_opaque(&self, ty: &Type) -> bool {
        self.underlying(ty).is_unknown()
    }

    /// Type identity; unknown types are identical to everything.
    pub fn identical(&self, a: &Type, b: &Type) -> bool {
        match (a, b) {
            (Type::Unknown, _) | (_, Type::Unknown) => true,
            (Type::Named(x), Type::Named(y)) => x == y,
            (Type::Named(_), _) | (_, Type::Named(_)) => false,
            (Type::Basic(x), Type::Basic(y)) => x == y,
            (Type::Pointer(x), Type::Pointer(y)) | (Type::Slice(x), Type::Slice(y)) => {
                self.identical(x, y)
            }
            (Type::Array(n, x), Type::Array(m, y)) => {
                (n.is_none() || m.is_none() || n == m) && self.identical(x, y)
            }
            (Type::Map(k1, v1), Type::Map(k2, v2)) => {
                self.identical(k1, k2) && self.identical(v1, v2)
            }
            (Type::Chan(d1, x), Type::Chan(d2, y)) => d1 == d2 && self.identical(x, y),
            (Type::Func(x), Type::Func(y)) => self.identical_signatures(x, y),
            (Type::Struct(x), Type::Struct(y)) => {
                x.len() == y.len()
                    && x.iter().zip(y).all(|(f, g)| {
                        f.name == g.name && f.embedded == g.embedded && self.identical(&f.ty, &g.ty)
                    })
            }
            (Type::Interface(x), Type::Interface(y)) => {
                x.open
                    || y.open
                    || (x.methods.len() == y.methods.len()
                        && x.methods.iter().zip(&y.methods).all(|(m, n)| {
                            m.name == n.name && self.identical_signatures(&m.sig, &n.sig)
                        }))
            }
            (Type::Tuple(x), Type::Tuple(y)) => {
                x.len() == y.len() && x.iter().zip(y).all(|(a, b)| self.identical(a, b))
            }
            _ => false,
        }
    }

    pub fn identical_signatures(&self, a: &Signature, b: &Signature) -> bool {
        a.variadic == b.variadic
            && a.params.len() == b.params.len()
            && a.results.len() == b.results.len()
            && a.params.iter().zip(&b.params).all(|(x, y)| self.identical(x, y))
            && a.results.iter().zip(&b.results).all(|(x, y)| self.identical(x, y))
    }

    /// Whether values of the type can be compared with `==`.
    pub fn comparable(&self, ty: &Type) -> bool {
        self.comparable_depth(ty, 0)
    }

    fn comparable_depth(&self, ty: &Type, depth: u32) -> bool {
        if depth > 32 {
            return true;
        }
        match self.underlying(ty) {
            Type::Slice(_) | Type::Map(..) | Type::Func(_) => false,
            Type::Array(_, elem) => self.comparable_depth(elem, depth + 1),
            Type::Struct(fields) => fields
                .iter()
                .all(|f| self.comparable_depth(&f.ty, depth + 1)),
            Type::Tuple(_) => false,
            _ => true,
        }
    }

    /// Whether `nil` is a valid value of the type.
    pub fn is_nillable(&self, ty: &Type) -> bool {
        matches!(
            self.underlying(ty),
            Type::Pointer(_)
                | Type::Slice(_)
                | Type::Map(..)
                | Type::Chan(..)
                | Type::Func(_)
                | Type::Interface(_)
                | Type::Unknown
        ) || self.basic_kind(ty) == Some(BasicKind::UntypedNil)
    }

    /// Render a type the way Go prints it.
    pub fn display(&self, ty: &Type) -> String {
        let mut out = String::new();
        let _ = self.write_type(&mut out, ty, 0);
        out
    }

    fn write_type(&self, out: &mut String, ty: &Type, depth: u32) -> fmt::Result {
        if depth > 16 {
            return out.write_str("...");
        }
        match ty {
            Type::Basic(kind) => out.write_str(kind.name()),
            Type::Named(id) => out.write_str(&self.get(*id).name),
            Type::Pointer(elem) => {
                out.write_char('*')?;
                self.write_type(out, elem, depth + 1)
            }
            Type::Slice(elem) => {
                out.write_str("[]")?;
                self.write_type(out, elem, depth + 1)
            }
            Type::Array(len, elem) => {
                match len {
                    Some(n) => write!(out, "[{n}]")?,
                    None => out.write_str("[?]")?,
                }
                self.write_type(out, elem, depth + 1)
            }
            Type::Map(key, value) => {
                out.write_str("map[")?;
                self.write_type(out, key, depth + 1)?;
                out.write_char(']')?;
                self.write_type(out, value, depth + 1)
            }
            Type::Chan(dir, elem) => {
                out.write_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                })?;
                self.write_type(out, elem, depth + 1)
            }
            Type::Func(sig) => {
                out.write_str("func")?;
                self.write_signature(out, sig, depth)
            }
            Type::Struct(fields) => {
                out.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.write_str("; ")?;
                    }
                    if !field.embedded {
                        out.write_str(&field.name)?;
                        out.write_char(' ')?;
                    }
                    self.write_type(out, &field.ty, depth + 1)?;
                }
                out.write_char('}')
            }
            Type::Interface(info) => {
                if info.methods.is_empty() {
                    return out.write_str("interface{}");
                }
                out.write_str("interface{")?;
                for (i, method) in info.methods.iter().enumerate() {
                    if i > 0 {
                        out.write_str("; ")?;
                    }
                    out.write_str(&method.name)?;
                    self.write_signature(out, &method.sig, depth)?;
                }
                out.write_char('}')
            }
            Type::Tuple(types) => {
                out.write_char('(')?;
                self.write_list(out, types, false, depth)?;
                out.write_char(')')
            }
            Type::Unknown => out.write_str("invalid type"),
        }
    }

    fn write_list(&self, out: &mut String, types: &[Type], variadic: bool, depth: u32) -> fmt::Result {
        for (i, ty) in types.iter().enumerate() {
            if i > 0 {
                out.write_str(", ")?;
            }
            match ty {
                Type::Slice(elem) if variadic && i + 1 == types.len() => {
                    out.write_str("...")?;
                    self.write_type(out, elem, depth + 1)?;
                }
                _ => self.write_type(out, ty, depth + 1)?,
            }
        }
        Ok(())
    }

    fn write_signature(&self, out: &mut String, sig: &Signature, depth: u32) -> fmt::Result {
        out.write_char('(')?;
        self.write_list(out, &sig.params, sig.variadic, depth)?;
        out.write_char(')')?;
        match sig.results.as_slice() {
            [] => Ok(()),
            [single] => {
                out.write_char(' ')?;
                self.write_type(out, single, depth + 1)
            }
            many => {
                out.write_str(" (")?;
                self.write_list(out, many, false, depth)?;
                out.write_char(')')
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underlying_looks_through_names() {
        let mut store = TypeStore::new();
        let inner = store.add_named("Inner");
        store.get_mut(inner).underlying = Some(Type::int());
        let outer = store.add_named("Outer");
        store.get_mut(outer).underlying = Some(Type::Named(inner));

        assert_eq!(store.underlying(&Type::Named(outer)), &Type::int());
    }

    #[test]
    fn unresolved_named_type_is_opaque() {
        let mut store = TypeStore::new();
        let id = store.add_named("T");
        assert!(store.is_opaque(&Type::Named(id)));
        let ext = store.add_external("pkg.T");
        assert!(store.get(ext).external);
        assert!(store.is_opaque(&Type::Named(ext)));
    }

    #[test]
    fn identity_is_nominal_for_named_types() {
        let mut store = TypeStore::new();
        let a = store.add_named("A");
        let b = store.add_named("B");
        store.get_mut(a).underlying = Some(Type::int());
        store.get_mut(b).underlying = Some(Type::int());

        assert!(!store.identical(&Type::Named(a), &Type::Named(b)));
        assert!(!store.identical(&Type::Named(a), &Type::int()));
        assert!(store.identical(&Type::slice(Type::Named(a)), &Type::slice(Type::Named(a))));
        assert!(store.identical(&Type::Unknown, &Type::Named(b)));
    }

    #[test]
    fn comparability() {
        let store = TypeStore::new();
        assert!(store.comparable(&Type::int()));
        assert!(!store.comparable(&Type::slice(Type::int())));
        let st = Type::Struct(vec![FieldInfo {
            name: "m".into(),
            ty: Type::Map(Box::new(Type::string()), Box::new(Type::int())),
            embedded: false,
        }]);
        assert!(!store.comparable(&st));
    }

    #[test]
    fn displays_like_go() {
        let mut store = TypeStore::new();
        let item = store.add_named("Item");
        let sig = Signature {
            params: vec![Type::int(), Type::slice(Type::string())],
            results: vec![Type::Named(item), Type::bool()],
            variadic: true,
        };
        assert_eq!(
            store.display(&Type::Func(Box::new(sig))),
            "func(int, ...string) (Item, bool)"
        );
        assert_eq!(
            store.display(&Type::Map(Box::new(Type::string()), Box::new(Type::pointer(Type::Named(item))))),
            "map[string]*Item"
        );
        assert_eq!(store.display(&Type::Basic(BasicKind::UntypedFloat)), "untyped float");
    }
}
