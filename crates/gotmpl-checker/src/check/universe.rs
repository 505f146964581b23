//! Predeclared identifiers of the universe scope.

use super::types::{BasicKind, InterfaceInfo, MethodInfo, Signature, Type};

/// Predeclared functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Append,
    Cap,
    Clear,
    Close,
    Complex,
    Copy,
    Delete,
    Imag,
    Len,
    Make,
    Max,
    Min,
    New,
    Panic,
    Print,
    Println,
    Real,
    Recover,
}

impl Builtin {
    pub fn name(self) -> &'static str {
        match self {
            Builtin::Append => "append",
            Builtin::Cap => "cap",
            Builtin::Clear => "clear",
            Builtin::Close => "close",
            Builtin::Complex => "complex",
            Builtin::Copy => "copy",
            Builtin::Delete => "delete",
            Builtin::Imag => "imag",
            Builtin::Len => "len",
            Builtin::Make => "make",
            Builtin::Max => "max",
            Builtin::Min => "min",
            Builtin::New => "new",
            Builtin::Panic => "panic",
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Real => "real",
            Builtin::Recover => "recover",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        let builtin = match name {
            "append" => Builtin::Append,
            "cap" => Builtin::Cap,
            "clear" => Builtin::Clear,
            "close" => Builtin::Close,
            "complex" => Builtin::Complex,
            "copy" => Builtin::Copy,
            "delete" => Builtin::Delete,
            "imag" => Builtin::Imag,
            "len" => Builtin::Len,
            "make" => Builtin::Make,
            "max" => Builtin::Max,
            "min" => Builtin::Min,
            "new" => Builtin::New,
            "panic" => Builtin::Panic,
            "print" => Builtin::Print,
            "println" => Builtin::Println,
            "real" => Builtin::Real,
            "recover" => Builtin::Recover,
            _ => return None,
        };
        Some(builtin)
    }
}

/// What a predeclared identifier denotes.
#[derive(Debug, Clone, PartialEq)]
pub enum Predeclared {
    Type(Type),
    /// `true`, `false`, `iota`.
    Const(BasicKind),
    Nil,
    Builtin(Builtin),
}

fn basic_type(name: &str) -> Option<BasicKind> {
    let kind = match name {
        "bool" => BasicKind::Bool,
        "int" => BasicKind::Int,
        "int8" => BasicKind::Int8,
        "int16" => BasicKind::Int16,
        "int32" | "rune" => BasicKind::Int32,
        "int64" => BasicKind::Int64,
        "uint" => BasicKind::Uint,
        "uint8" | "byte" => BasicKind::Uint8,
        "uint16" => BasicKind::Uint16,
        "uint32" => BasicKind::Uint32,
        "uint64" => BasicKind::Uint64,
        "uintptr" => BasicKind::Uintptr,
        "float32" => BasicKind::Float32,
        "float64" => BasicKind::Float64,
        "complex64" => BasicKind::Complex64,
        "complex128" => BasicKind::Complex128,
        "string" => BasicKind::String,
        _ => return None,
    };
    Some(kind)
}

/// The predeclared `error` interface.
pub fn error_type() -> Type {
    Type::Interface(Box::new(InterfaceInfo {
        methods: vec![MethodInfo {
            name: "Error".to_string(),
            sig: Signature {
                params: Vec::new(),
                results: vec![Type::string()],
                variadic: false,
            },
        }],
        open: false,
    }))
}

/// Look up a predeclared identifier.
pub fn lookup(name: &str) -> Option<Predeclared> {
    if let Some(kind) = basic_type(name) {
        return Some(Predeclared::Type(Type::Basic(kind)));
    }
    let found = match name {
        "error" => Predeclared::Type(error_type()),
        "any" => Predeclared::Type(Type::empty_interface()),
        // Constraint interfaces are opaque here.
        "comparable" => Predeclared::Type(Type::Unknown),
        "true" | "false" => Predeclared::Const(BasicKind::UntypedBool),
        "iota" => Predeclared::Const(BasicKind::UntypedInt),
        "nil" => Predeclared::Nil,
        other => Predeclared::Builtin(Builtin::from_name(other)?),
    };
    Some(found)
}

/// Whether `name` is declared in the universe scope.
pub fn is_predeclared(name: &str) -> bool {
    lookup(name).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_share_their_basic_type() {
        assert_eq!(lookup("byte"), lookup("uint8"));
        assert_eq!(lookup("rune"), Some(Predeclared::Type(Type::Basic(BasicKind::Int32))));
    }

    #[test]
    fn recognizes_every_category() {
        assert!(matches!(lookup("append"), Some(Predeclared::Builtin(Builtin::Append))));
        assert!(matches!(lookup("nil"), Some(Predeclared::Nil)));
        assert!(matches!(lookup("iota"), Some(Predeclared::Const(_))));
        assert!(matches!(lookup("error"), Some(Predeclared::Type(Type::Interface(_)))));
        assert!(!is_predeclared("Item"));
        assert!(!is_predeclared("fmt"));
    }
}
