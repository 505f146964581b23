//! Expression AST nodes.
//!
//! Go spells types with expression syntax (`*T`, `[]T`, `pkg.T`), so type
//! literals are expression variants too. Whether a given expression denotes
//! a type or a value is decided by name resolution, not by the parser.

use super::node::Ident;
use super::ops::{BinaryOp, ChanDir, UnaryOp};
use super::stmt::Block;
use gotmpl_core::Span;

/// An expression (or type expression).
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Identifier: `x`, `int`
    Ident(Ident),
    /// Basic literal: `42`, `"s"`, `'c'`
    BasicLit(BasicLit),
    /// Composite literal: `T{a, b}`, `map[K]V{k: v}`
    CompositeLit(Box<CompositeLit>),
    /// Function literal: `func(x int) int { ... }`
    FuncLit(Box<FuncLit>),
    /// Parenthesized expression: `(x)`
    Paren(Box<ParenExpr>),
    /// Selector: `x.f`, `pkg.Name`
    Selector(Box<SelectorExpr>),
    /// Index: `x[i]`
    Index(Box<IndexExpr>),
    /// Slice: `x[lo:hi]`, `x[lo:hi:max]`
    Slice(Box<SliceExpr>),
    /// Type assertion: `x.(T)`, `x.(type)` in a type switch
    TypeAssert(Box<TypeAssertExpr>),
    /// Call or conversion: `f(x)`, `T(x)`
    Call(Box<CallExpr>),
    /// Dereference or pointer type: `*x`
    Star(Box<StarExpr>),
    /// Unary expression: `-x`, `&x`, `<-ch`
    Unary(Box<UnaryExpr>),
    /// Binary expression: `a + b`
    Binary(Box<BinaryExpr>),
    /// Key-value pair inside a composite literal: `k: v`
    KeyValue(Box<KeyValueExpr>),
    /// `...T` in a variadic parameter, or `[...]` array length
    Ellipsis(Box<EllipsisExpr>),

    // Type literals
    /// `[N]T` or `[]T`
    ArrayType(Box<ArrayType>),
    /// `struct { ... }`
    StructType(Box<StructType>),
    /// `func(...) ...`
    FuncType(Box<FuncType>),
    /// `interface { ... }`
    InterfaceType(Box<InterfaceType>),
    /// `map[K]V`
    MapType(Box<MapType>),
    /// `chan T`, `chan<- T`, `<-chan T`
    ChanType(Box<ChanType>),
}

impl Expr {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Expr::Ident(e) => e.span,
            Expr::BasicLit(e) => e.span,
            Expr::CompositeLit(e) => e.span,
            Expr::FuncLit(e) => e.span,
            Expr::Paren(e) => e.span,
            Expr::Selector(e) => e.span,
            Expr::Index(e) => e.span,
            Expr::Slice(e) => e.span,
            Expr::TypeAssert(e) => e.span,
            Expr::Call(e) => e.span,
            Expr::Star(e) => e.span,
            Expr::Unary(e) => e.span,
            Expr::Binary(e) => e.span,
            Expr::KeyValue(e) => e.span,
            Expr::Ellipsis(e) => e.span,
            Expr::ArrayType(e) => e.span,
            Expr::StructType(e) => e.span,
            Expr::FuncType(e) => e.span,
            Expr::InterfaceType(e) => e.span,
            Expr::MapType(e) => e.span,
            Expr::ChanType(e) => e.span,
        }
    }

    /// The identifier, if this expression is a bare identifier.
    pub fn as_ident(&self) -> Option<&Ident> {
        match self {
            Expr::Ident(ident) => Some(ident),
            _ => None,
        }
    }

    /// Strip any number of enclosing parentheses.
    pub fn unparen(&self) -> &Expr {
        let mut expr = self;
        while let Expr::Paren(paren) = expr {
            expr = &paren.expr;
        }
        expr
    }
}

/// Kind of a basic literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LitKind {
    /// Integer literal.
    Int,
    /// Floating-point literal.
    Float,
    /// Imaginary literal.
    Imag,
    /// Rune literal.
    Char,
    /// Interpreted or raw string literal.
    String,
}

/// A basic literal; `value` is the source text including quotes.
#[derive(Debug, Clone, PartialEq)]
pub struct BasicLit {
    pub kind: LitKind,
    pub value: String,
    pub span: Span,
}

/// `Type{elts}`; `ty` is `None` for elided types inside an outer literal.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositeLit {
    pub ty: Option<Expr>,
    pub elts: Vec<Expr>,
    pub span: Span,
}

/// An anonymous function.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncLit {
    pub ty: FuncType,
    pub body: Block,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParenExpr {
    pub expr: Expr,
    pub span: Span,
}

/// `x.sel`; the selected name is never resolved on its own.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectorExpr {
    pub expr: Expr,
    pub sel: Ident,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndexExpr {
    pub expr: Expr,
    pub index: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SliceExpr {
    pub expr: Expr,
    pub low: Option<Expr>,
    pub high: Option<Expr>,
    pub max: Option<Expr>,
    /// Whether the three-index form `x[a:b:c]` was used.
    pub slice3: bool,
    pub span: Span,
}

/// `x.(T)`; `ty` is `None` for `x.(type)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeAssertExpr {
    pub expr: Expr,
    pub ty: Option<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    pub func: Expr,
    pub args: Vec<Expr>,
    /// Whether the last argument is followed by `...`.
    pub has_ellipsis: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StarExpr {
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    pub op: UnaryOp,
    pub expr: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    pub left: Expr,
    pub op: BinaryOp,
    pub right: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct KeyValueExpr {
    pub key: Expr,
    pub value: Expr,
    pub span: Span,
}

/// `...elt`; `elt` is `None` for the `[...]T` array length.
#[derive(Debug, Clone, PartialEq)]
pub struct EllipsisExpr {
    pub elt: Option<Expr>,
    pub span: Span,
}

/// `[len]elt`; `len` is `None` for a slice type.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayType {
    pub len: Option<Expr>,
    pub elt: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructType {
    pub fields: Vec<Field>,
    pub span: Span,
}

/// A function signature.
#[derive(Debug, Clone, PartialEq)]
pub struct FuncType {
    pub params: Vec<Field>,
    pub results: Vec<Field>,
    pub span: Span,
}

impl FuncType {
    /// Number of parameters, counting each name of a grouped field.
    pub fn param_count(&self) -> usize {
        self.params.iter().map(Field::arity).sum()
    }

    /// Number of results, counting each name of a grouped field.
    pub fn result_count(&self) -> usize {
        self.results.iter().map(Field::arity).sum()
    }

    /// Whether the last parameter is variadic.
    pub fn is_variadic(&self) -> bool {
        matches!(self.params.last(), Some(Field { ty: Expr::Ellipsis(_), .. }))
    }
}

/// Interface body: method specs (named fields with a `FuncType`) and
/// embedded types (unnamed fields).
#[derive(Debug, Clone, PartialEq)]
pub struct InterfaceType {
    pub methods: Vec<Field>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapType {
    pub key: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChanType {
    pub dir: ChanDir,
    pub value: Expr,
    pub span: Span,
}

/// A field of a struct, parameter list, result list, or interface.
///
/// Unnamed fields are embedded struct fields, unnamed parameters, or
/// embedded interfaces.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub names: Vec<Ident>,
    pub ty: Expr,
    /// Struct tag literal.
    pub tag: Option<BasicLit>,
    pub span: Span,
}

impl Field {
    /// Number of entities this field declares (at least one).
    pub fn arity(&self) -> usize {
        self.names.len().max(1)
    }
}
