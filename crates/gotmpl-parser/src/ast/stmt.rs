//! Statement AST nodes.

use super::decl::Decl;
use super::expr::Expr;
use super::node::Ident;
use super::ops::AssignOp;
use gotmpl_core::Span;

/// A statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    /// Local `var`, `const` or `type` declaration
    Decl(Decl),
    /// Labeled statement: `L: stmt`
    Labeled(Box<LabeledStmt>),
    /// Expression statement: `f(x)`
    Expr(Expr),
    /// Channel send: `ch <- v`
    Send(Box<SendStmt>),
    /// `x++` / `x--`
    IncDec(Box<IncDecStmt>),
    /// Assignment or short variable declaration
    Assign(Box<AssignStmt>),
    /// `go f()`
    Go(Box<CallStmt>),
    /// `defer f()`
    Defer(Box<CallStmt>),
    /// `return a, b`
    Return(ReturnStmt),
    /// `break`, `continue`, `goto`, `fallthrough`
    Branch(BranchStmt),
    /// `{ ... }`
    Block(Block),
    /// `if init; cond { } else { }`
    If(Box<IfStmt>),
    /// Expression switch
    Switch(Box<SwitchStmt>),
    /// Type switch
    TypeSwitch(Box<TypeSwitchStmt>),
    /// `select { ... }`
    Select(Box<SelectStmt>),
    /// Three-clause, condition-only, or infinite `for`
    For(Box<ForStmt>),
    /// `for k, v := range x`
    Range(Box<RangeStmt>),
    /// Empty statement (stray `;`)
    Empty(Span),
}

impl Stmt {
    /// Get the span of this statement.
    pub fn span(&self) -> Span {
        match self {
            Stmt::Decl(d) => d.span(),
            Stmt::Labeled(s) => s.span,
            Stmt::Expr(e) => e.span(),
            Stmt::Send(s) => s.span,
            Stmt::IncDec(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Go(s) | Stmt::Defer(s) => s.span,
            Stmt::Return(s) => s.span,
            Stmt::Branch(s) => s.span,
            Stmt::Block(b) => b.span,
            Stmt::If(s) => s.span,
            Stmt::Switch(s) => s.span,
            Stmt::TypeSwitch(s) => s.span,
            Stmt::Select(s) => s.span,
            Stmt::For(s) => s.span,
            Stmt::Range(s) => s.span,
            Stmt::Empty(span) => *span,
        }
    }
}

/// A braced statement list.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LabeledStmt {
    pub label: Ident,
    pub stmt: Stmt,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SendStmt {
    pub chan: Expr,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncDecStmt {
    pub expr: Expr,
    /// `true` for `++`.
    pub inc: bool,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignStmt {
    pub lhs: Vec<Expr>,
    pub op: AssignOp,
    pub rhs: Vec<Expr>,
    pub span: Span,
}

/// Operand of `go` and `defer`; always a call expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CallStmt {
    pub call: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReturnStmt {
    pub results: Vec<Expr>,
    pub span: Span,
}

/// Kind of a branch statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BranchKind {
    Break,
    Continue,
    Goto,
    Fallthrough,
}

impl BranchKind {
    /// The keyword spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            BranchKind::Break => "break",
            BranchKind::Continue => "continue",
            BranchKind::Goto => "goto",
            BranchKind::Fallthrough => "fallthrough",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BranchStmt {
    pub kind: BranchKind,
    pub label: Option<Ident>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IfStmt {
    pub init: Option<Stmt>,
    pub cond: Expr,
    pub then: Block,
    /// Either a `Stmt::Block` or a nested `Stmt::If`.
    pub els: Option<Stmt>,
    pub span: Span,
}

/// A `case` or `default` clause of a switch.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseClause {
    /// Case expressions (or types in a type switch); `None` for `default`.
    pub list: Option<Vec<Expr>>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SwitchStmt {
    pub init: Option<Stmt>,
    pub tag: Option<Expr>,
    pub clauses: Vec<CaseClause>,
    pub span: Span,
}

/// `switch [init;] [v :=] x.(type) { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSwitchStmt {
    pub init: Option<Stmt>,
    /// The symbol bound in each clause, if any.
    pub binding: Option<Ident>,
    /// Operand of the `.(type)` guard.
    pub expr: Expr,
    pub clauses: Vec<CaseClause>,
    pub span: Span,
}

/// A `case` or `default` clause of a select.
#[derive(Debug, Clone, PartialEq)]
pub struct CommClause {
    /// Send or receive statement; `None` for `default`.
    pub comm: Option<Stmt>,
    pub body: Vec<Stmt>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelectStmt {
    pub clauses: Vec<CommClause>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForStmt {
    pub init: Option<Stmt>,
    pub cond: Option<Expr>,
    pub post: Option<Stmt>,
    pub body: Block,
    pub span: Span,
}

/// `for [key[, value] (:= | =)] range expr { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct RangeStmt {
    pub key: Option<Expr>,
    pub value: Option<Expr>,
    /// Whether the iteration variables are declared with `:=`.
    pub define: bool,
    pub expr: Expr,
    pub body: Block,
    pub span: Span,
}
