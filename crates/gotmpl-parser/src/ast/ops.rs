//! Operator definitions for Go expressions and statements.
//!
//! Provides enums for binary, unary, and assignment operators along with
//! precedence information for the Pratt parser.

use crate::lexer::TokenKind;
use std::fmt;

/// Binary operators in Go.
///
/// Organized by precedence from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    // Precedence 1
    /// `||`
    LogicalOr,

    // Precedence 2
    /// `&&`
    LogicalAnd,

    // Precedence 3
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    Less,
    /// `<=`
    LessEqual,
    /// `>`
    Greater,
    /// `>=`
    GreaterEqual,

    // Precedence 4
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `|`
    BitOr,
    /// `^`
    BitXor,

    // Precedence 5
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Rem,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `&`
    BitAnd,
    /// `&^`
    AndNot,
}

impl BinaryOp {
    /// Convert a token to a binary operator.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::OrOr => BinaryOp::LogicalOr,
            TokenKind::AndAnd => BinaryOp::LogicalAnd,
            TokenKind::EqEq => BinaryOp::Equal,
            TokenKind::NotEq => BinaryOp::NotEqual,
            TokenKind::Lt => BinaryOp::Less,
            TokenKind::LtEq => BinaryOp::LessEqual,
            TokenKind::Gt => BinaryOp::Greater,
            TokenKind::GtEq => BinaryOp::GreaterEqual,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Pipe => BinaryOp::BitOr,
            TokenKind::Caret => BinaryOp::BitXor,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::Percent => BinaryOp::Rem,
            TokenKind::Shl => BinaryOp::Shl,
            TokenKind::Shr => BinaryOp::Shr,
            TokenKind::Amp => BinaryOp::BitAnd,
            TokenKind::AndNot => BinaryOp::AndNot,
            _ => return None,
        };
        Some(op)
    }

    /// Go precedence level (1 = loosest, 5 = tightest).
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::LogicalOr => 1,
            BinaryOp::LogicalAnd => 2,
            BinaryOp::Equal
            | BinaryOp::NotEqual
            | BinaryOp::Less
            | BinaryOp::LessEqual
            | BinaryOp::Greater
            | BinaryOp::GreaterEqual => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::BitOr | BinaryOp::BitXor => 4,
            BinaryOp::Mul
            | BinaryOp::Div
            | BinaryOp::Rem
            | BinaryOp::Shl
            | BinaryOp::Shr
            | BinaryOp::BitAnd
            | BinaryOp::AndNot => 5,
        }
    }

    /// Get the binding power for Pratt parsing.
    ///
    /// Returns (left_bp, right_bp). All binary operators are left-associative.
    pub fn binding_power(self) -> (u8, u8) {
        let p = self.precedence() * 2;
        (p, p + 1)
    }

    /// Whether this is a comparison operator (result is untyped bool).
    pub fn is_comparison(self) -> bool {
        self.precedence() == 3
    }

    /// Whether this is `&&` or `||`.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::LogicalOr | BinaryOp::LogicalAnd)
    }

    /// Whether this is a shift operator.
    pub fn is_shift(self) -> bool {
        matches!(self, BinaryOp::Shl | BinaryOp::Shr)
    }

    /// Get the string representation of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            BinaryOp::LogicalOr => "||",
            BinaryOp::LogicalAnd => "&&",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
            BinaryOp::Less => "<",
            BinaryOp::LessEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterEqual => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::BitOr => "|",
            BinaryOp::BitXor => "^",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::BitAnd => "&",
            BinaryOp::AndNot => "&^",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Unary prefix operators.
///
/// Dereference (`*x`) is not here; it shares syntax with pointer types and
/// is represented by `Expr::Star`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `+x`
    Plus,
    /// `-x`
    Neg,
    /// `!x`
    Not,
    /// `^x` (bitwise complement)
    BitNot,
    /// `&x`
    Addr,
    /// `<-x`
    Recv,
}

impl UnaryOp {
    /// Convert a token to a unary operator.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Not => UnaryOp::Not,
            TokenKind::Caret => UnaryOp::BitNot,
            TokenKind::Amp => UnaryOp::Addr,
            TokenKind::Arrow => UnaryOp::Recv,
            _ => return None,
        };
        Some(op)
    }

    /// Binding power of the operand; tighter than every binary operator.
    pub fn binding_power() -> u8 {
        12
    }

    /// Get the string representation of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            UnaryOp::Plus => "+",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::BitNot => "^",
            UnaryOp::Addr => "&",
            UnaryOp::Recv => "<-",
        }
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Assignment operators of an assignment statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssignOp {
    /// `=`
    Assign,
    /// `:=`
    Define,
    /// `op=` for a binary operator.
    Compound(BinaryOp),
}

impl AssignOp {
    /// Convert a token to an assignment operator.
    pub fn from_token(kind: TokenKind) -> Option<Self> {
        let op = match kind {
            TokenKind::Assign => AssignOp::Assign,
            TokenKind::Define => AssignOp::Define,
            TokenKind::PlusAssign => AssignOp::Compound(BinaryOp::Add),
            TokenKind::MinusAssign => AssignOp::Compound(BinaryOp::Sub),
            TokenKind::StarAssign => AssignOp::Compound(BinaryOp::Mul),
            TokenKind::SlashAssign => AssignOp::Compound(BinaryOp::Div),
            TokenKind::PercentAssign => AssignOp::Compound(BinaryOp::Rem),
            TokenKind::AmpAssign => AssignOp::Compound(BinaryOp::BitAnd),
            TokenKind::PipeAssign => AssignOp::Compound(BinaryOp::BitOr),
            TokenKind::CaretAssign => AssignOp::Compound(BinaryOp::BitXor),
            TokenKind::ShlAssign => AssignOp::Compound(BinaryOp::Shl),
            TokenKind::ShrAssign => AssignOp::Compound(BinaryOp::Shr),
            TokenKind::AndNotAssign => AssignOp::Compound(BinaryOp::AndNot),
            _ => return None,
        };
        Some(op)
    }
}

impl fmt::Display for AssignOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignOp::Assign => write!(f, "="),
            AssignOp::Define => write!(f, ":="),
            AssignOp::Compound(op) => write!(f, "{op}="),
        }
    }
}

/// Channel direction of a `chan` type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChanDir {
    /// `chan T`
    Both,
    /// `chan<- T`
    Send,
    /// `<-chan T`
    Recv,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_precedence_levels() {
        assert!(BinaryOp::Mul.binding_power().0 > BinaryOp::Add.binding_power().0);
        assert!(BinaryOp::Add.binding_power().0 > BinaryOp::Less.binding_power().0);
        assert!(BinaryOp::Less.binding_power().0 > BinaryOp::LogicalAnd.binding_power().0);
        assert!(BinaryOp::LogicalAnd.binding_power().0 > BinaryOp::LogicalOr.binding_power().0);
        assert!(UnaryOp::binding_power() > BinaryOp::AndNot.binding_power().1);
    }

    #[test]
    fn compound_assign_display() {
        assert_eq!(AssignOp::from_token(TokenKind::AndNotAssign).unwrap().to_string(), "&^=");
        assert_eq!(AssignOp::Define.to_string(), ":=");
    }

    #[test]
    fn caret_is_binary_and_unary() {
        assert_eq!(BinaryOp::from_token(TokenKind::Caret), Some(BinaryOp::BitXor));
        assert_eq!(UnaryOp::from_token(TokenKind::Caret), Some(UnaryOp::BitNot));
    }
}
