//! Unified error types for gotmpl.
//!
//! This module provides a consistent error type hierarchy for the phases
//! that work on Go source: lexing/parsing and semantic checking.
//!
//! ## Error Hierarchy
//!
//! ```text
//! ParseError   - Lexer and parser errors (with ParseErrorKind)
//! ParseErrors  - All parse errors of one file
//! CheckError   - Name resolution and type checking errors
//! CheckErrors  - All checker diagnostics of one package
//! ```
//!
//! Errors carry a [`Span`]; use [`SourceMap::location`] (or the `render`
//! helpers below) to print them as `path:line:col`.

use std::fmt::Write as _;

use thiserror::Error;

use crate::{SourceMap, Span};

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    // Lexical errors
    /// An unexpected character was encountered.
    UnexpectedChar,
    /// A string, rune or raw string literal was not terminated.
    UnterminatedLiteral,
    /// A block comment was not terminated.
    UnterminatedComment,
    /// A numeric literal could not be scanned.
    InvalidNumber,

    // Token-level errors
    /// A specific token was expected but not found.
    ExpectedToken,
    /// An unexpected token was encountered.
    UnexpectedToken,
    /// Unexpected end of file.
    UnexpectedEof,

    // Grammar errors
    /// An expression was expected.
    ExpectedExpression,
    /// A type was expected.
    ExpectedType,
    /// A statement was expected.
    ExpectedStatement,
    /// A declaration was expected.
    ExpectedDeclaration,
    /// An identifier was expected.
    ExpectedIdentifier,
    /// The file does not start with a package clause.
    MissingPackageClause,
    /// Syntax that is valid Go but outside the supported subset.
    Unsupported,
    /// General syntax error.
    InvalidSyntax,
}

impl ParseErrorKind {
    /// Returns a human-readable name for this error kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::UnexpectedChar => "unexpected character",
            ParseErrorKind::UnterminatedLiteral => "unterminated literal",
            ParseErrorKind::UnterminatedComment => "unterminated comment",
            ParseErrorKind::InvalidNumber => "invalid number",
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedDeclaration => "expected declaration",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::MissingPackageClause => "missing package clause",
            ParseErrorKind::Unsupported => "unsupported syntax",
            ParseErrorKind::InvalidSyntax => "invalid syntax",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    /// The category of this error.
    pub kind: ParseErrorKind,
    /// The source location where the error occurred.
    pub span: Span,
    /// A detailed error message.
    pub message: String,
}

impl ParseError {
    /// Create a new parse error.
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create an "expected token" error.
    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    /// Create an "expected identifier" error.
    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    /// Create an "expected expression" error.
    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    /// Create an "expected type" error.
    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found {found}"),
        )
    }

    /// Format the error with source context for display.
    ///
    /// Shows the relevant source line with a caret under the error location.
    pub fn display_with_source(&self, map: &SourceMap) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "{}: {}", map.location(self.span), self.kind);
        if !self.message.is_empty() {
            let _ = writeln!(output, "  {}", self.message);
        }

        if let Some(line_text) = map.line_text(self.span.file, self.span.line) {
            let _ = writeln!(output, "  |");
            let _ = writeln!(output, "{:>3} | {}", self.span.line, line_text);
            let indent = " ".repeat(self.span.col.saturating_sub(1) as usize);
            let pointer = if self.span.len <= 1 {
                "^".to_string()
            } else {
                "^".to_string() + &"~".repeat((self.span.len - 1) as usize)
            };
            let _ = writeln!(output, "  | {indent}{pointer}");
        }

        output
    }
}

/// A collection of parse errors.
///
/// The parser keeps going after an error when it can resynchronize, so one
/// file may report several errors at once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseErrors {
    errors: Vec<ParseError>,
}

impl std::fmt::Display for ParseErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.errors.first() {
            Some(first) if self.errors.len() == 1 => write!(f, "{first}"),
            Some(first) => write!(f, "{first} (and {} more)", self.errors.len() - 1),
            None => write!(f, "no parse errors"),
        }
    }
}

impl std::error::Error for ParseErrors {}

impl ParseErrors {
    /// Create a new empty error collection.
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Add an error to the collection.
    pub fn push(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &ParseError> {
        self.errors.iter()
    }

    /// Convert to a Vec of errors.
    pub fn into_vec(self) -> Vec<ParseError> {
        self.errors
    }

    /// Render every error with source context.
    pub fn render(&self, map: &SourceMap) -> String {
        self.errors
            .iter()
            .map(|e| e.display_with_source(map))
            .collect()
    }
}

impl IntoIterator for ParseErrors {
    type Item = ParseError;
    type IntoIter = std::vec::IntoIter<ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ParseErrors {
    type Item = &'a ParseError;
    type IntoIter = std::slice::Iter<'a, ParseError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<ParseError> for ParseErrors {
    fn from(error: ParseError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

// ============================================================================
// Check Errors
// ============================================================================

/// Errors found while resolving names and checking types.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CheckError {
    /// A referenced name is not declared in any enclosing scope.
    #[error("at {span}: undeclared name '{name}'")]
    UndeclaredName {
        /// The name that wasn't found.
        name: String,
        /// Where it was referenced.
        span: Span,
    },

    /// A name was declared twice in the same scope.
    #[error("at {span}: '{name}' redeclared in this block (previous declaration at {previous})")]
    Redeclared {
        /// The duplicated name.
        name: String,
        /// Where the duplicate was declared.
        span: Span,
        /// Where the name was first declared.
        previous: Span,
    },

    /// Files of one package disagree on the package name.
    #[error("at {span}: package {found}; expected {expected}")]
    PackageMismatch {
        /// Name found in the offending file.
        found: String,
        /// Name of the first checked file.
        expected: String,
        /// Package clause location.
        span: Span,
    },

    /// A name or expression was used where a type is required.
    #[error("at {span}: {what} is not a type")]
    NotAType {
        /// Description of the offending operand.
        what: String,
        /// Where it was used.
        span: Span,
    },

    /// A type, package or builtin was used where a value is required.
    #[error("at {span}: {what} is not an expression")]
    NotAnExpression {
        /// Description of the offending operand.
        what: String,
        /// Where it was used.
        span: Span,
    },

    /// An operator is not defined on its operand type(s).
    #[error("at {span}: invalid operation: {message}")]
    InvalidOperation {
        /// Description of what's invalid.
        message: String,
        /// Where the operation occurred.
        span: Span,
    },

    /// A value cannot be used where another type is expected.
    #[error("at {span}: {message}")]
    TypeMismatch {
        /// Description of the mismatch.
        message: String,
        /// Where the mismatch occurred.
        span: Span,
    },

    /// Wrong number of call arguments.
    #[error("at {span}: {} arguments in call to {callee}: have {got}, want {expected}", if .got < .expected { "not enough" } else { "too many" })]
    ArgumentCount {
        /// Callee description.
        callee: String,
        /// Number of parameters.
        expected: usize,
        /// Number of arguments.
        got: usize,
        /// Call location.
        span: Span,
    },

    /// Wrong number of returned values.
    #[error("at {span}: {} return values: have {got}, want {expected}", if .got < .expected { "not enough" } else { "too many" })]
    ReturnCount {
        /// Number of results in the signature.
        expected: usize,
        /// Number of returned values.
        got: usize,
        /// Return statement location.
        span: Span,
    },

    /// Wrong number of values on one side of an assignment.
    #[error("at {span}: assignment mismatch: {lhs} variable(s) but {rhs} value(s)")]
    AssignmentCount {
        /// Number of assigned operands.
        lhs: usize,
        /// Number of values.
        rhs: usize,
        /// Statement location.
        span: Span,
    },

    /// A non-function value was called.
    #[error("at {span}: cannot call non-function {what}")]
    NotCallable {
        /// Description of the callee.
        what: String,
        /// Call location.
        span: Span,
    },

    /// Selector names no field or method of the operand type.
    #[error("at {span}: {ty} has no field or method {name}")]
    UnknownField {
        /// Operand type.
        ty: String,
        /// Selected name.
        name: String,
        /// Selector location.
        span: Span,
    },

    /// `:=` without any new variable on the left.
    #[error("at {span}: no new variables on left side of :=")]
    NoNewVariables {
        /// Statement location.
        span: Span,
    },

    /// Assignment to something that is not addressable.
    #[error("at {span}: cannot assign to {what}")]
    NotAssignable {
        /// Description of the target.
        what: String,
        /// Target location.
        span: Span,
    },

    /// A conversion between incompatible types.
    #[error("at {span}: cannot convert {from} to type {to}")]
    InvalidConversion {
        /// Source type.
        from: String,
        /// Target type.
        to: String,
        /// Conversion location.
        span: Span,
    },

    /// A generic checker error.
    #[error("at {span}: {message}")]
    Other {
        /// The error message.
        message: String,
        /// Where the error occurred.
        span: Span,
    },
}

impl CheckError {
    /// Get the span where this error occurred.
    pub fn span(&self) -> Span {
        match self {
            CheckError::UndeclaredName { span, .. } => *span,
            CheckError::Redeclared { span, .. } => *span,
            CheckError::PackageMismatch { span, .. } => *span,
            CheckError::NotAType { span, .. } => *span,
            CheckError::NotAnExpression { span, .. } => *span,
            CheckError::InvalidOperation { span, .. } => *span,
            CheckError::TypeMismatch { span, .. } => *span,
            CheckError::ArgumentCount { span, .. } => *span,
            CheckError::ReturnCount { span, .. } => *span,
            CheckError::AssignmentCount { span, .. } => *span,
            CheckError::NotCallable { span, .. } => *span,
            CheckError::UnknownField { span, .. } => *span,
            CheckError::NoNewVariables { span } => *span,
            CheckError::NotAssignable { span, .. } => *span,
            CheckError::InvalidConversion { span, .. } => *span,
            CheckError::Other { span, .. } => *span,
        }
    }
}

/// All diagnostics produced by one semantic check.
#[derive(Debug, Clone, Default, PartialEq, Error)]
#[error("type check failed with {} error(s)", .errors.len())]
pub struct CheckErrors {
    errors: Vec<CheckError>,
}

impl CheckErrors {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn push(&mut self, error: CheckError) {
        self.errors.push(error);
    }

    /// Check if there are any errors.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Get the number of errors.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Iterate over the errors.
    pub fn iter(&self) -> impl Iterator<Item = &CheckError> {
        self.errors.iter()
    }

    /// Sort diagnostics by position so output does not depend on check order.
    pub fn sort(&mut self) {
        self.errors
            .sort_by_key(|e| (e.span().file, e.span().line, e.span().col));
    }

    /// Render every error as `path:line:col: message`, one per line.
    pub fn render(&self, map: &SourceMap) -> String {
        let mut output = String::new();
        for error in &self.errors {
            let message = error.to_string();
            let message = message
                .split_once(": ")
                .map(|(_, rest)| rest)
                .unwrap_or(message.as_str());
            let _ = writeln!(output, "{}: {}", map.location(error.span()), message);
        }
        output
    }
}

impl IntoIterator for CheckErrors {
    type Item = CheckError;
    type IntoIter = std::vec::IntoIter<CheckError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a CheckErrors {
    type Item = &'a CheckError;
    type IntoIter = std::slice::Iter<'a, CheckError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl From<CheckError> for CheckErrors {
    fn from(error: CheckError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileId;

    #[test]
    fn parse_error_display() {
        let err = ParseError::expected_token(Span::new(FileId(0), 3, 7, 1), "'{'", "';'");
        assert_eq!(err.to_string(), "expected token at 3:7: expected '{', found ';'");
    }

    #[test]
    fn parse_error_with_source() {
        let mut map = SourceMap::new();
        let file = map.add_file("t.go", "package t\n\nfunc f( {\n");
        let err = ParseError::expected_identifier(Span::new(file, 3, 9, 1), "'{'");
        let rendered = err.display_with_source(&map);
        assert!(rendered.starts_with("t.go:3:9: expected identifier"));
        assert!(rendered.contains("  3 | func f( {"));
        assert!(rendered.contains("  |         ^"));
    }

    #[test]
    fn argument_count_wording() {
        let span = Span::new(FileId(0), 1, 1, 1);
        let few = CheckError::ArgumentCount {
            callee: "f".into(),
            expected: 2,
            got: 1,
            span,
        };
        let many = CheckError::ArgumentCount {
            callee: "f".into(),
            expected: 1,
            got: 2,
            span,
        };
        assert!(few.to_string().contains("not enough arguments"));
        assert!(many.to_string().contains("too many arguments"));
    }

    #[test]
    fn check_errors_render_sorted() {
        let mut map = SourceMap::new();
        let file = map.add_file("a.go", "package a\n");
        let mut errors = CheckErrors::new();
        errors.push(CheckError::UndeclaredName {
            name: "y".into(),
            span: Span::new(file, 9, 2, 1),
        });
        errors.push(CheckError::UndeclaredName {
            name: "x".into(),
            span: Span::new(file, 4, 5, 1),
        });
        errors.sort();

        let rendered = errors.render(&map);
        let lines: Vec<_> = rendered.lines().collect();
        assert_eq!(lines[0], "a.go:4:5: undeclared name 'x'");
        assert_eq!(lines[1], "a.go:9:2: undeclared name 'y'");
    }
}
