//! gotmpl parser crate.
//!
//! This crate provides the lexer, parser and printer for the Go subset that
//! template packages are written in. It includes:
//! - Lexical analysis with automatic semicolon insertion
//! - An owned, mutable Abstract Syntax Tree (AST)
//! - Parser for transforming tokens into AST
//! - Visitors for read-only and mutating traversal
//! - A canonical printer
//!
//! # Example
//!
//! ```
//! use gotmpl_core::SourceMap;
//! use gotmpl_parser::{parse_file, printer};
//!
//! let mut map = SourceMap::new();
//! let file = parse_file(&mut map, "item.go", "package tmpl\ntype Item int\n").unwrap();
//! assert_eq!(printer::print_file(&file), "package tmpl\n\ntype Item int\n");
//! ```

// Lexer module
pub mod lexer;

// AST module
pub mod ast;

pub mod printer;

use gotmpl_core::{FileId, SourceMap};
use std::path::PathBuf;

// Re-export commonly used types at crate root
pub use ast::Parser;
pub use lexer::{Lexer, Token, TokenKind};

/// Register `text` in the source map under `path` and parse it.
pub fn parse_file(
    map: &mut SourceMap,
    path: impl Into<PathBuf>,
    text: impl Into<String>,
) -> Result<ast::File, ast::ParseErrors> {
    let id = map.add_file(path, text);
    let source = map.text(id).unwrap_or_default();
    Parser::parse_file(source, id)
}

/// Parse a standalone snippet that is not registered anywhere.
///
/// Spans point into file `0`; intended for tests and doc examples.
pub fn parse_source(text: &str) -> Result<ast::File, ast::ParseErrors> {
    Parser::parse_file(text, FileId(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_file_registers_source() {
        let mut map = SourceMap::new();
        let file = parse_file(&mut map, "a.go", "package a\n").unwrap();
        assert_eq!(file.id, FileId(0));
        assert_eq!(map.text(file.id), Some("package a\n"));
    }

    #[test]
    fn parse_errors_carry_file_id() {
        let mut map = SourceMap::new();
        map.add_file("first.go", "package a\n");
        let errors = parse_file(&mut map, "second.go", "package a\n\nfunc (\n").unwrap_err();
        assert!(errors.iter().all(|e| e.span.file == FileId(1)));
    }
}
