//! Abstract Syntax Tree (AST) for Go source files.
//!
//! This module provides:
//! - AST node definitions for the Go constructs a template package uses
//! - Parser for transforming tokens into AST
//! - Visitor traits for read-only and mutating traversal
//!
//! # Example
//!
//! ```
//! use gotmpl_core::FileId;
//! use gotmpl_parser::ast::Parser;
//!
//! let source = "package tmpl\n\ntype Item int\n\nfunc Zero() Item { return 0 }\n";
//!
//! match Parser::parse_file(source, FileId(0)) {
//!     Ok(file) => println!("parsed {} declarations", file.decls.len()),
//!     Err(errors) => eprintln!("parse errors: {}", errors),
//! }
//! ```

// Core types
pub mod node;
pub mod ops;

mod parser;
mod type_parser;

pub mod expr;
mod expr_parser;

pub mod stmt;
mod stmt_parser;

pub mod decl;
mod decl_parser;

pub mod visitor;

// Re-export error types from core
pub use gotmpl_core::{ParseError, ParseErrorKind, ParseErrors};

pub use decl::*;
pub use expr::*;
pub use node::*;
pub use ops::*;
pub use parser::Parser;
pub use stmt::*;
