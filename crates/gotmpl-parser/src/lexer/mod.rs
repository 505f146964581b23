//! Lexical analysis for Go source.

mod cursor;
mod lexer;
mod token;

pub use lexer::{Comment, Lexer};
pub use token::{Token, TokenKind, lookup_keyword};
