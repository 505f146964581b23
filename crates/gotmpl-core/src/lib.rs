//! gotmpl core types.
//!
//! Shared by every crate of the workspace:
//! - [`Span`] and [`FileId`] for source locations
//! - [`SourceMap`], the position/file registry of one run
//! - Parse and check error types

mod error;
mod source_map;
mod span;

pub use error::{CheckError, CheckErrors, ParseError, ParseErrorKind, ParseErrors};
pub use source_map::{Location, SourceFile, SourceMap};
pub use span::{FileId, Span};
