//! gotmpl checker
//!
//! Semantic analysis of one Go package made of already parsed files.
//!
//! ## Architecture
//!
//! - **Resolution**: every identifier occurrence is bound to a declaration,
//!   the universe, or nothing. Rewrites consult the resulting
//!   [`ResolutionTable`] instead of guessing from names.
//! - **Checking**: a two-pass type checker (registration, then bodies)
//!   that reports every error of the package at once.
//!
//! ## Modules
//!
//! - [`resolve`]: scopes, bindings and the resolution table
//! - [`check`]: types, the importer seam and the checker itself

pub mod check;
pub mod resolve;

pub use check::{
    Importer, OpaqueImporter, PackageSource, SourceImporter, Type, TypeStore, check_package,
};
pub use resolve::{
    Binding, DeclId, DeclInfo, DeclKind, DeclScope, ResolutionTable, ResolveOutput,
    resolve_package,
};
