//! Name resolution.
//!
//! Builds the explicit symbol table that rewrites consult: every
//! declaration gets a stable [`DeclId`], and every identifier occurrence
//! is mapped to a [`Binding`].

mod resolver;
mod scope;
mod table;

pub use resolver::{ResolveOutput, resolve_package};
pub use scope::LocalScopes;
pub use table::{Binding, DeclId, DeclInfo, DeclKind, DeclScope, ResolutionTable};
