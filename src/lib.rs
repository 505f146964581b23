//! gotmpl
//!
//! Instantiates Go template packages: placeholder type names are replaced by
//! concrete types directly on the syntax tree, the result is type-checked,
//! and only then written out as a new package or as prefixed files next to
//! existing sources.
//!
//! ## Pipeline
//!
//! ```text
//! load ─▶ rewrite ─▶ stabilize ─▶ (stubs) ─▶ validate ─▶ emit
//! ```
//!
//! - [`loader`]: parse every non-test `.go` file and resolve the batch
//! - [`rewrite`]: package rename, alias removal, substitution, prefixing
//! - [`stabilize`]: rebuild bindings for the rewritten trees
//! - [`stubs`]: sibling type names for same-directory validation
//! - [`validate`]: whole-package type check with a diagnostic dump
//! - [`emit`]: staged commit of the printed files
//!
//! # Example
//!
//! ```no_run
//! use gotmpl::{Environment, Generator, Options, TypeSubstitutionMap};
//!
//! let map = TypeSubstitutionMap::from_bindings(["Item=MyRecord@extpkg"])?;
//! let generator = Generator::new(Environment::from_process(), Options::from_current_dir()?);
//! let report = generator.run("./templates/list", "records", &map)?;
//! println!("wrote {} files", report.written.len());
//! # Ok::<(), gotmpl::GenerateError>(())
//! ```

pub mod config;
pub mod emit;
pub mod error;
pub mod loader;
pub mod package;
pub mod pipeline;
pub mod rewrite;
pub mod stabilize;
pub mod stubs;
pub mod substitution;
pub mod validate;

pub use config::{Destination, EmitMode, Environment, Options, StabilizeMode};
pub use error::{GenerateError, Result};
pub use package::{LoadedPackage, RewrittenPackage, SourceUnit, StablePackage};
pub use pipeline::{Generator, Report};
pub use rewrite::Rewriter;
pub use substitution::{Target, TypeSubstitutionMap, parse_binding};
