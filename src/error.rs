//! Errors of one generation run.
//!
//! Every error is fatal to the run; nothing is retried.

use std::io;
use std::path::PathBuf;

use gotmpl_core::{CheckErrors, ParseErrors};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GenerateError>;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// Missing environment value, bad destination or bad binding.
    #[error("configuration error: {0}")]
    Config(String),

    /// Listing, reading, writing or renaming failed.
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// A template or sibling file does not parse.
    #[error("failed to parse {}:\n{rendered}", .path.display())]
    Parse {
        path: PathBuf,
        errors: ParseErrors,
        /// The errors rendered with source context.
        rendered: String,
    },

    /// The rewritten package does not type-check. The diagnostic dump has
    /// already been written when this is returned.
    #[error(transparent)]
    Check(CheckErrors),

    /// The template directory holds no non-test `.go` file.
    #[error("no Go source files in {}", .path.display())]
    NoSources { path: PathBuf },
}

impl GenerateError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        GenerateError::Config(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        GenerateError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Attach a path to I/O results.
pub(crate) trait IoResultExt<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at(self, path: impl Into<PathBuf>) -> Result<T> {
        self.map_err(|source| GenerateError::io(path, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_name_the_path() {
        let error = std::fs::read("/nonexistent/gotmpl/file.go")
            .at("/nonexistent/gotmpl/file.go")
            .unwrap_err();
        assert!(error.to_string().starts_with("/nonexistent/gotmpl/file.go: "));
    }

    #[test]
    fn config_errors_carry_their_message() {
        let error = GenerateError::config("GOPACKAGE is not set");
        assert_eq!(error.to_string(), "configuration error: GOPACKAGE is not set");
    }
}
