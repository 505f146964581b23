//! Writing validated files.
//!
//! Both modes stage every file first and commit only when all writes
//! succeeded:
//!
//! - **New package**: files go into a staging directory next to the
//!   destination, which then replaces the destination with one rename.
//! - **Same directory**: each file goes into a temporary file in the working
//!   directory; the temporaries are persisted as `<prefix>_<base>` at the
//!   end. A failure while persisting can leave some files replaced.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use gotmpl_parser::printer::print_file;
use tempfile::{Builder, NamedTempFile, TempDir};

use crate::config::{Destination, EmitMode};
use crate::error::{GenerateError, IoResultExt, Result};
use crate::package::{SourceUnit, StablePackage};

const STAGING_PREFIX: &str = ".gotmpl-";

/// Write `package` to `destination`. Returns the written paths in emission
/// order (sorted by base name).
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn emit(package: &StablePackage, destination: &Destination, work_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut units: Vec<&SourceUnit> = package.files().iter().collect();
    units.sort_by(|a, b| a.base_name().cmp(b.base_name()));

    let written = match &destination.mode {
        EmitMode::NewPackage { path } => emit_new_package(&units, destination, path)?,
        EmitMode::SameDir { .. } => emit_same_dir(&units, destination, work_dir)?,
    };
    tracing::info!(files = written.len(), "emitted package");
    Ok(written)
}

fn emit_new_package(units: &[&SourceUnit], destination: &Destination, path: &Path) -> Result<Vec<PathBuf>> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).at(parent)?;
    let staging = Builder::new().prefix(STAGING_PREFIX).tempdir_in(parent).at(parent)?;

    let mut written = Vec::with_capacity(units.len());
    for unit in units {
        let name = destination.output_name(unit.base_name());
        let staged = staging.path().join(&name);
        if let Err(error) = fs::write(&staged, print_file(&unit.tree)).at(&staged) {
            tracing::warn!(staging = %staging.path().display(), "write failed, discarding staged files");
            return Err(error);
        }
        tracing::debug!(file = %name, "staged file");
        written.push(path.join(name));
    }

    commit_dir(staging, path)?;
    Ok(written)
}

/// Replace `path` with the staging directory.
fn commit_dir(staging: TempDir, path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).at(path)?;
        tracing::debug!(path = %path.display(), "removed previous destination");
    }
    fs::rename(staging.path(), path).at(path)?;
    // The staging path no longer exists; dropping the handle is a no-op.
    drop(staging);
    Ok(())
}

fn emit_same_dir(units: &[&SourceUnit], destination: &Destination, work_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut staged: Vec<(NamedTempFile, PathBuf)> = Vec::with_capacity(units.len());
    for unit in units {
        let target = work_dir.join(destination.output_name(unit.base_name()));
        match stage_file(work_dir, &print_file(&unit.tree)) {
            Ok(file) => staged.push((file, target)),
            Err(error) => {
                tracing::warn!(files = staged.len(), "write failed, discarding staged files");
                return Err(error);
            }
        }
    }

    let mut written = Vec::with_capacity(staged.len());
    for (file, target) in staged {
        file.persist(&target)
            .map_err(|error| GenerateError::io(&target, error.error))?;
        tracing::debug!(file = %target.display(), "wrote file");
        written.push(target);
    }
    Ok(written)
}

fn stage_file(dir: &Path, text: &str) -> Result<NamedTempFile> {
    let mut file = Builder::new().prefix(STAGING_PREFIX).suffix(".tmp").tempfile_in(dir).at(dir)?;
    file.write_all(text.as_bytes()).at(file.path())?;
    file.flush().at(file.path())?;
    Ok(file)
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_checker::ResolutionTable;
    use gotmpl_parser::parse_source;

    fn package(sources: &[(&str, &str)]) -> StablePackage {
        let files = sources
            .iter()
            .map(|(name, text)| SourceUnit::new(*name, parse_source(text).unwrap()))
            .collect();
        StablePackage::new(PathBuf::from("tmpl"), files, ResolutionTable::default())
    }

    fn new_package(path: PathBuf) -> Destination {
        Destination {
            new_name: "out".to_string(),
            mode: EmitMode::NewPackage { path },
        }
    }

    fn listing(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn new_package_replaces_previous_contents() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("out");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("stale.go"), "package out\n").unwrap();

        let package = package(&[("b.go", "package out\n"), ("a.go", "package out\n\nvar X = 1\n")]);
        let written = emit(&package, &new_package(dest.clone()), root.path()).unwrap();

        assert_eq!(written, [dest.join("a.go"), dest.join("b.go")]);
        assert_eq!(listing(&dest), ["a.go", "b.go"]);
        assert_eq!(fs::read_to_string(dest.join("a.go")).unwrap(), "package out\n\nvar X = 1\n");
        assert_eq!(listing(root.path()), ["out"], "staging directory left behind");
    }

    #[test]
    fn new_package_creates_missing_parents() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("nested").join("out");
        emit(&package(&[("a.go", "package out\n")]), &new_package(dest.clone()), root.path()).unwrap();
        assert_eq!(listing(&dest), ["a.go"]);
    }

    #[test]
    fn new_package_failure_keeps_previous_destination() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("out");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("old.go"), "package out\n").unwrap();

        // The second file name exceeds the file system's name limit.
        let long = format!("{}.go", "b".repeat(300));
        let package = package(&[("a.go", "package out\n"), (long.as_str(), "package out\n")]);
        let result = emit(&package, &new_package(dest.clone()), root.path());

        assert!(matches!(result, Err(GenerateError::Io { .. })), "{result:?}");
        assert_eq!(listing(&dest), ["old.go"]);
        assert_eq!(fs::read_to_string(dest.join("old.go")).unwrap(), "package out\n");
        assert_eq!(listing(root.path()), ["out"], "staging directory left behind");
    }

    #[test]
    fn new_package_failure_creates_no_destination() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("out");
        let long = format!("{}.go", "b".repeat(300));
        let result = emit(&package(&[(long.as_str(), "package out\n")]), &new_package(dest.clone()), root.path());

        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(listing(root.path()).is_empty());
    }

    #[test]
    fn same_dir_writes_prefixed_siblings() {
        let root = tempfile::tempdir().unwrap();
        fs::write(root.path().join("main.go"), "package main\n").unwrap();
        let destination = Destination {
            new_name: "main".to_string(),
            mode: EmitMode::SameDir {
                prefix: "gen".to_string(),
            },
        };
        let written = emit(&package(&[("list.go", "package main\n")]), &destination, root.path()).unwrap();
        assert_eq!(written, [root.path().join("gen_list.go")]);
        assert_eq!(listing(root.path()), ["gen_list.go", "main.go"]);
    }

    #[test]
    fn same_dir_failure_leaves_no_new_files() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let destination = Destination {
            new_name: "main".to_string(),
            mode: EmitMode::SameDir {
                prefix: "gen".to_string(),
            },
        };
        let result = emit(&package(&[("list.go", "package main\n")]), &destination, &missing);
        assert!(matches!(result, Err(GenerateError::Io { .. })));
        assert!(listing(root.path()).is_empty());
    }
}
