//! Reading and parsing Go source directories.

use std::fs;
use std::path::{Path, PathBuf};

use gotmpl_checker::{PackageSource, resolve_package};
use gotmpl_core::SourceMap;
use gotmpl_parser::ast::File;

use crate::error::{GenerateError, IoResultExt, Result};
use crate::package::{LoadedPackage, SourceUnit};

/// Non-test `.go` files directly inside `dir`, sorted by file name.
pub fn source_paths(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir).at(dir)? {
        let entry = entry.at(dir)?;
        if entry.file_type().at(entry.path())?.is_dir() {
            continue;
        }
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if is_go_source(name) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_go_source(name: &str) -> bool {
    name.ends_with(".go") && !name.ends_with("_test.go")
}

/// Read `path`, register it in `map` and parse it.
pub fn parse_path(map: &mut SourceMap, path: &Path) -> Result<File> {
    let text = fs::read_to_string(path).at(path)?;
    parse_text(map, path, text)
}

/// Register `text` under `path` and parse it.
pub(crate) fn parse_text(map: &mut SourceMap, path: &Path, text: String) -> Result<File> {
    gotmpl_parser::parse_file(map, path, text).map_err(|errors| GenerateError::Parse {
        path: path.to_path_buf(),
        rendered: errors.render(map),
        errors,
    })
}

/// Imported packages read from source under `$GOPATH/src`.
///
/// A package that is missing or does not parse is reported as unavailable,
/// so the checker treats its names as opaque.
pub struct GopathPackages {
    gopath: Option<PathBuf>,
    map: SourceMap,
}

impl GopathPackages {
    pub fn new(gopath: Option<PathBuf>) -> Self {
        Self {
            gopath,
            map: SourceMap::new(),
        }
    }

    fn read(&mut self, dir: &Path) -> Result<Vec<File>> {
        source_paths(dir)?
            .iter()
            .map(|path| parse_path(&mut self.map, path))
            .collect()
    }
}

impl PackageSource for GopathPackages {
    fn load(&mut self, path: &str) -> Option<Vec<File>> {
        let dir = self.gopath.as_ref()?.join("src").join(path);
        if !dir.is_dir() {
            return None;
        }
        match self.read(&dir) {
            Ok(files) if !files.is_empty() => {
                tracing::debug!(dir = %dir.display(), files = files.len(), "read imported package");
                Some(files)
            }
            Ok(_) => None,
            Err(error) => {
                tracing::debug!(dir = %dir.display(), %error, "imported package unreadable");
                None
            }
        }
    }
}

/// Parse every source file of a template package and resolve the batch.
///
/// Resolution errors are not fatal here; the validator reports whatever
/// is still wrong after the rewrite.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn load_package(map: &mut SourceMap, dir: &Path) -> Result<LoadedPackage> {
    let paths = source_paths(dir)?;
    if paths.is_empty() {
        return Err(GenerateError::NoSources {
            path: dir.to_path_buf(),
        });
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let tree = parse_path(map, &path)?;
        tracing::debug!(path = %path.display(), decls = tree.decls.len(), "parsed template file");
        files.push(SourceUnit::new(path, tree));
    }

    let trees: Vec<&File> = files.iter().map(|unit| &unit.tree).collect();
    let resolved = resolve_package(&trees, &[]);
    if !resolved.errors.is_empty() {
        tracing::debug!(errors = resolved.errors.len(), "template has unresolved names");
    }
    tracing::info!(dir = %dir.display(), files = files.len(), "loaded template package");
    Ok(LoadedPackage::new(dir.to_path_buf(), files, resolved.table))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_non_test_go_files_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.go", "a.go", "a_test.go", "notes.txt"] {
            fs::write(dir.path().join(name), "package p\n").unwrap();
        }
        fs::create_dir(dir.path().join("sub.go")).unwrap();

        let names: Vec<String> = source_paths(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.go", "b.go"]);
    }

    #[test]
    fn empty_directory_has_no_sources() {
        let dir = tempfile::tempdir().unwrap();
        let mut map = SourceMap::new();
        let result = load_package(&mut map, dir.path());
        assert!(matches!(result, Err(GenerateError::NoSources { .. })));
    }

    #[test]
    fn parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("bad.go"), "package p\n\nfunc (\n").unwrap();
        let mut map = SourceMap::new();
        match load_package(&mut map, dir.path()) {
            Err(GenerateError::Parse { path, errors, .. }) => {
                assert!(path.ends_with("bad.go"));
                assert!(!errors.is_empty());
            }
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn gopath_packages_read_non_test_sources() {
        let gopath = tempfile::tempdir().unwrap();
        let dir = gopath.path().join("src/example.com/extpkg");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("record.go"), "package extpkg\n\ntype MyRecord struct{}\n").unwrap();
        fs::write(dir.join("record_test.go"), "package extpkg\n\nfunc (\n").unwrap();

        let mut packages = GopathPackages::new(Some(gopath.path().to_path_buf()));
        let files = packages.load("example.com/extpkg").unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].package.name, "extpkg");
        assert!(packages.load("example.com/missing").is_none());

        fs::write(dir.join("broken.go"), "package extpkg\n\nfunc (\n").unwrap();
        assert!(packages.load("example.com/extpkg").is_none());
        assert!(GopathPackages::new(None).load("example.com/extpkg").is_none());
    }

    #[test]
    fn files_share_one_source_map() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.go"), "package p\n\ntype Item int\n").unwrap();
        fs::write(dir.path().join("b.go"), "package p\n\nfunc F(i Item) Item { return i }\n").unwrap();
        let mut map = SourceMap::new();
        let package = load_package(&mut map, dir.path()).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(package.files().len(), 2);
        assert!(package.table().lookup_package("Item").is_some());
    }
}
