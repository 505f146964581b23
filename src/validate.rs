//! Whole-package type check before emission.

use std::io::{self, Write};

use gotmpl_checker::{Importer, check_package};
use gotmpl_core::{CheckErrors, SourceMap};
use gotmpl_parser::ast::File;
use gotmpl_parser::printer::print_file;

use crate::error::{GenerateError, Result};
use crate::package::{SourceUnit, StablePackage};

/// Type-check the rewritten files together with `stubs`.
///
/// `externals` are the unqualified external type names; `importer` supplies
/// what they and every imported name denote. On failure every
/// checked tree and the rendered diagnostics are written to `sink`, then
/// [`GenerateError::Check`] is returned. A sink that cannot be written to
/// only costs the dump, never the error.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn validate(
    package: &StablePackage,
    stubs: &[SourceUnit],
    externals: &[String],
    importer: &mut dyn Importer,
    map: &SourceMap,
    sink: &mut dyn Write,
) -> Result<()> {
    let units: Vec<&SourceUnit> = package.files().iter().chain(stubs).collect();
    let trees: Vec<&File> = units.iter().map(|unit| &unit.tree).collect();

    match check_package(&trees, externals, importer) {
        Ok(()) => {
            tracing::info!(files = package.files().len(), stubs = stubs.len(), "package type-checks");
            Ok(())
        }
        Err(errors) => {
            tracing::debug!(errors = errors.len(), "type check failed");
            if let Err(error) = dump(sink, &units, &errors, map) {
                tracing::warn!(%error, "failed to write diagnostic dump");
            }
            Err(GenerateError::Check(errors))
        }
    }
}

fn dump(sink: &mut dyn Write, units: &[&SourceUnit], errors: &CheckErrors, map: &SourceMap) -> io::Result<()> {
    for unit in units {
        writeln!(sink, "// file: {}", unit.base_name())?;
        writeln!(sink, "{}", print_file(&unit.tree))?;
    }
    write!(sink, "{}", errors.render(map))?;
    sink.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::StablePackage;
    use gotmpl_checker::{OpaqueImporter, resolve_package};
    use std::path::PathBuf;

    fn stable(map: &mut SourceMap, sources: &[(&str, &str)], externals: &[String]) -> StablePackage {
        let files: Vec<SourceUnit> = sources
            .iter()
            .map(|(name, text)| SourceUnit::new(*name, gotmpl_parser::parse_file(map, *name, *text).unwrap()))
            .collect();
        let trees: Vec<&File> = files.iter().map(|u| &u.tree).collect();
        let table = resolve_package(&trees, externals).table;
        StablePackage::new(PathBuf::from("pkg"), files, table)
    }

    #[test]
    fn valid_package_writes_nothing() {
        let mut map = SourceMap::new();
        let externals = vec!["MyRecord".to_string()];
        let package = stable(
            &mut map,
            &[("a.go", "package p\n\nimport \"extpkg\"\n\nfunc Id(r MyRecord) MyRecord {\n\treturn r\n}\n")],
            &externals,
        );
        let mut sink = Vec::new();
        validate(&package, &[], &externals, &mut OpaqueImporter::new(), &map, &mut sink).unwrap();
        assert!(sink.is_empty());
    }

    #[test]
    fn failure_dumps_every_checked_tree() {
        let mut map = SourceMap::new();
        let package = stable(
            &mut map,
            &[("a.go", "package main\n\nfunc F(r Record) Record {\n\treturn r + r\n}\n")],
            &[],
        );
        let stub = SourceUnit::new(
            "model.go",
            gotmpl_parser::parse_file(&mut map, "model.go", "package main\n\ntype Record struct{}\n").unwrap(),
        );
        let mut sink = Vec::new();
        let error = validate(&package, &[stub], &[], &mut OpaqueImporter::new(), &map, &mut sink).unwrap_err();
        assert!(matches!(error, GenerateError::Check(ref errors) if !errors.is_empty()));

        let dump = String::from_utf8(sink).unwrap();
        assert!(dump.contains("// file: a.go\npackage main\n"), "{dump}");
        assert!(dump.contains("// file: model.go\npackage main\n"), "{dump}");
        assert!(dump.contains("a.go:4:"), "{dump}");
    }

    #[test]
    fn stubs_satisfy_cross_file_references() {
        let mut map = SourceMap::new();
        let package = stable(
            &mut map,
            &[("gen_a.go", "package main\n\nfunc gen_F(r Record) Record {\n\treturn r\n}\n")],
            &[],
        );
        let stub = SourceUnit::new(
            "model.go",
            gotmpl_parser::parse_file(&mut map, "model.go", "package main\n\ntype Record uint32\n").unwrap(),
        );
        validate(&package, &[stub], &[], &mut OpaqueImporter::new(), &map, &mut Vec::new()).unwrap();
    }
}
