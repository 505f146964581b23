//! Stub declarations of sibling files.
//!
//! In same-directory mode the rewritten files join a package that already
//! has other files. The validator only needs those files' type names, so
//! each sibling is reduced to its type declarations with every definition
//! replaced by `uint32`. Stubs never reach the emitter.

use std::path::Path;

use gotmpl_core::SourceMap;
use gotmpl_parser::ast::{Decl, Expr, File, Ident, IdentId};

use crate::error::{GenerateError, Result};
use crate::loader::{parse_path, source_paths};
use crate::package::SourceUnit;

const STUB_TYPE: &str = "uint32";

/// Reduce every sibling source file of `dir` to a stub.
///
/// Files named in `skip` (the outputs of this run) are ignored, and so are
/// files without type declarations. A sibling the parser rejects, e.g. one
/// using type parameters, contributes no stub; names it declares are then
/// undeclared for the validator.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn extract_stubs(map: &mut SourceMap, dir: &Path, skip: &[String]) -> Result<Vec<SourceUnit>> {
    let mut stubs = Vec::new();
    for path in source_paths(dir)? {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or_default();
        if skip.iter().any(|s| s == name) {
            tracing::debug!(path = %path.display(), "skipping file about to be replaced");
            continue;
        }
        let mut tree = match parse_path(map, &path) {
            Ok(tree) => tree,
            Err(GenerateError::Parse { errors, .. }) => {
                tracing::warn!(path = %path.display(), errors = errors.len(), "sibling does not parse, no stub");
                continue;
            }
            Err(error) => return Err(error),
        };
        if stub_file(&mut tree) == 0 {
            continue;
        }
        tracing::debug!(path = %path.display(), "extracted sibling stub");
        stubs.push(SourceUnit::new(path, tree));
    }
    tracing::info!(dir = %dir.display(), stubs = stubs.len(), "extracted sibling stubs");
    Ok(stubs)
}

/// Keep only type declarations, each defined as `uint32`. Returns the number
/// of type specs left.
pub fn stub_file(file: &mut File) -> usize {
    file.doc = None;
    file.imports.clear();
    file.decls.retain(|decl| matches!(decl, Decl::Type(_)));

    let mut specs = 0;
    for decl in &mut file.decls {
        let Decl::Type(decl) = decl else { continue };
        decl.doc = None;
        for spec in &mut decl.specs {
            let id = IdentId {
                file: file.id,
                index: file.next_ident,
            };
            file.next_ident += 1;
            spec.ty = Expr::Ident(Ident::new(STUB_TYPE, id, spec.ty.span()));
            spec.assign = false;
            specs += 1;
        }
    }
    specs
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_parser::{parse_source, printer::print_file};
    use std::fs;

    #[test]
    fn types_become_uint32_and_everything_else_goes() {
        let mut file = parse_source(
            "// Package main.\npackage main\n\nimport \"fmt\"\n\n// Config is documented.\ntype Config struct {\n\tName string\n}\n\ntype (\n\tID = string\n\tIDs []ID\n)\n\nvar debug = false\n\nfunc main() {\n\tfmt.Println(Config{})\n}\n",
        )
        .unwrap();
        assert_eq!(stub_file(&mut file), 3);
        assert_eq!(
            print_file(&file),
            "package main\n\ntype Config uint32\n\ntype (\n\tID uint32\n\tIDs uint32\n)\n"
        );
    }

    #[test]
    fn siblings_without_types_contribute_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("main.go"), "package main\n\nfunc main() {}\n").unwrap();
        fs::write(dir.path().join("model.go"), "package main\n\ntype Record struct{}\n").unwrap();
        let mut map = SourceMap::new();
        let stubs = extract_stubs(&mut map, dir.path(), &[]).unwrap();
        assert_eq!(stubs.len(), 1);
        assert_eq!(stubs[0].base_name(), "model.go");
    }

    #[test]
    fn unparsable_siblings_are_left_out() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pair.go"),
            "package main\n\ntype Pair[K comparable, V any] struct {\n\tKey K\n\tValue V\n}\n",
        )
        .unwrap();
        fs::write(dir.path().join("model.go"), "package main\n\ntype Model struct{}\n").unwrap();

        let mut map = SourceMap::new();
        let stubs = extract_stubs(&mut map, dir.path(), &[]).unwrap();
        let names: Vec<&str> = stubs.iter().map(|s| s.base_name()).collect();
        assert_eq!(names, ["model.go"]);
    }

    #[test]
    fn files_about_to_be_replaced_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("gen_list.go"), "package main\n\ntype gen_List []int\n").unwrap();
        fs::write(dir.path().join("model.go"), "package main\n\ntype Record struct{}\n").unwrap();
        let mut map = SourceMap::new();
        let stubs = extract_stubs(&mut map, dir.path(), &["gen_list.go".to_string()]).unwrap();
        let names: Vec<&str> = stubs.iter().map(SourceUnit::base_name).collect();
        assert_eq!(names, ["model.go"]);
    }
}
