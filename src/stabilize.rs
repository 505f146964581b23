//! Making a rewritten batch consistent again.

use std::io::Write;

use gotmpl_checker::resolve_package;
use gotmpl_core::SourceMap;
use gotmpl_parser::ast::File;
use gotmpl_parser::printer::print_file;

use crate::config::StabilizeMode;
use crate::error::Result;
use crate::loader::parse_text;
use crate::package::{RewrittenPackage, SourceUnit, StablePackage};

/// Turn a rewritten package into a stable one.
///
/// [`StabilizeMode::Resolve`] re-resolves the mutated trees as one batch.
/// [`StabilizeMode::Reparse`] first prints every tree and parses the text
/// back under the file's original path, so positions point into the
/// rewritten text. A reparse failure writes the offending text to `sink`.
///
/// `externals` are the names the validator will declare as external types;
/// resolving with the same set keeps the table in line with the check.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn stabilize(
    package: RewrittenPackage,
    mode: StabilizeMode,
    map: &mut SourceMap,
    externals: &[String],
    sink: &mut dyn Write,
) -> Result<StablePackage> {
    let (dir, mut files) = package.into_parts();

    if mode == StabilizeMode::Reparse {
        for unit in &mut files {
            unit.tree = reparse(map, unit, sink)?;
        }
    }

    let trees: Vec<&File> = files.iter().map(|unit| &unit.tree).collect();
    let resolved = resolve_package(&trees, externals);
    tracing::info!(
        ?mode,
        files = files.len(),
        unresolved = resolved.errors.len(),
        "stabilized package"
    );
    Ok(StablePackage::new(dir, files, resolved.table))
}

fn reparse(map: &mut SourceMap, unit: &SourceUnit, sink: &mut dyn Write) -> Result<File> {
    let text = print_file(&unit.tree);
    match parse_text(map, &unit.path, text.clone()) {
        Ok(tree) => {
            tracing::debug!(path = %unit.path.display(), "reparsed rewritten file");
            Ok(tree)
        }
        Err(error) => {
            if let Err(write_error) = write!(sink, "// file: {}\n{text}\n", unit.base_name()) {
                tracing::warn!(%write_error, "failed to write diagnostic dump");
            }
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Destination, EmitMode};
    use crate::loader::load_package;
    use crate::rewrite::Rewriter;
    use crate::substitution::{Target, TypeSubstitutionMap};
    use std::fs;
    use std::path::PathBuf;

    fn rewritten(map: &mut SourceMap) -> RewrittenPackage {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("list.go"),
            "package tmpl\n\ntype Item int\n\ntype List []Item\n\nfunc First(l List) Item {\n\treturn l[0]\n}\n",
        )
        .unwrap();
        let package = load_package(map, dir.path()).unwrap();
        let mut subs = TypeSubstitutionMap::new();
        subs.insert("Item", Target::new("string"));
        let destination = Destination {
            new_name: "strs".to_string(),
            mode: EmitMode::NewPackage {
                path: PathBuf::from("strs"),
            },
        };
        Rewriter::new(&subs, &destination).rewrite(package)
    }

    #[test]
    fn both_modes_produce_the_same_text() {
        let mut map = SourceMap::new();
        let resolved = stabilize(rewritten(&mut map), StabilizeMode::Resolve, &mut map, &[], &mut Vec::new()).unwrap();
        let reparsed = stabilize(rewritten(&mut map), StabilizeMode::Reparse, &mut map, &[], &mut Vec::new()).unwrap();
        assert_eq!(
            print_file(&resolved.files()[0].tree),
            print_file(&reparsed.files()[0].tree)
        );
    }

    #[test]
    fn fresh_table_follows_new_names() {
        let mut map = SourceMap::new();
        let stable = stabilize(rewritten(&mut map), StabilizeMode::Resolve, &mut map, &[], &mut Vec::new()).unwrap();
        assert!(stable.table().lookup_package("List").is_some());
        assert!(stable.table().lookup_package("Item").is_none());
    }

    #[test]
    fn reparse_registers_new_source_text() {
        let mut map = SourceMap::new();
        let package = rewritten(&mut map);
        let before = map.len();
        let stable = stabilize(package, StabilizeMode::Reparse, &mut map, &[], &mut Vec::new()).unwrap();
        assert_eq!(map.len(), before + 1);
        assert_eq!(
            map.text(stable.files()[0].tree.id),
            Some(print_file(&stable.files()[0].tree).as_str())
        );
    }
}
