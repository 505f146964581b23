//! Syntax tree rewriting.
//!
//! ## Passes
//!
//! Every file goes through the same passes, in order:
//!
//! 1. **Package rename**: the package clause takes the destination name.
//! 2. **Alias removal** ([`alias`]): placeholder declarations whose
//!    definition is a bare type name are dropped.
//! 3. **Substitution** ([`substitute`]): placeholder references become
//!    their targets; target imports are added.
//! 4. **Prefixing** ([`prefix`], same-directory mode only): package-level
//!    names get the destination prefix.
//!
//! All passes read bindings from the table the package was loaded with.
//! Identifier ids survive every edit, so that table stays valid for lookups
//! even though names change underneath it.

pub mod alias;
pub mod prefix;
pub mod substitute;

use gotmpl_parser::ast::File;

use crate::config::Destination;
use crate::package::{LoadedPackage, RewrittenPackage};
use crate::substitution::TypeSubstitutionMap;

pub use alias::remove_aliases;
pub use prefix::PrefixPlan;
pub use substitute::{Substituted, add_import, substitute};

/// Set the package clause name.
pub fn rename_package(file: &mut File, name: &str) {
    file.package.name = name.to_string();
}

/// Applies the rewrite passes to a loaded package.
pub struct Rewriter<'a> {
    map: &'a TypeSubstitutionMap,
    destination: &'a Destination,
}

impl<'a> Rewriter<'a> {
    pub fn new(map: &'a TypeSubstitutionMap, destination: &'a Destination) -> Self {
        Self { map, destination }
    }

    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn rewrite(&self, package: LoadedPackage) -> RewrittenPackage {
        let (dir, mut files, table) = package.into_parts();

        let plan = self
            .destination
            .prefix()
            .map(|prefix| PrefixPlan::new(&files, &table, self.map, prefix));

        for unit in &mut files {
            let file = &mut unit.tree;
            rename_package(file, &self.destination.new_name);
            let aliases = remove_aliases(file, self.map);
            let substituted = substitute(file, &table, self.map);
            let prefixed = plan.as_ref().map_or(0, |plan| prefix::apply(file, &table, plan));
            tracing::debug!(
                file = %unit.path.display(),
                aliases,
                substituted = substituted.occurrences,
                imports = ?substituted.imports_added,
                prefixed,
                "rewrote file"
            );
        }

        tracing::info!(
            files = files.len(),
            renames = plan.as_ref().map_or(0, PrefixPlan::len),
            "rewrote package"
        );
        RewrittenPackage::new(dir, files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EmitMode;
    use crate::package::SourceUnit;
    use crate::substitution::Target;
    use gotmpl_checker::resolve_package;
    use gotmpl_core::FileId;
    use gotmpl_parser::ast::Parser;
    use gotmpl_parser::printer::print_file;
    use std::path::PathBuf;

    fn load(sources: &[&str]) -> LoadedPackage {
        let files: Vec<SourceUnit> = sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                SourceUnit::new(format!("f{i}.go"), Parser::parse_file(source, FileId(i as u32)).unwrap())
            })
            .collect();
        let trees: Vec<&File> = files.iter().map(|u| &u.tree).collect();
        let table = resolve_package(&trees, &[]).table;
        LoadedPackage::new(PathBuf::from("tmpl"), files, table)
    }

    fn map() -> TypeSubstitutionMap {
        let mut map = TypeSubstitutionMap::new();
        map.insert("Item", Target::with_import("MyRecord", "extpkg"));
        map
    }

    #[test]
    fn new_package_rewrite() {
        let package = load(&["package tmpl\n\ntype Item int\n\nfunc Identity(i Item) Item {\n\treturn i\n}\n"]);
        let destination = Destination {
            new_name: "records".to_string(),
            mode: EmitMode::NewPackage {
                path: PathBuf::from("records"),
            },
        };
        let map = map();
        let rewritten = Rewriter::new(&map, &destination).rewrite(package);
        assert_eq!(
            print_file(&rewritten.files()[0].tree),
            "package records\n\nimport \"extpkg\"\n\nfunc Identity(i MyRecord) MyRecord {\n\treturn i\n}\n"
        );
    }

    #[test]
    fn same_dir_rewrite_prefixes_but_keeps_targets() {
        let package = load(&[
            "package tmpl\n\ntype Item int\n\ntype Set map[Item]bool\n\nfunc Process(s Set, i Item) {\n\ts[i] = true\n}\n",
            "package tmpl\n\nfunc Run() {\n\tProcess(nil, 0)\n}\n",
        ]);
        let destination = Destination {
            new_name: "main".to_string(),
            mode: EmitMode::SameDir {
                prefix: "gen".to_string(),
            },
        };
        let map = map();
        let rewritten = Rewriter::new(&map, &destination).rewrite(package);
        let out: Vec<String> = rewritten.files().iter().map(|u| print_file(&u.tree)).collect();
        assert_eq!(
            out[0],
            "package main\n\nimport \"extpkg\"\n\ntype gen_Set map[MyRecord]bool\n\nfunc gen_Process(s gen_Set, i MyRecord) {\n\ts[i] = true\n}\n"
        );
        assert_eq!(out[1], "package main\n\nfunc gen_Run() {\n\tgen_Process(nil, 0)\n}\n");
    }
}
