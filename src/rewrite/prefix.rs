//! Top-level identifier prefixing for same-directory output.
//!
//! Several instantiations may land in one directory, so every package-level
//! name a template declares is renamed to `<prefix>_<name>`. The plan is
//! keyed by [`DeclId`] and computed once from the pristine resolution
//! table; applying it renames each declaration exactly once and follows
//! every reference, in every file of the batch.

use gotmpl_checker::{DeclId, ResolutionTable};
use gotmpl_parser::ast::visitor::VisitorMut;
use gotmpl_parser::ast::{Decl, File, Ident};
use rustc_hash::FxHashMap;

use crate::package::SourceUnit;
use crate::substitution::TypeSubstitutionMap;

/// New names of the renamed declarations.
#[derive(Debug, Default, Clone)]
pub struct PrefixPlan {
    renames: FxHashMap<DeclId, String>,
}

impl PrefixPlan {
    /// Plan renames for every top-level function without receiver, type,
    /// var and const of `files`.
    ///
    /// Skipped: methods, `func init`, the blank identifier, and type
    /// declarations of placeholders (they now name the concrete type).
    pub fn new(files: &[SourceUnit], table: &ResolutionTable, map: &TypeSubstitutionMap, prefix: &str) -> Self {
        let mut plan = Self::default();
        for unit in files {
            for decl in &unit.tree.decls {
                match decl {
                    Decl::Func(func) => {
                        if func.recv.is_none() && func.name.name != "init" {
                            plan.add(table, &func.name, prefix);
                        }
                    }
                    Decl::Type(decl) => {
                        for spec in &decl.specs {
                            if !map.contains(&spec.name.name) {
                                plan.add(table, &spec.name, prefix);
                            }
                        }
                    }
                    Decl::Var(decl) | Decl::Const(decl) => {
                        for name in decl.specs.iter().flat_map(|spec| &spec.names) {
                            plan.add(table, name, prefix);
                        }
                    }
                }
            }
        }
        plan
    }

    fn add(&mut self, table: &ResolutionTable, name: &Ident, prefix: &str) {
        if name.is_blank() {
            return;
        }
        if let Some(id) = table.decl_of(name.id) {
            self.renames.entry(id).or_insert_with(|| prefixed(prefix, &name.name));
        }
    }

    pub fn new_name(&self, id: DeclId) -> Option<&str> {
        self.renames.get(&id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.renames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renames.is_empty()
    }
}

/// `<prefix>_<name>`.
pub fn prefixed(prefix: &str, name: &str) -> String {
    format!("{prefix}_{name}")
}

/// Rename every identifier bound to a planned declaration. Returns the
/// number of identifiers changed.
pub fn apply(file: &mut File, table: &ResolutionTable, plan: &PrefixPlan) -> usize {
    struct Apply<'a> {
        table: &'a ResolutionTable,
        plan: &'a PrefixPlan,
        renamed: usize,
    }

    impl VisitorMut for Apply<'_> {
        fn visit_ident_mut(&mut self, ident: &mut Ident) {
            if let Some(name) = self.table.decl_of(ident.id).and_then(|id| self.plan.new_name(id)) {
                ident.name = name.to_string();
                self.renamed += 1;
            }
        }
    }

    let mut pass = Apply {
        table,
        plan,
        renamed: 0,
    };
    pass.visit_file_mut(file);
    pass.renamed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution::Target;
    use gotmpl_checker::resolve_package;
    use gotmpl_core::FileId;
    use gotmpl_parser::ast::Parser;
    use gotmpl_parser::printer::print_file;

    fn prefix_all(sources: &[&str], map: &TypeSubstitutionMap) -> Vec<String> {
        let mut units: Vec<SourceUnit> = sources
            .iter()
            .enumerate()
            .map(|(i, source)| {
                let tree = Parser::parse_file(source, FileId(i as u32)).unwrap();
                SourceUnit::new(format!("f{i}.go"), tree)
            })
            .collect();
        let trees: Vec<&File> = units.iter().map(|u| &u.tree).collect();
        let table = resolve_package(&trees, &[]).table;
        let plan = PrefixPlan::new(&units, &table, map, "gen");
        for unit in &mut units {
            apply(&mut unit.tree, &table, &plan);
        }
        units.iter().map(|u| print_file(&u.tree)).collect()
    }

    #[test]
    fn renames_declarations_and_uses() {
        let out = prefix_all(
            &["package p\n\nconst Max = 3\n\nvar count int\n\nfunc Process(n int) int {\n\tcount++\n\treturn Process(n - Max)\n}\n"],
            &TypeSubstitutionMap::new(),
        );
        assert_eq!(
            out[0],
            "package p\n\nconst gen_Max = 3\n\nvar gen_count int\n\nfunc gen_Process(n int) int {\n\tgen_count++\n\treturn gen_Process(n - gen_Max)\n}\n"
        );
    }

    #[test]
    fn follows_references_across_files() {
        let out = prefix_all(
            &[
                "package p\n\ntype Set struct{}\n",
                "package p\n\nfunc New() *Set {\n\treturn &Set{}\n}\n",
            ],
            &TypeSubstitutionMap::new(),
        );
        assert_eq!(out[0], "package p\n\ntype gen_Set struct{}\n");
        assert_eq!(out[1], "package p\n\nfunc gen_New() *gen_Set {\n\treturn &gen_Set{}\n}\n");
    }

    #[test]
    fn skips_methods_init_blank_locals_and_placeholders() {
        let mut map = TypeSubstitutionMap::new();
        map.insert("Item", Target::new("int"));
        let source = "package p\n\ntype Item struct{}\n\ntype T int\n\nvar _ = 1\n\nfunc init() {\n}\n\nfunc (t T) Len() int {\n\tx := 1\n\treturn x\n}\n";
        let out = prefix_all(&[source], &map);
        assert_eq!(
            out[0],
            "package p\n\ntype Item struct{}\n\ntype gen_T int\n\nvar _ = 1\n\nfunc init() {\n}\n\nfunc (t gen_T) Len() int {\n\tx := 1\n\treturn x\n}\n"
        );
    }

    #[test]
    fn distinct_prefixes_never_collide() {
        assert_ne!(prefixed("a", "X"), prefixed("b", "X"));
        assert_eq!(prefixed("gen", "Process"), "gen_Process");
    }
}
