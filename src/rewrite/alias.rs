//! Removal of placeholder alias declarations.
//!
//! A template names each placeholder locally, usually as `type Item int`.
//! Once substitution inlines the concrete type, that declaration is dead
//! and would redeclare the name, so it goes. Only the name-plus-shape
//! match is removed: a structured declaration sharing a placeholder name
//! (`type Item struct{...}`) stays.

use gotmpl_parser::ast::{Decl, Expr, File, TypeSpec};

use crate::substitution::TypeSubstitutionMap;

/// Whether `spec` is a removable placeholder declaration.
///
/// The definition must be a bare type name, possibly parenthesized.
/// Qualified names, pointers and every other type literal are kept.
pub fn is_placeholder_alias(spec: &TypeSpec, map: &TypeSubstitutionMap) -> bool {
    map.contains(&spec.name.name) && matches!(spec.ty.unparen(), Expr::Ident(_))
}

/// Drop placeholder alias specs; a type declaration left without specs is
/// dropped as a whole. Returns the number of specs removed.
pub fn remove_aliases(file: &mut File, map: &TypeSubstitutionMap) -> usize {
    let mut removed = 0;
    file.decls.retain_mut(|decl| {
        let Decl::Type(decl) = decl else { return true };
        let before = decl.specs.len();
        decl.specs.retain(|spec| !is_placeholder_alias(spec, map));
        removed += before - decl.specs.len();
        !decl.specs.is_empty()
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::substitution::Target;
    use gotmpl_parser::{parse_source, printer::print_file};

    fn map() -> TypeSubstitutionMap {
        let mut map = TypeSubstitutionMap::new();
        map.insert("Item", Target::new("int64"));
        map.insert("Key", Target::new("string"));
        map
    }

    fn remove(source: &str) -> (String, usize) {
        let mut file = parse_source(source).unwrap();
        let removed = remove_aliases(&mut file, &map());
        (print_file(&file), removed)
    }

    #[test]
    fn removes_bare_and_parenthesized_aliases() {
        let (out, removed) = remove("package p\n\ntype Item int\n\ntype Key (string)\n\nfunc F() {}\n");
        assert_eq!(removed, 2);
        assert_eq!(out, "package p\n\nfunc F() {\n}\n");
    }

    #[test]
    fn keeps_structured_and_unmapped_declarations() {
        let source = "package p\n\ntype Item struct {\n\tN int\n}\n\ntype Key *string\n\ntype Other int\n";
        let (out, removed) = remove(source);
        assert_eq!(removed, 0);
        assert_eq!(out, source);
    }

    #[test]
    fn keeps_qualified_definitions() {
        let source = "package p\n\nimport \"time\"\n\ntype Item time.Duration\n";
        let (out, removed) = remove(source);
        assert_eq!(removed, 0);
        assert_eq!(out, source);
    }

    #[test]
    fn grouped_declaration_loses_only_matching_specs() {
        let (out, removed) = remove("package p\n\ntype (\n\tItem int\n\tList []Item\n)\n");
        assert_eq!(removed, 1);
        assert_eq!(out, "package p\n\ntype (\n\tList []Item\n)\n");

        let (out, _) = remove("package p\n\ntype (\n\tItem int\n\tKey string\n)\n");
        assert_eq!(out, "package p\n");
    }
}
