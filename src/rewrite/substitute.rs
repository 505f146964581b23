//! Placeholder substitution and import maintenance.

use gotmpl_checker::{DeclKind, ResolutionTable};
use gotmpl_core::{FileId, Span};
use gotmpl_parser::ast::visitor::{VisitorMut, walk_expr_mut};
use gotmpl_parser::ast::{Expr, File, Ident, IdentId, ImportDecl, ImportSpec, SelectorExpr};

use crate::substitution::{Target, TypeSubstitutionMap};

/// What [`substitute`] changed in one file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Substituted {
    /// Identifier occurrences replaced.
    pub occurrences: usize,
    /// Import paths newly added to the file.
    pub imports_added: Vec<String>,
}

/// Replace every identifier bound to a placeholder type declaration with
/// its target, then add the targets' import paths to the file.
///
/// Bindings come from `table`, built before any rewrite, so names that only
/// look like a placeholder (fields, values, other packages' members) are
/// never touched. An occurrence of a qualified target (`pkg.T`) becomes a
/// selector expression; a declaring identifier cannot, and takes the bare
/// name instead.
pub fn substitute(file: &mut File, table: &ResolutionTable, map: &TypeSubstitutionMap) -> Substituted {
    let mut pass = Substitution {
        table,
        map,
        file: file.id,
        next_ident: file.next_ident,
        used_imports: Vec::new(),
        occurrences: 0,
    };
    pass.visit_file_mut(file);
    file.next_ident = pass.next_ident;

    let mut imports_added = Vec::new();
    for path in pass.used_imports {
        if add_import(file, &path) {
            imports_added.push(path);
        }
    }
    Substituted {
        occurrences: pass.occurrences,
        imports_added,
    }
}

struct Substitution<'a> {
    table: &'a ResolutionTable,
    map: &'a TypeSubstitutionMap,
    file: FileId,
    next_ident: u32,
    /// Import paths in first-use order, each once.
    used_imports: Vec<String>,
    occurrences: usize,
}

impl Substitution<'_> {
    fn target_for(&self, ident: &Ident) -> Option<Target> {
        let decl = self.table.decl(self.table.decl_of(ident.id)?);
        if decl.kind != DeclKind::Type {
            return None;
        }
        self.map.get(&decl.name).cloned()
    }

    fn record(&mut self, target: &Target) {
        self.occurrences += 1;
        if let Some(path) = target.import_path()
            && !self.used_imports.iter().any(|used| used == path)
        {
            self.used_imports.push(path.to_string());
        }
    }

    fn fresh_ident(&mut self, name: &str, span: Span) -> Ident {
        let id = IdentId {
            file: self.file,
            index: self.next_ident,
        };
        self.next_ident += 1;
        Ident::new(name, id, span)
    }
}

impl VisitorMut for Substitution<'_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let Expr::Ident(ident) = expr
            && let Some(target) = self.target_for(ident)
            && let Some((package, name)) = target.qualified()
        {
            let span = ident.span;
            let package = self.fresh_ident(package, span);
            let sel = self.fresh_ident(name, span);
            *expr = Expr::Selector(Box::new(SelectorExpr {
                expr: Expr::Ident(package),
                sel,
                span,
            }));
            self.record(&target);
            return;
        }
        walk_expr_mut(self, expr);
    }

    fn visit_ident_mut(&mut self, ident: &mut Ident) {
        if let Some(target) = self.target_for(ident) {
            tracing::trace!(from = %ident.name, to = %target.ident, "substituting");
            ident.name = target.local_name().to_string();
            self.record(&target);
        }
    }
}

/// Add `import "path"` unless the file already imports it.
///
/// The import goes into the first import declaration, keeping its paths
/// sorted; a file without imports gets a new declaration. Returns whether
/// the file changed.
pub fn add_import(file: &mut File, path: &str) -> bool {
    if file.imports_path(path) {
        return false;
    }
    let spec = ImportSpec {
        name: None,
        path: path.to_string(),
        span: Span::synthetic(),
    };
    match file.imports.first_mut() {
        Some(decl) => {
            let at = decl
                .specs
                .iter()
                .position(|existing| existing.path.as_str() > path)
                .unwrap_or(decl.specs.len());
            decl.specs.insert(at, spec);
            decl.grouped = true;
        }
        None => file.imports.push(ImportDecl {
            specs: vec![spec],
            grouped: false,
            span: Span::synthetic(),
        }),
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_checker::resolve_package;
    use gotmpl_parser::{parse_source, printer::print_file};

    fn run(source: &str, map: &TypeSubstitutionMap) -> (String, Substituted) {
        let mut file = parse_source(source).unwrap();
        let table = resolve_package(&[&file], &[]).table;
        let result = substitute(&mut file, &table, map);
        (print_file(&file), result)
    }

    fn map(placeholder: &str, target: Target) -> TypeSubstitutionMap {
        let mut map = TypeSubstitutionMap::new();
        map.insert(placeholder, target);
        map
    }

    #[test]
    fn replaces_type_references_and_adds_one_import() {
        let source = "package p\n\nfunc F(a Item, b []Item) map[Item]Item {\n\treturn nil\n}\n";
        let (out, result) = run(source, &map("Item", Target::with_import("MyRecord", "extpkg")));
        // No declaration of Item: nothing binds, nothing changes.
        assert_eq!(result.occurrences, 0);
        assert_eq!(out, source);

        let source = "package p\n\ntype Item struct{}\n\nfunc F(a Item, b []Item) map[Item]Item {\n\treturn nil\n}\n";
        let (out, result) = run(source, &map("Item", Target::with_import("MyRecord", "extpkg")));
        assert_eq!(result.occurrences, 5);
        assert_eq!(result.imports_added, ["extpkg"]);
        assert_eq!(
            out,
            "package p\n\nimport \"extpkg\"\n\ntype MyRecord struct{}\n\nfunc F(a MyRecord, b []MyRecord) map[MyRecord]MyRecord {\n\treturn nil\n}\n"
        );
    }

    #[test]
    fn leaves_values_fields_and_selectors_alone() {
        let source = "package p\n\ntype Item int\n\ntype S struct {\n\tItem int\n}\n\nfunc F(s S, Item2 Item) int {\n\treturn s.Item\n}\n";
        let (out, result) = run(source, &map("Item", Target::new("uint8")));
        assert_eq!(result.occurrences, 2);
        assert!(result.imports_added.is_empty());
        assert!(out.contains("type uint8 int"), "{out}");
        assert!(out.contains("\tItem int\n"), "{out}");
        assert!(out.contains("Item2 uint8"), "{out}");
        assert!(out.contains("return s.Item"), "{out}");
    }

    #[test]
    fn qualified_target_becomes_selector() {
        let source = "package p\n\ntype Item struct{}\n\nvar x Item\n";
        let target = Target::with_import("ext.Record", "example.com/ext");
        let (out, result) = run(source, &map("Item", target));
        assert_eq!(result.occurrences, 2);
        assert_eq!(
            out,
            "package p\n\nimport \"example.com/ext\"\n\ntype Record struct{}\n\nvar x ext.Record\n"
        );
    }

    #[test]
    fn existing_import_is_not_duplicated() {
        let source = "package p\n\nimport \"extpkg\"\n\ntype Item struct{}\n\nvar x Item\n";
        let (out, result) = run(source, &map("Item", Target::with_import("MyRecord", "extpkg")));
        assert!(result.imports_added.is_empty());
        assert_eq!(out.matches("\"extpkg\"").count(), 1);
    }

    #[test]
    fn new_imports_are_inserted_in_path_order() {
        let mut file = parse_source("package p\n\nimport (\n\t\"fmt\"\n\t\"strings\"\n)\n").unwrap();
        assert!(add_import(&mut file, "os"));
        assert!(!add_import(&mut file, "fmt"));
        assert_eq!(
            print_file(&file),
            "package p\n\nimport (\n\t\"fmt\"\n\t\"os\"\n\t\"strings\"\n)\n"
        );
    }
}
