//! Members of imported packages.

use gotmpl_parser::ast::{Decl, Expr, File, FuncType, LitKind, StructType};
use rustc_hash::FxHashMap;

use super::types::{DeclaredMethod, FieldInfo, InterfaceInfo, MethodInfo, Signature, Type, TypeStore};
use super::universe::{self, Predeclared};

/// Supplies the types of names exported by imported packages.
///
/// The checker never reads other packages itself; whatever it learns about
/// `pkg.Name` comes from here.
pub trait Importer {
    /// Type denoted by `path.name` in a type position.
    fn import_type(&mut self, store: &mut TypeStore, path: &str, name: &str) -> Type;

    /// Type of the value `path.name` in an expression position.
    fn import_value(&mut self, store: &mut TypeStore, path: &str, name: &str) -> Type;

    /// Type of an external name visible unqualified in every file.
    fn import_external(&mut self, store: &mut TypeStore, name: &str) -> Type {
        Type::Named(store.add_external(name))
    }
}

/// Treats every imported name as opaque.
///
/// Types become distinct external named types with an unknown underlying
/// type; values are of unknown type.
#[derive(Debug, Default)]
pub struct OpaqueImporter {
    types: FxHashMap<(String, String), Type>,
}

impl OpaqueImporter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Importer for OpaqueImporter {
    fn import_type(&mut self, store: &mut TypeStore, path: &str, name: &str) -> Type {
        self.types
            .entry((path.to_string(), name.to_string()))
            .or_insert_with(|| {
                let package = path.rsplit('/').next().unwrap_or(path);
                Type::Named(store.add_external(format!("{package}.{name}")))
            })
            .clone()
    }

    fn import_value(&mut self, _store: &mut TypeStore, _path: &str, _name: &str) -> Type {
        Type::Unknown
    }
}

/// Where [`SourceImporter`] finds the files of an imported package.
pub trait PackageSource {
    /// Parsed files of the package at `path`, or `None` when it is not
    /// available.
    fn load(&mut self, path: &str) -> Option<Vec<File>>;
}

/// Type declarations of one imported package.
#[derive(Debug, Default)]
struct PackageTypes {
    name: String,
    specs: FxHashMap<String, (bool, Expr)>,
    /// Receiver type name → `(method, pointer receiver, signature)`.
    methods: FxHashMap<String, Vec<(String, bool, FuncType)>>,
}

impl PackageTypes {
    fn collect(files: &[File]) -> Self {
        let mut types = PackageTypes::default();
        for file in files {
            if types.name.is_empty() {
                types.name = file.package.name.clone();
            }
            for decl in &file.decls {
                match decl {
                    Decl::Type(decl) => {
                        for spec in &decl.specs {
                            types
                                .specs
                                .insert(spec.name.name.clone(), (spec.assign, spec.ty.clone()));
                        }
                    }
                    Decl::Func(func) => {
                        let Some(recv) = &func.recv else { continue };
                        let (pointer, base) = match &recv.ty {
                            Expr::Star(star) => (true, &star.expr),
                            other => (false, other),
                        };
                        if let Expr::Ident(base) = base {
                            types.methods.entry(base.name.clone()).or_default().push((
                                func.name.name.clone(),
                                pointer,
                                func.ty.clone(),
                            ));
                        }
                    }
                    Decl::Var(_) | Decl::Const(_) => {}
                }
            }
        }
        types
    }
}

/// Reads imported packages from source.
///
/// Declared types of an imported package get their real underlying type
/// and method set, so operations the type does not support are reported.
/// Packages the [`PackageSource`] cannot supply, names it does not
/// declare, and types from further imports stay opaque.
pub struct SourceImporter<S> {
    source: S,
    packages: FxHashMap<String, Option<PackageTypes>>,
    types: FxHashMap<(String, String), Type>,
    /// Unqualified external name → import path.
    externals: FxHashMap<String, String>,
    opaque: OpaqueImporter,
}

impl<S: PackageSource> SourceImporter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            packages: FxHashMap::default(),
            types: FxHashMap::default(),
            externals: FxHashMap::default(),
            opaque: OpaqueImporter::new(),
        }
    }

    /// Declare where unqualified external names come from.
    pub fn with_externals<I, N, P>(mut self, externals: I) -> Self
    where
        I: IntoIterator<Item = (N, P)>,
        N: Into<String>,
        P: Into<String>,
    {
        for (name, path) in externals {
            self.externals.entry(name.into()).or_insert_with(|| path.into());
        }
        self
    }

    fn package(&mut self, path: &str) -> Option<&PackageTypes> {
        if !self.packages.contains_key(path) {
            let types = self.source.load(path).map(|files| PackageTypes::collect(&files));
            if types.is_none() {
                tracing::debug!(path, "imported package not found, treating it as opaque");
            }
            self.packages.insert(path.to_string(), types);
        }
        self.packages.get(path).and_then(Option::as_ref)
    }

    /// Type declared as `name` in the package at `path`, if it can be read.
    fn declared(&mut self, store: &mut TypeStore, path: &str, name: &str) -> Option<Type> {
        let key = (path.to_string(), name.to_string());
        if let Some(ty) = self.types.get(&key) {
            return Some(ty.clone());
        }
        let package = self.package(path)?;
        let (alias, def) = package.specs.get(name)?.clone();
        let display = format!("{}.{name}", package.name);
        let methods = package.methods.get(name).cloned().unwrap_or_default();

        if alias {
            self.types.insert(key.clone(), Type::Unknown);
            let ty = self.translate(store, path, &def);
            self.types.insert(key, ty.clone());
            return Some(ty);
        }

        let nid = store.add_named(display);
        self.types.insert(key, Type::Named(nid));
        let ty = self.translate(store, path, &def);
        let underlying = store.underlying(&ty).clone();
        store.get_mut(nid).underlying = Some(underlying);
        for (method, pointer_recv, func) in methods {
            let sig = self.signature(store, path, &func);
            store.get_mut(nid).methods.push(DeclaredMethod {
                name: method,
                sig,
                pointer_recv,
            });
        }
        Some(Type::Named(nid))
    }

    /// A type expression written inside the package at `path`.
    fn translate(&mut self, store: &mut TypeStore, path: &str, expr: &Expr) -> Type {
        match expr {
            Expr::Ident(ident) => match universe::lookup(&ident.name) {
                // The checker's own `error` is not visible here.
                Some(Predeclared::Type(_)) if ident.name == "error" => Type::Unknown,
                Some(Predeclared::Type(ty)) => ty,
                _ => self.import_type(store, path, &ident.name),
            },
            Expr::Paren(paren) => self.translate(store, path, &paren.expr),
            Expr::Star(star) => Type::pointer(self.translate(store, path, &star.expr)),
            Expr::ArrayType(array) => {
                let elem = self.translate(store, path, &array.elt);
                match &array.len {
                    None => Type::slice(elem),
                    Some(Expr::BasicLit(lit)) if lit.kind == LitKind::Int => {
                        Type::Array(lit.value.replace('_', "").parse().ok(), Box::new(elem))
                    }
                    Some(_) => Type::Array(None, Box::new(elem)),
                }
            }
            Expr::MapType(map) => Type::Map(
                Box::new(self.translate(store, path, &map.key)),
                Box::new(self.translate(store, path, &map.value)),
            ),
            Expr::ChanType(chan) => Type::Chan(chan.dir, Box::new(self.translate(store, path, &chan.value))),
            Expr::FuncType(func) => Type::Func(Box::new(self.signature(store, path, func))),
            Expr::StructType(st) => Type::Struct(self.fields(store, path, st)),
            Expr::InterfaceType(it) => {
                let mut info = InterfaceInfo::default();
                for field in &it.methods {
                    let Expr::FuncType(func) = &field.ty else {
                        info.open = true;
                        continue;
                    };
                    if field.names.is_empty() {
                        info.open = true;
                        continue;
                    }
                    let sig = self.signature(store, path, func);
                    for name in &field.names {
                        info.methods.push(MethodInfo {
                            name: name.name.clone(),
                            sig: sig.clone(),
                        });
                    }
                }
                info.methods.sort_by(|a, b| a.name.cmp(&b.name));
                info.methods.dedup_by(|a, b| a.name == b.name);
                Type::Interface(Box::new(info))
            }
            // Types of further imports, generics and anything else.
            _ => Type::Unknown,
        }
    }

    fn signature(&mut self, store: &mut TypeStore, path: &str, func: &FuncType) -> Signature {
        let mut sig = Signature::default();
        for field in &func.params {
            let ty = match &field.ty {
                Expr::Ellipsis(e) => {
                    sig.variadic = true;
                    Type::slice(e.elt.as_ref().map_or(Type::Unknown, |t| self.translate(store, path, t)))
                }
                other => self.translate(store, path, other),
            };
            sig.params.extend(std::iter::repeat_n(ty, field.arity()));
        }
        for field in &func.results {
            let ty = self.translate(store, path, &field.ty);
            sig.results.extend(std::iter::repeat_n(ty, field.arity()));
        }
        sig
    }

    fn fields(&mut self, store: &mut TypeStore, path: &str, st: &StructType) -> Vec<FieldInfo> {
        let mut fields = Vec::new();
        for field in &st.fields {
            let ty = self.translate(store, path, &field.ty);
            if field.names.is_empty() {
                fields.push(FieldInfo {
                    name: embedded_name(&field.ty),
                    ty,
                    embedded: true,
                });
                continue;
            }
            for name in &field.names {
                fields.push(FieldInfo {
                    name: name.name.clone(),
                    ty: ty.clone(),
                    embedded: false,
                });
            }
        }
        fields
    }
}

impl<S: PackageSource> Importer for SourceImporter<S> {
    fn import_type(&mut self, store: &mut TypeStore, path: &str, name: &str) -> Type {
        match self.declared(store, path, name) {
            Some(ty) => ty,
            None => self.opaque.import_type(store, path, name),
        }
    }

    fn import_value(&mut self, store: &mut TypeStore, path: &str, name: &str) -> Type {
        self.opaque.import_value(store, path, name)
    }

    fn import_external(&mut self, store: &mut TypeStore, name: &str) -> Type {
        let declared = match self.externals.get(name).cloned() {
            Some(path) => self.declared(store, &path, name),
            None => None,
        };
        declared.unwrap_or_else(|| Type::Named(store.add_external(name)))
    }
}

fn embedded_name(ty: &Expr) -> String {
    match ty {
        Expr::Ident(ident) => ident.name.clone(),
        Expr::Star(star) => embedded_name(&star.expr),
        Expr::Paren(paren) => embedded_name(&paren.expr),
        Expr::Selector(sel) => sel.sel.name.clone(),
        _ => "_".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_parser::parse_source;

    #[test]
    fn same_name_imports_the_same_type() {
        let mut store = TypeStore::new();
        let mut importer = OpaqueImporter::new();
        let a = importer.import_type(&mut store, "example.com/ext", "Record");
        let b = importer.import_type(&mut store, "example.com/ext", "Record");
        let c = importer.import_type(&mut store, "example.com/ext", "Other");
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(store.display(&a), "ext.Record");
    }

    /// Serves one in-memory package.
    struct OnePackage {
        path: &'static str,
        text: &'static str,
        loads: usize,
    }

    impl PackageSource for OnePackage {
        fn load(&mut self, path: &str) -> Option<Vec<File>> {
            self.loads += 1;
            (path == self.path).then(|| vec![parse_source(self.text).unwrap()])
        }
    }

    fn importer(text: &'static str) -> SourceImporter<OnePackage> {
        SourceImporter::new(OnePackage {
            path: "example.com/extpkg",
            text,
            loads: 0,
        })
    }

    #[test]
    fn declared_types_keep_their_structure() {
        let mut store = TypeStore::new();
        let mut importer = importer(
            "package extpkg\n\ntype MyRecord struct {\n\tID   int\n\tNext *MyRecord\n}\n\nfunc (r *MyRecord) Key() string {\n\treturn \"\"\n}\n",
        );
        let ty = importer.import_type(&mut store, "example.com/extpkg", "MyRecord");
        assert_eq!(store.display(&ty), "extpkg.MyRecord");

        let Type::Struct(fields) = store.underlying(&ty).clone() else {
            panic!("expected a struct");
        };
        assert_eq!(fields[0].ty, Type::int());
        assert_eq!(fields[1].ty, Type::pointer(ty.clone()));

        let Type::Named(nid) = ty else { panic!("expected a named type") };
        let methods = &store.get(nid).methods;
        assert_eq!(methods.len(), 1);
        assert!(methods[0].pointer_recv);
        assert_eq!(methods[0].sig.results, [Type::string()]);
        assert!(!store.is_opaque(&ty));

        let again = importer.import_type(&mut store, "example.com/extpkg", "MyRecord");
        assert_eq!(again, Type::Named(nid));
        assert_eq!(importer.source.loads, 1);
    }

    #[test]
    fn missing_packages_and_names_stay_opaque() {
        let mut store = TypeStore::new();
        let mut importer = importer("package extpkg\n\ntype Count int\n");
        let missing = importer.import_type(&mut store, "example.com/other", "Thing");
        assert!(store.is_opaque(&missing));
        let undeclared = importer.import_type(&mut store, "example.com/extpkg", "Nope");
        assert!(store.is_opaque(&undeclared));
        let count = importer.import_type(&mut store, "example.com/extpkg", "Count");
        assert_eq!(store.underlying(&count), &Type::int());
    }

    #[test]
    fn unqualified_externals_resolve_through_their_import() {
        let mut store = TypeStore::new();
        let mut importer =
            importer("package extpkg\n\ntype MyRecord struct{}\n").with_externals([("MyRecord", "example.com/extpkg")]);
        let record = importer.import_external(&mut store, "MyRecord");
        assert!(matches!(store.underlying(&record), Type::Struct(_)));

        let unknown = importer.import_external(&mut store, "Other");
        assert!(store.is_opaque(&unknown));
        assert_eq!(store.display(&unknown), "Other");
    }
}
