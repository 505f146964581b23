//! Placeholder → concrete type bindings.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use crate::error::{GenerateError, Result};

/// The concrete type bound to one placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Target {
    /// Concrete type name, bare (`MyRecord`) or qualified (`extpkg.MyRecord`).
    pub ident: String,
    /// Import path the type comes from, if any.
    pub import: Option<String>,
}

impl Target {
    /// A target without import, e.g. a predeclared type.
    pub fn new(ident: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            import: None,
        }
    }

    pub fn with_import(ident: impl Into<String>, import: impl Into<String>) -> Self {
        Self {
            ident: ident.into(),
            import: Some(import.into()),
        }
    }

    /// `("extpkg", "MyRecord")` for `extpkg.MyRecord`.
    pub fn qualified(&self) -> Option<(&str, &str)> {
        self.ident.split_once('.')
    }

    /// The name without package qualifier.
    pub fn local_name(&self) -> &str {
        self.qualified().map_or(self.ident.as_str(), |(_, name)| name)
    }

    /// Import path, treating an empty path as none.
    pub fn import_path(&self) -> Option<&str> {
        self.import.as_deref().filter(|path| !path.is_empty())
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.import_path() {
            Some(import) => write!(f, "{}@{import}", self.ident),
            None => write!(f, "{}", self.ident),
        }
    }
}

/// Mapping from placeholder type name to [`Target`].
///
/// Placeholders without an entry are left alone by the rewrite, so a
/// template may mix substituted and ordinary types.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypeSubstitutionMap {
    targets: FxHashMap<String, Target>,
}

impl TypeSubstitutionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a map from command-line bindings, see [`parse_binding`].
    pub fn from_bindings<S: AsRef<str>>(bindings: impl IntoIterator<Item = S>) -> Result<Self> {
        let mut map = Self::new();
        for binding in bindings {
            let (placeholder, target) = parse_binding(binding.as_ref())?;
            if map.targets.contains_key(&placeholder) {
                return Err(GenerateError::config(format!(
                    "placeholder {placeholder} is bound more than once"
                )));
            }
            map.insert(placeholder, target);
        }
        Ok(map)
    }

    /// Bind `placeholder`, returning the previous target.
    pub fn insert(&mut self, placeholder: impl Into<String>, target: Target) -> Option<Target> {
        self.targets.insert(placeholder.into(), target)
    }

    pub fn get(&self, placeholder: &str) -> Option<&Target> {
        self.targets.get(placeholder)
    }

    pub fn contains(&self, placeholder: &str) -> bool {
        self.targets.contains_key(placeholder)
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Target)> {
        self.targets.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Bare target names that come from an import.
    ///
    /// Substitution writes them unqualified, so the checker has to know
    /// them as external types. Sorted for deterministic diagnostics.
    pub fn external_names(&self) -> Vec<String> {
        let names: FxHashSet<&str> = self
            .targets
            .values()
            .filter(|t| t.import_path().is_some() && t.qualified().is_none())
            .map(|t| t.ident.as_str())
            .collect();
        let mut names: Vec<String> = names.into_iter().map(str::to_string).collect();
        names.sort();
        names
    }

    /// `(name, import path)` for every name of [`external_names`](Self::external_names).
    ///
    /// A name bound from two paths keeps the first path in sorted order.
    pub fn external_imports(&self) -> Vec<(String, String)> {
        let mut imports: Vec<(String, String)> = self
            .targets
            .values()
            .filter(|t| t.qualified().is_none())
            .filter_map(|t| Some((t.ident.clone(), t.import_path()?.to_string())))
            .collect();
        imports.sort();
        imports.dedup_by(|a, b| a.0 == b.0);
        imports
    }
}

impl FromIterator<(String, Target)> for TypeSubstitutionMap {
    fn from_iter<I: IntoIterator<Item = (String, Target)>>(iter: I) -> Self {
        Self {
            targets: iter.into_iter().collect(),
        }
    }
}

/// Parse `Placeholder=Ident` or `Placeholder=Ident@import/path`.
pub fn parse_binding(binding: &str) -> Result<(String, Target)> {
    let Some((placeholder, rest)) = binding.split_once('=') else {
        return Err(GenerateError::config(format!(
            "binding {binding:?} must have the form Placeholder=Type[@import]"
        )));
    };
    let (ident, import) = match rest.split_once('@') {
        Some((ident, import)) => (ident, Some(import)),
        None => (rest, None),
    };
    let (placeholder, ident) = (placeholder.trim(), ident.trim());
    if placeholder.is_empty() || ident.is_empty() {
        return Err(GenerateError::config(format!(
            "binding {binding:?} has an empty placeholder or type"
        )));
    }
    let target = match import.map(str::trim).filter(|i| !i.is_empty()) {
        Some(import) => Target::with_import(ident, import),
        None => Target::new(ident),
    };
    Ok((placeholder.to_string(), target))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bindings() {
        let (name, target) = parse_binding("Item=MyRecord@example.com/extpkg").unwrap();
        assert_eq!(name, "Item");
        assert_eq!(target, Target::with_import("MyRecord", "example.com/extpkg"));

        let (_, target) = parse_binding("Key=int").unwrap();
        assert_eq!(target, Target::new("int"));
        assert_eq!(target.to_string(), "int");
    }

    #[test]
    fn rejects_malformed_bindings() {
        for binding in ["Item", "=int", "Item=", "Item=@pkg"] {
            assert!(
                matches!(parse_binding(binding), Err(GenerateError::Config(_))),
                "{binding}"
            );
        }
    }

    #[test]
    fn duplicate_placeholder_is_an_error() {
        let result = TypeSubstitutionMap::from_bindings(["Item=int", "Item=string"]);
        assert!(matches!(result, Err(GenerateError::Config(_))));
    }

    #[test]
    fn external_imports_pair_bare_names_with_paths() {
        let map = TypeSubstitutionMap::from_bindings([
            "Item=MyRecord@example.com/extpkg",
            "Key=extpkg.Key@example.com/extpkg",
            "Value=int",
        ])
        .unwrap();
        assert_eq!(
            map.external_imports(),
            [("MyRecord".to_string(), "example.com/extpkg".to_string())]
        );
        assert_eq!(map.external_names(), ["MyRecord"]);
    }

    #[test]
    fn qualified_targets() {
        let target = Target::with_import("extpkg.MyRecord", "example.com/extpkg");
        assert_eq!(target.qualified(), Some(("extpkg", "MyRecord")));
        assert_eq!(target.local_name(), "MyRecord");
        assert_eq!(Target::new("MyRecord").local_name(), "MyRecord");
    }

    #[test]
    fn external_names_are_bare_imported_targets() {
        let map = TypeSubstitutionMap::from_bindings([
            "A=MyRecord@extpkg",
            "B=other.Thing@example.com/other",
            "C=int",
            "D=MyRecord@extpkg",
        ])
        .unwrap();
        assert_eq!(map.external_names(), vec!["MyRecord".to_string()]);
        assert!(map.contains("C"));
        assert!(map.get("E").is_none());
    }
}
