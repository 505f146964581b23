//! Run configuration: environment, destination and options.

use std::env;
use std::path::{Path, PathBuf};

use crate::error::{GenerateError, Result};

/// Environment values consulted by a run.
///
/// Read once with [`Environment::from_process`], or built explicitly so
/// tests do not depend on the process environment.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `GOPATH`: root for logical template paths.
    pub gopath: Option<PathBuf>,
    /// `GOPACKAGE`: output package name in same-directory mode.
    pub gopackage: Option<String>,
}

impl Environment {
    pub fn from_process() -> Self {
        let non_empty = |name: &str| env::var(name).ok().filter(|v| !v.is_empty());
        Self {
            gopath: non_empty("GOPATH").map(PathBuf::from),
            gopackage: non_empty("GOPACKAGE"),
        }
    }

    /// Locate a template package.
    ///
    /// Absolute paths and paths starting with `./` or `../` are used as
    /// given (relative ones against `work_dir`); anything else is a logical
    /// path under `$GOPATH/src`.
    pub fn template_dir(&self, template: &str, work_dir: &Path) -> Result<PathBuf> {
        let path = Path::new(template);
        if path.is_absolute() {
            return Ok(path.to_path_buf());
        }
        if template == "." || template == ".." || template.starts_with("./") || template.starts_with("../") {
            return Ok(work_dir.join(path));
        }
        match &self.gopath {
            Some(gopath) => Ok(gopath.join("src").join(path)),
            None => Err(GenerateError::config(format!(
                "GOPATH is not set; cannot locate template package {template}"
            ))),
        }
    }
}

/// How output is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmitMode {
    /// A fresh package directory replacing any previous one.
    NewPackage { path: PathBuf },
    /// `<prefix>_<file>` siblings in the working directory.
    SameDir { prefix: String },
}

/// Where and under which package name the concrete module goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub new_name: String,
    pub mode: EmitMode,
}

impl Destination {
    /// Interpret the destination argument.
    ///
    /// A leading `.` selects same-directory mode: the rest (without a
    /// following `/`) is the file prefix and `GOPACKAGE` the package name.
    /// Otherwise the argument is the new package directory and its last
    /// segment the package name.
    pub fn parse(dest: &str, env: &Environment, work_dir: &Path) -> Result<Self> {
        if let Some(rest) = dest.strip_prefix('.') {
            let prefix = rest.strip_prefix('/').unwrap_or(rest);
            if prefix.is_empty() {
                return Err(GenerateError::config(format!(
                    "destination {dest:?} selects same-directory mode but has no prefix"
                )));
            }
            let Some(new_name) = env.gopackage.clone() else {
                return Err(GenerateError::config("GOPACKAGE cannot be empty"));
            };
            return Ok(Self {
                new_name,
                mode: EmitMode::SameDir {
                    prefix: prefix.to_string(),
                },
            });
        }

        let path = work_dir.join(dest);
        let new_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .ok_or_else(|| GenerateError::config(format!("destination {dest:?} has no package name")))?
            .to_string();
        Ok(Self {
            new_name,
            mode: EmitMode::NewPackage { path },
        })
    }

    pub fn is_same_dir(&self) -> bool {
        matches!(self.mode, EmitMode::SameDir { .. })
    }

    /// Prefix of same-directory mode.
    pub fn prefix(&self) -> Option<&str> {
        match &self.mode {
            EmitMode::SameDir { prefix } => Some(prefix),
            EmitMode::NewPackage { .. } => None,
        }
    }

    /// File name an input file is written under.
    pub fn output_name(&self, base: &str) -> String {
        match &self.mode {
            EmitMode::SameDir { prefix } => format!("{prefix}_{base}"),
            EmitMode::NewPackage { .. } => base.to_string(),
        }
    }
}

/// How the rewritten trees are made consistent again.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StabilizeMode {
    /// Re-resolve the mutated trees directly.
    #[default]
    Resolve,
    /// Print every tree, reparse the text, then resolve.
    Reparse,
}

/// Options of a [`Generator`](crate::Generator).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Directory relative paths are resolved against; also the output
    /// directory in same-directory mode.
    pub work_dir: PathBuf,
    pub stabilize: StabilizeMode,
}

impl Options {
    pub fn new(work_dir: impl Into<PathBuf>) -> Self {
        Self {
            work_dir: work_dir.into(),
            stabilize: StabilizeMode::default(),
        }
    }

    /// Options for the process's current directory.
    pub fn from_current_dir() -> Result<Self> {
        let dir = env::current_dir().map_err(|e| GenerateError::io(".", e))?;
        Ok(Self::new(dir))
    }

    pub fn with_stabilize(mut self, mode: StabilizeMode) -> Self {
        self.stabilize = mode;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(gopackage: Option<&str>) -> Environment {
        Environment {
            gopath: Some(PathBuf::from("/go")),
            gopackage: gopackage.map(str::to_string),
        }
    }

    #[test]
    fn new_package_destination() {
        let dest = Destination::parse("out/intset", &env(None), Path::new("/work")).unwrap();
        assert_eq!(dest.new_name, "intset");
        assert_eq!(
            dest.mode,
            EmitMode::NewPackage {
                path: PathBuf::from("/work/out/intset")
            }
        );
        assert_eq!(dest.output_name("set.go"), "set.go");
    }

    #[test]
    fn same_dir_destination() {
        let dest = Destination::parse("./gen", &env(Some("main")), Path::new("/work")).unwrap();
        assert_eq!(dest.new_name, "main");
        assert_eq!(dest.prefix(), Some("gen"));
        assert_eq!(dest.output_name("set.go"), "gen_set.go");

        let dest = Destination::parse(".gen", &env(Some("main")), Path::new("/work")).unwrap();
        assert_eq!(dest.prefix(), Some("gen"));
    }

    #[test]
    fn same_dir_requires_gopackage_and_prefix() {
        let missing = Destination::parse("./gen", &env(None), Path::new("/work"));
        assert!(matches!(missing, Err(GenerateError::Config(_))));
        let empty = Destination::parse("./", &env(Some("main")), Path::new("/work"));
        assert!(matches!(empty, Err(GenerateError::Config(_))));
    }

    #[test]
    fn template_locations() {
        let env = env(None);
        let work = Path::new("/work");
        assert_eq!(
            env.template_dir("github.com/u/set", work).unwrap(),
            PathBuf::from("/go/src/github.com/u/set")
        );
        assert_eq!(env.template_dir("./tmpl", work).unwrap(), PathBuf::from("/work/./tmpl"));
        assert_eq!(env.template_dir("/abs/tmpl", work).unwrap(), PathBuf::from("/abs/tmpl"));

        let no_gopath = Environment::default();
        assert!(matches!(
            no_gopath.template_dir("github.com/u/set", work),
            Err(GenerateError::Config(_))
        ));
    }
}
