//! One generation run, from template directory to written files.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use gotmpl_checker::SourceImporter;
use gotmpl_core::SourceMap;

use crate::config::{Destination, Environment, Options};
use crate::emit::emit;
use crate::error::Result;
use crate::loader::{GopathPackages, load_package};
use crate::package::StablePackage;
use crate::rewrite::Rewriter;
use crate::stabilize::stabilize;
use crate::stubs::extract_stubs;
use crate::substitution::TypeSubstitutionMap;
use crate::validate::validate;

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub destination: Destination,
    /// Written files, in emission order.
    pub written: Vec<PathBuf>,
}

/// Instantiates template packages.
///
/// Every run owns a fresh [`SourceMap`]; nothing carries over between runs.
#[derive(Debug, Clone)]
pub struct Generator {
    env: Environment,
    options: Options,
}

impl Generator {
    pub fn new(env: Environment, options: Options) -> Self {
        Self { env, options }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Instantiate `template` into `dest`, dumping diagnostics to stderr.
    pub fn run(&self, template: &str, dest: &str, map: &TypeSubstitutionMap) -> Result<Report> {
        self.run_with_diagnostics(template, dest, map, &mut io::stderr().lock())
    }

    /// Instantiate `template` into `dest`, dumping diagnostics to `sink`.
    ///
    /// Stages run strictly in order and the first error ends the run.
    /// Nothing is written before validation succeeded.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn run_with_diagnostics(
        &self,
        template: &str,
        dest: &str,
        map: &TypeSubstitutionMap,
        sink: &mut dyn Write,
    ) -> Result<Report> {
        let work_dir = &self.options.work_dir;
        let template_dir = self.env.template_dir(template, work_dir)?;
        let destination = Destination::parse(dest, &self.env, work_dir)?;
        tracing::info!(
            template = %template_dir.display(),
            package = %destination.new_name,
            same_dir = destination.is_same_dir(),
            bindings = map.len(),
            "instantiating template"
        );

        let mut sources = SourceMap::new();
        let (package, externals) = self.prepare(&mut sources, &template_dir, &destination, map, sink)?;

        let stubs = if destination.is_same_dir() {
            let outputs: Vec<String> = package
                .files()
                .iter()
                .map(|unit| destination.output_name(unit.base_name()))
                .collect();
            extract_stubs(&mut sources, work_dir, &outputs)?
        } else {
            Vec::new()
        };

        let mut importer = SourceImporter::new(GopathPackages::new(self.env.gopath.clone()))
            .with_externals(map.external_imports());
        validate(&package, &stubs, &externals, &mut importer, &sources, sink)?;
        let written = emit(&package, &destination, work_dir)?;
        Ok(Report { destination, written })
    }

    /// Load, rewrite and stabilize. Returns the stable package and the
    /// external type names it was resolved with.
    fn prepare(
        &self,
        sources: &mut SourceMap,
        template_dir: &Path,
        destination: &Destination,
        map: &TypeSubstitutionMap,
        sink: &mut dyn Write,
    ) -> Result<(StablePackage, Vec<String>)> {
        let loaded = load_package(sources, template_dir)?;
        let rewritten = Rewriter::new(map, destination).rewrite(loaded);
        let externals = map.external_names();
        let stable = stabilize(rewritten, self.options.stabilize, sources, &externals, sink)?;
        Ok((stable, externals))
    }
}
