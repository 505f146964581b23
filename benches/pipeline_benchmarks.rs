//! Performance benchmarks for the instantiation pipeline.
//!
//! - Parsing and printing a template file
//! - Rewriting a loaded package
//! - Stabilizing by re-resolution versus print-and-reparse
//! - Type-checking the rewritten package

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use gotmpl::config::{Destination, EmitMode, StabilizeMode};
use gotmpl::loader::load_package;
use gotmpl::rewrite::Rewriter;
use gotmpl::stabilize::stabilize;
use gotmpl::validate::validate;
use gotmpl::{LoadedPackage, StablePackage, TypeSubstitutionMap};
use gotmpl_checker::OpaqueImporter;
use gotmpl_core::SourceMap;
use gotmpl_parser::{parse_source, printer::print_file};
use std::hint::black_box;
use std::path::{Path, PathBuf};

fn template_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("test_templates").join("list")
}

fn map() -> TypeSubstitutionMap {
    TypeSubstitutionMap::from_bindings(["Item=MyRecord@extpkg"]).unwrap()
}

fn destination() -> Destination {
    Destination {
        new_name: "records".to_string(),
        mode: EmitMode::NewPackage {
            path: PathBuf::from("records"),
        },
    }
}

fn load(sources: &mut SourceMap) -> LoadedPackage {
    load_package(sources, &template_dir()).unwrap()
}

fn stable(sources: &mut SourceMap, externals: &[String]) -> StablePackage {
    let map = map();
    let destination = destination();
    let rewritten = Rewriter::new(&map, &destination).rewrite(load(sources));
    stabilize(rewritten, StabilizeMode::Resolve, sources, externals, &mut Vec::new()).unwrap()
}

/// Benchmark the front end on a single template file
fn syntax_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/syntax");

    let list = include_str!("../test_templates/list/list.go");
    group.throughput(Throughput::Bytes(list.len() as u64));
    group.bench_function("parse", |b| {
        b.iter(|| black_box(parse_source(black_box(list)).unwrap().decls.len()));
    });

    let file = parse_source(list).unwrap();
    group.bench_function("print", |b| {
        b.iter(|| black_box(print_file(black_box(&file)).len()));
    });

    group.finish();
}

/// Benchmark the rewrite passes and both stabilization strategies
fn rewrite_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/rewrite");
    let map = map();
    let destination = destination();
    let same_dir = Destination {
        new_name: "main".to_string(),
        mode: EmitMode::SameDir {
            prefix: "gen".to_string(),
        },
    };

    group.bench_function("new_package", |b| {
        b.iter_batched(
            || load(&mut SourceMap::new()),
            |package| black_box(Rewriter::new(&map, &destination).rewrite(package)),
            criterion::BatchSize::SmallInput,
        );
    });

    group.bench_function("same_dir", |b| {
        b.iter_batched(
            || load(&mut SourceMap::new()),
            |package| black_box(Rewriter::new(&map, &same_dir).rewrite(package)),
            criterion::BatchSize::SmallInput,
        );
    });

    let externals = map.external_names();
    for mode in [StabilizeMode::Resolve, StabilizeMode::Reparse] {
        group.bench_function(format!("stabilize_{mode:?}").to_lowercase(), |b| {
            b.iter_batched(
                || {
                    let mut sources = SourceMap::new();
                    let rewritten = Rewriter::new(&map, &destination).rewrite(load(&mut sources));
                    (sources, rewritten)
                },
                |(mut sources, rewritten)| {
                    black_box(stabilize(rewritten, mode, &mut sources, &externals, &mut Vec::new()).unwrap())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

/// Benchmark validation of the rewritten package
fn check_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/check");
    let externals = map().external_names();
    let mut sources = SourceMap::new();
    let package = stable(&mut sources, &externals);

    group.bench_function("validate", |b| {
        b.iter(|| {
            let mut importer = OpaqueImporter::new();
            validate(black_box(&package), &[], &externals, &mut importer, &sources, &mut Vec::new()).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, syntax_benchmarks, rewrite_benchmarks, check_benchmarks);
criterion_main!(benches);
