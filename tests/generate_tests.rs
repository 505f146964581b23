//! End-to-end tests: template packages under `test_templates/` are
//! instantiated into scratch directories and the written files inspected.

use std::fs;
use std::path::{Path, PathBuf};

use gotmpl::{
    Environment, GenerateError, Generator, Options, Report, StabilizeMode, TypeSubstitutionMap,
};

/// Absolute path of a fixture template.
fn template(name: &str) -> String {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("test_templates")
        .join(name)
        .display()
        .to_string()
}

fn bindings(bindings: &[&str]) -> TypeSubstitutionMap {
    TypeSubstitutionMap::from_bindings(bindings).unwrap()
}

fn generator(work_dir: &Path, gopackage: Option<&str>) -> Generator {
    let env = Environment {
        gopath: None,
        gopackage: gopackage.map(str::to_string),
    };
    Generator::new(env, Options::new(work_dir))
}

fn run(
    generator: &Generator,
    name: &str,
    dest: &str,
    map: &TypeSubstitutionMap,
) -> (Result<Report, GenerateError>, String) {
    let mut sink = Vec::new();
    let result = generator.run_with_diagnostics(&template(name), dest, map, &mut sink);
    (result, String::from_utf8(sink).unwrap())
}

fn read(path: impl AsRef<Path>) -> String {
    let path = path.as_ref();
    fs::read_to_string(path).unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e))
}

fn listing(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

// =============================================================================
// New-package mode
// =============================================================================

#[test]
fn test_substitutes_external_record() {
    let work = tempfile::tempdir().unwrap();
    let (result, diagnostics) = run(
        &generator(work.path(), None),
        "pair",
        "records",
        &bindings(&["Item=MyRecord@extpkg"]),
    );
    let report = result.unwrap_or_else(|e| panic!("{e}\n{diagnostics}"));

    let dest = work.path().join("records");
    assert_eq!(report.destination.new_name, "records");
    assert_eq!(report.written, [dest.join("pair.go")]);
    assert_eq!(
        read(dest.join("pair.go")),
        "package records\n\nimport \"extpkg\"\n\nfunc Identity(i MyRecord) MyRecord {\n\treturn i\n}\n\nfunc Both(a, b MyRecord) (MyRecord, MyRecord) {\n\treturn a, b\n}\n"
    );
    assert!(diagnostics.is_empty());
}

#[test]
fn test_multi_file_template_with_existing_imports() {
    let work = tempfile::tempdir().unwrap();
    let (result, diagnostics) = run(
        &generator(work.path(), None),
        "list",
        "out/records",
        &bindings(&["Item=MyRecord@extpkg"]),
    );
    result.unwrap_or_else(|e| panic!("{e}\n{diagnostics}"));

    let dest = work.path().join("out").join("records");
    assert_eq!(listing(&dest), ["each.go", "list.go"], "test files are not templates");

    let list = read(dest.join("list.go"));
    assert!(list.starts_with("// Package list is a template for typed lists.\npackage records\n"));
    assert!(list.contains("import (\n\t\"extpkg\"\n\t\"sort\"\n)\n"), "{list}");
    assert_eq!(list.matches("\"extpkg\"").count(), 1);
    assert!(!list.contains("type Item"), "{list}");
    assert!(!list.contains("Item "), "{list}");
    assert!(list.contains("\titems []MyRecord\n"), "{list}");
    assert!(list.contains("func (l *List) Sorted(less func(a, b MyRecord) bool) []MyRecord {"), "{list}");

    let each = read(dest.join("each.go"));
    assert!(each.starts_with("package records\n\nimport \"extpkg\"\n"), "{each}");
    assert!(each.contains("func Each(l *List, f func(MyRecord) bool) int {"), "{each}");
}

#[test]
fn test_partial_substitution_leaves_unmapped_placeholders() {
    let work = tempfile::tempdir().unwrap();
    let (result, diagnostics) = run(
        &generator(work.path(), None),
        "pair",
        "same",
        &bindings(&["Other=int64"]),
    );
    result.unwrap_or_else(|e| panic!("{e}\n{diagnostics}"));
    let out = read(work.path().join("same").join("pair.go"));
    assert!(out.starts_with("package same\n\ntype Item int\n"), "{out}");
}

#[test]
fn test_rerun_is_byte_identical() {
    let work = tempfile::tempdir().unwrap();
    let generator = generator(work.path(), None);
    let map = bindings(&["Item=MyRecord@extpkg"]);

    run(&generator, "list", "records", &map).0.unwrap();
    let first: Vec<String> = ["each.go", "list.go"]
        .iter()
        .map(|f| read(work.path().join("records").join(f)))
        .collect();

    run(&generator, "list", "records", &map).0.unwrap();
    let second: Vec<String> = ["each.go", "list.go"]
        .iter()
        .map(|f| read(work.path().join("records").join(f)))
        .collect();

    assert_eq!(first, second);
    assert_eq!(listing(work.path()), ["records"], "staging directory left behind");
}

#[test]
fn test_stabilize_modes_agree() {
    let map = bindings(&["Item=MyRecord@extpkg"]);
    let mut outputs = Vec::new();
    for mode in [StabilizeMode::Resolve, StabilizeMode::Reparse] {
        let work = tempfile::tempdir().unwrap();
        let env = Environment::default();
        let generator = Generator::new(env, Options::new(work.path()).with_stabilize(mode));
        let mut sink = Vec::new();
        generator
            .run_with_diagnostics(&template("list"), "records", &map, &mut sink)
            .unwrap();
        outputs.push((
            read(work.path().join("records/list.go")),
            read(work.path().join("records/each.go")),
        ));
    }
    assert_eq!(outputs[0], outputs[1]);
}

// =============================================================================
// Same-directory mode
// =============================================================================

#[test]
fn test_same_dir_prefixes_top_level_names() {
    let work = tempfile::tempdir().unwrap();
    fs::write(work.path().join("main.go"), "package main\n\nfunc main() {\n}\n").unwrap();

    let (result, diagnostics) = run(
        &generator(work.path(), Some("main")),
        "process",
        ".gen",
        &bindings(&["Item=int64"]),
    );
    let report = result.unwrap_or_else(|e| panic!("{e}\n{diagnostics}"));
    assert_eq!(
        report.written,
        [work.path().join("gen_process.go"), work.path().join("gen_run.go")]
    );
    assert_eq!(listing(work.path()), ["gen_process.go", "gen_run.go", "main.go"]);

    assert_eq!(
        read(work.path().join("gen_process.go")),
        "package main\n\n// Process doubles every item.\nfunc gen_Process(items []int64) []int64 {\n\tout := make([]int64, 0, len(items))\n\tfor _, it := range items {\n\t\tout = append(out, gen_double(it))\n\t}\n\treturn out\n}\n\nfunc gen_double(it int64) int64 {\n\treturn it + it\n}\n"
    );
    assert_eq!(
        read(work.path().join("gen_run.go")),
        "package main\n\nvar gen_processed = 0\n\nfunc gen_Run(items []int64) int {\n\tgen_processed += len(gen_Process(items))\n\treturn gen_processed\n}\n"
    );
    assert_eq!(read(work.path().join("main.go")), "package main\n\nfunc main() {\n}\n");
}

#[test]
fn test_distinct_prefixes_coexist() {
    let work = tempfile::tempdir().unwrap();
    let generator = generator(work.path(), Some("main"));

    run(&generator, "process", ".ints", &bindings(&["Item=int64"])).0.unwrap();
    // The second run sees the first run's output as siblings.
    let (result, diagnostics) = run(&generator, "process", "./floats", &bindings(&["Item=float64"]));
    result.unwrap_or_else(|e| panic!("{e}\n{diagnostics}"));

    assert_eq!(
        listing(work.path()),
        ["floats_process.go", "floats_run.go", "ints_process.go", "ints_run.go"]
    );
    assert!(read(work.path().join("floats_process.go")).contains("func floats_Process(items []float64) []float64 {"));
}

#[test]
fn test_sibling_types_resolve_through_stubs() {
    let output_with_sibling = |sibling: &str| {
        let work = tempfile::tempdir().unwrap();
        fs::write(work.path().join("model.go"), sibling).unwrap();
        let (result, diagnostics) = run(
            &generator(work.path(), Some("main")),
            "process",
            ".gen",
            &bindings(&["Item=Config"]),
        );
        result.unwrap_or_else(|e| panic!("{e}\n{diagnostics}"));
        (
            read(work.path().join("gen_process.go")),
            read(work.path().join("gen_run.go")),
        )
    };

    let numeric = output_with_sibling("package main\n\ntype Config int\n");
    let structured = output_with_sibling(
        "package main\n\nimport \"time\"\n\n// Config is set once at startup.\ntype Config struct {\n\tTimeout time.Duration\n}\n\nfunc (c Config) Valid() bool {\n\treturn c.Timeout > 0\n}\n",
    );
    assert_eq!(numeric, structured);
    assert!(numeric.0.contains("func gen_double(it Config) Config {"), "{}", numeric.0);
}

#[test]
fn test_generic_sibling_does_not_abort() {
    let work = tempfile::tempdir().unwrap();
    let generic = "package main\n\ntype Pair[K comparable, V any] struct {\n\tKey   K\n\tValue V\n}\n";
    fs::write(work.path().join("pair.go"), generic).unwrap();

    let (result, diagnostics) = run(
        &generator(work.path(), Some("main")),
        "process",
        ".gen",
        &bindings(&["Item=int64"]),
    );
    result.unwrap_or_else(|e| panic!("{e}\n{diagnostics}"));
    assert_eq!(listing(work.path()), ["gen_process.go", "gen_run.go", "pair.go"]);
    assert_eq!(read(work.path().join("pair.go")), generic);
}

#[test]
fn test_same_dir_requires_gopackage() {
    let work = tempfile::tempdir().unwrap();
    let (result, _) = run(&generator(work.path(), None), "process", ".gen", &bindings(&["Item=int64"]));
    assert!(matches!(result, Err(GenerateError::Config(_))));
    assert!(listing(work.path()).is_empty());
}

// =============================================================================
// Validation failures
// =============================================================================

#[test]
fn test_arithmetic_on_non_numeric_writes_nothing() {
    let work = tempfile::tempdir().unwrap();
    let (result, diagnostics) = run(&generator(work.path(), None), "sum", "sums", &bindings(&["Item=bool"]));

    let Err(GenerateError::Check(errors)) = result else {
        panic!("expected a check error, got {result:?}");
    };
    assert!(!errors.is_empty());
    assert!(diagnostics.starts_with("// file: sum.go\npackage sums\n"), "{diagnostics}");
    assert!(diagnostics.contains("\ttotal += it\n"), "{diagnostics}");
    assert!(diagnostics.contains("sum.go:8:"), "{diagnostics}");
    assert!(listing(work.path()).is_empty());
}

#[test]
fn test_failed_validation_keeps_previous_output() {
    let work = tempfile::tempdir().unwrap();
    let generator = generator(work.path(), None);

    run(&generator, "sum", "sums", &bindings(&["Item=int"])).0.unwrap();
    let before = read(work.path().join("sums/sum.go"));

    let (result, _) = run(&generator, "sum", "sums", &bindings(&["Item=bool"]));
    assert!(matches!(result, Err(GenerateError::Check(_))));
    assert_eq!(read(work.path().join("sums/sum.go")), before);
    assert_eq!(listing(work.path()), ["sums"]);
}

#[test]
fn test_failed_same_dir_validation_writes_nothing() {
    let work = tempfile::tempdir().unwrap();
    fs::write(work.path().join("main.go"), "package main\n\nfunc main() {\n}\n").unwrap();
    let (result, diagnostics) = run(
        &generator(work.path(), Some("main")),
        "sum",
        ".gen",
        &bindings(&["Item=error"]),
    );
    assert!(matches!(result, Err(GenerateError::Check(_))));
    assert!(diagnostics.contains("// file: sum.go\npackage main\n"), "{diagnostics}");
    assert_eq!(listing(work.path()), ["main.go"]);
}

fn gopath_with_extpkg() -> tempfile::TempDir {
    let gopath = tempfile::tempdir().unwrap();
    let dir = gopath.path().join("src/example.com/extpkg");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("extpkg.go"),
        "package extpkg\n\ntype MyRecord struct {\n\tName string\n}\n\ntype Count int64\n",
    )
    .unwrap();
    gopath
}

#[test]
fn test_arithmetic_on_imported_struct_writes_nothing() {
    let gopath = gopath_with_extpkg();
    for binding in [
        "Item=MyRecord@example.com/extpkg",
        "Item=extpkg.MyRecord@example.com/extpkg",
    ] {
        let work = tempfile::tempdir().unwrap();
        let env = Environment {
            gopath: Some(gopath.path().to_path_buf()),
            gopackage: None,
        };
        let generator = Generator::new(env, Options::new(work.path()));
        let (result, diagnostics) = run(&generator, "sum", "sums", &bindings(&[binding]));

        assert!(matches!(result, Err(GenerateError::Check(_))), "{binding}: {result:?}");
        assert!(diagnostics.contains("sum.go:8:"), "{diagnostics}");
        assert!(listing(work.path()).is_empty(), "{binding}");
    }
}

#[test]
fn test_imported_numeric_type_passes() {
    let gopath = gopath_with_extpkg();
    let work = tempfile::tempdir().unwrap();
    let env = Environment {
        gopath: Some(gopath.path().to_path_buf()),
        gopackage: None,
    };
    let generator = Generator::new(env, Options::new(work.path()));
    let (result, diagnostics) = run(
        &generator,
        "sum",
        "sums",
        &bindings(&["Item=extpkg.Count@example.com/extpkg"]),
    );
    result.unwrap_or_else(|e| panic!("{e}\n{diagnostics}"));
    assert!(read(work.path().join("sums/sum.go")).contains("func Sum(items []extpkg.Count) extpkg.Count {"));
}

// =============================================================================
// Input errors
// =============================================================================

#[test]
fn test_missing_gopath_for_logical_template() {
    let work = tempfile::tempdir().unwrap();
    let result = generator(work.path(), None).run_with_diagnostics(
        "github.com/acme/list",
        "records",
        &bindings(&["Item=int"]),
        &mut Vec::new(),
    );
    assert!(matches!(result, Err(GenerateError::Config(_))));
}

#[test]
fn test_template_without_sources() {
    let work = tempfile::tempdir().unwrap();
    fs::create_dir(work.path().join("empty")).unwrap();
    let result = generator(work.path(), None).run_with_diagnostics(
        "./empty",
        "records",
        &bindings(&["Item=int"]),
        &mut Vec::new(),
    );
    assert!(matches!(result, Err(GenerateError::NoSources { .. })));
}

#[test]
fn test_logical_template_under_gopath() {
    let gopath = tempfile::tempdir().unwrap();
    let src = gopath.path().join("src/example.com/pair");
    fs::create_dir_all(&src).unwrap();
    fs::copy(Path::new(&template("pair")).join("pair.go"), src.join("pair.go")).unwrap();

    let work = tempfile::tempdir().unwrap();
    let env = Environment {
        gopath: Some(gopath.path().to_path_buf()),
        gopackage: None,
    };
    Generator::new(env, Options::new(work.path()))
        .run_with_diagnostics("example.com/pair", "ints", &bindings(&["Item=int"]), &mut Vec::new())
        .unwrap();
    assert!(read(work.path().join("ints/pair.go")).contains("func Identity(i int) int {"));
}
