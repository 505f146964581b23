use super::*;
use gotmpl_core::{CheckError, FileId};
use gotmpl_parser::ast::{File, Parser};

fn parse(source: &str, file: u32) -> File {
    Parser::parse_file(source, FileId(file)).unwrap()
}

fn check(source: &str) -> Result<(), CheckErrors> {
    check_with(source, &[])
}

fn check_with(source: &str, externals: &[&str]) -> Result<(), CheckErrors> {
    let file = parse(source, 0);
    let externals: Vec<String> = externals.iter().map(|s| s.to_string()).collect();
    check_package(&[&file], &externals, &mut OpaqueImporter::new())
}

fn errors(source: &str) -> Vec<CheckError> {
    match check(source) {
        Ok(()) => panic!("expected errors for:\n{source}"),
        Err(errors) => errors.iter().cloned().collect(),
    }
}

// ============================================================================
// Valid packages
// ============================================================================

#[test]
fn valid_package_passes() {
    let source = r#"package tmpl

import "strings"

type Item struct {
	Name  string
	Count int
}

type List []*Item

func (l List) Len() int { return len(l) }

func (l *List) Add(name string) *Item {
	it := &Item{Name: name}
	*l = append(*l, it)
	return it
}

func Join(l List, sep string) string {
	parts := make([]string, 0, len(l))
	for _, it := range l {
		parts = append(parts, strings.ToUpper(it.Name))
	}
	return strings.Join(parts, sep)
}

const (
	A = iota
	B
)

var total = A + B

func Lookup(m map[string]int, k string) (int, bool) {
	v, ok := m[k]
	return v, ok
}
"#;
    check(source).unwrap();
}

#[test]
fn declaration_order_does_not_matter() {
    let source = "package p\n\nvar x = f()\n\nfunc f() T { return T{} }\n\ntype T struct{ n int }\n";
    check(source).unwrap();
}

#[test]
fn interfaces_and_type_switches() {
    let source = r#"package p

type Stringer interface {
	String() string
}

type Name string

func (n Name) String() string { return string(n) }

func Describe(v interface{}) string {
	var s Stringer = Name("x")
	switch t := v.(type) {
	case Stringer:
		return t.String()
	case int:
		return s.String()
	}
	return ""
}
"#;
    check(source).unwrap();
}

#[test]
fn named_results_allow_bare_return() {
    check("package p\n\nfunc f() (n int, err error) {\n\tn = 1\n\treturn\n}\n").unwrap();
}

#[test]
fn closures_check_their_own_returns() {
    let source = "package p\n\nfunc f() int {\n\tg := func() string { return \"a\" }\n\t_ = g()\n\treturn 1\n}\n";
    check(source).unwrap();
}

// ============================================================================
// Opaque types
// ============================================================================

#[test]
fn external_placeholder_passes_every_check() {
    let source = r#"package tmpl

type Set struct {
	items map[Elem]bool
}

func (s *Set) Add(e Elem) { s.items[e] = true }

func (s *Set) Bigger(e Elem, f Elem) bool { return e.Size() > f.Size() }
"#;
    check_with(source, &["Elem"]).unwrap();
}

#[test]
fn imported_types_are_opaque() {
    let source = "package p\n\nimport \"example.com/ext\"\n\nfunc f(r ext.Record) int {\n\treturn r.Count + r.Extra()\n}\n";
    check(source).unwrap();
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn arithmetic_on_struct_fails() {
    let source = "package p\n\ntype S struct{ n int }\n\nfunc f(a, b S) S {\n\treturn a + b\n}\n";
    let errors = errors(source);
    assert!(
        errors.iter().any(|e| matches!(e, CheckError::InvalidOperation { message, .. } if message.contains("operator +"))),
        "{errors:?}"
    );
}

#[test]
fn mismatched_operands_fail() {
    let errors = errors("package p\n\nfunc f(a int, b string) {\n\t_ = a + b\n}\n");
    let [CheckError::TypeMismatch { message, .. }] = errors.as_slice() else {
        panic!("{errors:?}");
    };
    assert!(message.contains("mismatched types int and string"), "{message}");
}

#[test]
fn unknown_field() {
    let errors = errors("package p\n\ntype S struct{ n int }\n\nfunc f(s S) int {\n\treturn s.m\n}\n");
    assert!(
        matches!(errors.as_slice(), [CheckError::UnknownField { name, .. }] if name == "m"),
        "{errors:?}"
    );
}

#[test]
fn argument_count() {
    let errors = errors("package p\n\nfunc g(a, b int) {}\n\nfunc f() {\n\tg(1)\n}\n");
    assert!(
        matches!(
            errors.as_slice(),
            [CheckError::ArgumentCount {
                expected: 2,
                got: 1,
                ..
            }]
        ),
        "{errors:?}"
    );
}

#[test]
fn return_count() {
    let errors = errors("package p\n\nfunc f() (int, string) {\n\treturn 1\n}\n");
    assert!(
        matches!(
            errors.as_slice(),
            [CheckError::ReturnCount {
                expected: 2,
                got: 1,
                ..
            }]
        ),
        "{errors:?}"
    );
}

#[test]
fn package_mismatch() {
    let a = parse("package one\n", 0);
    let b = parse("package two\n", 1);
    let errors = check_package(&[&a, &b], &[], &mut OpaqueImporter::new()).unwrap_err();
    assert!(
        errors
            .iter()
            .any(|e| matches!(e, CheckError::PackageMismatch { found, expected, .. } if found == "two" && expected == "one")),
        "{errors:?}"
    );
}

#[test]
fn value_used_as_type() {
    let errors = errors("package p\n\nvar v int\n\nfunc f(x v) {}\n");
    assert!(
        errors.iter().any(|e| matches!(e, CheckError::NotAType { .. })),
        "{errors:?}"
    );
}

#[test]
fn calling_a_non_function() {
    let errors = errors("package p\n\nfunc f() {\n\tx := 1\n\tx()\n}\n");
    assert!(
        errors.iter().any(|e| matches!(e, CheckError::NotCallable { .. })),
        "{errors:?}"
    );
}

#[test]
fn invalid_conversion() {
    let errors = errors("package p\n\ntype S struct{}\n\nfunc f(s S) int {\n\treturn int(s)\n}\n");
    assert!(
        matches!(errors.as_slice(), [CheckError::InvalidConversion { to, .. }] if to == "int"),
        "{errors:?}"
    );
}

#[test]
fn unused_expression_statement() {
    let errors = errors("package p\n\nfunc f(a int) {\n\ta + 1\n}\n");
    assert!(
        matches!(errors.as_slice(), [CheckError::Other { message, .. }] if message.contains("is not used")),
        "{errors:?}"
    );
}

#[test]
fn assignment_to_non_variable() {
    let errors = errors("package p\n\nconst c = 1\n\nfunc f() {\n\tc = 2\n}\n");
    assert!(
        errors.iter().any(|e| matches!(e, CheckError::NotAssignable { .. })),
        "{errors:?}"
    );
}

#[test]
fn non_boolean_condition() {
    let errors = errors("package p\n\nfunc f(n int) {\n\tif n {\n\t}\n}\n");
    assert!(
        matches!(errors.as_slice(), [CheckError::Other { message, .. }] if message.contains("non-boolean condition in if")),
        "{errors:?}"
    );
}

#[test]
fn missing_method_is_not_an_implementation() {
    let source = "package p\n\ntype I interface{ M() }\n\ntype T struct{}\n\nvar _ I = T{}\n";
    let errors = errors(source);
    assert!(
        matches!(errors.as_slice(), [CheckError::TypeMismatch { .. }]),
        "{errors:?}"
    );
}

#[test]
fn errors_are_sorted_and_reported_once() {
    let source = "package p\n\nvar a = b + \"x\"\n\nvar b = 1\n\nfunc f() int { return \"s\" }\n";
    let errors = check(source).unwrap_err();
    let spans: Vec<_> = errors
        .iter()
        .map(|e| (e.span().file, e.span().line, e.span().col))
        .collect();
    let mut sorted = spans.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(spans, sorted);
}

// ============================================================================
// Imported packages read from source
// ============================================================================

struct ExtPkg;

impl PackageSource for ExtPkg {
    fn load(&mut self, path: &str) -> Option<Vec<File>> {
        let source = "package extpkg\n\ntype MyRecord struct {\n\tName string\n}\n\nfunc (r MyRecord) Len() int {\n\treturn 0\n}\n";
        (path == "example.com/extpkg").then(|| vec![parse(source, 9)])
    }
}

fn check_imported(source: &str, externals: &[&str]) -> Result<(), CheckErrors> {
    let file = parse(source, 0);
    let names: Vec<String> = externals.iter().map(|s| s.to_string()).collect();
    let mut importer =
        SourceImporter::new(ExtPkg).with_externals(externals.iter().map(|name| (*name, "example.com/extpkg")));
    check_package(&[&file], &names, &mut importer)
}

#[test]
fn arithmetic_on_imported_struct() {
    let qualified = "package p\n\nimport \"example.com/extpkg\"\n\nfunc Add(a, b extpkg.MyRecord) extpkg.MyRecord {\n\treturn a + b\n}\n";
    let errors = check_imported(qualified, &[]).unwrap_err();
    assert!(
        errors.iter().any(|e| matches!(e, CheckError::InvalidOperation { .. })),
        "{errors:?}"
    );

    let bare = "package p\n\nimport \"example.com/extpkg\"\n\nfunc Add(a, b MyRecord) MyRecord {\n\treturn a + b\n}\n";
    assert!(check_imported(bare, &["MyRecord"]).is_err());
}

#[test]
fn imported_fields_and_methods_are_visible() {
    let source = "package p\n\nimport \"example.com/extpkg\"\n\nfunc Describe(r extpkg.MyRecord) (string, int) {\n\treturn r.Name, r.Len()\n}\n";
    check_imported(source, &[]).unwrap();

    let missing = "package p\n\nimport \"example.com/extpkg\"\n\nfunc Size(r extpkg.MyRecord) int {\n\treturn r.Size\n}\n";
    assert!(check_imported(missing, &[]).is_err());
}

#[test]
fn unavailable_imports_stay_permissive() {
    let source = "package p\n\nimport \"example.com/other\"\n\nfunc Add(a, b other.Thing) other.Thing {\n\treturn a + b\n}\n";
    check_imported(source, &[]).unwrap();
}
