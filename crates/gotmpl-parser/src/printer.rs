//! Canonical source printer.
//!
//! Renders a syntax tree back to Go source text in a gofmt-like layout:
//! tab indentation, one statement per line, a blank line between top-level
//! declarations. Binary operators are spaced the way gofmt spaces them:
//! operators binding tighter than their surroundings lose their blanks
//! (`1<<3 - 1`, `xs[i+1]`). Columns are not aligned.
//!
//! The layout depends only on the tree, never on the original positions, so
//! printing, reparsing and printing again yields identical text. Doc comments
//! attached to declarations are reproduced; other comments are not kept by
//! the parser and therefore not printed.

use crate::ast::*;
use std::fmt::Write;

/// Print a whole source file.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn print_file(file: &File) -> String {
    let mut printer = Printer::new();
    printer.file(file);
    printer.finish()
}

/// Print a single declaration at top level.
pub fn print_decl(decl: &Decl) -> String {
    let mut printer = Printer::new();
    printer.decl(decl);
    printer.finish()
}

/// Print a single expression (or type) on one line where possible.
pub fn print_expr(expr: &Expr) -> String {
    let mut printer = Printer::new();
    printer.expr(expr);
    printer.out
}

/// Quote an import path as a Go interpreted string literal.
pub fn quote(path: &str) -> String {
    let mut quoted = String::with_capacity(path.len() + 2);
    quoted.push('"');
    for c in path.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

struct Printer {
    out: String,
    indent: usize,
}

impl Printer {
    fn new() -> Self {
        Self {
            out: String::with_capacity(4096),
            indent: 0,
        }
    }

    fn finish(mut self) -> String {
        if !self.out.ends_with('\n') {
            self.out.push('\n');
        }
        self.out
    }

    fn word(&mut self, s: &str) {
        self.out.push_str(s);
    }

    /// Start a new line at the current indentation.
    fn newline(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn line_start(&mut self) {
        for _ in 0..self.indent {
            self.out.push('\t');
        }
    }

    fn comments(&mut self, doc: Option<&CommentGroup>) {
        let Some(doc) = doc else { return };
        for line in &doc.lines {
            self.line_start();
            self.word(line);
            self.out.push('\n');
        }
    }

    // ========================================================================
    // Files and declarations
    // ========================================================================

    fn file(&mut self, file: &File) {
        self.comments(file.doc.as_ref());
        self.word("package ");
        self.word(&file.package.name);
        self.out.push('\n');

        for import in &file.imports {
            self.out.push('\n');
            self.import_decl(import);
        }

        for decl in &file.decls {
            self.out.push('\n');
            self.decl(decl);
        }
    }

    fn import_decl(&mut self, decl: &ImportDecl) {
        if decl.grouped || decl.specs.len() > 1 {
            self.word("import (");
            self.indent += 1;
            for spec in &decl.specs {
                self.newline();
                self.import_spec(spec);
            }
            self.indent -= 1;
            self.newline();
            self.word(")\n");
        } else if let Some(spec) = decl.specs.first() {
            self.word("import ");
            self.import_spec(spec);
            self.out.push('\n');
        }
    }

    fn import_spec(&mut self, spec: &ImportSpec) {
        if let Some(name) = &spec.name {
            self.word(&name.name);
            self.word(" ");
        }
        let quoted = quote(&spec.path);
        self.word(&quoted);
    }

    /// Print a declaration starting at the current indentation, ending with a newline.
    fn decl(&mut self, decl: &Decl) {
        self.comments(decl.doc());
        self.line_start();
        self.decl_body(decl);
        self.out.push('\n');
    }

    /// Print a declaration without leading indentation or trailing newline.
    fn decl_body(&mut self, decl: &Decl) {
        match decl {
            Decl::Func(func) => self.func_decl(func),
            Decl::Type(decl) => {
                self.group("type", decl.grouped || decl.specs.len() != 1, &decl.specs, |p, spec| {
                    p.type_spec(spec)
                })
            }
            Decl::Var(decl) => {
                self.group("var", decl.grouped || decl.specs.len() != 1, &decl.specs, |p, spec| {
                    p.value_spec(spec)
                })
            }
            Decl::Const(decl) => {
                self.group("const", decl.grouped || decl.specs.len() != 1, &decl.specs, |p, spec| {
                    p.value_spec(spec)
                })
            }
        }
    }

    fn group<T>(&mut self, keyword: &str, grouped: bool, specs: &[T], mut spec_fn: impl FnMut(&mut Self, &T)) {
        self.word(keyword);
        if !grouped {
            self.word(" ");
            if let Some(spec) = specs.first() {
                spec_fn(self, spec);
            }
            return;
        }
        self.word(" (");
        self.indent += 1;
        for spec in specs {
            self.newline();
            spec_fn(self, spec);
        }
        self.indent -= 1;
        self.newline();
        self.word(")");
    }

    fn type_spec(&mut self, spec: &TypeSpec) {
        self.word(&spec.name.name);
        self.word(if spec.assign { " = " } else { " " });
        self.expr(&spec.ty);
    }

    fn value_spec(&mut self, spec: &ValueSpec) {
        self.ident_list(&spec.names);
        if let Some(ty) = &spec.ty {
            self.word(" ");
            self.expr(ty);
        }
        if !spec.values.is_empty() {
            self.word(" = ");
            self.expr_list(&spec.values);
        }
    }

    fn func_decl(&mut self, func: &FuncDecl) {
        self.word("func ");
        if let Some(recv) = &func.recv {
            self.word("(");
            self.field(recv);
            self.word(") ");
        }
        self.word(&func.name.name);
        self.signature(&func.ty);
        if let Some(body) = &func.body {
            self.word(" ");
            self.block(body);
        }
    }

    // ========================================================================
    // Statements
    // ========================================================================

    fn block(&mut self, block: &Block) {
        self.word("{");
        self.stmt_lines(&block.stmts);
        self.newline();
        self.word("}");
    }

    /// Print statements one per line, one level deeper than the current indentation.
    fn stmt_lines(&mut self, stmts: &[Stmt]) {
        self.indent += 1;
        for stmt in stmts {
            if matches!(stmt, Stmt::Empty(_)) {
                continue;
            }
            if let Stmt::Decl(decl) = stmt
                && let Some(doc) = decl.doc()
            {
                for line in &doc.lines {
                    self.newline();
                    self.word(line);
                }
            }
            if let Stmt::Labeled(labeled) = stmt {
                self.indent -= 1;
                self.newline();
                self.indent += 1;
                self.word(&labeled.label.name);
                self.word(":");
                if matches!(labeled.stmt, Stmt::Empty(_)) {
                    continue;
                }
                self.newline();
                self.stmt(&labeled.stmt);
                continue;
            }
            self.newline();
            self.stmt(stmt);
        }
        self.indent -= 1;
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(decl) => self.decl_body(decl),
            Stmt::Labeled(labeled) => {
                self.word(&labeled.label.name);
                self.word(": ");
                self.stmt(&labeled.stmt);
            }
            Stmt::Expr(expr) => self.expr(expr),
            Stmt::Send(s) => {
                self.expr(&s.chan);
                self.word(" <- ");
                self.expr(&s.value);
            }
            Stmt::IncDec(s) => {
                self.expr(&s.expr);
                self.word(if s.inc { "++" } else { "--" });
            }
            Stmt::Assign(s) => {
                let depth = if s.lhs.len() > 1 && s.rhs.len() > 1 { 2 } else { 1 };
                self.expr_list_at(&s.lhs, depth);
                let _ = write!(self.out, " {} ", s.op);
                self.expr_list_at(&s.rhs, depth);
            }
            Stmt::Go(s) => {
                self.word("go ");
                self.expr(&s.call);
            }
            Stmt::Defer(s) => {
                self.word("defer ");
                self.expr(&s.call);
            }
            Stmt::Return(s) => {
                self.word("return");
                if !s.results.is_empty() {
                    self.word(" ");
                    self.expr_list(&s.results);
                }
            }
            Stmt::Branch(s) => {
                self.word(s.kind.as_str());
                if let Some(label) = &s.label {
                    self.word(" ");
                    self.word(&label.name);
                }
            }
            Stmt::Block(block) => self.block(block),
            Stmt::If(s) => self.if_stmt(s),
            Stmt::Switch(s) => {
                self.word("switch ");
                if let Some(init) = &s.init {
                    self.stmt(init);
                    self.word("; ");
                }
                if let Some(tag) = &s.tag {
                    self.expr(tag);
                    self.word(" ");
                }
                self.word("{");
                self.case_clauses(&s.clauses);
                self.newline();
                self.word("}");
            }
            Stmt::TypeSwitch(s) => {
                self.word("switch ");
                if let Some(init) = &s.init {
                    self.stmt(init);
                    self.word("; ");
                }
                if let Some(binding) = &s.binding {
                    self.word(&binding.name);
                    self.word(" := ");
                }
                self.expr(&s.expr);
                self.word(".(type) {");
                self.case_clauses(&s.clauses);
                self.newline();
                self.word("}");
            }
            Stmt::Select(s) => {
                self.word("select {");
                for clause in &s.clauses {
                    self.newline();
                    match &clause.comm {
                        Some(comm) => {
                            self.word("case ");
                            self.stmt(comm);
                            self.word(":");
                        }
                        None => self.word("default:"),
                    }
                    self.stmt_lines(&clause.body);
                }
                self.newline();
                self.word("}");
            }
            Stmt::For(s) => {
                self.word("for ");
                if s.init.is_some() || s.post.is_some() {
                    if let Some(init) = &s.init {
                        self.stmt(init);
                    }
                    self.word("; ");
                    if let Some(cond) = &s.cond {
                        self.expr(cond);
                    }
                    self.word(";");
                    if let Some(post) = &s.post {
                        self.word(" ");
                        self.stmt(post);
                    }
                    self.word(" ");
                } else if let Some(cond) = &s.cond {
                    self.expr(cond);
                    self.word(" ");
                }
                self.block(&s.body);
            }
            Stmt::Range(s) => {
                self.word("for ");
                if let Some(key) = &s.key {
                    self.expr(key);
                    if let Some(value) = &s.value {
                        self.word(", ");
                        self.expr(value);
                    }
                    self.word(if s.define { " := " } else { " = " });
                }
                self.word("range ");
                self.expr(&s.expr);
                self.word(" ");
                self.block(&s.body);
            }
            Stmt::Empty(_) => {}
        }
    }

    fn if_stmt(&mut self, s: &IfStmt) {
        self.word("if ");
        if let Some(init) = &s.init {
            self.stmt(init);
            self.word("; ");
        }
        self.expr(&s.cond);
        self.word(" ");
        self.block(&s.then);
        match &s.els {
            Some(Stmt::If(nested)) => {
                self.word(" else ");
                self.if_stmt(nested);
            }
            Some(other) => {
                self.word(" else ");
                self.stmt(other);
            }
            None => {}
        }
    }

    fn case_clauses(&mut self, clauses: &[CaseClause]) {
        for clause in clauses {
            self.newline();
            match &clause.list {
                Some(list) => {
                    self.word("case ");
                    self.expr_list(list);
                    self.word(":");
                }
                None => self.word("default:"),
            }
            self.stmt_lines(&clause.body);
        }
    }

    // ========================================================================
    // Expressions and types
    // ========================================================================

    fn ident_list(&mut self, idents: &[Ident]) {
        for (i, ident) in idents.iter().enumerate() {
            if i > 0 {
                self.word(", ");
            }
            self.word(&ident.name);
        }
    }

    fn expr_list(&mut self, exprs: &[Expr]) {
        self.expr_list_at(exprs, 1);
    }

    fn expr_list_at(&mut self, exprs: &[Expr], depth: u32) {
        for (i, expr) in exprs.iter().enumerate() {
            if i > 0 {
                self.word(", ");
            }
            self.expr_at(expr, depth);
        }
    }

    fn expr(&mut self, expr: &Expr) {
        self.expr_at(expr, 1);
    }

    /// `depth` counts the nesting that makes gofmt drop blanks around
    /// operators: argument lists of several values, indexes, operands.
    fn expr_at(&mut self, expr: &Expr, depth: u32) {
        match expr {
            Expr::Ident(ident) => self.word(&ident.name),
            Expr::BasicLit(lit) => self.word(&lit.value),
            Expr::CompositeLit(lit) => {
                if let Some(ty) = &lit.ty {
                    self.expr(ty);
                }
                self.word("{");
                self.expr_list(&lit.elts);
                self.word("}");
            }
            Expr::FuncLit(lit) => {
                self.word("func");
                self.signature(&lit.ty);
                self.word(" ");
                self.block(&lit.body);
            }
            Expr::Paren(e) => {
                self.word("(");
                self.expr_at(&e.expr, depth.saturating_sub(1).max(1));
                self.word(")");
            }
            Expr::Selector(e) => {
                self.expr_at(&e.expr, depth);
                self.word(".");
                self.word(&e.sel.name);
            }
            Expr::Index(e) => {
                self.expr(&e.expr);
                self.word("[");
                self.expr_at(&e.index, depth + 1);
                self.word("]");
            }
            Expr::Slice(e) => {
                self.expr(&e.expr);
                self.word("[");
                let mut indices = vec![e.low.as_ref(), e.high.as_ref()];
                if e.slice3 {
                    indices.push(e.max.as_ref());
                }
                let present = indices.iter().flatten().count();
                let binaries = indices.iter().flatten().any(|x| matches!(x, Expr::Binary(_)));
                let blanks = depth <= 1 && present > 1 && binaries;
                for (i, index) in indices.iter().enumerate() {
                    if i > 0 {
                        if blanks && indices[i - 1].is_some() {
                            self.word(" ");
                        }
                        self.word(":");
                        if blanks && index.is_some() {
                            self.word(" ");
                        }
                    }
                    if let Some(index) = index {
                        self.expr_at(index, depth + 1);
                    }
                }
                self.word("]");
            }
            Expr::TypeAssert(e) => {
                self.expr_at(&e.expr, depth);
                self.word(".(");
                match &e.ty {
                    Some(ty) => self.expr(ty),
                    None => self.word("type"),
                }
                self.word(")");
            }
            Expr::Call(e) => {
                let depth = if e.args.len() > 1 { depth + 1 } else { depth };
                self.expr_at(&e.func, depth);
                self.word("(");
                self.expr_list_at(&e.args, depth);
                if e.has_ellipsis {
                    self.word("...");
                }
                self.word(")");
            }
            Expr::Star(e) => {
                self.word("*");
                self.expr(&e.expr);
            }
            Expr::Unary(e) => {
                let op = e.op.as_str();
                self.word(op);
                // `- -x` must not collapse into the `--` token.
                let operand = print_expr(&e.expr);
                if matches!(e.op, UnaryOp::Neg | UnaryOp::Plus | UnaryOp::Addr)
                    && operand.starts_with(op)
                {
                    self.word(" ");
                }
                self.expr_at(&e.expr, depth);
            }
            Expr::Binary(e) => {
                let depth = depth.max(1);
                let prec = e.op.precedence();
                let blank = prec < cutoff(e, depth);
                self.expr_at(&e.left, depth + diff_prec(&e.left, prec));
                if blank {
                    let _ = write!(self.out, " {} ", e.op);
                } else {
                    let _ = write!(self.out, "{}", e.op);
                }
                self.expr_at(&e.right, depth + 1);
            }
            Expr::KeyValue(e) => {
                self.expr(&e.key);
                self.word(": ");
                self.expr(&e.value);
            }
            Expr::Ellipsis(e) => {
                self.word("...");
                if let Some(elt) = &e.elt {
                    self.expr(elt);
                }
            }
            Expr::ArrayType(e) => {
                self.word("[");
                if let Some(len) = &e.len {
                    self.expr(len);
                }
                self.word("]");
                self.expr(&e.elt);
            }
            Expr::StructType(e) => {
                if e.fields.is_empty() {
                    self.word("struct{}");
                    return;
                }
                self.word("struct {");
                self.indent += 1;
                for field in &e.fields {
                    self.newline();
                    self.field(field);
                }
                self.indent -= 1;
                self.newline();
                self.word("}");
            }
            Expr::FuncType(e) => {
                self.word("func");
                self.signature(e);
            }
            Expr::InterfaceType(e) => {
                if e.methods.is_empty() {
                    self.word("interface{}");
                    return;
                }
                self.word("interface {");
                self.indent += 1;
                for method in &e.methods {
                    self.newline();
                    match (method.names.first(), &method.ty) {
                        (Some(name), Expr::FuncType(sig)) => {
                            self.word(&name.name);
                            self.signature(sig);
                        }
                        _ => self.expr(&method.ty),
                    }
                }
                self.indent -= 1;
                self.newline();
                self.word("}");
            }
            Expr::MapType(e) => {
                self.word("map[");
                self.expr(&e.key);
                self.word("]");
                self.expr(&e.value);
            }
            Expr::ChanType(e) => {
                self.word(match e.dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                self.expr(&e.value);
            }
        }
    }

    /// Field of a struct or parameter list: `a, b T "tag"`.
    fn field(&mut self, field: &Field) {
        if !field.names.is_empty() {
            self.ident_list(&field.names);
            self.word(" ");
        }
        self.expr(&field.ty);
        if let Some(tag) = &field.tag {
            self.word(" ");
            self.word(&tag.value);
        }
    }

    fn field_list(&mut self, fields: &[Field]) {
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.word(", ");
            }
            self.field(field);
        }
    }

    /// Parameters and results, without the `func` keyword.
    fn signature(&mut self, ty: &FuncType) {
        self.word("(");
        self.field_list(&ty.params);
        self.word(")");
        match ty.results.as_slice() {
            [] => {}
            [single] if single.names.is_empty() && !matches!(single.ty, Expr::FuncType(_)) => {
                self.word(" ");
                self.field(single);
            }
            results => {
                self.word(" (");
                self.field_list(results);
                self.word(")");
            }
        }
    }
}

/// Precedence up to which the operators of `e` keep their blanks.
fn cutoff(e: &BinaryExpr, depth: u32) -> u8 {
    let (has4, has5, max_problem) = walk_binary(e);
    if max_problem > 0 {
        return max_problem + 1;
    }
    match (has4 && has5, depth == 1) {
        (true, true) => 5,
        (false, true) => 6,
        (_, false) => 4,
    }
}

/// Precedence levels used by `e` and its same-or-tighter operands, and the
/// level that must stay spaced so that adjacent operators do not fuse
/// (`a / *p`, `a - -b`).
fn walk_binary(e: &BinaryExpr) -> (bool, bool, u8) {
    let prec = e.op.precedence();
    let (mut has4, mut has5, mut max_problem) = (prec == 4, prec == 5, 0);

    if let Expr::Binary(left) = &e.left
        && left.op.precedence() >= prec
    {
        let (h4, h5, problem) = walk_binary(left);
        has4 |= h4;
        has5 |= h5;
        max_problem = max_problem.max(problem);
    }

    match &e.right {
        Expr::Binary(right) if right.op.precedence() > prec => {
            let (h4, h5, problem) = walk_binary(right);
            has4 |= h4;
            has5 |= h5;
            max_problem = max_problem.max(problem);
        }
        Expr::Star(_) if e.op == BinaryOp::Div => max_problem = 5,
        Expr::Unary(right) => match (e.op, right.op) {
            (BinaryOp::BitAnd, UnaryOp::Addr) | (BinaryOp::BitAnd, UnaryOp::BitNot) => max_problem = 5,
            (BinaryOp::Add, UnaryOp::Plus) | (BinaryOp::Sub, UnaryOp::Neg) => {
                max_problem = max_problem.max(4)
            }
            _ => {}
        },
        _ => {}
    }
    (has4, has5, max_problem)
}

fn diff_prec(expr: &Expr, prec: u8) -> u32 {
    match expr {
        Expr::Binary(inner) if inner.op.precedence() == prec => 0,
        _ => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_core::FileId;

    fn roundtrip(source: &str) -> String {
        let file = Parser::parse_file(source, FileId(0)).unwrap();
        print_file(&file)
    }

    fn assert_fixpoint(source: &str) {
        let first = roundtrip(source);
        let second = roundtrip(&first);
        assert_eq!(first, second, "printer output not stable:\n{first}");
    }

    #[test]
    fn prints_canonical_layout() {
        let printed = roundtrip(
            "package  p\nimport \"fmt\"\n// Item is a placeholder.\ntype Item int\nfunc   Show(i Item){ fmt.Println( i+1 ) }\n",
        );
        assert_eq!(
            printed,
            "package p\n\nimport \"fmt\"\n\n// Item is a placeholder.\ntype Item int\n\nfunc Show(i Item) {\n\tfmt.Println(i + 1)\n}\n"
        );
    }

    #[test]
    fn prints_grouped_declarations() {
        let printed = roundtrip("package p\n\nconst (\n\tA = iota\n\tB\n)\n\nvar x, y int = 1, 2\n");
        assert_eq!(
            printed,
            "package p\n\nconst (\n\tA = iota\n\tB\n)\n\nvar x, y int = 1, 2\n"
        );
    }

    #[test]
    fn prints_struct_and_interface_bodies() {
        let printed = roundtrip(
            "package p\n\ntype T struct { a, b int; Embedded; tag string `json:\"t\"` }\n\ntype I interface { M(x int) (int, error); fmt.Stringer }\n\ntype E struct{}\n",
        );
        assert_eq!(
            printed,
            "package p\n\ntype T struct {\n\ta, b int\n\tEmbedded\n\ttag string `json:\"t\"`\n}\n\ntype I interface {\n\tM(x int) (int, error)\n\tfmt.Stringer\n}\n\ntype E struct{}\n"
        );
    }

    #[test]
    fn separates_repeated_unary_operators() {
        let file = Parser::parse_file("package p\n\nvar x = - -1\n", FileId(0)).unwrap();
        assert_eq!(print_file(&file), "package p\n\nvar x = - -1\n");
    }

    #[test]
    fn spaces_binary_operators_like_gofmt() {
        let cases = [
            ("const mask = 1 << 3 - 1", "const mask = 1<<3 - 1"),
            ("var x = a + b", "var x = a + b"),
            ("var x = a*b + c", "var x = a*b + c"),
            ("var x = a * b", "var x = a * b"),
            ("var x = f(a + b)", "var x = f(a + b)"),
            ("var x = f(a + b, c)", "var x = f(a+b, c)"),
            ("var x = xs[i + 1]", "var x = xs[i+1]"),
            ("var x = xs[i + 1 : n]", "var x = xs[i+1 : n]"),
            ("var x = xs[1:n]", "var x = xs[1:n]"),
            ("var x = a == b && c < d", "var x = a == b && c < d"),
            ("var x = a - -b", "var x = a - -b"),
            ("var x = (a + b) * c", "var x = (a + b) * c"),
        ];
        for (source, expected) in cases {
            let printed = roundtrip(&format!("package p\n\n{source}\n"));
            assert_eq!(printed, format!("package p\n\n{expected}\n"), "{source}");
            assert_fixpoint(&printed);
        }
    }

    #[test]
    fn quotes_paths() {
        assert_eq!(quote("a/b"), "\"a/b\"");
        assert_eq!(quote("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn control_flow_reaches_fixpoint() {
        assert_fixpoint(
            r#"package p

func f(xs []int, ch chan int) (n int, err error) {
	for i := 0; i < len(xs); i++ {
		if v := xs[i]; v > 0 {
			n += v
		} else if v < 0 {
			continue
		} else {
			break
		}
	}
	for k, v := range xs {
		_ = k + v
	}
	for range xs {
	}
outer:
	for {
		select {
		case v := <-ch:
			n = v
			break outer
		case ch <- 1:
		default:
			return
		}
	}
	switch x := n; {
	case x > 1, x < -1:
		fallthrough
	default:
	}
	var i interface{} = n
	switch t := i.(type) {
	case int:
		_ = t
	}
	go func() {
		defer close(ch)
	}()
	m := map[string][]int{"a": {1, 2}}
	_ = m["a"][1:2:2]
	p := &struct{ x int }{x: 1}
	_ = p
	return n, nil
}
"#,
        );
    }

    #[test]
    fn function_types_keep_parenthesized_results() {
        assert_fixpoint("package p\n\nfunc f() (func() int) { return nil }\n\nvar g func(int, ...string) error\n");
    }
}
