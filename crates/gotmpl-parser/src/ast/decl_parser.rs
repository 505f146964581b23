//! Declaration parsing: package clause, imports, and top-level declarations.

use super::parser::Parser;
use crate::ast::decl::*;
use crate::ast::{CommentGroup, ParseError, ParseErrorKind};
use crate::lexer::TokenKind;
use gotmpl_core::Span;

impl<'src> Parser<'src> {
    /// Parse a whole file: package clause, imports, then declarations.
    ///
    /// Errors inside a declaration are recorded and parsing resumes at the
    /// next top-level keyword, so one run reports every broken declaration.
    pub(super) fn parse_source_file(&mut self) -> Result<File, ParseError> {
        let doc = self.take_doc();
        if !self.check(TokenKind::Package) {
            let token = *self.peek();
            return Err(ParseError::new(
                ParseErrorKind::MissingPackageClause,
                token.span,
                format!("expected 'package', found {}", Self::describe(&token)),
            ));
        }
        let package_kw = self.advance();
        let package = self.parse_ident()?;
        let span = package_kw.span.merge(package.span);
        self.expect_semi()?;

        let mut imports = Vec::new();
        while self.check(TokenKind::Import) {
            match self.parse_import_decl() {
                Ok(decl) => imports.push(decl),
                Err(err) => {
                    self.errors.push(err);
                    self.advance();
                    self.synchronize_decl();
                }
            }
        }

        let mut decls = Vec::new();
        while !self.is_eof() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            self.expr_level = 0;
            let result = self.parse_top_level_decl().and_then(|decl| {
                self.expect_semi()?;
                Ok(decl)
            });
            match result {
                Ok(decl) => decls.push(decl),
                Err(err) => {
                    self.errors.push(err);
                    self.advance();
                    self.synchronize_decl();
                }
            }
        }

        Ok(File {
            id: self.file,
            doc,
            package,
            imports,
            decls,
            next_ident: self.next_ident,
            span,
        })
    }

    /// Parse one top-level declaration.
    fn parse_top_level_decl(&mut self) -> Result<Decl, ParseError> {
        let doc = self.take_doc();
        let token = *self.peek();
        match token.kind {
            TokenKind::Func => Ok(Decl::Func(self.parse_func_decl(doc)?)),
            TokenKind::Type => Ok(Decl::Type(self.parse_type_decl(doc)?)),
            TokenKind::Var => Ok(Decl::Var(self.parse_value_decl(doc)?)),
            TokenKind::Const => Ok(Decl::Const(self.parse_value_decl(doc)?)),
            TokenKind::Import => Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                token.span,
                "imports must appear before other declarations",
            )),
            _ => Err(ParseError::new(
                ParseErrorKind::ExpectedDeclaration,
                token.span,
                format!("non-declaration statement outside function body: {}", Self::describe(&token)),
            )),
        }
    }

    // ========================================================================
    // Imports
    // ========================================================================

    fn parse_import_decl(&mut self) -> Result<ImportDecl, ParseError> {
        let start = self.expect(TokenKind::Import)?;
        let (specs, grouped, end) = self.parse_group(Self::parse_import_spec)?;
        self.expect_semi()?;
        Ok(ImportDecl {
            specs,
            grouped,
            span: start.span.merge(end),
        })
    }

    fn parse_import_spec(&mut self) -> Result<ImportSpec, ParseError> {
        let start = self.peek().span;
        let name = match self.peek().kind {
            TokenKind::Ident => Some(self.parse_ident()?),
            TokenKind::Dot => {
                let dot = self.advance();
                Some(self.make_ident(".", dot.span))
            }
            _ => None,
        };
        let path_token = *self.peek();
        let path = match path_token.kind {
            TokenKind::String | TokenKind::RawString => {
                self.advance();
                unquote(path_token.lexeme)
            }
            _ => return Err(self.unexpected("import path")),
        };
        if path.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                path_token.span,
                "invalid import path: empty",
            ));
        }
        Ok(ImportSpec {
            name,
            path,
            span: start.merge(path_token.span),
        })
    }

    // ========================================================================
    // var / const / type
    // ========================================================================

    /// Parse a `var` or `const` declaration (keyword included).
    pub(super) fn parse_value_decl(
        &mut self,
        doc: Option<CommentGroup>,
    ) -> Result<ValueDecl, ParseError> {
        let keyword = self.advance();
        let is_const = keyword.kind == TokenKind::Const;
        let (specs, grouped, end) = self.parse_group(|p| p.parse_value_spec(is_const))?;
        Ok(ValueDecl {
            doc,
            specs,
            grouped,
            span: keyword.span.merge(end),
        })
    }

    fn parse_value_spec(&mut self, is_const: bool) -> Result<ValueSpec, ParseError> {
        let names = self.parse_ident_list()?;
        let start = names[0].span;

        let ty = if !self.check(TokenKind::Assign) && self.at_type_start() {
            Some(self.parse_type()?)
        } else {
            None
        };
        let values = if self.eat(TokenKind::Assign).is_some() {
            self.parse_expr_list()?
        } else {
            Vec::new()
        };

        if !is_const && ty.is_none() && values.is_empty() {
            return Err(ParseError::expected_type(
                self.peek().span,
                &Self::describe(self.peek()),
            ));
        }
        if is_const && ty.is_some() && values.is_empty() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                start,
                "missing init expr for const declaration",
            ));
        }

        let end = values
            .last()
            .map(|v| v.span())
            .or_else(|| ty.as_ref().map(|t| t.span()))
            .unwrap_or(names[names.len() - 1].span);
        Ok(ValueSpec {
            names,
            ty,
            values,
            span: start.merge(end),
        })
    }

    /// Parse a `type` declaration (keyword included).
    pub(super) fn parse_type_decl(
        &mut self,
        doc: Option<CommentGroup>,
    ) -> Result<TypeDecl, ParseError> {
        let keyword = self.expect(TokenKind::Type)?;
        let (specs, grouped, end) = self.parse_group(Self::parse_type_spec)?;
        Ok(TypeDecl {
            doc,
            specs,
            grouped,
            span: keyword.span.merge(end),
        })
    }

    fn parse_type_spec(&mut self) -> Result<TypeSpec, ParseError> {
        let name = self.parse_ident()?;
        if self.check(TokenKind::LBracket) && self.peek_nth(1).kind == TokenKind::Ident {
            let next = self.peek_nth(2).kind;
            if matches!(next, TokenKind::Ident | TokenKind::Interface | TokenKind::Comma) {
                return Err(ParseError::new(
                    ParseErrorKind::Unsupported,
                    self.peek().span,
                    "type parameters are not supported",
                ));
            }
        }
        let assign = self.eat(TokenKind::Assign).is_some();
        let ty = self.parse_type()?;
        let span = name.span.merge(ty.span());
        Ok(TypeSpec {
            name,
            assign,
            ty,
            span,
        })
    }

    /// Parse either a single spec or a parenthesized group of specs.
    ///
    /// Returns the specs, whether the group form was used, and the span of
    /// the last token of the declaration.
    fn parse_group<T>(
        &mut self,
        mut spec: impl FnMut(&mut Self) -> Result<T, ParseError>,
    ) -> Result<(Vec<T>, bool, Span), ParseError> {
        if self.eat(TokenKind::LParen).is_none() {
            let item = spec(self)?;
            let end = self.previous().map_or(self.peek().span, |t| t.span);
            return Ok((vec![item], false, end));
        }
        let mut specs = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_eof() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            specs.push(spec(self)?);
            self.expect_semi()?;
        }
        let close = self.expect(TokenKind::RParen)?;
        Ok((specs, true, close.span))
    }

    // ========================================================================
    // func
    // ========================================================================

    fn parse_func_decl(&mut self, doc: Option<CommentGroup>) -> Result<FuncDecl, ParseError> {
        let start = self.expect(TokenKind::Func)?;

        let recv = if self.check(TokenKind::LParen) {
            let (mut fields, span) = self.parse_parameters()?;
            if fields.len() != 1 || fields[0].names.len() > 1 {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    span,
                    "method has multiple receivers",
                ));
            }
            fields.pop()
        } else {
            None
        };

        let name = self.parse_ident()?;
        if self.check(TokenKind::LBracket) {
            return Err(ParseError::new(
                ParseErrorKind::Unsupported,
                self.peek().span,
                "type parameters are not supported",
            ));
        }
        let ty = self.parse_signature(name.span)?;

        let body = if self.check(TokenKind::LBrace) {
            Some(self.parse_block()?)
        } else {
            None
        };

        let end = body.as_ref().map_or(ty.span, |b| b.span);
        Ok(FuncDecl {
            doc,
            recv,
            name,
            ty,
            body,
            span: start.span.merge(end),
        })
    }
}

/// Strip the quotes of a string literal used as an import path.
///
/// Import paths never contain escapes in practice; backslashes are kept
/// verbatim.
fn unquote(lexeme: &str) -> String {
    lexeme
        .strip_prefix(['"', '`'])
        .and_then(|s| s.strip_suffix(['"', '`']))
        .unwrap_or(lexeme)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Expr, Stmt};
    use gotmpl_core::FileId;

    fn parse(source: &str) -> File {
        match Parser::parse_file(source, FileId(0)) {
            Ok(file) => file,
            Err(errors) => panic!("parse failed: {errors}"),
        }
    }

    #[test]
    fn package_and_imports() {
        let file = parse("package list\n\nimport (\n\t\"fmt\"\n\tstr \"strings\"\n)\n\nimport \"os\"\n");
        assert_eq!(file.package.name, "list");
        assert_eq!(file.imports.len(), 2);
        assert!(file.imports[0].grouped);
        assert_eq!(file.imports[0].specs[1].local_name(), "str");
        assert!(file.imports_path("os"));
    }

    #[test]
    fn grouped_type_decl_keeps_every_spec() {
        let file = parse("package p\n\ntype (\n\tItem int\n\tList []Item\n\tAlias = List\n)\n");
        let Decl::Type(decl) = &file.decls[0] else {
            panic!("expected type decl");
        };
        assert!(decl.grouped);
        assert_eq!(decl.specs.len(), 3);
        assert!(decl.specs[2].assign);
    }

    #[test]
    fn const_group_with_iota_repetition() {
        let file = parse("package p\n\nconst (\n\tA = iota\n\tB\n\tC\n)\n");
        let Decl::Const(decl) = &file.decls[0] else {
            panic!("expected const decl");
        };
        assert_eq!(decl.specs.len(), 3);
        assert!(decl.specs[1].values.is_empty());
    }

    #[test]
    fn methods_and_functions() {
        let file = parse(
            "package p\n\nfunc (l *List) Len() int {\n\treturn len(l.items)\n}\n\nfunc New() *List {\n\treturn &List{}\n}\n",
        );
        let Decl::Func(method) = &file.decls[0] else {
            panic!("expected func");
        };
        assert!(method.is_method());
        let Decl::Func(ctor) = &file.decls[1] else {
            panic!("expected func");
        };
        let body = ctor.body.as_ref().unwrap();
        assert!(matches!(&body.stmts[0], Stmt::Return(r) if matches!(r.results[0], Expr::Unary(_))));
    }

    #[test]
    fn doc_comments_attach_to_declarations() {
        let file = parse(
            "// Package p is a test.\npackage p\n\n// Item is an element.\ntype Item int\n\nfunc f() {\n\t// inside\n}\n\nvar x int // trailing\n",
        );
        assert_eq!(file.doc.as_ref().unwrap().lines, vec!["// Package p is a test."]);
        assert_eq!(file.decls[0].doc().unwrap().lines, vec!["// Item is an element."]);
        assert!(file.decls[1].doc().is_none());
        assert!(file.decls[2].doc().is_none());
    }

    #[test]
    fn identifier_ids_are_unique() {
        let file = parse("package p\n\nvar a, b = c, d\n");
        let Decl::Var(decl) = &file.decls[0] else {
            panic!("expected var decl");
        };
        let spec = &decl.specs[0];
        assert_ne!(spec.names[0].id, spec.names[1].id);
        assert_eq!(file.next_ident, 5);
    }

    #[test]
    fn missing_package_clause() {
        let errors = Parser::parse_file("func f() {}\n", FileId(0)).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().kind, ParseErrorKind::MissingPackageClause);
    }

    #[test]
    fn recovers_and_reports_multiple_errors() {
        let errors = Parser::parse_file(
            "package p\n\nvar = 1\n\nfunc ok() {}\n\nfunc bad( {}\n",
            FileId(0),
        )
        .unwrap_err();
        assert_eq!(errors.len(), 2);
    }

    #[test]
    fn type_parameters_are_rejected() {
        let errors = Parser::parse_file("package p\n\ntype List[T any] struct{}\n", FileId(0)).unwrap_err();
        assert_eq!(errors.iter().next().unwrap().kind, ParseErrorKind::Unsupported);
    }
}
