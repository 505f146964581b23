//! Type expression parsing.
//!
//! Handles named and qualified types, pointer/slice/array/map/channel
//! types, struct and interface bodies, and function signatures including
//! Go's grouped parameter lists (`a, b int, c string`).

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::{ChanDir, Ident, ParseError, ParseErrorKind};
use crate::lexer::TokenKind;
use gotmpl_core::Span;

/// One raw entry of a parameter list before grouping is decided.
enum ParamEntry {
    /// A lone identifier: a parameter name, or a type name if unnamed.
    Name(Ident),
    /// `name Type`.
    Named(Ident, Expr),
    /// A type that cannot be a name.
    Type(Expr),
}

impl<'src> Parser<'src> {
    /// Parse a type.
    pub fn parse_type(&mut self) -> Result<Expr, ParseError> {
        let token = *self.peek();

        match token.kind {
            TokenKind::Ident => self.parse_type_name(),

            TokenKind::LParen => {
                self.advance();
                let ty = self.parse_type()?;
                let close = self.expect_closing(TokenKind::RParen)?;
                Ok(Expr::Paren(Box::new(ParenExpr {
                    expr: ty,
                    span: token.span.merge(close.span),
                })))
            }

            TokenKind::Star => {
                self.advance();
                let expr = self.parse_type()?;
                let span = token.span.merge(expr.span());
                Ok(Expr::Star(Box::new(StarExpr { expr, span })))
            }

            TokenKind::LBracket => self.parse_array_type(),
            TokenKind::Struct => self.parse_struct_type(),
            TokenKind::Interface => self.parse_interface_type(),
            TokenKind::Func => Ok(Expr::FuncType(Box::new(self.parse_func_type()?))),
            TokenKind::Map => self.parse_map_type(),
            TokenKind::Chan | TokenKind::Arrow => self.parse_chan_type(),

            _ => Err(ParseError::expected_type(token.span, &Self::describe(&token))),
        }
    }

    /// Whether the current token can start a type.
    pub(super) fn at_type_start(&self) -> bool {
        matches!(
            self.peek().kind,
            TokenKind::Ident
                | TokenKind::LParen
                | TokenKind::Star
                | TokenKind::LBracket
                | TokenKind::Struct
                | TokenKind::Interface
                | TokenKind::Func
                | TokenKind::Map
                | TokenKind::Chan
                | TokenKind::Arrow
        )
    }

    /// Parse `Name` or `pkg.Name`.
    fn parse_type_name(&mut self) -> Result<Expr, ParseError> {
        let name = self.parse_ident()?;
        if self.check(TokenKind::Dot) && self.peek_nth(1).kind == TokenKind::Ident {
            self.advance();
            let sel = self.parse_ident()?;
            let span = name.span.merge(sel.span);
            return Ok(Expr::Selector(Box::new(SelectorExpr {
                expr: Expr::Ident(name),
                sel,
                span,
            })));
        }
        Ok(Expr::Ident(name))
    }

    /// Parse `[]T`, `[N]T` or `[...]T`.
    fn parse_array_type(&mut self) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LBracket)?;
        let len = if self.check(TokenKind::RBracket) {
            None
        } else if let Some(dots) = self.eat(TokenKind::Ellipsis) {
            Some(Expr::Ellipsis(Box::new(EllipsisExpr {
                elt: None,
                span: dots.span,
            })))
        } else {
            self.expr_level += 1;
            let len = self.parse_expression();
            self.expr_level -= 1;
            Some(len?)
        };
        self.expect(TokenKind::RBracket)?;
        let elt = self.parse_type()?;
        let span = open.span.merge(elt.span());
        Ok(Expr::ArrayType(Box::new(ArrayType { len, elt, span })))
    }

    /// Parse `map[K]V`.
    fn parse_map_type(&mut self) -> Result<Expr, ParseError> {
        let map = self.expect(TokenKind::Map)?;
        self.expect(TokenKind::LBracket)?;
        let key = self.parse_type()?;
        self.expect(TokenKind::RBracket)?;
        let value = self.parse_type()?;
        let span = map.span.merge(value.span());
        Ok(Expr::MapType(Box::new(MapType { key, value, span })))
    }

    /// Parse `chan T`, `chan<- T` or `<-chan T`.
    fn parse_chan_type(&mut self) -> Result<Expr, ParseError> {
        let start = self.peek().span;
        let dir = if self.eat(TokenKind::Arrow).is_some() {
            self.expect(TokenKind::Chan)?;
            ChanDir::Recv
        } else {
            self.expect(TokenKind::Chan)?;
            if self.eat(TokenKind::Arrow).is_some() {
                ChanDir::Send
            } else {
                ChanDir::Both
            }
        };
        let value = self.parse_type()?;
        let span = start.merge(value.span());
        Ok(Expr::ChanType(Box::new(ChanType { dir, value, span })))
    }

    // ========================================================================
    // Struct and interface bodies
    // ========================================================================

    /// Parse `struct { fields }`.
    fn parse_struct_type(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(TokenKind::Struct)?;
        self.expect(TokenKind::LBrace)?;
        let mut fields = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            fields.push(self.parse_struct_field()?);
            self.expect_semi()?;
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(Expr::StructType(Box::new(StructType {
            fields,
            span: start.span.merge(close.span),
        })))
    }

    /// Parse one struct field line: named fields or an embedded type.
    fn parse_struct_field(&mut self) -> Result<Field, ParseError> {
        let start = self.peek().span;
        let embedded = match self.peek().kind {
            TokenKind::Star => true,
            TokenKind::Ident => matches!(
                self.peek_nth(1).kind,
                TokenKind::Dot | TokenKind::Semicolon | TokenKind::RBrace | TokenKind::String
                    | TokenKind::RawString
            ),
            _ => false,
        };

        let (names, ty) = if embedded {
            (Vec::new(), self.parse_type()?)
        } else {
            let names = self.parse_ident_list()?;
            (names, self.parse_type()?)
        };

        let tag = match self.peek().kind {
            TokenKind::String | TokenKind::RawString => {
                let token = self.advance();
                Some(BasicLit {
                    kind: LitKind::String,
                    value: token.lexeme.to_string(),
                    span: token.span,
                })
            }
            _ => None,
        };

        let end = tag.as_ref().map_or(ty.span(), |t| t.span);
        Ok(Field {
            names,
            ty,
            tag,
            span: start.merge(end),
        })
    }

    /// Parse `interface { methods and embedded interfaces }`.
    fn parse_interface_type(&mut self) -> Result<Expr, ParseError> {
        let start = self.expect(TokenKind::Interface)?;
        self.expect(TokenKind::LBrace)?;
        let mut methods = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            let elem_start = self.peek().span;
            if self.check(TokenKind::Ident) && self.peek_nth(1).kind == TokenKind::LParen {
                let name = self.parse_ident()?;
                let sig = self.parse_signature(name.span)?;
                let span = elem_start.merge(sig.span);
                methods.push(Field {
                    names: vec![name],
                    ty: Expr::FuncType(Box::new(sig)),
                    tag: None,
                    span,
                });
            } else if self.check(TokenKind::Ident) {
                let ty = self.parse_type_name()?;
                methods.push(Field {
                    names: Vec::new(),
                    span: ty.span(),
                    ty,
                    tag: None,
                });
            } else {
                let token = *self.peek();
                return Err(ParseError::new(
                    ParseErrorKind::Unsupported,
                    token.span,
                    format!(
                        "expected method or embedded interface, found {}",
                        Self::describe(&token)
                    ),
                ));
            }
            self.expect_semi()?;
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(Expr::InterfaceType(Box::new(InterfaceType {
            methods,
            span: start.span.merge(close.span),
        })))
    }

    // ========================================================================
    // Signatures
    // ========================================================================

    /// Parse `func` followed by a signature.
    pub fn parse_func_type(&mut self) -> Result<FuncType, ParseError> {
        let start = self.expect(TokenKind::Func)?;
        self.parse_signature(start.span)
    }

    /// Parse `(params) results`.
    pub(super) fn parse_signature(&mut self, start: Span) -> Result<FuncType, ParseError> {
        let (params, params_span) = self.parse_parameters()?;
        let mut span = start.merge(params_span);

        let results = if self.check(TokenKind::LParen) {
            let (results, results_span) = self.parse_parameters()?;
            span = span.merge(results_span);
            results
        } else if self.at_type_start() {
            let ty = self.parse_type()?;
            span = span.merge(ty.span());
            vec![Field {
                names: Vec::new(),
                span: ty.span(),
                ty,
                tag: None,
            }]
        } else {
            Vec::new()
        };

        Ok(FuncType {
            params,
            results,
            span,
        })
    }

    /// Parse a parenthesized parameter list.
    ///
    /// Entries are collected first; if any entry is `name Type`, bare
    /// identifiers before it are names sharing its type. Otherwise every
    /// entry is an unnamed parameter type.
    pub(super) fn parse_parameters(&mut self) -> Result<(Vec<Field>, Span), ParseError> {
        let open = self.expect(TokenKind::LParen)?;
        self.expr_level += 1;
        let entries = self.parse_param_entries();
        self.expr_level -= 1;
        let entries = entries?;
        let close = self.expect_closing(TokenKind::RParen)?;
        let span = open.span.merge(close.span);

        let named = entries.iter().any(|e| matches!(e, ParamEntry::Named(..)));
        if !named {
            let fields = entries
                .into_iter()
                .map(|entry| {
                    let ty = match entry {
                        ParamEntry::Name(name) => Expr::Ident(name),
                        ParamEntry::Named(_, ty) | ParamEntry::Type(ty) => ty,
                    };
                    Field {
                        names: Vec::new(),
                        span: ty.span(),
                        ty,
                        tag: None,
                    }
                })
                .collect();
            return Ok((fields, span));
        }

        let mut fields = Vec::new();
        let mut pending: Vec<Ident> = Vec::new();
        for entry in entries {
            match entry {
                ParamEntry::Name(name) => pending.push(name),
                ParamEntry::Named(name, ty) => {
                    let start = pending.first().map_or(name.span, |first| first.span);
                    pending.push(name);
                    fields.push(Field {
                        names: std::mem::take(&mut pending),
                        span: start.merge(ty.span()),
                        ty,
                        tag: None,
                    });
                }
                ParamEntry::Type(ty) => {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        ty.span(),
                        "mixed named and unnamed parameters",
                    ));
                }
            }
        }
        if let Some(name) = pending.first() {
            return Err(ParseError::new(
                ParseErrorKind::InvalidSyntax,
                name.span,
                "mixed named and unnamed parameters",
            ));
        }
        Ok((fields, span))
    }

    fn parse_param_entries(&mut self) -> Result<Vec<ParamEntry>, ParseError> {
        let mut entries = Vec::new();
        while !self.check(TokenKind::RParen) && !self.is_eof() {
            if self.peek().is_auto_semicolon() && self.peek_nth(1).kind == TokenKind::RParen {
                break;
            }
            entries.push(self.parse_param_entry()?);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(entries)
    }

    fn parse_param_entry(&mut self) -> Result<ParamEntry, ParseError> {
        if self.check(TokenKind::Ident) {
            match self.peek_nth(1).kind {
                TokenKind::Comma | TokenKind::RParen | TokenKind::Semicolon => {
                    return Ok(ParamEntry::Name(self.parse_ident()?));
                }
                TokenKind::Dot => return Ok(ParamEntry::Type(self.parse_type_name()?)),
                _ => {
                    let name = self.parse_ident()?;
                    let ty = self.parse_param_type()?;
                    return Ok(ParamEntry::Named(name, ty));
                }
            }
        }
        Ok(ParamEntry::Type(self.parse_param_type()?))
    }

    /// A parameter type, which may be variadic.
    fn parse_param_type(&mut self) -> Result<Expr, ParseError> {
        if let Some(dots) = self.eat(TokenKind::Ellipsis) {
            let elt = self.parse_type()?;
            let span = dots.span.merge(elt.span());
            return Ok(Expr::Ellipsis(Box::new(EllipsisExpr {
                elt: Some(elt),
                span,
            })));
        }
        self.parse_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_core::FileId;

    fn parse_type(source: &str) -> Expr {
        let mut parser = Parser::new(source, FileId(0));
        let ty = parser.parse_type().unwrap();
        assert!(!parser.has_errors());
        ty
    }

    fn signature(source: &str) -> FuncType {
        let mut parser = Parser::new(source, FileId(0));
        parser.parse_func_type().unwrap()
    }

    #[test]
    fn qualified_and_pointer_types() {
        assert!(matches!(parse_type("pkg.Name"), Expr::Selector(_)));
        assert!(matches!(parse_type("*Node"), Expr::Star(s) if matches!(s.expr, Expr::Ident(_))));
    }

    #[test]
    fn composite_types() {
        assert!(matches!(parse_type("[]int"), Expr::ArrayType(a) if a.len.is_none()));
        assert!(matches!(parse_type("[4]byte"), Expr::ArrayType(a) if a.len.is_some()));
        assert!(matches!(parse_type("map[string][]T"), Expr::MapType(_)));
        assert!(matches!(parse_type("<-chan int"), Expr::ChanType(c) if c.dir == ChanDir::Recv));
        assert!(matches!(parse_type("chan<- int"), Expr::ChanType(c) if c.dir == ChanDir::Send));
    }

    #[test]
    fn struct_fields_and_tags() {
        let Expr::StructType(st) = parse_type("struct {\n\ta, b int\n\tName string `json:\"name\"`\n\t*Embedded\n\tio.Reader\n}") else {
            panic!("expected struct");
        };
        assert_eq!(st.fields.len(), 4);
        assert_eq!(st.fields[0].names.len(), 2);
        assert!(st.fields[1].tag.is_some());
        assert!(st.fields[2].names.is_empty());
        assert!(st.fields[3].names.is_empty());
    }

    #[test]
    fn interface_methods_and_embeds() {
        let Expr::InterfaceType(it) = parse_type("interface {\n\tLess(other Item) bool\n\tfmt.Stringer\n}") else {
            panic!("expected interface");
        };
        assert_eq!(it.methods.len(), 2);
        assert_eq!(it.methods[0].names[0].name, "Less");
        assert!(it.methods[1].names.is_empty());
    }

    #[test]
    fn grouped_parameters() {
        let sig = signature("func(a, b int, c string) (int, error)");
        assert_eq!(sig.params.len(), 2);
        assert_eq!(sig.params[0].names.len(), 2);
        assert_eq!(sig.param_count(), 3);
        assert_eq!(sig.results.len(), 2);
        assert!(sig.results.iter().all(|r| r.names.is_empty()));
    }

    #[test]
    fn unnamed_parameters() {
        let sig = signature("func(int, string) bool");
        assert_eq!(sig.params.len(), 2);
        assert!(sig.params.iter().all(|p| p.names.is_empty()));
        assert_eq!(sig.result_count(), 1);
    }

    #[test]
    fn variadic_parameter() {
        let sig = signature("func(format string, args ...any)");
        assert!(sig.is_variadic());
    }

    #[test]
    fn named_results() {
        let sig = signature("func() (n int, err error)");
        assert_eq!(sig.results.len(), 2);
        assert_eq!(sig.results[1].names[0].name, "err");
    }

    #[test]
    fn mixed_parameters_rejected() {
        let mut parser = Parser::new("func(a int, string)", FileId(0));
        assert!(parser.parse_func_type().is_err());
    }
}
