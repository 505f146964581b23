//! Statement parsing.
//!
//! Control clauses (`if`, `for`, `switch`) are parsed with a negative
//! expression level so that `{` after a type name starts the body.

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::stmt::*;
use crate::ast::{AssignOp, Decl, ParseError, ParseErrorKind};
use crate::lexer::TokenKind;
use gotmpl_core::Span;

/// Result of parsing a simple statement, which inside a `for` header may
/// also be a range clause.
enum SimpleStmt {
    Stmt(Stmt),
    Range {
        key: Option<Expr>,
        value: Option<Expr>,
        define: bool,
        expr: Expr,
        span: Span,
    },
}

impl<'src> Parser<'src> {
    /// Parse a `{ ... }` block.
    pub fn parse_block(&mut self) -> Result<Block, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        let stmts = self.parse_stmt_list()?;
        let close = self.expect(TokenKind::RBrace)?;
        Ok(Block {
            stmts,
            span: open.span.merge(close.span),
        })
    }

    /// Parse statements up to a closing `}` or the next `case`/`default`.
    fn parse_stmt_list(&mut self) -> Result<Vec<Stmt>, ParseError> {
        let mut stmts = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::RBrace | TokenKind::Case | TokenKind::Default | TokenKind::Eof => {
                    return Ok(stmts);
                }
                TokenKind::Semicolon => {
                    self.advance();
                }
                _ => {
                    stmts.push(self.parse_statement()?);
                    self.expect_semi()?;
                }
            }
        }
    }

    /// Parse a single statement (without its terminating semicolon).
    pub fn parse_statement(&mut self) -> Result<Stmt, ParseError> {
        let token = *self.peek();

        match token.kind {
            TokenKind::Var => Ok(Stmt::Decl(Decl::Var(self.parse_value_decl(None)?))),
            TokenKind::Const => Ok(Stmt::Decl(Decl::Const(self.parse_value_decl(None)?))),
            TokenKind::Type => Ok(Stmt::Decl(Decl::Type(self.parse_type_decl(None)?))),

            TokenKind::Ident if self.peek_nth(1).kind == TokenKind::Colon => {
                self.parse_labeled()
            }

            TokenKind::Go | TokenKind::Defer => {
                self.advance();
                let call = self.parse_expression()?;
                if !matches!(call.unparen(), Expr::Call(_)) {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        call.span(),
                        format!("expression in {} must be function call", token.lexeme),
                    ));
                }
                let span = token.span.merge(call.span());
                let stmt = Box::new(CallStmt { call, span });
                Ok(if token.kind == TokenKind::Go {
                    Stmt::Go(stmt)
                } else {
                    Stmt::Defer(stmt)
                })
            }

            TokenKind::Return => {
                self.advance();
                let results = if matches!(self.peek().kind, TokenKind::Semicolon | TokenKind::RBrace) {
                    Vec::new()
                } else {
                    self.parse_expr_list()?
                };
                let span = results
                    .last()
                    .map_or(token.span, |last| token.span.merge(last.span()));
                Ok(Stmt::Return(ReturnStmt { results, span }))
            }

            TokenKind::Break | TokenKind::Continue | TokenKind::Goto | TokenKind::Fallthrough => {
                self.advance();
                let kind = match token.kind {
                    TokenKind::Break => BranchKind::Break,
                    TokenKind::Continue => BranchKind::Continue,
                    TokenKind::Goto => BranchKind::Goto,
                    _ => BranchKind::Fallthrough,
                };
                let label = if kind != BranchKind::Fallthrough && self.check(TokenKind::Ident) {
                    Some(self.parse_ident()?)
                } else {
                    None
                };
                let span = label.as_ref().map_or(token.span, |l| token.span.merge(l.span));
                Ok(Stmt::Branch(BranchStmt { kind, label, span }))
            }

            TokenKind::LBrace => Ok(Stmt::Block(self.parse_block()?)),
            TokenKind::If => self.parse_if(),
            TokenKind::Switch => self.parse_switch(),
            TokenKind::Select => self.parse_select(),
            TokenKind::For => self.parse_for(),
            TokenKind::Semicolon => Ok(Stmt::Empty(token.span)),

            _ => match self.parse_simple_stmt(false)? {
                SimpleStmt::Stmt(stmt) => Ok(stmt),
                SimpleStmt::Range { span, .. } => Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    span,
                    "range clause outside for statement",
                )),
            },
        }
    }

    fn parse_labeled(&mut self) -> Result<Stmt, ParseError> {
        let label = self.parse_ident()?;
        self.expect(TokenKind::Colon)?;
        let stmt = if self.check(TokenKind::RBrace) {
            Stmt::Empty(self.peek().span)
        } else {
            self.parse_statement()?
        };
        let span = label.span.merge(stmt.span());
        Ok(Stmt::Labeled(Box::new(LabeledStmt { label, stmt, span })))
    }

    /// Parse an expression, send, inc/dec, or assignment statement.
    fn parse_simple_stmt(&mut self, range_ok: bool) -> Result<SimpleStmt, ParseError> {
        if range_ok && self.check(TokenKind::Range) {
            let start = self.advance();
            let expr = self.parse_expression()?;
            let span = start.span.merge(expr.span());
            return Ok(SimpleStmt::Range {
                key: None,
                value: None,
                define: false,
                expr,
                span,
            });
        }

        let lhs = self.parse_expr_list()?;
        let token = *self.peek();

        if let Some(op) = AssignOp::from_token(token.kind) {
            self.advance();
            let plain = matches!(op, AssignOp::Assign | AssignOp::Define);
            if range_ok && plain && self.check(TokenKind::Range) {
                self.advance();
                let expr = self.parse_expression()?;
                let span = lhs[0].span().merge(expr.span());
                if lhs.len() > 2 {
                    return Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        span,
                        "range clause permits at most two iteration variables",
                    ));
                }
                let mut vars = lhs.into_iter();
                return Ok(SimpleStmt::Range {
                    key: vars.next(),
                    value: vars.next(),
                    define: op == AssignOp::Define,
                    expr,
                    span,
                });
            }
            let rhs = self.parse_expr_list()?;
            let span = lhs[0].span().merge(rhs[rhs.len() - 1].span());
            return Ok(SimpleStmt::Stmt(Stmt::Assign(Box::new(AssignStmt {
                lhs,
                op,
                rhs,
                span,
            }))));
        }

        let mut lhs = lhs;
        if lhs.len() > 1 {
            return Err(self.unexpected("':=' or '=' or ','"));
        }
        let Some(expr) = lhs.pop() else {
            return Err(self.unexpected("expression"));
        };

        match token.kind {
            TokenKind::Arrow => {
                self.advance();
                let value = self.parse_expression()?;
                let span = expr.span().merge(value.span());
                Ok(SimpleStmt::Stmt(Stmt::Send(Box::new(SendStmt {
                    chan: expr,
                    value,
                    span,
                }))))
            }
            TokenKind::Inc | TokenKind::Dec => {
                self.advance();
                let span = expr.span().merge(token.span);
                Ok(SimpleStmt::Stmt(Stmt::IncDec(Box::new(IncDecStmt {
                    expr,
                    inc: token.kind == TokenKind::Inc,
                    span,
                }))))
            }
            _ => Ok(SimpleStmt::Stmt(Stmt::Expr(expr))),
        }
    }

    /// Run `f` with composite literals of bare type names disabled.
    fn in_control_clause<T>(
        &mut self,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        let saved = self.expr_level;
        self.expr_level = -1;
        let result = f(self);
        self.expr_level = saved;
        result
    }

    // ========================================================================
    // if
    // ========================================================================

    fn parse_if(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(TokenKind::If)?;
        let (init, cond) = self.in_control_clause(|p| {
            let first = p.parse_switch_header_stmt()?;
            if p.eat(TokenKind::Semicolon).is_some() {
                let cond = p.parse_expression()?;
                Ok((Some(first), cond))
            } else {
                match first {
                    Stmt::Expr(cond) => Ok((None, cond)),
                    other => Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        other.span(),
                        "cannot use statement as value; missing condition in if statement",
                    )),
                }
            }
        })?;

        let then = self.parse_block()?;
        let els = if self.eat(TokenKind::Else).is_some() {
            match self.peek().kind {
                TokenKind::If => Some(self.parse_if()?),
                TokenKind::LBrace => Some(Stmt::Block(self.parse_block()?)),
                _ => return Err(self.unexpected("'if' or '{'")),
            }
        } else {
            None
        };

        let end = els.as_ref().map_or(then.span, Stmt::span);
        Ok(Stmt::If(Box::new(IfStmt {
            init,
            cond,
            then,
            els,
            span: start.span.merge(end),
        })))
    }

    // ========================================================================
    // switch
    // ========================================================================

    fn parse_switch(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(TokenKind::Switch)?;
        let (init, tag) = self.in_control_clause(|p| {
            if p.check(TokenKind::LBrace) {
                return Ok((None, None));
            }
            let first = if p.check(TokenKind::Semicolon) {
                None
            } else {
                Some(p.parse_switch_header_stmt()?)
            };
            if p.eat(TokenKind::Semicolon).is_some() {
                let tag = if p.check(TokenKind::LBrace) {
                    None
                } else {
                    Some(p.parse_switch_header_stmt()?)
                };
                Ok((first, tag))
            } else {
                Ok((None, first))
            }
        })?;

        // Type switch: `x.(type)` or `v := x.(type)` as the tag statement.
        let guard = match &tag {
            Some(Stmt::Expr(Expr::TypeAssert(ta))) if ta.ty.is_none() => Some((None, ta.expr.clone())),
            Some(Stmt::Assign(assign)) if assign.op == AssignOp::Define => match (&assign.lhs[..], &assign.rhs[..]) {
                ([Expr::Ident(binding)], [Expr::TypeAssert(ta)]) if ta.ty.is_none() => {
                    Some((Some(binding.clone()), ta.expr.clone()))
                }
                _ => None,
            },
            _ => None,
        };

        let open = self.expect(TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            clauses.push(self.parse_case_clause()?);
        }
        let close = self.expect(TokenKind::RBrace)?;
        let span = start.span.merge(open.span).merge(close.span);

        if let Some((binding, expr)) = guard {
            return Ok(Stmt::TypeSwitch(Box::new(TypeSwitchStmt {
                init,
                binding,
                expr,
                clauses,
                span,
            })));
        }

        let tag = match tag {
            None => None,
            Some(Stmt::Expr(expr)) => Some(expr),
            Some(other) => {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    other.span(),
                    "switch expression must be an expression",
                ));
            }
        };
        Ok(Stmt::Switch(Box::new(SwitchStmt {
            init,
            tag,
            clauses,
            span,
        })))
    }

    /// Parse a simple statement in a header that never allows `range`.
    fn parse_switch_header_stmt(&mut self) -> Result<Stmt, ParseError> {
        match self.parse_simple_stmt(false)? {
            SimpleStmt::Stmt(stmt) => Ok(stmt),
            SimpleStmt::Range { .. } => unreachable_range(),
        }
    }

    fn parse_case_clause(&mut self) -> Result<CaseClause, ParseError> {
        let start = *self.peek();
        let list = match start.kind {
            TokenKind::Case => {
                self.advance();
                Some(self.parse_expr_list()?)
            }
            TokenKind::Default => {
                self.advance();
                None
            }
            _ => return Err(self.unexpected("'case' or 'default'")),
        };
        let colon = self.expect(TokenKind::Colon)?;
        let body = self.parse_stmt_list()?;
        let end = body.last().map_or(colon.span, Stmt::span);
        Ok(CaseClause {
            list,
            body,
            span: start.span.merge(end),
        })
    }

    // ========================================================================
    // select
    // ========================================================================

    fn parse_select(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(TokenKind::Select)?;
        self.expect(TokenKind::LBrace)?;
        let mut clauses = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            if self.eat(TokenKind::Semicolon).is_some() {
                continue;
            }
            let clause_start = *self.peek();
            let comm = match clause_start.kind {
                TokenKind::Case => {
                    self.advance();
                    Some(self.parse_switch_header_stmt()?)
                }
                TokenKind::Default => {
                    self.advance();
                    None
                }
                _ => return Err(self.unexpected("'case' or 'default'")),
            };
            let colon = self.expect(TokenKind::Colon)?;
            let body = self.parse_stmt_list()?;
            let end = body.last().map_or(colon.span, Stmt::span);
            clauses.push(CommClause {
                comm,
                body,
                span: clause_start.span.merge(end),
            });
        }
        let close = self.expect(TokenKind::RBrace)?;
        Ok(Stmt::Select(Box::new(SelectStmt {
            clauses,
            span: start.span.merge(close.span),
        })))
    }

    // ========================================================================
    // for
    // ========================================================================

    fn parse_for(&mut self) -> Result<Stmt, ParseError> {
        let start = self.expect(TokenKind::For)?;

        enum Header {
            Loop(Option<Stmt>, Option<Expr>, Option<Stmt>),
            Range(Option<Expr>, Option<Expr>, bool, Expr),
        }

        let header = self.in_control_clause(|p| {
            if p.check(TokenKind::LBrace) {
                return Ok(Header::Loop(None, None, None));
            }
            let first = if p.check(TokenKind::Semicolon) {
                None
            } else {
                match p.parse_simple_stmt(true)? {
                    SimpleStmt::Range {
                        key,
                        value,
                        define,
                        expr,
                        ..
                    } => return Ok(Header::Range(key, value, define, expr)),
                    SimpleStmt::Stmt(stmt) => Some(stmt),
                }
            };

            if p.eat(TokenKind::Semicolon).is_none() {
                return match first {
                    Some(Stmt::Expr(cond)) => Ok(Header::Loop(None, Some(cond), None)),
                    Some(other) => Err(ParseError::new(
                        ParseErrorKind::InvalidSyntax,
                        other.span(),
                        "expected for loop condition",
                    )),
                    None => Ok(Header::Loop(None, None, None)),
                };
            }

            let cond = if p.check(TokenKind::Semicolon) {
                None
            } else {
                Some(p.parse_expression()?)
            };
            p.expect(TokenKind::Semicolon)?;
            let post = if p.check(TokenKind::LBrace) {
                None
            } else {
                Some(p.parse_switch_header_stmt()?)
            };
            Ok(Header::Loop(first, cond, post))
        })?;

        let body = self.parse_block()?;
        let span = start.span.merge(body.span);
        Ok(match header {
            Header::Loop(init, cond, post) => Stmt::For(Box::new(ForStmt {
                init,
                cond,
                post,
                body,
                span,
            })),
            Header::Range(key, value, define, expr) => Stmt::Range(Box::new(RangeStmt {
                key,
                value,
                define,
                expr,
                body,
                span,
            })),
        })
    }
}

/// Range clauses are only produced when a `for` header asks for them.
fn unreachable_range<T>() -> Result<T, ParseError> {
    Err(ParseError::new(
        ParseErrorKind::InvalidSyntax,
        Span::synthetic(),
        "range clause outside for statement",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_core::FileId;

    fn block(source: &str) -> Block {
        let mut parser = Parser::new(source, FileId(0));
        let block = parser.parse_block().unwrap();
        assert!(!parser.has_errors(), "errors: {:?}", parser.take_errors());
        block
    }

    #[test]
    fn short_var_decl_and_assign() {
        let b = block("{\n\tx := 1\n\tx, y = y, x\n\tx += 2\n}");
        assert_eq!(b.stmts.len(), 3);
        assert!(matches!(&b.stmts[0], Stmt::Assign(a) if a.op == AssignOp::Define));
        assert!(matches!(&b.stmts[1], Stmt::Assign(a) if a.lhs.len() == 2));
        assert!(matches!(&b.stmts[2], Stmt::Assign(a) if matches!(a.op, AssignOp::Compound(_))));
    }

    #[test]
    fn if_with_init_and_else_if() {
        let b = block("{\n\tif v, ok := m[k]; ok {\n\t\treturn v\n\t} else if x {\n\t} else {\n\t}\n}");
        let Stmt::If(stmt) = &b.stmts[0] else {
            panic!("expected if");
        };
        assert!(stmt.init.is_some());
        assert!(matches!(&stmt.els, Some(Stmt::If(inner)) if inner.els.is_some()));
    }

    #[test]
    fn if_condition_with_type_name_does_not_start_literal() {
        let b = block("{\n\tif x == y {\n\t\tx++\n\t}\n}");
        let Stmt::If(stmt) = &b.stmts[0] else {
            panic!("expected if");
        };
        assert_eq!(stmt.then.stmts.len(), 1);
    }

    #[test]
    fn for_forms() {
        let b = block(
            "{\n\tfor {\n\t}\n\tfor i < n {\n\t}\n\tfor i := 0; i < n; i++ {\n\t}\n\tfor k, v := range m {\n\t}\n\tfor range ch {\n\t}\n}",
        );
        assert!(matches!(&b.stmts[0], Stmt::For(f) if f.cond.is_none()));
        assert!(matches!(&b.stmts[1], Stmt::For(f) if f.cond.is_some() && f.init.is_none()));
        assert!(matches!(&b.stmts[2], Stmt::For(f) if f.init.is_some() && f.post.is_some()));
        assert!(matches!(&b.stmts[3], Stmt::Range(r) if r.define && r.value.is_some()));
        assert!(matches!(&b.stmts[4], Stmt::Range(r) if r.key.is_none()));
    }

    #[test]
    fn expression_switch() {
        let b = block("{\n\tswitch x {\n\tcase 1, 2:\n\t\ty()\n\tdefault:\n\t}\n}");
        let Stmt::Switch(sw) = &b.stmts[0] else {
            panic!("expected switch");
        };
        assert_eq!(sw.clauses.len(), 2);
        assert_eq!(sw.clauses[0].list.as_ref().map(Vec::len), Some(2));
        assert!(sw.clauses[1].list.is_none());
    }

    #[test]
    fn type_switch_with_binding() {
        let b = block("{\n\tswitch v := x.(type) {\n\tcase int, string:\n\tcase nil:\n\t}\n}");
        let Stmt::TypeSwitch(sw) = &b.stmts[0] else {
            panic!("expected type switch");
        };
        assert_eq!(sw.binding.as_ref().map(|b| b.name.as_str()), Some("v"));
        assert_eq!(sw.clauses.len(), 2);
    }

    #[test]
    fn select_and_send() {
        let b = block("{\n\tselect {\n\tcase v := <-in:\n\t\tout <- v\n\tdefault:\n\t}\n}");
        let Stmt::Select(sel) = &b.stmts[0] else {
            panic!("expected select");
        };
        assert!(matches!(&sel.clauses[0].body[0], Stmt::Send(_)));
    }

    #[test]
    fn labels_and_branches() {
        let b = block("{\nouter:\n\tfor {\n\t\tbreak outer\n\t}\n\tgoto outer\n}");
        assert!(matches!(&b.stmts[0], Stmt::Labeled(l) if l.label.name == "outer"));
        assert!(matches!(&b.stmts[1], Stmt::Branch(br) if br.kind == BranchKind::Goto));
    }

    #[test]
    fn defer_requires_call() {
        let mut parser = Parser::new("{\n\tdefer x\n}", FileId(0));
        assert!(parser.parse_block().is_err());
    }

    #[test]
    fn local_declarations() {
        let b = block("{\n\tvar x int\n\tconst c = 1\n\ttype pair struct{ a, b int }\n}");
        assert!(matches!(&b.stmts[0], Stmt::Decl(Decl::Var(_))));
        assert!(matches!(&b.stmts[1], Stmt::Decl(Decl::Const(_))));
        assert!(matches!(&b.stmts[2], Stmt::Decl(Decl::Type(_))));
    }
}
