//! Expression parsing using Pratt parsing (precedence climbing).
//!
//! This module implements expression parsing with Go's five binary
//! precedence levels, unary operators, and the primary-expression suffixes
//! (selectors, index/slice, type assertions, calls, composite literals).

use super::parser::Parser;
use crate::ast::expr::*;
use crate::ast::{BinaryOp, ParseError, ParseErrorKind, UnaryOp};
use crate::lexer::TokenKind;
use gotmpl_core::Span;

impl<'src> Parser<'src> {
    /// Parse a full expression.
    pub fn parse_expression(&mut self) -> Result<Expr, ParseError> {
        self.parse_expr(0)
    }

    /// Parse an expression with a minimum binding power.
    ///
    /// This is the core of the Pratt parser. It handles operator precedence
    /// by only consuming operators with sufficient binding power.
    pub fn parse_expr(&mut self, min_bp: u8) -> Result<Expr, ParseError> {
        let mut lhs = self.parse_unary()?;

        while let Some(op) = BinaryOp::from_token(self.peek().kind) {
            let (l_bp, r_bp) = op.binding_power();
            if l_bp < min_bp {
                break;
            }
            self.advance();
            let rhs = self.parse_expr(r_bp)?;
            let span = lhs.span().merge(rhs.span());
            lhs = Expr::Binary(Box::new(BinaryExpr {
                left: lhs,
                op,
                right: rhs,
                span,
            }));
        }

        Ok(lhs)
    }

    /// Parse a comma-separated expression list.
    pub fn parse_expr_list(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut exprs = vec![self.parse_expression()?];
        while self.eat(TokenKind::Comma).is_some() {
            exprs.push(self.parse_expression()?);
        }
        Ok(exprs)
    }

    /// Parse a unary expression (prefix operators, then a primary expression).
    fn parse_unary(&mut self) -> Result<Expr, ParseError> {
        let token = *self.peek();

        // `<-chan T` is a type, `<-x` a receive.
        if token.kind == TokenKind::Arrow && self.peek_nth(1).kind == TokenKind::Chan {
            let ty = self.parse_type()?;
            return self.parse_primary_suffixes(ty);
        }

        if let Some(op) = UnaryOp::from_token(token.kind) {
            self.advance();
            let expr = self.parse_unary()?;
            let span = token.span.merge(expr.span());
            return Ok(Expr::Unary(Box::new(UnaryExpr { op, expr, span })));
        }

        if token.kind == TokenKind::Star {
            self.advance();
            let expr = self.parse_unary()?;
            let span = token.span.merge(expr.span());
            return Ok(Expr::Star(Box::new(StarExpr { expr, span })));
        }

        let operand = self.parse_operand()?;
        self.parse_primary_suffixes(operand)
    }

    /// Parse an operand: literal, identifier, parenthesized expression,
    /// function literal, or type literal.
    fn parse_operand(&mut self) -> Result<Expr, ParseError> {
        let token = *self.peek();

        match token.kind {
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Imag
            | TokenKind::Char
            | TokenKind::String
            | TokenKind::RawString => {
                self.advance();
                let kind = match token.kind {
                    TokenKind::Int => LitKind::Int,
                    TokenKind::Float => LitKind::Float,
                    TokenKind::Imag => LitKind::Imag,
                    TokenKind::Char => LitKind::Char,
                    _ => LitKind::String,
                };
                Ok(Expr::BasicLit(BasicLit {
                    kind,
                    value: token.lexeme.to_string(),
                    span: token.span,
                }))
            }

            TokenKind::Ident => Ok(Expr::Ident(self.parse_ident()?)),

            TokenKind::LParen => {
                self.advance();
                self.expr_level += 1;
                let expr = self.parse_expression()?;
                self.expr_level -= 1;
                let close = self.expect_closing(TokenKind::RParen)?;
                let span = token.span.merge(close.span);
                Ok(Expr::Paren(Box::new(ParenExpr { expr, span })))
            }

            TokenKind::Func => {
                let ty = self.parse_func_type()?;
                if self.check(TokenKind::LBrace) {
                    let saved = self.expr_level;
                    self.expr_level = 0;
                    let body = self.parse_block();
                    self.expr_level = saved;
                    let body = body?;
                    let span = ty.span.merge(body.span);
                    Ok(Expr::FuncLit(Box::new(FuncLit { ty, body, span })))
                } else {
                    Ok(Expr::FuncType(Box::new(ty)))
                }
            }

            TokenKind::LBracket
            | TokenKind::Struct
            | TokenKind::Map
            | TokenKind::Chan
            | TokenKind::Interface => self.parse_type(),

            _ => Err(ParseError::expected_expression(
                token.span,
                &Self::describe(&token),
            )),
        }
    }

    /// Parse selectors, calls, index/slice, assertions and composite
    /// literals following an operand.
    fn parse_primary_suffixes(&mut self, mut expr: Expr) -> Result<Expr, ParseError> {
        loop {
            match self.peek().kind {
                TokenKind::Dot => {
                    self.advance();
                    if self.check(TokenKind::LParen) {
                        expr = self.parse_type_assertion(expr)?;
                    } else {
                        let sel = self.parse_ident()?;
                        let span = expr.span().merge(sel.span);
                        expr = Expr::Selector(Box::new(SelectorExpr { expr, sel, span }));
                    }
                }
                TokenKind::LBracket => expr = self.parse_index_or_slice(expr)?,
                TokenKind::LParen => expr = self.parse_call(expr)?,
                TokenKind::LBrace if self.is_literal_type(&expr) => {
                    expr = self.parse_composite_lit(Some(expr))?;
                }
                _ => return Ok(expr),
            }
        }
    }

    /// Whether `{` after `expr` starts a composite literal.
    ///
    /// Bare type names are ambiguous with a block inside control clauses
    /// (`if x == T {`), so they only count outside them.
    fn is_literal_type(&self, expr: &Expr) -> bool {
        match expr {
            Expr::Ident(_) => self.expr_level >= 0,
            Expr::Selector(sel) => matches!(sel.expr, Expr::Ident(_)) && self.expr_level >= 0,
            Expr::ArrayType(_) | Expr::StructType(_) | Expr::MapType(_) => true,
            _ => false,
        }
    }

    /// Parse `.(T)` or `.(type)`; the leading `.` is already consumed.
    fn parse_type_assertion(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen)?;
        let ty = if self.eat(TokenKind::Type).is_some() {
            None
        } else {
            Some(self.parse_type()?)
        };
        let close = self.expect_closing(TokenKind::RParen)?;
        let span = expr.span().merge(close.span);
        Ok(Expr::TypeAssert(Box::new(TypeAssertExpr { expr, ty, span })))
    }

    /// Parse `[i]`, `[lo:hi]` or `[lo:hi:max]`.
    fn parse_index_or_slice(&mut self, expr: Expr) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LBracket)?;
        self.expr_level += 1;
        let result = self.parse_index_body(expr, open.span);
        self.expr_level -= 1;
        result
    }

    fn parse_index_body(&mut self, expr: Expr, open: Span) -> Result<Expr, ParseError> {
        let low = if self.check(TokenKind::Colon) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        if self.eat(TokenKind::Colon).is_none() {
            let close = self.expect_closing(TokenKind::RBracket)?;
            let span = expr.span().merge(close.span);
            let Some(index) = low else {
                return Err(ParseError::expected_expression(open, "']'"));
            };
            return Ok(Expr::Index(Box::new(IndexExpr { expr, index, span })));
        }

        let high = if matches!(self.peek().kind, TokenKind::Colon | TokenKind::RBracket) {
            None
        } else {
            Some(self.parse_expression()?)
        };

        let mut max = None;
        let mut slice3 = false;
        if self.eat(TokenKind::Colon).is_some() {
            slice3 = true;
            if high.is_none() {
                let span = self.peek().span;
                self.error(
                    ParseErrorKind::InvalidSyntax,
                    span,
                    "middle index required in 3-index slice",
                );
            }
            max = Some(self.parse_expression()?);
        }

        let close = self.expect_closing(TokenKind::RBracket)?;
        let span = expr.span().merge(close.span);
        Ok(Expr::Slice(Box::new(SliceExpr {
            expr,
            low,
            high,
            max,
            slice3,
            span,
        })))
    }

    /// Parse call arguments.
    fn parse_call(&mut self, func: Expr) -> Result<Expr, ParseError> {
        self.expect(TokenKind::LParen)?;
        self.expr_level += 1;
        let mut args = Vec::new();
        let mut has_ellipsis = false;
        while !self.check(TokenKind::RParen) && !self.is_eof() {
            if self.peek().is_auto_semicolon() && self.peek_nth(1).kind == TokenKind::RParen {
                break;
            }
            args.push(self.parse_expression()?);
            if self.eat(TokenKind::Ellipsis).is_some() {
                has_ellipsis = true;
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expr_level -= 1;
        let close = self.expect_closing(TokenKind::RParen)?;
        let span = func.span().merge(close.span);
        Ok(Expr::Call(Box::new(CallExpr {
            func,
            args,
            has_ellipsis,
            span,
        })))
    }

    /// Parse `{ elements }` of a composite literal with the given type.
    pub(super) fn parse_composite_lit(&mut self, ty: Option<Expr>) -> Result<Expr, ParseError> {
        let open = self.expect(TokenKind::LBrace)?;
        self.expr_level += 1;
        let elts = self.parse_literal_elements();
        self.expr_level -= 1;
        let elts = elts?;
        let close = self.expect_closing(TokenKind::RBrace)?;
        let start = ty.as_ref().map_or(open.span, Expr::span);
        Ok(Expr::CompositeLit(Box::new(CompositeLit {
            ty,
            elts,
            span: start.merge(close.span),
        })))
    }

    fn parse_literal_elements(&mut self) -> Result<Vec<Expr>, ParseError> {
        let mut elts = Vec::new();
        while !self.check(TokenKind::RBrace) && !self.is_eof() {
            if self.peek().is_auto_semicolon() && self.peek_nth(1).kind == TokenKind::RBrace {
                break;
            }
            let key = self.parse_element()?;
            let elt = if self.eat(TokenKind::Colon).is_some() {
                let value = self.parse_element()?;
                let span = key.span().merge(value.span());
                Expr::KeyValue(Box::new(KeyValueExpr { key, value, span }))
            } else {
                key
            };
            elts.push(elt);
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        Ok(elts)
    }

    /// A literal element: an expression or an elided-type `{...}` literal.
    fn parse_element(&mut self) -> Result<Expr, ParseError> {
        if self.check(TokenKind::LBrace) {
            self.parse_composite_lit(None)
        } else {
            self.parse_expression()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gotmpl_core::FileId;

    fn parse(source: &str) -> Expr {
        let mut parser = Parser::new(source, FileId(0));
        let expr = parser.parse_expression().unwrap();
        assert!(!parser.has_errors(), "errors: {:?}", parser.take_errors());
        expr
    }

    #[test]
    fn precedence_mul_over_add() {
        let Expr::Binary(bin) = parse("a + b * c") else {
            panic!("expected binary");
        };
        assert_eq!(bin.op, BinaryOp::Add);
        assert!(matches!(&bin.right, Expr::Binary(r) if r.op == BinaryOp::Mul));
    }

    #[test]
    fn left_associative_subtraction() {
        let Expr::Binary(bin) = parse("a - b - c") else {
            panic!("expected binary");
        };
        assert!(matches!(&bin.left, Expr::Binary(l) if l.op == BinaryOp::Sub));
        assert!(matches!(&bin.right, Expr::Ident(i) if i.name == "c"));
    }

    #[test]
    fn comparison_binds_looser_than_shift() {
        let Expr::Binary(bin) = parse("x << 1 == y") else {
            panic!("expected binary");
        };
        assert_eq!(bin.op, BinaryOp::Equal);
    }

    #[test]
    fn unary_and_star() {
        assert!(matches!(parse("-x"), Expr::Unary(u) if u.op == UnaryOp::Neg));
        assert!(matches!(parse("*p"), Expr::Star(_)));
        assert!(matches!(parse("<-ch"), Expr::Unary(u) if u.op == UnaryOp::Recv));
    }

    #[test]
    fn selector_call_index_chain() {
        let Expr::Index(index) = parse("obj.method(1, 2)[0]") else {
            panic!("expected index");
        };
        let Expr::Call(call) = &index.expr else {
            panic!("expected call");
        };
        assert_eq!(call.args.len(), 2);
        assert!(matches!(&call.func, Expr::Selector(s) if s.sel.name == "method"));
    }

    #[test]
    fn slice_forms() {
        assert!(matches!(parse("s[1:]"), Expr::Slice(s) if s.high.is_none() && !s.slice3));
        assert!(matches!(parse("s[:2:3]"), Expr::Slice(s) if s.low.is_none() && s.slice3));
    }

    #[test]
    fn composite_literals() {
        let Expr::CompositeLit(lit) = parse("Point{X: 1, Y: 2}") else {
            panic!("expected composite literal");
        };
        assert_eq!(lit.elts.len(), 2);
        assert!(matches!(&lit.elts[0], Expr::KeyValue(_)));

        let Expr::CompositeLit(nested) = parse("[]Point{{1, 2}, {3, 4}}") else {
            panic!("expected composite literal");
        };
        assert!(matches!(&nested.elts[0], Expr::CompositeLit(inner) if inner.ty.is_none()));
    }

    #[test]
    fn multiline_literal_with_trailing_comma() {
        let Expr::CompositeLit(lit) = parse("map[string]int{\n\t\"a\": 1,\n\t\"b\": 2,\n}") else {
            panic!("expected composite literal");
        };
        assert_eq!(lit.elts.len(), 2);
    }

    #[test]
    fn type_assertions() {
        assert!(matches!(parse("x.(int)"), Expr::TypeAssert(t) if t.ty.is_some()));
        assert!(matches!(parse("x.(type)"), Expr::TypeAssert(t) if t.ty.is_none()));
    }

    #[test]
    fn conversions_and_make() {
        assert!(matches!(parse("(*T)(p)"), Expr::Call(_)));
        let Expr::Call(call) = parse("make([]int, 0, n)") else {
            panic!("expected call");
        };
        assert!(matches!(&call.args[0], Expr::ArrayType(a) if a.len.is_none()));
    }

    #[test]
    fn variadic_call() {
        assert!(matches!(parse("append(a, b...)"), Expr::Call(c) if c.has_ellipsis));
    }

    #[test]
    fn func_literal() {
        let Expr::Call(call) = parse("func(x int) int { return x }(1)") else {
            panic!("expected call");
        };
        assert!(matches!(&call.func, Expr::FuncLit(_)));
    }

    #[test]
    fn no_composite_literal_in_control_clause() {
        let mut parser = Parser::new("x == T {", FileId(0));
        parser.expr_level = -1;
        let expr = parser.parse_expression().unwrap();
        assert!(matches!(expr, Expr::Binary(_)));
        assert!(parser.check(TokenKind::LBrace));
    }

    #[test]
    fn missing_operand_is_error() {
        let mut parser = Parser::new("1 +", FileId(0));
        let err = parser.parse_expression().unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::ExpectedExpression);
    }
}
