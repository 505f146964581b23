//! Parser infrastructure for Go.
//!
//! Provides the main [`Parser`] struct with token navigation and basic
//! parsing infrastructure. The grammar itself lives in the `*_parser`
//! modules next to this one.

use super::node::{CommentGroup, Ident, IdentId};
use crate::ast::{File, ParseError, ParseErrorKind, ParseErrors};
use crate::lexer::{Comment, Lexer, Token, TokenKind};
use gotmpl_core::{FileId, Span};

/// The main parser for Go source code.
///
/// The parser tokenizes eagerly into a buffer, allowing arbitrary peeking
/// ahead without consuming tokens.
pub struct Parser<'src> {
    /// Buffered tokens for lookahead.
    pub(super) buffer: Vec<Token<'src>>,
    /// Current position in the buffer.
    pub(super) position: usize,
    /// Comments of the file, in source order.
    pub(super) comments: Vec<Comment<'src>>,
    /// Next comment not yet attached or skipped.
    pub(super) comment_pos: usize,
    /// Accumulated parse errors.
    pub(super) errors: ParseErrors,
    /// File being parsed.
    pub(super) file: FileId,
    /// Next identifier index.
    pub(super) next_ident: u32,
    /// Expression nesting level. Negative inside control clauses, where a
    /// `{` after a type name opens the block instead of a composite literal.
    pub(super) expr_level: i32,
}

impl<'src> Parser<'src> {
    /// Create a new parser for the given source code.
    ///
    /// Lexer errors are collected into the parser's error list; the
    /// offending tokens surface as [`TokenKind::Error`].
    pub fn new(source: &'src str, file: FileId) -> Self {
        let mut lexer = Lexer::new(source, file);
        let mut buffer = Vec::with_capacity(Self::estimate_token_count(source));
        let mut errors = ParseErrors::new();

        loop {
            let token = lexer.next_token();
            if token.kind == TokenKind::Error {
                for lexer_error in lexer.take_errors() {
                    errors.push(lexer_error);
                }
            }
            let is_eof = token.kind == TokenKind::Eof;
            buffer.push(token);
            if is_eof {
                break;
            }
        }
        for lexer_error in lexer.take_errors() {
            errors.push(lexer_error);
        }

        Self {
            buffer,
            position: 0,
            comments: lexer.take_comments(),
            comment_pos: 0,
            errors,
            file,
            next_ident: 0,
            expr_level: 0,
        }
    }

    /// Parse a whole source file.
    ///
    /// Returns every error found; the parser resynchronizes at the next
    /// top-level declaration after an error.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn parse_file(source: &'src str, file: FileId) -> Result<File, ParseErrors> {
        let mut parser = Parser::new(source, file);
        let parsed = parser.parse_source_file();
        match parsed {
            Ok(tree) if parser.errors.is_empty() => Ok(tree),
            Ok(_) => Err(parser.take_errors()),
            Err(err) => {
                parser.errors.push(err);
                Err(parser.take_errors())
            }
        }
    }

    /// Estimate the number of tokens based on source length.
    ///
    /// Uses a heuristic of ~6 characters per token on average.
    fn estimate_token_count(source: &str) -> usize {
        (source.len() / 6).clamp(64, 16384)
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Take the errors, leaving an empty error collection.
    pub fn take_errors(&mut self) -> ParseErrors {
        std::mem::take(&mut self.errors)
    }

    // ========================================================================
    // Token Navigation
    // ========================================================================

    /// Peek at the current token without consuming it.
    pub fn peek(&self) -> &Token<'src> {
        self.peek_nth(0)
    }

    /// Peek ahead n tokens without consuming.
    ///
    /// Peeking past the end yields the EOF token.
    pub fn peek_nth(&self, n: usize) -> &Token<'src> {
        let last = self.buffer.len() - 1;
        &self.buffer[(self.position + n).min(last)]
    }

    /// Get the current token and advance to the next.
    ///
    /// Never moves past EOF.
    pub fn advance(&mut self) -> Token<'src> {
        let token = *self.peek();
        if token.kind != TokenKind::Eof {
            self.position += 1;
        }
        token
    }

    /// The most recently consumed token.
    pub fn previous(&self) -> Option<&Token<'src>> {
        self.position.checked_sub(1).map(|i| &self.buffer[i])
    }

    /// Check if the current token matches the given kind.
    pub fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    /// Check if the current token is EOF.
    pub fn is_eof(&self) -> bool {
        self.check(TokenKind::Eof)
    }

    /// If the current token matches the given kind, consume it and return Some.
    /// Otherwise, return None without consuming.
    pub fn eat(&mut self, kind: TokenKind) -> Option<Token<'src>> {
        if self.check(kind) {
            Some(self.advance())
        } else {
            None
        }
    }

    /// Expect the current token to be of the given kind.
    /// If it matches, consume and return it. Otherwise, return an error.
    pub fn expect(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(kind.as_str()))
        }
    }

    /// Expect a closing token, tolerating the semicolon that Go inserts
    /// before it when the closer starts a new line.
    pub fn expect_closing(&mut self, kind: TokenKind) -> Result<Token<'src>, ParseError> {
        if self.peek().is_auto_semicolon() && self.peek_nth(1).kind == kind {
            self.advance();
        }
        self.expect(kind)
    }

    /// Expect the end of a statement or declaration.
    ///
    /// A semicolon may be omitted before a closing `)` or `}`.
    pub fn expect_semi(&mut self) -> Result<(), ParseError> {
        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(())
            }
            TokenKind::RParen | TokenKind::RBrace | TokenKind::Eof => Ok(()),
            _ => Err(self.unexpected("';' or newline")),
        }
    }

    /// Build an "expected X, found Y" error at the current token.
    pub fn unexpected(&self, expected: &str) -> ParseError {
        let token = self.peek();
        ParseError::expected_token(token.span, expected, &Self::describe(token))
    }

    /// Describe a token for diagnostics.
    pub(super) fn describe(token: &Token<'_>) -> String {
        match token.kind {
            TokenKind::Semicolon if token.is_auto_semicolon() => "newline".to_string(),
            TokenKind::Ident => format!("'{}'", token.lexeme),
            kind if kind.is_literal() => format!("{} {}", kind.as_str(), token.lexeme),
            kind => kind.to_string(),
        }
    }

    // ========================================================================
    // Identifiers
    // ========================================================================

    /// Make an identifier node with the next id of this file.
    pub(super) fn make_ident(&mut self, name: &str, span: Span) -> Ident {
        let id = IdentId {
            file: self.file,
            index: self.next_ident,
        };
        self.next_ident += 1;
        Ident::new(name, id, span)
    }

    /// Parse an identifier.
    pub fn parse_ident(&mut self) -> Result<Ident, ParseError> {
        let token = *self.peek();
        if token.kind != TokenKind::Ident {
            return Err(ParseError::expected_identifier(
                token.span,
                &Self::describe(&token),
            ));
        }
        self.advance();
        Ok(self.make_ident(token.lexeme, token.span))
    }

    /// Parse a comma-separated identifier list.
    pub fn parse_ident_list(&mut self) -> Result<Vec<Ident>, ParseError> {
        let mut idents = vec![self.parse_ident()?];
        while self.eat(TokenKind::Comma).is_some() {
            idents.push(self.parse_ident()?);
        }
        Ok(idents)
    }

    // ========================================================================
    // Comments
    // ========================================================================

    /// Take the comments between the previous token and the current one.
    ///
    /// Comments that precede the previous token are dropped; they belong
    /// to code the parser has already passed.
    pub(super) fn take_doc(&mut self) -> Option<CommentGroup> {
        let here = position_key(self.peek().span);
        let after = self.previous().map(|t| position_key(t.span));
        let mut lines = Vec::new();
        while let Some(comment) = self.comments.get(self.comment_pos) {
            let at = position_key(comment.span);
            if at >= here {
                break;
            }
            if after.is_none_or(|prev| at > prev) {
                lines.push(comment.text.to_string());
            }
            self.comment_pos += 1;
        }
        if lines.is_empty() {
            None
        } else {
            Some(CommentGroup { lines })
        }
    }

    // ========================================================================
    // Error Handling
    // ========================================================================

    /// Record a parse error.
    pub fn error(&mut self, kind: ParseErrorKind, span: Span, message: impl Into<String>) {
        self.errors.push(ParseError::new(kind, span, message));
    }

    /// Skip tokens until the start of the next top-level declaration.
    pub(super) fn synchronize_decl(&mut self) {
        loop {
            match self.peek().kind {
                TokenKind::Eof => return,
                TokenKind::Func | TokenKind::Type | TokenKind::Var | TokenKind::Const
                | TokenKind::Import
                    if self.previous().is_none_or(|t| t.kind == TokenKind::Semicolon) =>
                {
                    return;
                }
                _ => {
                    self.advance();
                }
            }
        }
    }
}

/// Orderable position of a span within one file.
fn position_key(span: Span) -> (u32, u32) {
    (span.line, span.col)
}
