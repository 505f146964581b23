//! Main lexer implementation for Go.
//!
//! The [`Lexer`] converts source text into a stream of [`Token`]s.
//! It uses direct dispatch based on the first character and implements
//! Go's automatic semicolon insertion: a newline (or end of file) after a
//! token that can end a statement produces a `;` token with lexeme `"\n"`.
//!
//! Comments do not produce tokens; they are collected on the side so the
//! parser can attach them to declarations. A comment spanning a newline
//! behaves like a newline.

use gotmpl_core::{FileId, ParseError, ParseErrorKind, Span};

use super::cursor::{Cursor, is_ident_continue, is_ident_start};
use super::token::{Token, TokenKind, lookup_keyword};

/// A comment recorded while skipping trivia.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Comment<'src> {
    /// Full comment text including delimiters.
    pub text: &'src str,
    /// Location of the comment start.
    pub span: Span,
}

/// Lexer for Go source code.
pub struct Lexer<'src> {
    /// Low-level character cursor.
    cursor: Cursor<'src>,
    /// File the produced spans belong to.
    file: FileId,
    /// Whether a newline right now would insert a semicolon.
    insert_semi: bool,
    /// Whether the EOF token was already produced.
    done: bool,
    /// Accumulated errors.
    errors: Vec<ParseError>,
    /// Comments seen so far, in source order.
    comments: Vec<Comment<'src>>,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    pub fn new(source: &'src str, file: FileId) -> Self {
        Self {
            cursor: Cursor::new(source),
            file,
            insert_semi: false,
            done: false,
            errors: Vec::new(),
            comments: Vec::new(),
        }
    }

    /// Take accumulated errors, leaving an empty vec.
    pub fn take_errors(&mut self) -> Vec<ParseError> {
        std::mem::take(&mut self.errors)
    }

    /// Take collected comments, leaving an empty vec.
    pub fn take_comments(&mut self) -> Vec<Comment<'src>> {
        std::mem::take(&mut self.comments)
    }

    /// Check if any errors occurred.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Tokenize the whole input, including the final EOF token.
    pub fn tokenize(mut self) -> (Vec<Token<'src>>, Vec<ParseError>) {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        (tokens, self.errors)
    }

    /// Consume and return the next token.
    pub fn next_token(&mut self) -> Token<'src> {
        if self.done {
            return self.make_eof();
        }
        let token = self.scan_token();
        if token.kind == TokenKind::Eof {
            self.done = true;
        }
        if token.kind != TokenKind::Error {
            self.insert_semi = token.kind.ends_statement();
        }
        token
    }

    // =========================================
    // Internal: Token scanning
    // =========================================

    /// Scan the next token from source.
    fn scan_token(&mut self) -> Token<'src> {
        if let Some(semi) = self.skip_trivia() {
            return semi;
        }

        if self.cursor.is_eof() {
            if self.insert_semi {
                return self.auto_semicolon();
            }
            return self.make_eof();
        }

        let start_line = self.cursor.line();
        let start_col = self.cursor.column();
        let start_offset = self.cursor.offset();
        let start = (start_line, start_col, start_offset);

        match self.cursor.peek() {
            Some('"') => self.scan_string(start),
            Some('`') => self.scan_raw_string(start),
            Some('\'') => self.scan_rune(start),
            Some(c) if c.is_ascii_digit() => self.scan_number(start),
            Some('.') if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.scan_number(start)
            }
            Some(c) if is_ident_start(c) => self.scan_identifier(start),
            _ => self.scan_operator(start),
        }
    }

    /// Skip whitespace and comments.
    ///
    /// Returns an inserted semicolon when a newline is crossed while the
    /// previous token can end a statement.
    fn skip_trivia(&mut self) -> Option<Token<'src>> {
        loop {
            match self.cursor.peek() {
                Some('\n') => {
                    if self.insert_semi {
                        let semi = self.auto_semicolon();
                        self.cursor.advance();
                        return Some(semi);
                    }
                    self.cursor.advance();
                }
                Some(' ' | '\t' | '\r') => {
                    self.cursor.advance();
                }
                Some('\u{FEFF}') if self.cursor.offset() == 0 => {
                    self.cursor.advance();
                }
                Some('/') if self.cursor.peek_nth(1) == Some('/') => {
                    // The newline ending the comment is handled by the next iteration.
                    let span = Span::point(self.file, self.cursor.line(), self.cursor.column());
                    let text = self.cursor.eat_while(|c| c != '\n');
                    let text = text.trim_end_matches('\r');
                    self.comments.push(Comment { text, span });
                }
                Some('/') if self.cursor.peek_nth(1) == Some('*') => {
                    let semi_span = Span::point(self.file, self.cursor.line(), self.cursor.column());
                    let start_line = self.cursor.line();
                    let start_offset = self.cursor.offset();
                    if !self.skip_block_comment() {
                        return None;
                    }
                    self.comments.push(Comment {
                        text: self.cursor.slice_from(start_offset),
                        span: semi_span,
                    });
                    if self.insert_semi && self.cursor.line() > start_line {
                        return Some(Token::new(TokenKind::Semicolon, "\n", semi_span));
                    }
                }
                _ => return None,
            }
        }
    }

    /// Skip a block comment `/* ... */`. Returns false when unterminated.
    fn skip_block_comment(&mut self) -> bool {
        let span = Span::new(self.file, self.cursor.line(), self.cursor.column(), 2);
        self.cursor.advance();
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None => {
                    self.errors.push(ParseError::new(
                        ParseErrorKind::UnterminatedComment,
                        span,
                        "comment not terminated",
                    ));
                    return false;
                }
                Some('*') if self.cursor.eat('/') => return true,
                Some(_) => {}
            }
        }
    }

    /// An inserted semicolon at the current position.
    fn auto_semicolon(&self) -> Token<'src> {
        let span = Span::point(self.file, self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Semicolon, "\n", span)
    }

    /// Create an EOF token.
    fn make_eof(&self) -> Token<'src> {
        let span = Span::point(self.file, self.cursor.line(), self.cursor.column());
        Token::new(TokenKind::Eof, "", span)
    }

    /// Create a token from start position to current position.
    fn make_token(&self, kind: TokenKind, start: (u32, u32, u32)) -> Token<'src> {
        let (line, col, offset) = start;
        let len = self.cursor.offset() - offset;
        let span = Span::new(self.file, line, col, len);
        Token::new(kind, self.cursor.slice_from(offset), span)
    }

    /// Create an error token and record the error.
    fn make_error(
        &mut self,
        kind: ParseErrorKind,
        start: (u32, u32, u32),
        message: &str,
    ) -> Token<'src> {
        let token = self.make_token(TokenKind::Error, start);
        self.errors.push(ParseError::new(kind, token.span, message));
        token
    }

    // =========================================
    // Scanning: Strings and runes
    // =========================================

    /// Scan an interpreted string literal.
    fn scan_string(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        self.cursor.advance();
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return self.make_error(
                        ParseErrorKind::UnterminatedLiteral,
                        start,
                        "string literal not terminated",
                    );
                }
                Some('\\') => {
                    self.cursor.advance();
                    if self.cursor.peek().is_some_and(|c| c != '\n') {
                        self.cursor.advance();
                    }
                }
                Some('"') => {
                    self.cursor.advance();
                    return self.make_token(TokenKind::String, start);
                }
                Some(_) => {
                    self.cursor.advance();
                }
            }
        }
    }

    /// Scan a raw string literal, which may span lines.
    fn scan_raw_string(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None => {
                    return self.make_error(
                        ParseErrorKind::UnterminatedLiteral,
                        start,
                        "raw string literal not terminated",
                    );
                }
                Some('`') => return self.make_token(TokenKind::RawString, start),
                Some(_) => {}
            }
        }
    }

    /// Scan a rune literal.
    fn scan_rune(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        self.cursor.advance();
        let mut count = 0;
        loop {
            match self.cursor.peek() {
                None | Some('\n') => {
                    return self.make_error(
                        ParseErrorKind::UnterminatedLiteral,
                        start,
                        "rune literal not terminated",
                    );
                }
                Some('\\') => {
                    self.cursor.advance();
                    self.cursor.advance();
                    count += 1;
                }
                Some('\'') => {
                    self.cursor.advance();
                    if count == 0 {
                        return self.make_error(
                            ParseErrorKind::InvalidSyntax,
                            start,
                            "empty rune literal",
                        );
                    }
                    return self.make_token(TokenKind::Char, start);
                }
                Some(_) => {
                    self.cursor.advance();
                    count += 1;
                }
            }
        }
    }

    // =========================================
    // Scanning: Numbers
    // =========================================

    /// Scan a number literal.
    fn scan_number(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        if self.cursor.peek() == Some('0') {
            let radix = match self.cursor.peek_nth(1) {
                Some('x' | 'X') => Some(16),
                Some('o' | 'O') => Some(8),
                Some('b' | 'B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.cursor.advance();
                self.cursor.advance();
                let digits = self.cursor.eat_while(|c| c == '_' || c.is_digit(radix));
                if digits.trim_matches('_').is_empty() {
                    return self.make_error(
                        ParseErrorKind::InvalidNumber,
                        start,
                        "expected digits after radix prefix",
                    );
                }
                return self.finish_number(TokenKind::Int, start);
            }
        }

        let mut kind = TokenKind::Int;
        self.consume_decimal_digits();

        if self.cursor.peek() == Some('.') && self.cursor.peek_nth(1) != Some('.') {
            self.cursor.advance();
            self.consume_decimal_digits();
            kind = TokenKind::Float;
        }

        if let Some('e' | 'E') = self.cursor.peek() {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            if !self.cursor.check(|c| c.is_ascii_digit()) {
                return self.make_error(
                    ParseErrorKind::InvalidNumber,
                    start,
                    "exponent has no digits",
                );
            }
            self.consume_decimal_digits();
            kind = TokenKind::Float;
        }

        self.finish_number(kind, start)
    }

    /// Handle the imaginary suffix and reject identifier characters glued to a number.
    fn finish_number(&mut self, kind: TokenKind, start: (u32, u32, u32)) -> Token<'src> {
        let kind = if self.cursor.eat('i') { TokenKind::Imag } else { kind };
        if self.cursor.check(is_ident_continue) {
            self.cursor.eat_while(is_ident_continue);
            return self.make_error(
                ParseErrorKind::InvalidNumber,
                start,
                "invalid character in numeric literal",
            );
        }
        self.make_token(kind, start)
    }

    /// Consume decimal digits (including underscores as separators).
    fn consume_decimal_digits(&mut self) {
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
    }

    // =========================================
    // Scanning: Identifiers and keywords
    // =========================================

    /// Scan an identifier or keyword.
    fn scan_identifier(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        let lexeme = self.cursor.eat_while(is_ident_continue);
        let kind = lookup_keyword(lexeme).unwrap_or(TokenKind::Ident);
        self.make_token(kind, start)
    }

    // =========================================
    // Scanning: Operators
    // =========================================

    /// Scan an operator or punctuation token.
    ///
    /// Uses tuple matching on (first_char, peek) to minimize repeated peek() calls.
    fn scan_operator(&mut self, start: (u32, u32, u32)) -> Token<'src> {
        let Some(c) = self.cursor.advance() else {
            return self.make_eof();
        };
        let next = self.cursor.peek();

        let kind = match (c, next) {
            ('(', _) => TokenKind::LParen,
            (')', _) => TokenKind::RParen,
            ('[', _) => TokenKind::LBracket,
            (']', _) => TokenKind::RBracket,
            ('{', _) => TokenKind::LBrace,
            ('}', _) => TokenKind::RBrace,
            (',', _) => TokenKind::Comma,
            (';', _) => TokenKind::Semicolon,
            ('~', _) => TokenKind::Tilde,

            ('.', Some('.')) if self.cursor.peek_nth(1) == Some('.') => {
                self.cursor.advance();
                self.cursor.advance();
                TokenKind::Ellipsis
            }
            ('.', _) => TokenKind::Dot,

            (':', Some('=')) => { self.cursor.advance(); TokenKind::Define }
            (':', _) => TokenKind::Colon,

            ('+', Some('+')) => { self.cursor.advance(); TokenKind::Inc }
            ('+', Some('=')) => { self.cursor.advance(); TokenKind::PlusAssign }
            ('+', _) => TokenKind::Plus,

            ('-', Some('-')) => { self.cursor.advance(); TokenKind::Dec }
            ('-', Some('=')) => { self.cursor.advance(); TokenKind::MinusAssign }
            ('-', _) => TokenKind::Minus,

            ('*', Some('=')) => { self.cursor.advance(); TokenKind::StarAssign }
            ('*', _) => TokenKind::Star,

            ('/', Some('=')) => { self.cursor.advance(); TokenKind::SlashAssign }
            ('/', _) => TokenKind::Slash,

            ('%', Some('=')) => { self.cursor.advance(); TokenKind::PercentAssign }
            ('%', _) => TokenKind::Percent,

            ('^', Some('=')) => { self.cursor.advance(); TokenKind::CaretAssign }
            ('^', _) => TokenKind::Caret,

            ('=', Some('=')) => { self.cursor.advance(); TokenKind::EqEq }
            ('=', _) => TokenKind::Assign,

            ('!', Some('=')) => { self.cursor.advance(); TokenKind::NotEq }
            ('!', _) => TokenKind::Not,

            ('&', Some('&')) => { self.cursor.advance(); TokenKind::AndAnd }
            ('&', Some('=')) => { self.cursor.advance(); TokenKind::AmpAssign }
            ('&', Some('^')) => {
                self.cursor.advance();
                if self.cursor.eat('=') { TokenKind::AndNotAssign } else { TokenKind::AndNot }
            }
            ('&', _) => TokenKind::Amp,

            ('|', Some('|')) => { self.cursor.advance(); TokenKind::OrOr }
            ('|', Some('=')) => { self.cursor.advance(); TokenKind::PipeAssign }
            ('|', _) => TokenKind::Pipe,

            ('<', Some('-')) => { self.cursor.advance(); TokenKind::Arrow }
            ('<', Some('=')) => { self.cursor.advance(); TokenKind::LtEq }
            ('<', Some('<')) => {
                self.cursor.advance();
                if self.cursor.eat('=') { TokenKind::ShlAssign } else { TokenKind::Shl }
            }
            ('<', _) => TokenKind::Lt,

            ('>', Some('=')) => { self.cursor.advance(); TokenKind::GtEq }
            ('>', Some('>')) => {
                self.cursor.advance();
                if self.cursor.eat('=') { TokenKind::ShrAssign } else { TokenKind::Shr }
            }
            ('>', _) => TokenKind::Gt,

            _ => {
                return self.make_error(
                    ParseErrorKind::UnexpectedChar,
                    start,
                    &format!("unexpected character {c:?}"),
                );
            }
        };

        self.make_token(kind, start)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::new(source, FileId(0)).tokenize();
        assert!(errors.is_empty(), "unexpected lexer errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lex_package_clause() {
        assert_eq!(
            kinds("package list\n"),
            vec![TokenKind::Package, TokenKind::Ident, TokenKind::Semicolon, TokenKind::Eof]
        );
    }

    #[test]
    fn semicolon_inserted_after_closing_brace_and_return() {
        let source = "func f() int {\n\treturn\n}\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Func,
                TokenKind::Ident,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Ident,
                TokenKind::LBrace,
                TokenKind::Return,
                TokenKind::Semicolon,
                TokenKind::RBrace,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn no_semicolon_after_operator_at_line_end() {
        let source = "x := a +\n\tb\n";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Ident,
                TokenKind::Define,
                TokenKind::Ident,
                TokenKind::Plus,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn line_comment_acts_as_newline() {
        let source = "x++ // bump\ny--";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Ident,
                TokenKind::Inc,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Dec,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn multi_line_block_comment_inserts_semicolon() {
        let source = "a /* one\ntwo */ b";
        assert_eq!(
            kinds(source),
            vec![
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn numbers_and_literals() {
        assert_eq!(
            kinds("0x1F 1_000 3.25 1e9 .5 2i 'a' \"s\\\"\" `raw\nline`"),
            vec![
                TokenKind::Int,
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Float,
                TokenKind::Imag,
                TokenKind::Char,
                TokenKind::String,
                TokenKind::RawString,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn compound_operators() {
        assert_eq!(
            kinds("a &^= b <<= c <- d ... e"),
            vec![
                TokenKind::Ident,
                TokenKind::AndNotAssign,
                TokenKind::Ident,
                TokenKind::ShlAssign,
                TokenKind::Ident,
                TokenKind::Arrow,
                TokenKind::Ident,
                TokenKind::Ellipsis,
                TokenKind::Ident,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn spans_are_line_and_column() {
        let (tokens, _) = Lexer::new("package p\n\nvar x int\n", FileId(3)).tokenize();
        let var = tokens.iter().find(|t| t.kind == TokenKind::Var).unwrap();
        assert_eq!(var.span, Span::new(FileId(3), 3, 1, 3));
    }

    #[test]
    fn comments_are_collected() {
        let mut lexer = Lexer::new("// doc\nvar x /* inline */ int\n", FileId(0));
        while lexer.next_token().kind != TokenKind::Eof {}
        let comments = lexer.take_comments();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].text, "// doc");
        assert_eq!(comments[1].text, "/* inline */");
        assert_eq!(comments[1].span.line, 2);
    }

    #[test]
    fn unterminated_string_is_error() {
        let (tokens, errors) = Lexer::new("x := \"oops\n", FileId(0)).tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnterminatedLiteral);
        assert!(tokens.iter().any(|t| t.kind == TokenKind::Error));
    }

    #[test]
    fn unexpected_character_is_error() {
        let (_, errors) = Lexer::new("a @ b", FileId(0)).tokenize();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ParseErrorKind::UnexpectedChar);
    }
}
