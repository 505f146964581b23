//! Character-level access to Go source text.

/// Where the cursor stands: byte offset, 1-based line and 1-based byte column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    offset: u32,
    line: u32,
    column: u32,
}

/// Reads source text one `char` at a time.
///
/// Columns count bytes, matching how Go tools report positions.
pub struct Cursor<'src> {
    source: &'src str,
    pos: Position,
}

impl<'src> Cursor<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: Position {
                offset: 0,
                line: 1,
                column: 1,
            },
        }
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.pos.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.pos.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.pos.column
    }

    /// Unread text.
    #[inline]
    fn remaining(&self) -> &'src str {
        &self.source[self.pos.offset as usize..]
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos.offset as usize >= self.source.len()
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    /// Character `n` positions ahead; `peek_nth(0)` is `peek()`.
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    #[inline]
    pub fn check(&self, pred: impl Fn(char) -> bool) -> bool {
        matches!(self.peek(), Some(c) if pred(c))
    }

    /// Step over one character, moving to the next line after `\n`.
    pub fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        let width = c.len_utf8() as u32;
        self.pos.offset += width;
        match c {
            '\n' => {
                self.pos.line += 1;
                self.pos.column = 1;
            }
            _ => self.pos.column += width,
        }
        Some(c)
    }

    /// Step over `expected` if it is next.
    #[inline]
    pub fn eat(&mut self, expected: char) -> bool {
        let hit = self.peek() == Some(expected);
        if hit {
            self.advance();
        }
        hit
    }

    /// Step over the longest run matching `pred` and return it.
    pub fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos.offset;
        while self.check(&pred) {
            self.advance();
        }
        self.slice_from(start)
    }

    /// Text between byte offset `start` and the cursor.
    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.pos.offset as usize]
    }
}

/// Go identifiers start with a Unicode letter or `_`.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_alphabetic()
}

/// Letters, digits and `_`.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_basics() {
        let mut cursor = Cursor::new("hello");
        assert_eq!(cursor.peek(), Some('h'));
        assert_eq!(cursor.offset(), 0);

        assert_eq!(cursor.advance(), Some('h'));
        assert_eq!(cursor.peek(), Some('e'));
        assert_eq!(cursor.offset(), 1);
    }

    #[test]
    fn cursor_eat_while() {
        let mut cursor = Cursor::new("aaabbb");
        assert_eq!(cursor.eat_while(|c| c == 'a'), "aaa");
        assert_eq!(cursor.eat_while(|c| c == 'b'), "bbb");
        assert!(cursor.is_eof());
    }

    #[test]
    fn cursor_utf8_columns_count_bytes() {
        let mut cursor = Cursor::new("héllo");
        cursor.advance();
        cursor.advance();
        assert_eq!(cursor.offset(), 3);
        assert_eq!(cursor.column(), 4);
    }

    #[test]
    fn cursor_line_and_column() {
        let mut cursor = Cursor::new("ab\ncd");
        cursor.advance();
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (1, 3));
        cursor.advance();
        assert_eq!((cursor.line(), cursor.column()), (2, 1));
    }

    #[test]
    fn ident_classes() {
        assert!(is_ident_start('a'));
        assert!(is_ident_start('_'));
        assert!(!is_ident_start('0'));
        assert!(is_ident_continue('0'));
        assert!(!is_ident_continue('-'));
    }
}
