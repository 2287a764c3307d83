// ── Token ─────────────────────────────────────────────────────────────────

/// A whitespace-delimited word together with its 1-based source line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token<'s> {
    pub text: &'s str,
    pub line: usize,
}

// ── Lexer ─────────────────────────────────────────────────────────────────

/// Splits model text into whitespace-delimited tokens.
///
/// Line structure is not significant to the loader; lines are only tracked so
/// errors can point at the source.
pub struct Lexer<'s> {
    src: &'s str,
    pos: usize,
    line: usize,
}

impl<'s> Lexer<'s> {
    pub fn new(src: &'s str) -> Self {
        Self { src, pos: 0, line: 1 }
    }

    /// Current 1-based line (the line of the last token, or of end of input).
    pub fn line(&self) -> usize {
        self.line
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.src[self.pos..].chars().next()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
        }
        Some(ch)
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = Token<'s>;

    fn next(&mut self) -> Option<Token<'s>> {
        self.skip_whitespace();
        let start = self.pos;
        let line = self.line;
        while self.peek().is_some_and(|c| !c.is_whitespace()) {
            self.advance();
        }
        if self.pos == start {
            return None;
        }
        Some(Token { text: &self.src[start..self.pos], line })
    }
}
