use crate::error::{Error, ErrorCode, Location};
use crate::syntax::token::{Token, TokenKind, keyword_or_ident};

pub struct Lexer<'a> {
    source: &'a [u8],
    pos: usize,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source: source.as_bytes(), pos: 0, line: 1, column: 1 }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, Vec<Error>> {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();

        loop {
            self.skip_whitespace();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, "", self.line, self.column));
                break;
            }

            match self.next_token() {
                Ok(Some(tok)) => tokens.push(tok),
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }

        tracing::debug!(tokens = tokens.len(), errors = errors.len(), "lexed source");
        if errors.is_empty() { Ok(tokens) } else { Err(errors) }
    }

    fn next_token(&mut self) -> Result<Option<Token>, Error> {
        let start = self.pos;
        let line = self.line;
        let col = self.column;
        let ch = self.advance();

        let kind = match ch {
            b'+' => TokenKind::Plus,
            b'-' => TokenKind::Minus,
            b'*' => TokenKind::Star,
            b',' => TokenKind::Comma,
            b';' => TokenKind::Semicolon,
            b'.' => TokenKind::Dot,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,

            b'/' => {
                if self.peek() == b'/' { self.skip_line(); return Ok(None); }
                else if self.peek() == b'*' { self.skip_block_comment(line, col)?; return Ok(None); }
                else { TokenKind::Slash }
            }
            b'=' => {
                if self.peek() == b'=' { self.advance(); TokenKind::EqEq }
                else { TokenKind::Eq }
            }
            b'!' => {
                if self.peek() == b'=' { self.advance(); TokenKind::BangEq }
                else { TokenKind::Bang }
            }
            b'<' => {
                if self.peek() == b'=' { self.advance(); TokenKind::LtEq }
                else { TokenKind::Lt }
            }
            b'>' => {
                if self.peek() == b'=' { self.advance(); TokenKind::GtEq }
                else { TokenKind::Gt }
            }

            b'"' => TokenKind::Str(self.read_string(line, col)?),
            b'0'..=b'9' => TokenKind::Number(self.read_number(ch)),
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => keyword_or_ident(self.read_ident(ch)),

            other => {
                // swallow the rest of a multi-byte character so it is reported once
                while !self.is_at_end() && (0x80..0xC0).contains(&self.peek()) {
                    self.advance();
                }
                let text = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
                let shown = if other.is_ascii() { (other as char).to_string() } else { text.clone() };
                return Err(Error::new(ErrorCode::L001, line, col,
                    format!("unexpected character `{shown}`"))
                    .at(Location::At(text)));
            }
        };

        let lexeme = String::from_utf8_lossy(&self.source[start..self.pos]).into_owned();
        Ok(Some(Token::new(kind, lexeme, line, col)))
    }

    // ─── Primitives ──────────────────────────────────────────────────────────

    fn advance(&mut self) -> u8 {
        let ch = self.source[self.pos];
        self.pos += 1;
        if ch == b'\n' { self.line += 1; self.column = 1; }
        else { self.column += 1; }
        ch
    }

    fn peek(&self) -> u8 {
        if self.is_at_end() { 0 } else { self.source[self.pos] }
    }

    fn peek_next(&self) -> u8 {
        if self.pos + 1 >= self.source.len() { 0 } else { self.source[self.pos + 1] }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn skip_whitespace(&mut self) {
        while !self.is_at_end() {
            match self.peek() {
                b' ' | b'\t' | b'\r' | b'\n' => { self.advance(); }
                _ => break,
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != b'\n' { self.advance(); }
    }

    fn skip_block_comment(&mut self, start_line: usize, start_col: usize) -> Result<(), Error> {
        self.advance(); // consume *
        while !self.is_at_end() {
            if self.peek() == b'*' && self.peek_next() == b'/' {
                self.advance(); // *
                self.advance(); // /
                return Ok(());
            }
            self.advance();
        }
        Err(Error::new(ErrorCode::L004, start_line, start_col, "unterminated block comment").at(Location::End))
    }

    // ─── Readers ─────────────────────────────────────────────────────────────

    fn read_string(&mut self, start_line: usize, start_col: usize) -> Result<String, Error> {
        let mut bytes = Vec::new();
        let mut error: Option<Error> = None;
        loop {
            if self.is_at_end() || self.peek() == b'\n' {
                return Err(Error::new(ErrorCode::L002, start_line, start_col,
                    "unterminated string literal").at(Location::End));
            }
            let ch = self.advance();
            if ch == b'"' { break; }
            if ch == b'\\' {
                let esc_line = self.line;
                let esc_col  = self.column;
                if self.is_at_end() { continue; }
                match self.advance() {
                    b'n'  => bytes.push(b'\n'),
                    b't'  => bytes.push(b'\t'),
                    b'"'  => bytes.push(b'"'),
                    b'\\' => bytes.push(b'\\'),
                    other => {
                        // keep the first bad escape but finish the literal so the
                        // remainder of the string does not cascade into more errors
                        if error.is_none() {
                            error = Some(Error::new(ErrorCode::L003, esc_line, esc_col,
                                format!("unknown escape sequence `\\{}`", other as char)));
                        }
                    }
                }
            } else {
                bytes.push(ch);
            }
        }
        if let Some(e) = error { return Err(e); }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn read_number(&mut self, first: u8) -> f64 {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && self.peek().is_ascii_digit() {
            s.push(self.advance() as char);
        }
        // a trailing `.` without digits is left for the parser
        if !self.is_at_end() && self.peek() == b'.' && self.peek_next().is_ascii_digit() {
            s.push(self.advance() as char);
            while !self.is_at_end() && self.peek().is_ascii_digit() {
                s.push(self.advance() as char);
            }
        }
        s.parse().unwrap_or(0.0)
    }

    fn read_ident(&mut self, first: u8) -> String {
        let mut s = String::new();
        s.push(first as char);
        while !self.is_at_end() && (self.peek().is_ascii_alphanumeric() || self.peek() == b'_') {
            s.push(self.advance() as char);
        }
        s
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
