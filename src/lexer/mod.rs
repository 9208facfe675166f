//! Mode-switching scanner for docscript source.
//!
//! The scanner runs in one of two modes. *Normal* mode tokenizes the Lisp
//! surface (brackets, sigils, numbers, strings, identifiers). *Text* mode,
//! entered at `{`, produces literal runs, empty-line markers and the
//! brackets that switch back. `[` pushes normal mode, `]` pops, `}` closes
//! a text block. The mode stack never becomes empty.

mod chars;
mod token;

pub use self::chars::{CharStream, Position};
pub use self::token::{LexError, LexErrorKind, Token, TokenKind};

#[cfg(test)]
#[path = "scanner_test.rs"]
mod scanner_test;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    Text,
}

/// Characters that end a normal-mode token.
fn is_delimiter(ch: char) -> bool {
    ch.is_whitespace() || matches!(ch, '(' | ')' | '[' | ']' | '{' | '}')
}

/// Characters that may never appear inside an identifier.
fn is_forbidden(ch: char) -> bool {
    matches!(ch, '#' | '|' | '`' | '\'' | ',' | '"')
}

pub struct Scanner {
    stream: CharStream,
    modes: Vec<Mode>,
}

impl Scanner {
    pub fn new(source: &str) -> Scanner {
        Scanner {
            stream: CharStream::new(source),
            modes: vec![Mode::Normal],
        }
    }

    pub fn done(&self) -> bool {
        self.stream.is_eof()
    }

    /// Next raw token, whitespace and comments included. `None` at end of
    /// input.
    pub fn scan(&mut self) -> Result<Option<Token>, LexError> {
        if self.stream.is_eof() {
            return Ok(None);
        }
        match self.mode() {
            Mode::Normal => self.scan_normal().map(Some),
            Mode::Text => self.scan_text(),
        }
    }

    /// Next significant token, skipping whitespace and comments.
    pub fn get(&mut self) -> Result<Option<Token>, LexError> {
        loop {
            match self.scan()? {
                Some(token) => match token.kind {
                    TokenKind::Whitespace | TokenKind::Comment(_) => continue,
                    _ => return Ok(Some(token)),
                },
                None => return Ok(None),
            }
        }
    }

    fn mode(&self) -> Mode {
        *self.modes.last().unwrap_or(&Mode::Normal)
    }

    fn enter_mode(&mut self, mode: Mode) {
        self.modes.push(mode);
    }

    fn exit_mode(&mut self) {
        if self.modes.len() > 1 {
            self.modes.pop();
        }
    }

    fn scan_normal(&mut self) -> Result<Token, LexError> {
        let position = self.stream.position();
        let ch = match self.stream.peek() {
            Some(ch) => ch,
            None => {
                return Err(LexError::new(
                    LexErrorKind::UnknownToken(String::new()),
                    position,
                ))
            }
        };
        let token = |kind| Ok(Token::new(kind, position));
        match ch {
            c if c.is_whitespace() => {
                while matches!(self.stream.peek(), Some(c) if c.is_whitespace()) {
                    self.stream.next();
                }
                token(TokenKind::Whitespace)
            }
            ';' => {
                self.stream.next();
                let mut content = String::new();
                while let Some(c) = self.stream.peek() {
                    if c == '\n' {
                        break;
                    }
                    content.push(c);
                    self.stream.next();
                }
                token(TokenKind::Comment(content))
            }
            '(' => {
                self.stream.next();
                token(TokenKind::RoundOpen)
            }
            ')' => {
                self.stream.next();
                token(TokenKind::RoundClose)
            }
            '[' => {
                self.stream.next();
                self.enter_mode(Mode::Normal);
                token(TokenKind::SquareOpen)
            }
            ']' => {
                self.stream.next();
                self.exit_mode();
                token(TokenKind::SquareClose)
            }
            '{' => {
                self.stream.next();
                self.enter_mode(Mode::Text);
                token(TokenKind::CurlyOpen)
            }
            '}' => {
                self.stream.next();
                self.exit_mode();
                token(TokenKind::CurlyClose)
            }
            '\'' => {
                self.stream.next();
                token(TokenKind::Quote)
            }
            '`' => {
                self.stream.next();
                token(TokenKind::Backquote)
            }
            ',' => {
                self.stream.next();
                if self.stream.peek() == Some('@') {
                    self.stream.next();
                    token(TokenKind::CommaAt)
                } else {
                    token(TokenKind::Comma)
                }
            }
            '"' => self.scan_string(position),
            '|' => self.scan_quoted_identifier(position),
            '#' => self.scan_hash_keyword(position),
            '+' | '-' => self.scan_sign(position),
            c if c.is_ascii_digit() => self.scan_number(String::new(), position),
            _ => self.scan_identifier(String::new(), position),
        }
    }

    /// `+`/`-` opens a number when a digit follows, otherwise an identifier.
    fn scan_sign(&mut self, position: Position) -> Result<Token, LexError> {
        let mut content = String::new();
        content.push(self.stream.next().unwrap_or('+'));
        match self.stream.peek() {
            Some(c) if c.is_ascii_digit() => self.scan_number(content, position),
            Some(c) if is_delimiter(c) => Ok(Token::new(TokenKind::Identifier(content), position)),
            None => Ok(Token::new(TokenKind::Identifier(content), position)),
            Some(_) => self.scan_identifier(content, position),
        }
    }

    fn scan_number(&mut self, mut content: String, position: Position) -> Result<Token, LexError> {
        while matches!(self.stream.peek(), Some(c) if c.is_ascii_digit()) {
            content.push(self.stream.next().unwrap_or('0'));
        }
        match self.stream.peek() {
            // A decimal point only counts when a digit follows, `1.` falls
            // back to an identifier.
            Some('.') if matches!(self.stream.peek_at(1), Some(c) if c.is_ascii_digit()) => {
                content.push(self.stream.next().unwrap_or('.'));
                while matches!(self.stream.peek(), Some(c) if c.is_ascii_digit()) {
                    content.push(self.stream.next().unwrap_or('0'));
                }
                match self.stream.peek() {
                    Some(c) if !is_delimiter(c) => self.scan_identifier(content, position),
                    _ => {
                        let value = content.parse::<f64>().map_err(|_| {
                            LexError::new(LexErrorKind::InvalidNumber(content.clone()), position)
                        })?;
                        Ok(Token::new(TokenKind::Decimal(value), position))
                    }
                }
            }
            Some(c) if !is_delimiter(c) => self.scan_identifier(content, position),
            _ => {
                let value = content.parse::<i64>().map_err(|_| {
                    LexError::new(LexErrorKind::InvalidNumber(content.clone()), position)
                })?;
                Ok(Token::new(TokenKind::Integer(value), position))
            }
        }
    }

    fn scan_identifier(
        &mut self,
        mut content: String,
        position: Position,
    ) -> Result<Token, LexError> {
        loop {
            match self.stream.peek() {
                None => break,
                Some(c) if is_delimiter(c) => break,
                Some(c) if is_forbidden(c) => {
                    return Err(LexError::new(
                        LexErrorKind::InvalidIdentifier(c),
                        self.stream.position(),
                    ));
                }
                Some(c) => {
                    content.push(c);
                    self.stream.next();
                }
            }
        }
        Ok(Token::new(TokenKind::Identifier(content), position))
    }

    /// `#` keywords resolve to literal tokens right here.
    fn scan_hash_keyword(&mut self, position: Position) -> Result<Token, LexError> {
        self.stream.next();
        let mut word = String::new();
        loop {
            match self.stream.peek() {
                None => break,
                Some(c) if is_delimiter(c) || is_forbidden(c) => break,
                Some(c) => {
                    word.push(c);
                    self.stream.next();
                }
            }
        }
        let kind = match word.as_str() {
            "t" | "true" => TokenKind::Boolean(true),
            "f" | "false" => TokenKind::Boolean(false),
            "nil" => TokenKind::Nil,
            "inf" | "+inf" => TokenKind::Decimal(f64::INFINITY),
            "-inf" => TokenKind::Decimal(f64::NEG_INFINITY),
            "nan" | "+nan" => TokenKind::Decimal(f64::NAN),
            "-nan" => TokenKind::Decimal(-f64::NAN),
            _ => return Err(LexError::new(LexErrorKind::UnknownKeyword(word), position)),
        };
        Ok(Token::new(kind, position))
    }

    fn scan_string(&mut self, position: Position) -> Result<Token, LexError> {
        self.stream.next();
        let mut content = String::new();
        loop {
            match self.stream.peek() {
                None => return Err(LexError::new(LexErrorKind::UnclosedString, position)),
                Some('"') => {
                    self.stream.next();
                    return Ok(Token::new(TokenKind::String(content), position));
                }
                Some('\\') => content.push(self.escape_sequence()?),
                Some(c) => {
                    content.push(c);
                    self.stream.next();
                }
            }
        }
    }

    fn scan_quoted_identifier(&mut self, position: Position) -> Result<Token, LexError> {
        self.stream.next();
        let mut content = String::new();
        loop {
            match self.stream.peek() {
                None => return Err(LexError::new(LexErrorKind::UnclosedIdentifier, position)),
                Some('|') => {
                    self.stream.next();
                    return Ok(Token::new(TokenKind::Identifier(content), position));
                }
                Some('\\') => content.push(self.escape_sequence()?),
                Some(c) => {
                    content.push(c);
                    self.stream.next();
                }
            }
        }
    }

    fn escape_sequence(&mut self) -> Result<char, LexError> {
        let position = self.stream.position();
        self.stream.next();
        match self.stream.next() {
            None => Err(LexError::new(LexErrorKind::IncompleteEscape, position)),
            Some(c) => match c {
                'a' => Ok('\x07'),
                'b' => Ok('\x08'),
                'f' => Ok('\x0c'),
                'n' => Ok('\n'),
                'r' => Ok('\r'),
                't' => Ok('\t'),
                'v' => Ok('\x0b'),
                '\'' | '\\' | '"' | '?' | '|' => Ok(c),
                other => Err(LexError::new(LexErrorKind::InvalidEscape(other), position)),
            },
        }
    }

    fn scan_text(&mut self) -> Result<Option<Token>, LexError> {
        let position = self.stream.position();
        let ch = match self.stream.peek() {
            Some(ch) => ch,
            None => return Ok(None),
        };
        match ch {
            '{' => {
                self.stream.next();
                self.enter_mode(Mode::Text);
                Ok(Some(Token::new(TokenKind::CurlyOpen, position)))
            }
            '}' => {
                self.stream.next();
                self.exit_mode();
                Ok(Some(Token::new(TokenKind::CurlyClose, position)))
            }
            '[' => {
                self.stream.next();
                self.enter_mode(Mode::Normal);
                Ok(Some(Token::new(TokenKind::SquareOpen, position)))
            }
            // A newline that does not start its line was already consumed as
            // the end of a literal run; absorb it.
            '\n' if position.column != 1 => {
                self.stream.next();
                self.scan()
            }
            c if c.is_whitespace() => self.scan_text_emptyline(position),
            _ => self
                .scan_text_content(String::new(), position)
                .map(Some),
        }
    }

    /// Leading whitespace in text mode: a whole blank line becomes one
    /// `EmptyLine` token, whitespace before a bracket is dropped, anything
    /// else turns into the prefix of a literal run.
    fn scan_text_emptyline(&mut self, position: Position) -> Result<Option<Token>, LexError> {
        let mut content = String::new();
        loop {
            match self.stream.peek() {
                None => return Err(LexError::new(LexErrorKind::UnclosedText, position)),
                Some('\n') => {
                    self.stream.next();
                    return Ok(Some(Token::new(TokenKind::EmptyLine, position)));
                }
                Some('{') | Some('}') | Some('[') => return self.scan(),
                Some(c) if c.is_whitespace() => {
                    content.push(c);
                    self.stream.next();
                }
                Some(_) => return self.scan_text_content(content, position).map(Some),
            }
        }
    }

    fn scan_text_content(
        &mut self,
        mut content: String,
        position: Position,
    ) -> Result<Token, LexError> {
        loop {
            match self.stream.peek() {
                None => return Err(LexError::new(LexErrorKind::UnclosedText, position)),
                Some('\n') => {
                    self.stream.next();
                    return Ok(Token::new(TokenKind::TextContent(content), position));
                }
                Some('{') | Some('}') | Some('[') => {
                    return Ok(Token::new(TokenKind::TextContent(content), position));
                }
                Some('\\') => {
                    self.stream.next();
                    match self.stream.peek() {
                        Some(c @ ('{' | '}' | '[' | ']')) => {
                            content.push(c);
                            self.stream.next();
                        }
                        _ => content.push('\\'),
                    }
                }
                Some(c) => {
                    content.push(c);
                    self.stream.next();
                }
            }
        }
    }
}

/// Full raw token stream, for diagnostics and tests.
pub fn tokenize(source: &str) -> Result<Vec<Token>, LexError> {
    let mut scanner = Scanner::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = scanner.scan()? {
        tokens.push(token);
    }
    Ok(tokens)
}
