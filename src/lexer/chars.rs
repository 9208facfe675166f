use std::fmt;

/// 1-based source location. A newline advances the line and resets the
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: u64,
    pub column: u64,
}

impl Position {
    pub fn new(line: u64, column: u64) -> Position {
        Position { line, column }
    }
}

impl Default for Position {
    fn default() -> Position {
        Position { line: 1, column: 1 }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Character cursor over the source text. `position` always refers to the
/// next unconsumed character.
pub struct CharStream {
    chars: Vec<char>,
    index: usize,
    position: Position,
}

impl CharStream {
    pub fn new(source: &str) -> CharStream {
        CharStream {
            chars: source.chars().collect(),
            index: 0,
            position: Position::default(),
        }
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn is_eof(&self) -> bool {
        self.index >= self.chars.len()
    }

    pub fn peek(&self) -> Option<char> {
        self.chars.get(self.index).copied()
    }

    pub fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.index + offset).copied()
    }

    pub fn next(&mut self) -> Option<char> {
        let ch = self.chars.get(self.index).copied()?;
        self.index += 1;
        if ch == '\n' {
            self.position.line += 1;
            self.position.column = 1;
        } else {
            self.position.column += 1;
        }
        Some(ch)
    }
}
