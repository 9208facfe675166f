use std::error::Error;
use std::fmt;

use super::chars::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position) -> Token {
        Token { kind, position }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A run of whitespace (normal mode only).
    Whitespace,
    /// A `;` line comment, content without the leading `;`.
    Comment(String),
    Identifier(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Nil,
    String(String),
    /// A literal run inside a text block.
    TextContent(String),
    /// A whitespace-only line inside a text block.
    EmptyLine,
    RoundOpen,
    RoundClose,
    SquareOpen,
    SquareClose,
    CurlyOpen,
    CurlyClose,
    /// `'`
    Quote,
    /// `` ` ``
    Backquote,
    /// `,`
    Comma,
    /// `,@`
    CommaAt,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::TokenKind::*;
        match self {
            Whitespace => write!(f, "whitespace"),
            Comment(text) => write!(f, ";{}", text),
            Identifier(name) => write!(f, "{}", name),
            Integer(n) => write!(f, "{}", n),
            Decimal(n) => write!(f, "{}", n),
            Boolean(true) => write!(f, "#t"),
            Boolean(false) => write!(f, "#f"),
            Nil => write!(f, "#nil"),
            String(s) => write!(f, "\"{}\"", s),
            TextContent(s) => write!(f, "{}", s),
            EmptyLine => write!(f, "empty line"),
            RoundOpen => write!(f, "("),
            RoundClose => write!(f, ")"),
            SquareOpen => write!(f, "["),
            SquareClose => write!(f, "]"),
            CurlyOpen => write!(f, "{{"),
            CurlyClose => write!(f, "}}"),
            Quote => write!(f, "'"),
            Backquote => write!(f, "`"),
            Comma => write!(f, ","),
            CommaAt => write!(f, ",@"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LexError {
    pub kind: LexErrorKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LexErrorKind {
    UnknownToken(String),
    UnknownKeyword(String),
    UnclosedString,
    UnclosedIdentifier,
    UnclosedText,
    IncompleteEscape,
    InvalidEscape(char),
    InvalidIdentifier(char),
    InvalidNumber(String),
}

impl LexError {
    pub fn new(kind: LexErrorKind, position: Position) -> LexError {
        LexError { kind, position }
    }

    /// True when the error means the source simply stopped too early, so an
    /// interactive front-end may ask for more input instead of failing.
    pub fn is_unfinished(&self) -> bool {
        use self::LexErrorKind::*;
        matches!(
            self.kind,
            UnclosedString | UnclosedIdentifier | UnclosedText | IncompleteEscape
        )
    }
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::LexErrorKind::*;
        match &self.kind {
            UnknownToken(text) => write!(f, "unknown token: {}", text),
            UnknownKeyword(word) => write!(f, "unknown keyword: #{}", word),
            UnclosedString => write!(f, "unclosed string"),
            UnclosedIdentifier => write!(f, "unclosed identifier"),
            UnclosedText => write!(f, "unclosed text"),
            IncompleteEscape => write!(f, "incomplete escape sequence"),
            InvalidEscape(ch) => write!(f, "invalid escape sequence: \\{}", ch),
            InvalidIdentifier(ch) => write!(f, "invalid character in identifier: {}", ch),
            InvalidNumber(text) => write!(f, "invalid number: {}", text),
        }?;
        write!(f, " at {}", self.position)
    }
}

impl Error for LexError {}
