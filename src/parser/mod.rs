//! Recursive-descent parser.
//!
//! Parsing is interleaved with the environment: a `[define-macro ...]` form
//! is evaluated as soon as it is read (and kept in the output), and a call
//! form whose head is bound to a macro is eagerly expanded in place. The
//! parser therefore borrows the same environment the evaluator runs in.

pub mod ast;

pub use self::ast::{Atom, AtomKind, ExprList, Expression, Text, TextPart};

use std::error::Error;
use std::fmt;

use log::debug;

use crate::interpreter::{self, EvalError, SpecialForm};
use crate::lexer::{LexError, Position, Scanner, Token, TokenKind};
use crate::runtime::macros;
use crate::runtime::{Environment, GcShared};


#[derive(Debug)]
pub enum ParseError {
    Lex(LexError),
    /// Input stopped in the middle of a form.
    Incomplete { position: Position },
    /// A `(`/`[` was never closed; names the missing closer.
    UnclosedList {
        expected: &'static str,
        position: Position,
    },
    IllegalKeyword { position: Position },
    IllegalSyntax {
        message: String,
        position: Position,
    },
    /// Parse-time macro work failed.
    Eval(EvalError),
    Internal {
        message: &'static str,
        position: Position,
    },
}

impl ParseError {
    /// True when the only problem is that the source ended too early; an
    /// interactive front-end should collect another line and retry.
    pub fn is_unfinished(&self) -> bool {
        match self {
            ParseError::Lex(e) => e.is_unfinished(),
            ParseError::Incomplete { .. } | ParseError::UnclosedList { .. } => true,
            _ => false,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::Lex(e) => write!(f, "{}", e),
            ParseError::Incomplete { position } => {
                write!(f, "incomplete input at {}", position)
            }
            ParseError::UnclosedList { expected, position } => {
                write!(f, "unclosed list, expected: {} at {}", expected, position)
            }
            ParseError::IllegalKeyword { position } => {
                write!(f, "illegal keyword at {}", position)
            }
            ParseError::IllegalSyntax { message, position } => {
                write!(f, "{} at {}", message, position)
            }
            ParseError::Eval(e) => write!(f, "{}", e),
            ParseError::Internal { message, position } => {
                write!(f, "internal error: {} at {}", message, position)
            }
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ParseError::Lex(e) => Some(e),
            ParseError::Eval(e) => Some(e),
            _ => None,
        }
    }
}

impl From<LexError> for ParseError {
    fn from(e: LexError) -> ParseError {
        ParseError::Lex(e)
    }
}

impl From<EvalError> for ParseError {
    fn from(e: EvalError) -> ParseError {
        ParseError::Eval(e)
    }
}

/// Parse a whole source string into top-level expressions, pre-expanding
/// macros against `env`.
pub fn parse(source: &str, env: &GcShared<Environment>) -> Result<Vec<Expression>, ParseError> {
    let mut parser = Parser::new(source, env);
    let mut expressions = Vec::new();
    while let Some(token) = parser.advance()? {
        expressions.push(parser.parse_expression(token)?);
    }
    Ok(expressions)
}

struct Parser<'a> {
    scanner: Scanner,
    peeked: Option<Token>,
    env: &'a GcShared<Environment>,
}

impl<'a> Parser<'a> {
    fn new(source: &str, env: &'a GcShared<Environment>) -> Parser<'a> {
        Parser {
            scanner: Scanner::new(source),
            peeked: None,
            env,
        }
    }

    fn advance(&mut self) -> Result<Option<Token>, ParseError> {
        if let Some(token) = self.peeked.take() {
            return Ok(Some(token));
        }
        Ok(self.scanner.get()?)
    }

    fn unget(&mut self, token: Token) {
        debug_assert!(self.peeked.is_none());
        self.peeked = Some(token);
    }

    fn require(&mut self, position: Position) -> Result<Token, ParseError> {
        self.advance()?
            .ok_or(ParseError::Incomplete { position })
    }

    fn parse_expression(&mut self, token: Token) -> Result<Expression, ParseError> {
        let position = token.position;
        match token.kind {
            TokenKind::Identifier(name) => Ok(Expression::Atom(Atom {
                kind: AtomKind::Name(name),
                position,
            })),
            TokenKind::Integer(n) => Ok(Expression::Atom(Atom {
                kind: AtomKind::Integer(n),
                position,
            })),
            TokenKind::Decimal(n) => Ok(Expression::Atom(Atom {
                kind: AtomKind::Decimal(n),
                position,
            })),
            TokenKind::Boolean(b) => Ok(Expression::Atom(Atom {
                kind: AtomKind::Boolean(b),
                position,
            })),
            TokenKind::String(s) => Ok(Expression::Atom(Atom {
                kind: AtomKind::Str(s),
                position,
            })),
            TokenKind::Nil => Ok(Expression::Atom(Atom {
                kind: AtomKind::Nil,
                position,
            })),
            TokenKind::RoundOpen => self.parse_round(position),
            TokenKind::SquareOpen => self.parse_square(position),
            TokenKind::CurlyOpen => self.parse_text(position),
            TokenKind::Quote => self.parse_quoted_symbol(position),
            TokenKind::Backquote => {
                let inner = self.parse_sub_expression(position)?;
                Ok(Expression::Quasiquote(Box::new(inner), position))
            }
            TokenKind::Comma => {
                let inner = self.parse_sub_expression(position)?;
                Ok(Expression::Unquote(Box::new(inner), position))
            }
            TokenKind::CommaAt => {
                let inner = self.parse_sub_expression(position)?;
                Ok(Expression::UnquoteSplicing(Box::new(inner), position))
            }
            kind @ (TokenKind::RoundClose
            | TokenKind::SquareClose
            | TokenKind::CurlyClose) => Err(ParseError::IllegalSyntax {
                message: format!("unexpected {}", kind),
                position,
            }),
            TokenKind::TextContent(_) | TokenKind::EmptyLine => Err(ParseError::Internal {
                message: "text token outside a text block",
                position,
            }),
            TokenKind::Whitespace | TokenKind::Comment(_) => Err(ParseError::Internal {
                message: "insignificant token escaped the scanner",
                position,
            }),
        }
    }

    fn parse_sub_expression(&mut self, position: Position) -> Result<Expression, ParseError> {
        let token = self.require(position)?;
        self.parse_expression(token)
    }

    fn parse_round(&mut self, position: Position) -> Result<Expression, ParseError> {
        let mut items = Vec::new();
        loop {
            let token = match self.advance()? {
                None => {
                    return Err(ParseError::UnclosedList {
                        expected: ")",
                        position,
                    })
                }
                Some(t) => t,
            };
            if token.kind == TokenKind::RoundClose {
                break;
            }
            items.push(self.parse_expression(token)?);
        }
        Ok(Expression::RoundList(ExprList { items, position }))
    }

    fn parse_square(&mut self, position: Position) -> Result<Expression, ParseError> {
        let mut items = Vec::new();
        loop {
            let token = match self.advance()? {
                None => {
                    return Err(ParseError::UnclosedList {
                        expected: "]",
                        position,
                    })
                }
                Some(t) => t,
            };
            if token.kind == TokenKind::SquareClose {
                break;
            }
            items.push(self.parse_expression(token)?);
        }
        self.preexpand(Expression::SquareList(ExprList { items, position }))
    }

    /// Parse-time macro interleaving: `define-macro` forms take effect
    /// immediately, and known macro calls are expanded eagerly, recursion
    /// included.
    fn preexpand(&mut self, expr: Expression) -> Result<Expression, ParseError> {
        let head = match &expr {
            Expression::SquareList(list) => {
                match list.items.first().and_then(Expression::name) {
                    Some(name) => name.to_string(),
                    None => return Ok(expr),
                }
            }
            _ => return Ok(expr),
        };
        if SpecialForm::from_name(&head) == Some(SpecialForm::DefineMacro) {
            interpreter::eval(&expr, self.env)?;
            return Ok(expr);
        }
        let mac = self.env.borrow().get_macro(&head);
        if let Some(mac) = mac {
            let args = match &expr {
                Expression::SquareList(list) => list.items[1..].to_vec(),
                _ => unreachable!(),
            };
            let expanded = macros::expand(&mac, &args, self.env)?;
            debug!("pre-expanded macro {} into {}", head, expanded);
            return Ok(expanded);
        }
        Ok(expr)
    }

    fn parse_quoted_symbol(&mut self, position: Position) -> Result<Expression, ParseError> {
        let token = self.require(position)?;
        match token {
            Token {
                kind: TokenKind::Identifier(name),
                position: p,
            } if p.line == position.line && p.column == position.column + 1 => {
                Ok(Expression::Quote(
                    Box::new(Expression::Atom(Atom {
                        kind: AtomKind::Name(name),
                        position: p,
                    })),
                    position,
                ))
            }
            _ => Err(ParseError::IllegalKeyword { position }),
        }
    }

    fn parse_text(&mut self, position: Position) -> Result<Expression, ParseError> {
        let mut parts = Vec::new();
        let mut has_content = false;
        loop {
            let token = self.require(position)?;
            match token.kind {
                TokenKind::CurlyClose => break,
                TokenKind::TextContent(first) => {
                    let mut pieces = vec![first];
                    loop {
                        match self.advance()? {
                            Some(Token {
                                kind: TokenKind::TextContent(s),
                                ..
                            }) => pieces.push(s),
                            Some(other) => {
                                self.unget(other);
                                break;
                            }
                            None => return Err(ParseError::Incomplete { position }),
                        }
                    }
                    parts.push(TextPart::Str(merge_text(pieces)));
                    has_content = true;
                }
                TokenKind::EmptyLine => {
                    // A run of blank lines is one line break, dropped when
                    // nothing precedes it or the block ends right after.
                    let next = loop {
                        match self.advance()? {
                            Some(Token {
                                kind: TokenKind::EmptyLine,
                                ..
                            }) => continue,
                            Some(other) => break other,
                            None => return Err(ParseError::Incomplete { position }),
                        }
                    };
                    if next.kind == TokenKind::CurlyClose {
                        break;
                    }
                    if has_content {
                        parts.push(TextPart::LineEnd);
                    }
                    self.unget(next);
                }
                TokenKind::SquareOpen => {
                    let expr = self.parse_square(token.position)?;
                    parts.push(TextPart::Expr(expr));
                    has_content = true;
                }
                TokenKind::CurlyOpen => {
                    return Err(ParseError::IllegalSyntax {
                        message: "nested text block".to_string(),
                        position: token.position,
                    })
                }
                _ => {
                    return Err(ParseError::Internal {
                        message: "unexpected token in text block",
                        position: token.position,
                    })
                }
            }
        }
        Ok(Expression::Text(Text { parts, position }))
    }
}

/// Join consecutive literal runs. A lone run keeps its spacing; at a seam
/// the left side loses trailing and the right side leading whitespace.
fn merge_text(pieces: Vec<String>) -> String {
    let last = pieces.len() - 1;
    if last == 0 {
        return pieces.into_iter().next().unwrap_or_default();
    }
    let mut merged = String::new();
    for (i, piece) in pieces.iter().enumerate() {
        let trimmed = if i == 0 {
            piece.trim_end()
        } else if i == last {
            piece.trim_start()
        } else {
            piece.trim()
        };
        merged.push_str(trimmed);
    }
    merged
}
