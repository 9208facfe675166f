use std::fmt;

use gc::{Finalize, Trace};

use crate::lexer::Position;

/// A self-delimiting literal.
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub kind: AtomKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AtomKind {
    Name(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    Str(String),
    Nil,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprList {
    pub items: Vec<Expression>,
    pub position: Position,
}

/// A `{...}` block: literal runs, blank-line markers, and embedded
/// expressions, in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Text {
    pub parts: Vec<TextPart>,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TextPart {
    Str(String),
    LineEnd,
    Expr(Expression),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Atom(Atom),
    Text(Text),
    /// `(...)` — constructs a list from its evaluated members.
    RoundList(ExprList),
    /// `[...]` — a call form.
    SquareList(ExprList),
    Quote(Box<Expression>, Position),
    Quasiquote(Box<Expression>, Position),
    Unquote(Box<Expression>, Position),
    UnquoteSplicing(Box<Expression>, Position),
}

impl Expression {
    pub fn position(&self) -> Position {
        match self {
            Expression::Atom(a) => a.position,
            Expression::Text(t) => t.position,
            Expression::RoundList(l) | Expression::SquareList(l) => l.position,
            Expression::Quote(_, p)
            | Expression::Quasiquote(_, p)
            | Expression::Unquote(_, p)
            | Expression::UnquoteSplicing(_, p) => *p,
        }
    }

    /// The head name of a `[...]` form, when there is one.
    pub fn name(&self) -> Option<&str> {
        match self {
            Expression::Atom(Atom {
                kind: AtomKind::Name(name),
                ..
            }) => Some(name),
            _ => None,
        }
    }
}

// The tree is plain owned data; nothing in it is GC-managed, but it must be
// embeddable in traced values (closures and macros keep their bodies).
impl Finalize for Expression {}
unsafe impl Trace for Expression {
    gc::unsafe_empty_trace!();
}

fn fmt_items(f: &mut fmt::Formatter, items: &[Expression]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Atom(atom) => match &atom.kind {
                AtomKind::Name(name) => write!(f, "{}", name),
                AtomKind::Integer(n) => write!(f, "{}", n),
                AtomKind::Decimal(n) => write!(f, "{}", n),
                AtomKind::Boolean(true) => write!(f, "#t"),
                AtomKind::Boolean(false) => write!(f, "#f"),
                AtomKind::Str(s) => write!(f, "\"{}\"", s),
                AtomKind::Nil => write!(f, "#nil"),
            },
            Expression::Text(text) => {
                write!(f, "{{")?;
                for part in &text.parts {
                    match part {
                        TextPart::Str(s) => write!(f, "{}", s)?,
                        TextPart::LineEnd => writeln!(f)?,
                        TextPart::Expr(e) => write!(f, "{}", e)?,
                    }
                }
                write!(f, "}}")
            }
            Expression::RoundList(list) => {
                write!(f, "(")?;
                fmt_items(f, &list.items)?;
                write!(f, ")")
            }
            Expression::SquareList(list) => {
                write!(f, "[")?;
                fmt_items(f, &list.items)?;
                write!(f, "]")
            }
            Expression::Quote(inner, _) => write!(f, "'{}", inner),
            Expression::Quasiquote(inner, _) => write!(f, "`{}", inner),
            Expression::Unquote(inner, _) => write!(f, ",{}", inner),
            Expression::UnquoteSplicing(inner, _) => write!(f, ",@{}", inner),
        }
    }
}
