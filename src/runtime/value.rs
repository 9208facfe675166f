//! Runtime values.
//!
//! Values have deep-copy semantics: cloning a list clones its elements.
//! Procedures are the exception, they share their captured scope through a
//! GC handle.

use std::fmt;

use gc::{Finalize, Trace};

use crate::interpreter::EvalError;
use crate::parser::ast::Expression;

use super::environment::{Environment, GcShared};

/// Symbol a text block inserts for each blank line.
pub const LINE_END_SYMBOL: &str = "LineEnd";

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Integer(i64),
    Decimal(f64),
}

impl Number {
    pub fn as_decimal(self) -> f64 {
        match self {
            Number::Integer(n) => n as f64,
            Number::Decimal(n) => n,
        }
    }

    pub fn is_decimal(self) -> bool {
        matches!(self, Number::Decimal(_))
    }
}

impl Finalize for Number {}
unsafe impl Trace for Number {
    gc::unsafe_empty_trace!();
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Number::Integer(n) => write!(f, "{}", n),
            Number::Decimal(n) => {
                if n.is_nan() {
                    if n.is_sign_negative() {
                        write!(f, "-nan")
                    } else {
                        write!(f, "+nan")
                    }
                } else if n == f64::INFINITY {
                    write!(f, "+inf")
                } else if n == f64::NEG_INFINITY {
                    write!(f, "-inf")
                } else {
                    write!(f, "{}", n)
                }
            }
        }
    }
}

pub type NativeFn = fn(&[Value], &GcShared<Environment>) -> Result<Value, EvalError>;

#[derive(Clone)]
pub struct Builtin {
    pub name: &'static str,
    pub fun: NativeFn,
}

#[derive(Clone)]
pub struct Lambda {
    pub params: Vec<String>,
    pub body: Box<Expression>,
    /// The defining scope; applications derive from here, not the call
    /// site.
    pub scope: GcShared<Environment>,
}

#[derive(Clone)]
pub enum Procedure {
    Builtin(Builtin),
    Lambda(Lambda),
}

impl Finalize for Procedure {}
unsafe impl Trace for Procedure {
    gc::custom_trace!(this, {
        if let Procedure::Lambda(lambda) = this {
            mark(&lambda.scope);
        }
    });
}

impl PartialEq for Procedure {
    fn eq(&self, other: &Procedure) -> bool {
        match (self, other) {
            (Procedure::Builtin(a), Procedure::Builtin(b)) => {
                a.name == b.name && a.fun as usize == b.fun as usize
            }
            (Procedure::Lambda(a), Procedure::Lambda(b)) => {
                let same_scope = &*a.scope.borrow() as *const Environment
                    == &*b.scope.borrow() as *const Environment;
                same_scope && a.params == b.params && a.body == b.body
            }
            _ => false,
        }
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Procedure::Builtin(b) => write!(f, "Builtin({})", b.name),
            Procedure::Lambda(l) => f
                .debug_struct("Lambda")
                .field("params", &l.params)
                .field("body", &l.body)
                .finish_non_exhaustive(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Nil,
    /// Result of a statement. Not a usable expression value.
    Unspecific,
    Error(String),
    Symbol(String),
    Boolean(bool),
    Number(Number),
    String(String),
    List(Vec<Value>),
    Procedure(Procedure),
}

impl Finalize for Value {}
unsafe impl Trace for Value {
    gc::custom_trace!(this, {
        match this {
            Value::List(items) => {
                for item in items {
                    mark(item);
                }
            }
            Value::Procedure(procedure) => mark(procedure),
            _ => {}
        }
    });
}

impl Value {
    /// Everything is true except `#f`, `#nil` and the statement sentinel;
    /// in particular `0`, `""` and `()` are all true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Unspecific | Value::Boolean(false))
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Unspecific => "unspecific",
            Value::Error(_) => "error",
            Value::Symbol(_) => "symbol",
            Value::Boolean(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::List(_) => "list",
            Value::Procedure(_) => "procedure",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "#nil"),
            Value::Unspecific => Ok(()),
            Value::Error(message) => write!(f, "error: {}", message),
            Value::Symbol(name) => write!(f, "{}", name),
            Value::Boolean(true) => write!(f, "#t"),
            Value::Boolean(false) => write!(f, "#f"),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
            Value::Procedure(Procedure::Builtin(_)) => write!(f, "#builtin-procedure"),
            Value::Procedure(Procedure::Lambda(_)) => write!(f, "#lambda-procedure"),
        }
    }
}
