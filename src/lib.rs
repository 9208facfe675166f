//! docscript: a Lisp dialect where text is a first-class citizen.
//!
//! `{...}` blocks hold literal text with `[...]` expressions embedded in
//! it; `(...)` builds lists and `[...]` calls procedures. The pipeline is
//! a mode-switching lexer, a recursive-descent parser that pre-expands
//! macros while reading, and a tree-walking evaluator over GC-shared
//! environments.

pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod stdlib;

pub use crate::interpreter::{eval, EvalError};
pub use crate::lexer::{tokenize, LexError, Position, Token, TokenKind};
pub use crate::parser::{parse, Expression, ParseError};
pub use crate::runtime::{Environment, GcShared, Value};

/// A root environment with the standard library loaded.
pub fn standard_env() -> GcShared<Environment> {
    let env = Environment::root();
    stdlib::initialize(&env);
    env
}
