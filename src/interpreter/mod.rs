//! Tree-walking evaluator.

mod forms;

pub use self::forms::{is_keyword, SpecialForm};

use std::error::Error;
use std::fmt;

use log::debug;

use crate::parser::ast::{Atom, AtomKind, ExprList, Expression, TextPart};
use crate::runtime::macros;
use crate::runtime::{
    Binding, DeriveScope, Environment, FindResult, GcShared, Number, Procedure, Value,
    LINE_END_SYMBOL,
};

#[cfg(test)]
#[path = "test.rs"]
mod test;

#[derive(Debug, Clone, PartialEq)]
pub enum EvalError {
    BadSyntax(String),
    Unbound(String),
    AlreadyDefined(String),
    NotProcedure,
    Arity { expected: usize, given: usize },
    /// A statement result was used where a value is required.
    DefinitionAsExpression,
    MacroExpansion(String),
    UnquoteInvalid(String),
    UnquoteSplicingInvalid(String),
    TypeMismatch {
        expected: &'static str,
        given: &'static str,
    },
    DivisionByZero,
    /// Raised from script code via the `error` procedure.
    User(String),
    Internal(&'static str),
}

impl fmt::Display for EvalError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::EvalError::*;
        match self {
            BadSyntax(form) => write!(f, "bad syntax: {}", form),
            Unbound(name) => write!(f, "unbound symbol: {}", name),
            AlreadyDefined(name) => write!(f, "name already defined: {}", name),
            NotProcedure => write!(f, "not a procedure"),
            Arity { expected, given } => write!(
                f,
                "wrong number of arguments, expected: {} given: {}",
                expected, given
            ),
            DefinitionAsExpression => write!(f, "definition may not be used as expression"),
            MacroExpansion(detail) => write!(f, "macro expanding failed: {}", detail),
            UnquoteInvalid(detail) => write!(f, "unquote invalid: {}", detail),
            UnquoteSplicingInvalid(detail) => write!(f, "unquote-splicing invalid: {}", detail),
            TypeMismatch { expected, given } => {
                write!(f, "type mismatch, expected: {} given: {}", expected, given)
            }
            DivisionByZero => write!(f, "division by zero"),
            User(message) => write!(f, "error: {}", message),
            Internal(detail) => write!(f, "internal error: {}", detail),
        }
    }
}

impl Error for EvalError {}

/// Evaluate a top-level expression. Definitions are allowed here.
pub fn eval(expr: &Expression, env: &GcShared<Environment>) -> Result<Value, EvalError> {
    eval_expr(expr, env, true)
}

/// `allow_def` marks statement position: `define` and `define-macro` are
/// legal only at the top level, in a lambda body and in a `for` body.
pub(crate) fn eval_expr(
    expr: &Expression,
    env: &GcShared<Environment>,
    allow_def: bool,
) -> Result<Value, EvalError> {
    match expr {
        Expression::Atom(atom) => eval_atom(atom, env),
        Expression::Text(text) => {
            let mut items = Vec::with_capacity(text.parts.len());
            for part in &text.parts {
                match part {
                    TextPart::Str(s) => items.push(Value::String(s.clone())),
                    TextPart::LineEnd => items.push(Value::Symbol(LINE_END_SYMBOL.to_string())),
                    TextPart::Expr(e) => items.push(eval_operand(e, env)?),
                }
            }
            Ok(Value::List(items))
        }
        Expression::RoundList(list) => {
            let mut items = Vec::with_capacity(list.items.len());
            for item in &list.items {
                items.push(eval_operand(item, env)?);
            }
            Ok(Value::List(items))
        }
        Expression::SquareList(list) => eval_square(list, env, allow_def),
        Expression::Quote(inner, _) => Ok(quote_value(inner)),
        Expression::Quasiquote(inner, _) => quasiquote(inner, env, 1),
        Expression::Unquote(..) => Err(EvalError::UnquoteInvalid(
            "not inside quasiquote".to_string(),
        )),
        Expression::UnquoteSplicing(..) => Err(EvalError::UnquoteSplicingInvalid(
            "not inside quasiquote".to_string(),
        )),
    }
}

/// Evaluate in value position: statements and their sentinel are rejected.
fn eval_operand(expr: &Expression, env: &GcShared<Environment>) -> Result<Value, EvalError> {
    let value = eval_expr(expr, env, false)?;
    if matches!(value, Value::Unspecific) {
        return Err(EvalError::DefinitionAsExpression);
    }
    Ok(value)
}

fn eval_atom(atom: &Atom, env: &GcShared<Environment>) -> Result<Value, EvalError> {
    match &atom.kind {
        AtomKind::Name(name) => {
            if is_keyword(name) {
                return Err(EvalError::BadSyntax(name.clone()));
            }
            let found = env.borrow().find(name, false);
            match found {
                FindResult::ExistValue => env
                    .borrow()
                    .get_value(name)
                    .ok_or(EvalError::Internal("binding vanished during lookup")),
                FindResult::ExistMacro => Err(EvalError::BadSyntax(name.clone())),
                FindResult::NotExist => Err(EvalError::Unbound(name.clone())),
            }
        }
        AtomKind::Integer(n) => Ok(Value::Number(Number::Integer(*n))),
        AtomKind::Decimal(n) => Ok(Value::Number(Number::Decimal(*n))),
        AtomKind::Boolean(b) => Ok(Value::Boolean(*b)),
        AtomKind::Str(s) => Ok(Value::String(s.clone())),
        AtomKind::Nil => Ok(Value::Nil),
    }
}

fn eval_square(
    list: &ExprList,
    env: &GcShared<Environment>,
    allow_def: bool,
) -> Result<Value, EvalError> {
    let head = match list.items.first() {
        Some(head) => head,
        None => return Err(EvalError::BadSyntax("empty form".to_string())),
    };
    if let Some(name) = head.name() {
        if let Some(form) = SpecialForm::from_name(name) {
            return forms::eval_form(form, list, env, allow_def);
        }
        let mac = env.borrow().get_macro(name);
        if let Some(mac) = mac {
            let expanded = macros::expand_1(&mac, &list.items[1..], env)?;
            debug!("expanded macro {} into {}", name, expanded);
            return eval_expr(&expanded, env, allow_def);
        }
    }
    let callee = eval_expr(head, env, false)?;
    let procedure = match callee {
        Value::Procedure(p) => p,
        _ => return Err(EvalError::NotProcedure),
    };
    let mut args = Vec::with_capacity(list.items.len() - 1);
    for item in &list.items[1..] {
        args.push(eval_operand(item, env)?);
    }
    apply(&procedure, args, env)
}

/// Apply a procedure. A lambda runs in a scope derived from where it was
/// defined; a builtin gets a scratch scope off the call site.
pub fn apply(
    procedure: &Procedure,
    args: Vec<Value>,
    env: &GcShared<Environment>,
) -> Result<Value, EvalError> {
    match procedure {
        Procedure::Builtin(builtin) => {
            debug!("applying builtin {}", builtin.name);
            let scope = env.derive();
            (builtin.fun)(&args, &scope)
        }
        Procedure::Lambda(lambda) => {
            if lambda.params.len() != args.len() {
                return Err(EvalError::Arity {
                    expected: lambda.params.len(),
                    given: args.len(),
                });
            }
            let scope = lambda.scope.derive();
            {
                let mut bindings = scope.borrow_mut();
                for (name, value) in lambda.params.iter().zip(args) {
                    bindings.define(name, Binding::Value(value));
                }
            }
            eval_expr(&lambda.body, &scope, true)
        }
    }
}

/// Structural conversion of syntax to data, no evaluation at all.
pub(crate) fn quote_value(expr: &Expression) -> Value {
    match expr {
        Expression::Atom(atom) => match &atom.kind {
            AtomKind::Name(name) => Value::Symbol(name.clone()),
            AtomKind::Integer(n) => Value::Number(Number::Integer(*n)),
            AtomKind::Decimal(n) => Value::Number(Number::Decimal(*n)),
            AtomKind::Boolean(b) => Value::Boolean(*b),
            AtomKind::Str(s) => Value::String(s.clone()),
            AtomKind::Nil => Value::Nil,
        },
        Expression::Text(text) => Value::List(
            text.parts
                .iter()
                .map(|part| match part {
                    TextPart::Str(s) => Value::String(s.clone()),
                    TextPart::LineEnd => Value::Symbol(LINE_END_SYMBOL.to_string()),
                    TextPart::Expr(e) => quote_value(e),
                })
                .collect(),
        ),
        Expression::RoundList(list) | Expression::SquareList(list) => {
            Value::List(list.items.iter().map(quote_value).collect())
        }
        Expression::Quote(inner, _) => quoted_form("quote", inner),
        Expression::Quasiquote(inner, _) => quoted_form("quasiquote", inner),
        Expression::Unquote(inner, _) => quoted_form("unquote", inner),
        Expression::UnquoteSplicing(inner, _) => quoted_form("unquote-splicing", inner),
    }
}

fn quoted_form(name: &str, inner: &Expression) -> Value {
    Value::List(vec![Value::Symbol(name.to_string()), quote_value(inner)])
}

/// Quasiquotation depth algebra. The outer `quasiquote` enters at depth 1;
/// nested quasiquotes raise the depth, unquotes lower it, and only a
/// depth-1 unquote evaluates. Everything deeper reproduces its own shape
/// as list data.
pub(crate) fn quasiquote(
    expr: &Expression,
    env: &GcShared<Environment>,
    depth: u32,
) -> Result<Value, EvalError> {
    match expr {
        Expression::Unquote(inner, _) => {
            if depth == 1 {
                eval_operand(inner, env)
            } else {
                Ok(Value::List(vec![
                    Value::Symbol("unquote".to_string()),
                    quasiquote(inner, env, depth - 1)?,
                ]))
            }
        }
        Expression::UnquoteSplicing(inner, _) => {
            if depth == 1 {
                // Splicing only makes sense as a member of an enclosing
                // list; the list cases below intercept it first.
                Err(EvalError::UnquoteSplicingInvalid(
                    "invalid context within quasiquote".to_string(),
                ))
            } else {
                Ok(Value::List(vec![
                    Value::Symbol("unquote-splicing".to_string()),
                    quasiquote(inner, env, depth - 1)?,
                ]))
            }
        }
        Expression::Quasiquote(inner, _) => Ok(Value::List(vec![
            Value::Symbol("quasiquote".to_string()),
            quasiquote(inner, env, depth + 1)?,
        ])),
        Expression::Quote(inner, _) => Ok(Value::List(vec![
            Value::Symbol("quote".to_string()),
            quasiquote(inner, env, depth)?,
        ])),
        Expression::Atom(_) => Ok(quote_value(expr)),
        Expression::Text(text) => {
            let mut items = Vec::with_capacity(text.parts.len());
            for part in &text.parts {
                match part {
                    TextPart::Str(s) => items.push(Value::String(s.clone())),
                    TextPart::LineEnd => items.push(Value::Symbol(LINE_END_SYMBOL.to_string())),
                    TextPart::Expr(e) => quasiquote_member(e, env, depth, &mut items)?,
                }
            }
            Ok(Value::List(items))
        }
        Expression::RoundList(list) | Expression::SquareList(list) => {
            let mut items = Vec::with_capacity(list.items.len());
            for member in &list.items {
                quasiquote_member(member, env, depth, &mut items)?;
            }
            Ok(Value::List(items))
        }
    }
}

/// A depth-1 splicing member evaluates to a list and contributes its
/// elements; everything else contributes one value.
fn quasiquote_member(
    member: &Expression,
    env: &GcShared<Environment>,
    depth: u32,
    items: &mut Vec<Value>,
) -> Result<(), EvalError> {
    if let Expression::UnquoteSplicing(inner, _) = member {
        if depth == 1 {
            match eval_operand(inner, env)? {
                Value::List(elements) => {
                    items.extend(elements);
                    return Ok(());
                }
                other => {
                    return Err(EvalError::TypeMismatch {
                        expected: "list",
                        given: other.kind_name(),
                    })
                }
            }
        }
    }
    items.push(quasiquote(member, env, depth)?);
    Ok(())
}
