//! Special forms. Their operands are handed over unevaluated; each handler
//! decides what to evaluate and in which scope.

use crate::parser::ast::{AtomKind, ExprList, Expression};
use crate::runtime::{
    Binding, DeriveScope, Environment, FindResult, GcShared, Lambda, Macro, Procedure, Value,
};

use super::{eval_expr, eval_operand, quasiquote, quote_value, EvalError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Define,
    Set,
    Lambda,
    And,
    Or,
    If,
    For,
    Quote,
    Quasiquote,
    Unquote,
    UnquoteSplicing,
    DefineMacro,
}

impl SpecialForm {
    pub fn from_name(name: &str) -> Option<SpecialForm> {
        use self::SpecialForm::*;
        match name {
            "define" => Some(Define),
            "set!" => Some(Set),
            "lambda" | "λ" => Some(Lambda),
            "and" => Some(And),
            "or" => Some(Or),
            "if" => Some(If),
            "for" => Some(For),
            "quote" => Some(Quote),
            "quasiquote" => Some(Quasiquote),
            "unquote" => Some(Unquote),
            "unquote-splicing" => Some(UnquoteSplicing),
            "define-macro" => Some(DefineMacro),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        use self::SpecialForm::*;
        match self {
            Define => "define",
            Set => "set!",
            Lambda => "lambda",
            And => "and",
            Or => "or",
            If => "if",
            For => "for",
            Quote => "quote",
            Quasiquote => "quasiquote",
            Unquote => "unquote",
            UnquoteSplicing => "unquote-splicing",
            DefineMacro => "define-macro",
        }
    }
}

pub fn is_keyword(name: &str) -> bool {
    SpecialForm::from_name(name).is_some()
}

pub(super) fn eval_form(
    form: SpecialForm,
    list: &ExprList,
    env: &GcShared<Environment>,
    allow_def: bool,
) -> Result<Value, EvalError> {
    match form {
        SpecialForm::Define => eval_define(list, env, allow_def),
        SpecialForm::Set => eval_set(list, env),
        SpecialForm::Lambda => eval_lambda(list, env),
        SpecialForm::And => eval_and_or(list, env, true),
        SpecialForm::Or => eval_and_or(list, env, false),
        SpecialForm::If => eval_if(list, env),
        SpecialForm::For => eval_for(list, env),
        SpecialForm::Quote => {
            expect_size(list, 2, "quote")?;
            Ok(quote_value(&list.items[1]))
        }
        SpecialForm::Quasiquote => {
            expect_size(list, 2, "quasiquote")?;
            quasiquote(&list.items[1], env, 1)
        }
        SpecialForm::Unquote => Err(EvalError::UnquoteInvalid(
            "not inside quasiquote".to_string(),
        )),
        SpecialForm::UnquoteSplicing => Err(EvalError::UnquoteSplicingInvalid(
            "not inside quasiquote".to_string(),
        )),
        SpecialForm::DefineMacro => eval_define_macro(list, env, allow_def),
    }
}

fn expect_size(list: &ExprList, size: usize, form: &str) -> Result<(), EvalError> {
    if list.items.len() != size {
        return Err(EvalError::BadSyntax(form.to_string()));
    }
    Ok(())
}

/// The name operand of a binding form: a non-keyword identifier.
fn binding_name<'e>(expr: &'e Expression, form: &str) -> Result<&'e str, EvalError> {
    match expr.name() {
        Some(name) if !is_keyword(name) => Ok(name),
        _ => Err(EvalError::BadSyntax(form.to_string())),
    }
}

/// A parameter list: one bare name, `#nil` for none, or a list of names.
fn param_names(expr: &Expression, form: &str) -> Result<Vec<String>, EvalError> {
    match expr {
        Expression::Atom(atom) => match &atom.kind {
            AtomKind::Name(name) if !is_keyword(name) => Ok(vec![name.clone()]),
            AtomKind::Nil => Ok(Vec::new()),
            _ => Err(EvalError::BadSyntax(form.to_string())),
        },
        Expression::RoundList(list) | Expression::SquareList(list) => list
            .items
            .iter()
            .map(|item| binding_name(item, form).map(str::to_string))
            .collect(),
        _ => Err(EvalError::BadSyntax(form.to_string())),
    }
}

fn eval_define(
    list: &ExprList,
    env: &GcShared<Environment>,
    allow_def: bool,
) -> Result<Value, EvalError> {
    if !allow_def {
        return Err(EvalError::BadSyntax(
            "define in expression position".to_string(),
        ));
    }
    expect_size(list, 3, "define")?;
    let name = binding_name(&list.items[1], "define")?;
    if env.borrow().find(name, true) != FindResult::NotExist {
        return Err(EvalError::AlreadyDefined(name.to_string()));
    }
    let value = eval_operand(&list.items[2], env)?;
    env.borrow_mut().define(name, Binding::Value(value));
    Ok(Value::Unspecific)
}

fn eval_set(list: &ExprList, env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_size(list, 3, "set!")?;
    let name = binding_name(&list.items[1], "set!")?;
    let value = eval_operand(&list.items[2], env)?;
    if !env.borrow_mut().assign(name, value) {
        return Err(EvalError::Unbound(name.to_string()));
    }
    Ok(Value::Unspecific)
}

fn eval_lambda(list: &ExprList, env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_size(list, 3, "lambda")?;
    let params = param_names(&list.items[1], "lambda")?;
    Ok(Value::Procedure(Procedure::Lambda(Lambda {
        params,
        body: Box::new(list.items[2].clone()),
        scope: env.clone(),
    })))
}

/// `and` returns its first falsy operand, `or` its first truthy one; with
/// no early exit the last operand wins, and the empty chain defaults to
/// `#t` / `#f`.
fn eval_and_or(
    list: &ExprList,
    env: &GcShared<Environment>,
    is_and: bool,
) -> Result<Value, EvalError> {
    let mut result = Value::Boolean(is_and);
    for item in &list.items[1..] {
        let value = eval_operand(item, env)?;
        let truthy = value.is_truthy();
        result = value;
        if truthy != is_and {
            break;
        }
    }
    Ok(result)
}

fn eval_if(list: &ExprList, env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_size(list, 4, "if")?;
    let condition = eval_operand(&list.items[1], env)?;
    let branch = if condition.is_truthy() {
        &list.items[2]
    } else {
        &list.items[3]
    };
    eval_expr(branch, env, false)
}

/// Iterate a list value, binding the variable in a fresh scope each turn.
/// The result is the last iteration's value, `()` for an empty list.
fn eval_for(list: &ExprList, env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_size(list, 4, "for")?;
    let name = binding_name(&list.items[1], "for")?;
    let elements = match eval_operand(&list.items[2], env)? {
        Value::List(elements) => elements,
        other => {
            return Err(EvalError::TypeMismatch {
                expected: "list",
                given: other.kind_name(),
            })
        }
    };
    let mut result = Value::List(Vec::new());
    for element in elements {
        let scope = env.derive();
        scope.borrow_mut().define(name, Binding::Value(element));
        result = eval_expr(&list.items[3], &scope, true)?;
    }
    Ok(result)
}

fn eval_define_macro(
    list: &ExprList,
    env: &GcShared<Environment>,
    allow_def: bool,
) -> Result<Value, EvalError> {
    if !allow_def {
        return Err(EvalError::BadSyntax(
            "define-macro in expression position".to_string(),
        ));
    }
    expect_size(list, 4, "define-macro")?;
    let name = binding_name(&list.items[1], "define-macro")?;
    let params = param_names(&list.items[2], "define-macro")?;
    // Re-binding is deliberate: the parser evaluates this form once while
    // reading and the evaluator runs it again.
    env.borrow_mut().define(
        name,
        Binding::Macro(Macro::new(params, list.items[3].clone())),
    );
    Ok(Value::Unspecific)
}
