//! Core builtin procedures.
//!
//! A deliberately small library: predicates, list and string operations,
//! arithmetic, comparisons, output, errors, and `load!`. Builtins receive
//! already-evaluated arguments plus a scratch scope derived from the call
//! site.

use std::fs;

use crate::interpreter::{self, EvalError};
use crate::parser;
use crate::runtime::{
    global_of, Binding, Builtin, Environment, GcShared, NativeFn, Number, Procedure, Value,
};

/// Populate the root scope with the builtin procedures.
pub fn initialize(env: &GcShared<Environment>) {
    let mut scope = env.borrow_mut();
    let mut register = |name: &'static str, fun: NativeFn| {
        scope.define(
            name,
            Binding::Value(Value::Procedure(Procedure::Builtin(Builtin { name, fun }))),
        );
    };

    register("equal?", equal);
    register("not", not);

    register("nil?", is_nil);
    register("boolean?", is_boolean);
    register("number?", is_number);
    register("string?", is_string);
    register("symbol?", is_symbol);
    register("list?", is_list);
    register("procedure?", is_procedure);
    register("error?", is_error);
    register("empty?", is_empty);

    register("list", list);
    register("car", car);
    register("cdr", cdr);
    register("first", car);
    register("last", last);
    register("nth", nth);
    register("length", length);
    register("reverse", reverse);
    register("append", append);

    register("+", add);
    register("-", subtract);
    register("*", multiply);
    register("/", divide);
    register("=", num_eq);
    register("<", num_lt);
    register(">", num_gt);
    register("<=", num_le);
    register(">=", num_ge);

    register("string-length", string_length);
    register("string-append", string_append);
    register("string-trim", string_trim);
    register("symbol->string", symbol_to_string);
    register("string->symbol", string_to_symbol);

    register("display", display);
    register("newline", newline);
    register("print", print);

    register("make-error", make_error);
    register("error-message", error_message);
    register("error", raise_error);

    register("load!", load);
}

fn expect_arity(args: &[Value], expected: usize) -> Result<(), EvalError> {
    if args.len() != expected {
        return Err(EvalError::Arity {
            expected,
            given: args.len(),
        });
    }
    Ok(())
}

fn as_number(value: &Value) -> Result<Number, EvalError> {
    match value {
        Value::Number(n) => Ok(*n),
        other => Err(EvalError::TypeMismatch {
            expected: "number",
            given: other.kind_name(),
        }),
    }
}

fn as_list(value: &Value) -> Result<&[Value], EvalError> {
    match value {
        Value::List(items) => Ok(items),
        other => Err(EvalError::TypeMismatch {
            expected: "list",
            given: other.kind_name(),
        }),
    }
}

fn as_string(value: &Value) -> Result<&str, EvalError> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(EvalError::TypeMismatch {
            expected: "string",
            given: other.kind_name(),
        }),
    }
}

fn equal(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 2)?;
    Ok(Value::Boolean(args[0] == args[1]))
}

fn not(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(Value::Boolean(!args[0].is_truthy()))
}

macro_rules! predicate {
    ($fun:ident, $pattern:pat) => {
        fn $fun(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
            expect_arity(args, 1)?;
            Ok(Value::Boolean(matches!(&args[0], $pattern)))
        }
    };
}

predicate!(is_nil, Value::Nil);
predicate!(is_boolean, Value::Boolean(_));
predicate!(is_number, Value::Number(_));
predicate!(is_string, Value::String(_));
predicate!(is_symbol, Value::Symbol(_));
predicate!(is_list, Value::List(_));
predicate!(is_procedure, Value::Procedure(_));
predicate!(is_error, Value::Error(_));

fn is_empty(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(Value::Boolean(as_list(&args[0])?.is_empty()))
}

fn list(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    Ok(Value::List(args.to_vec()))
}

fn nonempty(value: &Value) -> Result<&[Value], EvalError> {
    let items = as_list(value)?;
    if items.is_empty() {
        return Err(EvalError::User("out of list range".to_string()));
    }
    Ok(items)
}

fn car(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(nonempty(&args[0])?[0].clone())
}

fn cdr(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(Value::List(nonempty(&args[0])?[1..].to_vec()))
}

fn last(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    let items = nonempty(&args[0])?;
    Ok(items[items.len() - 1].clone())
}

fn nth(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 2)?;
    let items = as_list(&args[0])?;
    let index = match as_number(&args[1])? {
        Number::Integer(i) => i,
        Number::Decimal(d) => d as i64,
    };
    if index < 0 || index as usize >= items.len() {
        return Err(EvalError::User("out of list range".to_string()));
    }
    Ok(items[index as usize].clone())
}

fn length(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(Value::Number(Number::Integer(as_list(&args[0])?.len() as i64)))
}

fn reverse(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    let mut items = as_list(&args[0])?.to_vec();
    items.reverse();
    Ok(Value::List(items))
}

/// `[append list v ...]` — a copy of the list with the values pushed on.
fn append(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::Arity {
            expected: 1,
            given: 0,
        });
    }
    let mut items = as_list(&args[0])?.to_vec();
    items.extend(args[1..].iter().cloned());
    Ok(Value::List(items))
}

fn fold_numbers(
    args: &[Value],
    int_op: fn(i64, i64) -> Option<i64>,
    dec_op: fn(f64, f64) -> f64,
) -> Result<Value, EvalError> {
    let mut result = as_number(&args[0])?;
    for arg in &args[1..] {
        let rhs = as_number(arg)?;
        result = match (result, rhs) {
            (Number::Integer(a), Number::Integer(b)) => match int_op(a, b) {
                Some(n) => Number::Integer(n),
                None => Number::Decimal(dec_op(a as f64, b as f64)),
            },
            (a, b) => Number::Decimal(dec_op(a.as_decimal(), b.as_decimal())),
        };
    }
    Ok(Value::Number(result))
}

fn add(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Ok(Value::Number(Number::Integer(0)));
    }
    fold_numbers(args, i64::checked_add, |a, b| a + b)
}

fn subtract(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Err(EvalError::Arity {
            expected: 1,
            given: 0,
        });
    }
    if args.len() == 1 {
        return match as_number(&args[0])? {
            Number::Integer(n) => Ok(Value::Number(Number::Integer(-n))),
            Number::Decimal(n) => Ok(Value::Number(Number::Decimal(-n))),
        };
    }
    fold_numbers(args, i64::checked_sub, |a, b| a - b)
}

fn multiply(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    if args.is_empty() {
        return Ok(Value::Number(Number::Integer(1)));
    }
    fold_numbers(args, i64::checked_mul, |a, b| a * b)
}

fn divide(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::Arity {
            expected: 2,
            given: args.len(),
        });
    }
    let mut result = as_number(&args[0])?;
    for arg in &args[1..] {
        let rhs = as_number(arg)?;
        if !rhs.is_decimal() && rhs.as_decimal() == 0.0 {
            return Err(EvalError::DivisionByZero);
        }
        result = match (result, rhs) {
            // Integer division stays exact or falls over to decimal.
            (Number::Integer(a), Number::Integer(b)) if a.checked_rem(b) == Some(0) => {
                Number::Integer(a / b)
            }
            (a, b) => Number::Decimal(a.as_decimal() / b.as_decimal()),
        };
    }
    Ok(Value::Number(result))
}

fn compare(args: &[Value], ok: fn(f64, f64) -> bool) -> Result<Value, EvalError> {
    if args.len() < 2 {
        return Err(EvalError::Arity {
            expected: 2,
            given: args.len(),
        });
    }
    let mut previous = as_number(&args[0])?.as_decimal();
    for arg in &args[1..] {
        let current = as_number(arg)?.as_decimal();
        if !ok(previous, current) {
            return Ok(Value::Boolean(false));
        }
        previous = current;
    }
    Ok(Value::Boolean(true))
}

fn num_eq(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    compare(args, |a, b| a == b)
}

fn num_lt(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    compare(args, |a, b| a < b)
}

fn num_gt(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    compare(args, |a, b| a > b)
}

fn num_le(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    compare(args, |a, b| a <= b)
}

fn num_ge(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    compare(args, |a, b| a >= b)
}

fn string_length(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(Value::Number(Number::Integer(
        as_string(&args[0])?.chars().count() as i64,
    )))
}

fn string_append(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    let mut result = String::new();
    for arg in args {
        result.push_str(as_string(arg)?);
    }
    Ok(Value::String(result))
}

fn string_trim(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(Value::String(as_string(&args[0])?.trim().to_string()))
}

fn symbol_to_string(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Symbol(name) => Ok(Value::String(name.clone())),
        other => Err(EvalError::TypeMismatch {
            expected: "symbol",
            given: other.kind_name(),
        }),
    }
}

fn string_to_symbol(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(Value::Symbol(as_string(&args[0])?.to_string()))
}

fn display(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    print!("{}", args[0]);
    Ok(Value::Unspecific)
}

fn newline(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 0)?;
    println!();
    Ok(Value::Unspecific)
}

fn print(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    println!("{}", args[0]);
    Ok(Value::Unspecific)
}

fn make_error(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    Ok(Value::Error(as_string(&args[0])?.to_string()))
}

fn error_message(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::Error(message) => Ok(Value::String(message.clone())),
        other => Err(EvalError::TypeMismatch {
            expected: "error",
            given: other.kind_name(),
        }),
    }
}

/// `[error msg]` aborts evaluation with the message.
fn raise_error(args: &[Value], _env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    match &args[0] {
        Value::String(message) => Err(EvalError::User(message.clone())),
        Value::Error(message) => Err(EvalError::User(message.clone())),
        other => Err(EvalError::TypeMismatch {
            expected: "string",
            given: other.kind_name(),
        }),
    }
}

/// `[load! path]` reads and evaluates a file in the global scope.
fn load(args: &[Value], env: &GcShared<Environment>) -> Result<Value, EvalError> {
    expect_arity(args, 1)?;
    let path = as_string(&args[0])?;
    let source =
        fs::read_to_string(path).map_err(|e| EvalError::User(format!("load!: {}", e)))?;
    let global = global_of(env);
    let expressions =
        parser::parse(&source, &global).map_err(|e| EvalError::User(format!("load!: {}", e)))?;
    let mut result = Value::Unspecific;
    for expression in &expressions {
        result = interpreter::eval(expression, &global)?;
    }
    Ok(result)
}
