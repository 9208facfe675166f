use super::*;
use crate::parser::parse;
use crate::standard_env;

/// Parse and evaluate a program, returning the last form's value.
fn run(source: &str) -> Result<Value, EvalError> {
    let env = standard_env();
    let expressions = match parse(source, &env) {
        Ok(expressions) => expressions,
        Err(crate::parser::ParseError::Eval(e)) => return Err(e),
        Err(e) => panic!("parse failed for {:?}: {}", source, e),
    };
    let mut result = Value::Unspecific;
    for expression in &expressions {
        result = eval(expression, &env)?;
    }
    Ok(result)
}

fn run_ok(source: &str) -> Value {
    match run(source) {
        Ok(value) => value,
        Err(e) => panic!("evaluation failed for {:?}: {}", source, e),
    }
}

fn int(n: i64) -> Value {
    Value::Number(Number::Integer(n))
}

fn sym(s: &str) -> Value {
    Value::Symbol(s.to_string())
}

fn string(s: &str) -> Value {
    Value::String(s.to_string())
}

#[test]
fn literals() {
    assert_eq!(run_ok("42"), int(42));
    assert_eq!(run_ok("3.5"), Value::Number(Number::Decimal(3.5)));
    assert_eq!(run_ok("#t"), Value::Boolean(true));
    assert_eq!(run_ok("\"hi\""), string("hi"));
    assert_eq!(run_ok("#nil"), Value::Nil);
    assert_eq!(run_ok("#-inf"), Value::Number(Number::Decimal(f64::NEG_INFINITY)));
}

#[test]
fn quote_converts_syntax_to_data() {
    assert_eq!(run_ok("'foo"), sym("foo"));
    assert_eq!(
        run_ok("[quote (1 a)]"),
        Value::List(vec![int(1), sym("a")])
    );
    // Call forms quote structurally too, nothing is invoked.
    assert_eq!(
        run_ok("[quote [f x]]"),
        Value::List(vec![sym("f"), sym("x")])
    );
    assert_eq!(
        run_ok("[quote 'a]"),
        Value::List(vec![sym("quote"), sym("a")])
    );
}

#[test]
fn round_lists_evaluate_their_members() {
    assert_eq!(
        run_ok("(1 [+ 1 1] \"x\")"),
        Value::List(vec![int(1), int(2), string("x")])
    );
    assert_eq!(run_ok("()"), Value::List(vec![]));
}

#[test]
fn define_binds_and_rejects_redefinition() {
    assert_eq!(run_ok("[define x 10] x"), int(10));
    assert_eq!(
        run("[define x 1] [define x 2]"),
        Err(EvalError::AlreadyDefined("x".to_string()))
    );
    assert!(matches!(
        run("[+ [define x 1] 1]"),
        Err(EvalError::BadSyntax(_))
    ));
}

#[test]
fn set_rebinds_the_nearest_visible_binding() {
    assert_eq!(run_ok("[define x 1] [set! x 5] x"), int(5));
    assert_eq!(run("[set! y 1]"), Err(EvalError::Unbound("y".to_string())));
    // The rebind reaches through a lambda's derived scope to the global.
    assert_eq!(
        run_ok("[define n 0] [define bump [lambda () [set! n [+ n 1]]]] [bump] [bump] n"),
        int(2)
    );
}

#[test]
fn lambda_closes_over_its_defining_scope() {
    assert_eq!(
        run_ok(
            "[define make-adder [lambda (n) [lambda (m) [+ n m]]]]\n\
             [define add3 [make-adder 3]]\n\
             [add3 4]"
        ),
        int(7)
    );
    // Call-site bindings never leak into the body.
    assert_eq!(
        run_ok(
            "[define n 100]\n\
             [define f [lambda #nil n]]\n\
             [define g [lambda (n) [f]]]\n\
             [g 1]"
        ),
        int(100)
    );
    assert_eq!(run_ok("[[λ (x) [* x x]] 6]"), int(36));
}

#[test]
fn lambda_arity_is_exact() {
    assert_eq!(
        run("[[lambda (x) x]]"),
        Err(EvalError::Arity {
            expected: 1,
            given: 0
        })
    );
}

#[test]
fn define_inside_a_lambda_stays_inside() {
    assert_eq!(
        run("[define f [lambda #nil [define inner 42]]] [f] inner"),
        Err(EvalError::Unbound("inner".to_string()))
    );
}

#[test]
fn if_takes_both_arms_and_runs_one() {
    assert_eq!(
        run_ok("[define n 0] [if #t [set! n [+ n 1]] [set! n [+ n 10]]] n"),
        int(1)
    );
    assert_eq!(
        run_ok("[define n 0] [if #f [set! n [+ n 1]] [set! n [+ n 10]]] n"),
        int(10)
    );
    assert!(matches!(run("[if #t 1]"), Err(EvalError::BadSyntax(_))));
    // Zero is truthy.
    assert_eq!(run_ok("[if 0 'yes 'no]"), sym("yes"));
}

#[test]
fn and_or_short_circuit() {
    assert_eq!(run_ok("[and 1 2 3]"), int(3));
    assert_eq!(run_ok("[and #f [error \"boom\"]]"), Value::Boolean(false));
    assert_eq!(run_ok("[or #t [error \"boom\"]]"), Value::Boolean(true));
    assert_eq!(run_ok("[or #nil \"x\"]"), string("x"));
    assert_eq!(run_ok("[or #nil #f]"), Value::Boolean(false));
    assert_eq!(run_ok("[and]"), Value::Boolean(true));
    assert_eq!(run_ok("[or]"), Value::Boolean(false));
    // Empty string and empty list are truthy.
    assert_eq!(run_ok("[and 0 \"\"]"), string(""));
}

#[test]
fn unspecific_is_not_a_value() {
    assert_eq!(
        run("[and [display 1]]"),
        Err(EvalError::DefinitionAsExpression)
    );
    assert_eq!(
        run("[+ 1 [display 2]]"),
        Err(EvalError::DefinitionAsExpression)
    );
}

#[test]
fn text_blocks_evaluate_to_lists() {
    assert_eq!(
        run_ok("[define who \"Lee\"] {hello [who] !}"),
        Value::List(vec![string("hello "), string("Lee"), string(" !")])
    );
    assert_eq!(
        run_ok("{a\n\nb}"),
        Value::List(vec![
            string("a"),
            sym(LINE_END_SYMBOL),
            string("b"),
        ])
    );
}

#[test]
fn quasiquote_evaluates_depth_one_unquotes() {
    assert_eq!(
        run_ok("`(1 ,[+ 1 1] 3)"),
        Value::List(vec![int(1), int(2), int(3)])
    );
    assert_eq!(
        run_ok("[define xs (1 2)] `(0 ,@xs 3)"),
        Value::List(vec![int(0), int(1), int(2), int(3)])
    );
}

#[test]
fn quasiquote_deeper_levels_stay_data() {
    assert_eq!(
        run_ok("`(1 `(2 ,[+ 1 1]))"),
        Value::List(vec![
            int(1),
            Value::List(vec![
                sym("quasiquote"),
                Value::List(vec![
                    int(2),
                    Value::List(vec![
                        sym("unquote"),
                        Value::List(vec![sym("+"), int(1), int(1)]),
                    ]),
                ]),
            ]),
        ])
    );
}

#[test]
fn quasiquote_misuse() {
    assert!(matches!(
        run("`,@(1 2)"),
        Err(EvalError::UnquoteSplicingInvalid(_))
    ));
    assert!(matches!(
        run("`(,@5)"),
        Err(EvalError::TypeMismatch {
            expected: "list",
            ..
        })
    ));
    assert!(matches!(run(",x"), Err(EvalError::UnquoteInvalid(_))));
    assert!(matches!(
        run(",@x"),
        Err(EvalError::UnquoteSplicingInvalid(_))
    ));
}

#[test]
fn macros_substitute_unevaluated_and_unhygienic() {
    assert_eq!(run_ok("[define-macro m (x) [+ x x]] [m 5]"), int(10));
    // The body sees whatever the use site sees.
    assert_eq!(run_ok("[define-macro getx #nil x] [define x 7] [getx]"), int(7));
    assert_eq!(
        run_ok("[define-macro set-to-ten (var) [set! var 10]] [define y 1] [set-to-ten y] y"),
        int(10)
    );
    // A macro name is not a value.
    assert!(matches!(
        run("[define-macro m (x) x] m"),
        Err(EvalError::BadSyntax(_))
    ));
    assert_eq!(
        run("[define-macro m (a b) a] [m 1]"),
        Err(EvalError::MacroExpansion(
            "expected 2 arguments, given 1".to_string()
        ))
    );
}

#[test]
fn for_iterates_with_a_fresh_scope_per_turn() {
    assert_eq!(
        run_ok("[define sum 0] [for x (1 2 3) [set! sum [+ sum x]]] sum"),
        int(6)
    );
    // A define in the body lands in the iteration scope, every time.
    assert_eq!(run_ok("[define acc 0] [for x (1 2) [define t 1]] acc"), int(0));
    assert_eq!(run_ok("[for x () 1]"), Value::List(vec![]));
    assert!(matches!(
        run("[for x 5 x]"),
        Err(EvalError::TypeMismatch {
            expected: "list",
            ..
        })
    ));
}

#[test]
fn procedure_call_errors() {
    assert_eq!(run("[1 2]"), Err(EvalError::NotProcedure));
    assert!(matches!(run("[]"), Err(EvalError::BadSyntax(_))));
    assert_eq!(run("nope"), Err(EvalError::Unbound("nope".to_string())));
    assert!(matches!(run("define"), Err(EvalError::BadSyntax(_))));
}

#[test]
fn arithmetic_and_comparisons() {
    assert_eq!(run_ok("[+ 1 2 3]"), int(6));
    assert_eq!(run_ok("[- 10 4]"), int(6));
    assert_eq!(run_ok("[- 3]"), int(-3));
    assert_eq!(run_ok("[* 2 2.5]"), Value::Number(Number::Decimal(5.0)));
    assert_eq!(run_ok("[/ 6 3]"), int(2));
    assert_eq!(run_ok("[/ 7 2]"), Value::Number(Number::Decimal(3.5)));
    assert_eq!(run("[/ 1 0]"), Err(EvalError::DivisionByZero));
    assert_eq!(run_ok("[< 1 2 3]"), Value::Boolean(true));
    assert_eq!(run_ok("[>= 2 2 1]"), Value::Boolean(true));
    assert_eq!(run_ok("[= 1 1.0]"), Value::Boolean(true));
}

#[test]
fn list_builtins() {
    assert_eq!(run_ok("[car (1 2)]"), int(1));
    assert_eq!(run_ok("[cdr (1 2 3)]"), Value::List(vec![int(2), int(3)]));
    assert_eq!(run_ok("[last (1 2 3)]"), int(3));
    assert_eq!(run_ok("[nth (7 8 9) 1]"), int(8));
    assert_eq!(run_ok("[length (1 2 3)]"), int(3));
    assert_eq!(run_ok("[reverse (1 2)]"), Value::List(vec![int(2), int(1)]));
    assert_eq!(
        run_ok("[append (1) 2 3]"),
        Value::List(vec![int(1), int(2), int(3)])
    );
    assert_eq!(run_ok("[empty? ()]"), Value::Boolean(true));
    assert_eq!(
        run("[nth (1) 4]"),
        Err(EvalError::User("out of list range".to_string()))
    );
    assert_eq!(
        run_ok("[equal? (1 (2)) (1 (2))]"),
        Value::Boolean(true)
    );
}

#[test]
fn strings_and_symbols() {
    assert_eq!(run_ok("[string-append \"a\" \"b\"]"), string("ab"));
    assert_eq!(run_ok("[string-length \"héllo\"]"), int(5));
    assert_eq!(run_ok("[string-trim \"  x  \"]"), string("x"));
    assert_eq!(run_ok("[symbol->string 'abc]"), string("abc"));
    assert_eq!(run_ok("[string->symbol \"abc\"]"), sym("abc"));
}

#[test]
fn errors_are_values_until_raised() {
    assert_eq!(run_ok("[error? [make-error \"e\"]]"), Value::Boolean(true));
    assert_eq!(run_ok("[error-message [make-error \"e\"]]"), string("e"));
    assert_eq!(run("[error \"boom\"]"), Err(EvalError::User("boom".to_string())));
}
