//! Non-hygienic macros.
//!
//! Expansion is plain tree substitution: parameter names bind the
//! unevaluated argument expressions and are pasted wherever they occur in
//! the body. Nothing is renamed, so a body deliberately captures whatever
//! is visible at the use site.

use std::collections::HashMap;

use gc::{Finalize, Trace};

use crate::interpreter::EvalError;
use crate::parser::ast::{ExprList, Expression, Text, TextPart};

use super::environment::{Environment, GcShared};

#[derive(Debug, Clone, PartialEq)]
pub struct Macro {
    params: Vec<String>,
    body: Expression,
}

impl Finalize for Macro {}
unsafe impl Trace for Macro {
    gc::unsafe_empty_trace!();
}

impl Macro {
    pub fn new(params: Vec<String>, body: Expression) -> Macro {
        Macro { params, body }
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }
}

/// One expansion step: substitute the arguments into the body and stop.
/// Macro calls inside the result are left for whoever evaluates it.
pub fn expand_1(
    mac: &Macro,
    args: &[Expression],
    env: &GcShared<Environment>,
) -> Result<Expression, EvalError> {
    let expander = Expander {
        map: bind_params(mac, args)?,
        env,
        recursive: false,
    };
    expander.expression(&mac.body)
}

/// Eager expansion: like `expand_1`, but call forms in the result whose
/// head is currently macro-bound are themselves expanded, recursively.
/// There is no recursion guard; a self-referential macro diverges here.
pub fn expand(
    mac: &Macro,
    args: &[Expression],
    env: &GcShared<Environment>,
) -> Result<Expression, EvalError> {
    let expander = Expander {
        map: bind_params(mac, args)?,
        env,
        recursive: true,
    };
    expander.expression(&mac.body)
}

fn bind_params(mac: &Macro, args: &[Expression]) -> Result<HashMap<String, Expression>, EvalError> {
    if mac.params.len() != args.len() {
        return Err(EvalError::MacroExpansion(format!(
            "expected {} arguments, given {}",
            mac.params.len(),
            args.len()
        )));
    }
    Ok(mac
        .params
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect())
}

struct Expander<'a> {
    map: HashMap<String, Expression>,
    env: &'a GcShared<Environment>,
    recursive: bool,
}

impl Expander<'_> {
    fn expression(&self, expr: &Expression) -> Result<Expression, EvalError> {
        match expr {
            Expression::Atom(_) => {
                if let Some(name) = expr.name() {
                    if let Some(substitute) = self.map.get(name) {
                        return Ok(substitute.clone());
                    }
                }
                Ok(expr.clone())
            }
            Expression::Text(text) => {
                let parts = text
                    .parts
                    .iter()
                    .map(|part| match part {
                        TextPart::Expr(e) => Ok(TextPart::Expr(self.expression(e)?)),
                        other => Ok(other.clone()),
                    })
                    .collect::<Result<Vec<_>, EvalError>>()?;
                Ok(Expression::Text(Text {
                    parts,
                    position: text.position,
                }))
            }
            Expression::RoundList(list) => Ok(Expression::RoundList(self.list(list)?)),
            Expression::SquareList(list) => {
                if self.recursive {
                    if let Some(name) = list.items.first().and_then(Expression::name) {
                        let inner = self.env.borrow().get_macro(name);
                        if let Some(inner) = inner {
                            let args = list.items[1..]
                                .iter()
                                .map(|arg| self.expression(arg))
                                .collect::<Result<Vec<_>, EvalError>>()?;
                            return expand(&inner, &args, self.env);
                        }
                    }
                }
                Ok(Expression::SquareList(self.list(list)?))
            }
            Expression::Quote(inner, p) => {
                Ok(Expression::Quote(Box::new(self.expression(inner)?), *p))
            }
            Expression::Quasiquote(inner, p) => {
                Ok(Expression::Quasiquote(Box::new(self.expression(inner)?), *p))
            }
            Expression::Unquote(inner, p) => {
                Ok(Expression::Unquote(Box::new(self.expression(inner)?), *p))
            }
            Expression::UnquoteSplicing(inner, p) => Ok(Expression::UnquoteSplicing(
                Box::new(self.expression(inner)?),
                *p,
            )),
        }
    }

    fn list(&self, list: &ExprList) -> Result<ExprList, EvalError> {
        let items = list
            .items
            .iter()
            .map(|item| self.expression(item))
            .collect::<Result<Vec<_>, EvalError>>()?;
        Ok(ExprList {
            items,
            position: list.position,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::lexer::Position;
    use crate::parser::ast::{Atom, AtomKind};

    fn name(s: &str) -> Expression {
        Expression::Atom(Atom {
            kind: AtomKind::Name(s.to_string()),
            position: Position::default(),
        })
    }

    fn int(n: i64) -> Expression {
        Expression::Atom(Atom {
            kind: AtomKind::Integer(n),
            position: Position::default(),
        })
    }

    fn call(items: Vec<Expression>) -> Expression {
        Expression::SquareList(ExprList {
            items,
            position: Position::default(),
        })
    }

    #[test]
    fn substitutes_unevaluated_arguments() {
        let env = Environment::root();
        let mac = Macro::new(
            vec!["x".to_string()],
            call(vec![name("+"), name("x"), name("x")]),
        );
        let arg = call(vec![name("f"), int(1)]);
        let expanded = expand_1(&mac, &[arg.clone()], &env).expect("expand");
        assert_eq!(expanded, call(vec![name("+"), arg.clone(), arg]));
    }

    #[test]
    fn arity_mismatch_fails() {
        let env = Environment::root();
        let mac = Macro::new(vec!["x".to_string()], name("x"));
        match expand_1(&mac, &[], &env) {
            Err(EvalError::MacroExpansion(_)) => {}
            other => panic!("expected a macro expansion error, got {:?}", other),
        }
    }

    #[test]
    fn lazy_expansion_leaves_nested_macro_calls() {
        use crate::runtime::environment::Binding;
        let env = Environment::root();
        env.borrow_mut().define(
            "inner",
            Binding::Macro(Macro::new(vec!["y".to_string()], name("y"))),
        );
        let mac = Macro::new(
            vec!["x".to_string()],
            call(vec![name("inner"), name("x")]),
        );
        let lazy = expand_1(&mac, &[int(5)], &env).expect("expand_1");
        assert_eq!(lazy, call(vec![name("inner"), int(5)]));
        let eager = expand(&mac, &[int(5)], &env).expect("expand");
        assert_eq!(eager, int(5));
    }
}
