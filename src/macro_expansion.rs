//! Macro definition and expansion.
//!
//! Runs once over the freshly parsed program, before evaluation. First every
//! top-level `let NAME = macro(...) { ... };` is pulled out of the program
//! and registered; then every remaining call site whose callee names a
//! registered macro is rewritten by running the macro body over the
//! argument syntax.

use std::io::prelude::*;
use std::rc::Rc;

use crate::ast::{modify, CallExpression, Expression, LetStatement, Node, Program, Statement};
use crate::env::Environment;
use crate::eval::Evaluator;
use crate::object::{Macro, Object};

/// Collects macro definitions into `env` and removes them from the program.
/// Only top-level definitions count; everything else stays, in order.
pub fn define_macros(program: &mut Program, env: &Rc<Environment>) {
    let statements = std::mem::replace(&mut program.statements, vec![]);
    for statement in statements {
        match statement {
            Statement::Let(s) => match s.value {
                Expression::Macro(m) => {
                    env.set(
                        &s.name.value,
                        Object::Macro(Macro {
                            params: m.params,
                            body: m.body,
                            env: env.clone(),
                        }),
                    );
                }
                value => program.statements.push(Statement::Let(LetStatement {
                    token: s.token,
                    name: s.name,
                    value,
                })),
            },
            other => program.statements.push(other),
        }
    }
}

/// Rewrites every macro call site in `program` with the macro's quoted
/// result.
///
/// A macro body must evaluate to a `Quote`; anything else is a defect in
/// the macro itself and panics.
pub fn expand_macros<W: Write>(
    program: Program,
    env: &Rc<Environment>,
    evaluator: &mut Evaluator<'_, W>,
) -> Program {
    let expanded = modify(Node::Program(program), &mut |node| {
        let (definition, call) = match macro_call(&node, env) {
            Some(found) => found,
            None => return node,
        };

        if call.arguments.len() != definition.params.len() {
            panic!(
                "macro expects {} arguments, got {}",
                definition.params.len(),
                call.arguments.len()
            );
        }

        // Arguments reach the macro as syntax, not values.
        let macro_env = Environment::enclosed(definition.env.clone());
        for (param, argument) in definition.params.iter().zip(&call.arguments) {
            macro_env.set(
                &param.value,
                Object::Quote(Box::new(Node::Expression(argument.clone()))),
            );
        }

        let body = Statement::Block(definition.body.clone());
        match evaluator.eval(&Node::Statement(body), &macro_env) {
            Object::Quote(node) => *node,
            other => panic!("macros must return a quoted node, got {}", other.type_name()),
        }
    });
    match expanded {
        Node::Program(program) => program,
        _ => unreachable!("the modifier keeps the root a program"),
    }
}

// A call counts as a macro call only if its callee is a plain identifier
// bound to a macro; no general evaluation happens here.
fn macro_call<'n>(node: &'n Node, env: &Rc<Environment>) -> Option<(Macro, &'n CallExpression)> {
    let call = match node {
        Node::Expression(Expression::Call(call)) => call,
        _ => return None,
    };
    let name = match call.function.as_ref() {
        Expression::Identifier(id) => &id.value,
        _ => return None,
    };
    match env.get(name) {
        Some(Object::Macro(definition)) => Some((definition, call)),
        _ => None,
    }
}
