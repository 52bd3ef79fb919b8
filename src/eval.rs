//! Tree-walking evaluator.
//!
//! Failures inside the language are not host errors: they are
//! `Object::Error` values, and every step that consumes an operand checks
//! for one and passes it along unchanged. The host-level escape hatches are
//! limited to what the language cannot express (an unwritable output for
//! `puts`).

use std::collections::HashMap;
use std::io::prelude::*;
use std::rc::Rc;

use crate::ast::{
    modify, BlockStatement, BooleanLiteral, CallExpression, Expression, HashLiteral,
    IntegerLiteral, Node, Program, Statement,
};
use crate::env::Environment;
use crate::object::{Builtin, Function, HashPair, Object};
use crate::token::{Token, TokenKind};

/// Walks the tree and produces objects.
///
/// The evaluator owns no language state (that lives in [`Environment`]); it
/// only borrows the writer `puts` prints to.
#[derive(Debug)]
pub struct Evaluator<'a, W: Write> {
    output: &'a mut W,
}

impl<'a, W: Write> Evaluator<'a, W> {
    pub fn new(output: &'a mut W) -> Evaluator<'a, W> {
        Evaluator { output }
    }

    pub fn eval(&mut self, node: &Node, env: &Rc<Environment>) -> Object {
        match node {
            Node::Program(program) => self.eval_program(program, env),
            Node::Statement(statement) => self.eval_statement(statement, env),
            Node::Expression(expression) => self.eval_expression(expression, env),
        }
    }

    pub fn eval_program(&mut self, program: &Program, env: &Rc<Environment>) -> Object {
        let mut result = Object::Null;
        for statement in &program.statements {
            match self.eval_statement(statement, env) {
                // A top-level return stops the program and sheds its wrapper.
                Object::Return(value) => return *value,
                Object::Error(message) => return Object::Error(message),
                other => result = other,
            }
        }
        result
    }

    // Unlike eval_program this keeps Return wrapped, so an inner block's
    // return travels up through every enclosing block before the call
    // boundary unwraps it.
    fn eval_block(&mut self, block: &BlockStatement, env: &Rc<Environment>) -> Object {
        let mut result = Object::Null;
        for statement in &block.statements {
            match self.eval_statement(statement, env) {
                Object::Return(value) => return Object::Return(value),
                Object::Error(message) => return Object::Error(message),
                other => result = other,
            }
        }
        result
    }

    fn eval_statement(&mut self, statement: &Statement, env: &Rc<Environment>) -> Object {
        match statement {
            Statement::Expression(s) => self.eval_expression(&s.expression, env),
            Statement::Let(s) => {
                let value = self.eval_expression(&s.value, env);
                if value.is_error() {
                    return value;
                }
                env.set(&s.name.value, value.clone());
                // A let evaluates to the value it bound.
                value
            }
            Statement::Return(s) => {
                let value = self.eval_expression(&s.value, env);
                if value.is_error() {
                    return value;
                }
                Object::Return(Box::new(value))
            }
            Statement::Block(s) => self.eval_block(s, env),
        }
    }

    fn eval_expression(&mut self, expression: &Expression, env: &Rc<Environment>) -> Object {
        match expression {
            Expression::Integer(n) => Object::Integer(n.value),
            Expression::Boolean(b) => Object::Boolean(b.value),
            Expression::Str(s) => Object::Str(s.value.clone()),
            Expression::Identifier(id) => match env.get(&id.value) {
                Some(value) => value,
                None => match Builtin::lookup(&id.value) {
                    Some(builtin) => Object::Builtin(builtin),
                    None => Object::Error(format!("identifier not found: {}", id.value)),
                },
            },
            Expression::Prefix(e) => {
                let right = self.eval_expression(&e.right, env);
                if right.is_error() {
                    return right;
                }
                eval_prefix(&e.operator, right)
            }
            Expression::Infix(e) => {
                let left = self.eval_expression(&e.left, env);
                if left.is_error() {
                    return left;
                }
                let right = self.eval_expression(&e.right, env);
                if right.is_error() {
                    return right;
                }
                eval_infix(&e.operator, left, right)
            }
            Expression::If(e) => {
                let condition = self.eval_expression(&e.condition, env);
                if condition.is_error() {
                    return condition;
                }
                if condition.is_truthy() {
                    self.eval_block(&e.consequence, env)
                } else if let Some(alternative) = &e.alternative {
                    self.eval_block(alternative, env)
                } else {
                    Object::Null
                }
            }
            Expression::Fn(e) => Object::Function(Function {
                params: e.params.clone(),
                body: e.body.clone(),
                env: env.clone(),
            }),
            Expression::Call(e) => self.eval_call(e, env),
            Expression::Array(e) => match self.eval_expressions(&e.elements, env) {
                Ok(elements) => Object::Array(elements),
                Err(error) => error,
            },
            Expression::Index(e) => {
                let left = self.eval_expression(&e.left, env);
                if left.is_error() {
                    return left;
                }
                let index = self.eval_expression(&e.index, env);
                if index.is_error() {
                    return index;
                }
                eval_index(left, index)
            }
            Expression::Hash(e) => self.eval_hash_literal(e, env),
            // Macro literals are removed by the expansion pre-pass; one that
            // survives into evaluation is inert.
            Expression::Macro(_) | Expression::Empty => Object::Null,
        }
    }

    fn eval_call(&mut self, call: &CallExpression, env: &Rc<Environment>) -> Object {
        // `quote` is a special form: its argument must reach it as syntax,
        // so it is recognized before anything is evaluated.
        if call.function.token_literal() == "quote" {
            return self.quote(&call.arguments, env);
        }
        let function = self.eval_expression(&call.function, env);
        if function.is_error() {
            return function;
        }
        let args = match self.eval_expressions(&call.arguments, env) {
            Ok(args) => args,
            Err(error) => return error,
        };
        self.apply_function(function, args)
    }

    /// Evaluates left to right; the first error aborts and becomes the
    /// result.
    fn eval_expressions(
        &mut self,
        expressions: &[Expression],
        env: &Rc<Environment>,
    ) -> Result<Vec<Object>, Object> {
        let mut results = Vec::with_capacity(expressions.len());
        for expression in expressions {
            let evaluated = self.eval_expression(expression, env);
            if evaluated.is_error() {
                return Err(evaluated);
            }
            results.push(evaluated);
        }
        Ok(results)
    }

    fn apply_function(&mut self, function: Object, args: Vec<Object>) -> Object {
        match function {
            Object::Function(function) => {
                if args.len() != function.params.len() {
                    return wrong_number_of_arguments(args.len(), function.params.len());
                }
                let call_env = Environment::enclosed(function.env.clone());
                for (param, arg) in function.params.iter().zip(args) {
                    call_env.set(&param.value, arg);
                }
                unwrap_return(self.eval_block(&function.body, &call_env))
            }
            Object::Builtin(builtin) => self.apply_builtin(builtin, args),
            other => Object::Error(format!("not a function: {}", other.type_name())),
        }
    }

    fn apply_builtin(&mut self, builtin: Builtin, args: Vec<Object>) -> Object {
        match builtin {
            Builtin::Len => {
                if args.len() != 1 {
                    return wrong_number_of_arguments(args.len(), 1);
                }
                match &args[0] {
                    Object::Str(s) => Object::Integer(s.len() as i64),
                    Object::Array(elements) => Object::Integer(elements.len() as i64),
                    other => Object::Error(format!(
                        "argument to `len` not supported, got {}",
                        other.type_name()
                    )),
                }
            }
            Builtin::First => match array_arg(builtin, args) {
                Ok(elements) => elements.first().cloned().unwrap_or(Object::Null),
                Err(error) => error,
            },
            Builtin::Last => match array_arg(builtin, args) {
                Ok(elements) => elements.last().cloned().unwrap_or(Object::Null),
                Err(error) => error,
            },
            Builtin::Rest => match array_arg(builtin, args) {
                Ok(elements) => {
                    if elements.is_empty() {
                        Object::Null
                    } else {
                        Object::Array(elements[1..].to_vec())
                    }
                }
                Err(error) => error,
            },
            Builtin::Push => {
                if args.len() != 2 {
                    return wrong_number_of_arguments(args.len(), 2);
                }
                let mut args = args.into_iter();
                match (args.next(), args.next()) {
                    (Some(Object::Array(mut elements)), Some(item)) => {
                        elements.push(item);
                        Object::Array(elements)
                    }
                    (Some(other), _) => Object::Error(format!(
                        "argument to `push` must be ARRAY, got {}",
                        other.type_name()
                    )),
                    _ => Object::Null,
                }
            }
            Builtin::Puts => {
                for arg in &args {
                    if let Err(e) = writeln!(self.output, "{}", arg) {
                        return Object::Error(format!("I/O error: {}", e));
                    }
                }
                Object::Null
            }
        }
    }

    fn eval_hash_literal(&mut self, hash: &HashLiteral, env: &Rc<Environment>) -> Object {
        let mut pairs = HashMap::new();
        for (key_expression, value_expression) in &hash.pairs {
            let key = self.eval_expression(key_expression, env);
            if key.is_error() {
                return key;
            }
            let hash_key = match key.hash_key() {
                Some(hash_key) => hash_key,
                None => {
                    return Object::Error(format!("unusable as hash key: {}", key.type_name()))
                }
            };
            let value = self.eval_expression(value_expression, env);
            if value.is_error() {
                return value;
            }
            pairs.insert(hash_key, HashPair { key, value });
        }
        Object::Hash(pairs)
    }

    fn quote(&mut self, args: &[Expression], env: &Rc<Environment>) -> Object {
        if args.len() != 1 {
            return Object::Error(format!("expected 1 argument to quote, got {}", args.len()));
        }
        let node = self.eval_unquote_calls(args[0].clone(), env);
        Object::Quote(Box::new(node))
    }

    // Replaces every `unquote(x)` inside the quoted tree with the syntactic
    // form of x's value. The recognition is purely by token literal, which
    // is why `unquote` must not be evaluated anywhere else.
    fn eval_unquote_calls(&mut self, quoted: Expression, env: &Rc<Environment>) -> Node {
        modify(Node::Expression(quoted), &mut |node| {
            let argument = match unquote_argument(&node) {
                Some(argument) => argument.clone(),
                None => return node,
            };
            let evaluated = self.eval_expression(&argument, env);
            object_to_ast(evaluated)
        })
    }
}

fn unquote_argument(node: &Node) -> Option<&Expression> {
    match node {
        Node::Expression(Expression::Call(call))
            if call.function.token_literal() == "unquote" && call.arguments.len() == 1 =>
        {
            Some(&call.arguments[0])
        }
        _ => None,
    }
}

/// Lifts an object back into syntax, for splicing into a quoted tree.
/// Objects with no syntactic form become the empty node.
fn object_to_ast(object: Object) -> Node {
    match object {
        Object::Integer(value) => Node::Expression(Expression::Integer(IntegerLiteral {
            token: Token::new(TokenKind::Int, value.to_string()),
            value,
        })),
        Object::Boolean(value) => {
            let token = if value {
                Token::new(TokenKind::True, "true")
            } else {
                Token::new(TokenKind::False, "false")
            };
            Node::Expression(Expression::Boolean(BooleanLiteral { token, value }))
        }
        Object::Quote(node) => *node,
        _ => Node::Expression(Expression::Empty),
    }
}

fn eval_prefix(operator: &str, right: Object) -> Object {
    match operator {
        "!" => eval_bang(right),
        "-" => eval_minus(right),
        _ => Object::Error(format!(
            "unknown operator: {}{}",
            operator,
            right.type_name()
        )),
    }
}

fn eval_bang(right: Object) -> Object {
    match right {
        Object::Boolean(b) => Object::Boolean(!b),
        Object::Null => Object::Null,
        _ => Object::Boolean(false),
    }
}

fn eval_minus(right: Object) -> Object {
    match right {
        Object::Integer(value) => Object::Integer(value.wrapping_neg()),
        other => Object::Error(format!("unknown operator: -{}", other.type_name())),
    }
}

fn eval_infix(operator: &str, left: Object, right: Object) -> Object {
    match (left, right) {
        (Object::Integer(l), Object::Integer(r)) => eval_integer_infix(operator, l, r),
        (Object::Str(l), Object::Str(r)) => eval_string_infix(operator, &l, &r),
        (left, right) => {
            // Identity comparison comes before the type check, so values of
            // different kinds compare unequal instead of erroring.
            if operator == "==" {
                return Object::Boolean(is_same_instance(&left, &right));
            }
            if operator == "!=" {
                return Object::Boolean(!is_same_instance(&left, &right));
            }
            if left.type_name() != right.type_name() {
                Object::Error(format!(
                    "type mismatch: {} {} {}",
                    left.type_name(),
                    operator,
                    right.type_name()
                ))
            } else {
                Object::Error(format!(
                    "unknown operator: {} {} {}",
                    left.type_name(),
                    operator,
                    right.type_name()
                ))
            }
        }
    }
}

// Booleans and null are the only kinds with canonical instances; any other
// pair of operands is never the same instance.
fn is_same_instance(left: &Object, right: &Object) -> bool {
    match (left, right) {
        (Object::Boolean(l), Object::Boolean(r)) => l == r,
        (Object::Null, Object::Null) => true,
        _ => false,
    }
}

fn eval_integer_infix(operator: &str, left: i64, right: i64) -> Object {
    match operator {
        // Arithmetic wraps on overflow.
        "+" => Object::Integer(left.wrapping_add(right)),
        "-" => Object::Integer(left.wrapping_sub(right)),
        "*" => Object::Integer(left.wrapping_mul(right)),
        "/" => {
            if right == 0 {
                Object::Error("division by zero".to_string())
            } else {
                Object::Integer(left.wrapping_div(right))
            }
        }
        "<" => Object::Boolean(left < right),
        ">" => Object::Boolean(left > right),
        "==" => Object::Boolean(left == right),
        "!=" => Object::Boolean(left != right),
        _ => Object::Error(format!("unknown operator: INTEGER {} INTEGER", operator)),
    }
}

fn eval_string_infix(operator: &str, left: &str, right: &str) -> Object {
    match operator {
        "+" => Object::Str(format!("{}{}", left, right)),
        _ => Object::Error(format!("unknown operator: STRING {} STRING", operator)),
    }
}

fn eval_index(left: Object, index: Object) -> Object {
    match (left, index) {
        (Object::Array(elements), Object::Integer(i)) => {
            if i < 0 {
                Object::Null
            } else {
                elements.get(i as usize).cloned().unwrap_or(Object::Null)
            }
        }
        (Object::Hash(pairs), index) => match index.hash_key() {
            Some(key) => pairs
                .get(&key)
                .map(|pair| pair.value.clone())
                .unwrap_or(Object::Null),
            None => Object::Error(format!("unusable as hash key: {}", index.type_name())),
        },
        (left, _) => Object::Error(format!(
            "index operator not supported: {}",
            left.type_name()
        )),
    }
}

fn unwrap_return(object: Object) -> Object {
    match object {
        Object::Return(value) => *value,
        other => other,
    }
}

fn wrong_number_of_arguments(got: usize, want: usize) -> Object {
    Object::Error(format!(
        "wrong number of arguments. got={}, want={}",
        got, want
    ))
}

fn array_arg(builtin: Builtin, args: Vec<Object>) -> Result<Vec<Object>, Object> {
    if args.len() != 1 {
        return Err(wrong_number_of_arguments(args.len(), 1));
    }
    match args.into_iter().next() {
        Some(Object::Array(elements)) => Ok(elements),
        Some(other) => Err(Object::Error(format!(
            "argument to `{}` must be ARRAY, got {}",
            builtin.name(),
            other.type_name()
        ))),
        None => Ok(vec![]),
    }
}
