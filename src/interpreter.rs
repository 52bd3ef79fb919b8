//! API to control the interpreter.

use std::error::Error;
use std::fmt;
use std::io::prelude::*;
use std::rc::Rc;

use crate::env::Environment;
use crate::eval::Evaluator;
use crate::macro_expansion::{define_macros, expand_macros};
use crate::object::Object;
use crate::parser::Parser;

/// Tree-walk interpreter with a persistent environment.
///
/// # Example
///
/// Definitions persist between invocations, so a function can be defined
/// first and called later:
///
/// ```
/// # use monkey::interpreter::{Interpreter, MonkeyError};
/// let mut output: Vec<u8> = Vec::new();
/// let mut interp = Interpreter::new(&mut output);
///
/// interp.eval("let max = fn(x, y) { if (x > y) { x } else { y } };".as_bytes())?;
/// let result = interp.eval("max(10, 20);".as_bytes())?;
///
/// assert_eq!(result, Some("20".to_string()));
/// # Ok::<(), MonkeyError>(())
/// ```
#[derive(Debug)]
pub struct Interpreter<'t, W: Write> {
    env: Rc<Environment>,
    macro_env: Rc<Environment>,
    evaluator: Evaluator<'t, W>,
}

/// Errors the interpreter can raise.
///
/// Runtime failures carry the message of the error value the program
/// produced; their `Display` form is the value's inspect form
/// (`ERROR: <message>`).
#[derive(Debug)]
pub enum MonkeyError {
    /// The input was rejected; the messages are in source order and
    /// evaluation was skipped.
    Parse(Vec<String>),

    /// Evaluation halted on an error value.
    Runtime(String),
}

impl fmt::Display for MonkeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonkeyError::Parse(errors) => {
                write!(f, "parse errors:")?;
                for error in errors {
                    write!(f, "\n\t{}", error)?;
                }
                Ok(())
            }
            MonkeyError::Runtime(message) => write!(f, "ERROR: {}", message),
        }
    }
}

impl Error for MonkeyError {}

impl<'t, W: Write> Interpreter<'t, W> {
    /// Creates an interpreter whose `puts` builtin prints to `output`.
    pub fn new(output: &'t mut W) -> Interpreter<'t, W> {
        Interpreter {
            env: Environment::new(),
            macro_env: Environment::new(),
            evaluator: Evaluator::new(output),
        }
    }

    /// Runs `input` through the whole pipeline: lex, parse, macro
    /// expansion, evaluation.
    ///
    /// Returns the inspect form of the final value, or `None` when the
    /// input contained no statements (counting removed macro definitions).
    pub fn eval<R: BufRead>(&mut self, input: R) -> Result<Option<String>, MonkeyError> {
        let mut parser = Parser::new(input);
        let mut program = parser.parse_program();
        if !parser.errors().is_empty() {
            return Err(MonkeyError::Parse(parser.errors().to_vec()));
        }

        define_macros(&mut program, &self.macro_env);
        let program = expand_macros(program, &self.macro_env, &mut self.evaluator);
        if program.statements.is_empty() {
            return Ok(None);
        }

        match self.evaluator.eval_program(&program, &self.env) {
            Object::Error(message) => Err(MonkeyError::Runtime(message)),
            object => Ok(Some(object.to_string())),
        }
    }
}
