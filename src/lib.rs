//! A tree-walking interpreter for a small, dynamically-typed scripting
//! language in the Monkey tradition.
//!
//! Source text is tokenized, parsed into an abstract syntax tree by a Pratt
//! parser, rewritten by user-defined macros, and evaluated. Functions are
//! first class and close over their defining scope; `quote`/`unquote`
//! expose syntax to macros as a value.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - Integers are 64-bit and wrap on overflow.
//! - String literals have no escape sequences.
//! - Parse errors are textual only; there are no source positions.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod interpreter;

mod ast;
mod env;
mod eval;
mod lexer;
mod macro_expansion;
mod object;
mod parser;
mod reader;
mod token;
