//! Interpreter command-line.
//!
//! With no arguments it starts an interactive read-evaluate-print loop.
//! With file arguments it runs every file in one shared session, so later
//! files see the definitions of earlier ones.

use std::env;
use std::fs;
use std::io;
use std::io::prelude::*;

use anyhow::Context;

use monkey::interpreter::{Interpreter, MonkeyError};

const PROMPT: &str = ">> ";

fn main() -> anyhow::Result<()> {
    let paths: Vec<String> = env::args().skip(1).collect();
    if paths.is_empty() {
        return repl();
    }

    let mut interp_out = io::stdout();
    let mut interp = Interpreter::new(&mut interp_out);
    for path in &paths {
        let source =
            fs::read_to_string(path).with_context(|| format!("cannot read {}", path))?;
        interp
            .eval(source.as_bytes())
            .with_context(|| format!("while running {}", path))?;
    }
    Ok(())
}

fn repl() -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut prompt_out = io::stdout();

    // The interpreter keeps its writer for the whole session (`puts` prints
    // through it); prompts and results go through a second handle.
    let mut interp_out = io::stdout();
    let mut interp = Interpreter::new(&mut interp_out);

    write!(prompt_out, "{}", PROMPT)?;
    prompt_out.flush()?;
    for line in stdin.lock().lines() {
        report(interp.eval(line?.as_bytes()));
        write!(prompt_out, "{}", PROMPT)?;
        prompt_out.flush()?;
    }
    Ok(())
}

fn report(outcome: Result<Option<String>, MonkeyError>) {
    match outcome {
        Ok(Some(value)) => println!("{}", value),
        Ok(None) => (),
        Err(MonkeyError::Parse(errors)) => {
            for error in errors {
                println!("\t{}", error);
            }
        }
        Err(error) => println!("{}", error),
    }
}
