//! Core of a small matrix scripting language: a static shape and type
//! checker, a tree-walking interpreter, and the scope container both share.
//!
//! Parsing is left to the embedder. A parsed [`language::ast::Program`] is
//! checked first and only run when the check accepted it.

pub mod config;
pub mod diagnostics;
pub mod language;
pub mod runtime;
pub mod scope;

use crate::{
    config::Config,
    diagnostics::CheckFailure,
    language::{ast::Program, typecheck},
    runtime::{error::RuntimeError, Interpreter},
};
use miette::Diagnostic;
use std::io::Write;
use thiserror::Error;

pub use language::typecheck::{CheckOptions, Log};

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Check(#[from] CheckFailure),
    #[error(transparent)]
    #[diagnostic(code(matrix::runtime))]
    Runtime(#[from] RuntimeError),
}

/// Checks `program` with default options and runs it, writing output to `out`.
pub fn run<W: Write>(program: &Program, out: W) -> Result<Log, Error> {
    run_with_config(program, &Config::default(), out)
}

/// Returns the checker log of an accepted program once it has run to
/// completion.
pub fn run_with_config<W: Write>(program: &Program, config: &Config, out: W) -> Result<Log, Error> {
    let log = match typecheck::check_program_with_options(program, &config.typecheck).into_result() {
        Ok((_, log)) => log,
        Err(log) => return Err(CheckFailure::from_log(log).into()),
    };
    let mut interpreter = Interpreter::new(out);
    interpreter.run(program)?;
    Ok(log)
}
