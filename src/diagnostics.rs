use crate::{
    language::typecheck::{Diagnostic as CheckEntry, Log},
    Error as RunError,
};
use miette::{Diagnostic, Report};
use thiserror::Error;

/// One checker error, rendered as its own miette diagnostic.
#[derive(Debug, Error, Diagnostic, Clone)]
#[error("{message}")]
#[diagnostic(code(matrix::typecheck))]
pub struct CheckProblem {
    message: String,
}

impl CheckProblem {
    pub fn from_entry(entry: &CheckEntry) -> Self {
        Self {
            message: entry.to_string(),
        }
    }
}

/// A program the checker rejected. Every error in the log is attached as a
/// related diagnostic.
#[derive(Debug, Error, Diagnostic, Clone)]
#[error("type checking failed with {count} error(s)")]
#[diagnostic(code(matrix::rejected))]
pub struct CheckFailure {
    count: usize,
    #[related]
    problems: Vec<CheckProblem>,
    log: Log,
}

impl CheckFailure {
    pub fn from_log(log: Log) -> Self {
        let problems: Vec<_> = log.errors().map(CheckProblem::from_entry).collect();
        Self {
            count: problems.len(),
            problems,
            log,
        }
    }

    pub fn log(&self) -> &Log {
        &self.log
    }

    pub fn into_log(self) -> Log {
        self.log
    }
}

/// Report text for a library error: the full miette rendering for rejected
/// programs, a single line for runtime faults.
pub fn render_error(error: &RunError) -> String {
    match error {
        RunError::Check(failure) => format!("{:?}", Report::new(failure.clone())),
        RunError::Runtime(error) => format!("Runtime error: {error}"),
    }
}

pub fn emit_error(error: &RunError) {
    eprintln!("{}", render_error(error));
}
