//! Static shape and type checking.
//!
//! The checker walks a [`Program`](crate::language::ast::Program) before it is
//! run and infers an element type and shape for every expression. Problems do
//! not stop the walk: every failing construct adds to the diagnostic log and
//! its siblings are still checked, so one run reports everything it can find.

mod checker;
pub mod outcome;

pub use crate::config::CheckOptions;
pub use checker::{check_program, check_program_with_options, Checker};
pub use outcome::{Checked, Diagnostic, Log, Severity};
