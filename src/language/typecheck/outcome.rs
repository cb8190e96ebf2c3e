//! Check results that keep every diagnostic produced along the way.
//!
//! A [`Checked`] is either a success carrying a value or a failure, and both
//! carry a [`Log`]. The `bind*` combinators only run their continuation when
//! all inputs succeeded, but they always concatenate the logs of every input,
//! so independent sibling failures all reach the final report.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Severity {
    Error,
    Info,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: Option<usize>,
    pub component: &'static str,
    pub message: String,
    pub severity: Severity,
}

impl Diagnostic {
    pub const CHECKER: &'static str = "TypeChecker";

    pub fn error(line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            line,
            component: Self::CHECKER,
            message: message.into(),
            severity: Severity::Error,
        }
    }

    pub fn info(line: Option<usize>, message: impl Into<String>) -> Self {
        Self {
            line,
            component: Self::CHECKER,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "{line}: {}: {}", self.component, self.message),
            None => write!(f, "?: {}: {}", self.component, self.message),
        }
    }
}

/// Ordered, append-only record of diagnostics.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Log {
    entries: Vec<Diagnostic>,
}

impl Log {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(diagnostic: Diagnostic) -> Self {
        Self {
            entries: vec![diagnostic],
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn append(&mut self, mut other: Log) {
        self.entries.append(&mut other.entries);
    }

    pub fn concat(mut self, other: Log) -> Log {
        self.append(other);
        self
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|entry| entry.is_error())
    }

    pub fn into_entries(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl From<Diagnostic> for Log {
    fn from(diagnostic: Diagnostic) -> Self {
        Log::single(diagnostic)
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, entry) in self.entries.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Checked<T> {
    Ok { value: T, log: Log },
    Err { log: Log },
}

impl<T> Checked<T> {
    pub fn ok(value: T) -> Self {
        Checked::Ok {
            value,
            log: Log::new(),
        }
    }

    pub fn ok_with(value: T, log: Log) -> Self {
        Checked::Ok { value, log }
    }

    pub fn fail(diagnostic: Diagnostic) -> Self {
        Checked::Err {
            log: Log::single(diagnostic),
        }
    }

    pub fn fail_with(log: Log) -> Self {
        Checked::Err { log }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Checked::Ok { .. })
    }

    pub fn is_err(&self) -> bool {
        !self.is_ok()
    }

    pub fn log(&self) -> &Log {
        match self {
            Checked::Ok { log, .. } | Checked::Err { log } => log,
        }
    }

    pub fn value(&self) -> Option<&T> {
        match self {
            Checked::Ok { value, .. } => Some(value),
            Checked::Err { .. } => None,
        }
    }

    pub fn into_result(self) -> Result<(T, Log), Log> {
        match self {
            Checked::Ok { value, log } => Ok((value, log)),
            Checked::Err { log } => Err(log),
        }
    }

    fn split(self) -> (Option<T>, Log) {
        match self {
            Checked::Ok { value, log } => (Some(value), log),
            Checked::Err { log } => (None, log),
        }
    }

    /// Puts `earlier` in front of this result's log.
    pub fn after(self, earlier: Log) -> Self {
        match self {
            Checked::Ok { value, log } => Checked::Ok {
                value,
                log: earlier.concat(log),
            },
            Checked::Err { log } => Checked::Err {
                log: earlier.concat(log),
            },
        }
    }

    /// Appends `diagnostic` only when this result is a failure.
    pub fn or_note(self, diagnostic: Diagnostic) -> Self {
        match self {
            Checked::Err { mut log } => {
                log.push(diagnostic);
                Checked::Err { log }
            }
            ok => ok,
        }
    }
}

pub fn bind<A, R>(input: Checked<A>, f: impl FnOnce(A) -> Checked<R>) -> Checked<R> {
    match input {
        Checked::Ok { value, log } => f(value).after(log),
        Checked::Err { log } => Checked::Err { log },
    }
}

pub fn bind2<A, B, R>(
    first: Checked<A>,
    second: Checked<B>,
    f: impl FnOnce(A, B) -> Checked<R>,
) -> Checked<R> {
    let (a, log_a) = first.split();
    let (b, log_b) = second.split();
    let log = log_a.concat(log_b);
    match (a, b) {
        (Some(a), Some(b)) => f(a, b).after(log),
        _ => Checked::Err { log },
    }
}

pub fn bind3<A, B, C, R>(
    first: Checked<A>,
    second: Checked<B>,
    third: Checked<C>,
    f: impl FnOnce(A, B, C) -> Checked<R>,
) -> Checked<R> {
    let (a, log_a) = first.split();
    let (b, log_b) = second.split();
    let (c, log_c) = third.split();
    let log = log_a.concat(log_b).concat(log_c);
    match (a, b, c) {
        (Some(a), Some(b), Some(c)) => f(a, b, c).after(log),
        _ => Checked::Err { log },
    }
}

pub fn bind4<A, B, C, D, R>(
    first: Checked<A>,
    second: Checked<B>,
    third: Checked<C>,
    fourth: Checked<D>,
    f: impl FnOnce(A, B, C, D) -> Checked<R>,
) -> Checked<R> {
    let (a, log_a) = first.split();
    let (b, log_b) = second.split();
    let (c, log_c) = third.split();
    let (d, log_d) = fourth.split();
    let log = log_a.concat(log_b).concat(log_c).concat(log_d);
    match (a, b, c, d) {
        (Some(a), Some(b), Some(c), Some(d)) => f(a, b, c, d).after(log),
        _ => Checked::Err { log },
    }
}

/// Left fold of independently computed results with [`bind2`]. Every
/// element's log survives even after an earlier element failed.
pub fn fold_siblings<T>(
    results: Vec<Checked<T>>,
    mut combine: impl FnMut(T, T) -> Checked<T>,
    empty: Checked<T>,
) -> Checked<T> {
    let mut results = results.into_iter();
    let Some(mut acc) = results.next() else {
        return empty;
    };
    for next in results {
        acc = bind2(acc, next, &mut combine);
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(line: usize, message: &str) -> Checked<i32> {
        Checked::fail(Diagnostic::error(Some(line), message))
    }

    fn messages(log: &Log) -> Vec<String> {
        log.entries().iter().map(|d| d.message.clone()).collect()
    }

    #[test]
    fn bind_prefixes_the_input_log() {
        let input = Checked::ok_with(2, Log::single(Diagnostic::info(Some(1), "first")));
        let result = bind(input, |v| {
            Checked::ok_with(v * 10, Log::single(Diagnostic::info(Some(1), "second")))
        });
        assert_eq!(result.value(), Some(&20));
        assert_eq!(messages(result.log()), ["first", "second"]);
    }

    #[test]
    fn bind_skips_continuation_on_failure() {
        let result = bind(err(3, "broken"), |_| -> Checked<i32> {
            panic!("continuation must not run")
        });
        assert!(result.is_err());
        assert_eq!(messages(result.log()), ["broken"]);
    }

    #[test]
    fn bind2_keeps_both_failure_logs() {
        let result = bind2(err(1, "left"), err(2, "right"), |a, b| Checked::ok(a + b));
        assert!(result.is_err());
        assert_eq!(messages(result.log()), ["left", "right"]);
    }

    #[test]
    fn bind4_orders_logs_by_argument_position() {
        let result = bind4(
            Checked::ok(1),
            err(2, "second"),
            Checked::ok(3),
            err(4, "fourth"),
            |_, _, _, _| Checked::ok(0),
        );
        assert_eq!(messages(result.log()), ["second", "fourth"]);
    }

    #[test]
    fn or_note_only_touches_failures() {
        let ok = Checked::ok(1).or_note(Diagnostic::error(None, "ignored"));
        assert!(ok.log().is_empty());
        let failed = err(1, "inner").or_note(Diagnostic::error(None, "outer"));
        assert_eq!(messages(failed.log()), ["inner", "outer"]);
    }

    #[test]
    fn fold_reports_every_failing_sibling() {
        let results = vec![Checked::ok(1), err(2, "a"), Checked::ok(3), err(4, "b")];
        let folded = fold_siblings(results, |a, _| Checked::ok(a), Checked::ok(0));
        assert!(folded.is_err());
        assert_eq!(messages(folded.log()), ["a", "b"]);
    }

    #[test]
    fn fold_of_nothing_is_the_empty_case() {
        let folded = fold_siblings(Vec::new(), |a: i32, _| Checked::ok(a), Checked::ok(42));
        assert_eq!(folded.value(), Some(&42));
    }

    #[test]
    fn log_display_joins_lines() {
        let mut log = Log::new();
        log.push(Diagnostic::error(Some(4), "no such symbol as x"));
        log.push(Diagnostic::error(None, "empty"));
        assert_eq!(
            log.to_string(),
            "4: TypeChecker: no such symbol as x\n?: TypeChecker: empty"
        );
    }
}
