//! Outcome journal and report rendering
//!
//! Every component taking part in a backup run owns a [`Journal`] recording
//! the parameters it was invoked with and the outcome of each observed
//! operation. At the end of a run the orchestrator asks each
//! [`Reportable`] for its block and joins them into the final report.
//!
//! ```rust
//! use sitebackup_core::report::{Journal, Outcome};
//!
//! let mut journal = Journal::new();
//! journal.record_parameter("EXECUTE", "dry", true);
//! let size: Result<u64, std::io::Error> = journal.observe("DUMP", Ok(42));
//!
//! assert_eq!(size.unwrap(), 42);
//! assert_eq!(journal.outcomes("DUMP").next(), Some(&Outcome::Success("42".into())));
//! ```

use crate::utils::format_kv;
use std::fmt;

/// Recorded result of one observed operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Operation completed; holds the rendered result
    Success(String),

    /// Operation failed
    Failure,
}

impl Outcome {
    /// True for a successful outcome
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Success(text) => f.write_str(text),
            Outcome::Failure => f.write_str("FAILED"),
        }
    }
}

/// Ordered record of parameters and outcomes of a single component
#[derive(Debug, Clone, Default)]
pub struct Journal {
    parameters: Vec<(String, String, String)>,
    results: Vec<(String, Outcome)>,
}

impl Journal {
    /// Create an empty journal
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the value a named parameter of an operation was called with
    pub fn record_parameter(&mut self, operation: &str, name: &str, value: impl fmt::Display) {
        self.parameters
            .push((operation.to_string(), name.to_string(), value.to_string()));
    }

    /// Record the outcome of an operation
    pub fn record(&mut self, operation: &str, outcome: Outcome) {
        self.results.push((operation.to_string(), outcome));
    }

    /// Record the rendered value on success or a failure, passing the result through
    pub fn observe<T: fmt::Display, E>(
        &mut self,
        operation: &str,
        result: Result<T, E>,
    ) -> Result<T, E> {
        let outcome = match &result {
            Ok(value) => Outcome::Success(value.to_string()),
            Err(_) => Outcome::Failure,
        };
        self.record(operation, outcome);
        result
    }

    /// Record plain success or failure, passing the result through
    pub fn check<T, E>(&mut self, operation: &str, result: Result<T, E>) -> Result<T, E> {
        let outcome = match &result {
            Ok(_) => Outcome::Success("OK".to_string()),
            Err(_) => Outcome::Failure,
        };
        self.record(operation, outcome);
        result
    }

    /// Outcomes recorded for one operation, oldest first
    pub fn outcomes<'a>(&'a self, operation: &'a str) -> impl Iterator<Item = &'a Outcome> + 'a {
        self.results
            .iter()
            .filter(move |(op, _)| op == operation)
            .map(|(_, outcome)| outcome)
    }

    /// True if any recorded operation failed
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|(_, outcome)| !outcome.is_success())
    }

    /// Render recorded parameters as `OPERATION(name): value` lines
    pub fn render_parameters(&self) -> String {
        let pairs: Vec<(String, &str)> = self
            .parameters
            .iter()
            .map(|(op, name, value)| (format!("{op}({name})"), value.as_str()))
            .collect();
        format_kv(None, &pairs)
    }

    /// Render recorded outcomes as `OPERATION: outcome` lines
    pub fn render_results(&self) -> String {
        let pairs: Vec<(&str, String)> = self
            .results
            .iter()
            .map(|(op, outcome)| (op.as_str(), outcome.to_string()))
            .collect();
        format_kv(None, &pairs)
    }
}

/// Component that contributes a block to the run report
pub trait Reportable {
    /// Title line followed by indented key/value lines describing the component
    fn summary(&self) -> String;

    /// Journal of the component
    fn journal(&self) -> &Journal;

    /// Summary, parameters and results, skipping empty sections
    fn report(&self) -> String {
        let journal = self.journal();
        [
            self.summary(),
            journal.render_parameters(),
            journal.render_results(),
        ]
        .into_iter()
        .filter(|section| !section.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
    }
}

/// Join the blocks of several components into one report
pub fn render_report<'a>(components: impl IntoIterator<Item = &'a dyn Reportable>) -> String {
    let blocks: Vec<String> = components.into_iter().map(|c| c.report()).collect();
    format!("{}\n\n", blocks.join("\n\n"))
}
