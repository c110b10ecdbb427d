//! Error types for ingestion and analysis.
//!
//! Row-level problems are [`ValidationError`]s and never abort a load; the
//! gateway records them in the load report. [`GatewayError`] is reserved for
//! a source that cannot be read at all. [`AnalysisError`] covers everything
//! the engine and strategies can refuse to compute.

use chrono::NaiveDate;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A single violated constraint on a raw row.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Violation {
    #[error("missing required `date` value")]
    MissingPeriod,

    #[error("unparsable `date` value '{0}'")]
    UnparsablePeriod(String),

    #[error("period {0} is outside 2000-01-01..=2030-12-31")]
    PeriodOutOfRange(NaiveDate),

    #[error("`wgt` column is present but empty")]
    MissingWeight,

    #[error("unparsable `wgt` value '{0}'")]
    UnparsableWeight(String),

    #[error("survey weight must be > 0, got {0}")]
    NonPositiveWeight(f64),

    #[error("unparsable value '{value}' in column `{column}`")]
    UnparsableField { column: String, value: String },
}

/// Every constraint a raw row violated, in the order they were checked.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    violations: Vec<Violation>,
}

impl ValidationError {
    pub fn new(violations: Vec<Violation>) -> Self {
        Self { violations }
    }

    pub fn violations(&self) -> &[Violation] {
        &self.violations
    }

    /// Human-readable reasons, one per violation.
    pub fn reasons(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid row: {}", self.reasons().join("; "))
    }
}

impl std::error::Error for ValidationError {}

/// Errors surfaced by filters, strategies and the engine.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalysisError {
    #[error("invalid date range: start {start} is after end {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    #[error("{parameter} {value} is out of range")]
    Range { parameter: &'static str, value: f64 },

    #[error("insufficient data for {strategy}: need at least {needed} value(s), found {found}")]
    InsufficientData {
        strategy: &'static str,
        needed: usize,
        found: usize,
    },

    #[error("unknown strategy '{0}'")]
    UnknownStrategy(String),

    #[error("unknown field '{0}'")]
    UnknownField(String),

    #[error("{strategy} needs a field to aggregate")]
    MissingField { strategy: &'static str },

    #[error("{strategy} overflowed: the result is not a finite number")]
    NonFiniteResult { strategy: &'static str },
}

/// Fatal load failures. Individual bad rows never produce one of these.
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to read CSV headers from '{path}': {source}")]
    Header {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("validation worker failed: {0}")]
    Worker(#[from] tokio::task::JoinError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_lists_every_reason() {
        let err = ValidationError::new(vec![
            Violation::MissingPeriod,
            Violation::NonPositiveWeight(-1.0),
        ]);

        assert_eq!(err.violations().len(), 2);
        let msg = err.to_string();
        assert!(msg.contains("date"));
        assert!(msg.contains("-1"));
    }
}
