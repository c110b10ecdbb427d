//! Rendering of load reports and analysis results for the CLI.
//!
//! Supports Debug pretty-printing and JSON on stdout.

use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use tracing::debug;

/// Renders any serializable value as a JSON string.
pub fn to_json<T: Serialize>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

/// Writes `value` as JSON, one document per line unless `pretty`.
pub fn write_json<T: Serialize, W: Write>(writer: &mut W, value: &T, pretty: bool) -> Result<()> {
    writeln!(writer, "{}", to_json(value, pretty)?)?;
    Ok(())
}

/// Prints `value` as JSON on stdout.
pub fn print_json<T: Serialize + std::fmt::Debug>(value: &T, pretty: bool) -> Result<()> {
    debug!("{:#?}", value);
    write_json(&mut std::io::stdout().lock(), value, pretty)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::{AnalysisResult, StrategyKind};
    use crate::gateway::{LoadReport, RowError};

    #[test]
    fn test_load_report_json() {
        let report = LoadReport {
            rows_read: 3,
            valid: 2,
            invalid: 1,
            rejected: vec![RowError {
                line: 4,
                reasons: vec!["survey weight must be > 0, got -1".to_string()],
            }],
        };

        let json = to_json(&report, false).unwrap();
        assert!(json.contains("\"invalid\":1"));
        assert!(json.contains("\"line\":4"));
    }

    #[test]
    fn test_write_json_compact_is_one_line() {
        let result = AnalysisResult::WeightedMean {
            field: "labor.job_loss_prob".to_string(),
            value: 12.5,
        };

        let mut buf = Vec::new();
        write_json(&mut buf, &result, false).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert_eq!(text.lines().count(), 1);
        assert!(text.contains(StrategyKind::WeightedMean.name()));
    }

    #[test]
    fn test_pretty_json_spans_lines() {
        let json = to_json(&LoadReport::default(), true).unwrap();
        assert!(json.lines().count() > 1);
    }
}
