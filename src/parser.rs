//! Cell-level parsers for raw CES values.
//!
//! Each helper maps one raw CSV cell to a typed value or a [`Violation`].
//! Empty cells and non-response tokens are treated as absent, never as zero.

use chrono::NaiveDate;

use crate::error::Violation;

/// Tokens respondents' files use to mark a non-response.
const ABSENT_TOKENS: [&str; 3] = ["none", "na", "n/a"];

/// Date formats accepted for the period column, tried in order.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];

/// Returns `true` when a raw cell carries no answer.
pub fn is_absent(raw: &str) -> bool {
    let raw = raw.trim();
    raw.is_empty() || ABSENT_TOKENS.iter().any(|t| raw.eq_ignore_ascii_case(t))
}

/// Parses the survey period.
///
/// Besides the full-date formats, a bare `YYYY-MM` is read as the first day
/// of that month, which is how monthly CES waves are often labelled.
pub fn parse_period(raw: Option<&str>) -> Result<NaiveDate, Violation> {
    let raw = match raw {
        Some(r) if !is_absent(r) => r.trim(),
        _ => return Err(Violation::MissingPeriod),
    };

    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(raw, fmt) {
            return Ok(d);
        }
    }

    NaiveDate::parse_from_str(&format!("{raw}-01"), "%Y-%m-%d")
        .map_err(|_| Violation::UnparsablePeriod(raw.to_string()))
}

/// Parses the survey weight.
///
/// `None` means the file has no weight column at all, which makes it an
/// unweighted file and every row gets weight 1. A column that exists but is
/// empty on this row is a violation.
pub fn parse_weight(raw: Option<&str>) -> Result<f64, Violation> {
    let Some(raw) = raw else { return Ok(1.0) };
    if is_absent(raw) {
        return Err(Violation::MissingWeight);
    }

    let raw = raw.trim();
    let w = raw
        .parse::<f64>()
        .ok()
        .filter(|w| w.is_finite())
        .ok_or_else(|| Violation::UnparsableWeight(raw.to_string()))?;

    if w <= 0.0 {
        return Err(Violation::NonPositiveWeight(w));
    }
    Ok(w)
}

/// Parses an optional real-valued cell.
pub fn parse_optional_f64(column: &str, raw: Option<&str>) -> Result<Option<f64>, Violation> {
    let raw = match raw {
        Some(r) if !is_absent(r) => r.trim(),
        _ => return Ok(None),
    };

    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(Violation::UnparsableField {
            column: column.to_string(),
            value: raw.to_string(),
        }),
    }
}

/// Parses an optional categorical code, rounding to the nearest integer.
///
/// Exports frequently write integer codes as `2.0`.
pub fn parse_optional_code(column: &str, raw: Option<&str>) -> Result<Option<i64>, Violation> {
    Ok(parse_optional_f64(column, raw)?.map(|v| v.round() as i64))
}

/// Parses an optional free-text cell.
pub fn parse_optional_text(raw: Option<&str>) -> Option<String> {
    raw.filter(|r| !is_absent(r)).map(|r| r.trim().to_string())
}
