use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;
use tracing::debug;

use crate::analyzers::aggregate::{compute, generic_mean};
use crate::analyzers::types::{AnalysisResult, StrategyKind, StrategyParams};
use crate::error::AnalysisError;
use crate::filters::{Filter, apply_filters};
use crate::model::{Field, Observation};

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// Stateless orchestrator: resolves a strategy and field, filters, dispatches.
///
/// Holds no state between calls, so identical arguments over the same
/// dataset always give identical results.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnalyticsEngine;

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Runs `strategy_name` over `field` of the observations passing `filters`.
    ///
    /// The strategy name is resolved before anything else, so an unknown
    /// name fails without touching `data`. `field` is ignored by
    /// `demographics_quality`.
    pub fn run(
        &self,
        data: &[Observation],
        strategy_name: &str,
        field: &str,
        filters: &[Filter],
        params: &StrategyParams,
    ) -> Result<AnalysisResult, AnalysisError> {
        let kind: StrategyKind = strategy_name.parse()?;
        let field = if kind.needs_field() {
            Some(resolve_field(field)?)
        } else {
            None
        };

        let selected = apply_filters(data, filters)?;
        debug!(
            strategy = %kind,
            field = ?field.map(|f| f.path()),
            total = data.len(),
            selected = selected.len(),
            "Running strategy"
        );

        compute(kind, &selected, field, params)
    }

    /// Sorted distinct survey years in `data`.
    pub fn available_years(&self, data: &[Observation]) -> Vec<i32> {
        let mut years: Vec<i32> = data.iter().map(|o| o.period().year()).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    /// Mean of `field` per survey year. Years where nobody answered are left
    /// out rather than reported as zero.
    pub fn yearly_report(
        &self,
        data: &[Observation],
        field: &str,
    ) -> Result<BTreeMap<i32, f64>, AnalysisError> {
        let field = resolve_field(field)?;
        let mut groups: BTreeMap<i32, Vec<&Observation>> = BTreeMap::new();
        for obs in data {
            groups.entry(obs.period().year()).or_default().push(obs);
        }

        Ok(groups
            .into_iter()
            .filter_map(|(year, group)| generic_mean(&group, field).ok().map(|m| (year, m)))
            .collect())
    }

    /// Mean of `field` per survey period, in period order. Periods without
    /// any answer are skipped.
    pub fn time_series(
        &self,
        data: &[Observation],
        field: &str,
    ) -> Result<Vec<(NaiveDate, f64)>, AnalysisError> {
        let field = resolve_field(field)?;
        let mut groups: BTreeMap<NaiveDate, Vec<&Observation>> = BTreeMap::new();
        for obs in data {
            groups.entry(obs.period()).or_default().push(obs);
        }

        Ok(groups
            .into_iter()
            .filter_map(|(period, group)| generic_mean(&group, field).ok().map(|m| (period, m)))
            .collect())
    }

    /// First observation whose period falls in the month named by `query`.
    ///
    /// Accepts `2023-03`, `03-2023`, `March 2023` or `mar 2023`.
    pub fn find_by_month<'a>(
        &self,
        data: &'a [Observation],
        query: &str,
    ) -> Option<&'a Observation> {
        let (year, month) = parse_month_query(query)?;
        data.iter()
            .find(|o| o.period().year() == year && o.period().month() == month)
    }
}

fn resolve_field(selector: &str) -> Result<&'static Field, AnalysisError> {
    Field::resolve(selector).ok_or_else(|| AnalysisError::UnknownField(selector.to_string()))
}

fn parse_month_query(query: &str) -> Option<(i32, u32)> {
    let query = query.trim().to_lowercase();

    if let Some((a, b)) = query.split_once(['-', '/']) {
        if let (Ok(a), Ok(b)) = (a.trim().parse::<u32>(), b.trim().parse::<u32>()) {
            let (year, month) = if a > 12 { (a, b) } else { (b, a) };
            return (1..=12).contains(&month).then_some((year as i32, month));
        }
    }

    let mut year = None;
    let mut month = None;
    for token in query.split(|c: char| c.is_whitespace() || c == ',') {
        if let Ok(y) = token.parse::<i32>() {
            year = Some(y);
        } else if token.len() >= 3 {
            if let Some(idx) = MONTHS.iter().position(|m| token.starts_with(m)) {
                month = Some(idx as u32 + 1);
            }
        }
    }
    Some((year?, month?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::observation::testing::observation;

    fn dataset() -> Vec<Observation> {
        vec![
            observation(0, "2022-01-01", "1", &[("c4030", "2.0"), ("c1010", "1")]),
            observation(1, "2022-01-01", "3", &[("c4030", "4.0"), ("c1010", "2")]),
            observation(2, "2023-03-01", "1", &[("c4030", "6.0"), ("c1010", "1")]),
            observation(3, "2024-07-01", "1", &[("c1150_1", "1.0")]),
        ]
    }

    #[test]
    fn test_run_generic_mean() {
        let data = dataset();
        let result = AnalyticsEngine::new()
            .run(&data, "generic_mean", "inflation", &[], &StrategyParams::default())
            .unwrap();
        assert_eq!(result.value(), 4.0);
    }

    #[test]
    fn test_run_applies_filters_in_order() {
        let data = dataset();
        let filters = [
            Filter::years(2022, 2022).unwrap(),
            Filter::demographic(crate::model::DemographicAttribute::Gender, ["2"]),
        ];
        let result = AnalyticsEngine::new()
            .run(&data, "weighted_mean", "c4030", &filters, &StrategyParams::default())
            .unwrap();
        assert_eq!(result.value(), 4.0);
    }

    #[test]
    fn test_unknown_strategy_fails_before_anything_else() {
        // Even with a bad field and an inverted range, the strategy name wins.
        let filter = Filter::DateRange {
            start: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
        };
        let err = AnalyticsEngine::new()
            .run(&dataset(), "unknown_strategy", "nope", &[filter], &StrategyParams::default())
            .unwrap_err();
        assert_eq!(err, AnalysisError::UnknownStrategy("unknown_strategy".to_string()));
    }

    #[test]
    fn test_unknown_field() {
        let err = AnalyticsEngine::new()
            .run(&dataset(), "generic_mean", "shoe_size", &[], &StrategyParams::default())
            .unwrap_err();
        assert_eq!(err, AnalysisError::UnknownField("shoe_size".to_string()));
    }

    #[test]
    fn test_quality_ignores_field() {
        let result = AnalyticsEngine::new()
            .run(&[], "demographics_quality", "", &[], &StrategyParams::default())
            .unwrap();
        assert_eq!(result.value(), 0.0);
    }

    #[test]
    fn test_run_is_idempotent() {
        let data = dataset();
        let engine = AnalyticsEngine::new();
        let params = StrategyParams::with_percentile_rank(25.0);
        let first = engine.run(&data, "percentile", "inflation", &[], &params).unwrap();
        let second = engine.run(&data, "percentile", "inflation", &[], &params).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_available_years() {
        assert_eq!(AnalyticsEngine::new().available_years(&dataset()), vec![2022, 2023, 2024]);
    }

    #[test]
    fn test_yearly_report_skips_unanswered_years() {
        let report = AnalyticsEngine::new().yearly_report(&dataset(), "inflation").unwrap();
        assert_eq!(report.len(), 2);
        assert_eq!(report[&2022], 3.0);
        assert_eq!(report[&2023], 6.0);
        assert!(!report.contains_key(&2024));
    }

    #[test]
    fn test_time_series() {
        let series = AnalyticsEngine::new().time_series(&dataset(), "macro.inflation_1y").unwrap();
        let dates: Vec<String> = series
            .iter()
            .map(|(d, _)| d.format("%Y-%m").to_string())
            .collect();
        assert_eq!(dates, vec!["2022-01", "2023-03"]);
        assert_eq!(series[0].1, 3.0);
    }

    #[test]
    fn test_find_by_month_formats() {
        let data = dataset();
        let engine = AnalyticsEngine::new();
        for query in ["2023-03", "03-2023", "March 2023", "mar 2023"] {
            assert_eq!(engine.find_by_month(&data, query).map(|o| o.id()), Some(2), "{query}");
        }
        assert!(engine.find_by_month(&data, "2019-05").is_none());
        assert!(engine.find_by_month(&data, "someday").is_none());
    }
}
