//! Filter predicates over loaded observations.
//!
//! Filters are applied in the order given and compose by intersection. An
//! empty filter list returns every observation in its original order.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::error::AnalysisError;
use crate::model::{DemographicAttribute, EmploymentStatus, Observation};

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Inclusive period range.
    DateRange { start: NaiveDate, end: NaiveDate },
    /// Keep observations whose attribute value is one of `accepted`.
    ///
    /// Values compare in normalized form: integer codes as integers, text
    /// lowercased.
    Demographic {
        attribute: DemographicAttribute,
        accepted: BTreeSet<String>,
    },
    EmploymentStatus(BTreeSet<EmploymentStatus>),
}

impl Filter {
    /// Inclusive date range; fails when `start > end`.
    pub fn date_range(start: NaiveDate, end: NaiveDate) -> Result<Self, AnalysisError> {
        let filter = Filter::DateRange { start, end };
        filter.check()?;
        Ok(filter)
    }

    /// Every period from January 1st of `start_year` to December 31st of
    /// `end_year`.
    pub fn years(start_year: i32, end_year: i32) -> Result<Self, AnalysisError> {
        let start = NaiveDate::from_ymd_opt(start_year, 1, 1);
        let end = NaiveDate::from_ymd_opt(end_year, 12, 31);
        match (start, end) {
            (Some(start), Some(end)) => Self::date_range(start, end),
            _ => Err(AnalysisError::Range {
                parameter: "year",
                value: f64::from(start_year.max(end_year)),
            }),
        }
    }

    pub fn demographic<I, S>(attribute: DemographicAttribute, accepted: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Filter::Demographic {
            attribute,
            accepted: accepted
                .into_iter()
                .map(|v| normalize_value(v.as_ref()))
                .collect(),
        }
    }

    pub fn employment_status(accepted: impl IntoIterator<Item = EmploymentStatus>) -> Self {
        Filter::EmploymentStatus(accepted.into_iter().collect())
    }

    fn check(&self) -> Result<(), AnalysisError> {
        match self {
            Filter::DateRange { start, end } if start > end => Err(AnalysisError::InvalidRange {
                start: *start,
                end: *end,
            }),
            _ => Ok(()),
        }
    }

    pub fn matches(&self, obs: &Observation) -> bool {
        match self {
            Filter::DateRange { start, end } => (*start..=*end).contains(&obs.period()),
            Filter::Demographic { attribute, accepted } => obs
                .demographics()
                .attribute(*attribute)
                .is_some_and(|v| accepted.contains(&v)),
            Filter::EmploymentStatus(accepted) => {
                accepted.contains(&obs.demographics().employment_status())
            }
        }
    }
}

/// Applies `filters` in order, returning the surviving observations in
/// source order.
///
/// Every filter is checked before any observation is touched, so an
/// inverted date range fails even on an empty dataset.
pub fn apply_filters<'a>(
    data: &'a [Observation],
    filters: &[Filter],
) -> Result<Vec<&'a Observation>, AnalysisError> {
    for filter in filters {
        filter.check()?;
    }

    let mut selected: Vec<&Observation> = data.iter().collect();
    for filter in filters {
        selected.retain(|obs| filter.matches(obs));
    }
    Ok(selected)
}

/// Normalizes a caller-supplied attribute value the same way
/// [`crate::model::Demographics::attribute`] renders stored values.
fn normalize_value(value: &str) -> String {
    let value = value.trim();
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => (v.round() as i64).to_string(),
        _ => value.to_lowercase(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::observation::testing::observation;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn dataset() -> Vec<Observation> {
        vec![
            observation(
                0,
                "2020-01-01",
                "1",
                &[("c1010", "1"), ("emp_status", "1"), ("region", "North")],
            ),
            observation(
                1,
                "2021-06-01",
                "1",
                &[("c1010", "2"), ("emp_status", "2"), ("region", "South")],
            ),
            observation(2, "2022-03-01", "1", &[("c1010", "1"), ("emp_status", "3")]),
            observation(3, "2023-12-31", "1", &[("emp_status", "1"), ("region", "north")]),
        ]
    }

    fn ids(selected: &[&Observation]) -> Vec<usize> {
        selected.iter().map(|o| o.id()).collect()
    }

    #[test]
    fn test_zero_filters_is_identity() {
        let data = dataset();
        let selected = apply_filters(&data, &[]).unwrap();
        assert_eq!(ids(&selected), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let data = dataset();
        let filter = Filter::date_range(date("2021-06-01"), date("2023-12-31")).unwrap();
        let selected = apply_filters(&data, &[filter]).unwrap();
        assert_eq!(ids(&selected), vec![1, 2, 3]);
    }

    #[test]
    fn test_inverted_range_fails() {
        let err = Filter::date_range(date("2023-01-01"), date("2022-01-01")).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidRange { .. }));

        // Built directly, the range is still rejected at apply time.
        let filter = Filter::DateRange {
            start: date("2023-01-01"),
            end: date("2022-01-01"),
        };
        assert!(matches!(
            apply_filters(&[], &[filter]),
            Err(AnalysisError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_years() {
        let data = dataset();
        let selected = apply_filters(&data, &[Filter::years(2021, 2022).unwrap()]).unwrap();
        assert_eq!(ids(&selected), vec![1, 2]);
        assert!(Filter::years(2022, 2021).is_err());
    }

    #[test]
    fn test_demographic_filter_normalizes_values() {
        let data = dataset();

        let gender = Filter::demographic(DemographicAttribute::Gender, ["1.0"]);
        assert_eq!(ids(&apply_filters(&data, &[gender]).unwrap()), vec![0, 2]);

        let region = Filter::demographic(DemographicAttribute::Region, ["NORTH"]);
        assert_eq!(ids(&apply_filters(&data, &[region]).unwrap()), vec![0, 3]);
    }

    #[test]
    fn test_employment_filter() {
        let data = dataset();
        let filter =
            Filter::employment_status([EmploymentStatus::Employed, EmploymentStatus::Inactive]);
        assert_eq!(ids(&apply_filters(&data, &[filter]).unwrap()), vec![0, 2, 3]);
    }

    #[test]
    fn test_filters_intersect() {
        let data = dataset();
        let filters = [
            Filter::employment_status([EmploymentStatus::Employed]),
            Filter::date_range(date("2021-01-01"), date("2030-01-01")).unwrap(),
        ];
        assert_eq!(ids(&apply_filters(&data, &filters).unwrap()), vec![3]);
    }
}
