use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::error::{ValidationError, Violation};
use crate::model::{Demographics, Field, IndicatorGroup, RawRecord, fields_in};
use crate::parser::{parse_optional_f64, parse_period, parse_weight};

/// Indicator values of one questionnaire block, keyed by field name.
///
/// Every schema field of the block has an entry; `None` is a non-response.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Indicators(BTreeMap<&'static str, Option<f64>>);

impl Indicators {
    fn from_raw(group: IndicatorGroup, raw: &RawRecord, violations: &mut Vec<Violation>) -> Self {
        let values = fields_in(group)
            .map(|field| {
                let value = parse_optional_f64(field.column, raw.get(field.column))
                    .unwrap_or_else(|v| {
                        violations.push(v);
                        None
                    });
                (field.name, value)
            })
            .collect();
        Self(values)
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.get(name).copied().flatten()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, Option<f64>)> + '_ {
        self.0.iter().map(|(k, v)| (*k, *v))
    }

    pub fn present_count(&self) -> usize {
        self.0.values().filter(|v| v.is_some()).count()
    }
}

/// One validated respondent record for one survey period.
///
/// Construct through [`Observation::from_raw`]; fields are read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    id: usize,
    period: NaiveDate,
    survey_weight: f64,
    macro_indicators: Indicators,
    consumption_indicators: Indicators,
    labor_indicators: Indicators,
    housing_indicators: Indicators,
    credit_indicators: Indicators,
    demographics: Demographics,
}

impl Observation {
    /// Years a survey period may fall in: 2000-01-01 through 2030-12-31.
    pub const PERIOD_YEARS: RangeInclusive<i32> = 2000..=2030;

    /// Validates a raw row, collecting every violated constraint.
    ///
    /// `id` is the zero-based position of the data row in its source.
    pub fn from_raw(id: usize, raw: &RawRecord) -> Result<Self, ValidationError> {
        let mut violations = Vec::new();

        let period = match parse_period(raw.get("date")) {
            Ok(p) if Self::PERIOD_YEARS.contains(&p.year()) => Some(p),
            Ok(p) => {
                violations.push(Violation::PeriodOutOfRange(p));
                None
            }
            Err(v) => {
                violations.push(v);
                None
            }
        };

        let survey_weight = parse_weight(raw.get("wgt")).map_err(|v| violations.push(v)).ok();

        let mut read_group = |group| Indicators::from_raw(group, raw, &mut violations);
        let macro_indicators = read_group(IndicatorGroup::Macro);
        let consumption_indicators = read_group(IndicatorGroup::Consumption);
        let labor_indicators = read_group(IndicatorGroup::Labor);
        let housing_indicators = read_group(IndicatorGroup::Housing);
        let credit_indicators = read_group(IndicatorGroup::Credit);
        let demographics = Demographics::from_raw(raw, &mut violations);

        match (period, survey_weight) {
            (Some(period), Some(survey_weight)) if violations.is_empty() => Ok(Self {
                id,
                period,
                survey_weight,
                macro_indicators,
                consumption_indicators,
                labor_indicators,
                housing_indicators,
                credit_indicators,
                demographics,
            }),
            _ => Err(ValidationError::new(violations)),
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn period(&self) -> NaiveDate {
        self.period
    }

    pub fn survey_weight(&self) -> f64 {
        self.survey_weight
    }

    pub fn macro_indicators(&self) -> &Indicators {
        &self.macro_indicators
    }

    pub fn consumption_indicators(&self) -> &Indicators {
        &self.consumption_indicators
    }

    pub fn labor_indicators(&self) -> &Indicators {
        &self.labor_indicators
    }

    pub fn housing_indicators(&self) -> &Indicators {
        &self.housing_indicators
    }

    pub fn credit_indicators(&self) -> &Indicators {
        &self.credit_indicators
    }

    pub fn indicators(&self, group: IndicatorGroup) -> &Indicators {
        match group {
            IndicatorGroup::Macro => &self.macro_indicators,
            IndicatorGroup::Consumption => &self.consumption_indicators,
            IndicatorGroup::Labor => &self.labor_indicators,
            IndicatorGroup::Housing => &self.housing_indicators,
            IndicatorGroup::Credit => &self.credit_indicators,
        }
    }

    pub fn demographics(&self) -> &Demographics {
        &self.demographics
    }

    /// Value of `field`, `None` when the respondent did not answer.
    pub fn value(&self, field: &Field) -> Option<f64> {
        self.indicators(field.group).get(field.name)
    }
}
