use crate::analyzers::grade::Grade;
use crate::analyzers::types::{
    AnalysisResult, DescriptiveStats, QualityReport, StrategyKind, StrategyParams,
};
use crate::analyzers::utility::{
    RunningStats, interpolated_percentile, mean, pct, weighted_mean,
};
use crate::error::AnalysisError;
use crate::model::{DemographicAttribute, Field, Observation};

/// Runs `kind` over an already filtered observation set.
///
/// `field` is required by every strategy except
/// [`StrategyKind::DemographicsQuality`], which ignores it.
pub fn compute(
    kind: StrategyKind,
    data: &[&Observation],
    field: Option<&Field>,
    params: &StrategyParams,
) -> Result<AnalysisResult, AnalysisError> {
    let require_field = || {
        field.ok_or(AnalysisError::MissingField {
            strategy: kind.name(),
        })
    };

    match kind {
        StrategyKind::GenericMean => {
            let field = require_field()?;
            Ok(AnalysisResult::GenericMean {
                value: generic_mean(data, field)?,
                field: field.path(),
            })
        }
        StrategyKind::WeightedMean => {
            let field = require_field()?;
            Ok(AnalysisResult::WeightedMean {
                value: weighted_field_mean(data, field)?,
                field: field.path(),
            })
        }
        StrategyKind::Percentile => {
            let field = require_field()?;
            let rank = params
                .percentile_rank
                .unwrap_or(StrategyParams::DEFAULT_PERCENTILE_RANK);
            Ok(AnalysisResult::Percentile {
                value: percentile(data, field, rank)?,
                rank,
                field: field.path(),
            })
        }
        StrategyKind::DescriptiveStats => {
            let field = require_field()?;
            Ok(AnalysisResult::DescriptiveStats {
                stats: descriptive_stats(data, field)?,
                field: field.path(),
            })
        }
        StrategyKind::DemographicsQuality => {
            Ok(AnalysisResult::DemographicsQuality(demographics_quality(data)))
        }
    }
}

/// Present values of `field`, skipping non-responses.
fn present_values<'a>(
    data: &'a [&Observation],
    field: &'a Field,
) -> impl Iterator<Item = f64> + 'a {
    data.iter().filter_map(move |obs| obs.value(field))
}

/// Rejects infinities and NaN produced by overflowing sums.
fn finite(strategy: StrategyKind, value: f64) -> Result<f64, AnalysisError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(AnalysisError::NonFiniteResult {
            strategy: strategy.name(),
        })
    }
}

fn insufficient(strategy: StrategyKind, needed: usize, found: usize) -> AnalysisError {
    AnalysisError::InsufficientData {
        strategy: strategy.name(),
        needed,
        found,
    }
}

/// Arithmetic mean of the present values of `field`.
pub fn generic_mean(data: &[&Observation], field: &Field) -> Result<f64, AnalysisError> {
    let values: Vec<f64> = present_values(data, field).collect();
    let value = mean(&values).ok_or_else(|| insufficient(StrategyKind::GenericMean, 1, 0))?;
    finite(StrategyKind::GenericMean, value)
}

/// `Σ(value · weight) / Σ(weight)` over observations that answered `field`.
///
/// Weights of observations without a value never enter the denominator.
pub fn weighted_field_mean(data: &[&Observation], field: &Field) -> Result<f64, AnalysisError> {
    let pairs: Vec<(f64, f64)> = data
        .iter()
        .filter_map(|obs| obs.value(field).map(|v| (v, obs.survey_weight())))
        .collect();
    let value =
        weighted_mean(&pairs).ok_or_else(|| insufficient(StrategyKind::WeightedMean, 1, 0))?;
    finite(StrategyKind::WeightedMean, value)
}

/// Interpolated percentile of the present values of `field`.
///
/// The rank is validated before the data is looked at.
pub fn percentile(
    data: &[&Observation],
    field: &Field,
    rank: f64,
) -> Result<f64, AnalysisError> {
    if !(0.0..=100.0).contains(&rank) {
        return Err(AnalysisError::Range {
            parameter: "percentile rank",
            value: rank,
        });
    }

    let mut values: Vec<f64> = present_values(data, field).collect();
    values.sort_by(f64::total_cmp);
    interpolated_percentile(&values, rank)
        .ok_or_else(|| insufficient(StrategyKind::Percentile, 1, 0))
}

/// Count, mean, min, max and sample standard deviation in one pass.
///
/// Needs at least two present values for the standard deviation.
pub fn descriptive_stats(
    data: &[&Observation],
    field: &Field,
) -> Result<DescriptiveStats, AnalysisError> {
    let mut running = RunningStats::new();
    for value in present_values(data, field) {
        running.push(value);
    }

    match (running.mean(), running.min(), running.max(), running.sample_std_dev()) {
        (Some(mean), Some(min), Some(max), Some(std_dev)) => Ok(DescriptiveStats {
            count: running.count(),
            mean: finite(StrategyKind::DescriptiveStats, mean)?,
            min,
            max,
            std_dev: finite(StrategyKind::DescriptiveStats, std_dev)?,
        }),
        _ => Err(insufficient(StrategyKind::DescriptiveStats, 2, running.count())),
    }
}

/// Demographic completeness of `data`.
///
/// Unlike the numeric strategies this never fails: an empty set is reported
/// with completeness 0 and grade F.
pub fn demographics_quality(data: &[&Observation]) -> QualityReport {
    let records = data.len();
    let complete_records = data
        .iter()
        .filter(|obs| obs.demographics().is_complete())
        .count();

    let missing_pct = DemographicAttribute::QUALITY_TRACKED
        .iter()
        .map(|attr| {
            let missing = data
                .iter()
                .filter(|obs| !obs.demographics().is_present(*attr))
                .count();
            (attr.name(), pct(missing, records))
        })
        .collect();

    let completeness = if records == 0 {
        0.0
    } else {
        complete_records as f64 / records as f64
    };

    QualityReport {
        records,
        complete_records,
        completeness,
        grade: Grade::from_completeness(completeness),
        missing_pct,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::observation::testing::observation;

    fn inflation() -> &'static Field {
        Field::resolve("inflation").unwrap()
    }

    fn with_inflation(values: &[Option<f64>], weights: &[f64]) -> Vec<Observation> {
        values
            .iter()
            .zip(weights)
            .enumerate()
            .map(|(i, (v, w))| {
                let value = v.map(|v| v.to_string()).unwrap_or_default();
                observation(i, "2024-01-01", &w.to_string(), &[("c4030", value.as_str())])
            })
            .collect()
    }

    fn refs(data: &[Observation]) -> Vec<&Observation> {
        data.iter().collect()
    }

    #[test]
    fn test_generic_mean_skips_absent_values() {
        let data = with_inflation(&[Some(2.0), None, Some(4.0)], &[1.0, 1.0, 1.0]);
        assert_eq!(generic_mean(&refs(&data), inflation()), Ok(3.0));
    }

    #[test]
    fn test_empty_input_fails() {
        let empty: Vec<&Observation> = Vec::new();
        assert!(matches!(
            generic_mean(&empty, inflation()),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            weighted_field_mean(&empty, inflation()),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            percentile(&empty, inflation(), 50.0),
            Err(AnalysisError::InsufficientData { .. })
        ));
        assert!(matches!(
            descriptive_stats(&empty, inflation()),
            Err(AnalysisError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_all_absent_fails_rather_than_zero() {
        let data = with_inflation(&[None, None], &[1.0, 1.0]);
        assert!(generic_mean(&refs(&data), inflation()).is_err());
    }

    #[test]
    fn test_weighted_mean_ignores_weight_of_missing_values() {
        let data = with_inflation(&[Some(2.0), Some(4.0), None], &[1.5, 1.0, 100.0]);
        let value = weighted_field_mean(&refs(&data), inflation()).unwrap();
        assert!((value - (2.0 * 1.5 + 4.0) / 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_huge_weights_do_not_overflow() {
        let data = with_inflation(&[Some(1.0), Some(3.0)], &[1e308, 1e308]);
        assert_eq!(weighted_field_mean(&refs(&data), inflation()), Ok(2.0));
    }

    #[test]
    fn test_overflowing_values_are_an_error_not_a_number() {
        let data = with_inflation(&[Some(1e308), Some(1e308)], &[1.0, 1.0]);
        let refs = refs(&data);

        let overflow = |strategy: StrategyKind| AnalysisError::NonFiniteResult {
            strategy: strategy.name(),
        };
        assert_eq!(
            generic_mean(&refs, inflation()),
            Err(overflow(StrategyKind::GenericMean))
        );
        assert_eq!(
            weighted_field_mean(&refs, inflation()),
            Err(overflow(StrategyKind::WeightedMean))
        );
    }

    #[test]
    fn test_field_strategies_need_a_field() {
        let err = compute(
            StrategyKind::Percentile,
            &[],
            None,
            &StrategyParams::default(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            AnalysisError::MissingField {
                strategy: "percentile"
            }
        );
    }

    #[test]
    fn test_equal_weights_match_generic_mean() {
        let data = with_inflation(&[Some(1.0), Some(5.5), Some(-2.0), None], &[3.0, 3.0, 3.0, 3.0]);
        let refs = refs(&data);
        let plain = generic_mean(&refs, inflation()).unwrap();
        let weighted = weighted_field_mean(&refs, inflation()).unwrap();
        assert!((plain - weighted).abs() < 1e-12);
    }

    #[test]
    fn test_median_odd_and_even() {
        let odd = with_inflation(&[Some(5.0), Some(1.0), Some(3.0)], &[1.0; 3]);
        assert_eq!(percentile(&refs(&odd), inflation(), 50.0), Ok(3.0));

        let even = with_inflation(&[Some(4.0), Some(1.0), Some(3.0), Some(2.0)], &[1.0; 4]);
        assert_eq!(percentile(&refs(&even), inflation(), 50.0), Ok(2.5));
    }

    #[test]
    fn test_percentile_interpolates() {
        let data = with_inflation(
            &[Some(10.0), Some(20.0), Some(30.0), Some(40.0), Some(50.0)],
            &[1.0; 5],
        );
        let value = percentile(&refs(&data), inflation(), 90.0).unwrap();
        assert!((value - 46.0).abs() < 1e-12);
    }

    #[test]
    fn test_percentile_rank_out_of_range() {
        let data = with_inflation(&[Some(1.0)], &[1.0]);
        for rank in [-0.1, 100.5, f64::NAN] {
            assert!(matches!(
                percentile(&refs(&data), inflation(), rank),
                Err(AnalysisError::Range { .. })
            ));
        }
        // Checked before the data, so an empty set still reports the rank.
        assert!(matches!(
            percentile(&[], inflation(), 101.0),
            Err(AnalysisError::Range { .. })
        ));
    }

    #[test]
    fn test_descriptive_stats() {
        let values: Vec<Option<f64>> = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]
            .into_iter()
            .map(Some)
            .collect();
        let data = with_inflation(&values, &[1.0; 8]);
        let stats = descriptive_stats(&refs(&data), inflation()).unwrap();

        assert_eq!(stats.count, 8);
        assert!((stats.mean - 5.0).abs() < 1e-12);
        assert_eq!(stats.min, 2.0);
        assert_eq!(stats.max, 9.0);
        assert!((stats.std_dev - 2.138).abs() < 1e-3);
    }

    #[test]
    fn test_descriptive_stats_single_value_fails() {
        let data = with_inflation(&[Some(3.0), None], &[1.0, 1.0]);
        assert_eq!(
            descriptive_stats(&refs(&data), inflation()),
            Err(AnalysisError::InsufficientData {
                strategy: "descriptive_stats",
                needed: 2,
                found: 1,
            })
        );
    }

    #[test]
    fn test_quality_on_empty_set_is_zero() {
        let report = demographics_quality(&[]);
        assert_eq!(report.records, 0);
        assert_eq!(report.completeness, 0.0);
        assert_eq!(report.grade, Grade::F);
        assert!(report.missing_pct.values().all(|p| *p == 0.0));
    }

    #[test]
    fn test_quality_on_complete_set_is_one() {
        let complete = [
            ("c1010", "1"),
            ("c1020", "2"),
            ("c2110", "3"),
            ("x1040_1", "secondary"),
            ("c2151_1", "35"),
        ];
        let data = vec![
            observation(0, "2024-01-01", "1", &complete),
            observation(1, "2024-02-01", "1", &complete),
        ];
        let report = demographics_quality(&refs(&data));
        assert_eq!(report.completeness, 1.0);
        assert_eq!(report.grade, Grade::APlus);
        assert_eq!(report.missing_pct["gender"], 0.0);
    }

    #[test]
    fn test_quality_partial() {
        let data = vec![
            observation(0, "2024-01-01", "1", &[("c1010", "1")]),
            observation(
                1,
                "2024-01-01",
                "1",
                &[
                    ("c1010", "2"),
                    ("c1020", "2"),
                    ("c2110", "3"),
                    ("x1040_1", "primary"),
                    ("c2150_2", "1"),
                ],
            ),
        ];
        let report = demographics_quality(&refs(&data));
        assert_eq!(report.complete_records, 1);
        assert_eq!(report.completeness, 0.5);
        assert_eq!(report.missing_pct["gender"], 0.0);
        assert_eq!(report.missing_pct["age_group"], 50.0);
    }

    #[test]
    fn test_compute_dispatch() {
        let data = with_inflation(&[Some(2.0), Some(4.0)], &[1.0, 1.0]);
        let refs = refs(&data);

        let result = compute(
            StrategyKind::GenericMean,
            &refs,
            Some(inflation()),
            &StrategyParams::default(),
        )
        .unwrap();
        assert_eq!(
            result,
            AnalysisResult::GenericMean {
                field: "macro.inflation_1y".to_string(),
                value: 3.0,
            }
        );

        let result = compute(
            StrategyKind::Percentile,
            &refs,
            Some(inflation()),
            &StrategyParams::with_percentile_rank(100.0),
        )
        .unwrap();
        assert_eq!(result.value(), 4.0);

        let result = compute(
            StrategyKind::DemographicsQuality,
            &refs,
            None,
            &StrategyParams::default(),
        )
        .unwrap();
        assert!(matches!(result, AnalysisResult::DemographicsQuality(_)));
    }
}
