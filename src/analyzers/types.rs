//! Data types used by the aggregation strategies and the engine.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::analyzers::grade::Grade;
use crate::error::AnalysisError;

/// The five supported aggregation strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    GenericMean,
    WeightedMean,
    Percentile,
    DescriptiveStats,
    DemographicsQuality,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::GenericMean,
        StrategyKind::WeightedMean,
        StrategyKind::Percentile,
        StrategyKind::DescriptiveStats,
        StrategyKind::DemographicsQuality,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::GenericMean => "generic_mean",
            StrategyKind::WeightedMean => "weighted_mean",
            StrategyKind::Percentile => "percentile",
            StrategyKind::DescriptiveStats => "descriptive_stats",
            StrategyKind::DemographicsQuality => "demographics_quality",
        }
    }

    /// Whether the strategy aggregates a numeric field at all.
    pub fn needs_field(&self) -> bool {
        !matches!(self, StrategyKind::DemographicsQuality)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for StrategyKind {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StrategyKind::ALL
            .into_iter()
            .find(|k| k.name() == s)
            .ok_or_else(|| AnalysisError::UnknownStrategy(s.to_string()))
    }
}

/// Optional per-strategy parameters.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrategyParams {
    /// Percentile rank in `[0, 100]`; the median when unset.
    pub percentile_rank: Option<f64>,
}

impl StrategyParams {
    pub const DEFAULT_PERCENTILE_RANK: f64 = 50.0;

    pub fn with_percentile_rank(rank: f64) -> Self {
        Self {
            percentile_rank: Some(rank),
        }
    }
}

/// Count, mean, extrema and sample standard deviation of present values.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DescriptiveStats {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
}

/// Demographic completeness of an observation set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub records: usize,
    pub complete_records: usize,
    /// Fraction of records with every quality-tracked attribute present, in `[0, 1]`.
    pub completeness: f64,
    pub grade: Grade,
    /// Percentage of records missing each attribute.
    pub missing_pct: BTreeMap<&'static str, f64>,
}

/// Result of one strategy run.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum AnalysisResult {
    GenericMean { field: String, value: f64 },
    WeightedMean { field: String, value: f64 },
    Percentile { field: String, rank: f64, value: f64 },
    DescriptiveStats { field: String, stats: DescriptiveStats },
    DemographicsQuality(QualityReport),
}

impl AnalysisResult {
    /// The headline number: the aggregate for numeric strategies, the
    /// completeness for the quality report.
    pub fn value(&self) -> f64 {
        match self {
            AnalysisResult::GenericMean { value, .. }
            | AnalysisResult::WeightedMean { value, .. }
            | AnalysisResult::Percentile { value, .. } => *value,
            AnalysisResult::DescriptiveStats { stats, .. } => stats.mean,
            AnalysisResult::DemographicsQuality(report) => report.completeness,
        }
    }
}
