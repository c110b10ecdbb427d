//! Aggregation strategies and the analytics engine.
//!
//! This module holds the five aggregation strategies, the numeric helpers
//! they share, completeness grading, and the engine that resolves a strategy
//! and field, filters the dataset and dispatches.

pub mod aggregate;
pub mod engine;
pub mod grade;
pub mod types;
pub mod utility;

pub use engine::AnalyticsEngine;
pub use types::{AnalysisResult, DescriptiveStats, QualityReport, StrategyKind, StrategyParams};
