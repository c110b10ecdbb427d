//! CES analytics: ingest Consumer Expectations Survey CSV files into
//! validated observations and aggregate them with one of five strategies
//! over filtered subsets.

pub mod analyzers;
pub mod error;
pub mod filters;
pub mod gateway;
pub mod model;
pub mod output;
pub mod parser;

pub use analyzers::{AnalysisResult, AnalyticsEngine, StrategyKind, StrategyParams};
pub use error::{AnalysisError, GatewayError, ValidationError, Violation};
pub use filters::{Filter, apply_filters};
pub use gateway::{DataGateway, LoadReport, load_all};
pub use model::{DemographicAttribute, EmploymentStatus, Field, Observation};
