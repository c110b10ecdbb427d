//! CLI entry point for the CES analytics tool.
//!
//! Provides subcommands for loading a CES CSV file, running one of the
//! aggregation strategies over a filtered subset, and the yearly, time-series
//! and month lookup reports.

use anyhow::{Context, Result, bail};
use ces_analytics::model::SCHEMA;
use ces_analytics::output::print_json;
use ces_analytics::{
    AnalyticsEngine, DataGateway, DemographicAttribute, EmploymentStatus, Filter, Observation,
    StrategyParams,
};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "ces_analytics")]
#[command(about = "Aggregate Consumer Expectations Survey data", long_about = None)]
struct Cli {
    /// CES CSV file (defaults to $CES_DATA_PATH, then ces_data.csv)
    #[arg(short, long, global = true, value_name = "FILE")]
    data: Option<String>,

    /// Validation workers (defaults to $CES_WORKERS, then 4)
    #[arg(short, long, global = true)]
    workers: Option<usize>,

    /// Pretty-print JSON output
    #[arg(long, global = true, default_value_t = false)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the dataset and print the load report
    Load,
    /// Run an aggregation strategy over a filtered subset
    Run(RunArgs),
    /// List the survey years present in the dataset
    Years,
    /// Mean of a field per survey year
    Yearly {
        /// Field path, name, column code or alias (e.g. inflation, c1150_1)
        field: String,
    },
    /// Mean of a field per survey period
    Series {
        /// Field path, name, column code or alias
        field: String,
    },
    /// Show the first observation of a month ('2023-03', '03-2023', 'March 2023')
    Lookup { query: String },
    /// List every known field
    Fields,
}

#[derive(Args)]
struct RunArgs {
    /// One of: generic_mean, weighted_mean, percentile, descriptive_stats, demographics_quality
    strategy: String,

    /// Field to aggregate (ignored by demographics_quality)
    #[arg(default_value = "")]
    field: String,

    /// Inclusive start date (YYYY-MM-DD)
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Inclusive end date (YYYY-MM-DD)
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Year range, e.g. 2021-2023
    #[arg(long, conflicts_with_all = ["from", "to"])]
    years: Option<String>,

    /// Demographic filter, e.g. gender=1 or region=north,south (repeatable)
    #[arg(long = "demographic", value_name = "ATTR=V1,V2")]
    demographics: Vec<String>,

    /// Accepted employment statuses, e.g. employed,unemployed
    #[arg(long, value_delimiter = ',')]
    employment: Vec<EmploymentStatus>,

    /// Percentile rank in [0, 100] for the percentile strategy
    #[arg(long)]
    rank: Option<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/ces_analytics.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("ces_analytics.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();
    let pretty = cli.pretty;

    if let Commands::Fields = cli.command {
        for field in SCHEMA {
            println!("{:<40} {}", field.path(), field.column);
        }
        return Ok(());
    }

    let gateway = DataGateway::new(data_path(cli.data)).with_workers(workers(cli.workers)?);
    let (data, report) = gateway.load_all().await?;
    let engine = AnalyticsEngine::new();

    match cli.command {
        Commands::Load => print_json(&report, pretty)?,
        Commands::Run(args) => {
            let filters = build_filters(&args)?;
            let params = StrategyParams {
                percentile_rank: args.rank,
            };
            let result = engine.run(&data, &args.strategy, &args.field, &filters, &params)?;
            print_json(&result, pretty)?;
        }
        Commands::Years => print_json(&engine.available_years(&data), pretty)?,
        Commands::Yearly { field } => print_json(&engine.yearly_report(&data, &field)?, pretty)?,
        Commands::Series { field } => {
            let series: Vec<(String, f64)> = engine
                .time_series(&data, &field)?
                .into_iter()
                .map(|(period, mean)| (period.format("%Y-%m").to_string(), mean))
                .collect();
            print_json(&series, pretty)?;
        }
        Commands::Lookup { query } => match engine.find_by_month(&data, &query) {
            Some(obs) => print_json::<Observation>(obs, pretty)?,
            None => {
                warn!(query = %query, "No observation found for month");
                bail!("no data found for '{query}'");
            }
        },
        Commands::Fields => {}
    }

    Ok(())
}

fn data_path(flag: Option<String>) -> String {
    flag.or_else(|| std::env::var("CES_DATA_PATH").ok())
        .unwrap_or_else(|| "ces_data.csv".to_string())
}

fn workers(flag: Option<usize>) -> Result<usize> {
    if let Some(workers) = flag {
        return Ok(workers);
    }
    match std::env::var("CES_WORKERS") {
        Ok(raw) => raw
            .parse()
            .with_context(|| format!("CES_WORKERS must be a positive integer, got '{raw}'")),
        Err(_) => Ok(ces_analytics::gateway::DEFAULT_WORKERS),
    }
}

/// Builds filters in the order: date range, demographics, employment status.
fn build_filters(args: &RunArgs) -> Result<Vec<Filter>> {
    let mut filters = Vec::new();

    if let Some(years) = &args.years {
        let (start, end) = years
            .split_once('-')
            .map(|(s, e)| (s.trim(), e.trim()))
            .unwrap_or((years.trim(), years.trim()));
        filters.push(Filter::years(start.parse()?, end.parse()?)?);
    } else if args.from.is_some() || args.to.is_some() {
        let start = args.from.or(NaiveDate::from_ymd_opt(2000, 1, 1));
        let end = args.to.or(NaiveDate::from_ymd_opt(2030, 12, 31));
        if let (Some(start), Some(end)) = (start, end) {
            filters.push(Filter::date_range(start, end)?);
        }
    }

    for arg in &args.demographics {
        let Some((attribute, values)) = arg.split_once('=') else {
            bail!("demographic filter must look like ATTR=V1,V2, got '{arg}'");
        };
        let attribute: DemographicAttribute = attribute.parse().map_err(anyhow::Error::msg)?;
        filters.push(Filter::demographic(attribute, values.split(',')));
    }

    if !args.employment.is_empty() {
        filters.push(Filter::employment_status(args.employment.iter().copied()));
    }

    info!(count = filters.len(), "Filters built");
    Ok(filters)
}
