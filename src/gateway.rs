//! Data gateway: CSV source to validated observations.
//!
//! The file is read asynchronously, split into raw rows, and validation is
//! fanned out over a small fixed pool of blocking workers. Each worker gets a
//! contiguous chunk of rows; results are joined back in source order. A bad
//! row is recorded in the [`LoadReport`] and never fails the load.

use csv::StringRecord;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::model::{Observation, RawRecord};

/// Number of validation workers used unless configured otherwise.
pub const DEFAULT_WORKERS: usize = 4;

/// A row that failed to become an observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RowError {
    /// 1-based line in the source file (the header is line 1).
    pub line: usize,
    pub reasons: Vec<String>,
}

/// Outcome of one load: row counts and why rejected rows were dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LoadReport {
    pub rows_read: usize,
    pub valid: usize,
    pub invalid: usize,
    pub rejected: Vec<RowError>,
}

/// A data row before validation.
struct PendingRow {
    index: usize,
    line: usize,
    record: Result<StringRecord, String>,
}

type Validated = (usize, Result<Observation, Vec<String>>);

/// Loads CES CSV files.
#[derive(Debug, Clone)]
pub struct DataGateway {
    path: PathBuf,
    workers: usize,
}

impl DataGateway {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            workers: DEFAULT_WORKERS,
        }
    }

    /// Overrides the validation pool size (at least one worker).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Reads and validates every row of the source.
    ///
    /// Returns the valid observations in source order plus a report of the
    /// rejected rows.
    ///
    /// # Errors
    ///
    /// Only when the source cannot be read, its header row cannot be parsed,
    /// or a validation worker panics. Malformed rows are never an error.
    #[tracing::instrument(skip(self), fields(path = %self.path.display(), workers = self.workers))]
    pub async fn load_all(&self) -> Result<(Vec<Observation>, LoadReport), GatewayError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|source| GatewayError::Io {
                path: self.path.clone(),
                source,
            })?;
        debug!(bytes = bytes.len(), "Source read, splitting rows");

        let path = self.path.clone();
        let (headers, rows) =
            tokio::task::spawn_blocking(move || split_rows(&bytes, &path)).await??;
        let rows_read = rows.len();

        let validated = validate_in_parallel(headers, rows, self.workers).await?;

        let mut observations = Vec::with_capacity(rows_read);
        let mut report = LoadReport {
            rows_read,
            ..Default::default()
        };

        for (line, outcome) in validated {
            match outcome {
                Ok(obs) => observations.push(obs),
                Err(reasons) => {
                    debug!(line, reasons = ?reasons, "Row rejected");
                    report.rejected.push(RowError { line, reasons });
                }
            }
        }

        report.valid = observations.len();
        report.invalid = report.rejected.len();

        if report.invalid > 0 {
            warn!(invalid = report.invalid, rows_read, "Some rows failed validation");
        }
        info!(valid = report.valid, invalid = report.invalid, rows_read, "Load complete");

        Ok((observations, report))
    }
}

/// Loads `path` with the default worker pool.
pub async fn load_all(
    path: impl Into<PathBuf>,
) -> Result<(Vec<Observation>, LoadReport), GatewayError> {
    DataGateway::new(path).load_all().await
}

/// Splits the raw bytes into the header row and the data records.
///
/// CSV-level record errors (e.g. a wrong number of fields) become rejected
/// rows, not load failures. Lines are taken from the reader, so blank lines
/// and quoted fields spanning several lines are counted.
fn split_rows(
    bytes: &[u8],
    path: &Path,
) -> Result<(Arc<StringRecord>, Vec<PendingRow>), GatewayError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let headers = reader
        .headers()
        .map_err(|source| GatewayError::Header {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let rows = reader
        .records()
        .enumerate()
        .map(|(index, result)| {
            let position = match &result {
                Ok(record) => record.position(),
                Err(e) => e.position(),
            };
            PendingRow {
                index,
                // records() starts after the header, lines are 1-based
                line: position.map_or(index + 2, |p| p.line() as usize),
                record: result.map_err(|e| format!("CSV parse error: {e}")),
            }
        })
        .collect();

    Ok((Arc::new(headers), rows))
}

/// Validates `rows` on `workers` blocking tasks and reassembles the results
/// in source order.
async fn validate_in_parallel(
    headers: Arc<StringRecord>,
    rows: Vec<PendingRow>,
    workers: usize,
) -> Result<Vec<Validated>, GatewayError> {
    let chunk_size = rows.len().div_ceil(workers.max(1)).max(1);

    let mut chunks = Vec::with_capacity(workers);
    let mut rows = rows.into_iter().peekable();
    while rows.peek().is_some() {
        chunks.push(rows.by_ref().take(chunk_size).collect::<Vec<_>>());
    }

    let mut tasks = vec![];
    for chunk in chunks {
        let headers = Arc::clone(&headers);
        tasks.push(tokio::task::spawn_blocking(move || validate_chunk(&headers, chunk)));
    }

    // Awaiting in spawn order keeps source order.
    let mut validated = Vec::new();
    for task in tasks {
        validated.extend(task.await?);
    }
    Ok(validated)
}

fn validate_chunk(headers: &StringRecord, chunk: Vec<PendingRow>) -> Vec<Validated> {
    chunk
        .into_iter()
        .map(|row| {
            let outcome = row.record.map_err(|e| vec![e]).and_then(|record| {
                let raw = RawRecord::from_pairs(headers.iter().zip(record.iter()));
                Observation::from_raw(row.index, &raw).map_err(|e| e.reasons())
            });
            (row.line, outcome)
        })
        .collect()
}
