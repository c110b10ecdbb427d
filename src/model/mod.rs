//! Observation model: the validated shape of one CES respondent record.
//!
//! - indicator schema and field selectors (`schema`)
//! - demographic attributes (`demographics`)
//! - the observation value object and its validation (`observation`)

pub mod demographics;
pub mod observation;
pub mod schema;

pub use demographics::*;
pub use observation::*;
pub use schema::*;

use std::collections::HashMap;

/// A raw row keyed by normalized column name.
///
/// Column names are trimmed, stripped of a UTF-8 BOM and lowercased so that
/// `Date`, `date` and `\u{feff}date` all address the same cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawRecord {
    cells: HashMap<String, String>,
}

impl RawRecord {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
    {
        Self {
            cells: pairs
                .into_iter()
                .map(|(k, v)| (normalize_column(k.as_ref()), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.cells.get(column).map(String::as_str)
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }
}

pub fn normalize_column(name: &str) -> String {
    name.trim().trim_start_matches('\u{feff}').to_ascii_lowercase()
}
