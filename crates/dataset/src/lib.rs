//! Read-only index over the cleaned TravelPlanner corpus.
//!
//! The corpus is loaded once at start-up and shared between requests. Raw
//! nested plans are converted to [`guide_core::RawPlan`] here so nothing
//! downstream touches untyped data.

mod error;

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use guide_core::DatasetRecord;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

pub use error::DatasetError;

#[derive(Debug, Deserialize)]
struct DatasetRow {
    #[serde(default, alias = "dest")]
    destination: Value,
    #[serde(default, alias = "parsedPlan")]
    parsed_plan: Value,
    #[serde(default, alias = "row_idx", alias = "rowIndex")]
    row_index: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatasetStats {
    pub records: usize,
    pub records_with_plan: usize,
}

#[derive(Debug, Clone, Default)]
pub struct DatasetIndex {
    records: Vec<DatasetRecord>,
}

impl DatasetIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_records(records: Vec<DatasetRecord>) -> Self {
        Self { records }
    }

    /// Loads the corpus, degrading to an empty index when the file is missing
    /// or unreadable. Lookups against an empty index always miss.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        match Self::try_load(path) {
            Ok(index) => {
                let stats = index.stats();
                info!(
                    path = %path.display(),
                    records = stats.records,
                    with_plan = stats.records_with_plan,
                    "travel plan dataset loaded"
                );
                index
            }
            Err(DatasetError::NotFound { path }) => {
                warn!(path = %path, "travel plan dataset not found; dataset matching disabled");
                Self::empty()
            }
            Err(err) => {
                error!(error = %err, "travel plan dataset failed to load; dataset matching disabled");
                Self::empty()
            }
        }
    }

    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| {
            let path = path.display().to_string();
            if source.kind() == ErrorKind::NotFound {
                DatasetError::NotFound { path }
            } else {
                DatasetError::Io { path, source }
            }
        })?;

        Self::from_json_str(&raw)
    }

    pub fn from_json_str(raw: &str) -> Result<Self, DatasetError> {
        let rows: Vec<DatasetRow> = serde_json::from_str(raw)?;

        let records = rows
            .into_iter()
            .enumerate()
            .filter_map(|(position, row)| {
                let destination = row.destination.as_str()?.to_string();
                let row_index = row.row_index.unwrap_or(position as i64);
                Some(DatasetRecord::from_parts(destination, &row.parsed_plan, row_index))
            })
            .collect();

        Ok(Self { records })
    }

    /// First record whose destination contains `destination`, ignoring case.
    /// Records without a plan never match. File order decides ties.
    pub fn lookup(&self, destination: &str) -> Option<&DatasetRecord> {
        let needle = destination.to_lowercase();
        let hit = self
            .records
            .iter()
            .filter(|record| record.plan.is_some())
            .find(|record| record.destination.to_lowercase().contains(&needle));

        match hit {
            Some(record) => debug!(
                query = destination,
                matched = %record.destination,
                row = record.row_index,
                "dataset match"
            ),
            None => debug!(query = destination, "no dataset match"),
        }

        hit
    }

    pub fn records(&self) -> &[DatasetRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn stats(&self) -> DatasetStats {
        DatasetStats {
            records: self.records.len(),
            records_with_plan: self
                .records
                .iter()
                .filter(|record| record.plan.is_some())
                .count(),
        }
    }
}
