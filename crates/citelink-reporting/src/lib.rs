use std::path::{Path, PathBuf};

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod summary;
pub mod types;

pub use summary::Summary;
pub use types::{BatchOptions, DocumentRecord, ProcessedRecord};

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to serialize report: {0}")]
    Json(#[from] serde_json::Error),
}

/// Full output of one batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub generated_at_utc: String,
    pub dataset_dir: String,
    pub options: BatchOptions,
    pub summary: Summary,
    pub records: Vec<DocumentRecord>,
}

impl BatchReport {
    /// Summarise `records` and stamp the report with the current UTC time.
    pub fn new(dataset_dir: &Path, options: BatchOptions, records: Vec<DocumentRecord>, cancelled: bool) -> Self {
        Self {
            generated_at_utc: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            dataset_dir: dataset_dir.display().to_string(),
            options,
            summary: Summary::from_records(&records, cancelled),
            records,
        }
    }

    pub fn write(&self, path: &Path) -> Result<(), ReportError> {
        write_json(self, path)
    }
}

/// Write `value` as pretty JSON, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), ReportError> {
    let io_err = |source| ReportError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    std::fs::write(path, json).map_err(io_err)?;
    tracing::debug!(path = %path.display(), "wrote JSON");
    Ok(())
}
