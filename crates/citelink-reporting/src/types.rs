use citelink_core::{BucketKind, DocumentMetadata, LinkResult, SourceType, StyleLabel};
use citelink_validate::ValidationReport;
use serde::{Deserialize, Serialize};

/// Everything produced for one successfully processed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedRecord {
    pub file: String,
    pub id: String,
    pub source_type: SourceType,
    pub pages_count: usize,
    pub references_count: usize,
    pub style: StyleLabel,
    pub dominant: Option<BucketKind>,
    pub citations: LinkResult,
    pub metadata: DocumentMetadata,
    pub validation: ValidationReport,
}

/// Outcome for one input file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DocumentRecord {
    Processed(Box<ProcessedRecord>),
    /// `error` is `"<Kind>: <message>"`.
    Failed { file: String, error: String },
}

impl DocumentRecord {
    pub fn failed(file: impl Into<String>, kind: &str, message: impl std::fmt::Display) -> Self {
        Self::Failed {
            file: file.into(),
            error: format!("{kind}: {message}"),
        }
    }

    pub fn file(&self) -> &str {
        match self {
            Self::Processed(record) => &record.file,
            Self::Failed { file, .. } => file,
        }
    }

    pub fn as_processed(&self) -> Option<&ProcessedRecord> {
        match self {
            Self::Processed(record) => Some(record),
            Self::Failed { .. } => None,
        }
    }
}

/// Run options echoed into the report.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchOptions {
    pub types: String,
    pub limit: Option<usize>,
    pub prefer_pages_text: bool,
    pub hash_only: bool,
    pub write_updated_md: bool,
    pub workers: usize,
    pub declared_style: Option<String>,
}
