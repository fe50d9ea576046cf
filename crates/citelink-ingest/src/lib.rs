use std::path::PathBuf;

use thiserror::Error;

pub mod discover;
pub mod load;

pub use citelink_core::{Document, SourceType};
pub use discover::{FileTypes, discover_files, is_hash_stem};
pub use load::{LoadOptions, LoadedDocument, load_document, write_cache};

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("unrecognized document shape in {0}")]
    UnrecognizedShape(PathBuf),
    #[error("dataset directory not found: {0}")]
    MissingDir(PathBuf),
    #[error("unknown file types {0:?} (expected both, md or json)")]
    UnknownFileTypes(String),
}

impl IngestError {
    /// Short variant name used in per-document failure records.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Io { .. } => "Io",
            Self::Json { .. } => "Json",
            Self::UnrecognizedShape(_) => "UnrecognizedShape",
            Self::MissingDir(_) => "MissingDir",
            Self::UnknownFileTypes(_) => "UnknownFileTypes",
        }
    }
}
