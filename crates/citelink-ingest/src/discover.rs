use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::IngestError;

/// Which input files a dataset scan picks up.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileTypes {
    #[default]
    Both,
    /// `*.md` cache files only.
    Md,
    /// `*.json` raw OCR payloads only.
    Json,
}

impl FileTypes {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Both => "both",
            Self::Md => "md",
            Self::Json => "json",
        }
    }

    fn accepts(&self, ext: &str) -> bool {
        match self {
            Self::Both => ext == "md" || ext == "json",
            Self::Md => ext == "md",
            Self::Json => ext == "json",
        }
    }
}

impl FromStr for FileTypes {
    type Err = IngestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "both" | "all" => Ok(Self::Both),
            "md" | "markdown" => Ok(Self::Md),
            "json" | "raw" => Ok(Self::Json),
            _ => Err(IngestError::UnknownFileTypes(s.to_string())),
        }
    }
}

/// Whether `stem` is a 64-character hex digest, the naming used for
/// content-addressed dataset files.
pub fn is_hash_stem(stem: &str) -> bool {
    stem.len() == 64 && stem.chars().all(|c| c.is_ascii_hexdigit())
}

/// Input files directly under `dir`, sorted by path.
pub fn discover_files(dir: &Path, types: FileTypes, hash_only: bool) -> Result<Vec<PathBuf>, IngestError> {
    if !dir.is_dir() {
        return Err(IngestError::MissingDir(dir.to_path_buf()));
    }
    let read_dir = std::fs::read_dir(dir).map_err(|source| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = read_dir
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.is_file())
        .filter(|path| {
            let ext = path
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("")
                .to_lowercase();
            if !types.accepts(&ext) {
                return false;
            }
            let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("");
            !stem.starts_with('.') && (!hash_only || is_hash_stem(stem))
        })
        .collect();
    files.sort();

    tracing::debug!(
        dir = %dir.display(),
        types = types.as_str(),
        hash_only,
        found = files.len(),
        "discovered input files"
    );
    Ok(files)
}
