use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::Thresholds;

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub thresholds: Option<ThresholdsConfig>,
    pub batch: Option<BatchConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub superscript_min_definitions: Option<usize>,
    pub superscript_min_intext: Option<usize>,
    pub numeric_min_brackets: Option<usize>,
    pub numeric_min_definitions: Option<usize>,
    pub author_year_min_hits: Option<usize>,
    pub hybrid_min_numeric: Option<usize>,
    pub hybrid_min_author_year: Option<usize>,
    pub email_author_link_min: Option<f64>,
    pub low_match_rate: Option<f64>,
    pub low_bib_coverage: Option<f64>,
    pub fuzzy_surname_min: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchConfig {
    pub num_workers: Option<usize>,
    pub show_progress_every: Option<usize>,
    /// `both`, `md` or `json`.
    pub types: Option<String>,
    pub hash_only: Option<bool>,
    pub prefer_pages_text: Option<bool>,
}

impl ThresholdsConfig {
    /// Overlay the values present in the file onto `base`.
    pub fn apply(&self, base: Thresholds) -> Thresholds {
        Thresholds {
            superscript_min_definitions: self
                .superscript_min_definitions
                .unwrap_or(base.superscript_min_definitions),
            superscript_min_intext: self
                .superscript_min_intext
                .unwrap_or(base.superscript_min_intext),
            numeric_min_brackets: self
                .numeric_min_brackets
                .unwrap_or(base.numeric_min_brackets),
            numeric_min_definitions: self
                .numeric_min_definitions
                .unwrap_or(base.numeric_min_definitions),
            author_year_min_hits: self
                .author_year_min_hits
                .unwrap_or(base.author_year_min_hits),
            hybrid_min_numeric: self.hybrid_min_numeric.unwrap_or(base.hybrid_min_numeric),
            hybrid_min_author_year: self
                .hybrid_min_author_year
                .unwrap_or(base.hybrid_min_author_year),
            email_author_link_min: self
                .email_author_link_min
                .unwrap_or(base.email_author_link_min),
            low_match_rate: self.low_match_rate.unwrap_or(base.low_match_rate),
            low_bib_coverage: self.low_bib_coverage.unwrap_or(base.low_bib_coverage),
            fuzzy_surname_min: self.fuzzy_surname_min.unwrap_or(base.fuzzy_surname_min),
        }
    }
}

impl ConfigFile {
    /// Effective thresholds: file values over built-in defaults.
    pub fn thresholds(&self) -> Thresholds {
        match &self.thresholds {
            Some(t) => t.apply(Thresholds::default()),
            None => Thresholds::default(),
        }
    }
}

/// Platform config directory path: `<config_dir>/citelink/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("citelink").join("config.toml"))
}

/// Load config by cascading CWD `.citelink.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".citelink.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

macro_rules! pick {
    ($overlay:expr, $base:expr, $field:ident) => {
        $overlay
            .as_ref()
            .and_then(|o| o.$field.clone())
            .or_else(|| $base.as_ref().and_then(|b| b.$field.clone()))
    };
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    let (bt, ot) = (base.thresholds, overlay.thresholds);
    let (bb, ob) = (base.batch, overlay.batch);
    ConfigFile {
        thresholds: Some(ThresholdsConfig {
            superscript_min_definitions: pick!(ot, bt, superscript_min_definitions),
            superscript_min_intext: pick!(ot, bt, superscript_min_intext),
            numeric_min_brackets: pick!(ot, bt, numeric_min_brackets),
            numeric_min_definitions: pick!(ot, bt, numeric_min_definitions),
            author_year_min_hits: pick!(ot, bt, author_year_min_hits),
            hybrid_min_numeric: pick!(ot, bt, hybrid_min_numeric),
            hybrid_min_author_year: pick!(ot, bt, hybrid_min_author_year),
            email_author_link_min: pick!(ot, bt, email_author_link_min),
            low_match_rate: pick!(ot, bt, low_match_rate),
            low_bib_coverage: pick!(ot, bt, low_bib_coverage),
            fuzzy_surname_min: pick!(ot, bt, fuzzy_surname_min),
        }),
        batch: Some(BatchConfig {
            num_workers: pick!(ob, bb, num_workers),
            show_progress_every: pick!(ob, bb, show_progress_every),
            types: pick!(ob, bb, types),
            hash_only: pick!(ob, bb, hash_only),
            prefer_pages_text: pick!(ob, bb, prefer_pages_text),
        }),
    }
}
