//! Empirical thresholds used by style detection and validation.
//!
//! The defaults reproduce the calibrated behaviour of the existing pipeline.
//! They are tunable through the `[thresholds]` table of the config file; no
//! claim is made that they are optimal.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    /// Superscript style: minimum definition lines.
    pub superscript_min_definitions: usize,
    /// Superscript style: minimum in-text superscript hits.
    pub superscript_min_intext: usize,
    /// Numeric style: minimum `[n]` hits.
    pub numeric_min_brackets: usize,
    /// Numeric style: minimum `n. text` definition lines (or any reference block).
    pub numeric_min_definitions: usize,
    /// Author-year style: minimum parenthetical hits.
    pub author_year_min_hits: usize,
    /// Hybrid style: minimum numeric bracket hits.
    pub hybrid_min_numeric: usize,
    /// Hybrid style: minimum author-year hits.
    pub hybrid_min_author_year: usize,
    /// Below this email/author linkage ratio a soft flag is raised.
    pub email_author_link_min: f64,
    /// Dominant occurrence match rate below which `dominant_low_match_rate` is raised.
    pub low_match_rate: f64,
    /// Dominant bibliography coverage below which `dominant_low_bib_coverage` is raised.
    pub low_bib_coverage: f64,
    /// Minimum `rapidfuzz` ratio for an OCR-damaged surname to match.
    pub fuzzy_surname_min: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            superscript_min_definitions: 3,
            superscript_min_intext: 10,
            numeric_min_brackets: 10,
            numeric_min_definitions: 5,
            author_year_min_hits: 10,
            hybrid_min_numeric: 10,
            hybrid_min_author_year: 10,
            email_author_link_min: 0.25,
            low_match_rate: 0.5,
            low_bib_coverage: 0.3,
            fuzzy_surname_min: 0.85,
        }
    }
}
