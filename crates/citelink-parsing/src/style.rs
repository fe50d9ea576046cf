//! Signal-based citation style classification.
//!
//! Five independent regex hit counts over the body text feed a fixed decision
//! list. The thresholds come from [`Thresholds`] and reproduce the calibrated
//! defaults unless overridden.

use citelink_core::{StyleLabel, Thresholds};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::config::ParsingConfig;
use crate::markers;

static SUPERSCRIPT_DEFINITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:[⁰¹²³⁴⁵⁶⁷⁸⁹]+|<sup>\s*\d{1,4}\s*</sup>|\^\{?\d{1,4}\}?)[ \t]*\S")
        .unwrap()
});

static NUMERIC_DEFINITION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^[ \t]*\d{1,4}\.[ \t]+\S").unwrap());

/// Raw hit counts gathered from body text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    pub superscript_intext: usize,
    pub superscript_definitions: usize,
    pub numeric_brackets: usize,
    pub numeric_definitions: usize,
    pub author_year: usize,
}

/// Count the five style signals in `text`.
pub fn detect_signals(text: &str) -> Signals {
    detect_signals_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`detect_signals`].
pub(crate) fn detect_signals_with_config(text: &str, config: &ParsingConfig) -> Signals {
    let signals = Signals {
        superscript_intext: markers::scan_superscript(text, config).len(),
        superscript_definitions: SUPERSCRIPT_DEFINITION_RE.find_iter(text).count(),
        numeric_brackets: markers::scan_numeric(text, config).len(),
        numeric_definitions: NUMERIC_DEFINITION_RE.find_iter(text).count(),
        author_year: markers::scan_author_year(text, config)
            .iter()
            .filter(|m| !m.narrative)
            .count(),
    };
    tracing::debug!(?signals, "style signals");
    signals
}

/// Recommend a style from signal counts using the default thresholds.
pub fn recommend_style(signals: &Signals, references_count: usize) -> StyleLabel {
    recommend_style_with_thresholds(signals, references_count, &Thresholds::default())
}

/// Decision list: superscript, hybrid, numeric, author-year, else unknown.
/// Hybrid is checked before the single-style numeric and author-year rules.
pub fn recommend_style_with_thresholds(
    signals: &Signals,
    references_count: usize,
    t: &Thresholds,
) -> StyleLabel {
    if signals.superscript_definitions >= t.superscript_min_definitions
        && signals.superscript_intext >= t.superscript_min_intext
    {
        return StyleLabel::Footnotes;
    }
    if signals.numeric_brackets >= t.hybrid_min_numeric
        && signals.author_year >= t.hybrid_min_author_year
    {
        return StyleLabel::Hybrid;
    }
    if signals.numeric_brackets >= t.numeric_min_brackets
        && (signals.numeric_definitions >= t.numeric_min_definitions || references_count > 0)
    {
        return StyleLabel::Numeric;
    }
    if signals.author_year >= t.author_year_min_hits {
        return StyleLabel::AuthorYear;
    }
    StyleLabel::Unknown
}

/// Styles each recommendation accepts as compatible.
const ALIGNMENT_TABLE: &[(StyleLabel, &[StyleLabel])] = &[
    (StyleLabel::Footnotes, &[StyleLabel::Footnotes]),
    (StyleLabel::Numeric, &[StyleLabel::Numeric, StyleLabel::Hybrid]),
    (StyleLabel::AuthorYear, &[StyleLabel::AuthorYear, StyleLabel::Hybrid]),
    (
        StyleLabel::Hybrid,
        &[StyleLabel::Hybrid, StyleLabel::Numeric, StyleLabel::AuthorYear],
    ),
];

/// Whether a detected/declared style is compatible with the signal-based
/// recommendation. An `Unknown` recommendation never conflicts.
pub fn style_alignment(detected: StyleLabel, recommended: StyleLabel) -> bool {
    if recommended == StyleLabel::Unknown {
        return true;
    }
    ALIGNMENT_TABLE
        .iter()
        .find(|(rec, _)| *rec == recommended)
        .is_some_and(|(_, accepted)| accepted.contains(&detected))
}
