//! Post-linking quality checks.
//!
//! [`validate`] looks at a finished [`LinkResult`] and [`DocumentMetadata`]
//! and reports coverage ratios, style consistency, heading sanity and
//! metadata completeness as a sorted set of issue codes (see [`flags`]).
//! It never fails: an empty document yields a report full of flags.

pub mod flags;
pub mod headings;
pub mod metadata;

use std::collections::BTreeSet;

use citelink_core::{
    BucketKind, BucketResult, CitationOccurrence, DocumentMetadata, LinkResult, StyleLabel, Thresholds, ratio,
};
use citelink_parsing::{Signals, detect_signals, parse_headings, recommend_style_with_thresholds, style_alignment};
use serde::{Deserialize, Serialize};

pub use headings::{HeadingValidation, LevelJump, validate_headings};
pub use metadata::{MetadataValidation, email_author_link, validate_metadata};

/// Field completeness and match ratios over one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketQuality {
    pub bucket: Option<BucketKind>,
    pub occurrences: usize,
    pub resolved: usize,
    pub index_rate: f64,
    pub citation_rate: f64,
    pub context_rate: f64,
    pub footnote_rate: f64,
    pub occurrence_match_rate: f64,
    pub bib_coverage_rate: f64,
}

impl BucketQuality {
    pub fn from_bucket(kind: BucketKind, bucket: &BucketResult) -> Self {
        let n = bucket.results.len();
        let resolved = count(bucket, CitationOccurrence::is_resolved);
        Self {
            bucket: Some(kind),
            occurrences: n,
            resolved,
            index_rate: ratio(count(bucket, |o| !o.index.trim().is_empty()), n),
            citation_rate: ratio(count(bucket, |o| !o.intext_citation.trim().is_empty()), n),
            context_rate: ratio(count(bucket, |o| !o.preceding_text.trim().is_empty()), n),
            footnote_rate: ratio(resolved, n),
            occurrence_match_rate: bucket.total.occurrence_match_rate,
            bib_coverage_rate: bucket.total.bib_coverage_rate,
        }
    }
}

fn count(bucket: &BucketResult, pred: impl Fn(&CitationOccurrence) -> bool) -> usize {
    bucket.results.iter().filter(|o| pred(o)).count()
}

/// Declared/detected style checked against a fresh signal recommendation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleValidation {
    pub detected: StyleLabel,
    pub recommended: StyleLabel,
    pub aligned: bool,
    pub signals: Signals,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub dominant_quality: BucketQuality,
    pub footnotes_quality: BucketQuality,
    pub style_validation: StyleValidation,
    pub heading_validation: HeadingValidation,
    pub metadata_validation: MetadataValidation,
    /// Deduplicated and sorted.
    pub flags: Vec<String>,
}

impl ValidationReport {
    pub fn has_flag(&self, code: &str) -> bool {
        self.flags.iter().any(|f| f == code)
    }
}

/// Validate with the default [`Thresholds`].
pub fn validate(
    full_text: &str,
    references: &[String],
    link: &LinkResult,
    metadata: &DocumentMetadata,
) -> ValidationReport {
    validate_with_thresholds(full_text, references, link, metadata, &Thresholds::default())
}

pub fn validate_with_thresholds(
    full_text: &str,
    references: &[String],
    link: &LinkResult,
    metadata: &DocumentMetadata,
    thresholds: &Thresholds,
) -> ValidationReport {
    let dominant_quality = link
        .dominant
        .map(|kind| BucketQuality::from_bucket(kind, link.bucket(kind)))
        .unwrap_or_default();
    let footnotes_quality = BucketQuality::from_bucket(BucketKind::Footnotes, &link.footnotes);

    let reference_blocks = references.iter().filter(|r| !r.trim().is_empty()).count();
    let signals = detect_signals(full_text);
    let recommended = recommend_style_with_thresholds(&signals, reference_blocks, thresholds);
    let style_validation = StyleValidation {
        detected: link.style,
        recommended,
        aligned: style_alignment(link.style, recommended),
        signals,
    };

    let parsed = parse_headings(full_text);
    let heading_validation = validate_headings(&parsed);
    let metadata_validation = validate_metadata(metadata, parsed.len(), thresholds);

    let mut set: BTreeSet<String> = BTreeSet::new();
    let mut raise = |code: &str| {
        set.insert(code.to_string());
    };
    if reference_blocks == 0 {
        raise(flags::MISSING_REFERENCE_HEADING);
    }
    if !link.has_intext() {
        raise(flags::NO_INTEXT_CITATIONS);
    }
    if link.style == StyleLabel::Unknown {
        raise(flags::STYLE_UNKNOWN);
    }
    if let Some(dominant) = link.dominant_bucket() {
        let total = &dominant.total;
        if total.intext_total > 0 && total.occurrence_match_rate < thresholds.low_match_rate {
            raise(flags::DOMINANT_LOW_MATCH_RATE);
        }
        if total.bib_unique_total > 0 && total.bib_coverage_rate < thresholds.low_bib_coverage {
            raise(flags::DOMINANT_LOW_BIB_COVERAGE);
        }
    }
    if link.footnotes.total.intext_total > 0 && link.footnotes.total.success_occurrences == 0 {
        raise(flags::FOOTNOTES_UNRESOLVED);
    }
    if !style_validation.aligned {
        raise(flags::STYLE_SIGNAL_MISMATCH);
    }
    for code in heading_validation.flags() {
        raise(code);
    }
    for code in &metadata_validation.flags {
        raise(code.as_str());
    }

    let flags: Vec<String> = set.into_iter().collect();
    tracing::debug!(
        flags = flags.len(),
        style = link.style.as_str(),
        recommended = recommended.as_str(),
        "validated document"
    );

    ValidationReport {
        dominant_quality,
        footnotes_quality,
        style_validation,
        heading_validation,
        metadata_validation,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citelink_parsing::{extract, link};

    fn refs(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    #[test]
    fn test_empty_document_is_flagged_not_failed() {
        let result = link("", &[]);
        let report = validate("", &[], &result, &DocumentMetadata::default());
        for code in [
            flags::MISSING_REFERENCE_HEADING,
            flags::NO_INTEXT_CITATIONS,
            flags::STYLE_UNKNOWN,
            flags::META_MISSING_TITLE,
        ] {
            assert!(report.has_flag(code), "missing {code}");
        }
        assert_eq!(report.dominant_quality, BucketQuality::default());
        assert!(report.style_validation.aligned);
    }

    #[test]
    fn test_flags_sorted_and_unique() {
        let result = link("", &[]);
        let report = validate("", &[], &result, &DocumentMetadata::default());
        let mut sorted = report.flags.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(report.flags, sorted);
        assert!(report.flags.iter().all(|f| flags::ALL.contains(&f.as_str())));
    }

    #[test]
    fn test_low_match_rate_on_dominant_bucket() {
        let body = "One [1], two [2], three [3], four [4].";
        let references = refs("1. Only entry.");
        let result = link(body, &references);
        assert_eq!(result.dominant, Some(BucketKind::Numeric));
        let report = validate(body, &references, &result, &DocumentMetadata::default());
        assert_eq!(report.dominant_quality.occurrences, 4);
        assert_eq!(report.dominant_quality.resolved, 1);
        assert_eq!(report.dominant_quality.footnote_rate, 0.25);
        assert_eq!(report.dominant_quality.index_rate, 1.0);
        assert!(report.has_flag(flags::DOMINANT_LOW_MATCH_RATE));
        assert!(!report.has_flag(flags::MISSING_REFERENCE_HEADING));
        assert!(!report.has_flag(flags::NO_INTEXT_CITATIONS));
    }

    #[test]
    fn test_complete_article_passes_metadata_checks() {
        let text = "# A Study of X\nJane Doe, John Smith\nUniversity of Somewhere\njdoe@somewhere.edu\ndoi:10.1234/abc.5\n\n## Abstract\nThis paper studies X in depth.\n\n## 1 Introduction\nBody [1].";
        let references = refs("1. Entry one.");
        let result = link(text, &references);
        let meta = extract(text, &references, &parse_headings(text));
        let report = validate(text, &references, &result, &meta);
        assert!(
            report.metadata_validation.flags.is_empty(),
            "{:?}",
            report.metadata_validation.flags
        );
        assert_eq!(report.metadata_validation.heading_count, 3);
    }

    #[test]
    fn test_heading_flags_reach_report() {
        let text = "# Title\n### 2.3 Deep\n";
        let result = link(text, &[]);
        let report = validate(text, &[], &result, &DocumentMetadata::default());
        assert!(report.has_flag(flags::HEADING_LEVEL_JUMP));
        assert!(report.has_flag(flags::HEADING_MISSING_PARENT));
    }
}
