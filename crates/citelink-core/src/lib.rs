use serde::{Deserialize, Serialize};

pub mod backend;
pub mod cache;
pub mod config_file;
pub mod metadata;
pub mod text_utils;
pub mod thresholds;

// Re-export for convenience
pub use backend::{BackendError, ModelBackend, ModelRequest, ModelResponse};
pub use cache::{CacheStats, DefinitionEntry, DefinitionIndex, DefinitionIndexCache};
pub use config_file::ConfigFile;
pub use metadata::{DocumentMetadata, DocumentType, Identifiers, PartialDocument, PublicationDates};
pub use thresholds::Thresholds;

/// Where a [`Document`] was reconstituted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// A previously written markdown cache (cache object or plain markdown).
    MdCache,
    /// A raw OCR batch payload.
    RawJson,
}

impl SourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceType::MdCache => "md_cache",
            SourceType::RawJson => "raw_json",
        }
    }
}

/// One reconstituted text unit: cleaned body plus the trailing reference block(s).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub full_text: String,
    pub references: Vec<String>,
    pub pages_count: usize,
    pub source_type: SourceType,
}

impl Document {
    pub fn new(
        full_text: String,
        references: Vec<String>,
        pages_count: usize,
        source_type: SourceType,
    ) -> Self {
        Self {
            full_text,
            references,
            pages_count,
            source_type,
        }
    }

    /// All reference blocks joined with a blank line.
    pub fn references_text(&self) -> String {
        join_references(&self.references)
    }

    pub fn is_empty(&self) -> bool {
        self.full_text.trim().is_empty() && self.references.iter().all(|r| r.trim().is_empty())
    }
}

/// Join raw reference blocks the same way everywhere in the pipeline.
pub fn join_references(references: &[String]) -> String {
    references
        .iter()
        .map(|r| r.as_str())
        .filter(|r| !r.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// The citation convention buckets the linker fills independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketKind {
    Footnotes,
    Tex,
    Numeric,
    AuthorYear,
}

impl BucketKind {
    pub const ALL: [BucketKind; 4] = [
        BucketKind::Footnotes,
        BucketKind::Tex,
        BucketKind::Numeric,
        BucketKind::AuthorYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BucketKind::Footnotes => "footnotes",
            BucketKind::Tex => "tex",
            BucketKind::Numeric => "numeric",
            BucketKind::AuthorYear => "author_year",
        }
    }

    /// The style label a dominant bucket reports as.
    pub fn style_label(&self) -> StyleLabel {
        match self {
            BucketKind::Footnotes | BucketKind::Tex => StyleLabel::Footnotes,
            BucketKind::Numeric => StyleLabel::Numeric,
            BucketKind::AuthorYear => StyleLabel::AuthorYear,
        }
    }
}

/// Document-level citation style classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleLabel {
    Footnotes,
    Numeric,
    AuthorYear,
    Hybrid,
    #[default]
    Unknown,
}

/// Externally declared style names and the label each maps to.
const STYLE_LEXICON: &[(&str, StyleLabel)] = &[
    ("footnotes", StyleLabel::Footnotes),
    ("footnote", StyleLabel::Footnotes),
    ("endnotes", StyleLabel::Footnotes),
    ("endnote", StyleLabel::Footnotes),
    ("tex", StyleLabel::Footnotes),
    ("superscript", StyleLabel::Footnotes),
    ("oscola", StyleLabel::Footnotes),
    ("bluebook", StyleLabel::Footnotes),
    ("chicago_notes", StyleLabel::Footnotes),
    ("numeric", StyleLabel::Numeric),
    ("numbered", StyleLabel::Numeric),
    ("ieee", StyleLabel::Numeric),
    ("vancouver", StyleLabel::Numeric),
    ("bracket", StyleLabel::Numeric),
    ("author_year", StyleLabel::AuthorYear),
    ("authoryear", StyleLabel::AuthorYear),
    ("apa", StyleLabel::AuthorYear),
    ("harvard", StyleLabel::AuthorYear),
    ("mla", StyleLabel::AuthorYear),
    ("chicago_author_date", StyleLabel::AuthorYear),
    ("hybrid", StyleLabel::Hybrid),
    ("mixed", StyleLabel::Hybrid),
];

impl StyleLabel {
    /// Map a free-form style name onto a label. Unrecognised names are `Unknown`.
    pub fn parse(label: &str) -> StyleLabel {
        let norm: String = label
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| if c == '-' || c == ' ' { '_' } else { c })
            .collect();
        STYLE_LEXICON
            .iter()
            .find(|(name, _)| *name == norm)
            .map(|(_, style)| *style)
            .unwrap_or(StyleLabel::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StyleLabel::Footnotes => "footnotes",
            StyleLabel::Numeric => "numeric",
            StyleLabel::AuthorYear => "author_year",
            StyleLabel::Hybrid => "hybrid",
            StyleLabel::Unknown => "unknown",
        }
    }

    /// Bucket a declared style resolves to. `Hybrid` and `Unknown` have no
    /// single bucket and are left to occurrence counts.
    pub fn preferred_bucket(&self) -> Option<BucketKind> {
        match self {
            StyleLabel::Footnotes => Some(BucketKind::Tex),
            StyleLabel::Numeric => Some(BucketKind::Numeric),
            StyleLabel::AuthorYear => Some(BucketKind::AuthorYear),
            StyleLabel::Hybrid | StyleLabel::Unknown => None,
        }
    }
}

/// One in-text citation marker's resolution attempt.
///
/// `footnote` is empty exactly when resolution failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CitationOccurrence {
    pub index: String,
    pub intext_citation: String,
    pub preceding_text: String,
    pub footnote: String,
}

impl CitationOccurrence {
    pub fn is_resolved(&self) -> bool {
        !self.footnote.is_empty()
    }
}

/// Aggregate counts and derived rates for one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleBucket {
    pub intext_total: usize,
    pub success_occurrences: usize,
    pub success_unique: usize,
    pub bib_unique_total: usize,
    pub occurrence_match_rate: f64,
    pub bib_coverage_rate: f64,
    pub success_percentage: f64,
}

impl StyleBucket {
    /// Build a bucket from raw counts. Rates are 0 when their denominator is 0.
    pub fn from_counts(
        intext_total: usize,
        success_occurrences: usize,
        success_unique: usize,
        bib_unique_total: usize,
    ) -> Self {
        let occurrence_match_rate = ratio(success_occurrences, intext_total);
        let bib_coverage_rate = ratio(success_unique, bib_unique_total);
        Self {
            intext_total,
            success_occurrences,
            success_unique,
            bib_unique_total,
            occurrence_match_rate,
            bib_coverage_rate,
            success_percentage: occurrence_match_rate * 100.0,
        }
    }
}

/// `num / den`, or 0 when `den` is 0.
pub fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Occurrences plus totals for one bucket.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BucketResult {
    pub results: Vec<CitationOccurrence>,
    pub total: StyleBucket,
}

/// Output of the citation linker for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LinkResult {
    pub footnotes: BucketResult,
    pub tex: BucketResult,
    pub numeric: BucketResult,
    pub author_year: BucketResult,
    pub style: StyleLabel,
    pub dominant: Option<BucketKind>,
}

impl LinkResult {
    pub fn bucket(&self, kind: BucketKind) -> &BucketResult {
        match kind {
            BucketKind::Footnotes => &self.footnotes,
            BucketKind::Tex => &self.tex,
            BucketKind::Numeric => &self.numeric,
            BucketKind::AuthorYear => &self.author_year,
        }
    }

    pub fn bucket_mut(&mut self, kind: BucketKind) -> &mut BucketResult {
        match kind {
            BucketKind::Footnotes => &mut self.footnotes,
            BucketKind::Tex => &mut self.tex,
            BucketKind::Numeric => &mut self.numeric,
            BucketKind::AuthorYear => &mut self.author_year,
        }
    }

    pub fn dominant_bucket(&self) -> Option<&BucketResult> {
        self.dominant.map(|kind| self.bucket(kind))
    }

    /// Whether any bucket scanned at least one marker.
    pub fn has_intext(&self) -> bool {
        BucketKind::ALL
            .iter()
            .any(|kind| self.bucket(*kind).total.intext_total > 0)
    }
}

/// A markdown heading line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Heading {
    pub level: usize,
    pub text: String,
    /// 0-based line number in the text the heading was parsed from.
    pub line: usize,
    /// Leading section number such as `2` or `2.3`, when present.
    pub numbering: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_style_bucket_zero_denominators() {
        let b = StyleBucket::from_counts(0, 0, 0, 0);
        assert_eq!(b.occurrence_match_rate, 0.0);
        assert_eq!(b.bib_coverage_rate, 0.0);
        assert_eq!(b.success_percentage, 0.0);
    }

    #[test]
    fn test_style_bucket_rates() {
        let b = StyleBucket::from_counts(4, 3, 2, 8);
        assert!((b.occurrence_match_rate - 0.75).abs() < f64::EPSILON);
        assert!((b.bib_coverage_rate - 0.25).abs() < f64::EPSILON);
        assert!((b.success_percentage - 75.0).abs() < 1e-9);
    }

    #[test]
    fn test_style_label_parse() {
        assert_eq!(StyleLabel::parse("APA"), StyleLabel::AuthorYear);
        assert_eq!(StyleLabel::parse("author-year"), StyleLabel::AuthorYear);
        assert_eq!(StyleLabel::parse(" tex "), StyleLabel::Footnotes);
        assert_eq!(StyleLabel::parse("IEEE"), StyleLabel::Numeric);
        assert_eq!(StyleLabel::parse("hybrid"), StyleLabel::Hybrid);
        assert_eq!(StyleLabel::parse("klingon"), StyleLabel::Unknown);
    }

    #[test]
    fn test_preferred_bucket() {
        assert_eq!(
            StyleLabel::Footnotes.preferred_bucket(),
            Some(BucketKind::Tex)
        );
        assert_eq!(StyleLabel::Hybrid.preferred_bucket(), None);
    }

    #[test]
    fn test_bucket_kind_serde_names() {
        let json = serde_json::to_string(&BucketKind::AuthorYear).unwrap();
        assert_eq!(json, "\"author_year\"");
        let json = serde_json::to_string(&SourceType::MdCache).unwrap();
        assert_eq!(json, "\"md_cache\"");
    }

    #[test]
    fn test_join_references_skips_blank_blocks() {
        let refs = vec!["A".to_string(), "  ".to_string(), "B".to_string()];
        assert_eq!(join_references(&refs), "A\n\nB");
    }

    #[test]
    fn test_link_result_has_intext() {
        let mut link = LinkResult::default();
        assert!(!link.has_intext());
        link.numeric.total = StyleBucket::from_counts(1, 0, 0, 0);
        assert!(link.has_intext());
    }
}
