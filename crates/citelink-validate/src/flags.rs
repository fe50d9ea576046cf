//! Issue codes emitted by the validator.

pub const MISSING_REFERENCE_HEADING: &str = "missing_reference_heading";
pub const NO_INTEXT_CITATIONS: &str = "no_intext_citations";
pub const STYLE_UNKNOWN: &str = "style_unknown";
pub const DOMINANT_LOW_MATCH_RATE: &str = "dominant_low_match_rate";
pub const DOMINANT_LOW_BIB_COVERAGE: &str = "dominant_low_bib_coverage";
pub const FOOTNOTES_UNRESOLVED: &str = "footnotes_unresolved";
pub const STYLE_SIGNAL_MISMATCH: &str = "style_signal_mismatch";

pub const HEADING_LEVEL_JUMP: &str = "heading_level_jump";
pub const HEADING_MISSING_PARENT: &str = "heading_missing_parent";

pub const META_MISSING_TITLE: &str = "meta_missing_title";
pub const META_MISSING_AUTHORS: &str = "meta_missing_authors";
pub const META_MISSING_ABSTRACT_OR_KEYWORDS: &str = "meta_missing_abstract_or_keywords";
pub const META_MISSING_IDENTIFIER: &str = "meta_missing_identifier";
pub const META_INSUFFICIENT_HEADINGS: &str = "meta_insufficient_headings";
pub const META_MISSING_CONTACT: &str = "meta_missing_contact";
pub const META_PARTIAL_DOCUMENT: &str = "meta_partial_document";
pub const META_MISSING_ATTRIBUTION: &str = "meta_missing_attribution";
/// Soft: emails rarely mention any author surname.
pub const META_LOW_EMAIL_AUTHOR_LINK: &str = "meta_low_email_author_link";

/// Every code, for reporting histograms.
pub const ALL: &[&str] = &[
    MISSING_REFERENCE_HEADING,
    NO_INTEXT_CITATIONS,
    STYLE_UNKNOWN,
    DOMINANT_LOW_MATCH_RATE,
    DOMINANT_LOW_BIB_COVERAGE,
    FOOTNOTES_UNRESOLVED,
    STYLE_SIGNAL_MISMATCH,
    HEADING_LEVEL_JUMP,
    HEADING_MISSING_PARENT,
    META_MISSING_TITLE,
    META_MISSING_AUTHORS,
    META_MISSING_ABSTRACT_OR_KEYWORDS,
    META_MISSING_IDENTIFIER,
    META_INSUFFICIENT_HEADINGS,
    META_MISSING_CONTACT,
    META_PARTIAL_DOCUMENT,
    META_MISSING_ATTRIBUTION,
    META_LOW_EMAIL_AUTHOR_LINK,
];
