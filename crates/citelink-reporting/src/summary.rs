//! Aggregation over per-document records.

use std::collections::BTreeMap;

use citelink_validate::flags;
use serde::{Deserialize, Serialize};

use crate::types::{DocumentRecord, ProcessedRecord};

/// Metadata fields whose presence rate is reported.
const PRESENCE_FIELDS: &[(&str, fn(&ProcessedRecord) -> bool)] = &[
    ("title", |r| r.validation.metadata_validation.has_title),
    ("authors", |r| r.validation.metadata_validation.has_authors),
    ("abstract", |r| r.validation.metadata_validation.has_abstract),
    ("keywords", |r| r.validation.metadata_validation.has_keywords),
    ("identifier", |r| r.validation.metadata_validation.has_identifier),
    ("emails", |r| r.validation.metadata_validation.has_emails),
    ("affiliations", |r| r.validation.metadata_validation.has_affiliations),
    ("venue", |r| r.validation.metadata_validation.has_venue),
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub documents_total: usize,
    pub documents_ok: usize,
    pub documents_failed: usize,
    pub failed_files: Vec<String>,
    pub style_counts: BTreeMap<String, usize>,
    /// `"none"` counts documents without a dominant bucket.
    pub dominant_counts: BTreeMap<String, usize>,
    pub dominant_intext_total: usize,
    pub dominant_success_total: usize,
    /// Σ success / Σ in-text over each document's dominant bucket.
    pub weighted_match_rate: f64,
    pub docs_with_no_intext: usize,
    pub missing_reference_heading: usize,
    pub partial_documents: usize,
    pub flag_counts: BTreeMap<String, usize>,
    pub metadata_presence: BTreeMap<String, f64>,
    /// Set when the run stopped before every file was submitted.
    pub cancelled: bool,
}

impl Summary {
    pub fn from_records(records: &[DocumentRecord], cancelled: bool) -> Self {
        let mut s = Summary {
            documents_total: records.len(),
            cancelled,
            ..Summary::default()
        };

        let processed: Vec<&ProcessedRecord> = records.iter().filter_map(DocumentRecord::as_processed).collect();
        s.documents_ok = processed.len();
        s.documents_failed = records.len() - processed.len();
        s.failed_files = records
            .iter()
            .filter(|r| r.as_processed().is_none())
            .map(|r| r.file().to_string())
            .collect();

        for record in &processed {
            *s.style_counts.entry(record.style.as_str().to_string()).or_default() += 1;
            let dominant = record.dominant.map(|b| b.as_str()).unwrap_or("none");
            *s.dominant_counts.entry(dominant.to_string()).or_default() += 1;

            if let Some(bucket) = record.citations.dominant_bucket() {
                s.dominant_intext_total += bucket.total.intext_total;
                s.dominant_success_total += bucket.total.success_occurrences;
            }
            if !record.citations.has_intext() {
                s.docs_with_no_intext += 1;
            }
            if record.validation.has_flag(flags::MISSING_REFERENCE_HEADING) {
                s.missing_reference_heading += 1;
            }
            if record.metadata.is_partial() {
                s.partial_documents += 1;
            }
            for flag in &record.validation.flags {
                *s.flag_counts.entry(flag.clone()).or_default() += 1;
            }
        }
        s.weighted_match_rate = citelink_core::ratio(s.dominant_success_total, s.dominant_intext_total);

        for (name, present) in PRESENCE_FIELDS {
            let count = processed.iter().filter(|&&r| present(r)).count();
            s.metadata_presence
                .insert(name.to_string(), citelink_core::ratio(count, processed.len()));
        }
        s
    }
}
