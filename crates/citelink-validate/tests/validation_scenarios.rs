//! Validator over documents run through the full parsing pipeline.

use citelink_core::{Document, SourceType, StyleLabel};
use citelink_parsing::DocumentProcessor;
use citelink_validate::{ValidationReport, flags, validate};

fn run(full_text: &str, references: &[&str]) -> (citelink_parsing::ProcessedDocument, ValidationReport) {
    let doc = Document::new(
        full_text.to_string(),
        references.iter().map(|r| r.to_string()).collect(),
        1,
        SourceType::MdCache,
    );
    let processed = DocumentProcessor::new().process(&doc, None);
    let report = validate(&doc.full_text, &doc.references, &processed.link, &processed.metadata);
    (processed, report)
}

#[test]
fn test_table_of_contents_is_lenient() {
    let mut text = String::from("# Table of Contents\n");
    for (i, chapter) in ["Origins", "Doctrine", "Practice", "Courts", "States", "Agencies", "Remedies", "Outlook"]
        .iter()
        .enumerate()
    {
        text.push_str(&format!("{chapter} ........ {}\n", (i + 1) * 12));
    }
    let (processed, report) = run(&text, &[]);

    assert!(processed.metadata.partial_document.is_partial_document);
    assert!(report.has_flag(flags::META_PARTIAL_DOCUMENT));
    assert!(!report.has_flag(flags::META_MISSING_AUTHORS));
    assert!(!report.has_flag(flags::META_MISSING_ABSTRACT_OR_KEYWORDS));
    assert!(report.has_flag(flags::META_MISSING_ATTRIBUTION));
    assert!(report.has_flag(flags::MISSING_REFERENCE_HEADING));
}

#[test]
fn test_unresolved_superscripts_are_flagged() {
    let body = "First claim.¹ Second claim.² Third claim.³";
    let (processed, report) = run(body, &["Bibliography without note numbers."]);
    assert_eq!(processed.link.footnotes.total.intext_total, 3);
    assert_eq!(processed.link.footnotes.total.success_occurrences, 0);
    assert!(report.has_flag(flags::FOOTNOTES_UNRESOLVED));
    assert_eq!(report.footnotes_quality.occurrences, 3);
    assert_eq!(report.footnotes_quality.footnote_rate, 0.0);
    assert_eq!(report.footnotes_quality.context_rate, 1.0);
}

#[test]
fn test_declared_style_against_signals() {
    let mut body = String::new();
    let mut bib = String::new();
    let names = ["Smith", "Jones", "Brown", "Taylor", "Wilson", "Davies", "Evans", "Thomas", "Roberts", "Walker", "Wright", "Hughes"];
    for (i, name) in names.iter().enumerate() {
        let year = 2000 + i;
        body.push_str(&format!("One finding holds ({name}, {year}). "));
        bib.push_str(&format!("{name}, J. ({year}). A paper about things.\n\n"));
    }
    let doc = Document::new(body.clone(), vec![bib], 1, SourceType::MdCache);
    let processor = DocumentProcessor::new();

    let detected = processor.process(&doc, None);
    let report = validate(&doc.full_text, &doc.references, &detected.link, &detected.metadata);
    assert_eq!(report.style_validation.recommended, StyleLabel::AuthorYear);
    assert!(report.style_validation.aligned);
    assert!(!report.has_flag(flags::STYLE_SIGNAL_MISMATCH));

    let declared = processor.process(&doc, Some(StyleLabel::Footnotes));
    let report = validate(&doc.full_text, &doc.references, &declared.link, &declared.metadata);
    assert_eq!(report.style_validation.detected, StyleLabel::Footnotes);
    assert!(report.has_flag(flags::STYLE_SIGNAL_MISMATCH));
}

#[test]
fn test_report_is_deterministic() {
    let text = "# A Study of X\nJane Doe\n\n## 1 Intro\nClaim [1] and (Smith, 2019).";
    let (_, first) = run(text, &["1. Smith, J. (2019). Work."]);
    let (_, second) = run(text, &["1. Smith, J. (2019). Work."]);
    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}
