use citelink_core::text_utils::surname_key;
use citelink_core::{DocumentMetadata, Thresholds};
use serde::{Deserialize, Serialize};

use crate::flags;

/// Headings a document needs before its outline counts as present.
const MIN_HEADINGS: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataValidation {
    pub is_partial: bool,
    pub has_title: bool,
    pub has_authors: bool,
    pub has_abstract: bool,
    pub has_keywords: bool,
    pub has_identifier: bool,
    pub has_emails: bool,
    pub has_affiliations: bool,
    pub has_venue: bool,
    pub heading_count: usize,
    /// Fraction of emails whose local part contains an author surname.
    /// `None` unless both emails and authors are present.
    pub email_author_link: Option<f64>,
    pub flags: Vec<String>,
}

/// Fraction of `emails` whose local part contains some author's surname.
pub fn email_author_link(emails: &[String], authors: &[String]) -> Option<f64> {
    if emails.is_empty() || authors.is_empty() {
        return None;
    }
    let surnames: Vec<String> = authors
        .iter()
        .map(|a| surname_key(a))
        .filter(|s| s.len() >= 2)
        .collect();
    let linked = emails
        .iter()
        .filter(|email| {
            let local: String = email
                .split('@')
                .next()
                .unwrap_or("")
                .chars()
                .filter(|c| c.is_ascii_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            surnames.iter().any(|s| local.contains(s.as_str()))
        })
        .count();
    Some(linked as f64 / emails.len() as f64)
}

/// Presence checks with relaxed rules for partial documents.
pub fn validate_metadata(
    meta: &DocumentMetadata,
    heading_count: usize,
    thresholds: &Thresholds,
) -> MetadataValidation {
    let mut v = MetadataValidation {
        is_partial: meta.is_partial(),
        has_title: meta.title.as_deref().is_some_and(|t| !t.trim().is_empty()),
        has_authors: !meta.authors.is_empty(),
        has_abstract: meta.abstract_text.as_deref().is_some_and(|a| !a.trim().is_empty()),
        has_keywords: !meta.keywords.is_empty(),
        has_identifier: meta.has_identifier(),
        has_emails: !meta.emails.is_empty(),
        has_affiliations: !meta.affiliations.is_empty(),
        has_venue: meta.venue.is_some(),
        heading_count,
        email_author_link: email_author_link(&meta.emails, &meta.authors),
        flags: Vec::new(),
    };

    let mut out: Vec<&str> = Vec::new();
    if !v.has_title {
        out.push(flags::META_MISSING_TITLE);
    }
    if heading_count < MIN_HEADINGS {
        out.push(flags::META_INSUFFICIENT_HEADINGS);
    }
    if v.is_partial {
        out.push(flags::META_PARTIAL_DOCUMENT);
        if !(v.has_authors || v.has_venue || v.has_identifier) {
            out.push(flags::META_MISSING_ATTRIBUTION);
        }
    } else {
        if !v.has_authors {
            out.push(flags::META_MISSING_AUTHORS);
        }
        if !(v.has_abstract || v.has_keywords) {
            out.push(flags::META_MISSING_ABSTRACT_OR_KEYWORDS);
        }
        if !v.has_identifier {
            out.push(flags::META_MISSING_IDENTIFIER);
        }
        if !(v.has_emails || v.has_affiliations) {
            out.push(flags::META_MISSING_CONTACT);
        }
    }
    if v
        .email_author_link
        .is_some_and(|link| link < thresholds.email_author_link_min)
    {
        out.push(flags::META_LOW_EMAIL_AUTHOR_LINK);
    }

    v.flags = out.into_iter().map(str::to_string).collect();
    v
}
