//! Bibliographic metadata recovered from a document's front matter.

use serde::{Deserialize, Serialize};

/// Coarse publication genre inferred from front-matter keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    JournalArticle,
    ConferencePaper,
    Thesis,
    BookChapter,
    Report,
    Preprint,
    #[default]
    Unknown,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::JournalArticle => "journal_article",
            DocumentType::ConferencePaper => "conference_paper",
            DocumentType::Thesis => "thesis",
            DocumentType::BookChapter => "book_chapter",
            DocumentType::Report => "report",
            DocumentType::Preprint => "preprint",
            DocumentType::Unknown => "unknown",
        }
    }
}

/// Identifier lists, each deduplicated in first-seen order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifiers {
    pub doi: Vec<String>,
    pub issn: Vec<String>,
    pub isbn: Vec<String>,
    pub arxiv: Vec<String>,
    pub pmid: Vec<String>,
    pub pmcid: Vec<String>,
    pub urls: Vec<String>,
}

impl Identifiers {
    /// True when at least one scholarly identifier (not counting URLs) is present.
    pub fn has_scholarly(&self) -> bool {
        !(self.doi.is_empty()
            && self.issn.is_empty()
            && self.isbn.is_empty()
            && self.arxiv.is_empty()
            && self.pmid.is_empty()
            && self.pmcid.is_empty())
    }

    pub fn is_empty(&self) -> bool {
        !self.has_scholarly() && self.urls.is_empty()
    }
}

/// Labelled dates found near the front matter, kept as written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationDates {
    pub received: Option<String>,
    pub revised: Option<String>,
    pub accepted: Option<String>,
    pub submitted: Option<String>,
    pub published: Option<String>,
}

impl PublicationDates {
    pub fn is_empty(&self) -> bool {
        self.received.is_none()
            && self.revised.is_none()
            && self.accepted.is_none()
            && self.submitted.is_none()
            && self.published.is_none()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDocument {
    pub is_partial_document: bool,
    pub reasons: Vec<String>,
}

/// Derived metadata record. Re-running extraction produces a fresh record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub document_type: DocumentType,
    pub venue: Option<String>,
    pub publication_year: Option<String>,
    pub publication_dates: PublicationDates,
    pub authors: Vec<String>,
    pub affiliations: Vec<String>,
    pub emails: Vec<String>,
    pub orcids: Vec<String>,
    pub identifiers: Identifiers,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub keywords: Vec<String>,
    pub partial_document: PartialDocument,
}

impl DocumentMetadata {
    pub fn is_partial(&self) -> bool {
        self.partial_document.is_partial_document
    }

    /// Any identifier at all, ORCIDs included.
    pub fn has_identifier(&self) -> bool {
        !self.identifiers.is_empty() || !self.orcids.is_empty()
    }
}
