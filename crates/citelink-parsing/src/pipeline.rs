use std::sync::Arc;
use std::time::Duration;

use citelink_core::{
    DefinitionIndexCache, Document, DocumentMetadata, Heading, LinkResult, ModelBackend, StyleLabel,
};
use serde::Serialize;

use crate::config::ParsingConfig;
use crate::linker::CitationLinker;
use crate::metadata::MetadataExtractor;
use crate::style::{self, Signals};
use crate::{section, text_processing};

/// Everything derived from one document by [`DocumentProcessor::process`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessedDocument {
    pub link: LinkResult,
    pub metadata: DocumentMetadata,
    pub headings: Vec<Heading>,
    pub signals: Signals,
}

/// A configurable document pipeline.
///
/// Holds one [`ParsingConfig`] shared by every step and exposes each step as a
/// method: normalise, parse headings, detect signals, link, extract metadata.
pub struct DocumentProcessor {
    config: ParsingConfig,
    linker: CitationLinker,
    metadata: MetadataExtractor,
}

impl Default for DocumentProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentProcessor {
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        Self {
            linker: CitationLinker::with_config(config.clone()),
            metadata: MetadataExtractor::with_config(config.clone()),
            config,
        }
    }

    /// Share a definition-index cache across documents.
    pub fn with_cache(mut self, cache: Arc<DefinitionIndexCache>) -> Self {
        self.linker = self.linker.with_cache(cache);
        self
    }

    /// Use a model backend as a title fallback.
    pub fn with_backend(mut self, backend: Arc<dyn ModelBackend>, timeout: Duration) -> Self {
        self.metadata = self.metadata.with_backend(backend, timeout);
        self
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Turn page texts into `(full_text, references)` (step 1).
    pub fn normalize<S: AsRef<str>>(&self, pages: &[S]) -> (String, Vec<String>) {
        text_processing::normalize_with_config(pages, &self.config)
    }

    /// Markdown headings of the body (step 2).
    pub fn parse_headings(&self, text: &str) -> Vec<Heading> {
        section::parse_headings(text)
    }

    /// Style signal counts over the body (step 3).
    pub fn detect_signals(&self, text: &str) -> Signals {
        style::detect_signals_with_config(text, &self.config)
    }

    /// Link citations to definitions (step 4).
    pub fn link(
        &self,
        full_text: &str,
        references: &[String],
        declared: Option<StyleLabel>,
    ) -> LinkResult {
        self.linker.link_with_style(full_text, references, declared)
    }

    /// Recover front-matter metadata (step 5).
    pub fn extract_metadata(
        &self,
        full_text: &str,
        references: &[String],
        headings: &[Heading],
    ) -> DocumentMetadata {
        self.metadata.extract(full_text, references, headings)
    }

    /// Run steps 2-5 over an already normalised document.
    pub fn process(&self, document: &Document, declared: Option<StyleLabel>) -> ProcessedDocument {
        let headings = self.parse_headings(&document.full_text);
        let signals = self.detect_signals(&document.full_text);
        let link = self.link(&document.full_text, &document.references, declared);
        let metadata = self.extract_metadata(&document.full_text, &document.references, &headings);
        tracing::debug!(
            style = link.style.as_str(),
            dominant = link.dominant.map(|b| b.as_str()).unwrap_or("none"),
            headings = headings.len(),
            "processed document"
        );
        ProcessedDocument {
            link,
            metadata,
            headings,
            signals,
        }
    }
}
