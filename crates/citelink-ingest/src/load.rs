//! Loading one input file into a [`Document`].
//!
//! Three shapes are recognised, tried in this order:
//!
//! - a cache object with `pages_text` and optionally `full_text`,
//!   `references` and `citations` (the shape [`write_cache`] produces)
//! - a raw OCR payload, either `response.response.body.pages[{index, markdown|text}]`
//!   or a single top-level `markdown` string
//! - plain markdown, with pages separated by form feeds (`.md` files only)

use std::path::{Path, PathBuf};

use citelink_core::{Document, LinkResult, SourceType};
use citelink_parsing::normalize;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::IngestError;

const PAGE_BREAK: char = '\u{000C}';

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    /// Rebuild full text and references from the pages even when the cache
    /// object stores a `full_text`.
    pub prefer_pages_text: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            prefer_pages_text: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub path: PathBuf,
    pub document: Document,
    pub pages: Vec<String>,
    /// `citations` from a previous run, kept verbatim.
    pub prior_citations: Option<Value>,
}

impl LoadedDocument {
    /// File stem, used as the document's id.
    pub fn id(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

fn page_text(item: &Value) -> Option<String> {
    match item {
        Value::String(s) => Some(s.clone()),
        Value::Object(obj) => ["markdown", "text"]
            .iter()
            .find_map(|k| obj.get(*k).and_then(Value::as_str))
            .map(str::to_string),
        _ => None,
    }
}

fn string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Pages of a raw OCR payload, ordered by their `index`.
fn raw_pages(obj: &Map<String, Value>) -> Option<Vec<String>> {
    if let Some(pages) = obj
        .get("response")
        .and_then(|v| v.get("response"))
        .and_then(|v| v.get("body"))
        .and_then(|v| v.get("pages"))
        .and_then(Value::as_array)
    {
        let mut indexed: Vec<(u64, String)> = pages
            .iter()
            .enumerate()
            .filter_map(|(pos, page)| {
                let index = page.get("index").and_then(Value::as_u64).unwrap_or(pos as u64);
                page_text(page).map(|text| (index, text))
            })
            .collect();
        indexed.sort_by_key(|(index, _)| *index);
        return Some(indexed.into_iter().map(|(_, text)| text).collect());
    }
    obj.get("markdown")
        .and_then(Value::as_str)
        .map(|md| vec![md.to_string()])
}

fn document_from_pages(pages: &[String], source_type: SourceType) -> Document {
    let (full_text, references) = normalize(pages);
    Document::new(full_text, references, pages.len(), source_type)
}

fn from_cache_object(
    path: &Path,
    obj: &Map<String, Value>,
    options: &LoadOptions,
    source_type: SourceType,
) -> LoadedDocument {
    let pages: Vec<String> = obj
        .get("pages_text")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(page_text).collect())
        .unwrap_or_default();
    let stored = obj
        .get("full_text")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty());

    let document = match stored {
        Some(full_text) if !(options.prefer_pages_text && !pages.is_empty()) => Document::new(
            full_text.to_string(),
            string_list(obj.get("references")),
            pages.len(),
            source_type,
        ),
        _ => document_from_pages(&pages, source_type),
    };
    LoadedDocument {
        path: path.to_path_buf(),
        document,
        pages,
        prior_citations: obj.get("citations").cloned(),
    }
}

/// Read and normalise one input file.
pub fn load_document(path: &Path, options: &LoadOptions) -> Result<LoadedDocument, IngestError> {
    let text = std::fs::read_to_string(path).map_err(|source| IngestError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let is_json = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("json"));
    let source_type = if is_json {
        SourceType::RawJson
    } else {
        SourceType::MdCache
    };

    let parsed: Option<Value> = match serde_json::from_str(&text) {
        Ok(value) => Some(value),
        Err(source) if is_json => {
            return Err(IngestError::Json {
                path: path.to_path_buf(),
                source,
            });
        }
        Err(_) => None,
    };

    if let Some(Value::Object(obj)) = &parsed {
        if obj.contains_key("pages_text") || obj.contains_key("full_text") {
            tracing::trace!(path = %path.display(), "cache object");
            return Ok(from_cache_object(path, obj, options, source_type));
        }
        if let Some(pages) = raw_pages(obj) {
            tracing::trace!(path = %path.display(), pages = pages.len(), "raw OCR payload");
            return Ok(LoadedDocument {
                path: path.to_path_buf(),
                document: document_from_pages(&pages, source_type),
                pages,
                prior_citations: None,
            });
        }
    }
    if is_json || parsed.as_ref().is_some_and(Value::is_object) {
        return Err(IngestError::UnrecognizedShape(path.to_path_buf()));
    }

    let pages: Vec<String> = text.split(PAGE_BREAK).map(str::to_string).collect();
    tracing::trace!(path = %path.display(), pages = pages.len(), "plain markdown");
    Ok(LoadedDocument {
        path: path.to_path_buf(),
        document: document_from_pages(&pages, source_type),
        pages,
        prior_citations: None,
    })
}

#[derive(Serialize)]
struct CacheObject<'a> {
    pages_text: &'a [String],
    full_text: &'a str,
    references: &'a [String],
    citations: &'a LinkResult,
}

/// Write the cache object for `loaded` next to its input as `<stem>.md`.
pub fn write_cache(loaded: &LoadedDocument, link: &LinkResult) -> Result<PathBuf, IngestError> {
    let target = loaded.path.with_extension("md");
    let cache = CacheObject {
        pages_text: &loaded.pages,
        full_text: &loaded.document.full_text,
        references: &loaded.document.references,
        citations: link,
    };
    let json = serde_json::to_string_pretty(&cache).map_err(|source| IngestError::Json {
        path: target.clone(),
        source,
    })?;
    std::fs::write(&target, json).map_err(|source| IngestError::Io {
        path: target.clone(),
        source,
    })?;
    tracing::debug!(path = %target.display(), "wrote cache");
    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_raw_pages_sorted_by_index() {
        let dir = tempfile::tempdir().unwrap();
        let payload = json!({"response": {"response": {"body": {"pages": [
            {"index": 1, "markdown": "Second page.\n\n# References\n1. Entry."},
            {"index": 0, "text": "# Title\nFirst page [1]."}
        ]}}}});
        let path = write(dir.path(), "doc.json", &payload.to_string());
        let loaded = load_document(&path, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.pages[0], "# Title\nFirst page [1].");
        assert_eq!(loaded.document.pages_count, 2);
        assert_eq!(loaded.document.source_type, SourceType::RawJson);
        assert!(loaded.document.full_text.starts_with("# Title"));
        assert_eq!(loaded.document.references.len(), 1);
        assert!(loaded.document.references[0].contains("1. Entry."));
    }

    #[test]
    fn test_top_level_markdown() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "doc.json", &json!({"markdown": "# Only page"}).to_string());
        let loaded = load_document(&path, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.pages, vec!["# Only page"]);
    }

    #[test]
    fn test_cache_object_respects_prefer_pages() {
        let dir = tempfile::tempdir().unwrap();
        let cache = json!({
            "pages_text": ["Page text.", {"markdown": "More."}],
            "full_text": "Stored text.",
            "references": ["1. Stored entry."],
            "citations": {"numeric": {}}
        });
        let path = write(dir.path(), "doc.md", &cache.to_string());

        let stored = load_document(&path, &LoadOptions { prefer_pages_text: false }).unwrap();
        assert_eq!(stored.document.full_text, "Stored text.");
        assert_eq!(stored.document.references, vec!["1. Stored entry."]);
        assert_eq!(stored.document.source_type, SourceType::MdCache);
        assert!(stored.prior_citations.is_some());

        let rebuilt = load_document(&path, &LoadOptions::default()).unwrap();
        assert!(rebuilt.document.full_text.contains("Page text."));
        assert!(rebuilt.document.full_text.contains("More."));
        assert_eq!(rebuilt.pages.len(), 2);
    }

    #[test]
    fn test_plain_markdown_split_on_form_feed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(dir.path(), "doc.md", "# Title\nOne.\u{000C}Two.");
        let loaded = load_document(&path, &LoadOptions::default()).unwrap();
        assert_eq!(loaded.pages, vec!["# Title\nOne.", "Two."]);
        assert_eq!(loaded.id(), "doc");
    }

    #[test]
    fn test_bad_inputs() {
        let dir = tempfile::tempdir().unwrap();
        let bad = write(dir.path(), "bad.json", "{not json");
        assert_eq!(load_document(&bad, &LoadOptions::default()).unwrap_err().kind(), "Json");

        let odd = write(dir.path(), "odd.json", r#"{"unexpected": true}"#);
        assert_eq!(
            load_document(&odd, &LoadOptions::default()).unwrap_err().kind(),
            "UnrecognizedShape"
        );

        let missing = dir.path().join("missing.md");
        assert_eq!(load_document(&missing, &LoadOptions::default()).unwrap_err().kind(), "Io");
    }
}
