//! Reference payload normalisation.
//!
//! Stored references arrive in many shapes: a flat list of strings or
//! objects, or objects that wrap the list under one of several keys, possibly
//! several levels deep. [`ReferencePayload::entries`] walks the known wrapper
//! keys down to [`MAX_DEPTH`] and yields flat [`ReferenceEntry`] values.

use citelink_core::{BucketKind, LinkResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Nesting levels explored before a payload is given up on.
pub const MAX_DEPTH: usize = 6;

/// Keys under which a list of references may be wrapped.
const WRAPPER_KEYS: &[&str] = &[
    "references",
    "refs",
    "citations",
    "results",
    "items",
    "entries",
    "data",
    "footnotes",
    "tex",
    "numeric",
    "author_year",
];

const RAW_KEYS: &[&str] = &["raw", "text", "reference", "footnote", "citation"];
const ANCHOR_KEYS: &[&str] = &["citation_anchor", "anchor", "intext_citation", "marker"];
const CONTEXT_KEYS: &[&str] = &["context", "preceding_text"];
const NUMBER_KEYS: &[&str] = &["footnote_number", "index", "number", "note"];
const PAGE_KEYS: &[&str] = &["page_index", "page"];
const TYPE_KEYS: &[&str] = &["citation_type", "type"];
const VENUE_KEYS: &[&str] = &["venue", "journal", "container_title", "container-title"];

/// One cited reference as seen from the citing document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub raw: String,
    pub citation_anchor: String,
    pub context: String,
    pub footnote_number: Option<u32>,
    pub page_index: Option<usize>,
    pub citation_type: String,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub title: Option<String>,
    pub venue: Option<String>,
    pub url: Option<String>,
    pub doi: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
}

impl ReferenceEntry {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into(),
            ..Self::default()
        }
    }

    pub fn with_footnote_number(mut self, n: u32) -> Self {
        self.footnote_number = Some(n);
        self
    }

    /// Something to build a work from.
    pub fn is_usable(&self) -> bool {
        !self.raw.trim().is_empty() || self.title.as_deref().is_some_and(|t| !t.trim().is_empty())
    }

    fn from_object(obj: &Map<String, Value>) -> Self {
        Self {
            raw: string_field(obj, RAW_KEYS).unwrap_or_default(),
            citation_anchor: string_field(obj, ANCHOR_KEYS).unwrap_or_default(),
            context: string_field(obj, CONTEXT_KEYS).unwrap_or_default(),
            footnote_number: string_field(obj, NUMBER_KEYS).and_then(|s| s.trim().parse().ok()),
            page_index: string_field(obj, PAGE_KEYS).and_then(|s| s.trim().parse().ok()),
            citation_type: string_field(obj, TYPE_KEYS).unwrap_or_default(),
            authors: authors_field(obj),
            year: string_field(obj, &["year"]),
            title: string_field(obj, &["title"]),
            venue: string_field(obj, VENUE_KEYS),
            url: string_field(obj, &["url"]),
            doi: string_field(obj, &["doi"]),
            abstract_text: string_field(obj, &["abstract"]),
        }
    }
}

/// First key present as a non-empty string or number.
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn authors_field(obj: &Map<String, Value>) -> Vec<String> {
    match obj.get("authors").or_else(|| obj.get("author")) {
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| match v {
                Value::String(s) => Some(s.trim().to_string()),
                Value::Object(o) => string_field(o, &["family", "name", "literal"]),
                _ => None,
            })
            .filter(|s| !s.is_empty())
            .collect(),
        _ => Vec::new(),
    }
}

fn is_entry_object(obj: &Map<String, Value>) -> bool {
    RAW_KEYS.iter().chain(&["title"]).any(|k| matches!(obj.get(*k), Some(Value::String(_))))
}

/// The two shapes a stored reference list comes in.
#[derive(Debug, Clone, PartialEq)]
pub enum ReferencePayload {
    Flat(Vec<Value>),
    Wrapped(Map<String, Value>),
}

impl ReferencePayload {
    /// `None` for scalars.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(items) => Some(Self::Flat(items)),
            Value::Object(map) => Some(Self::Wrapped(map)),
            _ => None,
        }
    }

    /// Flatten into entries, dropping anything unusable.
    pub fn entries(&self) -> Vec<ReferenceEntry> {
        let mut out = Vec::new();
        match self {
            Self::Flat(items) => collect_list(items, 0, &mut out),
            Self::Wrapped(map) => collect_object(map, 0, &mut out),
        }
        out.retain(ReferenceEntry::is_usable);
        out
    }
}

fn collect_list(items: &[Value], depth: usize, out: &mut Vec<ReferenceEntry>) {
    for item in items {
        match item {
            Value::String(s) => out.push(ReferenceEntry::new(s.trim())),
            Value::Object(obj) => collect_object(obj, depth, out),
            Value::Array(inner) if depth < MAX_DEPTH => collect_list(inner, depth + 1, out),
            _ => {}
        }
    }
}

fn collect_object(obj: &Map<String, Value>, depth: usize, out: &mut Vec<ReferenceEntry>) {
    if is_entry_object(obj) {
        out.push(ReferenceEntry::from_object(obj));
        return;
    }
    if depth >= MAX_DEPTH {
        tracing::debug!(depth, "reference payload nested too deep");
        return;
    }
    for key in WRAPPER_KEYS {
        match obj.get(*key) {
            Some(Value::Array(items)) => collect_list(items, depth + 1, out),
            Some(Value::Object(inner)) => collect_object(inner, depth + 1, out),
            _ => {}
        }
    }
}

/// Resolved occurrences of the footnotes bucket and the dominant bucket.
pub fn entries_from_link_result(link: &LinkResult) -> Vec<ReferenceEntry> {
    let mut kinds = vec![BucketKind::Footnotes];
    if let Some(dominant) = link.dominant
        && dominant != BucketKind::Footnotes
    {
        kinds.push(dominant);
    }
    kinds
        .into_iter()
        .flat_map(|kind| {
            link.bucket(kind)
                .results
                .iter()
                .filter(|o| o.is_resolved())
                .map(move |o| ReferenceEntry {
                    raw: o.footnote.clone(),
                    citation_anchor: o.intext_citation.clone(),
                    context: o.preceding_text.clone(),
                    footnote_number: o.index.parse().ok(),
                    citation_type: kind.as_str().to_string(),
                    ..ReferenceEntry::default()
                })
        })
        .collect()
}
