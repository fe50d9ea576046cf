//! Per-document citation graph.

use std::collections::{HashMap, HashSet};

use citelink_core::text_utils::{
    collapse_whitespace, find_year, first_author_surname, slugify, stable_hash, surname_key,
    truncate_chars,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::model::{Edge, LocalGraph, Node, NodeKind, SeedMeta};
use crate::payload::ReferenceEntry;

/// OSCOLA-style back reference: `Schmitt (n 12) 45`.
static SHORT_FORM_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*n\.?\s*(\d{1,4})\s*\)").unwrap());

static IBID_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*(?:ibid|id)\b\.?").unwrap());

const LABEL_CHARS: usize = 80;

/// How an entry refers to an earlier note, if it does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BackReference {
    Note(u32),
    Ibid,
}

fn back_reference(raw: &str) -> Option<BackReference> {
    if IBID_RE.is_match(raw) {
        return Some(BackReference::Ibid);
    }
    SHORT_FORM_RE
        .captures(raw)
        .and_then(|c| c[1].parse().ok())
        .map(BackReference::Note)
}

/// Author surname and year of a work, from structured fields or its text.
pub(crate) fn work_author_year(authors: &[String], year: Option<&str>, text: &str) -> Option<(String, String)> {
    let surname = authors
        .first()
        .map(|a| surname_key(a))
        .filter(|s| s.len() >= 2)
        .or_else(|| first_author_surname(text))?;
    let year = year.and_then(find_year).or_else(|| find_year(text))?;
    Some((surname, year))
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the work node an entry points at, using `resolved` as its text.
fn work_node(entry: &ReferenceEntry, resolved: &str) -> Node {
    let text = if resolved.trim().is_empty() {
        entry.title.clone().unwrap_or_default()
    } else {
        collapse_whitespace(resolved)
    };
    let (id, label, year) = match work_author_year(&entry.authors, entry.year.as_deref(), &text) {
        Some((surname, year)) => (
            format!("work:{}:{}", slugify(&surname), year),
            format!("{} ({})", capitalize(&surname), year),
            Some(year),
        ),
        None => (
            format!("work:{}", stable_hash(&text.to_lowercase())),
            truncate_chars(&text, LABEL_CHARS),
            entry.year.clone(),
        ),
    };
    Node {
        id,
        label,
        kind: NodeKind::Work,
        title: entry.title.clone(),
        authors: entry.authors.clone(),
        year,
        venue: entry.venue.clone(),
        url: entry.url.clone(),
        doi: entry.doi.clone(),
        abstract_text: entry.abstract_text.clone(),
        citations: 0,
        is_seed: false,
    }
}

/// Graph of `seed_id` and the works its references resolve to.
///
/// Short forms (`(n 12)`) and `Ibid.` are resolved to the full text of the
/// note they point back to before the work is identified. Entries that share
/// an author surname and year collapse into one node.
pub fn build_local_graph(seed_id: &str, entries: &[ReferenceEntry], seed: &SeedMeta) -> LocalGraph {
    let mut graph = LocalGraph {
        seed_id: seed_id.to_string(),
        ..LocalGraph::default()
    };
    graph.nodes.insert(seed_id.to_string(), seed.to_node(seed_id));

    let mut by_note: HashMap<u32, &str> = HashMap::new();
    for entry in entries {
        if let Some(n) = entry.footnote_number
            && back_reference(&entry.raw).is_none()
        {
            by_note.entry(n).or_insert(entry.raw.as_str());
        }
    }

    let mut seen: HashSet<(String, String, Option<u32>, Option<usize>, String)> = HashSet::new();
    let mut previous: Option<String> = None;
    for entry in entries.iter().filter(|e| e.is_usable()) {
        let resolved = match back_reference(&entry.raw) {
            Some(BackReference::Note(n)) => by_note.get(&n).map(|s| s.to_string()),
            Some(BackReference::Ibid) => previous.clone(),
            None => None,
        }
        .unwrap_or_else(|| entry.raw.clone());

        let node = work_node(entry, &resolved);
        let target = node.id.clone();
        graph
            .nodes
            .entry(target.clone())
            .and_modify(|existing| existing.merge_from(&node))
            .or_insert(node);

        let key = (
            target.clone(),
            entry.citation_anchor.clone(),
            entry.footnote_number,
            entry.page_index,
            entry.raw.clone(),
        );
        if seen.insert(key) {
            graph.edges.push(Edge {
                source: seed_id.to_string(),
                target,
                weight: 1,
                context: entry.context.clone(),
                citation_anchor: entry.citation_anchor.clone(),
                raw: entry.raw.clone(),
                citation_type: entry.citation_type.clone(),
                footnote_number: entry.footnote_number,
                page_index: entry.page_index,
            });
        }
        previous = Some(resolved);
    }

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for edge in &graph.edges {
        *counts.entry(edge.target.as_str()).or_default() += 1;
    }
    for node in graph.nodes.values_mut() {
        node.citations = counts.get(node.id.as_str()).copied().unwrap_or(0);
    }

    tracing::debug!(
        seed = seed_id,
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "built local graph"
    );
    graph
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(n: u32, raw: &str) -> ReferenceEntry {
        ReferenceEntry::new(raw).with_footnote_number(n)
    }

    #[test]
    fn test_same_author_year_collapses() {
        let entries = vec![
            note(1, "Smith, J. (2022). Cyber norms. Journal A."),
            note(2, "Smith, J. 2022. Cyber norms, 2nd printing."),
        ];
        let graph = build_local_graph("seed", &entries, &SeedMeta::default());
        let works: Vec<_> = graph.work_nodes().collect();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].id, "work:smith:2022");
        assert_eq!(works[0].label, "Smith (2022)");
        assert_eq!(works[0].citations, 2);
        assert_eq!(graph.edges.len(), 2);
        assert!(graph.edges.iter().all(|e| e.target == "work:smith:2022"));
    }

    #[test]
    fn test_duplicate_mentions_are_one_edge() {
        let entries = vec![note(1, "Smith (2022)"), note(1, "Smith (2022)")];
        let graph = build_local_graph("seed", &entries, &SeedMeta::default());
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes["work:smith:2022"].citations, 1);
    }

    #[test]
    fn test_short_form_and_ibid_resolve_back() {
        let entries = vec![
            note(1, "Michael N. Schmitt, Tallinn Manual 2.0 (Cambridge 2017)."),
            note(2, "Ibid., 45."),
            note(3, "Unrelated note without a year."),
            note(4, "Tallinn Manual (n 1) 112."),
        ];
        let graph = build_local_graph("seed", &entries, &SeedMeta::default());
        let first = &graph.edges[0].target;
        assert_eq!(&graph.edges[1].target, first);
        assert_eq!(&graph.edges[3].target, first);
        assert_ne!(&graph.edges[2].target, first);
        assert_eq!(graph.nodes[first].citations, 3);
        assert_eq!(graph.edges[3].raw, "Tallinn Manual (n 1) 112.");
    }

    #[test]
    fn test_hash_key_without_year() {
        let graph = build_local_graph(
            "seed",
            &[ReferenceEntry::new("An anonymous pamphlet")],
            &SeedMeta::default(),
        );
        let work = graph.work_nodes().next().unwrap();
        assert!(work.id.starts_with("work:"));
        assert_eq!(work.id, format!("work:{}", stable_hash("an anonymous pamphlet")));
        assert_eq!(work.label, "An anonymous pamphlet");
    }

    #[test]
    fn test_metadata_merged_without_overwrite() {
        let mut a = note(1, "Smith (2022)");
        a.venue = Some("Journal A".into());
        let mut b = note(2, "Smith (2022)");
        b.venue = Some("Journal B".into());
        b.doi = Some("10.1/abc".into());
        let graph = build_local_graph("seed", &[a, b], &SeedMeta::default());
        let work = &graph.nodes["work:smith:2022"];
        assert_eq!(work.venue.as_deref(), Some("Journal A"));
        assert_eq!(work.doi.as_deref(), Some("10.1/abc"));
    }

    #[test]
    fn test_seed_node() {
        let seed = SeedMeta {
            title: Some("A Study of X".into()),
            ..SeedMeta::default()
        };
        let graph = build_local_graph("doc-1", &[], &seed);
        let node = &graph.nodes["doc-1"];
        assert!(node.is_seed);
        assert_eq!(node.kind, NodeKind::Source);
        assert_eq!(node.label, "A Study of X");
        assert!(graph.edges.is_empty());
    }
}
