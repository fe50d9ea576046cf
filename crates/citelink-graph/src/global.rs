//! Cross-document aggregation of local graphs.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use citelink_core::text_utils::{collapse_whitespace, slugify, stable_hash, surname_key};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::local::work_author_year;
use crate::model::{Edge, GlobalGraph, LocalGraph, Node, NodeKind};

pub const GLOBAL_GRAPH_ID: &str = "global";

/// `Author (YYYY)` as produced for work labels.
static AUTHOR_YEAR_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(.+?)\s*\((\d{4})[a-z]?\)\s*$").unwrap());

fn author_year_from_label(text: &str) -> Option<(String, String)> {
    let caps = AUTHOR_YEAR_LABEL_RE.captures(text)?;
    let surname = surname_key(&caps[1]);
    (surname.len() >= 2).then(|| (surname, caps[2].to_string()))
}

/// Global identity of a work: surname+year, then DOI, URL, title, and
/// finally the local id.
fn global_key(node: &Node) -> String {
    let author_year = if node.authors.is_empty() || node.year.is_none() {
        node.title
            .as_deref()
            .and_then(author_year_from_label)
            .or_else(|| author_year_from_label(&node.label))
    } else {
        work_author_year(&node.authors, node.year.as_deref(), "")
    };
    if let Some((surname, year)) = author_year {
        return format!("work:{}:{}", slugify(&surname), year);
    }
    if let Some(doi) = node.doi.as_deref().filter(|d| !d.trim().is_empty()) {
        return format!("doi:{}", doi.trim().to_lowercase());
    }
    if let Some(url) = node.url.as_deref().filter(|u| !u.trim().is_empty()) {
        return format!("url:{}", stable_hash(url.trim()));
    }
    if let Some(title) = node.title.as_deref().filter(|t| !t.trim().is_empty()) {
        return format!("title:{}", stable_hash(&collapse_whitespace(title).to_lowercase()));
    }
    format!("id:{}", stable_hash(&node.id))
}

/// Aggregate local graphs into one graph of seeds and deduplicated works.
///
/// Only seed to work edges are produced. A work's `citations` is the number
/// of distinct seeds citing it. The result depends only on the input, so it
/// is rebuilt from scratch whenever a local graph is added.
pub fn build_global_graph(locals: &[LocalGraph]) -> GlobalGraph {
    let mut nodes: BTreeMap<String, Node> = BTreeMap::new();
    // (seed, work) -> edge, first local mention wins
    let mut pairs: BTreeMap<(String, String), Edge> = BTreeMap::new();

    for local in locals {
        if let Some(seed) = local.nodes.get(&local.seed_id) {
            nodes.entry(seed.id.clone()).or_insert_with(|| seed.clone());
        }

        let mut rekey: HashMap<&str, String> = HashMap::new();
        for work in local.work_nodes() {
            let key = global_key(work);
            nodes
                .entry(key.clone())
                .and_modify(|existing| existing.merge_from(work))
                .or_insert_with(|| Node {
                    id: key.clone(),
                    citations: 0,
                    ..work.clone()
                });
            rekey.insert(work.id.as_str(), key);
        }

        for edge in local.edges.iter().filter(|e| e.source == local.seed_id) {
            let Some(target) = rekey.get(edge.target.as_str()) else {
                continue;
            };
            pairs
                .entry((local.seed_id.clone(), target.clone()))
                .and_modify(|e| e.weight += edge.weight)
                .or_insert_with(|| Edge {
                    target: target.clone(),
                    ..edge.clone()
                });
        }
    }

    let mut seeds_per_work: HashMap<&str, BTreeSet<&str>> = HashMap::new();
    for (seed, work) in pairs.keys() {
        seeds_per_work.entry(work.as_str()).or_default().insert(seed.as_str());
    }
    let citations: HashMap<String, usize> = seeds_per_work
        .into_iter()
        .map(|(work, seeds)| (work.to_string(), seeds.len()))
        .collect();
    for node in nodes.values_mut() {
        node.citations = match node.kind {
            NodeKind::Work => citations.get(&node.id).copied().unwrap_or(0),
            NodeKind::Source => 0,
        };
    }

    let graph = GlobalGraph {
        id: GLOBAL_GRAPH_ID.to_string(),
        nodes,
        edges: pairs.into_values().collect(),
        prior_ids: Vec::new(),
        derivative_ids: Vec::new(),
    };
    tracing::debug!(
        locals = locals.len(),
        nodes = graph.nodes.len(),
        edges = graph.edges.len(),
        "built global graph"
    );
    graph
}

fn push_unique(list: &mut Vec<String>, id: &str) {
    if !list.iter().any(|x| x == id) {
        list.push(id.to_string());
    }
}

/// Every local graph derives into the global graph, and the global graph's
/// priors are the seeds. Existing lists are extended, never replaced.
pub fn populate_prior_derivative(global: &mut GlobalGraph, locals: &mut [LocalGraph]) {
    for local in locals.iter_mut() {
        push_unique(&mut local.derivative_ids, &global.id);
        push_unique(&mut global.prior_ids, &local.seed_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::local::build_local_graph;
    use crate::model::SeedMeta;
    use crate::payload::ReferenceEntry;

    fn local(seed: &str, raws: &[&str]) -> LocalGraph {
        let entries: Vec<ReferenceEntry> = raws
            .iter()
            .enumerate()
            .map(|(i, r)| ReferenceEntry::new(*r).with_footnote_number(i as u32 + 1))
            .collect();
        build_local_graph(seed, &entries, &SeedMeta::default())
    }

    #[test]
    fn test_same_seed_counts_once() {
        let a = local("a", &["Smith (2022)", "Smith, J. (2022). Norms.", "Smith (2022) at 4"]);
        let global = build_global_graph(&[a]);
        let work = &global.nodes["work:smith:2022"];
        assert_eq!(work.citations, 1);
        assert_eq!(global.edges.len(), 1);
        assert_eq!(global.edges[0].weight, 3);
    }

    #[test]
    fn test_three_seeds_count_three() {
        let locals: Vec<_> = ["a", "b", "c"].iter().map(|s| local(s, &["Smith (2022)"])).collect();
        let global = build_global_graph(&locals);
        assert_eq!(global.nodes["work:smith:2022"].citations, 3);
        assert_eq!(global.edges.len(), 3);
        assert!(global.nodes["a"].is_seed);
        assert_eq!(global.nodes["a"].citations, 0);
    }

    #[test]
    fn test_doi_key_when_no_author_year() {
        let mut x = ReferenceEntry::new("Anonymous report on attribution");
        x.doi = Some("10.1234/ABC".into());
        let mut y = ReferenceEntry::new("Attribution report, anonymous authors");
        y.doi = Some("10.1234/abc".into());
        let a = build_local_graph("a", &[x], &SeedMeta::default());
        let b = build_local_graph("b", &[y], &SeedMeta::default());
        let global = build_global_graph(&[a, b]);
        let works: Vec<_> = global.work_nodes().collect();
        assert_eq!(works.len(), 1);
        assert_eq!(works[0].id, "doi:10.1234/abc");
        assert_eq!(works[0].citations, 2);
    }

    #[test]
    fn test_label_parsing() {
        assert_eq!(
            author_year_from_label("Smith (2022)"),
            Some(("smith".to_string(), "2022".to_string()))
        );
        assert_eq!(author_year_from_label("No year here"), None);
    }

    #[test]
    fn test_prior_derivative_union() {
        let mut locals = vec![local("a", &["Smith (2022)"]), local("b", &["Jones (2019)"])];
        locals[0].derivative_ids.push("older".into());
        let mut global = build_global_graph(&locals);
        global.prior_ids.push("a".into());
        populate_prior_derivative(&mut global, &mut locals);
        populate_prior_derivative(&mut global, &mut locals);
        assert_eq!(global.prior_ids, vec!["a", "b"]);
        assert_eq!(locals[0].derivative_ids, vec!["older", "global"]);
        assert_eq!(locals[1].derivative_ids, vec!["global"]);
    }
}
