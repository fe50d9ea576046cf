use std::collections::BTreeMap;

use citelink_core::DocumentMetadata;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Source,
    #[default]
    Work,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub venue: Option<String>,
    pub url: Option<String>,
    pub doi: Option<String>,
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,
    pub citations: usize,
    pub is_seed: bool,
}

fn fill(slot: &mut Option<String>, value: &Option<String>) {
    if slot.as_deref().is_none_or(|s| s.trim().is_empty())
        && let Some(v) = value.as_deref().filter(|v| !v.trim().is_empty())
    {
        *slot = Some(v.to_string());
    }
}

impl Node {
    /// Copy every field of `other` that is still empty here. Populated
    /// fields are never overwritten.
    pub fn merge_from(&mut self, other: &Node) {
        fill(&mut self.title, &other.title);
        fill(&mut self.year, &other.year);
        fill(&mut self.venue, &other.venue);
        fill(&mut self.url, &other.url);
        fill(&mut self.doi, &other.doi);
        fill(&mut self.abstract_text, &other.abstract_text);
        if self.authors.is_empty() {
            self.authors = other.authors.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub weight: usize,
    pub context: String,
    pub citation_anchor: String,
    pub raw: String,
    pub citation_type: String,
    pub footnote_number: Option<u32>,
    pub page_index: Option<usize>,
}

/// What the graph knows about the document a local graph is rooted at.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeedMeta {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub year: Option<String>,
    pub venue: Option<String>,
    pub url: Option<String>,
    pub doi: Option<String>,
    pub abstract_text: Option<String>,
}

impl From<&DocumentMetadata> for SeedMeta {
    fn from(meta: &DocumentMetadata) -> Self {
        Self {
            title: meta.title.clone(),
            authors: meta.authors.clone(),
            year: meta.publication_year.clone(),
            venue: meta.venue.clone(),
            url: meta.identifiers.urls.first().cloned(),
            doi: meta.identifiers.doi.first().cloned(),
            abstract_text: meta.abstract_text.clone(),
        }
    }
}

impl SeedMeta {
    pub(crate) fn to_node(&self, seed_id: &str) -> Node {
        Node {
            id: seed_id.to_string(),
            label: self.title.clone().unwrap_or_else(|| seed_id.to_string()),
            kind: NodeKind::Source,
            title: self.title.clone(),
            authors: self.authors.clone(),
            year: self.year.clone(),
            venue: self.venue.clone(),
            url: self.url.clone(),
            doi: self.doi.clone(),
            abstract_text: self.abstract_text.clone(),
            citations: 0,
            is_seed: true,
        }
    }
}

/// One seed document and the works it cites.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalGraph {
    pub seed_id: String,
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
    pub prior_ids: Vec<String>,
    pub derivative_ids: Vec<String>,
}

/// Works deduplicated across many local graphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalGraph {
    pub id: String,
    pub nodes: BTreeMap<String, Node>,
    pub edges: Vec<Edge>,
    pub prior_ids: Vec<String>,
    pub derivative_ids: Vec<String>,
}

/// `{"data": ...}` wrapper used by Cytoscape element lists.
#[derive(Debug, Serialize)]
pub struct CytoscapeElement<'a, T> {
    pub data: &'a T,
}

#[derive(Debug, Serialize)]
pub struct CytoscapeGraph<'a> {
    pub nodes: Vec<CytoscapeElement<'a, Node>>,
    pub edges: Vec<CytoscapeElement<'a, Edge>>,
}

fn cytoscape<'a>(nodes: &'a BTreeMap<String, Node>, edges: &'a [Edge]) -> CytoscapeGraph<'a> {
    CytoscapeGraph {
        nodes: nodes.values().map(|data| CytoscapeElement { data }).collect(),
        edges: edges.iter().map(|data| CytoscapeElement { data }).collect(),
    }
}

impl LocalGraph {
    pub fn to_cytoscape(&self) -> CytoscapeGraph<'_> {
        cytoscape(&self.nodes, &self.edges)
    }

    pub fn work_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.kind == NodeKind::Work)
    }
}

impl GlobalGraph {
    pub fn to_cytoscape(&self) -> CytoscapeGraph<'_> {
        cytoscape(&self.nodes, &self.edges)
    }

    pub fn work_nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values().filter(|n| n.kind == NodeKind::Work)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_never_overwrites() {
        let mut a = Node {
            venue: Some("Journal A".into()),
            ..Node::default()
        };
        let b = Node {
            venue: Some("Journal B".into()),
            doi: Some("10.1/x".into()),
            authors: vec!["Smith".into()],
            ..Node::default()
        };
        a.merge_from(&b);
        assert_eq!(a.venue.as_deref(), Some("Journal A"));
        assert_eq!(a.doi.as_deref(), Some("10.1/x"));
        assert_eq!(a.authors, vec!["Smith"]);
    }

    #[test]
    fn test_node_serde_names() {
        let node = Node {
            id: "s".into(),
            is_seed: true,
            abstract_text: Some("x".into()),
            ..Node::default()
        };
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["isSeed"], true);
        assert_eq!(json["abstract"], "x");
        assert_eq!(json["kind"], "work");

        let graph = LocalGraph {
            seed_id: "s".into(),
            ..LocalGraph::default()
        };
        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["seedId"], "s");
        assert!(json["priorIds"].is_array());
        assert!(json["derivativeIds"].is_array());
    }

    #[test]
    fn test_cytoscape_wraps_elements() {
        let mut graph = LocalGraph::default();
        graph.nodes.insert("a".into(), Node { id: "a".into(), ..Node::default() });
        graph.edges.push(Edge {
            source: "s".into(),
            target: "a".into(),
            weight: 1,
            ..Edge::default()
        });
        let json = serde_json::to_value(graph.to_cytoscape()).unwrap();
        assert_eq!(json["nodes"][0]["data"]["id"], "a");
        assert_eq!(json["edges"][0]["data"]["target"], "a");
    }
}
