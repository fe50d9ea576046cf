//! Citation graphs over resolved references.
//!
//! A [`LocalGraph`] links one seed document to the works its notes and
//! bibliography resolve to. [`build_global_graph`] merges many local graphs,
//! deduplicating works across documents. Both export to Cytoscape element
//! lists via `to_cytoscape`.

pub mod global;
pub mod local;
pub mod model;
pub mod payload;

pub use global::{GLOBAL_GRAPH_ID, build_global_graph, populate_prior_derivative};
pub use local::build_local_graph;
pub use model::{CytoscapeGraph, Edge, GlobalGraph, LocalGraph, Node, NodeKind, SeedMeta};
pub use payload::{MAX_DEPTH, ReferenceEntry, ReferencePayload, entries_from_link_result};
