//! Graph building from linked documents and stored payloads.

use citelink_graph::{
    NodeKind, ReferencePayload, SeedMeta, build_global_graph, build_local_graph,
    entries_from_link_result, populate_prior_derivative,
};
use citelink_parsing::{extract, link, parse_headings};
use serde_json::json;

#[test]
fn test_two_seeds_citing_the_same_work() {
    let payload = ReferencePayload::from_value(json!(["Smith (2022)"])).unwrap();
    let entries = payload.entries();
    let a = build_local_graph("seed-a", &entries, &SeedMeta::default());
    let b = build_local_graph("seed-b", &entries, &SeedMeta::default());

    let global = build_global_graph(&[a, b]);
    let works: Vec<_> = global.work_nodes().collect();
    assert_eq!(works.len(), 1);
    assert_eq!(works[0].citations, 2);
    assert_eq!(global.edges.len(), 2);
    assert!(global.edges.iter().all(|e| e.target == works[0].id));
    let sources: Vec<_> = global.edges.iter().map(|e| e.source.as_str()).collect();
    assert_eq!(sources, vec!["seed-a", "seed-b"]);
    assert!(global.edges.iter().all(|e| {
        global
            .nodes
            .get(&e.source)
            .is_some_and(|n| n.kind == NodeKind::Source)
    }));
}

#[test]
fn test_linked_document_to_graph() {
    let body = "# The Attribution of Cyber Operations\nJane Doe\n\nStates hesitate.¹ Courts differ.² Again.³";
    let references = vec![
        "¹ Smith, J. (2019). Attribution Norms.\n² Roe, R. (2018). Courts.\n³ Smith (n 1) 12.".to_string(),
    ];
    let result = link(body, &references);
    assert_eq!(result.footnotes.total.success_occurrences, 3);

    let entries = entries_from_link_result(&result);
    let meta = extract(body, &references, &parse_headings(body));
    let mut local = build_local_graph("doc-1", &entries, &SeedMeta::from(&meta));

    assert_eq!(local.nodes["doc-1"].label, "The Attribution of Cyber Operations");
    assert_eq!(local.nodes["work:smith:2019"].citations, 2);
    assert_eq!(local.nodes["work:roe:2018"].citations, 1);

    let mut global = build_global_graph(std::slice::from_ref(&local));
    populate_prior_derivative(&mut global, std::slice::from_mut(&mut local));
    assert_eq!(global.prior_ids, vec!["doc-1"]);
    assert_eq!(local.derivative_ids, vec!["global"]);
    assert_eq!(global.edges.len(), 2);

    let cyto = serde_json::to_value(global.to_cytoscape()).unwrap();
    assert_eq!(cyto["nodes"].as_array().map(Vec::len), Some(3));
    assert_eq!(cyto["edges"].as_array().map(Vec::len), Some(2));
}

#[test]
fn test_global_graph_is_deterministic() {
    let entries = ReferencePayload::from_value(json!({
        "references": [
            {"raw": "Jones, A. (2019). Work.", "footnote_number": 1},
            {"raw": "Jones (n 1) 4.", "footnote_number": 2},
            {"raw": "A report without a year", "url": "https://example.org/r"}
        ]
    }))
    .unwrap()
    .entries();
    let locals = vec![
        build_local_graph("a", &entries, &SeedMeta::default()),
        build_local_graph("b", &entries, &SeedMeta::default()),
    ];
    let first = serde_json::to_string(&build_global_graph(&locals)).unwrap();
    let second = serde_json::to_string(&build_global_graph(&locals)).unwrap();
    assert_eq!(first, second);
}
