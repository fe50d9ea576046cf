//! Raw payloads written back as cache objects load to the same document.

use citelink_ingest::{FileTypes, LoadOptions, discover_files, load_document, write_cache};
use citelink_parsing::link;

#[test]
fn test_raw_payload_written_back_as_cache() {
    let dir = tempfile::tempdir().unwrap();
    let raw = serde_json::json!({"response": {"response": {"body": {"pages": [
        {"index": 0, "markdown": "# Cyber Norms\nStates hesitate [1]. Courts differ [2]."},
        {"index": 1, "markdown": "More text.\n\n## References\n1. Smith, J. (2019). Norms.\n2. Roe, R. (2018). Courts."}
    ]}}}});
    let raw_path = dir.path().join("paper.json");
    std::fs::write(&raw_path, raw.to_string()).unwrap();

    let loaded = load_document(&raw_path, &LoadOptions::default()).unwrap();
    let result = link(&loaded.document.full_text, &loaded.document.references);
    assert_eq!(result.numeric.total.success_occurrences, 2);

    let written = write_cache(&loaded, &result).unwrap();
    assert_eq!(written, dir.path().join("paper.md"));

    let files = discover_files(dir.path(), FileTypes::Both, false).unwrap();
    assert_eq!(files, vec![dir.path().join("paper.json"), dir.path().join("paper.md")]);

    let stored = load_document(&written, &LoadOptions { prefer_pages_text: false }).unwrap();
    assert_eq!(stored.document.full_text, loaded.document.full_text);
    assert_eq!(stored.document.references, loaded.document.references);
    assert_eq!(stored.pages, loaded.pages);
    let prior = stored.prior_citations.unwrap();
    assert_eq!(prior["numeric"]["total"]["success_occurrences"], 2);

    let rebuilt = load_document(&written, &LoadOptions::default()).unwrap();
    assert_eq!(rebuilt.document.full_text, loaded.document.full_text);
}
