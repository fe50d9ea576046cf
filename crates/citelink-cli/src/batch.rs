use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::Context;
use citelink_core::{CacheStats, DefinitionIndexCache, StyleLabel};
use citelink_graph::{
    CytoscapeGraph, GlobalGraph, LocalGraph, ReferencePayload, SeedMeta, build_global_graph,
    build_local_graph, entries_from_link_result, populate_prior_derivative,
};
use citelink_ingest::{LoadOptions, discover_files, load_document, write_cache};
use citelink_parsing::{DocumentProcessor, ParsingConfigBuilder};
use citelink_reporting::{BatchOptions, BatchReport, DocumentRecord, ProcessedRecord, ReportError};
use citelink_validate::validate_with_thresholds;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;

use crate::Settings;

/// Result of processing one file.
pub(crate) struct FileOutcome {
    pub record: DocumentRecord,
    pub graph: Option<LocalGraph>,
}

/// Everything a batch run produces.
pub(crate) struct BatchOutcome {
    pub report: BatchReport,
    pub locals: Vec<LocalGraph>,
    pub global: GlobalGraph,
    pub cache_stats: CacheStats,
}

#[derive(Serialize)]
struct GraphExport<'a> {
    local: &'a [LocalGraph],
    global: &'a GlobalGraph,
    cytoscape: CytoscapeGraph<'a>,
}

impl BatchOutcome {
    pub fn write_graphs(&self, path: &Path) -> Result<(), ReportError> {
        let export = GraphExport {
            local: &self.locals,
            global: &self.global,
            cytoscape: self.global.to_cytoscape(),
        };
        citelink_reporting::write_json(&export, path)
    }
}

/// Per-run state shared by every worker.
pub(crate) struct Pipeline {
    processor: DocumentProcessor,
    load_options: LoadOptions,
    declared_style: Option<StyleLabel>,
    write_updated_md: bool,
}

impl Pipeline {
    pub fn new(settings: &Settings, cache: Arc<DefinitionIndexCache>) -> anyhow::Result<Self> {
        let config = ParsingConfigBuilder::new()
            .thresholds(settings.thresholds.clone())
            .build()
            .context("Invalid parsing configuration")?;
        Ok(Self {
            processor: DocumentProcessor::with_config(config).with_cache(cache),
            load_options: LoadOptions {
                prefer_pages_text: settings.prefer_pages_text,
            },
            declared_style: settings.style,
            write_updated_md: settings.write_updated_md,
        })
    }

    /// Load, link, validate and graph one file. Never fails: load errors
    /// become failure records.
    pub fn process_file(&self, path: &Path) -> FileOutcome {
        let file = path_name(path);
        let loaded = match load_document(path, &self.load_options) {
            Ok(loaded) => loaded,
            Err(e) => {
                tracing::warn!(file = %file, error = %e, "failed to load document");
                return FileOutcome {
                    record: DocumentRecord::failed(file, e.kind(), e),
                    graph: None,
                };
            }
        };

        let doc = &loaded.document;
        let out = self.processor.process(doc, self.declared_style);
        let validation = validate_with_thresholds(
            &doc.full_text,
            &doc.references,
            &out.link,
            &out.metadata,
            self.processor.config().thresholds(),
        );

        if self.write_updated_md
            && let Err(e) = write_cache(&loaded, &out.link)
        {
            tracing::warn!(file = %file, error = %e, "failed to write updated cache");
        }

        let mut entries = entries_from_link_result(&out.link);
        if entries.is_empty()
            && let Some(payload) = loaded.prior_citations.clone().and_then(ReferencePayload::from_value)
        {
            entries = payload.entries();
        }
        let id = loaded.id();
        let graph = build_local_graph(&id, &entries, &SeedMeta::from(&out.metadata));

        let record = DocumentRecord::Processed(Box::new(ProcessedRecord {
            file,
            id,
            source_type: doc.source_type,
            pages_count: doc.pages_count,
            references_count: doc.references.len(),
            style: out.link.style,
            dominant: out.link.dominant,
            citations: out.link,
            metadata: out.metadata,
            validation,
        }));
        FileOutcome {
            record,
            graph: Some(graph),
        }
    }
}

fn progress_bar(len: usize) -> ProgressBar {
    let bar = ProgressBar::new(len as u64);
    if let Ok(style) =
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} {msg}")
    {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

pub(crate) async fn run_batch(settings: &Settings) -> anyhow::Result<BatchOutcome> {
    let mut files = discover_files(&settings.dataset_dir, settings.types, settings.hash_only)
        .with_context(|| format!("Cannot scan dataset {}", settings.dataset_dir.display()))?;
    if let Some(limit) = settings.limit {
        files.truncate(limit);
    }
    if files.is_empty() {
        anyhow::bail!(
            "No {} files matched in {}{}",
            settings.types.as_str(),
            settings.dataset_dir.display(),
            if settings.hash_only {
                " (only hash-named files; try --no-hash-only)"
            } else {
                ""
            }
        );
    }

    let cache = Arc::new(DefinitionIndexCache::new());
    let pipeline = Arc::new(Pipeline::new(settings, Arc::clone(&cache))?);

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupted; finishing in-flight documents");
            cancel_clone.cancel();
        }
    });

    let outcomes = process_files(&files, pipeline, settings, &cancel).await;
    let cancelled = cancel.is_cancelled() && outcomes.len() < files.len();

    let mut records = Vec::with_capacity(outcomes.len());
    let mut locals = Vec::new();
    for outcome in outcomes {
        records.push(outcome.record);
        locals.extend(outcome.graph);
    }

    let mut global = build_global_graph(&locals);
    populate_prior_derivative(&mut global, &mut locals);

    let options = BatchOptions {
        types: settings.types.as_str().to_string(),
        limit: settings.limit,
        prefer_pages_text: settings.prefer_pages_text,
        hash_only: settings.hash_only,
        write_updated_md: settings.write_updated_md,
        workers: settings.workers,
        declared_style: settings.style.map(|s| s.as_str().to_string()),
    };
    let report = BatchReport::new(&settings.dataset_dir, options, records, cancelled);

    Ok(BatchOutcome {
        report,
        locals,
        global,
        cache_stats: cache.stats(),
    })
}

/// Run `pipeline` over `files` on blocking workers, at most `settings.workers`
/// at a time. Results keep the order of `files`.
async fn process_files(
    files: &[PathBuf],
    pipeline: Arc<Pipeline>,
    settings: &Settings,
    cancel: &CancellationToken,
) -> Vec<FileOutcome> {
    let semaphore = Arc::new(Semaphore::new(settings.workers));
    let bar = progress_bar(files.len());
    let done = Arc::new(AtomicUsize::new(0));
    let total = files.len();
    let every = settings.show_progress_every;

    let mut handles = Vec::with_capacity(files.len());
    for path in files {
        let permit = tokio::select! {
            permit = Arc::clone(&semaphore).acquire_owned() => match permit {
                Ok(permit) => permit,
                Err(_) => break,
            },
            _ = cancel.cancelled() => break,
        };

        let file = path_name(path);
        let pipeline = Arc::clone(&pipeline);
        let bar = bar.clone();
        let done = Arc::clone(&done);
        let path = path.clone();
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let outcome = pipeline.process_file(&path);
            bar.inc(1);
            let n = done.fetch_add(1, Ordering::Relaxed) + 1;
            if n % every == 0 || n == total {
                tracing::info!(done = n, total, "progress");
            }
            outcome
        });
        handles.push((file, handle));
    }

    let mut outcomes = Vec::with_capacity(handles.len());
    for (file, handle) in handles {
        match handle.await {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                tracing::error!(file = %file, error = %e, "worker failed");
                outcomes.push(FileOutcome {
                    record: DocumentRecord::failed(file, "Panic", e),
                    graph: None,
                });
            }
        }
    }
    bar.finish_and_clear();
    outcomes
}

fn path_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::ColorMode;
    use citelink_core::Thresholds;
    use citelink_ingest::FileTypes;

    fn settings(dir: &Path) -> Settings {
        Settings {
            dataset_dir: dir.to_path_buf(),
            types: FileTypes::Both,
            limit: None,
            output: dir.join("report.json"),
            prefer_pages_text: true,
            write_updated_md: false,
            show_progress_every: 1,
            hash_only: false,
            workers: 2,
            graph_output: None,
            style: None,
            color: ColorMode(false),
            thresholds: Thresholds::default(),
        }
    }

    fn write(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), body).unwrap();
    }

    const PAPER_A: &str = "# Norms in Cyberspace\nJane Doe\n\nStates hesitate.\u{b9} Courts differ.\u{b2}\n\n## References\n1. Smith, J. (2019). Attribution Norms.\n2. Roe, R. (2018). Courts.";
    const PAPER_B: &str = "# Attribution Revisited\nJohn Poe\n\nAttribution is hard.\u{b9}\n\n## References\n1. Smith, J. (2019). Attribution Norms.";

    #[test]
    fn test_load_failure_becomes_record() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "bad.json", "{not json");
        let pipeline = Pipeline::new(&settings(dir.path()), Arc::new(DefinitionIndexCache::new())).unwrap();

        let outcome = pipeline.process_file(&dir.path().join("bad.json"));
        assert!(outcome.graph.is_none());
        match outcome.record {
            DocumentRecord::Failed { file, error } => {
                assert_eq!(file, "bad.json");
                assert!(error.starts_with("Json: "));
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_batch_links_documents_and_builds_graph() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", PAPER_A);
        write(dir.path(), "b.md", PAPER_B);
        write(dir.path(), "c.json", "[1, 2, 3]");

        let outcome = run_batch(&settings(dir.path())).await.unwrap();
        let summary = &outcome.report.summary;
        assert_eq!(summary.documents_total, 3);
        assert_eq!(summary.documents_ok, 2);
        assert_eq!(summary.failed_files, vec!["c.json"]);
        assert!(!summary.cancelled);

        let files: Vec<&str> = outcome.report.records.iter().map(|r| r.file()).collect();
        assert_eq!(files, vec!["a.md", "b.md", "c.json"]);

        assert_eq!(outcome.locals.len(), 2);
        let shared = outcome
            .global
            .work_nodes()
            .find(|n| n.citations == 2)
            .expect("work cited by both documents");
        assert_eq!(shared.id, "work:smith:2019");
        assert!(outcome.cache_stats.misses > 0);
    }

    #[tokio::test]
    async fn test_empty_dataset_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "notes.txt", "ignored");
        assert!(run_batch(&settings(dir.path())).await.is_err());

        let missing = dir.path().join("missing");
        assert!(run_batch(&settings(&missing)).await.is_err());
    }

    #[tokio::test]
    async fn test_limit_and_graph_export() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.md", PAPER_A);
        write(dir.path(), "b.md", PAPER_B);
        let mut s = settings(dir.path());
        s.limit = Some(1);

        let outcome = run_batch(&s).await.unwrap();
        assert_eq!(outcome.report.summary.documents_total, 1);

        let path = dir.path().join("graphs").join("graph.json");
        outcome.write_graphs(&path).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["global"]["id"], "global");
        assert!(value["cytoscape"]["nodes"].as_array().is_some_and(|n| !n.is_empty()));
        assert_eq!(value["local"][0]["seedId"], "a");
    }
}
