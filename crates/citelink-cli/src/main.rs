use std::path::PathBuf;

use anyhow::Context;
use citelink_core::config_file::{self, ConfigFile};
use citelink_core::{StyleLabel, Thresholds};
use citelink_ingest::FileTypes;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod batch;
mod output;

use output::ColorMode;

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_PROGRESS_EVERY: usize = 25;
const DEFAULT_REPORT_NAME: &str = "citelink_report.json";

const QUIET_PARSER_FILTER: &str = "info,citelink_parsing=warn,citelink_validate=warn";
const VERBOSE_PARSER_FILTER: &str = "info,citelink_parsing=debug,citelink_validate=debug";

/// Citation linker - link in-text citations to their notes and bibliography
/// across a dataset of OCR markdown documents
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Directory holding `*.md` cache files and/or `*.json` raw OCR payloads
    #[arg(long)]
    dataset_dir: PathBuf,

    /// Which inputs to process: both, md or json
    #[arg(long)]
    types: Option<String>,

    /// Process at most N files (after sorting)
    #[arg(long)]
    limit: Option<usize>,

    /// Path of the JSON report [default: <dataset-dir>/citelink_report.json]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Rebuild text from stored pages even when a cache holds full_text
    #[arg(long, overrides_with = "no_prefer_pages_text")]
    prefer_pages_text: bool,

    #[arg(long, overrides_with = "prefer_pages_text")]
    no_prefer_pages_text: bool,

    /// Write each document's cache object (with citations) back as `<stem>.md`
    #[arg(long)]
    write_updated_md: bool,

    /// Log progress every N documents
    #[arg(long)]
    show_progress_every: Option<usize>,

    /// Only process files whose stem is a 64-character hex digest
    #[arg(long, overrides_with = "no_hash_only")]
    hash_only: bool,

    #[arg(long, overrides_with = "hash_only")]
    no_hash_only: bool,

    /// Keep debug logs from the parsing and validation crates
    #[arg(long)]
    no_suppress_parser_logs: bool,

    /// Number of documents processed concurrently
    #[arg(long)]
    workers: Option<usize>,

    /// Also write local/global citation graphs (with Cytoscape elements) here
    #[arg(long)]
    graph_output: Option<PathBuf>,

    /// Declared citation style applied to every document (e.g. apa, ieee, footnotes)
    #[arg(long)]
    style: Option<String>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,
}

/// Run settings after merging CLI flags, config file and defaults.
#[derive(Debug, Clone)]
struct Settings {
    dataset_dir: PathBuf,
    types: FileTypes,
    limit: Option<usize>,
    output: PathBuf,
    prefer_pages_text: bool,
    write_updated_md: bool,
    show_progress_every: usize,
    hash_only: bool,
    workers: usize,
    graph_output: Option<PathBuf>,
    style: Option<StyleLabel>,
    color: ColorMode,
    thresholds: Thresholds,
}

fn pair(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Resolve configuration: CLI flags > config file > defaults.
fn resolve(cli: Cli, file: &ConfigFile) -> anyhow::Result<Settings> {
    let batch = file.batch.clone().unwrap_or_default();

    let types = match cli.types.or(batch.types) {
        Some(t) => t.parse::<FileTypes>()?,
        None => FileTypes::default(),
    };

    let workers = cli.workers.or(batch.num_workers).unwrap_or(DEFAULT_WORKERS);
    if workers == 0 {
        anyhow::bail!("--workers must be at least 1");
    }

    let style = match cli.style {
        Some(label) => match StyleLabel::parse(&label) {
            StyleLabel::Unknown => anyhow::bail!("Unknown citation style: {}", label),
            parsed => Some(parsed),
        },
        None => None,
    };

    let output = cli
        .output
        .unwrap_or_else(|| cli.dataset_dir.join(DEFAULT_REPORT_NAME));

    Ok(Settings {
        types,
        limit: cli.limit,
        output,
        prefer_pages_text: pair(cli.prefer_pages_text, cli.no_prefer_pages_text)
            .or(batch.prefer_pages_text)
            .unwrap_or(true),
        write_updated_md: cli.write_updated_md,
        show_progress_every: cli
            .show_progress_every
            .or(batch.show_progress_every)
            .unwrap_or(DEFAULT_PROGRESS_EVERY)
            .max(1),
        hash_only: pair(cli.hash_only, cli.no_hash_only)
            .or(batch.hash_only)
            .unwrap_or(true),
        workers,
        graph_output: cli.graph_output,
        style,
        color: ColorMode(!cli.no_color),
        thresholds: file.thresholds(),
        dataset_dir: cli.dataset_dir,
    })
}

fn log_filter(suppress_parser_logs: bool) -> &'static str {
    if suppress_parser_logs {
        QUIET_PARSER_FILTER
    } else {
        VERBOSE_PARSER_FILTER
    }
}

fn init_tracing(suppress_parser_logs: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_filter(suppress_parser_logs)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(!cli.no_suppress_parser_logs);

    if let Err(e) = run(cli).await {
        tracing::error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = resolve(cli, &config_file::load_config()).context("Invalid configuration")?;
    tracing::info!(
        dataset = %settings.dataset_dir.display(),
        types = settings.types.as_str(),
        workers = settings.workers,
        "starting batch"
    );

    let outcome = batch::run_batch(&settings).await?;

    outcome
        .report
        .write(&settings.output)
        .with_context(|| format!("Failed to write report to {}", settings.output.display()))?;
    tracing::info!(path = %settings.output.display(), "wrote report");

    if let Some(ref graph_path) = settings.graph_output {
        outcome
            .write_graphs(graph_path)
            .with_context(|| format!("Failed to write graphs to {}", graph_path.display()))?;
        tracing::info!(path = %graph_path.display(), "wrote citation graphs");
    }

    let mut stdout = std::io::stdout();
    output::print_summary(&mut stdout, &outcome.report.summary, settings.color)?;
    output::print_graph_summary(&mut stdout, &outcome.global, settings.color)?;
    output::print_cache_stats(&mut stdout, &outcome.cache_stats, settings.color)?;
    output::print_outputs(
        &mut stdout,
        &settings.output,
        settings.graph_output.as_deref(),
        settings.color,
    )?;

    Ok(())
}
