use std::io::Write;
use std::path::Path;

use citelink_core::CacheStats;
use citelink_graph::GlobalGraph;
use citelink_reporting::Summary;
use owo_colors::OwoColorize;

/// How many entries of each histogram are printed.
const TOP_N: usize = 8;

/// Whether to use colored output.
#[derive(Debug, Clone, Copy)]
pub struct ColorMode(pub bool);

impl ColorMode {
    pub fn enabled(&self) -> bool {
        self.0
    }
}

fn percent(rate: f64) -> String {
    format!("{:.1}%", rate * 100.0)
}

fn header(w: &mut dyn Write, title: &str, color: ColorMode) -> std::io::Result<()> {
    let sep = "=".repeat(60);
    if color.enabled() {
        writeln!(w, "{}", sep.bold())?;
        writeln!(w, "{}", title.bold())?;
        writeln!(w, "{}", sep.bold())?;
    } else {
        writeln!(w, "{}", sep)?;
        writeln!(w, "{}", title)?;
        writeln!(w, "{}", sep)?;
    }
    Ok(())
}

/// Print `counts` sorted by count (descending), then name.
fn print_counts<'a>(
    w: &mut dyn Write,
    label: &str,
    counts: impl IntoIterator<Item = (&'a String, &'a usize)>,
    color: ColorMode,
) -> std::io::Result<()> {
    let mut sorted: Vec<_> = counts.into_iter().collect();
    if sorted.is_empty() {
        return Ok(());
    }
    sorted.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));

    writeln!(w, "  {}:", label)?;
    for (name, count) in sorted.iter().take(TOP_N) {
        if color.enabled() {
            writeln!(w, "    {:<32} {}", name.cyan(), count)?;
        } else {
            writeln!(w, "    {:<32} {}", name, count)?;
        }
    }
    if sorted.len() > TOP_N {
        let msg = format!("... and {} more", sorted.len() - TOP_N);
        if color.enabled() {
            writeln!(w, "    {}", msg.dimmed())?;
        } else {
            writeln!(w, "    {}", msg)?;
        }
    }
    Ok(())
}

/// Print the final batch summary.
pub fn print_summary(w: &mut dyn Write, summary: &Summary, color: ColorMode) -> std::io::Result<()> {
    writeln!(w)?;
    header(w, "SUMMARY", color)?;

    writeln!(w, "  Documents: {}", summary.documents_total)?;
    if color.enabled() {
        writeln!(w, "  {} {}", "Processed:".green(), summary.documents_ok)?;
    } else {
        writeln!(w, "  Processed: {}", summary.documents_ok)?;
    }
    if summary.documents_failed > 0 {
        if color.enabled() {
            writeln!(w, "  {} {}", "Failed:".red(), summary.documents_failed)?;
        } else {
            writeln!(w, "  Failed: {}", summary.documents_failed)?;
        }
        for file in summary.failed_files.iter().take(TOP_N) {
            writeln!(w, "    {}", file)?;
        }
    }
    if summary.cancelled {
        if color.enabled() {
            writeln!(w, "  {}", "Run interrupted before all files were submitted".yellow())?;
        } else {
            writeln!(w, "  Run interrupted before all files were submitted")?;
        }
    }
    writeln!(w)?;

    let rate = format!(
        "{} ({}/{} in-text citations resolved)",
        percent(summary.weighted_match_rate),
        summary.dominant_success_total,
        summary.dominant_intext_total
    );
    if color.enabled() {
        let rate = if summary.weighted_match_rate >= 0.5 {
            rate.green().to_string()
        } else {
            rate.yellow().to_string()
        };
        writeln!(w, "  {} {}", "Weighted match rate:".bold(), rate)?;
    } else {
        writeln!(w, "  Weighted match rate: {}", rate)?;
    }
    writeln!(w, "  No in-text citations: {}", summary.docs_with_no_intext)?;
    writeln!(w, "  Missing reference heading: {}", summary.missing_reference_heading)?;
    writeln!(w, "  Partial documents: {}", summary.partial_documents)?;
    writeln!(w)?;

    print_counts(w, "Styles", &summary.style_counts, color)?;
    print_counts(w, "Dominant buckets", &summary.dominant_counts, color)?;
    print_counts(w, "Flags", &summary.flag_counts, color)?;

    if summary.documents_ok > 0 {
        writeln!(w, "  Metadata present:")?;
        for (field, rate) in &summary.metadata_presence {
            writeln!(w, "    {:<32} {}", field, percent(*rate))?;
        }
    }
    writeln!(w)?;
    Ok(())
}

/// Print node and edge counts of the global graph plus its most cited works.
pub fn print_graph_summary(w: &mut dyn Write, global: &GlobalGraph, color: ColorMode) -> std::io::Result<()> {
    let works = global.work_nodes().count();
    let seeds = global.nodes.len() - works;
    writeln!(
        w,
        "  Citation graph: {} documents, {} works, {} edges",
        seeds,
        works,
        global.edges.len()
    )?;

    let mut cited: Vec<_> = global.work_nodes().filter(|n| n.citations > 1).collect();
    cited.sort_by(|a, b| b.citations.cmp(&a.citations).then_with(|| a.id.cmp(&b.id)));
    for node in cited.iter().take(TOP_N) {
        let label = truncate(&node.label, 60);
        if color.enabled() {
            writeln!(w, "    {} cited by {}", label.cyan(), node.citations)?;
        } else {
            writeln!(w, "    {} cited by {}", label, node.citations)?;
        }
    }
    Ok(())
}

pub fn print_cache_stats(w: &mut dyn Write, stats: &CacheStats, color: ColorMode) -> std::io::Result<()> {
    let msg = format!(
        "Definition index cache: {} hits, {} misses, {} evictions, {} entries",
        stats.hits, stats.misses, stats.evictions, stats.entries
    );
    if color.enabled() {
        writeln!(w, "  {}", msg.dimmed())?;
    } else {
        writeln!(w, "  {}", msg)?;
    }
    writeln!(w)?;
    Ok(())
}

/// Print where the report (and graphs) were written.
pub fn print_outputs(
    w: &mut dyn Write,
    report: &Path,
    graphs: Option<&Path>,
    color: ColorMode,
) -> std::io::Result<()> {
    let lines = std::iter::once(("Report", report)).chain(graphs.map(|g| ("Graphs", g)));
    for (label, path) in lines {
        if color.enabled() {
            writeln!(w, "{} {}", format!("{}:", label).bold(), path.display())?;
        } else {
            writeln!(w, "{}: {}", label, path.display())?;
        }
    }
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let head: String = s.chars().take(max).collect();
        format!("{}...", head)
    } else {
        s.to_string()
    }
}
