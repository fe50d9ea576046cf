//! Title selection as an ordered list of strategies.
//!
//! Each strategy inspects the shared [`ExtractionContext`] and either proposes a
//! [`TitleCandidate`] or passes. [`TITLE_STRATEGIES`] is tried in order and the
//! first candidate wins; [`refine_name_title`] then replaces a title that is
//! really an author byline when a better line sits just above it.

use citelink_core::ModelRequest;
use citelink_core::text_utils::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::authors::{is_name_shaped, normalize_name, split_author_line};
use crate::metadata::ExtractionContext;

/// Lines scanned upward from a name-shaped title.
const NAME_WALK_LINES: usize = 8;
const MIN_LINE_TITLE_CHARS: usize = 20;
const MAX_LINE_TITLE_CHARS: usize = 240;

static STRUCTURAL_TITLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:table\s+of\s+contents|contents|index|list\s+of\s+(?:figures|tables|abbreviations|contributors)|abstract|summary|references|bibliography|keywords|acknowledge?ments?|appendix|endnotes)\b",
    )
    .unwrap()
});

/// Dotted leaders ending in a page number, e.g. `Introduction ........ 3`.
pub(crate) static TOC_LEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\.{3,}|…+|(?:\.[ \t]){3,})[ \t]*\d{1,4}[ \t]*$").unwrap());

static SUBSECTION_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(?:[IVXLC]{1,5}|\d{1,2}(?:\.\d{1,2})*)\.?\s+(?:introduction|background|conclusions?)\b")
        .unwrap()
});

static BOILERPLATE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:downloaded\s+(?:from|by|on)|all\s+rights\s+reserved|creative\s+commons|\blicen[cs]e[ds]?\b|copyright|©|terms\s+(?:of|and)\s+(?:use|conditions)|https?://|www\.|@)",
    )
    .unwrap()
});

static TITLE_MARKUP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<sup>[^<]*</sup>|\^\{[^}]*\}|[⁰¹²³⁴⁵⁶⁷⁸⁹*†‡]+$|^#{1,6}[ \t]*|\*\*|__").unwrap()
});

/// Where a title came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TitleSource {
    Heading,
    LeadingLine,
    Model,
    AnyHeading,
    NameWalk,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleCandidate {
    pub text: String,
    /// 0-based line of the title in the full text, when it came from the text.
    pub line: Option<usize>,
    pub source: TitleSource,
}

pub type TitleStrategy = fn(&ExtractionContext<'_>) -> Option<TitleCandidate>;

pub const TITLE_STRATEGIES: &[TitleStrategy] = &[
    title_from_heading,
    title_from_leading_line,
    title_from_model,
    title_from_any_heading,
];

/// Table-of-contents, index, abstract and similar structural labels, or a line
/// ending in a dotted page-number leader.
pub fn is_structural_title(text: &str) -> bool {
    let text = text.trim();
    STRUCTURAL_TITLE_RE.is_match(text) || TOC_LEADER_RE.is_match(text)
}

/// License, download and contact lines that never hold a title.
pub fn is_boilerplate_line(text: &str) -> bool {
    BOILERPLATE_RE.is_match(text)
}

/// Strip heading marks, emphasis and footnote markers from a title line.
pub fn clean_title(raw: &str) -> String {
    let stripped = TITLE_MARKUP_RE.replace_all(raw.trim(), "");
    collapse_whitespace(stripped.trim_matches(['*', '_', ' ']))
        .trim_end_matches(':')
        .to_string()
}

fn rejected_as_title(text: &str) -> bool {
    text.is_empty()
        || is_structural_title(text)
        || is_boilerplate_line(text)
        || SUBSECTION_HEADING_RE.is_match(text)
}

/// A plain line good enough to be a title on its own.
fn acceptable_line(ctx: &ExtractionContext<'_>, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.starts_with('|') || raw.starts_with('!') || raw.starts_with('>') {
        return None;
    }
    let text = clean_title(raw);
    let len = text.chars().count();
    if !(MIN_LINE_TITLE_CHARS..=MAX_LINE_TITLE_CHARS).contains(&len) || rejected_as_title(&text) {
        return None;
    }
    if !text.chars().any(|c| c.is_alphabetic()) {
        return None;
    }
    // Bylines such as "Jane Doe, John Smith".
    let named = split_author_line(&text)
        .iter()
        .filter(|n| is_name_shaped(n, &ctx.blocked_tokens))
        .count();
    if named >= 2 {
        return None;
    }
    Some(text)
}

/// First level-1 heading in the scan window that is not structural.
fn title_from_heading(ctx: &ExtractionContext<'_>) -> Option<TitleCandidate> {
    ctx.headings
        .iter()
        .filter(|h| h.level == 1 && h.line < ctx.config.title_scan_lines)
        .map(|h| (clean_title(&h.text), h.line))
        .find(|(text, _)| !rejected_as_title(text))
        .map(|(text, line)| TitleCandidate {
            text,
            line: Some(line),
            source: TitleSource::Heading,
        })
}

/// First non-boilerplate line of plausible title length near the top.
fn title_from_leading_line(ctx: &ExtractionContext<'_>) -> Option<TitleCandidate> {
    ctx.lines
        .iter()
        .take(ctx.config.title_fallback_lines)
        .enumerate()
        .find_map(|(i, line)| {
            acceptable_line(ctx, line).map(|text| TitleCandidate {
                text,
                line: Some(i),
                source: TitleSource::LeadingLine,
            })
        })
}

/// Ask the configured model backend. Any backend error means "no answer".
fn title_from_model(ctx: &ExtractionContext<'_>) -> Option<TitleCandidate> {
    let backend = ctx.backend?;
    let opening: Vec<&str> = ctx
        .lines
        .iter()
        .take(ctx.config.title_fallback_lines)
        .copied()
        .collect();
    if opening.iter().all(|l| l.trim().is_empty()) {
        return None;
    }
    let prompt = format!(
        "Reply with only the title of the document that begins with the lines below.\n\n{}",
        opening.join("\n")
    );
    let request = ModelRequest::new(prompt, ctx.model_timeout);
    match backend.call_model(&request) {
        Ok(response) => {
            let text = response
                .text
                .lines()
                .map(|l| clean_title(l.trim_matches(['"', '\'', '`'])))
                .find(|l| !l.is_empty())?;
            if text.chars().count() > MAX_LINE_TITLE_CHARS || rejected_as_title(&text) {
                return None;
            }
            Some(TitleCandidate {
                text,
                line: None,
                source: TitleSource::Model,
            })
        }
        Err(e) => {
            tracing::debug!(error = %e, "model title lookup failed");
            None
        }
    }
}

/// Last resort: the first heading of any level, structural or not.
fn title_from_any_heading(ctx: &ExtractionContext<'_>) -> Option<TitleCandidate> {
    ctx.headings
        .iter()
        .map(|h| (clean_title(&h.text), h.line))
        .find(|(text, _)| !text.is_empty())
        .map(|(text, line)| TitleCandidate {
            text,
            line: Some(line),
            source: TitleSource::AnyHeading,
        })
}

/// Replace a title that is a bare person name with a better line up to
/// eight lines above it. The name stays when nothing better exists.
pub fn refine_name_title(ctx: &ExtractionContext<'_>, candidate: TitleCandidate) -> TitleCandidate {
    if !is_name_shaped(&normalize_name(&candidate.text), &ctx.blocked_tokens) {
        return candidate;
    }
    let Some(line) = candidate.line else {
        return candidate;
    };
    // Heading line numbers come from the caller and may not match `ctx.lines`.
    let line = line.min(ctx.lines.len());
    let better = (line.saturating_sub(NAME_WALK_LINES)..line)
        .rev()
        .find_map(|i| {
            let text = acceptable_line(ctx, ctx.lines.get(i)?)?;
            (!is_name_shaped(&normalize_name(&text), &ctx.blocked_tokens)).then_some((text, i))
        });
    match better {
        Some((text, i)) => {
            tracing::debug!(name = %candidate.text, title = %text, "name-shaped title replaced");
            TitleCandidate {
                text,
                line: Some(i),
                source: TitleSource::NameWalk,
            }
        }
        None => candidate,
    }
}

/// Split `Title: Subtitle` into its parts.
pub fn split_subtitle(title: &str) -> (String, Option<String>) {
    if let Some((head, tail)) = title.split_once(": ") {
        let head = head.trim();
        let tail = tail.trim();
        if head.chars().count() >= 3 && !tail.is_empty() {
            return (head.to_string(), Some(tail.to_string()));
        }
    }
    (title.to_string(), None)
}

/// An H2 on one of the two lines directly under the title line.
pub fn subtitle_from_heading(ctx: &ExtractionContext<'_>, title_line: usize) -> Option<(String, usize)> {
    ctx.headings
        .iter()
        .find(|h| h.level == 2 && h.line > title_line && h.line <= title_line.saturating_add(2))
        .map(|h| (clean_title(&h.text), h.line))
        .filter(|(text, _)| !rejected_as_title(text))
}
