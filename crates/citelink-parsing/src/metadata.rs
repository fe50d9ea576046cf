//! Front-matter metadata extraction.
//!
//! Every field is produced by an ordered list of strategy functions over a
//! shared [`ExtractionContext`]; the first strategy that returns something wins.
//! Nothing here fails: a field that no strategy recovers is left empty.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use citelink_core::text_utils::{collapse_whitespace, find_year, fold_ascii, truncate_chars};
use citelink_core::{
    DocumentMetadata, DocumentType, Heading, ModelBackend, PartialDocument, PublicationDates,
    join_references,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::authors::{
    DEFAULT_BLOCKED_NAME_TOKENS, dedup_by_surname, is_name_shaped, split_author_line,
};
use crate::config::ParsingConfig;
use crate::identifiers::{extract_emails, extract_identifiers, extract_orcids};
use crate::section::front_matter_with_config;
use crate::title::{
    TITLE_STRATEGIES, TOC_LEADER_RE, TitleCandidate, is_structural_title, refine_name_title,
    split_subtitle, subtitle_from_heading,
};

/// Characters from the start of the document scanned for identifiers, dates
/// and document-type keywords.
const HEAD_CHARS: usize = 4000;
/// Lines after the title searched for bylines.
const AUTHOR_WINDOW_LINES: usize = 10;
/// Dotted table-of-contents lines that mark a document as a ToC extract.
const TOC_HEAVY_MIN_LINES: usize = 8;
const MAX_AFFILIATION_CHARS: usize = 250;
const MAX_VENUE_CHARS: usize = 200;
const MIN_WINDOW_ABSTRACT_CHARS: usize = 40;
const DEFAULT_MODEL_TIMEOUT: Duration = Duration::from_secs(30);

pub(crate) const DEFAULT_AFFILIATION_KEYWORDS: &[&str] = &[
    "university",
    "universitat",
    "universite",
    "universidad",
    "universita",
    "institute",
    "institut",
    "department",
    "dept",
    "faculty",
    "school",
    "college",
    "laboratory",
    "laboratories",
    "centre",
    "center",
    "academy",
    "hospital",
    "foundation",
    "ministry",
    "agency",
];

pub(crate) const DEFAULT_VENUE_KEYWORDS: &[&str] = &[
    "journal",
    "proceedings",
    "conference",
    "symposium",
    "workshop",
    "transactions",
    "review",
    "quarterly",
    "bulletin",
    "annals",
    "letters",
    "yearbook",
    "gazette",
];

/// Checked in order; the first type with a keyword present wins.
const DOCUMENT_TYPE_LEXICON: &[(DocumentType, &[&str])] = &[
    (
        DocumentType::Thesis,
        &[
            "dissertation",
            "doctoral thesis",
            "phd thesis",
            "master's thesis",
            "masters thesis",
            "in partial fulfillment",
            "in partial fulfilment",
        ],
    ),
    (
        DocumentType::Preprint,
        &["preprint", "arxiv:", "ssrn", "working paper", "under review"],
    ),
    (
        DocumentType::ConferencePaper,
        &["proceedings of", "conference on", "symposium on", "workshop on"],
    ),
    (
        DocumentType::BookChapter,
        &["book chapter", "edited by", "(eds.)", "(ed.)"],
    ),
    (
        DocumentType::Report,
        &["technical report", "tech. report", "white paper", "report no", "policy brief"],
    ),
    (
        DocumentType::JournalArticle,
        &["journal", "law review", "vol.", "volume", "issn"],
    ),
];

const FRAGMENT_TAIL_WORDS: &[&str] = &[
    "and", "or", "of", "the", "a", "an", "to", "in", "for", "with", "by", "on", "at",
];

static ABSTRACT_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:\d{1,2}\.?\s*)?(?:abstract|summary)\s*:?$").unwrap());

static ABSTRACT_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[ \t]*(?:\*\*|__|\*|_)?(?:abstract|summary)(?:\*\*|__|\*|_)?[ \t]*[:.\-–—]+(?:\*\*|__)?[ \t]*(\S.*)$",
    )
    .unwrap()
});

static ABSTRACT_WINDOW_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)\babstract\b[\s*_:.\-–—]*(\S.+)").unwrap());

/// Where an abstract captured by the window strategy ends.
static ABSTRACT_STOP_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:#{1,6}[ \t]|(?:\*\*|__)?(?:keywords|key\s+words|index\s+terms)\b|(?:\d{1,2}|[IVX]{1,4})\.?[ \t]+introduction\b|introduction[ \t]*$)",
    )
    .unwrap()
});

static KEYWORDS_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(?:keywords|key\s+words|index\s+terms)\s*:?$").unwrap());

static KEYWORDS_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^[ \t]*(?:\*\*|__|\*|_)?(?:keywords|key\s+words|index\s+terms)(?:\*\*|__|\*|_)?[ \t]*[:.\-–—]+(?:\*\*|__)?[ \t]*(\S.*)$",
    )
    .unwrap()
});

static KEYWORD_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[;,|•·]").unwrap());

static HEADING_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]{0,3}#{1,6}[ \t]").unwrap());

static URL_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)https?://|www\.").unwrap());

static DISCLAIMER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:disclaimer|views\s+expressed|not\s+necessarily|do\s+not\s+reflect|copyright|all\s+rights\s+reserved|downloaded|licen[cs]e|permission)\b",
    )
    .unwrap()
});

static DATE_LABEL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(received|revised|accepted|submitted|published(?:\s+online)?)\b[ \t]*(?:on[ \t]+)?[:\-–]?[ \t]*(\d{1,2}[ \t\-/.][A-Za-z]{3,9}\.?[ \t\-/.,]*\d{4}|[A-Za-z]{3,9}\.?[ \t]+\d{1,2},?[ \t]+\d{4}|\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{4}|[A-Za-z]{3,9}[ \t]+\d{4})",
    )
    .unwrap()
});

/// Bare volume/issue/year headers such as `Vol. 12, No. 3 (2019)`.
static VOLUME_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)^(?:(?:vol(?:ume)?\.?|no\.?|issue|number|nr\.?|pp?\.)[ \t]*[\dIVXLC]+(?:[\-–]\d+)?|\(?(?:1[5-9]|20)\d{2}\)?|[\s,.;:\-–])+$",
    )
    .unwrap()
});

/// Everything the field strategies look at, computed once per document.
pub struct ExtractionContext<'a> {
    pub(crate) lines: Vec<&'a str>,
    pub(crate) headings: &'a [Heading],
    /// First [`HEAD_CHARS`] characters of the body (or of the references
    /// when the body is empty).
    pub(crate) head: String,
    pub(crate) front: String,
    pub(crate) config: &'a ParsingConfig,
    pub(crate) backend: Option<&'a dyn ModelBackend>,
    pub(crate) model_timeout: Duration,
    pub(crate) blocked_tokens: Vec<String>,
}

impl<'a> ExtractionContext<'a> {
    pub fn new(
        full_text: &'a str,
        references: &[String],
        headings: &'a [Heading],
        config: &'a ParsingConfig,
        backend: Option<&'a dyn ModelBackend>,
        model_timeout: Duration,
    ) -> Self {
        let head = if full_text.trim().is_empty() {
            truncate_chars(&join_references(references), HEAD_CHARS)
        } else {
            truncate_chars(full_text, HEAD_CHARS)
        };
        Self {
            lines: full_text.lines().collect(),
            headings,
            head,
            front: front_matter_with_config(full_text, config),
            config,
            backend,
            model_timeout,
            blocked_tokens: config
                .blocked_name_tokens
                .resolve_words(DEFAULT_BLOCKED_NAME_TOKENS),
        }
    }

    fn front_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        self.front.lines().enumerate()
    }

    /// Line index of the first abstract heading or label, if any.
    fn abstract_start(&self) -> Option<usize> {
        self.front_lines()
            .find(|(_, l)| is_abstract_marker(l))
            .map(|(i, _)| i)
    }
}

fn is_abstract_marker(line: &str) -> bool {
    let bare = line
        .trim()
        .trim_start_matches('#')
        .trim()
        .trim_matches(['*', '_'])
        .trim();
    ABSTRACT_HEADING_RE.is_match(bare) || ABSTRACT_LABEL_RE.is_match(line)
}

type FieldStrategy<T> = fn(&ExtractionContext<'_>) -> Option<T>;

fn first_some<T>(strategies: &[FieldStrategy<T>], ctx: &ExtractionContext<'_>) -> Option<T> {
    strategies.iter().find_map(|strategy| strategy(ctx))
}

const ABSTRACT_STRATEGIES: &[FieldStrategy<String>] =
    &[abstract_from_heading, abstract_from_label, abstract_from_window];

const KEYWORD_STRATEGIES: &[FieldStrategy<Vec<String>>] =
    &[keywords_from_heading, keywords_from_label];

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() { None } else { Some(s) }
}

/// Lines from `start` until the next heading (or keyword label), collapsed.
fn section_body(lines: &[&str], start: usize) -> String {
    let body: Vec<&str> = lines
        .iter()
        .skip(start)
        .take_while(|l| !HEADING_LINE_RE.is_match(l) && !KEYWORDS_LABEL_RE.is_match(l))
        .copied()
        .collect();
    collapse_whitespace(&body.join(" "))
}

/// Lines from `start` until the first blank line or heading, collapsed.
fn paragraph_at(lines: &[&str], start: usize) -> String {
    let body: Vec<&str> = lines
        .iter()
        .skip(start)
        .take_while(|l| !l.trim().is_empty() && !HEADING_LINE_RE.is_match(l))
        .copied()
        .collect();
    collapse_whitespace(&body.join(" "))
}

fn abstract_from_heading(ctx: &ExtractionContext<'_>) -> Option<String> {
    let heading = ctx
        .headings
        .iter()
        .find(|h| ABSTRACT_HEADING_RE.is_match(&h.text))?;
    non_empty(section_body(&ctx.lines, heading.line.saturating_add(1)))
}

fn abstract_from_label(ctx: &ExtractionContext<'_>) -> Option<String> {
    let (i, caps) = ctx
        .lines
        .iter()
        .take(ctx.config.title_scan_lines)
        .enumerate()
        .find_map(|(i, l)| ABSTRACT_LABEL_RE.captures(l).map(|c| (i, c)))?;
    let mut text = caps[1].to_string();
    let rest = paragraph_at(&ctx.lines, i + 1);
    if !rest.is_empty() {
        text.push(' ');
        text.push_str(&rest);
    }
    non_empty(collapse_whitespace(&text))
}

fn abstract_from_window(ctx: &ExtractionContext<'_>) -> Option<String> {
    let caps = ABSTRACT_WINDOW_RE.captures(&ctx.head)?;
    let window = caps.get(1)?.as_str();
    let end = ABSTRACT_STOP_RE.find(window).map_or(window.len(), |m| m.start());
    let text = collapse_whitespace(&window[..end]);
    (text.chars().count() >= MIN_WINDOW_ABSTRACT_CHARS).then_some(text)
}

/// Split a keyword list, keeping plausible terms only.
pub fn split_keywords(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    KEYWORD_SPLIT_RE
        .split(raw)
        .map(|k| {
            collapse_whitespace(k)
                .trim_matches(|c: char| c == '.' || c == '*' || c == '_' || c.is_whitespace())
                .to_string()
        })
        .filter(|k| {
            let chars = k.chars().count();
            (2..=80).contains(&chars) && k.split_whitespace().count() <= 8
        })
        .filter(|k| seen.insert(k.to_lowercase()))
        .collect()
}

fn keywords_from_heading(ctx: &ExtractionContext<'_>) -> Option<Vec<String>> {
    let heading = ctx
        .headings
        .iter()
        .find(|h| KEYWORDS_HEADING_RE.is_match(&h.text))?;
    let (start, _) = ctx
        .lines
        .iter()
        .enumerate()
        .skip(heading.line.saturating_add(1))
        .find(|(_, l)| !l.trim().is_empty())?;
    let keywords = split_keywords(&paragraph_at(&ctx.lines, start));
    (!keywords.is_empty()).then_some(keywords)
}

fn keywords_from_label(ctx: &ExtractionContext<'_>) -> Option<Vec<String>> {
    let keywords = ctx
        .lines
        .iter()
        .take(ctx.config.title_scan_lines)
        .find_map(|l| KEYWORDS_LABEL_RE.captures(l))
        .map(|caps| split_keywords(&caps[1]))?;
    (!keywords.is_empty()).then_some(keywords)
}

/// Strip markdown emphasis, heading marks and leading footnote marks.
fn clean_front_line(line: &str) -> String {
    let trimmed = line
        .trim()
        .trim_start_matches('#')
        .trim_start_matches(|c: char| {
            c.is_ascii_digit() || "⁰¹²³⁴⁵⁶⁷⁸⁹*†‡".contains(c) || c.is_whitespace()
        });
    collapse_whitespace(&trimmed.replace("**", "").replace("__", ""))
}

fn has_keyword(line: &str, keywords: &[String]) -> bool {
    let lower = fold_ascii(line).to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();
    keywords.iter().any(|k| {
        if k.contains(' ') {
            lower.contains(k.as_str())
        } else {
            words.contains(&k.as_str())
        }
    })
}

fn is_affiliation_line(line: &str, keywords: &[String]) -> bool {
    !URL_LINE_RE.is_match(line) && !DISCLAIMER_RE.is_match(line) && has_keyword(line, keywords)
}

impl ExtractionContext<'_> {
    fn affiliation_keywords(&self) -> Vec<String> {
        let defaults: Vec<String> = DEFAULT_AFFILIATION_KEYWORDS
            .iter()
            .map(|k| k.to_string())
            .collect();
        self.config
            .affiliation_keywords
            .resolve(&defaults)
            .iter()
            .map(|k| fold_ascii(k).to_lowercase())
            .collect()
    }
}

fn extract_authors(
    ctx: &ExtractionContext<'_>,
    title_line: Option<usize>,
    skip_line: Option<usize>,
) -> Vec<String> {
    let keywords = ctx.affiliation_keywords();
    let start = title_line.map_or(0, |l| l.saturating_add(1));
    let mut names = Vec::new();
    for (i, line) in ctx.lines.iter().enumerate().skip(start).take(AUTHOR_WINDOW_LINES) {
        if Some(i) == skip_line {
            continue;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if HEADING_LINE_RE.is_match(line) || is_abstract_marker(line) {
            break;
        }
        if line.contains('@') || URL_LINE_RE.is_match(line) || has_keyword(line, &keywords) {
            continue;
        }
        let parts = split_author_line(line);
        let shaped: Vec<String> = parts
            .iter()
            .filter(|p| is_name_shaped(p, &ctx.blocked_tokens))
            .cloned()
            .collect();
        if !shaped.is_empty() && shaped.len() * 2 >= parts.len() {
            names.extend(shaped);
        }
    }
    dedup_by_surname(names)
}

fn extract_affiliations(ctx: &ExtractionContext<'_>, title_line: Option<usize>) -> Vec<String> {
    let keywords = ctx.affiliation_keywords();
    let stop = ctx.abstract_start().unwrap_or(usize::MAX);
    let mut seen = HashSet::new();
    ctx.front_lines()
        .take_while(|(i, _)| *i < stop)
        .filter(|(i, l)| Some(*i) != title_line && !HEADING_LINE_RE.is_match(l))
        .map(|(_, l)| clean_front_line(l))
        .filter(|l| {
            !l.is_empty()
                && l.chars().count() <= MAX_AFFILIATION_CHARS
                && is_affiliation_line(l, &keywords)
        })
        .filter(|l| seen.insert(l.to_lowercase()))
        .collect()
}

fn extract_venue(ctx: &ExtractionContext<'_>, title_line: Option<usize>) -> Option<String> {
    let venue_keywords = ctx
        .config
        .venue_keywords
        .resolve_words(DEFAULT_VENUE_KEYWORDS);
    let affiliation_keywords = ctx.affiliation_keywords();
    let stop = ctx.abstract_start().unwrap_or(usize::MAX);
    ctx.front_lines()
        .take_while(|(i, _)| *i < stop)
        .filter(|(i, l)| Some(*i) != title_line && !HEADING_LINE_RE.is_match(l))
        .map(|(_, l)| clean_front_line(l))
        .find(|l| {
            !l.is_empty()
                && l.chars().count() <= MAX_VENUE_CHARS
                && !l.contains('@')
                && !DISCLAIMER_RE.is_match(l)
                && !has_keyword(l, &affiliation_keywords)
                && has_keyword(l, &venue_keywords)
        })
}

/// Labelled publication dates; the first occurrence of each label wins.
pub fn extract_dates(text: &str) -> PublicationDates {
    let mut dates = PublicationDates::default();
    for caps in DATE_LABEL_RE.captures_iter(text) {
        let label = caps[1].to_lowercase();
        let value = caps[2].trim().to_string();
        let slot = match label.split_whitespace().next().unwrap_or("") {
            "received" => &mut dates.received,
            "revised" => &mut dates.revised,
            "accepted" => &mut dates.accepted,
            "submitted" => &mut dates.submitted,
            _ => &mut dates.published,
        };
        if slot.is_none() {
            *slot = Some(value);
        }
    }
    dates
}

/// Document genre from the keyword lexicon over `text`, else `Unknown`.
pub fn detect_document_type(text: &str) -> DocumentType {
    let lower = text.to_lowercase();
    DOCUMENT_TYPE_LEXICON
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| lower.contains(k)))
        .map_or(DocumentType::Unknown, |(kind, _)| *kind)
}

/// A title that starts or ends mid-sentence.
fn is_fragment_title(title: &str) -> bool {
    let title = title.trim();
    let Some(first) = title.chars().next() else {
        return false;
    };
    if first.is_lowercase() || ",;:)]".contains(first) {
        return true;
    }
    if title.ends_with([',', ';', '-']) {
        return true;
    }
    title
        .split_whitespace()
        .last()
        .is_some_and(|w| FRAGMENT_TAIL_WORDS.contains(&w.to_lowercase().as_str()))
}

fn detect_partial(ctx: &ExtractionContext<'_>, meta: &DocumentMetadata) -> PartialDocument {
    let mut reasons = Vec::new();
    let no_authors = meta.authors.is_empty();
    if let Some(title) = &meta.title {
        if is_structural_title(title) {
            reasons.push("structural_title".to_string());
        }
        if no_authors && VOLUME_HEADER_RE.is_match(title.trim()) {
            reasons.push("volume_header_title".to_string());
        }
        if no_authors && !meta.has_identifier() && is_fragment_title(title) {
            reasons.push("fragment_title".to_string());
        }
    }
    let dotted = ctx.lines.iter().filter(|l| TOC_LEADER_RE.is_match(l)).count();
    if dotted >= TOC_HEAVY_MIN_LINES && no_authors && meta.abstract_text.is_none() {
        reasons.push("toc_heavy".to_string());
    }
    PartialDocument {
        is_partial_document: !reasons.is_empty(),
        reasons,
    }
}

/// Heuristic metadata extractor with an optional model backend for titles.
pub struct MetadataExtractor {
    config: ParsingConfig,
    backend: Option<Arc<dyn ModelBackend>>,
    model_timeout: Duration,
}

impl Default for MetadataExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataExtractor {
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        Self {
            config,
            backend: None,
            model_timeout: DEFAULT_MODEL_TIMEOUT,
        }
    }

    /// Consult `backend` for the title when the text strategies find nothing.
    pub fn with_backend(mut self, backend: Arc<dyn ModelBackend>, timeout: Duration) -> Self {
        self.backend = Some(backend);
        self.model_timeout = timeout;
        self
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    pub fn extract(
        &self,
        full_text: &str,
        references: &[String],
        headings: &[Heading],
    ) -> DocumentMetadata {
        let ctx = ExtractionContext::new(
            full_text,
            references,
            headings,
            &self.config,
            self.backend.as_deref(),
            self.model_timeout,
        );

        let candidate: Option<TitleCandidate> = TITLE_STRATEGIES
            .iter()
            .find_map(|strategy| strategy(&ctx))
            .map(|c| refine_name_title(&ctx, c));
        let title_line = candidate.as_ref().and_then(|c| c.line);

        let (title, mut subtitle) = match &candidate {
            Some(c) => {
                let (title, subtitle) = split_subtitle(&c.text);
                (Some(title), subtitle)
            }
            None => (None, None),
        };
        let mut subtitle_line = None;
        if subtitle.is_none()
            && let Some(line) = title_line
            && let Some((text, at)) = subtitle_from_heading(&ctx, line)
        {
            subtitle = Some(text);
            subtitle_line = Some(at);
        }

        let abstract_text = first_some(ABSTRACT_STRATEGIES, &ctx)
            .map(|a| truncate_chars(&a, self.config.abstract_max_chars));
        let publication_dates = extract_dates(&ctx.head);
        let publication_year = publication_dates
            .published
            .as_deref()
            .and_then(find_year)
            .or_else(|| find_year(&ctx.front));

        let mut meta = DocumentMetadata {
            title,
            subtitle,
            document_type: detect_document_type(&format!("{}\n{}", ctx.front, ctx.head)),
            venue: extract_venue(&ctx, title_line),
            publication_year,
            publication_dates,
            authors: extract_authors(&ctx, title_line, subtitle_line),
            affiliations: extract_affiliations(&ctx, title_line),
            emails: extract_emails(&ctx.head),
            orcids: extract_orcids(&ctx.head),
            identifiers: extract_identifiers(&ctx.head),
            abstract_text,
            keywords: first_some(KEYWORD_STRATEGIES, &ctx).unwrap_or_default(),
            partial_document: PartialDocument::default(),
        };
        meta.partial_document = detect_partial(&ctx, &meta);

        tracing::debug!(
            title = meta.title.as_deref().unwrap_or(""),
            title_source = ?candidate.map(|c| c.source),
            authors = meta.authors.len(),
            partial = meta.partial_document.is_partial_document,
            "extracted metadata"
        );
        meta
    }
}

/// Extract metadata with the default configuration and no model backend.
pub fn extract(full_text: &str, references: &[String], headings: &[Heading]) -> DocumentMetadata {
    MetadataExtractor::new().extract(full_text, references, headings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::section::parse_headings;

    fn run(text: &str) -> DocumentMetadata {
        extract(text, &[], &parse_headings(text))
    }

    #[test]
    fn test_front_matter_fields() {
        let text = "# A Study of X\nJane A. Doe, John B. Smith\nUniversity of Somewhere\n\n## Abstract\nThis paper studies X in depth.\n\nKeywords: attribution; cyber operations, state responsibility\n\n## 1. Introduction\nBody.";
        let meta = run(text);
        assert_eq!(meta.title.as_deref(), Some("A Study of X"));
        assert_eq!(meta.authors, vec!["Jane A. Doe", "John B. Smith"]);
        assert_eq!(meta.affiliations, vec!["University of Somewhere"]);
        assert_eq!(meta.abstract_text.as_deref(), Some("This paper studies X in depth."));
        assert_eq!(
            meta.keywords,
            vec!["attribution", "cyber operations", "state responsibility"]
        );
        assert!(!meta.is_partial());
    }

    #[test]
    fn test_heading_lines_past_end_of_text() {
        let headings = [Heading {
            level: 1,
            text: "Jane Doe".into(),
            line: 5,
            numbering: None,
        }];
        let meta = extract("Jane Doe", &[], &headings);
        assert_eq!(meta.title.as_deref(), Some("Jane Doe"));

        let headings = [
            Heading {
                level: 2,
                text: "Keywords".into(),
                line: 40,
                numbering: None,
            },
            Heading {
                level: 2,
                text: "Abstract".into(),
                line: usize::MAX,
                numbering: None,
            },
        ];
        let meta = extract("Short text
with two lines", &[], &headings);
        assert!(meta.keywords.is_empty());
    }

    #[test]
    fn test_subtitle_split_and_h2() {
        let meta = run("# Attribution: A Primer\nJane Doe\n");
        assert_eq!(meta.title.as_deref(), Some("Attribution"));
        assert_eq!(meta.subtitle.as_deref(), Some("A Primer"));

        let meta = run("# Attribution\n## Norms After Tallinn\nJane Doe\n");
        assert_eq!(meta.subtitle.as_deref(), Some("Norms After Tallinn"));
        assert_eq!(meta.authors, vec!["Jane Doe"]);
    }

    #[test]
    fn test_abstract_label_and_window() {
        let meta = run("Regulating Attribution in Cyberspace\nAbstract: Short summary line.\ncontinues here\n\nBody");
        assert_eq!(
            meta.abstract_text.as_deref(),
            Some("Short summary line. continues here")
        );

        let text = "Regulating Attribution in Cyberspace\n**ABSTRACT**\nThis article argues that attribution is a legal question first.\n\n1. Introduction\nBody";
        let meta = run(text);
        assert_eq!(
            meta.abstract_text.as_deref(),
            Some("This article argues that attribution is a legal question first.")
        );
    }

    #[test]
    fn test_abstract_capped() {
        let long = "word ".repeat(1000);
        let text = format!("# Title Here\n## Abstract\n{long}");
        let meta = run(&text);
        assert_eq!(meta.abstract_text.map(|a| a.chars().count()), Some(1600));
    }

    #[test]
    fn test_identifiers_emails_dates() {
        let text = "# A Study of X\nJane Doe\njane.doe@uni.edu\nReceived: 12 March 2019; Accepted: April 2, 2020\nPublished 2020-05-01\nDOI: 10.1234/abc.def.\nORCID 0000-0002-1825-0097";
        let meta = run(text);
        assert_eq!(meta.emails, vec!["jane.doe@uni.edu"]);
        assert_eq!(meta.identifiers.doi, vec!["10.1234/abc.def"]);
        assert_eq!(meta.orcids, vec!["0000-0002-1825-0097"]);
        assert_eq!(meta.publication_dates.received.as_deref(), Some("12 March 2019"));
        assert_eq!(meta.publication_dates.accepted.as_deref(), Some("April 2, 2020"));
        assert_eq!(meta.publication_dates.published.as_deref(), Some("2020-05-01"));
        assert_eq!(meta.publication_year.as_deref(), Some("2020"));
    }

    #[test]
    fn test_venue_and_document_type() {
        let text = "Harvard Journal of Law and Technology, Vol. 12\n# A Study of X\nJane Doe";
        let meta = run(text);
        assert_eq!(
            meta.venue.as_deref(),
            Some("Harvard Journal of Law and Technology, Vol. 12")
        );
        assert_eq!(meta.document_type, DocumentType::JournalArticle);

        assert_eq!(
            detect_document_type("A dissertation submitted in partial fulfillment"),
            DocumentType::Thesis
        );
        assert_eq!(detect_document_type("nothing"), DocumentType::Unknown);
    }

    #[test]
    fn test_toc_document_is_partial() {
        let mut text = String::from("# Table of Contents\n");
        for i in 1..=8 {
            text.push_str(&format!("Chapter {i} .......... {}\n", i * 10));
        }
        let meta = run(&text);
        assert_eq!(meta.title.as_deref(), Some("Table of Contents"));
        assert!(meta.is_partial());
        assert!(meta.partial_document.reasons.contains(&"structural_title".to_string()));
        assert!(meta.partial_document.reasons.contains(&"toc_heavy".to_string()));
    }

    #[test]
    fn test_volume_and_fragment_titles() {
        let meta = run("# Vol. 12, No. 3 (2019)\nbody text");
        assert!(meta.partial_document.reasons.contains(&"volume_header_title".to_string()));

        let meta = run("# and the consequences of attribution for\nbody text");
        assert!(meta.partial_document.reasons.contains(&"fragment_title".to_string()));
    }

    #[test]
    fn test_split_keywords_filters() {
        assert_eq!(
            split_keywords("a; Cyber • Norms | norms · x, one two three four five six seven eight nine"),
            vec!["Cyber", "Norms"]
        );
    }

    #[test]
    fn test_empty_input() {
        let meta = run("");
        assert_eq!(meta, DocumentMetadata::default());
    }
}
