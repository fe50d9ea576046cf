//! Citation linking: scan markers, index definitions, resolve, aggregate.
//!
//! Every bucket is processed independently and unconditionally, so a document
//! can populate several buckets at once. Linking never fails; empty or
//! malformed input degrades to all-zero statistics.

use std::collections::BTreeSet;
use std::sync::Arc;

use citelink_core::text_utils::{find_year, first_author_surname, fold_ascii};
use citelink_core::{
    BucketKind, BucketResult, CitationOccurrence, DefinitionIndex, DefinitionIndexCache,
    LinkResult, StyleBucket, StyleLabel, join_references,
};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;
use crate::markers::{self, Marker};
use crate::section::segment_entries;
use crate::style;

/// `[12] text`, `12. text` or `12) text` at line start.
static NUMBERED_DEFINITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(?:\[(\d{1,4})\]|(\d{1,4})[.)])[ \t]+(\S.*)$").unwrap()
});

/// Note definitions: superscript digits, `<sup>n</sup>`, `^n`, `[n]`, or a
/// bare number optionally followed by `.`/`)`.
static NOTE_DEFINITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[ \t]*(?:([⁰¹²³⁴⁵⁶⁷⁸⁹]+)|<sup>\s*(\d{1,4})\s*</sup>|\^\{?(\d{1,4})\}?|\[(\d{1,4})\]|(\d{1,4})[.)]?)[ \t]+(\S.*)$",
    )
    .unwrap()
});

/// Notes written inside the body: superscript digits, `<sup>n</sup>`, `^n`
/// or `[n]` at line start.
static BODY_NOTE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^[ \t]*(?:([⁰¹²³⁴⁵⁶⁷⁸⁹]+)|<sup>\s*(\d{1,4})\s*</sup>|\^\{?(\d{1,4})\}?|\[(\d{1,4})\])[ \t]+(\S.*)$",
    )
    .unwrap()
});

/// `12 text`: a bare note number, only trusted inside a note block.
static BARE_NOTE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]*(\d{1,3})[ \t]+(\S.*)$").unwrap());

static LEADING_NUMBER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:\[\d{1,4}\]|\d{1,4}[.)]|[⁰¹²³⁴⁵⁶⁷⁸⁹]+)\s*").unwrap());

static HEADING_LINE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[ \t]{0,3}#{1,6}[ \t]").unwrap());

fn canonical_number(raw: &str) -> Option<String> {
    let ascii: String = raw
        .chars()
        .map(|c| match c {
            '⁰' => '0',
            '¹' => '1',
            '²' => '2',
            '³' => '3',
            '⁴' => '4',
            '⁵' => '5',
            '⁶' => '6',
            '⁷' => '7',
            '⁸' => '8',
            '⁹' => '9',
            other => other,
        })
        .collect();
    ascii.parse::<u32>().ok().map(|n| n.to_string())
}

/// `(key, text)` from the first non-empty capture before the last (text) group.
fn note_start(re: &Regex, line: &str) -> Option<(String, String)> {
    let caps = re.captures(line)?;
    let groups = caps.len();
    let key = (1..groups - 1)
        .filter_map(|i| caps.get(i))
        .find_map(|m| canonical_number(m.as_str()))?;
    let body = caps.get(groups - 1)?.as_str().trim().to_string();
    Some((key, body))
}

/// Index numbered definition lines. A definition continues over following
/// non-blank lines and ends at a blank line, a heading, or the next definition.
/// The key comes from the first non-empty capture group before the text group.
fn index_numbered_lines(text: &str, re: &Regex, index: &mut DefinitionIndex) {
    let mut current: Option<(String, String)> = None;
    let flush = |current: &mut Option<(String, String)>, index: &mut DefinitionIndex| {
        if let Some((key, body)) = current.take() {
            index.insert(key, body);
        }
    };

    for line in text.lines() {
        if line.trim().is_empty() || HEADING_LINE_RE.is_match(line) {
            flush(&mut current, index);
            continue;
        }
        if let Some(note) = note_start(re, line) {
            flush(&mut current, index);
            current = Some(note);
            continue;
        }
        if let Some((_, body)) = current.as_mut() {
            body.push(' ');
            body.push_str(line.trim());
        }
    }
    flush(&mut current, index);
}

/// Index notes that sit in the body text.
///
/// A note block opens with an explicit note line (`¹ text`, `[1] text`, ...)
/// and runs to the next blank line or heading. Inside an open block a bare
/// `2 text` line also starts a note; elsewhere numbered lines are ordinary
/// prose or lists and are ignored.
fn index_body_notes(text: &str, index: &mut DefinitionIndex) {
    let mut current: Option<(String, String)> = None;
    let mut in_block = false;
    let flush = |current: &mut Option<(String, String)>, index: &mut DefinitionIndex| {
        if let Some((key, body)) = current.take() {
            index.insert(key, body);
        }
    };

    for line in text.lines() {
        if line.trim().is_empty() || HEADING_LINE_RE.is_match(line) {
            flush(&mut current, index);
            in_block = false;
            continue;
        }
        let start = note_start(&BODY_NOTE_RE, line)
            .or_else(|| in_block.then(|| note_start(&BARE_NOTE_RE, line)).flatten());
        if let Some(note) = start {
            flush(&mut current, index);
            current = Some(note);
            in_block = true;
            continue;
        }
        if let Some((_, body)) = current.as_mut() {
            body.push(' ');
            body.push_str(line.trim());
        }
    }
    flush(&mut current, index);
}

/// Author-year index: one `surname:year` key per bibliography entry.
fn index_author_year(references: &str, index: &mut DefinitionIndex) {
    for entry in segment_entries(references) {
        let stripped = LEADING_NUMBER_RE.replace(&entry, "");
        let (Some(surname), Some(year)) = (first_author_surname(&stripped), find_year(&stripped))
        else {
            continue;
        };
        index.insert(format!("{surname}:{year}"), entry.clone());
    }
}

/// Build the definition index for one bucket.
///
/// `footnotes` indexes the reference block first, then note blocks in the
/// body.
pub fn build_definition_index(
    bucket: BucketKind,
    full_text: &str,
    references: &str,
) -> DefinitionIndex {
    let mut index = DefinitionIndex::new();
    match bucket {
        BucketKind::Numeric => index_numbered_lines(references, &NUMBERED_DEFINITION_RE, &mut index),
        BucketKind::Tex => index_numbered_lines(references, &NOTE_DEFINITION_RE, &mut index),
        BucketKind::Footnotes => {
            index_numbered_lines(references, &NOTE_DEFINITION_RE, &mut index);
            index_body_notes(full_text, &mut index);
        }
        BucketKind::AuthorYear => index_author_year(references, &mut index),
    }
    index
}

fn match_tokens(s: &str) -> String {
    let folded: String = fold_ascii(s)
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { ' ' })
        .collect();
    format!(" {} ", folded.split_whitespace().collect::<Vec<_>>().join(" "))
}

/// A configurable citation linker.
///
/// Holds a [`ParsingConfig`] and an optional shared [`DefinitionIndexCache`].
pub struct CitationLinker {
    config: ParsingConfig,
    cache: Option<Arc<DefinitionIndexCache>>,
}

impl Default for CitationLinker {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationLinker {
    pub fn new() -> Self {
        Self::with_config(ParsingConfig::default())
    }

    pub fn with_config(config: ParsingConfig) -> Self {
        Self {
            config,
            cache: None,
        }
    }

    /// Memoise definition indexes in `cache`.
    pub fn with_cache(mut self, cache: Arc<DefinitionIndexCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn config(&self) -> &ParsingConfig {
        &self.config
    }

    /// Link without a declared style.
    pub fn link(&self, full_text: &str, references: &[String]) -> LinkResult {
        self.link_with_style(full_text, references, None)
    }

    /// Link, letting an externally declared style pick the dominant bucket.
    pub fn link_with_style(
        &self,
        full_text: &str,
        references: &[String],
        declared: Option<StyleLabel>,
    ) -> LinkResult {
        let refs = join_references(references);
        let mut result = LinkResult::default();

        let superscripts = markers::scan_superscript(full_text, &self.config);
        for bucket in [BucketKind::Footnotes, BucketKind::Tex] {
            let index = self.index_for(bucket, full_text, &refs);
            *result.bucket_mut(bucket) = resolve_numbered(&superscripts, &index);
        }

        let numeric = markers::scan_numeric(full_text, &self.config);
        let index = self.index_for(BucketKind::Numeric, full_text, &refs);
        result.numeric = resolve_numbered(&numeric, &index);

        let author_year = markers::scan_author_year(full_text, &self.config);
        let index = self.index_for(BucketKind::AuthorYear, full_text, &refs);
        result.author_year = self.resolve_author_year(&author_year, &index);

        for bucket in BucketKind::ALL {
            let total = &result.bucket(bucket).total;
            tracing::debug!(
                bucket = bucket.as_str(),
                markers = total.intext_total,
                resolved = total.success_occurrences,
                definitions = total.bib_unique_total,
                "linked bucket"
            );
        }

        let declared = declared.filter(|s| *s != StyleLabel::Unknown);
        result.dominant = select_dominant(&result, declared);
        result.style = match (declared, result.dominant) {
            (Some(label), _) => label,
            (None, None) => StyleLabel::Unknown,
            (None, Some(bucket)) => {
                let signals = style::detect_signals_with_config(full_text, &self.config);
                let recommended = style::recommend_style_with_thresholds(
                    &signals,
                    references.iter().filter(|r| !r.trim().is_empty()).count(),
                    &self.config.thresholds,
                );
                if recommended == StyleLabel::Hybrid {
                    StyleLabel::Hybrid
                } else {
                    bucket.style_label()
                }
            }
        };
        tracing::debug!(style = result.style.as_str(), dominant = ?result.dominant, "selected style");
        result
    }

    /// Only reference-derived indexes are cached. The footnotes index adds
    /// per-document body notes on top of the cached reference notes, so it is
    /// rebuilt on every call.
    fn index_for(&self, bucket: BucketKind, full_text: &str, refs: &str) -> Arc<DefinitionIndex> {
        match (&self.cache, bucket) {
            (Some(_), BucketKind::Footnotes) => {
                let mut index = DefinitionIndex::clone(&self.index_for(BucketKind::Tex, full_text, refs));
                index_body_notes(full_text, &mut index);
                Arc::new(index)
            }
            (Some(cache), _) => cache.get_or_insert_with(bucket.as_str(), refs, || {
                build_definition_index(bucket, full_text, refs)
            }),
            (None, _) => Arc::new(build_definition_index(bucket, full_text, refs)),
        }
    }

    fn resolve_author_year(&self, found: &[Marker], index: &DefinitionIndex) -> BucketResult {
        let mut results = Vec::with_capacity(found.len());
        let mut resolved_keys: BTreeSet<String> = BTreeSet::new();
        let mut success = 0;

        for marker in found {
            let hit = marker
                .keys
                .first()
                .and_then(|key| self.lookup_author_year(key, index));
            let footnote = match hit {
                Some((key, text)) => {
                    success += 1;
                    resolved_keys.insert(key);
                    text
                }
                None => String::new(),
            };
            results.push(CitationOccurrence {
                index: marker.index.clone(),
                intext_citation: marker.raw.clone(),
                preceding_text: marker.context.clone(),
                footnote,
            });
        }

        BucketResult {
            total: StyleBucket::from_counts(found.len(), success, resolved_keys.len(), index.len()),
            results,
        }
    }

    /// Key lookup, then surname-in-author-segment + year scan, then fuzzy
    /// surname with identical year. Returns the matched index key and text.
    fn lookup_author_year(&self, key: &str, index: &DefinitionIndex) -> Option<(String, String)> {
        if let Some(text) = index.get(key) {
            return Some((key.to_string(), text.to_string()));
        }
        let (surname, year) = key.split_once(':')?;
        let needle = format!(" {surname} ");

        for entry in index.entries() {
            let Some(year_pos) = entry.text.find(year) else {
                continue;
            };
            if match_tokens(&entry.text[..year_pos]).contains(&needle) {
                return Some((entry.key.clone(), entry.text.clone()));
            }
        }

        let threshold = self.config.thresholds.fuzzy_surname_min;
        let mut best: Option<(f64, &citelink_core::DefinitionEntry)> = None;
        for entry in index.entries() {
            let Some((entry_surname, entry_year)) = entry.key.split_once(':') else {
                continue;
            };
            if entry_year != year {
                continue;
            }
            let score = rapidfuzz::fuzz::ratio(surname.chars(), entry_surname.chars());
            if score >= threshold && best.is_none_or(|(b, _)| score > b) {
                best = Some((score, entry));
            }
        }
        best.map(|(_, e)| (e.key.clone(), e.text.clone()))
    }
}

fn resolve_numbered(found: &[Marker], index: &DefinitionIndex) -> BucketResult {
    let mut results = Vec::with_capacity(found.len());
    let mut resolved_keys: BTreeSet<&str> = BTreeSet::new();
    let mut success = 0;

    for marker in found {
        let mut texts: Vec<&str> = Vec::new();
        for key in &marker.keys {
            if let Some(text) = index.get(key) {
                texts.push(text);
                resolved_keys.insert(key.as_str());
            }
        }
        if !texts.is_empty() {
            success += 1;
        }
        results.push(CitationOccurrence {
            index: marker.index.clone(),
            intext_citation: marker.raw.clone(),
            preceding_text: marker.context.clone(),
            footnote: texts.join("\n"),
        });
    }

    BucketResult {
        total: StyleBucket::from_counts(found.len(), success, resolved_keys.len(), index.len()),
        results,
    }
}

/// Declared style wins when it maps to a bucket. Otherwise the highest
/// `success_occurrences` among tex/numeric/author_year, then `intext_total`,
/// then the fixed order numeric > author_year > tex. Footnotes is never chosen.
fn select_dominant(result: &LinkResult, declared: Option<StyleLabel>) -> Option<BucketKind> {
    if let Some(bucket) = declared.and_then(|s| s.preferred_bucket()) {
        return Some(bucket);
    }
    let mut best: Option<(BucketKind, (usize, usize))> = None;
    for bucket in [BucketKind::Numeric, BucketKind::AuthorYear, BucketKind::Tex] {
        let total = &result.bucket(bucket).total;
        if total.intext_total == 0 {
            continue;
        }
        let score = (total.success_occurrences, total.intext_total);
        if best.is_none_or(|(_, b)| score > b) {
            best = Some((bucket, score));
        }
    }
    best.map(|(bucket, _)| bucket)
}

/// Link with default configuration and no cache.
pub fn link(full_text: &str, references: &[String]) -> LinkResult {
    CitationLinker::new().link(full_text, references)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(s: &str) -> Vec<String> {
        vec![s.to_string()]
    }

    #[test]
    fn test_superscript_footnotes_resolve() {
        let body = "Attribution remains likely.¹ See also the 2019 study.² ";
        let result = link(
            body,
            &refs("1. Mandiant, APT1 Report (2013).\n2. Smith, J. (2019). Attribution Norms."),
        );
        for bucket in [&result.tex, &result.footnotes] {
            assert_eq!(bucket.total.intext_total, 2);
            assert_eq!(bucket.total.success_occurrences, 2);
            assert_eq!(bucket.total.bib_unique_total, 2);
            assert_eq!(bucket.results[0].footnote, "Mandiant, APT1 Report (2013).");
        }
        assert_eq!(result.dominant, Some(BucketKind::Tex));
        assert_eq!(result.style, StyleLabel::Footnotes);
    }

    #[test]
    fn test_numeric_unresolved_marker() {
        let result = link("As shown in [5], this holds.", &refs("1. Only entry.\n2. Another."));
        assert_eq!(result.numeric.total.intext_total, 1);
        assert_eq!(result.numeric.total.success_occurrences, 0);
        assert_eq!(result.numeric.results[0].footnote, "");
        assert_eq!(result.numeric.results[0].intext_citation, "[5]");
        assert_eq!(result.dominant, Some(BucketKind::Numeric));
    }

    #[test]
    fn test_numeric_range_counts_once() {
        let result = link(
            "Known results [1-3] and [2].",
            &refs("[1] One.\n[2] Two.\n[3] Three.\n[4] Four."),
        );
        let total = &result.numeric.total;
        assert_eq!(total.intext_total, 2);
        assert_eq!(total.success_occurrences, 2);
        assert_eq!(total.success_unique, 3);
        assert_eq!(total.bib_unique_total, 4);
        assert_eq!(result.numeric.results[0].footnote, "One.\nTwo.\nThree.");
    }

    #[test]
    fn test_duplicate_definitions_keep_first() {
        let index = build_definition_index(BucketKind::Numeric, "", "1. First\n1. Second\n2. Two");
        assert_eq!(index.get("1"), Some("First"));
        assert_eq!(index.len(), 2);
    }

    #[test]
    fn test_definition_continuation_lines() {
        let index = build_definition_index(
            BucketKind::Numeric,
            "",
            "# References\n1. Doe, J.\n   A long title.\n\nStray paragraph\n2. Two",
        );
        assert_eq!(index.get("1"), Some("Doe, J. A long title."));
        assert_eq!(index.get("2"), Some("Two"));
    }

    #[test]
    fn test_footnotes_bucket_indexes_body_notes() {
        let body = "A claim.¹ More text.²\n\n¹ Body note one.\n² Body note two.";
        let result = link(body, &[]);
        assert_eq!(result.footnotes.total.success_occurrences, 2);
        assert_eq!(result.footnotes.total.bib_unique_total, 2);
        assert_eq!(result.tex.total.success_occurrences, 0);
        assert_eq!(result.tex.total.bib_unique_total, 0);
    }

    #[test]
    fn test_body_numbered_list_is_not_a_note() {
        let body = "States must act.¹\n\n1. First, a numbered list item.\n2 Second item without a period.";
        let result = link(body, &[]);
        assert_eq!(result.footnotes.total.intext_total, 1);
        assert_eq!(result.footnotes.total.success_occurrences, 0);
        assert_eq!(result.footnotes.total.bib_unique_total, 0);
    }

    #[test]
    fn test_bare_number_continues_note_block() {
        let body = "Claim.¹ Other.²\n\n¹ First note.\n2 Second note.";
        let result = link(body, &[]);
        assert_eq!(result.footnotes.total.success_occurrences, 2);
        assert_eq!(result.footnotes.total.bib_unique_total, 2);
        assert_eq!(result.footnotes.results[1].footnote, "Second note.");
    }

    #[test]
    fn test_author_year_resolution_paths() {
        let body = "Early work (Smith, 2019) and (Jones 2020) and (Smitth 2019) and (Nobody 2001).";
        let result = link(
            body,
            &refs("Smith, J. (2019). Attribution Norms.\n\nLee, A., & Jones, K. (2020). Shared.\n\nBrown, B. (2018). Other."),
        );
        let ay = &result.author_year;
        assert_eq!(ay.total.intext_total, 4);
        assert_eq!(ay.results[0].footnote, "Smith, J. (2019). Attribution Norms.");
        assert!(ay.results[1].footnote.starts_with("Lee, A., & Jones"));
        assert_eq!(ay.results[2].footnote, "Smith, J. (2019). Attribution Norms.");
        assert_eq!(ay.results[3].footnote, "");
        assert_eq!(ay.total.success_occurrences, 3);
        assert_eq!(ay.total.success_unique, 2);
        assert_eq!(ay.total.bib_unique_total, 3);
    }

    #[test]
    fn test_no_markers_is_unknown() {
        let result = link("Plain prose without any citations.", &refs("1. Orphan entry."));
        assert_eq!(result.style, StyleLabel::Unknown);
        assert_eq!(result.dominant, None);
        assert_eq!(result.numeric.total.bib_unique_total, 1);
        assert_eq!(result.numeric.total.bib_coverage_rate, 0.0);
        assert_eq!(result.numeric.total.occurrence_match_rate, 0.0);
    }

    #[test]
    fn test_declared_style_selects_bucket() {
        let linker = CitationLinker::new();
        let body = "Claim [1]. Another (Doe, 2020).";
        let references = refs("1. Doe, J. (2020). Paper.");
        let result = linker.link_with_style(body, &references, Some(StyleLabel::parse("apa")));
        assert_eq!(result.dominant, Some(BucketKind::AuthorYear));
        assert_eq!(result.style, StyleLabel::AuthorYear);
    }

    #[test]
    fn test_dominant_tie_prefers_numeric() {
        let body = "Claim [1]. Another (Doe, 2020).";
        let references = refs("1. Doe, J. (2020). Paper.");
        let result = link(body, &references);
        assert_eq!(result.numeric.total.success_occurrences, 1);
        assert_eq!(result.author_year.total.success_occurrences, 1);
        assert_eq!(result.dominant, Some(BucketKind::Numeric));
    }

    #[test]
    fn test_cache_reused_across_documents() {
        let cache = Arc::new(DefinitionIndexCache::new());
        let linker = CitationLinker::new().with_cache(Arc::clone(&cache));
        let references = refs("1. One.\n2. Two.");
        let a = linker.link("Text [1].", &references);
        let b = linker.link("Other text [2].", &references);
        assert_eq!(a.numeric.total.success_occurrences, 1);
        assert_eq!(b.numeric.total.success_occurrences, 1);
        assert!(cache.stats().hits >= 3);
    }

    #[test]
    fn test_cache_size_independent_of_document_count() {
        let cache = Arc::new(DefinitionIndexCache::new());
        let linker = CitationLinker::new().with_cache(Arc::clone(&cache));
        let references = refs("1. One.\n2. Two.");
        linker.link("Opening claim.¹ [2]", &references);
        let after_first = cache.len();
        for i in 0..50 {
            let body = format!("Document {i} makes a claim.¹ See [2].\n\n¹ Body note for document {i}.");
            let result = linker.link(&body, &references);
            assert_eq!(result.footnotes.total.success_occurrences, 1);
        }
        assert_eq!(cache.len(), after_first);
        assert!(cache.len() <= BucketKind::ALL.len());
    }

    #[test]
    fn test_coverage_invariant_on_messy_input() {
        let body = "x¹ y² z³ [1] [2-9] [7] (Doe 2020) (Doe 2020) Roe (2019)\n1. Note";
        let result = link(body, &refs("1. Doe, J. (2020).\n1. Dup\nRoe, R. 2019"));
        for bucket in BucketKind::ALL {
            let t = &result.bucket(bucket).total;
            assert!(t.success_occurrences <= t.intext_total);
            assert!(t.success_unique <= t.bib_unique_total);
            let resolved = result
                .bucket(bucket)
                .results
                .iter()
                .filter(|o| o.is_resolved())
                .count();
            assert_eq!(resolved, t.success_occurrences);
        }
    }
}
