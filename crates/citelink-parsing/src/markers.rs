//! In-text citation marker scanning, shared by the style detector and the linker.

use citelink_core::text_utils::{collapse_whitespace, first_author_surname, tail_chars};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;

const SUPERSCRIPT_DIGITS: [(char, char); 10] = [
    ('⁰', '0'),
    ('¹', '1'),
    ('²', '2'),
    ('³', '3'),
    ('⁴', '4'),
    ('⁵', '5'),
    ('⁶', '6'),
    ('⁷', '7'),
    ('⁸', '8'),
    ('⁹', '9'),
];

static SUPERSCRIPT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"[⁰¹²³⁴⁵⁶⁷⁸⁹]+(?:[⁻,][⁰¹²³⁴⁵⁶⁷⁸⁹]+)*|<sup>\s*(\d{1,4}(?:\s*[,\-–]\s*\d{1,4})*)\s*</sup>|\^\{\s*(\d{1,4}(?:\s*[,\-–]\s*\d{1,4})*)\s*\}|\^(\d{1,4})\b",
    )
    .unwrap()
});

static BRACKET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[(\d{1,4}(?:\s*[,\-–]\s*\d{1,4})*)\]").unwrap());

static PAREN_GROUP_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(([^()\n]{4,300})\)").unwrap());

/// One `;`-separated item of a parenthetical citation: author part, year,
/// optional page pin-cite.
static AUTHOR_YEAR_ITEM_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(?:(?:[Ss]ee(?:\s+also)?|e\.g\.|[Cc]f\.|i\.e\.)[,\s]+)?(\p{Lu}[^;()\d]{1,80}?)[,\s]+((?:1[5-9]|20)\d{2})[a-z]?(?:\s*[,:]\s*(?:pp?\.?\s*)?\d+(?:\s*[-–]\s*\d+)?)?\s*$",
    )
    .unwrap()
});

static NARRATIVE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(\p{Lu}[\p{L}'’\-]+(?:\s+et\s+al\.?|\s+(?:and|&)\s+\p{Lu}[\p{L}'’\-]+)?)\s+\(((?:1[5-9]|20)\d{2})[a-z]?(?:\s*[,:]\s*(?:pp?\.?\s*)?\d+(?:\s*[-–]\s*\d+)?)?\)",
    )
    .unwrap()
});

/// Capitalised words that start dates and cross-references, never author names.
const NON_AUTHOR_WORDS: &[&str] = &[
    "in", "see", "the", "this", "that", "for", "from", "since", "until", "before", "after",
    "during", "circa", "ca", "table", "figure", "fig", "section", "chapter", "vol", "no", "art",
    "part", "page", "pp", "january", "february", "march", "april", "may", "june", "july",
    "august", "september", "october", "november", "december", "spring", "summer", "fall",
    "autumn", "winter", "and", "or", "as", "by", "on", "at", "of",
];

/// A marker found in running text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    /// Byte offset of the marker in the scanned text.
    pub start: usize,
    /// The marker as it appears in the text.
    pub raw: String,
    /// Lookup keys: reference numbers, or `surname:year` for author-year.
    pub keys: Vec<String>,
    /// Display index: keys joined with `,`.
    pub index: String,
    /// Collapsed text immediately preceding the marker.
    pub context: String,
    /// Narrative `Author (2020)` rather than parenthetical.
    pub narrative: bool,
}

fn preceding_context(text: &str, start: usize, max: usize) -> String {
    collapse_whitespace(&tail_chars(&text[..start], max))
}

fn superscript_to_ascii(s: &str) -> String {
    s.chars()
        .map(|c| {
            SUPERSCRIPT_DIGITS
                .iter()
                .find(|(sup, _)| *sup == c)
                .map(|(_, ascii)| *ascii)
                .unwrap_or(match c {
                    '⁻' => '-',
                    other => other,
                })
        })
        .collect()
}

/// Expand `"3-5, 8"` into `["3", "4", "5", "8"]`. A range yields at most
/// `max_range` numbers; a reversed range yields its two endpoints.
pub fn expand_number_list(list: &str, max_range: usize) -> Vec<String> {
    fn push(n: u32, out: &mut Vec<String>) {
        let s = n.to_string();
        if !out.contains(&s) {
            out.push(s);
        }
    }

    let mut out: Vec<String> = Vec::new();
    for part in list.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let bounds: Vec<&str> = part.split(['-', '–']).map(str::trim).collect();
        match bounds.as_slice() {
            [single] => {
                if let Ok(n) = single.parse::<u32>() {
                    push(n, &mut out);
                }
            }
            [lo, hi] => {
                let (Ok(lo), Ok(hi)) = (lo.parse::<u32>(), hi.parse::<u32>()) else {
                    continue;
                };
                if hi >= lo {
                    for n in (lo..=hi).take(max_range) {
                        push(n, &mut out);
                    }
                } else {
                    push(lo, &mut out);
                    push(hi, &mut out);
                }
            }
            _ => {}
        }
    }
    out
}

fn is_line_start(text: &str, start: usize) -> bool {
    let line_start = text[..start].rfind('\n').map(|i| i + 1).unwrap_or(0);
    text[line_start..start].trim().is_empty()
}

/// Superscript footnote markers (`¹²`, `<sup>3</sup>`, `^{4}`, `^5`) attached to a
/// preceding non-space character. Caret forms after a digit (`10^3`) are
/// exponents. Definition lines are not markers.
pub fn scan_superscript(text: &str, config: &ParsingConfig) -> Vec<Marker> {
    let mut markers = Vec::new();
    for caps in SUPERSCRIPT_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let caret = m.as_str().starts_with('^');
        let attached = text[..m.start()]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace() && !(caret && c.is_ascii_digit()));
        if !attached {
            continue;
        }
        let numbers = caps
            .get(1)
            .or_else(|| caps.get(2))
            .or_else(|| caps.get(3))
            .map(|g| g.as_str().to_string())
            .unwrap_or_else(|| superscript_to_ascii(m.as_str()));
        let keys = expand_number_list(&numbers, config.max_range_expansion);
        if keys.is_empty() {
            continue;
        }
        markers.push(Marker {
            start: m.start(),
            raw: m.as_str().to_string(),
            index: keys.join(","),
            keys,
            context: preceding_context(text, m.start(), config.context_chars),
            narrative: false,
        });
    }
    markers
}

/// Bracketed numeric citations `[n]`, `[n-m]`, `[n,m]`. Markdown links and
/// bracketed list numbers at line start are skipped.
pub fn scan_numeric(text: &str, config: &ParsingConfig) -> Vec<Marker> {
    let mut markers = Vec::new();
    for caps in BRACKET_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        if text[m.end()..].starts_with('(') || is_line_start(text, m.start()) {
            continue;
        }
        let keys = expand_number_list(&caps[1], config.max_range_expansion);
        if keys.is_empty() {
            continue;
        }
        markers.push(Marker {
            start: m.start(),
            raw: m.as_str().to_string(),
            index: keys.join(","),
            keys,
            context: preceding_context(text, m.start(), config.context_chars),
            narrative: false,
        });
    }
    markers
}

/// Lowercased `surname:year` key for an author phrase, if it looks like one.
pub fn author_year_key(authors: &str, year: &str) -> Option<String> {
    let first_word = authors
        .split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .unwrap_or("")
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase();
    if NON_AUTHOR_WORDS.contains(&first_word.as_str()) {
        return None;
    }
    if authors.split_whitespace().count() > 6 {
        return None;
    }
    let surname = first_author_surname(authors)?;
    Some(format!("{surname}:{year}"))
}

/// Parenthetical `(Author, 2020; Other & Name 2019)` items and narrative
/// `Author (2020)` citations, in text order.
pub fn scan_author_year(text: &str, config: &ParsingConfig) -> Vec<Marker> {
    let mut markers = Vec::new();

    for group in PAREN_GROUP_RE.captures_iter(text) {
        let (Some(whole), Some(inner)) = (group.get(0), group.get(1)) else {
            continue;
        };
        let context = preceding_context(text, whole.start(), config.context_chars);
        let mut offset = inner.start();
        for item in inner.as_str().split(';') {
            let item_start = offset;
            offset += item.len() + 1;
            let trimmed = item.trim();
            let Some(caps) = AUTHOR_YEAR_ITEM_RE.captures(trimmed) else {
                continue;
            };
            let Some(key) = author_year_key(&caps[1], &caps[2]) else {
                continue;
            };
            markers.push(Marker {
                start: item_start,
                raw: format!("({trimmed})"),
                index: key.clone(),
                keys: vec![key],
                context: context.clone(),
                narrative: false,
            });
        }
    }

    for caps in NARRATIVE_RE.captures_iter(text) {
        let Some(m) = caps.get(0) else { continue };
        let Some(key) = author_year_key(&caps[1], &caps[2]) else {
            continue;
        };
        markers.push(Marker {
            start: m.start(),
            raw: m.as_str().to_string(),
            index: key.clone(),
            keys: vec![key],
            context: preceding_context(text, m.start(), config.context_chars),
            narrative: true,
        });
    }

    markers.sort_by_key(|m| m.start);
    markers
}
