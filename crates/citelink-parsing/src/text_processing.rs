//! Page text cleanup and normalization into a body plus reference blocks.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;
use crate::section::find_reference_heading_with_config;

/// Vendor/download headers, most specific first: download banner followed by a
/// copyright line, download banner alone, then a "Citations:" block.
pub(crate) static DEFAULT_VENDOR_HEADER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"(?i)\A\s*(?:[*_#>]+[ \t]*)?downloaded\s+(?:from|by|on|via)\b[^\n]*\n(?:[^\n]*\n){0,8}?[^\n]*(?:copyright|©|all rights reserved)[^\n]*(?:\n|\z)",
        r"(?i)\A\s*(?:[*_#>]+[ \t]*)?downloaded\s+(?:from|by|on|via)\b[^\n]*(?:\n|\z)",
        r"(?i)\A\s*citations?:[^\n]*\n(?:[ \t]*\S[^\n]*(?:\n|\z))*",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect()
});

static IMAGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"!\[[^\]\n]*\]\([^)\n]*\)|<img\b[^>\n]*>").unwrap());

static PAGE_MARKER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?mi)^[ \t]*(?:<!--\s*page[^>\n]*-->|\[?page\s+\d{1,4}(?:\s+of\s+\d{1,4})?\]?)[ \t]*(?:\n|\z)")
        .unwrap()
});

/// Expand common typographic ligatures found in OCR output.
pub fn expand_ligatures(text: &str) -> String {
    text.replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
        .replace(['\u{FB05}', '\u{FB06}'], "st")
}

/// Remove markdown and HTML image embeds.
pub fn strip_images(text: &str) -> String {
    IMAGE_RE.replace_all(text, "").into_owned()
}

/// Remove standalone page-marker lines such as `Page 3 of 20` or `<!-- page 3 -->`.
pub fn strip_page_markers(text: &str) -> String {
    PAGE_MARKER_RE.replace_all(text, "").into_owned()
}

/// Strip a vendor/download header at the very start of `text`.
///
/// Returns the remaining text and the number of bytes removed.
pub fn strip_vendor_header(text: &str) -> (String, usize) {
    strip_vendor_header_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`strip_vendor_header`].
pub(crate) fn strip_vendor_header_with_config(
    text: &str,
    config: &ParsingConfig,
) -> (String, usize) {
    let patterns = config
        .vendor_header_patterns
        .resolve(&DEFAULT_VENDOR_HEADER_PATTERNS);
    for (priority, re) in patterns.iter().enumerate() {
        if let Some(m) = re.find(text)
            && m.start() == 0
            && !m.as_str().trim().is_empty()
        {
            let rest = text[m.end()..].trim_start();
            tracing::debug!(priority, removed = text.len() - rest.len(), "stripped vendor header");
            return (rest.to_string(), text.len() - rest.len());
        }
    }
    (text.to_string(), 0)
}

/// Turn ordered OCR page texts into `(full_text, references)`.
///
/// Blank pages are dropped; no pages left gives `("", [])`. The first reference
/// heading found after the end of the first page (anywhere, for single-page
/// input) and everything following it becomes `references[0]`. Without such a
/// heading the whole text is body and `references` is empty.
pub fn normalize<S: AsRef<str>>(pages: &[S]) -> (String, Vec<String>) {
    normalize_with_config(pages, &ParsingConfig::default())
}

/// Config-aware version of [`normalize`].
pub(crate) fn normalize_with_config<S: AsRef<str>>(
    pages: &[S],
    config: &ParsingConfig,
) -> (String, Vec<String>) {
    let cleaned: Vec<String> = pages
        .iter()
        .map(|p| p.as_ref())
        .filter(|p| !p.trim().is_empty())
        .map(|p| strip_page_markers(&strip_images(&expand_ligatures(p))))
        .filter(|p| !p.trim().is_empty())
        .collect();
    if cleaned.is_empty() {
        return (String::new(), Vec::new());
    }

    let first_page_len = cleaned[0].len();
    let joined = cleaned.join("\n\n");
    let (text, removed) = strip_vendor_header_with_config(&joined, config);

    let search_from = if cleaned.len() > 1 {
        first_page_len.saturating_sub(removed)
    } else {
        0
    };

    match find_reference_heading_with_config(&text, search_from, config) {
        Some(pos) => {
            let body = text[..pos].trim_end().to_string();
            let references = text[pos..].trim().to_string();
            tracing::debug!(
                pages = cleaned.len(),
                body_len = body.len(),
                references_len = references.len(),
                "split reference block"
            );
            (body, vec![references])
        }
        None => (text, Vec::new()),
    }
}
