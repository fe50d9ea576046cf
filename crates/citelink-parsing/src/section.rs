//! Markdown headings, reference-section detection and entry segmentation.

use citelink_core::Heading;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::ParsingConfig;

/// A reference/bibliography/endnotes heading: markdown `#`, bold, or a bare line,
/// with optional section numbering and a trailing colon.
static REFERENCE_HEADING_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?mi)^[ \t]*(?:#{1,6}[ \t]*)?(?:\*\*|__)?[ \t]*(?:(?:\d{1,2}|[IVXL]{1,5})\.?[ \t]+)?(?:references|bibliography|works[ \t]+cited|sources|notes|selected[ \t]+bibliography|endnotes)[ \t]*:?[ \t]*(?:\*\*|__)?[ \t]*$",
    )
    .unwrap()
});

static ATX_HEADING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[ \t]{0,3}(#{1,6})[ \t]+(.+?)[ \t#]*$").unwrap());

static NUMBERING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{1,3}(?:\.\d{1,3})*)\.?(?:[ \t]+|$)").unwrap());

/// Entry starts in a reference block: `[12]`, `12.`, `12)` or superscript digits.
static ENTRY_START_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[ \t]*(?:\[\d{1,4}\]|\d{1,4}[.)]|[⁰¹²³⁴⁵⁶⁷⁸⁹]+)[ \t]+\S").unwrap()
});

static FRONT_MATTER_END_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^#{1,6}[ \t]*(?:(?:\d{1,2}|[IVX]{1,4})\.?[ \t]*)?(?:introduction|background)\b")
        .unwrap()
});

/// Parse markdown ATX headings (`#` .. `######`) with their 0-based line numbers.
pub fn parse_headings(text: &str) -> Vec<Heading> {
    let mut headings = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        let Some(caps) = ATX_HEADING_RE.captures(line) else {
            continue;
        };
        let raw = caps[2].trim().trim_matches(['*', '_']).trim();
        if raw.is_empty() {
            continue;
        }
        let numbering = NUMBERING_RE
            .captures(raw)
            .map(|c| c[1].to_string());
        headings.push(Heading {
            level: caps[1].len(),
            text: raw.to_string(),
            line: line_no,
            numbering,
        });
    }
    headings
}

/// Byte offset of the first reference heading that starts at or after `from`.
pub fn find_reference_heading(text: &str, from: usize) -> Option<usize> {
    find_reference_heading_with_config(text, from, &ParsingConfig::default())
}

/// Config-aware version of [`find_reference_heading`].
pub(crate) fn find_reference_heading_with_config(
    text: &str,
    from: usize,
    config: &ParsingConfig,
) -> Option<usize> {
    let re = config
        .reference_heading_re
        .as_ref()
        .unwrap_or(&REFERENCE_HEADING_RE);
    let from = ceil_char_boundary(text, from);
    if from >= text.len() {
        return None;
    }
    re.find_at(text, from).map(|m| {
        // Leading indentation is not part of the heading.
        let skipped = m.as_str().len() - m.as_str().trim_start().len();
        m.start() + skipped
    })
}

/// True when `line` on its own is a reference heading.
pub fn is_reference_heading(line: &str) -> bool {
    REFERENCE_HEADING_RE.is_match(line)
}

fn ceil_char_boundary(text: &str, mut idx: usize) -> usize {
    while idx < text.len() && !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Split a reference block into individual entries.
///
/// Tries, in order: bracketed / numbered / superscript entry starts (at least
/// two), blank-line separated paragraphs (at least two), then single lines.
/// Headings are never part of an entry.
pub fn segment_entries(block: &str) -> Vec<String> {
    let lines: Vec<&str> = block
        .lines()
        .filter(|l| !ATX_HEADING_RE.is_match(l) && !is_reference_heading(l))
        .collect();

    let starts = lines.iter().filter(|l| ENTRY_START_RE.is_match(l)).count();
    if starts >= 2 {
        let mut entries: Vec<String> = Vec::new();
        let mut current: Option<String> = None;
        for line in &lines {
            if ENTRY_START_RE.is_match(line) {
                if let Some(done) = current.take() {
                    entries.push(done);
                }
                current = Some(line.trim().to_string());
            } else if line.trim().is_empty() {
                if let Some(done) = current.take() {
                    entries.push(done);
                }
            } else if let Some(cur) = current.as_mut() {
                cur.push(' ');
                cur.push_str(line.trim());
            }
        }
        if let Some(done) = current {
            entries.push(done);
        }
        return entries;
    }

    let joined = lines.join("\n");
    let paragraphs: Vec<String> = joined
        .split("\n\n")
        .map(|p| {
            p.lines()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.len() >= 2 {
        return paragraphs;
    }

    lines
        .iter()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

/// Leading region of the document used for metadata extraction: everything up
/// to the first Introduction/Background heading, bounded at 80 lines.
pub fn front_matter(text: &str) -> String {
    front_matter_with_config(text, &ParsingConfig::default())
}

/// Config-aware version of [`front_matter`].
pub(crate) fn front_matter_with_config(text: &str, config: &ParsingConfig) -> String {
    text.lines()
        .take(config.front_matter_lines)
        .take_while(|l| !FRONT_MATTER_END_RE.is_match(l.trim()))
        .collect::<Vec<_>>()
        .join("\n")
}
