//! Author-name cleanup and plausibility checks for front-matter lines.

use citelink_core::text_utils::surname_key;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Tokens that never occur in a personal name. Matching is case-insensitive on
/// whole tokens.
pub(crate) const DEFAULT_BLOCKED_NAME_TOKENS: &[&str] = &[
    "university",
    "institute",
    "department",
    "faculty",
    "school",
    "college",
    "center",
    "centre",
    "laboratory",
    "lab",
    "abstract",
    "introduction",
    "journal",
    "volume",
    "vol",
    "issue",
    "press",
    "review",
    "law",
    "table",
    "contents",
    "chapter",
    "section",
    "part",
    "article",
    "references",
    "bibliography",
    "keywords",
    "copyright",
    "downloaded",
    "http",
    "https",
    "www",
    "edition",
    "proceedings",
    "conference",
    "report",
    "summary",
    "notes",
    "appendix",
    "figure",
    "index",
];

const HONORIFICS: &[&str] = &["dr", "prof", "professor", "mr", "mrs", "ms", "sir", "dame", "hon"];

const DEGREES: &[&str] = &[
    "phd", "md", "jd", "llm", "llb", "msc", "bsc", "mba", "esq", "dphil", "frs",
];

const PARTICLES: &[&str] = &[
    "van", "von", "der", "den", "de", "da", "di", "del", "della", "du", "dos", "la", "le", "bin",
    "al", "y",
];

/// Footnote and affiliation markers attached to names: superscripts, `<sup>`
/// tags, `^{..}`, daggers and bare digits.
static NAME_MARK_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"<sup>[^<]*</sup>|\^\{[^}]*\}|\^[\w,]+|[⁰¹²³⁴⁵⁶⁷⁸⁹*†‡§¶]+|\d+").unwrap()
});

static INITIAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\p{Lu}\.(?:-?\p{Lu}\.)*$").unwrap());

static AUTHOR_SPLIT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s*(?:,|;|\band\b|&)\s*").unwrap());

/// Clean a raw author string: drop footnote marks, honorifics, degrees and a
/// leading all-caps initials block (`JAD Jane A. Doe`).
pub fn normalize_name(raw: &str) -> String {
    let stripped = NAME_MARK_RE.replace_all(raw, " ");
    let stripped = stripped.replace(['*', '_', '#'], " ");

    let mut tokens: Vec<&str> = stripped
        .split_whitespace()
        .filter(|t| {
            let bare = t.trim_matches(|c: char| c == '.' || c == ',').to_lowercase();
            !HONORIFICS.contains(&bare.as_str()) && !DEGREES.contains(&bare.replace('.', "").as_str())
        })
        .collect();

    if tokens.len() >= 3 {
        let first = tokens[0];
        if (2..=4).contains(&first.len()) && first.chars().all(|c| c.is_ascii_uppercase()) {
            tokens.remove(0);
        }
    }

    tokens
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == ';' || c.is_whitespace())
        .to_string()
}

fn is_particle(token: &str) -> bool {
    PARTICLES.contains(&token.to_lowercase().as_str())
}

/// Whether `name` looks like a personal name: 2 to 5 tokens, each capitalised,
/// an initial, or a surname particle, with no digits and no blocked token.
pub fn is_name_shaped(name: &str, blocked: &[String]) -> bool {
    if name.is_empty() || name.chars().count() > 60 {
        return false;
    }
    if name.chars().any(|c| c.is_ascii_digit() || c == '@' || c == '/' || c == ':') {
        return false;
    }
    let tokens: Vec<&str> = name.split_whitespace().collect();
    if !(2..=5).contains(&tokens.len()) {
        return false;
    }
    let Some(last) = tokens.last() else {
        return false;
    };
    if is_particle(last) || INITIAL_RE.is_match(last) {
        return false;
    }

    tokens.iter().all(|token| {
        let bare = token
            .trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase();
        if blocked.contains(&bare) {
            return false;
        }
        INITIAL_RE.is_match(token)
            || is_particle(token)
            || token.chars().next().is_some_and(|c| c.is_uppercase())
    })
}

/// Split one author line on commas, semicolons, `and` and `&`.
pub fn split_author_line(line: &str) -> Vec<String> {
    AUTHOR_SPLIT_RE
        .split(line)
        .map(normalize_name)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Drop later names whose surname key repeats an earlier one.
pub fn dedup_by_surname(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .filter(|n| seen.insert(surname_key(n)))
        .collect()
}
