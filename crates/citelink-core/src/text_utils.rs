//! Small string helpers shared by the linker, metadata extractor and graph builder.

use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

static YEAR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(1[5-9]\d{2}|20\d{2})[a-z]?\b").unwrap());

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// `Surname, X.` at the start of an entry, after any list numbering.
static SURNAME_COMMA_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\[\d+\]\s*|\d{1,4}[.)]\s+)?([\p{Lu}][\p{L}'\-]+(?:\s+[\p{Lu}][\p{L}'\-]+)?),")
        .unwrap()
});

/// Strip diacritics via NFKD and drop anything that is not ASCII.
pub fn fold_ascii(s: &str) -> String {
    s.nfkd().filter(|c| c.is_ascii()).collect()
}

/// Lowercase ASCII letters of the last word in `name`, e.g. `"Jane A. Doe"` -> `"doe"`.
///
/// Trailing "et al." is ignored. Returns an empty string when nothing usable is left.
pub fn surname_key(name: &str) -> String {
    let folded = fold_ascii(name);
    let trimmed = folded
        .trim()
        .trim_end_matches(|c: char| !c.is_alphanumeric())
        .trim_end_matches("et al")
        .trim();
    let last = trimmed
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|w| w.chars().any(|c| c.is_ascii_alphabetic()))
        .last()
        .unwrap_or("");
    last.chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase()
}

/// Lowercase, ASCII-folded, non-alphanumerics collapsed to single `-`.
pub fn slugify(s: &str) -> String {
    let folded = fold_ascii(s).to_lowercase();
    let mut out = String::with_capacity(folded.len());
    let mut pending_dash = false;
    for c in folded.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }
    out
}

/// First plausible four-digit publication year (1500-2099) in `s`.
pub fn find_year(s: &str) -> Option<String> {
    YEAR_RE
        .captures(s)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Surname of the first author of a bibliography entry.
///
/// Handles the `Surname, Initials` form first; otherwise takes the last word of
/// the first author chunk before the year or the first comma.
pub fn first_author_surname(entry: &str) -> Option<String> {
    let entry = entry.trim();
    if let Some(caps) = SURNAME_COMMA_RE.captures(entry) {
        let key = surname_key(&caps[1]);
        if !key.is_empty() {
            return Some(key);
        }
    }
    let head = match YEAR_RE.find(entry) {
        Some(m) => &entry[..m.start()],
        None => entry,
    };
    let chunk = head
        .split([',', ';', '('])
        .next()
        .unwrap_or("")
        .split(" and ")
        .next()
        .unwrap_or("")
        .split(" & ")
        .next()
        .unwrap_or("");
    let key = surname_key(chunk);
    if key.len() >= 2 { Some(key) } else { None }
}

/// Hex SHA-256 of `s`, truncated to 16 characters.
pub fn stable_hash(s: &str) -> String {
    let digest = Sha256::digest(s.as_bytes());
    digest
        .iter()
        .take(8)
        .map(|b| format!("{:02x}", b))
        .collect()
}

/// At most `max` characters of `s`, cut on a char boundary.
pub fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// The last `max` characters of `s`.
pub fn tail_chars(s: &str, max: usize) -> String {
    let count = s.chars().count();
    s.chars().skip(count.saturating_sub(max)).collect()
}

/// Collapse runs of whitespace to one space and trim.
pub fn collapse_whitespace(s: &str) -> String {
    WHITESPACE_RE.replace_all(s.trim(), " ").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_ascii() {
        assert_eq!(fold_ascii("Müller"), "Muller");
        assert_eq!(fold_ascii("Gödel, Kurt"), "Godel, Kurt");
    }

    #[test]
    fn test_surname_key() {
        assert_eq!(surname_key("Jane A. Doe"), "doe");
        assert_eq!(surname_key("Smith et al."), "smith");
        assert_eq!(surname_key("O'Neil"), "oneil");
        assert_eq!(surname_key("  "), "");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Smith & Jones"), "smith-jones");
        assert_eq!(slugify("  Émile  Durkheim "), "emile-durkheim");
    }

    #[test]
    fn test_find_year() {
        assert_eq!(find_year("Smith, J. (2019). Norms."), Some("2019".to_string()));
        assert_eq!(find_year("Report 2013b"), Some("2013".to_string()));
        assert_eq!(find_year("page 12345"), None);
    }

    #[test]
    fn test_first_author_surname() {
        assert_eq!(
            first_author_surname("Smith, J. (2019). Attribution Norms."),
            Some("smith".to_string())
        );
        assert_eq!(
            first_author_surname("2. Smith, J. (2019). Attribution Norms."),
            Some("smith".to_string())
        );
        assert_eq!(
            first_author_surname("Jane Doe and John Roe (2020) Title"),
            Some("doe".to_string())
        );
        assert_eq!(first_author_surname(""), None);
    }

    #[test]
    fn test_stable_hash_is_stable() {
        assert_eq!(stable_hash("abc"), stable_hash("abc"));
        assert_eq!(stable_hash("abc").len(), 16);
        assert_ne!(stable_hash("abc"), stable_hash("abd"));
    }

    #[test]
    fn test_truncate_and_tail() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(tail_chars("héllo", 3), "llo");
        assert_eq!(tail_chars("ab", 5), "ab");
        assert_eq!(collapse_whitespace("  a \n\t b "), "a b");
    }
}
