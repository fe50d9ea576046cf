use citelink_core::Identifiers;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Strip trailing punctuation and unbalanced trailing parentheses, brackets,
/// and braces from a DOI.
fn clean_doi(doi: &str) -> String {
    let mut doi = doi.trim_end_matches(['.', ',', ';', ':']);

    for (open, close) in [('(', ')'), ('[', ']'), ('{', '}')] {
        while doi.ends_with(close) && doi.matches(close).count() > doi.matches(open).count() {
            doi = &doi[..doi.len() - 1];
            doi = doi.trim_end_matches(['.', ',', ';', ':']);
        }
    }

    doi.to_string()
}

/// Push `value` unless an equal value (case-insensitive) is already present.
fn push_unique(out: &mut Vec<String>, seen: &mut HashSet<String>, value: String) {
    if value.is_empty() {
        return;
    }
    if seen.insert(value.to_lowercase()) {
        out.push(value);
    }
}

/// Re-join DOIs that OCR split across lines.
fn fix_split_dois(text: &str) -> String {
    // DOI ending with period + newline + 3+ digits
    static FIX1: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(10\.\d{4,}/[^\s\]>,]+\.)\s*\n\s*(\d{3,})").unwrap());
    // DOI ending with dash + newline + continuation
    static FIX2: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(10\.\d{4,}/[^\s\]>,]+-)\s*\n\s*(\S+)").unwrap());

    let fixed = FIX1.replace_all(text, "$1$2");
    FIX2.replace_all(&fixed, "$1$2").into_owned()
}

/// All DOIs in `text`, URL forms first, deduplicated case-insensitively.
///
/// Handles `10.1234/x`, `doi:10.1234/x`, `https://doi.org/10.1234/x` and DOIs
/// containing parentheses such as `10.1016/0021-9681(87)90171-8`.
pub fn extract_dois(text: &str) -> Vec<String> {
    static URL_RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)https?://(?:dx\.)?doi\.org/(10\.\d{4,}/[^\s\]>},]+)").unwrap()
    });
    static DOI_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"10\.\d{4,}/[^\s\]>},]+").unwrap());

    let text = fix_split_dois(text);
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for caps in URL_RE.captures_iter(&text) {
        push_unique(&mut out, &mut seen, clean_doi(&caps[1]));
    }
    for m in DOI_RE.find_iter(&text) {
        push_unique(&mut out, &mut seen, clean_doi(m.as_str()));
    }
    out
}

/// ISSNs introduced by an `ISSN` / `e-ISSN` label.
pub fn extract_issns(text: &str) -> Vec<String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\b(?:e-?|p-?)?ISSN\b[^\d\n]{0,20}(\d{4}-\d{3}[\dX])\b").unwrap()
    });
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for caps in RE.captures_iter(text) {
        push_unique(&mut out, &mut seen, caps[1].to_uppercase());
    }
    out
}

/// ISBN-10/13 introduced by an `ISBN` label, kept only with a valid digit count.
pub fn extract_isbns(text: &str) -> Vec<String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)\bISBN(?:-1[03])?\b[:\s]*((?:\d[\s-]?){9}[\dX](?:[\s-]?\d){0,3})").unwrap()
    });
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for caps in RE.captures_iter(text) {
        let compact: String = caps[1]
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == 'X' || *c == 'x')
            .collect::<String>()
            .to_uppercase();
        if compact.len() == 10 || compact.len() == 13 {
            push_unique(&mut out, &mut seen, compact);
        }
    }
    out
}

/// arXiv identifiers, new (`2301.12345v2`) and old (`hep-th/9901001`) style.
pub fn extract_arxiv_ids(text: &str) -> Vec<String> {
    static NEW_FMT: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(?:arXiv[:\s]+|arxiv\.org/(?:abs|pdf)/)(\d{4}\.\d{4,5}(?:v\d+)?)").unwrap()
    });
    static OLD_FMT: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?i)(?:arXiv[:\s]+|arxiv\.org/(?:abs|pdf)/)([a-z\-]+(?:\.[A-Z]{2})?/\d{7}(?:v\d+)?)")
            .unwrap()
    });
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for re in [&*NEW_FMT, &*OLD_FMT] {
        for caps in re.captures_iter(text) {
            push_unique(&mut out, &mut seen, caps[1].to_string());
        }
    }
    out
}

pub fn extract_pmids(text: &str) -> Vec<String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bPMID\b[:\s]*(\d{5,9})\b").unwrap());
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for caps in RE.captures_iter(text) {
        push_unique(&mut out, &mut seen, caps[1].to_string());
    }
    out
}

pub fn extract_pmcids(text: &str) -> Vec<String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(PMC\d{5,9})\b").unwrap());
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for caps in RE.captures_iter(text) {
        push_unique(&mut out, &mut seen, caps[1].to_uppercase());
    }
    out
}

pub fn extract_orcids(text: &str) -> Vec<String> {
    static RE: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"\b(\d{4}-\d{4}-\d{4}-\d{3}[\dX])\b").unwrap());
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for caps in RE.captures_iter(text) {
        push_unique(&mut out, &mut seen, caps[1].to_string());
    }
    out
}

/// Email addresses, lowercased.
pub fn extract_emails(text: &str) -> Vec<String> {
    static RE: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"\b[A-Za-z0-9][A-Za-z0-9._%+\-]*@[A-Za-z0-9\-]+(?:\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}\b")
            .unwrap()
    });
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for m in RE.find_iter(text) {
        push_unique(&mut out, &mut seen, m.as_str().to_lowercase());
    }
    out
}

/// Generic `http(s)://` URLs with trailing punctuation removed.
pub fn extract_urls(text: &str) -> Vec<String> {
    static RE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"https?://[^\s<>()\[\]"'`]+"#).unwrap());
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for m in RE.find_iter(text) {
        let url = m.as_str().trim_end_matches(['.', ',', ';', ':', '*', '_']);
        push_unique(&mut out, &mut seen, url.to_string());
    }
    out
}

/// Run every identifier extractor over `text`.
pub fn extract_identifiers(text: &str) -> Identifiers {
    Identifiers {
        doi: extract_dois(text),
        issn: extract_issns(text),
        isbn: extract_isbns(text),
        arxiv: extract_arxiv_ids(text),
        pmid: extract_pmids(text),
        pmcid: extract_pmcids(text),
        urls: extract_urls(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_doi_unbalanced() {
        assert_eq!(clean_doi("10.1016/0021-9681(87)90171-8"), "10.1016/0021-9681(87)90171-8");
        assert_eq!(clean_doi("10.1234/abc)."), "10.1234/abc");
        assert_eq!(clean_doi("10.1234/abc]"), "10.1234/abc");
    }

    #[test]
    fn test_extract_dois_dedup_and_order() {
        let text = "See https://doi.org/10.1234/ABC and doi:10.1234/abc, also 10.5555/xyz.";
        assert_eq!(extract_dois(text), vec!["10.1234/ABC", "10.5555/xyz"]);
    }

    #[test]
    fn test_extract_doi_split_across_lines() {
        let text = "doi: 10.1145/3442381.\n3450048";
        assert_eq!(extract_dois(text), vec!["10.1145/3442381.3450048"]);
    }

    #[test]
    fn test_issn_isbn() {
        let text = "ISSN: 1234-567x; e-ISSN 2345-6789\nISBN 978-3-16-148410-0 and ISBN 12345";
        assert_eq!(extract_issns(text), vec!["1234-567X", "2345-6789"]);
        assert_eq!(extract_isbns(text), vec!["9783161484100"]);
    }

    #[test]
    fn test_arxiv_pmid_pmcid_orcid() {
        let text = "arXiv:2301.12345v2, arxiv.org/abs/hep-th/9901001, PMID: 12345678, PMC1234567, ORCID 0000-0002-1825-0097";
        assert_eq!(extract_arxiv_ids(text), vec!["2301.12345v2", "hep-th/9901001"]);
        assert_eq!(extract_pmids(text), vec!["12345678"]);
        assert_eq!(extract_pmcids(text), vec!["PMC1234567"]);
        assert_eq!(extract_orcids(text), vec!["0000-0002-1825-0097"]);
    }

    #[test]
    fn test_emails_and_urls() {
        let text = "Contact Jane.Doe@Example.edu or jdoe@example.edu. Visit https://example.org/paper.";
        assert_eq!(extract_emails(text), vec!["jane.doe@example.edu", "jdoe@example.edu"]);
        assert_eq!(extract_urls(text), vec!["https://example.org/paper"]);
    }

    #[test]
    fn test_extract_identifiers_empty() {
        assert!(extract_identifiers("nothing here").is_empty());
    }
}
