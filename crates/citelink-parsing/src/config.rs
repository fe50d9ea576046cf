use citelink_core::Thresholds;
use regex::Regex;

/// Controls how a list of patterns/values is overridden from its defaults.
#[derive(Debug, Clone, Default)]
pub enum ListOverride<T> {
    /// Use the built-in defaults.
    #[default]
    Default,
    /// Completely replace the defaults with these values.
    Replace(Vec<T>),
    /// Append these values to the defaults.
    Extend(Vec<T>),
}

impl<T: Clone> ListOverride<T> {
    /// Resolve this override against the given defaults.
    pub fn resolve(&self, defaults: &[T]) -> Vec<T> {
        match self {
            ListOverride::Default => defaults.to_vec(),
            ListOverride::Replace(v) => v.clone(),
            ListOverride::Extend(v) => {
                let mut result = defaults.to_vec();
                result.extend(v.iter().cloned());
                result
            }
        }
    }
}

impl ListOverride<String> {
    /// Resolve against a static word list, lowercasing everything.
    pub(crate) fn resolve_words(&self, defaults: &[&str]) -> Vec<String> {
        let owned: Vec<String> = defaults.iter().map(|s| s.to_string()).collect();
        self.resolve(&owned)
            .into_iter()
            .map(|s| s.to_lowercase())
            .collect()
    }
}

/// Configuration for normalisation, linking and metadata extraction.
///
/// Regex fields set to `None` (or lists left at [`ListOverride::Default`]) use
/// the built-in tables. Use [`ParsingConfigBuilder`] to construct with string
/// patterns.
#[derive(Debug, Clone)]
pub struct ParsingConfig {
    // ── text_processing.rs ──
    /// Vendor/download header patterns, tried in order at document start.
    pub(crate) vendor_header_patterns: ListOverride<Regex>,

    // ── section.rs ──
    /// Regex matching a reference/bibliography/endnotes heading line.
    pub(crate) reference_heading_re: Option<Regex>,
    /// Upper bound on the front-matter region, in lines.
    pub(crate) front_matter_lines: usize,

    // ── style.rs / linker.rs ──
    pub(crate) thresholds: Thresholds,
    /// Characters of preceding context kept per citation occurrence.
    pub(crate) context_chars: usize,
    /// Maximum numbers produced by expanding one `[n-m]` range.
    pub(crate) max_range_expansion: usize,

    // ── title.rs / metadata.rs ──
    pub(crate) title_scan_lines: usize,
    pub(crate) title_fallback_lines: usize,
    pub(crate) abstract_max_chars: usize,
    pub(crate) blocked_name_tokens: ListOverride<String>,
    pub(crate) affiliation_keywords: ListOverride<String>,
    pub(crate) venue_keywords: ListOverride<String>,
}

impl Default for ParsingConfig {
    fn default() -> Self {
        Self {
            vendor_header_patterns: ListOverride::Default,
            reference_heading_re: None,
            front_matter_lines: 80,
            thresholds: Thresholds::default(),
            context_chars: 80,
            max_range_expansion: 50,
            title_scan_lines: 160,
            title_fallback_lines: 40,
            abstract_max_chars: 1600,
            blocked_name_tokens: ListOverride::Default,
            affiliation_keywords: ListOverride::Default,
            venue_keywords: ListOverride::Default,
        }
    }
}

impl ParsingConfig {
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    pub fn context_chars(&self) -> usize {
        self.context_chars
    }
}

/// Builder for [`ParsingConfig`].
///
/// Accepts string patterns that are compiled to `Regex` in [`build()`](Self::build).
/// Fails fast with `regex::Error` if any pattern is invalid.
#[derive(Debug, Clone, Default)]
pub struct ParsingConfigBuilder {
    vendor_header_patterns: ListOverride<String>,
    reference_heading_re: Option<String>,
    front_matter_lines: Option<usize>,
    thresholds: Option<Thresholds>,
    context_chars: Option<usize>,
    max_range_expansion: Option<usize>,
    title_scan_lines: Option<usize>,
    title_fallback_lines: Option<usize>,
    abstract_max_chars: Option<usize>,
    blocked_name_tokens: ListOverride<String>,
    affiliation_keywords: ListOverride<String>,
    venue_keywords: ListOverride<String>,
}

fn push_extend(list: &mut ListOverride<String>, value: String) {
    match list {
        ListOverride::Extend(v) => v.push(value),
        _ => *list = ListOverride::Extend(vec![value]),
    }
}

impl ParsingConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Normalisation ──

    pub fn set_vendor_header_patterns(mut self, patterns: Vec<String>) -> Self {
        self.vendor_header_patterns = ListOverride::Replace(patterns);
        self
    }

    pub fn add_vendor_header_pattern(mut self, pattern: String) -> Self {
        push_extend(&mut self.vendor_header_patterns, pattern);
        self
    }

    pub fn reference_heading_regex(mut self, pattern: &str) -> Self {
        self.reference_heading_re = Some(pattern.to_string());
        self
    }

    pub fn front_matter_lines(mut self, n: usize) -> Self {
        self.front_matter_lines = Some(n);
        self
    }

    // ── Linking ──

    pub fn thresholds(mut self, thresholds: Thresholds) -> Self {
        self.thresholds = Some(thresholds);
        self
    }

    pub fn context_chars(mut self, n: usize) -> Self {
        self.context_chars = Some(n);
        self
    }

    pub fn max_range_expansion(mut self, n: usize) -> Self {
        self.max_range_expansion = Some(n);
        self
    }

    // ── Metadata ──

    pub fn title_scan_lines(mut self, n: usize) -> Self {
        self.title_scan_lines = Some(n);
        self
    }

    pub fn title_fallback_lines(mut self, n: usize) -> Self {
        self.title_fallback_lines = Some(n);
        self
    }

    pub fn abstract_max_chars(mut self, n: usize) -> Self {
        self.abstract_max_chars = Some(n);
        self
    }

    pub fn set_blocked_name_tokens(mut self, tokens: Vec<String>) -> Self {
        self.blocked_name_tokens = ListOverride::Replace(tokens);
        self
    }

    pub fn add_blocked_name_token(mut self, token: String) -> Self {
        push_extend(&mut self.blocked_name_tokens, token);
        self
    }

    pub fn set_affiliation_keywords(mut self, keywords: Vec<String>) -> Self {
        self.affiliation_keywords = ListOverride::Replace(keywords);
        self
    }

    pub fn add_affiliation_keyword(mut self, keyword: String) -> Self {
        push_extend(&mut self.affiliation_keywords, keyword);
        self
    }

    pub fn set_venue_keywords(mut self, keywords: Vec<String>) -> Self {
        self.venue_keywords = ListOverride::Replace(keywords);
        self
    }

    pub fn add_venue_keyword(mut self, keyword: String) -> Self {
        push_extend(&mut self.venue_keywords, keyword);
        self
    }

    /// Compile all string patterns into regexes and produce a [`ParsingConfig`].
    pub fn build(self) -> Result<ParsingConfig, regex::Error> {
        let compile = |opt: Option<String>| -> Result<Option<Regex>, regex::Error> {
            opt.map(|p| Regex::new(&p)).transpose()
        };

        let compile_list = |list: ListOverride<String>| -> Result<ListOverride<Regex>, regex::Error> {
            match list {
                ListOverride::Default => Ok(ListOverride::Default),
                ListOverride::Replace(patterns) => {
                    let regexes: Result<Vec<_>, _> = patterns.iter().map(|p| Regex::new(p)).collect();
                    Ok(ListOverride::Replace(regexes?))
                }
                ListOverride::Extend(patterns) => {
                    let regexes: Result<Vec<_>, _> = patterns.iter().map(|p| Regex::new(p)).collect();
                    Ok(ListOverride::Extend(regexes?))
                }
            }
        };

        let defaults = ParsingConfig::default();
        Ok(ParsingConfig {
            vendor_header_patterns: compile_list(self.vendor_header_patterns)?,
            reference_heading_re: compile(self.reference_heading_re)?,
            front_matter_lines: self.front_matter_lines.unwrap_or(defaults.front_matter_lines),
            thresholds: self.thresholds.unwrap_or(defaults.thresholds),
            context_chars: self.context_chars.unwrap_or(defaults.context_chars),
            max_range_expansion: self
                .max_range_expansion
                .unwrap_or(defaults.max_range_expansion),
            title_scan_lines: self.title_scan_lines.unwrap_or(defaults.title_scan_lines),
            title_fallback_lines: self
                .title_fallback_lines
                .unwrap_or(defaults.title_fallback_lines),
            abstract_max_chars: self.abstract_max_chars.unwrap_or(defaults.abstract_max_chars),
            blocked_name_tokens: self.blocked_name_tokens,
            affiliation_keywords: self.affiliation_keywords,
            venue_keywords: self.venue_keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ParsingConfig::default();
        assert_eq!(config.context_chars, 80);
        assert_eq!(config.title_scan_lines, 160);
        assert_eq!(config.title_fallback_lines, 40);
        assert_eq!(config.abstract_max_chars, 1600);
        assert_eq!(config.max_range_expansion, 50);
    }

    #[test]
    fn test_builder_basic() {
        let mut thresholds = Thresholds::default();
        thresholds.numeric_min_brackets = 2;
        let config = ParsingConfigBuilder::new()
            .context_chars(40)
            .thresholds(thresholds)
            .build()
            .unwrap();
        assert_eq!(config.context_chars(), 40);
        assert_eq!(config.thresholds().numeric_min_brackets, 2);
        assert_eq!(config.front_matter_lines, 80);
    }

    #[test]
    fn test_builder_custom_heading_regex() {
        let config = ParsingConfigBuilder::new()
            .reference_heading_regex(r"(?mi)^#*\s*Literaturverzeichnis\s*$")
            .build()
            .unwrap();
        assert!(config.reference_heading_re.is_some());
    }

    #[test]
    fn test_builder_invalid_regex() {
        let result = ParsingConfigBuilder::new()
            .add_vendor_header_pattern(r"[invalid".to_string())
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_list_override_resolve() {
        let defaults = vec!["a".to_string(), "b".to_string()];

        let d: ListOverride<String> = ListOverride::Default;
        assert_eq!(d.resolve(&defaults), defaults);

        let r: ListOverride<String> = ListOverride::Replace(vec!["x".to_string()]);
        assert_eq!(r.resolve(&defaults), vec!["x".to_string()]);

        let e: ListOverride<String> = ListOverride::Extend(vec!["C".to_string()]);
        assert_eq!(e.resolve_words(&["A", "b"]), vec!["a", "b", "c"]);
    }
}
