use std::collections::HashSet;

use citelink_core::Heading;
use serde::{Deserialize, Serialize};

use crate::flags;

/// A heading that is more than one level deeper than the heading before it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelJump {
    pub line: usize,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeadingValidation {
    pub count: usize,
    pub max_depth: usize,
    pub level_jumps: Vec<LevelJump>,
    /// Numbering prefixes (`2` for `2.3`) that never appear as their own heading.
    pub missing_parents: Vec<String>,
}

impl HeadingValidation {
    pub fn flags(&self) -> Vec<&'static str> {
        let mut out = Vec::new();
        if !self.level_jumps.is_empty() {
            out.push(flags::HEADING_LEVEL_JUMP);
        }
        if !self.missing_parents.is_empty() {
            out.push(flags::HEADING_MISSING_PARENT);
        }
        out
    }
}

/// Check level jumps and numbering parents over parsed headings.
pub fn validate_headings(headings: &[Heading]) -> HeadingValidation {
    let level_jumps = headings
        .windows(2)
        .filter(|pair| pair[1].level > pair[0].level + 1)
        .map(|pair| LevelJump {
            line: pair[1].line,
            from: pair[0].level,
            to: pair[1].level,
        })
        .collect();

    let numbered: HashSet<&str> = headings
        .iter()
        .filter_map(|h| h.numbering.as_deref())
        .collect();
    let mut missing_parents: Vec<String> = Vec::new();
    for numbering in headings.iter().filter_map(|h| h.numbering.as_deref()) {
        let Some((parent, _)) = numbering.rsplit_once('.') else {
            continue;
        };
        if !numbered.contains(parent) && !missing_parents.iter().any(|p| p == parent) {
            missing_parents.push(parent.to_string());
        }
    }

    HeadingValidation {
        count: headings.len(),
        max_depth: headings.iter().map(|h| h.level).max().unwrap_or(0),
        level_jumps,
        missing_parents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use citelink_parsing::parse_headings;

    #[test]
    fn test_level_jump() {
        let v = validate_headings(&parse_headings("# A\n### B\n## C\n### D"));
        assert_eq!(v.count, 4);
        assert_eq!(v.max_depth, 3);
        assert_eq!(v.level_jumps, vec![LevelJump { line: 1, from: 1, to: 3 }]);
        assert_eq!(v.flags(), vec![flags::HEADING_LEVEL_JUMP]);
    }

    #[test]
    fn test_missing_parent() {
        let v = validate_headings(&parse_headings("## 1 Intro\n## 2.3 Methods\n## 2.4 Data\n## 3.1 Results\n## 3 Later"));
        assert_eq!(v.missing_parents, vec!["2"]);
        assert_eq!(v.flags(), vec![flags::HEADING_MISSING_PARENT]);
    }

    #[test]
    fn test_clean_outline() {
        let v = validate_headings(&parse_headings("# T\n## 1 A\n### 1.1 B\n## 2 C"));
        assert!(v.flags().is_empty());
        assert_eq!(validate_headings(&[]), HeadingValidation::default());
    }
}
