//! Rule frontmatter parser.
//!
//! Rule files may start with a `---` delimited YAML block declaring match
//! conditions. Parsing is deliberately forgiving: a missing, empty, or
//! malformed block yields "no metadata", which callers treat as an
//! unconditional rule. A YAML decode failure is logged as a warning and is
//! never fatal.

use serde_yaml::Value;
use tracing::warn;

use crate::types::RuleMetadata;

/// Frontmatter delimiter.
const FENCE: &str = "---";

/// Locate the frontmatter block, returning `(block_start, fence_end)` byte
/// offsets into `content`. The block spans `content[block_start..fence_end]`
/// and the closing fence ends at `fence_end + FENCE.len()`.
fn frontmatter_span(content: &str) -> Option<(usize, usize)> {
    if !content.starts_with(FENCE) {
        return None;
    }
    let close = content[FENCE.len()..].find(FENCE)? + FENCE.len();
    Some((FENCE.len(), close))
}

/// Parse match conditions from a rule file's frontmatter.
///
/// Returns `None` when the content has no leading fenced block, the block is
/// empty or whitespace-only, YAML decoding fails, the decoded value is not a
/// mapping, or every extracted list ends up empty. Only string list entries
/// are retained; they are trimmed and empties dropped.
pub fn parse_rule_metadata(content: &str) -> Option<RuleMetadata> {
    let (start, end) = frontmatter_span(content)?;
    let block = content[start..end].trim();
    if block.is_empty() {
        return None;
    }

    let parsed: Value = match serde_yaml::from_str(block) {
        Ok(value) => value,
        Err(e) => {
            warn!(error = %e, "Failed to parse rule frontmatter");
            return None;
        }
    };
    let Value::Mapping(mapping) = parsed else {
        return None;
    };

    let metadata = RuleMetadata {
        globs: extract_string_list(&mapping, "globs"),
        keywords: extract_string_list(&mapping, "keywords"),
        capabilities: extract_string_list(&mapping, "capabilities"),
    };

    metadata.has_conditions().then_some(metadata)
}

/// Extract a list-valued field, keeping only non-empty trimmed strings.
///
/// Non-string entries are silently dropped. Returns `None` when the key is
/// absent, not a sequence, or nothing survives filtering.
fn extract_string_list(mapping: &serde_yaml::Mapping, key: &str) -> Option<Vec<String>> {
    let Value::Sequence(items) = mapping.get(key)? else {
        return None;
    };

    let strings: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect();

    (!strings.is_empty()).then_some(strings)
}

/// Strip the frontmatter block from rule content.
///
/// Returns the content unchanged when no fenced block is found; otherwise
/// everything after the closing delimiter, with leading whitespace trimmed.
pub fn strip_frontmatter(content: &str) -> &str {
    match frontmatter_span(content) {
        Some((_, end)) => content[end + FENCE.len()..].trim_start(),
        None => content,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_frontmatter_returns_none() {
        assert!(parse_rule_metadata("# Just a rule\n\nBody text.").is_none());
    }

    #[test]
    fn test_unclosed_frontmatter_returns_none() {
        assert!(parse_rule_metadata("---\nglobs:\n  - src/**\n").is_none());
    }

    #[test]
    fn test_empty_frontmatter_returns_none() {
        assert!(parse_rule_metadata("---\n\n---\nBody").is_none());
        assert!(parse_rule_metadata("---\n   \n---\nBody").is_none());
    }

    #[test]
    fn test_parses_all_three_categories() {
        let content = "---\nglobs:\n  - \"src/**/*.rs\"\nkeywords:\n  - testing\ncapabilities:\n  - mcp_websearch\n---\nBody";
        let meta = parse_rule_metadata(content).unwrap();
        assert_eq!(meta.globs, Some(vec!["src/**/*.rs".to_string()]));
        assert_eq!(meta.keywords, Some(vec!["testing".to_string()]));
        assert_eq!(meta.capabilities, Some(vec!["mcp_websearch".to_string()]));
    }

    #[test]
    fn test_non_string_entries_are_dropped() {
        let content = "---\nglobs:\n  - \"src/**\"\n  - 42\n  - true\n---\nBody";
        let meta = parse_rule_metadata(content).unwrap();
        assert_eq!(meta.globs, Some(vec!["src/**".to_string()]));
    }

    #[test]
    fn test_entries_trimmed_and_empties_dropped() {
        let content = "---\nkeywords:\n  - \"  deploy  \"\n  - \"   \"\n---\nBody";
        let meta = parse_rule_metadata(content).unwrap();
        assert_eq!(meta.keywords, Some(vec!["deploy".to_string()]));
    }

    #[test]
    fn test_all_empty_lists_collapse_to_none() {
        let content = "---\nglobs: []\nkeywords: []\n---\nBody";
        assert!(parse_rule_metadata(content).is_none());
    }

    #[test]
    fn test_unrelated_keys_only_returns_none() {
        let content = "---\ntitle: My rule\nauthor: someone\n---\nBody";
        assert!(parse_rule_metadata(content).is_none());
    }

    #[test]
    fn test_malformed_yaml_returns_none() {
        // Malformed frontmatter collapses to "no metadata", which makes the
        // rule unconditional downstream. Documented behavior, kept explicit.
        let content = "---\nglobs: [unclosed\n---\nBody";
        assert!(parse_rule_metadata(content).is_none());
    }

    #[test]
    fn test_scalar_yaml_returns_none() {
        assert!(parse_rule_metadata("---\njust a string\n---\nBody").is_none());
    }

    #[test]
    fn test_strip_without_frontmatter_is_identity() {
        let content = "# Rule\n\nBody text.";
        assert_eq!(strip_frontmatter(content), content);
    }

    #[test]
    fn test_strip_removes_block_and_leading_whitespace() {
        let content = "---\nglobs:\n  - src/**\n---\n\n# Rule\n\nBody";
        assert_eq!(strip_frontmatter(content), "# Rule\n\nBody");
    }

    #[test]
    fn test_strip_unclosed_block_is_identity() {
        let content = "---\nglobs:\n  - src/**\n";
        assert_eq!(strip_frontmatter(content), content);
    }
}
