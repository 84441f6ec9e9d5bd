//! Condition matching for conditional rules.
//!
//! Three independent categories, combined with OR semantics: path globs
//! against observed context paths, keywords against the latest user prompt,
//! and capability ids against the available capability set. A category the
//! rule never declared contributes `false`, not `true`.

use std::collections::HashSet;
use std::path::Path;

use globset::GlobBuilder;
use regex::Regex;
use tracing::debug;

use crate::types::{MatchContext, RuleMetadata};

/// Check whether any candidate path matches any glob pattern.
///
/// Glob semantics include `**` recursive segments. A pattern containing no
/// path separator may also match just a file's base name, so `*.rs` applies
/// to `src/main.rs`.
pub fn paths_match_globs(candidate_paths: &[String], patterns: &[String]) -> bool {
    candidate_paths
        .iter()
        .any(|path| patterns.iter().any(|pattern| glob_matches(path, pattern)))
}

fn glob_matches(path: &str, pattern: &str) -> bool {
    let glob = match GlobBuilder::new(pattern).literal_separator(true).build() {
        Ok(glob) => glob,
        Err(e) => {
            debug!(pattern = %pattern, error = %e, "Invalid glob pattern in rule metadata");
            return false;
        }
    };
    let matcher = glob.compile_matcher();

    if matcher.is_match(path) {
        return true;
    }

    // Basename fallback for bare patterns like "*.tsx".
    if !pattern.contains('/') {
        if let Some(base) = Path::new(path).file_name().and_then(|n| n.to_str()) {
            return matcher.is_match(base);
        }
    }

    false
}

/// Check whether the prompt matches any keyword.
///
/// Matching is case-insensitive. A `*` inside a keyword matches any run of
/// characters; other regex metacharacters are treated literally. A leading
/// word boundary is applied only when the keyword starts with an ASCII
/// letter, digit, or underscore (and not with `*`), so "test" matches
/// "testing" but not "contest", while CJK keywords match as substrings.
pub fn prompt_matches_keywords(prompt: &str, keywords: &[String]) -> bool {
    let lower_prompt = prompt.to_lowercase();
    keywords
        .iter()
        .any(|keyword| keyword_matches(&lower_prompt, keyword))
}

fn keyword_matches(lower_prompt: &str, keyword: &str) -> bool {
    let lower_keyword = keyword.to_lowercase();

    let mut pattern = lower_keyword
        .split('*')
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(".*");

    if !lower_keyword.starts_with('*') {
        let boundary_applies = lower_keyword
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_');
        if boundary_applies {
            pattern = format!(r"\b{pattern}");
        }
    }

    match Regex::new(&pattern) {
        Ok(regex) => regex.is_match(lower_prompt),
        Err(e) => {
            debug!(keyword = %keyword, error = %e, "Failed to compile keyword pattern");
            false
        }
    }
}

/// Check whether any required capability id is available.
///
/// Exact string membership. An empty required list yields `false` — a
/// declared-but-empty capability condition is not an automatic match.
pub fn capabilities_match(available: &HashSet<String>, required: &[String]) -> bool {
    if required.is_empty() {
        return false;
    }
    required.iter().any(|id| available.contains(id))
}

/// Decide whether a rule applies to the current context.
///
/// A rule without metadata (or with metadata declaring no categories) is
/// unconditional and always applies. Otherwise the declared categories are
/// evaluated with OR semantics; absent categories contribute `false`.
pub fn rule_applies(metadata: Option<&RuleMetadata>, ctx: &MatchContext) -> bool {
    let Some(meta) = metadata else {
        return true;
    };
    if !meta.has_conditions() {
        return true;
    }

    let globs_match = meta
        .globs
        .as_ref()
        .is_some_and(|globs| paths_match_globs(&ctx.context_paths, globs));

    let keywords_match = match (&meta.keywords, &ctx.user_prompt) {
        (Some(keywords), Some(prompt)) => prompt_matches_keywords(prompt, keywords),
        _ => false,
    };

    let capabilities_matched = meta
        .capabilities
        .as_ref()
        .is_some_and(|required| capabilities_match(&ctx.capability_ids, required));

    globs_match || keywords_match || capabilities_matched
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(ToString::to_string).collect()
    }

    // -- paths_match_globs --

    #[test]
    fn test_recursive_glob_matches_nested_file() {
        assert!(paths_match_globs(
            &strings(&["src/components/Button.tsx"]),
            &strings(&["src/components/**/*.tsx"]),
        ));
    }

    #[test]
    fn test_recursive_glob_rejects_other_tree() {
        assert!(!paths_match_globs(
            &strings(&["src/utils/helpers.ts"]),
            &strings(&["src/components/**/*.tsx"]),
        ));
    }

    #[test]
    fn test_bare_pattern_matches_basename() {
        assert!(paths_match_globs(
            &strings(&["deep/nested/main.rs"]),
            &strings(&["*.rs"]),
        ));
    }

    #[test]
    fn test_no_candidates_never_match() {
        assert!(!paths_match_globs(&[], &strings(&["**/*"])));
    }

    #[test]
    fn test_invalid_pattern_is_skipped() {
        assert!(!paths_match_globs(
            &strings(&["src/main.rs"]),
            &strings(&["src/[invalid"]),
        ));
    }

    // -- prompt_matches_keywords --

    #[test]
    fn test_keyword_matches_word_prefix() {
        assert!(prompt_matches_keywords(
            "I am testing this",
            &strings(&["test"]),
        ));
    }

    #[test]
    fn test_keyword_respects_leading_boundary() {
        assert!(!prompt_matches_keywords(
            "I entered a contest",
            &strings(&["test"]),
        ));
    }

    #[test]
    fn test_keyword_is_case_insensitive() {
        assert!(prompt_matches_keywords(
            "we are testing now",
            &strings(&["Testing"]),
        ));
    }

    #[test]
    fn test_keyword_wildcard_spans_text() {
        assert!(prompt_matches_keywords(
            "开发一个技能吧",
            &strings(&["开发*技能"]),
        ));
    }

    #[test]
    fn test_cjk_keyword_matches_substring() {
        assert!(prompt_matches_keywords("帮我部署服务", &strings(&["部署"])));
    }

    #[test]
    fn test_leading_wildcard_disables_boundary() {
        assert!(prompt_matches_keywords(
            "I entered a contest",
            &strings(&["*test"]),
        ));
    }

    #[test]
    fn test_phrase_keyword_requires_contiguous_text() {
        assert!(prompt_matches_keywords(
            "please code review this",
            &strings(&["code review"]),
        ));
        assert!(!prompt_matches_keywords(
            "code needs a review",
            &strings(&["code review"]),
        ));
    }

    #[test]
    fn test_regex_metacharacters_are_literal() {
        assert!(prompt_matches_keywords(
            "run foo.bar now",
            &strings(&["foo.bar"]),
        ));
        assert!(!prompt_matches_keywords(
            "run fooxbar now",
            &strings(&["foo.bar"]),
        ));
    }

    // -- capabilities_match --

    #[test]
    fn test_capability_match_is_exact() {
        let available: HashSet<String> = strings(&["mcp_websearch_v2"]).into_iter().collect();
        assert!(!capabilities_match(&available, &strings(&["mcp_websearch"])));
        assert!(capabilities_match(
            &available,
            &strings(&["mcp_websearch_v2"]),
        ));
    }

    #[test]
    fn test_empty_required_list_never_matches() {
        let available: HashSet<String> = strings(&["read", "edit"]).into_iter().collect();
        assert!(!capabilities_match(&available, &[]));
    }

    // -- rule_applies --

    fn ctx_with_paths(paths: &[&str]) -> MatchContext {
        MatchContext {
            context_paths: strings(paths),
            ..Default::default()
        }
    }

    #[test]
    fn test_no_metadata_always_applies() {
        assert!(rule_applies(None, &MatchContext::default()));
    }

    #[test]
    fn test_empty_metadata_always_applies() {
        let meta = RuleMetadata::default();
        assert!(rule_applies(Some(&meta), &MatchContext::default()));
    }

    #[test]
    fn test_or_across_categories() {
        let meta = RuleMetadata {
            globs: Some(strings(&["nomatch/**"])),
            keywords: Some(strings(&["deploy"])),
            capabilities: None,
        };
        let ctx = MatchContext {
            context_paths: strings(&["src/main.rs"]),
            user_prompt: Some("deploy the service".to_string()),
            capability_ids: HashSet::new(),
        };
        assert!(rule_applies(Some(&meta), &ctx));
    }

    #[test]
    fn test_declared_categories_all_miss() {
        let meta = RuleMetadata {
            globs: Some(strings(&["docs/**"])),
            keywords: Some(strings(&["deploy"])),
            capabilities: Some(strings(&["mcp_websearch"])),
        };
        let ctx = MatchContext {
            context_paths: strings(&["src/main.rs"]),
            user_prompt: Some("fix the parser".to_string()),
            capability_ids: strings(&["read"]).into_iter().collect(),
        };
        assert!(!rule_applies(Some(&meta), &ctx));
    }

    #[test]
    fn test_absent_category_contributes_false() {
        let meta = RuleMetadata {
            globs: Some(strings(&["docs/**"])),
            keywords: None,
            capabilities: None,
        };
        // Prompt would match almost anything, but keywords are not declared.
        let ctx = MatchContext {
            context_paths: strings(&["src/main.rs"]),
            user_prompt: Some("docs".to_string()),
            capability_ids: HashSet::new(),
        };
        assert!(!rule_applies(Some(&meta), &ctx));
    }

    #[test]
    fn test_glob_category_alone_matches() {
        let meta = RuleMetadata {
            globs: Some(strings(&["src/**/*.rs"])),
            keywords: None,
            capabilities: None,
        };
        assert!(rule_applies(Some(&meta), &ctx_with_paths(&["src/lib.rs"])));
    }
}
