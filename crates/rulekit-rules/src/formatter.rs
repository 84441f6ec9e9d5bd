//! Prompt addendum formatting.
//!
//! Combines cached rule content with condition matching to build the text
//! block injected into the system prompt: a fixed header, one section per
//! included rule titled by its relative path, bodies separated by a
//! horizontal rule.

use tracing::debug;

use crate::cache::RuleCache;
use crate::matcher::rule_applies;
use crate::types::{DiscoveredRule, MatchContext};

/// Fixed header and instruction line for the prompt addendum.
pub const RULES_HEADER: &str = "# Agent Rules\n\nPlease follow the following rules:\n\n";

/// Separator between rule bodies.
pub const RULE_SEPARATOR: &str = "\n\n---\n\n";

/// Read, filter, and format rules for system prompt injection.
///
/// Each file is served through the cache (mtime invalidation); unreadable
/// files are skipped for this cycle. Conditional rules are evaluated against
/// `ctx`; unconditional rules are always included. Returns an empty string
/// when no rule qualifies.
pub async fn read_and_format_rules(
    cache: &mut RuleCache,
    files: &[DiscoveredRule],
    ctx: &MatchContext,
) -> String {
    if files.is_empty() {
        return String::new();
    }

    let mut sections = Vec::new();

    for file in files {
        let Some(rule) = cache.get_or_refresh(&file.path).await else {
            // Read failure already logged by the cache.
            continue;
        };

        if !rule_applies(rule.metadata.as_ref(), ctx) {
            debug!(
                relative_path = %file.relative_path,
                "Skipping conditional rule: no matching paths, keywords, or capabilities"
            );
            continue;
        }

        sections.push(format!(
            "## {}\n\n{}",
            file.relative_path, rule.stripped_content
        ));
    }

    if sections.is_empty() {
        return String::new();
    }

    format!("{RULES_HEADER}{}", sections.join(RULE_SEPARATOR))
}
