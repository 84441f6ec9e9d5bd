//! Core types for rule discovery and matching.

use std::collections::HashSet;
use std::path::PathBuf;

/// A discovered rule file with absolute and root-relative paths.
///
/// The relative path is unique within its root and is used as the rule's
/// display heading in the formatted output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiscoveredRule {
    /// Absolute path to the rule file.
    pub path: PathBuf,
    /// Path relative to the rules directory root (forward-slash separated).
    pub relative_path: String,
}

/// Match conditions extracted from a rule's YAML frontmatter.
///
/// Each list is present only when the frontmatter declared it with at least
/// one non-empty string entry. A rule with no metadata at all is
/// unconditional and always included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RuleMetadata {
    /// Path glob patterns matched against context file paths.
    pub globs: Option<Vec<String>>,
    /// Keywords matched against the latest user prompt.
    pub keywords: Option<Vec<String>>,
    /// Capability ids matched against available tool/service ids.
    pub capabilities: Option<Vec<String>>,
}

impl RuleMetadata {
    /// Returns `true` if at least one condition category is declared.
    #[must_use]
    pub fn has_conditions(&self) -> bool {
        self.globs.is_some() || self.keywords.is_some() || self.capabilities.is_some()
    }
}

/// Current-turn context that conditional rules are evaluated against.
#[derive(Clone, Debug, Default)]
pub struct MatchContext {
    /// File paths observed during the conversation (project-relative).
    pub context_paths: Vec<String>,
    /// Latest user prompt text, if any was captured.
    pub user_prompt: Option<String>,
    /// Available capability ids (built-in tools + connected services).
    pub capability_ids: HashSet<String>,
}
