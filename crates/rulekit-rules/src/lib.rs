//! # rulekit-rules
//!
//! Rule file discovery, cache, frontmatter parsing, and condition matching.
//!
//! Rules are markdown files (`.md`/`.mdc`) with optional YAML frontmatter
//! declaring match conditions (path globs, prompt keywords, capability ids).
//! The repository discovers rules from global and project-local directories,
//! caches parsed content with mtime invalidation, and formats the matching
//! subset for system prompt injection.

#![deny(unsafe_code)]

pub mod cache;
pub mod discovery;
pub mod errors;
pub mod formatter;
pub mod frontmatter;
pub mod matcher;
pub mod types;

pub use cache::{CachedRule, RuleCache};
pub use discovery::{default_rule_roots, discover_rule_files, DiscoveryReport};
pub use errors::DiscoveryError;
pub use formatter::{read_and_format_rules, RULES_HEADER, RULE_SEPARATOR};
pub use frontmatter::{parse_rule_metadata, strip_frontmatter};
pub use matcher::{capabilities_match, paths_match_globs, prompt_matches_keywords, rule_applies};
pub use types::{DiscoveredRule, MatchContext, RuleMetadata};
