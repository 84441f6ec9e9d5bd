//! Rule content cache with mtime invalidation.
//!
//! [`RuleCache`] stores parsed rule records keyed by absolute path. An entry
//! is valid while the file's modification time is unchanged; on change the
//! file is re-read and re-parsed. A read failure purges any stale entry and
//! yields `None` — callers skip the rule for the current cycle.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tracing::{debug, warn};

use crate::frontmatter::{parse_rule_metadata, strip_frontmatter};
use crate::types::RuleMetadata;

/// Cached data for a single rule file.
#[derive(Clone, Debug)]
pub struct CachedRule {
    /// Raw file content.
    pub content: String,
    /// Parsed frontmatter conditions, if any.
    pub metadata: Option<RuleMetadata>,
    /// Content with the frontmatter block stripped.
    pub stripped_content: String,
    /// Modification time used for cache invalidation.
    mtime: SystemTime,
}

/// Rule cache keyed by absolute file path.
#[derive(Debug, Default)]
pub struct RuleCache {
    entries: HashMap<PathBuf, CachedRule>,
}

impl RuleCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the cache holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all cached entries (forced refresh / test isolation).
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get the cached record for `path`, refreshing from disk if the file
    /// changed since it was cached.
    ///
    /// Returns `None` when the file cannot be statted or read; any stale
    /// entry is purged first so a later successful read starts fresh.
    pub async fn get_or_refresh(&mut self, path: &Path) -> Option<&CachedRule> {
        let mtime = match file_mtime(path).await {
            Ok(mtime) => mtime,
            Err(e) => {
                let _ = self.entries.remove(path);
                warn!(path = %path.display(), error = %e, "Failed to read rule file");
                return None;
            }
        };

        let hit = self
            .entries
            .get(path)
            .is_some_and(|cached| cached.mtime == mtime);

        if hit {
            debug!(path = %path.display(), "Rule cache hit");
        } else {
            debug!(path = %path.display(), "Rule cache miss");
            let content = match tokio::fs::read_to_string(path).await {
                Ok(content) => content,
                Err(e) => {
                    let _ = self.entries.remove(path);
                    warn!(path = %path.display(), error = %e, "Failed to read rule file");
                    return None;
                }
            };

            let metadata = parse_rule_metadata(&content);
            let stripped_content = strip_frontmatter(&content).to_owned();
            let _ = self.entries.insert(
                path.to_path_buf(),
                CachedRule {
                    content,
                    metadata,
                    stripped_content,
                    mtime,
                },
            );
        }

        self.entries.get(path)
    }
}

async fn file_mtime(path: &Path) -> std::io::Result<SystemTime> {
    tokio::fs::metadata(path).await?.modified()
}
