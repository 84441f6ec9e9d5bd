//! Filesystem rule scanner.
//!
//! Discovers markdown rule files by recursively scanning one or more root
//! directories. Hidden files and directories (dot-prefixed) are skipped.
//! Non-existent roots return empty results; unreadable directories are
//! logged and contribute zero entries without affecting sibling roots.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::errors::DiscoveryError;
use crate::types::DiscoveredRule;

/// File extensions recognised as rule files.
const RULE_EXTENSIONS: &[&str] = &["md", "mdc"];

/// Subdirectory of the config home holding global rules.
const GLOBAL_RULES_SUBDIR: &str = "rulekit/rules";

/// Project-local rules directory, relative to the project root.
const PROJECT_RULES_DIR: &str = ".rulekit/rules";

/// Result of scanning rule roots.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Discovered rule files, in deterministic (sorted walk) order.
    pub rules: Vec<DiscoveredRule>,
    /// Non-fatal errors encountered during the scan.
    pub errors: Vec<DiscoveryError>,
}

/// Get the default rule roots: global config dir, then project-local.
///
/// Global rules live in `$XDG_CONFIG_HOME/rulekit/rules` (falling back to
/// `~/.config/rulekit/rules`); project rules in `<project>/.rulekit/rules`.
pub fn default_rule_roots(project_dir: &Path) -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(global) = global_rules_dir() {
        roots.push(global);
    }
    roots.push(project_dir.join(PROJECT_RULES_DIR));
    roots
}

/// Get the global rules directory path, if a config home can be resolved.
fn global_rules_dir() -> Option<PathBuf> {
    if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
        if !xdg.is_empty() {
            return Some(PathBuf::from(xdg).join(GLOBAL_RULES_SUBDIR));
        }
    }
    std::env::var("HOME")
        .ok()
        .filter(|home| !home.is_empty())
        .map(|home| PathBuf::from(home).join(".config").join(GLOBAL_RULES_SUBDIR))
}

/// Discover rule files under the given roots.
///
/// Each root is scanned recursively. A file's relative path is computed
/// against its own root, so headings stay unique per root. Roots that do
/// not exist are skipped silently; read failures inside a root are recorded
/// as [`DiscoveryError`]s and logged.
pub fn discover_rule_files(roots: &[PathBuf]) -> DiscoveryReport {
    let mut report = DiscoveryReport::default();

    for root in roots {
        scan_root(root, &mut report);
    }

    debug!(count = report.rules.len(), "Rule discovery complete");
    report
}

fn scan_root(root: &Path, report: &mut DiscoveryReport) {
    if !root.is_dir() {
        return;
    }

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden(entry));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                let path = e
                    .path()
                    .map_or_else(|| root.display().to_string(), |p| p.display().to_string());
                warn!(path = %path, error = %e, "Failed to read rules directory entry");
                report.errors.push(DiscoveryError {
                    path,
                    message: e.to_string(),
                });
                continue;
            }
        };

        if !entry.file_type().is_file() || !has_rule_extension(entry.path()) {
            continue;
        }

        let relative_path = relative_display_path(entry.path(), root);
        debug!(relative_path = %relative_path, path = %entry.path().display(), "Discovered rule");
        report.rules.push(DiscoveredRule {
            path: entry.path().to_path_buf(),
            relative_path,
        });
    }
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

fn has_rule_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| RULE_EXTENSIONS.contains(&ext))
}

/// Compute a forward-slash relative path for display headings.
fn relative_display_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/")
}
