//! Context path extraction from conversation messages.
//!
//! Two sources feed the context path set: tool invocation arguments (a
//! fixed table of path-bearing argument names per tool) and free text (a
//! permissive scanner for path-shaped tokens). Results are deduplicated;
//! repeated mentions of the same path count once.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::message::{Message, MessagePart};

/// Characters that start a glob expression inside a pattern argument.
const GLOB_CHARS: [char; 4] = ['*', '?', '[', '{'];

/// Path-shaped tokens: optional `./`/`../` prefix, at least one separator,
/// optional extension, preceded by start-of-line or a boundary character.
static PATH_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?m)(?:^|[\s"'`(])((?:\.{0,2}/)?[A-Za-z0-9_./-]+/[A-Za-z0-9_./-]+(?:\.[A-Za-z0-9_]+)?)"#)
        .expect("path token regex is valid")
});

/// Trailing prose punctuation trimmed off matched tokens.
static TRAILING_PUNCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.,!?:;]+$").expect("punctuation regex is valid"));

/// Extract deduplicated file paths from normalized messages.
///
/// Tool invocations contribute their path arguments; text parts are scanned
/// for path-shaped tokens.
#[must_use]
pub fn extract_file_paths_from_messages(messages: &[Message]) -> Vec<String> {
    let mut paths = HashSet::new();

    for message in messages {
        for part in &message.parts {
            match part {
                MessagePart::ToolInvocation { tool_name, args } => {
                    extract_paths_from_tool_call(tool_name, args, &mut paths);
                }
                MessagePart::Text { text, .. } => {
                    extract_paths_from_text(text, &mut paths);
                }
                MessagePart::Other => {}
            }
        }
    }

    paths.into_iter().collect()
}

/// Argument names carrying path-like values, per tool.
fn path_arg_names(tool_name: &str) -> &'static [&'static str] {
    match tool_name {
        "read" | "edit" | "write" => &["filePath"],
        "glob" => &["pattern", "path"],
        "grep" => &["path"],
        _ => &[],
    }
}

fn extract_paths_from_tool_call(
    tool_name: &str,
    args: &Map<String, Value>,
    paths: &mut HashSet<String>,
) {
    for arg_name in path_arg_names(tool_name) {
        let Some(value) = args.get(*arg_name).and_then(Value::as_str) else {
            continue;
        };
        if value.is_empty() {
            continue;
        }

        if *arg_name == "pattern" {
            if let Some(dir) = extract_dir_from_glob(value) {
                let _ = paths.insert(dir);
            }
        } else {
            let _ = paths.insert(value.to_owned());
        }
    }
}

/// Extract the literal directory prefix from a glob pattern.
///
/// Only the part before the first glob character counts; the directory
/// portion of that prefix is kept. When the first path segment itself
/// contains a wildcard (no separator before it) there is no stable prefix
/// and `None` is returned. A separator-free pattern without any glob
/// character is returned whole.
#[must_use]
pub fn extract_dir_from_glob(pattern: &str) -> Option<String> {
    let first_glob = pattern.find(GLOB_CHARS).unwrap_or(pattern.len());
    if first_glob == 0 {
        return None;
    }

    let before_glob = &pattern[..first_glob];
    match before_glob.rfind('/') {
        Some(last_slash) => Some(before_glob[..last_slash].to_owned()),
        None => {
            // A glob further in means this is just a file prefix, not a dir.
            if first_glob < pattern.len() {
                None
            } else {
                Some(before_glob.to_owned())
            }
        }
    }
}

fn extract_paths_from_text(text: &str, paths: &mut HashSet<String>) {
    for captures in PATH_TOKEN.captures_iter(text) {
        let Some(token) = captures.get(1) else {
            continue;
        };
        let candidate = TRAILING_PUNCT.replace(token.as_str(), "");

        // Exclude URLs and emails.
        if candidate.contains("://") || candidate.starts_with("http") || candidate.contains('@') {
            continue;
        }

        // Must contain something beyond slashes and dots.
        if candidate.chars().any(|c| c != '/' && c != '.') {
            let _ = paths.insert(candidate.into_owned());
        }
    }
}
