//! Conversation message normalization.
//!
//! Host callbacks deliver conversation events as raw JSON. Message shapes
//! vary by origin (fields present or absent), so everything funnels through
//! an explicit normalization pass that maps parts onto tagged variants and
//! discards structurally incomplete entries before extraction runs.

use std::path::{Component, Path};

use serde_json::{Map, Value};

/// Maximum length of a sanitized context path.
const MAX_SANITIZED_PATH_CHARS: usize = 300;

/// A normalized message part.
#[derive(Clone, Debug, PartialEq)]
pub enum MessagePart {
    /// Free text authored by a participant.
    Text {
        /// The text content.
        text: String,
        /// Host-generated filler, skipped by prompt capture.
        synthetic: bool,
    },
    /// A tool call with its arguments.
    ToolInvocation {
        /// Tool name, e.g. `read` or `grep`.
        tool_name: String,
        /// Raw argument map.
        args: Map<String, Value>,
    },
    /// Anything else (ignored by extraction).
    Other,
}

/// A normalized conversation message.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Message role, e.g. `user` or `assistant`.
    pub role: String,
    /// Normalized parts, in original order.
    pub parts: Vec<MessagePart>,
}

/// Normalize raw message values, discarding structurally incomplete entries.
///
/// A message survives only with a string `role` and a non-empty `parts`
/// array. Parts become [`MessagePart::Text`] (explicit `"text"` type, or an
/// untyped part carrying a `text` string), [`MessagePart::ToolInvocation`]
/// (`"tool-invocation"` type with a tool name and argument object), or
/// [`MessagePart::Other`].
#[must_use]
pub fn normalize_messages(raw: &[Value]) -> Vec<Message> {
    raw.iter().filter_map(normalize_message).collect()
}

fn normalize_message(raw: &Value) -> Option<Message> {
    let role = raw.get("role")?.as_str()?;
    let parts = raw.get("parts")?.as_array()?;
    if parts.is_empty() {
        return None;
    }

    Some(Message {
        role: role.to_owned(),
        parts: parts.iter().map(normalize_part).collect(),
    })
}

fn normalize_part(raw: &Value) -> MessagePart {
    let part_type = raw.get("type").and_then(Value::as_str);
    let text = raw.get("text").and_then(Value::as_str);
    let synthetic = raw
        .get("synthetic")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    match part_type {
        Some("text") => match text {
            Some(text) if !text.is_empty() => MessagePart::Text {
                text: text.to_owned(),
                synthetic,
            },
            _ => MessagePart::Other,
        },
        Some("tool-invocation") => {
            let invocation = raw.get("toolInvocation");
            let tool_name = invocation
                .and_then(|inv| inv.get("toolName"))
                .and_then(Value::as_str);
            let args = invocation
                .and_then(|inv| inv.get("args"))
                .and_then(Value::as_object);
            match (tool_name, args) {
                (Some(tool_name), Some(args)) => MessagePart::ToolInvocation {
                    tool_name: tool_name.to_owned(),
                    args: args.clone(),
                },
                _ => MessagePart::Other,
            }
        }
        // Untyped parts that carry text are treated as text.
        None => match text {
            Some(text) if !text.is_empty() => MessagePart::Text {
                text: text.to_owned(),
                synthetic,
            },
            _ => MessagePart::Other,
        },
        Some(_) => MessagePart::Other,
    }
}

/// Find the session id carried by a raw message batch.
///
/// Checks each message's `info.sessionID`, then falls back to per-part
/// `sessionID` fields.
#[must_use]
pub fn extract_session_id(raw: &[Value]) -> Option<String> {
    for message in raw {
        if let Some(id) = message
            .get("info")
            .and_then(|info| info.get("sessionID"))
            .and_then(Value::as_str)
        {
            return Some(id.to_owned());
        }
        if let Some(parts) = message.get("parts").and_then(Value::as_array) {
            for part in parts {
                if let Some(id) = part.get("sessionID").and_then(Value::as_str) {
                    return Some(id.to_owned());
                }
            }
        }
    }
    None
}

/// Join the non-synthetic text parts of a raw part array into one prompt.
///
/// Each part's text is trimmed; empties are dropped; survivors are joined
/// with single spaces. Returns `None` when nothing usable remains.
#[must_use]
pub fn user_text_from_parts(parts: &[Value]) -> Option<String> {
    let mut texts = Vec::new();
    for part in parts {
        if part
            .get("synthetic")
            .and_then(Value::as_bool)
            .unwrap_or(false)
        {
            continue;
        }
        let part_type = part.get("type").and_then(Value::as_str);
        let text = part.get("text").and_then(Value::as_str);
        match (part_type, text) {
            (Some("text") | None, Some(text)) if !text.is_empty() => texts.push(text),
            _ => {}
        }
    }

    if texts.is_empty() {
        return None;
    }

    let joined = texts
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ");

    (!joined.is_empty()).then_some(joined)
}

/// Extract the latest user prompt from a raw message batch.
///
/// Scans newest-first for a user (or role-less) message with text parts.
/// The scan stops at the first message carrying any text candidate: a
/// `"text"`-typed part with non-empty text, or an untyped part whose
/// `text` field is a string (even an empty one). If that message's joined
/// text is empty, the result is `None` rather than an older prompt.
#[must_use]
pub fn extract_latest_user_prompt(raw: &[Value]) -> Option<String> {
    for message in raw.iter().rev() {
        if let Some(role) = message.get("role").and_then(Value::as_str) {
            if role != "user" {
                continue;
            }
        }
        let Some(parts) = message.get("parts").and_then(Value::as_array) else {
            continue;
        };

        let has_text = parts.iter().any(|part| {
            let synthetic = part
                .get("synthetic")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if synthetic {
                return false;
            }
            let text = part.get("text").and_then(Value::as_str);
            match part.get("type").and_then(Value::as_str) {
                Some("text") => text.is_some_and(|t| !t.is_empty()),
                None => text.is_some(),
                Some(_) => false,
            }
        });
        if has_text {
            return user_text_from_parts(parts);
        }
    }
    None
}

/// Normalize a path to project-relative, forward-slash form.
///
/// Absolute paths under `base_dir` become relative; anything else is
/// returned unchanged.
#[must_use]
pub fn normalize_context_path(path: &str, base_dir: &Path) -> String {
    let p = Path::new(path);
    if !p.is_absolute() {
        return path.to_owned();
    }
    match p.strip_prefix(base_dir) {
        Ok(relative) => relative
            .components()
            .filter(|c| matches!(c, Component::Normal(_)))
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => path.to_owned(),
    }
}

/// Sanitize a path for inclusion in a line-oriented context block.
///
/// Carriage returns, line feeds, and tabs become single spaces and the
/// result is truncated, so injected content cannot escape its line.
#[must_use]
pub fn sanitize_path_for_context(path: &str) -> String {
    path.chars()
        .map(|c| if matches!(c, '\r' | '\n' | '\t') { ' ' } else { c })
        .take(MAX_SANITIZED_PATH_CHARS)
        .collect()
}
