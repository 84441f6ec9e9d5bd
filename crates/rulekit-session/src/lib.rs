//! # rulekit-session
//!
//! Per-session state store and conversation context extraction.
//!
//! The store maps opaque session ids to mutable per-conversation state
//! (observed file paths, the latest user prompt, compaction status, seeding
//! flags) with logical-clock LRU eviction. Extraction turns raw
//! conversation events into the normalized path and prompt facts that
//! conditional rule matching runs against.

#![deny(unsafe_code)]

pub mod extract;
pub mod message;
pub mod store;

pub use extract::{extract_dir_from_glob, extract_file_paths_from_messages};
pub use message::{
    extract_latest_user_prompt, extract_session_id, normalize_context_path, normalize_messages,
    sanitize_path_for_context, user_text_from_parts, Message, MessagePart,
};
pub use store::{SessionState, SessionStore, DEFAULT_COMPACTION_TTL_MS, DEFAULT_SESSION_CAPACITY};
