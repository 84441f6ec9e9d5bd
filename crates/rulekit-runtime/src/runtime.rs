//! Hook runtime.
//!
//! [`RulesRuntime`] is the long-lived object the host drives through its
//! lifecycle callbacks. It owns the discovered rule list, the shared rule
//! cache, and the session store, and turns conversation events into the
//! context that conditional rule matching runs against:
//!
//! - tool execution observes live path arguments,
//! - the message transform seeds state from history exactly once,
//! - chat messages keep the latest user prompt current,
//! - the system transform injects matching rules (unless compacting),
//! - compaction receives a short working-context summary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use rulekit_rules::{
    default_rule_roots, discover_rule_files, read_and_format_rules, DiscoveredRule, MatchContext,
    RuleCache,
};
use rulekit_session::{
    extract_file_paths_from_messages, extract_latest_user_prompt, extract_session_id,
    normalize_context_path, normalize_messages, sanitize_path_for_context, user_text_from_parts,
    SessionStore,
};

use crate::capabilities::{query_capability_ids, CapabilitySource};
use crate::settings::RulekitSettings;

/// Title line of the compaction context block.
const COMPACTION_TITLE: &str = "Agent Rules: Working context";

/// Path-bearing argument names per tool, as seen by the live hook.
///
/// Differs from the history-seeding table: `bash` contributes its working
/// directory, and `glob` contributes only its search `path` — pattern
/// prefixes are extracted during seeding, never live.
fn live_path_args(tool_name: &str) -> &'static [&'static str] {
    match tool_name {
        "read" | "edit" | "write" => &["filePath"],
        "glob" | "grep" => &["path"],
        "bash" => &["workdir"],
        _ => &[],
    }
}

fn wall_clock_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| {
            u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
        })
}

/// Long-lived rule injection runtime.
pub struct RulesRuntime {
    source: Arc<dyn CapabilitySource>,
    project_dir: PathBuf,
    rule_files: Vec<DiscoveredRule>,
    cache: Mutex<RuleCache>,
    store: SessionStore,
    settings: RulekitSettings,
    now: fn() -> u64,
}

impl RulesRuntime {
    /// Build a runtime, discovering rule files once up front.
    ///
    /// Roots come from the settings when set, otherwise the default global
    /// and project-local directories. Discovery errors are logged and do
    /// not prevent startup.
    pub fn new(
        source: Arc<dyn CapabilitySource>,
        project_dir: impl Into<PathBuf>,
        settings: RulekitSettings,
    ) -> Self {
        let project_dir = project_dir.into();
        let roots = if settings.rule_roots.is_empty() {
            default_rule_roots(&project_dir)
        } else {
            settings.rule_roots.clone()
        };

        let report = discover_rule_files(&roots);
        for error in &report.errors {
            warn!(%error, "Rule discovery error");
        }
        debug!(count = report.rules.len(), "Discovered rule files");

        Self {
            source,
            project_dir,
            rule_files: report.rules,
            cache: Mutex::new(RuleCache::new()),
            store: SessionStore::with_capacity(settings.session_capacity),
            settings,
            now: wall_clock_ms,
        }
    }

    /// The discovered rule files, in scan order.
    #[must_use]
    pub fn rule_files(&self) -> &[DiscoveredRule] {
        &self.rule_files
    }

    /// The session store (diagnostics/testing).
    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Observe a tool execution and record its path arguments.
    ///
    /// Call before the tool runs. Paths are normalized to project-relative
    /// form.
    pub fn on_tool_execute_before(
        &self,
        session_id: &str,
        tool_name: &str,
        args: &Map<String, Value>,
    ) {
        let mut observed = Vec::new();
        for arg_name in live_path_args(tool_name) {
            let Some(value) = args.get(*arg_name).and_then(Value::as_str) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            observed.push(normalize_context_path(value, &self.project_dir));
        }

        if observed.is_empty() {
            return;
        }

        debug!(session_id, tool_name, count = observed.len(), "Observed tool paths");
        self.store.upsert(session_id, |state| {
            for path in observed {
                let _ = state.context_paths.insert(path);
            }
        });
    }

    /// Seed session state from the full message history, exactly once.
    ///
    /// Extracts file paths and the latest user prompt from the raw batch.
    /// A prompt already captured by the chat hook is not overwritten.
    pub fn on_messages_transform(&self, raw_messages: &[Value]) {
        let Some(session_id) = extract_session_id(raw_messages) else {
            return;
        };
        if self
            .store
            .snapshot(&session_id)
            .is_some_and(|state| state.seeded_from_history)
        {
            return;
        }

        let messages = normalize_messages(raw_messages);
        let paths: Vec<String> = extract_file_paths_from_messages(&messages)
            .into_iter()
            .map(|path| normalize_context_path(&path, &self.project_dir))
            .collect();
        let prompt = extract_latest_user_prompt(raw_messages);

        debug!(session_id = %session_id, paths = paths.len(), "Seeding session from history");
        self.store.upsert(&session_id, |state| {
            // Re-check under the store lock so concurrent seeds run once.
            if state.seeded_from_history {
                return;
            }
            for path in paths {
                let _ = state.context_paths.insert(path);
            }
            if state.last_user_prompt.is_none() {
                state.last_user_prompt = prompt;
            }
            state.seeded_from_history = true;
            state.seed_count += 1;
        });
    }

    /// Capture the latest user prompt from a live chat message.
    ///
    /// Non-user messages are ignored; a usable user message overwrites any
    /// previously captured prompt.
    pub fn on_chat_message(&self, session_id: &str, role: &str, parts: &[Value]) {
        if role != "user" {
            return;
        }
        let Some(prompt) = user_text_from_parts(parts) else {
            return;
        };

        self.store.upsert(session_id, |state| {
            state.last_user_prompt = Some(prompt);
        });
    }

    /// Build the rule addendum for the system prompt.
    ///
    /// Returns `None` when no rule qualifies or when the session is inside
    /// its compaction window. A missing session id still injects
    /// unconditional rules against an empty context.
    pub async fn on_system_transform(&self, session_id: Option<&str>) -> Option<String> {
        let mut ctx = MatchContext::default();

        if let Some(session_id) = session_id {
            if self.store.should_skip_injection(
                session_id,
                (self.now)(),
                self.settings.compaction_ttl_ms,
            ) {
                debug!(session_id, "Skipping rule injection during compaction");
                return None;
            }

            if let Some(state) = self.store.snapshot(session_id) {
                let mut paths: Vec<String> = state.context_paths.into_iter().collect();
                paths.sort();
                ctx.context_paths = paths;
                ctx.user_prompt = state.last_user_prompt;
            }
        }

        ctx.capability_ids = query_capability_ids(self.source.as_ref()).await;

        let mut cache = self.cache.lock().await;
        let addendum = read_and_format_rules(&mut cache, &self.rule_files, &ctx).await;
        (!addendum.is_empty()).then_some(addendum)
    }

    /// Produce a working-context summary for session compaction.
    ///
    /// Marks the session as compacting (suppressing injection for the TTL)
    /// and returns a sanitized, bounded list of its context paths. Returns
    /// `None` when the session is unknown or has no paths.
    pub fn on_session_compacting(&self, session_id: &str) -> Option<String> {
        let state = self.store.snapshot(session_id)?;
        if state.context_paths.is_empty() {
            return None;
        }

        self.store.mark_compacting(session_id, (self.now)());

        let mut paths: Vec<String> = state.context_paths.into_iter().collect();
        paths.sort();

        let shown = self.settings.max_compaction_paths.min(paths.len());
        let remainder = paths.len() - shown;

        let mut lines = vec![
            COMPACTION_TITLE.to_string(),
            "Current file paths in context:".to_string(),
        ];
        for path in &paths[..shown] {
            lines.push(format!("  - {}", sanitize_path_for_context(path)));
        }
        if remainder > 0 {
            lines.push(format!("  ... and {remainder} more paths"));
        }

        Some(lines.join("\n"))
    }
}
