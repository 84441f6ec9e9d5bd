//! Bounded per-session state store.
//!
//! [`SessionStore`] maps session ids to [`SessionState`] with logical-clock
//! LRU eviction: a process-wide tick increments on every mutating operation
//! and the entry with the smallest tick is evicted when the store exceeds
//! capacity. The tick is independent of wall-clock time, so eviction order
//! is deterministic.
//!
//! All mutation goes through [`SessionStore::upsert`], which applies a
//! caller-supplied closure to exactly one session's state under the store
//! lock; the eviction scan runs under that same lock.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;
use tracing::debug;

/// Default maximum number of tracked sessions.
pub const DEFAULT_SESSION_CAPACITY: usize = 100;

/// Default compaction TTL in milliseconds.
pub const DEFAULT_COMPACTION_TTL_MS: u64 = 30_000;

/// Mutable per-conversation state.
#[derive(Clone, Debug, Default)]
pub struct SessionState {
    /// Normalized file paths observed during the conversation.
    pub context_paths: HashSet<String>,
    /// Sticky latest user prompt. First non-empty value wins during seeding;
    /// a genuine new user turn overwrites it.
    pub last_user_prompt: Option<String>,
    /// Logical update counter stamped by the store on every mutation.
    pub last_updated: u64,
    /// Set while the host is compacting this session.
    pub is_compacting: bool,
    /// Wall-clock ms timestamp when compaction started.
    pub compacting_since: Option<u64>,
    /// Whether the full-history seed has run for this session.
    pub seeded_from_history: bool,
    /// Number of times the seed mutation has executed.
    pub seed_count: u32,
}

#[derive(Debug)]
struct StoreInner {
    states: HashMap<String, SessionState>,
    capacity: usize,
    tick: u64,
}

impl StoreInner {
    fn upsert(&mut self, session_id: &str, mutate: impl FnOnce(&mut SessionState)) {
        if !self.states.contains_key(session_id) {
            // Tick increments on creation, then again after the mutation.
            self.tick += 1;
            let _ = self.states.insert(
                session_id.to_owned(),
                SessionState {
                    last_updated: self.tick,
                    ..SessionState::default()
                },
            );
        }

        if let Some(state) = self.states.get_mut(session_id) {
            mutate(state);
            self.tick += 1;
            state.last_updated = self.tick;
        }

        while self.states.len() > self.capacity {
            let oldest = self
                .states
                .iter()
                .min_by_key(|(_, state)| state.last_updated)
                .map(|(id, _)| id.clone());
            let Some(oldest) = oldest else {
                break;
            };
            let _ = self.states.remove(&oldest);
            debug!(session_id = %oldest, "Evicted oldest session state");
        }
    }
}

/// Bounded map from session id to [`SessionState`].
#[derive(Debug)]
pub struct SessionStore {
    inner: Mutex<StoreInner>,
}

impl SessionStore {
    /// Create a store with the default capacity.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SESSION_CAPACITY)
    }

    /// Create a store with an explicit capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                states: HashMap::new(),
                capacity,
                tick: 0,
            }),
        }
    }

    /// Change the capacity. Takes effect on the next mutating operation;
    /// no immediate eviction happens here.
    pub fn set_capacity(&self, capacity: usize) {
        self.inner.lock().capacity = capacity;
    }

    /// All currently tracked session ids (diagnostics/testing).
    #[must_use]
    pub fn ids(&self) -> Vec<String> {
        self.inner.lock().states.keys().cloned().collect()
    }

    /// Deep-copied snapshot of one session's state.
    #[must_use]
    pub fn snapshot(&self, session_id: &str) -> Option<SessionState> {
        self.inner.lock().states.get(session_id).cloned()
    }

    /// Fetch-or-create the session's state and apply `mutate` to it,
    /// atomically with respect to this store. Stamps the logical tick and
    /// evicts the lowest-tick entries while the store exceeds capacity.
    pub fn upsert(&self, session_id: &str, mutate: impl FnOnce(&mut SessionState)) {
        self.inner.lock().upsert(session_id, mutate);
    }

    /// Flag the session as compacting, recording the start timestamp.
    pub fn mark_compacting(&self, session_id: &str, now_ms: u64) {
        self.upsert(session_id, |state| {
            state.is_compacting = true;
            state.compacting_since = Some(now_ms);
        });
    }

    /// Whether rule injection should be skipped for a compacting session.
    ///
    /// Returns `false` when the session has no state or is not compacting.
    /// A compacting session with no start timestamp is treated as still
    /// compacting (conservative default). Once the TTL elapses the flag is
    /// cleared as a side effect and injection resumes.
    pub fn should_skip_injection(&self, session_id: &str, now_ms: u64, ttl_ms: u64) -> bool {
        let mut inner = self.inner.lock();

        let (is_compacting, since) = match inner.states.get(session_id) {
            Some(state) => (state.is_compacting, state.compacting_since),
            None => return false,
        };
        if !is_compacting {
            return false;
        }
        let Some(since) = since else {
            return true;
        };

        if now_ms.saturating_sub(since) <= ttl_ms {
            return true;
        }

        inner.upsert(session_id, |state| state.is_compacting = false);
        false
    }

    /// Drop all state and restore defaults (test isolation).
    pub fn reset(&self) {
        let mut inner = self.inner.lock();
        inner.states.clear();
        inner.capacity = DEFAULT_SESSION_CAPACITY;
        inner.tick = 0;
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_creates_default_state() {
        let store = SessionStore::new();
        store.upsert("s1", |_| {});

        let state = store.snapshot("s1").unwrap();
        assert!(state.context_paths.is_empty());
        assert!(state.last_user_prompt.is_none());
        assert!(!state.seeded_from_history);
        assert_eq!(state.seed_count, 0);
    }

    #[test]
    fn test_upsert_applies_mutation() {
        let store = SessionStore::new();
        store.upsert("s1", |state| {
            let _ = state.context_paths.insert("src/main.rs".to_string());
        });

        let state = store.snapshot("s1").unwrap();
        assert!(state.context_paths.contains("src/main.rs"));
    }

    #[test]
    fn test_capacity_two_evicts_oldest() {
        let store = SessionStore::with_capacity(2);
        store.upsert("1", |_| {});
        store.upsert("2", |_| {});
        store.upsert("3", |_| {});

        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, vec!["2", "3"]);
    }

    #[test]
    fn test_touch_refreshes_lru_position() {
        let store = SessionStore::with_capacity(2);
        store.upsert("1", |_| {});
        store.upsert("2", |_| {});
        store.upsert("1", |_| {}); // "1" is now newer than "2"
        store.upsert("3", |_| {});

        let mut ids = store.ids();
        ids.sort();
        assert_eq!(ids, vec!["1", "3"]);
    }

    #[test]
    fn test_set_capacity_applies_on_next_upsert() {
        let store = SessionStore::with_capacity(3);
        store.upsert("1", |_| {});
        store.upsert("2", |_| {});
        store.upsert("3", |_| {});
        store.set_capacity(1);
        assert_eq!(store.ids().len(), 3);

        store.upsert("4", |_| {});
        assert_eq!(store.ids(), vec!["4"]);
    }

    #[test]
    fn test_snapshot_is_deep_copy() {
        let store = SessionStore::new();
        store.upsert("s1", |state| {
            let _ = state.context_paths.insert("a".to_string());
        });

        let mut snap = store.snapshot("s1").unwrap();
        let _ = snap.context_paths.insert("b".to_string());

        assert!(!store.snapshot("s1").unwrap().context_paths.contains("b"));
    }

    #[test]
    fn test_skip_injection_without_state() {
        let store = SessionStore::new();
        assert!(!store.should_skip_injection("missing", 1_000, 30_000));
    }

    #[test]
    fn test_skip_injection_not_compacting() {
        let store = SessionStore::new();
        store.upsert("s1", |_| {});
        assert!(!store.should_skip_injection("s1", 1_000, 30_000));
    }

    #[test]
    fn test_skip_injection_within_ttl() {
        let store = SessionStore::new();
        store.mark_compacting("s1", 10_000);
        assert!(store.should_skip_injection("s1", 10_000 + 29_000, 30_000));
    }

    #[test]
    fn test_skip_injection_expires_and_clears_flag() {
        let store = SessionStore::new();
        store.mark_compacting("s1", 10_000);

        assert!(!store.should_skip_injection("s1", 10_000 + 31_000, 30_000));
        assert!(!store.snapshot("s1").unwrap().is_compacting);
    }

    #[test]
    fn test_skip_injection_missing_timestamp_is_conservative() {
        let store = SessionStore::new();
        store.upsert("s1", |state| state.is_compacting = true);
        assert!(store.should_skip_injection("s1", u64::MAX, 0));
    }

    #[test]
    fn test_reset_restores_defaults() {
        let store = SessionStore::with_capacity(5);
        store.upsert("s1", |_| {});
        store.reset();
        assert!(store.ids().is_empty());
        assert!(store.snapshot("s1").is_none());
    }
}
