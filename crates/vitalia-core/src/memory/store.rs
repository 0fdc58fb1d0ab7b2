//! Session table owned by the memory store.
//!
//! Sessions are keyed by user id in a `DashMap`, so mutation takes a
//! per-entry lock rather than a global one: appends for one user never
//! block appends for another, and the periodic sweep contends only with
//! the sessions it is actually evicting.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use tracing::debug;

use vitalia_types::session::{ConversationSession, Turn};

/// Bounded, expiring store of per-user conversation sessions.
///
/// The store is the exclusive owner of every `ConversationSession`; callers
/// only ever receive cloned snapshots. No operation here surfaces an error:
/// absence of history is a valid state, and hitting the turn bound is a
/// normal eviction path.
pub struct MemoryStore {
    sessions: DashMap<String, ConversationSession>,
    max_turns: usize,
    max_age: Duration,
}

impl MemoryStore {
    pub fn new(max_messages_per_user: usize, max_memory_hours: u64) -> Self {
        Self {
            sessions: DashMap::new(),
            max_turns: max_messages_per_user,
            max_age: Duration::hours(max_memory_hours as i64),
        }
    }

    /// Store a turn for a user, creating the session on first contact.
    ///
    /// Updates `last_active` and evicts the oldest turn (FIFO) when the
    /// bound is exceeded.
    pub fn append(&self, user_id: &str, turn: Turn) {
        let mut entry = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| ConversationSession::empty(user_id));
        entry.push_turn(turn, self.max_turns);
    }

    /// Immutable snapshot of a user's session.
    ///
    /// Never fails: unknown users get an empty session.
    pub fn get_session(&self, user_id: &str) -> ConversationSession {
        self.sessions
            .get(user_id)
            .map(|entry| entry.clone())
            .unwrap_or_else(|| ConversationSession::empty(user_id))
    }

    /// Mutate a session in place under its entry lock.
    ///
    /// Used by the flow controller to write back dialogue state, purchase
    /// intent, and the last-offered candidate list after handling a turn.
    pub fn with_session<F>(&self, user_id: &str, f: F)
    where
        F: FnOnce(&mut ConversationSession),
    {
        let mut entry = self
            .sessions
            .entry(user_id.to_string())
            .or_insert_with(|| ConversationSession::empty(user_id));
        f(&mut entry);
    }

    /// Remove sessions idle longer than the configured maximum age.
    ///
    /// Returns the number of sessions removed. Locking is per shard, so
    /// in-flight request handling for unaffected users is not blocked.
    pub fn sweep(&self, now: DateTime<Utc>) -> usize {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| now - session.last_active <= self.max_age);
        let removed = before - self.sessions.len();
        if removed > 0 {
            debug!(removed, remaining = self.sessions.len(), "swept idle sessions");
        }
        removed
    }

    /// Explicitly purge one user's session. Returns whether one existed.
    pub fn reset(&self, user_id: &str) -> bool {
        self.sessions.remove(user_id).is_some()
    }

    /// Number of live sessions.
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn(text: &str) -> Turn {
        Turn::user(text, vec![])
    }

    #[test]
    fn test_get_session_unknown_user_is_empty() {
        let store = MemoryStore::new(10, 1);
        let session = store.get_session("nobody");
        assert!(session.is_empty());
        assert_eq!(session.user_id, "nobody");
        // Reading never creates a session
        assert_eq!(store.session_count(), 0);
    }

    #[test]
    fn test_append_creates_session() {
        let store = MemoryStore::new(10, 1);
        store.append("u1", turn("hello"));
        assert_eq!(store.session_count(), 1);
        assert_eq!(store.get_session("u1").turns.len(), 1);
    }

    #[test]
    fn test_turn_count_never_exceeds_bound() {
        let store = MemoryStore::new(3, 1);
        for i in 0..20 {
            store.append("u1", turn(&format!("message {i}")));
            assert!(store.get_session("u1").turns.len() <= 3);
        }
        let session = store.get_session("u1");
        // Oldest evicted first
        assert_eq!(session.turns[0].text, "message 17");
        assert_eq!(session.turns[2].text, "message 19");
    }

    #[test]
    fn test_sweep_removes_stale_sessions() {
        let store = MemoryStore::new(10, 1);
        store.append("stale", turn("old message"));
        store.append("fresh", turn("new message"));
        store.with_session("stale", |s| {
            s.last_active = Utc::now() - Duration::hours(2);
        });

        let removed = store.sweep(Utc::now());
        assert_eq!(removed, 1);
        assert_eq!(store.session_count(), 1);
        // Subsequent lookup returns an empty session, not an error
        assert!(store.get_session("stale").is_empty());
        assert!(!store.get_session("fresh").is_empty());
    }

    #[test]
    fn test_sweep_keeps_sessions_within_age() {
        let store = MemoryStore::new(10, 1);
        store.append("u1", turn("hi"));
        assert_eq!(store.sweep(Utc::now()), 0);
        assert_eq!(store.session_count(), 1);
    }

    #[test]
    fn test_reset_purges_session() {
        let store = MemoryStore::new(10, 1);
        store.append("u1", turn("hi"));
        assert!(store.reset("u1"));
        assert!(!store.reset("u1"));
        assert!(store.get_session("u1").is_empty());
    }

    #[test]
    fn test_with_session_writes_back() {
        let store = MemoryStore::new(10, 1);
        store.append("u1", turn("hi"));
        store.with_session("u1", |s| {
            s.purchase_intent = 0.6;
            s.last_offered = vec!["Vitamin C".to_string()];
        });
        let session = store.get_session("u1");
        assert!((session.purchase_intent - 0.6).abs() < f64::EPSILON);
        assert_eq!(session.last_offered, vec!["Vitamin C".to_string()]);
    }
}
