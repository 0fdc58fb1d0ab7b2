//! Conversation session and turn types.
//!
//! A `ConversationSession` is the bounded, time-limited dialogue history for
//! one user. It is owned exclusively by the memory store; every other
//! component works on cloned snapshots.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::flow::ConversationState;

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Speaker {
    User,
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "user"),
            Speaker::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Speaker::User),
            "assistant" => Ok(Speaker::Assistant),
            other => Err(format!("invalid speaker: '{other}'")),
        }
    }
}

/// One exchange in a conversation. Immutable once created.
///
/// `entities` holds the product identifiers mentioned in the turn. They are
/// plain identifiers, never owning references -- cross-turn lookups resolve
/// them against the session at read time, so an evicted turn can never leave
/// a dangling pointer behind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub entities: Vec<String>,
}

impl Turn {
    /// Build a user turn stamped with the current time.
    pub fn user(text: impl Into<String>, entities: Vec<String>) -> Self {
        Self {
            speaker: Speaker::User,
            text: text.into(),
            timestamp: Utc::now(),
            entities,
        }
    }

    /// Build an assistant turn stamped with the current time.
    pub fn assistant(text: impl Into<String>, entities: Vec<String>) -> Self {
        Self {
            speaker: Speaker::Assistant,
            text: text.into(),
            timestamp: Utc::now(),
            entities,
        }
    }
}

/// The bounded dialogue history for one user.
///
/// Turns are kept in insertion order and trimmed FIFO once the configured
/// bound is exceeded. `purchase_intent` is the decayed readiness-to-buy
/// estimate carried across turns; `last_offered` remembers the product ids
/// listed by the most recent direct answer so ordinal replies ("1", "the
/// second one") can be resolved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationSession {
    pub user_id: String,
    pub turns: VecDeque<Turn>,
    pub last_active: DateTime<Utc>,
    /// Health topics inferred across turns (e.g. "sleep", "immunity").
    pub health_focus: BTreeSet<String>,
    /// Decayed purchase-readiness estimate, 0.0..=1.0.
    pub purchase_intent: f64,
    pub state: ConversationState,
    /// Product ids offered by the most recent ranked answer, in rank order.
    pub last_offered: Vec<String>,
}

impl ConversationSession {
    /// An empty session for a user who has no stored history.
    ///
    /// Absence of history is a valid state, not a failure -- lookups for
    /// unknown users return this instead of an error.
    pub fn empty(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            turns: VecDeque::new(),
            last_active: Utc::now(),
            health_focus: BTreeSet::new(),
            purchase_intent: 0.0,
            state: ConversationState::Idle,
            last_offered: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    /// Append a turn, updating `last_active` and trimming FIFO past the bound.
    pub fn push_turn(&mut self, turn: Turn, max_turns: usize) {
        self.last_active = turn.timestamp;
        self.turns.push_back(turn);
        while self.turns.len() > max_turns {
            self.turns.pop_front();
        }
    }

    /// The most recently mentioned entity, scanning turns newest-first.
    ///
    /// This is the most-recent-wins resolution target for pronouns like
    /// "it" or "that one".
    pub fn last_mentioned(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| !turn.entities.is_empty())
            .and_then(|turn| turn.entities.last())
            .map(String::as_str)
    }

    /// All entities mentioned in the retained turns.
    pub fn entity_set(&self) -> BTreeSet<&str> {
        self.turns
            .iter()
            .flat_map(|turn| turn.entities.iter().map(String::as_str))
            .collect()
    }

    /// How many retained turns mention the given entity.
    pub fn mention_count(&self, entity: &str) -> usize {
        self.turns
            .iter()
            .filter(|turn| turn.entities.iter().any(|e| e == entity))
            .count()
    }

    /// Text of the most recent user turn, if any.
    pub fn last_user_text(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find(|turn| turn.speaker == Speaker::User)
            .map(|turn| turn.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_roundtrip() {
        for speaker in [Speaker::User, Speaker::Assistant] {
            let s = speaker.to_string();
            let parsed: Speaker = s.parse().unwrap();
            assert_eq!(speaker, parsed);
        }
    }

    #[test]
    fn test_push_turn_trims_fifo() {
        let mut session = ConversationSession::empty("u1");
        for i in 0..5 {
            session.push_turn(Turn::user(format!("message {i}"), vec![]), 3);
        }
        assert_eq!(session.turns.len(), 3);
        // Oldest turns evicted first
        assert_eq!(session.turns[0].text, "message 2");
        assert_eq!(session.turns[2].text, "message 4");
    }

    #[test]
    fn test_push_turn_updates_last_active() {
        let mut session = ConversationSession::empty("u1");
        let turn = Turn::user("hello", vec![]);
        let stamp = turn.timestamp;
        session.push_turn(turn, 10);
        assert_eq!(session.last_active, stamp);
    }

    #[test]
    fn test_last_mentioned_is_most_recent() {
        let mut session = ConversationSession::empty("u1");
        session.push_turn(
            Turn::user("tell me about Vitamin C and Zinc", vec!["Vitamin C".into(), "Zinc".into()]),
            10,
        );
        session.push_turn(Turn::assistant("sure", vec![]), 10);
        assert_eq!(session.last_mentioned(), Some("Zinc"));

        session.push_turn(Turn::user("and Magnesium Complex?", vec!["Magnesium Complex".into()]), 10);
        assert_eq!(session.last_mentioned(), Some("Magnesium Complex"));
    }

    #[test]
    fn test_last_mentioned_empty_session() {
        let session = ConversationSession::empty("u1");
        assert!(session.last_mentioned().is_none());
    }

    #[test]
    fn test_mention_count() {
        let mut session = ConversationSession::empty("u1");
        session.push_turn(Turn::user("a", vec!["Vitamin C".into()]), 10);
        session.push_turn(Turn::assistant("b", vec!["Vitamin C".into()]), 10);
        session.push_turn(Turn::user("c", vec!["Zinc".into()]), 10);
        assert_eq!(session.mention_count("Vitamin C"), 2);
        assert_eq!(session.mention_count("Zinc"), 1);
        assert_eq!(session.mention_count("Iron"), 0);
    }

    #[test]
    fn test_entity_set_deduplicates() {
        let mut session = ConversationSession::empty("u1");
        session.push_turn(Turn::user("a", vec!["Vitamin C".into()]), 10);
        session.push_turn(Turn::user("b", vec!["Vitamin C".into(), "Zinc".into()]), 10);
        let set = session.entity_set();
        assert_eq!(set.len(), 2);
        assert!(set.contains("Vitamin C"));
        assert!(set.contains("Zinc"));
    }

    #[test]
    fn test_last_user_text_skips_assistant() {
        let mut session = ConversationSession::empty("u1");
        session.push_turn(Turn::user("question", vec![]), 10);
        session.push_turn(Turn::assistant("answer", vec![]), 10);
        assert_eq!(session.last_user_text(), Some("question"));
    }

    #[test]
    fn test_session_serde_roundtrip() {
        let mut session = ConversationSession::empty("u1");
        session.push_turn(Turn::user("hello", vec!["Vitamin C".into()]), 10);
        session.health_focus.insert("immunity".to_string());
        let json = serde_json::to_string(&session).unwrap();
        let parsed: ConversationSession = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.user_id, "u1");
        assert_eq!(parsed.turns.len(), 1);
        assert!(parsed.health_focus.contains("immunity"));
    }
}
