//! Dialogue state machine states and flow decisions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::recommend::ScoredCandidate;

/// State of the per-session dialogue machine.
///
/// `Closing` is transient: it is reached only on an explicit reset and the
/// session immediately returns to `Idle`. There is no terminal state while
/// the session is alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Idle,
    Engaged,
    Clarifying,
    Selecting,
    Closing,
}

impl Default for ConversationState {
    fn default() -> Self {
        ConversationState::Idle
    }
}

impl fmt::Display for ConversationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConversationState::Idle => "idle",
            ConversationState::Engaged => "engaged",
            ConversationState::Clarifying => "clarifying",
            ConversationState::Selecting => "selecting",
            ConversationState::Closing => "closing",
        };
        write!(f, "{s}")
    }
}

impl FromStr for ConversationState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(ConversationState::Idle),
            "engaged" => Ok(ConversationState::Engaged),
            "clarifying" => Ok(ConversationState::Clarifying),
            "selecting" => Ok(ConversationState::Selecting),
            "closing" => Ok(ConversationState::Closing),
            other => Err(format!("invalid conversation state: '{other}'")),
        }
    }
}

/// What the engine decided to do with a message.
///
/// Rendering is left to the presentation layer; the engine is agnostic to
/// transport format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FlowDecision {
    /// Answer with text and (possibly empty) ranked candidates.
    AnswerDirectly {
        text: String,
        candidates: Vec<ScoredCandidate>,
    },
    /// The query was too vague; ask the user to narrow it down.
    AskClarifyingQuestion { text: String },
    /// Proactively suggest a complementary product.
    OfferFollowUp { text: String, product_id: String },
    /// The user picked a previously offered candidate.
    HandleSelection { text: String, product_id: String },
    /// The user asked where to buy a product.
    HandleLinkRequest { text: String, product_id: String },
}

impl FlowDecision {
    /// The user-facing text of this decision.
    pub fn text(&self) -> &str {
        match self {
            FlowDecision::AnswerDirectly { text, .. }
            | FlowDecision::AskClarifyingQuestion { text }
            | FlowDecision::OfferFollowUp { text, .. }
            | FlowDecision::HandleSelection { text, .. }
            | FlowDecision::HandleLinkRequest { text, .. } => text,
        }
    }
}

/// A flow decision plus side outputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowOutcome {
    pub decision: FlowDecision,
    /// Set when purchase intent crossed the configured threshold and a
    /// human consultation should be offered alongside the decision.
    pub offer_consultation: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_roundtrip() {
        for state in [
            ConversationState::Idle,
            ConversationState::Engaged,
            ConversationState::Clarifying,
            ConversationState::Selecting,
            ConversationState::Closing,
        ] {
            let s = state.to_string();
            let parsed: ConversationState = s.parse().unwrap();
            assert_eq!(state, parsed);
        }
    }

    #[test]
    fn test_state_default_is_idle() {
        assert_eq!(ConversationState::default(), ConversationState::Idle);
    }

    #[test]
    fn test_decision_serde_tagging() {
        let decision = FlowDecision::AskClarifyingQuestion {
            text: "Which area of health matters most to you?".to_string(),
        };
        let json = serde_json::to_string(&decision).unwrap();
        assert!(json.contains("\"type\":\"ask_clarifying_question\""));
    }

    #[test]
    fn test_decision_text_accessor() {
        let decision = FlowDecision::HandleSelection {
            text: "Great choice".to_string(),
            product_id: "Vitamin C".to_string(),
        };
        assert_eq!(decision.text(), "Great choice");
    }
}
