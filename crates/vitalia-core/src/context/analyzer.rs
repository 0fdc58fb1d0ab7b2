//! Turns a raw message plus session history into a `ContextSignal`.

use tracing::debug;

use vitalia_types::context::{ContextSignal, Intent};
use vitalia_types::session::ConversationSession;

use super::matcher;

/// Weight of the previous purchase-intent score when folding in a new turn.
const INTENT_DECAY: f64 = 0.9;
/// Added when the message contains an explicit purchase phrase.
const PURCHASE_PHRASE_BOOST: f64 = 0.15;
/// Added when the resolved product has come up repeatedly.
const REPETITION_BOOST: f64 = 0.1;

/// Stateless analysis over a message and a session snapshot.
///
/// The analyzer never mutates the session; the flow controller decides
/// what to write back after acting on the signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContextAnalyzer;

impl ContextAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, message: &str, session: &ConversationSession) -> ContextSignal {
        let intent = matcher::classify(message);
        let normalized = matcher::normalize(message);

        let referenced_product = self.resolve_reference(intent, message, session);
        let purchase_intent_score =
            self.purchase_score(intent, message, referenced_product.as_deref(), session);

        let signal = ContextSignal {
            intent,
            referenced_product,
            purchase_intent_score,
            ordinal: matcher::ordinal_of(&normalized),
            topics: matcher::detect_topics(message),
        };
        debug!(
            intent = %signal.intent,
            referenced = signal.referenced_product.as_deref().unwrap_or("-"),
            score = signal.purchase_intent_score,
            "analyzed message"
        );
        signal
    }

    /// Resolve "it"/"that" and implicit references to a concrete product.
    ///
    /// Resolution is most-recent-wins: the candidate is the product named
    /// latest in the history. When two products appear in one turn this
    /// can pick the wrong one; the clarifying-question path covers for it.
    fn resolve_reference(
        &self,
        intent: Intent,
        message: &str,
        session: &ConversationSession,
    ) -> Option<String> {
        let implicit = matches!(
            intent,
            Intent::SynergyRequest | Intent::LinkRequest | Intent::Selection | Intent::Clarification
        );
        if implicit || matcher::has_referential(message) {
            return session.last_mentioned().map(str::to_string);
        }
        None
    }

    /// Fold this turn into the running purchase-intent score.
    ///
    /// The previous score decays each turn, so intent fades unless the
    /// user keeps signalling it. Result is clamped to [0, 1].
    fn purchase_score(
        &self,
        intent: Intent,
        message: &str,
        referenced: Option<&str>,
        session: &ConversationSession,
    ) -> f64 {
        let intent_boost = match intent {
            Intent::LinkRequest => 0.3,
            Intent::Selection => 0.2,
            Intent::ProductQuery | Intent::SynergyRequest => 0.05,
            Intent::Greeting | Intent::Smalltalk | Intent::Clarification => 0.0,
        };

        let mut score = session.purchase_intent * INTENT_DECAY + intent_boost;
        if matcher::purchase_signal_count(message) > 0 {
            score += PURCHASE_PHRASE_BOOST;
        }
        if let Some(product) = referenced {
            if session.mention_count(product) >= 2 {
                score += REPETITION_BOOST;
            }
        }
        score.clamp(0.0, 1.0)
    }
}
