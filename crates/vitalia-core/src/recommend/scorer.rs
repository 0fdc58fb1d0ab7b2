//! Weighted candidate scoring.
//!
//! Each factor is normalized to [0, 1] before weighting, the weights sum
//! to 1, and ties break by product id ascending, so a given session and
//! candidate set always produce the same ranking.

use tracing::debug;

use vitalia_types::config::ScoringConfig;
use vitalia_types::context::ContextSignal;
use vitalia_types::error::ConfigError;
use vitalia_types::recommend::{Candidate, ScoreBreakdown, ScoredCandidate};
use vitalia_types::session::ConversationSession;

use super::synergy::SynergyTable;

pub struct RecommendationScorer {
    config: ScoringConfig,
    synergy: SynergyTable,
}

impl RecommendationScorer {
    pub fn new(config: ScoringConfig, synergy: SynergyTable) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config, synergy })
    }

    pub fn synergy(&self) -> &SynergyTable {
        &self.synergy
    }

    /// Score and rank candidates against the session and context signal.
    ///
    /// Returns at most `max_candidates`, best first.
    pub fn score(
        &self,
        candidates: Vec<Candidate>,
        session: &ConversationSession,
        signal: &ContextSignal,
    ) -> Vec<ScoredCandidate> {
        let discussed = session.entity_set();

        let mut scored: Vec<ScoredCandidate> = candidates
            .into_iter()
            .map(|candidate| {
                let prior = if discussed.contains(candidate.product_id.as_str()) {
                    1.0
                } else {
                    0.0
                };
                let synergy = if self.complements_context(&candidate.product_id, session, signal) {
                    1.0
                } else {
                    0.0
                };
                // Purchase intent only lifts products the user has engaged
                // with, so a hot session does not inflate strangers.
                let engaged = prior > 0.0
                    || signal.referenced_product.as_deref() == Some(candidate.product_id.as_str());
                let stage = if engaged {
                    signal.purchase_intent_score
                } else {
                    0.0
                };

                let breakdown = ScoreBreakdown {
                    relevance: self.config.w_relevance * candidate.relevance.clamp(0.0, 1.0),
                    prior_discussion: self.config.w_prior_discussion * prior,
                    synergy: self.config.w_synergy * synergy,
                    stage: self.config.w_stage * stage,
                };
                ScoredCandidate {
                    product_id: candidate.product_id,
                    score: breakdown.total(),
                    breakdown,
                }
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.product_id.cmp(&b.product_id))
        });
        scored.truncate(self.config.max_candidates);
        debug!(returned = scored.len(), "scored candidates");
        scored
    }

    /// Whether a candidate complements a product the conversation is about.
    fn complements_context(
        &self,
        product_id: &str,
        session: &ConversationSession,
        signal: &ContextSignal,
    ) -> bool {
        if let Some(referenced) = signal.referenced_product.as_deref() {
            if self.synergy.is_complement(product_id, referenced) {
                return true;
            }
        }
        session
            .entity_set()
            .iter()
            .any(|discussed| self.synergy.is_complement(product_id, discussed))
    }
}
