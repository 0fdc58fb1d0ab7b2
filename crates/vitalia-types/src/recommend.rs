//! Candidate and scored-candidate types for the recommendation scorer.

use serde::{Deserialize, Serialize};

/// A product candidate as returned by the search collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub product_id: String,
    /// Relevance to the query, 0.0..=1.0, assigned by the search provider.
    pub relevance: f64,
}

impl Candidate {
    pub fn new(product_id: impl Into<String>, relevance: f64) -> Self {
        Self {
            product_id: product_id.into(),
            relevance,
        }
    }
}

/// Weighted contributions making up a candidate's composite score.
///
/// Each field already carries its configured weight, so `total()` is a
/// plain sum. Keeping the breakdown visible lets the presentation layer
/// explain why a product was suggested.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub relevance: f64,
    pub prior_discussion: f64,
    pub synergy: f64,
    pub stage: f64,
}

impl ScoreBreakdown {
    pub fn total(&self) -> f64 {
        self.relevance + self.prior_discussion + self.synergy + self.stage
    }
}

/// A product with its composite score, ready for ranking.
///
/// Ordering is descending by score with ties broken by product id
/// ascending, so repeated calls over the same inputs rank identically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    pub product_id: String,
    pub score: f64,
    pub breakdown: ScoreBreakdown,
}
