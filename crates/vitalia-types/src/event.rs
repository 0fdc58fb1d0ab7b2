//! Analytics events consumed by the reporting sink.
//!
//! These are fire-and-forget: the engine emits them and never waits for a
//! response. Each event carries a time-sortable v7 UUID and a timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Derived engagement event for the analytics collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngagementEvent {
    /// A ranked answer was served.
    RecommendationServed {
        id: Uuid,
        user_id: String,
        candidate_count: usize,
        at: DateTime<Utc>,
    },
    /// The user picked one of the offered candidates.
    ProductSelected {
        id: Uuid,
        user_id: String,
        product_id: String,
        at: DateTime<Utc>,
    },
    /// The user asked where to buy a product.
    LinkRequested {
        id: Uuid,
        user_id: String,
        product_id: String,
        purchase_intent: f64,
        at: DateTime<Utc>,
    },
    /// Purchase intent crossed the threshold; a consultation was offered.
    ConsultationOffered {
        id: Uuid,
        user_id: String,
        purchase_intent: f64,
        at: DateTime<Utc>,
    },
}

impl EngagementEvent {
    pub fn recommendation_served(user_id: impl Into<String>, candidate_count: usize) -> Self {
        Self::RecommendationServed {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            candidate_count,
            at: Utc::now(),
        }
    }

    pub fn product_selected(user_id: impl Into<String>, product_id: impl Into<String>) -> Self {
        Self::ProductSelected {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            product_id: product_id.into(),
            at: Utc::now(),
        }
    }

    pub fn link_requested(
        user_id: impl Into<String>,
        product_id: impl Into<String>,
        purchase_intent: f64,
    ) -> Self {
        Self::LinkRequested {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            product_id: product_id.into(),
            purchase_intent,
            at: Utc::now(),
        }
    }

    pub fn consultation_offered(user_id: impl Into<String>, purchase_intent: f64) -> Self {
        Self::ConsultationOffered {
            id: Uuid::now_v7(),
            user_id: user_id.into(),
            purchase_intent,
            at: Utc::now(),
        }
    }

    /// The user this event belongs to.
    pub fn user_id(&self) -> &str {
        match self {
            EngagementEvent::RecommendationServed { user_id, .. }
            | EngagementEvent::ProductSelected { user_id, .. }
            | EngagementEvent::LinkRequested { user_id, .. }
            | EngagementEvent::ConsultationOffered { user_id, .. } => user_id,
        }
    }
}
