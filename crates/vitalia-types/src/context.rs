//! Per-message derived context: intent and cross-turn reference signals.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Closed set of message intents.
///
/// Classification is an ordered first-match-wins rule list over exact
/// vocabularies and referential patterns; `ProductQuery` is the fallback
/// when nothing else matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    ProductQuery,
    Clarification,
    Selection,
    LinkRequest,
    SynergyRequest,
    Smalltalk,
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Intent::Greeting => "greeting",
            Intent::ProductQuery => "product_query",
            Intent::Clarification => "clarification",
            Intent::Selection => "selection",
            Intent::LinkRequest => "link_request",
            Intent::SynergyRequest => "synergy_request",
            Intent::Smalltalk => "smalltalk",
        };
        write!(f, "{s}")
    }
}

impl FromStr for Intent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "greeting" => Ok(Intent::Greeting),
            "product_query" => Ok(Intent::ProductQuery),
            "clarification" => Ok(Intent::Clarification),
            "selection" => Ok(Intent::Selection),
            "link_request" => Ok(Intent::LinkRequest),
            "synergy_request" => Ok(Intent::SynergyRequest),
            "smalltalk" => Ok(Intent::Smalltalk),
            other => Err(format!("invalid intent: '{other}'")),
        }
    }
}

/// Signals derived from a single message plus the session snapshot.
///
/// `referenced_product` is an identifier-only back-reference resolved by
/// scanning recent turns (most-recent-wins); it is never an owning pointer
/// into the history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextSignal {
    pub intent: Intent,
    pub referenced_product: Option<String>,
    /// Readiness-to-buy estimate for this message, 0.0..=1.0.
    pub purchase_intent_score: f64,
    /// Parsed ordinal selector ("1", "the second one"), if present.
    pub ordinal: Option<usize>,
    /// Health topics detected in the message text.
    pub topics: Vec<String>,
}
