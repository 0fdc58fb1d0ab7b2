//! Engine configuration.
//!
//! `EngineConfig` is the recognized configuration surface of the engine,
//! deserializable from TOML. All fields have defaults; `validate()` must be
//! called at startup and is fatal on failure.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Top-level configuration for the recommendation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Sessions idle longer than this many hours are swept.
    #[serde(default = "default_max_memory_hours")]
    pub max_memory_hours: u64,

    /// FIFO bound on turns retained per user.
    #[serde(default = "default_max_messages_per_user")]
    pub max_messages_per_user: usize,

    /// Interval between periodic sweeps, in seconds.
    #[serde(default = "default_cleanup_interval_secs")]
    pub cleanup_interval_secs: u64,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub scoring: ScoringConfig,

    /// Queries with fewer words than this are treated as too vague to
    /// answer directly.
    #[serde(default = "default_specificity_threshold")]
    pub specificity_threshold: usize,

    /// Purchase-intent score above which a consultation is offered.
    #[serde(default = "default_purchase_intent_threshold")]
    pub purchase_intent_threshold: f64,

    /// Bounded timeout for the external search call, in milliseconds.
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    /// Bounded timeout for the external LLM call, in milliseconds.
    #[serde(default = "default_llm_timeout_ms")]
    pub llm_timeout_ms: u64,
}

/// Cache sizing and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    #[serde(default = "default_cache_ttl_secs")]
    pub default_ttl_secs: u64,
}

/// Scoring weights and output cap.
///
/// The four weights must sum to 1.0; `validate()` rejects anything else
/// rather than normalizing, since silent normalization would change ranking
/// semantics without a trace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    #[serde(default = "default_w_relevance")]
    pub w_relevance: f64,

    #[serde(default = "default_w_prior_discussion")]
    pub w_prior_discussion: f64,

    #[serde(default = "default_w_synergy")]
    pub w_synergy: f64,

    #[serde(default = "default_w_stage")]
    pub w_stage: f64,

    #[serde(default = "default_max_candidates")]
    pub max_candidates: usize,
}

fn default_max_memory_hours() -> u64 {
    1
}

fn default_max_messages_per_user() -> usize {
    100
}

fn default_cleanup_interval_secs() -> u64 {
    600
}

fn default_cache_capacity() -> usize {
    100
}

fn default_cache_ttl_secs() -> u64 {
    3600
}

fn default_w_relevance() -> f64 {
    0.3
}

fn default_w_prior_discussion() -> f64 {
    0.4
}

fn default_w_synergy() -> f64 {
    0.2
}

fn default_w_stage() -> f64 {
    0.1
}

fn default_max_candidates() -> usize {
    8
}

fn default_specificity_threshold() -> usize {
    3
}

fn default_purchase_intent_threshold() -> f64 {
    0.7
}

fn default_search_timeout_ms() -> u64 {
    2000
}

fn default_llm_timeout_ms() -> u64 {
    5000
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_memory_hours: default_max_memory_hours(),
            max_messages_per_user: default_max_messages_per_user(),
            cleanup_interval_secs: default_cleanup_interval_secs(),
            cache: CacheConfig::default(),
            scoring: ScoringConfig::default(),
            specificity_threshold: default_specificity_threshold(),
            purchase_intent_threshold: default_purchase_intent_threshold(),
            search_timeout_ms: default_search_timeout_ms(),
            llm_timeout_ms: default_llm_timeout_ms(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            default_ttl_secs: default_cache_ttl_secs(),
        }
    }
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            w_relevance: default_w_relevance(),
            w_prior_discussion: default_w_prior_discussion(),
            w_synergy: default_w_synergy(),
            w_stage: default_w_stage(),
            max_candidates: default_max_candidates(),
        }
    }
}

impl ScoringConfig {
    /// Reject weight sets that do not sum to 1.0 (within float tolerance)
    /// and non-positive output caps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.w_relevance + self.w_prior_discussion + self.w_synergy + self.w_stage;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(ConfigError::WeightSum { sum });
        }
        for (field, value) in [
            ("scoring.w_relevance", self.w_relevance),
            ("scoring.w_prior_discussion", self.w_prior_discussion),
            ("scoring.w_synergy", self.w_synergy),
            ("scoring.w_stage", self.w_stage),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfRange { field, value });
            }
        }
        if self.max_candidates == 0 {
            return Err(ConfigError::NonPositive {
                field: "scoring.max_candidates",
            });
        }
        Ok(())
    }
}

impl EngineConfig {
    /// Validate the whole configuration. Fatal at startup on error.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("max_memory_hours", self.max_memory_hours),
            ("cleanup_interval_secs", self.cleanup_interval_secs),
            ("cache.default_ttl_secs", self.cache.default_ttl_secs),
            ("search_timeout_ms", self.search_timeout_ms),
            ("llm_timeout_ms", self.llm_timeout_ms),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositive { field });
            }
        }
        for (field, value) in [
            ("max_messages_per_user", self.max_messages_per_user),
            ("cache.capacity", self.cache.capacity),
            ("specificity_threshold", self.specificity_threshold),
        ] {
            if value == 0 {
                return Err(ConfigError::NonPositive { field });
            }
        }
        if !(0.0..=1.0).contains(&self.purchase_intent_threshold) {
            return Err(ConfigError::OutOfRange {
                field: "purchase_intent_threshold",
                value: self.purchase_intent_threshold,
            });
        }
        self.scoring.validate()
    }
}
