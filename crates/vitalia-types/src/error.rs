use thiserror::Error;

/// Configuration validation errors. Fatal at startup -- the engine never
/// silently normalizes a configuration in a way that would change ranking
/// semantics.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("scoring weights must sum to 1.0, got {sum:.4}")]
    WeightSum { sum: f64 },

    #[error("{field} must be positive")]
    NonPositive { field: &'static str },

    #[error("{field} must be within 0.0..=1.0, got {value}")]
    OutOfRange { field: &'static str, value: f64 },
}

/// Errors from the external catalog/search collaborator.
///
/// Always recovered locally via the offline candidate list; never surfaced
/// to the end user as a raw error.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search timed out after {0} ms")]
    Timeout(u64),

    #[error("search provider error: {0}")]
    Provider(String),
}

/// Errors from the external language-model collaborator.
///
/// Recovered with a canned response; never surfaced verbatim.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("generation timed out after {0} ms")]
    Timeout(u64),

    #[error("language model error: {0}")]
    Provider(String),
}
