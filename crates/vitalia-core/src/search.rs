//! SearchProvider trait definition.
//!
//! The catalog/search collaborator is out of scope for the engine; this
//! trait is the contract it must satisfy. Uses native async fn in traits
//! (RPITIT, Rust 2024 edition).

use vitalia_types::context::Intent;
use vitalia_types::error::SearchError;
use vitalia_types::recommend::Candidate;

/// Trait for the external catalog/search backend.
///
/// May fail or time out; the flow controller wraps calls in a bounded
/// timeout and falls back to the local offline candidate list. Retries
/// belong to the implementation, never to the engine.
pub trait SearchProvider: Send + Sync {
    /// Search the catalog for candidates matching a query.
    fn search(
        &self,
        query: &str,
        intent: Intent,
    ) -> impl std::future::Future<Output = Result<Vec<Candidate>, SearchError>> + Send;
}
