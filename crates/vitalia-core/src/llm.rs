//! LlmClient trait definition.
//!
//! The language-model collaborator phrases user-facing text. It may fail or
//! time out; the flow controller falls back to canned templates and never
//! propagates the failure to the end user.

use vitalia_types::error::GenerateError;

/// Trait for the external language-model backend.
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
pub trait LlmClient: Send + Sync {
    /// Generate text for a prompt, given conversational context.
    fn generate(
        &self,
        prompt: &str,
        context: &str,
    ) -> impl std::future::Future<Output = Result<String, GenerateError>> + Send;
}
