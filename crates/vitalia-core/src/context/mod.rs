//! Message understanding: intent classification, reference resolution,
//! and purchase-intent tracking.

pub mod analyzer;
pub mod matcher;

pub use analyzer::ContextAnalyzer;
