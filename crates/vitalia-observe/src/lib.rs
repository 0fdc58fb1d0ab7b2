//! Observability for the recommendation engine: tracing subscriber setup
//! and the span attribute naming convention used across the crates.

pub mod convo_attrs;
pub mod tracing_setup;
