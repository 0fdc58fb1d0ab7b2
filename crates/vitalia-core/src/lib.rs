//! Conversational context and recommendation engine.
//!
//! This crate holds the engine proper -- memory store, cache layer, context
//! analyzer, recommendation scorer, and the flow controller orchestrating
//! them -- plus the "ports": trait definitions for the external search, LLM,
//! and analytics collaborators. Implementations of those traits live with
//! the transport/persistence layers, never here. The crate depends only on
//! `vitalia-types` and runtime crates.

pub mod analytics;
pub mod cache;
pub mod context;
pub mod flow;
pub mod llm;
pub mod memory;
pub mod recommend;
pub mod search;
