//! Shared domain types for the Vitalia recommendation engine.
//!
//! This crate contains the core domain types used across the engine:
//! conversation sessions and turns, context signals, scored candidates,
//! flow decisions, analytics events, configuration, and error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod config;
pub mod context;
pub mod error;
pub mod event;
pub mod flow;
pub mod recommend;
pub mod session;
