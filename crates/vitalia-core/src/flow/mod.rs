//! Dialogue orchestration: the per-session state machine and response
//! templates used when the language model is unavailable.

pub mod controller;
pub mod responses;

pub use controller::FlowController;
