//! Bounded, expiring per-user conversation memory.

pub mod store;
pub mod sweeper;

pub use store::MemoryStore;
pub use sweeper::spawn_sweeper;
