//! Candidate scoring and the product synergy catalog.

pub mod scorer;
pub mod synergy;

pub use scorer::RecommendationScorer;
pub use synergy::SynergyTable;
