//! Warehouse-suitability scoring for qcsite.
//!
//! [`score`] turns the operator's snapshot and two competitor snapshots into
//! a 0–100 [`SuitabilityResult`]. [`RecommendationTier`] is the single
//! score→tier ladder used everywhere a recommendation is derived, and a
//! [`Recommender`] turns a result into display text.

pub mod error;
pub mod recommender;
pub mod scorer;
pub mod tier;
pub mod types;

pub use error::RecommenderError;
pub use recommender::{HeuristicRecommender, LlmRecommender, Recommender};
pub use scorer::score;
pub use tier::RecommendationTier;
pub use types::{ScoreFactors, SuitabilityResult};
