//! UniMatch - recommendation engine for university programs
//!
//! Ranks every program of a fixed catalog against a student profile by
//! combining semantic similarity of three text facets with budget,
//! geography and boolean compliance scores.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{cosine_similarity, haversine_distance, RankingError, RankingResult, Recommender};
pub use crate::models::{
    EmbeddedCatalog, FacetEmbeddings, Program, ProgramSummary, Recommendation, ScoreBreakdown,
    ScoringWeights, StudentProfile, WeightsInput,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        // Roma -> Milano is roughly 477 km
        let distance = haversine_distance(41.9028, 12.4964, 45.4642, 9.1900);
        assert!((distance - 477.0).abs() < 5.0);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]), 1.0);
    }
}
