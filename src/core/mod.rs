// Core algorithm exports
pub mod distance;
pub mod error;
pub mod filters;
pub mod matcher;
pub mod scoring;
pub mod similarity;

pub use distance::{haversine_distance, lookup_place, origin_distance};
pub use error::RankingError;
pub use filters::{compliance_scores, CompliancePolicy, ComplianceScores};
pub use matcher::{RankingResult, Recommender};
pub use scoring::{budget_score, calculate_match_score, geography_fit, geography_score, GeographyConfig};
pub use similarity::{cosine_similarity, facet_similarities, facet_similarity, FacetSimilarity};
