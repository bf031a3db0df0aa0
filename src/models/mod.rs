// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Coordinates, EmbeddedCatalog, FacetEmbeddings, Program, ProgramSummary, Recommendation,
    ScoreBreakdown, ScoringWeights, StudentProfile, WeightsInput,
};
pub use requests::{CreateSessionRequest, RecommendRequest, SessionRecommendRequest};
pub use responses::{
    ErrorResponse, HealthResponse, ProgramsResponse, RecommendResponse, SessionResponse,
};
