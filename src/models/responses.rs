use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::domain::{Program, ProgramSummary, ScoringWeights, StudentProfile};

/// Response for the recommendation endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendResponse {
    pub recommendations: Vec<ProgramSummary>,
    /// Least recommended programs, worst first
    pub bottom: Vec<ProgramSummary>,
    pub total_candidates: usize,
    pub weights: ScoringWeights,
}

/// Catalog listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgramsResponse {
    pub programs: Vec<Program>,
    pub total: usize,
}

/// Session state as seen by the conversational layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub session_id: Uuid,
    pub profile: StudentProfile,
    pub missing_fields: Vec<String>,
    pub complete: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub catalog_size: usize,
    pub embedding_model: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
