use actix_web::{web, HttpResponse, Responder};
use std::time::Instant;
use validator::Validate;

use super::{embedding_error, ranking_error, validation_error, AppState};
use crate::models::{
    HealthResponse, ProgramsResponse, RecommendRequest, RecommendResponse, ScoringWeights,
    StudentProfile, WeightsInput,
};
use crate::services::embed_profile;

/// Configure catalog and ranking routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/programs", web::get().to(list_programs))
        .route("/recommendations", web::post().to(recommend));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        catalog_size: state.catalog.len(),
        embedding_model: state.embedder.model().to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// List the catalog
///
/// GET /api/v1/programs
async fn list_programs(state: web::Data<AppState>) -> impl Responder {
    let programs = state.catalog.programs().to_vec();
    HttpResponse::Ok().json(ProgramsResponse {
        total: programs.len(),
        programs,
    })
}

/// Rank the catalog for a profile
///
/// POST /api/v1/recommendations
///
/// Request body:
/// ```json
/// {
///   "profile": { "academic_interest": "...", "budget": 8000, "origin": "Roma" },
///   "weights": [0.25, 0.15, 0.10, 0.15, 0.15, 0.20],
///   "limit": 3
/// }
/// ```
async fn recommend(state: web::Data<AppState>, req: web::Json<RecommendRequest>) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for recommendation request: {}", errors);
        return validation_error(errors);
    }

    let RecommendRequest {
        profile,
        weights,
        limit,
    } = req.into_inner();

    rank_profile(&state, &profile, weights.as_ref(), limit).await
}

/// Embed a profile, rank the catalog against it and project the result
///
/// Shared by the stateless and the session-backed endpoints.
pub(crate) async fn rank_profile(
    state: &AppState,
    profile: &StudentProfile,
    weights: Option<&WeightsInput>,
    limit: Option<u16>,
) -> HttpResponse {
    let weights_override: Option<ScoringWeights> = match weights.map(WeightsInput::resolve).transpose() {
        Ok(weights) => weights,
        Err(e) => return ranking_error(&e),
    };

    let started = Instant::now();
    let embeddings = match embed_profile(state.embedder.as_ref(), profile, state.catalog.dimension()).await {
        Ok(embeddings) => embeddings,
        Err(e) => return embedding_error(&e),
    };
    let embedded_in = started.elapsed();

    let started = Instant::now();
    let result = match state
        .recommender
        .rank(profile, &embeddings, &state.catalog, weights_override.as_ref())
    {
        Ok(result) => result,
        Err(e) => return ranking_error(&e),
    };
    let ranked_in = started.elapsed();

    tracing::debug!(
        "Profile embedded in {:?}, catalog ranked in {:?}",
        embedded_in,
        ranked_in
    );

    let limit = state.limits.clamp(limit);
    let response = RecommendResponse {
        recommendations: result.top_summaries(limit, profile),
        bottom: result.bottom_summaries(limit, profile),
        total_candidates: result.total_candidates(),
        weights: result.weights,
    };

    tracing::info!(
        "Ranked {} candidates, top program: {:?}",
        response.total_candidates,
        response.recommendations.first().map(|s| s.program.id)
    );

    HttpResponse::Ok().json(response)
}
