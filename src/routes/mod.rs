// Route exports
pub mod recommendations;
pub mod sessions;

use actix_web::{http::StatusCode, web, HttpResponse};
use std::sync::Arc;

use crate::core::{RankingError, Recommender};
use crate::models::{EmbeddedCatalog, ErrorResponse};
use crate::services::{EmbeddingError, EmbeddingProvider, SessionError, SessionStore};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<EmbeddedCatalog>,
    pub embedder: Arc<dyn EmbeddingProvider>,
    pub sessions: SessionStore,
    pub recommender: Recommender,
    pub limits: RankingLimits,
}

/// How many programs a ranking response may list
#[derive(Debug, Clone, Copy)]
pub struct RankingLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl RankingLimits {
    /// Requested limit clamped to `[1, max_limit]`
    pub fn clamp(&self, requested: Option<u16>) -> usize {
        requested
            .map(usize::from)
            .unwrap_or(self.default_limit)
            .clamp(1, self.max_limit.max(1))
    }
}

impl Default for RankingLimits {
    fn default() -> Self {
        Self {
            default_limit: 3,
            max_limit: 50,
        }
    }
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .configure(recommendations::configure)
            .configure(sessions::configure),
    );
}

fn error_response(status: StatusCode, error: &str, message: impl ToString) -> HttpResponse {
    HttpResponse::build(status).json(ErrorResponse {
        error: error.to_string(),
        message: message.to_string(),
        status_code: status.as_u16(),
    })
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    error_response(StatusCode::BAD_REQUEST, "validation_failed", errors)
}

fn ranking_error(err: &RankingError) -> HttpResponse {
    match err {
        RankingError::InvalidWeights(_) => {
            error_response(StatusCode::BAD_REQUEST, "invalid_weights", err)
        }
        _ => {
            tracing::error!("Ranking failed: {}", err);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "ranking_failed", err)
        }
    }
}

fn embedding_error(err: &EmbeddingError) -> HttpResponse {
    tracing::error!("Embedding gateway failed: {}", err);
    error_response(StatusCode::BAD_GATEWAY, "embedding_unavailable", err)
}

fn session_error(err: &SessionError) -> HttpResponse {
    match err {
        SessionError::NotFound(_) => error_response(StatusCode::NOT_FOUND, "session_not_found", err),
    }
}
