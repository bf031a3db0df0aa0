use actix_web::{web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use super::recommendations::rank_profile;
use super::{session_error, validation_error, AppState};
use crate::models::{CreateSessionRequest, SessionRecommendRequest, SessionResponse, StudentProfile};

/// Configure session routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/sessions", web::post().to(create_session))
        .service(
            web::resource("/sessions/{id}")
                .route(web::get().to(get_session))
                .route(web::delete().to(delete_session)),
        )
        .route("/sessions/{id}/profile", web::patch().to(update_profile))
        .route("/sessions/{id}/recommendations", web::post().to(recommend_for_session));
}

/// Open a session
///
/// POST /api/v1/sessions
async fn create_session(
    state: web::Data<AppState>,
    req: Option<web::Json<CreateSessionRequest>>,
) -> impl Responder {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let session = state.sessions.create(req.profile).await;
    tracing::info!("Opened session {}", session.id);

    HttpResponse::Created().json(SessionResponse::from(session))
}

async fn get_session(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.sessions.get(path.into_inner()).await {
        Ok(session) => HttpResponse::Ok().json(SessionResponse::from(session)),
        Err(e) => session_error(&e),
    }
}

/// Merge newly extracted preferences into the session profile
///
/// PATCH /api/v1/sessions/{id}/profile
///
/// Fields absent from the body keep their previous value.
async fn update_profile(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    patch: web::Json<StudentProfile>,
) -> impl Responder {
    if let Err(errors) = patch.validate() {
        return validation_error(errors);
    }

    match state.sessions.merge(path.into_inner(), patch.into_inner()).await {
        Ok(session) => HttpResponse::Ok().json(SessionResponse::from(session)),
        Err(e) => session_error(&e),
    }
}

async fn delete_session(state: web::Data<AppState>, path: web::Path<Uuid>) -> impl Responder {
    match state.sessions.delete(path.into_inner()).await {
        Ok(()) => HttpResponse::NoContent().finish(),
        Err(e) => session_error(&e),
    }
}

/// Rank the catalog for the profile accumulated in a session
///
/// POST /api/v1/sessions/{id}/recommendations
async fn recommend_for_session(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    req: Option<web::Json<SessionRecommendRequest>>,
) -> impl Responder {
    let req = req.map(web::Json::into_inner).unwrap_or_default();
    if let Err(errors) = req.validate() {
        return validation_error(errors);
    }

    let session = match state.sessions.get(path.into_inner()).await {
        Ok(session) => session,
        Err(e) => return session_error(&e),
    };

    rank_profile(&state, &session.profile, req.weights.as_ref(), req.limit).await
}
