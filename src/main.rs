use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use uni_match::config::{LoggingSettings, Settings};
use uni_match::core::Recommender;
use uni_match::models::{EmbeddedCatalog, ScoringWeights};
use uni_match::routes::{self, AppState, RankingLimits};
use uni_match::services::{embed_catalog, load_catalog, EmbeddingProvider, HttpEmbeddingClient, SessionStore};

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn status_code(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST)
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// Handle malformed path segments such as a session id that is not a UUID
pub fn handle_path_error(err: error::PathError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_path".to_string(),
        message: format!("Invalid path: {}", err),
        status_code: 400,
    }
    .into()
}

fn init_tracing(logging: &LoggingSettings) {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            init_tracing(&LoggingSettings::default());
            return Err(startup_error("Failed to load configuration", e));
        }
    };

    init_tracing(&settings.logging);
    info!("Starting UniMatch recommendation service...");

    let weights = ScoringWeights::from(settings.scoring.weights);
    let recommender = Recommender::new(weights, settings.scoring.geography, settings.scoring.compliance)
        .map_err(|e| startup_error("Invalid scoring weights", e))?;

    info!("Recommender initialized with weights: {:?}", recommender.weights());

    let programs = load_catalog(&settings.catalog.path)
        .map_err(|e| startup_error("Failed to load catalog", e))?;

    let embedder = HttpEmbeddingClient::new(
        settings.embedding.base_url.clone(),
        settings.embedding.model.clone(),
        settings.embedding.api_key.clone(),
        settings.embedding.timeout(),
    )
    .map_err(|e| startup_error("Failed to build embedding client", e))?;
    let embedder: Arc<dyn EmbeddingProvider> = Arc::new(embedder);

    info!(
        "Embedding {} programs with {} (concurrency {})",
        programs.len(),
        embedder.model(),
        settings.embedding.concurrency
    );

    let embeddings = embed_catalog(embedder.as_ref(), &programs, settings.embedding.concurrency)
        .await
        .map_err(|e| startup_error("Failed to embed catalog", e))?;

    let catalog = EmbeddedCatalog::new(programs, embeddings)
        .map_err(|e| startup_error("Invalid embedded catalog", e))?;

    info!(
        "Catalog ready: {} programs, embedding dimension {}",
        catalog.len(),
        catalog.dimension()
    );

    let sessions = SessionStore::new(settings.session.max_sessions, settings.session.ttl());
    info!(
        "Session store initialized (max: {} sessions, TTL: {}s)",
        settings.session.max_sessions, settings.session.ttl_secs
    );

    let app_state = AppState {
        catalog: Arc::new(catalog),
        embedder,
        sessions,
        recommender,
        limits: RankingLimits::from(&settings.ranking),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
            .app_data(web::PathConfig::default().error_handler(handle_path_error))
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
