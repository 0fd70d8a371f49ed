use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{http::header, web, App, HttpServer};
use ai_pipeline::{GenerationService, Pipeline, RetryingPipeline};
use log::{error, info, warn};
use prep_llm::{GeminiProvider, GenerativeModel};
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::auth::TokenIssuer;
use crate::config::{AiConfig, AppConfig, JSON_BODY_LIMIT};
use crate::controllers::{
    ai_controller, auth_controller, health_controller, question_controller, session_controller,
    upload_controller,
};
use crate::middleware::{RateLimiters, TracingMiddleware};
use crate::services::uploads::UploadStore;
use crate::storage::{SqliteStore, Store, StoreError};

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub tokens: TokenIssuer,
    pub bcrypt_cost: u32,
    pub generator: Arc<dyn GenerationService>,
    pub uploads: UploadStore,
    /// Cancelled when the server stops; in-flight generations hold child tokens.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: &AppConfig, store: Arc<dyn Store>, model: Arc<dyn GenerativeModel>) -> Self {
        let pipeline = Pipeline::new(model, config.ai.pipeline_config());
        let generator: Arc<dyn GenerationService> =
            Arc::new(RetryingPipeline::new(pipeline, config.ai.retry_policy()));

        Self {
            store,
            tokens: TokenIssuer::new(&config.jwt_secret, config.jwt_expires_days),
            bcrypt_cost: config.bcrypt_cost,
            generator,
            uploads: UploadStore::new(config.upload_dir.clone()),
            shutdown: CancellationToken::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to initialize storage: {0}")]
    Storage(#[from] StoreError),

    #[error("failed to bind server: {0}")]
    Bind(std::io::Error),

    #[error("web server error: {0}")]
    Io(std::io::Error),
}

/// Registers every route. The general limiter, CORS and tracing wrap the
/// whole app in [`run`]; route-group limiters are applied here.
pub fn app_config(cfg: &mut web::ServiceConfig, limits: &RateLimiters) {
    cfg.app_data(web::PayloadConfig::new(JSON_BODY_LIMIT))
        .configure(health_controller::config)
        .configure(|cfg| auth_controller::config(cfg, limits))
        .configure(|cfg| upload_controller::config(cfg, limits))
        .configure(session_controller::config)
        .configure(question_controller::config)
        .configure(|cfg| ai_controller::config(cfg, limits))
        .default_service(web::to(health_controller::route_not_found));
}

fn cors(frontend_url: Option<&str>) -> Cors {
    let cors = Cors::default()
        .allowed_methods(["GET", "POST", "PUT", "DELETE"])
        .allowed_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600);

    match frontend_url {
        Some(origin) => cors.allowed_origin(origin),
        // credentials rule out the wildcard, so echo whatever origin asked
        None => cors.allowed_origin_fn(|_, _| true),
    }
}

fn gemini_model(ai: &AiConfig) -> Arc<dyn GenerativeModel> {
    if ai.api_key.is_empty() {
        warn!("GEMINI_API_KEY is not set; AI endpoints will fail");
    }
    let mut provider = GeminiProvider::new(ai.api_key.clone());
    if let Some(base_url) = &ai.base_url {
        provider = provider.with_base_url(base_url.clone());
    }
    Arc::new(provider)
}

pub async fn run(config: AppConfig) -> Result<(), ServerError> {
    info!("Starting web service...");

    let store: Arc<dyn Store> = Arc::new(SqliteStore::new(&config.database_path));
    store.init().await?;
    info!("Database ready at {}", config.database_path.display());

    let app_state = web::Data::new(AppState::new(
        &config,
        store,
        gemini_model(&config.ai),
    ));
    let shutdown = app_state.shutdown.clone();
    let limiters = RateLimiters::new(&config.rate_limits());
    let frontend_url = config.frontend_url.clone();

    let mut server = HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(limiters.general.clone())
            .wrap(cors(frontend_url.as_deref()))
            .wrap(TracingMiddleware)
            .configure(|cfg| app_config(cfg, &limiters))
    });
    if let Some(workers) = config.workers {
        server = server.workers(workers);
    }

    let server = server
        .bind((config.host.as_str(), config.port))
        .map_err(ServerError::Bind)?
        .run();

    info!(
        "Starting web service on http://{}:{} ({:?})",
        config.host, config.port, config.environment
    );

    let result = server.await;
    shutdown.cancel();
    if let Err(e) = &result {
        error!("Web server error: {}", e);
    }
    result.map_err(ServerError::Io)
}
