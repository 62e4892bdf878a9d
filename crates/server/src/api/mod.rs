pub mod analyses;
pub mod analyze;
pub mod health;
pub mod images;
pub mod openapi;
pub mod schemas;
pub mod stream;
pub mod trace_context;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use medverify_blob::ImageStore;
use medverify_pipeline::{AnalysisPipeline, HistoryService};

use crate::auth::{AuthLayer, JwtVerifier};

use self::openapi::ApiDoc;

/// Number of maximum-size images one multipart request may carry.
pub const MAX_FILES_PER_REQUEST: usize = 16;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Upload, analysis and persistence.
    pub pipeline: Arc<AnalysisPipeline>,
    /// Owner-scoped record access.
    pub history: HistoryService,
    /// Image store backing `GET /v1/images/{id}`.
    pub images: Arc<dyn ImageStore>,
    /// Token verifier (None when auth is disabled).
    pub auth: Option<Arc<JwtVerifier>>,
    /// Largest accepted request body, in bytes.
    pub body_limit: usize,
}

impl AppState {
    /// Build state from a pipeline, sharing its stores.
    pub fn new(
        pipeline: Arc<AnalysisPipeline>,
        auth: Option<Arc<JwtVerifier>>,
        max_upload_bytes: u64,
    ) -> Self {
        let per_file = usize::try_from(max_upload_bytes).unwrap_or(usize::MAX);
        Self {
            history: HistoryService::new(Arc::clone(pipeline.records())),
            images: Arc::clone(pipeline.images()),
            pipeline,
            auth,
            body_limit: per_file.saturating_mul(MAX_FILES_PER_REQUEST),
        }
    }

    /// Whether bearer tokens are required.
    pub fn auth_enabled(&self) -> bool {
        self.auth.is_some()
    }
}

/// Build the Axum router with all API routes, middleware, and Swagger UI.
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route("/v1/images/{id}", get(images::get_image));

    let protected = Router::new()
        .route("/analyze-medicine", post(analyze::analyze_medicine))
        .route(
            "/v1/analyses",
            get(analyses::list_analyses).post(analyses::create_analyses),
        )
        .route("/v1/analyses/stats", get(analyses::analysis_stats))
        .route("/v1/analyses/events", get(stream::stream))
        .route(
            "/v1/analyses/{id}",
            get(analyses::get_analysis).delete(analyses::delete_analysis),
        )
        .layer(AuthLayer::new(state.auth.clone()));

    Router::new()
        .merge(public)
        .merge(protected)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(state.body_limit))
        .with_state(state)
        .layer(middleware::from_fn(trace_context::propagate_trace_context))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}
