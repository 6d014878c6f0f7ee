pub mod auth;
pub mod users;
pub mod services;
pub mod deployments;

use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::{TraceLayer, DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, DefaultOnFailure},
};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use common::{metrics::encode_metrics, types::Health};

use crate::auth::{require_auth, ServerState};
use crate::openapi::ApiDoc;

// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[utoipa::path(get, path = "/health", tag = "health", responses((status = 200, description = "OK", body = crate::openapi::HealthResponse)))]
pub async fn health() -> Json<Health> {
    Json(Health { status: "ok" })
}

pub async fn metrics() -> (StatusCode, String) {
    encode_metrics()
}

/// Build the full application router: public, authenticated and admin routes.
///
/// Admin-only handlers take an [`crate::auth::AdminUser`] extractor; everything
/// under `protected` requires a valid token.
pub fn build_router(state: ServerState, cors: CorsLayer, static_dir: Option<&str>) -> Router {
    let body_limit = usize::try_from(state.store.max_bytes())
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_OVERHEAD);

    // Public routes (health, metrics, docs, credentials)
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let protected = Router::new()
        .route("/api/auth/logout", get(auth::logout))
        .route("/api/auth/me", get(auth::me))
        .route("/api/users", get(users::list))
        .route("/api/users/:id", get(users::get).delete(users::delete))
        .route("/api/services", get(services::list).post(services::create))
        .route(
            "/api/services/:id",
            get(services::get).put(services::update).delete(services::delete),
        )
        .route("/api/deployments", get(deployments::list).post(deployments::create))
        .route("/api/deployments/with-file", post(deployments::create_with_file))
        .route("/api/deployments/service/:service_id", get(deployments::list_by_service))
        .route("/api/deployments/files/:file_id", get(deployments::download_file))
        .route("/api/deployments/:id", get(deployments::get).delete(deployments::delete))
        .route("/api/deployments/:id/files", post(deployments::upload_file))
        .layer(DefaultBodyLimit::max(body_limit))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let mut app = public.merge(protected);
    if let Some(dir) = static_dir {
        let index = std::path::Path::new(dir).join("index.html");
        app = app.fallback_service(ServeDir::new(dir).fallback(ServeFile::new(index)));
    }

    app.with_state(state)
        .layer(middleware::from_fn(crate::metrics::track_metrics))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // 每次请求创建 span，包含方法和路径等，日志级别为 INFO
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                // 响应返回时打点，包含状态码与耗时
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(DefaultOnFailure::new().level(Level::ERROR)),
        )
}
