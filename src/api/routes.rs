use axum::{
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;

use super::handlers::{create_user, get_user, health, search_users, session};
use super::middleware::{handle_errors, logging_middleware, require_fields, Bucket, RequestGuard};
use super::openapi::ApiDoc;
use crate::errors::{AppError, HandlerError};
use crate::metrics;
use crate::responder::ErrorResponder;

pub fn create_router(responder: Arc<ErrorResponder>) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health).fallback(not_found))
        // Metrics endpoint (Prometheus)
        .route("/metrics", get(metrics::metrics_handler).fallback(not_found))
        // OpenAPI documentation
        .route(
            "/api-docs/openapi.json",
            get(openapi_json).fallback(not_found),
        )
        // User endpoints, each guarded by its required fields. Guards are
        // route layers so an unmatched method skips them and reaches the
        // fallback instead.
        .route(
            "/users",
            post(create_user)
                .fallback(not_found)
                .route_layer(middleware::from_fn_with_state(
                    RequestGuard::new(Bucket::Body, ["name", "email", "address.ln1"]),
                    require_fields,
                )),
        )
        .route(
            "/users/search",
            get(search_users)
                .fallback(not_found)
                .route_layer(middleware::from_fn_with_state(
                    RequestGuard::new(Bucket::Query, ["q", "page"]),
                    require_fields,
                )),
        )
        .route(
            "/users/:id",
            get(get_user)
                .fallback(not_found)
                .route_layer(middleware::from_fn_with_state(
                    RequestGuard::new(Bucket::Param, ["id"]),
                    require_fields,
                )),
        )
        .route("/session", get(session).fallback(not_found))
        .fallback(not_found)
        // Order matters: errors -> logging -> metrics -> cors -> trace.
        // Logging must wrap the error handler so the request id reaches it.
        .layer(middleware::from_fn_with_state(responder, handle_errors))
        .layer(middleware::from_fn(logging_middleware))
        .layer(middleware::from_fn(metrics::middleware::track_metrics))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Unknown paths and unsupported methods on known paths both answer with
/// a `NotFound` through the responder.
async fn not_found() -> HandlerError {
    AppError::not_found().into()
}
