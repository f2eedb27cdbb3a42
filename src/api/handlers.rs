use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Instant;
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use super::middleware::{BodyPaths, QueryPaths};
use crate::errors::{AppError, HandlerError};

lazy_static::lazy_static! {
    static ref START_TIME: Instant = Instant::now();
}

/// Account payload for user creation
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewUser {
    /// Display name
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    /// Contact email
    #[validate(email)]
    pub email: String,
    /// Postal address (`address.ln1` is required)
    pub address: Address,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct Address {
    pub ln1: String,
    #[serde(default)]
    pub ln2: Option<String>,
}

/// Created user
#[derive(Debug, Serialize, ToSchema)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub address: Address,
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service is healthy", body = serde_json::Value)
    )
)]
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "http-error-kit",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_seconds": START_TIME.elapsed().as_secs(),
    }))
}

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = NewUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing fields or failed validation", body = ErrorBody)
    )
)]
pub async fn create_user(
    Extension(BodyPaths(paths)): Extension<BodyPaths>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> Result<impl IntoResponse, HandlerError> {
    let Json(user) =
        payload.map_err(|rejection| AppError::bad_request().with_message(rejection.body_text()))?;
    user.validate()?;

    info!(
        name = %user.name,
        address_ln1 = ?paths.get("address.ln1"),
        "Creating user"
    );

    let created = UserResponse {
        id: uuid::Uuid::new_v4().to_string(),
        name: user.name,
        email: user.email,
        address: user.address,
    };

    Ok((StatusCode::CREATED, Json(created)))
}

/// Get a user by id
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "User found", body = serde_json::Value),
        (status = 404, description = "User not found", body = ErrorBody)
    )
)]
pub async fn get_user(Path(id): Path<String>) -> Result<impl IntoResponse, HandlerError> {
    info!("Get user request: id={}", id);

    // Only the built-in demo account exists
    if id != "1" {
        return Err(AppError::not_found()
            .with_message(format!("User not found: {}", id))
            .into());
    }

    Ok(Json(json!({ "id": id, "name": "Demo" })))
}

/// Search users
#[utoipa::path(
    get,
    path = "/users/search",
    tag = "users",
    params(
        ("q" = String, Query, description = "Search text"),
        ("page" = String, Query, description = "Page number")
    ),
    responses(
        (status = 200, description = "Search echo", body = serde_json::Value),
        (status = 400, description = "Missing query parameters", body = ErrorBody)
    )
)]
pub async fn search_users(
    Extension(QueryPaths(paths)): Extension<QueryPaths>,
) -> impl IntoResponse {
    Json(json!({
        "q": paths.get("q"),
        "page": paths.get("page"),
        "results": [],
    }))
}

/// Current session
#[utoipa::path(
    get,
    path = "/session",
    tag = "users",
    responses(
        (status = 200, description = "Authenticated", body = serde_json::Value),
        (status = 401, description = "No credentials", body = ErrorBody)
    )
)]
pub async fn session(headers: HeaderMap) -> Result<impl IntoResponse, HandlerError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|v| !v.is_empty())
        .ok_or_else(AppError::unauthorized)?;

    Ok(Json(json!({ "authenticated": true, "token_length": token.len() })))
}
