pub mod middleware;
pub mod registry;

use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};
use prometheus::{Encoder, TextEncoder};

use crate::errors::{AppError, HandlerError};

pub use registry::{
    init_metrics, ERRORS_RESPONDED_TOTAL, GUARD_REJECTIONS_TOTAL, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION_SECONDS,
};

/// Serves every registered metric in Prometheus exposition format
pub async fn metrics_handler() -> Result<impl IntoResponse, HandlerError> {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();

    encoder
        .encode(&prometheus::gather(), &mut buffer)
        .map_err(|e| AppError::generic().with_message(format!("Failed to encode metrics: {}", e)))?;

    let body = String::from_utf8(buffer)
        .map_err(|e| AppError::generic().with_message(format!("Metrics are not UTF-8: {}", e)))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, encoder.format_type().to_string())],
        body,
    ))
}
