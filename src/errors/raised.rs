use axum::response::{IntoResponse, Response};
use std::sync::Arc;

use super::app_error::AppError;
use super::codes::ErrorKind;
use super::response::{ErrorPayload, ErrorResponse};

/// Error returned from handlers and middleware.
///
/// Anything convertible into `anyhow::Error` (including [`AppError`]) can be
/// propagated with `?`. The response it renders on its own is a best-effort
/// default; when the `handle_errors` middleware is installed the raised error
/// is picked up from the response extensions and answered by the configured
/// responder instead.
#[derive(Debug)]
pub struct HandlerError(anyhow::Error);

impl HandlerError {
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    pub fn into_inner(self) -> anyhow::Error {
        self.0
    }
}

impl<E> From<E> for HandlerError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

/// Response extension carrying the error a handler raised
#[derive(Debug, Clone)]
pub struct RaisedError(pub Arc<anyhow::Error>);

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let error = Arc::new(self.0);
        let (status, payload) = classify(&error);

        let mut response = ErrorResponse::new(status, payload).into_response();
        response.extensions_mut().insert(RaisedError(error));
        response
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        HandlerError::from(self).into_response()
    }
}

/// Status code and payload for an arbitrary error.
///
/// Recognized [`AppError`]s (anywhere in the context chain) use their own
/// status and payload; anything else is a 500 with kind `Error` and the
/// error's display message.
pub fn classify(error: &anyhow::Error) -> (u16, ErrorPayload) {
    match error.downcast_ref::<AppError>() {
        Some(app_error) => (app_error.status_code(), app_error.to_response_payload()),
        None => (
            ErrorKind::Error.status_code(),
            ErrorPayload::new(ErrorKind::Error, error.to_string()),
        ),
    }
}
