use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::errors::RaisedError;
use crate::responder::{ErrorResponder, RequestContext};

/// Answers every error raised further down the stack with the configured
/// responder. Layer it outside everything that can raise, including guards.
pub async fn handle_errors(
    State(responder): State<Arc<ErrorResponder>>,
    request: Request,
    next: Next,
) -> Response {
    let ctx = RequestContext::from_request(&request);
    let mut response = next.run(request).await;

    match response.extensions_mut().remove::<RaisedError>() {
        Some(RaisedError(error)) => responder.respond(Some(error), &ctx).await.into_response(),
        None => response,
    }
}
