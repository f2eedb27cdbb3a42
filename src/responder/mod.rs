//! Terminal error handling: turns any propagated error into a response.

mod adapter;
mod preprocess;

use axum::extract::Request;
use axum::http::{Method, Uri};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, error, warn};

pub use adapter::{DowncastAdapter, ValidationAdapter};
pub use preprocess::Preprocess;

use crate::api::middleware::RequestId;
use crate::errors::{classify, AppError, ErrorDetails, ErrorResponse};
use crate::metrics::ERRORS_RESPONDED_TOTAL;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponderConfig {
    /// Log every error before responding
    pub dump_exceptions: bool,
    /// Also log the cause chain and backtrace (needs `dump_exceptions`)
    pub show_stack: bool,
    /// Add a `details` block to responses. Not for production.
    pub send_details: bool,
    /// Fold errors recognized by the validation adapter into `Validation`
    pub convert_external_validation: bool,
}

impl ResponderConfig {
    pub fn from_env() -> Self {
        Self {
            dump_exceptions: env_flag("ERRORS_DUMP_EXCEPTIONS"),
            show_stack: env_flag("ERRORS_SHOW_STACK"),
            send_details: env_flag("ERRORS_SEND_DETAILS"),
            convert_external_validation: env_flag("ERRORS_CONVERT_EXTERNAL_VALIDATION"),
        }
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .unwrap_or_else(|_| "false".to_string())
        .parse::<bool>()
        .unwrap_or(false)
}

/// What the responder knows about the request that failed
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    pub request_id: Option<String>,
    pub method: Method,
    pub uri: Uri,
}

impl RequestContext {
    pub fn from_request(request: &Request) -> Self {
        Self {
            request_id: request
                .extensions()
                .get::<RequestId>()
                .map(|id| id.0.clone()),
            method: request.method().clone(),
            uri: request.uri().clone(),
        }
    }
}

pub struct ErrorResponder {
    config: ResponderConfig,
    preprocess: Option<Arc<dyn Preprocess>>,
    adapter: Option<Arc<dyn ValidationAdapter>>,
}

impl Default for ErrorResponder {
    fn default() -> Self {
        Self::new(ResponderConfig::default())
    }
}

impl ErrorResponder {
    pub fn new(config: ResponderConfig) -> Self {
        Self {
            config,
            preprocess: None,
            adapter: None,
        }
    }

    pub fn with_preprocess(mut self, preprocess: Arc<dyn Preprocess>) -> Self {
        self.preprocess = Some(preprocess);
        self
    }

    pub fn with_validation_adapter(mut self, adapter: Arc<dyn ValidationAdapter>) -> Self {
        self.adapter = Some(adapter);
        self
    }

    pub fn config(&self) -> &ResponderConfig {
        &self.config
    }

    /// Build the response for `error`. Never fails: a missing error is
    /// answered as a generic one, and a failing preprocess or adapter
    /// degrades to reporting what is available.
    pub async fn respond(
        &self,
        error: Option<Arc<anyhow::Error>>,
        ctx: &RequestContext,
    ) -> ErrorResponse {
        let error = error.unwrap_or_else(|| Arc::new(AppError::generic().into()));
        let error = self.run_preprocess(error, ctx).await;
        let error = self.convert_external(error);

        if self.config.dump_exceptions {
            error!(
                request_id = ?ctx.request_id,
                method = %ctx.method,
                uri = %ctx.uri,
                error = %error,
                "Request failed"
            );
            if self.config.show_stack {
                error!(request_id = ?ctx.request_id, "Error trace: {:?}", error);
            }
        }

        let (status, payload) = classify(&error);
        let kind = payload.kind;
        let mut response = ErrorResponse::new(status, payload);

        if self.config.send_details {
            response = response.with_details(details_for(&error));
        }

        ERRORS_RESPONDED_TOTAL
            .with_label_values(&[kind.as_str(), response.status.as_str()])
            .inc();

        response
    }

    async fn run_preprocess(
        &self,
        error: Arc<anyhow::Error>,
        ctx: &RequestContext,
    ) -> Arc<anyhow::Error> {
        let Some(preprocess) = &self.preprocess else {
            return error;
        };

        let outcome = AssertUnwindSafe(preprocess.preprocess(error.clone(), ctx))
            .catch_unwind()
            .await;

        match outcome {
            Ok(Ok(Some(replacement))) => {
                debug!(original = %error, replacement = %replacement, "Preprocess replaced error");
                Arc::new(replacement)
            }
            Ok(Ok(None)) => error,
            Ok(Err(failure)) => {
                warn!(original = %error, failure = %failure, "Preprocess failed, reporting its failure");
                Arc::new(failure)
            }
            Err(_) => {
                error!(original = %error, "Preprocess panicked, reporting the original error");
                error
            }
        }
    }

    fn convert_external(&self, error: Arc<anyhow::Error>) -> Arc<anyhow::Error> {
        if !self.config.convert_external_validation {
            return error;
        }
        let Some(adapter) = &self.adapter else {
            return error;
        };

        let converted = std::panic::catch_unwind(AssertUnwindSafe(|| {
            adapter
                .recognize(&error)
                .map(AppError::from_external_validation)
        }));

        match converted {
            Ok(Some(validation)) => {
                debug!(original = %error, "Converted external validation error");
                Arc::new(validation.into())
            }
            Ok(None) => error,
            Err(_) => {
                error!(original = %error, "Validation adapter panicked, reporting the original error");
                error
            }
        }
    }
}

fn details_for(error: &anyhow::Error) -> ErrorDetails {
    let app_error = error.downcast_ref::<AppError>();

    ErrorDetails {
        name: Some(app_error.map_or("Error", |e| e.kind().as_str()).to_string()),
        kind: app_error.map(AppError::kind),
        message: Some(error.to_string()),
        stack: Some(format!("{:?}", error)),
    }
}
