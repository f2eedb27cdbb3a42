use std::collections::BTreeMap;
use thiserror::Error;

use super::codes::ErrorKind;
use super::external::ExternalValidation;
use super::response::ErrorPayload;

/// Field path (e.g. `address.ln1`) to a short reason code (e.g. `required`)
pub type FieldErrors = BTreeMap<String, String>;

/// Classified application failure, consumed by the error responder
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AppError {
    #[error("{message}")]
    Generic { message: String },

    #[error("{message}")]
    NotFound { message: String },

    #[error("{message}")]
    BadRequest {
        message: String,
        field_errors: Option<FieldErrors>,
    },

    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Validation { message: String, fields: FieldErrors },
}

impl AppError {
    pub fn generic() -> Self {
        Self::Generic {
            message: ErrorKind::Error.default_message().to_string(),
        }
    }

    pub fn not_found() -> Self {
        Self::NotFound {
            message: ErrorKind::NotFound.default_message().to_string(),
        }
    }

    pub fn bad_request() -> Self {
        Self::BadRequest {
            message: ErrorKind::BadRequest.default_message().to_string(),
            field_errors: None,
        }
    }

    pub fn unauthorized() -> Self {
        Self::Unauthorized {
            message: ErrorKind::Unauthorized.default_message().to_string(),
        }
    }

    pub fn validation(fields: FieldErrors) -> Self {
        Self::Validation {
            message: ErrorKind::Validation.default_message().to_string(),
            fields,
        }
    }

    /// Replace the default message
    pub fn with_message(mut self, msg: impl Into<String>) -> Self {
        match &mut self {
            Self::Generic { message }
            | Self::NotFound { message }
            | Self::BadRequest { message, .. }
            | Self::Unauthorized { message }
            | Self::Validation { message, .. } => *message = msg.into(),
        }
        self
    }

    /// Attach per-field reasons. Only `BadRequest` and `Validation` carry
    /// them; other variants are returned unchanged.
    pub fn with_field_errors(mut self, errors: FieldErrors) -> Self {
        match &mut self {
            Self::BadRequest { field_errors, .. } => *field_errors = Some(errors),
            Self::Validation { fields, .. } => *fields = errors,
            Self::Generic { .. } | Self::NotFound { .. } | Self::Unauthorized { .. } => {}
        }
        self
    }

    /// Build a `Validation` error from a foreign validation error, mapping
    /// every field to its reason. The default message is kept.
    pub fn from_external_validation(external: &dyn ExternalValidation) -> Self {
        let fields = external.field_reasons().into_iter().collect();
        Self::validation(fields)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Generic { .. } => ErrorKind::Error,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::BadRequest { .. } => ErrorKind::BadRequest,
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::Validation { .. } => ErrorKind::Validation,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Generic { message }
            | Self::NotFound { message }
            | Self::BadRequest { message, .. }
            | Self::Unauthorized { message }
            | Self::Validation { message, .. } => message,
        }
    }

    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::BadRequest { field_errors, .. } => field_errors.as_ref(),
            Self::Validation { fields, .. } => Some(fields),
            Self::Generic { .. } | Self::NotFound { .. } | Self::Unauthorized { .. } => None,
        }
    }

    /// The serializable subset of this error sent under `error` in responses.
    ///
    /// `Validation` deliberately leaves out `message`: clients get only the
    /// kind and the per-field reasons.
    pub fn to_response_payload(&self) -> ErrorPayload {
        let kind = self.kind();
        match self {
            Self::Generic { message }
            | Self::NotFound { message }
            | Self::Unauthorized { message } => ErrorPayload::new(kind, message.clone()),
            Self::BadRequest {
                message,
                field_errors,
            } => ErrorPayload {
                field_errors: field_errors.clone(),
                ..ErrorPayload::new(kind, message.clone())
            },
            Self::Validation { fields, .. } => ErrorPayload {
                kind,
                message: None,
                field_errors: None,
                fields: Some(fields.clone()),
            },
        }
    }
}
