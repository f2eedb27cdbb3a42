use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Machine-readable error kinds sent to API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ErrorKind {
    /// Unclassified failure
    Error,

    /// Requested resource does not exist
    NotFound,

    /// Malformed or missing request input
    BadRequest,

    /// Missing or invalid credentials
    Unauthorized,

    /// Structured per-field semantic errors
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::NotFound => "NotFound",
            Self::BadRequest => "BadRequest",
            Self::Unauthorized => "Unauthorized",
            Self::Validation => "Validation",
        }
    }

    /// Get HTTP status code for this error kind
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Error => 500,
            Self::NotFound => 404,
            Self::BadRequest => 400,
            Self::Unauthorized => 401,
            Self::Validation => 400,
        }
    }

    /// Message used when the caller does not supply one
    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::NotFound => "Not found",
            Self::BadRequest => "Bad request",
            Self::Unauthorized => "Not authorized",
            Self::Validation => "Validation error",
        }
    }
}
