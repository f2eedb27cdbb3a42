use axum::{
    body::Body,
    extract::{Query, RawPathParams, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    RequestExt,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use tracing::debug;

use crate::errors::{AppError, FieldErrors, HandlerError};
use crate::metrics::GUARD_REJECTIONS_TOTAL;
use crate::paths::{flatten, FlatPaths};

/// Largest body the guard will buffer when inspecting JSON
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

const REQUIRED: &str = "required";

/// Part of the request a guard inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Query,
    Body,
    Param,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Body => "body",
            Self::Param => "param",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bucket {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "query" => Ok(Self::Query),
            "body" => Ok(Self::Body),
            "param" => Ok(Self::Param),
            other => Err(anyhow::anyhow!(
                "Unknown request bucket '{}': expected query, body or param",
                other
            )),
        }
    }
}

/// Flattened query data, available to handlers after a query guard passed
#[derive(Debug, Clone)]
pub struct QueryPaths(pub FlatPaths);

/// Flattened JSON body, available to handlers after a body guard passed
#[derive(Debug, Clone)]
pub struct BodyPaths(pub FlatPaths);

/// Flattened route params, available to handlers after a param guard passed
#[derive(Debug, Clone)]
pub struct ParamPaths(pub FlatPaths);

/// Required paths for one bucket, fixed at route registration
#[derive(Debug, Clone)]
pub struct RequestGuard {
    bucket: Bucket,
    paths: Arc<[String]>,
}

impl RequestGuard {
    pub fn new<I, S>(bucket: Bucket, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bucket,
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn bucket(&self) -> Bucket {
        self.bucket
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Check every required path against `data`.
    ///
    /// A path is present when `data` has it as a top-level key or the
    /// flattened view resolves it; `null`, `false`, `0` and `""` all count.
    /// On failure every missing path is reported as `required`.
    pub fn check(&self, data: &Map<String, Value>) -> Result<FlatPaths, AppError> {
        let flat = flatten(data);

        let missing: FieldErrors = self
            .paths
            .iter()
            .filter(|path| !data.contains_key(path.as_str()) && !flat.contains(path))
            .map(|path| (path.clone(), REQUIRED.to_string()))
            .collect();

        if missing.is_empty() {
            Ok(flat)
        } else {
            Err(AppError::bad_request().with_field_errors(missing))
        }
    }
}

/// Rejects the request with a `BadRequest` unless every required path is
/// present in the guarded bucket.
///
/// Install with `middleware::from_fn_with_state(guard, require_fields)`.
/// Param guards need `route_layer` so route params are already matched.
pub async fn require_fields(
    State(guard): State<RequestGuard>,
    request: Request,
    next: Next,
) -> Response {
    let (mut request, data) = match read_bucket(guard.bucket, request).await {
        Ok(read) => read,
        Err(err) => return err.into_response(),
    };

    match guard.check(&data) {
        Ok(flat) => {
            let extensions = request.extensions_mut();
            match guard.bucket {
                Bucket::Query => {
                    extensions.insert(QueryPaths(flat));
                }
                Bucket::Body => {
                    extensions.insert(BodyPaths(flat));
                }
                Bucket::Param => {
                    extensions.insert(ParamPaths(flat));
                }
            }
            next.run(request).await
        }
        Err(err) => {
            GUARD_REJECTIONS_TOTAL
                .with_label_values(&[guard.bucket.as_str()])
                .inc();
            debug!(
                bucket = %guard.bucket,
                missing = ?err.field_errors().map(|f| f.keys().collect::<Vec<_>>()),
                "Rejected request with missing required fields"
            );
            HandlerError::from(err).into_response()
        }
    }
}

/// Read one bucket as a mapping. Missing or non-object data is empty.
async fn read_bucket(
    bucket: Bucket,
    mut request: Request,
) -> Result<(Request, Map<String, Value>), HandlerError> {
    let data: Map<String, Value> = match bucket {
        Bucket::Query => Query::<HashMap<String, String>>::try_from_uri(request.uri())
            .map(|Query(params)| {
                params
                    .into_iter()
                    .map(|(key, value)| (key, Value::String(value)))
                    .collect()
            })
            .unwrap_or_default(),
        Bucket::Param => request
            .extract_parts::<RawPathParams>()
            .await
            .map(|params| {
                params
                    .iter()
                    .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
                    .collect()
            })
            .unwrap_or_default(),
        Bucket::Body => {
            let (parts, body) = request.into_parts();
            let bytes = axum::body::to_bytes(body, MAX_BODY_BYTES)
                .await
                .map_err(|e| {
                    AppError::bad_request().with_message(format!("Unreadable request body: {}", e))
                })?;

            let data = match serde_json::from_slice::<Value>(&bytes) {
                Ok(Value::Object(map)) => map,
                _ => Map::new(),
            };

            request = Request::from_parts(parts, Body::from(bytes));
            data
        }
    };

    Ok((request, data))
}
