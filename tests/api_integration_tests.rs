use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    middleware,
    routing::get,
    Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tower::Service;
use validator::ValidationErrors;

use http_error_kit::api::middleware::{handle_errors, REQUEST_ID_HEADER};
use http_error_kit::api::routes::create_router;
use http_error_kit::errors::{AppError, HandlerError};
use http_error_kit::responder::{
    DowncastAdapter, ErrorResponder, Preprocess, RequestContext, ResponderConfig,
};

// Helper to create test app
fn create_test_app(config: ResponderConfig) -> Router {
    let responder = ErrorResponder::new(config)
        .with_validation_adapter(Arc::new(DowncastAdapter::<ValidationErrors>::new()));
    create_router(Arc::new(responder))
}

fn converting_config() -> ResponderConfig {
    ResponderConfig {
        convert_external_validation: true,
        ..Default::default()
    }
}

// Helper to send request and parse JSON response
async fn send_json_request(app: &mut Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    (status, json)
}

// Helper to send JSON request with JSON body
async fn send_json_body_request(
    app: &mut Router,
    method: &str,
    uri: &str,
    body: Value,
) -> (StatusCode, Value) {
    let bytes = serde_json::to_vec(&body).unwrap();
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(bytes))
        .unwrap();

    let response = app.call(request).await.unwrap();
    let status = response.status();

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&body).unwrap_or(json!({}));

    (status, json)
}

fn valid_user() -> Value {
    json!({
        "name": "Ada",
        "email": "ada@example.com",
        "address": { "ln1": "1 Main St" }
    })
}

#[tokio::test]
async fn test_health_endpoint() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_request(&mut app, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_openapi_error_responses_use_error_body() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, doc) = send_json_request(&mut app, "GET", "/api-docs/openapi.json").await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["components"]["schemas"]["ErrorBody"].is_object());
    for (path, method, code) in [
        ("/users", "post", "400"),
        ("/users/{id}", "get", "404"),
        ("/users/search", "get", "400"),
        ("/session", "get", "401"),
    ] {
        let schema = &doc["paths"][path][method]["responses"][code]["content"]["application/json"]
            ["schema"]["$ref"];
        assert_eq!(schema, "#/components/schemas/ErrorBody", "{} {}", method, path);
    }
}

// ========== REQUIRED FIELD GUARDS ==========

#[tokio::test]
async fn test_body_guard_reports_missing_fields() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_body_request(&mut app, "POST", "/users", json!({})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({
            "error": {
                "kind": "BadRequest",
                "message": "Bad request",
                "fieldErrors": {
                    "name": "required",
                    "email": "required",
                    "address.ln1": "required"
                }
            }
        })
    );
}

#[tokio::test]
async fn test_body_guard_reports_only_missing_nested_field() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_body_request(
        &mut app,
        "POST",
        "/users",
        json!({ "name": "Ada", "email": "ada@example.com", "address": { "ln2": "Flat 2" } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"]["fieldErrors"],
        json!({ "address.ln1": "required" })
    );
}

#[tokio::test]
async fn test_body_guard_passes_and_body_is_still_readable() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_body_request(&mut app, "POST", "/users", valid_user()).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["name"], "Ada");
    assert_eq!(body["address"]["ln1"], "1 Main St");
    assert!(body["id"].is_string());
}

#[tokio::test]
async fn test_body_guard_treats_non_json_as_empty() {
    let mut app = create_test_app(ResponderConfig::default());
    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "text/plain")
        .body(Body::from("name=Ada"))
        .unwrap();

    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_body_guard_rejects_oversized_body() {
    let mut app = create_test_app(ResponderConfig::default());
    let request = Request::builder()
        .method("POST")
        .uri("/users")
        .header("content-type", "application/json")
        .body(Body::from(vec![b' '; 2 * 1024 * 1024 + 1]))
        .unwrap();

    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["error"]["kind"], "BadRequest");
    assert!(body["error"]["message"]
        .as_str()
        .unwrap()
        .starts_with("Unreadable request body"));
    assert!(body["error"].get("fieldErrors").is_none());
}

#[tokio::test]
async fn test_query_guard_reports_missing_fields() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_request(&mut app, "GET", "/users/search?foo=bar").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "BadRequest");
    assert_eq!(
        body["error"]["fieldErrors"],
        json!({ "q": "required", "page": "required" })
    );
}

#[tokio::test]
async fn test_query_guard_passes() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_request(&mut app, "GET", "/users/search?q=ada&page=0").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["q"], "ada");
    assert_eq!(body["page"], "0");
}

#[tokio::test]
async fn test_param_guard_passes_route_params() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_request(&mut app, "GET", "/users/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], "1");
}

// ========== ERROR RESPONSES ==========

#[tokio::test]
async fn test_not_found_error() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_request(&mut app, "GET", "/users/42").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body,
        json!({ "error": { "kind": "NotFound", "message": "User not found: 42" } })
    );
}

#[tokio::test]
async fn test_unknown_route_is_not_found() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_request(&mut app, "GET", "/nope").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "NotFound");
}

#[tokio::test]
async fn test_unsupported_method_goes_through_responder() {
    let mut app = create_test_app(ResponderConfig {
        send_details: true,
        ..Default::default()
    });

    let (status, body) = send_json_request(&mut app, "DELETE", "/users/1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "NotFound");
    assert_eq!(body["details"]["name"], "NotFound");

    // The body guard on POST /users must not run for other methods
    let (status, body) = send_json_request(&mut app, "PUT", "/users").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["kind"], "NotFound");
    assert!(body["error"].get("fieldErrors").is_none());
}

#[tokio::test]
async fn test_unauthorized_error() {
    let mut app = create_test_app(ResponderConfig::default());
    let (status, body) = send_json_request(&mut app, "GET", "/session").await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(
        body,
        json!({ "error": { "kind": "Unauthorized", "message": "Not authorized" } })
    );
}

#[tokio::test]
async fn test_external_validation_is_converted() {
    let mut app = create_test_app(converting_config());
    let mut user = valid_user();
    user["email"] = json!("not-an-email");

    let (status, body) = send_json_body_request(&mut app, "POST", "/users", user).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body,
        json!({ "error": { "kind": "Validation", "fields": { "email": "email" } } })
    );
}

#[tokio::test]
async fn test_external_validation_without_conversion_is_generic() {
    let mut app = create_test_app(ResponderConfig::default());
    let mut user = valid_user();
    user["email"] = json!("not-an-email");

    let (status, body) = send_json_body_request(&mut app, "POST", "/users", user).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["kind"], "Error");
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let mut app = create_test_app(converting_config());
    let (status, body) = send_json_body_request(
        &mut app,
        "POST",
        "/users",
        json!({ "name": 7, "email": "ada@example.com", "address": { "ln1": "x" } }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["kind"], "BadRequest");
    assert!(body["error"].get("fieldErrors").is_none());
}

#[tokio::test]
async fn test_details_only_when_enabled() {
    let mut app = create_test_app(ResponderConfig::default());
    let (_, body) = send_json_request(&mut app, "GET", "/users/42").await;
    assert!(body.get("details").is_none());

    let mut app = create_test_app(ResponderConfig {
        send_details: true,
        ..Default::default()
    });
    let (status, body) = send_json_request(&mut app, "GET", "/users/42").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["details"]["kind"], "NotFound");
    assert_eq!(body["details"]["message"], "User not found: 42");
    assert!(body["details"]["stack"].is_string());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let mut app = create_test_app(ResponderConfig::default());
    let request = Request::builder()
        .uri("/users/42")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();

    let response = app.call(request).await.unwrap();
    assert_eq!(response.headers()[&REQUEST_ID_HEADER], "req-123");
}

#[tokio::test]
async fn test_metrics_endpoint_counts_errors() {
    let mut app = create_test_app(ResponderConfig::default());
    send_json_request(&mut app, "GET", "/session").await;

    let request = Request::builder()
        .uri("/metrics")
        .body(Body::empty())
        .unwrap();
    let response = app.call(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let text = String::from_utf8(body.to_vec()).unwrap();
    assert!(text.contains("errors_responded_total"));
}

// ========== CUSTOM ROUTERS ==========

struct HideInternals;

#[async_trait]
impl Preprocess for HideInternals {
    async fn preprocess(
        &self,
        error: Arc<anyhow::Error>,
        _ctx: &RequestContext,
    ) -> anyhow::Result<Option<anyhow::Error>> {
        if error.downcast_ref::<AppError>().is_some() {
            return Ok(None);
        }
        Ok(Some(
            AppError::generic()
                .with_message("Something went wrong")
                .into(),
        ))
    }
}

async fn explode() -> Result<&'static str, HandlerError> {
    Err(anyhow::anyhow!("database unreachable").into())
}

async fn missing() -> Result<&'static str, HandlerError> {
    Err(AppError::not_found().into())
}

fn custom_app(responder: ErrorResponder) -> Router {
    Router::new()
        .route("/explode", get(explode))
        .route("/missing", get(missing))
        .layer(middleware::from_fn_with_state(
            Arc::new(responder),
            handle_errors,
        ))
}

#[tokio::test]
async fn test_unknown_error_is_500() {
    let mut app = custom_app(ErrorResponder::default());
    let (status, body) = send_json_request(&mut app, "GET", "/explode").await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body,
        json!({ "error": { "kind": "Error", "message": "database unreachable" } })
    );
}

#[tokio::test]
async fn test_preprocess_replaces_error() {
    let mut app = custom_app(ErrorResponder::default().with_preprocess(Arc::new(HideInternals)));

    let (status, body) = send_json_request(&mut app, "GET", "/explode").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["message"], "Something went wrong");

    let (status, body) = send_json_request(&mut app, "GET", "/missing").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["message"], "Not found");
}
