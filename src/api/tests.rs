//! Router-level tests for the analysis endpoint

use super::*;
use crate::config::ServerSettings;
use crate::providers::{CompletionProvider, CompletionRequest, ProviderError};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

enum Reply {
    Text(String),
    Fail(fn() -> ProviderError),
}

struct StubProvider {
    reply: Reply,
    seen: Mutex<Vec<CompletionRequest>>,
}

impl StubProvider {
    fn replying(body: Value) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Text(body.to_string()),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn failing(error: fn() -> ProviderError) -> Arc<Self> {
        Arc::new(Self {
            reply: Reply::Fail(error),
            seen: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl CompletionProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        self.seen.lock().push(request.clone());
        match &self.reply {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Fail(error) => Err(error()),
        }
    }
}

fn app(provider: Option<Arc<StubProvider>>) -> Router {
    let provider = provider.map(|p| p as Arc<dyn CompletionProvider>);
    AnalysisService::new(provider).into_router(&ServerSettings {
        max_body_bytes: 16 * 1024,
    })
}

fn post_json(body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/api/analyze")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn good_report() -> Value {
    json!({
        "summary": "Example is seen as a dependable reference site.",
        "adjectives": ["reliable", "simple", "neutral"],
        "competitors": ["example.org", "example.net"]
    })
}

#[tokio::test]
async fn test_valid_report_is_passed_through() {
    let provider = StubProvider::replying(good_report());
    let response = app(Some(provider.clone()))
        .oneshot(post_json(r#"{"domain":"example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(json_body(response).await, good_report());

    assert_eq!(provider.calls(), 1);
    let seen = provider.seen.lock();
    assert!(seen[0].user.contains("example.com"));
    assert!(seen[0].json_object);
}

#[tokio::test]
async fn test_extra_fields_in_reply_are_dropped() {
    let mut reply = good_report();
    reply["confidence"] = json!(0.9);
    let response = app(Some(StubProvider::replying(reply)))
        .oneshot(post_json(r#"{"domain":"example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, good_report());
}

#[tokio::test]
async fn test_reply_missing_adjectives_is_rejected() {
    let provider = StubProvider::replying(json!({
        "summary": "Half an answer.",
        "competitors": ["example.org"]
    }));
    let response = app(Some(provider))
        .oneshot(post_json(r#"{"domain":"example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"message": "Invalid response format from OpenAI"})
    );
}

#[tokio::test]
async fn test_non_json_reply_is_rejected() {
    let provider = Arc::new(StubProvider {
        reply: Reply::Text("Sure! Here is your analysis.".to_string()),
        seen: Mutex::new(Vec::new()),
    });
    let response = app(Some(provider))
        .oneshot(post_json(r#"{"domain":"example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["message"],
        "Invalid response format from OpenAI"
    );
}

#[tokio::test]
async fn test_missing_domain_never_reaches_provider() {
    let provider = StubProvider::replying(good_report());
    let response = app(Some(provider.clone()))
        .oneshot(post_json("{}"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"message": "Domain is required"})
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_invalid_domain_never_reaches_provider() {
    let provider = StubProvider::replying(good_report());
    let response = app(Some(provider.clone()))
        .oneshot(post_json(r#"{"domain":"not a domain"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({"message": "Invalid domain format"})
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_validation_runs_before_credential_check() {
    let response = app(None).oneshot(post_json("{}")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_credential_is_reported() {
    let response = app(None)
        .oneshot(post_json(r#"{"domain":"example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"message": "OpenAI API key not configured"})
    );
}

#[tokio::test]
async fn test_provider_error_message_is_surfaced() {
    let provider = StubProvider::failing(|| ProviderError::Api {
        status: 429,
        message: "Rate limit reached for gpt-4o-mini".to_string(),
    });
    let response = app(Some(provider))
        .oneshot(post_json(r#"{"domain":"example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["message"],
        "Rate limit reached for gpt-4o-mini"
    );
}

#[tokio::test]
async fn test_blank_provider_message_gets_generic_message() {
    let provider = StubProvider::failing(|| ProviderError::Api {
        status: 500,
        message: String::new(),
    });
    let response = app(Some(provider))
        .oneshot(post_json(r#"{"domain":"example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await,
        json!({"message": "An unexpected error occurred"})
    );
}

#[tokio::test]
async fn test_oversized_body_gets_json_error() {
    let provider = StubProvider::replying(json!({}));
    let domain = "a".repeat(20_000);
    let response = app(Some(provider.clone()))
        .oneshot(post_json(&json!({ "domain": domain }).to_string()))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(
        json_body(response).await,
        json!({"message": "Request body too large"})
    );
    assert_eq!(provider.calls(), 0);
}

#[tokio::test]
async fn test_transport_failure_gets_generic_message() {
    let provider = StubProvider::failing(|| {
        ProviderError::RequestFailed("error sending request for url".to_string())
    });
    let response = app(Some(provider))
        .oneshot(post_json(r#"{"domain":"example.com"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        json_body(response).await["message"],
        "An unexpected error occurred"
    );
}

#[tokio::test]
async fn test_get_is_method_not_allowed() {
    let response = app(None)
        .oneshot(
            Request::builder()
                .method(Method::GET)
                .uri("/api/analyze")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(
        json_body(response).await,
        json!({"message": "Method not allowed"})
    );
}

#[tokio::test]
async fn test_preflight_gets_cors_headers() {
    let response = app(None)
        .oneshot(
            Request::builder()
                .method(Method::OPTIONS)
                .uri("/api/analyze")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], "POST, OPTIONS");
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], "Content-Type");
}

#[tokio::test]
async fn test_health_check() {
    let response = app(None)
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&body[..], b"OK");
}
