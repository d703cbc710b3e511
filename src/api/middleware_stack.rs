//! Middleware stack builder for the analysis API

use crate::api::error_response::panic_response;
use crate::api::middleware::{
    cors_middleware, logging_middleware, payload_too_large_middleware, request_id_middleware,
};
use axum::{middleware::from_fn, Router};
use tower_http::{catch_panic::CatchPanicLayer, limit::RequestBodyLimitLayer};

/// Builder for composing the API middleware stack
#[derive(Debug, Clone, Copy)]
pub struct ApiMiddlewareStack {
    max_body_bytes: usize,
}

impl ApiMiddlewareStack {
    pub fn new(max_body_bytes: usize) -> Self {
        Self { max_body_bytes }
    }

    /// Apply the complete middleware stack to a router
    ///
    /// Outer to inner:
    /// 1. Request ID generation/propagation
    /// 2. Logging (with request ID)
    /// 3. CORS headers
    /// 4. Panic recovery
    /// 5. JSON rendering of body-limit rejections
    /// 6. Body size limit
    ///
    /// CORS sits outside panic recovery so even a 500 from a panicking
    /// handler stays readable by the browser.
    pub fn apply_to_router<S>(self, router: Router<S>) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        router
            .layer(RequestBodyLimitLayer::new(self.max_body_bytes))
            .layer(from_fn(payload_too_large_middleware))
            .layer(CatchPanicLayer::custom(panic_response))
            .layer(from_fn(cors_middleware))
            .layer(from_fn(logging_middleware))
            .layer(from_fn(request_id_middleware))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::middleware::REQUEST_ID_HEADER;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        routing::{get, post},
    };
    use tower::ServiceExt;

    async fn panicking() -> &'static str {
        panic!("handler blew up")
    }

    fn router() -> Router {
        let router = Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/panic", get(panicking))
            .route("/echo", post(|body: axum::body::Bytes| async move { body }));
        ApiMiddlewareStack::new(32).apply_to_router(router)
    }

    #[tokio::test]
    async fn test_stack_adds_request_id_and_cors() {
        let response = router()
            .oneshot(Request::builder().uri("/ok").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
    }

    #[tokio::test]
    async fn test_panic_becomes_generic_500() {
        let response = router()
            .oneshot(Request::builder().uri("/panic").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn test_oversized_body_is_rejected() {
        let response = router()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/echo")
                    .header(header::CONTENT_LENGTH, "64")
                    .body(Body::from(vec![b'a'; 64]))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(response.headers()[header::ACCESS_CONTROL_ALLOW_ORIGIN], "*");
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["message"], "Request body too large");
    }
}
