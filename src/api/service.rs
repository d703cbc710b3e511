//! Analysis service and router

use crate::api::error_response::ApiError;
use crate::api::handler::{
    analyze_handler, health_handler, method_not_allowed_handler, preflight_handler,
};
use crate::api::middleware_stack::ApiMiddlewareStack;
use crate::config::{ProviderSettings, ServerSettings};
use crate::domain::analysis::AnalysisResponse;
use crate::domain::target::DomainName;
use crate::providers::constants::paths;
use crate::providers::{
    ApiKey, CompletionProvider, CompletionRequest, OpenAiProvider, ProviderError,
};
use axum::routing::{get, post};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Turns a request body into a brand-perception report
#[derive(Clone)]
pub struct AnalysisService {
    provider: Option<Arc<dyn CompletionProvider>>,
}

impl AnalysisService {
    /// A service backed by `provider`, or one that answers every valid
    /// request with the missing-credential error when `provider` is `None`.
    pub fn new(provider: Option<Arc<dyn CompletionProvider>>) -> Self {
        Self { provider }
    }

    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, ProviderError> {
        let api_key = settings
            .api_key
            .as_deref()
            .and_then(|key| ApiKey::try_new(key).ok());

        let provider: Option<Arc<dyn CompletionProvider>> = match api_key {
            Some(api_key) => Some(Arc::new(OpenAiProvider::new(settings, api_key)?)),
            None => {
                warn!("No provider credential configured; analysis requests will fail");
                None
            }
        };

        Ok(Self::new(provider))
    }

    /// Validate the body, call the provider once and shape-check its reply.
    #[instrument(skip(self, body), fields(body_len = body.len()))]
    pub async fn analyze(&self, body: &[u8]) -> Result<AnalysisResponse, ApiError> {
        let domain = extract_domain(body)?;
        let provider = self.provider.as_ref().ok_or(ApiError::MissingCredential)?;

        debug!(domain = %domain, provider = provider.name(), "Analyzing domain");
        let request = CompletionRequest::brand_perception(&domain);
        let text = provider.complete(&request).await?;

        AnalysisResponse::from_json_str(&text).map_err(|e| {
            warn!(domain = %domain, error = %e, "Provider reply failed shape check");
            ApiError::from(e)
        })
    }

    /// Create an Axum router for the analysis service with middleware
    pub fn into_router(self, server: &ServerSettings) -> axum::Router {
        let router = axum::Router::new()
            .route(
                paths::ANALYZE,
                post(analyze_handler)
                    .options(preflight_handler)
                    .fallback(method_not_allowed_handler),
            )
            .route(paths::HEALTH, get(health_handler))
            .with_state(Arc::new(self));

        ApiMiddlewareStack::new(server.max_body_bytes).apply_to_router(router)
    }
}

/// Pull the `domain` field out of a request body.
///
/// A body that is not JSON, or has no usable `domain`, counts as missing.
/// Any other non-string value, or a string outside the grammar, is invalid.
/// The value is not trimmed.
pub fn extract_domain(body: &[u8]) -> Result<DomainName, ApiError> {
    let value: Value = serde_json::from_slice(body).unwrap_or(Value::Null);

    match value.get("domain") {
        None | Some(Value::Null) => Err(ApiError::MissingDomain),
        Some(Value::String(domain)) if domain.is_empty() => Err(ApiError::MissingDomain),
        Some(Value::String(domain)) => {
            DomainName::try_new(domain.clone()).map_err(|_| ApiError::InvalidDomain)
        }
        Some(_) => Err(ApiError::InvalidDomain),
    }
}
