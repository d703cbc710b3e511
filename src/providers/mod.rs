//! LLM provider abstraction
//!
//! The analysis endpoint only needs one thing from a provider: turn a
//! system + user message pair into reply text, preferably a JSON object.
//! [`CompletionProvider`] captures that contract so the handler can be
//! exercised against a mock server or an in-process fake.

pub mod constants;
pub mod openai;

use crate::domain::target::DomainName;
use async_trait::async_trait;
use constants::{error_messages, prompts};
use nutype::nutype;
use std::time::Duration;

pub use openai::OpenAiProvider;

/// Provider credential
///
/// Has no `Display`, and its `Debug` output is redacted.
#[nutype(
    sanitize(trim),
    validate(not_empty),
    derive(Clone, TryFrom, AsRef)
)]
pub struct ApiKey(String);

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

/// One chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Ask the provider to constrain its reply to a JSON object
    pub json_object: bool,
}

impl CompletionRequest {
    /// The fixed brand-perception request for `domain`.
    pub fn brand_perception(domain: &DomainName) -> Self {
        Self {
            system: prompts::SYSTEM.to_string(),
            user: prompts::user(domain.as_ref()),
            json_object: true,
        }
    }
}

/// Core provider trait for LLM API providers
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Provider name used in logs
    fn name(&self) -> &'static str;

    /// Issue exactly one completion request and return the reply text.
    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError>;
}

/// Provider-specific error type
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Provider timed out after {0:?}")]
    Timeout(Duration),

    #[error("Provider returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Malformed provider reply: {0}")]
    MalformedReply(String),

    #[error("Provider returned an empty completion")]
    EmptyCompletion,

    #[error("Failed to build provider client: {0}")]
    Client(String),
}

impl ProviderError {
    /// Message safe to hand back to the caller of the analysis endpoint.
    pub fn public_message(&self) -> &str {
        match self {
            Self::Api { message, .. } if !message.trim().is_empty() => message,
            Self::Api { .. } => error_messages::UNEXPECTED,
            Self::Timeout(_) => error_messages::PROVIDER_TIMEOUT,
            Self::MalformedReply(_) | Self::EmptyCompletion => {
                error_messages::INVALID_RESPONSE_FORMAT
            }
            Self::RequestFailed(_) | Self::Client(_) => error_messages::UNEXPECTED,
        }
    }
}
