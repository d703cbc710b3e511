//! OpenAI chat-completions provider

use crate::config::ProviderSettings;
use crate::providers::constants::{json_fields, paths};
use crate::providers::{ApiKey, CompletionProvider, CompletionRequest, ProviderError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Chat-completions client for OpenAI-compatible APIs
pub struct OpenAiProvider {
    client: reqwest::Client,
    endpoint: String,
    api_key: ApiKey,
    model: String,
    temperature: f32,
    timeout: Duration,
}

impl OpenAiProvider {
    /// Create a provider from settings and an already validated credential
    pub fn new(settings: &ProviderSettings, api_key: ApiKey) -> Result<Self, ProviderError> {
        let timeout = settings.request_timeout();
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ProviderError::Client(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: format!(
                "{}{}",
                settings.base_url.trim_end_matches('/'),
                paths::CHAT_COMPLETIONS
            ),
            api_key,
            model: settings.model.clone(),
            temperature: settings.temperature,
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn body<'a>(&'a self, request: &'a CompletionRequest) -> ChatCompletionRequest<'a> {
        ChatCompletionRequest {
            model: &self.model,
            temperature: self.temperature,
            response_format: request.json_object.then_some(ResponseFormat {
                kind: json_fields::RESPONSE_FORMAT_JSON_OBJECT,
            }),
            messages: [
                ChatMessage {
                    role: json_fields::ROLE_SYSTEM,
                    content: &request.system,
                },
                ChatMessage {
                    role: json_fields::ROLE_USER,
                    content: &request.user,
                },
            ],
        }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, ProviderError> {
        debug!(model = %self.model, endpoint = %self.endpoint, "Sending chat completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.as_ref())
            .json(&self.body(request))
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ApiErrorBody>(&bytes)
                .map(|body| body.error.message)
                .unwrap_or_else(|_| format!("OpenAI API returned status {}", status.as_u16()));
            warn!(status = status.as_u16(), "Provider rejected completion request");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let reply: ChatCompletionResponse = serde_json::from_slice(&bytes)
            .map_err(|e| ProviderError::MalformedReply(e.to_string()))?;

        reply
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ProviderError::EmptyCompletion)
    }
}

impl OpenAiProvider {
    fn transport_error(&self, error: reqwest::Error) -> ProviderError {
        if error.is_timeout() {
            ProviderError::Timeout(self.timeout)
        } else {
            ProviderError::RequestFailed(error.to_string())
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}
