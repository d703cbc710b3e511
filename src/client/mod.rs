//! Caller side of the analysis endpoint
//!
//! [`AnalysisClient`] sends one `POST /api/analyze` per call, enforces the
//! response ceiling and maps every failure onto a [`ClientError`] whose
//! [`ClientError::user_message`] is safe to render. It never retries; a new
//! attempt is always the visitor's decision.

use crate::config::ClientSettings;
use crate::domain::analysis::AnalysisResponse;
use crate::providers::constants::paths;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default ceiling for one analysis round-trip
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub const NETWORK_ERROR_MESSAGE: &str =
    "We couldn't reach the analysis service. Please check your connection and try again.";
pub const FAILED_ANALYSIS_MESSAGE: &str = "Failed to analyze domain. Please try again.";
pub const TIMEOUT_MESSAGE: &str = "The analysis took too long to complete. Please try again.";
pub const UNEXPECTED_MESSAGE: &str = "An unexpected error occurred. Please try again.";

/// Failures seen by the caller of the analysis endpoint
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("analysis timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("unexpected error: {message}")]
    Unexpected { message: String },
}

impl ClientError {
    /// Text for the dismissible error banner.
    pub fn user_message(&self) -> String {
        match self {
            Self::Network { message } => message.clone(),
            Self::Timeout { .. } => TIMEOUT_MESSAGE.to_string(),
            Self::Unexpected { .. } => UNEXPECTED_MESSAGE.to_string(),
        }
    }
}

/// Anything able to turn a domain into a report
#[async_trait]
pub trait Analyzer: Send + Sync + 'static {
    async fn analyze(&self, domain: &str) -> Result<AnalysisResponse, ClientError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeBody<'a> {
    domain: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// HTTP client for `POST /api/analyze`
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl AnalysisClient {
    pub fn new(settings: &ClientSettings) -> Result<Self, ClientError> {
        Self::with_endpoint(&settings.endpoint, settings.timeout())
    }

    pub fn with_endpoint(endpoint: &str, timeout: Duration) -> Result<Self, ClientError> {
        let base = url::Url::parse(endpoint).map_err(|e| ClientError::Unexpected {
            message: format!("invalid analysis endpoint {endpoint:?}: {e}"),
        })?;
        let url = base
            .join(paths::ANALYZE)
            .map_err(|e| ClientError::Unexpected {
                message: e.to_string(),
            })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Unexpected {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            url: url.into(),
            timeout,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn transport_error(&self, error: reqwest::Error) -> ClientError {
        if error.is_timeout() {
            warn!(timeout = ?self.timeout, "Analysis request timed out");
            ClientError::Timeout {
                after: self.timeout,
            }
        } else if error.is_connect() || error.is_request() {
            warn!(error = %error, "Analysis request failed in transport");
            ClientError::Network {
                message: NETWORK_ERROR_MESSAGE.to_string(),
            }
        } else {
            warn!(error = %error, "Analysis request failed");
            ClientError::Unexpected {
                message: error.to_string(),
            }
        }
    }
}

#[async_trait]
impl Analyzer for AnalysisClient {
    async fn analyze(&self, domain: &str) -> Result<AnalysisResponse, ClientError> {
        debug!(domain, url = %self.url, "Requesting analysis");

        let response = self
            .http
            .post(&self.url)
            .json(&AnalyzeBody { domain })
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorBody>(&bytes)
                .map(|body| body.message)
                .ok()
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| FAILED_ANALYSIS_MESSAGE.to_string());
            warn!(status = status.as_u16(), "Analysis service returned an error");
            return Err(ClientError::Network { message });
        }

        serde_json::from_slice::<AnalysisResponse>(&bytes).map_err(|e| ClientError::Unexpected {
            message: e.to_string(),
        })
    }
}
