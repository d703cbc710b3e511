//! Error responses for the analysis endpoint
//!
//! Every failure leaves the handler as a JSON body of the form
//! `{ "message": ... }` with a status from [`ApiError::status_code`].

use crate::domain::analysis::ResponseShapeError;
use crate::providers::constants::error_messages;
use crate::providers::ProviderError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::any::Any;
use thiserror::Error;
use tracing::error;

/// Standard error response format
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn into_response_with_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

/// Errors the analysis endpoint reports to its caller
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("domain is missing from the request body")]
    MissingDomain,

    #[error("domain does not match the domain grammar")]
    InvalidDomain,

    #[error("method not allowed")]
    MethodNotAllowed,

    #[error("request body exceeds the size limit")]
    PayloadTooLarge,

    #[error("provider credential is not configured")]
    MissingCredential,

    #[error("provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("invalid provider response: {0}")]
    InvalidProviderResponse(#[from] ResponseShapeError),

    #[error("unexpected error")]
    Unexpected,
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::MissingDomain | Self::InvalidDomain => StatusCode::BAD_REQUEST,
            Self::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::MissingCredential
            | Self::Provider(_)
            | Self::InvalidProviderResponse(_)
            | Self::Unexpected => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn to_error_response(&self) -> ErrorResponse {
        let message = match self {
            Self::MissingDomain => error_messages::DOMAIN_REQUIRED,
            Self::InvalidDomain => error_messages::INVALID_DOMAIN_FORMAT,
            Self::MethodNotAllowed => error_messages::METHOD_NOT_ALLOWED,
            Self::PayloadTooLarge => error_messages::REQUEST_TOO_LARGE,
            Self::MissingCredential => error_messages::API_KEY_NOT_CONFIGURED,
            Self::Provider(provider_error) => provider_error.public_message(),
            Self::InvalidProviderResponse(_) => error_messages::INVALID_RESPONSE_FORMAT,
            Self::Unexpected => error_messages::UNEXPECTED,
        };
        ErrorResponse::new(message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        self.to_error_response().into_response_with_status(status)
    }
}

/// Response used when a handler panics
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    error!(panic = %detail, "Handler panicked");

    ApiError::Unexpected.into_response()
}
