//! Axum handlers for the analysis API

use crate::api::error_response::ApiError;
use crate::api::service::AnalysisService;
use crate::domain::analysis::AnalysisResponse;
use axum::{body::Bytes, extract::State, http::StatusCode, Json};
use std::sync::Arc;
use tracing::{info, warn};

/// `POST /api/analyze`
pub async fn analyze_handler(
    State(service): State<Arc<AnalysisService>>,
    body: Bytes,
) -> Result<Json<AnalysisResponse>, ApiError> {
    match service.analyze(&body).await {
        Ok(report) => {
            info!(
                adjectives = report.adjectives().len(),
                competitors = report.competitors().len(),
                "Analysis completed"
            );
            Ok(Json(report))
        }
        Err(error) => {
            warn!(error = %error, status = error.status_code().as_u16(), "Analysis failed");
            Err(error)
        }
    }
}

/// Preflight; the CORS layer adds the headers
pub async fn preflight_handler() -> StatusCode {
    StatusCode::OK
}

pub async fn method_not_allowed_handler() -> ApiError {
    ApiError::MethodNotAllowed
}

/// Health check handler
pub async fn health_handler() -> &'static str {
    "OK"
}
