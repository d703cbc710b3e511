//! HTTP surface of the analysis service
//!
//! A single JSON endpoint, `POST /api/analyze`, validates a domain, asks the
//! configured [`CompletionProvider`](crate::providers::CompletionProvider)
//! for a brand-perception report and hands it back once it passes the
//! response shape check. `GET /health` is a liveness probe.

pub mod error_response;
pub mod handler;
pub mod middleware;
pub mod middleware_stack;
pub mod service;

#[cfg(test)]
mod tests;

pub use error_response::{ApiError, ErrorResponse};
pub use middleware_stack::ApiMiddlewareStack;
pub use service::AnalysisService;
