//! Brand perception - domain analysis funnel
//!
//! A visitor types a domain, sits through a short loading sequence, may
//! leave an email address, and then sees how the brand behind that domain
//! is perceived: a summary, the adjectives people reach for, and the
//! competitors it is compared with. The report comes from an LLM behind
//! `POST /api/analyze`.

pub mod api;
pub mod application;
pub mod client;
pub mod config;
pub mod domain;
pub mod error;
pub mod providers;

pub use application::{Application, FlowController};
pub use error::{Error, Result};
