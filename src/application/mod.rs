//! Application services and orchestration
//!
//! [`Application`] hosts the analysis endpoint; [`FlowController`] drives the
//! visitor-facing funnel against any [`Analyzer`](crate::client::Analyzer).

pub mod app;
pub mod flow_controller;

pub use app::Application;
pub use flow_controller::FlowController;
