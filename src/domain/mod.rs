//! Domain types and business logic for the analysis funnel
//!
//! Everything here is free of I/O except the injected
//! [`KeyValueStore`](experiment::KeyValueStore) used for sticky A/B
//! assignments.

pub mod analysis;
pub mod experiment;
pub mod flow;
pub mod lead;
pub mod target;

pub use analysis::{AnalysisRequest, AnalysisResponse, ResponseShapeError};
pub use flow::{FlowEvent, FlowMachine, FlowStage, FlowState};
pub use target::{is_valid_target, normalize, DomainName, NormalizedTarget};
