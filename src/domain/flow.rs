//! Analyze-and-reveal funnel state machine
//!
//! The funnel moves a visitor from an empty input box to a finished report:
//!
//! ```text
//! idle --submit--> loading --timer--> credentials --email|skip--> results
//!   ^                                                                |
//!   +----------------------- retry / failed fetch -------------------+
//! ```
//!
//! [`FlowMachine`] is synchronous and owns the only copy of the current
//! state. It never performs I/O; instead [`FlowMachine::handle`] returns the
//! [`FlowEffect`]s a driver must carry out. Every cycle gets a fresh
//! [`Generation`], and timer or analysis completions tagged with an older
//! generation are dropped so a late reply can never land in a newer cycle.

use crate::domain::analysis::AnalysisResponse;
use crate::domain::lead::EmailAddress;
use crate::domain::target::{is_valid_target, normalize, NormalizedTarget};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const INVALID_TARGET_MESSAGE: &str = "Please enter a valid domain (e.g. example.com)";
pub const INVALID_EMAIL_MESSAGE: &str = "Please enter a valid email address";

/// Default length of one loading stage
pub const DEFAULT_STAGE_DURATION: Duration = Duration::from_millis(1500);

const STAGE_LABELS: [&str; 4] = [
    "Scanning web presence",
    "Reading public sentiment",
    "Mapping the competitive landscape",
    "Compiling your report",
];

/// Submission cycle counter used to discard stale completions
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display,
)]
#[display("gen-{_0}")]
pub struct Generation(u64);

impl Generation {
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

/// Which phase of the funnel is active
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
pub enum FlowStage {
    #[display("idle")]
    Idle,
    #[display("loading")]
    Loading,
    #[display("credentials")]
    Credentials,
    #[display("results")]
    Results,
}

/// One labelled step of the loading animation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingStage {
    pub label: &'static str,
    pub duration: Duration,
}

/// Fixed sequence of loading stages shown before the gate
///
/// The plan is purely cosmetic: it always runs to completion and is not
/// tied to the analysis request in any way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadingPlan {
    stages: Vec<LoadingStage>,
}

impl LoadingPlan {
    /// Four stages of equal length.
    pub fn uniform(stage_duration: Duration) -> Self {
        Self {
            stages: STAGE_LABELS
                .iter()
                .map(|&label| LoadingStage {
                    label,
                    duration: stage_duration,
                })
                .collect(),
        }
    }

    pub fn stages(&self) -> &[LoadingStage] {
        &self.stages
    }

    pub fn total(&self) -> Duration {
        self.stages.iter().map(|stage| stage.duration).sum()
    }

    /// Stage to display after `elapsed` time in loading; `None` once done.
    pub fn stage_at(&self, elapsed: Duration) -> Option<&LoadingStage> {
        let mut boundary = Duration::ZERO;
        self.stages.iter().find(|stage| {
            boundary += stage.duration;
            elapsed < boundary
        })
    }
}

impl Default for LoadingPlan {
    fn default() -> Self {
        Self::uniform(DEFAULT_STAGE_DURATION)
    }
}

/// Current funnel state together with the data that phase owns
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowState {
    Idle {
        error: Option<String>,
    },
    Loading {
        target: NormalizedTarget,
        generation: Generation,
    },
    Credentials {
        target: NormalizedTarget,
        generation: Generation,
    },
    Results {
        target: NormalizedTarget,
        generation: Generation,
        lead: Option<EmailAddress>,
        report: Option<AnalysisResponse>,
    },
}

impl FlowState {
    pub fn stage(&self) -> FlowStage {
        match self {
            Self::Idle { .. } => FlowStage::Idle,
            Self::Loading { .. } => FlowStage::Loading,
            Self::Credentials { .. } => FlowStage::Credentials,
            Self::Results { .. } => FlowStage::Results,
        }
    }
}

impl Default for FlowState {
    fn default() -> Self {
        Self::Idle { error: None }
    }
}

/// Inputs to the state machine, from the visitor or from completed work
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEvent {
    Submit(String),
    LoadingElapsed(Generation),
    SubmitEmail(String),
    Skip,
    AnalysisFinished {
        generation: Generation,
        outcome: Result<AnalysisResponse, String>,
    },
    Retry,
    DismissError,
}

impl FlowEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Submit(_) => "submit",
            Self::LoadingElapsed(_) => "loading-elapsed",
            Self::SubmitEmail(_) => "submit-email",
            Self::Skip => "skip",
            Self::AnalysisFinished { .. } => "analysis-finished",
            Self::Retry => "retry",
            Self::DismissError => "dismiss-error",
        }
    }
}

/// Work the driver must start on behalf of the machine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowEffect {
    ScheduleLoadingComplete {
        generation: Generation,
        after: Duration,
    },
    RequestAnalysis {
        generation: Generation,
        domain: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    #[error("cannot handle `{event}` while {from}")]
    InvalidTransition {
        from: FlowStage,
        event: &'static str,
    },

    #[error("{}", INVALID_TARGET_MESSAGE)]
    InvalidTarget,

    #[error("{}", INVALID_EMAIL_MESSAGE)]
    InvalidEmail,
}

/// The funnel controller's single source of truth
#[derive(Debug, Clone, Default)]
pub struct FlowMachine {
    state: FlowState,
    generation: Generation,
    plan: LoadingPlan,
}

impl FlowMachine {
    pub fn new(plan: LoadingPlan) -> Self {
        Self {
            state: FlowState::default(),
            generation: Generation::default(),
            plan,
        }
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn stage(&self) -> FlowStage {
        self.state.stage()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn plan(&self) -> &LoadingPlan {
        &self.plan
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            FlowState::Idle { error } => error.as_deref(),
            _ => None,
        }
    }

    pub fn target(&self) -> Option<&NormalizedTarget> {
        match &self.state {
            FlowState::Idle { .. } => None,
            FlowState::Loading { target, .. }
            | FlowState::Credentials { target, .. }
            | FlowState::Results { target, .. } => Some(target),
        }
    }

    pub fn report(&self) -> Option<&AnalysisResponse> {
        match &self.state {
            FlowState::Results { report, .. } => report.as_ref(),
            _ => None,
        }
    }

    /// Apply one event and return the effects to run.
    ///
    /// An invalid submission leaves the machine idle with a visible error
    /// message and also returns [`FlowError::InvalidTarget`]. Completions
    /// from a superseded generation are ignored and produce no effects.
    pub fn handle(&mut self, event: FlowEvent) -> Result<Vec<FlowEffect>, FlowError> {
        let name = event.name();
        match event {
            FlowEvent::Submit(raw) => self.submit(&raw, name),
            FlowEvent::LoadingElapsed(generation) => Ok(self.finish_loading(generation)),
            FlowEvent::SubmitEmail(raw) => {
                self.require(FlowStage::Credentials, name)?;
                let email = EmailAddress::try_new(raw).map_err(|_| FlowError::InvalidEmail)?;
                Ok(self.enter_results(Some(email)))
            }
            FlowEvent::Skip => {
                self.require(FlowStage::Credentials, name)?;
                Ok(self.enter_results(None))
            }
            FlowEvent::AnalysisFinished {
                generation,
                outcome,
            } => Ok(self.finish_analysis(generation, outcome)),
            FlowEvent::Retry => {
                self.require(FlowStage::Results, name)?;
                debug!(generation = %self.generation, "Funnel reset for a new analysis");
                self.state = FlowState::default();
                Ok(Vec::new())
            }
            FlowEvent::DismissError => {
                self.require(FlowStage::Idle, name)?;
                self.state = FlowState::default();
                Ok(Vec::new())
            }
        }
    }

    fn require(&self, expected: FlowStage, event: &'static str) -> Result<(), FlowError> {
        let from = self.stage();
        if from == expected {
            Ok(())
        } else {
            Err(FlowError::InvalidTransition { from, event })
        }
    }

    fn submit(&mut self, raw: &str, event: &'static str) -> Result<Vec<FlowEffect>, FlowError> {
        self.require(FlowStage::Idle, event)?;
        if !is_valid_target(raw) {
            self.state = FlowState::Idle {
                error: Some(INVALID_TARGET_MESSAGE.to_string()),
            };
            return Err(FlowError::InvalidTarget);
        }

        self.generation = self.generation.next();
        let generation = self.generation;
        self.state = FlowState::Loading {
            target: normalize(raw),
            generation,
        };
        debug!(generation = %generation, "Funnel entered loading");

        Ok(vec![FlowEffect::ScheduleLoadingComplete {
            generation,
            after: self.plan.total(),
        }])
    }

    fn finish_loading(&mut self, finished: Generation) -> Vec<FlowEffect> {
        let target = match &self.state {
            FlowState::Loading { target, generation } if *generation == finished => {
                Some(target.clone())
            }
            _ => None,
        };

        match target {
            Some(target) => {
                self.state = FlowState::Credentials {
                    target,
                    generation: finished,
                };
            }
            None => debug!(generation = %finished, "Ignoring stale loading timer"),
        }
        Vec::new()
    }

    fn enter_results(&mut self, lead: Option<EmailAddress>) -> Vec<FlowEffect> {
        let FlowState::Credentials { target, generation } = &self.state else {
            return Vec::new();
        };
        let (target, generation) = (target.clone(), *generation);

        let Some(domain) = target.domain() else {
            self.state = FlowState::Idle {
                error: Some(INVALID_TARGET_MESSAGE.to_string()),
            };
            return Vec::new();
        };

        self.state = FlowState::Results {
            target,
            generation,
            lead,
            report: None,
        };
        debug!(generation = %generation, "Funnel requesting analysis");

        vec![FlowEffect::RequestAnalysis { generation, domain }]
    }

    fn finish_analysis(
        &mut self,
        finished: Generation,
        outcome: Result<AnalysisResponse, String>,
    ) -> Vec<FlowEffect> {
        let awaiting = matches!(
            &self.state,
            FlowState::Results { generation, report: None, .. } if *generation == finished
        );
        if !awaiting {
            debug!(generation = %finished, current = %self.generation, "Discarding stale analysis result");
            return Vec::new();
        }

        match outcome {
            Ok(analysis) => {
                if let FlowState::Results { report, .. } = &mut self.state {
                    *report = Some(analysis);
                }
            }
            Err(message) => {
                self.state = FlowState::Idle {
                    error: Some(message),
                };
            }
        }
        Vec::new()
    }
}
