//! Async driver for the funnel state machine
//!
//! [`FlowController`] owns a [`FlowMachine`] and runs the effects it asks
//! for. The loading timer and the analysis request are spawned as separate
//! tasks that report back through one event channel, so the two timelines
//! never wait on each other. Every completion carries the generation it was
//! started for and the machine drops anything from an older cycle.

use crate::client::{AnalysisClient, Analyzer, ClientError};
use crate::config::Settings;
use crate::domain::flow::{
    FlowEffect, FlowError, FlowEvent, FlowMachine, FlowStage, FlowState, LoadingPlan,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub struct FlowController<A: Analyzer> {
    machine: FlowMachine,
    analyzer: Arc<A>,
    events_tx: mpsc::UnboundedSender<FlowEvent>,
    events_rx: mpsc::UnboundedReceiver<FlowEvent>,
}

impl FlowController<AnalysisClient> {
    /// Controller talking HTTP to the configured analysis endpoint.
    pub fn from_settings(settings: &Settings) -> Result<Self, ClientError> {
        let client = AnalysisClient::new(&settings.client)?;
        let plan = LoadingPlan::uniform(settings.funnel.stage_duration());
        Ok(Self::new(Arc::new(client), plan))
    }
}

impl<A: Analyzer> FlowController<A> {
    pub fn new(analyzer: Arc<A>, plan: LoadingPlan) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            machine: FlowMachine::new(plan),
            analyzer,
            events_tx,
            events_rx,
        }
    }

    pub fn machine(&self) -> &FlowMachine {
        &self.machine
    }

    pub fn state(&self) -> &FlowState {
        self.machine.state()
    }

    pub fn stage(&self) -> FlowStage {
        self.machine.stage()
    }

    /// Feed one event to the machine and start whatever it asks for.
    pub fn dispatch(&mut self, event: FlowEvent) -> Result<(), FlowError> {
        let from = self.machine.stage();
        let name = event.name();
        let effects = self.machine.handle(event)?;

        let to = self.machine.stage();
        if from != to {
            info!(
                event = name,
                from = %from,
                to = %to,
                generation = %self.machine.generation(),
                "Funnel transition"
            );
        }

        for effect in effects {
            self.spawn_effect(effect);
        }
        Ok(())
    }

    pub fn submit(&mut self, raw: &str) -> Result<(), FlowError> {
        self.dispatch(FlowEvent::Submit(raw.to_string()))
    }

    pub fn submit_email(&mut self, raw: &str) -> Result<(), FlowError> {
        self.dispatch(FlowEvent::SubmitEmail(raw.to_string()))
    }

    pub fn skip(&mut self) -> Result<(), FlowError> {
        self.dispatch(FlowEvent::Skip)
    }

    pub fn retry(&mut self) -> Result<(), FlowError> {
        self.dispatch(FlowEvent::Retry)
    }

    pub fn dismiss_error(&mut self) -> Result<(), FlowError> {
        self.dispatch(FlowEvent::DismissError)
    }

    /// Wait for the next timer or analysis completion and apply it.
    pub async fn process_next(&mut self) -> FlowStage {
        if let Some(event) = self.events_rx.recv().await {
            if let Err(error) = self.dispatch(event) {
                warn!(error = %error, "Background completion rejected");
            }
        }
        self.machine.stage()
    }

    fn spawn_effect(&self, effect: FlowEffect) {
        let events = self.events_tx.clone();
        match effect {
            FlowEffect::ScheduleLoadingComplete { generation, after } => {
                debug!(generation = %generation, after_ms = after.as_millis(), "Scheduling loading completion");
                tokio::spawn(async move {
                    tokio::time::sleep(after).await;
                    // The controller may be gone; nothing is waiting then.
                    let _ = events.send(FlowEvent::LoadingElapsed(generation));
                });
            }
            FlowEffect::RequestAnalysis { generation, domain } => {
                let analyzer = Arc::clone(&self.analyzer);
                tokio::spawn(async move {
                    let outcome = analyzer
                        .analyze(&domain)
                        .await
                        .map_err(|error| {
                            warn!(generation = %generation, error = %error, "Analysis failed");
                            error.user_message()
                        });
                    let _ = events.send(FlowEvent::AnalysisFinished {
                        generation,
                        outcome,
                    });
                });
            }
        }
    }
}
