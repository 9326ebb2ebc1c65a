//! Build actor.

use std::sync::Arc;

use tokio::sync::mpsc;

use super::messages::BuildMsg;
use crate::build::{BuildOutcome, Orchestrator};
use crate::debug;

/// Hands each trigger to the orchestrator on the blocking pool.
pub(super) struct BuildActor {
    rx: mpsc::Receiver<BuildMsg>,
    orchestrator: Arc<Orchestrator>,
}

impl BuildActor {
    pub(super) fn new(rx: mpsc::Receiver<BuildMsg>, orchestrator: Arc<Orchestrator>) -> Self {
        Self { rx, orchestrator }
    }

    pub(super) async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                BuildMsg::Trigger(trigger) => {
                    if self.orchestrator.is_building() {
                        debug!("build"; "{trigger} dropped: build in progress");
                        continue;
                    }
                    let orchestrator = Arc::clone(&self.orchestrator);
                    // Not awaited: the next trigger must meet the in-flight guard.
                    tokio::task::spawn_blocking(move || {
                        if let BuildOutcome::Skipped = orchestrator.run_build(trigger) {
                            debug!("build"; "trigger dropped");
                        }
                    });
                }
                BuildMsg::Shutdown => break,
            }
        }
    }
}
