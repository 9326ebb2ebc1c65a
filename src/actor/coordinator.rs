//! Actor coordinator: wires the dev session actors together and runs them
//! until shutdown.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use tokio::sync::mpsc;

use super::build::BuildActor;
use super::fs::FsActor;
use super::messages::BuildMsg;
use crate::build::{Orchestrator, Trigger};
use crate::{core, debug};

const CHANNEL_BUFFER: usize = 32;

/// Runs the build actor and, when watching, the file system actor.
pub struct Coordinator {
    orchestrator: Arc<Orchestrator>,
    watch: Option<(Vec<PathBuf>, Vec<PathBuf>)>,
    shutdown_rx: Option<Receiver<()>>,
    build_tx: mpsc::Sender<BuildMsg>,
    build_rx: mpsc::Receiver<BuildMsg>,
}

impl Coordinator {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let (build_tx, build_rx) = mpsc::channel(CHANNEL_BUFFER);
        Self {
            orchestrator,
            watch: None,
            shutdown_rx: None,
            build_tx,
            build_rx,
        }
    }

    /// Watch `roots`, ignoring changes under `ignored`.
    pub fn with_watch(mut self, roots: Vec<PathBuf>, ignored: Vec<PathBuf>) -> Self {
        self.watch = Some((roots, ignored));
        self
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Sender for triggers from outside the actor system (operator input).
    pub fn trigger_sender(&self) -> mpsc::Sender<BuildMsg> {
        self.build_tx.clone()
    }

    /// Run the startup build, then serve triggers until shutdown.
    pub async fn run(self) -> Result<()> {
        // Watcher first, so edits during the startup build are not lost.
        let fs_actor = match self.watch {
            Some((roots, ignored)) => Some(
                FsActor::new(roots, ignored, self.build_tx.clone())
                    .context("failed to start file watcher")?,
            ),
            None => None,
        };

        self.build_tx
            .send(BuildMsg::Trigger(Trigger::Startup))
            .await
            .context("build actor unavailable")?;

        let build_handle = tokio::spawn(BuildActor::new(self.build_rx, self.orchestrator).run());
        let fs_handle = fs_actor.map(|actor| tokio::spawn(actor.run()));

        debug!("actor"; "start");
        let Some(shutdown_rx) = self.shutdown_rx else {
            // Runs until every trigger sender is gone.
            drop(self.build_tx);
            let _ = build_handle.await;
            return Ok(());
        };
        while shutdown_rx.try_recv().is_err() && !core::is_shutdown() {
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        debug!("actor"; "shutdown signal received");

        if let Some(handle) = fs_handle {
            handle.abort();
        }
        let _ = self.build_tx.send(BuildMsg::Shutdown).await;
        let _ = tokio::time::timeout(Duration::from_millis(500), build_handle).await;

        debug!("actor"; "stopped");
        Ok(())
    }
}
