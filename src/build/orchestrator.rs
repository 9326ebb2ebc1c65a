//! Single-flight build pipeline.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use parking_lot::Mutex;

use super::{BuildStore, Change, Outputs, classify};
use crate::bundle::{BundleEngine, BundleRequest, compose};
use crate::core::OutputMode;
use crate::identity::compute_identity;
use crate::{debug, logger};

/// Receiver of the events a build produces.
///
/// Implemented by the reload transport; each call is best-effort.
pub trait Broadcast: Send + Sync {
    fn broadcast_style_change(&self, css: &str);
    fn broadcast_code_change(&self);
    fn broadcast_build_error(&self);
}

/// Why a build was requested.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    /// Operator pressed Enter.
    Manual,
    /// Debounced file changes.
    Watch(Vec<PathBuf>),
    /// Initial build when the session starts.
    Startup,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Manual => f.write_str("manual"),
            Self::Startup => f.write_str("startup"),
            Self::Watch(paths) if paths.len() == 1 => {
                write!(f, "{}", paths[0].display())
            }
            Self::Watch(paths) => write!(f, "{} files changed", paths.len()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    /// Another build was in flight; this trigger did nothing.
    Skipped,
    Succeeded { sequence: u64, change: Change },
    Failed { sequence: u64, error: String },
}

/// What the orchestrator builds.
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub project_name: String,
    pub entry: PathBuf,
    pub out_dir: PathBuf,
    pub mode: OutputMode,
    pub require_changes_to_refresh: bool,
}

/// Runs at most one build at a time and publishes its result.
pub struct Orchestrator {
    engine: Arc<dyn BundleEngine>,
    store: Arc<BuildStore>,
    sink: Arc<dyn Broadcast>,
    settings: BuildSettings,
    building: AtomicBool,
    sequence: AtomicU64,
    /// Outputs of the last successful build; kept across failures.
    baseline: Mutex<Option<Arc<Outputs>>>,
}

/// Clears the in-flight flag when the build ends, however it ends.
struct InFlight<'a>(&'a AtomicBool);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Orchestrator {
    pub fn new(
        engine: Arc<dyn BundleEngine>,
        store: Arc<BuildStore>,
        sink: Arc<dyn Broadcast>,
        settings: BuildSettings,
    ) -> Self {
        Self {
            engine,
            store,
            sink,
            settings,
            building: AtomicBool::new(false),
            sequence: AtomicU64::new(0),
            baseline: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &Arc<BuildStore> {
        &self.store
    }

    pub fn is_building(&self) -> bool {
        self.building.load(Ordering::Acquire)
    }

    fn try_begin(&self) -> Option<InFlight<'_>> {
        self.building
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(&self.building))
    }

    /// Run one build. Blocks for the duration of the engine call.
    ///
    /// Returns [`BuildOutcome::Skipped`] without doing anything when a build
    /// is already running.
    pub fn run_build(&self, trigger: Trigger) -> BuildOutcome {
        let Some(_guard) = self.try_begin() else {
            debug!("build"; "skipped ({trigger}): build in progress");
            return BuildOutcome::Skipped;
        };

        let sequence = self.sequence.fetch_add(1, Ordering::AcqRel) + 1;
        self.store.mark_pending(sequence);
        debug!("build"; "#{sequence} started ({trigger})");

        let request = BundleRequest {
            entry: self.settings.entry.clone(),
            mode: self.settings.mode,
            out_dir: self.settings.out_dir.clone(),
        };

        match self.engine.bundle(&request) {
            Ok(output) => {
                let identity = compute_identity(&self.settings.project_name, &output.code);
                let outputs = Arc::new(Outputs {
                    style: output.joined_styles(),
                    code: compose::served_code(&identity, &output.code),
                });
                self.store.publish(sequence, Arc::clone(&outputs), identity);

                let previous = self.baseline.lock().replace(Arc::clone(&outputs));
                let first = sequence == 1;
                // Agents that connected after a failed startup loaded nothing.
                let change = match previous.as_deref() {
                    None if !first => Change::CodeChanged,
                    previous => classify(previous, &outputs),
                };
                self.announce(sequence, change, first, &outputs);

                BuildOutcome::Succeeded { sequence, change }
            }
            Err(e) => {
                let error = e.to_string();
                self.store.invalidate(sequence);
                logger::status_error(&format!("build #{sequence} failed"), &error);
                self.sink.broadcast_build_error();
                BuildOutcome::Failed { sequence, error }
            }
        }
    }

    /// Tell clients about a successful build.
    fn announce(&self, sequence: u64, change: Change, first: bool, outputs: &Outputs) {
        if first {
            logger::status_success(&format!("build #{sequence}: ready"));
            return;
        }

        match change {
            Change::StyleOnly => self.sink.broadcast_style_change(&outputs.style),
            Change::CodeChanged => self.sink.broadcast_code_change(),
            Change::NoOp if !self.settings.require_changes_to_refresh => {
                self.sink.broadcast_code_change();
                logger::status_success(&format!("build #{sequence}: reload requested"));
                return;
            }
            Change::NoOp => {
                logger::status_unchanged(&format!("build #{sequence}: {}", change.as_str()));
                return;
            }
        }
        logger::status_success(&format!("build #{sequence}: {}", change.as_str()));
    }
}
