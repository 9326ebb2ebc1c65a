//! Orchestrator behavior with scripted engines.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;

use crossbeam::channel::{Receiver, Sender, bounded};
use parking_lot::Mutex;

use super::store::BuildStatus;
use super::*;
use crate::bundle::{BundleEngine, BundleError, BundleOutput, BundleRequest, StyleFragment};
use crate::core::OutputMode;
use crate::identity::compute_identity;

// ============================================================================
// Fakes
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Style(String),
    Code,
    Error,
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<Event>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<Event> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl Broadcast for RecordingSink {
    fn broadcast_style_change(&self, css: &str) {
        self.events.lock().push(Event::Style(css.to_string()));
    }
    fn broadcast_code_change(&self) {
        self.events.lock().push(Event::Code);
    }
    fn broadcast_build_error(&self) {
        self.events.lock().push(Event::Error);
    }
}

/// Returns scripted results in order; `(style, code)` pairs or errors.
#[derive(Default)]
struct ScriptedEngine {
    results: Mutex<VecDeque<Result<(String, String), String>>>,
    calls: AtomicUsize,
    gate: Option<(Sender<()>, Receiver<()>)>,
}

impl ScriptedEngine {
    fn new(results: &[Result<(&str, &str), &str>]) -> Self {
        Self {
            results: Mutex::new(
                results
                    .iter()
                    .map(|r| {
                        r.map(|(s, c)| (s.to_string(), c.to_string()))
                            .map_err(str::to_string)
                    })
                    .collect(),
            ),
            ..Default::default()
        }
    }

    /// Every call announces itself on `entered` and waits for `release`.
    fn gated(mut self, entered: Sender<()>, release: Receiver<()>) -> Self {
        self.gate = Some((entered, release));
        self
    }
}

impl BundleEngine for ScriptedEngine {
    fn bundle(&self, _request: &BundleRequest) -> Result<BundleOutput, BundleError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some((entered, release)) = &self.gate {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }
        let next = self
            .results
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err("no scripted result".into()));
        match next {
            Ok((style, code)) => Ok(BundleOutput {
                code,
                styles: vec![StyleFragment::new("src/app.css", style)],
            }),
            Err(message) => Err(BundleError::Engine(message)),
        }
    }
}

fn settings(require_changes_to_refresh: bool) -> BuildSettings {
    BuildSettings {
        project_name: "test-ext".into(),
        entry: "src/index.tsx".into(),
        out_dir: ".livebundle".into(),
        mode: OutputMode::Development,
        require_changes_to_refresh,
    }
}

fn setup(engine: ScriptedEngine) -> (Arc<Orchestrator>, Arc<ScriptedEngine>, Arc<RecordingSink>) {
    let engine = Arc::new(engine);
    let sink = Arc::new(RecordingSink::default());
    let orchestrator = Orchestrator::new(
        engine.clone(),
        Arc::new(BuildStore::new()),
        sink.clone(),
        settings(true),
    );
    (Arc::new(orchestrator), engine, sink)
}

fn rendered(style: &str) -> String {
    format!("/* src/app.css */\n{style}")
}

// ============================================================================
// Single-flight
// ============================================================================

#[test]
fn test_triggers_during_build_are_dropped() {
    let (entered_tx, entered_rx) = bounded(1);
    let (release_tx, release_rx) = bounded(1);
    let engine = ScriptedEngine::new(&[Ok(("a", "A"))]).gated(entered_tx, release_rx);
    let (orch, engine, _) = setup(engine);

    let running = {
        let orch = Arc::clone(&orch);
        thread::spawn(move || orch.run_build(Trigger::Manual))
    };
    entered_rx.recv().unwrap();
    assert!(orch.is_building());

    for _ in 0..5 {
        assert_eq!(orch.run_build(Trigger::Manual), BuildOutcome::Skipped);
    }

    release_tx.send(()).unwrap();
    let outcome = running.join().unwrap();
    assert!(matches!(outcome, BuildOutcome::Succeeded { sequence: 1, .. }));
    assert_eq!(engine.calls.load(Ordering::SeqCst), 1);
    assert!(!orch.is_building());
}

#[test]
fn test_readers_see_previous_outputs_during_build() {
    let (entered_tx, entered_rx) = bounded(2);
    let (release_tx, release_rx) = bounded(2);
    let engine = ScriptedEngine::new(&[Ok(("a", "A")), Ok(("a", "B"))])
        .gated(entered_tx, release_rx);
    let (orch, _, _) = setup(engine);

    release_tx.send(()).unwrap();
    orch.run_build(Trigger::Startup);
    entered_rx.recv().unwrap();
    let first_code = orch.store().load().code().map(str::to_string);

    let running = {
        let orch = Arc::clone(&orch);
        thread::spawn(move || orch.run_build(Trigger::Manual))
    };
    entered_rx.recv().unwrap();

    let record = orch.store().load();
    assert_eq!(record.sequence, 2);
    assert_eq!(record.status, BuildStatus::Pending);
    assert_eq!(record.code().map(str::to_string), first_code);

    release_tx.send(()).unwrap();
    running.join().unwrap();
    assert_ne!(orch.store().load().code().map(str::to_string), first_code);
}

#[test]
fn test_sequence_counts_every_attempt() {
    let (orch, _, _) = setup(ScriptedEngine::new(&[
        Ok(("a", "A")),
        Err("boom"),
        Ok(("a", "A")),
    ]));
    assert!(matches!(orch.run_build(Trigger::Manual), BuildOutcome::Succeeded { sequence: 1, .. }));
    assert!(matches!(orch.run_build(Trigger::Manual), BuildOutcome::Failed { sequence: 2, .. }));
    assert!(matches!(orch.run_build(Trigger::Manual), BuildOutcome::Succeeded { sequence: 3, .. }));
    assert_eq!(orch.store().load().sequence, 3);
}

// ============================================================================
// Change classification and broadcasts
// ============================================================================

#[test]
fn test_first_success_never_broadcasts() {
    let (orch, _, sink) = setup(ScriptedEngine::new(&[Ok(("a", "A"))]));

    let outcome = orch.run_build(Trigger::Startup);
    assert_eq!(
        outcome,
        BuildOutcome::Succeeded {
            sequence: 1,
            change: Change::NoOp
        }
    );
    assert!(sink.take().is_empty());

    let record = orch.store().load();
    assert_eq!(record.status, BuildStatus::Succeeded);
    assert_eq!(record.style(), Some(rendered("a").as_str()));
    assert!(record.code().is_some_and(|c| c.ends_with('A')));
}

#[test]
fn test_code_change_sends_code_reload_only() {
    let (orch, _, sink) = setup(ScriptedEngine::new(&[Ok(("a", "A")), Ok(("b", "B"))]));
    orch.run_build(Trigger::Startup);

    let outcome = orch.run_build(Trigger::Manual);
    assert!(matches!(
        outcome,
        BuildOutcome::Succeeded {
            change: Change::CodeChanged,
            ..
        }
    ));
    assert_eq!(sink.take(), vec![Event::Code]);
}

#[test]
fn test_style_only_sends_new_style_text() {
    let (orch, _, sink) = setup(ScriptedEngine::new(&[Ok(("a", "A")), Ok(("b", "A"))]));
    orch.run_build(Trigger::Startup);

    let outcome = orch.run_build(Trigger::Manual);
    assert!(matches!(
        outcome,
        BuildOutcome::Succeeded {
            change: Change::StyleOnly,
            ..
        }
    ));
    assert_eq!(sink.take(), vec![Event::Style(rendered("b"))]);
}

#[test]
fn test_unchanged_build_is_silent() {
    let (orch, _, sink) = setup(ScriptedEngine::new(&[Ok(("a", "A")), Ok(("a", "A"))]));
    orch.run_build(Trigger::Startup);
    orch.run_build(Trigger::Manual);
    assert!(sink.take().is_empty());
}

#[test]
fn test_always_refresh_reloads_unchanged_build() {
    let engine = Arc::new(ScriptedEngine::new(&[Ok(("a", "A")), Ok(("a", "A"))]));
    let sink = Arc::new(RecordingSink::default());
    let orch = Orchestrator::new(
        engine,
        Arc::new(BuildStore::new()),
        sink.clone(),
        settings(false),
    );

    orch.run_build(Trigger::Startup);
    assert!(sink.take().is_empty());
    orch.run_build(Trigger::Manual);
    assert_eq!(sink.take(), vec![Event::Code]);
}

// ============================================================================
// Failure recovery
// ============================================================================

#[test]
fn test_failure_invalidates_cache() {
    let (orch, _, sink) = setup(ScriptedEngine::new(&[Ok(("a", "A")), Err("Could not resolve")]));
    orch.run_build(Trigger::Startup);
    assert!(orch.store().load().code().is_some());

    let outcome = orch.run_build(Trigger::Manual);
    assert_eq!(
        outcome,
        BuildOutcome::Failed {
            sequence: 2,
            error: "Could not resolve".into()
        }
    );
    let record = orch.store().load();
    assert_eq!(record.status, BuildStatus::Failed);
    assert!(record.code().is_none());
    assert!(record.style().is_none());
    assert_eq!(sink.take(), vec![Event::Error]);
}

#[test]
fn test_baseline_survives_failure() {
    let (orch, _, sink) = setup(ScriptedEngine::new(&[
        Ok(("a", "A")),
        Err("syntax error"),
        Ok(("b", "A")),
    ]));
    orch.run_build(Trigger::Startup);
    orch.run_build(Trigger::Manual);
    assert_eq!(sink.take(), vec![Event::Error]);

    let outcome = orch.run_build(Trigger::Manual);
    assert!(matches!(
        outcome,
        BuildOutcome::Succeeded {
            change: Change::StyleOnly,
            ..
        }
    ));
    assert_eq!(sink.take(), vec![Event::Style(rendered("b"))]);
}

#[test]
fn test_success_after_failed_startup_reloads_code() {
    let (orch, _, sink) = setup(ScriptedEngine::new(&[Err("missing entry"), Ok(("a", "A"))]));
    orch.run_build(Trigger::Startup);
    assert_eq!(sink.take(), vec![Event::Error]);

    let outcome = orch.run_build(Trigger::Manual);
    assert_eq!(
        outcome,
        BuildOutcome::Succeeded {
            sequence: 2,
            change: Change::CodeChanged
        }
    );
    assert_eq!(sink.take(), vec![Event::Code]);
    assert!(orch.store().load().code().is_some());
}

// ============================================================================
// Identity
// ============================================================================

#[test]
fn test_served_code_carries_identity() {
    let (orch, _, _) = setup(ScriptedEngine::new(&[Ok(("a", "export {};"))]));
    orch.run_build(Trigger::Startup);

    let expected = compute_identity("test-ext", "export {};");
    let record = orch.store().load();
    assert_eq!(record.identity.as_ref(), Some(&expected));
    assert!(record.code().is_some_and(|c| c.contains(&expected.combined)));
}

#[test]
fn test_trigger_display() {
    assert_eq!(Trigger::Manual.to_string(), "manual");
    assert_eq!(
        Trigger::Watch(vec!["src/a.tsx".into(), "src/b.tsx".into()]).to_string(),
        "2 files changed"
    );
}
