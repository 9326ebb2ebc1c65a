//! `livebundle dev`: interactive live session.
//!
//! Operator input on stdin:
//!
//! | input   | action                                           |
//! |---------|--------------------------------------------------|
//! | Enter   | bundle now                                       |
//! | `q`     | exit and remove the dev agent file               |
//! | `l`     | exit and store an offline bundle as the agent    |
//!
//! Ctrl+C behaves like `q`.

use std::fs;
use std::io::BufRead;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use crossbeam::channel::Receiver;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::release::write_standalone;
use crate::actor::{BuildMsg, Coordinator};
use crate::build::{Broadcast, BuildSettings, BuildStore, Orchestrator, Trigger};
use crate::bundle::{BundleEngine, EsbuildEngine, compose};
use crate::config::LiveConfig;
use crate::core::{self, OutputMode};
use crate::embed::{DEV_AGENT_JS, DevAgentVars};
use crate::reload::{ReloadHub, ReloadServer};
use crate::utils::path::display_relative;
use crate::{debug, log, logger};

/// What the session does on the way out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    RemoveAgent,
    StoreOffline,
}

/// One line of operator input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Build,
    Quit(Exit),
}

fn parse_command(line: &str) -> Option<Command> {
    match line.trim() {
        "" => Some(Command::Build),
        "q" => Some(Command::Quit(Exit::RemoveAgent)),
        "l" => Some(Command::Quit(Exit::StoreOffline)),
        _ => None,
    }
}

/// Run a dev session until the operator exits.
pub fn run_dev(config: &LiveConfig, shutdown_rx: Receiver<()>) -> Result<()> {
    let engine: Arc<dyn BundleEngine> = Arc::new(EsbuildEngine::new(config)?);
    let store = Arc::new(BuildStore::new());
    let hub = Arc::new(ReloadHub::new(Arc::clone(&store)));
    let server = ReloadServer::start(Arc::clone(&hub), config.serve.interface, config.serve.port)?;

    let ws_url = config.serve.ws_url(server.port());
    write_dev_agent(config, &ws_url)?;
    log!("dev"; "reload server on {}", ws_url);

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::clone(&engine),
        store,
        Arc::clone(&hub) as Arc<dyn Broadcast>,
        BuildSettings {
            project_name: config.project.name.clone(),
            entry: config.project.entry.clone(),
            out_dir: config.build.cache_dir.join(OutputMode::Development.as_str()),
            mode: OutputMode::Development,
            require_changes_to_refresh: config.build.require_changes_to_refresh,
        },
    ));

    let mut coordinator = Coordinator::new(orchestrator).with_shutdown_signal(shutdown_rx);
    if config.serve.watch {
        coordinator = coordinator.with_watch(
            config.serve.watch_paths.clone(),
            vec![config.build.out_dir.clone(), config.build.cache_dir.clone()],
        );
        log!("watch"; "watching {}", watched_labels(config));
    }

    let exit = Arc::new(Mutex::new(None));
    spawn_operator_input(coordinator.trigger_sender(), Arc::clone(&exit));
    log!("dev"; "press Enter to bundle, `q` to quit, `l` to quit with an offline bundle");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    rt.block_on(coordinator.run())?;
    debug!("dev"; "closing {} client connection(s)", hub.client_count());
    // Let a running build finish before touching the agent file.
    rt.shutdown_timeout(std::time::Duration::from_secs(30));
    drop(server);
    logger::status_detach();

    let exit = exit.lock().unwrap_or(Exit::RemoveAgent);
    finish(config, engine.as_ref(), exit)
}

/// Render the dev agent and store it at the agent path.
fn write_dev_agent(config: &LiveConfig, ws_url: &str) -> Result<()> {
    let js = DEV_AGENT_JS.render(&DevAgentVars {
        ws_url: ws_url.to_string(),
        name: config.project.name.clone(),
        required: compose::required_globals(config.bundler.globals.values()),
    });
    let path = config.agent_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(&path, js).with_context(|| format!("failed to write {}", path.display()))?;
    debug!("dev"; "agent written to {}", path.display());
    Ok(())
}

fn finish(config: &LiveConfig, engine: &dyn BundleEngine, exit: Exit) -> Result<()> {
    let path = config.agent_path();
    match exit {
        Exit::RemoveAgent => {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(e).with_context(|| format!("failed to remove {}", path.display()));
                }
            }
            log!("dev"; "removed {}", display_relative(&path, config.get_root()));
            Ok(())
        }
        Exit::StoreOffline => write_standalone(config, engine, OutputMode::Offline, &path),
    }
}

/// Read operator commands from stdin on a background thread.
///
/// End of input stops reading but does not end the session.
fn spawn_operator_input(triggers: mpsc::Sender<BuildMsg>, exit: Arc<Mutex<Option<Exit>>>) {
    let spawned = thread::Builder::new()
        .name("livebundle-stdin".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                match parse_command(&line) {
                    Some(Command::Build) => {
                        if triggers
                            .blocking_send(BuildMsg::Trigger(Trigger::Manual))
                            .is_err()
                        {
                            break;
                        }
                    }
                    Some(Command::Quit(choice)) => {
                        *exit.lock() = Some(choice);
                        core::request_shutdown();
                        break;
                    }
                    None => log!("dev"; "unknown command `{}`", line.trim()),
                }
            }
        });
    if let Err(e) = spawned {
        log!("dev"; "operator input unavailable: {}", e);
    }
}

fn watched_labels(config: &LiveConfig) -> String {
    config
        .serve
        .watch_paths
        .iter()
        .map(|p| display_relative(p, config.get_root()))
        .collect::<Vec<_>>()
        .join(", ")
}
