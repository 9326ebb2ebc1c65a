//! FileSystem actor.
//!
//! ```text
//! notify watcher → Debouncer → filter ignored dirs → BuildMsg::Trigger
//! ```
//!
//! The watcher is created before the startup build runs, so changes made
//! during that build are buffered instead of lost.

mod debouncer;
mod types;


use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;

use super::messages::BuildMsg;
use crate::build::Trigger;
use crate::utils::path::normalize_path;
use crate::{debug, log};
use debouncer::Debouncer;

/// Watches source roots and turns quiet periods after changes into triggers.
pub struct FsActor {
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    roots: WatchedRoots,
    /// Output locations; changes below them never trigger builds.
    ignored: Vec<PathBuf>,
    build_tx: mpsc::Sender<BuildMsg>,
}

impl FsActor {
    pub fn new(
        roots: Vec<PathBuf>,
        ignored: Vec<PathBuf>,
        build_tx: mpsc::Sender<BuildMsg>,
    ) -> notify::Result<Self> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut roots = WatchedRoots {
            watcher,
            wanted: roots.iter().map(|p| normalize_path(p)).collect(),
            attached: FxHashSet::default(),
        };
        roots.attach();

        Ok(Self {
            notify_rx,
            roots,
            ignored: ignored.iter().map(|p| normalize_path(p)).collect(),
            build_tx,
        })
    }

    pub async fn run(self) {
        let Self {
            notify_rx,
            mut roots,
            ignored,
            build_tx,
        } = self;
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // notify delivers on a std channel; bridge it into tokio.
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break;
                        }
                    }
                    Err(e) => log!("watch"; "notify error: {}", e),
                }
            }
        });

        let mut debouncer = Debouncer::new();
        loop {
            tokio::select! {
                biased;
                event = async_rx.recv() => match event {
                    Some(event) => debouncer.add_event(&event),
                    None => break,
                },
                _ = tokio::time::sleep(debouncer.sleep_duration()) => {
                    roots.attach();
                    let ready = debouncer.take_if_ready();
                    let Some(trigger) = ready.and_then(|paths| trigger_for(paths, &ignored)) else {
                        continue;
                    };
                    if build_tx.send(BuildMsg::Trigger(trigger)).await.is_err() {
                        break;
                    }
                }
            }
        }
    }
}

/// Watcher plus the roots it should cover.
struct WatchedRoots {
    watcher: RecommendedWatcher,
    wanted: Vec<PathBuf>,
    attached: FxHashSet<PathBuf>,
}

impl WatchedRoots {
    /// Register roots that exist and are not yet watched. Deleted roots are
    /// forgotten so they get re-attached once recreated.
    fn attach(&mut self) {
        self.attached.retain(|root| root.exists());
        for root in &self.wanted {
            if self.attached.contains(root) || !root.exists() {
                continue;
            }
            match self.watcher.watch(root, RecursiveMode::Recursive) {
                Ok(()) => {
                    debug!("watch"; "watching {}", root.display());
                    self.attached.insert(root.clone());
                }
                Err(e) => log!("watch"; "cannot watch {}: {}", root.display(), e),
            }
        }
    }
}

/// Build trigger for debounced paths, or `None` if all were ignored.
fn trigger_for(paths: Vec<PathBuf>, ignored: &[PathBuf]) -> Option<Trigger> {
    let paths = filter_ignored(paths, ignored);
    if paths.is_empty() {
        return None;
    }
    let trigger = Trigger::Watch(paths);
    log!("watch"; "{}", trigger);
    Some(trigger)
}

/// Drop paths inside any of the `ignored` directories.
fn filter_ignored(paths: Vec<PathBuf>, ignored: &[PathBuf]) -> Vec<PathBuf> {
    paths
        .into_iter()
        .filter(|path| !ignored.iter().any(|dir| path.starts_with(dir)))
        .collect()
}
