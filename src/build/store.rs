//! The current build record.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::identity::IdentityTriple;

/// Style and code text of one successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub style: String,
    pub code: String,
}

impl Outputs {
    pub fn new(style: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            code: code.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildStatus {
    Pending,
    Succeeded,
    Failed,
}

/// Snapshot of the latest build attempt.
///
/// `sequence` 0 means no build has been attempted yet. Outputs are present
/// after a success and stay readable while the next build is pending.
#[derive(Debug, Clone)]
pub struct BuildRecord {
    pub sequence: u64,
    pub status: BuildStatus,
    pub outputs: Option<Arc<Outputs>>,
    pub identity: Option<IdentityTriple>,
}

impl BuildRecord {
    const fn empty() -> Self {
        Self {
            sequence: 0,
            status: BuildStatus::Pending,
            outputs: None,
            identity: None,
        }
    }

    pub fn style(&self) -> Option<&str> {
        self.outputs.as_deref().map(|o| o.style.as_str())
    }

    pub fn code(&self) -> Option<&str> {
        self.outputs.as_deref().map(|o| o.code.as_str())
    }
}

/// Lock-free holder of the current [`BuildRecord`].
///
/// Written only by the orchestrator; read by request handlers at any time.
pub struct BuildStore {
    current: ArcSwap<BuildRecord>,
}

impl Default for BuildStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BuildStore {
    pub fn new() -> Self {
        Self {
            current: ArcSwap::from_pointee(BuildRecord::empty()),
        }
    }

    pub fn load(&self) -> Arc<BuildRecord> {
        self.current.load_full()
    }

    /// Start attempt `sequence`, keeping the previous outputs readable.
    pub(super) fn mark_pending(&self, sequence: u64) {
        let prev = self.current.load();
        self.current.store(Arc::new(BuildRecord {
            sequence,
            status: BuildStatus::Pending,
            outputs: prev.outputs.clone(),
            identity: prev.identity.clone(),
        }));
    }

    pub(super) fn publish(&self, sequence: u64, outputs: Arc<Outputs>, identity: IdentityTriple) {
        self.current.store(Arc::new(BuildRecord {
            sequence,
            status: BuildStatus::Succeeded,
            outputs: Some(outputs),
            identity: Some(identity),
        }));
    }

    /// Drop cached outputs so nothing stale is served.
    pub(super) fn invalidate(&self, sequence: u64) {
        self.current.store(Arc::new(BuildRecord {
            sequence,
            status: BuildStatus::Failed,
            outputs: None,
            identity: None,
        }));
    }
}
