//! Build orchestration for live sessions.
//!
//! ```text
//! trigger ─► Orchestrator::run_build ─► BundleEngine
//!                  │                        │
//!                  │◄───── BundleOutput ────┘
//!                  ├─► BuildStore (current record, read by the transport)
//!                  ├─► classify(baseline, outputs)
//!                  └─► Broadcast (css_reload / code_reload / bundle_error)
//! ```

mod change;
mod orchestrator;
mod store;

#[cfg(test)]
mod tests;

pub use change::{Change, classify};
pub use orchestrator::{Broadcast, BuildOutcome, BuildSettings, Orchestrator, Trigger};
pub use store::{BuildStore, Outputs};
