//! Actor message definitions.

use crate::build::Trigger;

/// Messages to the build actor.
#[derive(Debug)]
pub enum BuildMsg {
    /// Request a build. Dropped by the orchestrator if one is running.
    Trigger(Trigger),
    Shutdown,
}
