//! Actor system for a dev session.
//!
//! ```text
//! FsActor ──Trigger──┐
//!  (watch)           ├──► BuildActor ──spawn_blocking──► Orchestrator
//! stdin ──Trigger────┘     (never waits)
//! ```
//!
//! - `messages` - message types
//! - `fs` - file watcher with debouncing
//! - `build` - forwards triggers to the orchestrator
//! - `coordinator` - wires up and runs the actors

mod build;
pub mod coordinator;
pub mod fs;
pub mod messages;

pub use coordinator::Coordinator;
pub use messages::BuildMsg;
