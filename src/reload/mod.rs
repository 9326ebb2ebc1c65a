//! Live update transport.
//!
//! # Architecture
//!
//! ```text
//!                       ┌──────────── ReloadHub ────────────┐
//! Orchestrator ──────►  │ broadcast_* ─► ClientRegistry ─┐  │
//!   (Broadcast)         │ handle_request ◄─ BuildStore   │  │
//!                       └────────────────────────────────┼──┘
//!                                   per-client queue     ▼
//! ReloadServer ─ accept ─► connection thread ◄──► WebSocket ◄──► agent
//! ```
//!
//! Every connection runs on its own thread; one failing connection never
//! affects the others.

mod connection;
mod hub;
pub mod protocol;
mod registry;
mod server;

#[cfg(test)]
mod tests;

pub use hub::ReloadHub;
pub use protocol::{ReloadEvent, RequestTarget, WireMessage, parse_server_url};
pub use server::ReloadServer;
