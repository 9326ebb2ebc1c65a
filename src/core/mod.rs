//! Core types - pure abstractions shared across the codebase.

mod mode;
mod state;

pub use mode::OutputMode;
pub use state::{is_shutdown, request_shutdown, setup_shutdown_handler};
