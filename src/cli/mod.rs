//! Command-line interface module.

mod args;
pub mod attach;
pub mod dev;
pub mod release;

pub use args::{BundleArgs, Cli, Commands};
