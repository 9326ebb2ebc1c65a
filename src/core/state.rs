//! Process-wide shutdown state.
//!
//! `SHUTDOWN` is set by the Ctrl+C handler or by an operator exit command.
//! Long-running loops poll it and wind down.

use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shutdown has been requested
static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Listener notified once when shutdown is requested
static SHUTDOWN_TX: OnceLock<crossbeam::channel::Sender<()>> = OnceLock::new();

/// Setup the global Ctrl+C handler. Call once at program start.
///
/// Returns a receiver that yields once on the first shutdown request.
pub fn setup_shutdown_handler() -> anyhow::Result<crossbeam::channel::Receiver<()>> {
    let (tx, rx) = crossbeam::channel::bounded(1);
    let _ = SHUTDOWN_TX.set(tx);

    ctrlc::set_handler(|| {
        crate::log!("dev"; "shutting down...");
        request_shutdown();
    })
    .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))?;

    Ok(rx)
}

/// Request shutdown (operator exit command or signal).
pub fn request_shutdown() {
    if !SHUTDOWN.swap(true, Ordering::SeqCst)
        && let Some(tx) = SHUTDOWN_TX.get()
    {
        let _ = tx.try_send(());
    }
}

/// Check if shutdown has been requested
pub fn is_shutdown() -> bool {
    SHUTDOWN.load(Ordering::Relaxed)
}
