//! Connected client registry.

use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam::channel::{Receiver, Sender, unbounded};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

/// Registry-assigned connection id.
pub type ClientId = u64;

/// Outbound queues of every live connection, keyed by client id.
///
/// Only the transport adds and removes entries.
#[derive(Default)]
pub struct ClientRegistry {
    next_id: AtomicU64,
    clients: Mutex<FxHashMap<ClientId, Sender<String>>>,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a client and return its id with the receiving end of its queue.
    pub fn register(&self) -> (ClientId, Receiver<String>) {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let (tx, rx) = unbounded();
        self.clients.lock().insert(id, tx);
        (id, rx)
    }

    /// Remove a client. Returns `false` if it was already gone.
    pub fn remove(&self, id: ClientId) -> bool {
        self.clients.lock().remove(&id).is_some()
    }

    /// Queue `text` for one client. `false` if the client is gone.
    pub fn send_to(&self, id: ClientId, text: String) -> bool {
        let sender = self.clients.lock().get(&id).cloned();
        sender.is_some_and(|tx| tx.send(text).is_ok())
    }

    /// Current clients, cloned so sending happens outside the lock.
    pub fn snapshot(&self) -> Vec<(ClientId, Sender<String>)> {
        self.clients
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.clients.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every queue; connection threads notice and close.
    pub fn clear(&self) {
        self.clients.lock().clear();
    }
}
