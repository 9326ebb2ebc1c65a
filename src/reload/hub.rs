//! Request handling and broadcasting over registered clients.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam::channel::Receiver;

use super::protocol::{BUNDLE_REQUEST, ReloadEvent, RequestTarget, WireMessage};
use super::registry::{ClientId, ClientRegistry};
use crate::build::{Broadcast, BuildStore};
use crate::debug;

/// Shared state of the reload transport.
///
/// Answers requests from the current build record and fans events out to
/// every registered client.
pub struct ReloadHub {
    registry: ClientRegistry,
    store: Arc<BuildStore>,
    closed: AtomicBool,
}

impl ReloadHub {
    pub fn new(store: Arc<BuildStore>) -> Self {
        Self {
            registry: ClientRegistry::new(),
            store,
            closed: AtomicBool::new(false),
        }
    }

    /// Register a connection after a successful handshake.
    pub fn register_client(&self) -> (ClientId, Receiver<String>) {
        let (id, rx) = self.registry.register();
        debug!("ws"; "client #{id} connected (total: {})", self.registry.len());
        (id, rx)
    }

    pub fn deregister_client(&self, id: ClientId) {
        if self.registry.remove(id) {
            debug!("ws"; "client #{id} disconnected (total: {})", self.registry.len());
        }
    }

    pub fn client_count(&self) -> usize {
        self.registry.len()
    }

    /// Handle one inbound text frame. Anything but a bundle request is ignored.
    pub fn handle_text(&self, client: ClientId, text: &str) {
        match WireMessage::parse(text) {
            Some(WireMessage::Request {
                content_type,
                content,
                identifier,
            }) if content_type == BUNDLE_REQUEST => {
                self.handle_request(client, &identifier, &content);
            }
            Some(other) => debug!("ws"; "client #{client}: ignoring {:?}", other),
            None => debug!("ws"; "client #{client}: ignoring malformed message"),
        }
    }

    /// Answer a `code` or `styles` request with the cached output.
    ///
    /// The response echoes `identifier` and omits content when no successful
    /// build is cached. Unknown request contents get no response.
    pub fn handle_request(&self, client: ClientId, identifier: &str, content: &str) {
        let Some(target) = RequestTarget::parse(content) else {
            debug!("ws"; "client #{client}: unknown request `{content}`");
            return;
        };

        let record = self.store.load();
        let cached = match target {
            RequestTarget::Code => record.code(),
            RequestTarget::Styles => record.style(),
        };
        let response = WireMessage::response(cached.map(str::to_string), identifier);
        if !self.registry.send_to(client, response.to_json()) {
            self.deregister_client(client);
        }
    }

    /// Send to every client; failed clients are removed afterwards.
    fn broadcast(&self, message: &WireMessage) {
        let clients = self.registry.snapshot();
        if clients.is_empty() {
            debug!("ws"; "no clients connected");
            return;
        }

        let text = message.to_json();
        let failed: Vec<ClientId> = clients
            .into_iter()
            .filter(|(_, tx)| tx.send(text.clone()).is_err())
            .map(|(id, _)| id)
            .collect();
        for id in failed {
            self.deregister_client(id);
        }
        debug!("ws"; "broadcast to {} clients", self.registry.len());
    }

    /// Stop serving: all connections close.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.registry.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

impl Broadcast for ReloadHub {
    fn broadcast_style_change(&self, css: &str) {
        self.broadcast(&WireMessage::event(ReloadEvent::CssReload {
            update_to: css.to_string(),
        }));
    }

    fn broadcast_code_change(&self) {
        self.broadcast(&WireMessage::event(ReloadEvent::CodeReload));
    }

    fn broadcast_build_error(&self) {
        self.broadcast(&WireMessage::event(ReloadEvent::BundleError));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub() -> ReloadHub {
        ReloadHub::new(Arc::new(BuildStore::new()))
    }

    fn recv(rx: &Receiver<String>) -> WireMessage {
        WireMessage::parse(&rx.try_recv().unwrap()).unwrap()
    }

    #[test]
    fn test_request_before_any_build_has_no_content() {
        let hub = hub();
        let (id, rx) = hub.register_client();
        hub.handle_request(id, "abc12345", "code");
        assert_eq!(recv(&rx), WireMessage::response(None, "abc12345"));
    }

    #[test]
    fn test_unknown_request_gets_no_response() {
        let hub = hub();
        let (id, rx) = hub.register_client();
        hub.handle_request(id, "abc12345", "images");
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_malformed_text_is_ignored() {
        let hub = hub();
        let (id, rx) = hub.register_client();
        hub.handle_text(id, "{not json");
        hub.handle_text(id, r#"{"Type":"request","ContentType":"other","Content":"code","Identifier":"x"}"#);
        assert!(rx.try_recv().is_err());
        assert_eq!(hub.client_count(), 1);
    }

    #[test]
    fn test_broadcast_removes_failed_clients() {
        let hub = hub();
        let (_a, rx_a) = hub.register_client();
        let (_b, rx_b) = hub.register_client();
        drop(rx_b);

        hub.broadcast_code_change();
        assert_eq!(recv(&rx_a), WireMessage::event(ReloadEvent::CodeReload));
        assert_eq!(hub.client_count(), 1);
    }

    #[test]
    fn test_close_disconnects_everyone() {
        let hub = hub();
        let (_a, rx) = hub.register_client();
        hub.close();
        assert!(hub.is_closed());
        assert!(rx.recv().is_err());
    }
}
