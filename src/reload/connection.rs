//! Per-connection worker.
//!
//! Each accepted socket gets its own thread: WebSocket handshake, then a loop
//! alternating between draining queued outbound frames and a short blocking
//! read.

use std::io::ErrorKind;
use std::net::TcpStream;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{Receiver, TryRecvError};
use tungstenite::protocol::Message;
use tungstenite::{Error as WsError, WebSocket};

use super::hub::ReloadHub;
use super::registry::ClientId;
use crate::{core, debug};

/// Read timeout; bounds the latency of outbound frames.
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Serve one client until it disconnects or the hub closes.
pub(super) fn serve_connection(hub: Arc<ReloadHub>, stream: TcpStream) {
    let peer = stream
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|_| "unknown".into());

    // Keep blocking mode during handshake
    let _ = stream.set_nonblocking(false);
    let mut ws = match tungstenite::accept(stream) {
        Ok(ws) => ws,
        Err(e) => {
            debug!("ws"; "handshake with {peer} failed: {e}");
            return;
        }
    };
    if let Err(e) = ws.get_ref().set_read_timeout(Some(POLL_INTERVAL)) {
        debug!("ws"; "{peer}: cannot set read timeout: {e}");
        return;
    }

    let (id, outbox) = hub.register_client();
    let reason = pump(&hub, id, &mut ws, &outbox);
    debug!("ws"; "client #{id} ({peer}) closing: {reason}");
    let _ = ws.close(None);
    let _ = ws.flush();
    hub.deregister_client(id);
}

/// Run the connection loop, returning why it ended.
fn pump(
    hub: &ReloadHub,
    id: ClientId,
    ws: &mut WebSocket<TcpStream>,
    outbox: &Receiver<String>,
) -> String {
    loop {
        if hub.is_closed() || core::is_shutdown() {
            return "server shutting down".into();
        }

        loop {
            match outbox.try_recv() {
                Ok(text) => {
                    if let Err(e) = ws.send(Message::Text(text.into())) {
                        return format!("send failed: {e}");
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => return "deregistered".into(),
            }
        }

        match ws.read() {
            Ok(Message::Text(text)) => hub.handle_text(id, text.as_str()),
            Ok(Message::Close(_)) => return "closed by client".into(),
            Ok(_) => {}
            Err(WsError::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => {
                return "connection closed".into();
            }
            Err(e) => return format!("read failed: {e}"),
        }
    }
}
