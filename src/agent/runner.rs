//! Headless driver: a tungstenite client feeding a [`ReloadAgent`].

use std::io::ErrorKind;
use std::time::Duration;

use anyhow::{Context, Result};
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Error as WsError, Message};

use super::{AgentState, Host, ReloadAgent};
use crate::reload::parse_server_url;
use crate::{core, debug};

/// Read timeout so shutdown requests are noticed.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Connect to `url` and run the agent until the page would reload, the
/// connection closes, or shutdown is requested. Returns the host.
pub fn attach<H: Host>(url: &str, host: H) -> Result<H> {
    let url = parse_server_url(url)?;
    let (mut ws, _) = tungstenite::connect(url.as_str())
        .with_context(|| format!("failed to connect to {url}"))?;
    if let MaybeTlsStream::Plain(stream) = ws.get_ref() {
        stream
            .set_read_timeout(Some(POLL_INTERVAL))
            .context("failed to set read timeout")?;
    }

    let mut agent = ReloadAgent::new(host);
    for request in agent.on_open() {
        ws.send(Message::Text(request.to_json().into()))
            .context("failed to send bundle request")?;
    }

    while agent.state() == AgentState::Open && !core::is_shutdown() {
        match ws.read() {
            Ok(Message::Text(text)) => agent.on_text(text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(WsError::Io(ref e))
                if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => break,
            Err(e) => {
                debug!("agent"; "read failed: {e}");
                break;
            }
        }
    }

    agent.on_close();
    let _ = ws.close(None);
    let _ = ws.flush();
    Ok(agent.into_host())
}
