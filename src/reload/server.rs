//! WebSocket listener for live reload.

use std::net::{IpAddr, SocketAddr, TcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};

use super::connection::serve_connection;
use super::hub::ReloadHub;
use crate::{core, debug, log};

/// Maximum port retry attempts
const MAX_PORT_RETRIES: u16 = 10;

/// Running reload server. Dropping it stops accepting and closes clients.
pub struct ReloadServer {
    addr: SocketAddr,
    hub: Arc<ReloadHub>,
    stop: Arc<AtomicBool>,
}

impl ReloadServer {
    /// Bind `interface:base_port` (or the next free port) and start accepting.
    pub fn start(hub: Arc<ReloadHub>, interface: IpAddr, base_port: u16) -> Result<Self> {
        let listener = try_bind_port(interface, base_port, MAX_PORT_RETRIES)?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        if base_port != 0 && addr.port() != base_port {
            log!("ws"; "port {} is busy, using {}", base_port, addr.port());
        }

        let stop = Arc::new(AtomicBool::new(false));
        {
            let hub = Arc::clone(&hub);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("livebundle-accept".into())
                .spawn(move || accept_loop(listener, hub, stop))
                .context("failed to spawn accept thread")?;
        }

        Ok(Self { addr, hub, stop })
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    pub fn hub(&self) -> &Arc<ReloadHub> {
        &self.hub
    }
}

impl Drop for ReloadServer {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Release);
        self.hub.close();
    }
}

fn accept_loop(listener: TcpListener, hub: Arc<ReloadHub>, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::Acquire) && !core::is_shutdown() {
        match listener.accept() {
            Ok((stream, addr)) => {
                debug!("ws"; "connection from {}", addr);
                let hub = Arc::clone(&hub);
                let spawned = thread::Builder::new()
                    .name(format!("livebundle-ws-{}", addr.port()))
                    .spawn(move || serve_connection(hub, stream));
                if let Err(e) = spawned {
                    log!("ws"; "failed to spawn connection thread: {}", e);
                }
            }
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(50));
            }
            Err(e) => {
                log!("ws"; "accept error: {}", e);
                thread::sleep(Duration::from_millis(100));
            }
        }
    }
}

/// Try binding to port, retry with incremented port if in use
fn try_bind_port(interface: IpAddr, base_port: u16, max_retries: u16) -> Result<TcpListener> {
    let mut last_error = None;

    for offset in 0..max_retries {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => return Ok(listener),
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "Failed to bind reload server after {} attempts: {}",
        max_retries,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_try_bind_port_skips_busy_port() {
        let busy = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let port = busy.local_addr().unwrap().port();

        let listener = try_bind_port(IpAddr::V4(Ipv4Addr::LOCALHOST), port, 10).unwrap();
        let bound = listener.local_addr().unwrap().port();
        assert_ne!(bound, port);
        assert!(bound > port && bound < port.saturating_add(10));
    }
}
