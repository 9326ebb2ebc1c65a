//! `[serve]` section configuration.
//!
//! Contains reload server settings for `livebundle dev`.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! interface = "127.0.0.1"     # Network interface (127.0.0.1 = localhost only)
//! port = 9235                 # WebSocket port (next free port is used if taken)
//! watch = false               # Rebuild on file changes
//! watch_paths = ["src"]       # Watched directories, relative to the project root
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;

/// Reload server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServeConfig {
    /// Network interface to bind.
    /// - `127.0.0.1` (default): localhost only
    /// - `0.0.0.0`: all interfaces (LAN accessible)
    pub interface: IpAddr,

    /// WebSocket port number.
    pub port: u16,

    /// Enable file watcher for automatic rebuilds.
    pub watch: bool,

    /// Directories watched when `watch` is enabled.
    pub watch_paths: Vec<PathBuf>,
}

impl Default for ServeConfig {
    fn default() -> Self {
        Self {
            interface: IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1)),
            port: 9235,
            watch: false,
            watch_paths: vec!["src".into()],
        }
    }
}

impl ServeConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.port == 0 {
            diag.error("serve.port", "port must be between 1 and 65535");
        }
        if self.watch {
            for path in &self.watch_paths {
                if !path.exists() {
                    diag.error(
                        "serve.watch_paths",
                        format!("watch path not found: {}", path.display()),
                    );
                }
            }
        }
    }

    /// WebSocket URL clients use to reach a server bound to `port`.
    pub fn ws_url(&self, port: u16) -> String {
        let host = if self.interface.is_unspecified() {
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        } else {
            self.interface
        };
        match host {
            IpAddr::V6(v6) => format!("ws://[{v6}]:{port}"),
            IpAddr::V4(v4) => format!("ws://{v4}:{port}"),
        }
    }
}
