//! `livebundle attach`: headless agent mirroring served bundles to disk.

use std::path::Path;

use anyhow::Result;

use crate::agent::{self, MirrorHost};
use crate::config::LiveConfig;
use crate::log;
use crate::utils::path::resolve_in_root;

/// Attach to `url` (default: the configured reload server) and mirror into `out`.
pub fn run_attach(config: &LiveConfig, url: Option<&str>, out: &Path) -> Result<()> {
    let url = match url {
        Some(url) => url.to_string(),
        None => config.serve.ws_url(config.serve.port),
    };
    let out = resolve_in_root(out, config.get_root());

    log!("agent"; "attaching to {}, mirroring into {}", url, out.display());
    let host = agent::attach(&url, MirrorHost::new(&out))?;

    if host.reloaded() {
        log!("agent"; "detached after code change ({} bundle loads)", host.loads());
    } else {
        log!("agent"; "detached ({} bundle loads)", host.loads());
    }
    Ok(())
}
