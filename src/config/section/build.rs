//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! out_dir = "dist"                    # Release bundles land here
//! agent_path = "dist/my-ext.mjs"      # Dev agent / offline bundle (default: <out_dir>/<name>.mjs)
//! minify = true                       # Minify release and offline bundles
//! require_changes_to_refresh = true   # false: reload pages after every build
//! cache_dir = ".livebundle"           # Scratch files for the bundler
//! ```

use crate::config::ConfigDiagnostics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Output locations and build behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildSectionConfig {
    /// Directory for release bundles.
    pub out_dir: PathBuf,

    /// File the dev agent (or offline bundle) is written to.
    pub agent_path: Option<PathBuf>,

    /// Minify outside development.
    pub minify: bool,

    /// Broadcast a code reload only when the output actually changed.
    pub require_changes_to_refresh: bool,

    /// Scratch directory for metafiles and global shims.
    pub cache_dir: PathBuf,
}

impl Default for BuildSectionConfig {
    fn default() -> Self {
        Self {
            out_dir: "dist".into(),
            agent_path: None,
            minify: true,
            require_changes_to_refresh: true,
            cache_dir: ".livebundle".into(),
        }
    }
}

impl BuildSectionConfig {
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.out_dir.is_file() {
            diag.error(
                "build.out_dir",
                format!("`{}` is a file, not a directory", self.out_dir.display()),
            );
        }
        if let Some(agent) = &self.agent_path
            && agent.is_dir()
        {
            diag.error_with_hint(
                "build.agent_path",
                format!("`{}` is a directory", agent.display()),
                "point agent_path at the .mjs file the host application loads",
            );
        }
    }
}
