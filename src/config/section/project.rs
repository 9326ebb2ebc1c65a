//! `[project]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [project]
//! name = "my-extension"       # Used for file names and the project identity
//! entry = "src/index.tsx"     # Bundle entry point
//! version = "1.0.0"           # Release file suffix
//! ```

use crate::config::ConfigDiagnostics;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Project identity and entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectConfig {
    pub name: String,
    pub entry: PathBuf,
    pub version: String,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            entry: "src/index.tsx".into(),
            version: "0.0.0".into(),
        }
    }
}

impl ProjectConfig {
    /// Validate project configuration.
    ///
    /// # Checks
    /// - `name` is set and usable as a file name
    /// - `entry` points to an existing file (paths are absolute by now)
    /// - `version` is non-empty
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.name.trim().is_empty() {
            diag.error_with_hint(
                "project.name",
                "project name is required",
                "add `name = \"my-extension\"` under [project]",
            );
        } else if self
            .name
            .chars()
            .any(|c| matches!(c, '/' | '\\' | '@' | ':') || c.is_whitespace())
        {
            diag.error(
                "project.name",
                format!(
                    "`{}` cannot be used in file names (no slashes, `@`, `:` or spaces)",
                    self.name
                ),
            );
        }

        if !self.entry.is_file() {
            diag.error(
                "project.entry",
                format!("entry file not found: {}", self.entry.display()),
            );
        }

        if self.version.trim().is_empty() {
            diag.error("project.version", "version must not be empty");
        }
    }
}
