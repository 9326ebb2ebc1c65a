//! `[bundler]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [bundler]
//! command = ["npx", "esbuild"]    # Bundler executable
//! sass = ["sass"]                 # Preprocessor for .scss / .sass imports
//! targets = ["chrome 100"]        # Vendor prefix targets
//!
//! [bundler.globals]               # Imports served by the host page
//! react = "Spicetify.React"
//! ```

use crate::bundle::parse_targets;
use crate::config::ConfigDiagnostics;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// External tool commands and module mapping.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundlerConfig {
    /// Bundler command (e.g., `["esbuild"]` or `["npx", "esbuild"]`).
    pub command: Vec<String>,

    /// Sass compiler command.
    pub sass: Vec<String>,

    /// Browser targets for vendor prefixes (`"<browser> <major>[.<minor>]"`).
    pub targets: Vec<String>,

    /// Module specifier to host global expression.
    pub globals: BTreeMap<String, String>,
}

impl Default for BundlerConfig {
    fn default() -> Self {
        Self {
            command: vec!["esbuild".into()],
            sass: vec!["sass".into()],
            targets: vec!["chrome 100".into()],
            globals: default_globals(),
        }
    }
}

fn default_globals() -> BTreeMap<String, String> {
    [
        ("react", "Spicetify.React"),
        ("react-dom", "Spicetify.ReactDOM"),
        ("react-dom/client", "Spicetify.ReactDOM"),
        ("react-dom/server", "Spicetify.ReactDOMServer"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

impl BundlerConfig {
    /// Validate bundler configuration.
    ///
    /// # Checks
    /// - `command` is non-empty and installed (package runners only need to exist)
    /// - every target parses
    /// - global expressions are non-empty
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        validate_command(&self.command, "bundler.command", diag);

        if let Err(e) = parse_targets(&self.targets) {
            diag.error_with_hint(
                "bundler.targets",
                e,
                "use entries like \"chrome 100\" or \"firefox 115\"",
            );
        }

        for (module, global) in &self.globals {
            if module.is_empty() || global.trim().is_empty() {
                diag.error(
                    "bundler.globals",
                    format!("`{module}` maps to an empty global"),
                );
            }
        }
    }
}

/// Check that a command array names an installed executable.
fn validate_command(command: &[String], field: &'static str, diag: &mut ConfigDiagnostics) {
    let Some(cmd) = command.first() else {
        diag.error(field, format!("{field} is empty"));
        return;
    };

    if which::which(cmd).is_err() {
        diag.error_with_hint(
            field,
            format!("`{cmd}` not found"),
            format!("install `{cmd}` or update {field}"),
        );
    }
}
