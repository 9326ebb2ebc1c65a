//! Project configuration management for `livebundle.toml`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # [project] [build] [bundler] [serve]
//! ├── error.rs       # ConfigError, ConfigDiagnostics
//! ├── util.rs        # config file discovery
//! └── mod.rs         # LiveConfig (this file)
//! ```
//!
//! The config file is searched upward from the working directory; its parent
//! directory becomes the project root and every configured path is resolved
//! against it.

mod error;
pub mod section;
mod util;

pub use error::{ConfigDiagnostics, ConfigError};
pub use section::{BuildSectionConfig, BundlerConfig, ProjectConfig, ServeConfig};

use util::find_config_file;

use crate::{
    cli::{BundleArgs, Cli, Commands},
    log,
    utils::path::{normalize_path, resolve_in_root},
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

// ============================================================================
// root configuration
// ============================================================================

/// Root configuration structure representing livebundle.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LiveConfig {
    /// Absolute path to the config file (internal use only)
    #[serde(skip)]
    pub config_path: PathBuf,

    /// Project root directory - parent of config file (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub project: ProjectConfig,

    #[serde(default)]
    pub build: BuildSectionConfig,

    #[serde(default)]
    pub bundler: BundlerConfig,

    #[serde(default)]
    pub serve: ServeConfig,
}

impl LiveConfig {
    /// Load configuration for the given command line.
    ///
    /// `attach` works without a config file (it only needs the server
    /// address); every other command requires one.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let mut config = match find_config_file(&cli.config) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                config.config_path = normalize_path(&path);
                config
            }
            None if cli.is_attach() => Self {
                config_path: cwd.join(&cli.config),
                ..Self::default()
            },
            None => return Err(ConfigError::NotFound(cli.config.clone()).into()),
        };

        let root = config
            .config_path
            .parent()
            .map_or_else(|| cwd.clone(), Path::to_path_buf);

        config.apply_command_options(cli);
        config.normalize_paths(&root);

        if !cli.is_attach() {
            config.validate()?;
        }
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }
        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>)> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })
        .map_err(ConfigError::Toml)?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {} are ignored: {}", display_path, fields.join(", "));
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// File the dev agent and offline bundles are written to.
    ///
    /// Defaults to `<out_dir>/<name>.mjs`.
    pub fn agent_path(&self) -> PathBuf {
        match &self.build.agent_path {
            Some(path) => path.clone(),
            None => self.build.out_dir.join(format!("{}.mjs", self.project.name)),
        }
    }

    /// Release bundle path: `<out_dir>/<name>@<version>.mjs`.
    pub fn release_path(&self, version: &str) -> PathBuf {
        self.build
            .out_dir
            .join(format!("{}@{}.mjs", self.project.name, version))
    }

    // ========================================================================
    // cli configuration updates
    // ========================================================================

    /// Apply command-specific configuration options.
    fn apply_command_options(&mut self, cli: &Cli) {
        crate::logger::set_verbose(cli.verbose);

        if let Some(args) = cli.bundle_args() {
            self.apply_bundle_args(args);
        }

        if let Commands::Dev {
            interface,
            port,
            watch,
            always_refresh,
            ..
        } = &cli.command
        {
            Self::update_option(&mut self.serve.interface, interface.as_ref());
            Self::update_option(&mut self.serve.port, port.as_ref());
            Self::update_option(&mut self.serve.watch, watch.as_ref());
            if *always_refresh {
                self.build.require_changes_to_refresh = false;
            }
        }
    }

    fn apply_bundle_args(&mut self, args: &BundleArgs) {
        Self::update_option(&mut self.project.entry, args.entry.as_ref());
        Self::update_option(&mut self.build.out_dir, args.output.as_ref());
        Self::update_option(&mut self.build.minify, args.minify.as_ref());
    }

    /// Update config option if CLI value is provided.
    fn update_option<T: Clone>(config_option: &mut T, cli_option: Option<&T>) {
        if let Some(option) = cli_option {
            *config_option = option.clone();
        }
    }

    // ========================================================================
    // path normalization
    // ========================================================================

    /// Normalize all paths relative to root directory.
    fn normalize_paths(&mut self, root: &Path) {
        let root = normalize_path(root);

        self.project.entry = resolve_in_root(&self.project.entry, &root);
        self.build.out_dir = resolve_in_root(&self.build.out_dir, &root);
        self.build.cache_dir = resolve_in_root(&self.build.cache_dir, &root);
        if let Some(agent) = self.build.agent_path.take() {
            self.build.agent_path = Some(resolve_in_root(&agent, &root));
        }
        self.serve.watch_paths = self
            .serve
            .watch_paths
            .iter()
            .map(|p| resolve_in_root(p, &root))
            .collect();

        self.root = root;
    }

    // ========================================================================
    // validation
    // ========================================================================

    /// Validate the configuration.
    ///
    /// Collects all validation errors and returns them at once.
    pub fn validate(&self) -> Result<()> {
        let mut diag = ConfigDiagnostics::new();

        self.project.validate(&mut diag);
        self.build.validate(&mut diag);
        self.bundler.validate(&mut diag);
        self.serve.validate(&mut diag);

        diag.into_result()
            .map_err(|e| ConfigError::Diagnostics(e).into())
    }
}

// ============================================================================
// Test Helpers (available to all modules via `use crate::config::test_*`)
// ============================================================================

/// Parse config with a minimal `[project]` section; `extra` is appended
/// inside it, so bare keys land in `[project]`.
/// Panics if there are unknown fields (to catch config typos in tests).
#[cfg(test)]
pub fn test_parse_config(extra: &str) -> LiveConfig {
    let config = format!("[project]\nname = \"test-ext\"\n{extra}");
    let (parsed, ignored) = LiveConfig::parse_with_ignored(&config).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

/// Config for a project rooted at `root` with normalized paths.
#[cfg(test)]
pub fn test_config_in(root: &Path, extra: &str) -> LiveConfig {
    let mut config = test_parse_config(extra);
    config.config_path = root.join("livebundle.toml");
    config.normalize_paths(root);
    config
}

// ============================================================================
// tests
// ============================================================================
