//! Command-line interface definitions.

use clap::{ColorChoice, Parser, Subcommand};
use std::path::PathBuf;

/// Live development bundler for browser-loaded extensions
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Control colored output (auto, always, never)
    #[arg(long, global = true, default_value = "auto")]
    pub color: ColorChoice,

    /// Config file path (default: livebundle.toml)
    #[arg(short = 'C', long, global = true, default_value = "livebundle.toml", value_hint = clap::ValueHint::FilePath)]
    pub config: PathBuf,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive development session with live reload
    #[command(visible_alias = "d")]
    Dev {
        #[command(flatten)]
        bundle_args: BundleArgs,

        /// Network interface to bind (e.g., 127.0.0.1, 0.0.0.0)
        #[arg(short, long)]
        interface: Option<std::net::IpAddr>,

        /// Port number for the reload server
        #[arg(short, long)]
        port: Option<u16>,

        /// Rebuild automatically when source files change
        #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
        watch: Option<bool>,

        /// Send code_reload after every build, even when nothing changed
        #[arg(long = "always-refresh")]
        always_refresh: bool,
    },

    /// Build a versioned release bundle into the output directory
    #[command(visible_alias = "r")]
    Release {
        #[command(flatten)]
        bundle_args: BundleArgs,

        /// Version written into the file name (default: [project] version)
        #[arg(long = "tag", value_name = "VERSION")]
        version: Option<String>,
    },

    /// Build a self-contained bundle in place of the dev agent
    #[command(visible_alias = "o")]
    Offline {
        #[command(flatten)]
        bundle_args: BundleArgs,
    },

    /// Connect a headless reload agent and mirror served bundles to disk
    #[command(visible_alias = "a")]
    Attach {
        /// Reload server URL (default: derived from [serve])
        #[arg(short, long, value_hint = clap::ValueHint::Url)]
        url: Option<String>,

        /// Directory receiving the mirrored code and styles
        #[arg(short, long, default_value = ".livebundle/mirror", value_hint = clap::ValueHint::DirPath)]
        out: PathBuf,
    },
}

/// Shared bundling arguments.
#[derive(clap::Args, Debug, Clone)]
pub struct BundleArgs {
    /// Entry point (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::FilePath)]
    pub entry: Option<PathBuf>,

    /// Output directory path (relative to project root)
    #[arg(short, long, value_hint = clap::ValueHint::DirPath)]
    pub output: Option<PathBuf>,

    /// Minify release and offline bundles
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub minify: Option<bool>,
}

impl Cli {
    pub const fn is_attach(&self) -> bool {
        matches!(self.command, Commands::Attach { .. })
    }

    /// Bundling arguments of the current command, if it bundles.
    pub const fn bundle_args(&self) -> Option<&BundleArgs> {
        match &self.command {
            Commands::Dev { bundle_args, .. }
            | Commands::Release { bundle_args, .. }
            | Commands::Offline { bundle_args } => Some(bundle_args),
            Commands::Attach { .. } => None,
        }
    }
}
