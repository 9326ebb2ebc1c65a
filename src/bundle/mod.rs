//! Bundling collaborators.
//!
//! The live session never bundles by itself: it drives a [`BundleEngine`]
//! and works with whatever code and style text comes back.
//!
//! - `esbuild` - default engine backed by the esbuild executable
//! - `style` - sass + lightningcss pipeline for imported stylesheets
//! - `minify` - oxc minifier with fallback to the input text
//! - `compose` - preludes and self-contained bundle assembly

pub mod compose;
mod esbuild;
mod minify;
mod style;

pub use esbuild::EsbuildEngine;
pub use minify::minify_or_original;
pub use style::{StylePipeline, parse_targets};

use crate::core::OutputMode;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One bundling request.
#[derive(Debug, Clone)]
pub struct BundleRequest {
    pub entry: PathBuf,
    pub mode: OutputMode,
    pub out_dir: PathBuf,
}

/// One processed stylesheet, labelled with its project-relative path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleFragment {
    pub label: String,
    pub css: String,
}

impl StyleFragment {
    pub fn new(label: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            css: css.into(),
        }
    }

    /// `/* label */` followed by the css on the next line.
    pub fn render(&self) -> String {
        format!("/* {} */\n{}", self.label, self.css)
    }
}

/// Code and styles produced by one successful bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleOutput {
    pub code: String,
    pub styles: Vec<StyleFragment>,
}

impl BundleOutput {
    /// All style fragments in import order, joined by newlines.
    pub fn joined_styles(&self) -> String {
        self.styles
            .iter()
            .map(StyleFragment::render)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("{0}")]
    Engine(String),

    #[error("failed to process `{path}`: {message}")]
    Style { path: PathBuf, message: String },

    #[error("IO error at `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("unreadable metafile: {0}")]
    Metafile(String),
}

impl BundleError {
    pub(crate) fn io(path: &Path, err: std::io::Error) -> Self {
        Self::Io(path.to_path_buf(), err)
    }
}

/// Anything that turns an entry point into code and styles.
///
/// Implementations are called from a blocking worker thread, one request at
/// a time.
pub trait BundleEngine: Send + Sync + 'static {
    fn bundle(&self, request: &BundleRequest) -> Result<BundleOutput, BundleError>;
}
