//! Stylesheet pipeline.
//!
//! ```text
//! .scss / .sass ──► sass ──┐
//!                          ├──► lightningcss (prefix for targets, minify) ──► StyleFragment
//! .css ────────────────────┘
//! ```
//!
//! Files are processed in parallel; the output keeps the input order.

use std::fs;
use std::path::{Path, PathBuf};

use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use rayon::prelude::*;

use super::{BundleError, StyleFragment};
use crate::utils::exec::{Cmd, FilterRule};
use crate::utils::path::display_relative;

/// Sass deprecation chatter is not actionable for extension authors.
static SASS_FILTER: FilterRule = FilterRule::new(&["DEPRECATION WARNING", "More info", "╷", "│", "╵"]);

/// Processes the stylesheets a bundle imports.
#[derive(Debug, Clone)]
pub struct StylePipeline {
    sass: Vec<String>,
    targets: Browsers,
    root: PathBuf,
}

impl StylePipeline {
    pub fn new(sass: Vec<String>, targets: Browsers, root: PathBuf) -> Self {
        Self {
            sass,
            targets,
            root,
        }
    }

    /// Process `files` (absolute paths) into labelled fragments.
    pub fn process(&self, files: &[PathBuf], minify: bool) -> Result<Vec<StyleFragment>, BundleError> {
        files
            .par_iter()
            .map(|file| self.process_file(file, minify))
            .collect()
    }

    fn process_file(&self, path: &Path, minify: bool) -> Result<StyleFragment, BundleError> {
        let label = display_relative(path, &self.root);
        let source = if is_sass(path) {
            self.compile_sass(path)?
        } else {
            fs::read_to_string(path).map_err(|e| BundleError::io(path, e))?
        };

        let css = transform_css(&source, &label, self.targets, minify).map_err(|message| {
            BundleError::Style {
                path: path.to_path_buf(),
                message,
            }
        })?;
        Ok(StyleFragment::new(label, css))
    }

    fn compile_sass(&self, path: &Path) -> Result<String, BundleError> {
        if self.sass.is_empty() {
            return Err(BundleError::Style {
                path: path.to_path_buf(),
                message: "bundler.sass is empty".into(),
            });
        }
        let output = Cmd::from_slice(&self.sass)
            .arg(path)
            .args(["--no-source-map", "--style=expanded"])
            .cwd(&self.root)
            .filter(&SASS_FILTER)
            .run()
            .map_err(|e| BundleError::Style {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?;
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn is_sass(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("scss" | "sass")
    )
}

/// Add vendor prefixes for `targets`, optionally minifying.
pub fn transform_css(
    source: &str,
    filename: &str,
    targets: Browsers,
    minify: bool,
) -> Result<String, String> {
    let targets = Targets::from(targets);
    let mut sheet = StyleSheet::parse(
        source,
        ParserOptions {
            filename: filename.to_string(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| e.to_string())?;

    sheet
        .minify(MinifyOptions {
            targets,
            ..MinifyOptions::default()
        })
        .map_err(|e| e.to_string())?;

    let result = sheet
        .to_css(PrinterOptions {
            minify,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}

/// Parse entries like `"chrome 100"` or `"safari 16.4"`.
///
/// Repeated browsers keep the lowest version.
pub fn parse_targets(entries: &[String]) -> Result<Browsers, String> {
    let mut browsers = Browsers::default();
    for entry in entries {
        let mut parts = entry.split_whitespace();
        let (Some(name), Some(version), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("invalid target `{entry}`, expected `<browser> <version>`"));
        };
        let version =
            parse_version(version).ok_or_else(|| format!("invalid version in target `{entry}`"))?;

        let slot = match name.to_ascii_lowercase().as_str() {
            "android" => &mut browsers.android,
            "chrome" => &mut browsers.chrome,
            "edge" => &mut browsers.edge,
            "firefox" => &mut browsers.firefox,
            "ie" => &mut browsers.ie,
            "ios" | "ios_saf" => &mut browsers.ios_saf,
            "opera" => &mut browsers.opera,
            "safari" => &mut browsers.safari,
            "samsung" => &mut browsers.samsung,
            other => return Err(format!("unknown browser `{other}` in target `{entry}`")),
        };
        *slot = Some(slot.map_or(version, |v| v.min(version)));
    }
    Ok(browsers)
}

/// `major[.minor[.patch]]` packed as `major << 16 | minor << 8 | patch`.
fn parse_version(version: &str) -> Option<u32> {
    let mut parts = version.split('.');
    let major: u32 = parts.next()?.parse().ok()?;
    let minor: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    let patch: u32 = parts.next().map_or(Some(0), |p| p.parse().ok())?;
    if parts.next().is_some() || major > 0xffff || minor > 0xff || patch > 0xff {
        return None;
    }
    Some(major << 16 | minor << 8 | patch)
}
