//! Bundle engine backed by the esbuild executable.
//!
//! esbuild bundles the code. Style imports are loaded as empty modules and
//! recovered from the metafile afterwards, so the style pipeline sees them in
//! import order. Host-provided modules (React and friends) are aliased to
//! generated CommonJS shims that read the host global.

use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{BundleEngine, BundleError, BundleOutput, BundleRequest, StylePipeline, parse_targets};
use crate::config::LiveConfig;
use crate::debug;
use crate::utils::exec::Cmd;

const STYLE_EXTENSIONS: [&str; 3] = ["css", "scss", "sass"];

/// Runs the configured esbuild command.
pub struct EsbuildEngine {
    command: Vec<String>,
    root: PathBuf,
    globals: BTreeMap<String, String>,
    styles: StylePipeline,
    minify: bool,
}

impl EsbuildEngine {
    pub fn new(config: &LiveConfig) -> Result<Self, BundleError> {
        let targets = parse_targets(&config.bundler.targets).map_err(BundleError::Engine)?;
        Ok(Self {
            command: config.bundler.command.clone(),
            root: config.root.clone(),
            globals: config.bundler.globals.clone(),
            styles: StylePipeline::new(config.bundler.sass.clone(), targets, config.root.clone()),
            minify: config.build.minify,
        })
    }

    /// Write one shim module per host global and return `(module, shim)` pairs.
    fn write_shims(&self, dir: &Path) -> Result<Vec<(String, PathBuf)>, BundleError> {
        let shim_dir = dir.join("globals");
        fs::create_dir_all(&shim_dir).map_err(|e| BundleError::io(&shim_dir, e))?;

        self.globals
            .iter()
            .map(|(module, global)| {
                let path = shim_dir.join(format!("{}.cjs", shim_name(module)));
                fs::write(&path, format!("module.exports = {global};\n"))
                    .map_err(|e| BundleError::io(&path, e))?;
                Ok((module.clone(), path))
            })
            .collect()
    }

    fn args(
        &self,
        request: &BundleRequest,
        outfile: &Path,
        metafile: &Path,
        shims: &[(String, PathBuf)],
    ) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            request.entry.clone().into(),
            "--bundle".into(),
            "--format=esm".into(),
            "--platform=browser".into(),
            "--legal-comments=none".into(),
            "--log-level=warning".into(),
            "--charset=utf8".into(),
        ];
        for ext in STYLE_EXTENSIONS {
            args.push(format!("--loader:.{ext}=empty").into());
        }
        for (module, shim) in shims {
            let mut alias = OsString::from(format!("--alias:{module}="));
            alias.push(shim);
            args.push(alias);
        }
        let mut out = OsString::from("--outfile=");
        out.push(outfile);
        args.push(out);
        let mut meta = OsString::from("--metafile=");
        meta.push(metafile);
        args.push(meta);

        if self.optimize(request) {
            args.push("--minify".into());
        }
        args
    }

    fn optimize(&self, request: &BundleRequest) -> bool {
        request.mode.optimize() && self.minify
    }
}

impl BundleEngine for EsbuildEngine {
    fn bundle(&self, request: &BundleRequest) -> Result<BundleOutput, BundleError> {
        let dir = &request.out_dir;
        fs::create_dir_all(dir).map_err(|e| BundleError::io(dir, e))?;

        let shims = self.write_shims(dir)?;
        let outfile = dir.join("bundle.mjs");
        let metafile = dir.join("meta.json");

        let args = self.args(request, &outfile, &metafile, &shims);
        debug!("esbuild"; "{:?}", args);
        Cmd::from_slice(&self.command)
            .args(&args)
            .cwd(&self.root)
            .run()
            .map_err(|e| BundleError::Engine(e.to_string()))?;

        let code = fs::read_to_string(&outfile).map_err(|e| BundleError::io(&outfile, e))?;
        let meta = fs::read_to_string(&metafile).map_err(|e| BundleError::io(&metafile, e))?;
        let style_files: Vec<PathBuf> = style_inputs(&meta)?
            .into_iter()
            .map(|rel| self.root.join(rel))
            .collect();

        let styles = self.styles.process(&style_files, self.optimize(request))?;
        Ok(BundleOutput { code, styles })
    }
}

#[derive(Deserialize)]
struct Metafile {
    inputs: serde_json::Map<String, serde_json::Value>,
}

/// Stylesheet inputs recorded in an esbuild metafile, in the order listed.
fn style_inputs(metafile: &str) -> Result<Vec<String>, BundleError> {
    let meta: Metafile =
        serde_json::from_str(metafile).map_err(|e| BundleError::Metafile(e.to_string()))?;
    Ok(meta
        .inputs
        .into_iter()
        .map(|(path, _)| path)
        .filter(|path| {
            Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| STYLE_EXTENSIONS.contains(&e))
        })
        .collect())
}

/// File-safe name for a module specifier (`react-dom/client` → `react-dom_client`).
fn shim_name(module: &str) -> String {
    module
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect()
}
