//! One-shot `release` and `offline` builds.
//!
//! Both produce a self-contained bundle: readiness wait for host globals,
//! identity prelude, style injection, then the code. Release output is
//! versioned under `out_dir`; offline output replaces the dev agent.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::bundle::{BundleEngine, BundleRequest, EsbuildEngine, compose, minify_or_original};
use crate::config::LiveConfig;
use crate::core::OutputMode;
use crate::identity::compute_identity;
use crate::log;
use crate::utils::path::display_relative;

/// `livebundle release`: write `<out_dir>/<name>@<version>.mjs`.
pub fn release(config: &LiveConfig, version: Option<&str>) -> Result<()> {
    let engine = EsbuildEngine::new(config)?;
    let version = version.unwrap_or(&config.project.version);
    let path = config.release_path(version);
    write_standalone(config, &engine, OutputMode::Release, &path)
}

/// `livebundle offline`: write the bundle to the agent path.
pub fn offline(config: &LiveConfig) -> Result<()> {
    let engine = EsbuildEngine::new(config)?;
    write_standalone(config, &engine, OutputMode::Offline, &config.agent_path())
}

/// Build a standalone bundle and write it to `dest`.
pub fn write_standalone(
    config: &LiveConfig,
    engine: &dyn BundleEngine,
    mode: OutputMode,
    dest: &Path,
) -> Result<()> {
    let bundle = build_standalone(config, engine, mode)?;
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    fs::write(dest, &bundle).with_context(|| format!("failed to write {}", dest.display()))?;

    log!(mode.as_str(); "{} ({} bytes)", display_relative(dest, config.get_root()), bundle.len());
    Ok(())
}

/// Bundle once and assemble the self-contained output text.
pub fn build_standalone(
    config: &LiveConfig,
    engine: &dyn BundleEngine,
    mode: OutputMode,
) -> Result<String> {
    let request = BundleRequest {
        entry: config.project.entry.clone(),
        mode,
        out_dir: config.build.cache_dir.join(mode.as_str()),
    };
    let output = engine
        .bundle(&request)
        .with_context(|| format!("{mode} build failed"))?;

    let identity = compute_identity(&config.project.name, &output.code);
    let required = compose::required_globals(config.bundler.globals.values());
    let bundle = compose::standalone(&identity, &required, &output.joined_styles(), &output.code);

    Ok(if mode.optimize() && config.build.minify {
        minify_or_original(&bundle)
    } else {
        bundle
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::{BundleError, BundleOutput, StyleFragment};
    use crate::config::test_config_in;
    use crate::identity::CACHE_MARKER;

    struct FixedEngine;

    impl BundleEngine for FixedEngine {
        fn bundle(&self, request: &BundleRequest) -> Result<BundleOutput, BundleError> {
            assert!(request.mode.optimize());
            Ok(BundleOutput {
                code: "console.log(Spicetify.React);".into(),
                styles: vec![StyleFragment::new("src/app.css", ".app{color:red}")],
            })
        }
    }

    struct FailingEngine;

    impl BundleEngine for FailingEngine {
        fn bundle(&self, _request: &BundleRequest) -> Result<BundleOutput, BundleError> {
            Err(BundleError::Engine("Could not resolve \"./missing\"".into()))
        }
    }

    #[test]
    fn test_standalone_contains_all_parts() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config_in(dir.path(), "[build]\nminify = false");

        let bundle = build_standalone(&config, &FixedEngine, OutputMode::Offline).unwrap();
        assert!(bundle.contains(CACHE_MARKER));
        assert!(bundle.contains("Spicetify.React"));
        assert!(bundle.contains(".app{color:red}"));
        assert!(bundle.contains("/* src/app.css */"));
        assert!(bundle.trim_end().ends_with("console.log(Spicetify.React);"));
    }

    #[test]
    fn test_release_file_name_has_version() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config_in(dir.path(), "version = \"1.4.0\"");
        let dest = config.release_path("1.4.0");

        write_standalone(&config, &FixedEngine, OutputMode::Release, &dest).unwrap();
        assert!(dest.ends_with("dist/test-ext@1.4.0.mjs"));
        assert!(dest.exists());
    }

    #[test]
    fn test_offline_replaces_agent_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config_in(dir.path(), "");
        let agent = config.agent_path();
        fs::create_dir_all(agent.parent().unwrap()).unwrap();
        fs::write(&agent, "// dev agent").unwrap();

        write_standalone(&config, &FixedEngine, OutputMode::Offline, &agent).unwrap();
        let written = fs::read_to_string(&agent).unwrap();
        assert!(!written.contains("dev agent"));
        assert!(written.contains(CACHE_MARKER));
    }

    #[test]
    fn test_engine_failure_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let config = test_config_in(dir.path(), "");
        let dest = config.release_path("0.0.0");

        let err = write_standalone(&config, &FailingEngine, OutputMode::Release, &dest).unwrap_err();
        assert!(format!("{err:#}").contains("Could not resolve"));
        assert!(!dest.exists());
    }
}
