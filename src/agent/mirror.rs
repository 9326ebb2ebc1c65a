//! Host that mirrors served bundles to disk.

use std::fs;
use std::path::{Path, PathBuf};

use super::{Host, Notice};
use crate::log;

/// Writes loaded code and styles into a directory.
#[derive(Debug)]
pub struct MirrorHost {
    dir: PathBuf,
    loads: usize,
    reloaded: bool,
}

impl MirrorHost {
    pub const CODE_FILE: &'static str = "bundle.mjs";
    pub const STYLE_FILE: &'static str = "style.css";

    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            loads: 0,
            reloaded: false,
        }
    }

    /// Number of modules written.
    pub fn loads(&self) -> usize {
        self.loads
    }

    /// Whether the session ended because the page would reload.
    pub fn reloaded(&self) -> bool {
        self.reloaded
    }

    fn write(&self, name: &str, content: &str) -> std::io::Result<PathBuf> {
        fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(name);
        fs::write(&path, content)?;
        Ok(path)
    }
}

impl Host for MirrorHost {
    type Style = PathBuf;

    fn load_module(&mut self, code: &str) -> Result<(), String> {
        let path = self
            .write(Self::CODE_FILE, code)
            .map_err(|e| format!("cannot write {}: {e}", Self::CODE_FILE))?;
        self.loads += 1;
        log!("agent"; "code ({} bytes) -> {}", code.len(), path.display());
        Ok(())
    }

    fn insert_style(&mut self, css: &str) -> PathBuf {
        let path = self.dir.join(Self::STYLE_FILE);
        self.update_style(&mut path.clone(), css);
        path
    }

    fn update_style(&mut self, style: &mut PathBuf, css: &str) {
        let written = fs::create_dir_all(&self.dir).and_then(|()| fs::write(&*style, css));
        match written {
            Ok(()) => log!("agent"; "styles ({} bytes) -> {}", css.len(), style.display()),
            Err(e) => log!("error"; "cannot write {}: {e}", style.display()),
        }
    }

    fn reload(&mut self) {
        self.reloaded = true;
        log!("agent"; "code changed, page would reload");
    }

    fn notify(&mut self, level: Notice, message: &str) {
        match level {
            Notice::Error => log!("error"; "{message}"),
            Notice::Warn | Notice::Info => log!("agent"; "{message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_module_writes_code() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MirrorHost::new(dir.path().join("mirror"));
        host.load_module("export {}").unwrap();
        assert_eq!(host.loads(), 1);
        assert_eq!(
            fs::read_to_string(dir.path().join("mirror").join(MirrorHost::CODE_FILE)).unwrap(),
            "export {}"
        );
    }

    #[test]
    fn test_style_insert_then_update() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MirrorHost::new(dir.path());
        let mut style = host.insert_style(".a{}");
        assert_eq!(fs::read_to_string(&style).unwrap(), ".a{}");
        host.update_style(&mut style, ".b{}");
        assert_eq!(fs::read_to_string(&style).unwrap(), ".b{}");
    }

    #[test]
    fn test_reload_is_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let mut host = MirrorHost::new(dir.path());
        assert!(!host.reloaded());
        host.reload();
        assert!(host.reloaded());
    }
}
