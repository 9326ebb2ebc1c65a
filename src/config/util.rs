//! Configuration utility functions.

use std::path::{Path, PathBuf};

/// Find config file by searching upward from current directory
///
/// Starts from cwd and walks up parent directories until finding `config_name`
/// Returns the path to the config file if found
///
/// # Example
/// ```text
/// /home/user/ext/src/components/  ← cwd
/// /home/user/ext/livebundle.toml  ← found!
/// ```
pub fn find_config_file(config_name: &Path) -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    find_config_from(&cwd, config_name)
}

/// Search upward from `start` for `config_name`.
fn find_config_from(start: &Path, config_name: &Path) -> Option<PathBuf> {
    if config_name.is_absolute() {
        return config_name.exists().then(|| config_name.to_path_buf());
    }

    let mut current = start;
    loop {
        let candidate = current.join(config_name);
        if candidate.is_file() {
            return Some(candidate);
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => return None, // Reached filesystem root
        }
    }
}

// ============================================================================
// tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_find_config_in_ancestor() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("src/components");
        fs::create_dir_all(&nested).unwrap();
        fs::write(dir.path().join("livebundle.toml"), "[project]\nname = \"x\"").unwrap();

        let found = find_config_from(&nested, Path::new("livebundle.toml"));
        assert_eq!(found, Some(dir.path().join("livebundle.toml")));
    }

    #[test]
    fn test_find_config_prefers_nearest() {
        let dir = tempfile::tempdir().unwrap();
        let inner = dir.path().join("inner");
        fs::create_dir_all(&inner).unwrap();
        fs::write(dir.path().join("livebundle.toml"), "").unwrap();
        fs::write(inner.join("livebundle.toml"), "").unwrap();

        let found = find_config_from(&inner, Path::new("livebundle.toml"));
        assert_eq!(found, Some(inner.join("livebundle.toml")));
    }

    #[test]
    fn test_find_config_absolute_missing() {
        let found = find_config_from(
            Path::new("/"),
            Path::new("/nonexistent/livebundle/livebundle.toml"),
        );
        assert!(found.is_none());
    }

    #[test]
    fn test_directory_named_like_config_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("livebundle.toml")).unwrap();
        let found = find_config_from(dir.path(), Path::new("livebundle.toml"));
        assert!(found.is_none_or(|p| !p.starts_with(dir.path())));
    }
}
