//! Identity triple for generated bundles.
//!
//! Each identity is a short base36 digest derived from blake3. The triple is
//! embedded in every generated bundle so independent builds sharing one host
//! page allocate separate cache regions:
//!
//! ```text
//! globalThis[CACHE_MARKER][project][code]
//! ```

use std::fmt;

use serde::Serialize;

/// Global name of the per-page cache object the bundles share.
pub const CACHE_MARKER: &str = "__livebundle_component_cache__";

/// Width of each identity in characters.
pub const IDENTITY_WIDTH: usize = 8;

const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Project, code and combined identities of one successful build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IdentityTriple {
    #[serde(rename = "project_hash")]
    pub project: String,
    #[serde(rename = "joined_code_hash")]
    pub code: String,
    #[serde(rename = "general_hash")]
    pub combined: String,
}

impl IdentityTriple {
    /// Render as a JavaScript object literal.
    pub fn to_js_object(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string())
    }
}

impl fmt::Display for IdentityTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.project, self.code, self.combined)
    }
}

/// Compute the identity triple for a project and its joined code.
pub fn compute_identity(project_name: &str, code: &str) -> IdentityTriple {
    let project = digest(project_name);
    let code = digest(&format!("\n\n{code}\n{CACHE_MARKER}\n\n"));
    let combined = digest(&format!("{project}\n{code}"));
    IdentityTriple {
        project,
        code,
        combined,
    }
}

/// Fixed-width base36 digest of `input`.
pub fn digest(input: &str) -> String {
    let hash = blake3::hash(input.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&hash.as_bytes()[..8]);
    let mut value = u64::from_be_bytes(head);

    let mut out = [0u8; IDENTITY_WIDTH];
    for slot in out.iter_mut().rev() {
        *slot = ALPHABET[(value % 36) as usize];
        value /= 36;
    }
    out.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_is_fixed_width_base36() {
        for input in ["", "a", "my-extension", &"x".repeat(10_000)] {
            let d = digest(input);
            assert_eq!(d.len(), IDENTITY_WIDTH);
            assert!(d.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        }
    }

    #[test]
    fn test_digest_is_deterministic() {
        assert_eq!(digest("hello"), digest("hello"));
        assert_ne!(digest("hello"), digest("hello "));
    }

    #[test]
    fn test_project_identity_stable_across_code_changes() {
        let a = compute_identity("ext", "console.log(1)");
        let b = compute_identity("ext", "console.log(2)");
        assert_eq!(a.project, b.project);
        assert_ne!(a.code, b.code);
        assert_ne!(a.combined, b.combined);
    }

    #[test]
    fn test_code_identity_independent_of_project() {
        let a = compute_identity("one", "export {}");
        let b = compute_identity("two", "export {}");
        assert_ne!(a.project, b.project);
        assert_eq!(a.code, b.code);
        assert_ne!(a.combined, b.combined);
    }

    #[test]
    fn test_combined_derives_from_parts() {
        let id = compute_identity("ext", "let a = 1;");
        assert_eq!(id.combined, digest(&format!("{}\n{}", id.project, id.code)));
    }

    #[test]
    fn test_js_object_field_names() {
        let id = compute_identity("ext", "");
        let js = id.to_js_object();
        assert!(js.contains(r#""project_hash":""#));
        assert!(js.contains(r#""joined_code_hash":""#));
        assert!(js.contains(r#""general_hash":""#));
    }
}
