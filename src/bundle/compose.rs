//! Generated JavaScript around the bundled code.
//!
//! A served development bundle is `identity prelude + code`. A standalone
//! (release or offline) bundle additionally waits for the host globals and
//! injects its styles itself:
//!
//! ```text
//! readiness wait ─► identity prelude ─► <style> injection ─► code
//! ```

use std::collections::BTreeSet;

use crate::identity::{CACHE_MARKER, IdentityTriple};

/// Name of the constant holding the identity triple inside a bundle.
pub const IDENTITY_BINDING: &str = "__livebundle_identity";

/// Declares the identity triple and allocates its cache region.
pub fn identity_prelude(identity: &IdentityTriple) -> String {
    let marker = serde_json::to_string(CACHE_MARKER).unwrap_or_default();
    format!(
        "const {IDENTITY_BINDING} = {triple};\n\
         {{\n\
         \tconst cache = (globalThis[{marker}] ??= {{}});\n\
         \tconst project = (cache[{IDENTITY_BINDING}.project_hash] ??= {{}});\n\
         \tproject[{IDENTITY_BINDING}.joined_code_hash] ??= {{}};\n\
         }}\n",
        triple = identity.to_js_object(),
    )
}

/// Code served to development agents.
pub fn served_code(identity: &IdentityTriple, code: &str) -> String {
    format!("{}{code}", identity_prelude(identity))
}

/// Dotted global paths the bundle needs before it can run, deduplicated.
///
/// Only plain member chains (`Spicetify.React`) can be waited on; other
/// expressions are skipped.
pub fn required_globals<'a>(globals: impl IntoIterator<Item = &'a String>) -> Vec<String> {
    globals
        .into_iter()
        .filter(|expr| is_member_chain(expr))
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn is_member_chain(expr: &str) -> bool {
    !expr.is_empty()
        && expr.split('.').all(|part| {
            let mut chars = part.chars();
            chars
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_' || c == '$')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
        })
}

/// Top-level await that polls until every required global is defined.
pub fn readiness_prelude(required: &[String]) -> String {
    if required.is_empty() {
        return String::new();
    }
    let list = serde_json::to_string(required).unwrap_or_else(|_| "[]".into());
    format!(
        "await (async () => {{\n\
         \tconst resolve = (path) => path.split(\".\").reduce((o, k) => o?.[k], globalThis);\n\
         \twhile (!{list}.every((p) => resolve(p) !== undefined)) {{\n\
         \t\tawait new Promise((r) => setTimeout(r, 10));\n\
         \t}}\n\
         }})();\n"
    )
}

/// Escape text for use inside a JavaScript template literal.
pub fn escape_template_literal(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

/// Statement block appending the styles to the document head.
pub fn style_injection(identity: &IdentityTriple, css: &str) -> String {
    if css.is_empty() {
        return String::new();
    }
    format!(
        "{{\n\
         \tconst style = document.createElement(\"style\");\n\
         \tstyle.id = \"livebundle-{}\";\n\
         \tstyle.textContent = `{}`;\n\
         \tdocument.head.appendChild(style);\n\
         }}\n",
        identity.project,
        escape_template_literal(css)
    )
}

/// Self-contained bundle for release and offline output.
pub fn standalone(
    identity: &IdentityTriple,
    required: &[String],
    css: &str,
    code: &str,
) -> String {
    let mut out = readiness_prelude(required);
    out.push_str(&identity_prelude(identity));
    out.push_str(&style_injection(identity, css));
    out.push_str(code);
    out
}
