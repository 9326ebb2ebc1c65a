//! Embedded static resources.
//!
//! - `template` - Template types for typed variable injection
//! - `devreload.js` - browser dev agent, minified by `build.rs`
//!
//! ```ignore
//! use embed::{DEV_AGENT_JS, DevAgentVars};
//!
//! let js = DEV_AGENT_JS.render(&DevAgentVars {
//!     ws_url: "ws://127.0.0.1:9235".into(),
//!     name: "my-extension".into(),
//!     required: vec!["Spicetify.React".into()],
//! });
//! ```

mod template;

pub use template::{Template, TemplateVars, replace_literal};

/// Variables for the dev agent.
pub struct DevAgentVars {
    /// Reload server endpoint, with the port actually bound.
    pub ws_url: String,
    pub name: String,
    /// Global member chains the bundle expects on the host page.
    pub required: Vec<String>,
}

impl TemplateVars for DevAgentVars {
    fn apply(&self, content: &str) -> String {
        let content = replace_literal(content, "__LIVEBUNDLE_WS_URL__", &self.ws_url);
        let content = replace_literal(&content, "__LIVEBUNDLE_NAME__", &self.name);
        replace_literal(&content, "__LIVEBUNDLE_REQUIRED__", &self.required)
    }
}

/// Dev agent stored at the agent path during a dev session.
pub const DEV_AGENT_JS: Template<DevAgentVars> =
    Template::new(include_str!(concat!(env!("OUT_DIR"), "/devreload.min.js")));
