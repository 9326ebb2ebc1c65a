//! Client side of the reload protocol.
//!
//! [`ReloadAgent`] is the protocol state machine a page runs; everything the
//! page would do to itself goes through [`Host`]. The embedded browser agent
//! implements the same machine in JavaScript; [`MirrorHost`] drives it
//! headlessly for `livebundle attach`.
//!
//! ```text
//! Connecting ──open──► Open ──close / code_reload──► Closed
//! ```

mod mirror;
mod runner;

pub use mirror::MirrorHost;
pub use runner::attach;

use rustc_hash::FxHashMap;

use crate::reload::{ReloadEvent, RequestTarget, WireMessage};

/// Length of request correlation identifiers.
pub const REQUEST_ID_LEN: usize = 8;

/// Severity of a message shown to the page user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Info,
    Warn,
    Error,
}

/// What the agent can do to the page hosting it.
pub trait Host {
    /// Handle to an inserted style element.
    type Style;

    /// Evaluate bundled code as a module.
    fn load_module(&mut self, code: &str) -> Result<(), String>;

    fn insert_style(&mut self, css: &str) -> Self::Style;

    fn update_style(&mut self, style: &mut Self::Style, css: &str);

    /// Reload the page.
    fn reload(&mut self);

    fn notify(&mut self, level: Notice, message: &str);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentState {
    Connecting,
    Open,
    Closed,
}

/// Protocol state machine of one page.
pub struct ReloadAgent<H: Host> {
    host: H,
    state: AgentState,
    pending: FxHashMap<String, RequestTarget>,
    style: Option<H::Style>,
}

impl<H: Host> ReloadAgent<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            state: AgentState::Connecting,
            pending: FxHashMap::default(),
            style: None,
        }
    }

    pub fn state(&self) -> AgentState {
        self.state
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn into_host(self) -> H {
        self.host
    }

    /// Connection established: returns the code and styles requests to send.
    pub fn on_open(&mut self) -> Vec<WireMessage> {
        self.state = AgentState::Open;
        [RequestTarget::Code, RequestTarget::Styles]
            .into_iter()
            .map(|target| {
                let id = self.fresh_id();
                self.pending.insert(id.clone(), target);
                WireMessage::request(target, id)
            })
            .collect()
    }

    /// Random identifier not used by any pending request.
    fn fresh_id(&self) -> String {
        loop {
            let id: String = uuid::Uuid::new_v4()
                .simple()
                .to_string()
                .chars()
                .take(REQUEST_ID_LEN)
                .collect();
            if !self.pending.contains_key(&id) {
                return id;
            }
        }
    }

    /// Handle one inbound text frame. Malformed frames are ignored.
    pub fn on_text(&mut self, text: &str) {
        if self.state != AgentState::Open {
            return;
        }
        match WireMessage::parse(text) {
            Some(WireMessage::Response {
                content,
                identifier,
                ..
            }) => self.on_response(&identifier, content),
            Some(WireMessage::Event { content, .. }) => self.on_event(content),
            Some(WireMessage::Request { .. }) | None => {}
        }
    }

    fn on_response(&mut self, identifier: &str, content: Option<String>) {
        let Some(target) = self.pending.remove(identifier) else {
            return;
        };

        match (target, content) {
            (RequestTarget::Code, Some(code)) => {
                if let Err(e) = self.host.load_module(&code) {
                    self.host
                        .notify(Notice::Error, &format!("failed to load bundle: {e}"));
                }
            }
            (RequestTarget::Code, None) => {
                self.host
                    .notify(Notice::Warn, "no bundle available yet, waiting for a build");
            }
            (RequestTarget::Styles, Some(css)) => match self.style.as_mut() {
                Some(style) => self.host.update_style(style, &css),
                None => self.style = Some(self.host.insert_style(&css)),
            },
            (RequestTarget::Styles, None) => {
                self.host.notify(Notice::Warn, "no styles available yet");
            }
        }
    }

    fn on_event(&mut self, event: ReloadEvent) {
        match event {
            ReloadEvent::CssReload { update_to } => match self.style.as_mut() {
                Some(style) => self.host.update_style(style, &update_to),
                None => self
                    .host
                    .notify(Notice::Warn, "style update ignored: no style element"),
            },
            ReloadEvent::CodeReload => {
                self.state = AgentState::Closed;
                self.host.reload();
            }
            ReloadEvent::BundleError => {
                self.host
                    .notify(Notice::Error, "bundling failed, see the livebundle terminal");
            }
        }
    }

    /// Transport closed. No reconnect is attempted.
    pub fn on_close(&mut self) {
        if self.state != AgentState::Closed {
            self.state = AgentState::Closed;
            self.host.notify(Notice::Info, "connection closed");
        }
    }
}
