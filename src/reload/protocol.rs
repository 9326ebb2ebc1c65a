//! Wire protocol between the reload server and its agents.
//!
//! JSON text frames with capitalized keys:
//!
//! ```text
//! → {"Type":"request","ContentType":"bundle_request","Content":"code","Identifier":"k3x9a0qz"}
//! ← {"Type":"response","ContentType":"response","Content":"...","Identifier":"k3x9a0qz"}
//! ← {"Type":"event","ContentType":"event","Content":{"EventType":"css_reload","UpdateTo":"..."}}
//! ```
//!
//! A response to a request for content that does not exist omits `Content`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const BUNDLE_REQUEST: &str = "bundle_request";
const RESPONSE: &str = "response";
const EVENT: &str = "event";

/// Errors locating a reload server.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("invalid reload server url `{0}`")]
    InvalidUrl(String, #[source] url::ParseError),

    #[error("unsupported scheme `{0}`, expected ws:// or wss://")]
    UnsupportedScheme(String),
}

/// Parse and check a reload server URL.
pub fn parse_server_url(raw: &str) -> Result<url::Url, ProtocolError> {
    let url = url::Url::parse(raw).map_err(|e| ProtocolError::InvalidUrl(raw.to_string(), e))?;
    match url.scheme() {
        "ws" | "wss" => Ok(url),
        other => Err(ProtocolError::UnsupportedScheme(other.to_string())),
    }
}

/// One protocol message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Type", rename_all = "lowercase")]
pub enum WireMessage {
    Request {
        #[serde(rename = "ContentType")]
        content_type: String,
        #[serde(rename = "Content")]
        content: String,
        #[serde(rename = "Identifier")]
        identifier: String,
    },
    Response {
        #[serde(rename = "ContentType")]
        content_type: String,
        #[serde(rename = "Content", default, skip_serializing_if = "Option::is_none")]
        content: Option<String>,
        #[serde(rename = "Identifier")]
        identifier: String,
    },
    Event {
        #[serde(rename = "ContentType")]
        content_type: String,
        #[serde(rename = "Content")]
        content: ReloadEvent,
    },
}

/// Broadcast notification carried by an event message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "EventType", rename_all = "snake_case")]
pub enum ReloadEvent {
    /// Replace the style element contents.
    CssReload {
        #[serde(rename = "UpdateTo")]
        update_to: String,
    },
    /// Reload the page to pick up new code.
    CodeReload,
    /// The latest build failed.
    BundleError,
}

/// What a bundle request asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestTarget {
    Code,
    Styles,
}

impl RequestTarget {
    pub fn parse(content: &str) -> Option<Self> {
        match content {
            "code" => Some(Self::Code),
            "styles" => Some(Self::Styles),
            _ => None,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Code => "code",
            Self::Styles => "styles",
        }
    }
}

impl WireMessage {
    pub fn request(target: RequestTarget, identifier: impl Into<String>) -> Self {
        Self::Request {
            content_type: BUNDLE_REQUEST.into(),
            content: target.as_str().into(),
            identifier: identifier.into(),
        }
    }

    pub fn response(content: Option<String>, identifier: impl Into<String>) -> Self {
        Self::Response {
            content_type: RESPONSE.into(),
            content,
            identifier: identifier.into(),
        }
    }

    pub fn event(event: ReloadEvent) -> Self {
        Self::Event {
            content_type: EVENT.into(),
            content: event,
        }
    }

    /// Parse a text frame. Malformed input yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        serde_json::from_str(text).ok()
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}
