//! Loopback tests: real sockets, real WebSocket clients.

use std::collections::VecDeque;
use std::net::{IpAddr, Ipv4Addr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::*;
use crate::build::{BuildSettings, BuildStore, Orchestrator, Trigger};
use crate::bundle::{BundleEngine, BundleError, BundleOutput, BundleRequest, StyleFragment};
use crate::core::OutputMode;

type Client = WebSocket<MaybeTlsStream<TcpStream>>;

/// Engine returning `(style, code)` pairs in order.
struct SequenceEngine(Mutex<VecDeque<(&'static str, &'static str)>>);

impl BundleEngine for SequenceEngine {
    fn bundle(&self, _request: &BundleRequest) -> Result<BundleOutput, BundleError> {
        let (style, code) = self
            .0
            .lock()
            .pop_front()
            .ok_or_else(|| BundleError::Engine("exhausted".into()))?;
        Ok(BundleOutput {
            code: code.into(),
            styles: vec![StyleFragment::new("src/app.css", style)],
        })
    }
}

struct Session {
    server: ReloadServer,
    orchestrator: Orchestrator,
}

fn session(builds: &[(&'static str, &'static str)]) -> Session {
    let store = Arc::new(BuildStore::new());
    let hub = Arc::new(ReloadHub::new(Arc::clone(&store)));
    let server = ReloadServer::start(Arc::clone(&hub), IpAddr::V4(Ipv4Addr::LOCALHOST), 0).unwrap();
    let engine = Arc::new(SequenceEngine(Mutex::new(builds.iter().copied().collect())));
    let orchestrator = Orchestrator::new(
        engine,
        store,
        hub,
        BuildSettings {
            project_name: "loopback".into(),
            entry: "src/index.tsx".into(),
            out_dir: ".livebundle".into(),
            mode: OutputMode::Development,
            require_changes_to_refresh: true,
        },
    );
    Session {
        server,
        orchestrator,
    }
}

impl Session {
    fn connect(&self) -> Client {
        let url = format!("ws://127.0.0.1:{}", self.server.port());
        let (client, _) = tungstenite::connect(url).unwrap();
        if let MaybeTlsStream::Plain(stream) = client.get_ref() {
            stream
                .set_read_timeout(Some(Duration::from_millis(300)))
                .unwrap();
        }
        client
    }

    fn wait_for_clients(&self, n: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while self.server.hub().client_count() < n {
            assert!(Instant::now() < deadline, "clients did not register");
            std::thread::sleep(Duration::from_millis(10));
        }
    }
}

/// Next protocol message, or `None` when nothing arrives before the read timeout.
fn next_message(client: &mut Client) -> Option<WireMessage> {
    loop {
        match client.read() {
            Ok(Message::Text(text)) => return WireMessage::parse(text.as_str()),
            Ok(_) => {}
            Err(tungstenite::Error::Io(e))
                if matches!(
                    e.kind(),
                    std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
                ) =>
            {
                return None;
            }
            Err(e) => panic!("client read failed: {e}"),
        }
    }
}

fn request(client: &mut Client, target: RequestTarget, id: &str) -> WireMessage {
    client
        .send(Message::Text(WireMessage::request(target, id).to_json().into()))
        .unwrap();
    next_message(client).expect("response")
}

#[test]
fn test_request_before_first_build_has_no_content() {
    let session = session(&[]);
    let mut client = session.connect();

    let response = request(&mut client, RequestTarget::Code, "aaaa0001");
    assert_eq!(response, WireMessage::response(None, "aaaa0001"));
}

#[test]
fn test_response_echoes_identifier() {
    let session = session(&[(".a{}", "console.log(1)")]);
    session.orchestrator.run_build(Trigger::Startup);
    let mut client = session.connect();

    let WireMessage::Response {
        content,
        identifier,
        ..
    } = request(&mut client, RequestTarget::Styles, "x7y8z9w0")
    else {
        panic!("expected response");
    };
    assert_eq!(identifier, "x7y8z9w0");
    assert_eq!(content.as_deref(), Some("/* src/app.css */\n.a{}"));

    // Exactly one response per request.
    assert!(next_message(&mut client).is_none());
}

#[test]
fn test_style_only_rebuild_reaches_every_client() {
    let session = session(&[(".a{color:red}", "A"), (".a{color:blue}", "A")]);
    session.orchestrator.run_build(Trigger::Startup);

    let mut first = session.connect();
    let mut second = session.connect();
    session.wait_for_clients(2);

    session.orchestrator.run_build(Trigger::Manual);

    let expected = WireMessage::event(ReloadEvent::CssReload {
        update_to: "/* src/app.css */\n.a{color:blue}".into(),
    });
    assert_eq!(next_message(&mut first), Some(expected.clone()));
    assert_eq!(next_message(&mut second), Some(expected));

    // No code_reload follows.
    assert!(next_message(&mut first).is_none());
    assert!(next_message(&mut second).is_none());
}

#[test]
fn test_late_client_gets_latest_build() {
    let session = session(&[("", "one"), ("", "two"), ("", "three")]);
    for _ in 0..3 {
        session.orchestrator.run_build(Trigger::Manual);
    }

    let mut client = session.connect();
    let WireMessage::Response { content, .. } = request(&mut client, RequestTarget::Code, "late0001")
    else {
        panic!("expected response");
    };
    let code = content.unwrap();
    assert!(code.ends_with("three"));
    assert!(code.contains(&crate::identity::compute_identity("loopback", "three").code));
}

#[test]
fn test_closed_client_is_deregistered() {
    let session = session(&[]);
    let mut client = session.connect();
    session.wait_for_clients(1);

    client.close(None).unwrap();
    let _ = client.flush();

    let deadline = Instant::now() + Duration::from_secs(5);
    while session.server.hub().client_count() > 0 {
        assert!(Instant::now() < deadline, "client was not removed");
        std::thread::sleep(Duration::from_millis(10));
    }
}
