//! End-to-end scenarios for the protocol state machine
//!
//! The portal probe, the auth server and the clock are scripted; the server
//! side encrypts its replies with the same suite the client negotiates.

use esurfing_core::config::Config;
use esurfing_core::crypto::descriptor::AlgorithmDescriptor;
use esurfing_core::crypto::session_api::UNKNOWN_ALGORITHM_GUIDANCE;
use esurfing_core::crypto::{Algorithm, CipherSuite};
use esurfing_core::protocol::transport::{checksum, HEADER_ALGO_ID, HEADER_CHECKSUM, HEADER_CLIENT_ID, HEADER_SCHOOL_ID};
use esurfing_core::protocol::verify::{LinePrompt, NoVerification};
use esurfing_core::protocol::{CodePrompt, ConnectivityStatus, PortalProbe, PortalRequest, SmsVerifier, Transport};
use esurfing_core::state::{AuthState, CancellationToken, ClientContext, Collaborators, Credentials, Dialer, Shutdown};
use esurfing_core::storage::{ArtifactSink, FileArtifactSink, MemoryArtifactSink};
use esurfing_core::utils::time::{Clock, ManualClock};
use esurfing_core::{DialerError, Result};
use std::collections::VecDeque;
use std::io::{self, Read};
use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

const TICKET_URL: &str = "http://auth.test/ticket?wlanuserip=10.0.0.2&wlanacip=10.0.0.1";
const AUTH_URL: &str = "http://auth.test/login";
const KEEP_URL: &str = "http://auth.test/keep";
const TERM_URL: &str = "http://auth.test/term";

use ConnectivityStatus::{Connected, RequestError, RequireAuthorization};

// ============================================================================
// Scripted collaborators
// ============================================================================

/// Returns scripted statuses, then cancels the run
struct ScriptedProbe {
    script: VecDeque<ConnectivityStatus>,
    cancel: CancellationToken,
}

impl PortalProbe for ScriptedProbe {
    fn detect(&mut self, ctx: &mut ClientContext) -> ConnectivityStatus {
        match self.script.pop_front() {
            Some(RequireAuthorization) => {
                ctx.ticket_url = TICKET_URL.to_string();
                ctx.auth_url = AUTH_URL.to_string();
                ctx.user_ip = "10.0.0.2".to_string();
                ctx.ac_ip = "10.0.0.1".to_string();
                ctx.cdc.school_id = Some("1001".to_string());
                RequireAuthorization
            }
            Some(status) => status,
            None => {
                self.cancel.cancel();
                Connected
            }
        }
    }
}

struct ServerState {
    algorithm_id: String,
    suite: Box<dyn CipherSuite>,
    ticket: String,
    keep_url: String,
    keep_retry: String,
    interval: String,
    requests: Vec<PortalRequest>,
}

/// In-process auth server that records every request
#[derive(Clone)]
struct FakeServer {
    state: Arc<Mutex<ServerState>>,
}

impl FakeServer {
    fn new(algorithm: Algorithm) -> Self {
        Self::with_id(algorithm.id(), algorithm)
    }

    fn with_id(algorithm_id: &str, suite: Algorithm) -> Self {
        Self {
            state: Arc::new(Mutex::new(ServerState {
                algorithm_id: algorithm_id.to_string(),
                suite: suite.instantiate(),
                ticket: "TICKET-42".to_string(),
                keep_url: KEEP_URL.to_string(),
                keep_retry: "60".to_string(),
                interval: String::new(),
                requests: Vec::new(),
            })),
        }
    }

    fn configure(&self, f: impl FnOnce(&mut ServerState)) {
        f(&mut self.state.lock().unwrap());
    }

    fn requests(&self) -> Vec<PortalRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    fn count(&self, url: &str) -> usize {
        self.requests().iter().filter(|r| r.url == url).count()
    }

    fn plaintext(&self, request: &PortalRequest) -> String {
        let state = self.state.lock().unwrap();
        String::from_utf8(state.suite.decrypt(&request.body).unwrap()).unwrap()
    }
}

impl Transport for FakeServer {
    fn post(&self, request: &PortalRequest) -> Result<Vec<u8>> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request.clone());

        let reply = if request.url == TICKET_URL && request.body == Config::global().placeholder_algo_id {
            let descriptor = AlgorithmDescriptor {
                kind: *b"ZSM",
                key: b"label".to_vec(),
                algorithm_id: state.algorithm_id.clone(),
            };
            return Ok(descriptor.encode());
        } else if request.url == TICKET_URL {
            format!("<response><ticket>{}</ticket></response>", state.ticket)
        } else if request.url == AUTH_URL {
            format!(
                "<response><keep-url>{}</keep-url><term-url>{}</term-url><keep-retry>{}</keep-retry></response>",
                state.keep_url, TERM_URL, state.keep_retry
            )
        } else if request.url == KEEP_URL {
            format!("<response><interval>{}</interval></response>", state.interval)
        } else if request.url == TERM_URL {
            "<response/>".to_string()
        } else {
            return Err(DialerError::Transport(format!("unexpected url {}", request.url)));
        };

        Ok(state.suite.encrypt(reply.as_bytes())?.into_bytes())
    }
}

struct StaticVerifier;

impl SmsVerifier for StaticVerifier {
    fn requires_code(&self, _ctx: &ClientContext, _username: &str) -> bool {
        true
    }

    fn request_code(&self, _ctx: &ClientContext, _username: &str) -> bool {
        true
    }
}

struct ScriptedPrompt(VecDeque<String>);

impl CodePrompt for ScriptedPrompt {
    fn read_code(&mut self) -> Result<String> {
        self.0.pop_front().ok_or(DialerError::UserAbort)
    }
}

/// Stdin stand-in that blocks until its sender is dropped
struct SilentInput(mpsc::Receiver<Vec<u8>>);

impl Read for SilentInput {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        let _ = self.0.recv();
        Ok(0)
    }
}

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a fmt subscriber at `level` writing into a buffer
fn capture_logs<T>(level: tracing::Level, f: impl FnOnce() -> T) -> (T, String) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_ansi(false)
        .with_max_level(level)
        .with_writer(move || writer.clone())
        .finish();
    let out = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.0.lock().unwrap()).into_owned();
    (out, logs)
}

struct Harness {
    dialer: Dialer,
    server: FakeServer,
    clock: Arc<ManualClock>,
    sink: Arc<MemoryArtifactSink>,
}

fn harness(server: FakeServer, script: Vec<ConnectivityStatus>) -> Harness {
    build(server, script, Credentials::new("user", "secret"), Box::new(NoVerification), vec![])
}

fn build(
    server: FakeServer,
    script: Vec<ConnectivityStatus>,
    creds: Credentials,
    verifier: Box<dyn SmsVerifier>,
    codes: Vec<&str>,
) -> Harness {
    let sink = Arc::new(MemoryArtifactSink::new());
    let prompt = Box::new(ScriptedPrompt(codes.into_iter().map(String::from).collect()));
    let setup = Setup {
        config: Config::default(),
        creds,
        verifier,
        prompt,
        sink: Box::new(sink.clone()),
        cancel: CancellationToken::new(),
    };
    let (dialer, clock) = assemble(&server, script, setup);
    Harness {
        dialer,
        server,
        clock,
        sink,
    }
}

struct Setup {
    config: Config,
    creds: Credentials,
    verifier: Box<dyn SmsVerifier>,
    prompt: Box<dyn CodePrompt>,
    sink: Box<dyn ArtifactSink>,
    cancel: CancellationToken,
}

impl Setup {
    fn plain(sink: Box<dyn ArtifactSink>) -> Self {
        Self {
            config: Config::default(),
            creds: Credentials::new("user", "secret"),
            verifier: Box::new(NoVerification),
            prompt: Box::new(ScriptedPrompt(VecDeque::new())),
            sink,
            cancel: CancellationToken::new(),
        }
    }
}

fn assemble(server: &FakeServer, script: Vec<ConnectivityStatus>, setup: Setup) -> (Dialer, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new());
    let parts = Collaborators {
        probe: Box::new(ScriptedProbe {
            script: script.into(),
            cancel: setup.cancel.clone(),
        }),
        transport: Box::new(server.clone()),
        verifier: setup.verifier,
        prompt: setup.prompt,
        sink: setup.sink,
        clock: clock.clone() as Arc<dyn Clock>,
    };

    let ctx = ClientContext::new(&setup.config, Some("02:11:22:33:44:55".to_string()));
    let dialer = Dialer::new(setup.config, setup.creds, ctx, parts, setup.cancel);
    (dialer, clock)
}

// ============================================================================
// Scenarios
// ============================================================================

#[test]
fn test_authorization_request_order() {
    let mut h = harness(FakeServer::new(Algorithm::ModXteaIv), vec![RequireAuthorization, Connected, Connected]);

    assert_eq!(h.dialer.step().unwrap(), RequireAuthorization);
    assert_eq!(h.dialer.state(), AuthState::Authenticated);
    assert!(h.dialer.is_authenticated());

    h.dialer.step().unwrap();
    h.dialer.step().unwrap();
    assert_eq!(h.dialer.state(), AuthState::KeepAlive);

    let requests = h.server.requests();
    let urls: Vec<&str> = requests.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(urls, vec![TICKET_URL, TICKET_URL, AUTH_URL]);

    assert_eq!(requests[0].body, Config::global().placeholder_algo_id);

    let ticket_xml = h.server.plaintext(&requests[1]);
    assert!(ticket_xml.contains("<ipv4>10.0.0.2</ipv4>"));
    assert!(ticket_xml.contains("<gwip>10.0.0.1</gwip>"));
    assert!(ticket_xml.contains("<mac>02:11:22:33:44:55</mac>"));

    let login_xml = h.server.plaintext(&requests[2]);
    assert!(login_xml.contains("<ticket>TICKET-42</ticket>"));
    assert!(login_xml.contains("<userid>user</userid>"));
    assert!(login_xml.contains("<passwd>secret</passwd>"));
    assert!(!login_xml.contains("<verify>"));

    let ctx = h.dialer.context();
    assert_eq!(ctx.keep_url, KEEP_URL);
    assert_eq!(ctx.term_url, TERM_URL);
    assert_eq!(ctx.keep_retry, "60");
}

#[test]
fn test_every_post_carries_cdc_headers() {
    let mut h = harness(FakeServer::new(Algorithm::AesCbc), vec![RequireAuthorization]);
    h.dialer.step().unwrap();

    let requests = h.server.requests();
    assert_eq!(requests.len(), 3);

    let client_id = h.dialer.context().client_id.clone();
    for (i, request) in requests.iter().enumerate() {
        assert_eq!(request.header(HEADER_CHECKSUM), Some(checksum(&request.body).as_str()));
        assert_eq!(request.header(HEADER_CLIENT_ID), Some(client_id.as_str()));
        assert_eq!(request.header(HEADER_SCHOOL_ID), Some("1001"));

        let expected_algo = if i == 0 {
            Config::global().placeholder_algo_id.as_str()
        } else {
            Algorithm::AesCbc.id()
        };
        assert_eq!(request.header(HEADER_ALGO_ID), Some(expected_algo));
    }
}

#[test]
fn test_fresh_client_id_per_attempt() {
    let mut h = harness(FakeServer::new(Algorithm::AesEcb), vec![RequireAuthorization, RequireAuthorization]);

    h.dialer.step().unwrap();
    let first = h.dialer.context().client_id.clone();
    h.dialer.step().unwrap();
    let second = h.dialer.context().client_id.clone();

    assert_ne!(first, second);
    assert_eq!(h.dialer.context().mac_address, "02:11:22:33:44:55");
}

#[test]
fn test_empty_keep_url_is_fatal() {
    let server = FakeServer::new(Algorithm::TripleDesCbc);
    server.configure(|s| s.keep_url = String::new());
    let mut h = harness(server, vec![RequireAuthorization, Connected]);

    let err = h.dialer.run().unwrap_err();
    assert!(matches!(err, DialerError::EmptyKeepUrl));
    assert!(!h.dialer.is_authenticated());
    assert!(!h.dialer.session().is_initialized());
    assert_eq!(h.dialer.state(), AuthState::Terminated);
}

#[test]
fn test_empty_ticket_retries_later() {
    let server = FakeServer::new(Algorithm::TripleDesEcb);
    server.configure(|s| s.ticket = String::new());
    let mut h = harness(server, vec![RequireAuthorization, RequireAuthorization]);

    assert_eq!(h.dialer.step().unwrap(), RequireAuthorization);
    assert!(!h.dialer.is_authenticated());
    assert_eq!(h.server.count(AUTH_URL), 0);

    h.server.configure(|s| s.ticket = "LATE".to_string());
    h.dialer.step().unwrap();
    assert!(h.dialer.is_authenticated());
    assert_eq!(h.dialer.context().ticket, "LATE");
}

#[test]
fn test_keepalive_waits_for_retry_interval() {
    let server = FakeServer::new(Algorithm::ModXtea);
    server.configure(|s| s.keep_retry = "5".to_string());
    let mut h = harness(server, vec![RequireAuthorization; 1].into_iter().chain(vec![Connected; 10]).collect());

    h.dialer.step().unwrap();
    assert_eq!(h.clock.now(), Duration::ZERO);

    // Каждая итерация Connected спит 1 секунду
    for _ in 0..5 {
        h.dialer.step().unwrap();
        assert_eq!(h.server.count(KEEP_URL), 0, "heartbeat at {:?}", h.clock.now());
    }
    assert_eq!(h.clock.now(), Duration::from_secs(5));

    h.dialer.step().unwrap();
    assert_eq!(h.server.count(KEEP_URL), 1);

    h.dialer.step().unwrap();
    assert_eq!(h.server.count(KEEP_URL), 1);
}

#[test]
fn test_heartbeat_interval_replaces_retry() {
    let server = FakeServer::new(Algorithm::AesCbc);
    server.configure(|s| {
        s.keep_retry = "0".to_string();
        s.interval = "30".to_string();
    });
    let mut h = harness(server, vec![RequireAuthorization, Connected]);

    h.dialer.step().unwrap();
    h.dialer.step().unwrap();

    assert_eq!(h.server.count(KEEP_URL), 1);
    assert_eq!(h.dialer.context().keep_retry, "30");
    assert_eq!(h.dialer.context().retry_interval(), Duration::from_secs(30));
}

#[test]
fn test_unparseable_retry_heartbeats_every_iteration() {
    let server = FakeServer::new(Algorithm::AesEcb);
    server.configure(|s| s.keep_retry = "soon".to_string());
    let mut h = harness(server, vec![RequireAuthorization, Connected, Connected, Connected]);

    for _ in 0..4 {
        h.dialer.step().unwrap();
    }
    assert_eq!(h.server.count(KEEP_URL), 3);
}

#[test]
fn test_unknown_algorithm_halts() {
    let server = FakeServer::with_id("DEADBEEF-0000-0000-0000-000000000000", Algorithm::AesCbc);
    let mut h = harness(server, vec![RequireAuthorization, Connected]);

    let err = h.dialer.run().unwrap_err();
    assert!(matches!(err, DialerError::UnknownAlgorithm(_)));
    assert!(err.is_fatal());
    assert!(!h.dialer.session().is_initialized());
    assert_eq!(h.server.requests().len(), 1);

    let artifacts = h.sink.artifacts();
    assert_eq!(artifacts.len(), 1);
    let expected = AlgorithmDescriptor {
        kind: *b"ZSM",
        key: b"label".to_vec(),
        algorithm_id: "DEADBEEF-0000-0000-0000-000000000000".to_string(),
    };
    assert_eq!(artifacts[0].data, expected.encode());
}

#[test]
fn test_reserved_algorithm_is_fatal() {
    let server = FakeServer::with_id(Algorithm::Zuc.id(), Algorithm::AesCbc);
    let mut h = harness(server, vec![RequireAuthorization]);

    let err = h.dialer.run().unwrap_err();
    assert!(err.is_fatal(), "{:?}", err);
    assert_eq!(h.server.count(AUTH_URL), 0);
}

#[test]
fn test_request_error_backs_off() {
    let mut h = harness(FakeServer::new(Algorithm::AesCbc), vec![RequestError, Connected]);

    assert_eq!(h.dialer.step().unwrap(), RequestError);
    assert_eq!(h.clock.now(), Duration::from_secs(5));
    assert!(h.server.requests().is_empty());

    h.dialer.step().unwrap();
    assert_eq!(h.clock.now(), Duration::from_secs(6));
    assert_eq!(h.dialer.state(), AuthState::Connected);
}

#[test]
fn test_run_stops_on_cancellation() {
    let mut h = harness(FakeServer::new(Algorithm::AesCbc), vec![Connected, RequestError]);
    assert_eq!(h.dialer.run().unwrap(), Shutdown::Cancelled);

    let cancelled = harness(FakeServer::new(Algorithm::AesCbc), vec![RequireAuthorization]);
    let mut dialer = cancelled.dialer;
    dialer.cancellation_token().cancel();
    assert_eq!(dialer.run().unwrap(), Shutdown::Cancelled);
    assert!(cancelled.server.requests().is_empty());
}

#[test]
fn test_sms_code_is_prompted_until_non_empty() {
    let mut h = build(
        FakeServer::new(Algorithm::ModXteaIv),
        vec![RequireAuthorization],
        Credentials::new("user", "secret"),
        Box::new(StaticVerifier),
        vec!["", "   ", " 4321 "],
    );
    h.dialer.step().unwrap();

    let requests = h.server.requests();
    assert!(h.server.plaintext(&requests[2]).contains("<verify>4321</verify>"));
}

#[test]
fn test_presupplied_sms_code_skips_prompt() {
    let mut h = build(
        FakeServer::new(Algorithm::AesEcb),
        vec![RequireAuthorization],
        Credentials::new("user", "secret").with_sms_code("9999"),
        Box::new(StaticVerifier),
        vec![],
    );
    h.dialer.step().unwrap();

    let requests = h.server.requests();
    assert!(h.server.plaintext(&requests[2]).contains("<verify>9999</verify>"));
}

#[test]
fn test_terminate_sends_term_and_frees_session() {
    let mut h = harness(FakeServer::new(Algorithm::TripleDesCbc), vec![RequireAuthorization]);
    h.dialer.step().unwrap();

    h.dialer.terminate();
    assert_eq!(h.server.count(TERM_URL), 1);
    assert!(!h.dialer.session().is_initialized());
    assert_eq!(h.dialer.state(), AuthState::Terminated);

    let term_xml = h.server.plaintext(&h.server.requests()[3]);
    assert!(term_xml.contains("<ticket>TICKET-42</ticket>"));
}

#[test]
fn test_terminate_without_login_sends_nothing() {
    let mut h = harness(FakeServer::new(Algorithm::AesCbc), vec![]);
    h.dialer.terminate();
    assert!(h.server.requests().is_empty());
}

#[test]
fn test_unknown_algorithm_dump_lands_on_disk() {
    let dir = tempfile::tempdir().unwrap();
    let id = "DEADBEEF-0000-0000-0000-000000000000";
    let server = FakeServer::with_id(id, Algorithm::AesCbc);
    let setup = Setup::plain(Box::new(FileArtifactSink::new(dir.path())));
    let (mut dialer, _clock) = assemble(&server, vec![RequireAuthorization, Connected], setup);

    let (result, logs) = capture_logs(tracing::Level::INFO, || dialer.run());
    assert!(matches!(result, Err(DialerError::UnknownAlgorithm(ref got)) if got == id));

    let dumps: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().path())
        .collect();
    assert_eq!(dumps.len(), 1);
    let name = dumps[0].file_name().unwrap().to_string_lossy().into_owned();
    assert!(name.starts_with("algo_dump_") && name.ends_with(".bin"), "{}", name);

    let expected = AlgorithmDescriptor {
        kind: *b"ZSM",
        key: b"label".to_vec(),
        algorithm_id: id.to_string(),
    };
    assert_eq!(std::fs::read(&dumps[0]).unwrap(), expected.encode());

    assert!(logs.contains(UNKNOWN_ALGORITHM_GUIDANCE), "{}", logs);
    assert!(logs.contains(&name), "{}", logs);
}

#[test]
fn test_unknown_algorithm_guidance_without_writable_dump_dir() {
    let dir = tempfile::tempdir().unwrap();
    let server = FakeServer::with_id("DEAD", Algorithm::AesCbc);
    let setup = Setup::plain(Box::new(FileArtifactSink::new(dir.path().join("missing"))));
    let (mut dialer, _clock) = assemble(&server, vec![RequireAuthorization], setup);

    let (result, logs) = capture_logs(tracing::Level::INFO, || dialer.run());
    assert!(matches!(result, Err(DialerError::UnknownAlgorithm(_))));
    assert!(logs.contains("Failed to save descriptor dump"), "{}", logs);
    assert!(logs.contains(UNKNOWN_ALGORITHM_GUIDANCE), "{}", logs);
}

#[test]
fn test_injected_config_drives_headers_and_body() {
    let server = FakeServer::new(Algorithm::AesEcb);
    let mut setup = Setup::plain(Box::new(MemoryArtifactSink::new()));
    setup.config.user_agent = "Custom-Agent/9.9".to_string();
    let (mut dialer, _clock) = assemble(&server, vec![RequireAuthorization], setup);

    dialer.step().unwrap();

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    for request in &requests {
        assert_eq!(request.header("User-Agent"), Some("Custom-Agent/9.9"));
    }
    assert!(server
        .plaintext(&requests[2])
        .contains("<user-agent>Custom-Agent/9.9</user-agent>"));
}

#[test]
fn test_ticket_and_sms_code_stay_out_of_info_logs() {
    let server = FakeServer::new(Algorithm::ModXtea);
    let mut setup = Setup::plain(Box::new(MemoryArtifactSink::new()));
    setup.creds = Credentials::new("user", "secret").with_sms_code("864209");
    setup.verifier = Box::new(StaticVerifier);
    let (mut dialer, _clock) = assemble(&server, vec![RequireAuthorization], setup);

    let (result, logs) = capture_logs(tracing::Level::INFO, || dialer.step());
    assert!(result.is_ok());
    assert!(dialer.is_authenticated());
    assert!(logs.contains("Ticket received"), "{}", logs);
    assert!(!logs.contains("TICKET-42"), "{}", logs);
    assert!(!logs.contains("864209"), "{}", logs);
}

#[test]
fn test_cancellation_interrupts_blocked_code_prompt() {
    let (_keep_open, rx) = mpsc::channel::<Vec<u8>>();
    let server = FakeServer::new(Algorithm::AesCbc);
    let mut setup = Setup::plain(Box::new(MemoryArtifactSink::new()));
    setup.verifier = Box::new(StaticVerifier);
    setup.prompt = Box::new(LinePrompt::new(io::BufReader::new(SilentInput(rx)), setup.cancel.clone()));
    let cancel = setup.cancel.clone();
    let (mut dialer, _clock) = assemble(&server, vec![RequireAuthorization], setup);

    let canceller = std::thread::spawn(move || {
        std::thread::sleep(Duration::from_millis(50));
        cancel.cancel();
    });

    assert_eq!(dialer.run().unwrap(), Shutdown::Cancelled);
    canceller.join().unwrap();
    assert!(server.requests().is_empty());

    dialer.terminate();
    assert_eq!(dialer.state(), AuthState::Terminated);
    assert!(server.requests().is_empty());
}
