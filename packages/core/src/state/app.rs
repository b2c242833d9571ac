//! Протокольный автомат: обнаружение портала, согласование шифра,
//! билет, вход, keep-alive и завершение сессии.
//!
//! ```text
//! Idle → Probing → { Connected, NeedsAuth, Error }
//! NeedsAuth → Negotiating → TicketFetch → Login → Authenticated
//! Authenticated → KeepAlive (heartbeat по таймеру)
//! * → Terminated (остановка или фатальная ошибка)
//! ```
//!
//! Один рабочий поток вызывает [`Dialer::step`] в цикле. Все паузы идут
//! через [`Clock::sleep`] с токеном отмены, поэтому запрос на остановку
//! прерывает их сразу. Ошибки попытки авторизации возвращают управление в
//! цикл проверки, кроме фатальных (см. [`DialerError::is_fatal`]).

use crate::config::Config;
use crate::crypto::CipherSession;
use crate::protocol::messages::{
    self, HeartbeatResponse, LoginResponse, RequestEnvelope, TicketResponse,
};
use crate::protocol::{CodePrompt, ConnectivityStatus, PortalProbe, PortalRequest, SmsVerifier, Transport};
use crate::state::cancel::CancellationToken;
use crate::state::context::{ClientContext, Credentials};
use crate::storage::ArtifactSink;
use crate::utils::error::{DialerError, Result};
use crate::utils::time::{portal_local_time, Clock};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Наблюдаемое состояние автомата
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Idle,
    Probing,
    Connected,
    NeedsAuth,
    Negotiating,
    TicketFetch,
    Login,
    Authenticated,
    KeepAlive,
    RequestError,
    Terminated,
}

/// Причина штатного завершения [`Dialer::run`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Cancelled,
}

/// Внешние зависимости автомата
pub struct Collaborators {
    pub probe: Box<dyn PortalProbe>,
    pub transport: Box<dyn Transport>,
    pub verifier: Box<dyn SmsVerifier>,
    pub prompt: Box<dyn CodePrompt>,
    pub sink: Box<dyn ArtifactSink>,
    pub clock: Arc<dyn Clock>,
}

pub struct Dialer {
    config: Config,
    ctx: ClientContext,
    creds: Credentials,
    session: CipherSession,

    probe: Box<dyn PortalProbe>,
    transport: Box<dyn Transport>,
    verifier: Box<dyn SmsVerifier>,
    prompt: Box<dyn CodePrompt>,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,

    state: AuthState,
    authenticated: bool,
    last_heartbeat: Duration,
}

impl Dialer {
    pub fn new(
        config: Config,
        creds: Credentials,
        ctx: ClientContext,
        parts: Collaborators,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            config,
            ctx,
            creds,
            session: CipherSession::new(parts.sink),
            probe: parts.probe,
            transport: parts.transport,
            verifier: parts.verifier,
            prompt: parts.prompt,
            clock: parts.clock,
            cancel,
            state: AuthState::Idle,
            authenticated: false,
            last_heartbeat: Duration::ZERO,
        }
    }

    // === Наблюдение ===

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_authenticated(&self) -> bool {
        self.authenticated
    }

    pub fn context(&self) -> &ClientContext {
        &self.ctx
    }

    pub fn session(&self) -> &CipherSession {
        &self.session
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    // === Главный цикл ===

    /// Крутить [`step`](Self::step) до отмены или фатальной ошибки
    pub fn run(&mut self) -> Result<Shutdown> {
        loop {
            match self.step() {
                Ok(_) => {}
                Err(DialerError::UserAbort) => {
                    info!(target: "dialer::auth", "Shutdown requested");
                    return Ok(Shutdown::Cancelled);
                }
                Err(e) => {
                    self.session.free();
                    self.state = AuthState::Terminated;
                    return Err(e);
                }
            }
        }
    }

    /// Одна итерация: проверка подключения и переход по её результату.
    ///
    /// Возвращает `Err` только при отмене или фатальной ошибке.
    pub fn step(&mut self) -> Result<ConnectivityStatus> {
        self.ensure_running()?;
        self.state = AuthState::Probing;
        let status = self.probe.detect(&mut self.ctx);

        match status {
            ConnectivityStatus::Connected => {
                if self.authenticated && self.session.is_initialized() {
                    self.state = AuthState::KeepAlive;
                    let elapsed = self.clock.now().saturating_sub(self.last_heartbeat);
                    if elapsed >= self.ctx.retry_interval() {
                        self.heartbeat()?;
                    }
                } else {
                    self.state = AuthState::Connected;
                    info!(target: "dialer::probe", "The network has been connected");
                }
                self.pause(self.config.connected_poll())?;
            }
            ConnectivityStatus::RequireAuthorization => {
                self.authenticated = false;
                self.state = AuthState::NeedsAuth;
                match self.authorize() {
                    Ok(()) => {}
                    Err(e) if e.is_fatal() || matches!(e, DialerError::UserAbort) => return Err(e),
                    Err(e) => {
                        warn!(target: "dialer::auth", error = %e, "Authorization attempt failed");
                        self.state = AuthState::NeedsAuth;
                    }
                }
            }
            ConnectivityStatus::RequestError => {
                self.state = AuthState::RequestError;
                warn!(target: "dialer::probe", "Request error");
                self.pause(self.config.request_error_backoff())?;
            }
        }

        Ok(status)
    }

    // === Авторизация ===

    fn authorize(&mut self) -> Result<()> {
        let code = self.obtain_sms_code()?;
        if let Some(code) = &code {
            info!(target: "dialer::auth", "Using SMS code");
            debug!(target: "dialer::auth", code = %code, "SMS code value");
        }

        self.ctx.refresh(&self.config);
        self.ctx.clear_login();

        self.state = AuthState::Negotiating;
        self.negotiate()?;
        info!(
            target: "dialer::auth",
            client_ip = %self.ctx.user_ip,
            ac_ip = %self.ctx.ac_ip,
            "Session negotiated"
        );

        self.state = AuthState::TicketFetch;
        self.fetch_ticket()?;

        self.state = AuthState::Login;
        self.login(code.as_deref())?;

        self.last_heartbeat = self.clock.now();
        self.authenticated = true;
        self.state = AuthState::Authenticated;
        info!(target: "dialer::auth", "The login has been authorized");
        Ok(())
    }

    fn obtain_sms_code(&mut self) -> Result<Option<String>> {
        if let Some(code) = self.creds.sms_code.clone() {
            return Ok(Some(code));
        }

        let user = self.creds.user.as_str();
        if !(self.verifier.requires_code(&self.ctx, user) && self.verifier.request_code(&self.ctx, user)) {
            return Ok(None);
        }

        info!(target: "dialer::auth", "This login requires a SMS verification code");
        loop {
            self.ensure_running()?;
            let input = self.prompt.read_code()?;
            let code = input.trim();
            if !code.is_empty() {
                return Ok(Some(code.to_string()));
            }
        }
    }

    /// Незашифрованный запрос к ticket-url с placeholder Algo-ID, в ответ приходит дескриптор.
    /// Любая ошибка здесь фатальна: без шифра дальше двигаться некуда.
    fn negotiate(&mut self) -> Result<()> {
        self.ensure_running()?;
        let request = PortalRequest::new(&self.ctx.ticket_url, self.ctx.algo_id.clone(), &self.ctx, &self.config);

        let descriptor = match self.transport.post(&request) {
            Ok(bytes) => bytes,
            Err(e) => {
                self.session.free();
                return Err(DialerError::Negotiation(e.to_string()));
            }
        };

        let algorithm = self.session.load(&descriptor).map_err(|e| {
            error!(target: "dialer::auth", error = %e, "Unable to negotiate session cipher");
            e
        })?;
        self.ctx.algo_id = algorithm.id().to_string();

        if !algorithm.is_supported() {
            warn!(target: "dialer::auth", algo = %algorithm, "Server selected a reserved algorithm");
        }
        Ok(())
    }

    fn fetch_ticket(&mut self) -> Result<()> {
        let plaintext = messages::ticket_request(&self.envelope(), &self.ctx);
        let reply = self.exchange(&self.ctx.ticket_url, &plaintext)?;

        let ticket = TicketResponse::parse(&reply)
            .map_err(|e| {
                debug!(target: "dialer::auth", xml = %reply, "Unparseable ticket response");
                e
            })?
            .ticket;
        if ticket.is_empty() {
            return Err(DialerError::Protocol("empty ticket".to_string()));
        }

        info!(target: "dialer::auth", "Ticket received");
        debug!(target: "dialer::auth", ticket = %ticket, "Ticket value");
        self.ctx.ticket = ticket;
        Ok(())
    }

    fn login(&mut self, code: Option<&str>) -> Result<()> {
        let plaintext = messages::login_request(&self.envelope(), &self.ctx, &self.creds, code);
        let reply = self.exchange(&self.ctx.auth_url, &plaintext)?;

        let resp = LoginResponse::parse(&reply).map_err(|e| {
            debug!(target: "dialer::auth", xml = %reply, "Unparseable login response");
            e
        })?;

        info!(
            target: "dialer::auth",
            keep_url = %resp.keep_url,
            term_url = %resp.term_url,
            keep_retry = %resp.keep_retry,
            "Login response"
        );

        if resp.keep_url.is_empty() {
            error!(target: "dialer::auth", "KeepUrl is empty");
            self.session.free();
            return Err(DialerError::EmptyKeepUrl);
        }

        self.ctx.keep_url = resp.keep_url;
        self.ctx.term_url = resp.term_url;
        self.ctx.keep_retry = resp.keep_retry;
        Ok(())
    }

    // === Keep-alive ===

    /// Отправить heartbeat. Ошибки сети и разбора не фатальны: таймер
    /// сбрасывается в любом случае, следующая попытка через `keep-retry`.
    fn heartbeat(&mut self) -> Result<()> {
        self.ensure_running()?;
        info!(target: "dialer::keepalive", "Send keep packet");

        let plaintext = messages::keepalive_request(&self.envelope(), &self.ctx);
        let outcome = self
            .exchange(&self.ctx.keep_url, &plaintext)
            .and_then(|reply| HeartbeatResponse::parse(&reply));

        match outcome {
            Ok(resp) if !resp.interval.is_empty() => self.ctx.keep_retry = resp.interval,
            Ok(_) => {}
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => warn!(target: "dialer::keepalive", error = %e, "Heartbeat failed"),
        }

        self.last_heartbeat = self.clock.now();
        info!(target: "dialer::keepalive", next_retry = %self.ctx.keep_retry, "Heartbeat done");
        Ok(())
    }

    /// Завершить сессию: best-effort запрос на term-url, затем сброс шифра.
    /// Ошибки только логируются.
    pub fn terminate(&mut self) {
        if self.authenticated && self.session.is_initialized() && !self.ctx.term_url.is_empty() {
            info!(target: "dialer::auth", "Terminating session");
            let plaintext = messages::term_request(&self.envelope(), &self.ctx);
            if let Err(e) = self.exchange(&self.ctx.term_url, &plaintext) {
                debug!(target: "dialer::auth", error = %e, "Termination request failed");
            }
        }
        self.authenticated = false;
        self.session.free();
        self.state = AuthState::Terminated;
    }

    // === Вспомогательное ===

    /// encrypt → POST → decrypt
    fn exchange(&self, url: &str, plaintext: &str) -> Result<String> {
        let body = self.session.encrypt(plaintext)?;
        let request = PortalRequest::new(url, body, &self.ctx, &self.config);
        let reply = self.transport.post(&request)?;
        self.session.decrypt(String::from_utf8_lossy(&reply).trim())
    }

    fn envelope(&self) -> RequestEnvelope<'_> {
        RequestEnvelope {
            user_agent: &self.config.user_agent,
            local_time: portal_local_time(self.config.portal_utc_offset_hours),
        }
    }

    fn ensure_running(&self) -> Result<()> {
        if self.cancel.is_cancelled() {
            Err(DialerError::UserAbort)
        } else {
            Ok(())
        }
    }

    fn pause(&self, duration: Duration) -> Result<()> {
        if self.clock.sleep(duration, &self.cancel) {
            Ok(())
        } else {
            Err(DialerError::UserAbort)
        }
    }
}
