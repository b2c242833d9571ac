// SMS верификация перед входом
// Портал регистрирует точки QueryVerificateCodeStatus и QueryAuthCode в <funcfg>

use crate::config::Config;
use crate::protocol::transport::build_client;
use crate::state::cancel::CancellationToken;
use crate::state::context::ClientContext;
use crate::utils::error::{DialerError, Result};
use crate::utils::time::current_timestamp_millis;
use md5::{Digest, Md5};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::io::BufRead;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

pub const STATUS_FUNCTION: &str = "QueryVerificateCodeStatus";
pub const REQUEST_FUNCTION: &str = "QueryAuthCode";

/// rescode, при котором сервер требует код
pub const STATUS_CODE_REQUIRED: &str = "11062000";
pub const REQUEST_CODE_SENT: &str = "0";

const VERIFY_ACCEPT: &str = "okhttp/3.4.1";

/// Как часто ожидание ввода проверяет токен отмены
const PROMPT_POLL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct VerifyRequest {
    pub schoolid: String,
    pub username: String,
    pub timestamp: String,
    pub authenticator: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VerifyResponse {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub resinfo: String,
    #[serde(default)]
    pub rescode: String,
}

/// upper-hex MD5(schoolid + timestamp + salt)
pub fn authenticator(school_id: &str, timestamp: &str, auth_key: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(school_id.as_bytes());
    hasher.update(timestamp.as_bytes());
    hasher.update(auth_key.as_bytes());
    hex::encode_upper(hasher.finalize())
}

impl VerifyRequest {
    pub fn new(ctx: &ClientContext, username: &str, timestamp_millis: i64, auth_key: &str) -> Self {
        let schoolid = ctx.cdc.school_id.clone().unwrap_or_default();
        let timestamp = timestamp_millis.to_string();
        Self {
            authenticator: authenticator(&schoolid, &timestamp, auth_key),
            schoolid,
            username: username.to_string(),
            timestamp,
        }
    }
}

/// Сервис SMS верификации
pub trait SmsVerifier {
    /// Требует ли сервер код для этого пользователя
    fn requires_code(&self, ctx: &ClientContext, username: &str) -> bool;

    /// Попросить сервер отправить код. `true`, если код отправлен.
    fn request_code(&self, ctx: &ClientContext, username: &str) -> bool;
}

/// Ввод кода пользователем
pub trait CodePrompt {
    /// Прочитать одну строку ввода. Пустая строка допустима, вызывающий спросит снова.
    fn read_code(&mut self) -> Result<String>;
}

/// Построчный ввод кода, прерываемый отменой.
///
/// Блокирующее чтение идёт в отдельном потоке, запущенном при первом
/// запросе кода. Сам `read_code` ждёт строку и токен отмены одновременно,
/// поэтому сигнал остановки не застревает в `read_line`. Конец ввода
/// трактуется как [`DialerError::UserAbort`].
pub struct LinePrompt<R> {
    source: Option<R>,
    lines: Option<Receiver<String>>,
    cancel: CancellationToken,
}

impl<R: BufRead + Send + 'static> LinePrompt<R> {
    pub fn new(source: R, cancel: CancellationToken) -> Self {
        Self {
            source: Some(source),
            lines: None,
            cancel,
        }
    }

    fn lines(&mut self) -> Result<&Receiver<String>> {
        if let Some(source) = self.source.take() {
            let (tx, rx) = mpsc::channel();
            thread::Builder::new()
                .name("code-prompt".to_string())
                .spawn(move || forward_lines(source, tx))?;
            self.lines = Some(rx);
        }
        self.lines.as_ref().ok_or(DialerError::UserAbort)
    }
}

fn forward_lines<R: BufRead>(mut source: R, tx: Sender<String>) {
    loop {
        let mut line = String::new();
        match source.read_line(&mut line) {
            Ok(0) => return,
            Ok(_) => {
                if tx.send(line).is_err() {
                    return;
                }
            }
            Err(e) => {
                debug!(target: "dialer::verify", error = %e, "Code input closed");
                return;
            }
        }
    }
}

impl<R: BufRead + Send + 'static> CodePrompt for LinePrompt<R> {
    fn read_code(&mut self) -> Result<String> {
        let cancel = self.cancel.clone();
        let lines = self.lines()?;
        loop {
            if cancel.is_cancelled() {
                return Err(DialerError::UserAbort);
            }
            match lines.recv_timeout(PROMPT_POLL) {
                Ok(line) => return Ok(line),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(DialerError::UserAbort),
            }
        }
    }
}

/// Верификация отключена: код никогда не требуется
pub struct NoVerification;

impl SmsVerifier for NoVerification {
    fn requires_code(&self, _ctx: &ClientContext, _username: &str) -> bool {
        false
    }

    fn request_code(&self, _ctx: &ClientContext, _username: &str) -> bool {
        false
    }
}

pub struct HttpSmsVerifier {
    client: Client,
    user_agent: String,
    auth_key: String,
}

impl HttpSmsVerifier {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            user_agent: config.user_agent.clone(),
            auth_key: config.auth_key.clone(),
        })
    }

    fn query(&self, ctx: &ClientContext, function: &str, username: &str, expected: &str) -> Result<bool> {
        let Some(url) = ctx.extra_urls.get(function).filter(|u| !u.is_empty()) else {
            debug!(target: "dialer::verify", function, "Verification endpoint not registered");
            return Ok(false);
        };

        let request = VerifyRequest::new(ctx, username, current_timestamp_millis(), &self.auth_key);
        let body = serde_json::to_string(&request)
            .map_err(|e| DialerError::Parse(format!("JSON: {}", e)))?;

        let response = self
            .client
            .post(url.as_str())
            .header("User-Agent", self.user_agent.as_str())
            .header("Accept", VERIFY_ACCEPT)
            .header("Content-Type", "application/json")
            .body(body)
            .send()?;

        if response.status() != reqwest::StatusCode::OK {
            debug!(target: "dialer::verify", function, status = %response.status(), "Verification endpoint refused");
            return Ok(false);
        }

        let parsed: VerifyResponse = serde_json::from_str(&response.text()?)
            .map_err(|e| DialerError::Parse(format!("JSON: {}", e)))?;
        debug!(target: "dialer::verify", function, rescode = %parsed.rescode, resinfo = %parsed.resinfo, "Verification response");
        Ok(parsed.rescode == expected)
    }

    fn query_or_false(&self, ctx: &ClientContext, function: &str, username: &str, expected: &str) -> bool {
        self.query(ctx, function, username, expected).unwrap_or_else(|e| {
            warn!(target: "dialer::verify", function, error = %e, "Verification request failed");
            false
        })
    }
}

impl SmsVerifier for HttpSmsVerifier {
    fn requires_code(&self, ctx: &ClientContext, username: &str) -> bool {
        self.query_or_false(ctx, STATUS_FUNCTION, username, STATUS_CODE_REQUIRED)
    }

    fn request_code(&self, ctx: &ClientContext, username: &str) -> bool {
        self.query_or_false(ctx, REQUEST_FUNCTION, username, REQUEST_CODE_SENT)
    }
}
