// XML документы протокола авторизации
// Запросы собираются вручную (порядок полей важен для сервера), ответы разбираются через serde

use crate::state::context::{ClientContext, Credentials};
use crate::utils::error::Result;
use crate::utils::xml::from_lenient_str;
use quick_xml::escape::escape;
use serde::Deserialize;

const XML_PROLOG: &str = r#"<?xml version="1.0" encoding="utf-8"?>"#;

/// Общие поля, которые клиент подставляет в каждый запрос
#[derive(Debug, Clone)]
pub struct RequestEnvelope<'a> {
    pub user_agent: &'a str,
    pub local_time: String,
}

// ============================================================================
// Запросы
// ============================================================================

/// Построитель `<request>` документа с экранированием значений
struct RequestWriter {
    out: String,
}

impl RequestWriter {
    fn new() -> Self {
        let mut out = String::with_capacity(512);
        out.push_str(XML_PROLOG);
        out.push_str("\n<request>\n");
        Self { out }
    }

    fn field(mut self, name: &str, value: &str) -> Self {
        self.out.push_str("    <");
        self.out.push_str(name);
        self.out.push('>');
        self.out.push_str(&escape(value));
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
        self
    }

    fn finish(mut self) -> String {
        self.out.push_str("</request>");
        self.out
    }
}

/// Запрос билета (ticket-url)
pub fn ticket_request(env: &RequestEnvelope<'_>, ctx: &ClientContext) -> String {
    RequestWriter::new()
        .field("user-agent", env.user_agent)
        .field("client-id", &ctx.client_id)
        .field("local-time", &env.local_time)
        .field("host-name", &ctx.host_name)
        .field("ipv4", &ctx.user_ip)
        .field("ipv6", "")
        .field("mac", &ctx.mac_address)
        .field("ostag", &ctx.host_name)
        .field("gwip", &ctx.ac_ip)
        .finish()
}

/// Запрос входа (auth-url). `<verify>` добавляется только если код был получен.
pub fn login_request(
    env: &RequestEnvelope<'_>,
    ctx: &ClientContext,
    creds: &Credentials,
    sms_code: Option<&str>,
) -> String {
    let writer = RequestWriter::new()
        .field("user-agent", env.user_agent)
        .field("client-id", &ctx.client_id)
        .field("ticket", &ctx.ticket)
        .field("local-time", &env.local_time)
        .field("userid", &creds.user)
        .field("passwd", creds.password.as_str());

    match sms_code {
        Some(code) if !code.is_empty() => writer.field("verify", code).finish(),
        _ => writer.finish(),
    }
}

/// Heartbeat (keep-url) и завершение сессии (term-url) используют один и тот же документ
pub fn keepalive_request(env: &RequestEnvelope<'_>, ctx: &ClientContext) -> String {
    RequestWriter::new()
        .field("user-agent", env.user_agent)
        .field("client-id", &ctx.client_id)
        .field("local-time", &env.local_time)
        .field("host-name", &ctx.host_name)
        .field("ipv4", &ctx.user_ip)
        .field("ticket", &ctx.ticket)
        .field("ipv6", "")
        .field("mac", &ctx.mac_address)
        .field("ostag", &ctx.host_name)
        .finish()
}

pub fn term_request(env: &RequestEnvelope<'_>, ctx: &ClientContext) -> String {
    keepalive_request(env, ctx)
}

// ============================================================================
// Ответы
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct TicketResponse {
    #[serde(default)]
    pub ticket: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct LoginResponse {
    #[serde(rename = "keep-url", default)]
    pub keep_url: String,
    #[serde(rename = "term-url", default)]
    pub term_url: String,
    #[serde(rename = "keep-retry", default)]
    pub keep_retry: String,
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct HeartbeatResponse {
    #[serde(default)]
    pub interval: String,
}

impl TicketResponse {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut resp: Self = from_lenient_str(xml)?;
        resp.ticket = resp.ticket.trim().to_string();
        Ok(resp)
    }
}

impl LoginResponse {
    pub fn parse(xml: &str) -> Result<Self> {
        let resp: Self = from_lenient_str(xml)?;
        Ok(Self {
            keep_url: resp.keep_url.trim().to_string(),
            term_url: resp.term_url.trim().to_string(),
            keep_retry: resp.keep_retry.trim().to_string(),
        })
    }
}

impl HeartbeatResponse {
    pub fn parse(xml: &str) -> Result<Self> {
        let mut resp: Self = from_lenient_str(xml)?;
        resp.interval = resp.interval.trim().to_string();
        Ok(resp)
    }
}
