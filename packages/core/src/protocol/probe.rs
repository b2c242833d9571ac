//! Network Probe: проверка подключения и извлечение конфигурации портала.
//!
//! Портал перехватывает запрос к captive URL и отдаёт страницу, внутри
//! которой между двумя комментариями-маркерами лежит XML с адресами
//! auth-url и ticket-url. Редиректы проходятся вручную, чтобы на каждом
//! шаге собрать заголовки `area`, `schoolid` и `domain`.

use crate::config::Config;
use crate::protocol::transport::build_client;
use crate::state::context::{CdcHeaders, ClientContext};
use crate::utils::error::{DialerError, Result};
use crate::utils::xml::{extract_between, repair_ampersands};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use reqwest::blocking::{Client, Response};
use reqwest::header::{HeaderMap, LOCATION};
use reqwest::{StatusCode, Url};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Connected,
    RequireAuthorization,
    RequestError,
}

/// Источник состояния подключения для главного цикла
pub trait PortalProbe {
    /// Проверить подключение; при обнаружении портала заполнить URL и адреса в `ctx`
    fn detect(&mut self, ctx: &mut ClientContext) -> ConnectivityStatus;
}

// ============================================================================
// Конфигурация портала
// ============================================================================

/// Разобранный блок `<config>` со страницы портала
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalConfig {
    pub auth_url: String,
    pub ticket_url: String,
    /// Дополнительные точки входа из `<funcfg>` с `enable="1"`
    pub functions: HashMap<String, String>,
}

impl PortalConfig {
    pub fn parse(xml: &str) -> Result<Self> {
        let repaired = repair_ampersands(xml);
        let mut reader = Reader::from_str(&repaired);
        reader.trim_text(true);

        let mut config = PortalConfig::default();
        let mut path: Vec<String> = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(e) => {
                    let name = element_name(&e);
                    if path.last().map(String::as_str) == Some("funcfg") {
                        config.register_function(&name, &e)?;
                    }
                    path.push(name);
                }
                Event::Empty(e) => {
                    if path.last().map(String::as_str) == Some("funcfg") {
                        config.register_function(&element_name(&e), &e)?;
                    }
                }
                Event::Text(t) => {
                    let text = t.unescape()?;
                    config.push_text(path.last().map(String::as_str), &text);
                }
                Event::CData(c) => {
                    let text = String::from_utf8_lossy(&c).into_owned();
                    config.push_text(path.last().map(String::as_str), &text);
                }
                Event::End(_) => {
                    path.pop();
                }
                Event::Eof => break,
                _ => {}
            }
        }

        config.auth_url = normalize_url(&config.auth_url);
        config.ticket_url = normalize_url(&config.ticket_url);
        Ok(config)
    }

    fn push_text(&mut self, element: Option<&str>, text: &str) {
        match element {
            Some("auth-url") => self.auth_url.push_str(text),
            Some("ticket-url") => self.ticket_url.push_str(text),
            _ => {}
        }
    }

    fn register_function(&mut self, name: &str, e: &BytesStart<'_>) -> Result<()> {
        let mut enable = String::new();
        let mut url = String::new();

        for attr in e.attributes() {
            let attr = attr.map_err(quick_xml::Error::from)?;
            match attr.key.as_ref() {
                b"enable" => enable = attr.unescape_value()?.into_owned(),
                b"url" => url = attr.unescape_value()?.into_owned(),
                _ => {}
            }
        }

        if enable == "1" && !url.is_empty() {
            debug!(target: "dialer::probe", function = %name, %url, "Registered portal function");
            self.functions.insert(name.to_string(), url);
        }
        Ok(())
    }
}

fn element_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).into_owned()
}

// Некоторые порталы экранируют `&` в URL дважды
fn normalize_url(raw: &str) -> String {
    raw.trim().replace("&amp;", "&")
}

/// Разобрать страницу портала и перенести найденные параметры в контекст.
///
/// Нет маркеров: сеть уже подключена. Ошибка разбора, пустой auth-url или
/// ticket-url, отсутствие `wlanuserip`/`wlanacip` в ticket-url: RequestError.
pub fn apply_portal_page(page: &str, ctx: &mut ClientContext, config: &Config) -> ConnectivityStatus {
    let block = match extract_between(page, &config.portal_start_tag, &config.portal_end_tag) {
        Some(block) if !block.trim().is_empty() => block,
        _ => return ConnectivityStatus::Connected,
    };
    debug!(target: "dialer::probe", config = %block.trim(), "Portal config extracted");

    let portal = match PortalConfig::parse(block) {
        Ok(portal) => portal,
        Err(e) => {
            warn!(target: "dialer::probe", error = %e, "Failed to parse portal config");
            return ConnectivityStatus::RequestError;
        }
    };

    ctx.auth_url = portal.auth_url;
    ctx.ticket_url = portal.ticket_url;
    ctx.extra_urls.extend(portal.functions);

    if ctx.auth_url.is_empty() || ctx.ticket_url.is_empty() {
        warn!(
            target: "dialer::probe",
            auth_url = %ctx.auth_url,
            ticket_url = %ctx.ticket_url,
            "Missing auth-url or ticket-url"
        );
        return ConnectivityStatus::RequestError;
    }

    let ticket_url = match Url::parse(&ctx.ticket_url) {
        Ok(url) => url,
        Err(e) => {
            warn!(target: "dialer::probe", error = %e, "Invalid ticket-url");
            return ConnectivityStatus::RequestError;
        }
    };

    let query: HashMap<String, String> = ticket_url.query_pairs().into_owned().collect();
    ctx.user_ip = query.get("wlanuserip").cloned().unwrap_or_default();
    ctx.ac_ip = query.get("wlanacip").cloned().unwrap_or_default();

    if ctx.user_ip.is_empty() || ctx.ac_ip.is_empty() {
        warn!(target: "dialer::probe", "Missing wlanuserip or wlanacip in ticket-url");
        return ConnectivityStatus::RequestError;
    }

    ConnectivityStatus::RequireAuthorization
}

/// Обновить CDC заголовки из ответа портала (непустые значения перезаписывают старые)
pub fn harvest_cdc_headers(headers: &HeaderMap, cdc: &mut CdcHeaders) {
    let slots = [
        ("area", &mut cdc.area),
        ("schoolid", &mut cdc.school_id),
        ("domain", &mut cdc.domain),
    ];
    for (name, slot) in slots {
        let value = headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty());
        if let Some(value) = value {
            info!(target: "dialer::probe", header = name, value, "Harvested CDC header");
            *slot = Some(value.to_string());
        }
    }
}

// ============================================================================
// HTTP реализация
// ============================================================================

pub struct HttpPortalProbe {
    client: Client,
    config: Config,
}

impl HttpPortalProbe {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
            config: config.clone(),
        })
    }

    fn follow_redirects(&self, ctx: &mut ClientContext) -> Result<Response> {
        let mut current = Url::parse(&self.config.captive_url)
            .map_err(|e| DialerError::Transport(format!("Invalid captive url: {}", e)))?;

        for hop in 0..self.config.max_redirects {
            let response = self
                .client
                .get(current.clone())
                .header("User-Agent", self.config.user_agent.as_str())
                .header("Accept", self.config.request_accept.as_str())
                .header("Client-ID", ctx.client_id.as_str())
                .send()?;

            harvest_cdc_headers(response.headers(), &mut ctx.cdc);

            if !response.status().is_redirection() {
                return Ok(response);
            }
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned);
            let Some(location) = location else {
                return Ok(response);
            };

            current = current
                .join(&location)
                .map_err(|e| DialerError::Transport(format!("Invalid redirect location: {}", e)))?;
            debug!(target: "dialer::probe", hop = hop + 1, url = %current, "Redirect");
        }

        Err(DialerError::Transport("too many redirects".to_string()))
    }
}

impl PortalProbe for HttpPortalProbe {
    fn detect(&mut self, ctx: &mut ClientContext) -> ConnectivityStatus {
        let response = match self.follow_redirects(ctx) {
            Ok(response) => response,
            Err(e) => {
                warn!(target: "dialer::probe", error = %e, "Request error");
                return ConnectivityStatus::RequestError;
            }
        };

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::NO_CONTENT {
            warn!(target: "dialer::probe", %status, "Unexpected probe status");
            return ConnectivityStatus::RequestError;
        }

        match response.text() {
            Ok(page) => apply_portal_page(&page, ctx, &self.config),
            Err(e) => {
                warn!(target: "dialer::probe", error = %e, "Failed to read probe response");
                ConnectivityStatus::RequestError
            }
        }
    }
}
