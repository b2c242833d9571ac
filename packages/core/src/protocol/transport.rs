// HTTP транспорт к серверу авторизации
// Синхронные POST запросы с заголовками CDC поверх reqwest::blocking

use crate::config::Config;
use crate::state::context::ClientContext;
use crate::utils::error::{DialerError, Result};
use md5::{Digest, Md5};
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use tracing::{debug, trace};

pub const HEADER_CHECKSUM: &str = "CDC-Checksum";
pub const HEADER_CLIENT_ID: &str = "Client-ID";
pub const HEADER_ALGO_ID: &str = "Algo-ID";
pub const HEADER_SCHOOL_ID: &str = "CDC-SchoolId";
pub const HEADER_DOMAIN: &str = "CDC-Domain";
pub const HEADER_AREA: &str = "CDC-Area";

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// MD5 (lower-case hex) ровно тех байт, что уходят в теле запроса
pub fn checksum(body: &str) -> String {
    hex::encode(Md5::digest(body.as_bytes()))
}

/// Подготовленный POST: URL, тело и полный набор заголовков
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortalRequest {
    pub url: String,
    pub body: String,
    pub headers: Vec<(String, String)>,
}

impl PortalRequest {
    /// Собрать запрос к порталу. Тело уже должно быть в том виде, в каком
    /// оно будет отправлено (для зашифрованных запросов это hex шифротекста).
    pub fn new(url: impl Into<String>, body: impl Into<String>, ctx: &ClientContext, cfg: &Config) -> Self {
        let body = body.into();

        let mut headers = vec![
            ("User-Agent".to_string(), cfg.user_agent.clone()),
            ("Accept".to_string(), cfg.request_accept.clone()),
            ("Content-Type".to_string(), FORM_CONTENT_TYPE.to_string()),
            (HEADER_CHECKSUM.to_string(), checksum(&body)),
            (HEADER_CLIENT_ID.to_string(), ctx.client_id.clone()),
            (HEADER_ALGO_ID.to_string(), ctx.algo_id.clone()),
        ];

        let cdc = [
            (HEADER_SCHOOL_ID, &ctx.cdc.school_id),
            (HEADER_DOMAIN, &ctx.cdc.domain),
            (HEADER_AREA, &ctx.cdc.area),
        ];
        for (name, value) in cdc {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                headers.push((name.to_string(), value.to_string()));
            }
        }

        Self {
            url: url.into(),
            body,
            headers,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Транспорт для зашифрованных и служебных POST запросов
pub trait Transport: Send {
    /// Отправить запрос и вернуть тело ответа целиком
    fn post(&self, request: &PortalRequest) -> Result<Vec<u8>>;
}

/// Блокирующий HTTP клиент с таймаутом и без автоматических редиректов
pub fn build_client(config: &Config) -> Result<Client> {
    Client::builder()
        .timeout(config.request_timeout())
        .connect_timeout(config.request_timeout())
        .redirect(Policy::none())
        .build()
        .map_err(|e| DialerError::Transport(format!("Failed to build HTTP client: {}", e)))
}

pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: build_client(config)?,
        })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn post(&self, request: &PortalRequest) -> Result<Vec<u8>> {
        let mut builder = self.client.post(&request.url).body(request.body.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        trace!(target: "dialer::transport", url = %request.url, body_len = request.body.len(), "POST");
        let response = builder.send()?;
        let status = response.status();
        if !status.is_success() {
            // Сервер может вернуть осмысленное тело и с кодом ошибки
            debug!(target: "dialer::transport", url = %request.url, %status, "Non-success status");
        }
        Ok(response.bytes()?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_is_lowercase_md5() {
        assert_eq!(checksum(""), "d41d8cd98f00b204e9800998ecf8427e");
        assert_eq!(checksum("abc"), "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_required_headers_present() {
        let mut ctx = ClientContext::new(Config::global(), None);
        ctx.algo_id = "CAFBCBAD-B6E7-4CAB-8A67-14D39F00CE1E".to_string();
        let req = PortalRequest::new("http://auth/ticket", "ABCDEF", &ctx, Config::global());

        assert_eq!(req.header("user-agent"), Some(Config::global().user_agent.as_str()));
        assert_eq!(req.header("Content-Type"), Some(FORM_CONTENT_TYPE));
        assert_eq!(req.header(HEADER_CHECKSUM), Some(checksum("ABCDEF").as_str()));
        assert_eq!(req.header(HEADER_CLIENT_ID), Some(ctx.client_id.as_str()));
        assert_eq!(req.header(HEADER_ALGO_ID), Some("CAFBCBAD-B6E7-4CAB-8A67-14D39F00CE1E"));
        assert_eq!(req.header(HEADER_SCHOOL_ID), None);
        assert_eq!(req.header(HEADER_AREA), None);
    }

    #[test]
    fn test_cdc_headers_only_when_harvested() {
        let mut ctx = ClientContext::new(Config::global(), None);
        ctx.cdc.school_id = Some("1234".to_string());
        ctx.cdc.domain = Some(String::new());
        ctx.cdc.area = Some("gz".to_string());

        let req = PortalRequest::new("http://x", "", &ctx, Config::global());
        assert_eq!(req.header(HEADER_SCHOOL_ID), Some("1234"));
        assert_eq!(req.header(HEADER_DOMAIN), None);
        assert_eq!(req.header(HEADER_AREA), Some("gz"));
    }
}
