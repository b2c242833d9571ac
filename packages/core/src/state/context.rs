// Состояние клиента для одной попытки авторизации

use crate::config::Config;
use crate::utils::uuid::{generate_v4, random_mac_address, random_string};
use std::collections::HashMap;
use std::time::Duration;
use zeroize::Zeroizing;

/// Учётные данные пользователя
#[derive(Clone)]
pub struct Credentials {
    pub user: String,
    pub password: Zeroizing<String>,
    /// Заранее введённый SMS-код
    pub sms_code: Option<String>,
}

impl Credentials {
    pub fn new(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            password: Zeroizing::new(password.into()),
            sms_code: None,
        }
    }

    pub fn with_sms_code(mut self, code: impl Into<String>) -> Self {
        let code = code.into();
        self.sms_code = if code.trim().is_empty() { None } else { Some(code) };
        self
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("sms_code", &self.sms_code)
            .finish()
    }
}

/// Заголовки маршрутизации, собранные с редиректов портала
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CdcHeaders {
    pub school_id: Option<String>,
    pub domain: Option<String>,
    pub area: Option<String>,
}

/// ClientContext: идентификаторы и URL, которые меняются от попытки к попытке
#[derive(Debug, Clone)]
pub struct ClientContext {
    // === Идентификация клиента ===
    pub client_id: String,
    pub algo_id: String,
    pub mac_address: String,
    pub host_name: String,

    // === Из редиректа портала ===
    pub user_ip: String,
    pub ac_ip: String,
    pub ticket_url: String,
    pub auth_url: String,
    pub extra_urls: HashMap<String, String>,
    pub cdc: CdcHeaders,

    // === Из ответов сервера ===
    pub ticket: String,
    pub keep_url: String,
    pub term_url: String,
    pub keep_retry: String,
}

impl ClientContext {
    /// Новый контекст: host-name выбирается один раз на процесс, MAC либо задан, либо случайный
    pub fn new(cfg: &Config, mac_override: Option<String>) -> Self {
        let mac_address = mac_override
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(random_mac_address);

        Self {
            client_id: generate_v4(),
            algo_id: cfg.placeholder_algo_id.clone(),
            mac_address,
            host_name: random_string(cfg.host_name_length),
            user_ip: String::new(),
            ac_ip: String::new(),
            ticket_url: String::new(),
            auth_url: String::new(),
            extra_urls: HashMap::new(),
            cdc: CdcHeaders::default(),
            ticket: String::new(),
            keep_url: String::new(),
            term_url: String::new(),
            keep_retry: String::new(),
        }
    }

    /// Перед каждой попыткой: новый client-id, Algo-ID сбрасывается, MAC сохраняется
    pub fn refresh(&mut self, cfg: &Config) {
        self.client_id = generate_v4();
        self.algo_id = cfg.placeholder_algo_id.clone();
        if self.mac_address.is_empty() {
            self.mac_address = random_mac_address();
        }
    }

    /// Интервал keep-alive из `keep-retry` (секунды).
    ///
    /// Берутся ведущие цифры; пустое или нечисловое значение даёт ноль,
    /// то есть heartbeat на каждой итерации.
    pub fn retry_interval(&self) -> Duration {
        Duration::from_secs(parse_leading_secs(&self.keep_retry))
    }

    pub fn clear_login(&mut self) {
        self.ticket.clear();
        self.keep_url.clear();
        self.term_url.clear();
        self.keep_retry.clear();
    }
}

fn parse_leading_secs(value: &str) -> u64 {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}
