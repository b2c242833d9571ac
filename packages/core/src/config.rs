//! Централизованная конфигурация для ESurfing dialer
//!
//! Все константы протокола и сетевые настройки определены здесь,
//! чтобы избежать хардкода по всему проекту.

use std::path::PathBuf;
use std::sync::OnceLock;
use std::time::Duration;

/// Глобальная конфигурация приложения (синглтон)
static GLOBAL_CONFIG: OnceLock<Config> = OnceLock::new();

/// Основная структура конфигурации
#[derive(Debug, Clone)]
pub struct Config {
    // ============================================
    // ПРОТОКОЛ
    // ============================================

    /// User-Agent, которым представляется официальный клиент
    pub user_agent: String,

    /// Значение заголовка Accept для всех запросов к порталу
    pub request_accept: String,

    /// Algo-ID, отправляемый до согласования шифра
    pub placeholder_algo_id: String,

    /// Соль для authenticator в запросах SMS-верификации
    pub auth_key: String,

    /// Смещение часового пояса портала (часы от UTC) для поля local-time
    pub portal_utc_offset_hours: i32,

    /// Длина случайного host-name
    pub host_name_length: usize,

    // ============================================
    // ОБНАРУЖЕНИЕ ПОРТАЛА
    // ============================================

    /// URL для проверки подключения (204 без портала)
    pub captive_url: String,

    /// Маркер начала встроенной конфигурации портала
    pub portal_start_tag: String,

    /// Маркер конца встроенной конфигурации портала
    pub portal_end_tag: String,

    // ============================================
    // СЕТЕВЫЕ ПАРАМЕТРЫ
    // ============================================

    /// Таймаут одного HTTP запроса (в секундах)
    pub request_timeout_secs: u64,

    /// Максимальное количество редиректов при обнаружении портала
    pub max_redirects: usize,

    /// Пауза между проверками, когда сеть подключена (в секундах)
    pub connected_poll_secs: u64,

    /// Пауза после ошибки запроса (в секундах)
    pub request_error_backoff_secs: u64,

    // ============================================
    // ДИАГНОСТИКА
    // ============================================

    /// Каталог для дампов неизвестных дескрипторов алгоритма
    pub dump_dir: PathBuf,
}

impl Config {
    /// Создать конфигурацию с дефолтными значениями
    pub fn default() -> Self {
        Self {
            // Протокол
            user_agent: "CCTP/android64_vpn/2093".to_string(),
            request_accept:
                "text/html,text/xml,application/xhtml+xml,application/x-javascript,*/*"
                    .to_string(),
            placeholder_algo_id: "00000000-0000-0000-0000-000000000000".to_string(),
            auth_key: "Eshore!@#".to_string(),
            portal_utc_offset_hours: 8,
            host_name_length: 10,

            // Портал
            captive_url: "http://connect.rom.miui.com/generate_204".to_string(),
            portal_start_tag: "<!--//config.campus.js.chinatelecom.com".to_string(),
            portal_end_tag: "//config.campus.js.chinatelecom.com-->".to_string(),

            // Сеть
            request_timeout_secs: 10,
            max_redirects: 5,
            connected_poll_secs: 1,
            request_error_backoff_secs: 5,

            // Диагностика
            dump_dir: PathBuf::from("."),
        }
    }

    /// Создать конфигурацию из переменных окружения
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Переопределяем значения из env, если они заданы
        if let Ok(val) = std::env::var("ESURFING_CAPTIVE_URL") {
            if !val.trim().is_empty() {
                config.captive_url = val;
            }
        }

        if let Ok(val) = std::env::var("ESURFING_DUMP_DIR") {
            if !val.trim().is_empty() {
                config.dump_dir = PathBuf::from(val);
            }
        }

        if let Ok(val) = std::env::var("ESURFING_REQUEST_TIMEOUT_SECS") {
            if let Ok(parsed) = val.parse() {
                config.request_timeout_secs = parsed;
            }
        }

        config
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connected_poll(&self) -> Duration {
        Duration::from_secs(self.connected_poll_secs)
    }

    pub fn request_error_backoff(&self) -> Duration {
        Duration::from_secs(self.request_error_backoff_secs)
    }

    /// Получить глобальный экземпляр конфигурации
    ///
    /// Автоматически инициализирует конфигурацию со значениями по умолчанию при первом вызове
    pub fn global() -> &'static Config {
        GLOBAL_CONFIG.get_or_init(Config::default)
    }

    /// Инициализировать глобальную конфигурацию со значениями по умолчанию
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init() -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(Self::default())
            .map_err(|_| "Config already initialized")
    }

    /// Инициализировать глобальную конфигурацию из переменных окружения
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_from_env() -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(Self::from_env())
            .map_err(|_| "Config already initialized")
    }

    /// Инициализировать глобальную конфигурацию с кастомным экземпляром
    ///
    /// # Errors
    ///
    /// Возвращает ошибку, если конфигурация уже была инициализирована
    pub fn init_with(config: Config) -> Result<(), &'static str> {
        GLOBAL_CONFIG
            .set(config)
            .map_err(|_| "Config already initialized")
    }

    /// Проверить, инициализирована ли глобальная конфигурация
    pub fn is_initialized() -> bool {
        GLOBAL_CONFIG.get().is_some()
    }
}
