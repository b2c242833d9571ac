//! Session API - согласованный шифр на время жизни сессии авторизации
//!
//! ## Архитектура
//!
//! ```text
//! ticket-url ──bytes──▶ CipherSession::load
//!                          ├── AlgorithmDescriptor::parse   (границы буфера)
//!                          ├── registry::get_instance        (закрытая таблица)
//!                          └── ArtifactSink::save            (только для неизвестного id)
//!
//! Dialer ──encrypt/decrypt──▶ CipherSession ──▶ Box<dyn CipherSuite>
//! ```
//!
//! ## Ответственность
//!
//! - Разбор дескриптора и выбор набора шифров
//! - Полная замена набора при повторном согласовании (без мутации на месте)
//! - Отказ шифровать до успешного `load` и после `free`
//!
//! ## Не отвечает за
//!
//! - Сетевой транспорт (это делает protocol::transport)
//! - Решение о завершении процесса (это делает state::app)

use crate::crypto::descriptor::AlgorithmDescriptor;
use crate::crypto::provider::CipherSuite;
use crate::crypto::registry::{self, Algorithm};
use crate::storage::models::StoredArtifact;
use crate::storage::ArtifactSink;
use crate::utils::error::{DialerError, Result};
use tracing::{debug, error, info, warn};

/// Подсказка пользователю, когда сервер назначил неизвестный алгоритм
pub const UNKNOWN_ALGORITHM_GUIDANCE: &str =
    "Unable to find algorithm implementation. Please open an issue and attach the saved descriptor dump.";

struct ActiveSuite {
    algorithm: Algorithm,
    suite: Box<dyn CipherSuite>,
}

/// Session Negotiator: владеет единственным активным набором шифров
pub struct CipherSession {
    active: Option<ActiveSuite>,
    sink: Box<dyn ArtifactSink>,
}

impl CipherSession {
    pub fn new(sink: Box<dyn ArtifactSink>) -> Self {
        Self { active: None, sink }
    }

    /// Согласовать шифр по дескриптору сервера.
    ///
    /// Предыдущий набор сбрасывается до разбора: при любой ошибке сессия
    /// остаётся неинициализированной. Для неизвестного id сырые байты
    /// сохраняются в [`ArtifactSink`] до возврата ошибки.
    pub fn load(&mut self, descriptor: &[u8]) -> Result<Algorithm> {
        self.free();
        info!(target: "dialer::session", "Initializing session");

        let parsed = AlgorithmDescriptor::parse(descriptor)?;

        let (algorithm, suite) = match registry::get_instance(&parsed.algorithm_id) {
            Ok(found) => found,
            Err(e) => {
                let artifact = StoredArtifact::algorithm_dump(descriptor);
                let dump = match self.sink.save(&artifact) {
                    Ok(location) => Some(location),
                    Err(save_err) => {
                        warn!(
                            target: "dialer::session",
                            algo_id = %parsed.algorithm_id,
                            error = %save_err,
                            "Failed to save descriptor dump"
                        );
                        None
                    }
                };
                // Подсказка выводится всегда, путь к дампу только если он записан
                match dump {
                    Some(location) => error!(
                        target: "dialer::session",
                        algo_id = %parsed.algorithm_id,
                        dump = %location,
                        "{}", UNKNOWN_ALGORITHM_GUIDANCE
                    ),
                    None => error!(
                        target: "dialer::session",
                        algo_id = %parsed.algorithm_id,
                        "{}", UNKNOWN_ALGORITHM_GUIDANCE
                    ),
                }
                return Err(e);
            }
        };

        info!(
            target: "dialer::session",
            kind = %parsed.kind_str(),
            algo_id = %algorithm,
            suite = suite.name(),
            "Session cipher negotiated"
        );
        debug!(target: "dialer::session", key = %String::from_utf8_lossy(&parsed.key), "Descriptor key label");

        self.active = Some(ActiveSuite { algorithm, suite });
        Ok(algorithm)
    }

    pub fn is_initialized(&self) -> bool {
        self.active.is_some()
    }

    pub fn algorithm(&self) -> Option<Algorithm> {
        self.active.as_ref().map(|a| a.algorithm)
    }

    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let active = self.active.as_ref().ok_or(DialerError::SessionNotInitialized)?;
        Ok(active.suite.encrypt(plaintext.as_bytes())?)
    }

    pub fn decrypt(&self, ciphertext_hex: &str) -> Result<String> {
        let active = self.active.as_ref().ok_or(DialerError::SessionNotInitialized)?;
        let plain = active.suite.decrypt(ciphertext_hex)?;
        String::from_utf8(plain)
            .map_err(|e| DialerError::Parse(format!("decrypted payload is not UTF-8: {}", e)))
    }

    /// Сбросить активный набор
    pub fn free(&mut self) {
        if self.active.take().is_some() {
            debug!(target: "dialer::session", "Session freed");
        }
    }
}
