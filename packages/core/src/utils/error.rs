// Типы ошибок

use crate::crypto::descriptor::DescriptorError;
use crate::error::CipherError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialerError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Malformed algorithm descriptor: {0}")]
    Descriptor(#[from] DescriptorError),

    #[error("Unknown algorithm id: {0}")]
    UnknownAlgorithm(String),

    #[error("Cipher error: {0}")]
    Cipher(#[from] CipherError),

    #[error("Session is not initialized")]
    SessionNotInitialized,

    #[error("Negotiation failed: {0}")]
    Negotiation(String),

    #[error("Network error: {0}")]
    Transport(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Login response carried an empty keep-url")]
    EmptyKeepUrl,

    #[error("Aborted by shutdown request")]
    UserAbort,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DialerError {
    /// Ошибки, после которых дальнейшая работа процесса бессмысленна.
    ///
    /// Всё остальное возвращает управление в цикл проверки подключения.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            DialerError::UnknownAlgorithm(_)
                | DialerError::Descriptor(_)
                | DialerError::Negotiation(_)
                | DialerError::Cipher(CipherError::UnsupportedAlgorithm(_))
                | DialerError::EmptyKeepUrl
        )
    }
}

impl From<reqwest::Error> for DialerError {
    fn from(error: reqwest::Error) -> Self {
        DialerError::Transport(error.to_string())
    }
}

impl From<quick_xml::DeError> for DialerError {
    fn from(error: quick_xml::DeError) -> Self {
        DialerError::Parse(format!("XML: {}", error))
    }
}

impl From<quick_xml::Error> for DialerError {
    fn from(error: quick_xml::Error) -> Self {
        DialerError::Parse(format!("XML: {}", error))
    }
}

pub type Result<T> = std::result::Result<T, DialerError>;
