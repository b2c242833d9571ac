use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CipherError {
    #[error("Invalid hex input: {0}")]
    InvalidHex(String),
    #[error("Invalid ciphertext length: {0}")]
    InvalidLength(String),
    #[error("Invalid key material: {0}")]
    InvalidKey(String),
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),
}

impl From<hex::FromHexError> for CipherError {
    fn from(err: hex::FromHexError) -> Self {
        CipherError::InvalidHex(err.to_string())
    }
}

impl From<cipher::InvalidLength> for CipherError {
    fn from(err: cipher::InvalidLength) -> Self {
        CipherError::InvalidKey(err.to_string())
    }
}
