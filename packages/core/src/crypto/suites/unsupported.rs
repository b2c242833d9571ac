use crate::crypto::provider::CipherSuite;
use crate::error::CipherError;

/// Набор, который сервер может назвать, но клиент не реализует (SM4, ZUC).
///
/// Любой вызов завершается `UnsupportedAlgorithm`: открытый текст никогда
/// не уходит в сеть под видом шифротекста.
#[derive(Debug, Clone, Copy)]
pub struct Unsupported {
    name: &'static str,
}

impl Unsupported {
    pub fn new(name: &'static str) -> Self {
        Self { name }
    }
}

impl CipherSuite for Unsupported {
    fn name(&self) -> &'static str {
        self.name
    }

    fn encrypt(&self, _plaintext: &[u8]) -> Result<String, CipherError> {
        Err(CipherError::UnsupportedAlgorithm(self.name.to_string()))
    }

    fn decrypt(&self, _ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
        Err(CipherError::UnsupportedAlgorithm(self.name.to_string()))
    }
}
