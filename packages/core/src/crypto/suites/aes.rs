//! Double AES: plaintext under key1, the whole stage-1 output under key2.

use super::block::{decrypt_stage, encrypt_stage, Chaining};
use crate::crypto::provider::{decode_hex, encode_hex, strip_trailing_zeros, CipherSuite};
use crate::error::CipherError;
use aes::{Aes128, Aes192, Aes256};

fn aes_encrypt(key: &[u8], chaining: Chaining<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    match key.len() {
        16 => encrypt_stage::<Aes128>(key, chaining, data),
        24 => encrypt_stage::<Aes192>(key, chaining, data),
        32 => encrypt_stage::<Aes256>(key, chaining, data),
        n => Err(invalid_key(n)),
    }
}

fn aes_decrypt(key: &[u8], chaining: Chaining<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    match key.len() {
        16 => decrypt_stage::<Aes128>(key, chaining, data),
        24 => decrypt_stage::<Aes192>(key, chaining, data),
        32 => decrypt_stage::<Aes256>(key, chaining, data),
        n => Err(invalid_key(n)),
    }
}

fn invalid_key(len: usize) -> CipherError {
    CipherError::InvalidKey(format!("AES key must be 16, 24 or 32 bytes, got {}", len))
}

/// AES-CBC x2, fixed IV prepended to each stage's output
#[derive(Clone)]
pub struct AesCbc {
    key1: Vec<u8>,
    key2: Vec<u8>,
    iv: Vec<u8>,
}

impl AesCbc {
    pub fn new(key1: &[u8], key2: &[u8], iv: &[u8]) -> Self {
        Self {
            key1: key1.to_vec(),
            key2: key2.to_vec(),
            iv: iv.to_vec(),
        }
    }

    fn chaining(&self) -> Chaining<'_> {
        Chaining::Cbc {
            iv: &self.iv,
            prepend_iv: true,
        }
    }
}

impl CipherSuite for AesCbc {
    fn name(&self) -> &'static str {
        "AES-CBC"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let r1 = aes_encrypt(&self.key1, self.chaining(), plaintext)?;
        let r2 = aes_encrypt(&self.key2, self.chaining(), &r1)?;
        Ok(encode_hex(&r2))
    }

    fn decrypt(&self, ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
        let data = decode_hex(ciphertext_hex)?;
        let r1 = aes_decrypt(&self.key2, self.chaining(), &data)?;
        let r2 = aes_decrypt(&self.key1, self.chaining(), &r1)?;
        Ok(strip_trailing_zeros(r2))
    }
}

/// AES-ECB x2
#[derive(Clone)]
pub struct AesEcb {
    key1: Vec<u8>,
    key2: Vec<u8>,
}

impl AesEcb {
    pub fn new(key1: &[u8], key2: &[u8]) -> Self {
        Self {
            key1: key1.to_vec(),
            key2: key2.to_vec(),
        }
    }
}

impl CipherSuite for AesEcb {
    fn name(&self) -> &'static str {
        "AES-ECB"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let r1 = aes_encrypt(&self.key1, Chaining::Ecb, plaintext)?;
        let r2 = aes_encrypt(&self.key2, Chaining::Ecb, &r1)?;
        Ok(encode_hex(&r2))
    }

    fn decrypt(&self, ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
        let data = decode_hex(ciphertext_hex)?;
        let r1 = aes_decrypt(&self.key2, Chaining::Ecb, &data)?;
        let r2 = aes_decrypt(&self.key1, Chaining::Ecb, &r1)?;
        Ok(strip_trailing_zeros(r2))
    }
}
