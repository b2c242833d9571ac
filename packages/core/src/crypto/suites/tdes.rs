//! Double Triple-DES (EDE). Unlike the AES-CBC suite, CBC stages here do not
//! prepend their IV.

use super::block::{decrypt_stage, encrypt_stage, Chaining};
use crate::crypto::provider::{decode_hex, encode_hex, strip_trailing_zeros, CipherSuite};
use crate::error::CipherError;
use des::{TdesEde2, TdesEde3};

fn tdes_encrypt(key: &[u8], chaining: Chaining<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    match key.len() {
        16 => encrypt_stage::<TdesEde2>(key, chaining, data),
        24 => encrypt_stage::<TdesEde3>(key, chaining, data),
        n => Err(invalid_key(n)),
    }
}

fn tdes_decrypt(key: &[u8], chaining: Chaining<'_>, data: &[u8]) -> Result<Vec<u8>, CipherError> {
    match key.len() {
        16 => decrypt_stage::<TdesEde2>(key, chaining, data),
        24 => decrypt_stage::<TdesEde3>(key, chaining, data),
        n => Err(invalid_key(n)),
    }
}

fn invalid_key(len: usize) -> CipherError {
    CipherError::InvalidKey(format!("3DES key must be 16 or 24 bytes, got {}", len))
}

#[derive(Clone)]
pub struct TripleDesCbc {
    key1: Vec<u8>,
    key2: Vec<u8>,
    iv: Vec<u8>,
}

impl TripleDesCbc {
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
            prepend_iv: false,
        }
    }
}

impl CipherSuite for TripleDesCbc {
    fn name(&self) -> &'static str {
        "3DES-CBC"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let r1 = tdes_encrypt(&self.key1, self.chaining(), plaintext)?;
        let r2 = tdes_encrypt(&self.key2, self.chaining(), &r1)?;
        Ok(encode_hex(&r2))
    }

    fn decrypt(&self, ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
        let data = decode_hex(ciphertext_hex)?;
        let r1 = tdes_decrypt(&self.key2, self.chaining(), &data)?;
        let r2 = tdes_decrypt(&self.key1, self.chaining(), &r1)?;
        Ok(strip_trailing_zeros(r2))
    }
}

#[derive(Clone)]
pub struct TripleDesEcb {
    key1: Vec<u8>,
    key2: Vec<u8>,
}

impl TripleDesEcb {
    pub fn new(key1: &[u8], key2: &[u8]) -> Self {
        Self {
            key1: key1.to_vec(),
            key2: key2.to_vec(),
        }
    }
}

impl CipherSuite for TripleDesEcb {
    fn name(&self) -> &'static str {
        "3DES-ECB"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let r1 = tdes_encrypt(&self.key1, Chaining::Ecb, plaintext)?;
        let r2 = tdes_encrypt(&self.key2, Chaining::Ecb, &r1)?;
        Ok(encode_hex(&r2))
    }

    fn decrypt(&self, ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
        let data = decode_hex(ciphertext_hex)?;
        let r1 = tdes_decrypt(&self.key2, Chaining::Ecb, &data)?;
        let r2 = tdes_decrypt(&self.key1, Chaining::Ecb, &r1)?;
        Ok(strip_trailing_zeros(r2))
    }
}
