//! Vendor "modified XTEA": 64-bit Feistel block, 32 rounds per key, applied with
//! three keys in sequence. Words are big-endian.
//!
//! Two suites share the transform:
//! - [`ModXtea`]: each 8-byte block transformed independently.
//! - [`ModXteaIv`]: plaintext block XORed with the previous ciphertext block
//!   (the IV for the first block) before the triple transform.

use crate::crypto::provider::{decode_hex, encode_hex, strip_trailing_zeros, zero_pad, CipherSuite};
use crate::error::CipherError;

const DELTA: u32 = 0x9E37_79B9;
const ROUNDS: u32 = 32;
const BLOCK: usize = 8;

pub type XteaKey = [u32; 4];

pub fn encrypt_block(mut v0: u32, mut v1: u32, key: &XteaKey) -> (u32, u32) {
    let mut sum: u32 = 0;
    for _ in 0..ROUNDS {
        v0 = v0.wrapping_add(
            ((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1) ^ sum.wrapping_add(key[(sum & 3) as usize]),
        );
        sum = sum.wrapping_add(DELTA);
        v1 = v1.wrapping_add(
            ((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0)
                ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
        );
    }
    (v0, v1)
}

pub fn decrypt_block(mut v0: u32, mut v1: u32, key: &XteaKey) -> (u32, u32) {
    let mut sum: u32 = DELTA.wrapping_mul(ROUNDS);
    for _ in 0..ROUNDS {
        v1 = v1.wrapping_sub(
            ((v0 << 4) ^ (v0 >> 5)).wrapping_add(v0)
                ^ sum.wrapping_add(key[((sum >> 11) & 3) as usize]),
        );
        sum = sum.wrapping_sub(DELTA);
        v0 = v0.wrapping_sub(
            ((v1 << 4) ^ (v1 >> 5)).wrapping_add(v1) ^ sum.wrapping_add(key[(sum & 3) as usize]),
        );
    }
    (v0, v1)
}

/// Три ключа подряд: шифрование 1→2→3, расшифровка 3→2→1
#[derive(Clone)]
struct TripleKey {
    keys: [XteaKey; 3],
}

impl TripleKey {
    fn encrypt(&self, (mut v0, mut v1): (u32, u32)) -> (u32, u32) {
        for key in &self.keys {
            (v0, v1) = encrypt_block(v0, v1, key);
        }
        (v0, v1)
    }

    fn decrypt(&self, (mut v0, mut v1): (u32, u32)) -> (u32, u32) {
        for key in self.keys.iter().rev() {
            (v0, v1) = decrypt_block(v0, v1, key);
        }
        (v0, v1)
    }
}

fn read_block(chunk: &[u8]) -> (u32, u32) {
    let v0 = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    let v1 = u32::from_be_bytes([chunk[4], chunk[5], chunk[6], chunk[7]]);
    (v0, v1)
}

fn write_block(chunk: &mut [u8], (v0, v1): (u32, u32)) {
    chunk[..4].copy_from_slice(&v0.to_be_bytes());
    chunk[4..].copy_from_slice(&v1.to_be_bytes());
}

fn aligned_ciphertext(ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
    let data = decode_hex(ciphertext_hex)?;
    if data.len() % BLOCK != 0 {
        return Err(CipherError::InvalidLength(format!(
            "{} bytes is not a multiple of the 8-byte block",
            data.len()
        )));
    }
    Ok(data)
}

#[derive(Clone)]
pub struct ModXtea {
    keys: TripleKey,
}

impl ModXtea {
    pub fn new(key1: XteaKey, key2: XteaKey, key3: XteaKey) -> Self {
        Self {
            keys: TripleKey {
                keys: [key1, key2, key3],
            },
        }
    }
}

impl CipherSuite for ModXtea {
    fn name(&self) -> &'static str {
        "ModXTEA"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut buf = zero_pad(plaintext, BLOCK);
        for chunk in buf.chunks_exact_mut(BLOCK) {
            let out = self.keys.encrypt(read_block(chunk));
            write_block(chunk, out);
        }
        Ok(encode_hex(&buf))
    }

    fn decrypt(&self, ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
        let mut buf = aligned_ciphertext(ciphertext_hex)?;
        for chunk in buf.chunks_exact_mut(BLOCK) {
            let out = self.keys.decrypt(read_block(chunk));
            write_block(chunk, out);
        }
        Ok(strip_trailing_zeros(buf))
    }
}

#[derive(Clone)]
pub struct ModXteaIv {
    keys: TripleKey,
    iv: [u32; 2],
}

impl ModXteaIv {
    pub fn new(key1: XteaKey, key2: XteaKey, key3: XteaKey, iv: [u32; 2]) -> Self {
        Self {
            keys: TripleKey {
                keys: [key1, key2, key3],
            },
            iv,
        }
    }
}

impl CipherSuite for ModXteaIv {
    fn name(&self) -> &'static str {
        "ModXTEA-IV"
    }

    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError> {
        let mut buf = zero_pad(plaintext, BLOCK);
        let mut prev = (self.iv[0], self.iv[1]);
        for chunk in buf.chunks_exact_mut(BLOCK) {
            let (v0, v1) = read_block(chunk);
            let out = self.keys.encrypt((v0 ^ prev.0, v1 ^ prev.1));
            write_block(chunk, out);
            prev = out;
        }
        Ok(encode_hex(&buf))
    }

    fn decrypt(&self, ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
        let mut buf = aligned_ciphertext(ciphertext_hex)?;
        let mut prev = (self.iv[0], self.iv[1]);
        for chunk in buf.chunks_exact_mut(BLOCK) {
            let block = read_block(chunk);
            let (v0, v1) = self.keys.decrypt(block);
            write_block(chunk, (v0 ^ prev.0, v1 ^ prev.1));
            prev = block;
        }
        Ok(strip_trailing_zeros(buf))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEY: XteaKey = [0x0001_0203, 0x0405_0607, 0x0809_0a0b, 0x0c0d_0e0f];

    #[test]
    fn test_single_key_known_answer() {
        // Standard XTEA vector: "ABCDEFGH" under 000102..0f
        assert_eq!(encrypt_block(0x4142_4344, 0x4546_4748, &KEY), (0x497d_f3d0, 0x7261_2cb5));
    }

    #[test]
    fn test_single_key_inverse() {
        let (c0, c1) = encrypt_block(0xdead_beef, 0x0123_4567, &KEY);
        assert_eq!(decrypt_block(c0, c1, &KEY), (0xdead_beef, 0x0123_4567));
    }

    #[test]
    fn test_rejects_partial_block() {
        let suite = ModXtea::new(KEY, KEY, KEY);
        assert!(matches!(suite.decrypt("00112233"), Err(CipherError::InvalidLength(_))));
    }
}
