//! Defines the CipherSuite trait: the one contract every negotiated cipher obeys.

use crate::error::CipherError;

/// Uniform encrypt/decrypt contract over all server-selectable cipher families.
///
/// Implementations are stateless: key material is fixed at construction and
/// every call is independent. Ciphertext travels as upper-case hex.
pub trait CipherSuite: Send + Sync {
    /// Human-readable family/mode label, e.g. `AES-CBC`.
    fn name(&self) -> &'static str;

    /// Zero-pads `plaintext`, runs every encryption stage and returns upper-case hex.
    fn encrypt(&self, plaintext: &[u8]) -> Result<String, CipherError>;

    /// Reverses [`CipherSuite::encrypt`]. Trailing zero bytes are stripped from the
    /// result, so plaintexts that legitimately end in `0x00` do not survive intact.
    fn decrypt(&self, ciphertext_hex: &str) -> Result<Vec<u8>, CipherError>;
}

/// Right-pad with zero bytes to a multiple of `block` (no-op when already aligned).
pub(crate) fn zero_pad(data: &[u8], block: usize) -> Vec<u8> {
    let mut padded = data.to_vec();
    let rem = padded.len() % block;
    if rem != 0 {
        padded.resize(padded.len() + block - rem, 0);
    }
    padded
}

pub(crate) fn strip_trailing_zeros(mut data: Vec<u8>) -> Vec<u8> {
    let end = data.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    data.truncate(end);
    data
}

pub(crate) fn decode_hex(ciphertext_hex: &str) -> Result<Vec<u8>, CipherError> {
    Ok(hex::decode(ciphertext_hex.trim())?)
}

pub(crate) fn encode_hex(data: &[u8]) -> String {
    hex::encode_upper(data)
}

pub(crate) fn xor_in_place(dst: &mut [u8], src: &[u8]) {
    for (d, s) in dst.iter_mut().zip(src) {
        *d ^= s;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_pad() {
        assert_eq!(zero_pad(b"", 8), Vec::<u8>::new());
        assert_eq!(zero_pad(b"abc", 8).len(), 8);
        assert_eq!(zero_pad(&[1u8; 16], 16).len(), 16);
        assert_eq!(zero_pad(&[1u8; 17], 16).len(), 32);
    }

    #[test]
    fn test_strip_trailing_zeros() {
        assert_eq!(strip_trailing_zeros(vec![1, 0, 2, 0, 0]), vec![1, 0, 2]);
        assert_eq!(strip_trailing_zeros(vec![0, 0]), Vec::<u8>::new());
        assert_eq!(strip_trailing_zeros(vec![]), Vec::<u8>::new());
    }

    #[test]
    fn test_hex_helpers() {
        assert_eq!(encode_hex(&[0xab, 0x01]), "AB01");
        assert_eq!(decode_hex(" ab01\n").unwrap(), vec![0xab, 0x01]);
        assert!(matches!(decode_hex("xyz"), Err(CipherError::InvalidHex(_))));
    }
}
