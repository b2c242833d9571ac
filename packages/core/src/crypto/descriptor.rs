//! Разбор бинарного дескриптора алгоритма от ticket-url.
//!
//! ```text
//! [3B type][1B keyLen][keyLen B key][1B idLen][idLen B algoId]
//! ```
//!
//! Каждая заявленная длина проверяется по остатку буфера до нарезки.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("invalid descriptor header")]
    InvalidHeader,
    #[error("invalid key length")]
    InvalidKeyLength,
    #[error("invalid algorithm id length")]
    InvalidAlgoIdLength,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlgorithmDescriptor {
    pub kind: [u8; 3],
    /// Метка ключа; ключевой материал по сети не передаётся
    pub key: Vec<u8>,
    pub algorithm_id: String,
}

impl AlgorithmDescriptor {
    pub fn parse(bytes: &[u8]) -> Result<Self, DescriptorError> {
        if bytes.len() < 4 {
            return Err(DescriptorError::InvalidHeader);
        }

        let kind = [bytes[0], bytes[1], bytes[2]];
        let key_len = bytes[3] as usize;
        let mut pos = 4;

        let key = bytes
            .get(pos..pos + key_len)
            .ok_or(DescriptorError::InvalidKeyLength)?
            .to_vec();
        pos += key_len;

        let id_len = *bytes.get(pos).ok_or(DescriptorError::InvalidAlgoIdLength)? as usize;
        pos += 1;

        let id = bytes
            .get(pos..pos + id_len)
            .ok_or(DescriptorError::InvalidAlgoIdLength)?;

        Ok(Self {
            kind,
            key,
            algorithm_id: String::from_utf8_lossy(id).into_owned(),
        })
    }

    pub fn kind_str(&self) -> String {
        String::from_utf8_lossy(&self.kind).into_owned()
    }

    /// Собрать дескриптор (для тестов и диагностики)
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(5 + self.key.len() + self.algorithm_id.len());
        out.extend_from_slice(&self.kind);
        out.push(self.key.len() as u8);
        out.extend_from_slice(&self.key);
        out.push(self.algorithm_id.len() as u8);
        out.extend_from_slice(self.algorithm_id.as_bytes());
        out
    }
}
