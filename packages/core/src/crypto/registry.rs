//! Cipher Selector: закрытая таблица `algorithm id → набор шифров`.
//!
//! Неизвестный id всегда ошибка, набора "по умолчанию" нет.

use crate::crypto::keys;
use crate::crypto::provider::CipherSuite;
use crate::crypto::suites::aes::{AesCbc, AesEcb};
use crate::crypto::suites::tdes::{TripleDesCbc, TripleDesEcb};
use crate::crypto::suites::unsupported::Unsupported;
use crate::crypto::suites::xtea::{ModXtea, ModXteaIv};
use crate::utils::error::{DialerError, Result};
use std::fmt;
use std::str::FromStr;

/// Наборы шифров, которые сервер может назначить сессии
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    AesCbc,
    AesEcb,
    TripleDesCbc,
    TripleDesEcb,
    Zuc,
    Sm4Cbc,
    Sm4Ecb,
    ModXtea,
    ModXteaIv,
}

impl Algorithm {
    pub const ALL: [Algorithm; 9] = [
        Algorithm::AesCbc,
        Algorithm::AesEcb,
        Algorithm::TripleDesCbc,
        Algorithm::TripleDesEcb,
        Algorithm::Zuc,
        Algorithm::Sm4Cbc,
        Algorithm::Sm4Ecb,
        Algorithm::ModXtea,
        Algorithm::ModXteaIv,
    ];

    /// Идентификатор на проводе (и в заголовке `Algo-ID`)
    pub fn id(self) -> &'static str {
        match self {
            Algorithm::AesCbc => "CAFBCBAD-B6E7-4CAB-8A67-14D39F00CE1E",
            Algorithm::AesEcb => "A474B1C2-3DE0-4EA2-8C5F-7093409CE6C4",
            Algorithm::TripleDesCbc => "5BFBA864-BBA9-42DB-8EAD-49B5F412BD81",
            Algorithm::TripleDesEcb => "6E0B65FF-0B5B-459C-8FCE-EC7F2BEA9FF5",
            Algorithm::Zuc => "B809531F-0007-4B5B-923B-4BD560398113",
            Algorithm::Sm4Cbc => "F3974434-C0DD-4C20-9E87-DDB6814A1C48",
            Algorithm::Sm4Ecb => "ED382482-F72C-4C41-A76D-28EEA0F1F2AF",
            Algorithm::ModXtea => "B3047D4E-67DF-4864-A6A5-DF9B9E525C79",
            Algorithm::ModXteaIv => "C32C68F9-CA81-4260-A329-BBAFD1A9CCD1",
        }
    }

    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|algo| algo.id() == id)
    }

    /// Реализован ли набор (SM4 и ZUC только зарезервированы)
    pub fn is_supported(self) -> bool {
        !matches!(self, Algorithm::Zuc | Algorithm::Sm4Cbc | Algorithm::Sm4Ecb)
    }

    /// Создать набор с встроенными ключами
    pub fn instantiate(self) -> Box<dyn CipherSuite> {
        match self {
            Algorithm::AesCbc => Box::new(AesCbc::new(
                &keys::AES_CBC_KEY1,
                &keys::AES_CBC_KEY2,
                &keys::AES_CBC_IV,
            )),
            Algorithm::AesEcb => Box::new(AesEcb::new(&keys::AES_ECB_KEY1, &keys::AES_ECB_KEY2)),
            Algorithm::TripleDesCbc => Box::new(TripleDesCbc::new(
                &keys::TDES_CBC_KEY1,
                &keys::TDES_CBC_KEY2,
                &keys::TDES_CBC_IV,
            )),
            Algorithm::TripleDesEcb => {
                Box::new(TripleDesEcb::new(&keys::TDES_ECB_KEY1, &keys::TDES_ECB_KEY2))
            }
            Algorithm::Zuc => Box::new(Unsupported::new("ZUC")),
            Algorithm::Sm4Cbc => Box::new(Unsupported::new("SM4-CBC")),
            Algorithm::Sm4Ecb => Box::new(Unsupported::new("SM4-ECB")),
            Algorithm::ModXtea => Box::new(ModXtea::new(
                keys::XTEA_KEY1,
                keys::XTEA_KEY2,
                keys::XTEA_KEY3,
            )),
            Algorithm::ModXteaIv => Box::new(ModXteaIv::new(
                keys::XTEA_IV_KEY1,
                keys::XTEA_IV_KEY2,
                keys::XTEA_IV_KEY3,
                keys::XTEA_IV,
            )),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Algorithm {
    type Err = DialerError;

    fn from_str(s: &str) -> Result<Self> {
        Algorithm::from_id(s).ok_or_else(|| DialerError::UnknownAlgorithm(s.to_string()))
    }
}

/// Найти набор по id из дескриптора сервера
pub fn get_instance(algorithm_id: &str) -> Result<(Algorithm, Box<dyn CipherSuite>)> {
    let algorithm: Algorithm = algorithm_id.parse()?;
    Ok((algorithm, algorithm.instantiate()))
}
