//! Криптографические наборы (Cipher Suites)
//!
//! Все реализации [`CipherSuite`](crate::crypto::provider::CipherSuite).
//!
//! ## Доступные наборы
//!
//! | набор | семейство/режим | ключи |
//! |---|---|---|
//! | [`aes::AesCbc`] | AES, CBC, IV перед каждой стадией | 2 + IV |
//! | [`aes::AesEcb`] | AES, ECB | 2 |
//! | [`tdes::TripleDesCbc`] | 3DES-EDE, CBC | 2 + IV |
//! | [`tdes::TripleDesEcb`] | 3DES-EDE, ECB | 2 |
//! | [`xtea::ModXtea`] | modified XTEA, без сцепления | 3 |
//! | [`xtea::ModXteaIv`] | modified XTEA, сцепление по шифротексту | 3 + IV |
//! | [`unsupported::Unsupported`] | SM4-CBC, SM4-ECB, ZUC | отказ |
//!
//! ## Пример
//!
//! ```rust
//! use esurfing_core::crypto::provider::CipherSuite;
//! use esurfing_core::crypto::suites::aes::AesEcb;
//!
//! let suite = AesEcb::new(&[1u8; 16], &[2u8; 16]);
//! let hex = suite.encrypt(b"<request/>").unwrap();
//! assert_eq!(suite.decrypt(&hex).unwrap(), b"<request/>");
//! ```

pub mod aes;
mod block;
pub mod tdes;
pub mod unsupported;
pub mod xtea;
