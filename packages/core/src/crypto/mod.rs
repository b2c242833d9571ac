//! Криптографический модуль
//!
//! # Архитектура
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                  Dialer (state::app)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ encrypt / decrypt
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              CipherSession (Session Negotiator)             │
//! │  - Разбирает дескриптор сервера                             │
//! │  - Держит ровно один активный набор                         │
//! │  - Сохраняет дамп неизвестного дескриптора                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │ algorithm id
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              registry (Cipher Selector)                     │
//! │  - Закрытая таблица id → набор + встроенные ключи           │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              CipherSuite (Cipher Unit)                      │
//! │  - AES-CBC/ECB, 3DES-CBC/ECB (двойное шифрование)           │
//! │  - Modified XTEA, Modified XTEA + IV (тройное)              │
//! │  - SM4-CBC/ECB, ZUC: явный отказ                            │
//! └─────────────────────────────────────────────────────────────┘
//! ```

// ============================================================================
// Core Traits
// ============================================================================

/// CipherSuite trait: единый контракт encrypt/decrypt
pub mod provider;

// ============================================================================
// Implementations
// ============================================================================

/// Наборы шифров
pub mod suites;

/// Встроенный ключевой материал
pub mod keys;

// ============================================================================
// Negotiation
// ============================================================================

pub mod descriptor;

pub mod registry;

pub mod session_api;

// ============================================================================
// Re-exports для удобства
// ============================================================================

pub use provider::CipherSuite;
pub use registry::Algorithm;
pub use session_api::CipherSession;
