// ESurfing Dialer Core
// Клиент протокола авторизации captive-портала ESurfing (CDC)

#![warn(clippy::all)]

// Модули
pub mod config;
pub mod crypto;
pub mod error;
pub mod protocol;
pub mod state;
pub mod storage;
pub mod utils;

// Re-exports для удобства
pub use config::Config;
pub use state::{Dialer, Shutdown};
pub use utils::error::{DialerError, Result};
