// Протокол авторизации ESurfing (CDC)
//
// messages : XML документы запросов и модели ответов
// transport: POST с заголовками CDC и контрольной суммой тела
// probe    : обнаружение портала и разбор его конфигурации
// verify   : SMS верификация перед входом

pub mod messages;
pub mod probe;
pub mod transport;
pub mod verify;

pub use probe::{ConnectivityStatus, PortalProbe};
pub use transport::{PortalRequest, Transport};
pub use verify::{CodePrompt, LinePrompt, SmsVerifier};
