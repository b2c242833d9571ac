// Состояние клиента и протокольный автомат

pub mod app;
pub mod cancel;
pub mod context;

pub use app::{AuthState, Collaborators, Dialer, Shutdown};
pub use cancel::CancellationToken;
pub use context::{ClientContext, Credentials};
