// Логирование

use tracing_subscriber::EnvFilter;

/// Установить глобальный tracing subscriber.
///
/// `RUST_LOG` имеет приоритет над `debug`. Повторный вызов ничего не делает.
pub fn init(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(debug)
        .try_init();
}
