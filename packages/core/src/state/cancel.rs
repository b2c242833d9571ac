// Токен отмены: единственная точка синхронизации главного цикла и обработчика сигналов

use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// Клонируемый флаг остановки с прерываемым ожиданием
#[derive(Clone, Default)]
pub struct CancellationToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        let (lock, cvar) = &*self.inner;
        if let Ok(mut cancelled) = lock.lock() {
            *cancelled = true;
        }
        cvar.notify_all();
    }

    pub fn is_cancelled(&self) -> bool {
        let (lock, _) = &*self.inner;
        lock.lock().map(|c| *c).unwrap_or(true)
    }

    /// Ждать `timeout` или отмены. Возвращает `true`, если токен отменён.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let (lock, cvar) = &*self.inner;
        let deadline = Instant::now() + timeout;
        let Ok(mut cancelled) = lock.lock() else {
            return true;
        };

        while !*cancelled {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            match cvar.wait_timeout(cancelled, deadline - now) {
                Ok((guard, _)) => cancelled = guard,
                Err(_) => return true,
            }
        }
        *cancelled
    }
}
