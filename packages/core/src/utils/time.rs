// Время: часы для keep-alive таймера и local-time для запросов к порталу

use crate::state::cancel::CancellationToken;
use chrono::{FixedOffset, Offset, Utc};
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Источник монотонного времени и прерываемого сна.
///
/// Все паузы главного цикла проходят через `sleep`, чтобы запрос на
/// остановку прерывал их сразу, а тесты могли управлять временем.
pub trait Clock: Send + Sync {
    /// Время, прошедшее с произвольной фиксированной точки
    fn now(&self) -> Duration;

    /// Спать `duration` или до отмены. Возвращает `false`, если сон прерван отменой.
    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool;
}

/// Реальные часы
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }

    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        !cancel.wait_timeout(duration)
    }
}

/// Управляемые часы: `sleep` мгновенно сдвигает время вперёд
#[derive(Default)]
pub struct ManualClock {
    elapsed: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        if let Ok(mut elapsed) = self.elapsed.lock() {
            *elapsed += by;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        self.elapsed.lock().map(|e| *e).unwrap_or_default()
    }

    fn sleep(&self, duration: Duration, cancel: &CancellationToken) -> bool {
        if cancel.is_cancelled() {
            return false;
        }
        self.advance(duration);
        true
    }
}

/// Текущее время в часовом поясе портала: `YYYY-MM-DD HH:MM:SS`
pub fn portal_local_time(utc_offset_hours: i32) -> String {
    let offset = FixedOffset::east_opt(utc_offset_hours * 3600).unwrap_or_else(|| Utc.fix());
    Utc::now()
        .with_timezone(&offset)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Unix-время в миллисекундах
pub fn current_timestamp_millis() -> i64 {
    Utc::now().timestamp_millis()
}
