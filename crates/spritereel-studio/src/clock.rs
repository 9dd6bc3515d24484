//! Time sources for recording sessions.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use spritereel_core::{Duration, Timestamp};

pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Monotonic clock measured from construction. Backed by tokio's
/// `Instant`, so it follows a paused test runtime.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: tokio::time::Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_seconds(self.origin.elapsed().as_secs_f64())
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    millis: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let ms = by.as_millis().round().max(0.0) as u64;
        self.millis.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_seconds(&self, seconds: f64) {
        self.advance(Duration::from_seconds(seconds));
    }

    pub fn set(&self, at: Timestamp) {
        let ms = (at.as_seconds() * 1000.0).round().max(0.0) as u64;
        self.millis.store(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_seconds(self.millis.load(Ordering::SeqCst) as f64 / 1000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_shared_between_clones() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance_seconds(1.5);
        other.advance(Duration::from_millis(250.0));
        assert_eq!(clock.now().as_seconds(), 1.75);
        clock.set(Timestamp::from_seconds(10.0));
        assert_eq!(other.now().as_seconds(), 10.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_system_clock_follows_tokio_time() {
        let clock = SystemClock::new();
        tokio::time::sleep(std::time::Duration::from_secs(3)).await;
        assert!((clock.now().as_seconds() - 3.0).abs() < 0.01);
    }
}
