//! Time source used by the cache, the limiter and result shaping.

use async_trait::async_trait;
use chrono::Utc;
use std::{
    fmt::Debug,
    sync::{
        Mutex,
        atomic::{AtomicI64, Ordering},
    },
    time::Duration,
};

#[async_trait]
pub trait Clock: Send + Sync + Debug {
    /// Current time in epoch seconds.
    fn now(&self) -> i64;

    /// Suspend the calling task for `duration`.
    async fn sleep(&self, duration: Duration);
}

/// Wall clock backed by chrono and the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    fn now(&self) -> i64 {
        Utc::now().timestamp()
    }

    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Deterministic clock for tests and simulations.
///
/// `sleep` returns immediately after moving the clock forward by the
/// requested duration (rounded up to whole seconds) and remembers the
/// request, so callers can assert on backoff behaviour.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
    sleeps: Mutex<Vec<Duration>>,
}

impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self {
            now: AtomicI64::new(start),
            sleeps: Mutex::new(Vec::new()),
        }
    }

    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Every sleep requested so far, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps
            .lock()
            .map(|sleeps| sleeps.clone())
            .unwrap_or_default()
    }

    pub fn total_slept(&self) -> Duration {
        self.sleeps().iter().sum()
    }
}

#[async_trait]
impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }

    async fn sleep(&self, duration: Duration) {
        if let Ok(mut sleeps) = self.sleeps.lock() {
            sleeps.push(duration);
        }
        let secs = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
        self.advance(i64::try_from(secs).unwrap_or(i64::MAX));
        tokio::task::yield_now().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_clock_sleep_advances_time() {
        let clock = ManualClock::new(1_000);
        clock.sleep(Duration::from_secs(61)).await;
        clock.sleep(Duration::from_millis(1_500)).await;

        assert_eq!(clock.now(), 1_063);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(61), Duration::from_millis(1_500)]
        );
        assert_eq!(clock.total_slept(), Duration::from_millis(62_500));
    }

    #[test]
    fn system_clock_is_close_to_chrono_now() {
        let now = SystemClock.now();
        assert!((Utc::now().timestamp() - now).abs() <= 1);
    }
}
