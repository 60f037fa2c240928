//! Sliding-window limiter for outbound provider calls.
//!
//! Only calls leaving this process are counted; how often callers hit the
//! service is their own concern.

use std::{collections::VecDeque, sync::Arc, time::Duration};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::clock::Clock;

/// Outbound calls allowed per tracking window.
///
/// The provider's free tier allows 60/min and 1M/month; 20/min keeps a
/// 31-day month under 900k calls.
pub const DEFAULT_MAX_PULLS_PER_MINUTE: usize = 20;

/// One second wider than a minute to absorb clock-tick boundaries.
pub const DEFAULT_TRACKING_WINDOW_SECS: i64 = 61;

#[derive(Debug)]
pub struct SlidingWindowLimiter {
    /// Epoch seconds of admitted calls, oldest first.
    pulls: Mutex<VecDeque<i64>>,
    max_pulls: usize,
    window_secs: i64,
    clock: Arc<dyn Clock>,
}

impl SlidingWindowLimiter {
    pub fn new(max_pulls: usize, window_secs: i64, clock: Arc<dyn Clock>) -> Self {
        Self {
            pulls: Mutex::new(VecDeque::with_capacity(max_pulls)),
            max_pulls: max_pulls.max(1),
            window_secs: window_secs.max(1),
            clock,
        }
    }

    /// Wait until one more outbound call fits in the window, then record it.
    ///
    /// The lock is held for the whole decision, sleep included, so every
    /// admission in the process is serialized and a waiting caller holds
    /// back everyone queued behind it.
    pub async fn admit(&self) {
        let mut pulls = self.pulls.lock().await;

        loop {
            let now = self.clock.now();
            let expired = prune(&mut pulls, now, self.window_secs);
            if expired > 0 {
                debug!(expired, remaining = pulls.len(), "Pruned expired pulls");
            }

            if pulls.len() < self.max_pulls {
                pulls.push_back(now);
                debug!(recent_pulls = pulls.len(), "Pull admitted");
                return;
            }

            // Window is full: the oldest entry is the first to expire.
            let oldest = pulls.front().copied().unwrap_or(now);
            let wait_secs = (self.window_secs - (now - oldest)).max(1);
            warn!(wait_secs, recent_pulls = pulls.len(), "Sleeping to respect rate limit");
            self.clock
                .sleep(Duration::from_secs(wait_secs.unsigned_abs()))
                .await;
        }
    }

    /// Number of pulls currently inside the window.
    pub async fn recent_pulls(&self) -> usize {
        let mut pulls = self.pulls.lock().await;
        prune(&mut pulls, self.clock.now(), self.window_secs);
        pulls.len()
    }

    pub fn max_pulls(&self) -> usize {
        self.max_pulls
    }

    pub fn window_secs(&self) -> i64 {
        self.window_secs
    }
}

/// Drop entries whose age has reached the window. Returns how many went.
fn prune(pulls: &mut VecDeque<i64>, now: i64, window_secs: i64) -> usize {
    let before = pulls.len();
    while let Some(&oldest) = pulls.front() {
        if now - oldest >= window_secs {
            pulls.pop_front();
        } else {
            break;
        }
    }
    before - pulls.len()
}
