use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::model::Snapshot;

/// Default maximum age, in seconds, for a snapshot to be served without a
/// new fetch. Kept under half an hour so a hit always belongs to the current
/// reporting hour.
pub const DEFAULT_FRESHNESS_WINDOW_SECS: i64 = 29 * 60;

/// Last known snapshot per normalized zip code.
///
/// Entries are only written after a successful fetch and are never evicted;
/// the key space is bounded by the 100k possible zip codes.
#[derive(Debug)]
pub struct FreshnessCache {
    entries: RwLock<HashMap<String, Snapshot>>,
    freshness_window_secs: i64,
}

impl FreshnessCache {
    pub fn new(freshness_window_secs: i64) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            freshness_window_secs,
        }
    }

    pub fn freshness_window_secs(&self) -> i64 {
        self.freshness_window_secs
    }

    pub async fn lookup(&self, key: &str) -> Option<Snapshot> {
        self.entries.read().await.get(key).cloned()
    }

    pub fn is_fresh(&self, snapshot: &Snapshot, now: i64) -> bool {
        snapshot.age_at(now) <= self.freshness_window_secs
    }

    /// Store `snapshot` for `key` unless the cached one was observed later.
    ///
    /// Returns whether the entry was written.
    pub async fn store(&self, key: &str, snapshot: Snapshot) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(key) {
            Some(existing) if existing.observed_at > snapshot.observed_at => false,
            _ => {
                entries.insert(key.to_string(), snapshot);
                true
            }
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for FreshnessCache {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW_SECS)
    }
}
