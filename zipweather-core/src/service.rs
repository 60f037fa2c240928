//! Lookup orchestration: validate, consult the cache, fetch under the rate
//! limit, fall back to cached data when the provider fails.

use std::{collections::HashMap, sync::Arc};
use tokio::sync::{Mutex, OnceCell};
use tracing::{debug, info, instrument, warn};

use crate::{
    cache::FreshnessCache,
    clock::{Clock, SystemClock},
    config::Config,
    error::FailureReason,
    model::{Snapshot, WeatherOutcome, WeatherReport, WeatherResult},
    provider::{OpenWeatherProvider, WeatherProvider},
    rate_limit::SlidingWindowLimiter,
    validate::normalize_zip,
};

/// Shared weather lookup service.
///
/// One instance owns the cache, the limiter and the provider client; share
/// it by reference (or `Arc`) between callers.
#[derive(Debug)]
pub struct WeatherService {
    cache: FreshnessCache,
    limiter: SlidingWindowLimiter,
    provider: Arc<dyn WeatherProvider>,
    clock: Arc<dyn Clock>,
    /// One shared attempt per zip; callers arriving while it runs wait for
    /// its outcome instead of fetching again.
    in_flight: Mutex<HashMap<String, Arc<OnceCell<WeatherOutcome>>>>,
}

impl WeatherService {
    pub fn new(config: &Config, provider: Arc<dyn WeatherProvider>, clock: Arc<dyn Clock>) -> Self {
        Self {
            cache: FreshnessCache::new(config.cache.freshness_window_secs),
            limiter: SlidingWindowLimiter::new(
                config.rate_limit.max_pulls_per_minute,
                config.rate_limit.tracking_window_secs,
                clock.clone(),
            ),
            provider,
            clock,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    /// Service backed by OpenWeather and the system clock.
    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config,
            Arc::new(OpenWeatherProvider::from_config(&config.provider)),
            Arc::new(SystemClock),
        )
    }

    pub fn cache(&self) -> &FreshnessCache {
        &self.cache
    }

    pub fn limiter(&self) -> &SlidingWindowLimiter {
        &self.limiter
    }

    /// Flat result for `zip`; see [`WeatherResult`] for the error convention.
    pub async fn get_weather(&self, zip: &str) -> WeatherResult {
        self.latest(zip).await.into()
    }

    /// Current weather for `zip`.
    ///
    /// Never fails outright: invalid input and the no-data case come back as
    /// [`WeatherOutcome::Failure`].
    #[instrument(skip(self))]
    pub async fn latest(&self, zip: &str) -> WeatherOutcome {
        let Some(key) = normalize_zip(zip) else {
            info!("Rejected invalid zip");
            return WeatherOutcome::Failure(FailureReason::InvalidZip {
                input: zip.to_string(),
            });
        };

        if let Some(snapshot) = self.fresh_entry(&key).await {
            debug!(%key, "Cache hit");
            return self.success(&snapshot);
        }

        let slot = self.slot(&key).await;
        let key_ref = key.as_str();
        let outcome = slot
            .get_or_init(|| async move {
                // A previous attempt may have landed since the first check.
                match self.fresh_entry(key_ref).await {
                    Some(snapshot) => self.success(&snapshot),
                    None => self.refresh(key_ref).await,
                }
            })
            .await
            .clone();
        self.release_slot(&key, &slot).await;

        outcome
    }

    async fn refresh(&self, key: &str) -> WeatherOutcome {
        self.limiter.admit().await;

        match self.provider.fetch(key).await {
            Ok(reading) => {
                let snapshot = reading.observed_at(self.clock.now());
                debug!(%key, observed_at = snapshot.observed_at, "Fetch succeeded");
                if self.cache.store(key, snapshot.clone()).await {
                    return self.success(&snapshot);
                }
                // A newer reading is already cached; serve that one.
                match self.cache.lookup(key).await {
                    Some(newer) => self.success(&newer),
                    None => self.success(&snapshot),
                }
            }
            Err(err) => {
                warn!(%key, error = %err, "Fetch failed, falling back to cache");
                self.fallback(key).await
            }
        }
    }

    async fn fallback(&self, key: &str) -> WeatherOutcome {
        let now = self.clock.now();
        match self.cache.lookup(key).await {
            Some(snapshot) if self.cache.is_fresh(&snapshot, now) => {
                WeatherOutcome::Success(WeatherReport::from_snapshot(&snapshot, now))
            }
            Some(snapshot) => {
                WeatherOutcome::StaleFallback(WeatherReport::from_snapshot(&snapshot, now))
            }
            None => WeatherOutcome::Failure(FailureReason::NoData {
                zip: key.to_string(),
            }),
        }
    }

    async fn fresh_entry(&self, key: &str) -> Option<Snapshot> {
        let snapshot = self.cache.lookup(key).await?;
        self.cache
            .is_fresh(&snapshot, self.clock.now())
            .then_some(snapshot)
    }

    fn success(&self, snapshot: &Snapshot) -> WeatherOutcome {
        WeatherOutcome::Success(WeatherReport::from_snapshot(snapshot, self.clock.now()))
    }

    async fn slot(&self, key: &str) -> Arc<OnceCell<WeatherOutcome>> {
        self.in_flight
            .lock()
            .await
            .entry(key.to_string())
            .or_default()
            .clone()
    }

    /// Retire a finished attempt so the next miss starts a new one.
    async fn release_slot(&self, key: &str, slot: &Arc<OnceCell<WeatherOutcome>>) {
        let mut in_flight = self.in_flight.lock().await;
        if in_flight.get(key).is_some_and(|current| Arc::ptr_eq(current, slot)) {
            in_flight.remove(key);
        }
    }
}
