use serde::{Deserialize, Serialize};

use crate::error::FailureReason;

/// Display values returned by a provider, not yet stamped with a time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    pub temperature: String,
    pub humidity: String,
    pub wind_speed: String,
}

impl Reading {
    pub fn observed_at(self, observed_at: i64) -> Snapshot {
        Snapshot {
            temperature: self.temperature,
            humidity: self.humidity,
            wind_speed: self.wind_speed,
            observed_at,
        }
    }
}

/// One cached weather reading.
///
/// Readings are kept as display strings exactly as produced by the provider
/// client; only `observed_at` (epoch seconds) is interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub temperature: String,
    pub humidity: String,
    pub wind_speed: String,
    pub observed_at: i64,
}

impl Snapshot {
    /// Seconds elapsed since the reading was taken, never negative.
    pub fn age_at(&self, now: i64) -> i64 {
        now.saturating_sub(self.observed_at).max(0)
    }
}

/// Weather data handed back to callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherReport {
    pub temperature: String,
    pub humidity: String,
    pub wind_speed: String,
    pub observed_at: i64,
    pub data_age_seconds: i64,
}

impl WeatherReport {
    pub fn from_snapshot(snapshot: &Snapshot, now: i64) -> Self {
        Self {
            temperature: snapshot.temperature.clone(),
            humidity: snapshot.humidity.clone(),
            wind_speed: snapshot.wind_speed.clone(),
            observed_at: snapshot.observed_at,
            data_age_seconds: snapshot.age_at(now),
        }
    }
}

/// Outcome of a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WeatherOutcome {
    /// Fresh data, either from the cache or from a fetch that just succeeded.
    Success(WeatherReport),
    /// The fetch failed and an older cached reading was served instead.
    StaleFallback(WeatherReport),
    Failure(FailureReason),
}

impl WeatherOutcome {
    pub fn report(&self) -> Option<&WeatherReport> {
        match self {
            WeatherOutcome::Success(report) | WeatherOutcome::StaleFallback(report) => {
                Some(report)
            }
            WeatherOutcome::Failure(_) => None,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, WeatherOutcome::Failure(_))
    }
}

/// Flat, string-only result shape.
///
/// Convention: a non-empty `error` means every other field is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub temperature: String,
    pub humidity: String,
    pub wind_speed: String,
    pub data_age_seconds: String,
    pub error: String,
}

impl From<WeatherOutcome> for WeatherResult {
    fn from(outcome: WeatherOutcome) -> Self {
        match outcome {
            WeatherOutcome::Success(report) | WeatherOutcome::StaleFallback(report) => Self {
                temperature: report.temperature,
                humidity: report.humidity,
                wind_speed: report.wind_speed,
                data_age_seconds: report.data_age_seconds.to_string(),
                error: String::new(),
            },
            WeatherOutcome::Failure(reason) => Self {
                error: reason.to_string(),
                ..Self::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(observed_at: i64) -> Snapshot {
        Snapshot {
            temperature: "291.150000".into(),
            humidity: "40".into(),
            wind_speed: "3.600000".into(),
            observed_at,
        }
    }

    #[test]
    fn age_is_elapsed_time_since_observation() {
        assert_eq!(snapshot(1_000).age_at(1_090), 90);
        assert_eq!(snapshot(1_000).age_at(1_000), 0);
    }

    #[test]
    fn age_never_goes_negative() {
        assert_eq!(snapshot(2_000).age_at(1_000), 0);
    }

    #[test]
    fn stale_fallback_flattens_without_error() {
        let report = WeatherReport::from_snapshot(&snapshot(100), 160);
        let flat = WeatherResult::from(WeatherOutcome::StaleFallback(report));

        assert_eq!(flat.temperature, "291.150000");
        assert_eq!(flat.humidity, "40");
        assert_eq!(flat.wind_speed, "3.600000");
        assert_eq!(flat.data_age_seconds, "60");
        assert!(flat.error.is_empty());
    }

    #[test]
    fn failure_flattens_to_empty_fields_and_message() {
        let flat = WeatherResult::from(WeatherOutcome::Failure(FailureReason::NoData {
            zip: "10001".into(),
        }));

        assert_eq!(flat.error, "No data available for zip(10001)");
        assert!(flat.temperature.is_empty());
        assert!(flat.humidity.is_empty());
        assert!(flat.wind_speed.is_empty());
        assert!(flat.data_age_seconds.is_empty());
    }
}
