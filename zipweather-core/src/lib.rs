//! Core library for `zipweather`.
//!
//! This crate defines:
//! - Zip code validation and normalization
//! - A freshness-windowed cache of the last reading per zip code
//! - A sliding-window limiter for outbound provider calls
//! - The OpenWeather client and the provider abstraction
//! - [`WeatherService`], which ties the above into one lookup
//!
//! It is used by `zipweather-cli`, but can also be reused by other binaries or services.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod model;
pub mod provider;
pub mod rate_limit;
pub mod service;
pub mod validate;

pub use cache::FreshnessCache;
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{CacheConfig, Config, ProviderConfig, RateLimitConfig};
pub use error::{FailureReason, FetchError};
pub use model::{Reading, Snapshot, WeatherOutcome, WeatherReport, WeatherResult};
pub use provider::{OpenWeatherProvider, WeatherProvider};
pub use rate_limit::SlidingWindowLimiter;
pub use service::WeatherService;
pub use validate::normalize_zip;
