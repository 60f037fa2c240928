use async_trait::async_trait;
use std::fmt::Debug;

use crate::{error::FetchError, model::Reading};

pub mod openweather;

pub use openweather::OpenWeatherProvider;

/// Source of fresh weather readings.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Fetch the current reading for an already normalized zip code.
    ///
    /// The caller stamps the reading once this returns.
    async fn fetch(&self, zip: &str) -> Result<Reading, FetchError>;
}
