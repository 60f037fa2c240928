use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::{env, sync::OnceLock};
use tracing::debug;

use crate::{config::ProviderConfig, error::FetchError, model::Reading};

use super::WeatherProvider;

/// Environment variable consulted when no key is configured.
pub const API_KEY_ENV: &str = "OPENWEATHERMAP_API_KEY";

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

#[derive(Debug)]
pub struct OpenWeatherProvider {
    base_url: String,
    units: Option<String>,
    /// Set at construction when configured, otherwise filled from the
    /// environment on first use and kept for the life of the provider.
    api_key: OnceLock<String>,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: Option<String>) -> Self {
        Self::with_base_url(DEFAULT_BASE_URL, api_key)
    }

    pub fn with_base_url(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        let key = OnceLock::new();
        if let Some(api_key) = api_key {
            let _ = key.set(api_key);
        }

        Self {
            base_url: base_url.into(),
            units: None,
            api_key: key,
            http: Client::new(),
        }
    }

    pub fn from_config(config: &ProviderConfig) -> Self {
        let mut provider = Self::with_base_url(&config.base_url, config.api_key.clone());
        provider.units = config.units.clone();
        provider
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = Some(units.into());
        self
    }

    fn api_key(&self) -> &str {
        self.api_key
            .get_or_init(|| env::var(API_KEY_ENV).unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f32,
    humidity: i64,
}

#[derive(Debug, Deserialize)]
struct OwWind {
    speed: f32,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    main: OwMain,
    wind: OwWind,
}

impl OwCurrentResponse {
    fn into_reading(self) -> Reading {
        Reading {
            temperature: format!("{:.6}", self.main.temp),
            humidity: self.main.humidity.to_string(),
            wind_speed: format!("{:.6}", self.wind.speed),
        }
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    async fn fetch(&self, zip: &str) -> Result<Reading, FetchError> {
        let location = format!("{zip},us");
        let mut query = vec![("zip", location.as_str()), ("appid", self.api_key())];
        if let Some(units) = &self.units {
            query.push(("units", units.as_str()));
        }

        debug!(zip, url = %self.base_url, "Requesting current weather");

        let res = self.http.get(&self.base_url).query(&query).send().await?;

        let status = res.status();
        let body = res.text().await?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                body: truncate_body(&body),
            });
        }

        let parsed: OwCurrentResponse = serde_json::from_str(&body)?;
        Ok(parsed.into_reading())
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}
