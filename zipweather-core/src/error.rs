use serde::Serialize;
use thiserror::Error;

/// Why a provider call produced no snapshot.
///
/// The orchestrator treats every variant the same way; the distinction only
/// shows up in logs.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to provider failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("provider returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode provider response: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Reasons a lookup produced no weather data at all.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    #[error("Invalid zip({input}), accepted values are 00000 to 99999")]
    InvalidZip { input: String },

    #[error("No data available for zip({zip})")]
    NoData { zip: String },
}
