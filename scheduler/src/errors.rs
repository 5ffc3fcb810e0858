use thiserror::Error;

/// Rejections raised by [`ScoreMap`](crate::scores::ScoreMap) mutators.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScoreError {
    /// Node is not part of the map.
    #[error("node {0} not in map")]
    NotFound(String),
    /// Node was disabled earlier in this attempt and can no longer be scored.
    #[error("node {0} is already disabled")]
    Disabled(String),
    /// Score outside of the accepted range.
    #[error("score {0} out of range [0, 100]")]
    OutOfRange(i64),
}

/// Errors talking to the cluster api server.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Referenced object does not exist, or a reference to it is missing.
    #[error("not found: {0}")]
    NotFound(String),
    /// Non-success status from the api server.
    #[error("api server responded {status}: {body}")]
    Status { status: u16, body: String },
    /// Transport level failure.
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    /// Body could not be decoded.
    #[error("could not decode response: {0}")]
    Decode(String),
}

/// Errors from the traffic time-series store.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("query request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("query failed: {0}")]
    Query(String),
    #[error("no traffic recorded for {0}")]
    NoTraffic(String),
    #[error("unexpected query result: {0}")]
    Decode(String),
}

/// Invalid configuration values.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{var} must be a valid number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}
