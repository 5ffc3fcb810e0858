//! Observed request traffic per location, read from InfluxDB
//!
//! The tracing agent writes one `request` point per observed call, tagged with the
//! called `app` and the caller's `location`.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::{config::InfluxConfig, errors::TelemetryError};

/// Look-back window of a traffic query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeWindow {
    FifteenMinutes,
    OneHour,
    OneDay,
}

impl TimeWindow {
    /// Narrowest first.
    pub const ALL: [TimeWindow; 3] = [
        TimeWindow::FifteenMinutes,
        TimeWindow::OneHour,
        TimeWindow::OneDay,
    ];

    /// InfluxQL duration literal.
    pub fn as_duration(&self) -> &'static str {
        match self {
            TimeWindow::FifteenMinutes => "15m",
            TimeWindow::OneHour => "1h",
            TimeWindow::OneDay => "24h",
        }
    }

    /// Weight of traffic seen in this window; recent traffic counts more.
    pub fn multiplier(&self) -> i64 {
        match self {
            TimeWindow::FifteenMinutes => 3,
            TimeWindow::OneHour => 2,
            TimeWindow::OneDay => 1,
        }
    }
}

#[async_trait]
pub trait TrafficSource: Send + Sync {
    /// Percentage (0..=100) of the deployment's requests that came from `location`
    /// within `window`.
    async fn request_percentage(
        &self,
        deployment: &str,
        location: &str,
        window: TimeWindow,
    ) -> Result<u32, TelemetryError>;
}

/// InfluxDB 1.x HTTP query client.
pub struct InfluxClient {
    config: InfluxConfig,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    results: Vec<QueryResult>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryResult {
    #[serde(default)]
    series: Vec<Series>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Series {
    #[serde(default)]
    values: Vec<Vec<serde_json::Value>>,
}

impl InfluxClient {
    pub fn new(config: &InfluxConfig) -> Self {
        Self {
            config: config.clone(),
            http: Client::new(),
        }
    }

    /// Runs a single `SELECT count(..)` statement. `None` when no points matched.
    async fn count(&self, statement: &str) -> Result<Option<u64>, TelemetryError> {
        let resp = self
            .http
            .get(format!("{}/query", self.config.addr.trim_end_matches('/')))
            .query(&[
                ("db", self.config.database.as_str()),
                ("u", self.config.user.as_str()),
                ("p", self.config.password.as_str()),
                ("q", statement),
            ])
            .send()
            .await?;

        let status = resp.status();
        let body: QueryResponse = resp.json().await.map_err(|e| {
            TelemetryError::Decode(format!("status {}: {}", status, e))
        })?;
        if let Some(err) = body.error {
            return Err(TelemetryError::Query(err));
        }
        if !status.is_success() {
            return Err(TelemetryError::Query(format!("status {}", status)));
        }

        let Some(result) = body.results.into_iter().next() else {
            return Ok(None);
        };
        if let Some(err) = result.error {
            return Err(TelemetryError::Query(err));
        }
        let Some(series) = result.series.into_iter().next() else {
            return Ok(None);
        };
        series
            .values
            .first()
            .and_then(|row| row.get(1))
            .and_then(|v| v.as_u64())
            .map(Some)
            .ok_or_else(|| TelemetryError::Decode("count column missing".to_string()))
    }
}

/// Quotes a value for use inside an InfluxQL string literal.
fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

pub fn location_statement(deployment: &str, location: &str, window: TimeWindow) -> String {
    format!(
        "SELECT count(\"duration\") FROM \"request\" WHERE (\"app\" = '{}') AND (\"location\" = '{}') AND time >= now() - {}",
        quote(deployment),
        quote(location),
        window.as_duration()
    )
}

pub fn total_statement(deployment: &str, window: TimeWindow) -> String {
    format!(
        "SELECT count(\"duration\") FROM \"request\" WHERE (\"app\" = '{}') AND time >= now() - {}",
        quote(deployment),
        window.as_duration()
    )
}

#[async_trait]
impl TrafficSource for InfluxClient {
    async fn request_percentage(
        &self,
        deployment: &str,
        location: &str,
        window: TimeWindow,
    ) -> Result<u32, TelemetryError> {
        let Some(from_location) = self
            .count(&location_statement(deployment, location, window))
            .await?
        else {
            return Ok(0);
        };

        let total = self
            .count(&total_statement(deployment, window))
            .await?
            .filter(|t| *t > 0)
            .ok_or_else(|| TelemetryError::NoTraffic(deployment.to_string()))?;

        Ok((from_location * 100 / total).min(100) as u32)
    }
}
