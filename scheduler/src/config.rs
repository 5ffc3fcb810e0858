use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

/// Traffic store connection.
#[derive(Debug, Clone)]
pub struct InfluxConfig {
    pub addr: String,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl Default for InfluxConfig {
    fn default() -> Self {
        Self {
            addr: "http://influxdb:8086".to_string(),
            user: "influx".to_string(),
            password: "influx".to_string(),
            database: "edgescheduler".to_string(),
        }
    }
}

/// Scheduler configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Pods name the scheduler that places them in `spec.scheduler_name`.
    pub name: String,
    pub namespace: String,
    pub deschedule_interval: Duration,
    pub max_pods_per_node: usize,
    pub default_location: Option<String>,
    pub api_server_url: String,
    pub influx: InfluxConfig,
    pub status_port: u16,
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: "edge-scheduler".to_string(),
            namespace: "default".to_string(),
            deschedule_interval: Duration::from_secs(60),
            max_pods_per_node: 2,
            default_location: None,
            api_server_url: "http://localhost:7620".to_string(),
            influx: InfluxConfig::default(),
            status_port: 7621,
            debug: false,
        }
    }
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// Falls back to defaults for unset variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(name) = text("SCHEDULER_NAME") {
            config.name = name;
        }
        if let Some(namespace) = text("SCHEDULER_NAMESPACE") {
            config.namespace = namespace;
        }
        if let Some(secs) = number::<u64>(&lookup, "DESCHEDULE_INTERVAL")? {
            if secs == 0 {
                return Err(ConfigError::InvalidNumber {
                    var: "DESCHEDULE_INTERVAL",
                    value: secs.to_string(),
                });
            }
            config.deschedule_interval = Duration::from_secs(secs);
        }
        if let Some(max) = number(&lookup, "MAX_PODS_PER_NODE")? {
            config.max_pods_per_node = max;
        }
        config.default_location = text("DEFAULT_LOCATION");
        if let Some(url) = text("API_SERVER_URL") {
            config.api_server_url = url;
        }
        if let Some(addr) = text("INFLUX_ADDR") {
            config.influx.addr = addr;
        }
        if let Some(user) = text("INFLUX_USER") {
            config.influx.user = user;
        }
        if let Some(password) = text("INFLUX_PASSWORD") {
            config.influx.password = password;
        }
        if let Some(db) = text("INFLUX_DB") {
            config.influx.database = db;
        }
        if let Some(port) = number(&lookup, "STATUS_PORT")? {
            config.status_port = port;
        }
        config.debug = text("SCHEDULER_DEBUG").is_some_and(|v| v.eq_ignore_ascii_case("true"));

        Ok(config)
    }
}

fn number<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    if raw.trim().is_empty() {
        return Ok(None);
    }
    raw.trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidNumber { var, value: raw })
}
