//! Process configuration loaded from environment variables.

use std::net::SocketAddr;
use std::time::Duration;

use thiserror::Error;

use warehub_core::GroupId;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_DATA_TOPIC: &str = "warehouse-final-topic";
pub const DEFAULT_RESPONSE_TOPIC: &str = "warehouse-responses";
pub const DEFAULT_GROUP_PREFIX: &str = "zentrale-final";
pub const DEFAULT_RESPONSE_GROUP: &str = "final-lager-group";
pub const DEFAULT_LINZ_INTERVAL: Duration = Duration::from_secs(10);
pub const DEFAULT_WIEN_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: invalid value {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_topic: String,
    pub response_topic: String,
    /// Prefix for the per-process aggregator group (`<prefix>-<uuid>`).
    pub group_prefix: String,
    /// Shared group used by the acknowledgment listener.
    pub response_group: GroupId,
    pub linz_interval: Duration,
    pub wien_interval: Duration,
    /// Redis connection URL; `None` selects the in-memory broker.
    pub redis_url: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            data_topic: DEFAULT_DATA_TOPIC.to_string(),
            response_topic: DEFAULT_RESPONSE_TOPIC.to_string(),
            group_prefix: DEFAULT_GROUP_PREFIX.to_string(),
            response_group: GroupId::fixed(DEFAULT_RESPONSE_GROUP),
            linz_interval: DEFAULT_LINZ_INTERVAL,
            wien_interval: DEFAULT_WIEN_INTERVAL,
            redis_url: None,
        }
    }
}

impl Config {
    /// Load from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load using an arbitrary variable lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let defaults = Self::default();

        let bind_addr = match get("WAREHUB_BIND_ADDR") {
            Some(raw) => raw.parse::<SocketAddr>().map_err(|e| ConfigError::Invalid {
                var: "WAREHUB_BIND_ADDR",
                value: raw.clone(),
                reason: e.to_string(),
            })?,
            None => defaults.bind_addr,
        };

        let response_group = match get("WAREHUB_RESPONSE_GROUP") {
            Some(raw) => GroupId::fixed(raw),
            None => defaults.response_group,
        };

        Ok(Self {
            bind_addr,
            data_topic: get("WAREHUB_DATA_TOPIC").unwrap_or(defaults.data_topic),
            response_topic: get("WAREHUB_RESPONSE_TOPIC").unwrap_or(defaults.response_topic),
            group_prefix: get("WAREHUB_GROUP_PREFIX").unwrap_or(defaults.group_prefix),
            response_group,
            linz_interval: interval(get("WAREHUB_LINZ_INTERVAL_MS"), "WAREHUB_LINZ_INTERVAL_MS", defaults.linz_interval)?,
            wien_interval: interval(get("WAREHUB_WIEN_INTERVAL_MS"), "WAREHUB_WIEN_INTERVAL_MS", defaults.wien_interval)?,
            redis_url: get("REDIS_URL"),
        })
    }

    /// Aggregator group for this process: fresh on every start (fan-out).
    pub fn aggregator_group(&self) -> GroupId {
        GroupId::random(&self.group_prefix)
    }
}

fn interval(raw: Option<String>, var: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let Some(raw) = raw else {
        return Ok(default);
    };

    let millis = raw.parse::<u64>().map_err(|e| ConfigError::Invalid {
        var,
        value: raw.clone(),
        reason: e.to_string(),
    })?;

    if millis == 0 {
        return Err(ConfigError::Invalid {
            var,
            value: raw,
            reason: "interval must be positive".to_string(),
        });
    }

    Ok(Duration::from_millis(millis))
}
