//! Configuration for the simulator.

use serde::{Deserialize, Serialize};
use sparkmock_payload::Encoding;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("node count must be at least 1")]
    NoNodes,

    #[error("metric percentage {0} is outside 0..=100")]
    MetricPercentOutOfRange(u8),

    #[error("invalid broker address {0:?}, expected host:port")]
    InvalidServerAddress(String),
}

/// Immutable run configuration, built once from the CLI and passed by
/// reference into the orchestrator and each edge node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Broker address as `host:port`.
    pub server: String,

    /// Number of edge nodes to simulate.
    pub nodes: usize,

    /// Device name appended to the publish topic.
    pub device: String,

    /// Group namespace used in the publish topic.
    pub namespace: String,

    /// Percentage of payloads that carry metrics; the rest are events.
    pub metric_percent: u8,

    /// Wire encoding for the whole run.
    pub encoding: Encoding,

    /// Time between publishes per node.
    pub interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "localhost:1883".to_string(),
            nodes: 4,
            device: "device".to_string(),
            namespace: "MyGroupId".to_string(),
            metric_percent: 80,
            encoding: Encoding::Compact,
            interval: Duration::from_secs(10),
        }
    }
}

impl Config {
    /// Validate the configuration at startup.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.nodes == 0 {
            return Err(ConfigError::NoNodes);
        }
        if self.metric_percent > 100 {
            return Err(ConfigError::MetricPercentOutOfRange(self.metric_percent));
        }
        self.broker_addr()?;
        Ok(())
    }

    /// Split the configured server string into host and port.
    pub fn broker_addr(&self) -> Result<(String, u16), ConfigError> {
        let (host, port) = self
            .server
            .rsplit_once(':')
            .ok_or_else(|| ConfigError::InvalidServerAddress(self.server.clone()))?;
        if host.is_empty() {
            return Err(ConfigError::InvalidServerAddress(self.server.clone()));
        }
        let port: u16 = port
            .parse()
            .map_err(|_| ConfigError::InvalidServerAddress(self.server.clone()))?;
        Ok((host.to_string(), port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.broker_addr().unwrap(), ("localhost".to_string(), 1883));
    }

    #[test]
    fn test_zero_nodes_rejected() {
        let config = Config {
            nodes: 0,
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::NoNodes)));
    }

    #[test]
    fn test_metric_percent_bounds() {
        let config = Config {
            metric_percent: 101,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MetricPercentOutOfRange(101))
        ));

        for percent in [0, 50, 100] {
            let config = Config {
                metric_percent: percent,
                ..Config::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_broker_addr_parsing() {
        for bad in ["localhost", ":1883", "localhost:", "localhost:notaport"] {
            let config = Config {
                server: bad.to_string(),
                ..Config::default()
            };
            assert!(config.validate().is_err(), "{bad} should be rejected");
        }

        let config = Config {
            server: "broker.example.com:8883".to_string(),
            ..Config::default()
        };
        assert_eq!(
            config.broker_addr().unwrap(),
            ("broker.example.com".to_string(), 8883)
        );
    }
}
