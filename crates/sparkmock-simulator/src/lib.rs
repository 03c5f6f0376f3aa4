//! Edge-node fleet simulator publishing Sparkplug-B telemetry over MQTT.
//!
//! SparkMock simulates a fleet of industrial edge nodes that publish typed
//! telemetry on a fixed cadence, for exercising brokers, consumers, and
//! dashboards without real hardware. Each node owns an 8-bit sequence
//! counter and, every tick, publishes either a metric payload (scan rate
//! plus the full sample catalog) or a single-event payload, chosen by an
//! independent Bernoulli draw.
//!
//! # Usage
//! ```bash
//! # four nodes against a local broker, 80% metric payloads
//! sparkmock-simulator --nodes 4 --server localhost:1883
//!
//! # indented JSON payloads for debugging a consumer
//! sparkmock-simulator --readable --metric-percent 100
//! ```

pub mod builder;
pub mod catalog;
pub mod config;
pub mod node;
pub mod transport;

pub use catalog::Catalog;
pub use config::Config;
pub use node::{EdgeNode, PublishStats};
pub use transport::MqttTransport;
