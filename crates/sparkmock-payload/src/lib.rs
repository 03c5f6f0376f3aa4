//! Sparkplug-B payload model and wire codecs for SparkMock.
//!
//! This crate holds everything a consumer needs to produce or inspect the
//! payloads the simulator publishes:
//!
//! - [`DataType`]: the closed 35-entry Sparkplug data-type table with its
//!   bidirectional name/tag mapping
//! - [`MetricValue`]: the tagged value variants a metric can carry
//! - [`Metric`] and [`Payload`]: the message model itself
//! - [`Encoding`]: compact (Sparkplug protobuf wire format) or readable
//!   (indented JSON) serialization, plus a decoder for the compact form
//!
//! Payload assembly from sample catalogs and the publish loop live in the
//! `sparkmock-simulator` crate.

pub mod encoding;
pub mod error;
pub mod payload;
pub mod types;
pub mod wire;

pub use encoding::Encoding;
pub use error::{DecodeError, EncodeError};
pub use payload::{Metric, Payload};
pub use types::{DataType, MetricValue};
