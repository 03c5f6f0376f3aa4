//! The Sparkplug payload model published by the simulator.

use crate::error::EncodeError;
use crate::types::{DataType, MetricValue};
use serde::{Deserialize, Serialize};

/// One named, typed, timestamped data point inside a payload.
///
/// A metric's timestamp always equals the timestamp of the payload that
/// carries it; metrics never carry independent capture times here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    pub timestamp: u64,
    #[serde(rename = "datatype")]
    pub data_type: DataType,
    #[serde(flatten)]
    pub value: MetricValue,
}

impl Metric {
    pub fn new(
        name: impl Into<String>,
        timestamp: u64,
        data_type: DataType,
        value: impl Into<MetricValue>,
    ) -> Self {
        Self {
            name: name.into(),
            timestamp,
            data_type,
            value: value.into(),
        }
    }

    /// Validate the datatype/value pairing.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if !self.value.matches(self.data_type) {
            return Err(EncodeError::ValueMismatch {
                name: self.name.clone(),
                datatype: self.data_type.name(),
                value: self.value.slot_name(),
            });
        }
        Ok(())
    }
}

/// A complete device-data payload.
///
/// `seq` is the node's 8-bit publish counter; it wraps modulo 256 and is
/// advanced by the publish cycle, not by payload construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payload {
    pub timestamp: u64,
    pub metrics: Vec<Metric>,
    pub seq: u8,
}

impl Payload {
    pub fn new(timestamp: u64, seq: u8) -> Self {
        Self {
            timestamp,
            metrics: Vec::new(),
            seq,
        }
    }

    /// Validate the payload before serialization.
    ///
    /// A payload must carry at least one metric, and every metric's value
    /// must fill the slot its datatype encodes into.
    pub fn validate(&self) -> Result<(), EncodeError> {
        if self.metrics.is_empty() {
            return Err(EncodeError::EmptyPayload);
        }
        for metric in &self.metrics {
            metric.validate()?;
        }
        Ok(())
    }
}
