//! Sample catalogs the payload builder draws from.

use sparkmock_payload::{DataType, MetricValue};
use std::collections::HashSet;
use thiserror::Error;

/// Name of the synthetic scan-rate metric prepended to every metric payload.
pub const SCAN_RATE_NAME: &str = "Device Control/Scan Rate ms";

/// Nominal device polling interval reported by the scan-rate metric.
pub const SCAN_RATE_MS: u32 = 6000;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("{0} catalog has no samples")]
    Empty(&'static str),

    #[error("sample with empty name in {0} catalog")]
    EmptyName(&'static str),

    #[error("duplicate sample name {0:?}")]
    DuplicateName(String),

    #[error("sample {name:?}: datatype {datatype} does not accept a {value} value")]
    ValueMismatch {
        name: String,
        datatype: &'static str,
        value: &'static str,
    },

    #[error("sample {name:?}: datatype {datatype} has no wire encoding")]
    Unencodable {
        name: String,
        datatype: &'static str,
    },
}

/// A named, typed sample definition.
///
/// Samples are immutable once the catalog is built; the value variant is
/// fixed at definition time, so no downcasting happens on the publish path.
#[derive(Debug, Clone)]
pub struct Sample {
    pub name: &'static str,
    pub data_type: DataType,
    pub value: MetricValue,
}

impl Sample {
    fn new(name: &'static str, data_type: DataType, value: impl Into<MetricValue>) -> Self {
        Self {
            name,
            data_type,
            value: value.into(),
        }
    }
}

/// The two fixed sample lists a run publishes from.
///
/// The metric catalog feeds metric payloads (one metric per entry, in
/// order, behind the scan-rate metric); the event catalog's first entry is
/// the single representative event.
#[derive(Debug, Clone)]
pub struct Catalog {
    metrics: Vec<Sample>,
    events: Vec<Sample>,
}

impl Catalog {
    /// Build a catalog, validating it once up front.
    pub fn new(metrics: Vec<Sample>, events: Vec<Sample>) -> Result<Self, CatalogError> {
        validate_samples("metric", &metrics)?;
        validate_samples("event", &events)?;
        Ok(Self { metrics, events })
    }

    /// The built-in sample set.
    pub fn defaults() -> Result<Self, CatalogError> {
        let metrics = vec![
            Sample::new("metric1", DataType::Boolean, false),
            Sample::new("metric2", DataType::Int8, 34u32),
            Sample::new("metric3", DataType::Int8, 100u32),
            Sample::new("metric4", DataType::Float, 24.0f32),
            Sample::new("metric5", DataType::Int32, 84692u32),
            Sample::new("metric6", DataType::UInt8, 99u32),
            Sample::new("metric7", DataType::UInt16, 118u32),
            Sample::new("metric8", DataType::UInt8, 0u32),
            Sample::new("metric9", DataType::UInt32, 5u32),
            Sample::new("metric10", DataType::Int16, 36u32),
        ];
        // boolean samples stand in for discrete events
        let events = vec![Sample::new("event", DataType::Boolean, false)];
        Self::new(metrics, events)
    }

    pub fn metrics(&self) -> &[Sample] {
        &self.metrics
    }

    pub fn events(&self) -> &[Sample] {
        &self.events
    }

    /// The single sample event payloads are built from.
    pub fn representative_event(&self) -> &Sample {
        &self.events[0]
    }
}

fn validate_samples(which: &'static str, samples: &[Sample]) -> Result<(), CatalogError> {
    if samples.is_empty() {
        return Err(CatalogError::Empty(which));
    }

    let mut seen = HashSet::new();
    for sample in samples {
        if sample.name.is_empty() {
            return Err(CatalogError::EmptyName(which));
        }
        if !seen.insert(sample.name) {
            return Err(CatalogError::DuplicateName(sample.name.to_string()));
        }
        if !is_encodable(sample.data_type) {
            return Err(CatalogError::Unencodable {
                name: sample.name.to_string(),
                datatype: sample.data_type.name(),
            });
        }
        if !sample.value.matches(sample.data_type) {
            return Err(CatalogError::ValueMismatch {
                name: sample.name.to_string(),
                datatype: sample.data_type.name(),
                value: sample.value.slot_name(),
            });
        }
    }
    Ok(())
}

/// Whether a data type has a defined wire encoding for samples.
fn is_encodable(data_type: DataType) -> bool {
    data_type.is_integer()
        || matches!(
            data_type,
            DataType::Boolean | DataType::String | DataType::Float | DataType::Double
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_catalog_is_valid() {
        let catalog = Catalog::defaults().unwrap();
        assert_eq!(catalog.metrics().len(), 10);
        assert_eq!(catalog.events().len(), 1);

        let event = catalog.representative_event();
        assert_eq!(event.name, "event");
        assert_eq!(event.data_type, DataType::Boolean);
        assert_eq!(event.value, MetricValue::Boolean(false));
    }

    #[test]
    fn test_catalog_order_is_preserved() {
        let catalog = Catalog::defaults().unwrap();
        let names: Vec<&str> = catalog.metrics().iter().map(|s| s.name).collect();
        assert_eq!(names[0], "metric1");
        assert_eq!(names[4], "metric5");
        assert_eq!(names[9], "metric10");
    }

    #[test]
    fn test_empty_catalog_rejected() {
        let result = Catalog::new(vec![], vec![Sample::new("e", DataType::Boolean, false)]);
        assert!(matches!(result, Err(CatalogError::Empty("metric"))));
    }

    #[test]
    fn test_mismatched_sample_rejected() {
        let result = Catalog::new(
            vec![Sample::new("m", DataType::Boolean, "oops")],
            vec![Sample::new("e", DataType::Boolean, false)],
        );
        assert!(matches!(result, Err(CatalogError::ValueMismatch { .. })));
    }

    #[test]
    fn test_unencodable_datatype_rejected() {
        let result = Catalog::new(
            vec![Sample::new("m", DataType::DataSet, 1u32)],
            vec![Sample::new("e", DataType::Boolean, false)],
        );
        assert!(matches!(result, Err(CatalogError::Unencodable { .. })));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let result = Catalog::new(
            vec![
                Sample::new("m", DataType::Int8, 1u32),
                Sample::new("m", DataType::Int8, 2u32),
            ],
            vec![Sample::new("e", DataType::Boolean, false)],
        );
        assert!(matches!(result, Err(CatalogError::DuplicateName(_))));
    }
}
