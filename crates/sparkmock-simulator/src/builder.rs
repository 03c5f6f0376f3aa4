//! Payload assembly from the sample catalogs.

use crate::catalog::{Catalog, SCAN_RATE_MS, SCAN_RATE_NAME};
use sparkmock_payload::{DataType, Metric, Payload};

/// Build a metric-shaped payload.
///
/// The metric order is an observable contract: the scan-rate metric is
/// always index 0, followed by one metric per catalog entry in catalog
/// order. Every metric carries the payload's timestamp.
pub fn metric_payload(catalog: &Catalog, timestamp: u64, seq: u8) -> Payload {
    let mut payload = Payload::new(timestamp, seq);
    payload.metrics.reserve(1 + catalog.metrics().len());

    payload.metrics.push(scan_rate_metric(timestamp));
    for sample in catalog.metrics() {
        payload.metrics.push(Metric::new(
            sample.name,
            timestamp,
            sample.data_type,
            sample.value.clone(),
        ));
    }

    payload
}

/// Build an event-shaped payload: exactly one metric, from the catalog's
/// representative event sample.
pub fn event_payload(catalog: &Catalog, timestamp: u64, seq: u8) -> Payload {
    let sample = catalog.representative_event();
    let mut payload = Payload::new(timestamp, seq);
    payload.metrics.push(Metric::new(
        sample.name,
        timestamp,
        sample.data_type,
        sample.value.clone(),
    ));
    payload
}

/// The well-known scan-rate metric.
fn scan_rate_metric(timestamp: u64) -> Metric {
    Metric::new(SCAN_RATE_NAME, timestamp, DataType::Int32, SCAN_RATE_MS)
}
