//! Edge-node workers and the per-tick publish cycle.

use crate::builder;
use crate::catalog::Catalog;
use crate::config::Config;
use crate::transport::TransportError;
use async_trait::async_trait;
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sparkmock_payload::{EncodeError, Payload};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, warn};

/// Sparkplug topic namespace prefix.
const TOPIC_PREFIX: &str = "spBv1.0";

/// Message kind for device data.
const MESSAGE_KIND: &str = "DDATA";

/// Publish seam to the transport.
///
/// One publish is in flight per worker at a time; the worker awaits the
/// outcome before its next tick.
#[async_trait]
pub trait Publish: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError>;
}

/// Encoding seam, implemented by [`Encoding`](sparkmock_payload::Encoding).
pub trait EncodePayload: Send + Sync {
    fn encode(&self, payload: &Payload) -> Result<Vec<u8>, EncodeError>;
}

impl EncodePayload for sparkmock_payload::Encoding {
    fn encode(&self, payload: &Payload) -> Result<Vec<u8>, EncodeError> {
        sparkmock_payload::Encoding::encode(self, payload)
    }
}

/// Counters shared across all workers.
#[derive(Debug, Default)]
pub struct PublishStats {
    pub metric_payloads: AtomicU64,
    pub event_payloads: AtomicU64,
    pub bytes_published: AtomicU64,
    pub encode_errors: AtomicU64,
    pub publish_errors: AtomicU64,
}

impl PublishStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_published(&self, shape: Shape, bytes: u64) {
        match shape {
            Shape::Metric => self.metric_payloads.fetch_add(1, Ordering::Relaxed),
            Shape::Event => self.event_payloads.fetch_add(1, Ordering::Relaxed),
        };
        self.bytes_published.fetch_add(bytes, Ordering::Relaxed);
    }

    fn record_encode_error(&self) {
        self.encode_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn record_publish_error(&self) {
        self.publish_errors.fetch_add(1, Ordering::Relaxed);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Metric,
    Event,
}

/// One simulated edge node.
///
/// Owns its identity and 8-bit sequence counter exclusively; no other
/// component reads or mutates them. The counter starts at 0 and advances
/// once per published payload, wrapping modulo 256. Encode failures skip
/// the tick without consuming a sequence number; transport failures are
/// logged and the counter still advances.
pub struct EdgeNode<P, E> {
    edge_id: usize,
    seq: u8,
    device: String,
    namespace: String,
    metric_percent: u8,
    interval: Duration,
    catalog: Arc<Catalog>,
    encoder: E,
    transport: P,
    stats: Arc<PublishStats>,
    rng: StdRng,
}

impl<P: Publish, E: EncodePayload> EdgeNode<P, E> {
    pub fn new(
        edge_id: usize,
        config: &Config,
        catalog: Arc<Catalog>,
        encoder: E,
        transport: P,
        stats: Arc<PublishStats>,
        seed: u64,
    ) -> Self {
        Self {
            edge_id,
            seq: 0,
            device: config.device.clone(),
            namespace: config.namespace.clone(),
            metric_percent: config.metric_percent,
            interval: config.interval,
            catalog,
            encoder,
            transport,
            stats,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn seq(&self) -> u8 {
        self.seq
    }

    /// Run the publish loop until shutdown is signalled.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.interval);
        // a slow broker delays this worker's later ticks instead of
        // bunching them up
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // the interval fires immediately once; consume it so the first
        // publish lands a full period after startup
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let timestamp = Utc::now().timestamp_millis() as u64;
                    self.tick(timestamp).await;
                }
                _ = shutdown.changed() => break,
            }
        }

        debug!("edge node {} stopped at seq {}", self.edge_id, self.seq);
    }

    /// Execute one publish cycle at the given wall-clock timestamp.
    pub async fn tick(&mut self, timestamp: u64) {
        let draw: u8 = self.rng.gen_range(0..100);
        let (shape, payload) = if draw < self.metric_percent {
            (
                Shape::Metric,
                builder::metric_payload(&self.catalog, timestamp, self.seq),
            )
        } else {
            (
                Shape::Event,
                builder::event_payload(&self.catalog, timestamp, self.seq),
            )
        };

        let bytes = match self.encoder.encode(&payload) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("edge node {}: encode failed, dropping tick: {}", self.edge_id, e);
                self.stats.record_encode_error();
                return;
            }
        };

        let topic = data_topic(&self.namespace, self.edge_id, &self.device);
        let len = bytes.len() as u64;
        match self.transport.publish(&topic, bytes).await {
            Ok(()) => {
                debug!(
                    "edge node {}: published seq {} ({} bytes) to {}",
                    self.edge_id, self.seq, len, topic
                );
                self.stats.record_published(shape, len);
            }
            Err(e) => {
                // fire and move on: a failed publish is not retried, and
                // the sequence still advances past this tick
                warn!("edge node {}: publish failed: {}", self.edge_id, e);
                self.stats.record_publish_error();
            }
        }

        self.seq = self.seq.wrapping_add(1);
    }
}

/// Device-data topic for one edge node.
///
/// The exact shape is a wire contract consumers parse.
pub fn data_topic(namespace: &str, edge_id: usize, device: &str) -> String {
    format!(
        "{}/{}/{}/{}/{}",
        TOPIC_PREFIX, namespace, MESSAGE_KIND, edge_id, device
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SCAN_RATE_NAME;
    use sparkmock_payload::{wire, DataType, Encoding, MetricValue};
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct FakeTransport {
        published: Arc<Mutex<Vec<(String, Vec<u8>)>>>,
    }

    impl FakeTransport {
        fn payloads(&self) -> Vec<Payload> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .map(|(_, bytes)| wire::decode(bytes).unwrap())
                .collect()
        }

        fn topics(&self) -> Vec<String> {
            self.published
                .lock()
                .unwrap()
                .iter()
                .map(|(topic, _)| topic.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Publish for FakeTransport {
        async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), payload));
            Ok(())
        }
    }

    struct FailingTransport;

    #[async_trait]
    impl Publish for FailingTransport {
        async fn publish(&self, _topic: &str, _payload: Vec<u8>) -> Result<(), TransportError> {
            Err(TransportError::Connection("broker unreachable".to_string()))
        }
    }

    /// Encoder that fails on one specific call (1-based).
    struct FlakyEncoder {
        fail_on: usize,
        calls: AtomicUsize,
    }

    impl FlakyEncoder {
        fn new(fail_on: usize) -> Self {
            Self {
                fail_on,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl EncodePayload for FlakyEncoder {
        fn encode(&self, payload: &Payload) -> Result<Vec<u8>, EncodeError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if call == self.fail_on {
                return Err(EncodeError::EmptyPayload);
            }
            Encoding::Compact.encode(payload)
        }
    }

    fn test_node<P: Publish, E: EncodePayload>(
        metric_percent: u8,
        encoder: E,
        transport: P,
    ) -> EdgeNode<P, E> {
        let config = Config {
            metric_percent,
            ..Config::default()
        };
        EdgeNode::new(
            1,
            &config,
            Arc::new(Catalog::defaults().unwrap()),
            encoder,
            transport,
            Arc::new(PublishStats::new()),
            42,
        )
    }

    #[tokio::test]
    async fn test_two_metric_ticks() {
        let transport = FakeTransport::default();
        let mut node = test_node(100, Encoding::Compact, transport.clone());

        let t = 1_700_000_000_000u64;
        node.tick(t).await;
        node.tick(t + 10_000).await;

        let payloads = transport.payloads();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].seq, 0);
        assert_eq!(payloads[1].seq, 1);
        assert_eq!(payloads[0].timestamp, t);
        assert_eq!(payloads[1].timestamp, t + 10_000);

        for payload in &payloads {
            assert_eq!(payload.metrics.len(), 11);
            assert_eq!(payload.metrics[0].name, SCAN_RATE_NAME);
            assert_eq!(payload.metrics[0].data_type, DataType::Int32);
            assert_eq!(payload.metrics[0].value, MetricValue::Int(6000));
            assert_eq!(payload.metrics[1].name, "metric1");
            assert_eq!(payload.metrics[10].name, "metric10");
        }
    }

    #[tokio::test]
    async fn test_sequence_runs_without_gaps() {
        let transport = FakeTransport::default();
        let mut node = test_node(100, Encoding::Compact, transport.clone());

        for i in 0..20 {
            node.tick(1000 + i).await;
        }

        let payloads = transport.payloads();
        let seqs: Vec<u8> = payloads.iter().map(|p| p.seq).collect();
        let expected: Vec<u8> = (0..20).collect();
        assert_eq!(seqs, expected);
        // at 100 percent, no tick ever produces an event payload
        assert!(payloads.iter().all(|p| p.metrics.len() == 11));
    }

    #[tokio::test]
    async fn test_sequence_wraps_modulo_256() {
        let transport = FakeTransport::default();
        let mut node = test_node(100, Encoding::Compact, transport.clone());

        for i in 0..257u64 {
            node.tick(i).await;
        }

        let seqs: Vec<u8> = transport.payloads().iter().map(|p| p.seq).collect();
        assert_eq!(seqs.len(), 257);
        assert_eq!(seqs[255], 255);
        assert_eq!(seqs[256], 0);
        assert_eq!(node.seq(), 1);
    }

    #[tokio::test]
    async fn test_zero_percent_is_all_events() {
        let transport = FakeTransport::default();
        let mut node = test_node(0, Encoding::Compact, transport.clone());

        for i in 0..50 {
            node.tick(i).await;
        }

        for payload in transport.payloads() {
            assert_eq!(payload.metrics.len(), 1);
            assert_eq!(payload.metrics[0].name, "event");
            assert_eq!(payload.metrics[0].data_type, DataType::Boolean);
        }
    }

    #[tokio::test]
    async fn test_fifty_percent_converges() {
        let transport = FakeTransport::default();
        let mut node = test_node(50, Encoding::Compact, transport.clone());

        for i in 0..1000 {
            node.tick(i).await;
        }

        let metric_count = transport
            .payloads()
            .iter()
            .filter(|p| p.metrics.len() == 11)
            .count();
        assert!(
            (400..=600).contains(&metric_count),
            "metric share drifted: {metric_count}/1000"
        );
    }

    #[tokio::test]
    async fn test_encode_failure_skips_tick_without_consuming_seq() {
        let transport = FakeTransport::default();
        let mut node = test_node(100, FlakyEncoder::new(3), transport.clone());

        for i in 0..5 {
            node.tick(i).await;
        }

        let seqs: Vec<u8> = transport.payloads().iter().map(|p| p.seq).collect();
        assert_eq!(seqs, vec![0, 1, 2, 3]);
        assert_eq!(node.stats.encode_errors.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn test_transport_failure_still_advances_seq() {
        let mut node = test_node(100, Encoding::Compact, FailingTransport);

        for i in 0..3 {
            node.tick(i).await;
        }

        assert_eq!(node.seq(), 3);
        assert_eq!(node.stats.publish_errors.load(Ordering::Relaxed), 3);
        assert_eq!(node.stats.metric_payloads.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn test_topic_shape() {
        let transport = FakeTransport::default();
        let mut node = test_node(100, Encoding::Compact, transport.clone());
        node.tick(0).await;

        assert_eq!(
            data_topic("MyGroupId", 3, "device"),
            "spBv1.0/MyGroupId/DDATA/3/device"
        );
        assert_eq!(transport.topics(), vec!["spBv1.0/MyGroupId/DDATA/1/device"]);
    }

    #[tokio::test]
    async fn test_readable_mode_publishes_json() {
        let transport = FakeTransport::default();
        let mut node = test_node(0, Encoding::Readable, transport.clone());
        node.tick(1000).await;

        let published = transport.published.lock().unwrap();
        let payload: Payload = serde_json::from_slice(&published[0].1).unwrap();
        assert_eq!(payload.metrics.len(), 1);
        assert_eq!(payload.metrics[0].value, MetricValue::Boolean(false));
    }
}
