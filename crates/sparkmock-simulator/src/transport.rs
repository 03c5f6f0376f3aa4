//! MQTT transport shared by all workers.

use crate::config::Config;
use crate::node::Publish;
use async_trait::async_trait;
use rumqttc::{AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Packet, QoS};
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("MQTT client error: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("connection failed: {0}")]
    Connection(String),
}

/// MQTT publish client, cheap to clone across workers.
///
/// All workers share the one underlying connection; rumqttc's client is
/// safe for concurrent publishes.
#[derive(Clone)]
pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    /// Connect to the broker and spawn the event-loop driver.
    ///
    /// Waits for the broker's ConnAck before returning, so a dead or
    /// refusing broker fails the whole process at startup instead of after
    /// workers have begun ticking.
    pub async fn connect(config: &Config) -> Result<(Self, JoinHandle<()>), TransportError> {
        let (host, port) = config
            .broker_addr()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let client_id = format!("sparkmock-{}", rand::random::<u32>());
        let mut options = MqttOptions::new(client_id, host, port);
        options.set_keep_alive(Duration::from_secs(60));

        let (client, mut eventloop) = AsyncClient::new(options, 64);

        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code != ConnectReturnCode::Success {
                        return Err(TransportError::Connection(format!(
                            "broker refused connection: {:?}",
                            ack.code
                        )));
                    }
                    info!("connected to {}", config.server);
                    break;
                }
                Ok(_) => {}
                Err(e) => return Err(TransportError::Connection(e.to_string())),
            }
        }

        let driver = tokio::spawn(drive(eventloop));
        Ok((Self { client }, driver))
    }
}

#[async_trait]
impl Publish for MqttTransport {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> Result<(), TransportError> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await?;
        Ok(())
    }
}

/// Keep the connection alive and log whatever arrives.
///
/// The simulator never subscribes, but a broker may still route messages
/// here; they are logged and otherwise ignored.
async fn drive(mut eventloop: EventLoop) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                info!(
                    "incoming message on {} ({} bytes)",
                    publish.topic,
                    publish.payload.len()
                );
            }
            Ok(_) => {}
            Err(e) => {
                warn!("MQTT event loop error: {}", e);
                tokio::time::sleep(Duration::from_secs(1)).await;
            }
        }
    }
}
