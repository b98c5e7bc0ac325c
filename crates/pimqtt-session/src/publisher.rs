//! Publish seam between command handling and the broker client.
//!
//! All publishes use QoS "at most once". Only the liveness marker is
//! retained.

use async_trait::async_trait;
use rumqttc::{AsyncClient, QoS};

use crate::errors::SessionError;

/// Quality of service for every publish and the command subscription.
pub const QOS: QoS = QoS::AtMostOnce;

/// Something that can publish a payload to a topic.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Queue `payload` for `topic`.
    async fn publish(&self, topic: &str, payload: Vec<u8>, retain: bool)
    -> Result<(), SessionError>;
}

#[async_trait]
impl Publisher for AsyncClient {
    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        retain: bool,
    ) -> Result<(), SessionError> {
        AsyncClient::publish(self, topic, QOS, retain, payload).await?;
        Ok(())
    }
}
