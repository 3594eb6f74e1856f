// ============================================================================
// MQTT Boundary
// ============================================================================
//
// The transport seam. The core publishes through the `MessagePublisher`
// trait and receives inbound traffic through the pump in `inbound`; only
// this module knows about rumqttc.
//
// ============================================================================

mod client;
pub mod inbound;

pub use client::{connect, MqttClient};

use async_trait::async_trait;
use sensorgate_error::AppResult;

/// Outbound publish seam between the core and the broker client.
#[async_trait]
pub trait MessagePublisher: Send + Sync {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()>;
}
