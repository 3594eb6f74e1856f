use std::time::Duration;

use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS, TlsConfiguration, Transport};

use sensorgate_config::BrokerConfig;
use sensorgate_error::{AppError, AppResult};

use super::MessagePublisher;

const KEEP_ALIVE: Duration = Duration::from_secs(30);
const REQUEST_CHANNEL_CAPACITY: usize = 64;

/// Thin wrapper around the rumqttc client. Cloneable; all clones share the
/// underlying request channel.
#[derive(Clone)]
pub struct MqttClient {
    client: AsyncClient,
}

/// Build a client for the given broker. The returned event loop must be
/// polled (see `inbound`) for the connection to make progress.
pub fn connect(broker: &BrokerConfig, client_id: &str) -> AppResult<(MqttClient, EventLoop)> {
    let mut options = MqttOptions::new(client_id, &broker.host, broker.port);
    options.set_keep_alive(KEEP_ALIVE);

    if let Some(username) = &broker.username {
        options.set_credentials(
            username.clone(),
            broker.password.clone().unwrap_or_default(),
        );
    }

    if broker.ssl {
        let ca_file = broker.ca_file.as_ref().ok_or_else(|| {
            AppError::config("ssl enabled but no CA file configured for broker")
        })?;
        let ca = std::fs::read(ca_file)?;

        options.set_transport(Transport::Tls(TlsConfiguration::Simple {
            ca,
            alpn: None,
            client_auth: None,
        }));
    }

    let (client, eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

    Ok((MqttClient { client }, eventloop))
}

impl MqttClient {
    pub async fn subscribe(&self, topic: &str) -> AppResult<()> {
        self.client
            .subscribe(topic, QoS::AtLeastOnce)
            .await
            .map_err(|err| AppError::mqtt(err.to_string()))
    }
}

#[async_trait]
impl MessagePublisher for MqttClient {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()> {
        self.client
            .publish(topic, QoS::AtMostOnce, false, payload)
            .await
            .map_err(|err| AppError::mqtt(err.to_string()))
    }
}
