// ============================================================================
// Inbound MQTT Pumps
// ============================================================================
//
// One pump per broker connection. The public pump feeds device traffic into
// the message service; the internal pump drives outbound publishes and
// receives cache-invalidation commands on the control topic.
//
// Subscriptions are (re-)established on every ConnAck so they survive
// broker reconnects.
//
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use rumqttc::{Event, EventLoop, Packet};
use tracing::{debug, error, info};

use sensorgate_config::BrokerConfig;

use crate::consumers::CommandConsumer;
use crate::services::MessageService;

use super::MqttClient;

const RECONNECT_DELAY: Duration = Duration::from_secs(1);

/// Pump the public-broker connection: device measurements and messages.
pub async fn run_public_pump(
    client: MqttClient,
    mut eventloop: EventLoop,
    service: Arc<MessageService>,
    broker: BrokerConfig,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!(host = %broker.host, port = broker.port, "connected to public broker");

                let topics = [
                    &broker.measurement_topic,
                    &broker.bulk_measurement_topic,
                    &broker.message_topic,
                    &broker.bulk_message_topic,
                ];

                for topic in topics {
                    if let Err(err) = client.subscribe(topic).await {
                        error!(error = %err, topic = %topic, "failed to subscribe");
                    }
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                let payload = String::from_utf8_lossy(&publish.payload);
                dispatch(&publish.topic, &payload, &service, &broker);
            }
            Ok(_) => {}
            Err(err) => {
                error!(error = %err, "public broker connection error");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}

fn dispatch(topic: &str, payload: &str, service: &MessageService, broker: &BrokerConfig) {
    if topic == broker.measurement_topic {
        service.add_measurement_raw(payload);
    } else if topic == broker.bulk_measurement_topic {
        service.add_measurements_raw(payload);
    } else if topic == broker.message_topic {
        service.add_message_raw(payload);
    } else if topic == broker.bulk_message_topic {
        service.add_messages_raw(payload);
    } else {
        debug!(topic = %topic, "ignoring payload on unexpected topic");
    }
}

/// Pump the internal-broker connection: flushes outbound publishes and
/// drains the control topic into the command consumer.
pub async fn run_internal_pump(
    client: MqttClient,
    mut eventloop: EventLoop,
    commands: Arc<CommandConsumer>,
    broker: BrokerConfig,
) {
    loop {
        match eventloop.poll().await {
            Ok(Event::Incoming(Packet::ConnAck(_))) => {
                info!(host = %broker.host, port = broker.port, "connected to internal broker");

                if let Err(err) = client.subscribe(&broker.command_topic).await {
                    error!(
                        error = %err,
                        topic = %broker.command_topic,
                        "failed to subscribe to control topic"
                    );
                }
            }
            Ok(Event::Incoming(Packet::Publish(publish))) => {
                if publish.topic == broker.command_topic {
                    commands.push_raw(&String::from_utf8_lossy(&publish.payload));
                }
            }
            Ok(_) => {}
            Err(err) => {
                error!(error = %err, "internal broker connection error");
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        }
    }
}
