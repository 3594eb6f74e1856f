// ============================================================================
// MQTT Broker Configuration
// ============================================================================

use crate::constants::*;
use crate::{env_or, env_parse_or};

/// Connection and topic settings for one MQTT broker.
#[derive(Clone, Debug)]
pub struct BrokerConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    /// TLS toggle; requires `ca_file` when enabled.
    pub ssl: bool,
    /// Path to the CA certificate used to verify the broker.
    pub ca_file: Option<String>,

    pub measurement_topic: String,
    pub bulk_measurement_topic: String,
    pub message_topic: String,
    pub bulk_message_topic: String,
    /// Cache-invalidation control channel. Only subscribed on the internal
    /// broker.
    pub command_topic: String,
}

/// Both brokers the gateway talks to: the untrusted public ingress and the
/// trusted internal egress.
#[derive(Clone, Debug)]
pub struct MqttConfig {
    pub public_broker: BrokerConfig,
    pub internal_broker: BrokerConfig,
}

impl MqttConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            public_broker: BrokerConfig {
                host: env_or("PUBLIC_MQTT_HOST", "localhost"),
                port: env_parse_or("PUBLIC_MQTT_PORT", DEFAULT_MQTT_PORT),
                username: std::env::var("PUBLIC_MQTT_USERNAME").ok(),
                password: std::env::var("PUBLIC_MQTT_PASSWORD").ok(),
                ssl: env_parse_or("PUBLIC_MQTT_SSL", false),
                ca_file: std::env::var("PUBLIC_MQTT_CA_FILE").ok(),
                measurement_topic: env_or("MEASUREMENT_TOPIC", DEFAULT_MEASUREMENT_TOPIC),
                bulk_measurement_topic: env_or(
                    "BULK_MEASUREMENT_TOPIC",
                    DEFAULT_BULK_MEASUREMENT_TOPIC,
                ),
                message_topic: env_or("MESSAGE_TOPIC", DEFAULT_MESSAGE_TOPIC),
                bulk_message_topic: env_or("BULK_MESSAGE_TOPIC", DEFAULT_BULK_MESSAGE_TOPIC),
                command_topic: env_or("COMMAND_TOPIC", DEFAULT_COMMAND_TOPIC),
            },
            internal_broker: BrokerConfig {
                host: env_or("INTERNAL_MQTT_HOST", "localhost"),
                port: env_parse_or("INTERNAL_MQTT_PORT", DEFAULT_MQTT_PORT),
                username: std::env::var("INTERNAL_MQTT_USERNAME").ok(),
                password: std::env::var("INTERNAL_MQTT_PASSWORD").ok(),
                ssl: env_parse_or("INTERNAL_MQTT_SSL", false),
                ca_file: std::env::var("INTERNAL_MQTT_CA_FILE").ok(),
                measurement_topic: env_or(
                    "INTERNAL_MEASUREMENT_TOPIC",
                    DEFAULT_INTERNAL_MEASUREMENT_TOPIC,
                ),
                bulk_measurement_topic: env_or(
                    "INTERNAL_BULK_MEASUREMENT_TOPIC",
                    DEFAULT_INTERNAL_BULK_MEASUREMENT_TOPIC,
                ),
                message_topic: env_or("INTERNAL_MESSAGE_TOPIC", DEFAULT_INTERNAL_MESSAGE_TOPIC),
                bulk_message_topic: env_or(
                    "INTERNAL_BULK_MESSAGE_TOPIC",
                    DEFAULT_INTERNAL_BULK_MESSAGE_TOPIC,
                ),
                command_topic: env_or("COMMAND_TOPIC", DEFAULT_COMMAND_TOPIC),
            },
        }
    }
}
