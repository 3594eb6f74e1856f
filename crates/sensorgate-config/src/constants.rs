// ============================================================================
// Configuration Constants
// ============================================================================

// Default tick cadence and parallelism
pub(crate) const DEFAULT_INTERVAL_MS: u64 = 1000;
pub(crate) const DEFAULT_WORKERS: usize = 4;

// Maximum number of records per outbound publish on the internal broker
pub(crate) const DEFAULT_INTERNAL_BATCH_SIZE: usize = 1000;

// Cache tuning. The TTL must comfortably exceed the reload period so a
// skipped reload does not drain the cache.
pub(crate) const DEFAULT_CACHE_TTL_SECS: u64 = 360;
pub(crate) const DEFAULT_RELOAD_SECS: u64 = 300;
pub(crate) const DEFAULT_CLEANUP_BUDGET_MS: u64 = 25;

// Default MQTT ports
pub(crate) const DEFAULT_MQTT_PORT: u16 = 1883;

// Default public-broker topics
pub(crate) const DEFAULT_MEASUREMENT_TOPIC: &str = "sensorgate/measurements";
pub(crate) const DEFAULT_BULK_MEASUREMENT_TOPIC: &str = "sensorgate/measurements/bulk";
pub(crate) const DEFAULT_MESSAGE_TOPIC: &str = "sensorgate/messages";
pub(crate) const DEFAULT_BULK_MESSAGE_TOPIC: &str = "sensorgate/messages/bulk";
pub(crate) const DEFAULT_COMMAND_TOPIC: &str = "sensorgate/internal/commands";

// Default internal-broker topics
pub(crate) const DEFAULT_INTERNAL_MEASUREMENT_TOPIC: &str = "sensorgate/internal/measurements";
pub(crate) const DEFAULT_INTERNAL_BULK_MEASUREMENT_TOPIC: &str =
    "sensorgate/internal/measurements/bulk";
pub(crate) const DEFAULT_INTERNAL_MESSAGE_TOPIC: &str = "sensorgate/internal/messages";
pub(crate) const DEFAULT_INTERNAL_BULK_MESSAGE_TOPIC: &str = "sensorgate/internal/messages/bulk";
