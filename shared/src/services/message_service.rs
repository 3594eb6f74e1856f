// ============================================================================
// Message Service
// ============================================================================
//
// The orchestrator. Ingress callbacks enqueue payloads round-robin across
// the shards; the tick loop periodically reloads the cache from the
// repositories, fans processing out to one task per shard, sweeps expired
// cache entries, and drains pending invalidation commands.
//
// ============================================================================

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use sensorgate_config::Config;
use sensorgate_types::Command;

use crate::cache::DataCache;
use crate::consumers::{
    CommandConsumer, MeasurementConsumer, MeasurementPair, MessageConsumer, MessagePair,
};
use crate::mqtt::MessagePublisher;
use crate::repositories::{ApiKeyRepository, SensorRepository, UserRepository};
use crate::validator::{parse_message, parse_messages, MeasurementValidator};

/// Batches beyond this length are rejected outright.
const MAX_BATCH_LEN: usize = u32::MAX as usize;

pub struct MessageService {
    cache: Arc<DataCache>,

    measurement_handlers: Vec<Arc<MeasurementConsumer>>,
    message_handlers: Vec<Arc<MessageConsumer>>,

    // Independent shard selectors for the two payload kinds.
    measurement_index: AtomicUsize,
    message_index: AtomicUsize,

    /// Payloads enqueued since the last tick.
    count: AtomicU64,

    last_reload: Mutex<Instant>,
    reload_timeout: Duration,
    cleanup_budget: Duration,

    validator: MeasurementValidator,

    users: Arc<dyn UserRepository>,
    keys: Arc<dyn ApiKeyRepository>,
    sensors: Arc<dyn SensorRepository>,
    commands: Arc<CommandConsumer>,
}

impl MessageService {
    /// Build the service and perform the initial bulk load so the cache is
    /// warm before the first tick.
    pub async fn new(
        publisher: Arc<dyn MessagePublisher>,
        commands: Arc<CommandConsumer>,
        users: Arc<dyn UserRepository>,
        keys: Arc<dyn ApiKeyRepository>,
        sensors: Arc<dyn SensorRepository>,
        config: &Config,
    ) -> Self {
        let cache = Arc::new(DataCache::new(Duration::from_secs(config.cache_ttl_secs)));
        let internal = &config.mqtt.internal_broker;

        let mut measurement_handlers = Vec::with_capacity(config.workers);
        let mut message_handlers = Vec::with_capacity(config.workers);

        for _ in 0..config.workers.max(1) {
            measurement_handlers.push(Arc::new(MeasurementConsumer::new(
                Arc::clone(&publisher),
                Arc::clone(&cache),
                internal.bulk_measurement_topic.clone(),
                config.internal_batch_size,
            )));
            message_handlers.push(Arc::new(MessageConsumer::new(
                Arc::clone(&publisher),
                Arc::clone(&cache),
                internal.bulk_message_topic.clone(),
                config.internal_batch_size,
            )));
        }

        let service = Self {
            cache,
            measurement_handlers,
            message_handlers,
            measurement_index: AtomicUsize::new(0),
            message_index: AtomicUsize::new(0),
            count: AtomicU64::new(0),
            last_reload: Mutex::new(Instant::now()),
            reload_timeout: Duration::from_secs(config.reload_secs),
            cleanup_budget: Duration::from_millis(config.cleanup_budget_ms),
            validator: MeasurementValidator::new(),
            users,
            keys,
            sensors,
            commands,
        };

        service.load_all().await;
        service
    }

    // ========================================================================
    // Ingress
    // ========================================================================

    /// Validate and enqueue a raw measurement payload. Malformed payloads
    /// are dropped without counting.
    pub fn add_measurement_raw(&self, raw: &str) {
        if let Some(model) = self.validator.validate(raw) {
            self.add_measurement((raw.to_string(), model));
        }
    }

    /// Validate and enqueue a bulk measurement payload.
    pub fn add_measurements_raw(&self, raw: &str) {
        let pairs = self.validator.validate_bulk(raw);

        if !pairs.is_empty() {
            self.add_measurements(pairs);
        }
    }

    pub fn add_measurement(&self, pair: MeasurementPair) {
        let index = self.measurement_index.fetch_add(1, Ordering::Relaxed)
            % self.measurement_handlers.len();

        self.count.fetch_add(1, Ordering::AcqRel);
        self.measurement_handlers[index].push(pair);
    }

    pub fn add_measurements(&self, pairs: Vec<MeasurementPair>) {
        if pairs.len() > MAX_BATCH_LEN {
            warn!(len = pairs.len(), "dropping oversized measurement batch");
            return;
        }

        let index = self.measurement_index.fetch_add(1, Ordering::Relaxed)
            % self.measurement_handlers.len();

        self.count.fetch_add(pairs.len() as u64, Ordering::AcqRel);
        self.measurement_handlers[index].push_bulk(pairs);
    }

    pub fn add_message_raw(&self, raw: &str) {
        if let Some(model) = parse_message(raw) {
            self.add_message((raw.to_string(), model));
        }
    }

    pub fn add_messages_raw(&self, raw: &str) {
        let pairs = parse_messages(raw);

        if !pairs.is_empty() {
            self.add_messages(pairs);
        }
    }

    pub fn add_message(&self, pair: MessagePair) {
        let index =
            self.message_index.fetch_add(1, Ordering::Relaxed) % self.message_handlers.len();

        self.count.fetch_add(1, Ordering::AcqRel);
        self.message_handlers[index].push(pair);
    }

    pub fn add_messages(&self, pairs: Vec<MessagePair>) {
        if pairs.len() > MAX_BATCH_LEN {
            warn!(len = pairs.len(), "dropping oversized message batch");
            return;
        }

        let index =
            self.message_index.fetch_add(1, Ordering::Relaxed) % self.message_handlers.len();

        self.count.fetch_add(pairs.len() as u64, Ordering::AcqRel);
        self.message_handlers[index].push_bulk(pairs);
    }

    // ========================================================================
    // Tick
    // ========================================================================

    /// One processing tick. Returns elapsed milliseconds, or 0 when there
    /// was nothing to process.
    pub async fn process(&self) -> u64 {
        let count = self.count.swap(0, Ordering::AcqRel);

        let reload_due = {
            let mut last = self.last_reload.lock();

            if last.elapsed() >= self.reload_timeout {
                *last = Instant::now();
                true
            } else {
                false
            }
        };

        if reload_due {
            info!("reloading caches");
            self.load_all().await;
        }

        if count == 0 {
            self.cache.cleanup_for(self.cleanup_budget);
            self.drain_commands().await;
            return 0;
        }

        debug!(count, "processing payloads");
        let start = Instant::now();

        let authorized = self.raw_process().await;

        if authorized != 0 {
            info!(authorized, "authorized messages");
        }

        self.cache.cleanup_for(self.cleanup_budget);
        self.drain_commands().await;

        let elapsed = start.elapsed().as_millis() as u64;
        debug!(elapsed_ms = elapsed, "processing finished");

        elapsed
    }

    /// Fan processing out to one task per shard and sum the authorized
    /// counts.
    async fn raw_process(&self) -> usize {
        let mut handles = Vec::with_capacity(self.measurement_handlers.len());

        for index in 0..self.measurement_handlers.len() {
            let measurement_handler = Arc::clone(&self.measurement_handlers[index]);
            let message_handler = Arc::clone(&self.message_handlers[index]);

            handles.push(tokio::spawn(async move {
                message_handler.process().await + measurement_handler.process().await
            }));
        }

        let mut authorized = 0usize;

        for handle in handles {
            match handle.await {
                Ok(count) => authorized += count,
                Err(err) => error!(error = %err, "worker task failed"),
            }
        }

        authorized
    }

    // ========================================================================
    // Cache maintenance
    // ========================================================================

    /// Reload the cache from all three repositories.
    ///
    /// The fetches run in parallel and all complete before the first append,
    /// so a lookup never observes a partially reloaded generation. A failed
    /// fetch leaves the existing entries in place.
    pub async fn load_all(&self) {
        let (sensors, users, keys) = tokio::join!(
            self.sensors.get_all_sensors(),
            self.users.get_all_users(),
            self.keys.get_all_sensor_keys(),
        );

        match sensors {
            Ok(sensors) => self.cache.append_sensors(sensors),
            Err(err) => error!(error = %err, "failed to load sensors"),
        }

        match users {
            Ok(users) => self.cache.append_users(users),
            Err(err) => error!(error = %err, "failed to load users"),
        }

        match keys {
            Ok(keys) => self.cache.append_keys(keys),
            Err(err) => error!(error = %err, "failed to load sensor keys"),
        }

        debug!(sensors = self.cache.sensor_count(), "cache reloaded");
    }

    async fn drain_commands(&self) {
        for command in self.commands.drain() {
            self.apply_command(command).await;
        }
    }

    async fn apply_command(&self, command: Command) {
        match command {
            Command::FlushSensor(id) => self.cache.flush_sensor(&id),
            Command::FlushUser(id) => self.cache.flush_user(&id),
            Command::FlushKey(key) => self.cache.flush_key(&key),
            Command::AddSensor(id) => match self.sensors.get_sensor_by_id(&id).await {
                Ok(Some(sensor)) => self.cache.append_sensors(vec![sensor]),
                Ok(None) => debug!(sensor_id = %id, "add command for unknown sensor"),
                Err(err) => error!(error = %err, "failed to fetch sensor for cache add"),
            },
            Command::AddUser(id) => match self.users.get_user_by_id(&id).await {
                Ok(Some(user)) => self.cache.append_users(vec![user]),
                Ok(None) => debug!(user_id = %id, "add command for unknown user"),
                Err(err) => error!(error = %err, "failed to fetch user for cache add"),
            },
            Command::AddKey(key) => match self.keys.get_sensor_key(&key).await {
                Ok(Some(key)) => self.cache.append_keys(vec![key]),
                Ok(None) => debug!("add command for unknown key"),
                Err(err) => error!(error = %err, "failed to fetch key for cache add"),
            },
        }
    }
}
