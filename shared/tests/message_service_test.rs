// ============================================================================
// Message Service Integration Tests
// ============================================================================
//
// End-to-end tests of the authorization pipeline with mock repositories and
// a recording publisher: ingress -> shard -> cache lookup -> secret
// validation -> bulk publish.
//
// ============================================================================

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use prost::Message as ProstMessage;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use sensorgate_config::{
    BrokerConfig, Config, DatabaseConfig, LoggingConfig, MongoConfig, MqttConfig, PgSqlConfig,
};
use sensorgate_error::AppResult;
use sensorgate_shared::consumers::{wrap_digest, CommandConsumer};
use sensorgate_shared::mqtt::MessagePublisher;
use sensorgate_shared::proto::MeasurementData;
use sensorgate_shared::repositories::{ApiKeyRepository, SensorRepository, UserRepository};
use sensorgate_shared::services::MessageService;
use sensorgate_types::{ApiKey, Command, ObjectId, Sensor, User};

const SENSOR_A: &str = "5c7c3bbd9019a1fb0a4567ef";

// ============================================================================
// Mocks
// ============================================================================

#[derive(Default)]
struct MockUserRepository {
    users: Mutex<Vec<User>>,
    calls: AtomicUsize,
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn get_all_users(&self) -> anyhow::Result<Vec<User>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.users.lock().unwrap().clone())
    }

    async fn get_user_by_id(&self, id: &Uuid) -> anyhow::Result<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.id == *id)
            .cloned())
    }
}

#[derive(Default)]
struct MockApiKeyRepository {
    keys: Mutex<Vec<ApiKey>>,
    calls: AtomicUsize,
}

#[async_trait]
impl ApiKeyRepository for MockApiKeyRepository {
    async fn get_all_sensor_keys(&self) -> anyhow::Result<Vec<ApiKey>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.keys.lock().unwrap().clone())
    }

    async fn get_sensor_key(&self, key: &str) -> anyhow::Result<Option<ApiKey>> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.key == key)
            .cloned())
    }
}

#[derive(Default)]
struct MockSensorRepository {
    sensors: Mutex<Vec<Sensor>>,
    calls: AtomicUsize,
}

#[async_trait]
impl SensorRepository for MockSensorRepository {
    async fn get_all_sensors(&self) -> anyhow::Result<Vec<Sensor>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.sensors.lock().unwrap().clone())
    }

    async fn get_sensor_by_id(&self, id: &ObjectId) -> anyhow::Result<Option<Sensor>> {
        Ok(self
            .sensors
            .lock()
            .unwrap()
            .iter()
            .find(|sensor| sensor.id == *id)
            .cloned())
    }
}

#[derive(Default)]
struct RecordingPublisher {
    published: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingPublisher {
    fn published(&self) -> Vec<(String, Vec<u8>)> {
        self.published.lock().unwrap().clone()
    }

    fn published_measurement_count(&self, topic: &str) -> usize {
        self.published()
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, payload)| {
                MeasurementData::decode(payload.as_slice())
                    .unwrap()
                    .measurements
                    .len()
            })
            .sum()
    }
}

#[async_trait]
impl MessagePublisher for RecordingPublisher {
    async fn publish(&self, topic: &str, payload: Vec<u8>) -> AppResult<()> {
        self.published
            .lock()
            .unwrap()
            .push((topic.to_string(), payload));
        Ok(())
    }
}

// ============================================================================
// Fixture
// ============================================================================

struct Fixture {
    service: Arc<MessageService>,
    publisher: Arc<RecordingPublisher>,
    commands: Arc<CommandConsumer>,
    users: Arc<MockUserRepository>,
    keys: Arc<MockApiKeyRepository>,
    sensors: Arc<MockSensorRepository>,
}

fn test_broker() -> BrokerConfig {
    BrokerConfig {
        host: "localhost".into(),
        port: 1883,
        username: None,
        password: None,
        ssl: false,
        ca_file: None,
        measurement_topic: "sensorgate/measurements".into(),
        bulk_measurement_topic: "sensorgate/measurements/bulk".into(),
        message_topic: "sensorgate/messages".into(),
        bulk_message_topic: "sensorgate/messages/bulk".into(),
        command_topic: "sensorgate/internal/commands".into(),
    }
}

fn test_config(workers: usize, reload_secs: u64) -> Config {
    Config {
        interval_ms: 50,
        workers,
        internal_batch_size: 2048,
        cache_ttl_secs: 360,
        reload_secs,
        cleanup_budget_ms: 25,
        mqtt: MqttConfig {
            public_broker: test_broker(),
            internal_broker: test_broker(),
        },
        database: DatabaseConfig {
            pgsql: PgSqlConfig {
                connection_string: "postgres://localhost/unused".into(),
                max_connections: 1,
                acquire_timeout_secs: 1,
            },
            mongodb: MongoConfig {
                connection_string: "mongodb://localhost".into(),
                database_name: "unused".into(),
            },
        },
        logging: LoggingConfig {
            level: "info".into(),
            file: None,
        },
    }
}

/// Seed: sensor A with the given secret, a live owner, and a live key.
async fn fixture_with_secret(workers: usize, reload_secs: u64, secret: &str) -> Fixture {
    let owner = Uuid::new_v4();
    let sensor = Sensor::new(ObjectId::parse(SENSOR_A).unwrap(), owner, secret);

    let users = Arc::new(MockUserRepository::default());
    users.users.lock().unwrap().push(User::new(owner));

    let keys = Arc::new(MockApiKeyRepository::default());
    keys.keys.lock().unwrap().push(ApiKey::new(secret));

    let sensors = Arc::new(MockSensorRepository::default());
    sensors.sensors.lock().unwrap().push(sensor);

    build_fixture(workers, reload_secs, users, keys, sensors).await
}

async fn build_fixture(
    workers: usize,
    reload_secs: u64,
    users: Arc<MockUserRepository>,
    keys: Arc<MockApiKeyRepository>,
    sensors: Arc<MockSensorRepository>,
) -> Fixture {
    let publisher = Arc::new(RecordingPublisher::default());
    let commands = Arc::new(CommandConsumer::new());

    let service = Arc::new(
        MessageService::new(
            Arc::clone(&publisher) as Arc<dyn MessagePublisher>,
            Arc::clone(&commands),
            Arc::clone(&users) as Arc<dyn UserRepository>,
            Arc::clone(&keys) as Arc<dyn ApiKeyRepository>,
            Arc::clone(&sensors) as Arc<dyn SensorRepository>,
            &test_config(workers, reload_secs),
        )
        .await,
    );

    Fixture {
        service,
        publisher,
        commands,
        users,
        keys,
        sensors,
    }
}

fn measurement_payload(secret: &str) -> String {
    format!(
        r#"{{"CreatedById":"{SENSOR_A}","CreatedBySecret":"{secret}","Longitude":0.0,"Latitude":0.0,"Data":{{"T":{{"Value":1.0,"Unit":"C"}}}},"CreatedAt":""}}"#
    )
}

fn message_payload(secret: &str, data: &str) -> String {
    format!(r#"{{"SensorId":"{SENSOR_A}","Secret":"{secret}","Data":"{data}"}}"#)
}

// ============================================================================
// Scenarios
// ============================================================================

#[tokio::test]
async fn test_cold_start_known_sensor_is_authorized() {
    let fixture = fixture_with_secret(1, 300, "k1").await;

    fixture.service.add_measurement_raw(&measurement_payload("k1"));
    fixture.service.process().await;

    let published = fixture.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "sensorgate/measurements/bulk");

    let decoded = MeasurementData::decode(published[0].1.as_slice()).unwrap();
    assert_eq!(decoded.measurements.len(), 1);

    // Empty device timestamp means platform time is substituted.
    let record = &decoded.measurements[0];
    assert_eq!(record.timestamp, record.platformtime);
}

#[tokio::test]
async fn test_banned_user_is_dropped() {
    let fixture = fixture_with_secret(1, 300, "k1").await;

    // Ban the owner and force the new account state into the cache.
    {
        let mut users = fixture.users.users.lock().unwrap();
        users[0].banned = true;
    }
    fixture.service.load_all().await;

    fixture.service.add_measurement_raw(&measurement_payload("k1"));
    fixture.service.process().await;

    assert!(fixture.publisher.published().is_empty());
}

#[tokio::test]
async fn test_revoked_key_is_dropped() {
    let fixture = fixture_with_secret(1, 300, "k1").await;

    {
        let mut keys = fixture.keys.keys.lock().unwrap();
        keys[0].revoked = true;
    }
    fixture.service.load_all().await;

    fixture.service.add_measurement_raw(&measurement_payload("k1"));
    fixture.service.process().await;

    assert!(fixture.publisher.published().is_empty());
}

#[tokio::test]
async fn test_wrong_secret_is_dropped() {
    let fixture = fixture_with_secret(1, 300, "k1").await;

    fixture
        .service
        .add_measurement_raw(&measurement_payload("wrong"));
    fixture.service.process().await;

    assert!(fixture.publisher.published().is_empty());
}

#[tokio::test]
async fn test_unknown_sensor_is_dropped() {
    let fixture = build_fixture(
        1,
        300,
        Arc::new(MockUserRepository::default()),
        Arc::new(MockApiKeyRepository::default()),
        Arc::new(MockSensorRepository::default()),
    )
    .await;

    fixture.service.add_measurement_raw(&measurement_payload("k1"));
    fixture.service.process().await;

    assert!(fixture.publisher.published().is_empty());
}

#[tokio::test]
async fn test_sha256_substitution_auth() {
    let fixture = fixture_with_secret(1, 300, "s").await;

    // The device hashes the payload with the true secret in place, then
    // transmits the payload with the wrapped digest instead.
    let canonical = measurement_payload("s");
    let digest = hex::encode(Sha256::digest(canonical.as_bytes()));
    let signed = measurement_payload(&wrap_digest(&digest));

    fixture.service.add_measurement_raw(&signed);
    fixture.service.process().await;

    assert_eq!(
        fixture
            .publisher
            .published_measurement_count("sensorgate/measurements/bulk"),
        1
    );
}

#[tokio::test]
async fn test_sha256_substitution_rejects_tampering() {
    let fixture = fixture_with_secret(1, 300, "s").await;

    let canonical = measurement_payload("s");
    let digest = hex::encode(Sha256::digest(canonical.as_bytes()));
    let signed = measurement_payload(&wrap_digest(&digest));

    // Tamper with the data after signing.
    let tampered = signed.replace("\"Value\":1.0", "\"Value\":2.0");

    fixture.service.add_measurement_raw(&tampered);
    fixture.service.process().await;

    assert!(fixture.publisher.published().is_empty());
}

#[tokio::test]
async fn test_shard_balancing_authorizes_all() {
    let fixture = fixture_with_secret(4, 300, "k1").await;

    for _ in 0..1000 {
        fixture.service.add_measurement_raw(&measurement_payload("k1"));
    }
    fixture.service.process().await;

    let published = fixture.publisher.published();

    // One bulk publish per shard, covering all payloads between them.
    assert_eq!(published.len(), 4);
    assert_eq!(
        fixture
            .publisher
            .published_measurement_count("sensorgate/measurements/bulk"),
        1000
    );
}

#[tokio::test]
async fn test_targeted_flush_drops_subsequent_payloads() {
    let fixture = fixture_with_secret(1, 300, "k1").await;

    fixture.service.add_measurement_raw(&measurement_payload("k1"));
    fixture.service.process().await;
    assert_eq!(fixture.publisher.published().len(), 1);

    // Flush sensor A via the control channel; the idle tick drains it.
    fixture
        .commands
        .push(Command::FlushSensor(ObjectId::parse(SENSOR_A).unwrap()));
    fixture.service.process().await;

    fixture.service.add_measurement_raw(&measurement_payload("k1"));
    fixture.service.process().await;

    assert_eq!(fixture.publisher.published().len(), 1);
}

#[tokio::test]
async fn test_add_sensor_command_restores_authorization() {
    let fixture = fixture_with_secret(1, 300, "k1").await;
    let sensor_id = ObjectId::parse(SENSOR_A).unwrap();

    fixture.commands.push(Command::FlushSensor(sensor_id));
    fixture.service.process().await;

    // Re-add via the control channel; the repository fetch repopulates the
    // cache entry.
    fixture.commands.push(Command::AddSensor(sensor_id));
    fixture.service.process().await;

    fixture.service.add_measurement_raw(&measurement_payload("k1"));
    fixture.service.process().await;

    assert_eq!(fixture.publisher.published().len(), 1);
}

#[tokio::test]
async fn test_reload_fires_and_new_data_is_visible() {
    // reload_secs = 0 makes every tick reload.
    let users = Arc::new(MockUserRepository::default());
    let keys = Arc::new(MockApiKeyRepository::default());
    let sensors = Arc::new(MockSensorRepository::default());

    let fixture = build_fixture(
        1,
        0,
        Arc::clone(&users),
        Arc::clone(&keys),
        Arc::clone(&sensors),
    )
    .await;

    // Construction performed the initial load.
    assert_eq!(users.calls.load(Ordering::SeqCst), 1);
    assert_eq!(keys.calls.load(Ordering::SeqCst), 1);
    assert_eq!(sensors.calls.load(Ordering::SeqCst), 1);

    // Register sensor A after startup.
    let owner = Uuid::new_v4();
    users.users.lock().unwrap().push(User::new(owner));
    keys.keys.lock().unwrap().push(ApiKey::new("k1"));
    sensors
        .sensors
        .lock()
        .unwrap()
        .push(Sensor::new(ObjectId::parse(SENSOR_A).unwrap(), owner, "k1"));

    // The reload runs before the shards drain, so the payload is judged
    // against the fresh data in the same tick.
    fixture.service.add_measurement_raw(&measurement_payload("k1"));
    fixture.service.process().await;

    assert_eq!(users.calls.load(Ordering::SeqCst), 2);
    assert_eq!(keys.calls.load(Ordering::SeqCst), 2);
    assert_eq!(sensors.calls.load(Ordering::SeqCst), 2);
    assert_eq!(fixture.publisher.published().len(), 1);
}

#[tokio::test]
async fn test_messages_publish_raw_concatenation() {
    let fixture = fixture_with_secret(1, 300, "k1").await;

    let first = message_payload("k1", "one");
    let second = message_payload("k1", "two");

    fixture.service.add_message_raw(&first);
    fixture.service.add_message_raw(&second);
    fixture.service.process().await;

    let published = fixture.publisher.published();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].0, "sensorgate/messages/bulk");

    let body = String::from_utf8(published[0].1.clone()).unwrap();
    let lines: Vec<&str> = body.split('\n').collect();
    assert_eq!(lines.len(), 2);
    assert!(lines.contains(&first.as_str()));
    assert!(lines.contains(&second.as_str()));
}

#[tokio::test]
async fn test_bulk_measurement_ingress() {
    let fixture = fixture_with_secret(2, 300, "k1").await;

    let bulk = format!(
        "{}\n{}\n{}",
        measurement_payload("k1"),
        measurement_payload("k1"),
        measurement_payload("k1")
    );

    fixture.service.add_measurements_raw(&bulk);
    fixture.service.process().await;

    assert_eq!(
        fixture
            .publisher
            .published_measurement_count("sensorgate/measurements/bulk"),
        3
    );
}

#[tokio::test]
async fn test_malformed_payloads_are_dropped_silently() {
    let fixture = fixture_with_secret(1, 300, "k1").await;

    fixture.service.add_measurement_raw("not json");
    fixture.service.add_message_raw("{\"SensorId\":\"nope\"}");
    fixture.service.process().await;

    assert!(fixture.publisher.published().is_empty());
}
