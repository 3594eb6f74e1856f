// ============================================================================
// Repositories
// ============================================================================
//
// The authoritative stores behind the cache. The core only sees the traits;
// production wires PostgreSQL for users and API keys and MongoDB for sensor
// documents.
//
// ============================================================================

mod keys;
mod sensors;
mod users;

pub use keys::PgApiKeyRepository;
pub use sensors::MongoSensorRepository;
pub use users::{DbPool, PgUserRepository};

use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use sensorgate_types::{ApiKey, ObjectId, Sensor, User};

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn get_all_users(&self) -> Result<Vec<User>>;

    async fn get_user_by_id(&self, id: &Uuid) -> Result<Option<User>>;
}

#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    async fn get_all_sensor_keys(&self) -> Result<Vec<ApiKey>>;

    async fn get_sensor_key(&self, key: &str) -> Result<Option<ApiKey>>;
}

#[async_trait]
pub trait SensorRepository: Send + Sync {
    async fn get_all_sensors(&self) -> Result<Vec<Sensor>>;

    async fn get_sensor_by_id(&self, id: &ObjectId) -> Result<Option<Sensor>>;
}
