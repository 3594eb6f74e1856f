use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{doc, oid};
use mongodb::{Collection, Database};
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use sensorgate_types::{ObjectId, Sensor};

use super::SensorRepository;

const SENSOR_COLLECTION: &str = "Sensors";

/// Sensor document as stored by the platform's registration service.
#[derive(Debug, Clone, Deserialize)]
struct SensorDocument {
    #[serde(rename = "_id")]
    id: oid::ObjectId,
    #[serde(rename = "Owner")]
    owner: String,
    #[serde(rename = "Secret")]
    secret: String,
}

impl SensorDocument {
    /// Documents with an unparseable owner are skipped rather than failing
    /// the whole load.
    fn into_sensor(self) -> Option<Sensor> {
        let owner = match Uuid::parse_str(&self.owner) {
            Ok(owner) => owner,
            Err(err) => {
                warn!(
                    sensor_id = %self.id,
                    error = %err,
                    "skipping sensor document with invalid owner"
                );
                return None;
            }
        };

        Some(Sensor {
            id: ObjectId::from_bytes(self.id.bytes()),
            owner,
            secret: self.secret,
        })
    }
}

/// MongoDB-backed sensor repository.
pub struct MongoSensorRepository {
    collection: Collection<SensorDocument>,
}

impl MongoSensorRepository {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection(SENSOR_COLLECTION),
        }
    }
}

#[async_trait]
impl SensorRepository for MongoSensorRepository {
    async fn get_all_sensors(&self) -> Result<Vec<Sensor>> {
        let mut cursor = self
            .collection
            .find(doc! {})
            .await
            .context("Failed to query sensors")?;

        let mut sensors = Vec::new();

        while let Some(document) = cursor
            .try_next()
            .await
            .context("Failed to read sensor cursor")?
        {
            if let Some(sensor) = document.into_sensor() {
                sensors.push(sensor);
            }
        }

        Ok(sensors)
    }

    async fn get_sensor_by_id(&self, id: &ObjectId) -> Result<Option<Sensor>> {
        let document = self
            .collection
            .find_one(doc! { "_id": oid::ObjectId::from_bytes(id.bytes()) })
            .await
            .context("Failed to load sensor")?;

        Ok(document.and_then(SensorDocument::into_sensor))
    }
}
