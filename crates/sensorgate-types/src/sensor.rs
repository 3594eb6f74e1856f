use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::object_id::ObjectId;

/// A registered sensor.
///
/// The secret doubles as the sensor's API key: messages claiming this sensor
/// id must prove knowledge of it, and the key entry under the same string
/// must not be revoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sensor {
    pub id: ObjectId,
    pub owner: Uuid,
    pub secret: String,
}

impl Sensor {
    pub fn new(id: ObjectId, owner: Uuid, secret: impl Into<String>) -> Self {
        Self {
            id,
            owner,
            secret: secret.into(),
        }
    }
}
