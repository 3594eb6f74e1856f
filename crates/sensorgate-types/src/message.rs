use serde::{Deserialize, Serialize};

use crate::object_id::ObjectId;

/// Raw device message as published on the public broker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawMessage {
    pub sensor_id: String,
    pub secret: String,
    pub data: String,
}

/// A validated device message.
///
/// Structurally identical to a measurement for authorization purposes; the
/// payload itself is opaque to the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sensor_id: ObjectId,
    pub secret: String,
    pub data: String,
}
