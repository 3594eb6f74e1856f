use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::object_id::{ObjectId, ObjectIdError};

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("malformed command payload: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("invalid sensor id: {0}")]
    SensorId(#[from] ObjectIdError),

    #[error("invalid user id: {0}")]
    UserId(#[from] uuid::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum CommandKind {
    FlushSensor,
    FlushUser,
    FlushKey,
    AddSensor,
    AddUser,
    AddKey,
}

#[derive(Debug, Deserialize)]
struct RawCommand {
    kind: CommandKind,
    id: String,
}

/// A cache-invalidation command received on the control channel.
///
/// Wire form: `{ "kind": "<snake_case kind>", "id": "<identifier>" }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    FlushSensor(ObjectId),
    FlushUser(Uuid),
    FlushKey(String),
    AddSensor(ObjectId),
    AddUser(Uuid),
    AddKey(String),
}

impl Command {
    pub fn parse(raw: &str) -> Result<Self, CommandError> {
        let raw: RawCommand = serde_json::from_str(raw)?;

        Ok(match raw.kind {
            CommandKind::FlushSensor => Command::FlushSensor(ObjectId::parse(&raw.id)?),
            CommandKind::FlushUser => Command::FlushUser(Uuid::parse_str(&raw.id)?),
            CommandKind::FlushKey => Command::FlushKey(raw.id),
            CommandKind::AddSensor => Command::AddSensor(ObjectId::parse(&raw.id)?),
            CommandKind::AddUser => Command::AddUser(Uuid::parse_str(&raw.id)?),
            CommandKind::AddKey => Command::AddKey(raw.id),
        })
    }
}
