// ============================================================================
// Sensorgate Types - Shared domain models
// ============================================================================
//
// Domain models used across the Sensorgate services: sensor and account
// identities, telemetry payloads, and control-channel commands.
//
// ============================================================================

mod api_key;
mod command;
mod measurement;
mod message;
mod object_id;
mod sensor;
mod user;

pub use api_key::ApiKey;
pub use command::{Command, CommandError};
pub use measurement::{DataPoint, Measurement, RawDataPoint, RawMeasurement};
pub use message::{Message, RawMessage};
pub use object_id::{ObjectId, ObjectIdError};
pub use sensor::Sensor;
pub use user::User;
