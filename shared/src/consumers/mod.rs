// ============================================================================
// Per-Shard Consumers
// ============================================================================
//
// Each worker owns one measurement consumer and one message consumer. A
// consumer buffers raw/parsed payload pairs for its shard, and on every tick
// drains the buffer, authorizes the batch against the metadata cache, and
// publishes the survivors in bulk to the internal broker.
//
// ============================================================================

mod command;
mod measurement;
mod message;
pub(crate) mod secret;
mod shard;

pub use command::CommandConsumer;
pub use measurement::MeasurementConsumer;
pub use message::MessageConsumer;
pub use secret::wrap_digest;

use sensorgate_types::{Measurement, Message};

/// Raw payload as received on the wire, paired with its parsed model. The
/// raw form is kept because mode-B authorization hashes the payload bytes
/// as sent.
pub type MeasurementPair = (String, Measurement);
pub type MessagePair = (String, Message);
