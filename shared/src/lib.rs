// ============================================================================
// Sensorgate Shared - Core authorization pipeline
// ============================================================================
//
// The heart of the gateway: the metadata cache, the per-shard consumers,
// the payload validator, the repositories, and the orchestrating message
// service. The MQTT transport and the process entry point live outside this
// crate and talk to it through the `MessagePublisher` and repository traits.
//
// ============================================================================

pub mod cache;
pub mod consumers;
pub mod mqtt;
pub mod proto;
pub mod repositories;
pub mod services;
pub mod validator;
