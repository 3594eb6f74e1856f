// ============================================================================
// Logging Configuration
// ============================================================================

use crate::env_or;

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    /// Filter directive for the tracing subscriber, e.g. "info" or
    /// "sensorgate_shared=debug,info".
    pub level: String,
    /// Optional log file; when set, output is mirrored to this path in
    /// addition to stdout.
    pub file: Option<String>,
}

impl LoggingConfig {
    pub(crate) fn from_env() -> Self {
        Self {
            level: env_or("LOG_LEVEL", "info"),
            file: std::env::var("LOG_FILE").ok(),
        }
    }
}
