use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

/// Application error type for the authorization gateway.
///
/// Repository and pool failures travel as `anyhow::Error` through the
/// `Unknown` variant; the named variants cover the gateway's own failure
/// modes.
#[derive(Error, Debug)]
pub enum AppError {
    // ===== Transport Errors =====
    #[error("MQTT error: {0}")]
    Mqtt(String),

    // ===== Serialization Errors =====
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("UUID parse error: {0}")]
    Uuid(#[from] uuid::Error),

    // ===== Validation Errors =====
    #[error("validation error: {0}")]
    Validation(String),

    // ===== Configuration Errors =====
    #[error("configuration error: {0}")]
    Config(String),

    // ===== IO Errors =====
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ===== Internal Errors =====
    #[error("internal error: {0}")]
    Internal(String),

    // ===== Unknown/Generic Errors =====
    #[error("unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

// ============================================================================
// Helper functions for creating common errors
// ============================================================================

impl AppError {
    /// Create an MQTT transport error
    pub fn mqtt(msg: impl Into<String>) -> Self {
        AppError::Mqtt(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}
