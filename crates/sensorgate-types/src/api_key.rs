use serde::{Deserialize, Serialize};

/// A sensor API key.
///
/// `read_only` is carried from the relational row for completeness; only
/// `revoked` affects authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub revoked: bool,
    pub read_only: bool,
}

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            revoked: false,
            read_only: false,
        }
    }
}
