use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A platform account owning one or more sensors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub banned: bool,
    pub billing_lockout: bool,
}

impl User {
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            banned: false,
            billing_lockout: false,
        }
    }

    /// A disabled account disqualifies every sensor it owns.
    pub fn is_disabled(&self) -> bool {
        self.banned || self.billing_lockout
    }
}
