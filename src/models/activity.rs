//! Append-only audit trail of admin writes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityLog {
    pub id: String,
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: serde_json::Value,
    pub created_at: String,
}

/// An audit entry about to be written.
#[derive(Debug, Clone)]
pub struct NewActivity {
    pub action_type: String,
    pub entity_type: String,
    pub entity_id: String,
    pub details: serde_json::Value,
}

impl NewActivity {
    pub fn new(
        action_type: impl Into<String>,
        entity_type: impl Into<String>,
        entity_id: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            action_type: action_type.into(),
            entity_type: entity_type.into(),
            entity_id: entity_id.into(),
            details,
        }
    }
}
