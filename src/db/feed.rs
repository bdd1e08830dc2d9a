//! In-process change feed.
//!
//! Subscribers only learn that a table changed; they re-fetch to see what.

use tokio::sync::broadcast;

/// Table names announced on the change feed.
pub mod tables {
    pub const LOCATIONS: &str = "locations";
    pub const NOTIFICATIONS: &str = "notifications";
    pub const PHARMACIES: &str = "pharmacies";
    pub const MEDICINES: &str = "medicines";
    pub const PHARMACY_STOCK: &str = "pharmacy_stock";
    pub const USERS: &str = "users";
    pub const ACTIVITY_LOGS: &str = "activity_logs";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: &'static str,
    pub kind: ChangeKind,
    pub revision_id: i64,
}

#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<ChangeEvent>,
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        Self {
            tx: broadcast::channel(capacity).0,
        }
    }

    pub fn publish(&self, event: ChangeEvent) {
        if self.tx.receiver_count() > 0 {
            self.tx.send(event).ok();
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }
}

impl Default for ChangeFeed {
    fn default() -> Self {
        Self::new(64)
    }
}
