//! Merging fetched notification rows with the local read set.

use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::models::{Notification, RawNotification};

/// Relative age of a notification: "just now", then whole minutes, hours
/// and days, always rounded down.
pub fn humanize(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds();

    if seconds < 60 {
        "just now".to_string()
    } else if seconds < 3_600 {
        format!("{} minutes ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{} hours ago", seconds / 3_600)
    } else {
        format!("{} days ago", seconds / 86_400)
    }
}

/// Attach `read` and `time` to each fetched row. Order is preserved.
pub fn reconcile(
    fetched: &[RawNotification],
    read_ids: &HashSet<String>,
    now: DateTime<Utc>,
) -> Vec<Notification> {
    fetched
        .iter()
        .map(|raw| Notification {
            id: raw.id.clone(),
            title: raw.title.clone(),
            message: raw.message.clone(),
            kind: raw.kind,
            created_at: raw.created_at,
            pharmacy_id: raw.pharmacy_id.clone(),
            read: read_ids.contains(&raw.id),
            time: humanize(now - raw.created_at),
        })
        .collect()
}

pub fn unread_count(notifications: &[Notification]) -> usize {
    notifications.iter().filter(|n| !n.read).count()
}
