//! Background refresh of the notification center.
//!
//! Refreshes on a fixed interval and whenever the change feed announces a
//! write to the notifications table.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, oneshot};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::NotificationCenter;
use crate::db::{tables, ChangeEvent, ChangeFeed};

pub struct PollerHandle {
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
    center: Arc<NotificationCenter>,
}

impl PollerHandle {
    /// Cancel the timer and the feed subscription, then dispose the center so
    /// an in-flight fetch cannot land afterwards.
    pub async fn shutdown(self) {
        self.center.dispose();
        self.shutdown_tx.send(()).ok();
        if let Err(e) = self.task.await {
            tracing::warn!("Notification poller ended abnormally: {}", e);
        }
    }
}

pub fn spawn_poller(
    center: Arc<NotificationCenter>,
    feed: &ChangeFeed,
    period: Duration,
) -> PollerHandle {
    let mut changes = Some(feed.subscribe());
    let (shutdown_tx, mut shutdown_rx) = oneshot::channel();
    let task_center = center.clone();

    let task = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown_rx => break,
                _ = ticker.tick() => refresh(&task_center, "interval").await,
                event = next_change(&mut changes) => match event {
                    Ok(event) if event.table == tables::NOTIFICATIONS => {
                        tracing::debug!(
                            kind = ?event.kind,
                            revision = event.revision_id,
                            "Notifications changed"
                        );
                        refresh(&task_center, "change feed").await
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!("Notification poller lagged {} change events", skipped);
                        refresh(&task_center, "lagged").await
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::warn!("Change feed closed; polling on interval only");
                        changes = None;
                    }
                },
            }
        }

        tracing::debug!("Notification poller stopped");
    });

    PollerHandle {
        shutdown_tx,
        task,
        center,
    }
}

async fn next_change(
    changes: &mut Option<broadcast::Receiver<ChangeEvent>>,
) -> Result<ChangeEvent, broadcast::error::RecvError> {
    match changes {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

async fn refresh(center: &NotificationCenter, trigger: &str) {
    if let Err(e) = center.fetch_all().await {
        tracing::warn!(trigger, "Notification refresh failed: {}", e);
    }
}
