//! Notification center: the shared notification list and its read state.
//!
//! Fetches are tagged with a generation number. A fetch only applies if no
//! newer fetch or delete has landed since it started, so responses that
//! arrive out of order never overwrite fresher state.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use super::local_store::{LocalStore, READ_NOTIFICATIONS_KEY};
use super::reconcile::{reconcile, unread_count};
use crate::db::{Repository, SENTINEL_ID};
use crate::errors::AppError;
use crate::models::{CreateNotificationRequest, Notification, NotificationFeed, RawNotification};

#[derive(Default)]
struct CenterState {
    notifications: Vec<Notification>,
    unread_count: usize,
    applied_generation: u64,
}

impl CenterState {
    fn view(&self) -> NotificationFeed {
        NotificationFeed {
            notifications: self.notifications.clone(),
            unread_count: self.unread_count,
        }
    }

    fn recount(&mut self) {
        self.unread_count = unread_count(&self.notifications);
    }
}

pub struct NotificationCenter {
    repo: Arc<Repository>,
    local: LocalStore,
    state: Mutex<CenterState>,
    next_generation: AtomicU64,
    disposed: AtomicBool,
}

impl NotificationCenter {
    pub fn new(repo: Arc<Repository>, local: LocalStore) -> Self {
        Self {
            repo,
            local,
            state: Mutex::new(CenterState::default()),
            next_generation: AtomicU64::new(0),
            disposed: AtomicBool::new(false),
        }
    }

    /// Re-read every notification from the gateway and reconcile it with the
    /// local read set. On failure the previous list stays in place.
    pub async fn fetch_all(&self) -> Result<NotificationFeed, AppError> {
        if self.is_disposed() {
            return Ok(self.view().await);
        }

        let generation = self.begin();
        let fetched = self.repo.list_notifications().await?;
        self.apply(generation, &fetched).await?;
        Ok(self.view().await)
    }

    pub async fn view(&self) -> NotificationFeed {
        self.state.lock().await.view()
    }

    /// Mark one notification read. Unknown ids and already-read ids are
    /// no-ops; nothing is persisted for them.
    pub async fn mark_read(&self, id: &str) -> Result<NotificationFeed, AppError> {
        let mut state = self.state.lock().await;

        let Some(idx) = state.notifications.iter().position(|n| n.id == id) else {
            tracing::debug!(id, "mark_read for notification not in the current list");
            return Ok(state.view());
        };
        if state.notifications[idx].read {
            return Ok(state.view());
        }

        self.local
            .update(READ_NOTIFICATIONS_KEY, |ids: &mut Vec<String>| {
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            })
            .await?;

        state.notifications[idx].read = true;
        state.recount();
        Ok(state.view())
    }

    /// Mark every listed notification read.
    pub async fn mark_all_read(&self) -> Result<NotificationFeed, AppError> {
        let mut state = self.state.lock().await;
        if state.notifications.is_empty() {
            return Ok(state.view());
        }

        let listed: Vec<String> = state.notifications.iter().map(|n| n.id.clone()).collect();
        self.local
            .update(READ_NOTIFICATIONS_KEY, |ids: &mut Vec<String>| {
                for id in listed {
                    if !ids.contains(&id) {
                        ids.push(id);
                    }
                }
            })
            .await?;

        for notification in state.notifications.iter_mut() {
            notification.read = true;
        }
        state.unread_count = 0;
        Ok(state.view())
    }

    /// Delete every notification on the gateway and forget the read set.
    pub async fn delete_all(&self, confirmed: bool) -> Result<NotificationFeed, AppError> {
        if !confirmed {
            return Err(AppError::ConfirmationRequired(
                "Deleting all notifications requires confirmation".to_string(),
            ));
        }

        let removed = self.repo.delete_notifications_except(SENTINEL_ID).await?;
        tracing::info!("Deleted {} notifications", removed);

        let generation = self.begin();
        let mut state = self.state.lock().await;
        state.applied_generation = state.applied_generation.max(generation);
        state.notifications.clear();
        state.unread_count = 0;
        self.local.remove(READ_NOTIFICATIONS_KEY).await?;
        Ok(state.view())
    }

    /// Delete exactly `ids`. An empty selection does nothing and needs no
    /// confirmation.
    pub async fn delete_selected(
        &self,
        ids: &[String],
        confirmed: bool,
    ) -> Result<NotificationFeed, AppError> {
        if ids.is_empty() {
            return Ok(self.view().await);
        }
        if !confirmed {
            return Err(AppError::ConfirmationRequired(format!(
                "Deleting {} notification(s) requires confirmation",
                ids.len()
            )));
        }

        let removed = self.repo.delete_notifications(ids).await?;
        tracing::info!("Deleted {} of {} selected notifications", removed, ids.len());

        let generation = self.begin();
        let mut state = self.state.lock().await;
        state.applied_generation = state.applied_generation.max(generation);
        state.notifications.retain(|n| !ids.contains(&n.id));
        state.recount();
        self.local
            .update(READ_NOTIFICATIONS_KEY, |read: &mut Vec<String>| {
                read.retain(|id| !ids.contains(id))
            })
            .await?;
        Ok(state.view())
    }

    /// Insert a notification, propagating gateway failures.
    pub async fn create(
        &self,
        request: &CreateNotificationRequest,
    ) -> Result<RawNotification, AppError> {
        self.repo.create_notification(request, Utc::now()).await
    }

    /// Best-effort insert used by write flows. Failures are logged and
    /// swallowed so they never fail the write that triggered them.
    pub async fn notify(&self, request: CreateNotificationRequest) {
        match self.create(&request).await {
            Ok(created) => tracing::debug!(id = %created.id, "Notification created: {}", created.title),
            Err(e) => tracing::warn!("Failed to create notification {:?}: {}", request.title, e),
        }
    }

    /// Stop applying fetch results. Later fetches leave state untouched.
    pub fn dispose(&self) {
        self.disposed.store(true, Ordering::SeqCst);
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }

    fn begin(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Apply a fetch started at `generation`. Returns false if the result was
    /// discarded as stale or arrived after dispose.
    async fn apply(&self, generation: u64, fetched: &[RawNotification]) -> Result<bool, AppError> {
        let mut state = self.state.lock().await;

        if self.is_disposed() {
            tracing::debug!(generation, "Dropping notification fetch after dispose");
            return Ok(false);
        }
        if generation < state.applied_generation {
            tracing::debug!(
                generation,
                applied = state.applied_generation,
                "Discarding stale notification fetch"
            );
            return Ok(false);
        }

        // Read under the state lock so concurrent mark operations are seen
        let read_ids: HashSet<String> = self.local.read_ids().await?.into_iter().collect();
        state.notifications = reconcile(fetched, &read_ids, Utc::now());
        state.recount();
        state.applied_generation = generation;
        Ok(true)
    }
}
