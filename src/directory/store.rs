//! Location store: the six location buckets shared by every request.
//!
//! Buckets are only ever replaced wholesale from a fresh gateway read; there
//! is no incremental patching.

use tokio::sync::RwLock;

use crate::db::Repository;
use crate::errors::AppError;
use crate::models::{CategoryBucket, Location};

/// One location list per bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Buckets {
    slots: [Vec<Location>; 6],
}

impl Buckets {
    fn slot(bucket: CategoryBucket) -> usize {
        match bucket {
            CategoryBucket::Academic => 0,
            CategoryBucket::Library => 1,
            CategoryBucket::Dining => 2,
            CategoryBucket::Sports => 3,
            CategoryBucket::StudentCenter => 4,
            CategoryBucket::Health => 5,
        }
    }

    pub fn get(&self, bucket: CategoryBucket) -> &[Location] {
        &self.slots[Self::slot(bucket)]
    }

    pub fn set(&mut self, bucket: CategoryBucket, locations: Vec<Location>) {
        self.slots[Self::slot(bucket)] = locations;
    }

    /// Buckets in search order.
    pub fn iter(&self) -> impl Iterator<Item = (CategoryBucket, &[Location])> + '_ {
        CategoryBucket::SEARCH_ORDER
            .into_iter()
            .map(move |bucket| (bucket, self.get(bucket)))
    }

    pub fn total(&self) -> usize {
        self.slots.iter().map(Vec::len).sum()
    }
}

#[derive(Default)]
struct StoreState {
    buckets: Buckets,
    disposed: bool,
}

/// Process-wide location state with an explicit init/dispose lifecycle.
#[derive(Default)]
pub struct LocationStore {
    state: RwLock<StoreState>,
}

impl LocationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Populate every bucket from the gateway. Nothing is replaced unless all
    /// six reads succeed.
    pub async fn init(&self, repo: &Repository) -> Result<(), AppError> {
        let mut fresh = Buckets::default();
        for bucket in CategoryBucket::SEARCH_ORDER {
            fresh.set(bucket, repo.list_locations(Some(bucket)).await?);
        }

        let mut state = self.state.write().await;
        if state.disposed {
            return Ok(());
        }
        tracing::info!("Location store initialised with {} locations", fresh.total());
        state.buckets = fresh;
        Ok(())
    }

    /// Re-fetch one bucket and replace it. On failure the bucket keeps its
    /// last-known-good contents.
    pub async fn refresh(&self, repo: &Repository, bucket: CategoryBucket) -> Result<(), AppError> {
        let locations = repo.list_locations(Some(bucket)).await?;
        self.replace(bucket, locations).await;
        Ok(())
    }

    /// Replace one bucket wholesale. Ignored once the store is disposed.
    pub async fn replace(&self, bucket: CategoryBucket, locations: Vec<Location>) {
        let mut state = self.state.write().await;
        if state.disposed {
            tracing::debug!(bucket = %bucket, "Ignoring bucket update after dispose");
            return;
        }
        state.buckets.set(bucket, locations);
    }

    pub async fn bucket(&self, bucket: CategoryBucket) -> Vec<Location> {
        self.state.read().await.buckets.get(bucket).to_vec()
    }

    pub async fn snapshot(&self) -> Buckets {
        self.state.read().await.buckets.clone()
    }

    /// Drop all buckets and refuse further updates.
    pub async fn dispose(&self) {
        let mut state = self.state.write().await;
        state.buckets = Buckets::default();
        state.disposed = true;
    }
}
