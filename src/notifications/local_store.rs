//! Installation-local key/value state, kept as one JSON document on disk.
//!
//! Nothing in here is visible to the gateway. The read-notification set
//! lives under [`READ_NOTIFICATIONS_KEY`] as a JSON array of ids.

use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tokio::sync::Mutex;

use crate::errors::AppError;

pub const READ_NOTIFICATIONS_KEY: &str = "readNotifications";

pub struct LocalStore {
    path: PathBuf,
    // Serializes read-modify-write cycles on the document
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Value stored under `key`, or `None` if the file or key is missing.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, AppError> {
        let document = self.load().await?;
        match document.get(key) {
            Some(value) => Ok(Some(decode(key, value.clone())?)),
            None => Ok(None),
        }
    }

    pub async fn remove(&self, key: &str) -> Result<(), AppError> {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        if document.remove(key).is_some() {
            self.store(&document).await?;
        }
        Ok(())
    }

    /// Apply `f` to the value under `key` (default when absent) and persist
    /// the result, all under the write lock.
    pub async fn update<T, F>(&self, key: &str, f: F) -> Result<T, AppError>
    where
        T: Serialize + DeserializeOwned + Default,
        F: FnOnce(&mut T),
    {
        let _guard = self.write_lock.lock().await;
        let mut document = self.load().await?;
        let mut value: T = match document.get(key) {
            Some(existing) => decode(key, existing.clone())?,
            None => T::default(),
        };
        f(&mut value);
        document.insert(key.to_string(), serde_json::to_value(&value)?);
        self.store(&document).await?;
        Ok(value)
    }

    /// The persisted read-notification ids.
    pub async fn read_ids(&self) -> Result<Vec<String>, AppError> {
        Ok(self
            .get::<Vec<String>>(READ_NOTIFICATIONS_KEY)
            .await?
            .unwrap_or_default())
    }

    async fn load(&self) -> Result<Map<String, Value>, AppError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Map::new());
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::LocalState(format!(
                "Local state file {} is corrupt: {}",
                self.path.display(),
                e
            ))
        })
    }

    async fn store(&self, document: &Map<String, Value>) -> Result<(), AppError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let bytes = serde_json::to_vec_pretty(document)?;
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, bytes).await?;
        tokio::fs::rename(&tmp_path, &self.path).await?;
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(key: &str, value: Value) -> Result<T, AppError> {
    serde_json::from_value(value)
        .map_err(|e| AppError::LocalState(format!("Local state key {:?} is malformed: {}", key, e)))
}
