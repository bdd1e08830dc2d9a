//! Directory snapshot returned to the public site.

use serde::{Deserialize, Serialize};

use super::{CategoryBucket, Location};

/// All six location buckets as currently held by the location store.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Directory {
    pub revision_id: i64,
    pub generated_at: String,
    pub buckets: Vec<DirectoryBucket>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryBucket {
    pub bucket: CategoryBucket,
    pub label: &'static str,
    pub locations: Vec<Location>,
}

/// Revision information for change detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionInfo {
    pub revision_id: i64,
    pub generated_at: String,
}
