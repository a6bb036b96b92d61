//! Time-boxed snapshot of upstream versions
//!
//! release-monitoring.org is by far the slowest source, so its results are
//! kept in a JSON snapshot and reused while younger than the configured
//! interval. This is the only persistence in the tool.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::source::upstream::UpstreamSummary;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    #[serde(rename = "time-retrieved")]
    time_retrieved: i64,
    packages: BTreeMap<String, UpstreamSummary>,
}

/// Snapshot file with an age limit.
pub struct UpstreamCache {
    path: PathBuf,
    max_age_secs: i64,
}

impl UpstreamCache {
    pub fn new(path: PathBuf, max_age_secs: i64) -> Self {
        Self { path, max_age_secs }
    }

    /// Cached upstream summaries, provided the snapshot exists, parses and
    /// is younger than the age limit. A damaged snapshot is treated the
    /// same as a missing one.
    pub fn load_fresh(&self) -> Option<BTreeMap<String, UpstreamSummary>> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(err) => {
                debug!("no usable snapshot at {:?}: {err}", self.path);
                return None;
            }
        };

        let snapshot: Snapshot = match serde_json::from_str(&content) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!("discarding damaged snapshot {:?}: {err}", self.path);
                return None;
            }
        };

        let age = Utc::now().timestamp() - snapshot.time_retrieved;
        if age > self.max_age_secs {
            debug!("snapshot is {age}s old, limit is {}s", self.max_age_secs);
            return None;
        }

        info!("reusing upstream snapshot from {:?}", self.path);
        Some(snapshot.packages)
    }

    pub fn store(&self, packages: &BTreeMap<String, UpstreamSummary>) -> Result<(), CacheError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let snapshot = Snapshot {
            time_retrieved: Utc::now().timestamp(),
            packages: packages.clone(),
        };
        let mut content = serde_json::to_string_pretty(&snapshot)?;
        content.push('\n');
        std::fs::write(&self.path, content)?;

        debug!("wrote upstream snapshot to {:?}", self.path);
        Ok(())
    }
}
