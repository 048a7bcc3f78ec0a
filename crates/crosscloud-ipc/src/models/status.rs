//! Sync status of paths as reported by the core.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;
use tracing::debug;

/// Overlay state of a single path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStatus {
    Syncing,
    Synced,
    /// Not applicable: outside the sync root, unknown, or the core failed.
    #[default]
    Ignore,
}

impl SyncStatus {
    /// Map a status string from the core. Only exact matches are recognized.
    pub fn from_status_str(s: &str) -> Self {
        match s {
            "Syncing" => SyncStatus::Syncing,
            "Synced" => SyncStatus::Synced,
            _ => SyncStatus::Ignore,
        }
    }

    /// Map a raw RPC result; anything but a recognized string is `Ignore`.
    pub fn from_result(value: &Value) -> Self {
        value
            .as_str()
            .map(Self::from_status_str)
            .unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SyncStatus::Syncing => "Syncing",
            SyncStatus::Synced => "Synced",
            SyncStatus::Ignore => "Ignore",
        }
    }
}

impl std::fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A status change pushed through `get_status_updates`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathUpdate {
    pub path: PathBuf,
    pub status: SyncStatus,
}

/// Parse a `get_status_updates` result.
///
/// Entries without a string `path` and `status` are skipped.
pub fn parse_status_updates(value: &Value) -> Vec<PathUpdate> {
    let Some(entries) = value.as_array() else {
        return Vec::new();
    };

    entries
        .iter()
        .filter_map(|entry| {
            let path = entry.get("path").and_then(Value::as_str);
            let status = entry.get("status").and_then(Value::as_str);
            match (path, status) {
                (Some(path), Some(status)) => Some(PathUpdate {
                    path: PathBuf::from(path),
                    status: SyncStatus::from_status_str(status),
                }),
                _ => {
                    debug!("skipped malformed status update: {}", entry);
                    None
                }
            }
        })
        .collect()
}
