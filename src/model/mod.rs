//! Domain types shared across the crate.

use serde::Serialize;

/// A repository known to the registry.
#[derive(Debug, Clone)]
pub struct RepoEntry {
    pub id: i64,
    pub name: String,
    pub path: String,
    /// Unix timestamp of the last completed sync, if any.
    pub last_sync_at: Option<i64>,
}

/// Counters reported by a sync pass.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SyncOutcome {
    pub commits_processed: u64,
    pub objects_registered: u64,
}
