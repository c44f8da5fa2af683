//! Index store trait for persistence abstraction
//!
//! Decouples the sync logic from database implementation details and keeps
//! transaction boundaries out of the orchestrator.

use git2::Oid;
use rustc_hash::FxHashSet;

use crate::error::IndexError;

use super::types::CommitBatch;

/// Persistence layer for the object index and the head frontier.
#[allow(async_fn_in_trait)]
pub trait IndexStore {
    /// Branch tips already fully indexed for this repository.
    async fn select_frontier(&self, repo: i64) -> Result<FxHashSet<Oid>, IndexError>;

    /// Replace the stored frontier wholesale with the current heads.
    async fn replace_frontier(&self, repo: i64, heads: &FxHashSet<Oid>) -> Result<(), IndexError>;

    /// Apply one commit's writes atomically.
    ///
    /// Returns the number of object rows actually inserted; upsert rewrites
    /// and ignored duplicates do not count.
    async fn apply_commit(&self, repo: i64, batch: &CommitBatch) -> Result<u64, IndexError>;

    /// The commit most recently recorded as producing `oid`.
    async fn latest_commit_for(&self, repo: i64, oid: Oid) -> Result<Option<Oid>, IndexError>;

    /// Old-side objects recorded as predecessors of `oid`.
    async fn predecessors_of(&self, repo: i64, oid: Oid) -> Result<Vec<Oid>, IndexError>;
}
