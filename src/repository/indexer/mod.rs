//! Incremental history indexer
//!
//! Walks only the commits that appeared since the last pass and registers
//! every changed object, and the directory objects above it, under the
//! visiting commit.
//!
//! # Architecture
//!
//! The indexer is organized into layers:
//!
//! - **types**: layer contract (RawChange, Change, CommitBatch, ...)
//! - **changes**: merge reconciliation and the write staging policy
//! - **trees**: ancestor directory registration
//! - **progress**: progress reporting abstraction
//! - **store**: persistence layer trait
//! - **db_store**: database implementation of IndexStore

mod changes;
mod db_store;
mod progress;
mod store;
mod trees;
mod types;

pub use progress::{
    IndicatifProgress, NoopProgress, ProgressHandle, ProgressReporter, VerboseProgress,
};
pub use store::IndexStore;
pub use types::{Change, ChangeKind, ChangeSide, CommitBatch, ObjectRow, RawChange, WalkedCommit};

use crate::error::IndexError;
use crate::model::{RepoEntry, SyncOutcome};
use crate::repository::{Database, GitStore};

/// Drives one incremental synchronization pass per repository.
pub struct Indexer {
    verbose: bool,
}

impl Indexer {
    pub fn new() -> Self {
        Self { verbose: true }
    }

    /// Create a quiet indexer (no logging output, used by tests and benches)
    pub fn quiet() -> Self {
        Self { verbose: false }
    }

    /// Resolve `name` through the registry, then run a sync pass.
    pub async fn sync_by_name(&self, db: &Database, name: &str) -> Result<SyncOutcome, IndexError> {
        let repo = db
            .find_repository(name)
            .await?
            .ok_or_else(|| IndexError::RepositoryNotFound(name.to_string()))?;
        self.sync(db, &repo).await
    }

    /// Run one sync pass: walk the commits reachable from the current branch
    /// heads but not from the stored frontier, index their changes, then
    /// advance the frontier.
    pub async fn sync(
        &self,
        store: &impl IndexStore,
        repo: &RepoEntry,
    ) -> Result<SyncOutcome, IndexError> {
        let git = GitStore::open(&repo.path)?;
        let frontier = store.select_frontier(repo.id).await?;
        let heads = git.branch_heads()?;

        self.log(&format!("Synchronizing repository data for repository {}", repo.name));

        let progress = VerboseProgress::new(self.verbose);
        let pb = progress.start("Synchronizing");

        let mut outcome = SyncOutcome::default();
        for walked in git.walk(&heads, &frontier)? {
            let walked = walked?;
            let mut batch = CommitBatch::new(walked.id);

            for change in changes::group_changes(&walked.parent_changes) {
                changes::stage_change(&change, &mut batch);
                if let Some(new) = &change.new {
                    trees::register_ancestors(&git, walked.tree, &new.path, &mut batch)?;
                }
            }

            outcome.objects_registered += store.apply_commit(repo.id, &batch).await?;
            outcome.commits_processed += 1;
            pb.inc(1);
        }
        pb.finish();

        // The frontier only moves once every new commit is indexed; an
        // interrupted pass leaves it in place and the next pass re-walks
        // the same range through the idempotent writes above.
        store.replace_frontier(repo.id, &heads).await?;

        self.log(&format!(
            "Synchronized {} commits with {} objects",
            outcome.commits_processed, outcome.objects_registered
        ));

        Ok(outcome)
    }

    fn log(&self, msg: &str) {
        if self.verbose {
            eprintln!("{}", msg);
        }
    }
}

impl Default for Indexer {
    fn default() -> Self {
        Self::new()
    }
}
