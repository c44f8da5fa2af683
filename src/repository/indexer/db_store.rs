//! Database implementation of IndexStore

use git2::Oid;
use rustc_hash::FxHashSet;
use std::borrow::Cow;

use crate::error::IndexError;
use crate::repository::{Database, ObjectRecord};

use super::store::IndexStore;
use super::types::{CommitBatch, ObjectRow};

impl IndexStore for Database {
    async fn select_frontier(&self, repo: i64) -> Result<FxHashSet<Oid>, IndexError> {
        let heads = Database::load_frontier(self, repo).await?;
        Ok(heads.iter().filter_map(|h| Oid::from_bytes(h).ok()).collect())
    }

    async fn replace_frontier(&self, repo: i64, heads: &FxHashSet<Oid>) -> Result<(), IndexError> {
        let heads: Vec<[u8; 20]> = heads.iter().map(|oid| oid_bytes(*oid)).collect();
        Database::replace_frontier(self, repo, &heads).await?;
        Ok(())
    }

    async fn apply_commit(&self, repo: i64, batch: &CommitBatch) -> Result<u64, IndexError> {
        let commit = oid_bytes(batch.commit);
        let upserts: Vec<ObjectRecord<'_>> = batch.upserts.iter().map(record).collect();
        let inserts: Vec<ObjectRecord<'_>> = batch.inserts.iter().map(record).collect();
        let links: Vec<([u8; 20], [u8; 20])> = batch
            .parent_links
            .iter()
            .map(|(oid, parent)| (oid_bytes(*oid), oid_bytes(*parent)))
            .collect();

        let inserted =
            Database::apply_commit(self, repo, &commit, &upserts, &inserts, &links).await?;
        Ok(inserted)
    }

    async fn latest_commit_for(&self, repo: i64, oid: Oid) -> Result<Option<Oid>, IndexError> {
        let commit = Database::latest_commit_for(self, repo, oid.as_bytes()).await?;
        Ok(commit.and_then(|c| Oid::from_bytes(&c).ok()))
    }

    async fn predecessors_of(&self, repo: i64, oid: Oid) -> Result<Vec<Oid>, IndexError> {
        let parents = Database::predecessors_of(self, repo, oid.as_bytes()).await?;
        Ok(parents.iter().filter_map(|p| Oid::from_bytes(p).ok()).collect())
    }
}

fn record(row: &ObjectRow) -> ObjectRecord<'_> {
    ObjectRecord::new(oid_bytes(row.oid), Cow::Borrowed(row.path.as_str()), row.mode)
}

fn oid_bytes(oid: Oid) -> [u8; 20] {
    oid.as_bytes().try_into().unwrap()
}
