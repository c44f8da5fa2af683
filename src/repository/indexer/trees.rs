//! Ancestor directory registration
//!
//! Every changed path pulls the directory objects above it into the index,
//! resolved against the visiting commit's root tree.

use git2::Oid;

use crate::repository::GitStore;
use crate::util::dir_prefixes;

use super::types::{CommitBatch, ObjectRow};

/// Stage a best-effort registration for each ancestor directory of
/// `changed_path`, shallowest first.
///
/// A prefix missing from this snapshot (possible while merge parent views
/// disagree) stops the deeper prefixes for this path, non-fatally.
pub fn register_ancestors(
    git: &GitStore,
    root_tree: Oid,
    changed_path: &str,
    batch: &mut CommitBatch,
) -> Result<(), git2::Error> {
    for prefix in dir_prefixes(changed_path) {
        match git.lookup_path(root_tree, prefix)? {
            Some((mode, oid)) => batch.inserts.push(ObjectRow {
                oid,
                path: prefix.to_string(),
                mode,
            }),
            None => break,
        }
    }
    Ok(())
}
