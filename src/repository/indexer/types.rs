//! Domain types for history indexing
//!
//! These types form the data contract between the walker, the change
//! extractor, and the index store.

use git2::Oid;

/// Kind of a per-path transition between two tree states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Add,
    Modify,
    Delete,
    Rename,
    Copy,
}

/// One side of a change: an object observed at a path with a file mode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSide {
    pub oid: Oid,
    pub path: String,
    pub mode: i64,
}

/// A single parent-relative change as reported by the object diff.
///
/// `old` is absent for additions, `new` for deletions.
#[derive(Debug, Clone)]
pub struct RawChange {
    pub kind: ChangeKind,
    pub old: Option<ChangeSide>,
    pub new: Option<ChangeSide>,
}

/// A canonical change: every parent-relative variant for one path,
/// collapsed into one new side plus the distinct old-side objects.
#[derive(Debug, Clone)]
pub struct Change {
    pub kind: ChangeKind,
    /// Absent when every variant is a delete.
    pub new: Option<ChangeSide>,
    pub olds: Vec<ChangeSide>,
}

/// A commit yielded by the walker, with one raw change list per parent.
///
/// A root commit carries a single list diffed against the empty tree.
#[derive(Debug)]
pub struct WalkedCommit {
    pub id: Oid,
    pub tree: Oid,
    pub parent_changes: Vec<Vec<RawChange>>,
}

/// An object row destined for the index.
#[derive(Debug, Clone)]
pub struct ObjectRow {
    pub oid: Oid,
    pub path: String,
    pub mode: i64,
}

/// Every index write for one commit, applied in a single transaction.
#[derive(Debug)]
pub struct CommitBatch {
    pub commit: Oid,
    /// New-side rows: rewrite `commit_oid` when the object is known,
    /// insert otherwise.
    pub upserts: Vec<ObjectRow>,
    /// Historical and directory rows: inserted only when absent.
    pub inserts: Vec<ObjectRow>,
    /// Predecessor links `(object, old-side object)`.
    pub parent_links: Vec<(Oid, Oid)>,
}

impl CommitBatch {
    pub fn new(commit: Oid) -> Self {
        Self {
            commit,
            upserts: Vec::new(),
            inserts: Vec::new(),
            parent_links: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.inserts.is_empty() && self.parent_links.is_empty()
    }
}
