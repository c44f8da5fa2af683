//! Git object store adapter
//!
//! Wraps libgit2 behind the narrow interface the indexer needs: branch head
//! resolution, a bounded lazy commit walker with per-parent change lists,
//! and tree path lookup.

use git2::{
    Delta, DiffFindOptions, ErrorCode, Oid, Repository, Revwalk, Sort, Tree,
};
use rustc_hash::FxHashSet;
use std::path::Path;

use super::indexer::{ChangeKind, ChangeSide, RawChange, WalkedCommit};

pub struct GitStore {
    repo: Repository,
}

impl GitStore {
    pub fn open(path: &str) -> Result<Self, git2::Error> {
        Ok(Self { repo: Repository::open(path)? })
    }

    /// Tip commits of every local branch (the `refs/heads` namespace).
    pub fn branch_heads(&self) -> Result<FxHashSet<Oid>, git2::Error> {
        let mut heads = FxHashSet::default();
        for reference in self.repo.references_glob("refs/heads/*")? {
            let reference = reference?;
            heads.insert(reference.peel_to_commit()?.id());
        }
        Ok(heads)
    }

    /// Walk every commit reachable from `include` but not from `exclude`,
    /// children before parents within each lineage.
    ///
    /// The walk is lazy and finite; a fresh call re-walks from scratch.
    pub fn walk(
        &self,
        include: &FxHashSet<Oid>,
        exclude: &FxHashSet<Oid>,
    ) -> Result<Walk<'_>, git2::Error> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        for oid in include {
            revwalk.push(*oid)?;
        }
        for oid in exclude {
            revwalk.hide(*oid)?;
        }
        Ok(Walk { repo: &self.repo, revwalk })
    }

    /// Resolve `(mode, oid)` for `path` inside a root tree snapshot.
    ///
    /// Returns None when the path does not exist in that snapshot, which
    /// can happen transiently while merge parent views disagree.
    pub fn lookup_path(
        &self,
        root_tree: Oid,
        path: &str,
    ) -> Result<Option<(i64, Oid)>, git2::Error> {
        let tree = self.repo.find_tree(root_tree)?;
        match tree.get_path(Path::new(path)) {
            Ok(entry) => Ok(Some((entry.filemode() as i64, entry.id()))),
            Err(e) if e.code() == ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Lazy commit walker over only-new history.
///
/// Each item carries one raw change list per parent; a root commit carries
/// a single list diffed against the empty tree.
pub struct Walk<'repo> {
    repo: &'repo Repository,
    revwalk: Revwalk<'repo>,
}

impl Iterator for Walk<'_> {
    type Item = Result<WalkedCommit, git2::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let oid = match self.revwalk.next()? {
            Ok(oid) => oid,
            Err(e) => return Some(Err(e)),
        };
        Some(self.load(oid))
    }
}

impl Walk<'_> {
    fn load(&self, oid: Oid) -> Result<WalkedCommit, git2::Error> {
        let commit = self.repo.find_commit(oid)?;
        let tree = commit.tree()?;

        let mut parent_changes = Vec::new();
        if commit.parent_count() == 0 {
            parent_changes.push(self.diff_changes(None, &tree)?);
        } else {
            for parent in commit.parents() {
                let parent_tree = parent.tree()?;
                parent_changes.push(self.diff_changes(Some(&parent_tree), &tree)?);
            }
        }

        Ok(WalkedCommit { id: oid, tree: commit.tree_id(), parent_changes })
    }

    fn diff_changes(
        &self,
        old: Option<&Tree<'_>>,
        new: &Tree<'_>,
    ) -> Result<Vec<RawChange>, git2::Error> {
        let mut diff = self.repo.diff_tree_to_tree(old, Some(new), None)?;

        // Rename/copy detection as libgit2 reports it
        let mut find = DiffFindOptions::new();
        find.renames(true).copies(true);
        diff.find_similar(Some(&mut find))?;

        Ok(diff.deltas().filter_map(raw_change).collect())
    }
}

fn raw_change(delta: git2::DiffDelta<'_>) -> Option<RawChange> {
    let kind = match delta.status() {
        Delta::Added => ChangeKind::Add,
        Delta::Deleted => ChangeKind::Delete,
        Delta::Modified | Delta::Typechange => ChangeKind::Modify,
        Delta::Renamed => ChangeKind::Rename,
        Delta::Copied => ChangeKind::Copy,
        _ => return None,
    };

    let old = if kind == ChangeKind::Add { None } else { side(delta.old_file()) };
    let new = if kind == ChangeKind::Delete { None } else { side(delta.new_file()) };
    if old.is_none() && new.is_none() {
        return None;
    }

    Some(RawChange { kind, old, new })
}

fn side(file: git2::DiffFile<'_>) -> Option<ChangeSide> {
    let path = file.path()?.to_str()?.to_string();
    Some(ChangeSide { oid: file.id(), path, mode: i32::from(file.mode()) as i64 })
}
