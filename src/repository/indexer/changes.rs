//! Change extraction and merge reconciliation
//!
//! Normalizes the walker's per-parent change lists into canonical records
//! and stages their index writes into a per-commit batch.

use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

use super::types::{Change, ChangeKind, CommitBatch, ObjectRow, RawChange};

/// Collapse per-parent change lists into canonical per-path records.
///
/// For ordinary commits every raw change forms its own record. For merges,
/// a path is kept only when it appears in every parent's list: a path that
/// matches some parent was inherited from it and was already indexed when
/// that parent's lineage was walked.
pub fn group_changes(parent_changes: &[Vec<RawChange>]) -> Vec<Change> {
    if parent_changes.len() <= 1 {
        return parent_changes
            .iter()
            .flatten()
            .map(|raw| collapse(&[raw]))
            .collect();
    }

    let mut by_path: BTreeMap<&str, Vec<&RawChange>> = BTreeMap::new();
    for list in parent_changes {
        for raw in list {
            if let Some(path) = change_path(raw) {
                by_path.entry(path).or_default().push(raw);
            }
        }
    }

    by_path
        .into_values()
        .filter(|variants| variants.len() == parent_changes.len())
        .map(|variants| collapse(&variants))
        .collect()
}

/// Stage a change's index writes.
///
/// The new side is upserted; every distinct old side gets a best-effort
/// historical row plus a predecessor link. Renames and copies stage exactly
/// like modifications.
pub fn stage_change(change: &Change, batch: &mut CommitBatch) {
    let Some(new) = &change.new else {
        // Deletions leave the object registered at the commit that last
        // modified it
        return;
    };

    batch.upserts.push(ObjectRow {
        oid: new.oid,
        path: new.path.clone(),
        mode: new.mode,
    });

    for old in &change.olds {
        batch.inserts.push(ObjectRow {
            oid: old.oid,
            path: old.path.clone(),
            mode: old.mode,
        });
        if old.oid != new.oid {
            batch.parent_links.push((new.oid, old.oid));
        }
    }
}

fn change_path(raw: &RawChange) -> Option<&str> {
    raw.new
        .as_ref()
        .or(raw.old.as_ref())
        .map(|side| side.path.as_str())
}

fn collapse(variants: &[&RawChange]) -> Change {
    let primary = variants.iter().find(|v| v.kind != ChangeKind::Delete);
    let kind = primary.map_or(ChangeKind::Delete, |v| v.kind);
    let new = primary.and_then(|v| v.new.clone());

    let mut seen = FxHashSet::default();
    let olds = variants
        .iter()
        .filter_map(|v| v.old.clone())
        .filter(|old| seen.insert(old.oid))
        .collect();

    Change { kind, new, olds }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::indexer::ChangeSide;
    use git2::Oid;

    fn oid(ch: char) -> Oid {
        Oid::from_str(&ch.to_string().repeat(40)).unwrap()
    }

    fn side(ch: char, path: &str) -> ChangeSide {
        ChangeSide { oid: oid(ch), path: path.to_string(), mode: 0o100644 }
    }

    fn add(ch: char, path: &str) -> RawChange {
        RawChange { kind: ChangeKind::Add, old: None, new: Some(side(ch, path)) }
    }

    fn modify(old_ch: char, new_ch: char, path: &str) -> RawChange {
        RawChange {
            kind: ChangeKind::Modify,
            old: Some(side(old_ch, path)),
            new: Some(side(new_ch, path)),
        }
    }

    fn delete(ch: char, path: &str) -> RawChange {
        RawChange { kind: ChangeKind::Delete, old: Some(side(ch, path)), new: None }
    }

    #[test]
    fn test_single_parent_passthrough() {
        let lists = vec![vec![add('a', "a.txt"), modify('b', 'c', "b.txt")]];
        let changes = group_changes(&lists);

        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].kind, ChangeKind::Add);
        assert!(changes[0].olds.is_empty());
        assert_eq!(changes[1].kind, ChangeKind::Modify);
        assert_eq!(changes[1].olds, vec![side('b', "b.txt")]);
    }

    #[test]
    fn test_merge_drops_inherited_paths() {
        // "a.txt" differs from both parents, "b.txt" only from the second:
        // the merge took "b.txt" from the first parent
        let lists = vec![
            vec![modify('1', 'e', "a.txt")],
            vec![modify('2', 'e', "a.txt"), modify('3', '4', "b.txt")],
        ];
        let changes = group_changes(&lists);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].new, Some(side('e', "a.txt")));
    }

    #[test]
    fn test_merge_collects_distinct_old_sides() {
        let lists = vec![
            vec![modify('1', 'e', "a.txt")],
            vec![modify('2', 'e', "a.txt")],
            vec![modify('1', 'e', "a.txt")],
        ];
        let changes = group_changes(&lists);

        assert_eq!(changes.len(), 1);
        let olds: Vec<_> = changes[0].olds.iter().map(|s| s.oid).collect();
        assert_eq!(olds, vec![oid('1'), oid('2')]);
    }

    #[test]
    fn test_merge_mixed_add_and_modify() {
        // Added relative to one parent, modified relative to the other
        let lists = vec![vec![add('e', "a.txt")], vec![modify('1', 'e', "a.txt")]];
        let changes = group_changes(&lists);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Add);
        assert_eq!(changes[0].new, Some(side('e', "a.txt")));
        assert_eq!(changes[0].olds, vec![side('1', "a.txt")]);
    }

    #[test]
    fn test_all_delete_group_has_no_new_side() {
        let lists = vec![vec![delete('1', "a.txt")], vec![delete('2', "a.txt")]];
        let changes = group_changes(&lists);

        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].kind, ChangeKind::Delete);
        assert!(changes[0].new.is_none());
    }

    #[test]
    fn test_stage_delete_stages_nothing() {
        let mut batch = CommitBatch::new(oid('9'));
        let change = Change { kind: ChangeKind::Delete, new: None, olds: vec![side('1', "a.txt")] };
        stage_change(&change, &mut batch);

        assert!(batch.is_empty());
    }

    #[test]
    fn test_stage_add_upserts_only() {
        let mut batch = CommitBatch::new(oid('9'));
        let change = Change { kind: ChangeKind::Add, new: Some(side('a', "a.txt")), olds: vec![] };
        stage_change(&change, &mut batch);

        assert_eq!(batch.upserts.len(), 1);
        assert!(batch.inserts.is_empty());
        assert!(batch.parent_links.is_empty());
    }

    #[test]
    fn test_stage_modify_links_predecessors() {
        let mut batch = CommitBatch::new(oid('9'));
        let change = Change {
            kind: ChangeKind::Modify,
            new: Some(side('b', "a.txt")),
            olds: vec![side('1', "a.txt"), side('2', "a.txt")],
        };
        stage_change(&change, &mut batch);

        assert_eq!(batch.upserts.len(), 1);
        assert_eq!(batch.inserts.len(), 2);
        assert_eq!(batch.parent_links, vec![(oid('b'), oid('1')), (oid('b'), oid('2'))]);
    }

    #[test]
    fn test_stage_skips_self_link_on_mode_change() {
        let mut batch = CommitBatch::new(oid('9'));
        let mut old = side('a', "a.txt");
        old.mode = 0o100755;
        let change = Change { kind: ChangeKind::Modify, new: Some(side('a', "a.txt")), olds: vec![old] };
        stage_change(&change, &mut batch);

        assert!(batch.parent_links.is_empty());
    }
}
