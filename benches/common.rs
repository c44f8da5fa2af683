// Shared benchmark helpers
// Functions here are used across different benchmark files
#![allow(dead_code)]

use git2::{Repository, Signature};
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary git repository for benchmarks
pub fn create_bench_repo() -> (TempDir, PathBuf, Repository) {
    let dir = TempDir::new().unwrap();
    let repo_path = dir.path().to_path_buf();
    let repo = Repository::init(&repo_path).unwrap();

    // Configure git user for commits
    let mut config = repo.config().unwrap();
    config.set_str("user.name", "Bench User").unwrap();
    config.set_str("user.email", "bench@example.com").unwrap();

    (dir, repo_path, repo)
}

/// Add files and create a commit
pub fn add_commit(repo: &Repository, files: &[(&str, &[u8])], message: &str) -> git2::Oid {
    let sig = Signature::now("Bench User", "bench@example.com").unwrap();
    let mut index = repo.index().unwrap();

    for (path, content) in files {
        let full_path = repo.workdir().unwrap().join(path);
        if let Some(parent) = full_path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&full_path, content).unwrap();
        index.add_path(std::path::Path::new(path)).unwrap();
    }

    index.write().unwrap();
    let tree_id = index.write_tree().unwrap();
    let tree = repo.find_tree(tree_id).unwrap();

    let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());

    if let Some(parent) = parent {
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent]).unwrap()
    } else {
        repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[]).unwrap()
    }
}

/// Populate a repository with an initial tree plus a stream of
/// modification commits
pub fn populate_repo(repo: &Repository, num_files: usize, num_commits: usize) {
    let files: Vec<_> = (0..num_files)
        .map(|i| {
            let path = format!("src/dir_{}/file_{}.rs", i % 20, i);
            let content = format!("// File {}\nfn func_{}() {{}}\n", i, i).into_bytes();
            (path, content)
        })
        .collect();

    let file_refs: Vec<_> = files.iter().map(|(p, c)| (p.as_str(), c.as_slice())).collect();
    add_commit(repo, &file_refs, "Initial commit");

    for commit_num in 1..num_commits {
        let modified: Vec<_> = (0..5)
            .map(|i| {
                let file_idx = (commit_num * 5 + i) % num_files;
                let path = format!("src/dir_{}/file_{}.rs", file_idx % 20, file_idx);
                let content = format!("// File {} version {}\n", file_idx, commit_num).into_bytes();
                (path, content)
            })
            .collect();

        let file_refs: Vec<_> = modified.iter().map(|(p, c)| (p.as_str(), c.as_slice())).collect();
        add_commit(repo, &file_refs, &format!("Commit {}", commit_num));
    }
}
