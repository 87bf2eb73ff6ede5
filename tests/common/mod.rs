//! Shared test utilities for integration tests.
//!
//! Not all functions are used by every test file, but they're shared across tests.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use git2::{Oid, Repository, Signature};

use autocommit::{GitError, VcsClient};

/// A test git repository builder for integration tests.
pub struct TestRepo {
    pub dir: tempfile::TempDir,
    pub repo: Repository,
}

impl TestRepo {
    /// Create a git repository with identity configured and no commits.
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp directory");
        let repo = Repository::init(dir.path()).expect("Failed to init git repo");

        let mut config = repo.config().expect("Failed to open repo config");
        config
            .set_str("user.name", "Test User")
            .expect("Failed to set user.name");
        config
            .set_str("user.email", "test@example.com")
            .expect("Failed to set user.email");
        config
            .set_bool("commit.gpgsign", false)
            .expect("Failed to disable signing");

        Self { dir, repo }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write a file relative to the repository root, creating parent dirs.
    pub fn write(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create parent dirs");
        }
        std::fs::write(&path, content).expect("Failed to write file");
        path
    }

    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.dir.path().join(rel)).expect("Failed to remove file");
    }

    pub fn rename(&self, from: &str, to: &str) {
        std::fs::rename(self.dir.path().join(from), self.dir.path().join(to))
            .expect("Failed to rename file");
    }

    /// Stage the given paths through git2.
    pub fn stage(&self, paths: &[&str]) {
        let mut index = self.repo.index().expect("Failed to get index");
        for p in paths {
            index.add_path(Path::new(p)).expect("Failed to add file");
        }
        index.write().expect("Failed to write index");
    }

    /// Write and commit the given files directly via git2.
    pub fn commit_files(&self, files: &[(&str, &str)], message: &str) -> Oid {
        for (rel, content) in files {
            self.write(rel, content);
        }
        let paths: Vec<&str> = files.iter().map(|(p, _)| *p).collect();
        self.stage(&paths);

        let mut index = self.repo.index().expect("Failed to get index");
        let tree_id = index.write_tree().expect("Failed to write tree");
        let tree = self.repo.find_tree(tree_id).expect("Failed to find tree");
        let sig =
            Signature::now("Test User", "test@example.com").expect("Failed to create signature");

        let parent = self.repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)
            .expect("Failed to create commit")
    }

    /// Commit messages reachable from HEAD, newest first.
    pub fn log(&self) -> Vec<String> {
        let mut walk = self.repo.revwalk().expect("Failed to create revwalk");
        walk.push_head().expect("Failed to push HEAD");
        walk.map(|oid| {
            let commit = self
                .repo
                .find_commit(oid.expect("bad oid"))
                .expect("Failed to find commit");
            commit.message().unwrap_or("").trim().to_string()
        })
        .collect()
    }

    /// Paths changed by the HEAD commit relative to its parent, sorted.
    pub fn head_changed_paths(&self) -> Vec<String> {
        let head = self
            .repo
            .head()
            .and_then(|h| h.peel_to_commit())
            .expect("Failed to resolve HEAD");
        let tree = head.tree().expect("Failed to get tree");
        let parent_tree = head.parent(0).ok().and_then(|p| p.tree().ok());

        let diff = self
            .repo
            .diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), None)
            .expect("Failed to diff");

        let mut paths: Vec<String> = diff
            .deltas()
            .filter_map(|d| {
                d.new_file()
                    .path()
                    .or_else(|| d.old_file().path())
                    .map(|p| p.to_string_lossy().to_string())
            })
            .collect();
        paths.sort();
        paths
    }

    /// Whether HEAD's tree contains `rel`.
    pub fn head_contains(&self, rel: &str) -> bool {
        self.repo
            .head()
            .and_then(|h| h.peel_to_tree())
            .map(|t| t.get_path(Path::new(rel)).is_ok())
            .unwrap_or(false)
    }
}

/// In-memory VCS client returning a fixed status and recording commits.
pub struct FakeVcs {
    status: Mutex<String>,
    pub commits: Mutex<Vec<(String, Vec<String>)>>,
    pub add_all_calls: Mutex<u32>,
    failing_paths: Vec<String>,
}

impl FakeVcs {
    pub fn new(status: &str) -> Self {
        Self {
            status: Mutex::new(status.to_string()),
            commits: Mutex::new(Vec::new()),
            add_all_calls: Mutex::new(0),
            failing_paths: Vec::new(),
        }
    }

    /// Make commits touching `path` fail with a non-zero exit.
    pub fn failing_on(mut self, path: &str) -> Self {
        self.failing_paths.push(path.to_string());
        self
    }

    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap() = status.to_string();
    }

    pub fn messages(&self) -> Vec<String> {
        self.commits
            .lock()
            .unwrap()
            .iter()
            .map(|(m, _)| m.clone())
            .collect()
    }
}

#[async_trait]
impl VcsClient for FakeVcs {
    async fn status(&self) -> Result<String, GitError> {
        Ok(self.status.lock().unwrap().clone())
    }

    async fn add_all(&self) -> Result<(), GitError> {
        *self.add_all_calls.lock().unwrap() += 1;
        Ok(())
    }

    async fn commit(&self, message: &str, paths: &[String]) -> Result<(), GitError> {
        if paths.iter().any(|p| self.failing_paths.contains(p)) {
            return Err(GitError::NonZeroExit {
                operation: "commit".to_string(),
                code: 1,
                stderr: "pre-commit hook failed".to_string(),
            });
        }
        self.commits
            .lock()
            .unwrap()
            .push((message.to_string(), paths.to_vec()));
        Ok(())
    }
}
