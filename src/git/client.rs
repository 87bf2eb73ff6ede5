//! Version-control client: status, stage-all and single-path commits.
//!
//! [`GitCli`] shells out to the system `git` binary so the user's existing git
//! config, hooks and credentials apply. Commands run from the repository work
//! directory because porcelain paths are relative to it.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use git2::Repository;
use tokio::process::Command;
use tracing::debug;

use crate::error::GitError;

use super::retry::retry_on_lock;

/// Narrow interface to the version-control system.
///
/// This abstraction allows mocking git in tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VcsClient: Send + Sync {
    /// Porcelain short-format status text.
    async fn status(&self) -> Result<String, GitError>;

    /// Stage every pending change in the work tree.
    async fn add_all(&self) -> Result<(), GitError>;

    /// Commit exactly `paths` with `message`.
    async fn commit(&self, message: &str, paths: &[String]) -> Result<(), GitError>;
}

/// [`VcsClient`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    /// Use `workdir` as the repository root without further checks.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    /// Find the repository containing `path` and use its work directory.
    pub fn discover(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(path).map_err(|source| GitError::OpenRepository {
            path: path.display().to_string(),
            source,
        })?;

        let workdir = repo.workdir().ok_or(GitError::BareRepository)?;
        Ok(Self::new(workdir))
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Run git with `args` and return stdout.
    async fn run_git(&self, args: &[&str], operation: &str) -> Result<String, GitError> {
        debug!("git {}", args.join(" "));

        let output = Command::new("git")
            .args(args)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| GitError::SpawnFailed {
                operation: operation.to_string(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            // `git commit` reports "nothing to commit" on stdout
            let stderr = if stderr.is_empty() {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            } else {
                stderr
            };
            return Err(GitError::NonZeroExit {
                operation: operation.to_string(),
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}

#[async_trait]
impl VcsClient for GitCli {
    async fn status(&self) -> Result<String, GitError> {
        self.run_git(&["-c", "core.quotePath=false", "status", "--porcelain"], "status")
            .await
    }

    async fn add_all(&self) -> Result<(), GitError> {
        retry_on_lock(|| self.run_git(&["add", "-A"], "add")).await?;
        Ok(())
    }

    async fn commit(&self, message: &str, paths: &[String]) -> Result<(), GitError> {
        let mut args = vec!["commit", "-m", message, "--"];
        args.extend(paths.iter().map(String::as_str));

        retry_on_lock(|| self.run_git(&args, "commit")).await?;
        Ok(())
    }
}

/// Check that the `git` binary is available on PATH.
///
/// Uses the `which` crate for cross-platform executable detection.
pub fn check_git_installed() -> Result<PathBuf, GitError> {
    which::which("git").map_err(|_| GitError::NotInstalled)
}
