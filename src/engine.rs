//! The auto-commit engine: one commit per eligible change.

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::classify::Classifier;
use crate::config::AutoCommitConfig;
use crate::error::{CommitError, GitError, StatusError};
use crate::git::client::VcsClient;
use crate::git::status::{ChangeRecord, parse_status};
use crate::throttle::{Clock, SystemClock, ThrottleStore};

/// Build the commit message for a change.
///
/// Renames use the bare short names of both paths; other actions use the
/// full classification. Unknown records are rejected.
pub fn commit_message(
    record: &ChangeRecord,
    classifier: &Classifier,
) -> Result<String, StatusError> {
    let message = match record {
        ChangeRecord::Added(path) => format!("Added {}", classifier.classify(path)),
        ChangeRecord::Deleted(path) => format!("Deleted {}", classifier.classify(path)),
        ChangeRecord::Modified(path) => format!("Modified {}", classifier.classify(path)),
        ChangeRecord::Renamed { from, to } => format!(
            "Renamed: from {} to {}",
            classifier.short_name(from),
            classifier.short_name(to)
        ),
        ChangeRecord::Unknown { code, line } => {
            return Err(StatusError::UnknownStatus {
                code: *code,
                line: line.clone(),
            });
        }
    };
    Ok(message)
}

/// Remove `"` and `'` from a commit argument.
pub fn strip_quotes(s: &str) -> String {
    s.chars().filter(|c| *c != '"' && *c != '\'').collect()
}

/// Classifies, throttles and commits working-tree changes.
///
/// The throttle store is held for the whole of a [`commit_changes`] run, so
/// concurrent triggers are processed one after another.
///
/// [`commit_changes`]: CommitEngine::commit_changes
pub struct CommitEngine<V, C = SystemClock> {
    vcs: V,
    classifier: Classifier,
    whitelist: String,
    throttle: Mutex<ThrottleStore>,
    clock: C,
}

impl<V: VcsClient> CommitEngine<V, SystemClock> {
    pub fn new(vcs: V, config: &AutoCommitConfig) -> Self {
        Self::with_clock(vcs, config, SystemClock)
    }
}

impl<V: VcsClient, C: Clock> CommitEngine<V, C> {
    pub fn with_clock(vcs: V, config: &AutoCommitConfig, clock: C) -> Self {
        Self {
            vcs,
            classifier: config.classifier(),
            whitelist: config.file_whitelist.clone(),
            throttle: Mutex::new(ThrottleStore::new(config.min_time_between_commits)),
            clock,
        }
    }

    pub fn vcs(&self) -> &V {
        &self.vcs
    }

    /// Last recorded commit time for a throttle key.
    pub async fn last_commit(&self, key: &str) -> Option<f64> {
        self.throttle.lock().await.last_commit(key)
    }

    /// Stage every pending change.
    pub async fn stage_all(&self) -> Result<(), GitError> {
        self.vcs.add_all().await
    }

    /// Commit every eligible change, one commit per change, in status order.
    ///
    /// Returns the number of commits made. A failed commit is logged and
    /// skipped; an unknown status code aborts the run, leaving commits already
    /// made in place.
    pub async fn commit_changes(&self, ignore_throttle: bool) -> Result<usize, CommitError> {
        let mut throttle = self.throttle.lock().await;

        let raw = self.vcs.status().await.map_err(CommitError::StatusFailed)?;
        let records = parse_status(&raw);
        debug!("{} change(s) in status", records.len());

        let mut count = 0;
        for record in &records {
            let key = record.raw_path();

            if !key.starts_with(&self.whitelist) {
                debug!("Skipping {} {}: outside {}", record.action(), key, self.whitelist);
                continue;
            }

            if !throttle.is_eligible(&key, self.clock.now(), ignore_throttle) {
                debug!("Skipping {} {}: committed too recently", record.action(), key);
                continue;
            }

            let message = commit_message(record, &self.classifier)?;
            let paths: Vec<String> = record
                .commit_paths()
                .iter()
                .map(|p| strip_quotes(p))
                .collect();

            match self.vcs.commit(&strip_quotes(&message), &paths).await {
                Ok(()) => {
                    throttle.record_commit(&key, self.clock.now());
                    count += 1;
                    info!("New commit: {}", message);
                }
                Err(e) => warn!("Failed to commit {}: {}", key, e),
            }
        }

        Ok(count)
    }
}
