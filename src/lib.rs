//! autocommit - commits each changed file with a descriptive message.
//!
//! # Overview
//!
//! autocommit reads `git status --porcelain`, labels every changed path from
//! directory-prefix rules (`assets/scripts/app.js` becomes `script: app`) and
//! issues one commit per file, skipping files committed within the last few
//! minutes. It can run once or watch the work tree and commit as files change.

pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod git;
pub mod logging;
pub mod throttle;
pub mod watch;

// Re-export commonly used types
pub use classify::{Classifier, ClassifierRule};
pub use config::AutoCommitConfig;
pub use engine::{CommitEngine, commit_message};
pub use error::{CommitError, ConfigError, GitError, StatusError, WatchError};
pub use git::{ChangeRecord, GitCli, VcsClient};
pub use throttle::{Clock, ManualClock, SystemClock, ThrottleStore};
