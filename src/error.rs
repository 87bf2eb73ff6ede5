//! Error types for autocommit modules using thiserror.

use thiserror::Error;

/// Errors from invoking the version-control system.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("git not found in PATH. Install git and make sure it is on your PATH")]
    NotInstalled,

    #[error("Failed to open repository at {path}: {source}")]
    OpenRepository {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Bare repository not supported")]
    BareRepository,

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("git {operation} exited with code {code}: {stderr}")]
    NonZeroExit {
        operation: String,
        code: i32,
        stderr: String,
    },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<GitError>),
}

impl GitError {
    /// Whether another git process holding the index lock caused this failure.
    pub fn is_lock_contention(&self) -> bool {
        matches!(self, GitError::NonZeroExit { stderr, .. } if stderr.contains("index.lock"))
    }
}

/// Errors from parsing porcelain status output.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StatusError {
    #[error("unknown status '{code}' in line: {line}")]
    UnknownStatus { code: char, line: String },
}

/// Errors that abort a whole commit run.
#[derive(Error, Debug)]
pub enum CommitError {
    #[error("Failed to read repository status: {0}")]
    StatusFailed(#[source] GitError),

    #[error(transparent)]
    Status(#[from] StatusError),
}

/// Errors from loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    #[error("Failed to read config {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors from the file-system watcher.
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("Failed to watch {path}: {source}")]
    WatchFailed {
        path: String,
        #[source]
        source: notify::Error,
    },

    #[error("Watcher channel closed unexpectedly")]
    ChannelClosed,
}
