//! Git access: porcelain parsing and the command-line client.

pub mod client;
pub mod retry;
pub mod status;

pub use client::{GitCli, VcsClient, check_git_installed};
pub use status::{Action, ChangeRecord, parse_status};
