//! autocommit - CLI entry point.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use autocommit::config::AutoCommitConfig;
use autocommit::engine::CommitEngine;
use autocommit::git::{GitCli, check_git_installed};
use autocommit::logging::{default_level, init_logging};
use autocommit::watch::run_watch;

/// Commit each changed file with a descriptive, throttled message.
#[derive(Parser, Debug)]
#[command(name = "autocommit")]
#[command(about = "Commit each changed file with a descriptive, throttled message")]
#[command(version)]
struct Cli {
    /// Run as if started in this directory
    #[arg(short = 'C', long = "repo", default_value = ".", global = true)]
    repo: PathBuf,

    /// Config file (defaults to .autocommit.toml in the repository root)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Stage every pending change
    Add,

    /// Commit each eligible changed file separately
    Commit {
        /// Ignore the per-file throttle
        #[arg(long)]
        force: bool,
    },

    /// Stage and commit everything, then commit on every file change
    Watch,

    /// Print the commit label for paths
    Classify {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(default_level(cli.verbose));

    // Classification needs neither git nor a repository
    if let Command::Classify { paths } = &cli.command {
        let config = AutoCommitConfig::load(cli.config.as_deref(), &cli.repo)
            .context("Failed to load configuration")?;
        let classifier = config.classifier();
        for path in paths {
            println!("{}", classifier.classify(path));
        }
        return Ok(());
    }

    check_git_installed().context("git is required")?;

    let git = GitCli::discover(&cli.repo)
        .context("Not a git repository. Run autocommit from within a git repository.")?;
    let workdir = git.workdir().to_path_buf();

    let config = AutoCommitConfig::load(cli.config.as_deref(), &workdir)
        .context("Failed to load configuration")?;

    let engine = CommitEngine::new(git, &config);

    match cli.command {
        Command::Add => {
            engine.stage_all().await.context("Failed to stage changes")?;
        }
        Command::Commit { force } => {
            let count = engine
                .commit_changes(force)
                .await
                .context("Auto-commit failed")?;
            println!("{} commit(s) made", count);
        }
        Command::Watch => {
            run_watch(&engine, &workdir, &config)
                .await
                .context("File watcher failed")?;
        }
        Command::Classify { .. } => {}
    }

    Ok(())
}
