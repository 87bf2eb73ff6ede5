//! File-system trigger: commit whenever files under the whitelist change.
//!
//! A session stages everything and force-commits once, then watches the
//! whitelisted directory. Each burst of events is debounced into a single
//! throttled commit run.

use std::future::Future;
use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc::{UnboundedReceiver, unbounded_channel};
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::AutoCommitConfig;
use crate::engine::CommitEngine;
use crate::error::WatchError;
use crate::git::client::VcsClient;
use crate::throttle::Clock;

type EventRx = UnboundedReceiver<notify::Result<notify::Event>>;

/// Directory to watch: the whitelist prefix inside `workdir` when it names an
/// existing directory, otherwise the whole work tree.
pub fn watch_root(workdir: &Path, whitelist: &str) -> PathBuf {
    let candidate = workdir.join(whitelist);
    if !whitelist.is_empty() && candidate.is_dir() {
        candidate
    } else {
        workdir.to_path_buf()
    }
}

/// Whether an event should trigger a commit run.
///
/// Access events and anything inside `.git/` (including our own commits) are
/// ignored.
pub fn is_relevant(event: &notify::Event) -> bool {
    let kind_matters = matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) | EventKind::Any
    );

    kind_matters
        && event
            .paths
            .iter()
            .any(|p| !p.components().any(|c| c == Component::Normal(".git".as_ref())))
}

/// Wait for a relevant event, then until `quiet` passes without another one.
///
/// Returns `false` once the channel is closed and nothing is pending.
async fn next_burst(rx: &mut EventRx, quiet: Duration) -> bool {
    loop {
        match rx.recv().await {
            None => return false,
            Some(Ok(event)) if is_relevant(&event) => break,
            Some(Ok(_)) => {}
            Some(Err(e)) => warn!("Watch error: {}", e),
        }
    }

    let mut deadline = Instant::now() + quiet;
    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(deadline) => return true,
            msg = rx.recv() => match msg {
                None => return true,
                Some(Ok(event)) if is_relevant(&event) => deadline = Instant::now() + quiet,
                Some(Ok(_)) => {}
                Some(Err(e)) => warn!("Watch error: {}", e),
            },
        }
    }
}

/// Run throttled commits for each settled burst until `shutdown` resolves.
async fn watch_loop<V, C, S>(
    engine: &CommitEngine<V, C>,
    rx: &mut EventRx,
    quiet: Duration,
    shutdown: S,
) -> Result<(), WatchError>
where
    V: VcsClient,
    C: Clock,
    S: Future<Output = ()>,
{
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Stopping watch");
                return Ok(());
            }
            pending = next_burst(rx, quiet) => {
                if !pending {
                    return Err(WatchError::ChannelClosed);
                }
                match engine.commit_changes(false).await {
                    Ok(count) => debug!("{} commit(s) after file change", count),
                    Err(e) => error!("Auto-commit failed: {}", e),
                }
            }
        }
    }
}

/// Stage and force-commit everything once, as at the start of a session.
pub async fn start_session<V: VcsClient, C: Clock>(engine: &CommitEngine<V, C>) {
    if let Err(e) = engine.stage_all().await {
        warn!("Failed to stage changes: {}", e);
    }
    match engine.commit_changes(true).await {
        Ok(count) => info!("{} commit(s) at session start", count),
        Err(e) => error!("Auto-commit failed: {}", e),
    }
}

/// Watch `workdir` and auto-commit until Ctrl-C.
pub async fn run_watch<V: VcsClient, C: Clock>(
    engine: &CommitEngine<V, C>,
    workdir: &Path,
    config: &AutoCommitConfig,
) -> Result<(), WatchError> {
    start_session(engine).await;

    let (tx, mut rx) = unbounded_channel();
    let root = watch_root(workdir, &config.file_whitelist);

    let mut watcher: RecommendedWatcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(res);
    })
    .map_err(|source| WatchError::WatchFailed {
        path: root.display().to_string(),
        source,
    })?;

    watcher
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|source| WatchError::WatchFailed {
            path: root.display().to_string(),
            source,
        })?;

    info!("Watching {} (Ctrl-C to stop)", root.display());

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    watch_loop(engine, &mut rx, Duration::from_millis(config.debounce_ms), shutdown).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use notify::event::{AccessKind, CreateKind, ModifyKind};

    use crate::git::client::MockVcsClient;
    use crate::throttle::ManualClock;

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    #[test]
    fn test_is_relevant_work_tree_changes() {
        assert!(is_relevant(&event(
            EventKind::Modify(ModifyKind::Any),
            "/repo/assets/app.js"
        )));
        assert!(is_relevant(&event(
            EventKind::Create(CreateKind::File),
            "/repo/assets/new.js"
        )));
    }

    #[test]
    fn test_is_relevant_ignores_git_dir() {
        assert!(!is_relevant(&event(
            EventKind::Modify(ModifyKind::Any),
            "/repo/.git/index"
        )));
        assert!(!is_relevant(&event(
            EventKind::Create(CreateKind::File),
            "/repo/.git/objects/ab/cdef"
        )));
    }

    #[test]
    fn test_is_relevant_ignores_access() {
        assert!(!is_relevant(&event(
            EventKind::Access(AccessKind::Any),
            "/repo/assets/app.js"
        )));
    }

    #[test]
    fn test_watch_root_prefers_whitelist_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("assets")).unwrap();

        assert_eq!(watch_root(dir.path(), "assets/"), dir.path().join("assets/"));
        assert_eq!(watch_root(dir.path(), "missing/"), dir.path());
        assert_eq!(watch_root(dir.path(), ""), dir.path());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_burst_coalesces_events() {
        let (tx, mut rx) = unbounded_channel();
        for name in ["a.js", "b.js", "c.js"] {
            tx.send(Ok(event(
                EventKind::Modify(ModifyKind::Any),
                &format!("/repo/assets/{}", name),
            )))
            .unwrap();
        }

        assert!(next_burst(&mut rx, Duration::from_millis(200)).await);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_next_burst_closed_channel() {
        let (tx, mut rx) = unbounded_channel::<notify::Result<notify::Event>>();
        tx.send(Ok(event(EventKind::Modify(ModifyKind::Any), "/repo/.git/index")))
            .unwrap();
        drop(tx);

        assert!(!next_burst(&mut rx, Duration::from_millis(200)).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_loop_runs_throttled_commit_per_burst() {
        let mut mock = MockVcsClient::new();
        mock.expect_status()
            .times(1)
            .returning(|| Ok("M  assets/app.js".to_string()));
        mock.expect_commit().times(1).returning(|_, _| Ok(()));

        let engine = CommitEngine::with_clock(
            mock,
            &AutoCommitConfig::default(),
            Arc::new(ManualClock::new(0.0)),
        );

        let (tx, mut rx) = unbounded_channel();
        tx.send(Ok(event(EventKind::Modify(ModifyKind::Any), "/repo/assets/app.js")))
            .unwrap();
        drop(tx);

        let result = watch_loop(
            &engine,
            &mut rx,
            Duration::from_millis(200),
            std::future::pending(),
        )
        .await;

        assert!(matches!(result, Err(WatchError::ChannelClosed)));
    }

    #[tokio::test]
    async fn test_start_session_stages_then_forces() {
        let mut mock = MockVcsClient::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_add_all()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(()));
        mock.expect_status()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok("A  assets/images/logo.png".to_string()));
        mock.expect_commit().times(1).returning(|_, _| Ok(()));

        let engine = CommitEngine::with_clock(
            mock,
            &AutoCommitConfig::default(),
            Arc::new(ManualClock::new(0.0)),
        );
        start_session(&engine).await;

        assert_eq!(engine.last_commit("assets/images/logo.png").await, Some(0.0));
    }
}
