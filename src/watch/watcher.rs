// src/watch/watcher.rs

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::errors::{Result, SrcwatchError};
use crate::fs::{FileSystem, RealFileSystem};
use crate::types::SessionState;
use crate::watch::config::WatchConfig;
use crate::watch::event_handler::{process_batch, DispatchGate};
use crate::watch::path_utils::canonicalize_lenient;

type RawEvent = notify::Result<Event>;

/// Live handle for one watch session.
///
/// Owns the OS subscription and the dispatch task. [`WatchSession::close`]
/// (or dropping the handle) releases both; after that the callback is never
/// invoked again.
pub struct WatchSession {
    config: Arc<WatchConfig>,
    gate: Arc<DispatchGate>,
    watcher: Mutex<Option<RecommendedWatcher>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSession")
            .field("source_dir", &self.config.source_dir())
            .field("artifacts_dir", &self.config.artifacts_dir())
            .field("state", &self.state())
            .finish()
    }
}

impl WatchSession {
    pub fn state(&self) -> SessionState {
        self.gate.state()
    }

    /// Canonical directory being watched.
    pub fn source_dir(&self) -> &Path {
        self.config.source_dir()
    }

    /// Canonical artifacts directory excluded from notifications.
    pub fn artifacts_dir(&self) -> &Path {
        self.config.artifacts_dir()
    }

    /// Stop watching and release the OS subscription.
    ///
    /// Safe to call any number of times. Errors while releasing the watch are
    /// logged and swallowed. When this returns, no further callback will
    /// start, and a callback that was already running has finished (unless
    /// `close` is called from inside that callback).
    pub fn close(&self) {
        if !self.gate.close() {
            debug!(source_dir = ?self.source_dir(), "watch session already closed");
            return;
        }

        if let Some(mut watcher) = lock(&self.watcher).take() {
            if let Err(err) = watcher.unwatch(self.config.source_dir()) {
                let err = SrcwatchError::Teardown(err);
                warn!(error = %err, "ignoring error while releasing file watch");
            }
        }

        if let Some(task) = lock(&self.task).take() {
            task.abort();
        }

        info!(source_dir = ?self.source_dir(), "stopped watching");
    }
}

impl Drop for WatchSession {
    fn drop(&mut self) {
        self.close();
    }
}

/// Start watching `config.source_dir` recursively.
///
/// Resolves once the OS subscription is registered for the whole tree, so
/// any change made after this returns is observed. Must be called from
/// within a Tokio runtime.
pub async fn start_watching(config: WatchConfig) -> Result<WatchSession> {
    start_watching_with(config, Arc::new(RealFileSystem)).await
}

/// Same as [`start_watching`], with the pre-subscription checks routed
/// through the given filesystem.
pub async fn start_watching_with(
    config: WatchConfig,
    fs: Arc<dyn FileSystem>,
) -> Result<WatchSession> {
    let source_dir = validate_source_dir(fs.as_ref(), config.source_dir())?;
    let artifacts_dir = canonicalize_lenient(fs.as_ref(), config.artifacts_dir());
    let config = Arc::new(config.with_resolved_dirs(source_dir.clone(), artifacts_dir));

    // Channel from the blocking notify callback into the async world.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<RawEvent>();
    let watcher = subscribe(source_dir.clone(), event_tx).await?;

    let gate = Arc::new(DispatchGate::new());
    gate.open();

    let task = tokio::spawn(dispatch_loop(event_rx, Arc::clone(&config), Arc::clone(&gate)));

    info!(
        source_dir = ?config.source_dir(),
        artifacts_dir = ?config.artifacts_dir(),
        custom_filter = config.should_watch_file().is_some(),
        "file watcher started"
    );

    Ok(WatchSession {
        config,
        gate,
        watcher: Mutex::new(Some(watcher)),
        task: Mutex::new(Some(task)),
    })
}

/// Check that `dir` exists, is a directory and can be listed. Returns its
/// canonical form.
pub fn validate_source_dir(fs: &dyn FileSystem, dir: &Path) -> Result<PathBuf> {
    if !fs.exists(dir) {
        return Err(SrcwatchError::invalid_source_dir(dir, "does not exist"));
    }
    if !fs.is_dir(dir) {
        return Err(SrcwatchError::invalid_source_dir(dir, "not a directory"));
    }
    if let Err(err) = fs.read_dir(dir) {
        return Err(SrcwatchError::invalid_source_dir(dir, format!("not readable: {err:#}")));
    }
    fs.canonicalize(dir)
        .map_err(|err| SrcwatchError::invalid_source_dir(dir, format!("{err:#}")))
}

/// Register a recursive watch on `root`. Walking the tree can take a while
/// on large projects, so it runs on a blocking thread.
async fn subscribe(
    root: PathBuf,
    event_tx: mpsc::UnboundedSender<RawEvent>,
) -> Result<RecommendedWatcher> {
    tokio::task::spawn_blocking(move || -> Result<RecommendedWatcher> {
        // Closure called synchronously by notify whenever an event arrives.
        // A send error only means the session is gone.
        let mut watcher = RecommendedWatcher::new(
            move |res: RawEvent| {
                let _ = event_tx.send(res);
            },
            Config::default(),
        )
        .map_err(SrcwatchError::Subscribe)?;

        watcher
            .watch(&root, RecursiveMode::Recursive)
            .map_err(|err| match err.kind {
                notify::ErrorKind::PathNotFound => {
                    SrcwatchError::invalid_source_dir(&root, "disappeared before it could be watched")
                }
                _ => SrcwatchError::Subscribe(err),
            })?;

        Ok(watcher)
    })
    .await
    .map_err(|err| SrcwatchError::Other(anyhow::anyhow!("watch setup task failed: {err}")))?
}

/// Consume notify events and forward accepted changes to the callback.
///
/// Each wake-up drains whatever is already queued so consecutive duplicates
/// can be collapsed.
async fn dispatch_loop(
    mut event_rx: mpsc::UnboundedReceiver<RawEvent>,
    config: Arc<WatchConfig>,
    gate: Arc<DispatchGate>,
) {
    while let Some(first) = event_rx.recv().await {
        let mut batch = vec![first];
        while let Ok(next) = event_rx.try_recv() {
            batch.push(next);
        }
        debug!(events = batch.len(), "received notify events");

        if process_batch(batch, &config, &gate).is_break() {
            break;
        }
    }
    debug!("watcher event loop finished");
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
