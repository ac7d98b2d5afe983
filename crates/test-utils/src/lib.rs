pub mod builders;

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, Once};
use std::time::{Duration, SystemTime};

use tokio::sync::Notify;
use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Initialise tracing for tests.
///
/// - Uses `with_test_writer()`, so logs are captured per-test.
/// - The Rust test harness only prints captured output for **failing** tests
///   (unless you run with `-- --nocapture`).
///
/// Enable levels with e.g.:
/// `RUST_LOG=debug cargo test`
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer() // print only for failing tests unless --nocapture
            .with_target(true)
            .init();
    });
}

/// Run a future with a 10-second timeout.
pub async fn with_timeout<F, T>(f: F) -> T
where
    F: std::future::Future<Output = T>,
{
    tokio::time::timeout(Duration::from_secs(10), f)
        .await
        .expect("Test timed out after 10 seconds")
}

/// Bump a file's modification time without touching its contents.
pub fn touch(path: &Path) -> std::io::Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    file.set_modified(SystemTime::now())
}

/// Records every path handed to an `on_change` callback and lets tests wait
/// for them.
#[derive(Clone, Default)]
pub struct ChangeRecorder {
    calls: Arc<Mutex<Vec<PathBuf>>>,
    notify: Arc<Notify>,
}

impl ChangeRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback suitable for `WatchConfigBuilder::on_change`.
    pub fn callback(&self) -> impl Fn(PathBuf) + Send + Sync + 'static {
        let calls = Arc::clone(&self.calls);
        let notify = Arc::clone(&self.notify);
        move |path| {
            calls.lock().unwrap().push(path);
            notify.notify_waiters();
        }
    }

    pub fn calls(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Wait until `pred` holds for the recorded calls, or `within` elapses.
    /// Returns whether the predicate held.
    pub async fn wait_until<P>(&self, within: Duration, pred: P) -> bool
    where
        P: Fn(&[PathBuf]) -> bool,
    {
        let deadline = tokio::time::Instant::now() + within;
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if pred(self.calls.lock().unwrap().as_slice()) {
                return true;
            }
            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return pred(self.calls.lock().unwrap().as_slice());
            }
        }
    }

    /// Wait until `path` has been reported at least once.
    pub async fn wait_for(&self, path: &Path, within: Duration) -> bool {
        self.wait_until(within, |calls| calls.iter().any(|p| p == path))
            .await
    }

    /// Wait until nothing new has been recorded for `quiet`.
    pub async fn settle(&self, quiet: Duration) {
        loop {
            let before = self.count();
            tokio::time::sleep(quiet).await;
            if self.count() == before {
                return;
            }
        }
    }
}
