// tests/watch_session.rs

mod common;
use crate::common::{canonical, EVENT_WAIT, QUIET};
use srcwatch_test_utils::{init_tracing, touch, with_timeout, ChangeRecorder};

use std::error::Error;
use std::fs;
use std::path::Path;
use std::sync::{Arc, OnceLock, Weak};

use tempfile::tempdir;
use tokio::time::sleep;

use srcwatch::types::SessionState;
use srcwatch::watch::{start_watching, WatchConfig, WatchSession};

type TestResult = Result<(), Box<dyn Error>>;

fn config(root: &Path, recorder: &ChangeRecorder) -> Result<WatchConfig, srcwatch::SrcwatchError> {
    WatchConfig::builder(root, root.join("web-ext-artifacts"))
        .on_change(recorder.callback())
        .build()
}

#[tokio::test]
async fn watches_for_file_changes() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let some_file = dir.path().join("foo.txt");
        fs::write(&some_file, "<contents>")?;

        let recorder = ChangeRecorder::new();
        let session = start_watching(config(dir.path(), &recorder)?).await?;
        assert_eq!(session.state(), SessionState::Watching);

        touch(&some_file)?;

        let expected = canonical(&some_file);
        assert!(recorder.wait_for(&expected, EVENT_WAIT).await, "no event for {expected:?}");
        recorder.settle(QUIET).await;
        session.close();

        assert_eq!(recorder.calls(), vec![expected]);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn changes_inside_artifacts_dir_never_reach_the_callback() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let artifacts = dir.path().join("web-ext-artifacts");
        fs::create_dir_all(artifacts.join("nested"))?;
        let existing = artifacts.join("previous.xpi");
        fs::write(&existing, "old build")?;

        let recorder = ChangeRecorder::new();
        let session = start_watching(config(dir.path(), &recorder)?).await?;

        fs::write(artifacts.join("extension-1.0.zip"), "new build")?;
        fs::write(artifacts.join("nested").join("out.js"), "console.log(1)")?;
        touch(&existing)?;

        // Events arrive in order, so once the sentinel shows up every
        // artifacts event has already been filtered.
        let sentinel = dir.path().join("sentinel.txt");
        fs::write(&sentinel, "x")?;
        assert!(recorder.wait_for(&canonical(&sentinel), EVENT_WAIT).await);
        session.close();

        let artifacts = canonical(&artifacts);
        let leaked: Vec<_> = recorder
            .calls()
            .into_iter()
            .filter(|p| p.starts_with(&artifacts))
            .collect();
        assert!(leaked.is_empty(), "artifacts changes reported: {leaked:?}");
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn artifacts_dir_created_after_start_is_still_excluded() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let recorder = ChangeRecorder::new();
        let session = start_watching(config(dir.path(), &recorder)?).await?;

        let artifacts = dir.path().join("web-ext-artifacts");
        fs::create_dir(&artifacts)?;
        fs::write(artifacts.join("ext.xpi.tmp-build"), "partial")?;

        let sentinel = dir.path().join("sentinel.txt");
        fs::write(&sentinel, "x")?;
        assert!(recorder.wait_for(&canonical(&sentinel), EVENT_WAIT).await);
        session.close();

        let artifacts = canonical(&artifacts);
        assert!(recorder.calls().iter().all(|p| !p.starts_with(&artifacts)));
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn hidden_and_editor_files_are_ignored_by_default() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let git = dir.path().join(".git");
        fs::create_dir(&git)?;
        fs::write(git.join("HEAD"), "ref: refs/heads/main")?;

        let recorder = ChangeRecorder::new();
        let session = start_watching(config(dir.path(), &recorder)?).await?;

        fs::write(git.join("HEAD"), "ref: refs/heads/other")?;
        fs::write(dir.path().join(".popup.js.swp"), "swap")?;
        fs::write(dir.path().join("popup.js~"), "backup")?;

        let sentinel = dir.path().join("popup.js");
        fs::write(&sentinel, "x")?;
        let sentinel = canonical(&sentinel);
        assert!(recorder.wait_for(&sentinel, EVENT_WAIT).await);
        session.close();

        assert!(
            recorder.calls().iter().all(|p| p == &sentinel),
            "unexpected paths: {:?}",
            recorder.calls()
        );
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn custom_predicate_replaces_default_filtering() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let recorder = ChangeRecorder::new();
        let cfg = WatchConfig::builder(dir.path(), dir.path().join("web-ext-artifacts"))
            .on_change(recorder.callback())
            .should_watch_file(|path: &Path| path.extension().is_some_and(|ext| ext == "js"))
            .build()?;
        let session = start_watching(cfg).await?;

        fs::write(dir.path().join("notes.txt"), "skip me")?;
        // Hidden, but the predicate has the final word.
        let hidden_js = dir.path().join(".eslintrc.js");
        fs::write(&hidden_js, "module.exports = {}")?;
        let app = dir.path().join("app.js");
        fs::write(&app, "x")?;

        let app = canonical(&app);
        assert!(recorder.wait_for(&app, EVENT_WAIT).await);
        session.close();

        let calls = recorder.calls();
        assert!(calls.contains(&canonical(&hidden_js)));
        assert!(calls.iter().all(|p| p.extension().is_some_and(|ext| ext == "js")));
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn changes_are_dispatched_in_notification_order() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let recorder = ChangeRecorder::new();
        let session = start_watching(config(dir.path(), &recorder)?).await?;

        let names = ["a.txt", "b.txt", "c.txt"];
        for name in names {
            fs::write(dir.path().join(name), name)?;
        }

        let last = canonical(&dir.path().join("c.txt"));
        assert!(recorder.wait_for(&last, EVENT_WAIT).await);
        session.close();

        let calls = recorder.calls();
        let first_seen: Vec<usize> = names
            .iter()
            .map(|n| {
                let p = canonical(&dir.path().join(n));
                calls.iter().position(|c| c == &p).expect("every file reported")
            })
            .collect();
        assert!(first_seen.windows(2).all(|w| w[0] < w[1]), "order: {calls:?}");
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn close_twice_is_safe_and_stops_notifications() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let some_file = dir.path().join("foo.txt");
        fs::write(&some_file, "<contents>")?;

        let recorder = ChangeRecorder::new();
        let session = start_watching(config(dir.path(), &recorder)?).await?;

        session.close();
        session.close();
        assert_eq!(session.state(), SessionState::Closed);

        touch(&some_file)?;
        fs::write(dir.path().join("new.txt"), "x")?;
        sleep(QUIET).await;

        assert_eq!(recorder.count(), 0);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn dropping_the_session_stops_notifications() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let some_file = dir.path().join("foo.txt");
        fs::write(&some_file, "<contents>")?;

        let recorder = ChangeRecorder::new();
        let session = start_watching(config(dir.path(), &recorder)?).await?;
        drop(session);

        touch(&some_file)?;
        sleep(QUIET).await;

        assert_eq!(recorder.count(), 0);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn close_from_inside_the_callback_does_not_deadlock() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let some_file = dir.path().join("foo.txt");
        fs::write(&some_file, "<contents>")?;

        let recorder = ChangeRecorder::new();
        let record = recorder.callback();
        let handle: Arc<OnceLock<Weak<WatchSession>>> = Arc::new(OnceLock::new());
        let cb_handle = Arc::clone(&handle);

        let cfg = WatchConfig::builder(dir.path(), dir.path().join("web-ext-artifacts"))
            .on_change(move |path| {
                record(path);
                if let Some(session) = cb_handle.get().and_then(Weak::upgrade) {
                    session.close();
                }
            })
            .build()?;

        let session = Arc::new(start_watching(cfg).await?);
        let _ = handle.set(Arc::downgrade(&session));

        touch(&some_file)?;
        assert!(recorder.wait_until(EVENT_WAIT, |calls| !calls.is_empty()).await);
        assert_eq!(session.state(), SessionState::Closed);

        touch(&some_file)?;
        sleep(QUIET).await;
        assert_eq!(recorder.count(), 1);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn panicking_callback_does_not_end_the_session() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let recorder = ChangeRecorder::new();
        let record = recorder.callback();
        let cfg = WatchConfig::builder(dir.path(), dir.path().join("web-ext-artifacts"))
            .on_change(move |path| {
                if path.file_name().is_some_and(|n| n == "boom.txt") {
                    panic!("callback failure");
                }
                record(path);
            })
            .build()?;
        let session = start_watching(cfg).await?;

        fs::write(dir.path().join("boom.txt"), "x")?;
        let ok = dir.path().join("ok.txt");
        fs::write(&ok, "x")?;

        assert!(recorder.wait_for(&canonical(&ok), EVENT_WAIT).await);
        assert_eq!(session.state(), SessionState::Watching);
        session.close();
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn panicking_predicate_rejects_that_change_only() -> TestResult {
    with_timeout(async {
        init_tracing();

        let dir = tempdir()?;
        let recorder = ChangeRecorder::new();
        let cfg = WatchConfig::builder(dir.path(), dir.path().join("web-ext-artifacts"))
            .on_change(recorder.callback())
            .should_watch_file(|path: &Path| {
                if path.file_name().is_some_and(|n| n == "boom.txt") {
                    panic!("predicate failure");
                }
                true
            })
            .build()?;
        let session = start_watching(cfg).await?;

        let boom = dir.path().join("boom.txt");
        fs::write(&boom, "x")?;
        let boom = canonical(&boom);
        let ok = dir.path().join("ok.txt");
        fs::write(&ok, "x")?;

        assert!(recorder.wait_for(&canonical(&ok), EVENT_WAIT).await);
        assert!(!recorder.calls().contains(&boom));
        assert_eq!(session.state(), SessionState::Watching);
        session.close();
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

