// src/watch/event_handler.rs

//! Turning raw notify events into callback invocations.
//!
//! This is the part of the session that runs for every notification:
//! - expand raw events into per-path [`ChangeEvent`]s (dropping reads and
//!   logging notification errors),
//! - collapse back-to-back duplicates,
//! - run the filter and hand accepted paths to the callback through the
//!   session's [`DispatchGate`].

use std::cell::Cell;
use std::ops::ControlFlow;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;

use notify::Event;
use tracing::{debug, error, trace, warn};

use crate::errors::SrcwatchError;
use crate::types::{ChangeEvent, ChangeKind, SessionState};
use crate::watch::config::WatchConfig;
use crate::watch::filter::decide;
use crate::watch::path_utils::normalize;

thread_local! {
    // Address of the gate whose callback is running on this thread, or 0.
    static DISPATCHING: Cell<usize> = const { Cell::new(0) };
}

/// Serialises callback invocations against `close()`.
///
/// A callback only starts while the state is `Watching`, and `close()` does
/// not return until any callback already running has finished. The one
/// exception is `close()` called from inside the callback itself, which only
/// flips the state.
#[derive(Debug)]
pub(crate) struct DispatchGate {
    state: AtomicU8,
    inflight: Mutex<()>,
}

impl DispatchGate {
    pub(crate) fn new() -> Self {
        Self {
            state: AtomicU8::new(SessionState::Created as u8),
            inflight: Mutex::new(()),
        }
    }

    pub(crate) fn state(&self) -> SessionState {
        SessionState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `Created -> Watching`. Returns false if the gate was not in `Created`.
    pub(crate) fn open(&self) -> bool {
        self.state
            .compare_exchange(
                SessionState::Created as u8,
                SessionState::Watching as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }

    /// Move to `Closed`. Returns true only for the call that made the
    /// transition.
    pub(crate) fn close(&self) -> bool {
        let previous = self.state.swap(SessionState::Closed as u8, Ordering::AcqRel);
        if previous == SessionState::Closed as u8 {
            return false;
        }
        if DISPATCHING.with(Cell::get) != self.id() {
            drop(self.inflight.lock().unwrap_or_else(|e| e.into_inner()));
        }
        true
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }

    /// Run `f` if the session is still watching. Returns false when closed.
    pub(crate) fn dispatch(&self, f: impl FnOnce()) -> bool {
        let _guard = self.inflight.lock().unwrap_or_else(|e| e.into_inner());
        if self.state() != SessionState::Watching {
            return false;
        }

        let previous = DISPATCHING.with(|d| d.replace(self.id()));
        let outcome = catch_unwind(AssertUnwindSafe(f));
        DISPATCHING.with(|d| d.set(previous));

        if outcome.is_err() {
            error!("on_change callback panicked; continuing to watch");
        }
        true
    }
}

/// Expand raw notify results into per-path change events.
///
/// Notification errors are logged and skipped. Access and meta events are
/// dropped. A path repeated within one event is reported once.
pub fn expand_events(raw: Vec<notify::Result<Event>>) -> Vec<ChangeEvent> {
    let mut out = Vec::new();

    for res in raw {
        let event = match res {
            Ok(event) => event,
            Err(err) => {
                let err = SrcwatchError::Notification(err);
                warn!(error = %err, "ignoring file notification error");
                continue;
            }
        };

        let Some(kind) = ChangeKind::from_event_kind(&event.kind) else {
            trace!(kind = ?event.kind, paths = ?event.paths, "not a change; skipping");
            continue;
        };

        let mut seen = Vec::with_capacity(event.paths.len());
        for path in event.paths {
            let path = normalize(&path);
            if !seen.contains(&path) {
                seen.push(path.clone());
                out.push(ChangeEvent::new(path, kind));
            }
        }
    }

    out
}

/// Collapse consecutive identical events. Order is otherwise untouched.
pub fn coalesce(events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
    let mut out: Vec<ChangeEvent> = Vec::with_capacity(events.len());
    for event in events {
        if out.last() != Some(&event) {
            out.push(event);
        }
    }
    out
}

/// Filter and dispatch one drained batch of raw events, in order.
///
/// Breaks once the gate reports the session closed.
pub(crate) fn process_batch(
    raw: Vec<notify::Result<Event>>,
    config: &WatchConfig,
    gate: &DispatchGate,
) -> ControlFlow<()> {
    for change in coalesce(expand_events(raw)) {
        // A custom predicate runs here, outside the gate.
        let decision = match catch_unwind(AssertUnwindSafe(|| decide(&change.file_path, config))) {
            Ok(decision) => decision,
            Err(_) => {
                error!(path = ?change.file_path, "should_watch_file panicked; skipping change");
                continue;
            }
        };
        debug!(
            path = ?change.file_path,
            kind = ?change.kind,
            accepted = decision.accepted,
            rule = decision.rule,
            "filtered change"
        );
        if !decision.accepted {
            continue;
        }

        let path = change.file_path;
        if !gate.dispatch(|| config.notify_change(path)) {
            return ControlFlow::Break(());
        }
    }
    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::AtomicBool;
    use std::sync::{mpsc, Arc};
    use std::thread;
    use std::time::Duration;

    #[test]
    fn close_from_own_callback_only_flips_state() {
        let gate = DispatchGate::new();
        assert!(gate.open());

        let mut closed = false;
        assert!(gate.dispatch(|| closed = gate.close()));
        assert!(closed);
        assert_eq!(gate.state(), SessionState::Closed);
        assert!(!gate.dispatch(|| {}));
    }

    #[test]
    fn close_from_another_sessions_callback_waits_for_inflight() {
        let a = DispatchGate::new();
        let b = Arc::new(DispatchGate::new());
        assert!(a.open());
        assert!(b.open());

        let finished = Arc::new(AtomicBool::new(false));
        let (started_tx, started_rx) = mpsc::channel();
        let worker = {
            let b = Arc::clone(&b);
            let finished = Arc::clone(&finished);
            thread::spawn(move || {
                b.dispatch(|| {
                    started_tx.send(()).unwrap();
                    thread::sleep(Duration::from_millis(200));
                    finished.store(true, Ordering::SeqCst);
                })
            })
        };
        started_rx.recv().unwrap();

        let mut closed = false;
        let mut finished_before_close_returned = false;
        assert!(a.dispatch(|| {
            closed = b.close();
            finished_before_close_returned = finished.load(Ordering::SeqCst);
        }));

        assert!(closed);
        assert!(finished_before_close_returned);
        assert!(worker.join().unwrap());
        assert_eq!(a.state(), SessionState::Watching);
    }

    #[test]
    fn panicking_callback_leaves_gate_usable() {
        let gate = DispatchGate::new();
        gate.open();

        assert!(gate.dispatch(|| panic!("callback failure")));
        let mut ran = false;
        assert!(gate.dispatch(|| ran = true));
        assert!(ran);
        assert!(gate.close());
    }
}
