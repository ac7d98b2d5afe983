use std::fmt;
use std::path::PathBuf;

use notify::EventKind;

/// Lifecycle of a single watch session.
///
/// `Created -> Watching -> Closed`. `Closed` is terminal; a new session has
/// to be started to watch again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum SessionState {
    /// Configuration accepted, subscription not yet active.
    Created = 0,
    /// Subscription active, accepted changes reach the callback.
    Watching = 1,
    /// Subscription released; the callback will not be invoked again.
    Closed = 2,
}

impl SessionState {
    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            0 => SessionState::Created,
            1 => SessionState::Watching,
            _ => SessionState::Closed,
        }
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SessionState::Created => "created",
            SessionState::Watching => "watching",
            SessionState::Closed => "closed",
        };
        f.write_str(s)
    }
}

/// What happened to a path, reduced to the cases the watcher reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    /// Map a raw `notify` event kind. Reads (access/open/close) and meta
    /// events yield `None` and are never treated as changes.
    pub fn from_event_kind(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(ChangeKind::Created),
            EventKind::Modify(_) => Some(ChangeKind::Modified),
            EventKind::Remove(_) => Some(ChangeKind::Removed),
            EventKind::Access(_) | EventKind::Any | EventKind::Other => None,
        }
    }
}

/// One raw change for one path, as handed to the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub file_path: PathBuf,
    pub kind: ChangeKind,
}

impl ChangeEvent {
    pub fn new(file_path: impl Into<PathBuf>, kind: ChangeKind) -> Self {
        Self {
            file_path: file_path.into(),
            kind,
        }
    }
}
