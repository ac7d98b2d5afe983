// src/watch/filter.rs

//! The change filter: decides whether a changed path reaches the callback.
//!
//! The policy is an ordered rule chain evaluated short-circuit:
//!
//! 1. anything at or below `artifacts_dir` is rejected, always;
//! 2. a caller-supplied `should_watch_file` predicate decides everything else;
//! 3. otherwise the built-in heuristic from [`crate::watch::patterns`] applies.
//!
//! No I/O and no state. Paths are lexically normalised on entry.

use std::path::Path;

use crate::watch::config::WatchConfig;
use crate::watch::path_utils::{is_within, normalize};
use crate::watch::patterns::default_wants;

/// Outcome of a single rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Reject,
    /// This rule has no opinion; ask the next one.
    Continue,
}

type Rule = fn(&Path, &WatchConfig) -> Verdict;

const RULES: &[(&str, Rule)] = &[
    ("artifacts", reject_artifacts),
    ("should_watch_file", custom_predicate),
    ("default", default_heuristic),
];

/// Final decision plus the rule that made it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub accepted: bool,
    pub rule: &'static str,
}

/// Run the rule chain and report which rule decided.
pub fn decide(file_path: &Path, config: &WatchConfig) -> Decision {
    let path = normalize(file_path);
    for &(name, rule) in RULES {
        match rule(&path, config) {
            Verdict::Accept => return Decision { accepted: true, rule: name },
            Verdict::Reject => return Decision { accepted: false, rule: name },
            Verdict::Continue => {}
        }
    }
    // Unreachable while the default rule is last: it never continues.
    Decision { accepted: true, rule: "fallthrough" }
}

/// Whether a change to `file_path` should be reported to the caller.
pub fn should_watch_file_combined(file_path: &Path, config: &WatchConfig) -> bool {
    decide(file_path, config).accepted
}

fn reject_artifacts(path: &Path, config: &WatchConfig) -> Verdict {
    if is_within(path, config.artifacts_dir()) {
        Verdict::Reject
    } else {
        Verdict::Continue
    }
}

fn custom_predicate(path: &Path, config: &WatchConfig) -> Verdict {
    match config.should_watch_file() {
        Some(predicate) if predicate(path) => Verdict::Accept,
        Some(_) => Verdict::Reject,
        None => Verdict::Continue,
    }
}

fn default_heuristic(path: &Path, config: &WatchConfig) -> Verdict {
    if default_wants(path, config.source_dir()) {
        Verdict::Accept
    } else {
        Verdict::Reject
    }
}
