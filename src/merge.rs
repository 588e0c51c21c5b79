//! Append-vs-replace classification for open editing sessions.
//!
//! When an external change lands on a node that has an open, possibly-unsaved
//! editing session, the session cannot blindly take the new content without
//! destroying unsaved keystrokes. [`classify`] compares the session's last
//! durable snapshot against the new content and picks a merge strategy:
//! a pure append can be replayed onto the live buffer, anything else forces
//! a full replace.

use serde::{Deserialize, Serialize};

/// How an editing session should reconcile an external content change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MergeStrategy {
    /// The new content is exactly the previous content plus this non-empty
    /// suffix. The suffix can be appended to a buffer that has since
    /// diverged from the previous content.
    AppendOnly(String),
    /// Content shrank, was reordered, or was edited in the middle. The
    /// session buffer must be replaced outright, discarding unsaved edits.
    FullReplace,
}

/// Classifies the change from `previous` to `new`.
pub fn classify(previous: &str, new: &str) -> MergeStrategy {
    match new.strip_prefix(previous) {
        Some(suffix) if !suffix.is_empty() => MergeStrategy::AppendOnly(suffix.to_string()),
        _ => MergeStrategy::FullReplace,
    }
}

impl MergeStrategy {
    /// Applies this strategy to a live session buffer.
    ///
    /// `buffer` is the session's current, possibly-unsaved text; `new` is the
    /// externally observed content. An append-only change lands on the
    /// buffer, preserving local edits; a full replace takes `new` verbatim.
    pub fn merge(&self, buffer: &str, new: &str) -> String {
        match self {
            MergeStrategy::AppendOnly(suffix) => format!("{buffer}{suffix}"),
            MergeStrategy::FullReplace => new.to_string(),
        }
    }
}
