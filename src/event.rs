//! Boundary event types: filesystem changes in, applied batches out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};

use crate::{
    codec,
    graph::{Batch, Delta, Graph, NodeId},
};

/// Where an applied batch originated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum EventOrigin {
    /// Submitted by the editing surface through [`VaultSync::submit`].
    ///
    /// [`VaultSync::submit`]: crate::sync::VaultSync::submit
    Local,
    /// Observed on the filesystem and reconciled through ingestion.
    #[default]
    External,
}

/// A filesystem change reported by the watcher (or simulated by tests),
/// relative to the vault root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FsChange {
    /// Node ID form of the changed path.
    pub path: NodeId,
    pub kind: FsChangeKind,
    /// Full file content for creations and modifications; `None` for
    /// removals.
    pub content: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FsChangeKind {
    Created,
    Modified,
    Removed,
}

impl Display for FsChangeKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            FsChangeKind::Created => write!(f, "Created"),
            FsChangeKind::Modified => write!(f, "Modified"),
            FsChangeKind::Removed => write!(f, "Removed"),
        }
    }
}

/// Broadcast after every successful batch application: the applied batch and
/// the resulting graph snapshot.
#[derive(Debug, Clone)]
pub struct SyncEvent {
    pub batch: Batch,
    pub graph: Graph,
    pub origin: EventOrigin,
}

/// Diffs a filesystem change against the current graph, producing the
/// candidate delta that would reconcile the two.
///
/// Returns `None` when there is nothing to reconcile: a removal of an
/// unknown node, or content identical to what the graph already holds.
pub fn candidate_delta(graph: &Graph, change: &FsChange) -> Option<Delta> {
    match change.kind {
        FsChangeKind::Removed => {
            let previous = graph.get(&change.path)?;
            Some(Delta::Delete {
                id: change.path.clone(),
                previous: Some(previous.clone()),
            })
        }
        FsChangeKind::Created | FsChangeKind::Modified => {
            let text = change.content.as_deref()?;
            let mut known_ids: BTreeSet<NodeId> = graph.ids().cloned().collect();
            known_ids.insert(change.path.clone());
            let node = codec::decode(&change.path, text, &known_ids);
            let previous = graph.get(&change.path);
            if previous == Some(&node) {
                tracing::debug!(
                    "{} event for '{}' matches current graph state, nothing to reconcile",
                    change.kind,
                    change.path
                );
                return None;
            }
            Some(Delta::Upsert {
                node,
                previous: previous.cloned(),
            })
        }
    }
}
