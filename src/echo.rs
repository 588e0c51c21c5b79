//! Echo suppression: deduplicating self-originated writes.
//!
//! Every durable write this system performs comes back around as a
//! filesystem notification. Without suppression, that echo would be diffed
//! into a candidate delta and re-applied as if it were an independent
//! external change, duplicating nodes. [`EchoCache`] records a fingerprint
//! of each own-write just before the write happens; the ingestion path asks
//! [`EchoCache::is_own_write`] before reconciling any candidate.
//!
//! This cache is the system's only concurrency control between the watcher
//! path and the write path. Correctness rests on the TTL exceeding the real
//! write+notify round-trip latency, a soft real-time assumption, not a hard
//! guarantee. The TTL is configurable for platforms where notifications are
//! slower; locking was deliberately traded away for simplicity.

use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::graph::{Delta, DeltaKind, Node, NodeId};

/// Default entry time-to-live, chosen to exceed a typical OS write+notify
/// round trip.
pub const DEFAULT_ECHO_TTL: Duration = Duration::from_millis(300);

type Fingerprint = [u8; 32];

#[derive(Debug, Clone)]
struct WriteRecord {
    kind: DeltaKind,
    fingerprint: Fingerprint,
    at: Instant,
}

/// Short-lived, content-fingerprinted record of self-originated writes.
#[derive(Debug)]
pub struct EchoCache {
    ttl: Duration,
    entries: Mutex<HashMap<NodeId, Vec<WriteRecord>>>,
}

impl Default for EchoCache {
    fn default() -> Self {
        EchoCache::new(DEFAULT_ECHO_TTL)
    }
}

impl EchoCache {
    pub fn new(ttl: Duration) -> Self {
        EchoCache {
            ttl,
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Records `delta` as an own-write. Call at the moment the delta is
    /// about to be durably written, before the write completes, so the
    /// notification can never race ahead of the record.
    pub fn mark_own_write(&self, delta: &Delta) {
        let record = WriteRecord {
            kind: delta.kind(),
            fingerprint: delta_fingerprint(delta),
            at: Instant::now(),
        };
        let mut entries = self.entries.lock();
        let records = entries.entry(delta.node_id().clone()).or_default();
        records.push(record);
        tracing::debug!(
            "Marked own write {} ({} recent record(s) for this node)",
            delta,
            records.len()
        );
    }

    /// Whether `candidate` matches an unexpired own-write record of the same
    /// operation kind and normalized content.
    ///
    /// Matching never consumes the record: a single physical write can
    /// legitimately produce more than one notification, and every one of
    /// them must be recognized. Records only leave by TTL expiry.
    pub fn is_own_write(&self, candidate: &Delta) -> bool {
        let fingerprint = delta_fingerprint(candidate);
        let kind = candidate.kind();
        let mut entries = self.entries.lock();
        self.prune(&mut entries);
        entries
            .get(candidate.node_id().as_str())
            .map(|records| {
                records
                    .iter()
                    .any(|record| record.kind == kind && record.fingerprint == fingerprint)
            })
            .unwrap_or(false)
    }

    /// Whether every delta in `batch` matches an own-write record. Any
    /// unmatched member forces the whole batch to be treated as external.
    pub fn is_own_batch(&self, batch: &[Delta]) -> bool {
        !batch.is_empty() && batch.iter().all(|delta| self.is_own_write(delta))
    }

    fn prune(&self, entries: &mut HashMap<NodeId, Vec<WriteRecord>>) {
        let now = Instant::now();
        entries.retain(|_, records| {
            records.retain(|record| now.duration_since(record.at) < self.ttl);
            !records.is_empty()
        });
    }
}

/// Fingerprints a delta over its normalized content.
///
/// Normalization strips all whitespace and bracket markers so that
/// serialization-format noise (link rewrites, trailing newlines) cannot
/// cause a false negative. Deletes carry no content and match on kind alone.
fn delta_fingerprint(delta: &Delta) -> Fingerprint {
    match delta {
        Delta::Upsert { node, .. } => fingerprint(&canonical_content(node)),
        Delta::Delete { .. } => fingerprint(""),
    }
}

fn canonical_content(node: &Node) -> String {
    let mut text = node.content.clone();
    for edge in &node.edges {
        text.push_str(&edge.label);
        text.push_str(&edge.target);
    }
    if !node.meta.is_empty() {
        text.push_str(&serde_yaml::to_string(&node.meta).unwrap_or_default());
    }
    text
}

/// Hashes `content` with whitespace and bracket markers removed.
pub fn fingerprint(content: &str) -> Fingerprint {
    let normalized: Vec<u8> = content
        .bytes()
        .filter(|byte| !byte.is_ascii_whitespace() && *byte != b'[' && *byte != b']')
        .collect();
    let mut hasher = Sha256::new();
    hasher.update(&normalized);
    hasher.finalize().into()
}
