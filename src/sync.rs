//! The reconciliation handle: shared graph state, echo suppression, and the
//! broadcast boundary.
//!
//! [`VaultSync`] is the single owner of the live graph and the recent-write
//! cache. Ingestion and submission callers never touch either directly; all
//! mutation funnels through [`VaultSync::submit`] and [`VaultSync::ingest`],
//! which serialize batch application through one apply guard. That guard
//! makes cross-batch ordering explicit, including for batches touching the
//! same node ID, instead of relying on scheduler behavior.

use parking_lot::RwLock;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{broadcast, Mutex};

use crate::{
    config::VaultConfig,
    echo::EchoCache,
    engine,
    error::VaultError,
    event::{candidate_delta, EventOrigin, FsChange, FsChangeKind, SyncEvent},
    graph::{Batch, Delta, Graph},
};

const BROADCAST_CAPACITY: usize = 64;

pub struct VaultSync {
    root: PathBuf,
    graph: Arc<RwLock<Graph>>,
    echo: EchoCache,
    apply_guard: Mutex<()>,
    events: broadcast::Sender<SyncEvent>,
}

impl VaultSync {
    /// Loads the vault at `config.root` and wraps it in a sync handle.
    pub fn new(config: &VaultConfig) -> Result<Self, VaultError> {
        let graph = engine::load_vault(&config.root, &config.excluded_dirs)?;
        tracing::info!(
            "Loaded vault {:?}: {} node(s)",
            config.root,
            graph.len()
        );
        let (events, _) = broadcast::channel(BROADCAST_CAPACITY);
        Ok(VaultSync {
            root: config.root.clone(),
            graph: Arc::new(RwLock::new(graph)),
            echo: EchoCache::new(config.echo_ttl()),
            apply_guard: Mutex::new(()),
            events,
        })
    }

    /// A snapshot of the current graph.
    pub fn graph(&self) -> Graph {
        self.graph.read().clone()
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    /// Subscribes to applied-batch broadcasts.
    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Applies an editing-surface batch: every delta is recorded as an
    /// own-write before the durable write happens, so the filesystem echo of
    /// this batch will be suppressed on its way back in.
    pub async fn submit(&self, batch: Batch) -> Result<Graph, VaultError> {
        let _guard = self.apply_guard.lock().await;
        self.apply_locked(batch, EventOrigin::Local).await
    }

    /// Reconciles one filesystem change: diff into a candidate delta, check
    /// it against the echo cache, and apply survivors.
    ///
    /// Returns the applied delta, or `None` when the change was a no-op or a
    /// suppressed echo of our own write.
    pub async fn ingest(&self, change: FsChange) -> Result<Option<Delta>, VaultError> {
        let _guard = self.apply_guard.lock().await;
        let Some(delta) = candidate_delta(&self.graph.read(), &change) else {
            return Ok(None);
        };
        if self.echo.is_own_write(&delta) {
            tracing::debug!("Suppressed echo of own write: {delta}");
            return Ok(None);
        }
        tracing::debug!("External change accepted: {delta}");

        match (&delta, change.kind) {
            // The file is already gone; the delete effect happened
            // externally and only the graph needs reconciling. Routing this
            // through the engine would fail its existence check.
            (Delta::Delete { id, .. }, FsChangeKind::Removed) => {
                let next = {
                    let mut graph = self.graph.write();
                    graph.remove_node(id);
                    graph.clone()
                };
                self.broadcast(vec![delta.clone()], next, EventOrigin::External);
            }
            _ => {
                self.apply_locked(vec![delta.clone()], EventOrigin::External)
                    .await?;
            }
        }
        Ok(Some(delta))
    }

    async fn apply_locked(
        &self,
        batch: Batch,
        origin: EventOrigin,
    ) -> Result<Graph, VaultError> {
        for delta in &batch {
            self.echo.mark_own_write(delta);
        }
        let current = self.graph.read().clone();
        let next = engine::apply(&current, &batch, &self.root).await?;
        *self.graph.write() = next.clone();
        self.broadcast(batch, next.clone(), origin);
        Ok(next)
    }

    fn broadcast(&self, batch: Batch, graph: Graph, origin: EventOrigin) {
        // No subscribers is fine; the handle works standalone.
        let _ = self.events.send(SyncEvent {
            batch,
            graph,
            origin,
        });
    }
}
