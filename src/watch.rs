//! File watching: feeding debounced filesystem events into ingestion.
//!
//! Requires the `service` feature. The watcher thread owned by
//! `notify-debouncer-full` filters raw notifications down to vault documents
//! (markdown extension, no dot-files, no excluded directories), reads their
//! content, and forwards [`FsChange`]s over a channel to a tokio task that
//! drives [`VaultSync::ingest`]. Echo suppression happens inside `ingest`,
//! so the watcher itself needs no pause flag around our own writes.

use notify_debouncer_full::{
    new_debouncer,
    notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher},
    DebounceEventResult, Debouncer, FileIdMap,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio::task::JoinHandle;

use crate::{
    config::VaultConfig,
    engine::node_id_for,
    error::VaultError,
    event::{FsChange, FsChangeKind},
    sync::VaultSync,
};

/// A running watcher bound to one vault. Dropping it stops both the watcher
/// thread and the ingestion task.
pub struct VaultWatcher {
    debouncer: Debouncer<RecommendedWatcher, FileIdMap>,
    root: PathBuf,
    ingest_handle: JoinHandle<()>,
}

impl VaultWatcher {
    /// Starts watching `sync`'s vault root. Must be called from within a
    /// tokio runtime; the ingestion task is spawned on it.
    pub fn spawn(sync: Arc<VaultSync>, config: &VaultConfig) -> Result<VaultWatcher, VaultError> {
        let root = sync.root().clone();
        let (change_tx, mut change_rx) = unbounded_channel::<FsChange>();

        let ingest_sync = sync.clone();
        let ingest_handle = tokio::spawn(async move {
            while let Some(change) = change_rx.recv().await {
                match ingest_sync.ingest(change).await {
                    Ok(Some(delta)) => {
                        tracing::info!("[watch] Reconciled external change: {delta}")
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!("[watch] Failed to reconcile external change: {err}")
                    }
                }
            }
        });

        let watched_root = root.clone();
        let excluded_dirs = config.excluded_dirs.clone();
        let mut debouncer = new_debouncer(
            config.debounce(),
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events.iter() {
                        let kind = match event.event.kind {
                            EventKind::Create(_) => FsChangeKind::Created,
                            EventKind::Modify(_) => FsChangeKind::Modified,
                            EventKind::Remove(_) => FsChangeKind::Removed,
                            _ => continue,
                        };
                        for path in event.paths.iter() {
                            forward_change(&watched_root, path, kind, &excluded_dirs, &change_tx);
                        }
                    }
                }
                Err(errors) => {
                    tracing::error!("[watch] Notify debouncer returned errors: {errors:?}");
                }
            },
        )?;
        debouncer.watcher().watch(&root, RecursiveMode::Recursive)?;
        tracing::info!("[watch] Watching vault {root:?}");

        Ok(VaultWatcher {
            debouncer,
            root,
            ingest_handle,
        })
    }

    pub fn stop(mut self) -> Result<(), VaultError> {
        let unwatch_res = self.debouncer.watcher().unwatch(&self.root);
        self.ingest_handle.abort();
        tracing::debug!("[watch] Unwatch(path: {:?}) = {:?}", self.root, unwatch_res);
        Ok(unwatch_res?)
    }
}

impl Drop for VaultWatcher {
    fn drop(&mut self) {
        self.ingest_handle.abort();
    }
}

fn forward_change(
    root: &Path,
    path: &Path,
    kind: FsChangeKind,
    excluded_dirs: &[String],
    change_tx: &UnboundedSender<FsChange>,
) {
    if !is_vault_document(root, path, excluded_dirs) {
        return;
    }
    let Some(id) = node_id_for(root, path) else {
        return;
    };
    let content = match kind {
        FsChangeKind::Removed => None,
        FsChangeKind::Created | FsChangeKind::Modified => {
            match std::fs::read_to_string(path) {
                Ok(text) => Some(text),
                Err(err) => {
                    // A create+delete inside one debounce window lands here.
                    tracing::warn!("[watch] Could not read changed file {path:?}: {err}");
                    return;
                }
            }
        }
    };
    let change = FsChange {
        path: id,
        kind,
        content,
    };
    if change_tx.send(change).is_err() {
        tracing::debug!("[watch] Ingest task gone, dropping change for {path:?}");
    }
}

fn is_vault_document(root: &Path, path: &Path, excluded_dirs: &[String]) -> bool {
    if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
        return false;
    }
    let Ok(relative) = path.strip_prefix(root) else {
        return false;
    };
    !relative.components().any(|component| {
        component
            .as_os_str()
            .to_str()
            .map(|name| {
                name.starts_with('.')
                    || excluded_dirs.iter().any(|dir| dir == name)
                    || crate::engine::EXCLUDED_DIRS.contains(&name)
            })
            .unwrap_or(true)
    })
}
