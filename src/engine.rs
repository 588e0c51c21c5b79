//! Delta application: folding batches onto the graph and onto disk.

use std::collections::BTreeSet;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use crate::{
    codec,
    error::VaultError,
    graph::{Batch, Delta, Graph, NodeId},
};

/// Directories never scanned when loading a vault.
pub const EXCLUDED_DIRS: &[&str] = &[".obsidian", ".git", "node_modules", "target"];

/// Applies `batch` to `graph`, writing every change through to disk under
/// `vault_root`, and returns the resulting graph.
///
/// Deltas apply strictly left-to-right; a later delta in the batch observes
/// the effects of earlier ones. The input graph is never mutated. The batch
/// either fully succeeds or fails with no in-memory change: the fold runs on
/// a scratch copy that is only returned on success.
///
/// An upsert serializes the node and writes `vault_root/<id>`, creating
/// parent directories as needed. A delete removes the backing file and fails
/// the whole batch if that file does not exist; the engine never claims a
/// deletion succeeded when on-disk state did not change. On success the
/// deleted node is also stripped as a target from every remaining node's
/// edge list.
///
/// Files written before a mid-batch failure stay on disk. The in-memory
/// graph is atomic either way, and a running watcher re-observes those files
/// and reconciles them as external changes.
pub async fn apply(graph: &Graph, batch: &Batch, vault_root: &Path) -> Result<Graph, VaultError> {
    let mut next = graph.clone();
    for delta in batch {
        tracing::debug!("Applying {delta}");
        match delta {
            Delta::Upsert { node, .. } => {
                let text = codec::serialize(node)?;
                let path = vault_root.join(&node.id);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, text.as_bytes()).await?;
                next.insert(node.clone());
            }
            Delta::Delete { id, .. } => {
                let path = vault_root.join(id);
                tokio::fs::remove_file(&path).await.map_err(|err| {
                    if err.kind() == io::ErrorKind::NotFound {
                        VaultError::NotFound(format!(
                            "cannot delete '{id}': backing file {path:?} does not exist"
                        ))
                    } else {
                        VaultError::from(err)
                    }
                })?;
                next.remove_node(id);
            }
        }
    }
    Ok(next)
}

/// Loads a graph from every markdown file under `vault_root`.
///
/// Two passes, the way reference resolution requires: first collect the IDs
/// of all candidate files, then decode each file against the full ID set so
/// that forward references resolve regardless of scan order. Files that fail
/// to read are logged and skipped rather than failing the load.
pub fn load_vault(vault_root: &Path, excluded_dirs: &[String]) -> Result<Graph, VaultError> {
    if !vault_root.is_dir() {
        return Err(VaultError::NotFound(format!(
            "vault root {vault_root:?} is not a directory"
        )));
    }

    let mut documents: Vec<(NodeId, std::path::PathBuf)> = Vec::new();
    let walker = WalkDir::new(vault_root)
        .into_iter()
        .filter_entry(|entry| !is_excluded(entry, excluded_dirs));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!("Skipping unreadable vault entry: {err}");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("md") {
            continue;
        }
        match node_id_for(vault_root, path) {
            Some(id) => documents.push((id, path.to_path_buf())),
            None => tracing::warn!("Skipping non-relative vault path {path:?}"),
        }
    }

    let known_ids: BTreeSet<NodeId> = documents.iter().map(|(id, _)| id.clone()).collect();
    tracing::debug!("Loading {} documents from {vault_root:?}", documents.len());

    let mut graph = Graph::default();
    for (id, path) in documents {
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                graph.insert(codec::decode(&id, &text, &known_ids));
            }
            Err(err) => {
                tracing::warn!("Failed to read {path:?}, skipping: {err}");
            }
        }
    }
    Ok(graph)
}

/// Derives the node ID for an absolute path inside the vault: the relative
/// path with `/` separators, extension included.
pub fn node_id_for(vault_root: &Path, path: &Path) -> Option<NodeId> {
    let relative = path.strip_prefix(vault_root).ok()?;
    let id = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    (!id.is_empty()).then_some(id)
}

fn is_excluded(entry: &walkdir::DirEntry, excluded_dirs: &[String]) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .map(|name| {
            name.starts_with('.')
                || EXCLUDED_DIRS.contains(&name)
                || excluded_dirs.iter().any(|dir| dir == name)
        })
        .unwrap_or(false)
}
