//! Shared test utilities for integration tests.
//!
//! Import from integration test files as:
//! ```ignore
//! mod common;
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Initialize tracing for tests, respecting RUST_LOG env var.
///
/// Safe to call multiple times — subsequent calls are no-ops.
#[allow(dead_code)]
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init()
        .ok();
}

/// Write a note file under the vault root, creating parent directories.
#[allow(dead_code)]
pub fn write_note(root: &Path, id: &str, content: &str) {
    let path = root.join(id);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Create a small vault: a parent note linking to a child, plus an
/// unconnected note in a subdirectory.
///
/// Returns the vault root (the temp dir's path).
#[allow(dead_code)]
pub fn create_test_vault(temp_dir: &TempDir) -> PathBuf {
    let root = temp_dir.path().to_path_buf();

    write_note(
        &root,
        "parent.md",
        "# Parent\n\nOwns [[child]].\n\n\n-----------------\n_Links:_\n- owns [[child.md]]\n",
    );
    write_note(&root, "child.md", "# Child\n\nLeaf content.\n");
    write_note(
        &root,
        "notes/aside.md",
        "---\ncolor: '#88ccff'\n---\n# Aside\n\nUnconnected.\n",
    );

    root
}
