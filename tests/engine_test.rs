//! Delta application engine: durability, atomicity, and fail-fast deletes.

mod common;

use std::collections::BTreeSet;
use tempfile::tempdir;
use test_log::test;

use vaultgraph::{
    codec,
    engine::{apply, load_vault},
    error::VaultError,
    graph::{Delta, Edge, Graph, Node, NodeId},
};

use common::{create_test_vault, write_note};

fn upsert(node: Node) -> Delta {
    Delta::Upsert {
        node,
        previous: None,
    }
}

fn delete(id: &str) -> Delta {
    Delta::Delete {
        id: id.to_string(),
        previous: None,
    }
}

#[test(tokio::test)]
async fn upsert_writes_the_serialized_node_to_disk() {
    let temp = tempdir().unwrap();
    let root = temp.path();

    let node = Node::new("notes/deep/fresh.md", "# Fresh\nbody")
        .with_edges(vec![Edge::new("other.md", "mentions")]);
    let graph = apply(&Graph::default(), &vec![upsert(node.clone())], root)
        .await
        .unwrap();

    assert!(graph.contains("notes/deep/fresh.md"));
    let on_disk = std::fs::read_to_string(root.join("notes/deep/fresh.md")).unwrap();
    assert_eq!(on_disk, codec::serialize(&node).unwrap());
}

#[test(tokio::test)]
async fn the_input_graph_is_never_mutated() {
    let temp = tempdir().unwrap();
    let root = create_test_vault(&temp);
    let graph = load_vault(&root, &[]).unwrap();
    let snapshot = graph.clone();

    let batch = vec![
        upsert(Node::new("new.md", "# New")),
        delete("child.md"),
    ];
    let next = apply(&graph, &batch, &root).await.unwrap();

    assert_eq!(graph, snapshot, "input graph must be unchanged");
    assert_ne!(next, graph);
    assert!(next.contains("new.md"));
    assert!(!next.contains("child.md"));
}

#[test(tokio::test)]
async fn deleting_a_node_with_a_missing_file_fails_fast() {
    let temp = tempdir().unwrap();
    let root = temp.path();

    let graph: Graph = [Node::new("phantom.md", "never written")]
        .into_iter()
        .collect();
    let result = apply(&graph, &vec![delete("phantom.md")], root).await;

    match result {
        Err(VaultError::NotFound(msg)) => assert!(msg.contains("phantom.md")),
        other => panic!("expected NotFound, got {other:?}"),
    }
    assert!(graph.contains("phantom.md"), "graph must be unchanged");
}

#[test(tokio::test)]
async fn cascading_delete_strips_edges_from_survivors() {
    let temp = tempdir().unwrap();
    let root = create_test_vault(&temp);
    let graph = load_vault(&root, &[]).unwrap();
    assert!(graph
        .get("parent.md")
        .unwrap()
        .edges
        .iter()
        .any(|edge| edge.target == "child.md"));

    let next = apply(&graph, &vec![delete("child.md")], &root)
        .await
        .unwrap();

    assert!(!next.contains("child.md"));
    assert!(!root.join("child.md").exists());
    assert!(next.contains("parent.md"));
    assert!(next
        .get("parent.md")
        .unwrap()
        .edges
        .iter()
        .all(|edge| edge.target != "child.md"));

    // Deleting again must fail: the backing file is already gone.
    assert!(apply(&next, &vec![delete("child.md")], &root).await.is_err());
}

#[test(tokio::test)]
async fn a_failing_batch_commits_nothing_in_memory() {
    let temp = tempdir().unwrap();
    let root = temp.path();
    let graph = Graph::default();

    let batch = vec![
        upsert(Node::new("written.md", "# Written")),
        delete("missing.md"),
    ];
    let result = apply(&graph, &batch, root).await;

    assert!(result.is_err());
    assert!(graph.is_empty(), "no partial graph commit");
    // The file written before the failure stays on disk; a running watcher
    // re-observes it and reconciles it as an external change.
    assert!(root.join("written.md").exists());
}

#[test(tokio::test)]
async fn later_deltas_observe_earlier_ones_in_the_same_batch() {
    let temp = tempdir().unwrap();
    let root = temp.path();

    let batch = vec![
        upsert(Node::new("ephemeral.md", "# Short-lived")),
        delete("ephemeral.md"),
    ];
    let graph = apply(&Graph::default(), &batch, root).await.unwrap();

    assert!(graph.is_empty());
    assert!(!root.join("ephemeral.md").exists());
}

#[test]
fn load_vault_resolves_references_across_scan_order() {
    let temp = tempdir().unwrap();
    let root = create_test_vault(&temp);

    let graph = load_vault(&root, &[]).unwrap();
    assert_eq!(graph.len(), 3);

    let parent = graph.get("parent.md").unwrap();
    // Both the inline reference and the links-section line name child.md;
    // they collapse to one edge with the first occurrence's label.
    assert_eq!(parent.edges, vec![Edge::new("child.md", "Owns")]);
    assert_eq!(parent.content.trim_end(), "# Parent\n\nOwns [[child]].");

    let aside = graph.get("notes/aside.md").unwrap();
    assert_eq!(aside.meta.color.as_deref(), Some("#88ccff"));
}

#[test]
fn load_vault_skips_excluded_and_hidden_directories() {
    let temp = tempdir().unwrap();
    let root = create_test_vault(&temp);
    write_note(&root, ".obsidian/workspace.md", "editor state");
    write_note(&root, "archive/old.md", "# Old");
    write_note(&root, "readme.txt", "not markdown");

    let graph = load_vault(&root, &["archive".to_string()]).unwrap();
    let ids: BTreeSet<&NodeId> = graph.ids().collect();
    assert!(!ids.iter().any(|id| id.contains(".obsidian")));
    assert!(!ids.iter().any(|id| id.contains("archive")));
    assert_eq!(graph.len(), 3);
}

#[test]
fn load_vault_requires_an_existing_root() {
    let temp = tempdir().unwrap();
    let missing = temp.path().join("not-here");
    assert!(matches!(
        load_vault(&missing, &[]),
        Err(VaultError::NotFound(_))
    ));
}
