//! Graph value types and pure graph-wide transforms.
//!
//! Everything here is an immutable value: [`apply`](crate::engine::apply) and
//! [`reverse`](Graph::reverse) return new [`Graph`] values and never mutate
//! their inputs. Mutating accessors exist only for building up scratch copies.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use crate::codec::Frontmatter;

/// A node identifier: the node's on-disk location relative to the vault root,
/// extension included (e.g. `notes/intro.md`).
pub type NodeId = String;

/// An outgoing reference to another node, labeled with the free text that
/// preceded the reference marker on its source line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub target: NodeId,
    pub label: String,
}

impl Edge {
    pub fn new(target: impl Into<NodeId>, label: impl Into<String>) -> Self {
        Edge {
            target: target.into(),
            label: label.into(),
        }
    }
}

/// A vault document: body content with frontmatter and the trailing links
/// section stripped out, plus its discovered outgoing edges and metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub content: String,
    /// Ordered by discovery, deduplicated by target.
    pub edges: Vec<Edge>,
    pub meta: Frontmatter,
}

impl Node {
    pub fn new(id: impl Into<NodeId>, content: impl Into<String>) -> Self {
        Node {
            id: id.into(),
            content: content.into(),
            ..Default::default()
        }
    }

    pub fn with_edges(mut self, edges: Vec<Edge>) -> Self {
        self.edges = edges;
        self
    }
}

/// A single graph change. `previous` carries the node's prior value when the
/// producer had one, so consumers can diff without a second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Delta {
    Upsert {
        node: Node,
        previous: Option<Node>,
    },
    Delete {
        id: NodeId,
        previous: Option<Node>,
    },
}

/// An ordered sequence of deltas applied left-to-right as a unit. Each delta
/// observes the effects of the ones before it in the same batch.
pub type Batch = Vec<Delta>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DeltaKind {
    Upsert,
    Delete,
}

impl Delta {
    pub fn node_id(&self) -> &NodeId {
        match self {
            Delta::Upsert { node, .. } => &node.id,
            Delta::Delete { id, .. } => id,
        }
    }

    pub fn kind(&self) -> DeltaKind {
        match self {
            Delta::Upsert { .. } => DeltaKind::Upsert,
            Delta::Delete { .. } => DeltaKind::Delete,
        }
    }
}

impl Display for Delta {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Delta::Upsert { node, .. } => write!(f, "Upsert({})", node.id),
            Delta::Delete { id, .. } => write!(f, "Delete({id})"),
        }
    }
}

/// The document graph: a map from node ID to node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph(pub BTreeMap<NodeId, Node>);

impl Graph {
    pub fn get(&self, id: &str) -> Option<&Node> {
        self.0.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.0.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &NodeId> {
        self.0.keys()
    }

    pub fn insert(&mut self, node: Node) -> Option<Node> {
        self.0.insert(node.id.clone(), node)
    }

    /// Removes a node and strips it as a target from every remaining node's
    /// outgoing-edge list. Returns the removed node, if any.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let removed = self.0.remove(id);
        if removed.is_some() {
            for node in self.0.values_mut() {
                node.edges.retain(|edge| edge.target != id);
            }
        }
        removed
    }

    /// Reverses every edge: A→B becomes B→A, labels travelling with the edge.
    ///
    /// Used to translate between the on-disk "child declares its parent"
    /// convention and the in-memory "parent enumerates its children" one.
    /// Self-inverse for any graph with no duplicate edges per node.
    pub fn reverse(&self) -> Graph {
        // First pass: index incoming edges by target.
        let mut incoming: BTreeMap<&str, Vec<Edge>> = BTreeMap::new();
        for node in self.nodes() {
            for edge in &node.edges {
                incoming
                    .entry(edge.target.as_str())
                    .or_default()
                    .push(Edge::new(node.id.clone(), edge.label.clone()));
            }
        }
        // Second pass: rebuild each node's outgoing list from the index.
        // Nodes without incoming edges get an explicit empty list.
        let mut reversed = BTreeMap::new();
        for node in self.nodes() {
            let mut next = node.clone();
            next.edges = incoming.remove(node.id.as_str()).unwrap_or_default();
            reversed.insert(next.id.clone(), next);
        }
        Graph(reversed)
    }
}

impl FromIterator<Node> for Graph {
    fn from_iter<I: IntoIterator<Item = Node>>(iter: I) -> Self {
        Graph(
            iter.into_iter()
                .map(|node| (node.id.clone(), node))
                .collect(),
        )
    }
}
