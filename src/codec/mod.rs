//! Markdown ⇄ graph codec: frontmatter, titles, references, serialization.
//!
//! The codec is deliberately forgiving. Frontmatter that fails to parse
//! degrades to empty metadata, references that point nowhere become dangling
//! edges, and reference syntax that cannot name a target is left as inert
//! text. Parse failures never propagate as errors from this module's
//! extraction functions.

pub mod md;

pub use md::{extract_references, serialize, strip_links_section};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use titlecase::titlecase;

use crate::graph::{Node, NodeId};

/// Canonical node file extension, including the dot.
pub const CANONICAL_EXTENSION: &str = ".md";

/// An on-canvas position, preserved for clients that lay nodes out spatially.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Node metadata parsed from a leading YAML frontmatter block.
///
/// Known fields get typed accessors; everything else lands in `extra` and is
/// round-tripped verbatim through [`serialize`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Frontmatter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    /// Marks a "context" node, kept distinct from content nodes by clients.
    #[serde(default, skip_serializing_if = "is_false")]
    pub context: bool,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

fn is_false(flag: &bool) -> bool {
    !flag
}

impl Frontmatter {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.color.is_none()
            && self.position.is_none()
            && !self.context
            && self.extra.is_empty()
    }
}

/// Parses a leading `---` delimited YAML block.
///
/// Returns the parsed frontmatter and the remaining body text. Absent or
/// malformed blocks degrade to [`Frontmatter::default`] with the input
/// returned untouched; this function never fails.
pub fn extract_frontmatter(text: &str) -> (Frontmatter, &str) {
    let Some(block_start) = text
        .strip_prefix("---\n")
        .or_else(|| text.strip_prefix("---\r\n"))
    else {
        return (Frontmatter::default(), text);
    };
    let Some(end) = block_start.find("\n---") else {
        return (Frontmatter::default(), text);
    };
    let block = &block_start[..end];
    let mut body = &block_start[end + "\n---".len()..];
    body = body.strip_prefix('\r').unwrap_or(body);
    body = body.strip_prefix('\n').unwrap_or(body);

    if block.trim().is_empty() {
        return (Frontmatter::default(), body);
    }
    match serde_yaml::from_str::<Frontmatter>(block) {
        Ok(meta) => (meta, body),
        Err(err) => {
            tracing::debug!("Malformed frontmatter, degrading to empty metadata: {err}");
            (Frontmatter::default(), text)
        }
    }
}

/// Derives a display title: frontmatter-declared title, else the first
/// heading line in the body, else the node ID humanized.
pub fn derive_title(meta: &Frontmatter, body: &str, id: &str) -> String {
    if let Some(title) = meta.title.as_deref() {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }
    for line in body.lines() {
        let stripped = line.trim();
        if stripped.starts_with('#') {
            return stripped.trim_start_matches('#').trim().to_string();
        }
    }
    humanize_id(id)
}

/// Strips the path and extension from a node ID and humanizes the remaining
/// separators, e.g. `notes/data-model.md` → `Data Model`.
pub fn humanize_id(id: &str) -> String {
    let stem = id.rsplit('/').next().unwrap_or(id);
    let stem = stem
        .rsplit_once('.')
        .map(|(before, _ext)| before)
        .unwrap_or(stem);
    titlecase(&stem.replace(['-', '_'], " "))
}

/// Decodes a raw document into a [`Node`]: frontmatter extraction, reference
/// extraction against `known_ids`, and links-section stripping.
pub fn decode(id: &str, text: &str, known_ids: &BTreeSet<NodeId>) -> Node {
    let (meta, body) = extract_frontmatter(text);
    let edges = extract_references(body, known_ids);
    let content = strip_links_section(body).trim_end().to_string();
    Node {
        id: id.to_string(),
        content,
        edges,
        meta,
    }
}
