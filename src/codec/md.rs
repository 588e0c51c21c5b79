//! Wikilink reference extraction and node serialization.
//!
//! The on-disk document layout is: optional YAML frontmatter, body content,
//! then a trailing links section introduced by a divider line:
//!
//! ```markdown
//! # Some Node
//!
//! Body text may reference [[other-node]] inline.
//!
//!
//! -----------------
//! _Links:_
//! - extends [[other-node.md]]
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::fmt::Write;

use crate::{
    codec::CANONICAL_EXTENSION,
    error::VaultError,
    graph::{Edge, Node, NodeId},
};

/// Divider line that introduces the trailing links section.
pub const LINKS_DIVIDER: &str = "-----------------";

/// Header line of the trailing links section.
pub const LINKS_HEADER: &str = "_Links:_";

/// Bracketed reference marker, whitespace-tolerant inside the delimiters.
static REFERENCE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[([^\[\]]*)\]\]").expect("reference pattern is valid"));

/// Scans `text` for `[[target]]` reference markers and resolves them against
/// `known_ids`, producing outgoing edges ordered by discovery.
///
/// Resolution priority, all comparisons case-insensitive:
/// 1. exact match against a known ID;
/// 2. match after re-attaching the canonical extension;
/// 3. match after stripping leading `./`/`../` prefixes and the extension.
///
/// Unresolved targets pass through unchanged as dangling edges; the node they
/// name may simply not exist yet. Markers with an empty target are inert
/// text. Duplicate targets collapse to the first occurrence.
///
/// The label is the text on the target's line before the marker, trimmed,
/// with a leading list dash stripped so links-section lines round-trip.
pub fn extract_references(text: &str, known_ids: &BTreeSet<NodeId>) -> Vec<Edge> {
    let by_lowercase: HashMap<String, &str> = known_ids
        .iter()
        .map(|id| (id.to_lowercase(), id.as_str()))
        .collect();

    let mut edges = Vec::new();
    let mut seen = BTreeSet::new();
    for line in text.lines() {
        for captures in REFERENCE_RE.captures_iter(line) {
            let marker = captures.get(0).expect("capture 0 is the whole match");
            let raw = captures[1].trim();
            if raw.is_empty() {
                continue;
            }
            let target = resolve_target(raw, &by_lowercase);
            if !seen.insert(target.clone()) {
                continue;
            }
            let label = clean_label(&line[..marker.start()]);
            edges.push(Edge { target, label });
        }
    }
    edges
}

fn resolve_target(raw: &str, by_lowercase: &HashMap<String, &str>) -> NodeId {
    let key = raw.to_lowercase();
    if let Some(id) = by_lowercase.get(&key) {
        return (*id).to_string();
    }
    let with_extension = format!("{key}{CANONICAL_EXTENSION}");
    if let Some(id) = by_lowercase.get(&with_extension) {
        return (*id).to_string();
    }
    // Relative-path prefixes: links written from a sibling's point of view.
    let mut trimmed = key.as_str();
    while let Some(rest) = trimmed
        .strip_prefix("./")
        .or_else(|| trimmed.strip_prefix("../"))
    {
        trimmed = rest;
    }
    if trimmed != key {
        if let Some(id) = by_lowercase.get(trimmed) {
            return (*id).to_string();
        }
        let stem = trimmed.strip_suffix(CANONICAL_EXTENSION).unwrap_or(trimmed);
        if let Some(id) = by_lowercase.get(&format!("{stem}{CANONICAL_EXTENSION}")) {
            return (*id).to_string();
        }
    }
    tracing::debug!("Unresolved reference target '{raw}', retaining as dangling edge");
    raw.to_string()
}

fn clean_label(prefix: &str) -> String {
    let label = prefix.trim();
    let label = label.strip_prefix('-').map(str::trim_start).unwrap_or(label);
    label.trim_end().to_string()
}

/// Returns the portion of `body` before the trailing links section.
///
/// The body ends at the first line consisting solely of the divider, the way
/// the on-disk format terminates content. Text after it is reference
/// bookkeeping, not content.
pub fn strip_links_section(body: &str) -> &str {
    for (offset, line) in line_offsets(body) {
        if line.trim() == LINKS_DIVIDER {
            return &body[..offset];
        }
    }
    body
}

fn line_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    text.lines().scan(0usize, move |offset, line| {
        let start = *offset;
        // +1 for the newline; harmless overshoot on the final line.
        *offset = start + line.len() + 1;
        Some((start, line))
    })
}

/// Serializes a node to its on-disk text: frontmatter block (when non-empty),
/// body content, then one labeled reference line per outgoing edge.
///
/// Inverse of extraction: for any node whose edges all resolve,
/// `extract_references(serialize(n))` yields back `n.edges`.
pub fn serialize(node: &Node) -> Result<String, VaultError> {
    let mut out = String::new();
    if !node.meta.is_empty() {
        let yaml = serde_yaml::to_string(&node.meta)?;
        out.push_str("---\n");
        out.push_str(&yaml);
        if !yaml.ends_with('\n') {
            out.push('\n');
        }
        out.push_str("---\n");
    }
    out.push_str(node.content.trim_end());
    out.push('\n');
    if !node.edges.is_empty() {
        write!(out, "\n\n\n{LINKS_DIVIDER}\n{LINKS_HEADER}\n")?;
        for edge in &node.edges {
            if edge.label.is_empty() {
                writeln!(out, "- [[{}]]", edge.target)?;
            } else {
                writeln!(out, "- {} [[{}]]", edge.label, edge.target)?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, Frontmatter};

    fn known(ids: &[&str]) -> BTreeSet<NodeId> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn labels_run_from_line_start_to_the_marker() {
        let ids = known(&["intro.md", "architecture.md"]);
        let edges = extract_references(
            "This references [[intro]] and extends [[architecture]].",
            &ids,
        );
        assert_eq!(
            edges,
            vec![
                Edge::new("intro.md", "This references"),
                Edge::new(
                    "architecture.md",
                    "This references [[intro]] and extends"
                ),
            ]
        );
    }

    #[test]
    fn resolution_tries_exact_then_extension_then_relative() {
        let ids = known(&["notes/intro.md", "plain.md"]);
        let edges = extract_references(
            "a [[notes/intro.md]]\nb [[plain]]\nc [[../plain.md]]\nd [[./notes/intro]]",
            &ids,
        );
        let targets: Vec<&str> = edges.iter().map(|e| e.target.as_str()).collect();
        // Relative variants resolve to already-seen IDs and collapse away.
        assert_eq!(targets, vec!["notes/intro.md", "plain.md"]);
    }

    #[test]
    fn resolution_is_case_insensitive() {
        let ids = known(&["Notes/Intro.md"]);
        let edges = extract_references("see [[notes/intro]]", &ids);
        assert_eq!(edges, vec![Edge::new("Notes/Intro.md", "see")]);
    }

    #[test]
    fn whitespace_inside_brackets_is_tolerated() {
        let ids = known(&["intro.md"]);
        let edges = extract_references("see [[  intro  ]]", &ids);
        assert_eq!(edges, vec![Edge::new("intro.md", "see")]);
    }

    #[test]
    fn unresolved_targets_become_dangling_edges() {
        let edges = extract_references("points at [[future-node]]", &known(&[]));
        assert_eq!(edges, vec![Edge::new("future-node", "points at")]);
    }

    #[test]
    fn empty_markers_are_inert() {
        assert!(extract_references("nothing here [[ ]] or [[]]", &known(&[])).is_empty());
    }

    #[test]
    fn duplicate_targets_keep_the_first_label() {
        let ids = known(&["intro.md"]);
        let edges = extract_references("first [[intro]]\nsecond [[intro.md]]", &ids);
        assert_eq!(edges, vec![Edge::new("intro.md", "first")]);
    }

    #[test]
    fn list_dashes_are_stripped_from_labels() {
        let ids = known(&["child.md"]);
        let edges = extract_references("- extends [[child.md]]", &ids);
        assert_eq!(edges, vec![Edge::new("child.md", "extends")]);
    }

    #[test]
    fn serialize_emits_frontmatter_body_then_links() {
        let mut node = Node::new("doc.md", "# Doc\nbody");
        node.meta = Frontmatter {
            color: Some("red".into()),
            ..Default::default()
        };
        node.edges = vec![Edge::new("child.md", "extends"), Edge::new("bare.md", "")];
        let text = serialize(&node).unwrap();
        assert!(text.starts_with("---\ncolor: red\n---\n# Doc\nbody\n"));
        assert!(text.contains("\n-----------------\n_Links:_\n"));
        assert!(text.contains("- extends [[child.md]]\n"));
        assert!(text.contains("- [[bare.md]]\n"));
    }

    #[test]
    fn serialize_without_edges_or_meta_is_just_the_body() {
        let node = Node::new("doc.md", "plain body");
        assert_eq!(serialize(&node).unwrap(), "plain body\n");
    }

    #[test]
    fn extraction_inverts_serialization() {
        let ids = known(&["intro.md", "architecture.md", "doc.md"]);
        let body = "This references [[intro]] and extends [[architecture]].";
        let node = decode("doc.md", body, &ids);
        assert_eq!(node.edges.len(), 2);

        let round_tripped = decode("doc.md", &serialize(&node).unwrap(), &ids);
        assert_eq!(round_tripped.edges, node.edges);
        assert_eq!(round_tripped.content, node.content);
        assert_eq!(round_tripped.meta, node.meta);
    }

    #[test]
    fn strip_links_section_cuts_at_the_divider() {
        let body = "content\nmore\n\n\n-----------------\n_Links:_\n- [[x.md]]\n";
        assert_eq!(strip_links_section(body).trim_end(), "content\nmore");
        assert_eq!(strip_links_section("no divider"), "no divider");
    }
}
