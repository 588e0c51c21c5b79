//! # vaultgraph
//!
//! A vault-backed document graph with delta reconciliation between files,
//! editors, and watchers.
//!
//! ## Overview
//!
//! vaultgraph maintains a directed graph whose nodes map 1:1 to markdown
//! files in a directory (the "vault") and whose edges come from in-text
//! `[[wikilink]]` cross-references. Three independent actors change that
//! graph concurrently:
//!
//! - a **filesystem watcher** reporting external edits,
//! - a **live editing surface** applying optimistic edits before they are
//!   durably written,
//! - the **durable-write path** itself.
//!
//! The hard problem is keeping exactly one logical copy of every change
//! alive across those three actors. In particular, a write this system
//! performs comes straight back as a filesystem notification; re-applying
//! that echo as if it were an independent external change duplicates nodes.
//! The [`echo`] module's TTL'd, content-fingerprinted cache of recent
//! own-writes exists specifically to break that loop.
//!
//! ## Architecture
//!
//! - **[`codec`]**: markdown ⇄ node conversion (frontmatter, references
//!   with labels, title derivation, serialization)
//! - **[`graph`]**: immutable value types ([`graph::Node`],
//!   [`graph::Edge`], [`graph::Delta`], [`graph::Graph`]) and the edge
//!   [`reverse`](graph::Graph::reverse) transform
//! - **[`engine`]**: applies a delta batch to the graph and to disk,
//!   atomically in memory, fail-fast on disk
//! - **[`echo`]**: suppression of self-originated write echoes
//! - **[`merge`]**: append-vs-replace classification for open editing
//!   sessions
//! - **[`sync`]**: the [`sync::VaultSync`] handle tying the above together
//!   with explicit shared state and a broadcast boundary
//! - **`watch`** (feature `service`): debounced file watching feeding
//!   [`sync::VaultSync::ingest`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use vaultgraph::{
//!     config::VaultConfig,
//!     graph::{Delta, Node},
//!     sync::VaultSync,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), vaultgraph::VaultError> {
//!     let config = VaultConfig::new("./vault");
//!     let sync = VaultSync::new(&config)?;
//!
//!     // Optimistic edit from an editing surface: written durably, the
//!     // filesystem echo of this write will be suppressed automatically.
//!     let node = Node::new("notes/parent.md", "# Parent");
//!     let graph = sync
//!         .submit(vec![Delta::Upsert {
//!             node,
//!             previous: None,
//!         }])
//!         .await?;
//!
//!     assert!(graph.contains("notes/parent.md"));
//!     Ok(())
//! }
//! ```
//!
//! ## Concurrency model
//!
//! Batches apply strictly left-to-right; each delta in a batch observes the
//! effects of the ones before it. Across batches, [`sync::VaultSync`]
//! serializes application through one apply guard, and the echo cache is
//! the only mechanism keeping the watcher path and write path from
//! reprocessing each other's effects. There is no locking between them
//! beyond that: the echo TTL (configurable, default 300 ms) encodes a soft
//! real-time assumption about write+notify round-trip latency.

pub mod codec;
pub mod config;
pub mod echo;
pub mod engine;
pub mod error;
pub mod event;
pub mod graph;
pub mod merge;
pub mod sync;
#[cfg(feature = "service")]
pub mod watch;

pub use error::*;
