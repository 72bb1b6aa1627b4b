//! tola-morph - Streaming DOM reconciler
//!
//! Patches an already-rendered live tree in place from HTML that arrives as
//! an arbitrarily chunked stream, keeping node identity (and with it focus,
//! form values and custom-element state) wherever the markup allows.
//!
//! ## Core Concepts
//!
//! **Lockstep diffing**: chunks are parsed incrementally and every node is
//! paired with the live tree as soon as it is syntactically complete. There
//! is no intermediate target tree.
//!
//! **Describe, then apply**: the reconciler emits [`MutationRecord`]s; the
//! [`MutationScheduler`](schedule::MutationScheduler) applies them per
//! [`FlushPolicy`] and reports the pass settled after a frame boundary.
//!
//! ## Modules
//! - `parse`: Chunk assembler (UTF-8, tokenizer, tree-construction rules)
//! - `algo`: Node matcher, attribute differ, child reconciler, subtree policy
//! - `dom`: `Dom` trait, `LiveTree` reference host, custom element registry
//! - `schedule`: Mutation records, scheduler, host runtime
//! - `morph`: Session driver (`Morph`, `morph`, `morph_stream`)
//! - `node`: Incoming node types
//! - `render`: HTML serialization
//!
//! ## Usage
//!
//! ```ignore
//! use tola_morph::prelude::*;
//!
//! let mut tree = LiveTree::parse("<ul><li key=\"a\">A</li><li key=\"b\">B</li></ul>")?;
//! let root = tree.document();
//!
//! let mut pass = Morph::new(&mut tree, root)
//!     .options(MorphOptions::new().ignore(|dom: &LiveTree, node| dom.attribute(node, "data-keep").is_some()));
//! pass.push_chunk("<ul><li key=\"b\">B</li>")?;
//! pass.push_chunk("<li key=\"a\">A</li></ul>")?;
//! let report = pass.finish()?;
//! assert_eq!(report.stats.nodes_moved, 1);
//! ```

// =============================================================================
// Core modules
// =============================================================================

/// Accessor generation macros
mod macros;

/// Incoming node types: Element, Node, Text
pub mod node;

/// Attribute types and key selection
pub mod attr;

/// Live tree abstraction: Dom, LiveTree, CustomElementRegistry
pub mod dom;

/// Streaming HTML parsing
pub mod parse;

/// Algorithms: matcher, attribute diff, reconciler, subtree policy
pub mod algo;

/// Mutation records and scheduling
pub mod schedule;

/// Session driver
pub mod morph;

/// Cooperative cancellation
pub mod cancel;

/// Error types
pub mod error;

/// HTML rendering
pub mod render;

/// Prelude for common imports
pub mod prelude;

// =============================================================================
// Re-exports
// =============================================================================

// Node types
pub use node::{Children, Element, Namespace, Node, NodeType, ParsedNode, Text, TextKind};

// Attribute types
pub use attr::{AttrKey, AttrValue, Attrs, KeyFn, Tag, default_key};

// Live tree
pub use dom::{CustomElementRegistry, Dom, LiveTree, NodeId};

// Parsing
pub use parse::{ChunkAssembler, ParseEvent};

// Algorithms
pub use algo::{DiffStats, Reconciler, StableHasher};

// Scheduling
pub use schedule::{FlushPolicy, HostRuntime, MutationRecord, MutationScheduler, NoopHost, PassState};

// Driver
pub use morph::{Morph, MorphConfig, MorphOptions, MorphReport, morph};

#[cfg(feature = "async")]
pub use morph::morph_stream;

pub use cancel::CancelToken;

// Error types
pub use error::{MorphError, MorphResult, ParseErrorKind};
