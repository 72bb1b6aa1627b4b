//! Prelude module for common imports.
//!
//! ```ignore
//! use tola_morph::prelude::*;
//! ```

// Node types
pub use crate::node::{Children, Element, Namespace, Node, NodeType, ParsedNode, Text, TextKind};

// Attributes
pub use crate::attr::{AttrKey, AttrValue, Attrs, AttrsExt, AttrsMutExt, KeyFn, Tag, default_key};

// Live tree
pub use crate::dom::{ConnectedCallback, CustomElementRegistry, Dom, LiveTree, NodeId};

// Algorithms
pub use crate::algo::{DiffStats, IgnoreFn, StableHasher};

// Scheduling
pub use crate::schedule::{FlushPolicy, HostRuntime, MutationRecord, NoopHost, PassState};

// Driver
pub use crate::morph::{Morph, MorphConfig, MorphOptions, MorphReport, morph};

#[cfg(feature = "async")]
pub use crate::morph::morph_stream;

pub use crate::cancel::CancelToken;

// Error
pub use crate::error::{MorphError, MorphResult, ParseErrorKind, PredicateError};

// Render
pub use crate::render::{escape_attr, escape_html, inner_html, outer_html};
