//! Per-call options, tuning config and the pass report.

use crate::algo::{DiffStats, IgnoreFn};
use crate::attr::{KeyFn, default_key};
use crate::dom::NodeId;
use crate::error::PredicateError;
use crate::node::ParsedNode;
use crate::parse::DEFAULT_MAX_DEPTH;
use crate::schedule::{FlushPolicy, MutationRecord};

// =============================================================================
// MorphConfig
// =============================================================================

/// Tuning for a morph pass.
///
/// Use this to trade latency for batching:
/// - `streaming()` shows progress after every chunk
/// - `strict()` applies once and rejects deep nesting early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MorphConfig {
    /// Maximum element nesting in the incoming markup.
    /// Default: 512
    pub max_depth: usize,
    /// When queued mutations are applied.
    /// Default: `FlushPolicy::EndOfPass`
    pub flush: FlushPolicy,
}

impl Default for MorphConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            flush: FlushPolicy::EndOfPass,
        }
    }
}

impl MorphConfig {
    /// Create config with custom settings.
    pub fn new(max_depth: usize, flush: FlushPolicy) -> Self {
        Self { max_depth, flush }
    }

    /// Apply after every chunk.
    pub fn streaming() -> Self {
        Self {
            flush: FlushPolicy::EveryChunk,
            ..Self::default()
        }
    }

    /// Apply once, with a lower nesting limit.
    pub fn strict() -> Self {
        Self {
            max_depth: 128,
            flush: FlushPolicy::EndOfPass,
        }
    }
}

// =============================================================================
// MorphOptions
// =============================================================================

/// Callback receiving each node as soon as it is parse-available.
pub type OnNodeFn<'a> = Box<dyn FnMut(ParsedNode<'_>) + 'a>;

/// Per-call parameters: ignore predicate, node callback, key selector and
/// view transitions.
///
/// # Example
///
/// ```ignore
/// let options = MorphOptions::new()
///     .ignore(|dom: &LiveTree, node| dom.attribute(node, "data-keep").is_some())
///     .transition(true);
/// ```
pub struct MorphOptions<'a, D: ?Sized> {
    pub(crate) ignore: Option<IgnoreFn<'a, D>>,
    pub(crate) on_node: Option<OnNodeFn<'a>>,
    pub(crate) transition: bool,
    pub(crate) key_fn: KeyFn,
}

impl<D: ?Sized> Default for MorphOptions<'_, D> {
    fn default() -> Self {
        Self {
            ignore: None,
            on_node: None,
            transition: false,
            key_fn: default_key,
        }
    }
}

impl<D: ?Sized> std::fmt::Debug for MorphOptions<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MorphOptions")
            .field("ignore", &self.ignore.is_some())
            .field("on_node", &self.on_node.is_some())
            .field("transition", &self.transition)
            .finish_non_exhaustive()
    }
}

impl<'a, D: ?Sized> MorphOptions<'a, D> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude live nodes (and their subtrees) for which `f` returns true.
    pub fn ignore<F>(mut self, f: F) -> Self
    where
        F: Fn(&D, NodeId) -> bool + 'a,
    {
        self.ignore = Some(Box::new(move |dom, node| Ok(f(dom, node))));
        self
    }

    /// Fallible variant of [`ignore`](Self::ignore). Errors count as "not ignored".
    pub fn try_ignore<F>(mut self, f: F) -> Self
    where
        F: Fn(&D, NodeId) -> Result<bool, PredicateError> + 'a,
    {
        self.ignore = Some(Box::new(f));
        self
    }

    /// Observe every incoming node as soon as it is parsed.
    pub fn on_node<F>(mut self, f: F) -> Self
    where
        F: FnMut(ParsedNode<'_>) + 'a,
    {
        self.on_node = Some(Box::new(f));
        self
    }

    /// Bracket application in a view transition when the host supports it.
    pub fn transition(mut self, enabled: bool) -> Self {
        self.transition = enabled;
        self
    }

    /// Replace the identity key selector (default: `key`, then `id`).
    pub fn key_fn(mut self, key_fn: KeyFn) -> Self {
        self.key_fn = key_fn;
        self
    }
}

// =============================================================================
// MorphReport
// =============================================================================

/// Outcome of a completed pass
#[derive(Debug, Clone, Default)]
pub struct MorphReport {
    /// Applied mutations, in order
    pub mutations: Vec<MutationRecord>,
    /// Statistics about the pass
    pub stats: DiffStats,
}

impl MorphReport {
    /// Check if any mutation was applied
    pub fn has_changes(&self) -> bool {
        !self.mutations.is_empty()
    }

    /// Number of applied mutations
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }
}
