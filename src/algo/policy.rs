//! Subtree policy: ignore predicate evaluation and custom-element-safe
//! insertion.

use rustc_hash::FxHashMap;
use tracing::warn;

use crate::attr::is_internal_attr;
use crate::dom::{Dom, NodeId, descendants};
use crate::error::PredicateError;
use crate::node::{Element, Node};

/// Fallible ignore predicate over a live node.
pub type IgnoreFn<'a, D> = Box<dyn Fn(&D, NodeId) -> Result<bool, PredicateError> + 'a>;

/// Per-pass ignore evaluation with memoized results.
pub struct SubtreePolicy<'a, D: ?Sized> {
    predicate: Option<IgnoreFn<'a, D>>,
    cache: FxHashMap<NodeId, bool>,
    failures: usize,
}

impl<D: ?Sized> std::fmt::Debug for SubtreePolicy<'_, D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubtreePolicy")
            .field("predicate", &self.predicate.is_some())
            .field("cached", &self.cache.len())
            .field("failures", &self.failures)
            .finish()
    }
}

impl<D: ?Sized> Default for SubtreePolicy<'_, D> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<'a, D: Dom + ?Sized> SubtreePolicy<'a, D> {
    /// Whether `node` and its subtree are excluded from the pass.
    ///
    /// A failing predicate counts as "not ignored".
    pub fn is_ignored(&mut self, dom: &D, node: NodeId) -> bool {
        let Some(predicate) = &self.predicate else {
            return false;
        };
        if let Some(&hit) = self.cache.get(&node) {
            return hit;
        }
        let ignored = match predicate(dom, node) {
            Ok(ignored) => ignored,
            Err(error) => {
                self.failures += 1;
                warn!(%node, %error, "ignore predicate failed, diffing node");
                false
            }
        };
        self.cache.insert(node, ignored);
        ignored
    }
}

impl<'a, D: ?Sized> SubtreePolicy<'a, D> {
    pub fn new(predicate: Option<IgnoreFn<'a, D>>) -> Self {
        Self {
            predicate,
            cache: FxHashMap::default(),
            failures: 0,
        }
    }

    /// Predicate failures seen this pass.
    pub fn failures(&self) -> usize {
        self.failures
    }

    /// Nodes evaluated this pass.
    pub fn evaluated(&self) -> usize {
        self.cache.len()
    }
}

// =============================================================================
// Insertion
// =============================================================================

/// Build a detached live subtree from an incoming element.
///
/// Only creation primitives are used; the result is inserted later by a
/// single `Insert` record. Internal attributes are never copied over.
pub fn instantiate<D: Dom + ?Sized>(dom: &mut D, elem: &Element) -> NodeId {
    let node = dom.create_element(&elem.tag, elem.ns);
    for (name, value) in elem.attrs.iter().filter(|(name, _)| !is_internal_attr(name)) {
        dom.set_attribute(node, name, value);
    }
    for child in &elem.children {
        let child = match child {
            Node::Element(e) => instantiate(dom, e),
            Node::Text(t) => dom.create_text(t.kind, &t.content),
        };
        dom.insert_before(node, child, None);
    }
    node
}

/// Run the post-insertion hook for every defined custom element in the
/// subtree at `root`, in tree order.
pub fn fire_connected<D: Dom + ?Sized>(dom: &mut D, root: NodeId) -> usize {
    let mut fired = 0;
    for node in descendants(dom, root) {
        let defined = dom.tag(node).is_some_and(|tag| dom.is_custom_element(tag));
        if defined {
            dom.connected(node);
            fired += 1;
        }
    }
    fired
}
