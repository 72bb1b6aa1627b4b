//! Live tree abstraction.
//!
//! The reconciler only ever talks to a [`Dom`]: a minimal tree-node interface
//! (type, tag, namespace, attributes, text, children, parent) plus the
//! mutation primitives it needs. [`LiveTree`] is an arena-backed
//! implementation for tests and non-browser hosts.

mod registry;
mod tree;

pub use registry::{ConnectedCallback, CustomElementRegistry, CustomElementMap};
pub use tree::LiveTree;

use crate::attr::{AttrKey, AttrValue, AttrsExt};
use crate::node::{Namespace, NodeType, TextKind};

// =============================================================================
// NodeId
// =============================================================================

/// Handle to a live node, valid for the `Dom` that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    /// Create from raw value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get raw value.
    #[inline]
    pub const fn as_raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// =============================================================================
// Dom
// =============================================================================

/// Live tree the reconciler reads and mutates.
///
/// Node handles passed to these methods must come from the same tree.
pub trait Dom {
    /// Kind of `node`.
    fn node_type(&self, node: NodeId) -> NodeType;

    /// Tag name, `None` for non-elements.
    fn tag(&self, node: NodeId) -> Option<&str>;

    /// Element namespace (`Html` for non-elements).
    fn namespace(&self, node: NodeId) -> Namespace;

    /// Attributes in document order, empty for non-elements.
    fn attributes(&self, node: NodeId) -> &[(AttrKey, AttrValue)];

    /// Single attribute lookup.
    fn attribute(&self, node: NodeId, name: &str) -> Option<&str> {
        self.attributes(node).get_attr(name)
    }

    /// Literal value of a text, comment or doctype node.
    fn text(&self, node: NodeId) -> Option<&str>;

    /// Child nodes in order.
    fn children(&self, node: NodeId) -> &[NodeId];

    /// Parent node, `None` for detached nodes and the document.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    // ─────────────────────────────────────────────────────────────────────────
    // Mutation primitives
    // ─────────────────────────────────────────────────────────────────────────

    /// Create a detached element.
    fn create_element(&mut self, tag: &str, ns: Namespace) -> NodeId;

    /// Create a detached text, comment or doctype node.
    fn create_text(&mut self, kind: TextKind, data: &str) -> NodeId;

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str);

    fn remove_attribute(&mut self, node: NodeId, name: &str);

    fn set_text(&mut self, node: NodeId, value: &str);

    /// Insert `child` into `parent` before `before` (append when `None`).
    ///
    /// An attached `child` is moved, keeping its identity.
    fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>);

    fn remove_child(&mut self, parent: NodeId, child: NodeId);

    // ─────────────────────────────────────────────────────────────────────────
    // Custom elements
    // ─────────────────────────────────────────────────────────────────────────

    /// Whether `tag` names a defined custom element.
    fn is_custom_element(&self, _tag: &str) -> bool {
        false
    }

    /// Post-insertion hook for a defined custom element.
    ///
    /// Mutations made here are not recorded by the reconciler.
    fn connected(&mut self, _node: NodeId) {}
}

/// Collect `root` and its descendants in tree order.
pub fn descendants<D: Dom + ?Sized>(dom: &D, root: NodeId) -> Vec<NodeId> {
    let mut out = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        out.push(node);
        stack.extend(dom.children(node).iter().rev().copied());
    }
    out
}
