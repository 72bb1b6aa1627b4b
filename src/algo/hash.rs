//! Deterministic subtree fingerprints.
//!
//! An incoming subtree and a live subtree hash equal exactly when they have
//! the same tags, namespaces, non-internal attributes (order-insensitive)
//! and children, in order.

use crate::attr::{AttrKey, AttrValue, is_internal_attr};
use crate::dom::{Dom, NodeId};
use crate::node::{Element, Namespace, Node, NodeType, TextKind};

// =============================================================================
// StableHasher - Builder Pattern
// =============================================================================

/// A deterministic hasher using blake3
///
/// Unlike `std::hash::Hasher`, this produces the same output across
/// process restarts for the same input.
pub struct StableHasher {
    inner: blake3::Hasher,
}

impl StableHasher {
    /// Create a new StableHasher
    #[inline]
    pub fn new() -> Self {
        Self {
            inner: blake3::Hasher::new(),
        }
    }

    /// Update with raw bytes
    #[inline]
    pub fn update(mut self, data: &[u8]) -> Self {
        self.inner.update(data);
        self
    }

    /// Update with a length-prefixed string
    #[inline]
    pub fn update_str(self, s: &str) -> Self {
        self.update_usize(s.len()).update(s.as_bytes())
    }

    /// Update with a usize value (little-endian)
    #[inline]
    pub fn update_usize(self, v: usize) -> Self {
        self.update(&(v as u64).to_le_bytes())
    }

    /// Finish and return the hash as u64
    ///
    /// Takes the first 8 bytes of blake3 output as little-endian u64.
    #[inline]
    pub fn finish(self) -> u64 {
        let hash = self.inner.finalize();
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&hash.as_bytes()[..8]);
        u64::from_le_bytes(bytes)
    }
}

impl Default for StableHasher {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Fingerprints
// =============================================================================

/// Fingerprint of an incoming element and its subtree.
pub fn fingerprint_element(elem: &Element) -> u64 {
    hash_element(StableHasher::new(), elem).finish()
}

/// Fingerprint of a live node and its subtree.
pub fn fingerprint_live<D: Dom + ?Sized>(dom: &D, node: NodeId) -> u64 {
    hash_live(StableHasher::new(), dom, node).finish()
}

fn hash_element(h: StableHasher, elem: &Element) -> StableHasher {
    let mut h = hash_header(h, &elem.tag, elem.ns, &elem.attrs).update_usize(elem.children.len());
    for child in &elem.children {
        h = match child {
            Node::Element(e) => hash_element(h, e),
            Node::Text(t) => hash_leaf(h, t.kind, &t.content),
        };
    }
    h
}

fn hash_live<D: Dom + ?Sized>(h: StableHasher, dom: &D, node: NodeId) -> StableHasher {
    let kind = match dom.node_type(node) {
        NodeType::Element | NodeType::Document => None,
        NodeType::Text => Some(TextKind::Text),
        NodeType::Comment => Some(TextKind::Comment),
        NodeType::Doctype => Some(TextKind::Doctype),
    };
    if let Some(kind) = kind {
        return hash_leaf(h, kind, dom.text(node).unwrap_or_default());
    }

    let children = dom.children(node);
    let tag = dom.tag(node).unwrap_or_default();
    let mut h = hash_header(h, tag, dom.namespace(node), dom.attributes(node)).update_usize(children.len());
    for &child in children {
        h = hash_live(h, dom, child);
    }
    h
}

fn hash_header(h: StableHasher, tag: &str, ns: Namespace, attrs: &[(AttrKey, AttrValue)]) -> StableHasher {
    let mut sorted: Vec<_> = attrs.iter().filter(|(k, _)| !is_internal_attr(k)).collect();
    sorted.sort_unstable_by(|a, b| a.0.cmp(&b.0));

    let mut h = h
        .update(b"E")
        .update_str(tag)
        .update_str(ns.uri())
        .update_usize(sorted.len());
    for (name, value) in sorted {
        h = h.update_str(name).update_str(value);
    }
    h
}

fn hash_leaf(h: StableHasher, kind: TextKind, content: &str) -> StableHasher {
    let marker: &[u8] = match kind {
        TextKind::Text => b"T",
        TextKind::Comment => b"C",
        TextKind::Doctype => b"D",
    };
    h.update(marker).update_str(content)
}
