//! Element type - incoming HTML elements
//!
//! The building block of incoming subtrees. Streamed elements first surface
//! as a header (tag, namespace, attributes) and only collect children when a
//! whole subtree has to be materialized.

use smallvec::SmallVec;

use crate::attr::{AttrKey, AttrValue, Attrs, AttrsExt, AttrsMutExt, KeyFn, Tag};

use super::{Children, Namespace, Node, Text};

// =============================================================================
// Element
// =============================================================================

/// Incoming element with attributes and children
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name
    pub tag: Tag,
    /// Resolved namespace
    pub ns: Namespace,
    /// Attributes, deduplicated (first occurrence wins)
    pub attrs: Attrs,
    /// Child nodes
    pub children: Children,
}

impl Element {
    /// Create an HTML element
    pub fn new(tag: impl Into<Tag>) -> Self {
        Self::with_ns(tag, Namespace::Html)
    }

    /// Create an element in a specific namespace
    pub fn with_ns(tag: impl Into<Tag>, ns: Namespace) -> Self {
        Self {
            tag: tag.into(),
            ns,
            attrs: Vec::new(),
            children: SmallVec::new(),
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Builder
    // ─────────────────────────────────────────────────────────────────────────

    /// Add an attribute (builder style, duplicates are dropped)
    pub fn attr(mut self, name: impl Into<AttrKey>, value: impl Into<AttrValue>) -> Self {
        self.attrs.push_unique(name, value);
        self
    }

    /// Add a child element (builder style)
    pub fn child(mut self, child: Element) -> Self {
        self.children.push(Node::from(child));
        self
    }

    /// Add a text child (builder style)
    pub fn text(mut self, content: impl Into<String>) -> Self {
        self.push_text(content);
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Attribute access
    // ─────────────────────────────────────────────────────────────────────────

    /// Get attribute value by name
    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs.get_attr(name)
    }

    /// Check if attribute exists
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.has_attr(name)
    }

    /// Identity key under the given selector
    pub fn key(&self, key_fn: KeyFn) -> Option<&str> {
        key_fn(&self.attrs)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Children
    // ─────────────────────────────────────────────────────────────────────────

    /// Append a child node
    pub fn push(&mut self, node: impl Into<Node>) {
        self.children.push(node.into());
    }

    /// Append a text child
    pub fn push_text(&mut self, content: impl Into<String>) {
        self.children.push(Node::Text(Text::new(content)));
    }

    /// Whether this is an HTML `<template>`, which is never diffed internally
    pub fn is_template(&self) -> bool {
        self.ns == Namespace::Html && self.tag == "template"
    }

    /// Check if element has no children
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Get text content of this element (concatenated from all text nodes)
    pub fn text_content(&self) -> String {
        let mut result = String::new();
        self.collect_text(&mut result);
        result
    }

    fn collect_text(&self, buf: &mut String) {
        for child in &self.children {
            match child {
                Node::Text(t) if t.kind == super::TextKind::Text => buf.push_str(&t.content),
                Node::Text(_) => {}
                Node::Element(e) => e.collect_text(buf),
            }
        }
    }
}
