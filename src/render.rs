//! HTML serialization
//!
//! Renders live subtrees (through any [`Dom`]) and incoming nodes to HTML
//! strings. Used for convergence checks and diagnostics.

use crate::attr::{AttrKey, AttrValue};
use crate::dom::{Dom, NodeId};
use crate::node::{Element, Namespace, Node, NodeType, Text, TextKind};
use crate::parse::is_void_element;

// =============================================================================
// Live tree rendering
// =============================================================================

/// Render the children of a live node.
pub fn inner_html<D: Dom + ?Sized>(dom: &D, node: NodeId) -> String {
    let mut output = String::new();
    let raw = is_raw_text_parent(dom.tag(node));
    for &child in dom.children(node) {
        render_live(dom, child, raw, &mut output);
    }
    output
}

/// Render a live node including itself.
pub fn outer_html<D: Dom + ?Sized>(dom: &D, node: NodeId) -> String {
    let mut output = String::new();
    let raw = dom.parent(node).is_some_and(|p| is_raw_text_parent(dom.tag(p)));
    render_live(dom, node, raw, &mut output);
    output
}

fn render_live<D: Dom + ?Sized>(dom: &D, node: NodeId, raw_parent: bool, output: &mut String) {
    match dom.node_type(node) {
        NodeType::Document => {
            for &child in dom.children(node) {
                render_live(dom, child, false, output);
            }
        }
        NodeType::Element => {
            let tag = dom.tag(node).unwrap_or_default();
            output.push('<');
            output.push_str(tag);
            render_attrs(dom.attributes(node), output);
            output.push('>');

            if dom.namespace(node) == Namespace::Html && is_void_element(tag) {
                return;
            }

            let raw = is_raw_text_parent(Some(tag));
            for &child in dom.children(node) {
                render_live(dom, child, raw, output);
            }

            output.push_str("</");
            output.push_str(tag);
            output.push('>');
        }
        NodeType::Text => render_text(dom.text(node).unwrap_or_default(), TextKind::Text, raw_parent, output),
        NodeType::Comment => render_text(dom.text(node).unwrap_or_default(), TextKind::Comment, raw_parent, output),
        NodeType::Doctype => render_text(dom.text(node).unwrap_or_default(), TextKind::Doctype, raw_parent, output),
    }
}

// =============================================================================
// Incoming node rendering
// =============================================================================

/// Render an incoming node.
pub fn render_node(node: &Node) -> String {
    let mut output = String::new();
    render_incoming(node, false, &mut output);
    output
}

/// Render an incoming element.
pub fn render_element(elem: &Element) -> String {
    let mut output = String::new();
    render_incoming_element(elem, &mut output);
    output
}

fn render_incoming(node: &Node, raw_parent: bool, output: &mut String) {
    match node {
        Node::Element(elem) => render_incoming_element(elem, output),
        Node::Text(Text { content, kind }) => render_text(content, *kind, raw_parent, output),
    }
}

fn render_incoming_element(elem: &Element, output: &mut String) {
    output.push('<');
    output.push_str(&elem.tag);
    render_attrs(&elem.attrs, output);
    output.push('>');

    if elem.ns == Namespace::Html && is_void_element(&elem.tag) {
        return;
    }

    let raw = is_raw_text_parent(Some(&elem.tag));
    for child in &elem.children {
        render_incoming(child, raw, output);
    }

    output.push_str("</");
    output.push_str(&elem.tag);
    output.push('>');
}

// =============================================================================
// Shared helpers
// =============================================================================

fn render_text(content: &str, kind: TextKind, raw_parent: bool, output: &mut String) {
    match kind {
        TextKind::Text if raw_parent => output.push_str(content),
        TextKind::Text => output.push_str(&escape_html(content)),
        TextKind::Comment => {
            output.push_str("<!--");
            output.push_str(content);
            output.push_str("-->");
        }
        TextKind::Doctype => {
            output.push_str("<!DOCTYPE ");
            output.push_str(content);
            output.push('>');
        }
    }
}

/// Render attributes to HTML.
fn render_attrs(attrs: &[(AttrKey, AttrValue)], output: &mut String) {
    for (name, value) in attrs {
        output.push(' ');
        output.push_str(name);
        output.push_str("=\"");
        output.push_str(&escape_attr(value));
        output.push('"');
    }
}

/// `script` and `style` bodies are emitted verbatim.
fn is_raw_text_parent(tag: Option<&str>) -> bool {
    matches!(tag, Some("script" | "style"))
}

/// Escape HTML special characters.
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '\u{a0}' => result.push_str("&nbsp;"),
            _ => result.push(c),
        }
    }
    result
}

/// Escape attribute value special characters.
pub fn escape_attr(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            _ => result.push(c),
        }
    }
    result
}

// =============================================================================
// Tests
// =============================================================================
