//! Node matcher: what to do with one old/new pair.

use crate::dom::{Dom, NodeId};
use crate::node::{NodeType, ParsedNode, Text};

/// Decision for one old/new pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchOp {
    /// Nothing to do
    Noop,
    /// Create from new and insert at this position
    Insert,
    /// Remove old
    Remove(NodeId),
    /// Same kind: patch in place, preserving identity
    Patch(NodeId),
    /// Different kind: insert new at old's position, remove old
    Replace(NodeId),
}

/// Live side of a pairing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveCandidate {
    pub node: NodeId,
    /// Excluded by the ignore predicate
    pub ignored: bool,
}

impl LiveCandidate {
    pub fn new(node: NodeId, ignored: bool) -> Self {
        Self { node, ignored }
    }
}

/// Decide how `old` turns into `new`.
///
/// Incoming `<template>` elements always replace; the reconciler may still
/// keep the old one when their fingerprints agree.
pub fn decide<D: Dom + ?Sized>(dom: &D, old: Option<LiveCandidate>, new: Option<ParsedNode<'_>>) -> MatchOp {
    let (old, new) = match (old, new) {
        (Some(LiveCandidate { ignored: true, .. }), _) => return MatchOp::Noop,
        (None, None) => return MatchOp::Noop,
        (None, Some(_)) => return MatchOp::Insert,
        (Some(old), None) => return MatchOp::Remove(old.node),
        (Some(old), Some(new)) => (old.node, new),
    };

    let same = match new {
        ParsedNode::Element(elem) => {
            !elem.is_template()
                && dom.node_type(old) == NodeType::Element
                && dom.tag(old) == Some(elem.tag.as_str())
                && dom.namespace(old) == elem.ns
        }
        ParsedNode::Text(text) => dom.node_type(old) == text.kind.node_type(),
    };

    if same { MatchOp::Patch(old) } else { MatchOp::Replace(old) }
}

/// Old value when a patched leaf's literal differs from `new`.
pub fn text_change<D: Dom + ?Sized>(dom: &D, old: NodeId, new: &Text) -> Option<String> {
    let current = dom.text(old).unwrap_or_default();
    (current != new.content).then(|| current.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::LiveTree;
    use crate::node::{Element, Namespace};

    fn live() -> (LiveTree, NodeId, NodeId, NodeId) {
        let tree = LiveTree::parse("<div></div>text<!--c-->").unwrap();
        let children = tree.children(tree.document()).to_vec();
        (tree, children[0], children[1], children[2])
    }

    #[test]
    fn test_absent_sides() {
        let (tree, div, _, _) = live();
        let elem = Element::new("div");
        assert_eq!(decide(&tree, None, None), MatchOp::Noop);
        assert_eq!(decide(&tree, None, Some(ParsedNode::Element(&elem))), MatchOp::Insert);
        assert_eq!(decide(&tree, Some(LiveCandidate::new(div, false)), None), MatchOp::Remove(div));
    }

    #[test]
    fn test_ignored_is_noop() {
        let (tree, div, _, _) = live();
        let other = Element::new("span");
        let old = Some(LiveCandidate::new(div, true));
        assert_eq!(decide(&tree, old, Some(ParsedNode::Element(&other))), MatchOp::Noop);
        assert_eq!(decide(&tree, old, None), MatchOp::Noop);
    }

    #[test]
    fn test_patch_or_replace() {
        let (tree, div, text, comment) = live();
        let div_new = Element::new("div");
        let svg_div = Element::with_ns("div", Namespace::Svg);
        let span = Element::new("span");
        let old = |n| Some(LiveCandidate::new(n, false));

        assert_eq!(decide(&tree, old(div), Some(ParsedNode::Element(&div_new))), MatchOp::Patch(div));
        assert_eq!(decide(&tree, old(div), Some(ParsedNode::Element(&svg_div))), MatchOp::Replace(div));
        assert_eq!(decide(&tree, old(div), Some(ParsedNode::Element(&span))), MatchOp::Replace(div));

        let t = Text::new("other");
        let c = Text::comment("c");
        assert_eq!(decide(&tree, old(text), Some(ParsedNode::Text(&t))), MatchOp::Patch(text));
        assert_eq!(decide(&tree, old(comment), Some(ParsedNode::Text(&t))), MatchOp::Replace(comment));
        assert_eq!(decide(&tree, old(comment), Some(ParsedNode::Text(&c))), MatchOp::Patch(comment));
        assert_eq!(decide(&tree, old(div), Some(ParsedNode::Text(&t))), MatchOp::Replace(div));
    }

    #[test]
    fn test_template_always_replaces() {
        let tree = LiveTree::parse("<template></template>").unwrap();
        let old = tree.children(tree.document())[0];
        let new = Element::new("template");
        assert_eq!(
            decide(&tree, Some(LiveCandidate::new(old, false)), Some(ParsedNode::Element(&new))),
            MatchOp::Replace(old)
        );
    }

    #[test]
    fn test_text_change() {
        let (tree, _, text, _) = live();
        assert_eq!(text_change(&tree, text, &Text::new("text")), None);
        assert_eq!(text_change(&tree, text, &Text::new("new")), Some("text".to_string()));
    }
}
