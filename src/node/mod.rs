//! Incoming node types.
//!
//! Nodes materialized from the HTML stream: `Element` (tag, namespace,
//! deduplicated attributes, ordered children) and `Text` leaves (text,
//! comment, doctype). They live only for the duration of one morph call.

mod element;
mod text;

pub use element::Element;
pub use text::{Text, TextKind};

use smallvec::SmallVec;

use crate::macros::impl_enum_accessors;

/// Element namespace, resolved from the ancestor `xmlns` context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
    MathMl,
}

impl Namespace {
    pub const HTML_URI: &'static str = "http://www.w3.org/1999/xhtml";
    pub const SVG_URI: &'static str = "http://www.w3.org/2000/svg";
    pub const MATHML_URI: &'static str = "http://www.w3.org/1998/Math/MathML";

    /// Namespace URI as used in `xmlns` attributes.
    pub const fn uri(self) -> &'static str {
        match self {
            Self::Html => Self::HTML_URI,
            Self::Svg => Self::SVG_URI,
            Self::MathMl => Self::MATHML_URI,
        }
    }

    /// Resolve a known namespace URI.
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            Self::HTML_URI => Some(Self::Html),
            Self::SVG_URI => Some(Self::Svg),
            Self::MATHML_URI => Some(Self::MathMl),
            _ => None,
        }
    }

    /// Namespace for a child element named `tag` opened inside `self`.
    ///
    /// `parent_tag` is the tag of the enclosing element, if any.
    pub fn for_child(self, parent_tag: Option<&str>, tag: &str) -> Self {
        match tag {
            "svg" => return Self::Svg,
            "math" => return Self::MathMl,
            _ => {}
        }
        match (self, parent_tag) {
            (Self::Svg, Some("foreignobject")) => Self::Html,
            (Self::MathMl, Some("mi" | "mo" | "mn" | "ms" | "mtext")) => Self::Html,
            (ns, _) => ns,
        }
    }
}

/// Kind of a node, shared by live and incoming nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Document,
    Element,
    Text,
    Comment,
    Doctype,
}

/// Node in an incoming tree - either Element or a Text leaf.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Box<Element>),
    Text(Text),
}

impl Node {
    // Generates for each variant (element -> Element, etc.):
    //   - is_xxx(&self) -> bool
    //   - as_xxx(&self) -> Option<&Type>
    //   - as_xxx_mut(&mut self) -> Option<&mut Type>
    impl_enum_accessors!(element, text);

    /// Node type of this node.
    pub fn node_type(&self) -> NodeType {
        match self {
            Node::Element(_) => NodeType::Element,
            Node::Text(t) => t.kind.node_type(),
        }
    }
}

impl From<Element> for Node {
    fn from(elem: Element) -> Self {
        Node::Element(Box::new(elem))
    }
}

impl From<Text> for Node {
    fn from(text: Text) -> Self {
        Node::Text(text)
    }
}

/// Borrowed view handed to `on_node` as soon as a node is parse-available.
///
/// Elements are reported at their start tag, so `children` is still empty.
#[derive(Debug, Clone, Copy)]
pub enum ParsedNode<'a> {
    Element(&'a Element),
    Text(&'a Text),
}

impl ParsedNode<'_> {
    /// Node type of the parsed node.
    pub fn node_type(&self) -> NodeType {
        match self {
            ParsedNode::Element(_) => NodeType::Element,
            ParsedNode::Text(t) => t.kind.node_type(),
        }
    }
}

/// Type alias for children collection.
pub type Children = SmallVec<[Node; 4]>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_resolution() {
        let html = Namespace::Html;
        assert_eq!(html.for_child(Some("div"), "svg"), Namespace::Svg);
        assert_eq!(html.for_child(Some("div"), "span"), Namespace::Html);
        assert_eq!(Namespace::Svg.for_child(Some("svg"), "path"), Namespace::Svg);
        assert_eq!(Namespace::Svg.for_child(Some("foreignobject"), "p"), Namespace::Html);
        assert_eq!(Namespace::MathMl.for_child(Some("mi"), "b"), Namespace::Html);
    }

    #[test]
    fn test_namespace_uri_round_trip() {
        for ns in [Namespace::Html, Namespace::Svg, Namespace::MathMl] {
            assert_eq!(Namespace::from_uri(ns.uri()), Some(ns));
        }
        assert_eq!(Namespace::from_uri("urn:unknown"), None);
    }

    #[test]
    fn test_node_accessors() {
        let mut node = Node::from(Element::new("div"));
        assert!(node.is_element());
        assert!(!node.is_text());
        assert_eq!(node.node_type(), NodeType::Element);
        node.as_element_mut().unwrap().push_text("hi");
        assert_eq!(node.as_element().unwrap().text_content(), "hi");

        let comment = Node::from(Text::comment(" note "));
        assert_eq!(comment.node_type(), NodeType::Comment);
        assert!(comment.as_element().is_none());
    }
}
