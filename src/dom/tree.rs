//! Arena-backed live tree.

use tracing::debug;

use crate::attr::{AttrKey, AttrValue, Attrs, AttrsMutExt, Tag};
use crate::error::MorphResult;
use crate::node::{Namespace, NodeType, Text, TextKind};
use crate::parse::{ChunkAssembler, DEFAULT_MAX_DEPTH, ParseEvent};
use crate::render;

use super::{CustomElementRegistry, Dom, NodeId};

#[derive(Debug, Clone)]
enum NodeKind {
    Document,
    Element { tag: Tag, ns: Namespace, attrs: Attrs },
    Leaf(Text),
}

#[derive(Debug, Clone)]
struct NodeData {
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    kind: NodeKind,
}

/// In-memory document tree implementing [`Dom`].
///
/// Nodes are never freed: removed nodes stay addressable (detached) until
/// the tree is dropped, so handles held by callers stay valid.
#[derive(Debug, Clone)]
pub struct LiveTree {
    nodes: Vec<NodeData>,
    registry: Option<CustomElementRegistry>,
}

impl Default for LiveTree {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveTree {
    /// Create a tree holding only the document node.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                parent: None,
                children: Vec::new(),
                kind: NodeKind::Document,
            }],
            registry: None,
        }
    }

    /// Parse markup into a fresh tree under the document node.
    pub fn parse(html: &str) -> MorphResult<Self> {
        let mut tree = Self::new();
        let document = tree.document();
        tree.append_html(document, html)?;
        Ok(tree)
    }

    /// Attach a custom element registry.
    pub fn with_registry(mut self, registry: CustomElementRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// The attached registry, if any.
    pub fn registry(&self) -> Option<&CustomElementRegistry> {
        self.registry.as_ref()
    }

    /// The document node.
    #[inline]
    pub fn document(&self) -> NodeId {
        NodeId::from_raw(0)
    }

    /// Number of nodes ever created, detached ones included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree holds only the document node.
    pub fn is_empty(&self) -> bool {
        self.nodes[0].children.is_empty()
    }

    /// Parse markup and append the resulting nodes to `parent`.
    ///
    /// Namespace resolution starts from `parent`. No hooks fire.
    pub fn append_html(&mut self, parent: NodeId, html: &str) -> MorphResult<()> {
        let tag = self.tag(parent).map(Tag::from);
        let mut assembler = ChunkAssembler::new(self.namespace(parent), tag.as_deref(), DEFAULT_MAX_DEPTH);
        let mut events = Vec::new();
        assembler.push(html.as_bytes(), &mut events)?;
        assembler.finish(&mut events)?;

        let mut stack = vec![parent];
        for event in events {
            let top = stack.last().copied().unwrap_or(parent);
            match event {
                ParseEvent::Open(element) => {
                    let element = *element;
                    let node = self.alloc(NodeKind::Element {
                        tag: element.tag,
                        ns: element.ns,
                        attrs: element.attrs,
                    });
                    self.insert_before(top, node, None);
                    stack.push(node);
                }
                ParseEvent::Leaf(text) => {
                    let node = self.alloc(NodeKind::Leaf(text));
                    self.insert_before(top, node, None);
                }
                ParseEvent::Close(_) => {
                    stack.pop();
                }
            }
        }
        Ok(())
    }

    /// Serialized children of `node`.
    pub fn inner_html(&self, node: NodeId) -> String {
        render::inner_html(self, node)
    }

    /// Serialized `node` including itself.
    pub fn outer_html(&self, node: NodeId) -> String {
        render::outer_html(self, node)
    }

    /// First element with `tag` in tree order.
    pub fn find(&self, tag: &str) -> Option<NodeId> {
        self.find_by(|t, n| t.tag(n) == Some(tag))
    }

    /// First element whose attribute `name` equals `value`, in tree order.
    pub fn find_by_attr(&self, name: &str, value: &str) -> Option<NodeId> {
        self.find_by(|t, n| t.attribute(n, name) == Some(value))
    }

    fn find_by(&self, pred: impl Fn(&Self, NodeId) -> bool) -> Option<NodeId> {
        super::descendants(self, self.document())
            .into_iter()
            .find(|&n| pred(self, n))
    }

    fn alloc(&mut self, kind: NodeKind) -> NodeId {
        let id = NodeId::from_raw(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            parent: None,
            children: Vec::new(),
            kind,
        });
        id
    }

    fn detach(&mut self, child: NodeId) {
        if let Some(parent) = self.nodes[child.index()].parent.take() {
            self.nodes[parent.index()].children.retain(|&c| c != child);
        }
    }

    #[inline]
    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.index()]
    }
}

impl Dom for LiveTree {
    fn node_type(&self, node: NodeId) -> NodeType {
        match &self.data(node).kind {
            NodeKind::Document => NodeType::Document,
            NodeKind::Element { .. } => NodeType::Element,
            NodeKind::Leaf(text) => text.kind.node_type(),
        }
    }

    fn tag(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Element { tag, .. } => Some(tag.as_str()),
            _ => None,
        }
    }

    fn namespace(&self, node: NodeId) -> Namespace {
        match &self.data(node).kind {
            NodeKind::Element { ns, .. } => *ns,
            _ => Namespace::Html,
        }
    }

    fn attributes(&self, node: NodeId) -> &[(AttrKey, AttrValue)] {
        match &self.data(node).kind {
            NodeKind::Element { attrs, .. } => attrs.as_slice(),
            _ => &[],
        }
    }

    fn text(&self, node: NodeId) -> Option<&str> {
        match &self.data(node).kind {
            NodeKind::Leaf(text) => Some(text.content.as_str()),
            _ => None,
        }
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    fn create_element(&mut self, tag: &str, ns: Namespace) -> NodeId {
        self.alloc(NodeKind::Element {
            tag: tag.into(),
            ns,
            attrs: Attrs::new(),
        })
    }

    fn create_text(&mut self, kind: TextKind, data: &str) -> NodeId {
        self.alloc(NodeKind::Leaf(Text {
            content: data.to_string(),
            kind,
        }))
    }

    fn set_attribute(&mut self, node: NodeId, name: &str, value: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.index()].kind {
            attrs.set_attr(name, value);
        }
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) {
        if let NodeKind::Element { attrs, .. } = &mut self.nodes[node.index()].kind {
            attrs.remove_attr(name);
        }
    }

    fn set_text(&mut self, node: NodeId, value: &str) {
        if let NodeKind::Leaf(text) = &mut self.nodes[node.index()].kind {
            text.content.clear();
            text.content.push_str(value);
        }
    }

    fn insert_before(&mut self, parent: NodeId, child: NodeId, before: Option<NodeId>) {
        if before == Some(child) {
            return;
        }
        self.detach(child);
        let siblings = &mut self.nodes[parent.index()].children;
        let position = before.and_then(|b| siblings.iter().position(|&c| c == b));
        match position {
            Some(index) => siblings.insert(index, child),
            None => {
                if let Some(before) = before {
                    debug!(%parent, %before, "reference node is not a child, appending");
                }
                siblings.push(child);
            }
        }
        self.nodes[child.index()].parent = Some(parent);
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        if self.data(child).parent == Some(parent) {
            self.detach(child);
        }
    }

    fn is_custom_element(&self, tag: &str) -> bool {
        self.registry.as_ref().is_some_and(|r| r.is_defined(tag))
    }

    fn connected(&mut self, node: NodeId) {
        let callback = match (&self.registry, self.tag(node)) {
            (Some(registry), Some(tag)) => registry.get(tag),
            _ => None,
        };
        if let Some(callback) = callback {
            callback(self, node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_serialize() {
        let html = "<div class=\"a\"><p>x &amp; y</p><br><!--c--></div>";
        let tree = LiveTree::parse(html).unwrap();
        assert_eq!(tree.inner_html(tree.document()), html);

        let div = tree.find("div").unwrap();
        assert_eq!(tree.attribute(div, "class"), Some("a"));
        assert_eq!(tree.children(div).len(), 3);
        assert_eq!(tree.parent(div), Some(tree.document()));
    }

    #[test]
    fn test_insert_before_moves_attached_node() {
        let mut tree = LiveTree::parse("<ul><li id=a></li><li id=b></li><li id=c></li></ul>").unwrap();
        let ul = tree.find("ul").unwrap();
        let a = tree.find_by_attr("id", "a").unwrap();
        let c = tree.find_by_attr("id", "c").unwrap();

        tree.insert_before(ul, c, Some(a));
        assert_eq!(
            tree.inner_html(ul),
            "<li id=\"c\"></li><li id=\"a\"></li><li id=\"b\"></li>"
        );
        assert_eq!(tree.find_by_attr("id", "c"), Some(c));

        tree.insert_before(ul, c, None);
        assert_eq!(tree.children(ul).last(), Some(&c));
    }

    #[test]
    fn test_remove_and_text() {
        let mut tree = LiveTree::parse("<p>old</p><b></b>").unwrap();
        let doc = tree.document();
        let p = tree.find("p").unwrap();
        let text = tree.children(p)[0];
        tree.set_text(text, "new");
        let b = tree.find("b").unwrap();
        tree.remove_child(doc, b);
        assert_eq!(tree.inner_html(doc), "<p>new</p>");
        assert_eq!(tree.parent(b), None);
        assert_eq!(tree.node_type(text), NodeType::Text);
    }

    #[test]
    fn test_connected_runs_registered_callback() {
        let registry = CustomElementRegistry::new();
        registry
            .define("x-badge", |tree, node| tree.set_attribute(node, "upgraded", ""))
            .unwrap();
        let mut tree = LiveTree::parse("<x-badge></x-badge><span></span>")
            .unwrap()
            .with_registry(registry);

        assert!(tree.is_custom_element("x-badge"));
        assert!(!tree.is_custom_element("span"));
        let badge = tree.find("x-badge").unwrap();
        tree.connected(badge);
        assert_eq!(tree.attribute(badge, "upgraded"), Some(""));
    }
}
