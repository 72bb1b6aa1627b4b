//! Text leaf type
//!
//! Text, comment and doctype nodes share one representation: a literal
//! value plus its kind. Comparison is always by literal value.

use super::NodeType;

// =============================================================================
// TextKind
// =============================================================================

/// Kind of a leaf node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TextKind {
    /// Character data
    #[default]
    Text,
    /// `<!-- ... -->`
    Comment,
    /// `<!DOCTYPE ...>`, value is the text after `DOCTYPE`
    Doctype,
}

impl TextKind {
    /// Matching node type
    pub const fn node_type(self) -> NodeType {
        match self {
            Self::Text => NodeType::Text,
            Self::Comment => NodeType::Comment,
            Self::Doctype => NodeType::Doctype,
        }
    }
}

// =============================================================================
// Text
// =============================================================================

/// Leaf node with literal content
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Text {
    /// Literal content (already entity-decoded for text)
    pub content: String,
    /// Leaf kind
    pub kind: TextKind,
}

impl Text {
    /// Create a new text node
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: TextKind::Text,
        }
    }

    /// Create a comment node
    pub fn comment(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: TextKind::Comment,
        }
    }

    /// Create a doctype node
    pub fn doctype(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            kind: TextKind::Doctype,
        }
    }

    /// Check if text content is empty
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Check if text is only whitespace
    pub fn is_whitespace(&self) -> bool {
        self.content.trim().is_empty()
    }
}
