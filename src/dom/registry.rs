//! Custom element registry.
//!
//! Maps custom-element tags to the callback run when such an element is
//! connected to the tree. Shared and thread-safe, like a page-global
//! registry.

use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::attr::Tag;
use crate::error::{MorphError, MorphResult};

use super::{LiveTree, NodeId};

/// Callback run after a defined element is inserted.
pub type ConnectedCallback = Arc<dyn Fn(&mut LiveTree, NodeId) + Send + Sync>;

/// Non-thread-safe definition map.
pub type CustomElementMap = FxHashMap<Tag, ConnectedCallback>;

/// Thread-safe shared registry.
///
/// Uses `parking_lot::RwLock`; clones share the same definitions.
#[derive(Clone, Default)]
pub struct CustomElementRegistry {
    inner: Arc<RwLock<CustomElementMap>>,
}

impl std::fmt::Debug for CustomElementRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<Tag> = self.with_read(|m| m.keys().cloned().collect());
        tags.sort();
        f.debug_struct("CustomElementRegistry").field("defined", &tags).finish()
    }
}

impl CustomElementRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Execute a closure with read access to the definitions.
    pub fn with_read<R>(&self, f: impl FnOnce(&CustomElementMap) -> R) -> R {
        let guard = self.inner.read();
        f(&guard)
    }

    /// Execute a closure with write access to the definitions.
    pub fn with_write<R>(&self, f: impl FnOnce(&mut CustomElementMap) -> R) -> R {
        let mut guard = self.inner.write();
        f(&mut guard)
    }

    /// Define a custom element. Names must contain a hyphen.
    ///
    /// Redefining a tag replaces its callback.
    pub fn define<F>(&self, name: &str, connected: F) -> MorphResult<()>
    where
        F: Fn(&mut LiveTree, NodeId) + Send + Sync + 'static,
    {
        if !is_valid_custom_element_name(name) {
            return Err(MorphError::InvalidCustomElementName(name.to_string()));
        }
        let tag = Tag::from(name.to_ascii_lowercase());
        self.with_write(|m| {
            m.insert(tag, Arc::new(connected));
        });
        Ok(())
    }

    /// Check if a tag is defined.
    pub fn is_defined(&self, tag: &str) -> bool {
        self.with_read(|m| m.contains_key(tag))
    }

    /// Get the callback for a tag.
    pub fn get(&self, tag: &str) -> Option<ConnectedCallback> {
        self.with_read(|m| m.get(tag).cloned())
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.with_read(|m| m.len())
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn is_valid_custom_element_name(name: &str) -> bool {
    name.starts_with(|c: char| c.is_ascii_alphabetic())
        && name.contains('-')
        && !name.contains(|c: char| c.is_ascii_whitespace() || c == '/' || c == '>')
}
