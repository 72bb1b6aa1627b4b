//! Attribute system for incoming and live elements
//!
//! Attributes are kept as an ordered `Vec` of name/value pairs. Order is
//! preserved for serialization but never compared.

use compact_str::CompactString;

/// Element tag name (ASCII lower-case for parsed markup)
pub type Tag = CompactString;

/// Attribute name
pub type AttrKey = CompactString;

/// Attribute value
pub type AttrValue = CompactString;

/// Element attributes as simple key-value pairs
pub type Attrs = Vec<(AttrKey, AttrValue)>;

/// Selects the identity key of an element from its attributes.
pub type KeyFn = fn(&[(AttrKey, AttrValue)]) -> Option<&str>;

/// Attribute names owned by the event-wiring layer.
///
/// These are consumed by the framework that renders the payload and are never
/// promoted onto (or stripped from) a live element.
pub const INTERNAL_ATTRS: &[&str] = &["data-action", "data-actions", "data-cid"];

/// Prefix of per-event internal attributes (`data-action-onclick`, ...)
pub const INTERNAL_ATTR_PREFIX: &str = "data-action-";

/// Check whether an attribute belongs to the internal deny-list.
#[inline]
pub fn is_internal_attr(name: &str) -> bool {
    INTERNAL_ATTRS.contains(&name) || name.starts_with(INTERNAL_ATTR_PREFIX)
}

/// Default key selector: `key`, falling back to `id`.
pub fn default_key(attrs: &[(AttrKey, AttrValue)]) -> Option<&str> {
    attrs.get_attr("key").or_else(|| attrs.get_attr("id"))
}

/// Extension trait for attribute operations on attribute slices
pub trait AttrsExt {
    /// Get an attribute value by name
    fn get_attr(&self, name: &str) -> Option<&str>;

    /// Check if an attribute exists
    fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }
}

impl AttrsExt for [(AttrKey, AttrValue)] {
    fn get_attr(&self, name: &str) -> Option<&str> {
        self.iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl AttrsExt for Attrs {
    fn get_attr(&self, name: &str) -> Option<&str> {
        self.as_slice().get_attr(name)
    }
}

/// Mutable attribute operations on an owned list
pub trait AttrsMutExt {
    /// Set an attribute value (insert or update), returning the previous value
    fn set_attr(&mut self, name: impl Into<AttrKey>, value: impl Into<AttrValue>) -> Option<AttrValue>;

    /// Remove an attribute by name, returning the old value if present
    fn remove_attr(&mut self, name: &str) -> Option<AttrValue>;

    /// Push an attribute unless the name is already present (first occurrence wins)
    fn push_unique(&mut self, name: impl Into<AttrKey>, value: impl Into<AttrValue>) -> bool;
}

impl AttrsMutExt for Attrs {
    fn set_attr(&mut self, name: impl Into<AttrKey>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        let name = name.into();
        let value = value.into();
        if let Some(attr) = self.iter_mut().find(|(k, _)| *k == name) {
            Some(std::mem::replace(&mut attr.1, value))
        } else {
            self.push((name, value));
            None
        }
    }

    fn remove_attr(&mut self, name: &str) -> Option<AttrValue> {
        self.iter()
            .position(|(k, _)| k == name)
            .map(|pos| self.remove(pos).1)
    }

    fn push_unique(&mut self, name: impl Into<AttrKey>, value: impl Into<AttrValue>) -> bool {
        let name = name.into();
        if self.has_attr(&name) {
            return false;
        }
        self.push((name, value.into()));
        true
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(pairs: &[(&str, &str)]) -> Attrs {
        pairs.iter().map(|(k, v)| ((*k).into(), (*v).into())).collect()
    }

    #[test]
    fn test_attrs_operations() {
        let mut attrs: Attrs = Vec::new();

        assert_eq!(attrs.set_attr("id", "main"), None);
        attrs.set_attr("class", "container");
        assert_eq!(attrs.len(), 2);

        assert_eq!(attrs.get_attr("id"), Some("main"));
        assert_eq!(attrs.get_attr("href"), None);
        assert!(attrs.has_attr("class"));

        // Update existing keeps position
        assert_eq!(attrs.set_attr("class", "wrapper").as_deref(), Some("container"));
        assert_eq!(attrs[1].1, "wrapper");
        assert_eq!(attrs.len(), 2);

        let removed = attrs.remove_attr("id");
        assert_eq!(removed.as_deref(), Some("main"));
        assert!(!attrs.has_attr("id"));
        assert_eq!(attrs.len(), 1);
    }

    #[test]
    fn test_push_unique_first_wins() {
        let mut attrs: Attrs = Vec::new();
        assert!(attrs.push_unique("href", "a"));
        assert!(!attrs.push_unique("href", "b"));
        assert_eq!(attrs.get_attr("href"), Some("a"));
    }

    #[test]
    fn test_default_key_falls_back_to_id() {
        assert_eq!(default_key(&attrs(&[("key", "k"), ("id", "i")])), Some("k"));
        assert_eq!(default_key(&attrs(&[("id", "i")])), Some("i"));
        assert_eq!(default_key(&attrs(&[("class", "c")])), None);
    }

    #[test]
    fn test_internal_attrs() {
        assert!(is_internal_attr("data-action"));
        assert!(is_internal_attr("data-action-onclick"));
        assert!(is_internal_attr("data-cid"));
        assert!(!is_internal_attr("data-actionable"));
        assert!(!is_internal_attr("href"));
    }
}
