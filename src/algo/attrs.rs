//! Attribute differ.
//!
//! Removes come first (old order), then sets (new order). Internal
//! bookkeeping attributes are invisible in both directions.

use crate::attr::{AttrKey, AttrValue, AttrsExt, is_internal_attr};

/// One attribute change
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrOp {
    /// Attribute present only in old
    Remove { name: AttrKey, old_value: AttrValue },
    /// Attribute added or changed
    Set {
        name: AttrKey,
        old_value: Option<AttrValue>,
        value: AttrValue,
    },
}

impl AttrOp {
    /// Attribute name this op touches
    pub fn name(&self) -> &str {
        match self {
            Self::Remove { name, .. } | Self::Set { name, .. } => name,
        }
    }
}

/// Minimal ordered op list turning `old` into `new`.
pub fn diff_attrs(old: &[(AttrKey, AttrValue)], new: &[(AttrKey, AttrValue)]) -> Vec<AttrOp> {
    let mut ops = Vec::new();

    for (name, value) in old {
        if is_internal_attr(name) || new.has_attr(name) {
            continue;
        }
        ops.push(AttrOp::Remove {
            name: name.clone(),
            old_value: value.clone(),
        });
    }

    for (name, value) in new {
        if is_internal_attr(name) {
            continue;
        }
        let old_value = old.get_attr(name);
        if old_value == Some(value.as_str()) {
            continue;
        }
        ops.push(AttrOp::Set {
            name: name.clone(),
            old_value: old_value.map(AttrValue::from),
            value: value.clone(),
        });
    }

    ops
}
