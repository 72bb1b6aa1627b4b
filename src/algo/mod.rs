//! Reconciliation algorithms.
//!
//! - `matcher`: decision for one old/new node pair
//! - `attrs`: minimal attribute op list
//! - `reconcile`: streaming keyed child reconciler
//! - `policy`: ignore predicate cache and custom-element-safe insertion
//! - `hash`: deterministic subtree fingerprints

mod attrs;
mod hash;
mod matcher;
mod policy;
mod reconcile;

pub use attrs::{AttrOp, diff_attrs};
pub use hash::{StableHasher, fingerprint_element, fingerprint_live};
pub use matcher::{LiveCandidate, MatchOp, decide, text_change};
pub use policy::{IgnoreFn, SubtreePolicy, fire_connected, instantiate};
pub use reconcile::{DiffStats, Reconciler};
