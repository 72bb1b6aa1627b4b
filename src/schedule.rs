//! Mutation scheduling.
//!
//! The reconciler only describes changes. [`MutationScheduler`] collects
//! them for one pass, applies them in order against a [`Dom`], fires the
//! custom-element hook for inserted subtrees and reports "settled" once the
//! host has passed a frame boundary.

use std::future::Future;

use tracing::{debug, trace};

use crate::attr::{AttrKey, AttrValue};
use crate::dom::{Dom, NodeId};

// =============================================================================
// MutationRecord
// =============================================================================

/// One atomic change to the live tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationRecord {
    /// Insert a detached node
    Insert {
        parent: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    },
    /// Detach a node
    Remove { parent: NodeId, node: NodeId },
    /// Re-insert an attached node, keeping its identity
    Move {
        parent: NodeId,
        node: NodeId,
        before: Option<NodeId>,
    },
    SetAttribute {
        node: NodeId,
        name: AttrKey,
        old_value: Option<AttrValue>,
        value: AttrValue,
    },
    RemoveAttribute {
        node: NodeId,
        name: AttrKey,
        old_value: AttrValue,
    },
    SetText {
        node: NodeId,
        old_value: String,
        value: String,
    },
}

impl MutationRecord {
    /// Node the record changes.
    pub fn target(&self) -> NodeId {
        match self {
            Self::Insert { node, .. }
            | Self::Remove { node, .. }
            | Self::Move { node, .. }
            | Self::SetAttribute { node, .. }
            | Self::RemoveAttribute { node, .. }
            | Self::SetText { node, .. } => *node,
        }
    }

    /// Whether the record changes tree structure.
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Insert { .. } | Self::Remove { .. } | Self::Move { .. })
    }

    /// Apply to `dom`.
    pub fn apply<D: Dom + ?Sized>(&self, dom: &mut D) {
        match self {
            Self::Insert { parent, node, before } | Self::Move { parent, node, before } => {
                dom.insert_before(*parent, *node, *before)
            }
            Self::Remove { parent, node } => dom.remove_child(*parent, *node),
            Self::SetAttribute { node, name, value, .. } => dom.set_attribute(*node, name, value),
            Self::RemoveAttribute { node, name, .. } => dom.remove_attribute(*node, name),
            Self::SetText { node, value, .. } => dom.set_text(*node, value),
        }
    }
}

// =============================================================================
// Pass state
// =============================================================================

/// Lifecycle of one morph invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PassState {
    #[default]
    Idle,
    /// Waiting for or buffering stream chunks
    StreamReceiving,
    /// Pairing parsed nodes with the live tree
    Diffing,
    /// Every mutation of the pass is applied; not yet settled
    MutationsApplied,
}

/// When queued mutations reach the live tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlushPolicy {
    /// Apply once, after the stream completes
    #[default]
    EndOfPass,
    /// Apply after every chunk
    EveryChunk,
}

// =============================================================================
// HostRuntime
// =============================================================================

/// Host services: frame clock and view transitions.
///
/// # Example
///
/// ```ignore
/// struct RafHost;
///
/// impl HostRuntime for RafHost {
///     fn next_frame(&mut self) -> impl Future<Output = ()> {
///         request_animation_frame()
///     }
/// }
/// ```
pub trait HostRuntime {
    /// Resolves at the next frame boundary.
    fn next_frame(&mut self) -> impl Future<Output = ()>;

    fn supports_view_transition(&self) -> bool {
        false
    }

    fn start_view_transition(&mut self) {}

    fn finish_view_transition(&mut self) {}
}

/// Host without a frame clock; every frame boundary is immediate.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHost;

impl HostRuntime for NoopHost {
    fn next_frame(&mut self) -> impl Future<Output = ()> {
        std::future::ready(())
    }
}

// =============================================================================
// MutationScheduler
// =============================================================================

/// Batches a pass's mutations.
#[derive(Debug, Default)]
pub struct MutationScheduler {
    pending: Vec<MutationRecord>,
    applied: Vec<MutationRecord>,
    flushes: usize,
    settled: bool,
}

impl MutationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue records for the next flush.
    pub fn queue(&mut self, records: impl IntoIterator<Item = MutationRecord>) {
        self.pending.extend(records);
        self.settled = false;
    }

    /// Records waiting to be applied.
    pub fn pending(&self) -> &[MutationRecord] {
        &self.pending
    }

    /// Records already applied, in order.
    pub fn applied(&self) -> &[MutationRecord] {
        &self.applied
    }

    /// Number of non-empty flushes so far.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    /// Apply every pending record in order. Returns how many were applied.
    ///
    /// With `transition` set and host support, application is bracketed by
    /// the host's view transition.
    pub fn flush<D, H>(&mut self, dom: &mut D, host: &mut H, transition: bool) -> usize
    where
        D: Dom + ?Sized,
        H: HostRuntime + ?Sized,
    {
        if self.pending.is_empty() {
            return 0;
        }

        let bracket = transition && host.supports_view_transition();
        if bracket {
            host.start_view_transition();
        }

        let count = self.pending.len();
        for record in self.pending.drain(..) {
            trace!(?record, "apply");
            record.apply(dom);
            if let MutationRecord::Insert { node, .. } = record {
                crate::algo::fire_connected(dom, node);
            }
            self.applied.push(record);
        }

        if bracket {
            host.finish_view_transition();
        }
        self.flushes += 1;
        debug!(count, transition = bracket, "flushed mutations");
        count
    }

    /// Drop pending records. Already applied ones stay applied.
    pub fn discard_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Wait for the host's next frame boundary, then mark the pass settled.
    pub async fn settle<H: HostRuntime + ?Sized>(&mut self, host: &mut H) {
        host.next_frame().await;
        self.settled = true;
    }

    /// Whether a frame boundary passed since the last queued record.
    pub fn is_settled(&self) -> bool {
        self.settled
    }

    /// Consume the scheduler, returning the applied log.
    pub fn into_applied(self) -> Vec<MutationRecord> {
        self.applied
    }
}
