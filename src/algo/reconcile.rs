//! Streaming child reconciler.
//!
//! Walks the live tree in lockstep with parse events. Every open live parent
//! has a [`Frame`]: the old children not yet consumed (`remaining`, in
//! order) plus the ones skipped over by an out-of-order match
//! (`displaced`). All consumed children sit before `remaining`'s front, so
//! that front is the insertion cursor.
//!
//! ```text
//! Open(e)  ──► pair with keyed / positional old child ──► Patch | Build | Ignored
//! Leaf(t)  ──► pair positionally                      ──► SetText | Insert | Replace
//! Close    ──► Patch: remove leftovers, Build: instantiate + Insert
//! ```
//!
//! Mutations are only described here; they are applied later by the
//! scheduler, so every read goes against the untouched old tree.
//!
//! # Identity
//!
//! - A keyed new child pairs with the old child of the same key anywhere in
//!   the sibling list. A match in `remaining` needs no move: the children in
//!   front of it become displaced. A match among displaced children is moved
//!   to the cursor.
//! - An unkeyed new child pairs with the first unkeyed old child (displaced
//!   ones first, as they come earlier in old order).
//! - An ignored old child pairs with the new child of the same key, or,
//!   when unkeyed, with the unkeyed new child arriving at its position; that
//!   new subtree is dropped. A new key never consumes it.
//! - Children still unpaired when the parent closes are removed.

use std::collections::VecDeque;

use tracing::{debug, trace};

use crate::attr::KeyFn;
use crate::dom::{Dom, NodeId};
use crate::node::{Element, Node, NodeType, ParsedNode, Text};
use crate::parse::ParseEvent;
use crate::schedule::MutationRecord;

use super::attrs::{AttrOp, diff_attrs};
use super::hash::{fingerprint_element, fingerprint_live};
use super::matcher::{LiveCandidate, MatchOp, decide, text_change};
use super::policy::{SubtreePolicy, instantiate};

// =============================================================================
// DiffStats
// =============================================================================

/// Statistics from one reconciliation pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DiffStats {
    /// Number of elements compared
    pub elements_compared: usize,
    /// Number of text, comment and doctype nodes compared
    pub text_nodes_compared: usize,
    /// Number of nodes kept with their identity
    pub nodes_kept: usize,
    /// Number of nodes moved
    pub nodes_moved: usize,
    /// Number of nodes replaced
    pub nodes_replaced: usize,
    /// Number of new nodes inserted (replacements excluded)
    pub nodes_inserted: usize,
    /// Number of old nodes removed (replacements excluded)
    pub nodes_removed: usize,
    /// Number of incoming nodes consumed by ignored live nodes
    pub nodes_ignored: usize,
    /// Number of text updates
    pub text_updates: usize,
    /// Number of attribute updates
    pub attr_updates: usize,
}

// =============================================================================
// Levels
// =============================================================================

#[derive(Debug)]
struct Frame {
    parent: NodeId,
    remaining: VecDeque<NodeId>,
    displaced: Vec<NodeId>,
}

/// Result of looking for an old counterpart.
enum Pairing {
    /// Paired with an ignored node; the new subtree is dropped
    Ignored,
    /// Paired with a live node; `moved` when it had to be brought to the cursor
    Found { node: NodeId, moved: bool },
    /// No counterpart
    Unpaired,
}

/// Where a built subtree goes once complete.
#[derive(Debug)]
struct Placement {
    parent: NodeId,
    before: Option<NodeId>,
    replaces: Option<NodeId>,
    /// `replaces` is a template that may be kept
    reuse: bool,
}

#[derive(Debug)]
enum Level {
    Patch(Frame),
    Ignored,
    /// New subtree being collected; nested builds have no placement
    Build {
        element: Element,
        placement: Option<Placement>,
    },
}

struct PairCtx<'p, 'a, D: Dom + ?Sized> {
    dom: &'p D,
    policy: &'p mut SubtreePolicy<'a, D>,
    key_fn: KeyFn,
}

impl<D: Dom + ?Sized> PairCtx<'_, '_, D> {
    fn ignored(&mut self, node: NodeId) -> bool {
        self.policy.is_ignored(self.dom, node)
    }

    fn key(&self, node: NodeId) -> Option<&str> {
        if self.dom.node_type(node) != NodeType::Element {
            return None;
        }
        (self.key_fn)(self.dom.attributes(node))
    }

}

impl Frame {
    fn new<D: Dom + ?Sized>(dom: &D, parent: NodeId) -> Self {
        Self {
            parent,
            remaining: dom.children(parent).iter().copied().collect(),
            displaced: Vec::new(),
        }
    }

    /// Insertion point for the next new child.
    fn cursor(&self) -> Option<NodeId> {
        self.remaining.front().copied()
    }

    /// Consume `remaining[index]`, displacing everything in front of it.
    fn take_remaining(&mut self, index: usize) -> Option<NodeId> {
        self.displaced.extend(self.remaining.drain(..index));
        self.remaining.pop_front()
    }

    fn take_keyed<D: Dom + ?Sized>(&mut self, ctx: &mut PairCtx<'_, '_, D>, key: &str) -> Pairing {
        if let Some(index) = self.remaining.iter().position(|&n| ctx.key(n) == Some(key)) {
            let ignored = ctx.ignored(self.remaining[index]);
            if let Some(node) = self.take_remaining(index) {
                return if ignored { Pairing::Ignored } else { Pairing::Found { node, moved: false } };
            }
        }
        if let Some(index) = self.displaced.iter().position(|&n| ctx.key(n) == Some(key)) {
            let node = self.displaced.remove(index);
            // An ignored node is never moved.
            return if ctx.ignored(node) { Pairing::Ignored } else { Pairing::Found { node, moved: true } };
        }
        Pairing::Unpaired
    }

    fn take_positional<D: Dom + ?Sized>(&mut self, ctx: &mut PairCtx<'_, '_, D>) -> Pairing {
        if let Some(index) = self
            .displaced
            .iter()
            .position(|&n| !ctx.ignored(n) && ctx.key(n).is_none())
        {
            let node = self.displaced.remove(index);
            return Pairing::Found { node, moved: true };
        }

        let mut found = None;
        // Keyed old children, ignored or not, only pair by key.
        for (index, &node) in self.remaining.iter().enumerate() {
            if ctx.key(node).is_none() {
                found = Some((index, ctx.ignored(node)));
                break;
            }
        }
        match found {
            Some((index, ignored)) => match self.take_remaining(index) {
                Some(_) if ignored => Pairing::Ignored,
                Some(node) => Pairing::Found { node, moved: false },
                None => Pairing::Unpaired,
            },
            None => Pairing::Unpaired,
        }
    }
}

// =============================================================================
// Reconciler
// =============================================================================

/// Streaming reconciler for the children of one root.
#[derive(Debug)]
pub struct Reconciler {
    stack: Vec<Level>,
    key_fn: KeyFn,
    stats: DiffStats,
}

impl Reconciler {
    /// Start reconciling the children of `root`.
    pub fn new<D: Dom + ?Sized>(dom: &D, root: NodeId, policy: &mut SubtreePolicy<'_, D>, key_fn: KeyFn) -> Self {
        let level = if policy.is_ignored(dom, root) {
            debug!(%root, "root is ignored, pass is a no-op");
            Level::Ignored
        } else {
            Level::Patch(Frame::new(dom, root))
        };
        Self {
            stack: vec![level],
            key_fn,
            stats: DiffStats::default(),
        }
    }

    /// Statistics so far.
    pub fn stats(&self) -> DiffStats {
        self.stats
    }

    /// Current nesting depth (the root counts as one).
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    /// Handle one parse event, appending mutations to `out`.
    pub fn handle<D: Dom + ?Sized>(
        &mut self,
        event: ParseEvent,
        dom: &mut D,
        policy: &mut SubtreePolicy<'_, D>,
        out: &mut Vec<MutationRecord>,
    ) {
        match event {
            ParseEvent::Open(element) => self.open(*element, dom, policy, out),
            ParseEvent::Leaf(text) => self.leaf(text, dom, policy, out),
            ParseEvent::Close(tag) => {
                if self.stack.len() <= 1 {
                    trace!(%tag, "close without open level");
                    return;
                }
                self.close(dom, policy, out);
            }
        }
    }

    /// End of stream: settle the root level.
    pub fn finish<D: Dom + ?Sized>(
        mut self,
        dom: &mut D,
        policy: &mut SubtreePolicy<'_, D>,
        out: &mut Vec<MutationRecord>,
    ) -> DiffStats {
        while !self.stack.is_empty() {
            self.close(dom, policy, out);
        }
        self.stats
    }

    fn open<D: Dom + ?Sized>(
        &mut self,
        element: Element,
        dom: &mut D,
        policy: &mut SubtreePolicy<'_, D>,
        out: &mut Vec<MutationRecord>,
    ) {
        let level = match self.stack.last_mut() {
            None | Some(Level::Ignored) => Level::Ignored,
            Some(Level::Build { .. }) => Level::Build {
                element,
                placement: None,
            },
            Some(Level::Patch(frame)) => {
                let mut ctx = PairCtx {
                    dom: &*dom,
                    policy,
                    key_fn: self.key_fn,
                };
                let pairing = match element.key(self.key_fn) {
                    Some(key) => frame.take_keyed(&mut ctx, key),
                    None => frame.take_positional(&mut ctx),
                };
                open_in_frame(frame, element, pairing, &*dom, &mut self.stats, out)
            }
        };
        self.stack.push(level);
    }

    fn leaf<D: Dom + ?Sized>(
        &mut self,
        text: Text,
        dom: &mut D,
        policy: &mut SubtreePolicy<'_, D>,
        out: &mut Vec<MutationRecord>,
    ) {
        let frame = match self.stack.last_mut() {
            None | Some(Level::Ignored) => return,
            Some(Level::Build { element, .. }) => {
                element.push(text);
                return;
            }
            Some(Level::Patch(frame)) => frame,
        };

        let pairing = {
            let mut ctx = PairCtx {
                dom: &*dom,
                policy,
                key_fn: self.key_fn,
            };
            frame.take_positional(&mut ctx)
        };
        let stats = &mut self.stats;

        let old = match pairing {
            Pairing::Ignored => {
                stats.nodes_ignored += 1;
                return;
            }
            Pairing::Unpaired => None,
            Pairing::Found { node, moved } => {
                if moved {
                    out.push(MutationRecord::Move {
                        parent: frame.parent,
                        node,
                        before: frame.cursor(),
                    });
                    stats.nodes_moved += 1;
                }
                Some(LiveCandidate::new(node, false))
            }
        };

        match decide(&*dom, old, Some(ParsedNode::Text(&text))) {
            MatchOp::Patch(node) => {
                stats.text_nodes_compared += 1;
                stats.nodes_kept += 1;
                if let Some(old_value) = text_change(&*dom, node, &text) {
                    out.push(MutationRecord::SetText {
                        node,
                        old_value,
                        value: text.content,
                    });
                    stats.text_updates += 1;
                }
            }
            MatchOp::Replace(old) => {
                let node = dom.create_text(text.kind, &text.content);
                out.push(MutationRecord::Insert {
                    parent: frame.parent,
                    node,
                    before: Some(old),
                });
                out.push(MutationRecord::Remove {
                    parent: frame.parent,
                    node: old,
                });
                stats.nodes_replaced += 1;
            }
            MatchOp::Insert => {
                let node = dom.create_text(text.kind, &text.content);
                out.push(MutationRecord::Insert {
                    parent: frame.parent,
                    node,
                    before: frame.cursor(),
                });
                stats.nodes_inserted += 1;
            }
            MatchOp::Noop | MatchOp::Remove(_) => {}
        }
    }

    fn close<D: Dom + ?Sized>(
        &mut self,
        dom: &mut D,
        policy: &mut SubtreePolicy<'_, D>,
        out: &mut Vec<MutationRecord>,
    ) {
        let Some(level) = self.stack.pop() else {
            return;
        };
        match level {
            Level::Ignored => {}
            Level::Patch(frame) => {
                let leftovers = frame.displaced.iter().chain(frame.remaining.iter());
                for &node in leftovers {
                    let old = LiveCandidate::new(node, policy.is_ignored(&*dom, node));
                    if let MatchOp::Remove(node) = decide(&*dom, Some(old), None) {
                        out.push(MutationRecord::Remove {
                            parent: frame.parent,
                            node,
                        });
                        self.stats.nodes_removed += 1;
                    }
                }
            }
            Level::Build {
                element,
                placement: None,
            } => {
                if let Some(Level::Build { element: parent, .. }) = self.stack.last_mut() {
                    parent.push(Node::from(element));
                }
            }
            Level::Build {
                element,
                placement: Some(placement),
            } => self.place(element, placement, dom, out),
        }
    }

    fn place<D: Dom + ?Sized>(
        &mut self,
        element: Element,
        placement: Placement,
        dom: &mut D,
        out: &mut Vec<MutationRecord>,
    ) {
        if let (true, Some(old)) = (placement.reuse, placement.replaces) {
            if fingerprint_element(&element) == fingerprint_live(&*dom, old) {
                trace!(%old, "template unchanged, keeping");
                self.stats.nodes_kept += 1;
                return;
            }
        }

        let node = instantiate(dom, &element);
        out.push(MutationRecord::Insert {
            parent: placement.parent,
            node,
            before: placement.before,
        });
        match placement.replaces {
            Some(old) => {
                out.push(MutationRecord::Remove {
                    parent: placement.parent,
                    node: old,
                });
                self.stats.nodes_replaced += 1;
            }
            None => self.stats.nodes_inserted += 1,
        }
    }
}

fn open_in_frame<D: Dom + ?Sized>(
    frame: &mut Frame,
    element: Element,
    pairing: Pairing,
    dom: &D,
    stats: &mut DiffStats,
    out: &mut Vec<MutationRecord>,
) -> Level {
    let old = match pairing {
        Pairing::Ignored => {
            stats.nodes_ignored += 1;
            return Level::Ignored;
        }
        Pairing::Unpaired => None,
        Pairing::Found { node, moved } => {
            if moved {
                out.push(MutationRecord::Move {
                    parent: frame.parent,
                    node,
                    before: frame.cursor(),
                });
                stats.nodes_moved += 1;
            }
            Some(LiveCandidate::new(node, false))
        }
    };

    match decide(dom, old, Some(ParsedNode::Element(&element))) {
        MatchOp::Patch(node) => {
            stats.elements_compared += 1;
            stats.nodes_kept += 1;
            for op in diff_attrs(dom.attributes(node), &element.attrs) {
                stats.attr_updates += 1;
                out.push(match op {
                    AttrOp::Remove { name, old_value } => MutationRecord::RemoveAttribute { node, name, old_value },
                    AttrOp::Set { name, old_value, value } => MutationRecord::SetAttribute {
                        node,
                        name,
                        old_value,
                        value,
                    },
                });
            }
            Level::Patch(Frame::new(dom, node))
        }
        MatchOp::Replace(old) => {
            stats.elements_compared += 1;
            let reuse = element.is_template() && dom.tag(old) == Some("template") && dom.namespace(old) == element.ns;
            Level::Build {
                element,
                placement: Some(Placement {
                    parent: frame.parent,
                    before: Some(old),
                    replaces: Some(old),
                    reuse,
                }),
            }
        }
        MatchOp::Insert => Level::Build {
            element,
            placement: Some(Placement {
                parent: frame.parent,
                before: frame.cursor(),
                replaces: None,
                reuse: false,
            }),
        },
        MatchOp::Noop | MatchOp::Remove(_) => Level::Ignored,
    }
}
