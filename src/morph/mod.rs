//! Morph session driver.
//!
//! One [`Morph`] is one pass over one root:
//!
//! ```text
//! Idle ──► StreamReceiving ⇄ Diffing ──► MutationsApplied ──► (frame) ──► Idle
//! ```
//!
//! Chunks go through the [`ChunkAssembler`]; every parse event is reported
//! to `on_node` and handed to the [`Reconciler`]; the resulting records are
//! queued in the [`MutationScheduler`] and applied according to the
//! [`FlushPolicy`].
//!
//! # Example
//!
//! ```ignore
//! let mut morph = Morph::new(&mut tree, root).options(MorphOptions::new().transition(true));
//! morph.push_chunk("<ul><li key=\"a\">")?;
//! morph.push_chunk("A</li></ul>")?;
//! let report = morph.finish()?;
//! ```

mod options;

pub use options::{MorphConfig, MorphOptions, MorphReport, OnNodeFn};

use tracing::{debug, trace};

use crate::algo::{DiffStats, Reconciler, SubtreePolicy};
use crate::dom::{Dom, NodeId};
use crate::error::{MorphError, MorphResult};
use crate::parse::{ChunkAssembler, ParseEvent};
use crate::schedule::{FlushPolicy, HostRuntime, MutationRecord, MutationScheduler, NoopHost, PassState};

#[cfg(feature = "async")]
pub use async_impl::morph_stream;

/// Read queued until the pass has settled.
pub type SettleFn<'a, D> = Box<dyn FnOnce(&D) + 'a>;

/// Parser and reconciler state, created with the first chunk.
struct Active<'a, D: ?Sized> {
    assembler: ChunkAssembler,
    policy: SubtreePolicy<'a, D>,
    reconciler: Reconciler,
}

// =============================================================================
// Morph
// =============================================================================

/// One streaming morph pass over the children of `root`.
pub struct Morph<'a, D: ?Sized, H = NoopHost> {
    dom: &'a mut D,
    root: NodeId,
    config: MorphConfig,
    options: MorphOptions<'a, D>,
    host: H,
    active: Option<Active<'a, D>>,
    scheduler: MutationScheduler,
    settle_tasks: Vec<SettleFn<'a, D>>,
    state: PassState,
    events: Vec<ParseEvent>,
    out: Vec<MutationRecord>,
    /// Aborted by an error or cancellation
    closed: bool,
}

impl<D: ?Sized, H> std::fmt::Debug for Morph<'_, D, H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Morph")
            .field("root", &self.root)
            .field("config", &self.config)
            .field("options", &self.options)
            .field("state", &self.state)
            .field("scheduler", &self.scheduler)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl<'a, D: Dom + ?Sized> Morph<'a, D> {
    /// Start a pass over the children of `root`.
    #[inline]
    pub fn new(dom: &'a mut D, root: NodeId) -> Self {
        Self {
            dom,
            root,
            config: MorphConfig::default(),
            options: MorphOptions::default(),
            host: NoopHost,
            active: None,
            scheduler: MutationScheduler::new(),
            settle_tasks: Vec::new(),
            state: PassState::Idle,
            events: Vec::new(),
            out: Vec::new(),
            closed: false,
        }
    }
}

impl<'a, D: Dom + ?Sized, H: HostRuntime> Morph<'a, D, H> {
    /// Set per-call options. Takes effect if set before the first chunk.
    #[inline]
    pub fn options(mut self, options: MorphOptions<'a, D>) -> Self {
        self.options = options;
        self
    }

    /// Set tuning config. Takes effect if set before the first chunk.
    #[inline]
    pub fn config(mut self, config: MorphConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `host` for frame boundaries and view transitions.
    pub fn with_host<H2: HostRuntime>(self, host: H2) -> Morph<'a, D, H2> {
        Morph {
            dom: self.dom,
            root: self.root,
            config: self.config,
            options: self.options,
            host,
            active: self.active,
            scheduler: self.scheduler,
            settle_tasks: self.settle_tasks,
            state: self.state,
            events: self.events,
            out: self.out,
            closed: self.closed,
        }
    }

    /// Inspect the live tree without consuming the session.
    #[inline]
    pub fn inspect<F>(self, f: F) -> Self
    where
        F: FnOnce(&D),
    {
        f(&*self.dom);
        self
    }

    /// Run `f` once the pass has settled (after the host's frame boundary).
    pub fn after_settle<F>(&mut self, f: F)
    where
        F: FnOnce(&D) + 'a,
    {
        self.settle_tasks.push(Box::new(f));
    }

    /// The live tree as it is now.
    #[inline]
    pub fn dom(&self) -> &D {
        &*self.dom
    }

    #[inline]
    pub fn root(&self) -> NodeId {
        self.root
    }

    #[inline]
    pub fn state(&self) -> PassState {
        self.state
    }

    /// Statistics so far.
    pub fn stats(&self) -> DiffStats {
        self.active
            .as_ref()
            .map(|active| active.reconciler.stats())
            .unwrap_or_default()
    }

    /// Mutations applied so far, in order.
    #[inline]
    pub fn applied(&self) -> &[MutationRecord] {
        self.scheduler.applied()
    }

    /// Feed one fragment of the incoming markup.
    ///
    /// On error the pass is aborted: pending mutations are dropped, already
    /// applied ones stay. Later calls return [`MorphError::Cancelled`].
    pub fn push_chunk(&mut self, chunk: impl AsRef<[u8]>) -> MorphResult<()> {
        if self.closed {
            return Err(MorphError::Cancelled);
        }
        self.start();
        match self.feed(chunk.as_ref()) {
            Ok(()) => Ok(()),
            Err(err) => Err(self.abort(err)),
        }
    }

    /// End of stream: settle the reconciler, apply every pending mutation and
    /// run the settle tasks.
    ///
    /// There is no frame clock on this path, so the pass settles right after
    /// application. Use `run` to wait for the host's frame boundary.
    pub fn finish(mut self) -> MorphResult<MorphReport> {
        let stats = self.complete()?;
        self.settled();
        Ok(self.into_report(stats))
    }

    /// Abort the pass. Pending mutations are dropped; returns the applied log.
    pub fn cancel(mut self) -> MorphReport {
        let stats = self.stats();
        let _ = self.abort(MorphError::Cancelled);
        self.into_report(stats)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Internals
    // ─────────────────────────────────────────────────────────────────────

    fn enter(&mut self, next: PassState) {
        if self.state != next {
            trace!(from = ?self.state, to = ?next, "pass state");
            self.state = next;
        }
    }

    fn start(&mut self) {
        if self.active.is_some() {
            return;
        }
        let assembler = ChunkAssembler::new(
            self.dom.namespace(self.root),
            self.dom.tag(self.root),
            self.config.max_depth,
        );
        let mut policy = SubtreePolicy::new(self.options.ignore.take());
        let reconciler = Reconciler::new(&*self.dom, self.root, &mut policy, self.options.key_fn);
        debug!(root = %self.root, config = ?self.config, "morph pass started");
        self.active = Some(Active {
            assembler,
            policy,
            reconciler,
        });
        self.enter(PassState::StreamReceiving);
    }

    fn feed(&mut self, chunk: &[u8]) -> MorphResult<()> {
        let Some(active) = self.active.as_mut() else {
            return Ok(());
        };
        active.assembler.push(chunk, &mut self.events)?;
        self.reconcile_events();
        if self.config.flush == FlushPolicy::EveryChunk {
            self.apply();
        }
        Ok(())
    }

    /// Hand buffered parse events to the reconciler.
    fn reconcile_events(&mut self) {
        if self.events.is_empty() || self.active.is_none() {
            return;
        }
        self.enter(PassState::Diffing);
        if let Some(active) = self.active.as_mut() {
            for event in self.events.drain(..) {
                trace!(?event, "parse event");
                if let (Some(on_node), Some(node)) = (self.options.on_node.as_mut(), event.node()) {
                    on_node(node);
                }
                active
                    .reconciler
                    .handle(event, &mut *self.dom, &mut active.policy, &mut self.out);
            }
        }
        self.scheduler.queue(self.out.drain(..));
        self.enter(PassState::StreamReceiving);
    }

    fn apply(&mut self) {
        self.scheduler
            .flush(&mut *self.dom, &mut self.host, self.options.transition);
    }

    /// Close the stream and apply everything.
    fn complete(&mut self) -> MorphResult<DiffStats> {
        if self.closed {
            return Err(MorphError::Cancelled);
        }
        self.start();
        let Some(mut active) = self.active.take() else {
            return Ok(DiffStats::default());
        };
        if let Err(err) = active.assembler.finish(&mut self.events) {
            return Err(self.abort(err));
        }
        self.active = Some(active);
        self.reconcile_events();

        let Some(mut active) = self.active.take() else {
            return Ok(DiffStats::default());
        };
        self.enter(PassState::Diffing);
        let stats = active
            .reconciler
            .finish(&mut *self.dom, &mut active.policy, &mut self.out);
        self.scheduler.queue(self.out.drain(..));
        self.apply();
        self.closed = true;
        self.enter(PassState::MutationsApplied);

        debug!(
            root = %self.root,
            applied = self.scheduler.applied().len(),
            flushes = self.scheduler.flushes(),
            kept = stats.nodes_kept,
            moved = stats.nodes_moved,
            inserted = stats.nodes_inserted,
            removed = stats.nodes_removed,
            replaced = stats.nodes_replaced,
            predicate_failures = active.policy.failures(),
            "morph pass applied"
        );
        Ok(stats)
    }

    fn settled(&mut self) {
        for task in self.settle_tasks.drain(..) {
            task(&*self.dom);
        }
        self.enter(PassState::Idle);
    }

    fn abort(&mut self, err: MorphError) -> MorphError {
        let dropped = self.scheduler.discard_pending();
        self.out.clear();
        self.events.clear();
        self.active = None;
        self.settle_tasks.clear();
        self.closed = true;
        debug!(root = %self.root, dropped, error = %err, "morph pass aborted");
        self.enter(PassState::Idle);
        err
    }

    fn into_report(self, stats: DiffStats) -> MorphReport {
        MorphReport {
            mutations: self.scheduler.into_applied(),
            stats,
        }
    }
}

/// Morph the children of `root` into `html` in a single pass.
///
/// # Example
///
/// ```ignore
/// let report = morph(&mut tree, root, "<p>hello</p>", MorphOptions::new())?;
/// assert!(report.has_changes());
/// ```
pub fn morph<'a, D: Dom + ?Sized>(
    dom: &'a mut D,
    root: NodeId,
    html: impl AsRef<[u8]>,
    options: MorphOptions<'a, D>,
) -> MorphResult<MorphReport> {
    let mut session = Morph::new(dom, root).options(options);
    session.push_chunk(html)?;
    session.finish()
}

// =============================================================================
// Async driver (async feature)
// =============================================================================

#[cfg(feature = "async")]
mod async_impl {
    use std::fmt::Display;
    use std::pin::pin;

    use futures_util::future::{Either, select};
    use futures_util::stream::{Stream, StreamExt};

    use crate::cancel::CancelToken;
    use crate::dom::{Dom, NodeId};
    use crate::error::{MorphError, MorphResult};
    use crate::schedule::HostRuntime;

    use super::{Morph, MorphOptions, MorphReport};

    impl<D: Dom + ?Sized, H: HostRuntime> Morph<'_, D, H> {
        /// Drive the pass from a chunk stream until it ends, fails or is
        /// cancelled.
        ///
        /// Settle tasks run after the host's next frame boundary.
        pub async fn run<S, B, E>(mut self, stream: S, cancel: &CancelToken) -> MorphResult<MorphReport>
        where
            S: Stream<Item = Result<B, E>>,
            B: AsRef<[u8]>,
            E: Display,
        {
            let mut stream = pin!(stream);
            let mut cancelled = pin!(cancel.cancelled());

            loop {
                if cancel.is_cancelled() {
                    return Err(self.abort(MorphError::Cancelled));
                }
                match select(stream.next(), cancelled.as_mut()).await {
                    Either::Left((Some(Ok(chunk)), _)) => self.push_chunk(chunk)?,
                    Either::Left((Some(Err(err)), _)) => return Err(self.abort(MorphError::stream(err))),
                    Either::Left((None, _)) => break,
                    Either::Right(((), _)) => return Err(self.abort(MorphError::Cancelled)),
                }
            }

            let stats = self.complete()?;
            self.scheduler.settle(&mut self.host).await;
            self.settled();
            Ok(self.into_report(stats))
        }
    }

    /// Morph the children of `root` from a chunk stream.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let chunks = futures_util::stream::iter([Ok::<_, Infallible>("<p>"), Ok("hi</p>")]);
    /// let report = morph_stream(&mut tree, root, chunks, MorphOptions::new(), &token).await?;
    /// ```
    pub async fn morph_stream<'a, D, S, B, E>(
        dom: &'a mut D,
        root: NodeId,
        stream: S,
        options: MorphOptions<'a, D>,
        cancel: &CancelToken,
    ) -> MorphResult<MorphReport>
    where
        D: Dom + ?Sized,
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        Morph::new(dom, root).options(options).run(stream, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::dom::{CustomElementRegistry, LiveTree};
    use crate::error::ParseErrorKind;
    use crate::node::{Namespace, ParsedNode};

    const OLD: &str = "<div><a href=\"link\">hello</a><b>text</b><i key=\"test\">text2</i></div>";
    const NEW_CHUNKS: [&str; 4] = ["<div>", "<a href=\"link2\">hello2</a>", "<i key=\"test\">text1</i>", "</div>"];

    fn morph_chunks<'c>(
        tree: &mut LiveTree,
        chunks: impl IntoIterator<Item = &'c [u8]>,
    ) -> MorphResult<MorphReport> {
        let root = tree.document();
        let mut session = Morph::new(tree, root);
        for chunk in chunks {
            session.push_chunk(chunk)?;
        }
        session.finish()
    }

    #[test]
    fn test_streamed_update_preserves_identity() {
        let mut tree = LiveTree::parse(OLD).unwrap();
        let a = tree.find("a").unwrap();
        let i = tree.find("i").unwrap();
        let b = tree.find("b").unwrap();

        let report = morph_chunks(&mut tree, NEW_CHUNKS.iter().map(|c| c.as_bytes())).unwrap();

        let doc = tree.document();
        assert_eq!(
            tree.inner_html(doc),
            "<div><a href=\"link2\">hello2</a><i key=\"test\">text1</i></div>"
        );
        assert_eq!(tree.find("a"), Some(a));
        assert_eq!(tree.find("i"), Some(i));
        assert_eq!(tree.parent(b), None);
        assert!(report.mutations.contains(&MutationRecord::SetAttribute {
            node: a,
            name: "href".into(),
            old_value: Some("link".into()),
            value: "link2".into(),
        }));
        assert_eq!(report.stats.nodes_removed, 1);
        assert_eq!(report.stats.nodes_moved, 0);
    }

    #[test]
    fn test_chunking_does_not_change_result() {
        let new = NEW_CHUNKS.concat();

        let mut whole = LiveTree::parse(OLD).unwrap();
        let whole_report = morph_chunks(&mut whole, [new.as_bytes()]).unwrap();

        let mut split = LiveTree::parse(OLD).unwrap();
        let split_report = morph_chunks(&mut split, new.as_bytes().chunks(1)).unwrap();

        let mut mid_tag = LiveTree::parse(OLD).unwrap();
        let mid_report = morph_chunks(&mut mid_tag, new.as_bytes().chunks(7)).unwrap();

        let doc = whole.document();
        assert_eq!(whole.inner_html(doc), split.inner_html(doc));
        assert_eq!(whole.inner_html(doc), mid_tag.inner_html(doc));
        assert_eq!(whole_report.mutations, split_report.mutations);
        assert_eq!(whole_report.mutations, mid_report.mutations);
    }

    #[test]
    fn test_multibyte_split_across_chunks() {
        let mut tree = LiveTree::parse("<p>x</p>").unwrap();
        let html = "<p>caf\u{e9} \u{1f600}</p>";
        morph_chunks(&mut tree, html.as_bytes().chunks(1)).unwrap();
        let doc = tree.document();
        assert_eq!(tree.inner_html(doc), html);
    }

    #[test]
    fn test_rendered_output_is_idempotent() {
        let mut tree = LiveTree::parse(OLD).unwrap();
        let doc = tree.document();
        let html = tree.inner_html(doc);
        let report = morph(&mut tree, doc, &html, MorphOptions::new()).unwrap();
        assert!(!report.has_changes(), "{:?}", report.mutations);
        assert_eq!(tree.inner_html(doc), html);
    }

    #[test]
    fn test_on_node_sees_every_node() {
        let seen = RefCell::new(Vec::new());
        let mut tree = LiveTree::new();
        let doc = tree.document();
        let options = MorphOptions::new().on_node(|node| {
            seen.borrow_mut().push(match node {
                ParsedNode::Element(e) => e.tag.to_string(),
                ParsedNode::Text(t) => t.content.clone(),
            })
        });
        morph(&mut tree, doc, "<ul><li>a</li><li>b</li></ul>", options).unwrap();
        assert_eq!(*seen.borrow(), vec!["ul", "li", "a", "li", "b"]);
    }

    #[test]
    fn test_nested_root_and_namespace() {
        let mut tree = LiveTree::parse("<div id=app><p>old</p></div><svg></svg>").unwrap();
        let app = tree.find_by_attr("id", "app").unwrap();
        morph(&mut tree, app, "<p>new</p>", MorphOptions::new()).unwrap();
        let doc = tree.document();
        assert_eq!(tree.inner_html(doc), "<div id=\"app\"><p>new</p></div><svg></svg>");

        let svg = tree.find("svg").unwrap();
        morph(&mut tree, svg, "<circle r=\"1\"></circle>", MorphOptions::new()).unwrap();
        let circle = tree.find("circle").unwrap();
        assert_eq!(tree.namespace(circle), Namespace::Svg);
    }

    #[test]
    fn test_ignored_root_is_noop() {
        let mut tree = LiveTree::parse("<p>a</p>").unwrap();
        let doc = tree.document();
        let options = MorphOptions::<LiveTree>::new().ignore(|_, _| true);
        let report = morph(&mut tree, doc, "<b>b</b>", options).unwrap();
        assert!(report.is_empty());
        assert_eq!(tree.inner_html(doc), "<p>a</p>");
    }

    #[test]
    fn test_failing_predicate_is_fail_open() {
        let mut tree = LiveTree::parse("<p>a</p>").unwrap();
        let doc = tree.document();
        let options = MorphOptions::<LiveTree>::new().try_ignore(|_, _| Err("predicate exploded".into()));
        morph(&mut tree, doc, "<p>b</p>", options).unwrap();
        assert_eq!(tree.inner_html(doc), "<p>b</p>");
    }

    #[test]
    fn test_custom_key_selector() {
        let mut tree = LiveTree::parse("<li data-id=1>1</li><li data-id=2>2</li>").unwrap();
        let doc = tree.document();
        let second = tree.find_by_attr("data-id", "2").unwrap();
        let options = MorphOptions::new().key_fn(|attrs| {
            use crate::attr::AttrsExt;
            attrs.get_attr("data-id")
        });
        let report = morph(&mut tree, doc, "<li data-id=2>2</li><li data-id=1>1</li>", options).unwrap();
        assert_eq!(tree.children(doc)[0], second);
        assert_eq!(report.stats.nodes_moved, 1);
        assert_eq!(report.stats.nodes_replaced, 0);
    }

    #[test]
    fn test_connected_hook_fires_once_and_stays_out_of_log() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let registry = CustomElementRegistry::new();
        registry
            .define("x-widget", move |tree, node| {
                seen.fetch_add(1, Ordering::SeqCst);
                tree.set_attribute(node, "ready", "1");
            })
            .unwrap();
        let mut tree = LiveTree::parse("<p>a</p>").unwrap().with_registry(registry);
        let doc = tree.document();

        let report = morph(&mut tree, doc, "<p>a</p><x-widget></x-widget>", MorphOptions::new()).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(tree.inner_html(doc), "<p>a</p><x-widget ready=\"1\"></x-widget>");
        assert_eq!(report.len(), 1);
        assert!(matches!(report.mutations[0], MutationRecord::Insert { .. }));
    }

    #[test]
    fn test_end_of_pass_applies_at_finish() {
        let mut tree = LiveTree::parse("<p>a</p>").unwrap();
        let doc = tree.document();
        let mut session = Morph::new(&mut tree, doc);
        session.push_chunk("<p>b</p><p>c</p>").unwrap();
        assert_eq!(session.dom().inner_html(doc), "<p>a</p>");
        assert!(session.applied().is_empty());
        assert_eq!(session.state(), PassState::StreamReceiving);

        let report = session.finish().unwrap();
        assert_eq!(tree.inner_html(doc), "<p>b</p><p>c</p>");
        assert_eq!(report.stats.nodes_inserted, 1);
    }

    #[test]
    fn test_every_chunk_shows_progress() {
        let mut tree = LiveTree::new();
        let doc = tree.document();
        let mut session = Morph::new(&mut tree, doc).config(MorphConfig::streaming());
        session.push_chunk("<p>a</p>").unwrap();
        assert_eq!(session.dom().inner_html(doc), "<p>a</p>");
        session.push_chunk("<p>b</p>").unwrap();
        assert_eq!(session.dom().inner_html(doc), "<p>a</p><p>b</p>");
        let report = session.finish().unwrap();
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn test_parse_error_discards_and_next_call_succeeds() {
        let mut tree = LiveTree::parse("<p>a</p>").unwrap();
        let doc = tree.document();
        let err = morph(&mut tree, doc, "<p>b</span>", MorphOptions::new()).unwrap_err();
        assert!(matches!(err, MorphError::Parse(ParseErrorKind::UnexpectedEndTag(_))));
        assert_eq!(tree.inner_html(doc), "<p>a</p>");

        morph(&mut tree, doc, "<p>b</p>", MorphOptions::new()).unwrap();
        assert_eq!(tree.inner_html(doc), "<p>b</p>");
    }

    #[test]
    fn test_truncated_stream() {
        let mut tree = LiveTree::parse("<p>a</p>").unwrap();
        let doc = tree.document();
        let err = morph(&mut tree, doc, "<p>b</p><a href=\"x", MorphOptions::new()).unwrap_err();
        assert!(err.is_stream_error());
        assert_eq!(tree.inner_html(doc), "<p>a</p>");
    }

    #[test]
    fn test_depth_limit() {
        let mut tree = LiveTree::new();
        let doc = tree.document();
        let mut session = Morph::new(&mut tree, doc).config(MorphConfig::new(2, FlushPolicy::EndOfPass));
        let err = session.push_chunk("<a><b><i>").unwrap_err();
        assert!(matches!(err, MorphError::Parse(ParseErrorKind::TooDeep(2))));
        assert!(matches!(session.push_chunk("</i>"), Err(MorphError::Cancelled)));
    }

    #[test]
    fn test_sync_cancel_keeps_applied() {
        let mut tree = LiveTree::new();
        let doc = tree.document();
        let mut session = Morph::new(&mut tree, doc).config(MorphConfig::streaming());
        session.push_chunk("<p>a</p>").unwrap();
        session.push_chunk("<p>b").unwrap();
        let report = session.cancel();
        assert_eq!(report.len(), 1);
        assert_eq!(tree.inner_html(doc), "<p>a</p>");
    }

    #[test]
    fn test_settle_tasks_run_after_apply() {
        let observed = RefCell::new(String::new());
        let mut tree = LiveTree::new();
        let doc = tree.document();
        let mut session = Morph::new(&mut tree, doc);
        session.after_settle(|tree: &LiveTree| *observed.borrow_mut() = tree.inner_html(doc));
        session.push_chunk("<p>x</p>").unwrap();
        assert!(observed.borrow().is_empty());
        session.finish().unwrap();
        assert_eq!(*observed.borrow(), "<p>x</p>");
    }

    #[test]
    fn test_transition_bracket() {
        use parking_lot::Mutex;

        struct TransitionHost(Arc<Mutex<Vec<&'static str>>>);

        impl HostRuntime for TransitionHost {
            fn next_frame(&mut self) -> impl std::future::Future<Output = ()> {
                std::future::ready(())
            }

            fn supports_view_transition(&self) -> bool {
                true
            }

            fn start_view_transition(&mut self) {
                self.0.lock().push("start");
            }

            fn finish_view_transition(&mut self) {
                self.0.lock().push("finish");
            }
        }

        let events = Arc::new(Mutex::new(Vec::new()));
        let mut tree = LiveTree::new();
        let doc = tree.document();
        let mut session = Morph::new(&mut tree, doc)
            .options(MorphOptions::new().transition(true))
            .with_host(TransitionHost(Arc::clone(&events)))
            .inspect(|tree| assert!(tree.is_empty()));
        session.push_chunk("<p>x</p>").unwrap();
        let report = session.finish().unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(*events.lock(), vec!["start", "finish"]);
    }

    #[cfg(feature = "async")]
    mod stream {
        use std::convert::Infallible;
        use std::future::Future;

        use futures_util::StreamExt;
        use futures_util::stream;

        use super::*;
        use crate::cancel::CancelToken;

        struct FrameHost(Arc<AtomicUsize>);

        impl HostRuntime for FrameHost {
            fn next_frame(&mut self) -> impl Future<Output = ()> {
                let frames = Arc::clone(&self.0);
                async move {
                    tokio::task::yield_now().await;
                    frames.fetch_add(1, Ordering::SeqCst);
                }
            }
        }

        #[tokio::test]
        async fn test_run_over_stream() {
            let mut tree = LiveTree::parse(OLD).unwrap();
            let doc = tree.document();
            let chunks = stream::iter(NEW_CHUNKS.map(Ok::<_, Infallible>));
            let token = CancelToken::new();
            let report = morph_stream(&mut tree, doc, chunks, MorphOptions::new(), &token)
                .await
                .unwrap();
            assert!(report.has_changes());
            assert_eq!(
                tree.inner_html(doc),
                "<div><a href=\"link2\">hello2</a><i key=\"test\">text1</i></div>"
            );
        }

        #[tokio::test]
        async fn test_settle_waits_for_frame() {
            let frames = Arc::new(AtomicUsize::new(0));
            let seen_frames = Arc::new(AtomicUsize::new(usize::MAX));
            let mut tree = LiveTree::new();
            let doc = tree.document();

            let mut session = Morph::new(&mut tree, doc).with_host(FrameHost(Arc::clone(&frames)));
            let (probe, seen) = (Arc::clone(&frames), Arc::clone(&seen_frames));
            session.after_settle(move |_| seen.store(probe.load(Ordering::SeqCst), Ordering::SeqCst));

            let chunks = stream::iter([Ok::<_, Infallible>("<p>x</p>")]);
            session.run(chunks, &CancelToken::new()).await.unwrap();
            assert_eq!(seen_frames.load(Ordering::SeqCst), 1);
        }

        #[tokio::test]
        async fn test_cancel_discards_pending() {
            let mut tree = LiveTree::parse("<p>a</p>").unwrap();
            let doc = tree.document();
            let token = CancelToken::new();
            let trigger = token.clone();

            let chunks = stream::iter([Ok::<_, Infallible>("<p>b</p><p>c</p>")]).chain(stream::pending());
            let pass = morph_stream(&mut tree, doc, chunks, MorphOptions::new(), &token);
            let fire = async {
                tokio::task::yield_now().await;
                trigger.cancel();
            };
            let (result, ()) = tokio::join!(pass, fire);

            assert!(matches!(result, Err(MorphError::Cancelled)));
            assert_eq!(tree.inner_html(doc), "<p>a</p>");
        }

        #[tokio::test]
        async fn test_stream_error_aborts() {
            let mut tree = LiveTree::parse("<p>a</p>").unwrap();
            let doc = tree.document();
            let chunks = stream::iter([Ok("<p>b</p>"), Err("connection reset")]);
            let err = morph_stream(&mut tree, doc, chunks, MorphOptions::new(), &CancelToken::new())
                .await
                .unwrap_err();
            assert!(matches!(err, MorphError::Stream(ref msg) if msg == "connection reset"));
            assert_eq!(tree.inner_html(doc), "<p>a</p>");
        }
    }
}
