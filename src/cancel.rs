//! Cooperative cancellation for morph passes.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "async")]
use futures_util::task::AtomicWaker;

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    #[cfg(feature = "async")]
    waker: AtomicWaker,
}

/// Cloneable cancellation flag shared between a pass and its owner.
///
/// Cancelling is sticky: once fired, every clone reports cancelled.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire the token.
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::Release);
        #[cfg(feature = "async")]
        self.inner.waker.wake();
    }

    /// Whether the token has fired.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once the token fires.
    ///
    /// Only the most recent waiter is woken.
    #[cfg(feature = "async")]
    pub fn cancelled(&self) -> impl std::future::Future<Output = ()> + '_ {
        std::future::poll_fn(move |cx| {
            if self.is_cancelled() {
                return std::task::Poll::Ready(());
            }
            self.inner.waker.register(cx.waker());
            if self.is_cancelled() {
                std::task::Poll::Ready(())
            } else {
                std::task::Poll::Pending
            }
        })
    }
}
