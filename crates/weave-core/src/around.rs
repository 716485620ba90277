//! Around layers
//!
//! `around` advice nests instead of chaining: each registration wraps the
//! layer that was outermost at the time, down to the captured original
//! operation. A closure cannot be spliced out of that nesting, so removal
//! cancels the layer instead and a cancelled layer forwards straight to the
//! layer it wraps.

use crate::registry::AdviceId;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared operation body: takes the argument value, returns the result
pub type Operation<A, R> = Arc<dyn Fn(&A) -> R + Send + Sync>;

/// One level of the around nesting
pub(crate) trait Invoke<A, R>: Send + Sync {
    fn invoke(&self, args: &A) -> R;
}

/// Innermost layer: the operation captured when the dispatcher was installed
pub(crate) struct OriginalLayer<A, R> {
    operation: Operation<A, R>,
}

impl<A, R> OriginalLayer<A, R> {
    pub(crate) fn new(operation: Operation<A, R>) -> Self {
        Self { operation }
    }
}

impl<A, R> Invoke<A, R> for OriginalLayer<A, R> {
    #[inline]
    fn invoke(&self, args: &A) -> R {
        (self.operation)(args)
    }
}

/// Inner call target handed to `around` advice
///
/// Calling it runs the layer that was outermost when the advice was
/// registered. Advice may call it any number of times, or never; in the
/// latter case the original operation and all inner layers are skipped.
pub struct Proceed<A, R> {
    inner: Arc<dyn Invoke<A, R>>,
}

impl<A, R> Proceed<A, R> {
    /// Invoke the wrapped layer
    #[inline]
    pub fn call(&self, args: &A) -> R {
        self.inner.invoke(args)
    }
}

impl<A, R> Clone for Proceed<A, R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R> std::fmt::Debug for Proceed<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Proceed").finish_non_exhaustive()
    }
}

/// Cancellable wrapper installed by one `around` registration
pub(crate) struct AroundLayer<A, R> {
    id: AdviceId,
    cancelled: AtomicBool,
    advised: RwLock<Option<Operation<A, R>>>,
    inner: Arc<dyn Invoke<A, R>>,
}

impl<A, R> AroundLayer<A, R> {
    /// Wrap `inner`; forwards to it until [`advise`](Self::advise) is called
    pub(crate) fn wrap(id: AdviceId, inner: Arc<dyn Invoke<A, R>>) -> Arc<Self> {
        Arc::new(Self {
            id,
            cancelled: AtomicBool::new(false),
            advised: RwLock::new(None),
            inner,
        })
    }

    #[inline]
    pub(crate) fn id(&self) -> AdviceId {
        self.id
    }

    pub(crate) fn proceed(&self) -> Proceed<A, R> {
        Proceed {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Install the advised callable unless the layer is already cancelled
    pub(crate) fn advise(&self, advised: Operation<A, R>) {
        let mut slot = self.advised.write();
        if !self.is_cancelled() {
            *slot = Some(advised);
        }
    }

    /// Switch the layer to fallthrough; `false` if it already was
    pub(crate) fn cancel(&self) -> bool {
        let first = !self.cancelled.swap(true, Ordering::AcqRel);
        self.advised.write().take();
        first
    }

    #[inline]
    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }
}

impl<A, R> Invoke<A, R> for AroundLayer<A, R> {
    fn invoke(&self, args: &A) -> R {
        if !self.is_cancelled() {
            let advised = self.advised.read().clone();
            if let Some(advised) = advised {
                return advised(args);
            }
        }
        self.inner.invoke(args)
    }
}
