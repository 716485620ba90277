//! Per-operation dispatcher
//!
//! A [`Dispatcher`] owns the `before` and `after` chains and the around
//! nesting of one operation. Invoking it runs:
//!
//! 1. the watermark snapshot,
//! 2. `before` advice head to tail, threading replaced arguments,
//! 3. the outermost around layer (the original when there is none),
//! 4. `after` advice head to tail, skipping ids at or above the watermark,
//!
//! and returns the final result. No lock is held while advice runs, so
//! advice may dispatch, register or remove re-entrantly.

use crate::around::{AroundLayer, Invoke, OriginalLayer, Operation, Proceed};
use crate::chain::Chain;
use crate::handle::{AdviceHandle, Detach};
use crate::node::{AdviceKind, AdviceNode, AfterAdvice, BeforeFn};
use crate::registry::{AdviceId, WeavingRegistry};
use parking_lot::Mutex;
use std::sync::{Arc, Weak};

pub(crate) struct DispatchChains<A, R> {
    before: Chain<BeforeFn<A>>,
    after: Chain<AfterAdvice<A, R>>,
    /// Innermost first
    around: Vec<Arc<AroundLayer<A, R>>>,
    original: Arc<dyn Invoke<A, R>>,
}

impl<A: 'static, R: 'static> DispatchChains<A, R> {
    fn outermost(&self) -> Arc<dyn Invoke<A, R>> {
        match self.around.last() {
            Some(layer) => Arc::clone(layer) as Arc<dyn Invoke<A, R>>,
            None => Arc::clone(&self.original),
        }
    }
}

fn before_chain<A, R>(chains: &mut DispatchChains<A, R>) -> &mut Chain<BeforeFn<A>> {
    &mut chains.before
}

fn after_chain<A, R>(chains: &mut DispatchChains<A, R>) -> &mut Chain<AfterAdvice<A, R>> {
    &mut chains.after
}

pub(crate) struct Dispatcher<A, R> {
    label: String,
    registry: Arc<WeavingRegistry>,
    chains: Mutex<DispatchChains<A, R>>,
}

impl<A: 'static, R: 'static> Dispatcher<A, R> {
    /// Wrap `original` for the operation called `label`
    pub(crate) fn install(
        registry: Arc<WeavingRegistry>,
        label: &str,
        original: Operation<A, R>,
    ) -> Arc<Self> {
        if registry.config().trace_registration {
            tracing::debug!(operation = label, "dispatcher installed");
        }
        Arc::new(Self {
            label: label.to_string(),
            registry,
            chains: Mutex::new(DispatchChains {
                before: Chain::new(),
                after: Chain::new(),
                around: Vec::new(),
                original: Arc::new(OriginalLayer::new(original)),
            }),
        })
    }

    #[inline]
    pub(crate) fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub(crate) fn registry(&self) -> &Arc<WeavingRegistry> {
        &self.registry
    }

    /// Run the woven operation
    pub(crate) fn dispatch(&self, args: &A) -> R {
        let watermark = self.registry.watermark();
        let trace = self.registry.config().trace_dispatch;
        if trace {
            tracing::trace!(operation = %self.label, %watermark, "dispatch");
        }

        let mut replaced: Option<A> = None;
        let mut cursor = self.chains.lock().before.head();
        while let Some(node) = cursor {
            if !node.is_removed() {
                if trace {
                    tracing::trace!(operation = %self.label, advice = %node.id(), "before");
                }
                let current = replaced.as_ref().unwrap_or(args);
                if let Some(next) = (node.advice())(current) {
                    replaced = Some(next);
                }
            }
            cursor = node.next();
        }
        let current = replaced.as_ref().unwrap_or(args);

        let around = self.chains.lock().outermost();
        let mut result = around.invoke(current);

        let mut cursor = self.chains.lock().after.head();
        while let Some(node) = cursor {
            if node.id() < watermark && !node.is_removed() {
                if trace {
                    tracing::trace!(
                        operation = %self.label,
                        advice = %node.id(),
                        receive_arguments = node.advice().receive_arguments(),
                        "after"
                    );
                }
                result = node.advice().apply(result, args);
            }
            cursor = node.next();
        }
        result
    }

    pub(crate) fn link_before(self: &Arc<Self>, advice: BeforeFn<A>) -> AdviceHandle {
        let node = {
            let mut chains = self.chains.lock();
            let node = AdviceNode::create(&self.registry, advice);
            chains.before.link_front(Arc::clone(&node));
            node
        };
        self.chain_handle(node, AdviceKind::Before, before_chain::<A, R>)
    }

    pub(crate) fn link_after(self: &Arc<Self>, advice: AfterAdvice<A, R>) -> AdviceHandle {
        let node = {
            let mut chains = self.chains.lock();
            let node = AdviceNode::create(&self.registry, advice);
            chains.after.link_back(Arc::clone(&node));
            node
        };
        self.chain_handle(node, AdviceKind::After, after_chain::<A, R>)
    }

    /// Install a new outermost layer, then build its advised callable
    ///
    /// The layer forwards to its inner layer until `advice` has returned.
    pub(crate) fn link_around<F, G>(self: &Arc<Self>, advice: F) -> AdviceHandle
    where
        F: FnOnce(Proceed<A, R>) -> G,
        G: Fn(&A) -> R + Send + Sync + 'static,
    {
        let layer = {
            let mut chains = self.chains.lock();
            let layer = AroundLayer::wrap(self.registry.allocate_id(), chains.outermost());
            chains.around.push(Arc::clone(&layer));
            layer
        };
        let guard = CancelOnUnwind(Some(&layer));
        let advised = advice(layer.proceed());
        layer.advise(Arc::new(advised));
        guard.disarm();

        let id = layer.id();
        self.registered(id, AdviceKind::Around);
        AdviceHandle::single(
            id,
            AdviceKind::Around,
            AroundDetach {
                dispatcher: Arc::downgrade(self),
                layer,
            },
        )
    }

    fn chain_handle<P>(
        self: &Arc<Self>,
        node: Arc<AdviceNode<P>>,
        kind: AdviceKind,
        select: fn(&mut DispatchChains<A, R>) -> &mut Chain<P>,
    ) -> AdviceHandle
    where
        P: Send + Sync + 'static,
    {
        let id = node.id();
        self.registered(id, kind);
        AdviceHandle::single(
            id,
            kind,
            ChainDetach {
                dispatcher: Arc::downgrade(self),
                node: Mutex::new(Some(node)),
                kind,
                select,
            },
        )
    }

    /// Live advice: linked chain nodes plus uncancelled around layers
    pub(crate) fn advice_count(&self) -> usize {
        let chains = self.chains.lock();
        let around = chains.around.iter().filter(|l| !l.is_cancelled()).count();
        chains.before.len() + chains.after.len() + around
    }

    fn registered(&self, id: AdviceId, kind: AdviceKind) {
        if self.registry.config().trace_registration {
            tracing::debug!(operation = %self.label, advice = %id, %kind, "advice registered");
        }
    }

    fn removed(&self, id: AdviceId, kind: AdviceKind) {
        if self.registry.config().trace_registration {
            tracing::debug!(operation = %self.label, advice = %id, %kind, "advice removed");
        }
    }
}

struct ChainDetach<A, R, P> {
    dispatcher: Weak<Dispatcher<A, R>>,
    node: Mutex<Option<Arc<AdviceNode<P>>>>,
    kind: AdviceKind,
    select: fn(&mut DispatchChains<A, R>) -> &mut Chain<P>,
}

impl<A: 'static, R: 'static, P: Send + Sync + 'static> Detach for ChainDetach<A, R, P> {
    fn detach(&self) -> bool {
        let Some(node) = self.node.lock().take() else {
            return false;
        };
        let Some(dispatcher) = self.dispatcher.upgrade() else {
            return node.mark_removed();
        };
        let unlinked = (self.select)(&mut dispatcher.chains.lock()).unlink(&node);
        if unlinked {
            dispatcher.removed(node.id(), self.kind);
        }
        unlinked
    }
}

struct AroundDetach<A, R> {
    dispatcher: Weak<Dispatcher<A, R>>,
    layer: Arc<AroundLayer<A, R>>,
}

/// Cancels a freshly installed layer whose factory unwound before it
/// could be advised
struct CancelOnUnwind<'a, A, R>(Option<&'a Arc<AroundLayer<A, R>>>);

impl<A, R> CancelOnUnwind<'_, A, R> {
    fn disarm(mut self) {
        self.0 = None;
    }
}

impl<A, R> Drop for CancelOnUnwind<'_, A, R> {
    fn drop(&mut self) {
        if let Some(layer) = self.0.take() {
            layer.cancel();
        }
    }
}

impl<A: 'static, R: 'static> Detach for AroundDetach<A, R> {
    fn detach(&self) -> bool {
        let cancelled = self.layer.cancel();
        if cancelled {
            if let Some(dispatcher) = self.dispatcher.upgrade() {
                dispatcher.removed(self.layer.id(), AdviceKind::Around);
            }
        }
        cancelled
    }
}
