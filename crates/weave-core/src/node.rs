//! Advice records
//!
//! An [`AdviceNode`] is one registered piece of `before` or `after` advice:
//! its id, the callable, and its links inside exactly one chain.
//! `around` advice is not a node; see [`crate::around`].

use crate::registry::{AdviceId, WeavingRegistry};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Advice category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdviceKind {
    /// Runs ahead of the operation and may replace its arguments
    Before,
    /// Wraps the operation (or the previous around layer)
    Around,
    /// Runs after the operation and may replace its result
    After,
}

impl std::fmt::Display for AdviceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Before => "before",
            Self::Around => "around",
            Self::After => "after",
        };
        f.write_str(name)
    }
}

/// `before` advice: `Some(args)` replaces the current arguments
pub(crate) type BeforeFn<A> = Box<dyn Fn(&A) -> Option<A> + Send + Sync>;

/// `after` advice threading the current result
pub(crate) type AfterResultFn<A, R> = Box<dyn Fn(R, &A) -> R + Send + Sync>;

/// `after` advice seeing only the original arguments
pub(crate) type AfterArgsFn<A, R> = Box<dyn Fn(&A) -> Option<R> + Send + Sync>;

/// `after` advice, in one of its two consumption modes
pub(crate) enum AfterAdvice<A, R> {
    /// Receives the current result and the original arguments; its return
    /// value always becomes the result
    Result(AfterResultFn<A, R>),
    /// Receives only the original arguments; `None` keeps the result
    Arguments(AfterArgsFn<A, R>),
}

impl<A, R> AfterAdvice<A, R> {
    #[inline]
    pub(crate) fn receive_arguments(&self) -> bool {
        matches!(self, Self::Arguments(_))
    }

    /// Thread `result` through this advice
    pub(crate) fn apply(&self, result: R, original: &A) -> R {
        match self {
            Self::Result(advice) => advice(result, original),
            Self::Arguments(advice) => advice(original).unwrap_or(result),
        }
    }
}

/// Chain links of a node
///
/// Forward links are strong and backward links weak, so a chain never
/// forms a reference cycle.
pub(crate) struct Links<P> {
    pub(crate) next: Option<Arc<AdviceNode<P>>>,
    pub(crate) previous: Weak<AdviceNode<P>>,
}

/// One registered piece of chained advice
pub(crate) struct AdviceNode<P> {
    id: AdviceId,
    advice: P,
    links: Mutex<Links<P>>,
    removed: AtomicBool,
}

impl<P> AdviceNode<P> {
    /// Allocate an id from `registry` and build an unlinked node
    pub(crate) fn create(registry: &WeavingRegistry, advice: P) -> Arc<Self> {
        Arc::new(Self {
            id: registry.allocate_id(),
            advice,
            links: Mutex::new(Links {
                next: None,
                previous: Weak::new(),
            }),
            removed: AtomicBool::new(false),
        })
    }

    #[inline]
    pub(crate) fn id(&self) -> AdviceId {
        self.id
    }

    #[inline]
    pub(crate) fn advice(&self) -> &P {
        &self.advice
    }

    #[inline]
    pub(crate) fn next(&self) -> Option<Arc<Self>> {
        self.links.lock().next.clone()
    }

    #[inline]
    pub(crate) fn previous(&self) -> Option<Arc<Self>> {
        self.links.lock().previous.upgrade()
    }

    #[inline]
    pub(crate) fn set_next(&self, next: Option<Arc<Self>>) {
        self.links.lock().next = next;
    }

    #[inline]
    pub(crate) fn set_previous(&self, previous: Option<&Arc<Self>>) {
        self.links.lock().previous = previous.map_or_else(Weak::new, Arc::downgrade);
    }

    #[inline]
    pub(crate) fn is_removed(&self) -> bool {
        self.removed.load(Ordering::Acquire)
    }

    /// Flag the node removed; `false` if it already was
    #[inline]
    pub(crate) fn mark_removed(&self) -> bool {
        !self.removed.swap(true, Ordering::AcqRel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nodes_take_increasing_ids() {
        let registry = WeavingRegistry::default();
        let a = AdviceNode::create(&registry, "a");
        let b = AdviceNode::create(&registry, "b");
        assert!(a.id() < b.id());
        assert_eq!(*b.advice(), "b");
    }

    #[test]
    fn new_node_is_unlinked() {
        let registry = WeavingRegistry::default();
        let node = AdviceNode::create(&registry, ());
        assert!(node.next().is_none());
        assert!(node.previous().is_none());
        assert!(!node.is_removed());
    }

    #[test]
    fn mark_removed_once() {
        let registry = WeavingRegistry::default();
        let node = AdviceNode::create(&registry, ());
        assert!(node.mark_removed());
        assert!(!node.mark_removed());
        assert!(node.is_removed());
    }

    #[test]
    fn previous_link_is_weak() {
        let registry = WeavingRegistry::default();
        let a = AdviceNode::create(&registry, 1);
        let b = AdviceNode::create(&registry, 2);
        b.set_previous(Some(&a));
        assert_eq!(b.previous().map(|n| *n.advice()), Some(1));
        drop(a);
        assert!(b.previous().is_none());
    }

    #[test]
    fn after_result_mode_always_replaces() {
        let advice: AfterAdvice<u32, u32> = AfterAdvice::Result(Box::new(|r, a| r + a));
        assert!(!advice.receive_arguments());
        assert_eq!(advice.apply(10, &5), 15);
    }

    #[test]
    fn after_arguments_mode_keeps_result_on_none() {
        let advice: AfterAdvice<u32, u32> =
            AfterAdvice::Arguments(Box::new(|a| (*a > 3).then_some(*a * 2)));
        assert!(advice.receive_arguments());
        assert_eq!(advice.apply(10, &1), 10);
        assert_eq!(advice.apply(10, &4), 8);
    }

    #[test]
    fn advice_kind_display() {
        assert_eq!(AdviceKind::Before.to_string(), "before");
        assert_eq!(AdviceKind::Around.to_string(), "around");
        assert_eq!(AdviceKind::After.to_string(), "after");
    }
}
