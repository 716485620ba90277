//! Typed interception wrapper
//!
//! [`Interceptable`] is the statically typed form of a woven operation:
//! obtain it once, register advice on it, and invoke through it.
//!
//! # Example
//!
//! ```rust
//! use weave_core::Interceptable;
//!
//! let greet = Interceptable::new(|name: &String| format!("Hi {name}"));
//! greet.before(|name: &String| Some(name.to_uppercase()));
//! greet.after(|result: String, _: &String| result + "!");
//!
//! assert_eq!(greet.invoke(&"sam".to_string()), "Hi SAM!");
//! ```

use crate::around::{Operation, Proceed};
use crate::dispatcher::Dispatcher;
use crate::handle::AdviceHandle;
use crate::node::AfterAdvice;
use crate::registry::WeavingRegistry;
use std::sync::Arc;

/// An operation `Fn(&A) -> R` with before/around/after advice
///
/// Clones share one dispatcher.
pub struct Interceptable<A, R> {
    dispatcher: Arc<Dispatcher<A, R>>,
}

impl<A: 'static, R: 'static> Interceptable<A, R> {
    /// Wrap `operation`, drawing ids from the global registry
    pub fn new<F>(operation: F) -> Self
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        Self::with_registry(WeavingRegistry::global(), operation)
    }

    /// Wrap `operation`, drawing ids from `registry`
    pub fn with_registry<F>(registry: Arc<WeavingRegistry>, operation: F) -> Self
    where
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        Self::install(registry, "anonymous", Arc::new(operation))
    }

    /// Wrap an operation whose body only returns `R::default()`
    ///
    /// Useful as a hook point that exists purely to carry advice.
    #[must_use]
    pub fn passthrough() -> Self
    where
        R: Default,
    {
        Self::new(|_: &A| R::default())
    }

    pub(crate) fn install(
        registry: Arc<WeavingRegistry>,
        label: &str,
        operation: Operation<A, R>,
    ) -> Self {
        Self {
            dispatcher: Dispatcher::install(registry, label, operation),
        }
    }

    /// Invoke the operation through its advice
    ///
    /// A panic raised by any advice propagates to the caller and no later
    /// phase of this invocation runs.
    #[inline]
    pub fn invoke(&self, args: &A) -> R {
        self.dispatcher.dispatch(args)
    }

    /// Run `advice` ahead of the operation
    ///
    /// Returning `Some(args)` replaces the arguments seen by earlier-registered
    /// `before` advice and by the operation. The most recently registered
    /// `before` advice runs first.
    pub fn before<F>(&self, advice: F) -> AdviceHandle
    where
        F: Fn(&A) -> Option<A> + Send + Sync + 'static,
    {
        self.dispatcher.link_before(Box::new(advice))
    }

    /// Wrap the operation
    ///
    /// `advice` is called once, now, with a [`Proceed`] reaching the
    /// previously outermost layer, and returns the callable that replaces
    /// it. The most recently registered `around` advice is outermost.
    pub fn around<F, G>(&self, advice: F) -> AdviceHandle
    where
        F: FnOnce(Proceed<A, R>) -> G,
        G: Fn(&A) -> R + Send + Sync + 'static,
    {
        self.dispatcher.link_around(advice)
    }

    /// Run `advice` after the operation with the current result and the
    /// original arguments; its return value becomes the result
    ///
    /// `after` advice runs in registration order.
    pub fn after<F>(&self, advice: F) -> AdviceHandle
    where
        F: Fn(R, &A) -> R + Send + Sync + 'static,
    {
        self.dispatcher.link_after(AfterAdvice::Result(Box::new(advice)))
    }

    /// Run `advice` after the operation with only the original arguments;
    /// `Some(result)` replaces the result, `None` keeps it
    pub fn after_with_arguments<F>(&self, advice: F) -> AdviceHandle
    where
        F: Fn(&A) -> Option<R> + Send + Sync + 'static,
    {
        self.dispatcher
            .link_after(AfterAdvice::Arguments(Box::new(advice)))
    }

    /// Check if any advice is currently attached
    #[inline]
    #[must_use]
    pub fn has_advice(&self) -> bool {
        self.advice_count() > 0
    }

    /// Number of attached, unremoved advice registrations
    #[inline]
    #[must_use]
    pub fn advice_count(&self) -> usize {
        self.dispatcher.advice_count()
    }

    /// Operation name this wrapper was installed under
    #[inline]
    #[must_use]
    pub fn label(&self) -> &str {
        self.dispatcher.label()
    }

    /// Registry this wrapper draws advice ids from
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<WeavingRegistry> {
        self.dispatcher.registry()
    }

    /// Check if both wrappers share one dispatcher
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.dispatcher, &other.dispatcher)
    }
}

impl<A, R> Clone for Interceptable<A, R> {
    fn clone(&self) -> Self {
        Self {
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<A: 'static, R: 'static> std::fmt::Debug for Interceptable<A, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptable")
            .field("label", &self.label())
            .field("advice_count", &self.advice_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WeaveConfig;

    #[test]
    fn unadvised_invoke_calls_operation() {
        let double = Interceptable::new(|n: &u32| n * 2);
        assert_eq!(double.invoke(&21), 42);
        assert!(!double.has_advice());
        assert_eq!(double.label(), "anonymous");
    }

    #[test]
    fn passthrough_returns_default() {
        let hook: Interceptable<u32, Vec<u32>> = Interceptable::passthrough();
        assert!(hook.invoke(&3).is_empty());
        hook.after(|mut seen: Vec<u32>, n: &u32| {
            seen.push(*n);
            seen
        });
        assert_eq!(hook.invoke(&3), vec![3]);
    }

    #[test]
    fn clones_share_advice() {
        let double = Interceptable::new(|n: &u32| n * 2);
        let copy = double.clone();
        copy.after(|r: u32, _: &u32| r + 1);
        assert_eq!(double.invoke(&1), 3);
        assert!(double.ptr_eq(&copy));
    }

    #[test]
    fn private_registry_ids() {
        let registry = Arc::new(WeavingRegistry::new(WeaveConfig::default()));
        let op = Interceptable::with_registry(Arc::clone(&registry), |n: &u32| *n);
        let first = op.before(|_: &u32| None);
        let second = op.after_with_arguments(|_: &u32| None);
        assert_eq!(first.id().map(|id| id.0), Some(0));
        assert_eq!(second.id().map(|id| id.0), Some(1));
        assert_eq!(op.advice_count(), 2);
        assert!(Arc::ptr_eq(op.registry(), &registry));
    }

    #[test]
    fn debug_shows_label_and_count() {
        let op = Interceptable::new(|n: &u32| *n);
        op.before(|_: &u32| None);
        let text = format!("{op:?}");
        assert!(text.contains("anonymous"));
        assert!(text.contains("advice_count: 1"));
    }
}
