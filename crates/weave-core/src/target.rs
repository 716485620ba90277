//! Objects with named operation slots
//!
//! A [`Target`] maps operation names to operations of any signature. The
//! first advice registered on a name replaces its plain slot with a woven
//! one holding the dispatcher; later registrations find the woven slot and
//! reuse that dispatcher instead of wrapping it again. A woven slot stays
//! woven after all its advice is removed.

use crate::around::Operation;
use crate::error::{Result, WeaveError};
use crate::interceptable::Interceptable;
use crate::registry::WeavingRegistry;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;

/// Slot content, type-erased
///
/// `Plain` holds an [`Operation<A, R>`], `Woven` an [`Interceptable<A, R>`].
#[derive(Clone)]
enum Slot {
    Plain(Arc<dyn Any + Send + Sync>),
    Woven(Arc<dyn Any + Send + Sync>),
}

/// An object whose named operations can carry advice
pub struct Target {
    registry: Arc<WeavingRegistry>,
    slots: DashMap<String, Slot>,
}

impl Target {
    /// Create empty target using the global registry
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(WeavingRegistry::global())
    }

    /// Create empty target whose dispatchers draw ids from `registry`
    #[must_use]
    pub fn with_registry(registry: Arc<WeavingRegistry>) -> Self {
        Self {
            registry,
            slots: DashMap::new(),
        }
    }

    /// Registry shared by this target's dispatchers
    #[inline]
    #[must_use]
    pub fn registry(&self) -> &Arc<WeavingRegistry> {
        &self.registry
    }

    /// Install `operation` under `name`
    ///
    /// Replaces whatever the slot held, including a dispatcher and its advice.
    pub fn define<A, R, F>(&self, name: impl Into<String>, operation: F)
    where
        A: 'static,
        R: 'static,
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        let operation: Operation<A, R> = Arc::new(operation);
        self.slots.insert(name.into(), Slot::Plain(Arc::new(operation)));
    }

    /// Install `operation` under `name` unless the slot exists
    ///
    /// Returns `true` if the operation was installed.
    pub fn define_if_absent<A, R, F>(&self, name: impl Into<String>, operation: F) -> bool
    where
        A: 'static,
        R: 'static,
        F: Fn(&A) -> R + Send + Sync + 'static,
    {
        let mut installed = false;
        self.slots.entry(name.into()).or_insert_with(|| {
            installed = true;
            let operation: Operation<A, R> = Arc::new(operation);
            Slot::Plain(Arc::new(operation))
        });
        installed
    }

    /// Check if a slot named `name` exists
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.slots.contains_key(name)
    }

    /// Check if the slot named `name` carries a dispatcher
    #[must_use]
    pub fn is_woven(&self, name: &str) -> bool {
        self.slots
            .get(name)
            .is_some_and(|slot| matches!(slot.value(), Slot::Woven(_)))
    }

    /// Names of all slots, sorted
    #[must_use]
    pub fn operations(&self) -> Vec<String> {
        let mut names: Vec<String> = self.slots.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    /// Invoke the operation named `name`, through its advice if woven
    ///
    /// # Errors
    /// [`WeaveError::UnknownOperation`] if there is no such slot,
    /// [`WeaveError::SignatureMismatch`] if it is not `Fn(&A) -> R`.
    pub fn invoke<A: 'static, R: 'static>(&self, name: &str, args: &A) -> Result<R> {
        let slot = self
            .slots
            .get(name)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| WeaveError::unknown_operation(name))?;

        match slot {
            Slot::Plain(any) => {
                let operation = any
                    .downcast_ref::<Operation<A, R>>()
                    .ok_or_else(|| WeaveError::signature_mismatch::<A, R>(name))?;
                Ok(operation(args))
            }
            Slot::Woven(any) => {
                let woven = any
                    .downcast_ref::<Interceptable<A, R>>()
                    .ok_or_else(|| WeaveError::signature_mismatch::<A, R>(name))?;
                Ok(woven.invoke(args))
            }
        }
    }

    /// Dispatcher for the operation named `name`, installing it on first use
    ///
    /// # Errors
    /// [`WeaveError::UnknownOperation`] if there is no such slot,
    /// [`WeaveError::SignatureMismatch`] if it is not `Fn(&A) -> R`.
    pub fn interceptable<A: 'static, R: 'static>(&self, name: &str) -> Result<Interceptable<A, R>> {
        let mut entry = self
            .slots
            .get_mut(name)
            .ok_or_else(|| WeaveError::unknown_operation(name))?;

        let original = match entry.value() {
            Slot::Woven(any) => {
                return any
                    .downcast_ref::<Interceptable<A, R>>()
                    .cloned()
                    .ok_or_else(|| WeaveError::signature_mismatch::<A, R>(name));
            }
            Slot::Plain(any) => any
                .downcast_ref::<Operation<A, R>>()
                .cloned()
                .ok_or_else(|| WeaveError::signature_mismatch::<A, R>(name))?,
        };

        let woven = Interceptable::install(Arc::clone(&self.registry), name, original);
        *entry.value_mut() = Slot::Woven(Arc::new(woven.clone()));
        Ok(woven)
    }
}

impl Default for Target {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Target")
            .field("operations", &self.operations())
            .finish_non_exhaustive()
    }
}
