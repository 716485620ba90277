//! Event emitters built on advice weaving
//!
//! [`Evented`] keeps one `"on" + type` operation per event type on an
//! internal [`Target`]. Listening attaches argument-receiving `after`
//! advice to that operation; emitting invokes it. Listener order, removal
//! and re-entrancy therefore follow the weaving engine:
//! - listeners run in registration order
//! - a listener added while an event is being emitted first hears the next one
//! - removing a listener takes effect for the next emit
//!
//! # Example
//!
//! ```rust
//! use std::sync::{Arc, Mutex};
//! use weave_events::Evented;
//!
//! let events: Evented<String> = Evented::new();
//! let seen = Arc::new(Mutex::new(Vec::new()));
//!
//! let sink = seen.clone();
//! let handle = events.on("open, close", move |msg: &String| sink.lock().unwrap().push(msg.clone()))?;
//!
//! events.emit("open", &"door".to_string())?;
//! handle.remove();
//! events.emit("close", &"door".to_string())?;
//!
//! assert_eq!(*seen.lock().unwrap(), vec!["door".to_string()]);
//! # Ok::<(), weave_core::WeaveError>(())
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

use once_cell::sync::OnceCell;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use weave_core::{facade, AdviceHandle, Result, Target, WeavingRegistry};

/// Operation name carrying listeners for `event`
fn slot_name(event: &str) -> String {
    format!("on{event}")
}

/// Event types in a comma-separated list
fn parse_types(types: &str) -> impl Iterator<Item = &str> {
    types.split(',').map(str::trim).filter(|t| !t.is_empty())
}

/// Emitter of events carrying a payload of type `E`
pub struct Evented<E> {
    target: Target,
    _payload: PhantomData<fn(&E)>,
}

impl<E: 'static> Evented<E> {
    /// Create emitter using the global registry
    #[must_use]
    pub fn new() -> Self {
        Self::with_registry(WeavingRegistry::global())
    }

    /// Create emitter whose listeners draw ids from `registry`
    #[must_use]
    pub fn with_registry(registry: Arc<WeavingRegistry>) -> Self {
        Self {
            target: Target::with_registry(registry),
            _payload: PhantomData,
        }
    }

    /// Target holding the `"on" + type` operations
    #[inline]
    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    /// Listen to one or more comma-separated event types
    ///
    /// Several types yield one grouped handle removing every registration.
    ///
    /// # Errors
    /// Fails if the target already holds an `"on" + type` operation with a
    /// different signature.
    pub fn on<F>(&self, types: &str, listener: F) -> Result<AdviceHandle>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let listener = Arc::new(listener);
        let mut handles = parse_types(types)
            .map(|event| {
                let listener = Arc::clone(&listener);
                self.listen(event, move |payload: &E| listener(payload))
            })
            .collect::<Result<Vec<_>>>()?;

        if handles.len() == 1 {
            return Ok(handles.remove(0));
        }
        Ok(AdviceHandle::group(handles))
    }

    /// Listen to `event` for a single delivery
    ///
    /// # Errors
    /// Same as [`on`](Self::on).
    pub fn once<F>(&self, event: &str, listener: F) -> Result<AdviceHandle>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let registration: Arc<OnceCell<AdviceHandle>> = Arc::new(OnceCell::new());
        let fired = Arc::new(AtomicBool::new(false));

        let (slot, done) = (Arc::clone(&registration), Arc::clone(&fired));
        let handle = self.listen(event, move |payload: &E| {
            if done.swap(true, Ordering::AcqRel) {
                return;
            }
            if let Some(handle) = slot.get() {
                handle.remove();
            }
            listener(payload);
        })?;

        // Fresh cell: the only writer is this line
        registration.set(handle.clone()).ok();
        if fired.load(Ordering::Acquire) {
            handle.remove();
        }
        Ok(handle)
    }

    /// Deliver `payload` to the listeners of `event`
    ///
    /// Returns `false` when nothing ever listened to `event`.
    ///
    /// # Errors
    /// Fails if the `"on" + type` operation has a different signature.
    pub fn emit(&self, event: &str, payload: &E) -> Result<bool> {
        let name = slot_name(event);
        if !self.target.contains(&name) {
            tracing::trace!(event, "emit without listeners");
            return Ok(false);
        }
        self.target.invoke::<E, ()>(&name, payload)?;
        Ok(true)
    }

    /// Number of live listeners on `event`
    ///
    /// # Errors
    /// Same as [`emit`](Self::emit).
    pub fn listener_count(&self, event: &str) -> Result<usize> {
        let name = slot_name(event);
        if !self.target.contains(&name) {
            return Ok(0);
        }
        Ok(self.target.interceptable::<E, ()>(&name)?.advice_count())
    }

    fn listen<F>(&self, event: &str, listener: F) -> Result<AdviceHandle>
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let name = slot_name(event);
        self.target.define_if_absent(name.clone(), |_: &E| ());
        facade::after_with_arguments::<E, (), _>(&self.target, &name, move |payload| {
            listener(payload);
            None
        })
    }
}

impl<E: 'static> Default for Evented<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for Evented<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Evented")
            .field("target", &self.target)
            .finish()
    }
}
