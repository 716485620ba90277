//! Advice Weaving Engine
//!
//! Attach behavior to a named operation without touching its definition:
//! run code *before* it, *around* it, or *after* it, and detach that
//! behavior again through the returned handle.
//!
//! # Core Concepts
//!
//! - [`Interceptable`]: Typed operation wrapper owning the advice chains
//! - [`Target`]: Object with named operation slots, woven lazily
//! - [`facade`]: `before`/`around`/`after` entry points for a [`Target`]
//! - [`AdviceHandle`]: Idempotent removal token
//! - [`WeavingRegistry`]: Monotonic advice id source and configuration
//!
//! # Ordering
//!
//! - `before` advice runs most recent first and may replace the arguments
//! - `around` advice nests; the most recent registration is outermost
//! - `after` advice runs in registration order and threads the result
//! - `after` advice registered during a dispatch first runs on the next one
//!
//! # Example
//!
//! ```rust
//! use weave_core::Interceptable;
//!
//! let greet = Interceptable::new(|name: &String| format!("Hi {name}"));
//! let handle = greet.around(|proceed| move |name: &String| proceed.call(name) + "?");
//! assert_eq!(greet.invoke(&"sam".to_string()), "Hi sam?");
//!
//! handle.remove();
//! assert_eq!(greet.invoke(&"sam".to_string()), "Hi sam");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod around;
mod chain;
mod config;
mod dispatcher;
mod error;
pub mod facade;
mod handle;
mod interceptable;
mod node;
mod registry;
mod target;

// Re-exports
pub use around::{Operation, Proceed};
pub use config::WeaveConfig;
pub use error::{Result, WeaveError};
pub use facade::{after, after_with_arguments, around, before};
pub use handle::AdviceHandle;
pub use interceptable::Interceptable;
pub use node::AdviceKind;
pub use registry::{AdviceId, WeavingRegistry};
pub use target::Target;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn log() -> Arc<Mutex<Vec<String>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn full_weave_on_target() {
        let target = Target::new();
        target.define("greet", |name: &String| format!("Hi {name}"));

        before::<String, String, _>(&target, "greet", |name| Some(name.to_uppercase())).unwrap();
        after(&target, "greet", |result: String, _: &String| result + "!").unwrap();

        let out: String = target.invoke("greet", &"sam".to_string()).unwrap();
        assert_eq!(out, "Hi SAM!");
    }

    #[test]
    fn phases_run_in_order() {
        let seen = log();
        let op = {
            let seen = seen.clone();
            Interceptable::new(move |_: &()| seen.lock().push("original".into()))
        };

        let s = seen.clone();
        op.before(move |_: &()| {
            s.lock().push("before".into());
            None
        });
        let s = seen.clone();
        op.around(move |proceed| {
            move |args: &()| {
                s.lock().push("around".into());
                proceed.call(args);
            }
        });
        let s = seen.clone();
        op.after_with_arguments(move |_: &()| {
            s.lock().push("after".into());
            None
        });

        op.invoke(&());
        assert_eq!(
            *seen.lock(),
            vec!["before", "around", "original", "after"]
        );
    }

    #[test]
    fn version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
