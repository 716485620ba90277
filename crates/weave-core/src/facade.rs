//! Registration entry points for named operations
//!
//! Each function ensures the dispatcher for `(target, operation)` exists,
//! registers the advice, and returns its [`AdviceHandle`].
//!
//! ```rust
//! use weave_core::{facade, Target};
//!
//! let target = Target::new();
//! target.define("greet", |name: &String| format!("Hi {name}"));
//!
//! facade::before::<String, String, _>(&target, "greet", |name| Some(name.to_uppercase()))?;
//! facade::after(&target, "greet", |result: String, _: &String| result + "!")?;
//!
//! let out: String = target.invoke("greet", &"sam".to_string())?;
//! assert_eq!(out, "Hi SAM!");
//! # Ok::<(), weave_core::WeaveError>(())
//! ```

use crate::around::Proceed;
use crate::error::Result;
use crate::handle::AdviceHandle;
use crate::target::Target;

/// Attach `before` advice to `target.operation`
///
/// # Errors
/// Fails if the operation does not exist or is not `Fn(&A) -> R`.
pub fn before<A, R, F>(target: &Target, operation: &str, advice: F) -> Result<AdviceHandle>
where
    A: 'static,
    R: 'static,
    F: Fn(&A) -> Option<A> + Send + Sync + 'static,
{
    Ok(target.interceptable::<A, R>(operation)?.before(advice))
}

/// Attach `around` advice to `target.operation`
///
/// # Errors
/// Fails if the operation does not exist or is not `Fn(&A) -> R`.
pub fn around<A, R, F, G>(target: &Target, operation: &str, advice: F) -> Result<AdviceHandle>
where
    A: 'static,
    R: 'static,
    F: FnOnce(Proceed<A, R>) -> G,
    G: Fn(&A) -> R + Send + Sync + 'static,
{
    Ok(target.interceptable::<A, R>(operation)?.around(advice))
}

/// Attach result-transforming `after` advice to `target.operation`
///
/// # Errors
/// Fails if the operation does not exist or is not `Fn(&A) -> R`.
pub fn after<A, R, F>(target: &Target, operation: &str, advice: F) -> Result<AdviceHandle>
where
    A: 'static,
    R: 'static,
    F: Fn(R, &A) -> R + Send + Sync + 'static,
{
    Ok(target.interceptable::<A, R>(operation)?.after(advice))
}

/// Attach argument-receiving `after` advice to `target.operation`
///
/// # Errors
/// Fails if the operation does not exist or is not `Fn(&A) -> R`.
pub fn after_with_arguments<A, R, F>(
    target: &Target,
    operation: &str,
    advice: F,
) -> Result<AdviceHandle>
where
    A: 'static,
    R: 'static,
    F: Fn(&A) -> Option<R> + Send + Sync + 'static,
{
    Ok(target
        .interceptable::<A, R>(operation)?
        .after_with_arguments(advice))
}
