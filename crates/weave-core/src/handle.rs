//! Removal handles
//!
//! Every registration returns an [`AdviceHandle`]. Its only operation is
//! [`remove`](AdviceHandle::remove), which unlinks `before`/`after` advice
//! or cancels an `around` layer. Removal is idempotent and takes effect for
//! the next dispatch.

use crate::node::AdviceKind;
use crate::registry::AdviceId;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Undo one registration; `true` if this call did the work
pub(crate) trait Detach: Send + Sync {
    fn detach(&self) -> bool;
}

struct Registration {
    id: AdviceId,
    kind: AdviceKind,
    removed: AtomicBool,
    detach: Box<dyn Detach>,
}

enum HandleInner {
    Single(Registration),
    Group(Vec<AdviceHandle>),
}

/// Token for one registration, or a group of them
///
/// Dropping a handle does not remove the advice. Clones share state.
#[derive(Clone)]
pub struct AdviceHandle {
    inner: Arc<HandleInner>,
}

impl AdviceHandle {
    pub(crate) fn single(id: AdviceId, kind: AdviceKind, detach: impl Detach + 'static) -> Self {
        Self {
            inner: Arc::new(HandleInner::Single(Registration {
                id,
                kind,
                removed: AtomicBool::new(false),
                detach: Box::new(detach),
            })),
        }
    }

    /// Combine several handles into one that removes them all
    #[must_use]
    pub fn group(handles: impl IntoIterator<Item = AdviceHandle>) -> Self {
        Self {
            inner: Arc::new(HandleInner::Group(handles.into_iter().collect())),
        }
    }

    /// Detach the advice; further calls have no effect
    pub fn remove(&self) {
        match &*self.inner {
            HandleInner::Single(registration) => {
                if !registration.removed.swap(true, Ordering::AcqRel) {
                    registration.detach.detach();
                }
            }
            HandleInner::Group(handles) => handles.iter().for_each(Self::remove),
        }
    }

    /// Whether [`remove`](Self::remove) has been called (for a group: on
    /// every member)
    #[must_use]
    pub fn is_removed(&self) -> bool {
        match &*self.inner {
            HandleInner::Single(registration) => registration.removed.load(Ordering::Acquire),
            HandleInner::Group(handles) => handles.iter().all(Self::is_removed),
        }
    }

    /// Advice id, for a single registration
    #[must_use]
    pub fn id(&self) -> Option<AdviceId> {
        match &*self.inner {
            HandleInner::Single(registration) => Some(registration.id),
            HandleInner::Group(_) => None,
        }
    }

    /// Advice kind, for a single registration
    #[must_use]
    pub fn kind(&self) -> Option<AdviceKind> {
        match &*self.inner {
            HandleInner::Single(registration) => Some(registration.kind),
            HandleInner::Group(_) => None,
        }
    }

    /// Number of registrations behind this handle
    #[must_use]
    pub fn len(&self) -> usize {
        match &*self.inner {
            HandleInner::Single(_) => 1,
            HandleInner::Group(handles) => handles.iter().map(Self::len).sum(),
        }
    }

    /// Check if this is an empty group
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for AdviceHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &*self.inner {
            HandleInner::Single(registration) => f
                .debug_struct("AdviceHandle")
                .field("id", &registration.id)
                .field("kind", &registration.kind)
                .field("removed", &registration.removed.load(Ordering::Acquire))
                .finish(),
            HandleInner::Group(handles) => {
                f.debug_tuple("AdviceHandle::Group").field(handles).finish()
            }
        }
    }
}
