//! Advice identity counter
//!
//! Provides [`WeavingRegistry`], the owner of the monotonic id counter shared
//! by every dispatcher created from it, and [`AdviceId`].

use crate::config::WeaveConfig;
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static GLOBAL: Lazy<Arc<WeavingRegistry>> =
    Lazy::new(|| Arc::new(WeavingRegistry::new(WeaveConfig::default())));

/// Identity of one registered piece of advice
///
/// Ids are only compared against a dispatch watermark; they are never
/// reused and never reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AdviceId(pub u64);

impl std::fmt::Display for AdviceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "advice#{}", self.0)
    }
}

/// Monotonic id source plus engine configuration
///
/// Every dispatcher holds the registry it was created from. A dispatch
/// snapshots [`watermark`](Self::watermark) on entry and ignores `after`
/// advice whose id is not below it.
#[derive(Debug)]
pub struct WeavingRegistry {
    next_id: AtomicU64,
    config: WeaveConfig,
}

impl WeavingRegistry {
    /// Create registry with its own counter
    #[must_use]
    pub fn new(config: WeaveConfig) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            config,
        }
    }

    /// Process-wide registry used by default constructors
    #[must_use]
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL)
    }

    /// Allocate the next advice id
    #[inline]
    pub fn allocate_id(&self) -> AdviceId {
        AdviceId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Id the next registration will receive
    #[inline]
    #[must_use]
    pub fn watermark(&self) -> AdviceId {
        AdviceId(self.next_id.load(Ordering::SeqCst))
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &WeaveConfig {
        &self.config
    }
}

impl Default for WeavingRegistry {
    fn default() -> Self {
        Self::new(WeaveConfig::default())
    }
}
