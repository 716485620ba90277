//! Engine configuration
//!
//! [`WeaveConfig`] is owned by a [`WeavingRegistry`](crate::WeavingRegistry)
//! and read by every dispatcher created from it.

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Weaving engine configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaveConfig {
    /// Emit `trace` events for every dispatch phase
    pub trace_dispatch: bool,
    /// Emit `debug` events on install, registration and removal
    pub trace_registration: bool,
}

impl WeaveConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With per-dispatch tracing
    #[inline]
    #[must_use]
    pub fn with_trace_dispatch(mut self, enabled: bool) -> Self {
        self.trace_dispatch = enabled;
        self
    }

    /// With registration tracing
    #[inline]
    #[must_use]
    pub fn with_trace_registration(mut self, enabled: bool) -> Self {
        self.trace_registration = enabled;
        self
    }

    /// Parse configuration from JSON; missing fields take their defaults
    ///
    /// # Errors
    /// Returns [`WeaveError::InvalidConfig`](crate::WeaveError::InvalidConfig)
    /// when the text is not a valid configuration object.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

impl Default for WeaveConfig {
    fn default() -> Self {
        Self {
            trace_dispatch: false,
            trace_registration: true,
        }
    }
}
