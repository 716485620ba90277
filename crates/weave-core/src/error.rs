//! Error types for the weaving engine
//!
//! Dispatch itself has no error type: advice failures surface to the caller
//! of the woven operation exactly as the advice raised them. [`WeaveError`]
//! only covers the host-object layer:
//! - Operation lookup on a [`Target`](crate::Target)
//! - Argument/result type mismatches on a named slot
//! - Configuration parsing

/// Errors from target lookup and configuration
#[derive(Debug, thiserror::Error)]
pub enum WeaveError {
    /// No operation slot with this name
    #[error("unknown operation: '{operation}'")]
    UnknownOperation {
        /// Requested operation name
        operation: String,
    },

    /// Slot exists but carries a different signature
    #[error("operation '{operation}' does not have signature {expected}")]
    SignatureMismatch {
        /// Requested operation name
        operation: String,
        /// Signature the caller asked for
        expected: &'static str,
    },

    /// Configuration text could not be parsed
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl WeaveError {
    /// Create unknown operation error
    pub fn unknown_operation(operation: impl Into<String>) -> Self {
        Self::UnknownOperation {
            operation: operation.into(),
        }
    }

    /// Create signature mismatch error for `Fn(&A) -> R`
    pub fn signature_mismatch<A, R>(operation: impl Into<String>) -> Self {
        Self::SignatureMismatch {
            operation: operation.into(),
            expected: std::any::type_name::<fn(&A) -> R>(),
        }
    }

    /// Check if error came from resolving an operation slot
    #[inline]
    #[must_use]
    pub fn is_lookup_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownOperation { .. } | Self::SignatureMismatch { .. }
        )
    }
}

/// Result alias for weaving operations
pub type Result<T> = std::result::Result<T, WeaveError>;
