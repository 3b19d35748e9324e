//! Error types for stream pipelines.
//!
//! Every fallible operation in the crate reports a [`StreamError`]. Argument
//! validation (negative counts, bad option names) is detected when the
//! operation is chained; element-level failures (summing a string, flat-mapping
//! a scalar) surface when the offending element is actually pulled, which for a
//! lazy pipeline means inside the terminal operation.

use thiserror::Error;

/// Errors raised by [`Stream`](crate::Stream) operations and their helpers.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An operation was attempted on a stream that was already consumed by a
    /// terminal operation or closed explicitly.
    #[error("stream already consumed or closed (attempted `{operation}`)")]
    IllegalState { operation: &'static str },

    /// An empty value container was unwrapped without a fallback.
    #[error("no value present")]
    ValueAbsent,

    /// An argument was rejected before any element was processed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An element did not have the shape an operation needs.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A dict was built from elements with a colliding key and no merge function.
    #[error("duplicate key '{key}'")]
    DuplicateKey { key: String },

    /// Checked integer arithmetic overflowed.
    #[error("arithmetic overflow in `{operation}`")]
    Overflow { operation: &'static str },

    /// A function delegated to through the adapter registry failed.
    #[error("delegated function `{function}` failed")]
    External {
        function: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl StreamError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub(crate) fn mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    pub(crate) fn duplicate(key: &impl std::fmt::Debug) -> Self {
        Self::DuplicateKey { key: format!("{key:?}") }
    }

    pub(crate) fn external(function: &str, err: anyhow::Error) -> Self {
        Self::External {
            function: function.to_string(),
            source: err.into(),
        }
    }
}

/// Result type for stream operations.
pub type Result<T> = std::result::Result<T, StreamError>;
