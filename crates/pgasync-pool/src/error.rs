//! Pool error types.

use std::error::Error as StdError;
use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during pool operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum PoolError {
    /// The validation query failed on the connection.
    #[error("connection validation failed: {0}")]
    ValidationFailed(#[source] Box<dyn StdError + Send + Sync>),

    /// The validation query did not finish in time.
    #[error("connection validation timed out after {0:?}")]
    ValidationTimeout(Duration),

    /// Pool configuration error.
    #[error("pool configuration error: {0}")]
    Configuration(String),
}

impl PoolError {
    /// Wrap a probe failure.
    pub fn validation_failed(source: impl StdError + Send + Sync + 'static) -> Self {
        Self::ValidationFailed(Box::new(source))
    }
}
