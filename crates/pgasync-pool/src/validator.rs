//! Connection validation before a pooled connection is handed out.
//!
//! A validator owns an optional probe query. Without one, validation is a
//! no-op that returns the connection untouched. With one, the query is run on
//! the connection, its rows are discarded, and the connection comes back only
//! if the query succeeded.

use std::sync::Arc;
use std::time::Duration;

use crate::error::PoolError;

/// A connection that can run a validation query.
///
/// Uses `#[async_trait]` so validators can drive connections behind trait
/// objects.
#[async_trait::async_trait]
pub trait ProbeConnection: Send {
    /// Error produced by the connection.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Run `query`, discard its rows and report how many there were.
    async fn probe(&mut self, query: &str) -> Result<u64, Self::Error>;
}

/// Checks connections with an optional probe query.
#[derive(Debug, Clone, Default)]
pub struct ConnectionValidator {
    query: Option<Arc<str>>,
    timeout: Option<Duration>,
}

impl ConnectionValidator {
    /// Create a validator. `None` disables validation.
    #[must_use]
    pub fn new(query: Option<Arc<str>>) -> Self {
        Self {
            query,
            timeout: None,
        }
    }

    /// Create a validator that runs `query`.
    #[must_use]
    pub fn with_query(query: impl Into<Arc<str>>) -> Self {
        Self::new(Some(query.into()))
    }

    /// Bound how long the probe may run.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The probe query, if validation is enabled.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    /// Check if a probe query is configured.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.query.is_some()
    }

    /// Validate a connection, handing it back on success.
    ///
    /// On failure the connection is dropped and the probe's error is returned
    /// as [`PoolError::ValidationFailed`].
    pub async fn validate<C>(&self, mut conn: C) -> Result<C, PoolError>
    where
        C: ProbeConnection,
    {
        let Some(query) = self.query.as_deref() else {
            return Ok(conn);
        };

        tracing::trace!(query, "validating connection");
        let outcome = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, conn.probe(query))
                .await
                .map_err(|_| PoolError::ValidationTimeout(limit))?,
            None => conn.probe(query).await,
        };

        match outcome {
            Ok(rows) => {
                tracing::trace!(rows, "connection validated");
                Ok(conn)
            }
            Err(e) => {
                tracing::debug!(error = %e, "connection validation failed");
                Err(PoolError::validation_failed(e))
            }
        }
    }
}
