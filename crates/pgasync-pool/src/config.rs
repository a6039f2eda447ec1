//! Pool configuration.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use pgasync_types::{Converter, ValueCodec};

use crate::error::PoolError;
use crate::validator::ConnectionValidator;

/// Configuration shared by every connection of a pool.
///
/// This struct is marked `#[non_exhaustive]` to allow adding new fields
/// in future minor versions without breaking changes. Use the builder
/// pattern methods or [`Default::default()`] to construct instances.
#[derive(Clone, Default)]
#[non_exhaustive]
pub struct PoolConfig {
    /// Query run to validate a connection before it is handed out.
    ///
    /// `None` (the default) disables validation. The query should be
    /// lightweight; any rows it returns are ignored.
    ///
    /// # Examples
    ///
    /// - `SELECT 1` - Simple ping
    /// - `SELECT pg_is_in_recovery()` - Check the server answers functions
    pub validation_query: Option<Arc<str>>,

    /// Upper bound on how long the validation query may run.
    pub validation_timeout: Option<Duration>,

    /// Custom type converters, in registration order.
    pub converters: Vec<Arc<dyn Converter>>,
}

impl PoolConfig {
    /// Create a new pool configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation query.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgasync_pool::PoolConfig;
    ///
    /// // No validation (default)
    /// let config = PoolConfig::new();
    /// assert!(config.validation_query.is_none());
    ///
    /// let config = PoolConfig::new().validation_query("SELECT 1");
    /// assert_eq!(config.validation_query.as_deref(), Some("SELECT 1"));
    /// ```
    #[must_use]
    pub fn validation_query(mut self, query: impl Into<Arc<str>>) -> Self {
        self.validation_query = Some(query.into());
        self
    }

    /// Set the validation timeout.
    #[must_use]
    pub fn validation_timeout(mut self, timeout: Duration) -> Self {
        self.validation_timeout = Some(timeout);
        self
    }

    /// Register a custom type converter.
    ///
    /// Registration order matters: when several converters could serve a
    /// type, the earliest one wins.
    #[must_use]
    pub fn converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Register a shared custom type converter.
    #[must_use]
    pub fn converter_arc(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), PoolError> {
        if self
            .validation_query
            .as_deref()
            .is_some_and(|query| query.trim().is_empty())
        {
            return Err(PoolError::Configuration(
                "validation_query must not be empty".into(),
            ));
        }
        if self.validation_timeout == Some(Duration::ZERO) {
            return Err(PoolError::Configuration(
                "validation_timeout must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Build the value codec shared by the pool's connections.
    #[must_use]
    pub fn build_codec(&self) -> Arc<ValueCodec> {
        Arc::new(ValueCodec::with_converters(self.converters.iter().cloned()))
    }

    /// Build the connection validator.
    pub fn build_validator(&self) -> Result<ConnectionValidator, PoolError> {
        self.validate()?;
        let validator = ConnectionValidator::new(self.validation_query.clone());
        Ok(match self.validation_timeout {
            Some(timeout) => validator.timeout(timeout),
            None => validator,
        })
    }
}

impl fmt::Debug for PoolConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let converters: Vec<_> = self.converters.iter().map(|c| c.type_tag()).collect();
        f.debug_struct("PoolConfig")
            .field("validation_query", &self.validation_query)
            .field("validation_timeout", &self.validation_timeout)
            .field("converters", &converters)
            .finish()
    }
}
