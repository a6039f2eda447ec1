//! # pgasync-pool
//!
//! Pool-side plumbing for pgasync connections.
//!
//! This crate holds what a connection pool needs besides the connections
//! themselves: the validation step run before a connection is handed out,
//! and the configuration that builds the value codec shared by every
//! connection.
//!
//! ## Features
//!
//! - Optional validation query, with an optional timeout
//! - Custom type converters registered once per pool
//!
//! ## Example
//!
//! ```rust,ignore
//! use pgasync_pool::PoolConfig;
//!
//! let config = PoolConfig::new()
//!     .validation_query("SELECT 1")
//!     .converter(InetConverter);
//!
//! let codec = config.build_codec();
//! let validator = config.build_validator()?;
//! let conn = validator.validate(conn).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod validator;

pub use config::PoolConfig;
pub use error::PoolError;
pub use validator::{ConnectionValidator, ProbeConnection};
