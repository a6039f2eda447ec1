//! # pgasync-types
//!
//! PostgreSQL to Rust value codec.
//!
//! This crate provides bidirectional mapping between PostgreSQL column values
//! in the text wire format and Rust host values. Built-in types are handled by
//! fixed rules; any other type can be plugged in through custom
//! [`Converter`]s, which are resolved by [`TypeTag`] with a lock-free cache.
//!
//! ## Type Mappings
//!
//! | PostgreSQL Type | Rust Type |
//! |-----------------|-----------|
//! | `bool` | `bool` |
//! | `int2` | `i16` |
//! | `int4` | `i32` |
//! | `int8` | `i64` |
//! | `float4` | `f32`, `bigdecimal::BigDecimal` |
//! | `float8` | `f64`, `bigdecimal::BigDecimal` |
//! | `numeric` | `bigdecimal::BigDecimal`, `rust_decimal::Decimal`, `i128` |
//! | `text`/`varchar`/`bpchar`/`char` | `String`, `char` |
//! | `bytea` | `bytes::Bytes` |
//! | `date` | `chrono::NaiveDate` |
//! | `time`/`timetz` | `chrono::NaiveTime` |
//! | `timestamp` | `chrono::NaiveDateTime` |
//! | `timestamptz` | `chrono::DateTime<FixedOffset>` |
//! | `uuid` | `uuid::Uuid` |
//! | `_int4`, `_text`, ... | `Vec<T>` |
//!
//! Without a target type, finite `float4`, `float8` and `numeric` values
//! decode to `BigDecimal`; `NaN` and the infinities decode to `f64`.
//!
//! ## Custom Types
//!
//! ```
//! use std::net::IpAddr;
//!
//! use bytes::Bytes;
//! use pgasync_types::{ConversionError, HostType, Oid, PgValue, TypeConverter, TypeTag, ValueCodec};
//!
//! #[derive(Debug, PartialEq)]
//! struct Inet(IpAddr);
//!
//! impl HostType for Inet {
//!     const TAG: TypeTag = TypeTag::new("inet");
//! }
//!
//! struct InetConverter;
//!
//! impl TypeConverter for InetConverter {
//!     type Target = Inet;
//!
//!     fn to_wire(&self, value: &Inet) -> Result<Bytes, ConversionError> {
//!         Ok(Bytes::from(value.0.to_string()))
//!     }
//!
//!     fn from_wire(&self, oid: Oid, raw: &[u8]) -> Result<Inet, ConversionError> {
//!         std::str::from_utf8(raw)
//!             .ok()
//!             .and_then(|s| s.parse().ok())
//!             .map(Inet)
//!             .ok_or_else(|| ConversionError::malformed(oid, "invalid address"))
//!     }
//! }
//!
//! let codec = ValueCodec::builder().converter(InetConverter).build();
//! let addr = codec.decode_custom::<Inet>(Oid::Text, Some(b"127.0.0.1")).unwrap();
//! assert_eq!(addr, Some(Inet("127.0.0.1".parse().unwrap())));
//!
//! let encoded = codec.encode(&PgValue::custom(Inet("::1".parse().unwrap()))).unwrap();
//! assert_eq!(encoded.unwrap(), "::1");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod array;
pub mod codec;
pub mod decode;
pub mod encode;
pub mod error;
pub mod from_sql;
pub mod oid;
pub mod registry;
pub mod tag;
pub mod to_sql;
pub mod value;

pub use codec::{ValueCodec, ValueCodecBuilder};
pub use error::ConversionError;
pub use from_sql::FromSql;
pub use oid::Oid;
pub use registry::{Converter, ConverterRegistry, TypeConverter};
pub use tag::{HostType, HostValue, TypeTag};
pub use to_sql::ToSql;
pub use value::{PgValue, Shape};
