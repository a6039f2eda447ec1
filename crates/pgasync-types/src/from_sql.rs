//! Trait for converting wire payloads to Rust types.

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::array::decode_array_with;
use crate::decode;
use crate::error::ConversionError;
use crate::oid::Oid;
use crate::value::PgValue;

/// Trait for types that can be decoded from a column value.
///
/// This trait is implemented for common Rust types to enable type-safe
/// extraction of values from query results. Implementations decide which
/// OIDs they accept; reading `int4` into `String`, say, is a
/// [`ConversionError::TypeMismatch`].
pub trait FromSql: Sized {
    /// Decode a non-null payload of type `oid`.
    fn from_sql(oid: Oid, raw: &[u8]) -> Result<Self, ConversionError>;

    /// Produce a value for NULL.
    ///
    /// Fails with [`ConversionError::UnexpectedNull`] unless the type can
    /// represent NULL.
    fn from_null(oid: Oid) -> Result<Self, ConversionError> {
        let _ = oid;
        Err(ConversionError::UnexpectedNull)
    }

    /// Decode a payload that may be NULL.
    fn from_sql_nullable(oid: Oid, raw: Option<&[u8]>) -> Result<Self, ConversionError> {
        match raw {
            Some(raw) => Self::from_sql(oid, raw),
            None => Self::from_null(oid),
        }
    }
}

macro_rules! from_sql_via {
    ($($ty:ty => $decode:path,)+) => {
        $(
            impl FromSql for $ty {
                fn from_sql(oid: Oid, raw: &[u8]) -> Result<Self, ConversionError> {
                    $decode(oid, raw)
                }
            }
        )+
    };
}

from_sql_via! {
    String => decode::decode_text,
    char => decode::decode_char,
    i16 => decode::decode_i16,
    i32 => decode::decode_i32,
    i64 => decode::decode_i64,
    i128 => decode::decode_i128,
    f32 => decode::decode_f32,
    f64 => decode::decode_f64,
    Decimal => decode::decode_decimal,
    BigDecimal => decode::decode_big_decimal,
    bool => decode::decode_bool,
    Bytes => decode::decode_bytea,
    Uuid => decode::decode_uuid,
    NaiveDate => decode::decode_date,
    NaiveTime => decode::decode_time,
    NaiveDateTime => decode::decode_timestamp,
    DateTime<FixedOffset> => decode::decode_timestamptz,
}

impl FromSql for DateTime<Utc> {
    fn from_sql(oid: Oid, raw: &[u8]) -> Result<Self, ConversionError> {
        decode::decode_timestamptz(oid, raw).map(|dt| dt.with_timezone(&Utc))
    }
}

impl FromSql for PgValue {
    fn from_sql(oid: Oid, raw: &[u8]) -> Result<Self, ConversionError> {
        match oid.element() {
            Some(element) => crate::array::decode_array(element, raw).map(PgValue::Array),
            None => decode::decode_scalar(oid, raw),
        }
    }

    fn from_null(_oid: Oid) -> Result<Self, ConversionError> {
        Ok(PgValue::Null)
    }
}

impl<T: FromSql> FromSql for Option<T> {
    fn from_sql(oid: Oid, raw: &[u8]) -> Result<Self, ConversionError> {
        T::from_sql(oid, raw).map(Some)
    }

    fn from_null(_oid: Oid) -> Result<Self, ConversionError> {
        Ok(None)
    }
}

impl<T: FromSql> FromSql for Vec<T> {
    fn from_sql(oid: Oid, raw: &[u8]) -> Result<Self, ConversionError> {
        let element = oid.element().ok_or_else(|| ConversionError::TypeMismatch {
            expected: "array",
            actual: oid.to_string(),
        })?;
        decode_array_with(element, raw, T::from_sql_nullable)
    }
}
