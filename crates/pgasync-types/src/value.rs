//! Host value representation.

use std::sync::Arc;

use bigdecimal::BigDecimal;
use bigdecimal::num_bigint::BigInt;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::oid::Oid;
use crate::tag::{HostType, HostValue, TypeTag};

/// A value that can be sent to or received from PostgreSQL.
///
/// Each built-in host shape is its own variant. Values of user types travel
/// as [`PgValue::Custom`] and are encoded through the converter registry.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PgValue {
    /// NULL value.
    #[default]
    Null,
    /// Boolean value (`bool`).
    Bool(bool),
    /// Single character (`char`).
    Char(char),
    /// 16-bit signed integer (`int2`).
    SmallInt(i16),
    /// 32-bit signed integer (`int4`).
    Int(i32),
    /// 64-bit signed integer (`int8`).
    BigInt(i64),
    /// 128-bit signed integer, sent as `numeric`.
    BigInteger(i128),
    /// 32-bit floating point (`float4`).
    Real(f32),
    /// 64-bit floating point (`float8`).
    Double(f64),
    /// Arbitrary precision decimal (`numeric`, and the default for finite
    /// floats).
    Numeric(BigDecimal),
    /// Text value (`text`, `varchar`, `bpchar`).
    Text(String),
    /// Binary value (`bytea`).
    Bytes(Bytes),
    /// UUID value (`uuid`).
    Uuid(Uuid),
    /// Date value (`date`).
    Date(NaiveDate),
    /// Time value (`time`, and `timetz` normalised to UTC).
    Time(NaiveTime),
    /// Timestamp without time zone (`timestamp`).
    Timestamp(NaiveDateTime),
    /// Timestamp with time zone (`timestamptz`).
    TimestampTz(DateTime<FixedOffset>),
    /// Single-level array of values.
    Array(Vec<PgValue>),
    /// Value of a user type handled by a custom converter.
    Custom(Arc<dyn HostValue>),
}

/// The encoder's classification of a value, in dispatch priority order.
///
/// A value is encoded by the rule of the first shape it matches. A custom
/// value that offers a built-in view (see [`HostType::as_builtin`]) takes the
/// shape of that view, so it never reaches [`Shape::Custom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Shape {
    /// NULL, encoded as "no bytes".
    Null,
    /// Date, time and timestamp values.
    Temporal,
    /// Byte blobs.
    Blob,
    /// Booleans.
    Boolean,
    /// Arrays.
    Array,
    /// Text, numbers, characters and UUIDs.
    Scalar,
    /// Anything else; handled by the converter registry.
    Custom,
}

impl PgValue {
    /// Wrap a user value.
    pub fn custom<T: HostType>(value: T) -> Self {
        Self::Custom(Arc::new(value))
    }

    /// Check if the value is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The encoder shape of this value.
    #[must_use]
    pub fn shape(&self) -> Shape {
        match self {
            Self::Null => Shape::Null,
            Self::Date(_) | Self::Time(_) | Self::Timestamp(_) | Self::TimestampTz(_) => {
                Shape::Temporal
            }
            Self::Bytes(_) => Shape::Blob,
            Self::Bool(_) => Shape::Boolean,
            Self::Array(_) => Shape::Array,
            Self::Char(_)
            | Self::SmallInt(_)
            | Self::Int(_)
            | Self::BigInt(_)
            | Self::BigInteger(_)
            | Self::Real(_)
            | Self::Double(_)
            | Self::Numeric(_)
            | Self::Text(_)
            | Self::Uuid(_) => Shape::Scalar,
            Self::Custom(value) => match value.as_builtin() {
                Some(builtin) if !matches!(builtin, Self::Custom(_)) => builtin.shape(),
                _ => Shape::Custom,
            },
        }
    }

    /// Get the value as a bool, if it is one.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the value as an i32, if it fits.
    #[must_use]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::Int(v) => Some(*v),
            Self::SmallInt(v) => Some(i32::from(*v)),
            _ => None,
        }
    }

    /// Get the value as an i64, if it fits.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::BigInt(v) => Some(*v),
            Self::Int(v) => Some(i64::from(*v)),
            Self::SmallInt(v) => Some(i64::from(*v)),
            Self::BigInteger(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Get the value as a decimal, if it is an exact number.
    #[must_use]
    pub fn as_big_decimal(&self) -> Option<BigDecimal> {
        match self {
            Self::Numeric(v) => Some(v.clone()),
            Self::SmallInt(v) => Some(BigDecimal::from(*v)),
            Self::Int(v) => Some(BigDecimal::from(*v)),
            Self::BigInt(v) => Some(BigDecimal::from(*v)),
            Self::BigInteger(v) => Some(BigDecimal::new(BigInt::from(*v), 0)),
            _ => None,
        }
    }

    /// Get the value as a string slice, if it is text.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Get the value as bytes, if it is binary.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    /// Get the elements, if the value is an array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[PgValue]> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    /// Downcast a custom value to its concrete type.
    #[must_use]
    pub fn as_custom<T: HostType>(&self) -> Option<&T> {
        match self {
            Self::Custom(v) => v.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// The host type tag of this value.
    ///
    /// `Null` has no type and reports [`None`].
    #[must_use]
    pub fn type_tag(&self) -> Option<TypeTag> {
        let tag = match self {
            Self::Null => return None,
            Self::Bool(_) => TypeTag::BOOL,
            Self::Char(_) => TypeTag::CHAR,
            Self::SmallInt(_) => TypeTag::I16,
            Self::Int(_) => TypeTag::I32,
            Self::BigInt(_) => TypeTag::I64,
            Self::BigInteger(_) => TypeTag::I128,
            Self::Real(_) => TypeTag::F32,
            Self::Double(_) => TypeTag::F64,
            Self::Numeric(_) => TypeTag::BIG_DECIMAL,
            Self::Text(_) => TypeTag::STRING,
            Self::Bytes(_) => TypeTag::BYTES,
            Self::Uuid(_) => TypeTag::UUID,
            Self::Date(_) => TypeTag::DATE,
            Self::Time(_) => TypeTag::TIME,
            Self::Timestamp(_) => TypeTag::TIMESTAMP,
            Self::TimestampTz(_) => TypeTag::TIMESTAMPTZ,
            Self::Array(_) => TypeTag::ARRAY,
            Self::Custom(v) => v.type_tag(),
        };
        Some(tag)
    }

    /// The OID this value binds as when sent as a parameter.
    ///
    /// Values without a natural OID (`Null`, custom values, empty arrays)
    /// report OID 0, which lets the server infer the type.
    #[must_use]
    pub fn oid(&self) -> Oid {
        match self {
            Self::Null | Self::Custom(_) => Oid::Other(0),
            Self::Bool(_) => Oid::Bool,
            Self::Char(_) => Oid::Bpchar,
            Self::SmallInt(_) => Oid::Int2,
            Self::Int(_) => Oid::Int4,
            Self::BigInt(_) => Oid::Int8,
            Self::BigInteger(_) | Self::Numeric(_) => Oid::Numeric,
            Self::Real(_) => Oid::Float4,
            Self::Double(_) => Oid::Float8,
            Self::Text(_) => Oid::Text,
            Self::Bytes(_) => Oid::Bytea,
            Self::Uuid(_) => Oid::Uuid,
            Self::Date(_) => Oid::Date,
            Self::Time(_) => Oid::Time,
            Self::Timestamp(_) => Oid::Timestamp,
            Self::TimestampTz(_) => Oid::Timestamptz,
            Self::Array(items) => items
                .iter()
                .find(|item| !item.is_null())
                .and_then(|item| item.oid().array())
                .unwrap_or(Oid::Other(0)),
        }
    }

    /// Get the type name as a string.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_tag().map_or("NULL", |tag| tag.name())
    }
}

impl From<bool> for PgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<char> for PgValue {
    fn from(v: char) -> Self {
        Self::Char(v)
    }
}

impl From<i16> for PgValue {
    fn from(v: i16) -> Self {
        Self::SmallInt(v)
    }
}

impl From<i32> for PgValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<i64> for PgValue {
    fn from(v: i64) -> Self {
        Self::BigInt(v)
    }
}

impl From<i128> for PgValue {
    fn from(v: i128) -> Self {
        Self::BigInteger(v)
    }
}

impl From<f32> for PgValue {
    fn from(v: f32) -> Self {
        Self::Real(v)
    }
}

impl From<f64> for PgValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<Decimal> for PgValue {
    fn from(v: Decimal) -> Self {
        Self::Numeric(BigDecimal::new(BigInt::from(v.mantissa()), i64::from(v.scale())))
    }
}

impl From<BigDecimal> for PgValue {
    fn from(v: BigDecimal) -> Self {
        Self::Numeric(v)
    }
}

impl From<String> for PgValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<&str> for PgValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<Bytes> for PgValue {
    fn from(v: Bytes) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<u8>> for PgValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(Bytes::from(v))
    }
}

impl From<Uuid> for PgValue {
    fn from(v: Uuid) -> Self {
        Self::Uuid(v)
    }
}

impl From<NaiveDate> for PgValue {
    fn from(v: NaiveDate) -> Self {
        Self::Date(v)
    }
}

impl From<NaiveTime> for PgValue {
    fn from(v: NaiveTime) -> Self {
        Self::Time(v)
    }
}

impl From<NaiveDateTime> for PgValue {
    fn from(v: NaiveDateTime) -> Self {
        Self::Timestamp(v)
    }
}

impl From<DateTime<FixedOffset>> for PgValue {
    fn from(v: DateTime<FixedOffset>) -> Self {
        Self::TimestampTz(v)
    }
}

impl<T> From<Option<T>> for PgValue
where
    T: Into<PgValue>,
{
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}
