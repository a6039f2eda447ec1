//! Text-format encoding of host values.
//!
//! Values are encoded in a fixed priority order, see [`Shape`]:
//!
//! 1. temporal values,
//! 2. byte blobs,
//! 3. booleans,
//! 4. arrays, with each element encoded by these same rules,
//! 5. text, numbers, characters and UUIDs,
//! 6. anything else, through the custom converter callback.
//!
//! The order is part of the contract. A custom value that exposes a built-in
//! view through [`HostType::as_builtin`](crate::HostType::as_builtin) is
//! encoded by the rule for that view and never reaches its converter.

use bytes::{BufMut, Bytes, BytesMut};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};

use crate::array::encode_array;
use crate::decode::{DATE_FORMAT, TIME_FORMAT, TIMESTAMP_FORMAT};
use crate::error::ConversionError;
use crate::tag::HostValue;
use crate::value::{PgValue, Shape};

/// Encode a value, routing custom values without a built-in view to `custom`.
///
/// Returns `None` for NULL.
pub fn encode_value<F>(value: &PgValue, custom: &F) -> Result<Option<Bytes>, ConversionError>
where
    F: Fn(&dyn HostValue) -> Result<Bytes, ConversionError>,
{
    if let PgValue::Custom(host) = value {
        return match host.as_builtin() {
            Some(builtin) if builtin.shape() != Shape::Custom => encode_value(&builtin, custom),
            _ => custom(host.as_ref()).map(Some),
        };
    }

    let encoded = match value.shape() {
        Shape::Null => return Ok(None),
        Shape::Temporal => encode_temporal(value),
        Shape::Blob => value.as_bytes().map(encode_bytea),
        Shape::Boolean => value.as_bool().map(encode_bool),
        Shape::Array => match value {
            PgValue::Array(items) => Some(encode_array(items, |item| encode_value(item, custom))?),
            _ => None,
        },
        Shape::Scalar => encode_scalar_text(value).map(Bytes::from),
        Shape::Custom => None,
    };
    encoded
        .map(Some)
        .ok_or_else(|| ConversionError::UnknownTarget(value.type_name().to_owned()))
}

fn encode_temporal(value: &PgValue) -> Option<Bytes> {
    match value {
        PgValue::Date(v) => Some(encode_date(*v)),
        PgValue::Time(v) => Some(encode_time(*v)),
        PgValue::Timestamp(v) => Some(encode_timestamp(*v)),
        PgValue::TimestampTz(v) => Some(encode_timestamptz(*v)),
        _ => None,
    }
}

fn encode_scalar_text(value: &PgValue) -> Option<String> {
    let text = match value {
        PgValue::Text(v) => v.clone(),
        PgValue::Char(v) => v.to_string(),
        PgValue::SmallInt(v) => v.to_string(),
        PgValue::Int(v) => v.to_string(),
        PgValue::BigInt(v) => v.to_string(),
        PgValue::BigInteger(v) => v.to_string(),
        PgValue::Real(v) => float_text(f64::from(*v), v.to_string()),
        PgValue::Double(v) => float_text(*v, v.to_string()),
        PgValue::Numeric(v) => v.to_string(),
        PgValue::Uuid(v) => v.hyphenated().to_string(),
        _ => return None,
    };
    Some(text)
}

// Rust prints `inf` and `NaN`; the server spells them out.
fn float_text(value: f64, finite: String) -> String {
    if value.is_nan() {
        "NaN".to_owned()
    } else if value == f64::INFINITY {
        "Infinity".to_owned()
    } else if value == f64::NEG_INFINITY {
        "-Infinity".to_owned()
    } else {
        finite
    }
}

/// Encode a boolean as `t` or `f`.
#[must_use]
pub fn encode_bool(value: bool) -> Bytes {
    Bytes::from_static(if value { b"t" } else { b"f" })
}

/// Encode binary data in the `bytea` hex format.
#[must_use]
pub fn encode_bytea(value: &[u8]) -> Bytes {
    let mut buf = BytesMut::with_capacity(2 + value.len() * 2);
    buf.put_slice(b"\\x");
    buf.put_slice(hex::encode(value).as_bytes());
    buf.freeze()
}

/// Encode a `date`.
#[must_use]
pub fn encode_date(value: NaiveDate) -> Bytes {
    Bytes::from(value.format(DATE_FORMAT).to_string())
}

/// Encode a `time`. Fractional seconds are written only when present.
#[must_use]
pub fn encode_time(value: NaiveTime) -> Bytes {
    Bytes::from(value.format(TIME_FORMAT).to_string())
}

/// Encode a `timestamp`.
#[must_use]
pub fn encode_timestamp(value: NaiveDateTime) -> Bytes {
    Bytes::from(value.format(TIMESTAMP_FORMAT).to_string())
}

/// Encode a `timestamptz`, keeping the value's own offset.
#[must_use]
pub fn encode_timestamptz(value: DateTime<FixedOffset>) -> Bytes {
    Bytes::from(value.format("%Y-%m-%d %H:%M:%S%.f%:z").to_string())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use rust_decimal::Decimal;

    use super::*;
    use crate::tag::{HostType, TypeTag};

    fn no_custom(value: &dyn HostValue) -> Result<Bytes, ConversionError> {
        Err(ConversionError::UnknownTarget(value.type_tag().to_string()))
    }

    fn encode(value: &PgValue) -> Option<Bytes> {
        encode_value(value, &no_custom).unwrap()
    }

    #[test]
    fn test_encode_null() {
        assert_eq!(encode(&PgValue::Null), None);
    }

    #[test]
    fn test_encode_scalars() {
        assert_eq!(encode(&PgValue::Int(42)).unwrap(), "42");
        assert_eq!(encode(&PgValue::BigInt(i64::MIN)).unwrap(), "-9223372036854775808");
        assert_eq!(encode(&PgValue::Char('x')).unwrap(), "x");
        assert_eq!(encode(&PgValue::Text("hello".into())).unwrap(), "hello");
        assert_eq!(
            encode(&PgValue::from(Decimal::from_str("-12.500").unwrap())).unwrap(),
            "-12.500"
        );
    }

    #[test]
    fn test_encode_float_specials() {
        assert_eq!(encode(&PgValue::Double(f64::NAN)).unwrap(), "NaN");
        assert_eq!(encode(&PgValue::Real(f32::INFINITY)).unwrap(), "Infinity");
        assert_eq!(encode(&PgValue::Double(f64::NEG_INFINITY)).unwrap(), "-Infinity");
        assert_eq!(encode(&PgValue::Double(0.1)).unwrap(), "0.1");
    }

    #[test]
    fn test_encode_bool_and_bytes() {
        assert_eq!(encode(&PgValue::Bool(true)).unwrap(), "t");
        assert_eq!(encode(&PgValue::Bool(false)).unwrap(), "f");
        assert_eq!(
            encode(&PgValue::Bytes(Bytes::from_static(&[0xde, 0xad]))).unwrap(),
            "\\xdead"
        );
    }

    #[test]
    fn test_encode_temporal() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        let ts = date.and_hms_micro_opt(10, 30, 0, 250_000).unwrap();
        assert_eq!(encode(&PgValue::Date(date)).unwrap(), "2024-01-15");
        assert_eq!(encode(&PgValue::Timestamp(ts)).unwrap(), "2024-01-15 10:30:00.250");
        let tz = FixedOffset::east_opt(-5 * 3600).unwrap();
        assert_eq!(
            encode(&PgValue::TimestampTz(ts.and_local_timezone(tz).unwrap())).unwrap(),
            "2024-01-15 10:30:00.250-05:00"
        );
    }

    #[test]
    fn test_encode_array_recurses() {
        let value = PgValue::Array(vec![PgValue::Int(1), PgValue::Null, PgValue::Bool(true)]);
        assert_eq!(encode(&value).unwrap(), "{1,NULL,t}");
    }

    #[derive(Debug, PartialEq)]
    struct Opaque;

    impl HostType for Opaque {
        const TAG: TypeTag = TypeTag::new("Opaque");
    }

    #[test]
    fn test_encode_custom_uses_callback() {
        let value = PgValue::custom(Opaque);
        assert!(matches!(
            encode_value(&value, &no_custom),
            Err(ConversionError::UnknownTarget(name)) if name == "Opaque"
        ));
        let fixed = |_: &dyn HostValue| Ok(Bytes::from_static(b"opaque"));
        assert_eq!(encode_value(&value, &fixed).unwrap().unwrap(), "opaque");
    }
}
