//! Text-format decoding of scalar values.
//!
//! Every function here takes the payload of one non-null column value. NULL is
//! handled by the caller before a decoder is reached.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ConversionError;
use crate::oid::Oid;
use crate::value::PgValue;

pub(crate) const DATE_FORMAT: &str = "%Y-%m-%d";
pub(crate) const TIME_FORMAT: &str = "%H:%M:%S%.f";
pub(crate) const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f";
const TIMESTAMPTZ_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.f%#z";

/// Decode a scalar payload to its default host value.
///
/// | OID | Value |
/// |-----|-------|
/// | `text`, `varchar`, `bpchar`, `char` | [`PgValue::Text`] |
/// | `int2` / `int4` / `int8` | [`PgValue::SmallInt`] / [`PgValue::Int`] / [`PgValue::BigInt`] |
/// | `float4`, `float8`, `numeric` | [`PgValue::Numeric`], or [`PgValue::Double`] for `NaN` and infinities |
/// | `bool` | [`PgValue::Bool`] |
/// | `bytea` | [`PgValue::Bytes`] |
/// | `date` | [`PgValue::Date`] |
/// | `time`, `timetz` | [`PgValue::Time`] |
/// | `timestamp` | [`PgValue::Timestamp`] |
/// | `timestamptz` | [`PgValue::TimestampTz`] |
/// | `uuid` | [`PgValue::Uuid`] |
///
/// Array OIDs and OIDs outside the catalog fail with
/// [`ConversionError::UnsupportedType`].
pub fn decode_scalar(oid: Oid, raw: &[u8]) -> Result<PgValue, ConversionError> {
    let value = match oid {
        Oid::Text | Oid::Varchar | Oid::Bpchar | Oid::Char => PgValue::Text(decode_text(oid, raw)?),
        Oid::Int2 => PgValue::SmallInt(decode_i16(oid, raw)?),
        Oid::Int4 => PgValue::Int(decode_i32(oid, raw)?),
        Oid::Int8 => PgValue::BigInt(decode_i64(oid, raw)?),
        Oid::Float4 | Oid::Float8 | Oid::Numeric => match non_finite(raw) {
            Some(special) => PgValue::Double(special),
            None => PgValue::Numeric(decode_big_decimal(oid, raw)?),
        },
        Oid::Bool => PgValue::Bool(decode_bool(oid, raw)?),
        Oid::Bytea => PgValue::Bytes(decode_bytea(oid, raw)?),
        Oid::Date => PgValue::Date(decode_date(oid, raw)?),
        Oid::Time | Oid::Timetz => PgValue::Time(decode_time(oid, raw)?),
        Oid::Timestamp => PgValue::Timestamp(decode_timestamp(oid, raw)?),
        Oid::Timestamptz => PgValue::TimestampTz(decode_timestamptz(oid, raw)?),
        Oid::Uuid => PgValue::Uuid(decode_uuid(oid, raw)?),
        other => return Err(ConversionError::UnsupportedType(other)),
    };
    Ok(value)
}

/// Check whether [`decode_scalar`] has a rule for `oid`.
#[must_use]
pub fn is_scalar_decodable(oid: Oid) -> bool {
    oid.is_builtin() && !oid.is_array()
}

/// View the payload as UTF-8 text.
pub fn decode_str(oid: Oid, raw: &[u8]) -> Result<&str, ConversionError> {
    std::str::from_utf8(raw).map_err(|e| ConversionError::malformed(oid, e.to_string()))
}

/// Decode any payload as an owned string.
pub fn decode_text(oid: Oid, raw: &[u8]) -> Result<String, ConversionError> {
    decode_str(oid, raw).map(str::to_owned)
}

/// Decode the first character of a textual payload.
pub fn decode_char(oid: Oid, raw: &[u8]) -> Result<char, ConversionError> {
    expect_oid(oid, "char", oid.is_textual())?;
    decode_str(oid, raw)?
        .chars()
        .next()
        .ok_or_else(|| ConversionError::malformed(oid, "empty character value"))
}

/// Decode an `int2` payload, or a wider integer that fits.
pub fn decode_i16(oid: Oid, raw: &[u8]) -> Result<i16, ConversionError> {
    expect_oid(oid, "i16", is_integer(oid))?;
    parse(oid, raw)
}

/// Decode an `int4` payload, or any integer that fits.
pub fn decode_i32(oid: Oid, raw: &[u8]) -> Result<i32, ConversionError> {
    expect_oid(oid, "i32", is_integer(oid))?;
    parse(oid, raw)
}

/// Decode an `int8` payload, or any integer.
pub fn decode_i64(oid: Oid, raw: &[u8]) -> Result<i64, ConversionError> {
    expect_oid(oid, "i64", is_integer(oid))?;
    parse(oid, raw)
}

/// Decode an integer or integral `numeric` payload.
pub fn decode_i128(oid: Oid, raw: &[u8]) -> Result<i128, ConversionError> {
    expect_oid(oid, "i128", is_integer(oid) || oid == Oid::Numeric)?;
    parse(oid, raw)
}

/// Decode a floating point payload.
///
/// `NaN`, `Infinity` and `-Infinity` are accepted.
pub fn decode_f32(oid: Oid, raw: &[u8]) -> Result<f32, ConversionError> {
    expect_oid(oid, "f32", is_numeric(oid))?;
    parse(oid, raw)
}

/// Decode a floating point payload.
///
/// `NaN`, `Infinity` and `-Infinity` are accepted.
pub fn decode_f64(oid: Oid, raw: &[u8]) -> Result<f64, ConversionError> {
    expect_oid(oid, "f64", is_numeric(oid))?;
    parse(oid, raw)
}

/// Decode a numeric payload as an arbitrary precision decimal.
///
/// Scientific notation (`1.5e-07`, `1e+300`) is accepted. `NaN` and
/// infinities have no decimal representation and are malformed.
pub fn decode_big_decimal(oid: Oid, raw: &[u8]) -> Result<BigDecimal, ConversionError> {
    expect_oid(oid, "BigDecimal", is_numeric(oid))?;
    let s = decode_str(oid, raw)?.trim();
    BigDecimal::from_str(s).map_err(|e| ConversionError::malformed(oid, format!("{e}: {s:?}")))
}

/// Decode a numeric payload as a [`Decimal`].
///
/// The value must be representable exactly: more than 28 fractional digits
/// or a magnitude beyond 96 bits is malformed rather than rounded.
pub fn decode_decimal(oid: Oid, raw: &[u8]) -> Result<Decimal, ConversionError> {
    expect_oid(oid, "Decimal", is_numeric(oid))?;
    let value = decode_big_decimal(oid, raw)?.normalized();
    let out_of_range = || ConversionError::malformed(oid, format!("{value} does not fit in Decimal"));

    let (digits, scale) = value.as_bigint_and_exponent();
    // A negative scale is a power of ten multiplier; past 28 it cannot fit.
    if scale < -MAX_DECIMAL_SCALE {
        return Err(out_of_range());
    }
    let (digits, scale) = if scale < 0 {
        value.with_scale(0).into_bigint_and_exponent()
    } else {
        (digits, scale)
    };
    let mantissa = i128::try_from(&digits).map_err(|_| out_of_range())?;
    let scale = u32::try_from(scale).map_err(|_| out_of_range())?;
    Decimal::try_from_i128_with_scale(mantissa, scale).map_err(|_| out_of_range())
}

const MAX_DECIMAL_SCALE: i64 = 28;

/// The server's spellings of non-finite floats.
fn non_finite(raw: &[u8]) -> Option<f64> {
    match raw {
        b"NaN" => Some(f64::NAN),
        b"Infinity" => Some(f64::INFINITY),
        b"-Infinity" => Some(f64::NEG_INFINITY),
        _ => None,
    }
}

/// Decode a `bool` payload (`t` / `f`).
pub fn decode_bool(oid: Oid, raw: &[u8]) -> Result<bool, ConversionError> {
    expect_oid(oid, "bool", oid == Oid::Bool)?;
    match raw {
        b"t" | b"true" | b"1" => Ok(true),
        b"f" | b"false" | b"0" => Ok(false),
        other => Err(ConversionError::malformed(
            oid,
            format!("invalid boolean {:?}", String::from_utf8_lossy(other)),
        )),
    }
}

/// Decode a `bytea` payload.
///
/// The hex format (`\x0a0b`) is what servers send by default; the legacy
/// escape format is accepted as well.
pub fn decode_bytea(oid: Oid, raw: &[u8]) -> Result<Bytes, ConversionError> {
    expect_oid(oid, "Bytes", oid == Oid::Bytea)?;
    match raw.strip_prefix(b"\\x") {
        Some(hex) => hex::decode(hex)
            .map(Bytes::from)
            .map_err(|e| ConversionError::malformed(oid, format!("invalid hex: {e}"))),
        None => decode_bytea_escape(oid, raw),
    }
}

fn decode_bytea_escape(oid: Oid, raw: &[u8]) -> Result<Bytes, ConversionError> {
    let mut out = Vec::with_capacity(raw.len());
    let mut i = 0;
    while i < raw.len() {
        if raw[i] != b'\\' {
            out.push(raw[i]);
            i += 1;
            continue;
        }
        match raw.get(i + 1..i + 4) {
            Some([b'\\', ..]) => {
                out.push(b'\\');
                i += 2;
            }
            Some(&[a, b, c]) if [a, b, c].iter().all(|d| (b'0'..=b'7').contains(d)) => {
                let byte = u16::from(a - b'0') << 6 | u16::from(b - b'0') << 3 | u16::from(c - b'0');
                let byte = u8::try_from(byte)
                    .map_err(|_| ConversionError::malformed(oid, "octal escape out of range"))?;
                out.push(byte);
                i += 4;
            }
            _ if raw.get(i + 1) == Some(&b'\\') => {
                out.push(b'\\');
                i += 2;
            }
            _ => return Err(ConversionError::malformed(oid, "invalid escape sequence")),
        }
    }
    Ok(Bytes::from(out))
}

/// Decode a `date` payload.
pub fn decode_date(oid: Oid, raw: &[u8]) -> Result<NaiveDate, ConversionError> {
    expect_oid(oid, "NaiveDate", oid == Oid::Date)?;
    let s = decode_str(oid, raw)?;
    NaiveDate::parse_from_str(s, DATE_FORMAT)
        .map_err(|e| ConversionError::malformed(oid, format!("{e}: {s:?}")))
}

/// Decode a `time` payload, or a `timetz` payload normalised to UTC.
///
/// The server also produces `24:00:00`, one past the last time of day.
/// [`NaiveTime`] cannot hold it, so it is malformed here.
pub fn decode_time(oid: Oid, raw: &[u8]) -> Result<NaiveTime, ConversionError> {
    let s = decode_str(oid, raw)?;
    if s.starts_with("24:") {
        return Err(ConversionError::malformed(
            oid,
            format!("end of day is outside the range of NaiveTime: {s:?}"),
        ));
    }
    match oid {
        Oid::Time => NaiveTime::parse_from_str(s, TIME_FORMAT)
            .map_err(|e| ConversionError::malformed(oid, format!("{e}: {s:?}"))),
        // Anchor on an arbitrary date so chrono can apply the offset.
        Oid::Timetz => DateTime::parse_from_str(&format!("2000-01-01 {s}"), TIMESTAMPTZ_FORMAT)
            .map(|dt| dt.naive_utc().time())
            .map_err(|e| ConversionError::malformed(oid, format!("{e}: {s:?}"))),
        other => Err(mismatch("NaiveTime", other)),
    }
}

/// Decode a `timestamp` payload, or a `timestamptz` payload as UTC.
pub fn decode_timestamp(oid: Oid, raw: &[u8]) -> Result<NaiveDateTime, ConversionError> {
    match oid {
        Oid::Timestamp => {
            let s = decode_str(oid, raw)?;
            NaiveDateTime::parse_from_str(s, TIMESTAMP_FORMAT)
                .map_err(|e| ConversionError::malformed(oid, format!("{e}: {s:?}")))
        }
        Oid::Timestamptz => decode_timestamptz(oid, raw).map(|dt| dt.naive_utc()),
        other => Err(mismatch("NaiveDateTime", other)),
    }
}

/// Decode a `timestamptz` payload, or a `timestamp` payload taken as UTC.
pub fn decode_timestamptz(oid: Oid, raw: &[u8]) -> Result<DateTime<FixedOffset>, ConversionError> {
    match oid {
        Oid::Timestamptz => {
            let s = decode_str(oid, raw)?;
            DateTime::parse_from_str(s, TIMESTAMPTZ_FORMAT)
                .map_err(|e| ConversionError::malformed(oid, format!("{e}: {s:?}")))
        }
        Oid::Timestamp => {
            decode_timestamp(oid, raw).map(|naive| naive.and_utc().fixed_offset())
        }
        other => Err(mismatch("DateTime<FixedOffset>", other)),
    }
}

/// Decode a `uuid` payload, or a textual payload holding a UUID.
pub fn decode_uuid(oid: Oid, raw: &[u8]) -> Result<Uuid, ConversionError> {
    expect_oid(oid, "Uuid", oid == Oid::Uuid || oid.is_textual())?;
    let s = decode_str(oid, raw)?;
    Uuid::parse_str(s).map_err(|e| ConversionError::malformed(oid, format!("{e}: {s:?}")))
}

fn parse<T>(oid: Oid, raw: &[u8]) -> Result<T, ConversionError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let s = decode_str(oid, raw)?;
    s.trim()
        .parse()
        .map_err(|e| ConversionError::malformed(oid, format!("{e}: {s:?}")))
}

fn is_integer(oid: Oid) -> bool {
    matches!(oid, Oid::Int2 | Oid::Int4 | Oid::Int8)
}

fn is_numeric(oid: Oid) -> bool {
    is_integer(oid) || matches!(oid, Oid::Float4 | Oid::Float8 | Oid::Numeric)
}

fn expect_oid(oid: Oid, expected: &'static str, ok: bool) -> Result<(), ConversionError> {
    if ok { Ok(()) } else { Err(mismatch(expected, oid)) }
}

fn mismatch(expected: &'static str, oid: Oid) -> ConversionError {
    ConversionError::TypeMismatch {
        expected,
        actual: oid.to_string(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_integers() {
        assert_eq!(decode_i16(Oid::Int2, b"-32768").unwrap(), i16::MIN);
        assert_eq!(decode_i32(Oid::Int4, b"42").unwrap(), 42);
        assert_eq!(decode_i64(Oid::Int8, b"9223372036854775807").unwrap(), i64::MAX);
        assert_eq!(
            decode_i128(Oid::Numeric, b"170141183460469231731687303715884105727").unwrap(),
            i128::MAX
        );
    }

    #[test]
    fn test_decode_narrowing_out_of_range() {
        let err = decode_i16(Oid::Int4, b"70000").unwrap_err();
        assert!(matches!(err, ConversionError::MalformedPayload { oid: Oid::Int4, .. }));
    }

    #[test]
    fn test_decode_non_numeric_text() {
        let err = decode_i32(Oid::Int4, b"forty-two").unwrap_err();
        assert!(matches!(err, ConversionError::MalformedPayload { .. }));
    }

    #[test]
    fn test_decode_integer_from_wrong_oid() {
        let err = decode_i32(Oid::Bool, b"t").unwrap_err();
        assert!(matches!(err, ConversionError::TypeMismatch { expected: "i32", .. }));
    }

    #[test]
    fn test_decode_decimal() {
        assert_eq!(
            decode_decimal(Oid::Numeric, b"123.4500").unwrap(),
            Decimal::from_str("123.45").unwrap()
        );
        assert_eq!(
            decode_decimal(Oid::Float8, b"1.5e-07").unwrap(),
            Decimal::from_str("0.00000015").unwrap()
        );
        assert_eq!(decode_decimal(Oid::Float8, b"2e+3").unwrap(), Decimal::from(2000));
        assert!(decode_decimal(Oid::Float8, b"NaN").is_err());
    }

    #[test]
    fn test_decode_decimal_never_rounds() {
        for raw in [
            &b"1e-30"[..],
            b"1e+300",
            b"3.4028235e+38",
            b"1234567890123456789012345678901",
        ] {
            assert!(matches!(
                decode_decimal(Oid::Numeric, raw),
                Err(ConversionError::MalformedPayload { oid: Oid::Numeric, .. })
            ));
        }
        assert_eq!(
            decode_decimal(Oid::Numeric, b"79228162514264337593543950335").unwrap(),
            Decimal::MAX
        );
    }

    #[test]
    fn test_decode_big_decimal_beyond_decimal_range() {
        let wide = "1234567890123456789012345678901.000000000000000000000000000000001";
        assert_eq!(
            decode_big_decimal(Oid::Numeric, wide.as_bytes()).unwrap(),
            BigDecimal::from_str(wide).unwrap()
        );
        assert_eq!(
            decode_big_decimal(Oid::Float8, b"1e+300").unwrap(),
            BigDecimal::from_str("1e300").unwrap()
        );
        assert_eq!(
            decode_big_decimal(Oid::Float8, b"1e-30").unwrap(),
            BigDecimal::new(1.into(), 30)
        );
        assert!(decode_big_decimal(Oid::Numeric, b"Infinity").is_err());
    }

    #[test]
    fn test_decode_float_specials() {
        assert!(decode_f64(Oid::Float8, b"NaN").unwrap().is_nan());
        assert_eq!(decode_f64(Oid::Float8, b"Infinity").unwrap(), f64::INFINITY);
        assert_eq!(decode_f32(Oid::Float4, b"-Infinity").unwrap(), f32::NEG_INFINITY);
        assert_eq!(decode_f64(Oid::Float8, b"0.1").unwrap(), 0.1);
    }

    #[test]
    fn test_decode_scalar_non_finite_floats() {
        assert!(matches!(
            decode_scalar(Oid::Float8, b"NaN").unwrap(),
            PgValue::Double(v) if v.is_nan()
        ));
        assert_eq!(decode_scalar(Oid::Float4, b"Infinity").unwrap(), PgValue::Double(f64::INFINITY));
        assert_eq!(
            decode_scalar(Oid::Numeric, b"-Infinity").unwrap(),
            PgValue::Double(f64::NEG_INFINITY)
        );
        assert!(decode_scalar(Oid::Float8, b"nan?").is_err());
    }

    #[test]
    fn test_decode_bool() {
        assert!(decode_bool(Oid::Bool, b"t").unwrap());
        assert!(!decode_bool(Oid::Bool, b"f").unwrap());
        assert!(decode_bool(Oid::Bool, b"yes please").is_err());
    }

    #[test]
    fn test_decode_bytea_hex() {
        assert_eq!(
            decode_bytea(Oid::Bytea, b"\\x00ff10").unwrap(),
            Bytes::from_static(&[0x00, 0xff, 0x10])
        );
        assert!(decode_bytea(Oid::Bytea, b"\\xzz").is_err());
    }

    #[test]
    fn test_decode_bytea_escape() {
        assert_eq!(
            decode_bytea(Oid::Bytea, b"ab\\\\c\\001").unwrap(),
            Bytes::from_static(b"ab\\c\x01")
        );
        assert!(decode_bytea(Oid::Bytea, b"\\9").is_err());
    }

    #[test]
    fn test_decode_char() {
        assert_eq!(decode_char(Oid::Bpchar, "é ".as_bytes()).unwrap(), 'é');
        assert!(decode_char(Oid::Bpchar, b"").is_err());
    }

    #[test]
    fn test_decode_text_invalid_utf8() {
        let err = decode_text(Oid::Text, &[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, ConversionError::MalformedPayload { oid: Oid::Text, .. }));
    }

    #[test]
    fn test_decode_temporal() {
        assert_eq!(
            decode_date(Oid::Date, b"2024-01-15").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
        );
        assert_eq!(
            decode_time(Oid::Time, b"13:45:30.123456").unwrap(),
            NaiveTime::from_hms_micro_opt(13, 45, 30, 123_456).unwrap()
        );
        assert_eq!(
            decode_time(Oid::Time, b"00:00:01").unwrap(),
            NaiveTime::from_hms_opt(0, 0, 1).unwrap()
        );
        assert_eq!(
            decode_timestamp(Oid::Timestamp, b"2024-01-15 10:30:00.5").unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_milli_opt(10, 30, 0, 500)
                .unwrap()
        );
    }

    #[test]
    fn test_decode_end_of_day_time() {
        for (oid, raw) in [(Oid::Time, &b"24:00:00"[..]), (Oid::Timetz, b"24:00:00+00")] {
            let err = decode_time(oid, raw).unwrap_err();
            assert!(err.to_string().contains("end of day"));
        }
        assert_eq!(
            decode_time(Oid::Time, b"23:59:59.999999").unwrap(),
            NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap()
        );
    }

    #[test]
    fn test_decode_timetz_normalises_to_utc() {
        assert_eq!(
            decode_time(Oid::Timetz, b"10:00:00+02").unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap()
        );
        assert_eq!(
            decode_time(Oid::Timetz, b"23:30:00-05:30").unwrap(),
            NaiveTime::from_hms_opt(5, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_decode_timestamptz() {
        let dt = decode_timestamptz(Oid::Timestamptz, b"2024-01-15 10:30:00+01").unwrap();
        assert_eq!(dt.offset().local_minus_utc(), 3600);
        assert_eq!(
            dt.naive_utc(),
            NaiveDate::from_ymd_opt(2024, 1, 15)
                .unwrap()
                .and_hms_opt(9, 30, 0)
                .unwrap()
        );
        assert!(decode_timestamptz(Oid::Timestamptz, b"infinity").is_err());
    }

    #[test]
    fn test_decode_uuid() {
        let uuid = decode_uuid(Oid::Uuid, b"12345678-1234-5678-1234-567812345678").unwrap();
        assert_eq!(uuid.to_string(), "12345678-1234-5678-1234-567812345678");
        assert!(decode_uuid(Oid::Uuid, b"not-a-uuid").is_err());
    }

    #[test]
    fn test_decode_scalar_defaults() {
        assert_eq!(decode_scalar(Oid::Int2, b"7").unwrap(), PgValue::SmallInt(7));
        assert_eq!(decode_scalar(Oid::Varchar, b"hi").unwrap(), PgValue::Text("hi".into()));
        assert_eq!(
            decode_scalar(Oid::Float4, b"1.25").unwrap(),
            PgValue::Numeric(BigDecimal::from_str("1.25").unwrap())
        );
        assert_eq!(
            decode_scalar(Oid::Float4, b"3.4028235e+38").unwrap(),
            PgValue::Numeric(BigDecimal::from_str("340282350000000000000000000000000000000").unwrap())
        );
        assert_eq!(
            decode_scalar(Oid::Float8, b"1e-30").unwrap(),
            PgValue::Numeric(BigDecimal::from_str("0.000000000000000000000000000001").unwrap())
        );
        assert!(matches!(
            decode_scalar(Oid::Int4Array, b"{1}"),
            Err(ConversionError::UnsupportedType(Oid::Int4Array))
        ));
        assert!(matches!(
            decode_scalar(Oid::Other(869), b"127.0.0.1"),
            Err(ConversionError::UnsupportedType(Oid::Other(869)))
        ));
    }
}
