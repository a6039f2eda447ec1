//! Trait for converting Rust types to parameter values.

use bigdecimal::BigDecimal;
use bytes::Bytes;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ConversionError;
use crate::oid::Oid;
use crate::value::PgValue;

/// Trait for types that can be converted to parameter values.
///
/// This trait is implemented for common Rust types to enable type-safe
/// parameter binding in queries. Binary data binds through [`Bytes`];
/// `Vec<T>` and `[T]` bind as arrays.
pub trait ToSql {
    /// Convert this value to a [`PgValue`].
    fn to_sql(&self) -> Result<PgValue, ConversionError>;

    /// The OID this value binds as. `Oid::Other(0)` lets the server infer it.
    fn sql_type(&self) -> Oid;
}

macro_rules! to_sql_copy {
    ($($ty:ty => $variant:ident, $oid:expr;)+) => {
        $(
            impl ToSql for $ty {
                fn to_sql(&self) -> Result<PgValue, ConversionError> {
                    Ok(PgValue::$variant(*self))
                }

                fn sql_type(&self) -> Oid {
                    $oid
                }
            }
        )+
    };
}

to_sql_copy! {
    bool => Bool, Oid::Bool;
    char => Char, Oid::Bpchar;
    i16 => SmallInt, Oid::Int2;
    i32 => Int, Oid::Int4;
    i64 => BigInt, Oid::Int8;
    i128 => BigInteger, Oid::Numeric;
    f32 => Real, Oid::Float4;
    f64 => Double, Oid::Float8;
    Uuid => Uuid, Oid::Uuid;
    NaiveDate => Date, Oid::Date;
    NaiveTime => Time, Oid::Time;
    NaiveDateTime => Timestamp, Oid::Timestamp;
    DateTime<FixedOffset> => TimestampTz, Oid::Timestamptz;
}

impl ToSql for Decimal {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        Ok(PgValue::from(*self))
    }

    fn sql_type(&self) -> Oid {
        Oid::Numeric
    }
}

impl ToSql for BigDecimal {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        Ok(PgValue::Numeric(self.clone()))
    }

    fn sql_type(&self) -> Oid {
        Oid::Numeric
    }
}

impl ToSql for DateTime<Utc> {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        Ok(PgValue::TimestampTz(self.fixed_offset()))
    }

    fn sql_type(&self) -> Oid {
        Oid::Timestamptz
    }
}

impl ToSql for str {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        Ok(PgValue::Text(self.to_owned()))
    }

    fn sql_type(&self) -> Oid {
        Oid::Text
    }
}

impl ToSql for String {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        Ok(PgValue::Text(self.clone()))
    }

    fn sql_type(&self) -> Oid {
        Oid::Text
    }
}

impl ToSql for Bytes {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        Ok(PgValue::Bytes(self.clone()))
    }

    fn sql_type(&self) -> Oid {
        Oid::Bytea
    }
}

impl ToSql for PgValue {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        Ok(self.clone())
    }

    fn sql_type(&self) -> Oid {
        self.oid()
    }
}

impl<T: ToSql> ToSql for Option<T> {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        match self {
            Some(v) => v.to_sql(),
            None => Ok(PgValue::Null),
        }
    }

    fn sql_type(&self) -> Oid {
        match self {
            Some(v) => v.sql_type(),
            None => Oid::Other(0),
        }
    }
}

impl<T: ToSql> ToSql for [T] {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        self.iter()
            .map(ToSql::to_sql)
            .collect::<Result<Vec<_>, _>>()
            .map(PgValue::Array)
    }

    fn sql_type(&self) -> Oid {
        self.iter()
            .map(ToSql::sql_type)
            .find(|oid| *oid != Oid::Other(0))
            .and_then(|oid| oid.array())
            .unwrap_or(Oid::Other(0))
    }
}

impl<T: ToSql> ToSql for Vec<T> {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        self.as_slice().to_sql()
    }

    fn sql_type(&self) -> Oid {
        self.as_slice().sql_type()
    }
}

impl<T: ToSql + ?Sized> ToSql for &T {
    fn to_sql(&self) -> Result<PgValue, ConversionError> {
        (*self).to_sql()
    }

    fn sql_type(&self) -> Oid {
        (*self).sql_type()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_to_sql_i32() {
        let value: i32 = 42;
        assert_eq!(value.to_sql().unwrap(), PgValue::Int(42));
        assert_eq!(value.sql_type(), Oid::Int4);
    }

    #[test]
    fn test_to_sql_string() {
        let value = "hello".to_string();
        assert_eq!(value.to_sql().unwrap(), PgValue::Text("hello".to_string()));
        assert_eq!("hello".sql_type(), Oid::Text);
    }

    #[test]
    fn test_to_sql_option() {
        let some: Option<i32> = Some(42);
        assert_eq!(some.to_sql().unwrap(), PgValue::Int(42));

        let none: Option<i32> = None;
        assert_eq!(none.to_sql().unwrap(), PgValue::Null);
        assert_eq!(none.sql_type(), Oid::Other(0));
    }

    #[test]
    fn test_to_sql_vec() {
        let values = vec![Some(1i64), None, Some(3)];
        assert_eq!(
            values.to_sql().unwrap(),
            PgValue::Array(vec![PgValue::BigInt(1), PgValue::Null, PgValue::BigInt(3)])
        );
        assert_eq!(values.sql_type(), Oid::Int8Array);
        assert_eq!(Vec::<i64>::new().sql_type(), Oid::Other(0));
    }

    #[test]
    fn test_to_sql_decimals() {
        let exact = Decimal::new(31415, 4);
        assert_eq!(exact.to_sql().unwrap(), PgValue::Numeric("3.1415".parse().unwrap()));
        assert_eq!(exact.sql_type(), Oid::Numeric);

        let wide: BigDecimal = "1e-40".parse().unwrap();
        assert_eq!(wide.to_sql().unwrap(), PgValue::Numeric(wide.clone()));
        assert_eq!(wide.sql_type(), Oid::Numeric);
    }

    #[test]
    fn test_to_sql_utc() {
        let at = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
            .and_utc();
        assert_eq!(at.to_sql().unwrap(), PgValue::TimestampTz(at.fixed_offset()));
        assert_eq!(at.sql_type(), Oid::Timestamptz);
    }
}
