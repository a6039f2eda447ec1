#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use libfuzzer_sys::fuzz_target;
use pgasync_types::{PgValue, ToSql, ValueCodec};

/// Values whose default decoding is the value itself.
#[derive(Debug, Arbitrary)]
enum FuzzValue {
    Null,
    Bool(bool),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    Text(String),
    Bytes(Vec<u8>),
    TextArray(Vec<Option<String>>),
    IntArray(Vec<Option<i64>>),
}

fuzz_target!(|input: FuzzValue| {
    let value: PgValue = match input {
        FuzzValue::Null => PgValue::Null,
        FuzzValue::Bool(v) => PgValue::Bool(v),
        FuzzValue::SmallInt(v) => PgValue::SmallInt(v),
        FuzzValue::Int(v) => PgValue::Int(v),
        FuzzValue::BigInt(v) => PgValue::BigInt(v),
        FuzzValue::Text(v) => PgValue::Text(v),
        FuzzValue::Bytes(v) => PgValue::Bytes(Bytes::from(v)),
        FuzzValue::TextArray(v) => match v.to_sql() {
            Ok(value) => value,
            Err(_) => return,
        },
        FuzzValue::IntArray(v) => match v.to_sql() {
            Ok(value) => value,
            Err(_) => return,
        },
    };

    // Arrays of only NULLs carry no element type to decode with
    let oid = value.oid();
    if oid.code() == 0 && !value.is_null() {
        return;
    }

    let codec = ValueCodec::new();
    let encoded = codec.encode(&value).expect("built-in values always encode");
    let decoded = codec
        .decode_value(oid, encoded.as_deref())
        .expect("encoded values always decode");
    assert_eq!(decoded, value);
});
