//! Text-format array literals.
//!
//! PostgreSQL sends arrays as `{elem,elem,...}`. Elements are either bare
//! words or double-quoted strings with backslash escapes; a bare `NULL` is a
//! null element. Each element is itself a text-format scalar and is decoded
//! with the scalar rules of the element OID.
//!
//! Only single-level arrays are decoded. Nested literals and explicit
//! dimension decorations such as `[1:3]={...}` are rejected.

use bytes::{BufMut, Bytes, BytesMut};

use crate::decode::{decode_scalar, is_scalar_decodable};
use crate::error::ConversionError;
use crate::oid::Oid;
use crate::value::PgValue;

/// Split an array literal into its raw elements.
///
/// `None` marks a null element. `oid` is only used for error reporting.
pub fn parse_literal(oid: Oid, raw: &[u8]) -> Result<Vec<Option<String>>, ConversionError> {
    let text = std::str::from_utf8(raw).map_err(|e| ConversionError::malformed(oid, e.to_string()))?;
    let text = text.trim();

    if text.starts_with('[') {
        return Err(ConversionError::malformed(
            oid,
            "array dimension decorations are not supported",
        ));
    }
    let inner = text
        .strip_prefix('{')
        .and_then(|rest| rest.strip_suffix('}'))
        .ok_or_else(|| ConversionError::malformed(oid, format!("not an array literal: {text:?}")))?;

    let mut elements = Vec::new();
    if inner.trim().is_empty() {
        return Ok(elements);
    }

    let mut chars = inner.chars().peekable();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}

        let element = match chars.peek() {
            Some('"') => {
                chars.next();
                let mut value = String::new();
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c) => value.push(c),
                            None => return Err(unterminated(oid)),
                        },
                        Some(c) => value.push(c),
                        None => return Err(unterminated(oid)),
                    }
                }
                while chars.next_if(|c| c.is_whitespace()).is_some() {}
                Some(value)
            }
            Some('{') => {
                return Err(ConversionError::malformed(
                    oid,
                    "multi-dimensional arrays are not supported",
                ));
            }
            Some(',') | None => {
                return Err(ConversionError::malformed(oid, "empty array element"));
            }
            Some(_) => {
                let mut value = String::new();
                while let Some(c) = chars.next_if(|c| *c != ',') {
                    match c {
                        '\\' => match chars.next() {
                            Some(escaped) => value.push(escaped),
                            None => return Err(unterminated(oid)),
                        },
                        '"' | '{' | '}' => {
                            return Err(ConversionError::malformed(
                                oid,
                                format!("unexpected {c:?} in unquoted element"),
                            ));
                        }
                        c => value.push(c),
                    }
                }
                let value = value.trim_end();
                if value.eq_ignore_ascii_case("NULL") {
                    None
                } else {
                    Some(value.to_owned())
                }
            }
        };
        elements.push(element);

        match chars.next() {
            Some(',') => continue,
            None => break,
            Some(c) => {
                return Err(ConversionError::malformed(
                    oid,
                    format!("expected ',' between elements, found {c:?}"),
                ));
            }
        }
    }
    Ok(elements)
}

/// Decode an array literal whose elements are of type `element`.
///
/// Null elements decode to [`PgValue::Null`]. Fails with
/// [`ConversionError::UnsupportedArrayElement`] when `element` has no scalar
/// decoder.
pub fn decode_array(element: Oid, raw: &[u8]) -> Result<Vec<PgValue>, ConversionError> {
    if !is_scalar_decodable(element) {
        return Err(ConversionError::UnsupportedArrayElement(element));
    }
    decode_array_with(element, raw, |oid, value| match value {
        Some(bytes) => decode_scalar(oid, bytes),
        None => Ok(PgValue::Null),
    })
}

/// Decode an array literal, handing each element to `decode_element`.
pub fn decode_array_with<T, F>(
    element: Oid,
    raw: &[u8],
    mut decode_element: F,
) -> Result<Vec<T>, ConversionError>
where
    F: FnMut(Oid, Option<&[u8]>) -> Result<T, ConversionError>,
{
    parse_literal(element, raw)?
        .iter()
        .map(|item| decode_element(element, item.as_deref().map(str::as_bytes)))
        .collect()
}

/// Encode values as an array literal.
///
/// `encode_element` produces the text form of each non-array element; `None`
/// from it is written as `NULL`. Nested arrays are written as nested
/// literals without quoting.
pub fn encode_array<F>(values: &[PgValue], mut encode_element: F) -> Result<Bytes, ConversionError>
where
    F: FnMut(&PgValue) -> Result<Option<Bytes>, ConversionError>,
{
    let mut buf = BytesMut::with_capacity(2 + values.len() * 4);
    buf.put_u8(b'{');
    for (i, value) in values.iter().enumerate() {
        if i > 0 {
            buf.put_u8(b',');
        }
        let Some(encoded) = encode_element(value)? else {
            buf.put_slice(b"NULL");
            continue;
        };
        if matches!(value, PgValue::Array(_)) {
            buf.put_slice(&encoded);
            continue;
        }
        let text = std::str::from_utf8(&encoded).map_err(|e| {
            ConversionError::Converter(format!("array element is not valid UTF-8: {e}"))
        })?;
        write_element(text, &mut buf);
    }
    buf.put_u8(b'}');
    Ok(buf.freeze())
}

fn write_element(text: &str, buf: &mut BytesMut) {
    if !needs_quotes(text) {
        buf.put_slice(text.as_bytes());
        return;
    }
    buf.put_u8(b'"');
    for c in text.chars() {
        if c == '"' || c == '\\' {
            buf.put_u8(b'\\');
        }
        let mut utf8 = [0; 4];
        buf.put_slice(c.encode_utf8(&mut utf8).as_bytes());
    }
    buf.put_u8(b'"');
}

fn needs_quotes(text: &str) -> bool {
    text.is_empty()
        || text.eq_ignore_ascii_case("NULL")
        || text
            .chars()
            .any(|c| matches!(c, '{' | '}' | ',' | '"' | '\\') || c.is_whitespace())
}

fn unterminated(oid: Oid) -> ConversionError {
    ConversionError::malformed(oid, "unterminated array element")
}
