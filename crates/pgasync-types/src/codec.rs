//! The value codec: built-in rules plus the custom converter registry.

use std::sync::Arc;

use bytes::Bytes;

use crate::array::decode_array;
use crate::decode::{self, decode_scalar, is_scalar_decodable};
use crate::encode::encode_value;
use crate::error::ConversionError;
use crate::from_sql::FromSql;
use crate::oid::Oid;
use crate::registry::{Converter, ConverterRegistry};
use crate::tag::{HostType, TypeTag};
use crate::to_sql::ToSql;
use crate::value::PgValue;

/// Bidirectional codec between wire payloads and host values.
///
/// A codec is immutable once built and is meant to be shared, typically as
/// `Arc<ValueCodec>`, by every connection of a pool.
///
/// # Example
///
/// ```
/// use pgasync_types::{Oid, PgValue, ValueCodec};
///
/// let codec = ValueCodec::new();
/// let value = codec.decode_value(Oid::Int4Array, Some(b"{1,2,3}")).unwrap();
/// assert_eq!(
///     value,
///     PgValue::Array(vec![PgValue::Int(1), PgValue::Int(2), PgValue::Int(3)])
/// );
/// assert_eq!(codec.encode(&value).unwrap().unwrap(), "{1,2,3}");
/// ```
#[derive(Debug, Default)]
pub struct ValueCodec {
    registry: ConverterRegistry,
}

impl ValueCodec {
    /// Create a codec with no custom converters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a codec from an ordered list of custom converters.
    #[must_use]
    pub fn with_converters(converters: impl IntoIterator<Item = Arc<dyn Converter>>) -> Self {
        Self {
            registry: ConverterRegistry::new(converters),
        }
    }

    /// Start building a codec.
    #[must_use]
    pub fn builder() -> ValueCodecBuilder {
        ValueCodecBuilder::default()
    }

    /// The custom converter registry.
    #[must_use]
    pub fn registry(&self) -> &ConverterRegistry {
        &self.registry
    }

    /// Decode a column value to its default host value.
    ///
    /// NULL decodes to [`PgValue::Null`] for every OID. Array OIDs decode to
    /// [`PgValue::Array`]. OIDs outside the catalog are handed to the first
    /// custom converter that accepts them.
    pub fn decode_value(&self, oid: Oid, raw: Option<&[u8]>) -> Result<PgValue, ConversionError> {
        let Some(raw) = raw else {
            return Ok(PgValue::Null);
        };
        if let Some(element) = oid.element() {
            return decode_array(element, raw).map(PgValue::Array);
        }
        if is_scalar_decodable(oid) {
            return decode_scalar(oid, raw);
        }
        let converter = self.registry.resolve_for_oid(oid)?;
        tracing::trace!(%oid, tag = converter.type_tag().name(), "decoding through custom converter");
        converter
            .decode(oid, raw)
            .map(|value| PgValue::Custom(Arc::from(value)))
    }

    /// Decode an array column with element type `element`.
    ///
    /// Returns `None` for a NULL array.
    pub fn decode_array(
        &self,
        element: Oid,
        raw: Option<&[u8]>,
    ) -> Result<Option<Vec<PgValue>>, ConversionError> {
        raw.map(|raw| decode_array(element, raw)).transpose()
    }

    /// Decode a column value to the host type named by `target`.
    ///
    /// Built-in tags are decoded by the built-in rules and never reach a
    /// custom converter, even one registered for the same tag. Any other tag
    /// is resolved through the registry and wrapped in [`PgValue::Custom`].
    pub fn decode_to(
        &self,
        target: TypeTag,
        oid: Oid,
        raw: Option<&[u8]>,
    ) -> Result<PgValue, ConversionError> {
        let Some(raw) = raw else {
            return Ok(PgValue::Null);
        };
        if let Some(value) = decode_builtin(target, oid, raw)? {
            return Ok(value);
        }
        let converter = self.registry.resolve_for_decode(target)?;
        converter
            .decode(oid, raw)
            .map(|value| PgValue::Custom(Arc::from(value)))
    }

    /// Decode a column value to a custom host type.
    ///
    /// Fails with [`ConversionError::TypeMismatch`] when the resolved
    /// converter, registered for a parent tag of `T`, produces a different
    /// concrete type. Built-in tags are not custom types and fail with
    /// [`ConversionError::UnknownTarget`]; use [`ValueCodec::decode`] for them.
    pub fn decode_custom<T: HostType>(
        &self,
        oid: Oid,
        raw: Option<&[u8]>,
    ) -> Result<Option<T>, ConversionError> {
        let Some(raw) = raw else {
            return Ok(None);
        };
        if T::TAG.is_builtin() {
            return Err(ConversionError::UnknownTarget(T::TAG.name().to_owned()));
        }
        let decoded = self.registry.resolve_for_decode(T::TAG)?.decode(oid, raw)?;
        let actual = decoded.type_tag();
        decoded
            .into_any()
            .downcast::<T>()
            .map(|value| Some(*value))
            .map_err(|_| ConversionError::TypeMismatch {
                expected: T::TAG.name(),
                actual: actual.name().to_owned(),
            })
    }

    /// Decode a column value to a Rust type.
    ///
    /// Returns `None` for NULL.
    pub fn decode<T: FromSql>(
        &self,
        oid: Oid,
        raw: Option<&[u8]>,
    ) -> Result<Option<T>, ConversionError> {
        raw.map(|raw| T::from_sql(oid, raw)).transpose()
    }

    /// Decode a column value to a Rust type, failing on NULL unless `T`
    /// can represent it.
    pub fn decode_required<T: FromSql>(
        &self,
        oid: Oid,
        raw: Option<&[u8]>,
    ) -> Result<T, ConversionError> {
        T::from_sql_nullable(oid, raw)
    }

    /// Encode a value to its text-format payload. `None` means NULL.
    pub fn encode(&self, value: &PgValue) -> Result<Option<Bytes>, ConversionError> {
        encode_value(value, &|host| self.registry.encode(host))
    }

    /// Encode an ordered parameter list, stopping at the first failure.
    pub fn encode_params(
        &self,
        params: &[&(dyn ToSql + Sync)],
    ) -> Result<Vec<Option<Bytes>>, ConversionError> {
        params
            .iter()
            .map(|param| self.encode(&param.to_sql()?))
            .collect()
    }
}

fn decode_builtin(
    target: TypeTag,
    oid: Oid,
    raw: &[u8],
) -> Result<Option<PgValue>, ConversionError> {
    let value = match target {
        t if t == TypeTag::STRING => PgValue::Text(decode::decode_text(oid, raw)?),
        t if t == TypeTag::CHAR => PgValue::Char(decode::decode_char(oid, raw)?),
        t if t == TypeTag::I16 => PgValue::SmallInt(decode::decode_i16(oid, raw)?),
        t if t == TypeTag::I32 => PgValue::Int(decode::decode_i32(oid, raw)?),
        t if t == TypeTag::I64 => PgValue::BigInt(decode::decode_i64(oid, raw)?),
        t if t == TypeTag::I128 => PgValue::BigInteger(decode::decode_i128(oid, raw)?),
        t if t == TypeTag::F32 => PgValue::Real(decode::decode_f32(oid, raw)?),
        t if t == TypeTag::F64 => PgValue::Double(decode::decode_f64(oid, raw)?),
        t if t == TypeTag::DECIMAL => PgValue::from(decode::decode_decimal(oid, raw)?),
        t if t == TypeTag::BIG_DECIMAL => PgValue::Numeric(decode::decode_big_decimal(oid, raw)?),
        t if t == TypeTag::BOOL => PgValue::Bool(decode::decode_bool(oid, raw)?),
        t if t == TypeTag::BYTES => PgValue::Bytes(decode::decode_bytea(oid, raw)?),
        t if t == TypeTag::UUID => PgValue::Uuid(decode::decode_uuid(oid, raw)?),
        t if t == TypeTag::DATE => PgValue::Date(decode::decode_date(oid, raw)?),
        t if t == TypeTag::TIME => PgValue::Time(decode::decode_time(oid, raw)?),
        t if t == TypeTag::TIMESTAMP => PgValue::Timestamp(decode::decode_timestamp(oid, raw)?),
        t if t == TypeTag::TIMESTAMPTZ => {
            PgValue::TimestampTz(decode::decode_timestamptz(oid, raw)?)
        }
        t if t == TypeTag::ARRAY => PgValue::from_sql(oid, raw)?,
        _ => return Ok(None),
    };
    Ok(Some(value))
}

/// Builder for [`ValueCodec`].
#[derive(Default)]
#[must_use]
pub struct ValueCodecBuilder {
    converters: Vec<Arc<dyn Converter>>,
}

impl ValueCodecBuilder {
    /// Register a custom converter. Registration order decides ties.
    pub fn converter(mut self, converter: impl Converter + 'static) -> Self {
        self.converters.push(Arc::new(converter));
        self
    }

    /// Register a shared custom converter.
    pub fn converter_arc(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converters.push(converter);
        self
    }

    /// Build the codec.
    pub fn build(self) -> ValueCodec {
        ValueCodec::with_converters(self.converters)
    }
}

impl std::fmt::Debug for ValueCodecBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValueCodecBuilder")
            .field("converters", &self.converters.len())
            .finish()
    }
}
