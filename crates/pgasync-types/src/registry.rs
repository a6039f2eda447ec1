//! Custom converter registry and resolution cache.
//!
//! Converters are supplied once, in order, when the codec is built. Resolving
//! a type tag works in two steps:
//!
//! 1. an exact match on the tag;
//! 2. otherwise the first converter, in registration order, whose tag is
//!    assignable from the requested one.
//!
//! Resolutions are cached per requested key. The cache is a copy-on-write
//! snapshot behind [`ArcSwap`], so lookups never take a lock. Two threads
//! racing on the same new key both compute the same answer; the first to
//! publish wins and the other adopts it.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use arc_swap::ArcSwap;
use bytes::Bytes;

use crate::error::ConversionError;
use crate::oid::Oid;
use crate::tag::{HostType, HostValue, TypeTag};

/// A paired encode/decode capability for one host type.
///
/// Most converters are easier to write through [`TypeConverter`], which is
/// implemented for this trait automatically. Implement `Converter` directly
/// when one converter must handle several concrete types.
pub trait Converter: Send + Sync {
    /// The tag this converter is registered against.
    fn type_tag(&self) -> TypeTag;

    /// Encode a value to its text-format payload.
    fn encode(&self, value: &dyn HostValue) -> Result<Bytes, ConversionError>;

    /// Decode a non-null payload of type `oid`.
    fn decode(&self, oid: Oid, raw: &[u8]) -> Result<Box<dyn HostValue>, ConversionError>;

    /// Whether this converter handles values of an OID outside the built-in
    /// catalog when no target type is given.
    fn accepts(&self, oid: Oid) -> bool {
        let _ = oid;
        false
    }
}

/// Typed converter for a single [`HostType`].
pub trait TypeConverter: Send + Sync {
    /// The host type produced and consumed.
    type Target: HostType;

    /// Encode a value to its text-format payload.
    fn to_wire(&self, value: &Self::Target) -> Result<Bytes, ConversionError>;

    /// Decode a non-null payload of type `oid`.
    fn from_wire(&self, oid: Oid, raw: &[u8]) -> Result<Self::Target, ConversionError>;

    /// See [`Converter::accepts`].
    fn accepts(&self, oid: Oid) -> bool {
        let _ = oid;
        false
    }
}

impl<C: TypeConverter> Converter for C {
    fn type_tag(&self) -> TypeTag {
        C::Target::TAG
    }

    fn encode(&self, value: &dyn HostValue) -> Result<Bytes, ConversionError> {
        if let Some(target) = value.downcast_ref::<C::Target>() {
            return self.to_wire(target);
        }
        // Subtypes reach a parent's converter through their upcast chain.
        let mut ancestor = value.upcast();
        while let Some(current) = ancestor {
            if let Some(target) = current.downcast_ref::<C::Target>() {
                return self.to_wire(target);
            }
            ancestor = current.upcast();
        }
        Err(ConversionError::TypeMismatch {
            expected: C::Target::TAG.name(),
            actual: value.type_tag().name().to_owned(),
        })
    }

    fn decode(&self, oid: Oid, raw: &[u8]) -> Result<Box<dyn HostValue>, ConversionError> {
        Ok(Box::new(self.from_wire(oid, raw)?))
    }

    fn accepts(&self, oid: Oid) -> bool {
        TypeConverter::accepts(self, oid)
    }
}

/// Ordered, immutable set of converters with a lock-free resolution cache.
pub struct ConverterRegistry {
    converters: Vec<Arc<dyn Converter>>,
    by_tag: HashMap<TypeTag, usize>,
    resolved: ResolutionCache<TypeTag>,
    resolved_oids: ResolutionCache<u32>,
}

impl ConverterRegistry {
    /// Create a registry. Order matters: earlier converters win both exact
    /// ties and the compatible-type scan.
    pub fn new(converters: impl IntoIterator<Item = Arc<dyn Converter>>) -> Self {
        let converters: Vec<_> = converters.into_iter().collect();
        let mut by_tag = HashMap::with_capacity(converters.len());
        for (index, converter) in converters.iter().enumerate() {
            let tag = converter.type_tag();
            if by_tag.contains_key(&tag) {
                tracing::warn!(
                    tag = tag.name(),
                    index,
                    "duplicate converter registration ignored, the earlier one wins"
                );
                continue;
            }
            by_tag.insert(tag, index);
        }
        Self {
            converters,
            by_tag,
            resolved: ResolutionCache::new(),
            resolved_oids: ResolutionCache::new(),
        }
    }

    /// Number of registered converters, duplicates included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.converters.len()
    }

    /// Check if no converters are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }

    /// Resolve the converter that decodes values requested as `tag`.
    pub fn resolve_for_decode(&self, tag: TypeTag) -> Result<Arc<dyn Converter>, ConversionError> {
        self.resolve_tag(tag)
    }

    /// Resolve the converter that encodes `value`, by the value's own tag.
    pub fn resolve_for_encode(
        &self,
        value: &dyn HostValue,
    ) -> Result<Arc<dyn Converter>, ConversionError> {
        self.resolve_tag(value.type_tag())
    }

    /// Resolve the converter for an OID with no built-in decoder.
    pub fn resolve_for_oid(&self, oid: Oid) -> Result<Arc<dyn Converter>, ConversionError> {
        self.resolved_oids.get_or_resolve(oid.code(), || {
            self.converters
                .iter()
                .find(|converter| converter.accepts(oid))
                .cloned()
                .ok_or(ConversionError::UnsupportedType(oid))
        })
    }

    /// Encode a custom value with its resolved converter.
    pub fn encode(&self, value: &dyn HostValue) -> Result<Bytes, ConversionError> {
        self.resolve_for_encode(value)?.encode(value)
    }

    /// Number of cached tag resolutions.
    #[must_use]
    pub fn cached_resolutions(&self) -> usize {
        self.resolved.len()
    }

    fn resolve_tag(&self, tag: TypeTag) -> Result<Arc<dyn Converter>, ConversionError> {
        self.resolved.get_or_resolve(tag, || {
            if let Some(&index) = self.by_tag.get(&tag) {
                return Ok(Arc::clone(&self.converters[index]));
            }
            self.converters
                .iter()
                .find(|converter| converter.type_tag().is_assignable_from(&tag))
                .cloned()
                .ok_or_else(|| ConversionError::UnknownTarget(tag.name().to_owned()))
        })
    }
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags: Vec<_> = self.converters.iter().map(|c| c.type_tag()).collect();
        f.debug_struct("ConverterRegistry")
            .field("converters", &tags)
            .field("cached_resolutions", &self.resolved.len())
            .finish()
    }
}

/// Grow-only map from a lookup key to its resolved converter.
struct ResolutionCache<K> {
    entries: ArcSwap<HashMap<K, Arc<dyn Converter>>>,
}

impl<K> ResolutionCache<K>
where
    K: Eq + Hash + Copy + fmt::Debug,
{
    fn new() -> Self {
        Self {
            entries: ArcSwap::from_pointee(HashMap::new()),
        }
    }

    fn len(&self) -> usize {
        self.entries.load().len()
    }

    fn get_or_resolve<F>(&self, key: K, resolve: F) -> Result<Arc<dyn Converter>, ConversionError>
    where
        F: FnOnce() -> Result<Arc<dyn Converter>, ConversionError>,
    {
        if let Some(hit) = self.entries.load().get(&key) {
            tracing::trace!(?key, "converter resolution cache hit");
            return Ok(Arc::clone(hit));
        }
        tracing::trace!(?key, "converter resolution cache miss");

        // Failures are not cached.
        let resolved = resolve()?;
        self.entries.rcu(|current| {
            if current.contains_key(&key) {
                return Arc::clone(current);
            }
            let mut next = HashMap::clone(current);
            next.insert(key, Arc::clone(&resolved));
            Arc::new(next)
        });
        tracing::debug!(?key, tag = resolved.type_tag().name(), "resolved converter");

        // A racing writer may have published first; hand out whichever entry won.
        Ok(self
            .entries
            .load()
            .get(&key)
            .map_or(resolved, Arc::clone))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SHAPE: TypeTag = TypeTag::new("Shape");
    const CIRCLE: TypeTag = TypeTag::with_parents("Circle", &[SHAPE]);

    #[derive(Debug)]
    struct Named(TypeTag, &'static str);

    impl Converter for Named {
        fn type_tag(&self) -> TypeTag {
            self.0
        }

        fn encode(&self, _value: &dyn HostValue) -> Result<Bytes, ConversionError> {
            Ok(Bytes::from_static(self.1.as_bytes()))
        }

        fn decode(&self, _oid: Oid, _raw: &[u8]) -> Result<Box<dyn HostValue>, ConversionError> {
            Err(ConversionError::Converter(self.1.to_owned()))
        }

        fn accepts(&self, oid: Oid) -> bool {
            oid == Oid::Other(600)
        }
    }

    fn named(tag: TypeTag, label: &'static str) -> Arc<dyn Converter> {
        Arc::new(Named(tag, label))
    }

    fn label(converter: &Arc<dyn Converter>) -> String {
        match converter.decode(Oid::Text, b"") {
            Err(ConversionError::Converter(label)) => label,
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_exact_match_preferred_over_scan() {
        let registry = ConverterRegistry::new([named(SHAPE, "shape"), named(CIRCLE, "circle")]);
        assert_eq!(label(&registry.resolve_for_decode(CIRCLE).unwrap()), "circle");
        assert_eq!(label(&registry.resolve_for_decode(SHAPE).unwrap()), "shape");
    }

    #[test]
    fn test_compatible_match_in_registration_order() {
        const OTHER_PARENT: TypeTag = TypeTag::new("Round");
        const DISC: TypeTag = TypeTag::with_parents("Disc", &[OTHER_PARENT, SHAPE]);

        let registry =
            ConverterRegistry::new([named(SHAPE, "shape"), named(OTHER_PARENT, "round")]);
        assert_eq!(label(&registry.resolve_for_decode(DISC).unwrap()), "shape");
    }

    #[test]
    fn test_duplicate_tag_first_wins() {
        let registry = ConverterRegistry::new([named(SHAPE, "first"), named(SHAPE, "second")]);
        assert_eq!(registry.len(), 2);
        assert_eq!(label(&registry.resolve_for_decode(SHAPE).unwrap()), "first");
    }

    #[test]
    fn test_unknown_target() {
        let registry = ConverterRegistry::new([named(CIRCLE, "circle")]);
        let err = registry.resolve_for_decode(SHAPE).err().unwrap();
        assert!(matches!(err, ConversionError::UnknownTarget(name) if name == "Shape"));
        assert_eq!(registry.cached_resolutions(), 0);
    }

    #[test]
    fn test_resolution_is_cached() {
        let registry = ConverterRegistry::new([named(SHAPE, "shape")]);
        let first = registry.resolve_for_decode(CIRCLE).unwrap();
        let second = registry.resolve_for_decode(CIRCLE).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.cached_resolutions(), 1);
    }

    #[test]
    fn test_resolve_for_oid() {
        let registry = ConverterRegistry::new([named(SHAPE, "shape")]);
        assert_eq!(label(&registry.resolve_for_oid(Oid::Other(600)).unwrap()), "shape");
        assert!(matches!(
            registry.resolve_for_oid(Oid::Other(601)).err().unwrap(),
            ConversionError::UnsupportedType(Oid::Other(601))
        ));
    }

    #[derive(Debug, PartialEq)]
    struct Area(u32);

    #[derive(Debug, PartialEq)]
    struct Square(u32);

    #[derive(Debug, PartialEq)]
    struct Tile(u32);

    #[derive(Debug, PartialEq)]
    struct Label(&'static str);

    impl HostType for Area {
        const TAG: TypeTag = TypeTag::new("Area");
    }

    impl HostType for Square {
        const TAG: TypeTag = TypeTag::with_parents("Square", &[Area::TAG]);

        fn upcast(&self) -> Option<Box<dyn HostValue>> {
            Some(Box::new(Area(self.0 * self.0)))
        }
    }

    impl HostType for Tile {
        const TAG: TypeTag = TypeTag::with_parents("Tile", &[Square::TAG]);

        fn upcast(&self) -> Option<Box<dyn HostValue>> {
            Some(Box::new(Square(self.0)))
        }
    }

    impl HostType for Label {
        const TAG: TypeTag = TypeTag::new("Label");
    }

    struct AreaConverter;

    impl TypeConverter for AreaConverter {
        type Target = Area;

        fn to_wire(&self, value: &Area) -> Result<Bytes, ConversionError> {
            Ok(Bytes::from(value.0.to_string()))
        }

        fn from_wire(&self, oid: Oid, _raw: &[u8]) -> Result<Area, ConversionError> {
            Err(ConversionError::malformed(oid, "unused"))
        }
    }

    #[test]
    fn test_typed_converter_encodes_through_upcast_chain() {
        let converter = AreaConverter;
        assert_eq!(Converter::encode(&converter, &Area(9)).unwrap(), "9");
        assert_eq!(Converter::encode(&converter, &Square(3)).unwrap(), "9");
        assert_eq!(Converter::encode(&converter, &Tile(4)).unwrap(), "16");
    }

    #[test]
    fn test_typed_converter_rejects_unrelated_value() {
        let err = Converter::encode(&AreaConverter, &Label("x")).unwrap_err();
        assert!(matches!(
            err,
            ConversionError::TypeMismatch { expected: "Area", actual } if actual == "Label"
        ));
    }

    #[test]
    fn test_empty_registry() {
        let registry = ConverterRegistry::default();
        assert!(registry.is_empty());
        assert!(registry.resolve_for_decode(SHAPE).is_err());
    }
}
