//! Host type identities.
//!
//! Custom converters are registered against an explicit [`TypeTag`] instead of
//! being discovered through reflection. A tag may declare parent tags, which
//! lets a converter registered for a general type serve more specific ones:
//! a converter for `inet` also resolves requests for an `inet4` tag whose
//! parents include `inet`.

use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::value::PgValue;

/// Identity of a host type, with its declared parents.
///
/// Tags compare and hash by name. Two tags with the same name are the same
/// type regardless of the parents they list.
#[derive(Clone, Copy)]
pub struct TypeTag {
    name: &'static str,
    parents: &'static [TypeTag],
}

impl TypeTag {
    /// `String`, decoded from any textual payload.
    pub const STRING: TypeTag = TypeTag::new("String");
    /// `char`.
    pub const CHAR: TypeTag = TypeTag::new("char");
    /// `i16`.
    pub const I16: TypeTag = TypeTag::new("i16");
    /// `i32`.
    pub const I32: TypeTag = TypeTag::new("i32");
    /// `i64`.
    pub const I64: TypeTag = TypeTag::new("i64");
    /// `i128`, the widest integer the codec produces.
    pub const I128: TypeTag = TypeTag::new("i128");
    /// `f32`.
    pub const F32: TypeTag = TypeTag::new("f32");
    /// `f64`.
    pub const F64: TypeTag = TypeTag::new("f64");
    /// `rust_decimal::Decimal`, limited to 28 significant digits.
    pub const DECIMAL: TypeTag = TypeTag::new("Decimal");
    /// `bigdecimal::BigDecimal`, the default for `numeric` and floats.
    pub const BIG_DECIMAL: TypeTag = TypeTag::new("BigDecimal");
    /// `bool`.
    pub const BOOL: TypeTag = TypeTag::new("bool");
    /// `bytes::Bytes`.
    pub const BYTES: TypeTag = TypeTag::new("Bytes");
    /// `uuid::Uuid`.
    pub const UUID: TypeTag = TypeTag::new("Uuid");
    /// `chrono::NaiveDate`.
    pub const DATE: TypeTag = TypeTag::new("NaiveDate");
    /// `chrono::NaiveTime`.
    pub const TIME: TypeTag = TypeTag::new("NaiveTime");
    /// `chrono::NaiveDateTime`.
    pub const TIMESTAMP: TypeTag = TypeTag::new("NaiveDateTime");
    /// `chrono::DateTime<FixedOffset>`.
    pub const TIMESTAMPTZ: TypeTag = TypeTag::new("DateTime<FixedOffset>");
    /// A sequence of [`PgValue`]s.
    pub const ARRAY: TypeTag = TypeTag::new("Vec<PgValue>");

    const BUILTIN: [TypeTag; 18] = [
        Self::STRING,
        Self::CHAR,
        Self::I16,
        Self::I32,
        Self::I64,
        Self::I128,
        Self::F32,
        Self::F64,
        Self::DECIMAL,
        Self::BIG_DECIMAL,
        Self::BOOL,
        Self::BYTES,
        Self::UUID,
        Self::DATE,
        Self::TIME,
        Self::TIMESTAMP,
        Self::TIMESTAMPTZ,
        Self::ARRAY,
    ];

    /// Create a tag with no parents.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self { name, parents: &[] }
    }

    /// Create a tag that is assignable to each of `parents`.
    #[must_use]
    pub const fn with_parents(name: &'static str, parents: &'static [TypeTag]) -> Self {
        Self { name, parents }
    }

    /// The tag name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// The declared parents, nearest first.
    #[must_use]
    pub const fn parents(&self) -> &'static [TypeTag] {
        self.parents
    }

    /// Check whether a value tagged `other` can be used where `self` is
    /// expected, i.e. `other` is `self` or transitively declares it as a parent.
    #[must_use]
    pub fn is_assignable_from(&self, other: &TypeTag) -> bool {
        self == other || other.parents.iter().any(|parent| self.is_assignable_from(parent))
    }

    /// Check if this tag names a shape the codec handles natively.
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        Self::BUILTIN.contains(self)
    }
}

impl PartialEq for TypeTag {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for TypeTag {}

impl Hash for TypeTag {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Debug for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeTag({})", self.name)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// A host type that custom converters can produce and consume.
///
/// # Example
///
/// ```
/// use pgasync_types::{HostType, TypeTag};
///
/// #[derive(Debug, Clone, PartialEq)]
/// struct Money(i64);
///
/// impl HostType for Money {
///     const TAG: TypeTag = TypeTag::new("Money");
/// }
/// ```
pub trait HostType: Any + fmt::Debug + PartialEq + Send + Sync {
    /// The identity converters are registered against.
    const TAG: TypeTag;

    /// A built-in view of this value, if it has one.
    ///
    /// When this returns `Some`, the encoder uses the built-in rules for the
    /// returned shape and never consults a custom converter for the value,
    /// even one registered for [`Self::TAG`].
    fn as_builtin(&self) -> Option<PgValue> {
        None
    }

    /// This value as an instance of its nearest parent type.
    ///
    /// Types whose tag declares parents implement this so that a converter
    /// registered for a parent can encode them. Returning `None` means the
    /// value cannot be viewed as any parent.
    fn upcast(&self) -> Option<Box<dyn HostValue>> {
        None
    }
}

/// Object-safe view of a [`HostType`] value.
///
/// Implemented for every [`HostType`]; there is no need to implement it by hand.
pub trait HostValue: fmt::Debug + Send + Sync {
    /// Tag of the concrete type.
    fn type_tag(&self) -> TypeTag;

    /// See [`HostType::as_builtin`].
    fn as_builtin(&self) -> Option<PgValue>;

    /// See [`HostType::upcast`].
    fn upcast(&self) -> Option<Box<dyn HostValue>>;

    /// Borrow as [`Any`] for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Convert into a boxed [`Any`] for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    /// Compare with another host value of possibly different type.
    fn dyn_eq(&self, other: &dyn HostValue) -> bool;
}

impl<T: HostType> HostValue for T {
    fn type_tag(&self) -> TypeTag {
        T::TAG
    }

    fn as_builtin(&self) -> Option<PgValue> {
        HostType::as_builtin(self)
    }

    fn upcast(&self) -> Option<Box<dyn HostValue>> {
        HostType::upcast(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn dyn_eq(&self, other: &dyn HostValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }
}

impl PartialEq for dyn HostValue {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

impl dyn HostValue + '_ {
    /// Downcast a borrowed host value to its concrete type.
    #[must_use]
    pub fn downcast_ref<T: HostType>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const INET: TypeTag = TypeTag::new("inet");
    const INET4: TypeTag = TypeTag::with_parents("inet4", &[INET]);
    const LOOPBACK4: TypeTag = TypeTag::with_parents("loopback4", &[INET4]);

    #[test]
    fn test_assignable_from_self() {
        assert!(INET.is_assignable_from(&INET));
        assert!(TypeTag::I32.is_assignable_from(&TypeTag::I32));
    }

    #[test]
    fn test_assignable_from_parent_chain() {
        assert!(INET.is_assignable_from(&INET4));
        assert!(INET.is_assignable_from(&LOOPBACK4));
        assert!(!INET4.is_assignable_from(&INET));
        assert!(!TypeTag::STRING.is_assignable_from(&INET4));
    }

    #[test]
    fn test_identity_by_name() {
        assert_eq!(TypeTag::new("inet"), INET);
        assert_ne!(INET, INET4);
    }

    #[test]
    fn test_builtin_tags() {
        assert!(TypeTag::TIMESTAMP.is_builtin());
        assert!(TypeTag::ARRAY.is_builtin());
        assert!(TypeTag::BIG_DECIMAL.is_builtin());
        assert!(!INET.is_builtin());
    }

    #[derive(Debug, PartialEq)]
    struct Port(u16);

    impl HostType for Port {
        const TAG: TypeTag = TypeTag::new("Port");
    }

    #[test]
    fn test_host_value_downcast_and_eq() {
        let a: Box<dyn HostValue> = Box::new(Port(5432));
        let b: Box<dyn HostValue> = Box::new(Port(5432));
        assert_eq!(a.type_tag(), Port::TAG);
        assert_eq!(a.downcast_ref::<Port>(), Some(&Port(5432)));
        assert!(*a == *b);
        assert!(a.as_builtin().is_none());
        assert!(a.upcast().is_none());
    }

    #[derive(Debug, PartialEq)]
    struct Socket(u16);

    #[derive(Debug, PartialEq)]
    struct LocalSocket(u16);

    impl HostType for Socket {
        const TAG: TypeTag = TypeTag::new("Socket");
    }

    impl HostType for LocalSocket {
        const TAG: TypeTag = TypeTag::with_parents("LocalSocket", &[Socket::TAG]);

        fn upcast(&self) -> Option<Box<dyn HostValue>> {
            Some(Box::new(Socket(self.0)))
        }
    }

    #[test]
    fn test_upcast_to_parent() {
        let local: Box<dyn HostValue> = Box::new(LocalSocket(5432));
        assert!(local.downcast_ref::<Socket>().is_none());
        let parent = local.upcast().unwrap();
        assert_eq!(parent.type_tag(), Socket::TAG);
        assert_eq!(parent.downcast_ref::<Socket>(), Some(&Socket(5432)));
    }
}
