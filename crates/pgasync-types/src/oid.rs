//! PostgreSQL type OID catalog.
//!
//! This module defines the wire types the codec understands, as they appear in
//! row descriptions and parameter descriptions.
//!
//! Reference: <https://github.com/postgres/postgres/blob/master/src/include/catalog/pg_type.dat>

use std::fmt;

macro_rules! catalog {
    ($($(#[$doc:meta])* $variant:ident = $code:literal => $name:literal,)+) => {
        /// PostgreSQL type identifiers.
        ///
        /// Every supported scalar has an array counterpart. OIDs outside the
        /// catalog are carried as [`Oid::Other`] so they can still be routed to
        /// custom converters.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Oid {
            $($(#[$doc])* $variant,)+
            /// An OID outside the built-in catalog.
            Other(u32),
        }

        impl Oid {
            /// Look up a catalog entry by its numeric OID.
            ///
            /// Unknown codes map to [`Oid::Other`].
            #[must_use]
            pub const fn from_code(code: u32) -> Self {
                match code {
                    $($code => Self::$variant,)+
                    other => Self::Other(other),
                }
            }

            /// The numeric OID sent on the wire.
            #[must_use]
            pub const fn code(&self) -> u32 {
                match self {
                    $(Self::$variant => $code,)+
                    Self::Other(code) => *code,
                }
            }

            /// The PostgreSQL type name, or `None` for [`Oid::Other`].
            #[must_use]
            pub const fn name(&self) -> Option<&'static str> {
                match self {
                    $(Self::$variant => Some($name),)+
                    Self::Other(_) => None,
                }
            }
        }
    };
}

catalog! {
    /// Boolean.
    Bool = 16 => "bool",
    /// Variable-length binary string.
    Bytea = 17 => "bytea",
    /// Single character.
    Char = 18 => "char",
    /// 64-bit signed integer.
    Int8 = 20 => "int8",
    /// 16-bit signed integer.
    Int2 = 21 => "int2",
    /// 32-bit signed integer.
    Int4 = 23 => "int4",
    /// Variable-length text.
    Text = 25 => "text",
    /// 32-bit floating point.
    Float4 = 700 => "float4",
    /// 64-bit floating point.
    Float8 = 701 => "float8",
    /// Blank-padded fixed-length character.
    Bpchar = 1042 => "bpchar",
    /// Variable-length character with limit.
    Varchar = 1043 => "varchar",
    /// Calendar date.
    Date = 1082 => "date",
    /// Time of day.
    Time = 1083 => "time",
    /// Date and time without time zone.
    Timestamp = 1114 => "timestamp",
    /// Date and time with time zone.
    Timestamptz = 1184 => "timestamptz",
    /// Time of day with time zone.
    Timetz = 1266 => "timetz",
    /// Arbitrary precision numeric.
    Numeric = 1700 => "numeric",
    /// UUID.
    Uuid = 2950 => "uuid",

    /// Array of `bool`.
    BoolArray = 1000 => "bool[]",
    /// Array of `bytea`.
    ByteaArray = 1001 => "bytea[]",
    /// Array of `char`.
    CharArray = 1002 => "char[]",
    /// Array of `int2`.
    Int2Array = 1005 => "int2[]",
    /// Array of `int4`.
    Int4Array = 1007 => "int4[]",
    /// Array of `text`.
    TextArray = 1009 => "text[]",
    /// Array of `bpchar`.
    BpcharArray = 1014 => "bpchar[]",
    /// Array of `varchar`.
    VarcharArray = 1015 => "varchar[]",
    /// Array of `int8`.
    Int8Array = 1016 => "int8[]",
    /// Array of `float4`.
    Float4Array = 1021 => "float4[]",
    /// Array of `float8`.
    Float8Array = 1022 => "float8[]",
    /// Array of `timestamp`.
    TimestampArray = 1115 => "timestamp[]",
    /// Array of `date`.
    DateArray = 1182 => "date[]",
    /// Array of `time`.
    TimeArray = 1183 => "time[]",
    /// Array of `timestamptz`.
    TimestamptzArray = 1185 => "timestamptz[]",
    /// Array of `numeric`.
    NumericArray = 1231 => "numeric[]",
    /// Array of `timetz`.
    TimetzArray = 1270 => "timetz[]",
    /// Array of `uuid`.
    UuidArray = 2951 => "uuid[]",
}

impl Oid {
    /// The element type of an array OID, or `None` for scalars.
    #[must_use]
    pub const fn element(&self) -> Option<Oid> {
        let element = match self {
            Self::BoolArray => Self::Bool,
            Self::ByteaArray => Self::Bytea,
            Self::CharArray => Self::Char,
            Self::Int2Array => Self::Int2,
            Self::Int4Array => Self::Int4,
            Self::TextArray => Self::Text,
            Self::BpcharArray => Self::Bpchar,
            Self::VarcharArray => Self::Varchar,
            Self::Int8Array => Self::Int8,
            Self::Float4Array => Self::Float4,
            Self::Float8Array => Self::Float8,
            Self::TimestampArray => Self::Timestamp,
            Self::DateArray => Self::Date,
            Self::TimeArray => Self::Time,
            Self::TimestamptzArray => Self::Timestamptz,
            Self::NumericArray => Self::Numeric,
            Self::TimetzArray => Self::Timetz,
            Self::UuidArray => Self::Uuid,
            _ => return None,
        };
        Some(element)
    }

    /// The array type whose elements are this OID, or `None` for arrays and
    /// OIDs outside the catalog.
    #[must_use]
    pub const fn array(&self) -> Option<Oid> {
        let array = match self {
            Self::Bool => Self::BoolArray,
            Self::Bytea => Self::ByteaArray,
            Self::Char => Self::CharArray,
            Self::Int2 => Self::Int2Array,
            Self::Int4 => Self::Int4Array,
            Self::Text => Self::TextArray,
            Self::Bpchar => Self::BpcharArray,
            Self::Varchar => Self::VarcharArray,
            Self::Int8 => Self::Int8Array,
            Self::Float4 => Self::Float4Array,
            Self::Float8 => Self::Float8Array,
            Self::Timestamp => Self::TimestampArray,
            Self::Date => Self::DateArray,
            Self::Time => Self::TimeArray,
            Self::Timestamptz => Self::TimestamptzArray,
            Self::Numeric => Self::NumericArray,
            Self::Timetz => Self::TimetzArray,
            Self::Uuid => Self::UuidArray,
            _ => return None,
        };
        Some(array)
    }

    /// Check if this OID is an array type.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.element().is_some()
    }

    /// Check if this OID is part of the built-in catalog.
    #[must_use]
    pub const fn is_builtin(&self) -> bool {
        !matches!(self, Self::Other(_))
    }

    /// Check if values of this OID travel as text.
    #[must_use]
    pub const fn is_textual(&self) -> bool {
        matches!(self, Self::Text | Self::Char | Self::Bpchar | Self::Varchar)
    }

    /// Check if this OID is a date or time type.
    #[must_use]
    pub const fn is_temporal(&self) -> bool {
        matches!(
            self,
            Self::Date | Self::Time | Self::Timetz | Self::Timestamp | Self::Timestamptz
        )
    }
}

impl From<u32> for Oid {
    fn from(code: u32) -> Self {
        Self::from_code(code)
    }
}

impl From<Oid> for u32 {
    fn from(oid: Oid) -> Self {
        oid.code()
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "oid {}", self.code()),
        }
    }
}
