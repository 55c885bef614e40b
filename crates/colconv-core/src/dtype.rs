//! Column type tags accepted in schema files.
//!
//! Schema files name column types with a small, closed vocabulary of
//! dataframe-style names (`Int64`, `Utf8`, `Datetime`, ...). `TypeTag` is that
//! vocabulary; [`TypeTag::to_arrow`] maps each tag onto the Arrow type the CSV
//! reader is asked to produce.

use std::{fmt, str::FromStr};

use arrow::datatypes::{DataType, TimeUnit};

/// Precision used for `Decimal` and `Int128` columns.
pub const DECIMAL_PRECISION: u8 = 38;

/// Scale used for `Decimal` columns.
pub const DECIMAL_SCALE: i8 = 9;

/// Type names that may appear as values in a schema file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// 8-bit signed integer.
    Int8,
    /// 16-bit signed integer.
    Int16,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// 128-bit signed integer, carried as a scale-0 decimal.
    Int128,
    /// 8-bit unsigned integer.
    UInt8,
    /// 16-bit unsigned integer.
    UInt16,
    /// 32-bit unsigned integer.
    UInt32,
    /// 64-bit unsigned integer.
    UInt64,
    /// 32-bit floating point.
    Float32,
    /// 64-bit floating point.
    Float64,
    /// Fixed-point decimal.
    Decimal,
    /// UTF-8 string.
    Utf8,
    /// Alias of `Utf8`.
    String,
    /// Dictionary-encoded string.
    Categorical,
    /// Boolean.
    Boolean,
    /// Calendar date.
    Date,
    /// Timestamp without timezone, microsecond precision.
    Datetime,
    /// Time of day, nanosecond precision.
    Time,
    /// Elapsed time, microsecond precision.
    Duration,
    /// Raw bytes.
    Binary,
    /// All-null column.
    Null,
    /// Opaque values, carried as text.
    Object,
}

impl TypeTag {
    /// Every tag, in declaration order.
    pub const ALL: [TypeTag; 23] = [
        TypeTag::Int8,
        TypeTag::Int16,
        TypeTag::Int32,
        TypeTag::Int64,
        TypeTag::Int128,
        TypeTag::UInt8,
        TypeTag::UInt16,
        TypeTag::UInt32,
        TypeTag::UInt64,
        TypeTag::Float32,
        TypeTag::Float64,
        TypeTag::Decimal,
        TypeTag::Utf8,
        TypeTag::String,
        TypeTag::Categorical,
        TypeTag::Boolean,
        TypeTag::Date,
        TypeTag::Datetime,
        TypeTag::Time,
        TypeTag::Duration,
        TypeTag::Binary,
        TypeTag::Null,
        TypeTag::Object,
    ];

    /// The name as written in schema files.
    pub fn name(self) -> &'static str {
        match self {
            TypeTag::Int8 => "Int8",
            TypeTag::Int16 => "Int16",
            TypeTag::Int32 => "Int32",
            TypeTag::Int64 => "Int64",
            TypeTag::Int128 => "Int128",
            TypeTag::UInt8 => "UInt8",
            TypeTag::UInt16 => "UInt16",
            TypeTag::UInt32 => "UInt32",
            TypeTag::UInt64 => "UInt64",
            TypeTag::Float32 => "Float32",
            TypeTag::Float64 => "Float64",
            TypeTag::Decimal => "Decimal",
            TypeTag::Utf8 => "Utf8",
            TypeTag::String => "String",
            TypeTag::Categorical => "Categorical",
            TypeTag::Boolean => "Boolean",
            TypeTag::Date => "Date",
            TypeTag::Datetime => "Datetime",
            TypeTag::Time => "Time",
            TypeTag::Duration => "Duration",
            TypeTag::Binary => "Binary",
            TypeTag::Null => "Null",
            TypeTag::Object => "Object",
        }
    }

    /// Arrow type used when this tag is declared for a CSV column.
    pub fn to_arrow(self) -> DataType {
        match self {
            TypeTag::Int8 => DataType::Int8,
            TypeTag::Int16 => DataType::Int16,
            TypeTag::Int32 => DataType::Int32,
            TypeTag::Int64 => DataType::Int64,
            TypeTag::Int128 => DataType::Decimal128(DECIMAL_PRECISION, 0),
            TypeTag::UInt8 => DataType::UInt8,
            TypeTag::UInt16 => DataType::UInt16,
            TypeTag::UInt32 => DataType::UInt32,
            TypeTag::UInt64 => DataType::UInt64,
            TypeTag::Float32 => DataType::Float32,
            TypeTag::Float64 => DataType::Float64,
            TypeTag::Decimal => DataType::Decimal128(DECIMAL_PRECISION, DECIMAL_SCALE),
            TypeTag::Utf8 | TypeTag::String | TypeTag::Object => DataType::Utf8,
            TypeTag::Categorical => {
                DataType::Dictionary(Box::new(DataType::Int32), Box::new(DataType::Utf8))
            }
            TypeTag::Boolean => DataType::Boolean,
            TypeTag::Date => DataType::Date32,
            TypeTag::Datetime => DataType::Timestamp(TimeUnit::Microsecond, None),
            TypeTag::Time => DataType::Time64(TimeUnit::Nanosecond),
            TypeTag::Duration => DataType::Duration(TimeUnit::Microsecond),
            TypeTag::Binary => DataType::Binary,
            TypeTag::Null => DataType::Null,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A type name outside the supported vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownTypeTag(pub String);

impl fmt::Display for UnknownTypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown type tag '{}'", self.0)
    }
}

impl std::error::Error for UnknownTypeTag {}

impl FromStr for TypeTag {
    type Err = UnknownTypeTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeTag::ALL
            .into_iter()
            .find(|tag| tag.name() == s)
            .ok_or_else(|| UnknownTypeTag(s.to_string()))
    }
}
