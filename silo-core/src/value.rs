use crate::DataType;
use rust_decimal::Decimal;
use time::{Duration, OffsetDateTime};

/// Dynamically typed value moved between local structures and the database
/// wire. Every variant carries an `Option` so a typed NULL (a NULL that
/// still knows its column type) can be represented; `Null` is the untyped
/// default.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Bool(Option<bool>),
    Int8(Option<i8>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    UInt8(Option<u8>),
    UInt16(Option<u16>),
    UInt32(Option<u32>),
    UInt64(Option<u64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    String(Option<String>),
    Binary(Option<Box<[u8]>>),
    DateTime(Option<OffsetDateTime>),
    TimeSpan(Option<Duration>),
    /// Enum stored as its underlying 64 bit integer.
    Enum(Option<i64>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Bool(v) => v.is_none(),
            Value::Int8(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::UInt8(v) => v.is_none(),
            Value::UInt16(v) => v.is_none(),
            Value::UInt32(v) => v.is_none(),
            Value::UInt64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::String(v) => v.is_none(),
            Value::Binary(v) => v.is_none(),
            Value::DateTime(v) => v.is_none(),
            Value::TimeSpan(v) => v.is_none(),
            Value::Enum(v) => v.is_none(),
        }
    }

    pub fn same_type(&self, other: &Self) -> bool {
        core::mem::discriminant(self) == core::mem::discriminant(other)
    }

    /// The [`DataType`] a variant corresponds to, `None` for untyped NULL.
    pub fn data_type(&self) -> Option<DataType> {
        Some(match self {
            Value::Null => return None,
            Value::Bool(..) => DataType::Bool,
            Value::Int8(..) => DataType::Int8,
            Value::Int16(..) => DataType::Int16,
            Value::Int32(..) => DataType::Int32,
            Value::Int64(..) => DataType::Int64,
            Value::UInt8(..) => DataType::UInt8,
            Value::UInt16(..) => DataType::UInt16,
            Value::UInt32(..) => DataType::UInt32,
            Value::UInt64(..) => DataType::UInt64,
            Value::Float32(..) => DataType::Float32,
            Value::Float64(..) => DataType::Float64,
            Value::Decimal(..) => DataType::Decimal,
            Value::String(..) => DataType::String,
            Value::Binary(..) => DataType::Binary,
            Value::DateTime(..) => DataType::DateTime,
            Value::TimeSpan(..) => DataType::TimeSpan,
            Value::Enum(..) => DataType::Enum,
        })
    }

    /// An empty (typed NULL) value of the given datatype. `User` fields have
    /// no canonical variant and map to the untyped NULL.
    pub fn empty(data_type: DataType) -> Value {
        match data_type {
            DataType::Bool => Value::Bool(None),
            DataType::Int8 => Value::Int8(None),
            DataType::Int16 => Value::Int16(None),
            DataType::Int32 => Value::Int32(None),
            DataType::Int64 => Value::Int64(None),
            DataType::UInt8 => Value::UInt8(None),
            DataType::UInt16 => Value::UInt16(None),
            DataType::UInt32 => Value::UInt32(None),
            DataType::UInt64 => Value::UInt64(None),
            DataType::Float32 => Value::Float32(None),
            DataType::Float64 => Value::Float64(None),
            DataType::Decimal => Value::Decimal(None),
            DataType::String => Value::String(None),
            DataType::Binary => Value::Binary(None),
            DataType::DateTime => Value::DateTime(None),
            DataType::TimeSpan => Value::TimeSpan(None),
            DataType::Enum => Value::Enum(None),
            DataType::User => Value::Null,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Bool(l), Value::Bool(r)) => l == r,
            (Value::Int8(l), Value::Int8(r)) => l == r,
            (Value::Int16(l), Value::Int16(r)) => l == r,
            (Value::Int32(l), Value::Int32(r)) => l == r,
            (Value::Int64(l), Value::Int64(r)) => l == r,
            (Value::UInt8(l), Value::UInt8(r)) => l == r,
            (Value::UInt16(l), Value::UInt16(r)) => l == r,
            (Value::UInt32(l), Value::UInt32(r)) => l == r,
            (Value::UInt64(l), Value::UInt64(r)) => l == r,
            (Value::Float32(l), Value::Float32(r)) => l == r,
            (Value::Float64(l), Value::Float64(r)) => l == r,
            (Value::Decimal(l), Value::Decimal(r)) => l == r,
            (Value::String(l), Value::String(r)) => l == r,
            (Value::Binary(l), Value::Binary(r)) => l == r,
            (Value::DateTime(l), Value::DateTime(r)) => l == r,
            (Value::TimeSpan(l), Value::TimeSpan(r)) => l == r,
            (Value::Enum(l), Value::Enum(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}
