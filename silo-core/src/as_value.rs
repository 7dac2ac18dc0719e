use crate::{Error, Result, Value};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use std::any;
use time::{Duration, OffsetDateTime};

/// Conversion between native Rust types and the dynamically typed [`Value`]
/// representation that backs query parameters and row decoding.
///
/// `try_from_value` accepts the canonical variant for the type and performs
/// range-checked narrowing from wider integer variants, so a row decoded
/// from a backend that widened a column (e.g. an 8 bit integer stored as 16
/// bit) still converts back losslessly.
pub trait AsValue {
    /// A typed NULL of this type's canonical variant. Never allocates.
    fn as_empty_value() -> Value;
    /// Convert into the owned [`Value`] representation.
    fn as_value(self) -> Value;
    /// Attempt to convert a dynamic [`Value`] into `Self`.
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

macro_rules! impl_as_value_int {
    ($source:ty, $variant:path) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                #[allow(unreachable_patterns)]
                let wide = match value {
                    $variant(Some(v)) => return Ok(v),
                    Value::Int8(Some(v)) => v as i128,
                    Value::Int16(Some(v)) => v as i128,
                    Value::Int32(Some(v)) => v as i128,
                    Value::Int64(Some(v)) => v as i128,
                    Value::UInt8(Some(v)) => v as i128,
                    Value::UInt16(Some(v)) => v as i128,
                    Value::UInt32(Some(v)) => v as i128,
                    Value::UInt64(Some(v)) => v as i128,
                    Value::Enum(Some(v)) => v as i128,
                    _ => {
                        return Err(Error::msg(format!(
                            "Cannot convert {value:?} to {}",
                            any::type_name::<Self>(),
                        )));
                    }
                };
                if wide < <$source>::MIN as i128 || wide > <$source>::MAX as i128 {
                    return Err(Error::msg(format!(
                        "Value {wide} is out of range for {}",
                        any::type_name::<Self>(),
                    )));
                }
                Ok(wide as $source)
            }
        }
    };
}

impl_as_value_int!(i8, Value::Int8);
impl_as_value_int!(i16, Value::Int16);
impl_as_value_int!(i32, Value::Int32);
impl_as_value_int!(i64, Value::Int64);
impl_as_value_int!(u8, Value::UInt8);
impl_as_value_int!(u16, Value::UInt16);
impl_as_value_int!(u32, Value::UInt32);
impl_as_value_int!(u64, Value::UInt64);

macro_rules! impl_as_value {
    ($source:ty, $variant:path $(, $pat_rest:pat => $expr_rest:expr)* $(,)?) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                $variant(None)
            }
            fn as_value(self) -> Value {
                $variant(Some(self.into()))
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    $variant(Some(v)) => Ok(v.into()),
                    $($pat_rest => $expr_rest,)*
                    #[allow(unreachable_patterns)]
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
        }
    };
}

impl_as_value!(bool, Value::Bool);
impl_as_value!(
    f32,
    Value::Float32,
    Value::Float64(Some(v)) => Ok(v as f32),
    Value::Decimal(Some(v)) => v.to_f32().ok_or_else(|| Error::msg(format!("Cannot convert {v} to f32"))),
);
impl_as_value!(
    f64,
    Value::Float64,
    Value::Float32(Some(v)) => Ok(v as f64),
    Value::Decimal(Some(v)) => v.to_f64().ok_or_else(|| Error::msg(format!("Cannot convert {v} to f64"))),
);
impl_as_value!(
    Decimal,
    Value::Decimal,
    Value::Int64(Some(v)) => Ok(Decimal::from(v)),
    Value::Int32(Some(v)) => Ok(Decimal::from(v)),
    Value::Float64(Some(v)) => Decimal::from_f64(v).ok_or_else(|| Error::msg(format!("Cannot convert {v} to Decimal"))),
);
impl_as_value!(String, Value::String);
impl_as_value!(OffsetDateTime, Value::DateTime);
impl_as_value!(Duration, Value::TimeSpan);
impl_as_value!(Box<[u8]>, Value::Binary);

impl AsValue for Vec<u8> {
    fn as_empty_value() -> Value {
        Value::Binary(None)
    }
    fn as_value(self) -> Value {
        Value::Binary(Some(self.into_boxed_slice()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Binary(Some(v)) => Ok(v.into_vec()),
            _ => Err(Error::msg(format!("Cannot convert {value:?} to Vec<u8>"))),
        }
    }
}

impl AsValue for &str {
    fn as_empty_value() -> Value {
        Value::String(None)
    }
    fn as_value(self) -> Value {
        Value::String(Some(self.to_owned()))
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Err(Error::msg(format!(
            "Cannot convert {value:?} to a borrowed str"
        )))
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        if value.is_null() {
            return Ok(None);
        }
        T::try_from_value(value).map(Some)
    }
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}
