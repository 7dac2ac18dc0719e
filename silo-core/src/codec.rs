use crate::{
    DataError, DataType, DateTimeKind, DateTimeType, Dialect, FieldDescriptor, Result,
    StringEncoding, Value,
};
use rust_decimal::{
    Decimal,
    prelude::{FromPrimitive, ToPrimitive},
};
use time::{Date, Duration, Month, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset};

/// 100 ns ticks per second.
pub const TICKS_PER_SECOND: i64 = 10_000_000;
/// Ticks between 0001-01-01T00:00:00 and the unix epoch.
const TICKS_TO_UNIX_EPOCH: i64 = 621_355_968_000_000_000;

/// Ticks (100 ns units since 0001-01-01T00:00:00) of a point in time.
pub fn datetime_to_ticks(value: OffsetDateTime) -> i64 {
    TICKS_TO_UNIX_EPOCH + (value.unix_timestamp_nanos() / 100) as i64
}

pub fn ticks_to_datetime(ticks: i64) -> Result<OffsetDateTime> {
    OffsetDateTime::from_unix_timestamp_nanos((ticks - TICKS_TO_UNIX_EPOCH) as i128 * 100)
        .map_err(|e| DataError::invalid_data(format!("tick count {ticks} is out of range: {e}")))
}

fn duration_to_ticks(value: Duration) -> i64 {
    (value.whole_nanoseconds() / 100) as i64
}

/// Tick count as fractional seconds. Splitting whole seconds from the
/// remainder keeps both parts inside f64's exact integer range, which a
/// direct `ticks as f64` division would not for modern dates.
fn ticks_to_seconds_f64(ticks: i64) -> f64 {
    (ticks / TICKS_PER_SECOND) as f64
        + (ticks % TICKS_PER_SECOND) as f64 / TICKS_PER_SECOND as f64
}

fn seconds_f64_to_ticks(seconds: f64) -> i64 {
    let whole = seconds.trunc();
    whole as i64 * TICKS_PER_SECOND + ((seconds - whole) * TICKS_PER_SECOND as f64).round() as i64
}

fn ticks_to_duration(ticks: i64) -> Duration {
    Duration::new(
        ticks / TICKS_PER_SECOND,
        ((ticks % TICKS_PER_SECOND) * 100) as i32,
    )
}

/// Integer of the shape `yyyyMMddHHmmssfff` for a point in time. Precision
/// below one millisecond is dropped by the format itself.
fn datetime_to_human_readable(value: OffsetDateTime) -> i64 {
    value.year() as i64 * 10_000_000_000_000
        + value.month() as i64 * 100_000_000_000
        + value.day() as i64 * 1_000_000_000
        + value.hour() as i64 * 10_000_000
        + value.minute() as i64 * 100_000
        + value.second() as i64 * 1_000
        + value.millisecond() as i64
}

fn human_readable_to_datetime(value: i64) -> Result<OffsetDateTime> {
    let context =
        |e: &dyn std::fmt::Display| format!("cannot parse {value} as yyyyMMddHHmmssfff: {e}");
    let millisecond = value % 1_000;
    let second = value / 1_000 % 100;
    let minute = value / 100_000 % 100;
    let hour = value / 10_000_000 % 100;
    let day = value / 1_000_000_000 % 100;
    let month = value / 100_000_000_000 % 100;
    let year = value / 10_000_000_000_000;
    let month =
        Month::try_from(month as u8).map_err(|e| DataError::invalid_data(context(&e)))?;
    let date = Date::from_calendar_date(year as i32, month, day as u8)
        .map_err(|e| DataError::invalid_data(context(&e)))?;
    let time = Time::from_hms_milli(hour as u8, minute as u8, second as u8, millisecond as u16)
        .map_err(|e| DataError::invalid_data(context(&e)))?;
    Ok(PrimitiveDateTime::new(date, time).assume_utc())
}

/// Convert a value's offset to match the field's declared kind. Instants
/// are preserved, only the representation offset changes.
fn resolve_kind(field: &FieldDescriptor, value: OffsetDateTime) -> OffsetDateTime {
    match field.date_time_kind {
        DateTimeKind::Unspecified => value,
        DateTimeKind::Utc => value.to_offset(UtcOffset::UTC),
        DateTimeKind::Local => {
            let offset = UtcOffset::current_local_offset().unwrap_or_else(|e| {
                log::warn!(
                    "no local offset available for field `{}` ({e}), assuming UTC",
                    field.name
                );
                UtcOffset::UTC
            });
            value.to_offset(offset)
        }
    }
}

fn type_error(field: &FieldDescriptor, value: &Value, expected: &str) -> crate::Error {
    DataError::out_of_range(
        field.name.clone(),
        value,
        format!("expected a {expected} value"),
    )
}

fn as_i128(field: &FieldDescriptor, value: &Value) -> Result<i128> {
    Ok(match value {
        Value::Int8(Some(v)) => *v as i128,
        Value::Int16(Some(v)) => *v as i128,
        Value::Int32(Some(v)) => *v as i128,
        Value::Int64(Some(v)) => *v as i128,
        Value::UInt8(Some(v)) => *v as i128,
        Value::UInt16(Some(v)) => *v as i128,
        Value::UInt32(Some(v)) => *v as i128,
        Value::UInt64(Some(v)) => *v as i128,
        Value::Enum(Some(v)) => *v as i128,
        Value::Decimal(Some(v)) if v.fract().is_zero() => v
            .to_i128()
            .ok_or_else(|| type_error(field, value, "integer"))?,
        _ => return Err(type_error(field, value, "integer")),
    })
}

fn as_f64(field: &FieldDescriptor, value: &Value) -> Result<f64> {
    Ok(match value {
        Value::Float32(Some(v)) => *v as f64,
        Value::Float64(Some(v)) => *v,
        Value::Decimal(Some(v)) => v
            .to_f64()
            .ok_or_else(|| type_error(field, value, "floating point"))?,
        _ => as_i128(field, value)? as f64,
    })
}

fn as_decimal(field: &FieldDescriptor, value: &Value) -> Result<Decimal> {
    Ok(match value {
        Value::Decimal(Some(v)) => *v,
        Value::Float32(Some(v)) => Decimal::from_f32(*v)
            .ok_or_else(|| type_error(field, value, "decimal"))?,
        Value::Float64(Some(v)) => Decimal::from_f64(*v)
            .ok_or_else(|| type_error(field, value, "decimal"))?,
        _ => Decimal::from_i128(as_i128(field, value)?)
            .ok_or_else(|| type_error(field, value, "decimal"))?,
    })
}

/// Narrow a wide integer into the variant of `data_type`, range checked.
fn integer_value(field: &FieldDescriptor, data_type: DataType, wide: i128) -> Result<Value> {
    let narrowed = match data_type {
        DataType::Int8 => <i8>::try_from(wide).map(|v| Value::Int8(Some(v))),
        DataType::Int16 => <i16>::try_from(wide).map(|v| Value::Int16(Some(v))),
        DataType::Int32 => <i32>::try_from(wide).map(|v| Value::Int32(Some(v))),
        DataType::Int64 => <i64>::try_from(wide).map(|v| Value::Int64(Some(v))),
        DataType::UInt8 => <u8>::try_from(wide).map(|v| Value::UInt8(Some(v))),
        DataType::UInt16 => <u16>::try_from(wide).map(|v| Value::UInt16(Some(v))),
        DataType::UInt32 => <u32>::try_from(wide).map(|v| Value::UInt32(Some(v))),
        DataType::UInt64 => <u64>::try_from(wide).map(|v| Value::UInt64(Some(v))),
        DataType::Enum => <i64>::try_from(wide).map(|v| Value::Enum(Some(v))),
        DataType::Decimal => {
            return Decimal::from_i128(wide)
                .map(|v| Value::Decimal(Some(v)))
                .ok_or_else(|| {
                    DataError::out_of_range(field.name.clone(), wide, "does not fit a decimal")
                });
        }
        DataType::Float64 => return Ok(Value::Float64(Some(wide as f64))),
        other => {
            return Err(DataError::invalid_operation(format!(
                "field `{}` cannot store an integer as {other:?}",
                field.name
            )));
        }
    };
    narrowed.map_err(|_| {
        DataError::out_of_range(
            field.name.clone(),
            wide,
            format!("does not fit {data_type:?}"),
        )
    })
}

fn check_decimal_range(field: &FieldDescriptor, value: &Decimal) -> Result<()> {
    if let Some(maximum) = field.decimal_maximum() {
        if value.abs() >= maximum {
            return Err(DataError::out_of_range(
                field.name.clone(),
                value,
                format!(
                    "exceeds precision {} scale {} (maximum {maximum})",
                    field.decimal_precision(),
                    field.decimal_scale()
                ),
            ));
        }
    }
    Ok(())
}

fn check_string(field: &FieldDescriptor, value: &str) -> Result<()> {
    let byte_length = match field.string_encoding {
        StringEncoding::Ascii => {
            if !value.is_ascii() {
                return Err(DataError::out_of_range(
                    field.name.clone(),
                    value,
                    "contains non-ASCII characters for an ASCII encoded field",
                ));
            }
            value.len()
        }
        StringEncoding::Utf8 => value.len(),
        StringEncoding::Utf16 => value.encode_utf16().count() * 2,
        StringEncoding::Utf32 => value.chars().count() * 4,
    };
    let maximum = field.maximum_length as usize;
    if maximum > 0 && byte_length > maximum {
        return Err(DataError::out_of_range(
            field.name.clone(),
            value,
            format!("{byte_length} bytes exceed the maximum length {maximum}"),
        ));
    }
    Ok(())
}

fn encode_datetime(field: &FieldDescriptor, value: OffsetDateTime) -> Result<Value> {
    let value = resolve_kind(field, value);
    let ticks = datetime_to_ticks(value);
    // The zero/default DateTime is the "unset" sentinel and stores as NULL.
    if ticks == 0 {
        return Ok(Value::Null);
    }
    Ok(match field.date_time_type {
        DateTimeType::Native => Value::DateTime(Some(value)),
        DateTimeType::BigIntTicks => Value::Int64(Some(ticks)),
        DateTimeType::BigIntHumanReadable => {
            Value::Int64(Some(datetime_to_human_readable(value)))
        }
        DateTimeType::DecimalSeconds => {
            Value::Decimal(Some(Decimal::from_i128_with_scale(ticks as i128, 7)))
        }
        DateTimeType::DoubleSeconds => Value::Float64(Some(ticks_to_seconds_f64(ticks))),
        DateTimeType::DoubleEpoch => Value::Float64(Some(ticks_to_seconds_f64(
            ticks - TICKS_TO_UNIX_EPOCH,
        ))),
    })
}

fn decode_datetime(field: &FieldDescriptor, value: &Value) -> Result<Value> {
    let decoded = match field.date_time_type {
        DateTimeType::Native => match value {
            Value::DateTime(Some(v)) => *v,
            _ => return Err(type_error(field, value, "DateTime")),
        },
        DateTimeType::BigIntTicks => ticks_to_datetime(as_i128(field, value)? as i64)?,
        DateTimeType::BigIntHumanReadable => {
            human_readable_to_datetime(as_i128(field, value)? as i64)?
        }
        DateTimeType::DecimalSeconds => {
            let seconds = as_decimal(field, value)?;
            let ticks = (seconds * Decimal::from(TICKS_PER_SECOND))
                .round()
                .to_i64()
                .ok_or_else(|| type_error(field, value, "DecimalSeconds DateTime"))?;
            ticks_to_datetime(ticks)?
        }
        DateTimeType::DoubleSeconds => {
            ticks_to_datetime(seconds_f64_to_ticks(as_f64(field, value)?))?
        }
        DateTimeType::DoubleEpoch => ticks_to_datetime(
            TICKS_TO_UNIX_EPOCH + seconds_f64_to_ticks(as_f64(field, value)?),
        )?,
    };
    Ok(Value::DateTime(Some(resolve_kind(field, decoded))))
}

fn encode_timespan(field: &FieldDescriptor, value: Duration) -> Result<Value> {
    let ticks = duration_to_ticks(value);
    Ok(match field.date_time_type {
        DateTimeType::Native => Value::TimeSpan(Some(value)),
        DateTimeType::BigIntTicks => Value::Int64(Some(ticks)),
        DateTimeType::DecimalSeconds => {
            Value::Decimal(Some(Decimal::from_i128_with_scale(ticks as i128, 7)))
        }
        DateTimeType::DoubleSeconds => Value::Float64(Some(ticks_to_seconds_f64(ticks))),
        DateTimeType::BigIntHumanReadable | DateTimeType::DoubleEpoch => {
            return Err(DataError::invalid_operation(format!(
                "field `{}`: {:?} is a calendar encoding and cannot store a TimeSpan",
                field.name, field.date_time_type
            )));
        }
    })
}

fn decode_timespan(field: &FieldDescriptor, value: &Value) -> Result<Value> {
    let decoded = match field.date_time_type {
        DateTimeType::Native => match value {
            Value::TimeSpan(Some(v)) => *v,
            _ => return Err(type_error(field, value, "TimeSpan")),
        },
        DateTimeType::BigIntTicks => ticks_to_duration(as_i128(field, value)? as i64),
        DateTimeType::DecimalSeconds => {
            let seconds = as_decimal(field, value)?;
            let ticks = (seconds * Decimal::from(TICKS_PER_SECOND))
                .round()
                .to_i64()
                .ok_or_else(|| type_error(field, value, "DecimalSeconds TimeSpan"))?;
            ticks_to_duration(ticks)
        }
        DateTimeType::DoubleSeconds => ticks_to_duration(seconds_f64_to_ticks(as_f64(field, value)?)),
        DateTimeType::BigIntHumanReadable | DateTimeType::DoubleEpoch => {
            return Err(DataError::invalid_operation(format!(
                "field `{}`: {:?} is a calendar encoding and cannot store a TimeSpan",
                field.name, field.date_time_type
            )));
        }
    };
    Ok(Value::TimeSpan(Some(decoded)))
}

/// Convert a local value into the database-wire representation of `field`.
///
/// Never mutates its inputs; NULL input converts to NULL unconditionally;
/// type and range violations raise instead of truncating.
pub fn get_database_value(
    dialect: &dyn Dialect,
    field: &FieldDescriptor,
    value: &Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match field.data_type {
        DataType::Bool => match value {
            Value::Bool(Some(v)) => Ok(Value::Bool(Some(*v))),
            _ => Ok(Value::Bool(Some(as_i128(field, value)? != 0))),
        },
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64 => {
            integer_value(field, field.type_at_database, as_i128(field, value)?)
        }
        DataType::Float32 => {
            let mut v = match value {
                Value::Float32(Some(v)) => *v,
                _ => as_f64(field, value)? as f32,
            };
            if v.is_infinite() && !dialect.capabilities().has_ieee_infinity {
                v = if v.is_sign_negative() { f32::MIN } else { f32::MAX };
            }
            Ok(Value::Float32(Some(v)))
        }
        DataType::Float64 => {
            let mut v = as_f64(field, value)?;
            if v.is_infinite() && !dialect.capabilities().has_ieee_infinity {
                v = if v.is_sign_negative() { f64::MIN } else { f64::MAX };
            }
            Ok(Value::Float64(Some(v)))
        }
        DataType::Decimal => {
            let v = as_decimal(field, value)?;
            check_decimal_range(field, &v)?;
            Ok(Value::Decimal(Some(v)))
        }
        DataType::String => match value {
            Value::String(Some(v)) => {
                check_string(field, v)?;
                Ok(Value::String(Some(v.clone())))
            }
            _ => Err(type_error(field, value, "String")),
        },
        DataType::Binary => match value {
            Value::Binary(Some(v)) => {
                let maximum = field.maximum_length as usize;
                if maximum > 0 && v.len() > maximum {
                    return Err(DataError::out_of_range(
                        field.name.clone(),
                        value,
                        format!("{} bytes exceed the maximum length {maximum}", v.len()),
                    ));
                }
                Ok(Value::Binary(Some(v.clone())))
            }
            _ => Err(type_error(field, value, "Binary")),
        },
        DataType::DateTime => match value {
            Value::DateTime(Some(v)) => encode_datetime(field, *v),
            _ => Err(type_error(field, value, "DateTime")),
        },
        DataType::TimeSpan => match value {
            Value::TimeSpan(Some(v)) => encode_timespan(field, *v),
            _ => Err(type_error(field, value, "TimeSpan")),
        },
        DataType::Enum => Ok(Value::Int64(Some(
            as_i128(field, value)?
                .try_into()
                .map_err(|_| type_error(field, value, "Enum"))?,
        ))),
        DataType::User => Ok(value.clone()),
    }
}

/// Convert a raw database value back into the local representation of
/// `field`. Inverse of [`get_database_value`] for every representation
/// except the documented lossy paths (infinity sentinel substitution,
/// zero-DateTime to NULL collapse, sub-millisecond truncation of the
/// human readable format).
pub fn get_local_value(
    dialect: &dyn Dialect,
    field: &FieldDescriptor,
    value: &Value,
) -> Result<Value> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    match field.data_type {
        DataType::Bool => match value {
            Value::Bool(Some(v)) => Ok(Value::Bool(Some(*v))),
            _ => Ok(Value::Bool(Some(as_i128(field, value)? != 0))),
        },
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32
        | DataType::UInt64
        | DataType::Enum => integer_value(field, field.data_type, as_i128(field, value)?),
        DataType::Float32 => {
            let mut v = match value {
                Value::Float32(Some(v)) => *v,
                _ => as_f64(field, value)? as f32,
            };
            if !dialect.capabilities().has_ieee_infinity {
                if v == f32::MAX {
                    v = f32::INFINITY;
                } else if v == f32::MIN {
                    v = f32::NEG_INFINITY;
                }
            }
            Ok(Value::Float32(Some(v)))
        }
        DataType::Float64 => {
            let mut v = as_f64(field, value)?;
            if !dialect.capabilities().has_ieee_infinity {
                if v == f64::MAX {
                    v = f64::INFINITY;
                } else if v == f64::MIN {
                    v = f64::NEG_INFINITY;
                }
            }
            Ok(Value::Float64(Some(v)))
        }
        DataType::Decimal => Ok(Value::Decimal(Some(as_decimal(field, value)?))),
        DataType::String => match value {
            Value::String(Some(v)) => Ok(Value::String(Some(v.clone()))),
            _ => Err(type_error(field, value, "String")),
        },
        DataType::Binary => match value {
            Value::Binary(Some(v)) => Ok(Value::Binary(Some(v.clone()))),
            _ => Err(type_error(field, value, "Binary")),
        },
        DataType::DateTime => decode_datetime(field, value),
        DataType::TimeSpan => decode_timespan(field, value),
        DataType::User => Ok(value.clone()),
    }
}
