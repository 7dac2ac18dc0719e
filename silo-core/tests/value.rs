use rust_decimal::Decimal;
use silo_core::{AsValue, DataType, Value};
use time::macros::datetime;
use time::Duration;

#[test]
fn value_null() {
    assert_eq!(Value::Null, Value::Null);
    assert!(Value::Null.is_null());
    assert!(Value::Int32(None).is_null());
    assert_ne!(Value::Null, Value::Int32(None));
    assert_eq!(Value::Null.data_type(), None);
}

#[test]
fn value_bool() {
    let val: Value = true.into();
    assert_eq!(val, Value::Bool(Some(true)));
    assert_ne!(val, Value::Bool(Some(false)));
    assert_ne!(val, Value::Bool(None));
    let var: bool = AsValue::try_from_value(val).unwrap();
    assert!(var);
}

#[test]
fn value_integers_widen_and_narrow() {
    let val: Value = 127i8.into();
    assert_eq!(val, Value::Int8(Some(127)));
    assert_eq!(i64::try_from_value(val).unwrap(), 127);
    assert_eq!(i16::try_from_value(Value::Int8(Some(-3))).unwrap(), -3);
    assert_eq!(u8::try_from_value(Value::Int64(Some(200))).unwrap(), 200);
    assert!(i8::try_from_value(Value::Int64(Some(300))).is_err());
    assert!(u8::try_from_value(Value::Int16(Some(-1))).is_err());
    assert!(i32::try_from_value(Value::String(Some("1".into()))).is_err());
}

#[test]
fn value_floats() {
    let val: Value = 3.5f32.into();
    assert_eq!(val, Value::Float32(Some(3.5)));
    assert_eq!(f64::try_from_value(val).unwrap(), 3.5);
    assert_eq!(
        f64::try_from_value(Value::Decimal(Some(Decimal::new(225, 2)))).unwrap(),
        2.25
    );
}

#[test]
fn value_decimal() {
    let var = Decimal::new(123456, 3);
    let val: Value = var.into();
    assert_eq!(val, Value::Decimal(Some(var)));
    let back: Decimal = AsValue::try_from_value(val).unwrap();
    assert_eq!(back, var);
    assert_eq!(
        Decimal::try_from_value(Value::Int64(Some(42))).unwrap(),
        Decimal::from(42)
    );
}

#[test]
fn value_string() {
    let val: Value = "Hello World!".into();
    assert_eq!(val, Value::String(Some("Hello World!".into())));
    assert_ne!(val, Value::String(Some("Hello World.".into())));
    let var: String = AsValue::try_from_value(val).unwrap();
    assert_eq!(var, "Hello World!");
}

#[test]
fn value_binary() {
    let val: Value = vec![1u8, 2, 3].into();
    assert_eq!(val.data_type(), Some(DataType::Binary));
    let var: Vec<u8> = AsValue::try_from_value(val).unwrap();
    assert_eq!(var, [1, 2, 3]);
}

#[test]
fn value_datetime() {
    let var = datetime!(2025-07-29 13:52:13 UTC);
    let val: Value = var.into();
    assert_eq!(val, Value::DateTime(Some(var)));
    assert_ne!(val, Value::Null);
    let var2: time::OffsetDateTime = AsValue::try_from_value(val).unwrap();
    assert_eq!(var2, var);
}

#[test]
fn value_timespan() {
    let var = Duration::seconds(90);
    let val: Value = var.into();
    assert_eq!(val, Value::TimeSpan(Some(var)));
    let var2: Duration = AsValue::try_from_value(val).unwrap();
    assert_eq!(var2, var);
}

#[test]
fn value_option() {
    let val: Value = Option::<i32>::None.into();
    assert_eq!(val, Value::Int32(None));
    assert!(val.is_null());
    let back: Option<i32> = AsValue::try_from_value(Value::Int32(Some(5))).unwrap();
    assert_eq!(back, Some(5));
    let back: Option<i32> = AsValue::try_from_value(Value::Int32(None)).unwrap();
    assert_eq!(back, None);
}

#[test]
fn value_enum_converts_to_integers() {
    assert_eq!(i64::try_from_value(Value::Enum(Some(4))).unwrap(), 4);
    assert_eq!(i8::try_from_value(Value::Enum(Some(4))).unwrap(), 4);
}

#[test]
fn same_type_ignores_content() {
    assert!(Value::Int32(Some(1)).same_type(&Value::Int32(None)));
    assert!(!Value::Int32(Some(1)).same_type(&Value::Int64(Some(1))));
    assert!(Value::empty(DataType::Decimal).same_type(&Value::Decimal(Some(Decimal::ZERO))));
}
