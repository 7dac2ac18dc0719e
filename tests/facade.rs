//! The facade crate re-exports the whole core surface.

use rust_decimal::Decimal;
use silo::{
    DataType, FieldDescriptor, GenericDialect, LayoutBuilder, ResultOption, Search, SqlBuilder,
    Value,
};
use time::macros::datetime;

#[test]
fn core_api_is_reachable_through_the_facade() {
    let layout = LayoutBuilder::new("items")
        .id("ID")
        .field(FieldDescriptor::new("Price", DataType::Decimal).with_maximum_length(10.02))
        .field(FieldDescriptor::new("Added", DataType::DateTime))
        .build()
        .unwrap();
    let search = Search::field_smaller("Price", Decimal::from(100))
        & Search::field_greater("Added", datetime!(2024-01-01 00:00:00 UTC));
    let command = SqlBuilder::new(&GenericDialect, &layout, "db", "items")
        .select(&search, &ResultOption::sort_ascending("Price"))
        .unwrap();
    assert!(command.text.starts_with("SELECT * FROM"));
    assert_eq!(command.parameters.len(), 2);
    assert!(matches!(command.parameters[0].value, Value::Decimal(..)));
}
