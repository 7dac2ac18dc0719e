use silo_core::{
    DataType, DateTimeKind, DateTimeType, Dialect, FieldDescriptor, LayoutBuilder, ResultOption,
    Search, SqlBuilder, Value,
    codec::{get_database_value, get_local_value},
};
use silo_mysql::MysqlDialect;

fn builder<'a>(dialect: &'a MysqlDialect, layout: &'a silo_core::RowLayout) -> SqlBuilder<'a> {
    SqlBuilder::new(dialect, layout, "shop", "orders")
}

fn layout() -> silo_core::RowLayout {
    LayoutBuilder::new("orders")
        .id("ID")
        .field(FieldDescriptor::new("Name", DataType::String))
        .build()
        .unwrap()
}

#[test]
fn quotes_with_backticks_and_binds_positionally() {
    let dialect = MysqlDialect;
    let layout = layout();
    let command = builder(&dialect, &layout)
        .select(&Search::field_equals("Name", "a"), &ResultOption::none())
        .unwrap();
    assert_eq!(
        command.text,
        "SELECT * FROM `shop`.`orders` WHERE `Name` = ?;"
    );
    assert!(command.parameters[0].name.is_empty());
}

#[test]
fn paging_uses_limit_offset() {
    let dialect = MysqlDialect;
    let layout = layout();
    let command = builder(&dialect, &layout)
        .select(
            &Search::None,
            &(ResultOption::limit(5) + ResultOption::offset(10)),
        )
        .unwrap();
    assert_eq!(
        command.text,
        "SELECT * FROM `shop`.`orders` LIMIT 5 OFFSET 10;"
    );
}

#[test]
fn offset_alone_gets_the_unbounded_limit() {
    let dialect = MysqlDialect;
    let layout = layout();
    let command = builder(&dialect, &layout)
        .select(&Search::None, &ResultOption::offset(10))
        .unwrap();
    assert_eq!(
        command.text,
        format!("SELECT * FROM `shop`.`orders` LIMIT {} OFFSET 10;", u64::MAX)
    );
}

#[test]
fn infinities_encode_to_finite_sentinels() {
    let dialect = MysqlDialect;
    let field = FieldDescriptor::new("F", DataType::Float32);
    let stored =
        get_database_value(&dialect, &field, &Value::Float32(Some(f32::INFINITY))).unwrap();
    assert_eq!(stored, Value::Float32(Some(f32::MAX)));
    assert_eq!(
        get_local_value(&dialect, &field, &stored).unwrap(),
        Value::Float32(Some(f32::INFINITY))
    );
}

#[test]
fn temporal_fields_store_per_their_representation() {
    let dialect = MysqlDialect;
    let field = FieldDescriptor::new("When", DataType::DateTime)
        .with_date_time(DateTimeKind::Utc, DateTimeType::BigIntTicks);
    let stored = dialect.database_field_properties(&field);
    assert_eq!(stored.type_at_database, DataType::Int64);
    assert_eq!(stored.data_type, DataType::DateTime);
}

#[test]
fn unspecified_decimals_get_the_dialect_default() {
    let dialect = MysqlDialect;
    let field = FieldDescriptor::new("Amount", DataType::Decimal);
    let stored = dialect.database_field_properties(&field);
    assert_eq!(stored.decimal_precision(), 65);
    assert_eq!(stored.decimal_scale(), 30);
}

#[test]
fn exposes_last_insert_id() {
    assert_eq!(
        MysqlDialect.last_insert_id_query(),
        Some("SELECT LAST_INSERT_ID();")
    );
}

#[test]
fn escape_string_backslash_escapes() {
    let dialect = MysqlDialect;
    assert_eq!(
        dialect.escape_string("a'b\\c\nd"),
        "'a\\'b\\\\c\\nd'"
    );
    assert_eq!(dialect.escape_string("plain"), "'plain'");
}

#[test]
fn binary_literals_are_hex_blobs() {
    let dialect = MysqlDialect;
    let mut out = String::new();
    dialect.write_binary_literal(&mut out, &[0xAB, 0x01]);
    assert_eq!(out, "X'AB01'");
}
