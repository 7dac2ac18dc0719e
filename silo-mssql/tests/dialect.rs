use silo_core::{
    DataError, DataType, Dialect, FieldDescriptor, LayoutBuilder, ResultOption, Search,
    SqlBuilder,
};
use silo_mssql::MssqlDialect;

fn layout() -> silo_core::RowLayout {
    LayoutBuilder::new("orders")
        .id("ID")
        .field(FieldDescriptor::new("Name", DataType::String))
        .build()
        .unwrap()
}

fn builder<'a>(dialect: &'a MssqlDialect, layout: &'a silo_core::RowLayout) -> SqlBuilder<'a> {
    SqlBuilder::new(dialect, layout, "shop", "orders")
}

#[test]
fn quotes_with_brackets_and_named_parameters() {
    let dialect = MssqlDialect;
    let layout = layout();
    let command = builder(&dialect, &layout)
        .select(&Search::field_equals("Name", "a"), &ResultOption::none())
        .unwrap();
    assert_eq!(
        command.text,
        "SELECT * FROM [shop].[dbo].[orders] WHERE [Name] = @p1;"
    );
    assert_eq!(command.parameters[0].name, "p1");
}

#[test]
fn paging_uses_offset_fetch() {
    let dialect = MssqlDialect;
    let layout = layout();
    let command = builder(&dialect, &layout)
        .select(
            &Search::None,
            &(ResultOption::sort_ascending("Name")
                + ResultOption::limit(5)
                + ResultOption::offset(10)),
        )
        .unwrap();
    assert_eq!(
        command.text,
        "SELECT * FROM [shop].[dbo].[orders] ORDER BY [Name] ASC OFFSET 10 ROWS FETCH NEXT 5 ROWS ONLY;"
    );
}

#[test]
fn unordered_paging_gets_the_order_shim() {
    let dialect = MssqlDialect;
    let layout = layout();
    let command = builder(&dialect, &layout)
        .select(&Search::None, &ResultOption::limit(3))
        .unwrap();
    assert_eq!(
        command.text,
        "SELECT * FROM [shop].[dbo].[orders] ORDER BY (SELECT NULL) OFFSET 0 ROWS FETCH NEXT 3 ROWS ONLY;"
    );
}

#[test]
fn group_with_sort_is_a_usage_error() {
    let dialect = MssqlDialect;
    let layout = layout();
    let options = ResultOption::group("Name") + ResultOption::sort_ascending("Name");
    let error = builder(&dialect, &layout)
        .select(&Search::None, &options)
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<DataError>(),
        Some(DataError::InvalidOperation(..))
    ));
}

#[test]
fn integer_widths_are_promoted() {
    let dialect = MssqlDialect;
    let cases = [
        (DataType::Int8, DataType::Int16),
        (DataType::UInt8, DataType::Int16),
        (DataType::UInt16, DataType::Int32),
        (DataType::UInt32, DataType::Int64),
        (DataType::UInt64, DataType::Decimal),
    ];
    for (logical, stored) in cases {
        let field = dialect.database_field_properties(&FieldDescriptor::new("N", logical));
        assert_eq!(field.data_type, logical);
        assert_eq!(field.type_at_database, stored, "{logical:?}");
    }
    // The UInt64 decimal is wide enough for the full unsigned range.
    let field = dialect.database_field_properties(&FieldDescriptor::new("N", DataType::UInt64));
    assert_eq!(field.decimal_precision(), 20);
    assert_eq!(field.decimal_scale(), 0);
}

#[test]
fn no_data_query_uses_a_constant_filter() {
    let dialect = MssqlDialect;
    assert_eq!(
        dialect.no_data_query("shop", "orders"),
        "SELECT * FROM [shop].[dbo].[orders] WHERE 1 = 0;"
    );
}

#[test]
fn exposes_scope_identity() {
    assert_eq!(
        MssqlDialect.last_insert_id_query(),
        Some("SELECT SCOPE_IDENTITY();")
    );
}
