mod common;

use common::StubDialect;
use silo_core::{
    DataError, DataType, FieldDescriptor, FieldFlags, LayoutBuilder, ResultOption, Row, RowLayout,
    Search, SqlBuilder, Value,
};

fn layout() -> RowLayout {
    LayoutBuilder::new("trades")
        .id("ID")
        .field(FieldDescriptor::new("A", DataType::Int32))
        .field(FieldDescriptor::new("B", DataType::Int32))
        .field(FieldDescriptor::new("Name", DataType::String))
        .build()
        .unwrap()
}

fn builder<'a>(dialect: &'a StubDialect, layout: &'a RowLayout) -> SqlBuilder<'a> {
    SqlBuilder::new(dialect, layout, "db", "trades")
}

#[test]
fn renders_a_predicate_tree() {
    let dialect = StubDialect::default();
    let layout = layout();
    let search = Search::field_equals("A", 1) & Search::field_greater("B", 2);
    let command = builder(&dialect, &layout)
        .select(&search, &ResultOption::none())
        .unwrap();
    assert_eq!(
        command.text,
        r#"SELECT * FROM "db"."trades" WHERE ("A" = @p1 AND "B" > @p2);"#
    );
    assert_eq!(command.parameters.len(), 2);
    assert_eq!(command.parameters[0].name, "p1");
    assert_eq!(command.parameters[0].value, Value::Int32(Some(1)));
    assert_eq!(command.parameters[1].value, Value::Int32(Some(2)));
}

#[test]
fn parameter_order_matches_emission_order_positionally() {
    let dialect = StubDialect {
        named_parameters: false,
        ..StubDialect::default()
    };
    let layout = layout();
    let search = (Search::field_smaller("A", 10) | Search::field_greater_or_equal("B", 20))
        & Search::field_equals("Name", "x");
    let command = builder(&dialect, &layout)
        .select(&search, &ResultOption::none())
        .unwrap();
    assert_eq!(
        command.text,
        r#"SELECT * FROM "db"."trades" WHERE (("A" < ? OR "B" >= ?) AND "Name" = ?);"#
    );
    let values: Vec<&Value> = command.parameters.iter().map(|p| &p.value).collect();
    assert_eq!(
        values,
        [
            &Value::Int32(Some(10)),
            &Value::Int32(Some(20)),
            &Value::String(Some("x".into())),
        ]
    );
    assert!(command.parameters.iter().all(|p| p.name.is_empty()));
}

#[test]
fn equals_null_renders_is_null() {
    let dialect = StubDialect::default();
    let layout = layout();
    let search = Search::field_equals("Name", Value::String(None));
    let command = builder(&dialect, &layout)
        .select(&search, &ResultOption::none())
        .unwrap();
    assert_eq!(
        command.text,
        r#"SELECT * FROM "db"."trades" WHERE "Name" IS NULL;"#
    );
    assert!(command.parameters.is_empty());
}

#[test]
fn sort_directives_are_additive_and_ordered() {
    let dialect = StubDialect::default();
    let layout = layout();
    let options = ResultOption::sort_ascending("A") + ResultOption::sort_descending("B");
    let command = builder(&dialect, &layout)
        .select(&Search::None, &options)
        .unwrap();
    assert_eq!(
        command.text,
        r#"SELECT * FROM "db"."trades" ORDER BY "A" ASC,"B" DESC;"#
    );
}

#[test]
fn limit_and_offset_render_after_the_order() {
    let dialect = StubDialect::default();
    let layout = layout();
    let options =
        ResultOption::sort_ascending("A") + ResultOption::limit(5) + ResultOption::offset(10);
    let command = builder(&dialect, &layout)
        .select(&Search::None, &options)
        .unwrap();
    assert_eq!(
        command.text,
        r#"SELECT * FROM "db"."trades" ORDER BY "A" ASC LIMIT 5 OFFSET 10;"#
    );
}

#[test]
fn duplicate_limit_is_rejected_before_rendering() {
    let dialect = StubDialect::default();
    let layout = layout();
    let options = ResultOption::limit(5) + ResultOption::limit(6);
    let error = builder(&dialect, &layout)
        .select(&Search::None, &options)
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<DataError>(),
        Some(DataError::InvalidOperation(..))
    ));
    let options = ResultOption::offset(1) + ResultOption::offset(1);
    assert!(
        builder(&dialect, &layout)
            .select(&Search::None, &options)
            .is_err()
    );
}

#[test]
fn group_by_renders_on_capable_dialects() {
    let dialect = StubDialect::default();
    let layout = layout();
    let command = builder(&dialect, &layout)
        .select(&Search::None, &ResultOption::group("Name"))
        .unwrap();
    assert_eq!(
        command.text,
        r#"SELECT * FROM "db"."trades" GROUP BY "Name";"#
    );
}

#[test]
fn group_and_sort_are_exclusive_without_capability() {
    let dialect = StubDialect {
        select_star_group_by: false,
        ..StubDialect::default()
    };
    let layout = layout();
    let options = ResultOption::group("Name") + ResultOption::sort_ascending("A");
    let error = builder(&dialect, &layout)
        .select(&Search::None, &options)
        .unwrap_err();
    assert!(matches!(
        error.downcast_ref::<DataError>(),
        Some(DataError::InvalidOperation(..))
    ));
}

#[test]
fn unknown_fields_are_rejected() {
    let dialect = StubDialect::default();
    let layout = layout();
    assert!(
        builder(&dialect, &layout)
            .select(&Search::field_equals("Nope", 1), &ResultOption::none())
            .is_err()
    );
    assert!(
        builder(&dialect, &layout)
            .select(&Search::None, &ResultOption::sort_ascending("Nope"))
            .is_err()
    );
}

#[test]
fn insert_skips_auto_increment_fields() {
    let dialect = StubDialect::default();
    let layout = layout();
    let row = Row::new(vec![
        Value::Null,
        Value::Int32(Some(1)),
        Value::Int32(Some(2)),
        Value::String(Some("x".into())),
    ]);
    let command = builder(&dialect, &layout).insert(&row).unwrap();
    assert_eq!(
        command.text,
        r#"INSERT INTO "db"."trades" ("A","B","Name") VALUES (@p1,@p2,@p3);"#
    );
    assert_eq!(command.parameters.len(), 3);
}

#[test]
fn update_sets_non_id_fields_and_filters_by_id() {
    let dialect = StubDialect::default();
    let layout = layout();
    let row = Row::new(vec![
        Value::Int64(Some(7)),
        Value::Int32(Some(1)),
        Value::Int32(Some(2)),
        Value::String(Some("x".into())),
    ]);
    let command = builder(&dialect, &layout).update(&row).unwrap();
    assert_eq!(
        command.text,
        r#"UPDATE "db"."trades" SET "A" = @p1,"B" = @p2,"Name" = @p3 WHERE "ID" = @p4;"#
    );
    assert_eq!(command.parameters[3].value, Value::Int64(Some(7)));
}

#[test]
fn update_requires_an_id_field() {
    let dialect = StubDialect::default();
    let layout = LayoutBuilder::new("plain")
        .field(FieldDescriptor::new("A", DataType::Int32))
        .build()
        .unwrap();
    let row = Row::new(vec![Value::Int32(Some(1))]);
    assert!(SqlBuilder::new(&dialect, &layout, "db", "plain").update(&row).is_err());
}

#[test]
fn delete_without_search_hits_every_row() {
    let dialect = StubDialect::default();
    let layout = layout();
    let command = builder(&dialect, &layout).delete(&Search::None).unwrap();
    assert_eq!(command.text, r#"DELETE FROM "db"."trades";"#);
}

#[test]
fn count_renders_with_the_search() {
    let dialect = StubDialect::default();
    let layout = layout();
    let command = builder(&dialect, &layout)
        .count(&Search::field_equals("A", 1))
        .unwrap();
    assert_eq!(
        command.text,
        r#"SELECT COUNT(*) FROM "db"."trades" WHERE "A" = @p1;"#
    );
}

#[test]
fn values_are_codec_converted_before_binding() {
    let dialect = StubDialect::default();
    let mut fields = vec![FieldDescriptor::new("State", DataType::Enum)];
    fields[0].flags = FieldFlags::NONE;
    let layout = RowLayout::untyped("states", fields);
    let command = SqlBuilder::new(&dialect, &layout, "db", "states")
        .select(&Search::field_equals("State", Value::Enum(Some(2))), &ResultOption::none())
        .unwrap();
    // Enum values travel as their underlying integer.
    assert_eq!(command.parameters[0].value, Value::Int64(Some(2)));
}
