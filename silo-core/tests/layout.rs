use silo_core::{
    DataError, DataType, FieldDescriptor, FieldFlags, LayoutBuilder, RowLayout, StringEncoding,
};

/// The nine flag/type combinations a typed layout must express, built once
/// through explicit descriptors and once through the builder shorthand.
fn nine_field_descriptors() -> Vec<FieldDescriptor> {
    vec![
        FieldDescriptor::new("ID", DataType::Int64).with_flags(FieldFlags::ID),
        FieldDescriptor::new("Indexed", DataType::Int32).with_flags(FieldFlags::INDEX),
        FieldDescriptor::new("Unique", DataType::Int32).with_flags(FieldFlags::UNIQUE),
        FieldDescriptor::new("Counter", DataType::Int64).with_flags(FieldFlags::AUTO_INCREMENT),
        FieldDescriptor::new("IndexedCounter", DataType::Int64)
            .with_flags(FieldFlags::INDEX | FieldFlags::AUTO_INCREMENT),
        FieldDescriptor::new("UniqueIndexed", DataType::Int32)
            .with_flags(FieldFlags::UNIQUE | FieldFlags::INDEX),
        FieldDescriptor::new("Everything", DataType::Int64)
            .with_flags(FieldFlags::INDEX | FieldFlags::AUTO_INCREMENT | FieldFlags::UNIQUE),
        FieldDescriptor::new("State", DataType::Enum),
        FieldDescriptor::new("Name", DataType::String).with_string_encoding(StringEncoding::Utf8),
    ]
}

#[test]
fn nine_field_layouts_check_against_each_other() {
    let explicit = RowLayout::typed("full", nine_field_descriptors()).unwrap();
    let built = nine_field_descriptors()
        .into_iter()
        .fold(LayoutBuilder::new("full"), LayoutBuilder::field)
        .build()
        .unwrap();
    explicit.check_layout(&built).unwrap();
    built.check_layout(&explicit).unwrap();
}

#[test]
fn builder_assigns_stable_indexes() {
    let layout = RowLayout::typed("full", nine_field_descriptors()).unwrap();
    for (i, field) in layout.fields().iter().enumerate() {
        assert_eq!(field.index, i);
    }
    assert_eq!(layout.field_index("State"), Some(7));
    assert_eq!(layout.field_index("missing"), None);
    assert_eq!(layout.id_field_index(), Some(0));
    assert!(layout.is_typed());
}

#[test]
fn typed_layouts_allow_a_single_id() {
    let fields = vec![
        FieldDescriptor::new("A", DataType::Int64).with_flags(FieldFlags::ID),
        FieldDescriptor::new("B", DataType::Int64).with_flags(FieldFlags::ID),
    ];
    let error = RowLayout::typed("twice", fields.clone()).unwrap_err();
    assert!(matches!(
        error.downcast_ref::<DataError>(),
        Some(DataError::SchemaMismatch { .. })
    ));
    // Untyped layouts are not validated; the first ID wins the lookup.
    let untyped = RowLayout::untyped("twice", fields);
    assert_eq!(untyped.id_field_index(), Some(0));
}

#[test]
fn layouts_without_id_report_none() {
    let layout = RowLayout::typed(
        "plain",
        vec![FieldDescriptor::new("A", DataType::Int32)],
    )
    .unwrap();
    assert_eq!(layout.id_field_index(), None);
    assert!(layout.id_field().is_none());
}

#[test]
fn check_layout_rejects_structural_differences() {
    let base = RowLayout::typed(
        "t",
        vec![
            FieldDescriptor::new("A", DataType::Int32),
            FieldDescriptor::new("B", DataType::String),
        ],
    )
    .unwrap();
    // Field count.
    let shorter = RowLayout::typed("t", vec![FieldDescriptor::new("A", DataType::Int32)]).unwrap();
    assert!(base.check_layout(&shorter).is_err());
    // Name.
    let renamed = RowLayout::typed(
        "t",
        vec![
            FieldDescriptor::new("A", DataType::Int32),
            FieldDescriptor::new("C", DataType::String),
        ],
    )
    .unwrap();
    assert!(base.check_layout(&renamed).is_err());
    // Datatype.
    let retyped = RowLayout::typed(
        "t",
        vec![
            FieldDescriptor::new("A", DataType::Int64),
            FieldDescriptor::new("B", DataType::String),
        ],
    )
    .unwrap();
    assert!(base.check_layout(&retyped).is_err());
    // Flags.
    let flagged = RowLayout::typed(
        "t",
        vec![
            FieldDescriptor::new("A", DataType::Int32).with_flags(FieldFlags::UNIQUE),
            FieldDescriptor::new("B", DataType::String),
        ],
    )
    .unwrap();
    assert!(base.check_layout(&flagged).is_err());
    // A physical name difference is not structural.
    let renamed_at_database = RowLayout::typed(
        "t",
        vec![
            FieldDescriptor::new("A", DataType::Int32).with_name_at_database("a_col"),
            FieldDescriptor::new("B", DataType::String),
        ],
    )
    .unwrap();
    base.check_layout(&renamed_at_database).unwrap();
}

#[test]
fn decimal_length_packs_precision_and_scale() {
    let field = FieldDescriptor::new("Amount", DataType::Decimal).with_maximum_length(28.08);
    assert_eq!(field.decimal_precision(), 28);
    assert_eq!(field.decimal_scale(), 8);
    let field = FieldDescriptor::new("Amount", DataType::Decimal).with_maximum_length(5.02);
    assert_eq!(field.decimal_precision(), 5);
    assert_eq!(field.decimal_scale(), 2);
    assert_eq!(
        field.decimal_maximum(),
        Some(rust_decimal::Decimal::from(1000))
    );
}
